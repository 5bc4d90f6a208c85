/// Radar product catalog with per-product freshness thresholds.
///
/// Thresholds are configuration, not derived: each deployment decides how old
/// a snapshot may get before it counts as stale (observed values range from
/// 30 minutes to a full day). A product may be marked non-gating, in which
/// case it is still polled and reported but does not affect the station's
/// overall verdict.

use serde::Deserialize;

/// Threshold used when a product is configured without one.
pub const DEFAULT_THRESHOLD_MINUTES: u32 = 30;

/// A single radar product polled at every station.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Product {
    /// Short lowercase product code used in image URLs (e.g. `"caz"`).
    pub code: String,
    /// Maximum snapshot age, in minutes, before the product is stale.
    #[serde(default = "default_threshold")]
    pub threshold_minutes: u32,
    /// Whether this product contributes to the station's overall verdict.
    #[serde(default = "default_gating")]
    pub gating: bool,
}

fn default_threshold() -> u32 {
    DEFAULT_THRESHOLD_MINUTES
}

fn default_gating() -> bool {
    true
}

impl Product {
    pub fn new(code: &str, threshold_minutes: u32) -> Self {
        Self {
            code: code.to_string(),
            threshold_minutes,
            gating: true,
        }
    }

    /// Marks the product as informational only.
    pub fn auxiliary(mut self) -> Self {
        self.gating = false;
        self
    }
}

/// Ordered, immutable set of products polled at every station.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductCatalog {
    products: Vec<Product>,
}

impl ProductCatalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    /// Full IMD product set: six reflectivity/velocity products at 90
    /// minutes plus the daily accumulation product, which does not gate.
    pub fn imd_all_products() -> Self {
        Self::new(vec![
            Product::new("caz", 90),
            Product::new("ppi", 90),
            Product::new("sri", 90),
            Product::new("ppz", 90),
            Product::new("ppv", 90),
            Product::new("vp2", 90),
            Product::new("pac", 1440).auxiliary(),
        ])
    }

    /// Single-product catalog, e.g. the 30-minute `caz` watch.
    pub fn single(code: &str, threshold_minutes: u32) -> Self {
        Self::new(vec![Product::new(code, threshold_minutes)])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.products.iter()
    }

    /// Products that decide a station's overall verdict.
    pub fn gating(&self) -> impl Iterator<Item = &Product> {
        self.products.iter().filter(|p| p.gating)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn codes(&self) -> Vec<&str> {
        self.products.iter().map(|p| p.code.as_str()).collect()
    }

    pub fn find(&self, code: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.code == code)
    }

    /// Configured threshold for `code`, or the 30-minute default.
    pub fn threshold_for(&self, code: &str) -> u32 {
        self.find(code)
            .map(|p| p.threshold_minutes)
            .unwrap_or(DEFAULT_THRESHOLD_MINUTES)
    }

    pub fn is_gating(&self, code: &str) -> bool {
        self.find(code).map(|p| p.gating).unwrap_or(false)
    }

    pub fn first_duplicate(&self) -> Option<&str> {
        let mut seen = std::collections::HashSet::new();
        self.products
            .iter()
            .map(|p| p.code.as_str())
            .find(|code| !seen.insert(*code))
    }
}
