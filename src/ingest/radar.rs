/// IMD radar image transport.
///
/// Retrieves product snapshots (GIF) for a station from the IMD radar
/// endpoint. One attempt per (station, product) per cycle; a timeout or
/// non-2xx response is returned as a `FetchError`, never retried.
///
/// Endpoint: https://mausam.imd.gov.in/Radar/{product}_{station}.gif

use std::time::Duration;

use reqwest::header::LAST_MODIFIED;

use crate::model::FetchError;

pub const DEFAULT_BASE_URL: &str = "https://mausam.imd.gov.in/Radar";

/// Per-request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// Transport seam
// ============================================================================

/// Body and transport metadata of a successful fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedImage {
    pub body: Vec<u8>,
    /// Raw `Last-Modified` response header, if the server sent one.
    pub last_modified: Option<String>,
}

/// Fetches one product image for one station.
///
/// Implementations are shared across poll workers and must be safe for
/// concurrent use.
pub trait ImageTransport: Send + Sync {
    fn fetch(&self, station: &str, product: &str) -> Result<FetchedImage, FetchError>;
}

/// Image URL for a (station, product) pair.
pub fn build_image_url(base_url: &str, station: &str, product: &str) -> String {
    format!("{}/{}_{}.gif", base_url.trim_end_matches('/'), product, station)
}

// ============================================================================
// HTTP client
// ============================================================================

/// Blocking HTTP transport over one connection-reusing `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("rdrmon/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl ImageTransport for HttpTransport {
    fn fetch(&self, station: &str, product: &str) -> Result<FetchedImage, FetchError> {
        let url = build_image_url(&self.base_url, station, product);

        let response = self.client.get(&url).send().map_err(classify_reqwest_error)?;

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus {
                status: response.status().as_u16(),
                url,
            });
        }

        let last_modified = response
            .headers()
            .get(LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response.bytes().map_err(classify_reqwest_error)?;

        Ok(FetchedImage {
            body: body.to_vec(),
            last_modified,
        })
    }
}

fn classify_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout(err.to_string())
    } else if err.is_connect() {
        FetchError::Connect(err.to_string())
    } else if let Some(status) = err.status() {
        FetchError::HttpStatus {
            status: status.as_u16(),
            url: err.url().map(|u| u.to_string()).unwrap_or_default(),
        }
    } else {
        FetchError::Request(err.to_string())
    }
}

// ============================================================================
// Tests
// ============================================================================
