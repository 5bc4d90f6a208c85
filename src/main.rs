//! rdrmon - run one radar freshness poll cycle and write the status report.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};

use rdrmon_service::config::MonitorConfig;
use rdrmon_service::ingest::radar::HttpTransport;
use rdrmon_service::logging::{self, Component, LogLevel};
use rdrmon_service::overrides::OverrideStore;
use rdrmon_service::poll::{CancelToken, PollCycle};
use rdrmon_service::report;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Preset {
    /// All seven IMD products, header fallback enabled
    All,
    /// caz only, 30-minute threshold, comment-only
    Caz,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ReportKind {
    /// One row per station with a column per product
    Stations,
    /// Array of per-pair records for a single product
    Records,
}

#[derive(Parser)]
#[command(
    name = "rdrmon",
    version,
    about = "IMD radar product freshness monitor"
)]
struct Cli {
    /// TOML configuration file (overrides --preset)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Built-in configuration to use when no --config is given
    #[arg(long, value_enum, default_value_t = Preset::All)]
    preset: Preset,

    /// Override file (JSON)
    #[arg(long)]
    overrides: Option<PathBuf>,

    /// Directory the report is written to
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Report shape
    #[arg(long, value_enum, default_value_t = ReportKind::Stations)]
    report: ReportKind,

    /// Product for the records report (defaults to the first configured product)
    #[arg(long)]
    product: Option<String>,

    /// Print the report JSON to stdout instead of writing a file
    #[arg(long)]
    stdout: bool,

    /// Minimum log level (debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: LogLevel,
}

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    logging::init_logger(cli.log_level, true);

    let mut config = match &cli.config {
        Some(path) => MonitorConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => match cli.preset {
            Preset::All => MonitorConfig::all_products(),
            Preset::Caz => MonitorConfig::single_product("caz"),
        },
    };
    config.apply_env();
    if let Some(path) = cli.overrides {
        config.overrides.path = path;
    }
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }
    config.validate().context("invalid configuration")?;

    let product = match cli.product {
        Some(code) => {
            anyhow::ensure!(
                config.products.find(&code).is_some(),
                "product '{}' is not configured",
                code
            );
            code
        }
        None => config.products.codes()[0].to_string(),
    };

    let overrides = OverrideStore::load(&config.overrides.path);
    let transport = HttpTransport::new(&config.fetch.base_url, config.fetch.timeout)
        .context("building HTTP client")?;

    let report = PollCycle::new(&config, overrides)
        .run_now(&transport, &CancelToken::new())
        .context("poll cycle failed")?;

    if cli.stdout {
        let json = match cli.report {
            ReportKind::Stations => {
                report::to_pretty_json(&report::station_rows(&report, &config.products))?
            }
            ReportKind::Records => report::to_pretty_json(&report.records_for(&product))?,
        };
        println!("{}", json);
        return Ok(());
    }

    let path = match cli.report {
        ReportKind::Stations => {
            report::write_station_report(&config.output_dir, &report, &config.products)?
        }
        ReportKind::Records => report::write_records_report(&config.output_dir, &product, &report)?,
    };
    logging::info(Component::System, None, "Station status updated");
    println!("Station Status Updated: {}", path.display());
    Ok(())
}
