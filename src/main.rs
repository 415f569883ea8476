//! CLI entry point.
//!
//! Loads the DGT DATEX II situation feed (live or from a local file), prints
//! incident statistics, and writes the interactive map plus optional HTML
//! report and CSV export.

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::Parser;
use dgt_incidents::{
    config::Config,
    error::OutputError,
    fetch::BasicClient,
    locations::LocationTable,
    map::MapRenderer,
    output::{export_csv, write_artifact},
    parser::Datex2Parser,
    report,
    source::FeedSource,
    stats::IncidentStats,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "dgt_incidents")]
#[command(about = "Map and statistics of DGT traffic incidents (DATEX II v3)", long_about = None)]
struct Cli {
    /// Read a local XML file instead of downloading [default: datex2_v36.xml]
    #[arg(long, value_name = "FILE")]
    local: Option<Option<PathBuf>>,

    /// Do not print statistics to the console (--stats-html still writes the report)
    #[arg(long)]
    no_stats: bool,

    /// Also write the HTML statistics report
    #[arg(long)]
    stats_html: bool,

    /// Map output file [default: mapa_v16.html]
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// HTML statistics output file [default: estadisticas_v16.html]
    #[arg(long, value_name = "FILE")]
    stats_output: Option<PathBuf>,

    /// Feed URL to download
    #[arg(long)]
    url: Option<String>,

    /// Number of provinces in the console ranking [default: 10]
    #[arg(long, value_name = "N")]
    top: Option<usize>,

    /// Draw every marker instead of clustering nearby ones
    #[arg(long)]
    no_cluster: bool,

    /// Export the parsed incidents as CSV
    #[arg(long, value_name = "FILE")]
    export_csv: Option<PathBuf>,

    /// JSON settings file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// HTTP timeout in seconds [default: 30]
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,

    /// Also write JSON logs to this file
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_deref())?;

    let config = resolve_config(&cli)?;
    run(&cli, &config)
}

/// Logging setup: colored stderr plus an optional JSON log file.
fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            let name = path
                .file_name()
                .with_context(|| format!("log file path {} has no file name", path.display()))?;
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::NEVER)
                .filename_prefix(name.to_string_lossy())
                .build(dir)
                .with_context(|| format!("cannot open log file {}", path.display()))?;

            Some(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_writer(appender)
                    .with_filter(
                        EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?),
                    ),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();
    Ok(())
}

/// Settings file (if any) with command-line flags applied on top.
fn resolve_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    if let Some(url) = &cli.url {
        config.feed_url = url.clone();
    }
    if let Some(Some(path)) = &cli.local {
        config.local_path = path.clone();
    }
    if let Some(path) = &cli.output {
        config.map_output = path.clone();
    }
    if let Some(path) = &cli.stats_output {
        config.stats_output = path.clone();
    }
    if let Some(top) = cli.top {
        config.top_n = top;
    }
    if let Some(secs) = cli.timeout {
        config.timeout_secs = secs;
    }
    if cli.no_cluster {
        config.clustering = false;
    }
    Ok(config)
}

#[tracing::instrument(skip_all)]
fn run(cli: &Cli, config: &Config) -> Result<()> {
    let locations = match &config.locations_file {
        Some(path) => LocationTable::with_overrides(path)?,
        None => LocationTable::builtin(),
    };

    let source = match cli.local {
        Some(_) => FeedSource::Local(config.local_path.clone()),
        None => FeedSource::Remote(config.feed_url.clone()),
    };
    let timeout = Duration::from_secs(config.timeout_secs);

    info!(%source, "Loading feed");
    let bytes = source
        .load(|| BasicClient::with_timeout(timeout))
        .with_context(|| format!("failed to load feed from {source}"))?;
    let feed = Datex2Parser::new(&locations)
        .parse(&bytes)
        .context("failed to parse DATEX II feed")?;
    if feed.incidents.is_empty() {
        warn!("Feed contains no incidents");
    }

    let stats = IncidentStats::from_incidents(&feed.incidents);
    if !cli.no_stats {
        print!("{}", report::console::render(&stats, config.top_n));
    }

    let mut failures = 0;

    if cli.stats_html {
        let html = report::html::render(&stats, config.html_top_n, Utc::now());
        failures += attempt("statistics report", &config.stats_output, || {
            write_artifact(&config.stats_output, &html)
        });
    }

    let renderer = MapRenderer::new(config.clustering);
    failures += attempt("map", &config.map_output, || {
        let map = renderer.render(&feed.incidents)?;
        info!(placed = map.placed, skipped = map.skipped, "Map rendered");
        write_artifact(&config.map_output, &map.html)
    });

    if let Some(path) = &cli.export_csv {
        failures += attempt("CSV export", path, || export_csv(path, &feed.incidents));
    }

    if failures > 0 {
        bail!("{failures} output artifact(s) could not be written");
    }
    Ok(())
}

/// Runs one output stage; failures are logged and counted, not propagated.
fn attempt(artifact: &str, path: &Path, write: impl FnOnce() -> Result<(), OutputError>) -> usize {
    match write() {
        Ok(()) => {
            info!(artifact, path = %path.display(), "Saved");
            0
        }
        Err(e) => {
            error!(artifact, error = %e, "Output failed");
            1
        }
    }
}
