//! CLI entry point for the AWT rolling-average publisher.
//!
//! Provides subcommands for reducing a local export or URL to rolling
//! averages, and for the scheduled sync that pulls from the tracking API,
//! reduces, and publishes to a directory or S3 bucket.

use anyhow::{Context, Result};
use awt_rollup::config::{ApiConfig, OutputTarget, PipelineConfig};
use awt_rollup::fetch::auth::{ApiKey, BasicAuth};
use awt_rollup::fetch::{
    BasicClient, RetryPolicy, fetch_bytes, fetch_tracking_data, tracking_data_url,
};
use awt_rollup::parser::{is_remote, parse_fixes, parse_source};
use awt_rollup::rollup::{self, RunSummary};
use awt_rollup::store::{LocalStore, ResultStore, S3Store, archive_raw, publish};
use chrono::{Days, Utc};
use clap::{Args, Parser, Subcommand};
use std::ffi::OsStr;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "awt_rollup")]
#[command(about = "Publish privacy-preserving rolling averages of wildlife GPS fixes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reduce a local JSON/CSV export or an open URL to rolling averages
    Rollup {
        /// Path to file or URL to fetch
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        #[command(flatten)]
        output: OutputArgs,

        #[command(flatten)]
        window: WindowArgs,
    },
    /// Fetch from the tracking API, reduce, and publish
    Sync {
        /// Days of history to request, ending today (UTC)
        #[arg(long, default_value_t = 90)]
        lookback_days: u64,

        /// Also store the raw API response next to the averages
        #[arg(long, default_value_t = false)]
        archive_raw: bool,

        /// Gzip compress the raw archive
        #[arg(long, default_value_t = false)]
        gzip: bool,

        #[command(flatten)]
        output: OutputArgs,

        #[command(flatten)]
        window: WindowArgs,
    },
}

#[derive(Args)]
struct OutputArgs {
    /// Directory to write results into
    #[arg(short = 'd', long, default_value = "output")]
    output_dir: String,

    /// Optional: S3 bucket name to upload to instead (e.g., "my-bucket")
    #[arg(long)]
    s3_bucket: Option<String>,
}

impl OutputArgs {
    fn target(&self) -> OutputTarget {
        match &self.s3_bucket {
            Some(bucket) if !bucket.is_empty() => OutputTarget::S3 {
                bucket: bucket.clone(),
            },
            _ => OutputTarget::Local {
                dir: self.output_dir.clone(),
            },
        }
    }
}

#[derive(Args)]
struct WindowArgs {
    /// Number of consecutive fixes averaged into one point
    #[arg(short = 'w', long, default_value_t = awt_rollup::config::DEFAULT_WINDOW_SIZE)]
    window_size: usize,
}

impl WindowArgs {
    fn config(&self) -> Result<PipelineConfig> {
        Ok(PipelineConfig::with_window_size(self.window_size)?)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/awt_rollup.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("awt_rollup.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Rollup {
            source,
            output,
            window,
        } => {
            let config = window.config()?;
            let bytes = fetcher(&source).await?;
            let fixes = parse_source(&source, &bytes)?;

            let store = open_store(&output.target()).await;
            let result = rollup::run(fixes, &config);
            publish(store.as_ref(), &result).await?;
            log_summary(&result.summary);
        }
        Commands::Sync {
            lookback_days,
            archive_raw: archive,
            gzip,
            output,
            window,
        } => {
            let config = window.config()?;
            let api = ApiConfig::from_env()?;
            let store = open_store(&output.target()).await;

            sync(&api, &config, store.as_ref(), lookback_days, archive, gzip).await?;
        }
    }

    Ok(())
}

/// Loads tracking data from a local file path or fetches it over HTTP.
#[tracing::instrument(fields(source = %url))]
async fn fetcher(url: &str) -> Result<Vec<u8>> {
    let bytes = if is_remote(url) {
        let client = BasicClient::new();
        fetch_bytes(&client, url).await?
    } else {
        tokio::fs::read(url)
            .await
            .with_context(|| format!("failed to read {url}"))?
    };
    Ok(bytes)
}

async fn open_store(target: &OutputTarget) -> Box<dyn ResultStore> {
    match target {
        OutputTarget::Local { dir } => {
            info!(dir = %dir, "Writing results locally");
            Box::new(LocalStore::new(dir))
        }
        OutputTarget::S3 { bucket } => {
            info!(bucket = %bucket, "S3 upload enabled");
            Box::new(S3Store::from_env(bucket.as_str()).await)
        }
    }
}

/// Pulls the cumulative dataset for the lookback window, recomputes all
/// rolling averages from scratch, and publishes them.
#[tracing::instrument(skip(api, config, store), fields(base_url = %api.base_url))]
async fn sync(
    api: &ApiConfig,
    config: &PipelineConfig,
    store: &dyn ResultStore,
    lookback_days: u64,
    archive: bool,
    gzip: bool,
) -> Result<()> {
    let now = Utc::now();
    let end = now.date_naive();
    let start = end
        .checked_sub_days(Days::new(lookback_days))
        .context("lookback window is out of range")?;
    let url = tracking_data_url(&api.base_url, start, end)?;

    info!(start = %start, end = %end, "Fetching tracking data");

    let policy = RetryPolicy {
        retries: api.retries,
        ..RetryPolicy::default()
    };
    let client = BasicAuth::new(
        BasicClient::with_timeout(api.timeout)?,
        &api.username,
        &api.password,
    )?;
    let raw = match &api.api_key {
        Some(key) => fetch_tracking_data(&ApiKey::new(client, key)?, &url, policy).await?,
        None => fetch_tracking_data(&client, &url, policy).await?,
    };

    if archive {
        archive_raw(store, &raw, now, gzip).await?;
    }

    let fixes = parse_fixes(&raw)?;
    let output = rollup::run(fixes, config);
    publish(store, &output).await?;
    log_summary(&output.summary);

    Ok(())
}

fn log_summary(summary: &RunSummary) {
    info!(
        original_points = summary.total_original_points,
        valid_points = summary.valid_points,
        discarded_points = summary.discarded_points,
        averaged_points = summary.total_averaged_points,
        animals = summary.total_animals,
        reduction_percent = summary.reduction_percent,
        "Run summary"
    );
}
