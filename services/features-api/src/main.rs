//! Features API Server
//!
//! OGC API - Features implementation serving GDAL/OGR datasets.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use catalog::Catalog;
use features_api::{build_router, AppState, ServiceConfig};
use features_protocol::LimitConfig;

/// Features API Server
#[derive(Parser, Debug)]
#[command(name = "features-api")]
#[command(about = "OGC API - Features server for GDAL/OGR datasets")]
struct Args {
    /// Verbose logging and per-request timing
    #[arg(long, env = "APP_DEBUG_MODE")]
    debug: bool,

    /// Do not serve the dashboard endpoints
    #[arg(long, env = "APP_DISABLE_WEB")]
    disable_web: bool,

    /// Do not serve the OGC API
    #[arg(long, env = "APP_DISABLE_API")]
    disable_api: bool,

    /// Directory holding the catalog database
    #[arg(long, default_value = "./data", env = "APP_DATABASE_DIR")]
    db_dir: PathBuf,

    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:8000", env = "APP_LISTEN_ADDR")]
    listen: String,

    /// Public URL used in links
    #[arg(long, default_value = "http://localhost:8000", env = "APP_BASE_URL")]
    base_url: String,

    /// First path segment of the dashboard endpoints
    #[arg(long, default_value = "dashboard", env = "APP_DASHBOARD_URL")]
    dashboard_url: String,

    /// Items returned when a request has no limit
    #[arg(long, default_value_t = 10, env = "APP_LIMIT_DEFAULT")]
    limit_default: u64,

    /// Largest accepted limit
    #[arg(long, default_value_t = 10_000, env = "APP_LIMIT_MAXIMUM")]
    limit_maximum: u64,

    /// Number of worker threads
    #[arg(long, env = "APP_WORKER_THREADS")]
    worker_threads: Option<usize>,
}

impl Args {
    fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            debug: self.debug,
            enable_web: !self.disable_web,
            enable_api: !self.disable_api,
            base_url: self.base_url.clone(),
            dashboard_url: self.dashboard_url.clone(),
            limits: LimitConfig {
                default: self.limit_default,
                maximum: self.limit_maximum,
            },
        }
        .normalized()
    }
}

fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(threads) = args.worker_threads {
        runtime_builder.worker_threads(threads);
    }
    let runtime = runtime_builder
        .build()
        .context("Failed to create Tokio runtime")?;

    runtime.block_on(run_server(args))
}

async fn run_server(args: Args) -> anyhow::Result<()> {
    let default_level = if args.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    if args.debug {
        fmt().with_env_filter(filter).with_target(true).init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_level(true)
            .json()
            .init();
    }

    let config = args.service_config();
    if !config.serves_anything() {
        error!("Both the API and the web dashboard are disabled; nothing to serve");
        std::process::exit(1);
    }

    info!(
        api = config.enable_api,
        web = config.enable_web,
        base_url = %config.base_url,
        "Starting Features API server"
    );

    let catalog = Catalog::open(&args.db_dir)
        .await
        .with_context(|| format!("Failed to open catalog in {}", args.db_dir.display()))?;
    catalog.migrate().await.context("Failed to initialize catalog")?;

    let mut state = AppState::new(catalog, config);
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => state = state.with_prometheus(handle),
        Err(e) => warn!(error = %e, "Metrics recorder not installed"),
    }

    let app = build_router(Arc::new(state));

    let addr: SocketAddr = args
        .listen
        .parse()
        .with_context(|| format!("Invalid listen address '{}'", args.listen))?;
    info!("Features API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server failed")?;
    Ok(())
}
