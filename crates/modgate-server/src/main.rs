//! ModGate Server
//!
//! HTTP moderation service. Accepts text and image submissions,
//! classifies them through an external model, persists the outcome, and
//! alerts configured channels about flagged content.

use anyhow::Result;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusHandle;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};

use modgate_classify::GeminiClient;
use modgate_notify::{Dispatcher, EmailChannel, SlackChannel};
use modgate_pipeline::{Orchestrator, PipelineLimits};
use modgate_server::config::{ServerConfig, StorageBackend};
use modgate_server::image::ImageFetcher;
use modgate_server::{create_router, AppState};
use modgate_store::{JsonlStore, MemoryStore, ModerationStore};

#[derive(Parser, Debug)]
#[command(name = "modgate-server")]
#[command(about = "ModGate content moderation service", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Listen address
    #[arg(short = 'l', long, default_value = "0.0.0.0")]
    listen: String,

    /// Listen port
    #[arg(short = 'P', long, default_value = "8080")]
    port: u16,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    info!("Starting ModGate Server");

    let config = ServerConfig::load(&cli.config)?;
    info!("Configuration loaded successfully");

    let metrics_handle = init_metrics()?;

    let state = build_state(&config, metrics_handle)?;
    info!("Application state initialized successfully");

    let addr: SocketAddr = format!("{}:{}", cli.listen, cli.port).parse()?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);

    let shutdown = async {
        shutdown_signal().await;
        warn!("Shutdown signal received, stopping server...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Construct every component from configuration and wire the pipeline.
fn build_state(config: &ServerConfig, metrics: PrometheusHandle) -> Result<AppState> {
    let store: Arc<dyn ModerationStore> = match config.storage.backend {
        StorageBackend::Memory => {
            warn!("Using in-memory storage; moderation history is lost on restart");
            Arc::new(MemoryStore::new())
        }
        StorageBackend::Jsonl => {
            let store = JsonlStore::open(&config.storage.data_dir)?;
            info!(dir = %config.storage.data_dir.display(), "Using jsonl storage");
            Arc::new(store)
        }
    };

    let gemini_config = config
        .gemini
        .clone()
        .ok_or_else(|| anyhow::anyhow!(
            "no classification backend configured; set gemini.api_key in the config file or MODGATE_GEMINI_API_KEY in the environment"
        ))?;
    let classifier = Arc::new(GeminiClient::new(gemini_config)?);

    let mut dispatcher = Dispatcher::new();
    if let Some(slack) = config.slack.clone() {
        dispatcher = dispatcher.with_channel(Arc::new(SlackChannel::new(slack)?));
        info!("Slack notification channel configured");
    }
    if let Some(email) = config.email.clone() {
        dispatcher = dispatcher.with_channel(Arc::new(EmailChannel::new(email)?));
        info!("Email notification channel configured");
    }
    if dispatcher.channel_count() == 0 {
        warn!("No notification channels configured; flagged content will only be recorded");
    }

    let orchestrator = Orchestrator::new(store.clone(), classifier, Arc::new(dispatcher))
        .with_limits(PipelineLimits {
            max_text_chars: config.limits.max_text_chars,
        });

    let fetcher = ImageFetcher::new(
        config.limits.max_image_bytes,
        config.limits.image_fetch_timeout_secs,
    )?;

    Ok(AppState {
        orchestrator: Arc::new(orchestrator),
        store,
        fetcher: Arc::new(fetcher),
        metrics: Some(metrics),
    })
}

/// Listen for shutdown signals (SIGTERM, SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("modgate=debug,tower_http=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("modgate=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Initialize metrics exporter and return handle for rendering
fn init_metrics() -> Result<PrometheusHandle> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let builder = PrometheusBuilder::new();
    let handle = builder
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics: {}", e))?;

    metrics::describe_counter!(
        "modgate_submissions_total",
        "Total number of moderation submissions by content kind"
    );
    metrics::describe_counter!(
        "modgate_cache_hits_total",
        "Submissions answered from a previously stored verdict"
    );
    metrics::describe_histogram!(
        "modgate_classification_latency_us",
        metrics::Unit::Microseconds,
        "Classification backend latency in microseconds"
    );
    metrics::describe_counter!(
        "modgate_notifications_total",
        "Notification attempts by channel and outcome"
    );

    info!("Metrics exporter initialized");
    Ok(handle)
}
