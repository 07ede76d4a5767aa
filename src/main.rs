use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use backdrop_server::{
    config::Config,
    job_scheduling::{PrecacheQueue, PrecacheWorker, SourceRefresher},
    models::SizeCatalog,
    services::{
        HttpImageFetcher, ImageCache, ImageDispatcher, ImageResolver, ResizePipeline, SourcePool,
        build_http_client,
    },
    sources,
    web::{AppState, WebServer, shutdown_signal},
};

#[derive(Parser)]
#[command(name = "backdrop-server")]
#[command(version)]
#[command(about = "Serves random background images cropped to a fixed set of sizes")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Listening IP address
    #[arg(short = 'H', long, value_name = "IP")]
    host: Option<String>,

    /// Listening port
    #[arg(short, long, value_name = "PORT")]
    port: Option<u16>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_filter = if cli.log_level == "trace" {
        format!("backdrop_server={},tower_http=trace", cli.log_level)
    } else {
        format!("backdrop_server={}", cli.log_level)
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting backdrop-server v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load_from_file(&cli.config)?;
    info!("Configuration loaded from: {}", cli.config);

    if let Some(host) = cli.host {
        config.web.host = host;
    }
    if let Some(port) = cli.port {
        config.web.port = port;
    }

    let catalog = Arc::new(SizeCatalog::standard());
    info!("Serving sizes: {}", catalog.describe());

    let cache_capacity = config.cache.capacity_for(catalog.len());
    let cache = Arc::new(ImageCache::new(cache_capacity)?);
    info!("Image cache initialized with capacity {}", cache_capacity);

    let http_client = build_http_client(&config.http_client)?;
    let resolver = Arc::new(ImageResolver::new(
        cache.clone(),
        Arc::new(HttpImageFetcher::new(http_client.clone())),
        ResizePipeline::new(&config.images),
    ));

    let pool = SourcePool::new();
    let dispatcher = Arc::new(ImageDispatcher::new(
        catalog.clone(),
        pool.clone(),
        resolver.clone(),
    ));

    let precache_queue = Arc::new(PrecacheQueue::new());
    let discovery = sources::from_config(&config.rotation.discovery, http_client)?;
    info!("Source discovery provider: {}", discovery.name());

    let refresher = Arc::new(SourceRefresher::new(
        discovery,
        pool.clone(),
        precache_queue.clone(),
        config.rotation.refresh_interval,
    ));
    let precache_worker = PrecacheWorker::new(
        precache_queue.clone(),
        resolver,
        catalog.largest().clone(),
        config.precache.pacing,
    );

    let state = AppState {
        dispatcher,
        pool,
        cache,
        refresh_status: refresher.status(),
        precache_queue,
    };
    let web_server = WebServer::new(&config.web, state)?;
    info!(
        "Web server configured for {}:{}",
        web_server.host(),
        web_server.port()
    );

    let cancellation_token = CancellationToken::new();
    {
        let token = cancellation_token.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            token.cancel();
        });
    }

    let (ready_tx, ready_rx) = tokio::sync::oneshot::channel();
    let server_handle = {
        let token = cancellation_token.clone();
        tokio::spawn(async move { web_server.serve_with_cancellation(ready_tx, Some(token)).await })
    };

    // Background work only starts once the port is ours
    match ready_rx.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            error!("{}", e);
            return Err(e);
        }
        Err(_) => return Err(anyhow::anyhow!("Web server exited before signalling readiness")),
    }

    let mut background = precache_worker.spawn(config.precache.workers, cancellation_token.clone());
    background.push({
        let refresher = refresher.clone();
        let token = cancellation_token.clone();
        tokio::spawn(async move { refresher.run(token).await })
    });

    let server_result = server_handle.await?;
    cancellation_token.cancel();
    for handle in background {
        if let Err(e) = handle.await {
            error!("Background task ended abnormally: {}", e);
        }
    }

    info!("backdrop-server stopped");
    server_result
}
