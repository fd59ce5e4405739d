use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use invoice_render::error::AddContext;
use invoice_render::{DEFAULT_WEBDRIVER_PORT, WebDriverFactory, start_chromedriver};
use invoice_render_api::cli::Cli;
use invoice_render_api::config::Config;
use invoice_render_api::routes::{self, AppState};

#[tokio::main]
async fn main() -> Result<(), invoice_render::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "invoice_render_api=debug,invoice_render=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut config = Config::from_env();
    cli.apply(&mut config);

    if config.api_key.as_deref().is_none_or(|k| k.is_empty()) {
        tracing::warn!("GENERATE_PDF_API_KEY is not set; every request will be rejected with 401");
    }

    let chromedriver = if config.manage_chromedriver {
        let child = start_chromedriver(DEFAULT_WEBDRIVER_PORT)
            .add_context("starting chromedriver for the api server")?;
        tracing::info!("chromedriver listening on port {DEFAULT_WEBDRIVER_PORT}");
        Some(child)
    } else {
        tracing::info!(webdriver_url = %config.webdriver_url, "using external webdriver endpoint");
        None
    };

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| invoice_render::Error::from(format!("invalid bind address: {e}")))?;

    let factory = Arc::new(WebDriverFactory::new(&config.webdriver_url));
    let state = AppState::new(config, factory);
    let app = routes::router(state);

    tracing::info!("invoice render api listening on {addr}");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(invoice_render::Error::from)
        .add_context("binding api listener")?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(invoice_render::Error::from)
        .add_context("serving invoice render api")?;

    if let Some(mut child) = chromedriver {
        if let Err(e) = child.kill() {
            tracing::warn!("failed to stop chromedriver: {e}");
        }
    }
    tracing::info!("server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}
