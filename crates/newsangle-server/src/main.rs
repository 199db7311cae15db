// newsangle entry point.
//
// Startup sequence:
// 1. Initialize tracing
// 2. Load config (copying defaults/ on first run)
// 3. Open database
// 4. Build the LLM client
// 5. Serve the HTTP API until Ctrl+C / SIGTERM

use std::sync::Arc;

use anyhow::Context;
use newsangle_core::{config, db, jobs};
use newsangle_llm::client::LlmClient;
use newsangle_server::api::{self, AppState};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;
    info!("newsangle starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: listen={}, model={}",
        config.server.bind_addr(),
        config.llm.model
    );

    // 3. Open database
    let db = db::Database::open(&config.db_path).context("failed to open database")?;
    info!(
        "Database opened at {} ({} stored jobs)",
        config.db_path,
        jobs::job_count(&db)?
    );

    // 4. Build the LLM client from config
    let llm = LlmClient::from_config(&config);
    match &llm {
        LlmClient::Active(_) => info!("LLM client initialized (API key configured)"),
        LlmClient::Disabled => warn!("LLM client disabled (no API key); generation requests will fail"),
    }

    // 5. Serve
    let app = api::router(Arc::new(AppState::new(db, llm)));
    let addr = config.server.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;
    info!("Listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("newsangle shut down cleanly");
    Ok(())
}

fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(
                    "newsangle_server=info,newsangle_core=info,newsangle_llm=info,tower_http=info,warn",
                )),
        )
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C signal"),
        _ = terminate => info!("Received SIGTERM signal"),
    }
}
