//! Web form for generating notices.
//!
//! A single page collects the meeting details, runs the generation, and
//! shows the resulting PDF inline with a download link. Each browser session
//! keeps only its latest notice, in memory.

mod handlers;
mod routes;
mod session;
mod templates;

pub use handlers::NoticeForm;
pub use routes::create_router;
pub use session::{InFlight, SessionDocument, SessionStore, SESSION_COOKIE};

use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::Settings;
use crate::llm::{build_provider, TextGenerator};

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    /// Generator built from configuration. When absent, each submission
    /// builds one from the token entered on the form.
    pub generator: Option<Arc<dyn TextGenerator>>,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        let generator: Option<Arc<dyn TextGenerator>> = match settings.api_token() {
            Some(_) => match build_provider(&settings, None) {
                Ok(generator) => Some(Arc::from(generator)),
                Err(e) => {
                    tracing::warn!("Falling back to per-request tokens: {:#}", e);
                    None
                }
            },
            None => None,
        };

        Self {
            settings: Arc::new(settings),
            generator,
            sessions: SessionStore::new(),
        }
    }

    /// State backed by a specific generator.
    pub fn with_generator(settings: Settings, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            settings: Arc::new(settings),
            generator: Some(generator),
            sessions: SessionStore::new(),
        }
    }
}

/// Start the web server.
pub async fn serve(settings: &Settings, host: &str, port: u16) -> anyhow::Result<()> {
    let state = AppState::new(settings.clone());
    if state.generator.is_none() {
        tracing::info!("No Replicate API token configured; the form will ask for one");
    }
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
