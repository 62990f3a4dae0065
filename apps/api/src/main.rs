mod config;
mod errors;
mod extraction;
mod history;
mod llm_client;
mod loader;
mod matching;
mod models;
mod routes;
mod session;
mod state;
mod view;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::extraction::{DocxLibrary, Extractor, PdfLibrary};
use crate::history::{HistoryStore, KeyValueStore, MemoryStore, RedisStore};
use crate::llm_client::LlmClient;
use crate::loader::ReadinessGate;
use crate::matching::{Classifier, GeminiClassifier};
use crate::routes::build_router;
use crate::session::Session;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume Matcher v{}", env!("CARGO_PKG_VERSION"));

    // Start loading document libraries; upload stays disabled until both are ready
    let pdf = Arc::new(PdfLibrary::new(config.pdf_workers));
    let docx = Arc::new(DocxLibrary::new());
    let readiness = ReadinessGate::spawn(pdf.clone(), docx.clone(), config.library_load_timeout);

    // Initialize history persistence
    let kv: Arc<dyn KeyValueStore> = match &config.redis_url {
        Some(url) => Arc::new(RedisStore::connect(url).await?),
        None => {
            info!("REDIS_URL not set; history is kept in memory");
            Arc::new(MemoryStore::new())
        }
    };
    let history = Arc::new(
        HistoryStore::load(kv, config.history_key.clone(), config.history_limit).await?,
    );

    // Initialize LLM client
    let llm = LlmClient::from_config(&config)?;
    info!("LLM client initialized (model: {})", llm.model());
    let classifier: Arc<dyn Classifier> = Arc::new(GeminiClassifier::new(llm));

    let session = Arc::new(Session::new(
        Extractor::new(pdf, docx, config.max_upload_bytes),
        readiness,
        classifier,
        history,
    ));

    // Build app state
    let state = AppState {
        session,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
