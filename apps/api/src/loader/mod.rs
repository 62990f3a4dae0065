//! Library Loader: brings up the PDF and DOCX extraction libraries and publishes
//! one combined readiness state.
//!
//! Both loads run concurrently and are joined under a bounded timeout. The state
//! moves once from `Loading` to `Ready` or `Failed` and never back.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{error, info};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LoadError {
    #[error("{library} library failed to load: {reason}")]
    Failed {
        library: &'static str,
        reason: String,
    },

    #[error("libraries did not finish loading within {0:?}")]
    TimedOut(Duration),
}

/// Combined readiness of the extraction libraries.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum LibraryReadiness {
    Loading,
    Ready,
    Failed(String),
}

impl LibraryReadiness {
    pub fn is_settled(&self) -> bool {
        !matches!(self, LibraryReadiness::Loading)
    }
}

/// A document library that must finish loading before its extraction strategy runs.
#[async_trait]
pub trait Library: Send + Sync {
    fn name(&self) -> &'static str;

    /// Performs any one-time setup and marks the library loaded.
    async fn load(&self) -> Result<(), LoadError>;

    fn is_loaded(&self) -> bool;
}

/// Read side of the readiness state. Cheap to clone; every clone observes the same state.
#[derive(Clone)]
pub struct ReadinessGate {
    rx: watch::Receiver<LibraryReadiness>,
}

impl ReadinessGate {
    /// Starts loading both libraries on the current runtime and returns immediately.
    pub fn spawn(first: Arc<dyn Library>, second: Arc<dyn Library>, timeout: Duration) -> Self {
        let (tx, rx) = watch::channel(LibraryReadiness::Loading);

        tokio::spawn(async move {
            let outcome = load_both(first.as_ref(), second.as_ref(), timeout).await;
            match &outcome {
                LibraryReadiness::Ready => info!("Document libraries ready"),
                LibraryReadiness::Failed(reason) => {
                    error!("Document libraries failed to load: {reason}")
                }
                LibraryReadiness::Loading => {}
            }
            // Receivers may all be gone during shutdown.
            let _ = tx.send(outcome);
        });

        Self { rx }
    }

    /// A gate that is already in the given state.
    #[cfg(test)]
    pub fn settled(state: LibraryReadiness) -> Self {
        let (_tx, rx) = watch::channel(state);
        Self { rx }
    }

    pub fn current(&self) -> LibraryReadiness {
        self.rx.borrow().clone()
    }

    pub fn is_ready(&self) -> bool {
        matches!(*self.rx.borrow(), LibraryReadiness::Ready)
    }

    /// Resolves once the state leaves `Loading`.
    pub async fn wait(&self) -> LibraryReadiness {
        let mut rx = self.rx.clone();
        let settled = rx
            .wait_for(LibraryReadiness::is_settled)
            .await
            .map(|state| state.clone());
        settled.unwrap_or_else(|_| rx.borrow().clone())
    }
}

async fn load_both(first: &dyn Library, second: &dyn Library, timeout: Duration) -> LibraryReadiness {
    info!("Loading {} and {} libraries", first.name(), second.name());
    let joined = async { tokio::try_join!(first.load(), second.load()) };

    match tokio::time::timeout(timeout, joined).await {
        Ok(Ok(_)) if first.is_loaded() && second.is_loaded() => LibraryReadiness::Ready,
        Ok(Ok(_)) => LibraryReadiness::Failed("library reported success but is not loaded".into()),
        Ok(Err(e)) => LibraryReadiness::Failed(e.to_string()),
        Err(_) => LibraryReadiness::Failed(LoadError::TimedOut(timeout).to_string()),
    }
}
