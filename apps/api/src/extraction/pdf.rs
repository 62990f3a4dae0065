use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Semaphore;
use tracing::info;

use crate::extraction::ExtractError;
use crate::loader::{Library, LoadError};

pub const LIBRARY_NAME: &str = "PDF";

/// Background worker the parser runs on: a bounded number of blocking parse slots.
struct PdfWorker {
    slots: Arc<Semaphore>,
}

/// PDF text extraction backed by `pdf-extract`.
///
/// Loading attaches the background worker; until then every extraction fails with
/// `LibraryNotLoaded`.
pub struct PdfLibrary {
    worker_count: usize,
    worker: OnceLock<PdfWorker>,
}

impl PdfLibrary {
    pub fn new(worker_count: usize) -> Self {
        Self {
            worker_count: worker_count.max(1),
            worker: OnceLock::new(),
        }
    }

    /// Text of every page, in page order.
    pub async fn extract_pages(&self, bytes: Bytes) -> Result<Vec<String>, ExtractError> {
        let worker = self
            .worker
            .get()
            .ok_or(ExtractError::LibraryNotLoaded(LIBRARY_NAME))?;

        let _slot = worker
            .slots
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| ExtractError::Malformed("PDF worker is shut down".to_string()))?;

        // pdf-extract is synchronous and may panic on hostile input.
        tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem_by_pages(&bytes))
            .await
            .map_err(|e| ExtractError::Malformed(format!("PDF parser aborted: {e}")))?
            .map_err(|e| ExtractError::Malformed(format!("Could not read PDF: {e}")))
    }
}

#[async_trait]
impl Library for PdfLibrary {
    fn name(&self) -> &'static str {
        LIBRARY_NAME
    }

    async fn load(&self) -> Result<(), LoadError> {
        let workers = self.worker_count;
        if workers > Semaphore::MAX_PERMITS {
            return Err(LoadError::Failed {
                library: LIBRARY_NAME,
                reason: format!("{workers} workers exceeds {}", Semaphore::MAX_PERMITS),
            });
        }

        self.worker.get_or_init(|| PdfWorker {
            slots: Arc::new(Semaphore::new(workers)),
        });
        info!("PDF library loaded with {workers} worker slot(s)");
        Ok(())
    }

    fn is_loaded(&self) -> bool {
        self.worker.get().is_some()
    }
}

/// Tokens within a page are joined by single spaces; every page ends with a newline.
pub fn join_pages(pages: &[String]) -> String {
    let mut text = String::new();
    for page in pages {
        let tokens: Vec<&str> = page.split_whitespace().collect();
        text.push_str(&tokens.join(" "));
        text.push('\n');
    }
    text
}
