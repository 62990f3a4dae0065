//! The single user's working session: both editors, the in-flight flag, the error
//! banner and the current report, plus the operations that mutate them.
//!
//! Upload and classify are serialized through `loading`: while one is in flight the
//! other is rejected with `AppError::Busy`. Every failure is written to the banner
//! before it is returned; the next action clears it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{info, warn};

use crate::errors::AppError;
use crate::extraction::{Extractor, UploadedFile};
use crate::history::HistoryStore;
use crate::loader::ReadinessGate;
use crate::matching::{validate_inputs, Classifier};
use crate::models::report::Report;

pub mod defaults;
pub mod handlers;

use defaults::{DEFAULT_JOB_DESCRIPTION, DEFAULT_RESUME_TEXT};

#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub job_description: String,
    pub resume_text: String,
    pub loading: bool,
    pub error_message: Option<String>,
    pub current_report: Option<Report>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            job_description: DEFAULT_JOB_DESCRIPTION.to_string(),
            resume_text: DEFAULT_RESUME_TEXT.to_string(),
            loading: false,
            error_message: None,
            current_report: None,
        }
    }
}

pub struct Session {
    state: Mutex<SessionState>,
    extractor: Extractor,
    readiness: ReadinessGate,
    classifier: Arc<dyn Classifier>,
    history: Arc<HistoryStore>,
}

/// Clears `loading` when the operation ends, including when its future is dropped
/// because the client went away.
struct InFlight<'a> {
    state: &'a Mutex<SessionState>,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        lock(self.state).loading = false;
    }
}

fn lock(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    // The state holds plain data; a panic mid-update cannot leave it unusable.
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Session {
    pub fn new(
        extractor: Extractor,
        readiness: ReadinessGate,
        classifier: Arc<dyn Classifier>,
        history: Arc<HistoryStore>,
    ) -> Self {
        Self {
            state: Mutex::new(SessionState::default()),
            extractor,
            readiness,
            classifier,
            history,
        }
    }

    pub fn snapshot(&self) -> SessionState {
        lock(&self.state).clone()
    }

    pub fn readiness(&self) -> &ReadinessGate {
        &self.readiness
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn set_job_description(&self, text: String) {
        let mut state = lock(&self.state);
        state.error_message = None;
        state.job_description = text;
    }

    pub fn set_resume_text(&self, text: String) {
        let mut state = lock(&self.state);
        state.error_message = None;
        state.resume_text = text;
    }

    /// Replaces the resume text with the text extracted from `file`.
    /// Rejected without extracting anything while the libraries are not ready.
    pub async fn upload(&self, file: UploadedFile) -> Result<(), AppError> {
        if !self.readiness.is_ready() {
            return Err(self.record(AppError::LibraryNotLoaded("Document".to_string())));
        }

        let _in_flight = self.begin()?;
        info!("Processing upload '{}' ({})", file.filename, file.content_type);

        match self.extractor.extract(&file).await {
            Ok(text) => {
                lock(&self.state).resume_text = text;
                Ok(())
            }
            Err(e) => Err(self.record(AppError::from(e))),
        }
    }

    /// Scores the current documents. A failure leaves the previous report in place
    /// and adds nothing to history.
    pub async fn classify(&self) -> Result<Report, AppError> {
        let (job_description, resume_text, _in_flight) = {
            let mut state = lock(&self.state);
            if state.loading {
                return Err(AppError::Busy);
            }
            state.error_message = None;
            if let Err(e) = validate_inputs(&state.job_description, &state.resume_text) {
                state.error_message = Some(e.to_string());
                return Err(e);
            }
            state.loading = true;
            (
                state.job_description.clone(),
                state.resume_text.clone(),
                InFlight { state: &self.state },
            )
        };

        let report = match self.classifier.classify(&job_description, &resume_text).await {
            Ok(report) => report,
            Err(e) => {
                warn!("Classification failed: {e}");
                return Err(self.record(e));
            }
        };

        lock(&self.state).current_report = Some(report.clone());

        self.history
            .append(report.clone(), &job_description)
            .await
            .map_err(|e| self.record(AppError::from(e)))?;

        Ok(report)
    }

    pub async fn clear_history(&self) -> Result<(), AppError> {
        lock(&self.state).error_message = None;
        self.history
            .clear()
            .await
            .map_err(|e| self.record(AppError::from(e)))
    }

    fn begin(&self) -> Result<InFlight<'_>, AppError> {
        let mut state = lock(&self.state);
        if state.loading {
            return Err(AppError::Busy);
        }
        state.loading = true;
        state.error_message = None;
        Ok(InFlight { state: &self.state })
    }

    /// Puts the error's message on the banner and hands the error back. Used for
    /// failures raised before an operation reaches the session, such as a bad upload body.
    pub fn record(&self, err: AppError) -> AppError {
        lock(&self.state).error_message = Some(err.to_string());
        err
    }
}
