//! Submission controller: one in-flight submit per widget.

use crate::error::ValidationError;
use crate::forms::ActionForm;
use crate::presenter::Feedback;
use crate::remap::ErrorRemapTable;
use crate::transport::Transport;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What happened to one submit attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Another submission was in flight; nothing was sent.
    Busy,
    /// The form did not validate; nothing was sent.
    Invalid(ValidationError),
    Succeeded { message: String, results: Value },
    Failed(String),
}

impl SubmitOutcome {
    /// Banner for the outcome. A dropped double-submit shows nothing.
    pub fn feedback(&self) -> Option<Feedback> {
        match self {
            SubmitOutcome::Busy => None,
            SubmitOutcome::Invalid(err) => Some(Feedback::Error(err.to_string())),
            SubmitOutcome::Succeeded { message, .. } => Some(Feedback::Success(message.clone())),
            SubmitOutcome::Failed(message) => Some(Feedback::Error(message.clone())),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SubmitOutcome::Succeeded { .. })
    }
}

/// Clears the busy flag on every exit path.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct SubmissionController {
    transport: Arc<dyn Transport>,
    busy: AtomicBool,
    remap: ErrorRemapTable,
}

impl SubmissionController {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            busy: AtomicBool::new(false),
            remap: ErrorRemapTable::default(),
        }
    }

    pub fn with_remap(mut self, remap: ErrorRemapTable) -> Self {
        self.remap = remap;
        self
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Validate, send and report. The form is reset only on success.
    pub async fn submit<F>(&self, form: &mut F) -> SubmitOutcome
    where
        F: ActionForm + ?Sized,
    {
        let Some(_guard) = BusyGuard::acquire(&self.busy) else {
            debug!(action = form.action(), "Submit dropped, already busy");
            return SubmitOutcome::Busy;
        };

        let request = match form.build_payload() {
            Ok(request) => request,
            Err(err) => {
                debug!(action = form.action(), "Validation failed: {}", err);
                return SubmitOutcome::Invalid(err);
            }
        };

        match self.transport.execute(request.to_api_request()).await {
            Ok(response) => {
                info!(action = form.action(), "Action succeeded");
                form.reset();
                let message = if response.message.is_empty() {
                    "Success".to_string()
                } else {
                    response.message
                };
                SubmitOutcome::Succeeded {
                    message,
                    results: response.results,
                }
            }
            Err(err) => {
                warn!(action = form.action(), "Action failed: {}", err);
                SubmitOutcome::Failed(self.remap.normalize(&err))
            }
        }
    }
}
