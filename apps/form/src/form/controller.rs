//! Submission controller: owns the form state and runs the submit workflow.
//!
//! State sits behind a `std::sync::Mutex` that is never held across the
//! network call: the busy flag is checked and set under one lock, the draft
//! is cloned out, the lock is released, and the outcome is applied under a
//! second lock.
//!
//! A submit future can be dropped mid-flight (client disconnect, caller
//! timeout). `InFlight` settles the form as failed in that case, so the busy
//! flag never outlives the request that set it.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::models::{
    ApplicationDraft, CvFile, Field, Notice, NoticeKind, SubmissionStatus, UploadResult,
};
use crate::submit_client::Submitter;

pub const SUCCESS_MESSAGE: &str = "Your application has been submitted successfully!";
pub const FAILURE_MESSAGE: &str =
    "There was an error submitting your application. Please try again.";

/// Everything the presenter needs, copied out of the component.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormSnapshot {
    pub draft: ApplicationDraft,
    pub status: SubmissionStatus,
    pub notice: Option<Notice>,
    pub upload: Option<UploadResult>,
}

impl FormSnapshot {
    pub fn is_submitting(&self) -> bool {
        self.status == SubmissionStatus::Submitting
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    Succeeded(String),
    Failed(String),
}

/// Result of asking the component to submit.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitAttempt {
    /// The request was dispatched and this is how it ended.
    Completed(SubmissionOutcome),
    /// Another submission is in flight; nothing was sent.
    AlreadySubmitting,
    /// The draft is not complete; nothing was sent.
    Incomplete(Vec<Field>),
}

pub struct ApplicationForm {
    state: Mutex<FormSnapshot>,
    submitter: Arc<dyn Submitter>,
}

impl ApplicationForm {
    pub fn new(submitter: Arc<dyn Submitter>) -> Self {
        Self {
            state: Mutex::new(FormSnapshot::default()),
            submitter,
        }
    }

    fn lock(&self) -> MutexGuard<'_, FormSnapshot> {
        // A panic while holding the lock cannot leave the snapshot half-written,
        // so a poisoned lock is still usable.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> FormSnapshot {
        self.lock().clone()
    }

    pub fn is_submitting(&self) -> bool {
        self.lock().is_submitting()
    }

    /// Overwrites one text field. `Field::Cv` is ignored; use `select_cv`.
    pub fn set_field(&self, field: Field, value: impl Into<String>) {
        let mut state = self.lock();
        let value = value.into();
        match field {
            Field::Name => state.draft.name = value,
            Field::Email => state.draft.email = value,
            Field::Phone => state.draft.phone = value,
            Field::Cv => {}
        }
    }

    pub fn select_cv(&self, cv: CvFile) {
        self.lock().draft.cv = Some(cv);
    }

    pub fn dismiss_notice(&self) {
        self.lock().notice = None;
    }

    /// Submits the current draft. At most one submission runs at a time.
    pub async fn submit(&self) -> SubmitAttempt {
        let draft = {
            let mut state = self.lock();
            if state.is_submitting() {
                return SubmitAttempt::AlreadySubmitting;
            }
            let missing = state.draft.missing_fields();
            if !missing.is_empty() {
                return SubmitAttempt::Incomplete(missing);
            }
            state.status = SubmissionStatus::Submitting;
            state.notice = None;
            state.upload = None;
            state.draft.clone()
        };
        let in_flight = InFlight {
            form: self,
            settled: false,
        };

        let submission_id = Uuid::new_v4();
        let span = info_span!("submission", %submission_id);

        let outcome = async {
            info!(
                "Dispatching application with {} ({} bytes)",
                draft.cv.as_ref().map_or("", |cv| cv.file_name.as_str()),
                draft.cv.as_ref().map_or(0, |cv| cv.size())
            );
            match self.submitter.submit(&draft).await {
                Ok(response) => {
                    info!("Application accepted, cv_link={}", response.cv_link);
                    SubmissionOutcome::Succeeded(response.cv_link)
                }
                Err(e) => {
                    warn!("Application submission failed: {e}");
                    SubmissionOutcome::Failed(FAILURE_MESSAGE.to_string())
                }
            }
        }
        .instrument(span)
        .await;

        in_flight.settle(&outcome);
        SubmitAttempt::Completed(outcome)
    }

    fn apply_outcome(&self, outcome: &SubmissionOutcome) {
        let mut state = self.lock();
        match outcome {
            SubmissionOutcome::Succeeded(cv_link) => {
                state.status = SubmissionStatus::Succeeded;
                state.draft = ApplicationDraft::default();
                state.upload = Some(UploadResult {
                    cv_link: cv_link.clone(),
                    submitted_at: Utc::now(),
                });
                state.notice = Some(Notice {
                    kind: NoticeKind::Success,
                    message: SUCCESS_MESSAGE.to_string(),
                });
            }
            SubmissionOutcome::Failed(message) => {
                // The draft stays as it was so the applicant can retry.
                state.status = SubmissionStatus::Failed;
                state.notice = Some(Notice {
                    kind: NoticeKind::Error,
                    message: message.clone(),
                });
            }
        }
    }
}

/// Marks a dispatched submission. Dropped unsettled, it fails the form.
struct InFlight<'a> {
    form: &'a ApplicationForm,
    settled: bool,
}

impl InFlight<'_> {
    fn settle(mut self, outcome: &SubmissionOutcome) {
        self.form.apply_outcome(outcome);
        self.settled = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            warn!("Submission abandoned before the API answered");
            self.form
                .apply_outcome(&SubmissionOutcome::Failed(FAILURE_MESSAGE.to_string()));
        }
    }
}
