//! Batch orchestration: drives the server-side batch endpoints for a list
//! of prospect ids, tracks aggregate progress, and publishes the completion
//! notice.

use std::sync::{Arc, Mutex};

use crate::notices::NoticeCenter;
use crate::prospects::types::{
    BatchItemFailure, BatchOutcome, EmailDraft, EmailDraftKind, ResearchProvider, SoftCompanyData,
};
use crate::prospects::ProspectService;

/// Aggregate progress of the batch in flight (or the last one finished).
/// `completed`/`failed` advance monotonically up to `total` while running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchProgress {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub running: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOperation {
    SoftData,
    EmailGeneration,
}

/// Counts and per-item failures of the last finished batch, kept for the
/// results panel.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub operation: BatchOperation,
    pub total_count: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub failures: Vec<BatchItemFailure>,
}

/// Runs batches and owns their progress state. The notice center is shared
/// process-wide; progress is per runner instance.
pub struct BatchRunner {
    service: Arc<ProspectService>,
    notices: Arc<NoticeCenter>,
    progress: Mutex<BatchProgress>,
    last_report: Mutex<Option<BatchReport>>,
    last_error: Mutex<Option<String>>,
}

impl BatchRunner {
    pub fn new(service: Arc<ProspectService>, notices: Arc<NoticeCenter>) -> Self {
        Self {
            service,
            notices,
            progress: Mutex::new(BatchProgress::default()),
            last_report: Mutex::new(None),
            last_error: Mutex::new(None),
        }
    }

    pub fn progress(&self) -> BatchProgress {
        *self.progress.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn is_processing(&self) -> bool {
        self.progress().running
    }

    pub fn last_report(&self) -> Option<BatchReport> {
        self.last_report
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn reset_progress(&self) {
        *self.progress.lock().unwrap_or_else(|e| e.into_inner()) = BatchProgress::default();
        *self.last_report.lock().unwrap_or_else(|e| e.into_inner()) = None;
        *self.last_error.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }

    /// Generate company research for the selected prospects. Returns `None`
    /// when the batch was rejected or failed; the reason is in
    /// [`BatchRunner::last_error`].
    pub async fn run_soft_data(
        &self,
        ids: &[String],
        provider: ResearchProvider,
    ) -> Option<BatchOutcome<SoftCompanyData>> {
        if !self.begin(ids) {
            return None;
        }

        let result = self.service.generate_soft_data_batch(ids, provider).await;
        self.finish(BatchOperation::SoftData, result)
    }

    /// Generate email drafts for the selected prospects.
    pub async fn run_email_generation(
        &self,
        ids: &[String],
        kind: Option<EmailDraftKind>,
        auto_generate_soft_data: bool,
        provider: ResearchProvider,
    ) -> Option<BatchOutcome<EmailDraft>> {
        if !self.begin(ids) {
            return None;
        }

        let result = self
            .service
            .generate_email_batch(ids, kind, auto_generate_soft_data, provider)
            .await;
        self.finish(BatchOperation::EmailGeneration, result)
    }

    /// Complete flow: research first, then email drafts from the collected
    /// data. The email stage never auto-generates research (it just ran),
    /// and a failed research stage aborts the chain.
    pub async fn run_complete_flow(
        &self,
        ids: &[String],
        provider: ResearchProvider,
        email_kind: EmailDraftKind,
    ) -> bool {
        let soft_data = self.run_soft_data(ids, provider).await;
        if soft_data.is_none() {
            return false;
        }

        self.run_email_generation(ids, Some(email_kind), false, provider)
            .await
            .is_some()
    }

    /// Validate the id list and arm the progress state. An empty selection
    /// is a precondition failure: no network call is made.
    fn begin(&self, ids: &[String]) -> bool {
        if ids.is_empty() {
            tracing::warn!("Batch rejected: no prospects selected");
            *self.last_error.lock().unwrap_or_else(|e| e.into_inner()) =
                Some("No prospects selected".to_string());
            return false;
        }

        *self.progress.lock().unwrap_or_else(|e| e.into_inner()) = BatchProgress {
            total: ids.len(),
            completed: 0,
            failed: 0,
            running: true,
        };
        *self.last_report.lock().unwrap_or_else(|e| e.into_inner()) = None;
        *self.last_error.lock().unwrap_or_else(|e| e.into_inner()) = None;
        true
    }

    fn finish<T>(
        &self,
        operation: BatchOperation,
        result: Result<BatchOutcome<T>, crate::api::ApiError>,
    ) -> Option<BatchOutcome<T>> {
        match result {
            Ok(outcome) => {
                {
                    let mut progress = self.progress.lock().unwrap_or_else(|e| e.into_inner());
                    progress.completed = outcome.success_count;
                    progress.failed = outcome.failure_count;
                    progress.running = false;
                }
                *self.last_report.lock().unwrap_or_else(|e| e.into_inner()) = Some(BatchReport {
                    operation,
                    total_count: outcome.total_count,
                    success_count: outcome.success_count,
                    failure_count: outcome.failure_count,
                    failures: outcome.failures.clone(),
                });

                self.notices
                    .publish_completion(outcome.success_count, outcome.failure_count);
                tracing::info!(
                    "Batch finished: {} succeeded, {} failed",
                    outcome.success_count,
                    outcome.failure_count
                );
                Some(outcome)
            }
            Err(e) => {
                self.progress
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .running = false;
                tracing::error!("Batch operation failed: {}", e);
                *self.last_error.lock().unwrap_or_else(|e| e.into_inner()) = Some(e.to_string());
                None
            }
        }
    }
}
