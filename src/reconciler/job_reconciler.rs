use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::config::{ExpiryAction, ReconcilerConfig};
use crate::db::filter::Filter;
use crate::db::models::{
    from_document, to_document, Job, JobHistoryRecord, JobStatus, CANDIDATES, END_DATE_FORMAT,
    JOBS, JOB_HISTORY,
};
use crate::db::store::{Document, DocumentStore, FindOptions, SortOrder, StoreError, ID_FIELD};

/// Failure that stopped a sweep before it went through every expired job
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The expired-job scan itself failed; nothing was processed
    #[error("failed to scan for expired jobs: {source}")]
    Scan {
        #[source]
        source: StoreError,
    },

    /// The store went away mid-sweep
    #[error("sweep aborted after archiving {archived} jobs: {source}")]
    Aborted {
        archived: usize,
        #[source]
        source: StoreError,
    },
}

impl ReconcileError {
    /// Jobs archived before the sweep stopped
    pub fn archived(&self) -> usize {
        match self {
            ReconcileError::Scan { .. } => 0,
            ReconcileError::Aborted { archived, .. } => *archived,
        }
    }
}

/// Outcome of one sweep
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Expired open jobs selected by the scan
    pub scanned: usize,
    /// Jobs retired in this sweep (archived, or closed in place)
    pub archived: usize,
    /// Jobs kept live because a candidate holds a qualifying status
    pub protected: usize,
    /// Jobs a concurrent sweep archived first
    pub already_archived: usize,
    /// Live rows removed because their history record already existed
    pub stale_removed: usize,
    /// Jobs skipped because of a per-job error
    pub failed: usize,
}

enum JobOutcome {
    Archived,
    Protected,
    AlreadyArchived,
    /// History already held the job; only the lingering live row was deleted
    StaleRemoved,
    /// Someone else removed or changed the job between scan and write
    Vanished,
}

#[derive(Debug, Error)]
enum JobError {
    #[error("malformed job document: {0}")]
    Malformed(StoreError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl JobError {
    fn into_systemic(self) -> Result<StoreError, JobError> {
        match self {
            JobError::Store(err) if err.is_systemic() => Ok(err),
            other => Err(other),
        }
    }
}

/// Retires expired job postings that nobody was placed into.
///
/// A sweep walks open jobs whose `end_date` is on or before today, oldest
/// `end_date` first, in pages of `scan_limit`. Each one without a qualifying
/// candidate gets a history record and then loses its live row. Jobs that stay
/// (protected or failing) are paged past, so they never hide later jobs; a
/// sweep stops after `scan_limit` archivals and leaves the rest to the next one.
///
/// Insert comes before delete so a crash in between leaves a duplicate rather
/// than a lost job. The next sweep finds the history record and deletes the
/// lingering live row.
///
/// Safe to call from many tasks at once. Without `serialize_sweeps` two
/// sweeps racing on the same job can both pass the history check; a unique
/// index on `original_job_id` (PostgreSQL backend) turns the second insert
/// into a skip.
pub struct JobReconciler {
    store: Arc<dyn DocumentStore>,
    config: ReconcilerConfig,
    sweep_lock: Option<Mutex<()>>,
}

impl JobReconciler {
    pub fn new(store: Arc<dyn DocumentStore>, config: ReconcilerConfig) -> Self {
        let sweep_lock = config.serialize_sweeps.then(|| Mutex::new(()));
        Self {
            store,
            config,
            sweep_lock,
        }
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// Run one sweep as of the current instant.
    pub async fn reconcile(&self) -> Result<ReconcileReport, ReconcileError> {
        self.reconcile_at(Utc::now()).await
    }

    /// Run a sweep on behalf of a request handler.
    ///
    /// Failures are logged and swallowed; the caller goes on serving its
    /// request with whatever the store holds.
    pub async fn reconcile_or_warn(&self, caller: &str) -> Option<ReconcileReport> {
        match self.reconcile().await {
            Ok(report) => Some(report),
            Err(e) => {
                warn!(
                    "Reconcile before {} failed, continuing with current data: {}",
                    caller, e
                );
                None
            }
        }
    }

    /// Run one sweep as of `now`.
    pub async fn reconcile_at(&self, now: DateTime<Utc>) -> Result<ReconcileReport, ReconcileError> {
        let _guard = match &self.sweep_lock {
            Some(lock) => Some(lock.lock().await),
            None => None,
        };

        let today = now.format(END_DATE_FORMAT).to_string();
        let expired_filter = Filter::new()
            .eq("status", JobStatus::Open.as_str())
            .lte("end_date", today.as_str());
        let page_size = self.config.scan_limit;

        let mut report = ReconcileReport::default();
        // Expired jobs examined this sweep that are still open and expired.
        let mut retained = 0;

        'sweep: loop {
            let page = self
                .store
                .find(
                    JOBS,
                    &expired_filter,
                    FindOptions::limit(page_size)
                        .with_skip(retained)
                        .sorted_by("end_date", SortOrder::Ascending),
                )
                .await
                .map_err(|source| {
                    if report.scanned == 0 {
                        ReconcileError::Scan { source }
                    } else {
                        ReconcileError::Aborted {
                            archived: report.archived,
                            source,
                        }
                    }
                })?;
            let fetched = page.len();
            debug!("Fetched {} expired jobs past offset {}", fetched, retained);

            for document in page {
                if report.archived >= self.config.scan_limit {
                    debug!(
                        "Scan limit of {} reached; remaining expired jobs wait for the next sweep",
                        self.config.scan_limit
                    );
                    break 'sweep;
                }

                let label = job_label(&document);
                report.scanned += 1;

                match self.process_job(document, now).await {
                    Ok(JobOutcome::Archived) => report.archived += 1,
                    Ok(JobOutcome::Protected) => {
                        report.protected += 1;
                        retained += 1;
                    }
                    Ok(JobOutcome::AlreadyArchived) => report.already_archived += 1,
                    Ok(JobOutcome::StaleRemoved) => report.stale_removed += 1,
                    Ok(JobOutcome::Vanished) => {}
                    Err(err) => match err.into_systemic() {
                        Ok(source) => {
                            error!("Store unavailable while processing job {}: {}", label, source);
                            return Err(ReconcileError::Aborted {
                                archived: report.archived,
                                source,
                            });
                        }
                        Err(err) => {
                            error!("Error processing job {}: {}", label, err);
                            report.failed += 1;
                            retained += 1;
                        }
                    },
                }
            }

            if fetched == 0 || fetched < page_size {
                break;
            }
        }

        info!(
            "Reconcile up to {} finished: {} scanned, {} archived, {} protected, {} already archived, {} stale removed, {} failed",
            today,
            report.scanned,
            report.archived,
            report.protected,
            report.already_archived,
            report.stale_removed,
            report.failed
        );
        Ok(report)
    }

    async fn process_job(&self, document: Document, now: DateTime<Utc>) -> Result<JobOutcome, JobError> {
        let job: Job = from_document(document).map_err(JobError::Malformed)?;
        let key = job.id.clone().ok_or_else(|| {
            JobError::Malformed(StoreError::InvalidDocument("job has no storage key".to_string()))
        })?;

        if self.has_qualifying_candidate(&job).await? {
            debug!("Job {} has a qualifying candidate, keeping it live", job.job_id);
            return Ok(JobOutcome::Protected);
        }

        match self.config.expiry_action {
            ExpiryAction::Archive => self.archive(&job, &key, now).await,
            ExpiryAction::MarkClosed => self.mark_closed(&job, &key).await,
        }
    }

    async fn has_qualifying_candidate(&self, job: &Job) -> Result<bool, StoreError> {
        if self.config.qualifying_statuses.is_empty() {
            return Ok(false);
        }

        let filter = Filter::new()
            .eq("job_id", job.job_id.as_str())
            .is_in("status", self.config.qualifying_statuses.iter().map(String::as_str));
        Ok(self.store.find_one(CANDIDATES, &filter).await?.is_some())
    }

    async fn archive(&self, job: &Job, key: &str, now: DateTime<Utc>) -> Result<JobOutcome, JobError> {
        let history_filter = Filter::new().eq("original_job_id", key);
        if self.store.find_one(JOB_HISTORY, &history_filter).await?.is_some() {
            // History is authoritative; the live row is a leftover of an interrupted archival.
            let deleted = self
                .store
                .delete_one(JOBS, &Filter::new().eq(ID_FIELD, key))
                .await?;
            if deleted == 0 {
                return Ok(JobOutcome::Vanished);
            }
            info!("Job {} already in history, removed its stale live row", job.job_id);
            return Ok(JobOutcome::StaleRemoved);
        }

        self.move_to_history(job, key, now).await
    }

    /// Insert the history record, then delete the live job.
    async fn move_to_history(
        &self,
        job: &Job,
        key: &str,
        now: DateTime<Utc>,
    ) -> Result<JobOutcome, JobError> {
        let record = JobHistoryRecord::archive(
            job,
            key,
            now,
            &self.config.archive_reason,
            self.config.archived_status,
        );
        match self.store.insert_one(JOB_HISTORY, to_document(&record)?).await {
            Ok(history_id) => debug!("Job {} copied to history as {}", job.job_id, history_id),
            Err(StoreError::Duplicate { .. }) => {
                info!("Job {} was archived by a concurrent sweep, skipping", job.job_id);
                return Ok(JobOutcome::AlreadyArchived);
            }
            Err(e) => return Err(e.into()),
        }

        let deleted = self
            .store
            .delete_one(JOBS, &Filter::new().eq(ID_FIELD, key))
            .await?;
        if deleted == 0 {
            debug!("Job {} was already removed from live jobs", job.job_id);
            return Ok(JobOutcome::Vanished);
        }

        info!("Moved job {} to history", job.job_id);
        Ok(JobOutcome::Archived)
    }

    async fn mark_closed(&self, job: &Job, key: &str) -> Result<JobOutcome, JobError> {
        let mut set = Document::new();
        set.insert(
            "status".to_string(),
            Value::String(self.config.archived_status.as_str().to_string()),
        );

        let filter = Filter::new()
            .eq(ID_FIELD, key)
            .eq("status", JobStatus::Open.as_str());
        let matched = self.store.update_one(JOBS, &filter, set).await?;
        if matched == 0 {
            return Ok(JobOutcome::Vanished);
        }

        info!("Updated job {} to {}", job.job_id, self.config.archived_status);
        Ok(JobOutcome::Archived)
    }
}

fn job_label(document: &Document) -> String {
    document
        .get("job_id")
        .and_then(Value::as_str)
        .or_else(|| document.get(ID_FIELD).and_then(Value::as_str))
        .unwrap_or("unknown")
        .to_string()
}
