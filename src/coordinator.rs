//! Run orchestration: load the worklist, process each target in order,
//! and commit the results back to the filesystem.
//!
//! The commit at run end is the single point where the worklist and the
//! error record change. A cancelled run commits nothing, so a rerun sees
//! the worklist exactly as it was.

use tracing::{error, info, warn};

use crate::config::Config;
use crate::processor::TargetProcessor;
use crate::storage::{Storage, create_storage};
use crate::types::error::SweepError;
use crate::types::token::RunCancellationToken;
use crate::worklist;

/// Outcome of one worklist line.
#[derive(Debug)]
pub struct RunRecord {
    /// The original trimmed worklist line, preserved verbatim for rewrite.
    pub line: String,
    pub deleted_count: u64,
    pub error: Option<SweepError>,
}

/// Summary of a whole run.
#[derive(Debug)]
pub struct RunReport {
    pub records: Vec<RunRecord>,
    /// Whether the worklist and error record were updated. False in
    /// dry-run mode and for cancelled runs.
    pub committed: bool,
    pub cancelled: bool,
}

impl RunReport {
    pub fn total(&self) -> usize {
        self.records.len()
    }

    pub fn succeeded(&self) -> usize {
        self.records.iter().filter(|r| r.error.is_none()).count()
    }

    pub fn failed(&self) -> usize {
        self.records.iter().filter(|r| r.error.is_some()).count()
    }

    pub fn deleted_count(&self) -> u64 {
        self.records.iter().map(|r| r.deleted_count).sum()
    }

    pub fn has_failures(&self) -> bool {
        self.failed() != 0
    }
}

/// Drives one sweep over the worklist.
pub struct RunCoordinator {
    config: Config,
    cancellation_token: RunCancellationToken,
    storage: Storage,
}

impl RunCoordinator {
    pub async fn new(config: Config, cancellation_token: RunCancellationToken) -> Self {
        let storage = create_storage(&config, cancellation_token.clone()).await;
        Self {
            config,
            cancellation_token,
            storage,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_storage(
        config: Config,
        cancellation_token: RunCancellationToken,
        storage: Storage,
    ) -> Self {
        Self {
            config,
            cancellation_token,
            storage,
        }
    }

    /// Process every worklist line in order, then commit.
    ///
    /// Only file-level I/O failures abort the run with an error; a target
    /// that fails is recorded and the run continues with the next line.
    pub async fn run(&self) -> Result<RunReport, SweepError> {
        let lines = worklist::load_worklist(&self.config.worklist_path)?;

        info!(
            worklist = %self.config.worklist_path.display(),
            targets = lines.len(),
            dry_run = self.config.dry_run,
            "run started."
        );

        let processor = TargetProcessor::new(
            self.storage.clone(),
            self.config.clone(),
            self.cancellation_token.clone(),
        );

        let mut records = Vec::with_capacity(lines.len());

        for line in lines {
            if self.cancellation_token.is_cancelled() {
                info!("run cancelled; remaining targets left unprocessed.");
                break;
            }

            let target = match worklist::parse_target(&line) {
                Ok(target) => target,
                Err(e) => {
                    warn!(line = line.as_str(), error = %e, "skipping malformed worklist line.");
                    records.push(RunRecord {
                        line,
                        deleted_count: 0,
                        error: Some(e),
                    });
                    continue;
                }
            };

            let outcome = processor.process(&target).await;

            match &outcome.error {
                None => {
                    info!(
                        target = %target,
                        deleted = outcome.deleted_count,
                        "target removed."
                    );
                }
                Some(e @ SweepError::BucketNotEmpty(_)) => {
                    warn!(
                        target = %target,
                        deleted = outcome.deleted_count,
                        error = %e,
                        "target kept in worklist; rerun to retry."
                    );
                }
                Some(e) => {
                    error!(
                        target = %target,
                        deleted = outcome.deleted_count,
                        error = %e,
                        "target failed."
                    );
                }
            }

            records.push(RunRecord {
                line,
                deleted_count: outcome.deleted_count,
                error: outcome.error,
            });
        }

        let cancelled = self.cancellation_token.is_cancelled();
        let committed = !cancelled && !self.config.dry_run;

        if cancelled {
            info!("run cancelled; worklist left untouched.");
        } else if self.config.dry_run {
            info!("[dry-run] worklist and error record left untouched.");
        } else {
            self.commit(&records)?;
        }

        let report = RunReport {
            records,
            committed,
            cancelled,
        };

        info!(
            total = report.total(),
            succeeded = report.succeeded(),
            failed = report.failed(),
            deleted = report.deleted_count(),
            "run finished."
        );

        Ok(report)
    }

    /// Rewrite the worklist to the failed lines and append each failure to
    /// the error record.
    fn commit(&self, records: &[RunRecord]) -> Result<(), SweepError> {
        let failed_lines: Vec<String> = records
            .iter()
            .filter(|r| r.error.is_some())
            .map(|r| r.line.clone())
            .collect();

        worklist::rewrite_worklist(&self.config.worklist_path, &failed_lines)?;

        for record in records {
            if let Some(ref e) = record.error {
                worklist::append_error_record(
                    &self.config.error_record_path,
                    &record.line,
                    &e.to_string(),
                )?;
            }
        }

        Ok(())
    }
}
