use anyhow::Error;
use thiserror::Error;

/// Application-level error types for s3sweep.
///
/// These classify why a target failed so the run coordinator can decide
/// what stays in the worklist and what gets written to the error record.
///
/// ## Exit Codes
///
/// Each variant maps to an exit code (via `exit_code()`):
/// - 1: General errors (Backend, Io, Cancelled)
/// - 2: Configuration/input errors (Parse)
/// - 3: Run completed but some targets failed (the CLI maps a report with
///   failures to this code; `BucketNotEmpty` belongs here because a retry
///   is expected to succeed)
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SweepError {
    /// Malformed worklist line (empty bucket name).
    #[error("malformed worklist line: {0}")]
    Parse(String),

    /// A backend list/delete/probe call failed for a target.
    #[error("backend error for {target}: {detail}")]
    Backend { target: String, detail: String },

    /// The post-clear existence probe still found objects in the bucket.
    /// Retriable: concurrent writers or eventual consistency, not a hard
    /// backend failure.
    #[error("bucket '{0}' still contains objects after clearing; a retry is expected to succeed")]
    BucketNotEmpty(String),

    /// Worklist or error-record file I/O failed.
    #[error("I/O error: {0}")]
    Io(String),

    /// Run cancelled before the target completed.
    #[error("run cancelled before target completed")]
    Cancelled,
}

impl SweepError {
    /// Get the appropriate process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            SweepError::Parse(_) => 2,
            SweepError::BucketNotEmpty(_) => 3,
            SweepError::Backend { .. } | SweepError::Io(_) | SweepError::Cancelled => 1,
        }
    }

    /// Check if a retry of the same target is expected to succeed.
    ///
    /// Only the post-clear emptiness probe failure is retriable; it is
    /// explicitly distinguished in logs from hard backend errors so
    /// operators know a retry should clear it.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SweepError::BucketNotEmpty(_))
    }
}

/// Check if an anyhow::Error wraps a cancellation error.
pub fn is_cancelled_error(e: &Error) -> bool {
    if let Some(err) = e.downcast_ref::<SweepError>() {
        return *err == SweepError::Cancelled;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn exit_codes() {
        assert_eq!(SweepError::Parse("x".to_string()).exit_code(), 2);
        assert_eq!(
            SweepError::Backend {
                target: "s3://b/k".to_string(),
                detail: "AccessDenied".to_string(),
            }
            .exit_code(),
            1
        );
        assert_eq!(SweepError::BucketNotEmpty("b".to_string()).exit_code(), 3);
        assert_eq!(SweepError::Io("denied".to_string()).exit_code(), 1);
        assert_eq!(SweepError::Cancelled.exit_code(), 1);
    }

    #[test]
    fn only_bucket_not_empty_is_retryable() {
        assert!(SweepError::BucketNotEmpty("b".to_string()).is_retryable());
        assert!(!SweepError::Parse("x".to_string()).is_retryable());
        assert!(
            !SweepError::Backend {
                target: "s3://b".to_string(),
                detail: "x".to_string(),
            }
            .is_retryable()
        );
        assert!(!SweepError::Io("x".to_string()).is_retryable());
        assert!(!SweepError::Cancelled.is_retryable());
    }

    #[test]
    fn error_display_messages() {
        assert_eq!(
            SweepError::Parse("''".to_string()).to_string(),
            "malformed worklist line: ''"
        );
        assert_eq!(
            SweepError::Backend {
                target: "s3://b/k".to_string(),
                detail: "AccessDenied (no message)".to_string(),
            }
            .to_string(),
            "backend error for s3://b/k: AccessDenied (no message)"
        );
        assert_eq!(
            SweepError::BucketNotEmpty("mybucket".to_string()).to_string(),
            "bucket 'mybucket' still contains objects after clearing; a retry is expected to succeed"
        );
    }

    #[test]
    fn is_cancelled_error_test() {
        assert!(is_cancelled_error(&anyhow!(SweepError::Cancelled)));
        assert!(!is_cancelled_error(&anyhow!(SweepError::Io(
            "x".to_string()
        ))));
        assert!(!is_cancelled_error(&anyhow!("generic error")));
    }
}
