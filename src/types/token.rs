/// A cancellation token used to signal run shutdown.
///
/// This is a type alias for [`tokio_util::sync::CancellationToken`]. Pass the
/// token to [`RunCoordinator::new`](crate::RunCoordinator::new) and call
/// [`cancel()`](tokio_util::sync::CancellationToken::cancel) on it to request
/// graceful shutdown of a running sweep (e.g., in a Ctrl+C handler). A
/// cancelled run commits nothing: the worklist is left untouched.
pub type RunCancellationToken = tokio_util::sync::CancellationToken;

/// Create a new [`RunCancellationToken`].
///
/// # Example
///
/// ```
/// use s3sweep::create_run_cancellation_token;
///
/// let token = create_run_cancellation_token();
/// assert!(!token.is_cancelled());
///
/// // Cancel the token (e.g., from a signal handler)
/// token.cancel();
/// assert!(token.is_cancelled());
/// ```
pub fn create_run_cancellation_token() -> RunCancellationToken {
    tokio_util::sync::CancellationToken::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_cancellation_token() {
        create_run_cancellation_token();
    }
}
