//! Retry-once on file contention
//!
//! Every restore step that mutates live data goes through
//! [`with_contention_retry`]. When the step fails because another process
//! holds a file open, the process guard runs again and the step is retried
//! exactly once. Any other error, or a second failure, is returned as is.

use tracing::warn;

use crate::error::UserDataResult;
use crate::process::ProcessGuard;

pub fn with_contention_retry<T, F>(
    guard: &dyn ProcessGuard,
    process_names: &[String],
    mut step: F,
) -> UserDataResult<T>
where
    F: FnMut() -> UserDataResult<T>,
{
    match step() {
        Err(e) if e.is_contention() => {
            warn!(error = %e, "file in use; stopping processes and retrying once");
            guard.terminate_all(process_names);
            step()
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UserDataError;
    use crate::process::testing::RecordingGuard;
    use std::cell::Cell;

    fn names() -> Vec<String> {
        vec!["chrome".to_string()]
    }

    #[test]
    fn test_success_runs_once() {
        let guard = RecordingGuard::default();
        let attempts = Cell::new(0);

        let result = with_contention_retry(&guard, &names(), || {
            attempts.set(attempts.get() + 1);
            Ok(7)
        });

        assert_eq!(result.unwrap(), 7);
        assert_eq!(attempts.get(), 1);
        assert_eq!(guard.call_count(), 0);
    }

    #[test]
    fn test_contention_retries_exactly_once() {
        let guard = RecordingGuard::default();
        let attempts = Cell::new(0);

        let result = with_contention_retry(&guard, &names(), || {
            attempts.set(attempts.get() + 1);
            if attempts.get() == 1 {
                Err(UserDataError::Contention("Bookmarks".into()))
            } else {
                Ok(())
            }
        });

        assert!(result.is_ok());
        assert_eq!(attempts.get(), 2);
        assert_eq!(guard.call_count(), 1);
        assert_eq!(guard.calls.borrow()[0], names());
    }

    #[test]
    fn test_second_contention_is_terminal() {
        let guard = RecordingGuard::default();
        let attempts = Cell::new(0);

        let result: UserDataResult<()> = with_contention_retry(&guard, &names(), || {
            attempts.set(attempts.get() + 1);
            Err(UserDataError::Contention("Bookmarks".into()))
        });

        assert!(result.unwrap_err().is_contention());
        assert_eq!(attempts.get(), 2);
        assert_eq!(guard.call_count(), 1);
    }

    #[test]
    fn test_other_errors_are_not_retried() {
        let guard = RecordingGuard::default();
        let attempts = Cell::new(0);

        let result: UserDataResult<()> = with_contention_retry(&guard, &names(), || {
            attempts.set(attempts.get() + 1);
            Err(UserDataError::Io("disk full".into()))
        });

        assert!(result.is_err());
        assert_eq!(attempts.get(), 1);
        assert_eq!(guard.call_count(), 0);
    }
}
