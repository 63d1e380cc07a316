//! Result alias and helpers for errors a run can survive

use crate::error::RewriteError;

pub type Result<T> = std::result::Result<T, RewriteError>;

/// Triage of a failed rewrite step by [`RewriteError::is_recoverable`]
pub trait ResultExt<T> {
    /// `Ok(None)` for a recoverable error, which is logged; other errors pass through
    fn recoverable(self) -> Result<Option<T>>;

    /// Drop any error after logging it at a level matching its kind
    fn log_and_continue(self) -> Option<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn recoverable(self) -> Result<Option<T>> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_recoverable() => {
                tracing::warn!(error = %err, kind = ?err.kind(), "skipping after recoverable error");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    fn log_and_continue(self) -> Option<T> {
        let err = match self {
            Ok(value) => return Some(value),
            Err(err) => err,
        };
        if err.is_recoverable() {
            tracing::warn!(error = %err, kind = ?err.kind(), "ignoring error");
        } else {
            tracing::error!(error = %err, kind = ?err.kind(), "ignoring error");
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipe_errors_are_skipped() {
        let result: Result<u32> = Err(RewriteError::recipe_error("r", "bad option"));
        assert!(matches!(result.recoverable(), Ok(None)));

        let ok: Result<u32> = Ok(3);
        assert!(matches!(ok.recoverable(), Ok(Some(3))));
    }

    #[test]
    fn test_internal_errors_pass_through() {
        let result: Result<u32> = Err(RewriteError::internal_error("broken"));
        assert!(result.recoverable().is_err());
    }

    #[test]
    fn test_log_and_continue_drops_any_error() {
        let err: Result<u32> = Err(RewriteError::internal_error("broken"));
        assert_eq!(err.log_and_continue(), None);
    }
}
