//! What each operation does when the model call fails.

use super::error::LlmError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Classify,
    Extract,
    Draft,
    Chat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnFailure {
    /// Return the error to the caller
    Propagate,
    /// Swallow the error and return the operation's safe default
    Degrade,
}

/// Exhausted retries and API rejections always reach the caller. Malformed
/// responses and local request errors only degrade for operations that have a
/// meaningful default (a category or an empty task list).
pub fn on_failure(op: Operation, err: &LlmError) -> OnFailure {
    match (op, err) {
        (_, LlmError::Exhausted { .. } | LlmError::Api { .. }) => OnFailure::Propagate,
        (Operation::Classify | Operation::Extract, _) => OnFailure::Degrade,
        (Operation::Draft | Operation::Chat, _) => OnFailure::Propagate,
    }
}

/// Apply the policy to a failed call. Operations without a safe default
/// pass `None` and always get the error back.
pub fn resolve_failure<T>(op: Operation, err: LlmError, default: Option<T>) -> Result<T, LlmError> {
    match (on_failure(op, &err), default) {
        (OnFailure::Degrade, Some(default)) => {
            tracing::warn!("{:?} degraded to default after error: {}", op, err);
            Ok(default)
        }
        _ => {
            tracing::error!("{:?} failed: {}", op, err);
            Err(err)
        }
    }
}
