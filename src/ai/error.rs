//! Failure taxonomy for LLM calls

use thiserror::Error;

/// Whether a failure is expected to clear up on its own
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Rate limiting or timeouts; worth retrying
    Transient,
    /// Everything else; retrying will not help
    Permanent,
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("request timed out")]
    Timeout,

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("invalid response from model: {0}")]
    InvalidResponse(String),

    #[error("request failed: {0}")]
    Request(String),

    /// Transient failures persisted through every allowed attempt
    #[error("service unavailable after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: Box<LlmError>,
    },
}

impl LlmError {
    pub fn kind(&self) -> FailureKind {
        match self {
            LlmError::RateLimited(_) | LlmError::Timeout => FailureKind::Transient,
            _ => FailureKind::Permanent,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind() == FailureKind::Transient
    }

    /// True when the caller should report "try again later" rather than
    /// "request failed".
    pub fn is_unavailable(&self) -> bool {
        matches!(self, LlmError::Exhausted { .. })
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else if err.is_decode() {
            LlmError::InvalidResponse(err.to_string())
        } else {
            LlmError::Request(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(
            LlmError::RateLimited("slow down".into()).kind(),
            FailureKind::Transient
        );
        assert_eq!(LlmError::Timeout.kind(), FailureKind::Transient);
        assert_eq!(
            LlmError::Api {
                status: 400,
                message: "bad".into()
            }
            .kind(),
            FailureKind::Permanent
        );
        assert_eq!(
            LlmError::InvalidResponse("empty".into()).kind(),
            FailureKind::Permanent
        );
        assert_eq!(LlmError::Request("dns".into()).kind(), FailureKind::Permanent);
    }

    #[test]
    fn test_exhausted_is_unavailable_but_not_retried() {
        let err = LlmError::Exhausted {
            attempts: 3,
            last: Box::new(LlmError::Timeout),
        };
        assert!(err.is_unavailable());
        assert!(!err.is_transient());
        assert!(!LlmError::Timeout.is_unavailable());
        assert!(err.to_string().contains("3 attempts"));
    }
}
