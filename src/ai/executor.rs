//! Retrying wrapper around a chat completion transport

use super::client::{ChatCompletion, CompletionOptions};
use super::error::LlmError;
use super::retry::{RetryConfig, RetryError, with_retry};

/// Runs one logical completion, retrying transient failures.
#[derive(Clone)]
pub struct RetryExecutor<C> {
    client: C,
    retry: RetryConfig,
}

impl<C: ChatCompletion> RetryExecutor<C> {
    pub fn new(client: C, retry: RetryConfig) -> Self {
        Self { client, retry }
    }

    #[cfg(test)]
    pub(crate) fn client(&self) -> &C {
        &self.client
    }

    /// Rate limits and timeouts are retried with backoff; any other failure
    /// ends the call immediately.
    pub async fn execute(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: CompletionOptions,
    ) -> Result<String, LlmError> {
        let result = with_retry(&self.retry, LlmError::is_transient, || {
            self.client.complete(system_prompt, user_prompt, options)
        })
        .await;

        match result {
            Ok(text) => Ok(text),
            Err(RetryError::Aborted(e)) => Err(e),
            Err(RetryError::Exhausted { attempts, last }) => {
                tracing::error!("LLM call gave up after {} attempts: {}", attempts, last);
                Err(LlmError::Exhausted {
                    attempts,
                    last: Box::new(last),
                })
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    fn opts() -> CompletionOptions {
        CompletionOptions::text(0.5)
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let exec = executor(vec![
            Err(LlmError::RateLimited("busy".into())),
            Err(LlmError::Timeout),
            Ok("done".into()),
        ]);

        let reply = exec.execute("sys", "user", opts()).await.unwrap();

        assert_eq!(reply, "done");
        assert_eq!(exec.client().calls().len(), 3);
    }

    #[tokio::test]
    async fn test_all_transient_exhausts_after_three_attempts() {
        let exec = executor(vec![
            Err(LlmError::Timeout),
            Err(LlmError::Timeout),
            Err(LlmError::RateLimited("busy".into())),
            Ok("too late".into()),
        ]);

        let err = exec.execute("sys", "user", opts()).await.unwrap_err();

        assert!(err.is_unavailable());
        match err {
            LlmError::Exhausted { attempts, last } => {
                assert_eq!(attempts, 3);
                assert!(matches!(*last, LlmError::RateLimited(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(exec.client().calls().len(), 3);
    }

    #[tokio::test]
    async fn test_permanent_failure_is_not_retried() {
        let exec = executor(vec![
            Err(LlmError::Timeout),
            Err(LlmError::Api {
                status: 400,
                message: "bad request".into(),
            }),
            Ok("unreachable".into()),
        ]);

        let err = exec.execute("sys", "user", opts()).await.unwrap_err();

        assert!(matches!(err, LlmError::Api { status: 400, .. }));
        assert!(!err.is_unavailable());
        assert_eq!(exec.client().calls().len(), 2);
    }

    #[tokio::test]
    async fn test_prompts_and_options_reach_transport_unchanged() {
        let exec = executor(vec![Ok("ok".into())]);

        exec.execute("system text", "user text", CompletionOptions::json(0.3))
            .await
            .unwrap();

        let calls = exec.client().calls();
        assert_eq!(calls[0].system_prompt, "system text");
        assert_eq!(calls[0].user_prompt, "user text");
        assert_eq!(calls[0].options, CompletionOptions::json(0.3));
    }
}
