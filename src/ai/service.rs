//! Entry point for the LLM-backed email operations

use super::client::ChatCompletion;
use super::executor::RetryExecutor;
use super::retry::RetryConfig;

/// Low temperature for classification and extraction
pub const PRECISE_TEMPERATURE: f32 = 0.3;

/// Higher temperature for drafting and chat
pub const CREATIVE_TEMPERATURE: f32 = 0.7;

/// Classification, extraction, drafting and chat on top of one transport.
///
/// The operations live next to their parsers in `classify`, `extract`,
/// `draft` and `chat`.
pub struct LlmService<C> {
    pub(super) executor: RetryExecutor<C>,
}

impl<C: ChatCompletion> LlmService<C> {
    pub fn new(client: C, retry: RetryConfig) -> Self {
        Self {
            executor: RetryExecutor::new(client, retry),
        }
    }

    #[cfg(test)]
    pub(crate) fn client(&self) -> &C {
        self.executor.client()
    }
}
