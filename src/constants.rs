//! Application-wide constants for tuning and configuration
//!
//! Centralizes magic numbers to make them discoverable and configurable.

/// OpenAI-compatible endpoint used when the config does not name one.
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Model identifier in OpenRouter's `vendor/model` format.
pub const DEFAULT_MODEL: &str = "openai/gpt-3.5-turbo";

/// Timeout for a single completion request in seconds.
/// Retries get a fresh timeout each.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Total attempts for rate-limited or timed-out requests.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Delay before the first retry in seconds; doubles on each retry.
pub const DEFAULT_INITIAL_BACKOFF_SECS: u64 = 2;

/// Upper bound for the delay between retries in seconds.
pub const DEFAULT_MAX_BACKOFF_SECS: u64 = 10;
