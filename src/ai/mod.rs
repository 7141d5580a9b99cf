//! LLM-backed email features
//!
//! All model access goes through an OpenAI-compatible chat completion endpoint
//! (OpenRouter by default):
//! - Email classification into a fixed label set
//! - Action item extraction from structured output
//! - Reply drafting with subject/body parsing
//! - Free-form chat about the inbox

mod chat;
mod classify;
mod client;
mod draft;
mod error;
mod executor;
mod extract;
mod policy;
mod prompts;
mod retry;
mod service;
mod template;

pub use chat::{ChatContext, SelectedEmail};
pub use classify::Category;
pub use client::{ChatCompletion, OpenRouterClient};
pub use error::LlmError;
pub use extract::ActionItem;
pub use prompts::{
    DEFAULT_ACTION_ITEM_PROMPT, DEFAULT_AUTO_REPLY_PROMPT, DEFAULT_CATEGORIZATION_PROMPT,
};
pub use retry::RetryConfig;
pub use service::LlmService;
pub use template::PromptTemplate;

#[cfg(test)]
pub(crate) use service::testing;
