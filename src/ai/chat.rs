//! Free-form chat about the inbox

use serde::{Deserialize, Serialize};

use super::client::{ChatCompletion, CompletionOptions};
use super::error::LlmError;
use super::policy::{Operation, resolve_failure};
use super::prompts;
use super::service::{CREATIVE_TEMPERATURE, LlmService};

/// The email the user is looking at
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedEmail {
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
}

/// Optional signals rendered into the chat prompt
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatContext {
    #[serde(default)]
    pub selected_email: Option<SelectedEmail>,
    /// Number of emails in the inbox
    #[serde(default)]
    pub inbox_count: Option<usize>,
    /// Number of open action items
    #[serde(default)]
    pub pending_tasks: Option<usize>,
}

fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    if value.trim().is_empty() {
        placeholder
    } else {
        value
    }
}

/// Build the user prompt: the question itself, then whichever context
/// signals are present.
pub fn build_chat_prompt(message: &str, context: &ChatContext) -> String {
    let mut prompt = message.to_string();

    if let Some(email) = &context.selected_email {
        prompt.push_str(&format!(
            "\n\nSelected Email:\nFrom: {}\nSubject: {}\nBody: {}",
            or_placeholder(&email.sender, "Unknown"),
            or_placeholder(&email.subject, "No subject"),
            or_placeholder(&email.body, "No content"),
        ));
    }
    if let Some(count) = context.inbox_count {
        prompt.push_str(&format!("\n\nTotal emails in inbox: {}", count));
    }
    if let Some(count) = context.pending_tasks {
        prompt.push_str(&format!("\n\nPending action items: {}", count));
    }

    prompt
}

impl<C: ChatCompletion> LlmService<C> {
    /// Answer a chat message. The reply is returned as the model wrote it.
    pub async fn chat(&self, message: &str, context: &ChatContext) -> Result<String, LlmError> {
        let user_prompt = build_chat_prompt(message, context);
        match self
            .executor
            .execute(
                prompts::CHAT_SYSTEM,
                &user_prompt,
                CompletionOptions::text(CREATIVE_TEMPERATURE),
            )
            .await
        {
            Ok(reply) => Ok(reply),
            Err(e) => resolve_failure(Operation::Chat, e, None),
        }
    }
}
