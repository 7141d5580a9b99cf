//! System prompts and default prompt templates

/// System prompt for email classification
pub const CATEGORIZE_SYSTEM: &str =
    "You are an email categorization assistant. Respond with only the category name.";

/// System prompt for action item extraction
pub const ACTION_ITEMS_SYSTEM: &str =
    "You are an action item extraction assistant. Always respond with valid JSON.";

/// System prompt for reply drafting
pub const DRAFT_SYSTEM: &str =
    "You are an email drafting assistant. Generate professional email replies.";

/// System prompt for the chat assistant
pub const CHAT_SYSTEM: &str = r#"You are an intelligent email assistant. You help users manage their inbox by:
- Answering questions about emails
- Summarizing email content
- Finding specific emails
- Extracting information from emails
- Providing task lists from action items

Be concise, helpful, and professional."#;

pub const DEFAULT_CATEGORIZATION_PROMPT: &str = r#"Categorize the following email into exactly one of these categories: Important, Newsletter, Spam, To-Do.

Rules:
- Important: Emails requiring immediate attention or from key contacts
- Newsletter: Bulk emails, marketing, or informational content
- Spam: Unsolicited or suspicious emails
- To-Do: Emails containing direct requests requiring user action

Email:
{email_content}

Respond with only the category name."#;

pub const DEFAULT_ACTION_ITEM_PROMPT: &str = r#"Extract all action items and tasks from the following email. For each task, identify the task description and any mentioned deadline.

Email:
{email_content}

Respond in JSON format:
[
  {
    "task": "description of the task",
    "deadline": "deadline if mentioned, otherwise null"
  }
]

If no action items are found, respond with an empty array: []"#;

pub const DEFAULT_AUTO_REPLY_PROMPT: &str = r#"Draft a professional email reply to the following email. The reply should:
- Be polite and concise
- Address the main points of the original email
- Maintain a professional tone
- If it's a meeting request, ask for an agenda

Original Email:
{email_content}

Generate a reply with:
Subject: [reply subject]
Body: [reply body]"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::PromptTemplate;

    #[test]
    fn test_defaults_are_valid_templates() {
        for text in [
            DEFAULT_CATEGORIZATION_PROMPT,
            DEFAULT_ACTION_ITEM_PROMPT,
            DEFAULT_AUTO_REPLY_PROMPT,
        ] {
            assert!(PromptTemplate::new(text).is_ok(), "invalid default: {text}");
        }
    }
}
