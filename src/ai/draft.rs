//! Reply drafting and parsing of the model's subject/body text

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::client::{ChatCompletion, CompletionOptions};
use super::error::LlmError;
use super::policy::{Operation, resolve_failure};
use super::prompts;
use super::service::{CREATIVE_TEMPERATURE, LlmService};
use super::template::PromptTemplate;

const FALLBACK_SUBJECT: &str = "Re: Your email";
const REPLY_PREFIX: &str = "Re: ";
const SUBJECT_PREVIEW_CHARS: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftResult {
    pub subject: String,
    pub body: String,
    /// Filled in by callers that track follow-ups; always `None` from parsing
    pub suggested_follow_ups: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    Scanning,
    InBody,
}

/// Strip `marker` from the start of `line`, ignoring ASCII case.
fn strip_marker<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    let head = line.get(..marker.len())?;
    head.eq_ignore_ascii_case(marker)
        .then(|| line[marker.len()..].trim())
}

/// Split a drafted reply into subject and body.
///
/// `Subject:` and `Body:` markers are recognized while scanning; after
/// `Body:` every remaining line is body text. Without markers the whole
/// response is the body and a subject is derived from its first line.
pub fn parse_draft_response(response: &str) -> DraftResult {
    let mut subject = String::new();
    let mut body_lines: Vec<&str> = Vec::new();
    let mut state = ParseState::Scanning;

    for line in response.lines() {
        match state {
            ParseState::InBody => body_lines.push(line),
            ParseState::Scanning => {
                let trimmed = line.trim();
                if let Some(rest) = strip_marker(trimmed, "subject:") {
                    subject = rest.to_string();
                } else if let Some(rest) = strip_marker(trimmed, "body:") {
                    state = ParseState::InBody;
                    if !rest.is_empty() {
                        body_lines.push(rest);
                    }
                }
            }
        }
    }

    let mut body = if subject.is_empty() && body_lines.is_empty() {
        let first_line = response.lines().next().unwrap_or_default().trim();
        if !first_line.is_empty() {
            let preview: String = first_line.chars().take(SUBJECT_PREVIEW_CHARS).collect();
            subject = format!("{}{}", REPLY_PREFIX, preview);
        }
        response.trim().to_string()
    } else {
        body_lines.join("\n").trim().to_string()
    };

    if body.is_empty() {
        body = response.trim().to_string();
    }
    if subject.is_empty() {
        subject = FALLBACK_SUBJECT.to_string();
    }

    DraftResult {
        subject,
        body,
        suggested_follow_ups: None,
    }
}

/// Render extra context appended to the drafting prompt, if any.
fn context_section(context: Option<&Map<String, Value>>) -> Option<String> {
    let context = context.filter(|c| !c.is_empty())?;
    let rendered = serde_json::to_string_pretty(context).ok()?;
    Some(format!("\n\nAdditional Context:\n{}", rendered))
}

impl<C: ChatCompletion> LlmService<C> {
    /// Draft a reply. Failures of the model call are always returned.
    pub async fn generate_draft(
        &self,
        content: &str,
        template: &PromptTemplate,
        context: Option<&Map<String, Value>>,
    ) -> Result<DraftResult, LlmError> {
        let mut user_prompt = template.render(content);
        if let Some(section) = context_section(context) {
            user_prompt.push_str(&section);
        }

        match self
            .executor
            .execute(
                prompts::DRAFT_SYSTEM,
                &user_prompt,
                CompletionOptions::text(CREATIVE_TEMPERATURE),
            )
            .await
        {
            Ok(raw) => Ok(parse_draft_response(&raw)),
            Err(e) => resolve_failure(Operation::Draft, e, None),
        }
    }
}
