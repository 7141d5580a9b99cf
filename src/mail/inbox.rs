//! JSON inbox files and batch processing

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use super::types::{Email, ProcessedEmail};
use crate::ai::{ChatCompletion, LlmError, LlmService, PromptTemplate};

/// Load a JSON array of emails
pub fn load_inbox(path: &Path) -> Result<Vec<Email>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read inbox file: {}", path.display()))?;
    parse_inbox(&content).with_context(|| format!("Failed to parse inbox file: {}", path.display()))
}

/// Write the inbox back, including categories and action items.
pub fn save_inbox(path: &Path, emails: &[Email]) -> Result<()> {
    let content = serde_json::to_string_pretty(emails).context("Failed to serialize inbox")?;
    fs::write(path, content)
        .with_context(|| format!("Failed to write inbox file: {}", path.display()))
}

pub fn parse_inbox(content: &str) -> Result<Vec<Email>> {
    let mut emails: Vec<Email> = serde_json::from_str(content)?;
    assign_missing_ids(&mut emails);
    emails.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    Ok(emails)
}

/// Give every email without an id one derived from its position in the file.
fn assign_missing_ids(emails: &mut [Email]) {
    let mut taken: HashSet<String> = emails
        .iter()
        .filter(|e| !e.id.is_empty())
        .map(|e| e.id.clone())
        .collect();

    for (index, email) in emails.iter_mut().enumerate() {
        if !email.id.is_empty() {
            continue;
        }
        let mut id = format!("email-{}", index + 1);
        let mut suffix = 1;
        while taken.contains(&id) {
            suffix += 1;
            id = format!("email-{}-{}", index + 1, suffix);
        }
        tracing::debug!("Email at position {} has no id, using {}", index, id);
        taken.insert(id.clone());
        email.id = id;
    }
}

/// Number of action items stored across the inbox
pub fn pending_task_count(emails: &[Email]) -> usize {
    emails.iter().map(|e| e.action_items.len()).sum()
}

/// Classify and extract tasks for every email that still needs it, storing
/// the results on the emails.
///
/// Emails are handled one at a time. A failure on one email is logged and
/// reported, that email is left untouched and the rest are still processed.
pub async fn process_unprocessed<C: ChatCompletion>(
    service: &LlmService<C>,
    emails: &mut [Email],
    categorization: &PromptTemplate,
    action_items: &PromptTemplate,
) -> Vec<(String, Result<ProcessedEmail, LlmError>)> {
    let mut results = Vec::new();

    for email in emails.iter_mut().filter(|e| e.needs_processing()) {
        let outcome = process_one(service, email, categorization, action_items).await;
        match &outcome {
            Ok(done) => email.record_processing(done.category, done.action_items.clone()),
            Err(e) => tracing::error!("Failed to process email {}: {}", email.id, e),
        }
        results.push((email.id.clone(), outcome));
    }

    results
}

async fn process_one<C: ChatCompletion>(
    service: &LlmService<C>,
    email: &Email,
    categorization: &PromptTemplate,
    action_items: &PromptTemplate,
) -> Result<ProcessedEmail, LlmError> {
    let content = email.prompt_content();
    let category = service.classify(&content, categorization).await?;
    let tasks = service.extract_action_items(&content, action_items).await?;

    Ok(ProcessedEmail {
        id: email.id.clone(),
        category,
        action_items: tasks,
    })
}
