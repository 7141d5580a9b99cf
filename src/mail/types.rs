use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ai::{ActionItem, Category, SelectedEmail};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Email {
    /// Filled in by the loader when the inbox file omits it
    #[serde(default)]
    pub id: String,
    pub sender: String,
    pub subject: String,
    pub body: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub processed: bool,
    #[serde(default)]
    pub action_items: Vec<ActionItem>,
}

impl Email {
    /// Text handed to the prompt templates
    pub fn prompt_content(&self) -> String {
        format!(
            "From: {}\nSubject: {}\n\n{}",
            self.sender, self.subject, self.body
        )
    }

    /// Emails that were never processed and carry no category yet
    pub fn needs_processing(&self) -> bool {
        !self.processed && self.category.is_none()
    }

    /// Store the outcome of classification and extraction on the email.
    pub fn record_processing(&mut self, category: Category, action_items: Vec<ActionItem>) {
        self.category = Some(category);
        self.action_items = action_items;
        self.processed = true;
    }

    pub fn as_selected(&self) -> SelectedEmail {
        SelectedEmail {
            sender: self.sender.clone(),
            subject: self.subject.clone(),
            body: self.body.clone(),
        }
    }
}

/// Result of running classification and extraction over one email
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedEmail {
    pub id: String,
    pub category: Category,
    pub action_items: Vec<ActionItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Email {
        serde_json::from_str(
            r#"{
                "id": "email-1",
                "sender": "boss@company.com",
                "subject": "Q3 report",
                "body": "Please send the Q3 report by Friday.",
                "timestamp": "2024-01-15T09:30:00Z"
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_defaults_for_optional_fields() {
        let email = sample();
        assert_eq!(email.category, None);
        assert!(!email.processed);
        assert!(email.action_items.is_empty());
        assert!(email.needs_processing());
        assert_eq!(email.timestamp.to_rfc3339(), "2024-01-15T09:30:00+00:00");
    }

    #[test]
    fn test_record_processing_marks_email_done() {
        let mut email = sample();
        email.record_processing(
            Category::ToDo,
            vec![ActionItem {
                task: "Send the Q3 report".to_string(),
                deadline: Some("Friday".to_string()),
            }],
        );

        assert_eq!(email.category, Some(Category::ToDo));
        assert_eq!(email.action_items.len(), 1);
        assert!(email.processed);
        assert!(!email.needs_processing());

        let json = serde_json::to_value(&email).unwrap();
        assert_eq!(json["category"], "To-Do");
        assert_eq!(json["action_items"][0]["deadline"], "Friday");
    }

    #[test]
    fn test_prompt_content_layout() {
        assert_eq!(
            sample().prompt_content(),
            "From: boss@company.com\nSubject: Q3 report\n\nPlease send the Q3 report by Friday."
        );
    }

    #[test]
    fn test_category_label_round_trip() {
        let email: Email = serde_json::from_str(
            r#"{"id":"2","sender":"a@b.c","subject":"s","body":"b",
                "timestamp":"2024-01-15T10:00:00+02:00","category":"To-Do","processed":true}"#,
        )
        .unwrap();
        assert_eq!(email.category, Some(Category::ToDo));
        assert!(email.processed);
        assert!(!email.needs_processing());
        assert_eq!(email.timestamp.to_rfc3339(), "2024-01-15T08:00:00+00:00");
    }
}
