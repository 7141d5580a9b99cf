//! Prompt templates with a single email-content slot

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// The placeholder replaced by the email being processed.
pub const EMAIL_SLOT: &str = "{email_content}";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("template has no {{email_content}} placeholder")]
    MissingSlot,
    #[error("template has {0} {{email_content}} placeholders, expected exactly one")]
    DuplicateSlot(usize),
}

/// Prompt text with exactly one `{email_content}` slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate(String);

impl PromptTemplate {
    pub fn new(text: impl Into<String>) -> Result<Self, TemplateError> {
        let text = text.into();
        match text.matches(EMAIL_SLOT).count() {
            0 => Err(TemplateError::MissingSlot),
            1 => Ok(Self(text)),
            n => Err(TemplateError::DuplicateSlot(n)),
        }
    }

    /// Wrap one of the built-in default prompts without re-checking its slot.
    pub(crate) fn builtin(text: &'static str) -> Self {
        Self(text.to_string())
    }

    /// Substitute `content` into the slot. Braces inside `content` are left
    /// alone, the template is scanned only once.
    pub fn render(&self, content: &str) -> String {
        self.0.replacen(EMAIL_SLOT, content, 1)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PromptTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for PromptTemplate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PromptTemplate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        PromptTemplate::new(text).map_err(serde::de::Error::custom)
    }
}
