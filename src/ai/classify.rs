//! Email classification into a fixed label set

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::client::{ChatCompletion, CompletionOptions};
use super::error::LlmError;
use super::policy::{Operation, resolve_failure};
use super::prompts;
use super::service::{LlmService, PRECISE_TEMPERATURE};
use super::template::PromptTemplate;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Important,
    Newsletter,
    Spam,
    #[serde(rename = "To-Do")]
    ToDo,
    #[default]
    Uncategorized,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Important,
        Category::Newsletter,
        Category::Spam,
        Category::ToDo,
        Category::Uncategorized,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Important => "Important",
            Category::Newsletter => "Newsletter",
            Category::Spam => "Spam",
            Category::ToDo => "To-Do",
            Category::Uncategorized => "Uncategorized",
        }
    }

    /// Map raw model output onto a label; anything unrecognized is
    /// `Uncategorized`.
    pub fn from_model_output(raw: &str) -> Self {
        raw.parse().unwrap_or_else(|_| {
            tracing::warn!(
                "Invalid category returned: {:?}. Defaulting to Uncategorized.",
                raw.trim()
            );
            Category::Uncategorized
        })
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown category: {}", s))
    }
}

impl<C: ChatCompletion> LlmService<C> {
    /// Classify an email. Unknown labels and malformed responses give
    /// `Uncategorized`; exhausted retries and API rejections are returned.
    pub async fn classify(
        &self,
        content: &str,
        template: &PromptTemplate,
    ) -> Result<Category, LlmError> {
        let user_prompt = template.render(content);

        match self
            .executor
            .execute(
                prompts::CATEGORIZE_SYSTEM,
                &user_prompt,
                CompletionOptions::text(PRECISE_TEMPERATURE),
            )
            .await
        {
            Ok(raw) => Ok(Category::from_model_output(&raw)),
            Err(e) => resolve_failure(Operation::Classify, e, Some(Category::Uncategorized)),
        }
    }
}
