//! Action item extraction from structured model output

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::client::{ChatCompletion, CompletionOptions};
use super::error::LlmError;
use super::policy::{Operation, resolve_failure};
use super::prompts;
use super::service::{LlmService, PRECISE_TEMPERATURE};
use super::template::PromptTemplate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionItem {
    pub task: String,
    pub deadline: Option<String>,
}

impl ActionItem {
    /// Build an item from one element of the model's list. The element must
    /// be an object whose `task` is a non-blank scalar; numbers and booleans
    /// are kept as their JSON text.
    fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let task = match obj.get("task")? {
            Value::String(s) => s.trim().to_string(),
            scalar @ (Value::Number(_) | Value::Bool(_)) => scalar.to_string(),
            Value::Null | Value::Array(_) | Value::Object(_) => return None,
        };
        if task.is_empty() {
            return None;
        }

        let deadline = match obj.get("deadline") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        };

        Some(Self { task, deadline })
    }
}

/// Parse the model's JSON reply. Unparseable text or a non-array top level
/// gives an empty list; malformed elements are skipped.
pub fn parse_action_items(raw: &str) -> Vec<ActionItem> {
    let value: Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!("Failed to parse action items JSON: {}", e);
            tracing::debug!("Response was: {}", raw);
            return Vec::new();
        }
    };

    let Some(elements) = value.as_array() else {
        tracing::warn!("Action items response is not a list. Returning empty list.");
        return Vec::new();
    };

    elements.iter().filter_map(ActionItem::from_value).collect()
}

impl<C: ChatCompletion> LlmService<C> {
    /// Extract action items. Never fails on bad model output; only exhausted
    /// retries and API rejections are returned as errors.
    pub async fn extract_action_items(
        &self,
        content: &str,
        template: &PromptTemplate,
    ) -> Result<Vec<ActionItem>, LlmError> {
        let user_prompt = template.render(content);

        match self
            .executor
            .execute(
                prompts::ACTION_ITEMS_SYSTEM,
                &user_prompt,
                CompletionOptions::json(PRECISE_TEMPERATURE),
            )
            .await
        {
            Ok(raw) => Ok(parse_action_items(&raw)),
            Err(e) => resolve_failure(Operation::Extract, e, Some(Vec::new())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::service::testing::{replying, service};

    fn item(task: &str, deadline: Option<&str>) -> ActionItem {
        ActionItem {
            task: task.to_string(),
            deadline: deadline.map(str::to_string),
        }
    }

    #[test]
    fn test_drops_elements_without_task() {
        let items = parse_action_items(
            r#"[{"task":"A"},{"deadline":"x"},{"task":"B","deadline":"y"}]"#,
        );
        assert_eq!(items, vec![item("A", None), item("B", Some("y"))]);
    }

    #[test]
    fn test_non_list_or_malformed_gives_empty() {
        for raw in [
            "",
            "not json",
            r#"{"task":"A"}"#,
            r#"{"action_items":[{"task":"A"}]}"#,
            "42",
            "null",
            "[{\"task\": \"A\"",
        ] {
            assert!(parse_action_items(raw).is_empty(), "{raw:?}");
        }
    }

    #[test]
    fn test_skips_non_object_and_empty_tasks() {
        let items = parse_action_items(
            r#"["call Bob", 3, null, {"task": ""}, {"task": "   "}, {"task": null},
               {"task": ["a"]}, {"task": {"name": "a"}}, {"task": " Send report "}]"#,
        );
        assert_eq!(items, vec![item("Send report", None)]);
    }

    #[test]
    fn test_scalar_task_is_kept_as_text() {
        let items = parse_action_items(
            r#"[{"task": 42, "deadline": "Mon"}, {"task": "B"}, {"task": true}]"#,
        );
        assert_eq!(
            items,
            vec![item("42", Some("Mon")), item("B", None), item("true", None)]
        );
    }

    #[test]
    fn test_deadline_variants() {
        let items = parse_action_items(
            r#"[{"task":"a","deadline":null},{"task":"b","deadline":"Friday"},{"task":"c","deadline":20240105}]"#,
        );
        assert_eq!(
            items,
            vec![
                item("a", None),
                item("b", Some("Friday")),
                item("c", Some("20240105"))
            ]
        );
    }

    #[tokio::test]
    async fn test_extract_uses_json_mode() {
        let svc = replying(r#"[{"task":"Review the proposal","deadline":"Friday"}]"#);
        let template = PromptTemplate::new(prompts::DEFAULT_ACTION_ITEM_PROMPT).unwrap();

        let items = svc
            .extract_action_items("Please review the proposal by Friday", &template)
            .await
            .unwrap();

        assert_eq!(items, vec![item("Review the proposal", Some("Friday"))]);
        let calls = svc.client().calls();
        assert!(calls[0].options.json_mode);
        assert_eq!(calls[0].system_prompt, prompts::ACTION_ITEMS_SYSTEM);
        assert!(calls[0].user_prompt.contains("Please review the proposal by Friday"));
    }

    #[tokio::test]
    async fn test_extract_degrades_and_propagates_per_policy() {
        let template = PromptTemplate::new(prompts::DEFAULT_ACTION_ITEM_PROMPT).unwrap();

        let svc = service(vec![Err(LlmError::Request("connection reset".into()))]);
        assert!(svc.extract_action_items("x", &template).await.unwrap().is_empty());

        let svc = service(vec![
            Err(LlmError::RateLimited("busy".into())),
            Err(LlmError::RateLimited("busy".into())),
            Err(LlmError::RateLimited("busy".into())),
        ]);
        let err = svc.extract_action_items("x", &template).await.unwrap_err();
        assert!(err.is_unavailable());
    }
}
