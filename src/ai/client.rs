//! OpenRouter (OpenAI-compatible) chat completion client

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use super::error::LlmError;

/// Per-request knobs for a completion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionOptions {
    /// Ask the model for a JSON object instead of prose
    pub json_mode: bool,
    pub temperature: f32,
}

impl CompletionOptions {
    pub fn text(temperature: f32) -> Self {
        Self {
            json_mode: false,
            temperature,
        }
    }

    pub fn json(temperature: f32) -> Self {
        Self {
            json_mode: true,
            temperature,
        }
    }
}

/// A single system + user exchange with a chat model
pub trait ChatCompletion {
    fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: CompletionOptions,
    ) -> impl Future<Output = Result<String, LlmError>> + Send;
}

/// OpenRouter API client for chat completions
#[derive(Clone)]
pub struct OpenRouterClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenRouterClient {
    /// Create a new client. `timeout` bounds each individual request.
    pub fn new(
        api_key: String,
        base_url: &str,
        model: String,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Request(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn send(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: CompletionOptions,
    ) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: &self.model,
            messages: [
                Message {
                    role: "system",
                    content: system_prompt,
                },
                Message {
                    role: "user",
                    content: user_prompt,
                },
            ],
            temperature: options.temperature,
            response_format: options
                .json_mode
                .then_some(ResponseFormat { kind: "json_object" }),
        };

        tracing::debug!(
            model = %self.model,
            json_mode = options.json_mode,
            temperature = options.temperature,
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", "http://localhost:3000")
            .header("X-Title", "Email Productivity Agent")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(status_error(status, error_text));
        }

        let chat_response: ChatResponse = response.json().await?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .unwrap_or_default();

        if content.is_empty() {
            return Err(LlmError::InvalidResponse(
                "no response content from model".to_string(),
            ));
        }
        Ok(content)
    }
}

impl ChatCompletion for OpenRouterClient {
    fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: CompletionOptions,
    ) -> impl Future<Output = Result<String, LlmError>> + Send {
        self.send(system_prompt, user_prompt, options)
    }
}

fn status_error(status: StatusCode, message: String) -> LlmError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimited(message),
        _ => LlmError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    fn client_for(server: &MockServer, timeout: Duration) -> OpenRouterClient {
        OpenRouterClient::new(
            "test-key".to_string(),
            &format!("{}/api/v1/", server.uri()),
            "openai/gpt-3.5-turbo".to_string(),
            timeout,
        )
        .unwrap()
    }

    fn completion(content: &str) -> serde_json::Value {
        json!({
            "id": "gen-1",
            "choices": [{ "index": 0, "message": { "role": "assistant", "content": content } }]
        })
    }

    #[tokio::test]
    async fn test_complete_sends_messages_and_trims_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/chat/completions"))
            .and(header("Authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "model": "openai/gpt-3.5-turbo",
                "messages": [
                    { "role": "system", "content": "be brief" },
                    { "role": "user", "content": "hello" }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("  Spam \n")))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::from_secs(5));
        let reply = client
            .complete("be brief", "hello", CompletionOptions::text(0.3))
            .await
            .unwrap();

        assert_eq!(reply, "Spam");
    }

    #[tokio::test]
    async fn test_response_format_only_in_json_mode() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("[]")))
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::from_secs(5));
        client
            .complete("sys", "json please", CompletionOptions::json(0.3))
            .await
            .unwrap();
        client
            .complete("sys", "prose please", CompletionOptions::text(0.7))
            .await
            .unwrap();

        let requests: Vec<Request> = server.received_requests().await.unwrap();
        let bodies: Vec<serde_json::Value> =
            requests.iter().map(|r| r.body_json().unwrap()).collect();

        assert_eq!(bodies[0]["response_format"], json!({ "type": "json_object" }));
        assert!(bodies[1].get("response_format").is_none());
        assert!((bodies[1]["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_rate_limit_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let err = client_for(&server, Duration::from_secs(5))
            .complete("sys", "user", CompletionOptions::text(0.3))
            .await
            .unwrap_err();

        assert!(matches!(err, LlmError::RateLimited(ref m) if m == "slow down"));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_server_error_is_permanent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let err = client_for(&server, Duration::from_secs(5))
            .complete("sys", "user", CompletionOptions::text(0.3))
            .await
            .unwrap_err();

        assert!(matches!(err, LlmError::Api { status: 401, .. }));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion("late"))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let err = client_for(&server, Duration::from_millis(50))
            .complete("sys", "user", CompletionOptions::text(0.3))
            .await
            .unwrap_err();

        assert!(matches!(err, LlmError::Timeout));
    }

    #[tokio::test]
    async fn test_empty_choices_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let err = client_for(&server, Duration::from_secs(5))
            .complete("sys", "user", CompletionOptions::text(0.3))
            .await
            .unwrap_err();

        assert!(matches!(err, LlmError::InvalidResponse(_)));
    }
}
