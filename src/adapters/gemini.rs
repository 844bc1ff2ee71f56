use crate::domain::model::Content;
use crate::domain::ports::{ConfigProvider, ModelClient};
use crate::utils::error::{PlantError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: &'a [Content],
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GenerateContentResponse {
    fn first_text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|content| content.parts.first())
            .and_then(|part| part.text.clone())
            .unwrap_or_default()
    }
}

pub struct GeminiClient {
    client: Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        let api_key = config
            .api_key()
            .ok_or_else(|| PlantError::MissingConfigError {
                field: "api_key".to_string(),
            })?;

        Self::new(
            config.api_base(),
            api_key,
            config.model(),
            Duration::from_secs(config.request_timeout_secs()),
        )
    }

    pub fn endpoint(&self) -> String {
        let trimmed = self.model.trim();
        let model_path = if trimmed.starts_with("models/") {
            trimmed.to_string()
        } else {
            format!("models/{}", trimmed)
        };
        format!("{}/{}:generateContent", self.api_base, model_path)
    }
}

/// 從錯誤回應取出 `error.message`，取不到就用原始內容
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

#[async_trait]
impl ModelClient for GeminiClient {
    async fn generate_content(&self, contents: Vec<Content>) -> Result<String> {
        let url = self.endpoint();
        tracing::debug!("Sending {} content turns to {}", contents.len(), url);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&GenerateContentRequest {
                contents: &contents,
            })
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("Model response status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PlantError::ModelResponseError {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let payload: GenerateContentResponse = response.json().await?;
        let text = payload.first_text();
        if text.is_empty() {
            tracing::warn!("⚠️ Model reply carried no text part");
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{ChatRole, Part};
    use httpmock::prelude::*;
    use serde_json::json;

    fn client_for(server: &MockServer) -> GeminiClient {
        GeminiClient::new(
            server.base_url(),
            "test-key",
            DEFAULT_MODEL,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_endpoint_accepts_prefixed_model_names() {
        let plain = GeminiClient::new(DEFAULT_API_BASE, "k", "gemini-2.5-flash", Duration::from_secs(1)).unwrap();
        let prefixed =
            GeminiClient::new(format!("{}/", DEFAULT_API_BASE), "k", "models/gemini-2.5-flash", Duration::from_secs(1))
                .unwrap();

        let expected = "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent";
        assert_eq!(plain.endpoint(), expected);
        assert_eq!(prefixed.endpoint(), expected);
    }

    #[tokio::test]
    async fn test_generate_content_returns_first_text_part() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/models/gemini-2.5-flash:generateContent")
                .header("x-goog-api-key", "test-key")
                .body_contains("\"role\":\"model\"")
                .body_contains("Water weekly?");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(json!({
                    "candidates": [
                        {"content": {"role": "model", "parts": [{"text": "Every 7-10 days."}, {"text": "ignored"}]}}
                    ]
                }));
        });

        let client = client_for(&server);
        let text = client
            .generate_content(vec![
                Content::turn(ChatRole::Assistant, "Ask away."),
                Content::user(vec![Part::text("Water weekly?")]),
            ])
            .await
            .unwrap();

        api_mock.assert();
        assert_eq!(text, "Every 7-10 days.");
    }

    #[tokio::test]
    async fn test_generate_content_without_candidates_is_empty() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/models/gemini-2.5-flash:generateContent");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(json!({"promptFeedback": {"blockReason": "SAFETY"}}));
        });

        let text = client_for(&server)
            .generate_content(vec![Content::user(vec![Part::text("hi")])])
            .await
            .unwrap();

        assert!(text.is_empty());
    }

    #[tokio::test]
    async fn test_generate_content_surfaces_api_error_message() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/models/gemini-2.5-flash:generateContent");
            then.status(403)
                .header("Content-Type", "application/json")
                .json_body(json!({"error": {"code": 403, "message": "API key not valid.", "status": "PERMISSION_DENIED"}}));
        });

        let err = client_for(&server)
            .generate_content(vec![Content::user(vec![Part::text("hi")])])
            .await
            .unwrap_err();

        match err {
            PlantError::ModelResponseError { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "API key not valid.");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_error_message_falls_back_to_body() {
        assert_eq!(error_message("  upstream timeout \n"), "upstream timeout");
    }
}
