//! OpenAI Responses API client

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{
    clip_question, first_word, single_word_prompt, truncate_body, AnswerProvider, ProviderError,
};
use crate::config::UpstreamConfig;

const PROVIDER: &str = "openai";

/// [`AnswerProvider`] backed by the OpenAI Responses API
pub struct OpenAiProvider {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
    max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    input: String,
    max_output_tokens: u32,
}

#[derive(Debug, Default, Deserialize)]
struct ResponsesReply {
    #[serde(default)]
    output_text: Option<String>,
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(default)]
    content: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl ResponsesReply {
    /// `output_text` if the provider filled it in, else the joined text parts
    fn text(self) -> String {
        if let Some(text) = self.output_text.filter(|t| !t.trim().is_empty()) {
            return text;
        }
        self.output
            .into_iter()
            .flat_map(|item| item.content)
            .filter(|part| part.kind == "output_text")
            .filter_map(|part| part.text)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl OpenAiProvider {
    pub fn new(config: &UpstreamConfig, api_key: &str) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(ProviderError::Client)?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key: api_key.to_string(),
            max_output_tokens: config.max_output_tokens,
        })
    }
}

#[async_trait]
impl AnswerProvider for OpenAiProvider {
    async fn answer(&self, question: &str) -> Result<String, ProviderError> {
        let question = clip_question(question);
        if question.is_empty() {
            return Ok(String::new());
        }

        let request = ResponsesRequest {
            model: &self.model,
            input: single_word_prompt(question),
            max_output_tokens: self.max_output_tokens,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|source| ProviderError::Transport {
                provider: PROVIDER,
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            // The body is diagnostic only; an unreadable one is reported as empty
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                provider: PROVIDER,
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let reply: ResponsesReply =
            response
                .json()
                .await
                .map_err(|source| ProviderError::Decode {
                    provider: PROVIDER,
                    source,
                })?;

        Ok(first_word(reply.text().trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_support::test_config;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer) -> OpenAiProvider {
        let mut config = test_config().upstream;
        config.endpoint = format!("{}/v1/responses", server.uri());
        OpenAiProvider::new(&config, "test-key").expect("client builds")
    }

    #[tokio::test]
    async fn test_returns_first_word_of_output_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/responses"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "model": "test-model",
                "max_output_tokens": 16,
                "input": single_word_prompt("Capital of France?"),
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "output_text": "Paris is lovely" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let answer = provider.answer("  Capital of France?  ").await;
        assert_eq!(answer.ok().as_deref(), Some("Paris"));
    }

    #[tokio::test]
    async fn test_reads_structured_output_items() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "output": [
                    { "type": "reasoning", "content": [] },
                    {
                        "type": "message",
                        "content": [
                            { "type": "output_text", "text": "Blue." },
                            { "type": "refusal", "text": "ignored" }
                        ]
                    }
                ]
            })))
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let answer = provider.answer("Sky colour?").await;
        assert_eq!(answer.ok().as_deref(), Some("Blue."));
    }

    #[tokio::test]
    async fn test_empty_output_yields_empty_answer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let answer = provider.answer("Anything?").await;
        assert_eq!(answer.ok().as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_long_question_is_clipped() {
        let server = MockServer::start().await;
        let long = "q".repeat(700);
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "input": single_word_prompt(&"q".repeat(600)),
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "output_text": "ok" })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        assert_eq!(provider.answer(&long).await.ok().as_deref(), Some("ok"));
    }

    #[tokio::test]
    async fn test_error_status_carries_truncated_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("e".repeat(1000)))
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        match provider.answer("Anything?").await {
            Err(ProviderError::Status {
                provider,
                status,
                body,
            }) => {
                assert_eq!(provider, "openai");
                assert_eq!(status, 429);
                assert_eq!(body.len(), 200);
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_json_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        assert!(matches!(
            provider.answer("Anything?").await,
            Err(ProviderError::Decode { .. })
        ));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        let mut config = test_config().upstream;
        config.endpoint = "http://127.0.0.1:9/v1/responses".to_string();
        let provider = OpenAiProvider::new(&config, "test-key").expect("client builds");
        assert!(matches!(
            provider.answer("Anything?").await,
            Err(ProviderError::Transport { .. })
        ));
    }
}
