//! Upstream text generation
//!
//! The `AI` operation forwards a question to a language model and keeps only
//! the first word of the reply. Providers sit behind [`AnswerProvider`] so the
//! request pipeline can run against a stub.

mod openai;

pub use openai::OpenAiProvider;

use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;

/// Questions longer than this are cut before being sent upstream
pub const MAX_QUESTION_CHARS: usize = 600;

/// Upstream error bodies are cut to this many characters in error details
pub const MAX_ERROR_BODY_CHARS: usize = 200;

/// Single-word question answering
#[async_trait]
pub trait AnswerProvider: Send + Sync {
    /// Answer `question` with one word, or an empty string if the provider
    /// produced nothing usable
    async fn answer(&self, question: &str) -> Result<String, ProviderError>;
}

/// Failure talking to the text-generation provider
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider} API error")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("{provider} request failed")]
    Transport {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} returned an unreadable response")]
    Decode {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl ProviderError {
    /// Structured details for the error envelope
    pub fn details(&self) -> Value {
        match self {
            Self::Status {
                provider,
                status,
                body,
            } => json!({
                "provider": provider,
                "http_status": status,
                "body": body,
            }),
            Self::Transport { provider, source } | Self::Decode { provider, source } => json!({
                "provider": provider,
                "reason": source.to_string(),
            }),
            Self::Client(source) => json!({ "reason": source.to_string() }),
        }
    }
}

/// Trim `question` and cut it to [`MAX_QUESTION_CHARS`] characters
pub fn clip_question(question: &str) -> &str {
    let trimmed = question.trim();
    match trimmed.char_indices().nth(MAX_QUESTION_CHARS) {
        Some((cut, _)) => &trimmed[..cut],
        None => trimmed,
    }
}

/// Prompt instructing the model to answer with a single word
pub fn single_word_prompt(question: &str) -> String {
    format!("Answer in ONE word only (no punctuation, no extra words). Question: {question}")
}

/// First whitespace-delimited token of `text`, empty if there is none
pub fn first_word(text: &str) -> String {
    text.split_whitespace().next().unwrap_or_default().to_string()
}

/// Cut `body` to [`MAX_ERROR_BODY_CHARS`] characters
pub fn truncate_body(body: &str) -> String {
    body.chars().take(MAX_ERROR_BODY_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_question() {
        assert_eq!(clip_question("  why?  "), "why?");
        assert_eq!(clip_question("   "), "");

        let long = "é".repeat(700);
        let clipped = clip_question(&long);
        assert_eq!(clipped.chars().count(), MAX_QUESTION_CHARS);

        let exact = "a".repeat(MAX_QUESTION_CHARS);
        assert_eq!(clip_question(&exact), exact);
    }

    #[test]
    fn test_first_word() {
        assert_eq!(first_word("Paris is the capital"), "Paris");
        assert_eq!(first_word("\n  Blue\tsky"), "Blue");
        assert_eq!(first_word(""), "");
        assert_eq!(first_word("   "), "");
    }

    #[test]
    fn test_prompt_mentions_question() {
        let prompt = single_word_prompt("What colour is the sky?");
        assert!(prompt.starts_with("Answer in ONE word only"));
        assert!(prompt.ends_with("Question: What colour is the sky?"));
    }

    #[test]
    fn test_status_details() {
        let err = ProviderError::Status {
            provider: "openai",
            status: 401,
            body: truncate_body(&"x".repeat(500)),
        };
        let details = err.details();
        assert_eq!(details["provider"], "openai");
        assert_eq!(details["http_status"], 401);
        assert_eq!(details["body"].as_str().map(str::len), Some(MAX_ERROR_BODY_CHARS));
        assert_eq!(err.to_string(), "openai API error");
    }
}
