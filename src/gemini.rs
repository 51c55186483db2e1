use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Substituted when a success response carries no answer text.
pub const NO_ANSWER: &str = "No answer";

/// Payload for one completion call. Callers validate that `text` is
/// non-empty after trimming before dispatch.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub text: String,
}

/// One-shot text completion backend the chat state talks to.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String>;
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<RequestContent>,
}

#[derive(Serialize)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

#[derive(Serialize)]
struct RequestPart {
    text: String,
}

impl GenerateRequest {
    fn from_text(text: String) -> Self {
        Self {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text }],
            }],
        }
    }
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateResponse {
    /// Walks `candidates[0].content.parts[0].text`. A missing hop anywhere
    /// on the path falls back to the fixed placeholder instead of failing
    /// the call.
    fn answer_text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .and_then(|content| content.parts.into_iter().next())
            .and_then(|part| part.text)
            .unwrap_or_else(|| NO_ANSWER.to_string())
    }
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, api_key, model)
    }

    pub fn with_base_url(base_url: &str, api_key: &str, model: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }

    pub async fn generate(&self, text: &str) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let response = self
            .client
            .post(&url)
            .json(&GenerateRequest::from_text(text.to_string()))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Gemini request failed with status: {}",
                response.status()
            ));
        }

        let generate_response: GenerateResponse = response.json().await?;
        Ok(generate_response.answer_text())
    }
}

#[async_trait]
impl CompletionService for GeminiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        self.generate(&request.text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_shape() {
        let request = GenerateRequest::from_text("hi there".to_string());
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "contents": [{ "parts": [{ "text": "hi there" }] }]
            })
        );
    }

    #[test]
    fn test_answer_extracted_from_first_candidate() {
        let body = serde_json::json!({
            "candidates": [
                {
                    "content": {
                        "parts": [{ "text": "first" }, { "text": "second" }],
                        "role": "model"
                    },
                    "finishReason": "STOP"
                },
                { "content": { "parts": [{ "text": "other" }] } }
            ]
        });
        let response: GenerateResponse = serde_json::from_value(body).unwrap();
        assert_eq!(response.answer_text(), "first");
    }

    #[test]
    fn test_missing_candidates_falls_back_to_placeholder() {
        let response: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(response.answer_text(), NO_ANSWER);
    }

    #[test]
    fn test_empty_parts_falls_back_to_placeholder() {
        let body = serde_json::json!({
            "candidates": [{ "content": { "parts": [] } }]
        });
        let response: GenerateResponse = serde_json::from_value(body).unwrap();
        assert_eq!(response.answer_text(), NO_ANSWER);
    }

    #[test]
    fn test_part_without_text_falls_back_to_placeholder() {
        let body = serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "thought": true }] } }]
        });
        let response: GenerateResponse = serde_json::from_value(body).unwrap();
        assert_eq!(response.answer_text(), NO_ANSWER);
    }

    #[test]
    fn test_candidate_without_content_falls_back_to_placeholder() {
        let body = serde_json::json!({
            "candidates": [{ "finishReason": "SAFETY" }]
        });
        let response: GenerateResponse = serde_json::from_value(body).unwrap();
        assert_eq!(response.answer_text(), NO_ANSWER);
    }
}
