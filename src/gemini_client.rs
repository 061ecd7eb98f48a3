use std::env;

use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, error};

use crate::cli::chat::composer::ComposedPrompt;

const DEFAULT_MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("GEMINI_API_KEY environment variable not set")]
    MissingApiKey,
    #[error("request to the Gemini API failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Gemini API returned {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("Gemini API response carried no usable text")]
    MalformedResponse,
}

/// Anything that can turn a composed prompt into a reply. The chat loop
/// only sees this trait, so tests can swap in a scripted implementation.
#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn generate(&self, prompt: &ComposedPrompt) -> Result<String, GenerationError>;
}

pub struct GeminiClient {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl GeminiClient {
    /// Reads `GEMINI_API_KEY` (required) and `GEMINI_MODEL` (optional).
    /// A missing key fails here, before any conversation starts.
    pub fn new() -> Result<Self, GenerationError> {
        let api_key = env::var("GEMINI_API_KEY")
            .ok()
            .filter(|key| !key.is_empty())
            .ok_or(GenerationError::MissingApiKey)?;

        let model = env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        Ok(Self {
            api_key,
            model,
            client: reqwest::Client::new(),
        })
    }

    fn request_body(prompt: &ComposedPrompt) -> Value {
        // The generateContent API has no separate system slot on v1beta, so
        // the persona and session framing travel as a leading user content.
        let mut contents = vec![json!({
            "role": "user",
            "parts": [
                {
                    "text": prompt.system_text
                }
            ]
        })];

        for (role, text) in &prompt.turns {
            contents.push(json!({
                "role": role.wire_name(),
                "parts": [
                    {
                        "text": text
                    }
                ]
            }));
        }

        json!({
            "contents": contents,
            "generationConfig": {
                "temperature": 0.7,
                "topP": 0.8,
                "topK": 40,
                "maxOutputTokens": 8192
            }
        })
    }

    fn extract_text(response: &Value) -> Option<String> {
        let parts = response
            .get("candidates")?
            .as_array()?
            .first()?
            .get("content")?
            .get("parts")?
            .as_array()?;

        let mut text = String::new();
        for part in parts {
            if let Some(fragment) = part.get("text").and_then(|t| t.as_str()) {
                text.push_str(fragment);
            }
        }

        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[async_trait]
impl GenerationService for GeminiClient {
    async fn generate(&self, prompt: &ComposedPrompt) -> Result<String, GenerationError> {
        let api_url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, self.api_key
        );

        let request_body = Self::request_body(prompt);
        debug!("Sending request to Gemini API: {}", request_body);

        // The URL carries the API key, so strip it from any surfaced error.
        let response = self
            .client
            .post(&api_url)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| GenerationError::Http(e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("API request failed with status {}: {}", status, body);
            return Err(GenerationError::Api { status, body });
        }

        let response_json: Value = response
            .json()
            .await
            .map_err(|e| GenerationError::Http(e.without_url()))?;
        debug!("Received response from Gemini API: {}", response_json);

        Self::extract_text(&response_json).ok_or(GenerationError::MalformedResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::chat::conversation_state::Role;

    fn prompt() -> ComposedPrompt {
        ComposedPrompt {
            system_text: "You are a helpful assistant.".to_string(),
            turns: vec![
                (Role::User, "k cha?".to_string()),
                (Role::Assistant, "Thik cha!".to_string()),
                (Role::User, "ani timro din?".to_string()),
            ],
        }
    }

    #[test]
    fn request_carries_system_text_then_turns_in_order() {
        let body = GeminiClient::request_body(&prompt());
        let contents = body["contents"].as_array().unwrap();

        assert_eq!(contents.len(), 4);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[0]["parts"][0]["text"], "You are a helpful assistant.");
        assert_eq!(contents[1]["parts"][0]["text"], "k cha?");
        assert_eq!(contents[2]["role"], "model");
        assert_eq!(contents[3]["role"], "user");
        assert_eq!(contents[3]["parts"][0]["text"], "ani timro din?");
    }

    #[test]
    fn extracts_and_concatenates_text_parts() {
        let response = json!({
            "candidates": [
                {
                    "content": {
                        "parts": [
                            { "text": "Namaste! " },
                            { "text": "Ma sanchai chu." }
                        ]
                    }
                }
            ]
        });

        assert_eq!(
            GeminiClient::extract_text(&response).as_deref(),
            Some("Namaste! Ma sanchai chu.")
        );
    }

    #[test]
    fn empty_or_missing_candidates_yield_none() {
        assert_eq!(GeminiClient::extract_text(&json!({})), None);
        assert_eq!(
            GeminiClient::extract_text(&json!({ "candidates": [] })),
            None
        );
        let no_text = json!({
            "candidates": [ { "content": { "parts": [ {} ] } } ]
        });
        assert_eq!(GeminiClient::extract_text(&no_text), None);
    }
}
