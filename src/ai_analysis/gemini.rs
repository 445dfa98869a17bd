use std::time::Duration;

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use reqwest::StatusCode as HttpStatusCode;
use serde_json::{Value, json};

use super::prompt::{LlmCapability, PromptConfig};
use crate::config::GeminiConfig;

/// `generateContent` client. One attempt per call; the client timeout is the
/// only bound on a slow upstream.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
    temperature: f32,
}

impl GeminiClient {
    pub fn from_config(config: &GeminiConfig) -> Result<Self, anyhow::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build Gemini HTTP client")?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            temperature: config.temperature,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl LlmCapability for GeminiClient {
    async fn invoke(
        &self,
        prompt: &PromptConfig,
        input: &Value,
    ) -> Result<Option<Value>, anyhow::Error> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("GEMINI_API_KEY is not configured"))?;

        let request_body = build_request_body(prompt, input, self.temperature);
        tracing::debug!(prompt = prompt.name, model = %self.model, "Calling Gemini");

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&request_body)
            .send()
            .await
            .with_context(|| format!("Failed to call Gemini API for {}", prompt.name))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read Gemini response body")?;

        if status != HttpStatusCode::OK {
            return Err(anyhow!("Gemini API error {}: {}", status, body));
        }

        let raw_response: Value =
            serde_json::from_str(&body).context("Gemini response is not valid JSON")?;

        let Some(candidate_text) = candidate_text(&raw_response) else {
            tracing::warn!(prompt = prompt.name, "Gemini response has no candidate text");
            return Ok(None);
        };

        let cleaned = strip_code_fence(candidate_text);
        if cleaned.is_empty() {
            return Ok(None);
        }

        let parsed: Value = serde_json::from_str(&cleaned)
            .context("Failed to parse Gemini structured JSON")?;
        Ok((!parsed.is_null()).then_some(parsed))
    }
}

fn build_request_body(prompt: &PromptConfig, input: &Value, temperature: f32) -> Value {
    json!({
        "contents": [
            {
                "role": "user",
                "parts": [{ "text": prompt.render(input) }]
            }
        ],
        "generationConfig": {
            "temperature": temperature,
            "responseMimeType": "application/json",
            "responseSchema": prompt.response_schema
        }
    })
}

fn candidate_text(raw_response: &Value) -> Option<&str> {
    raw_response
        .get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|arr| arr.first())
        .and_then(|item| item.get("content"))
        .and_then(|content| content.get("parts"))
        .and_then(|parts| parts.as_array())
        .and_then(|parts| parts.first())
        .and_then(|part| part.get("text"))
        .and_then(|text| text.as_str())
}

fn strip_code_fence(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Some(stripped) = trimmed
        .strip_prefix("```json")
        .and_then(|s| s.strip_suffix("```"))
    {
        return stripped.trim().to_string();
    }
    if let Some(stripped) = trimmed
        .strip_prefix("```")
        .and_then(|s| s.strip_suffix("```"))
    {
        return stripped.trim().to_string();
    }
    trimmed.to_string()
}
