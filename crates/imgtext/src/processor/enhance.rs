//! Remote transcription refinement through a vision-language model.
//!
//! The enhancer sends the original upload (not the preprocessed image) to the
//! Gemini `generateContent` REST endpoint together with the local OCR text,
//! and returns the model's transcription. One attempt per call; failures
//! propagate to the caller unchanged.

use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::blocking::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::config::EnhancerConfig;
use crate::error::{ImgtextError, ProcessError};
use crate::sanitize::{redact_path, truncate_body};

/// Placeholder in the prompt template replaced by the local OCR text.
pub const LOCAL_TEXT_PLACEHOLDER: &str = "{local_text}";

const DEFAULT_PROMPT: &str = "Transcribe all text visible in this image exactly as written. \
A local OCR pass produced the draft below; use it as a hint but correct any \
recognition errors against the image. Reply with the transcription only.\n\n\
OCR draft:\n{local_text}";

pub trait TextEnhancer: Send + Sync {
    fn enhance(&self, image_path: &Path, local_text: &str) -> Result<String, ProcessError>;
}

pub struct GeminiEnhancer {
    client: Client,
    endpoint: String,
    model: String,
    api_key: SecretString,
    prompt: String,
}

impl GeminiEnhancer {
    pub fn new(config: &EnhancerConfig, api_key: SecretString) -> Result<Self, ImgtextError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ImgtextError::ClientSetup(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            prompt: config
                .prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_PROMPT.to_string()),
        })
    }

    /// Builds the enhancer with the API key resolved from the configured source.
    pub fn from_config(config: &EnhancerConfig) -> Result<Self, ImgtextError> {
        let api_key = config.api_key.resolve()?;
        Self::new(config, api_key)
    }

    pub fn request_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint, self.model
        )
    }
}

impl TextEnhancer for GeminiEnhancer {
    fn enhance(&self, image_path: &Path, local_text: &str) -> Result<String, ProcessError> {
        let _span = tracing::info_span!(
            "processor.enhance",
            model = %self.model,
            file = %redact_path(image_path)
        )
        .entered();

        let image_bytes = std::fs::read(image_path).map_err(|e| ProcessError::ImageRead {
            path: image_path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let mime_type = mime_guess::from_path(image_path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        let body = build_request_body(
            &render_prompt(&self.prompt, local_text),
            &mime_type,
            &image_bytes,
        );

        let response = self
            .client
            .post(self.request_url())
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .map_err(|e| ProcessError::RemoteService(describe_transport_error(&e)))?;

        let status = response.status();
        let text = response
            .text()
            .map_err(|e| ProcessError::RemoteService(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Remote enhancer returned an error");
            return Err(ProcessError::RemoteService(format!(
                "HTTP {}: {}",
                status.as_u16(),
                truncate_body(&text)
            )));
        }

        let enhanced = parse_response(&text)?;
        tracing::debug!(chars = enhanced.len(), "Remote enhancement received");
        Ok(enhanced)
    }
}

fn describe_transport_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        format!("Request timed out: {}", e)
    } else if e.is_connect() {
        format!("Connection failed: {}", e)
    } else {
        format!("Request failed: {}", e)
    }
}

pub fn render_prompt(template: &str, local_text: &str) -> String {
    if template.contains(LOCAL_TEXT_PLACEHOLDER) {
        template.replace(LOCAL_TEXT_PLACEHOLDER, local_text)
    } else {
        format!("{}\n\n{}", template, local_text)
    }
}

pub fn build_request_body(prompt: &str, mime_type: &str, image_bytes: &[u8]) -> serde_json::Value {
    serde_json::json!({
        "contents": [{
            "parts": [
                { "text": prompt },
                { "inline_data": { "mime_type": mime_type, "data": STANDARD.encode(image_bytes) } }
            ]
        }]
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

/// Extracts the transcription from a `generateContent` response body.
///
/// Text parts of the first candidate are concatenated. A response with no
/// candidate or no text part is an error; blank text is returned as is.
pub fn parse_response(body: &str) -> Result<String, ProcessError> {
    let response: GenerateContentResponse = serde_json::from_str(body).map_err(|e| {
        ProcessError::RemoteResponse(format!("Unparseable response body: {}", e))
    })?;

    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = response
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .map(|r| format!(" (blocked: {})", r))
            .unwrap_or_default();
        return Err(ProcessError::RemoteResponse(format!(
            "Response contained no candidates{}",
            reason
        )));
    };

    let texts: Vec<String> = candidate
        .content
        .map(|c| c.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|p| p.text)
        .collect();

    if texts.is_empty() {
        let reason = candidate
            .finish_reason
            .map(|r| format!(" (finish reason: {})", r))
            .unwrap_or_default();
        return Err(ProcessError::RemoteResponse(format!(
            "Response contained no text{}",
            reason
        )));
    }

    Ok(texts.concat())
}
