use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{
    config::GeminiConfig,
    error::{AppError, AppResult},
};

/// Narrow seam over the remote image model so the orchestrator can be tested
/// with a stub. One remote call per invocation, no retries.
#[async_trait]
pub trait ImageSynthesizer: Send + Sync {
    /// Sends the composed prompt plus the QR raster to the model and returns
    /// the generated sticker as a `data:image/png;base64,...` URL.
    async fn synthesize(&self, prompt: &str, qr_data_url: &str) -> AppResult<String>;
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(rename = "inlineData", skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize, Deserialize)]
struct InlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GenerateContentResponse {
    /// First inline-image payload across the candidate's content parts, in
    /// response order.
    fn first_inline_image(&self) -> Option<&str> {
        self.candidates
            .iter()
            .filter_map(|c| c.content.as_ref())
            .flat_map(|c| c.parts.iter())
            .find_map(|p| p.inline_data.as_ref().map(|d| d.data.as_str()))
    }
}

/// Client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    client: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AppError::Generation(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl ImageSynthesizer for GeminiClient {
    async fn synthesize(&self, prompt: &str, qr_data_url: &str) -> AppResult<String> {
        // The raster arrives as a data URL; the model wants the bare payload.
        let base64_qr = qr_data_url
            .split_once(',')
            .map(|(_, payload)| payload)
            .ok_or_else(|| AppError::Generation("QR raster is not a data URL".to_string()))?;

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part {
                        text: Some(prompt.to_string()),
                        inline_data: None,
                    },
                    Part {
                        text: None,
                        inline_data: Some(InlineData {
                            mime_type: "image/png".to_string(),
                            data: base64_qr.to_string(),
                        }),
                    },
                ],
            }],
        };

        let url = format!(
            "{}/models/{}:generateContent",
            self.config.endpoint, self.config.model
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Generation(format!("model request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Generation(format!(
                "model returned {}: {}",
                status, body
            )));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| AppError::Generation(format!("invalid model response: {}", e)))?;

        let image = body
            .first_inline_image()
            .ok_or_else(|| AppError::Generation("no image in model response".to_string()))?;

        Ok(format!("data:image/png;base64,{}", image))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_inline_image_skips_text_parts() {
        let body: GenerateContentResponse = serde_json::from_str(
            r#"{
                "candidates": [{
                    "content": {
                        "parts": [
                            {"text": "here is your sticker"},
                            {"inlineData": {"mimeType": "image/png", "data": "QUJD"}},
                            {"inlineData": {"mimeType": "image/png", "data": "ignored"}}
                        ]
                    }
                }]
            }"#,
        )
        .unwrap();

        assert_eq!(body.first_inline_image(), Some("QUJD"));
    }

    #[test]
    fn response_without_image_yields_none() {
        let body: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates": [{"content": {"parts": [{"text": "no"}]}}]}"#)
                .unwrap();
        assert_eq!(body.first_inline_image(), None);

        let empty: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.first_inline_image(), None);
    }
}
