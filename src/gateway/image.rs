//! Image generation passthrough
//!
//! Opaque external call used by the graphic design role. It never touches
//! the text gateway.

use crate::gateway::gemini::{generate_content, GEMINI_API_BASE_URL};
use crate::gateway::gemini_types::{GeminiApiRequest, GenerationConfig, RequestContent, RequestPart};
use crate::gateway::GatewayError;
use async_trait::async_trait;
use serde::Serialize;

/// Result of an image generation call
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GeneratedImage {
    /// Where the image can be fetched (a `data:` URL for inline payloads)
    pub url: String,
}

/// External image generation service
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generate one image from a text prompt
    async fn generate(&self, prompt: &str) -> Result<GeneratedImage, GatewayError>;
}

/// Image generation through a Gemini image model
#[derive(Debug, Clone)]
pub struct GeminiImageGenerator {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout_secs: u64,
}

impl GeminiImageGenerator {
    /// Create a generator for `model`
    pub fn new(
        client: reqwest::Client,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout_secs: u64,
    ) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            base_url: GEMINI_API_BASE_URL.to_string(),
            timeout_secs,
        }
    }

    /// Point the generator at a different base URL (used by tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl ImageGenerator for GeminiImageGenerator {
    async fn generate(&self, prompt: &str) -> Result<GeneratedImage, GatewayError> {
        let body = GeminiApiRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: Some(GenerationConfig {
                response_modalities: Some(vec!["TEXT".to_string(), "IMAGE".to_string()]),
                ..Default::default()
            }),
            tools: Vec::new(),
        };

        tracing::debug!(model = %self.model, prompt_len = prompt.len(), "Generating image");

        let parsed = generate_content(
            &self.client,
            &self.base_url,
            &self.api_key,
            &self.model,
            &body,
            self.timeout_secs,
        )
        .await?;

        let inline = parsed.first_inline_data().ok_or_else(|| {
            GatewayError::EmptyResponse("image model returned no image data".to_string())
        })?;

        Ok(GeneratedImage {
            url: format!("data:{};base64,{}", inline.mime_type, inline.data),
        })
    }
}

/// Generator that returns a fixed placeholder URL
#[derive(Debug, Clone, Default)]
pub struct OfflineImageGenerator;

#[async_trait]
impl ImageGenerator for OfflineImageGenerator {
    async fn generate(&self, _prompt: &str) -> Result<GeneratedImage, GatewayError> {
        Ok(GeneratedImage {
            url: "https://example.com/mock-image.png".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serial_test::serial;

    #[tokio::test]
    #[serial]
    async fn test_generate_returns_data_url() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/models/image-model:generateContent")
            .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
            .with_status(200)
            .with_body(
                r#"{"candidates": [{"content": {"parts": [
                    {"text": "here"},
                    {"inlineData": {"mimeType": "image/png", "data": "aGVsbG8="}}
                ], "role": "model"}}]}"#,
            )
            .create_async()
            .await;

        let generator =
            GeminiImageGenerator::new(reqwest::Client::new(), "test-key", "image-model", 5)
                .with_base_url(server.url());
        let image = generator.generate("a logo").await.unwrap();

        mock.assert_async().await;
        assert_eq!(image.url, "data:image/png;base64,aGVsbG8=");
    }

    #[tokio::test]
    #[serial]
    async fn test_generate_without_image_part_fails() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/models/image-model:generateContent")
            .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
            .with_status(200)
            .with_body(r#"{"candidates": [{"content": {"parts": [{"text": "sorry"}], "role": "model"}}]}"#)
            .create_async()
            .await;

        let generator =
            GeminiImageGenerator::new(reqwest::Client::new(), "test-key", "image-model", 5)
                .with_base_url(server.url());
        assert!(matches!(
            generator.generate("a logo").await,
            Err(GatewayError::EmptyResponse(_))
        ));
    }
}
