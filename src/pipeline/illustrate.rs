//! Image generation: prompt → base64-encoded illustration.
//!
//! [`ImageService`] is the seam between the pipeline and the image API.
//! [`OpenAiImageService`] talks to an OpenAI-compatible
//! `/images/generations` endpoint; tests plug in stubs.
//!
//! Failures are returned as [`IllustrationError`] values. The illustrator
//! never decides what a failure means for the run; the pipeline applies the
//! configured [`crate::config::FallbackPolicy`].

use crate::config::{ImageSize, PikbookConfig};
use crate::error::IllustrationError;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// A request for exactly one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub prompt: String,
    pub size: ImageSize,
}

/// A generated illustration, still transport-encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Illustration {
    /// Base64 image bytes as returned by the service.
    pub payload: String,
    /// Page whose request produced this payload.
    pub source_page: usize,
}

/// Something that turns a prompt into one base64-encoded image.
pub trait ImageService {
    fn generate(
        &self,
        request: &ImageRequest,
    ) -> impl Future<Output = Result<String, IllustrationError>>;
}

impl<T: ImageService> ImageService for &T {
    fn generate(
        &self,
        request: &ImageRequest,
    ) -> impl Future<Output = Result<String, IllustrationError>> {
        (**self).generate(request)
    }
}

/// Requests one image per prompt at a fixed size.
pub struct Illustrator<S> {
    service: S,
    size: ImageSize,
}

impl<S: ImageService> Illustrator<S> {
    pub fn new(service: S, size: ImageSize) -> Self {
        Self { service, size }
    }

    /// Generate the illustration for page `page` from `prompt`.
    pub async fn illustrate(
        &self,
        page: usize,
        prompt: &str,
    ) -> Result<Illustration, IllustrationError> {
        let request = ImageRequest {
            prompt: prompt.to_string(),
            size: self.size,
        };
        let payload = self.service.generate(&request).await?;
        if payload.trim().is_empty() {
            return Err(IllustrationError::MalformedResponse(
                "empty image payload".into(),
            ));
        }
        debug!("Page {}: illustration payload {} bytes", page, payload.len());
        Ok(Illustration {
            payload,
            source_page: page,
        })
    }
}

// ── OpenAI-compatible HTTP service ───────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerationBody<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
    size: String,
    response_format: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    #[serde(default)]
    data: Vec<GeneratedImage>,
}

#[derive(Debug, Deserialize)]
struct GeneratedImage {
    b64_json: Option<String>,
}

/// Image service backed by `POST {base}/images/generations`.
pub struct OpenAiImageService {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    timeout_secs: u64,
}

impl OpenAiImageService {
    /// Build a service from the run configuration.
    pub fn from_config(config: &PikbookConfig) -> Result<Self, IllustrationError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.image_timeout_secs))
            .build()
            .map_err(|e| IllustrationError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!("{}/images/generations", config.image_api_base),
            model: config.image_model.clone(),
            api_key: config.resolved_api_key(),
            timeout_secs: config.image_timeout_secs,
        })
    }
}

impl ImageService for OpenAiImageService {
    async fn generate(&self, request: &ImageRequest) -> Result<String, IllustrationError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(IllustrationError::MissingApiKey)?;

        let body = GenerationBody {
            model: &self.model,
            prompt: &request.prompt,
            n: 1,
            size: request.size.to_string(),
            response_format: "b64_json",
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    IllustrationError::Timeout {
                        secs: self.timeout_secs,
                    }
                } else {
                    IllustrationError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| IllustrationError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(IllustrationError::Status {
                status: status.as_u16(),
                detail: error_detail(&text),
            });
        }

        parse_generation_response(&text)
    }
}

/// Pull the first `b64_json` payload out of a generation response body.
fn parse_generation_response(body: &str) -> Result<String, IllustrationError> {
    let parsed: GenerationResponse = serde_json::from_str(body)
        .map_err(|e| IllustrationError::MalformedResponse(e.to_string()))?;

    parsed
        .data
        .into_iter()
        .next()
        .and_then(|img| img.b64_json)
        .ok_or_else(|| IllustrationError::MalformedResponse("no b64_json image in response".into()))
}

/// Best-effort human-readable message from an error body.
fn error_detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.chars().take(200).collect())
}
