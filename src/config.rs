//! Configuration types for a pikbook run.
//!
//! Every knob lives in [`PikbookConfig`], built via [`PikbookConfigBuilder`].
//! The defaults reproduce the classic pikbook behaviour: a 1000-token,
//! temperature-0.3 completion per page and one 512×512 image per prompt.

use crate::error::PikbookError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Default completion model.
pub const DEFAULT_MODEL: &str = "gpt-4.1-nano";

/// Default image-generation model. `dall-e-2` is the model that accepts 512×512.
pub const DEFAULT_IMAGE_MODEL: &str = "dall-e-2";

/// Default base URL of the image-generation API.
pub const DEFAULT_IMAGE_API_BASE: &str = "https://api.openai.com/v1";

/// Configuration for one pikbook run.
///
/// # Example
/// ```rust
/// use pikbook::{FallbackPolicy, PikbookConfig};
///
/// let config = PikbookConfig::builder()
///     .model("gpt-4.1-mini")
///     .fallback(FallbackPolicy::Abort)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_tokens, 1000);
/// ```
#[derive(Clone)]
pub struct PikbookConfig {
    /// Completion model identifier. Default: `gpt-4.1-nano`.
    pub model: String,

    /// LLM provider name (e.g. "openai", "anthropic"). If None along with
    /// `provider`, the provider is auto-detected from the environment.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature for prompt synthesis. Default: 0.3.
    pub temperature: f32,

    /// Output-token budget for prompt synthesis. Default: 1000.
    pub max_tokens: usize,

    /// Image-generation model. Default: `dall-e-2`.
    pub image_model: String,

    /// Requested illustration size. Default: 512×512.
    pub image_size: ImageSize,

    /// Base URL of the image API (`/images/generations` is appended).
    pub image_api_base: String,

    /// API key for the image service. If None, `OPENAI_API_KEY` is read.
    pub api_key: Option<String>,

    /// Per-image request timeout in seconds. Default: 120.
    pub image_timeout_secs: u64,

    /// What to do when an image request fails. Default: [`FallbackPolicy::ReuseLast`].
    pub fallback: FallbackPolicy,

    /// Custom prompt-synthesis template. If None, uses the built-in one.
    pub prompt_template: Option<String>,

    /// Optional progress listener.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for PikbookConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            provider_name: None,
            provider: None,
            temperature: 0.3,
            max_tokens: 1000,
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            image_size: ImageSize::default(),
            image_api_base: DEFAULT_IMAGE_API_BASE.to_string(),
            api_key: None,
            image_timeout_secs: 120,
            fallback: FallbackPolicy::default(),
            prompt_template: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for PikbookConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PikbookConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("image_model", &self.image_model)
            .field("image_size", &self.image_size)
            .field("image_api_base", &self.image_api_base)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("image_timeout_secs", &self.image_timeout_secs)
            .field("fallback", &self.fallback)
            .field("prompt_template", &self.prompt_template.is_some())
            .finish()
    }
}

impl PikbookConfig {
    /// Create a new builder for `PikbookConfig`.
    pub fn builder() -> PikbookConfigBuilder {
        PikbookConfigBuilder {
            config: Self::default(),
        }
    }

    /// The API key for the image service, falling back to `OPENAI_API_KEY`.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .filter(|k| !k.is_empty())
    }
}

/// Builder for [`PikbookConfig`].
pub struct PikbookConfigBuilder {
    config: PikbookConfig,
}

impl PikbookConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn image_model(mut self, model: impl Into<String>) -> Self {
        self.config.image_model = model.into();
        self
    }

    pub fn image_size(mut self, size: ImageSize) -> Self {
        self.config.image_size = size;
        self
    }

    pub fn image_api_base(mut self, url: impl Into<String>) -> Self {
        self.config.image_api_base = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn image_timeout_secs(mut self, secs: u64) -> Self {
        self.config.image_timeout_secs = secs;
        self
    }

    pub fn fallback(mut self, policy: FallbackPolicy) -> Self {
        self.config.fallback = policy;
        self
    }

    pub fn prompt_template(mut self, template: impl Into<String>) -> Self {
        self.config.prompt_template = Some(template.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PikbookConfig, PikbookError> {
        let c = &self.config;
        if c.max_tokens == 0 {
            return Err(PikbookError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.image_timeout_secs == 0 {
            return Err(PikbookError::InvalidConfig(
                "image timeout must be ≥ 1 second".into(),
            ));
        }
        if c.model.trim().is_empty() {
            return Err(PikbookError::InvalidConfig("model must not be empty".into()));
        }
        Ok(self.config)
    }
}

// ── Value types ──────────────────────────────────────────────────────────

/// How the pipeline resolves a failed image request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FallbackPolicy {
    /// Warn and reuse the previous page's illustration. Fails with
    /// [`PikbookError::NoIllustrationAvailable`] when there is none yet.
    #[default]
    ReuseLast,
    /// Warn and fail the run with [`PikbookError::IllustrationFailed`].
    Abort,
}

/// Pixel dimensions of a requested illustration, written `WxH` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl Default for ImageSize {
    fn default() -> Self {
        Self {
            width: 512,
            height: 512,
        }
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for ImageSize {
    type Err = PikbookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PikbookError::InvalidConfig(format!("image size must be WxH, got '{s}'"));
        let (w, h) = s.trim().split_once(['x', 'X']).ok_or_else(invalid)?;
        let width: u32 = w.trim().parse().map_err(|_| invalid())?;
        let height: u32 = h.trim().parse().map_err(|_| invalid())?;
        if width == 0 || height == 0 {
            return Err(invalid());
        }
        Ok(Self { width, height })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_classic_constants() {
        let config = PikbookConfig::default();
        assert_eq!(config.max_tokens, 1000);
        assert_eq!(config.temperature, 0.3);
        assert_eq!(config.image_size.to_string(), "512x512");
        assert_eq!(config.fallback, FallbackPolicy::ReuseLast);
    }

    #[test]
    fn builder_rejects_zero_tokens() {
        let err = PikbookConfig::builder().max_tokens(0).build().unwrap_err();
        assert!(matches!(err, PikbookError::InvalidConfig(_)));
    }

    #[test]
    fn builder_clamps_temperature_and_trims_base() {
        let config = PikbookConfig::builder()
            .temperature(9.0)
            .image_api_base("http://localhost:8080/v1/")
            .build()
            .unwrap();
        assert_eq!(config.temperature, 2.0);
        assert_eq!(config.image_api_base, "http://localhost:8080/v1");
    }

    #[test]
    fn image_size_parses() {
        let size: ImageSize = "256x256".parse().unwrap();
        assert_eq!(size, ImageSize { width: 256, height: 256 });
        let size: ImageSize = " 1024X768 ".parse().unwrap();
        assert_eq!(size, ImageSize { width: 1024, height: 768 });
        assert!("512".parse::<ImageSize>().is_err());
        assert!("0x512".parse::<ImageSize>().is_err());
        assert!("ax b".parse::<ImageSize>().is_err());
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = PikbookConfig::builder().api_key("sk-secret").build().unwrap();
        let dbg = format!("{config:?}");
        assert!(!dbg.contains("sk-secret"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn explicit_api_key_wins() {
        let config = PikbookConfig::builder().api_key("sk-explicit").build().unwrap();
        assert_eq!(config.resolved_api_key().as_deref(), Some("sk-explicit"));
    }
}
