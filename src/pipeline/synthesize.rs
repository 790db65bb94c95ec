//! Prompt synthesis: page text → image-generation prompt via an LLM.
//!
//! The request is the instruction template followed by the page text, sent
//! as a single user message with a small output budget and low temperature.
//! Unlike image generation, a failure here is fatal: without a prompt there
//! is nothing meaningful to illustrate, so errors propagate to the caller.

use crate::config::PikbookConfig;
use crate::error::PikbookError;
use crate::prompts::{synthesis_request, DEFAULT_PROMPT_TEMPLATE};
use crate::runlog::RunLog;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Something that completes a text prompt.
pub trait CompletionService {
    /// Complete `prompt`; the error string is folded into
    /// [`PikbookError::CompletionFailed`] by the synthesizer.
    fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> impl Future<Output = Result<String, String>>;
}

impl<T: CompletionService> CompletionService for &T {
    fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> impl Future<Output = Result<String, String>> {
        (**self).complete(prompt, options)
    }
}

/// Completion backed by an edgequake-llm provider.
pub struct LlmCompletion {
    provider: Arc<dyn LLMProvider>,
}

impl LlmCompletion {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self { provider }
    }
}

impl CompletionService for LlmCompletion {
    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<String, String> {
        let start = Instant::now();
        let messages = vec![ChatMessage::user(prompt)];
        let response = self
            .provider
            .chat(&messages, Some(options))
            .await
            .map_err(|e| e.to_string())?;
        debug!(
            "Completion: {} input tokens, {} output tokens, {:?}",
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );
        Ok(response.content)
    }
}

/// Turns page text into an image-generation prompt.
pub struct PromptSynthesizer<C> {
    service: C,
    template: String,
    options: CompletionOptions,
}

impl<C: CompletionService> PromptSynthesizer<C> {
    pub fn new(service: C, config: &PikbookConfig) -> Self {
        Self {
            service,
            template: config
                .prompt_template
                .clone()
                .unwrap_or_else(|| DEFAULT_PROMPT_TEMPLATE.to_string()),
            options: build_options(config),
        }
    }

    /// Synthesise the prompt for page `page` and record it in `log`.
    pub async fn synthesize(
        &self,
        page: usize,
        page_text: &str,
        log: &RunLog,
    ) -> Result<String, PikbookError> {
        let request = synthesis_request(&self.template, page_text);
        let raw = self
            .service
            .complete(&request, &self.options)
            .await
            .map_err(|detail| PikbookError::CompletionFailed { page, detail })?;

        let prompt = raw.trim_matches('\n').to_string();
        if prompt.trim().is_empty() {
            return Err(PikbookError::EmptyCompletion { page });
        }

        log.info(&prompt);
        Ok(prompt)
    }
}

/// Build `CompletionOptions` from the run config.
fn build_options(config: &PikbookConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}
