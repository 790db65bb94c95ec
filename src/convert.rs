//! Run orchestration: the page-by-page illustration pipeline.
//!
//! A run moves strictly forward:
//!
//! ```text
//! Loading ──▶ (ExtractText ──▶ Synthesize ──▶ Illustrate ──▶ Assemble)* ──▶ Finalizing
//! ```
//!
//! Pages are processed one at a time in source order; page `i + 1` starts
//! only after page `i`'s pair is in the output document. Any error other
//! than a failed image request ends the run immediately and the output
//! document is never written. Failed image requests are resolved by the
//! configured [`FallbackPolicy`].

use crate::config::{FallbackPolicy, PikbookConfig};
use crate::error::{IllustrationError, PikbookError};
use crate::output::{IllustrationSource, PageOutcome, RunReport};
use crate::pipeline::assemble::{decode_to_single_page_document, OutputDocument};
use crate::pipeline::document::{bind_pdfium, SourceDocument};
use crate::pipeline::illustrate::{Illustration, ImageService, Illustrator, OpenAiImageService};
use crate::pipeline::input::RunPaths;
use crate::pipeline::synthesize::{CompletionService, LlmCompletion, PromptSynthesizer};
use crate::runlog::RunLog;
use edgequake_llm::{LLMProvider, ProviderFactory};
use pdfium_render::prelude::Pdfium;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Illustrate every page of the PDF at `source_path`.
///
/// This is the primary entry point for the library. It binds pdfium,
/// resolves the completion provider and the image service from `config`,
/// then runs [`convert_with`].
///
/// # Errors
/// Returns `Err(PikbookError)` for every fatal condition; see
/// [`PikbookError`]. On error the combined output is not written, but the
/// log and any staged illustration pages remain on disk.
pub async fn convert(
    source_path: impl AsRef<Path>,
    config: &PikbookConfig,
) -> Result<RunReport, PikbookError> {
    let pdfium = bind_pdfium()?;
    let provider = resolve_provider(config)?;
    let images = OpenAiImageService::from_config(config)
        .map_err(|e| PikbookError::Internal(format!("image client: {e}")))?;

    convert_with(
        &pdfium,
        source_path,
        config,
        LlmCompletion::new(provider),
        images,
    )
    .await
}

/// Run the pipeline with explicit services.
///
/// Used by [`convert`] with the real providers and by tests with stubs.
///
/// The source path is validated by [`SourceDocument::open`] before anything
/// is written.
///
/// pdfium calls run inline on the thread polling this future, between the
/// awaited service calls. The open documents borrow `pdfium` and cannot move
/// to a blocking pool, so await the future directly (from `main` or
/// `block_on`) instead of spawning it. Each pdfium step touches a single
/// page, so the executor thread is held only briefly.
pub async fn convert_with<C, S>(
    pdfium: &Pdfium,
    source_path: impl AsRef<Path>,
    config: &PikbookConfig,
    completion: C,
    images: S,
) -> Result<RunReport, PikbookError>
where
    C: CompletionService,
    S: ImageService,
{
    let start = Instant::now();
    info!("Starting run: {}", source_path.as_ref().display());

    // ── Loading ──────────────────────────────────────────────────────────
    let source = SourceDocument::open(pdfium, source_path.as_ref())?;
    let paths = RunPaths::for_source(source.path());
    let log = RunLog::create(&paths.log)?;
    paths.ensure_images_dir()?;

    let total_pages = source.page_count();
    if let Some(ref cb) = config.progress_callback {
        cb.on_run_start(total_pages);
    }

    let synthesizer = PromptSynthesizer::new(completion, config);
    let illustrator = Illustrator::new(images, config.image_size);
    let mut output = OutputDocument::new(pdfium)?;
    let mut last = LastIllustration::default();
    let mut pages = Vec::with_capacity(total_pages);

    // ── Per page ─────────────────────────────────────────────────────────
    for index in 0..total_pages {
        if let Some(ref cb) = config.progress_callback {
            cb.on_page_start(index, total_pages);
        }

        let text = source.page_text(index)?;
        let prompt = synthesizer.synthesize(index, &text, &log).await?;

        let outcome = illustrator.illustrate(index, &prompt).await;
        if let Err(ref e) = outcome {
            log.warning(&format!("Prompt did not work for page {index}: {e}. Continuing..."));
            if let Some(ref cb) = config.progress_callback {
                cb.on_illustration_fallback(index, &e.to_string());
            }
        }
        let (illustration, origin) = last.resolve(index, outcome, config.fallback)?;

        let illustration_path = paths.illustration_page(index);
        decode_to_single_page_document(pdfium, index, &illustration.payload, &illustration_path)?;
        output.append_original(&source, index)?;
        output.append_illustration(&illustration_path)?;
        debug!("Page {}: pair appended ({:?})", index, origin);

        if let Some(ref cb) = config.progress_callback {
            cb.on_page_complete(index, total_pages, origin != IllustrationSource::Fresh);
        }
        pages.push(PageOutcome {
            index,
            prompt,
            illustration: origin,
            illustration_path,
        });
    }

    // ── Finalizing ───────────────────────────────────────────────────────
    let output_path = output.finalize(&paths.output)?;

    let report = RunReport {
        source: paths.source,
        output: output_path,
        log: log.path().to_path_buf(),
        images_dir: paths.images_dir,
        total_pages,
        pages,
        duration_ms: start.elapsed().as_millis() as u64,
    };

    info!(
        "Run complete: {} pages, {} reused illustrations, {}ms",
        total_pages,
        report.reused_count(),
        report.duration_ms
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_run_complete(total_pages, report.reused_count());
    }

    Ok(report)
}

/// The last successful illustration, carried explicitly from page to page.
#[derive(Debug, Default)]
struct LastIllustration {
    last: Option<Illustration>,
}

impl LastIllustration {
    /// Decide which illustration page `page` gets.
    fn resolve(
        &mut self,
        page: usize,
        outcome: Result<Illustration, IllustrationError>,
        policy: FallbackPolicy,
    ) -> Result<(Illustration, IllustrationSource), PikbookError> {
        match outcome {
            Ok(illustration) => {
                self.last = Some(illustration.clone());
                Ok((illustration, IllustrationSource::Fresh))
            }
            Err(cause) => match policy {
                FallbackPolicy::Abort => Err(PikbookError::IllustrationFailed { page, cause }),
                FallbackPolicy::ReuseLast => match &self.last {
                    Some(prev) => Ok((
                        prev.clone(),
                        IllustrationSource::Reused {
                            from_page: prev.source_page,
                        },
                    )),
                    None => Err(PikbookError::NoIllustrationAvailable { page, cause }),
                },
            },
        }
    }
}

/// Resolve the completion provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Named provider** (`config.provider_name`) with `config.model`.
/// 3. **OpenAI** when `OPENAI_API_KEY` is set, the same key the image
///    service uses.
/// 4. **Auto-detection** via `ProviderFactory::from_env`.
fn resolve_provider(config: &PikbookConfig) -> Result<Arc<dyn LLMProvider>, PikbookError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        return create_provider(name, &config.model);
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            return create_provider("openai", &config.model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| PikbookError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY or pass --provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, PikbookError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        PikbookError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}
