//! # pikbook
//!
//! Illustrate every page of a PDF. For each page, pikbook extracts the text,
//! asks a language model to turn it into an image-generation prompt, asks an
//! image model to render that prompt, and writes a new PDF in which every
//! original page is followed by its illustration.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Load        open the source with pdfium, count pages
//!  ├─ 2. Extract     page text (possibly empty)
//!  ├─ 3. Synthesize  LLM: template + text → image prompt   (1000 tokens, T=0.3)
//!  ├─ 4. Illustrate  image API: prompt → base64 512×512 image
//!  ├─ 5. Assemble    image → one-page PDF; append original + illustration
//!  └─ 6. Finalize    write <stem>-pikbook.pdf
//! ```
//!
//! Pages run strictly one after another. A failed image request is logged
//! and resolved by [`FallbackPolicy`]; every other failure ends the run
//! without writing the combined document.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pikbook::{convert, PikbookConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads OPENAI_API_KEY for both the completion and the image service.
//!     let config = PikbookConfig::default();
//!     let report = convert("fable.pdf", &config).await?;
//!     println!("{} pages → {}", report.total_pages, report.output.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pikbook` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod runlog;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{FallbackPolicy, ImageSize, PikbookConfig, PikbookConfigBuilder};
pub use convert::{convert, convert_with};
pub use error::{IllustrationError, PikbookError};
pub use output::{IllustrationSource, PageOutcome, RunReport};
pub use pipeline::document::{bind_pdfium, inspect};
pub use pipeline::illustrate::{ImageRequest, ImageService};
pub use pipeline::synthesize::CompletionService;
pub use progress::{NoopProgressCallback, PikbookProgressCallback, ProgressCallback};
pub use runlog::RunLog;

pub use edgequake_llm::CompletionOptions;
