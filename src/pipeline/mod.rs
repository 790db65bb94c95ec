//! Pipeline stages for illustrating a PDF.
//!
//! Each submodule implements one component of the per-page pipeline:
//!
//! ```text
//! document ──▶ synthesize ──▶ illustrate ──▶ assemble
//! (page text)   (LLM prompt)   (base64 image) (page pair → output PDF)
//! ```
//!
//! 1. [`input`]      — validate the source path and derive the run's file layout
//! 2. [`document`]   — open the source PDF, count pages, extract page text
//! 3. [`synthesize`] — turn page text into an image prompt; failures are fatal
//! 4. [`illustrate`] — request one image per prompt; failures are values
//! 5. [`encode`]     — base64 ⇄ raster image
//! 6. [`assemble`]   — single-page illustration PDFs and the combined output

pub mod assemble;
pub mod document;
pub mod encode;
pub mod illustrate;
pub mod input;
pub mod synthesize;
