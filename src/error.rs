//! Error types for the pikbook library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`PikbookError`] — **Fatal**: the run cannot continue (unreadable
//!   source, completion failure, no illustration to fall back on, I/O while
//!   assembling). Returned as `Err(PikbookError)` from [`crate::convert`];
//!   the output document is left unwritten.
//!
//! * [`IllustrationError`] — **Non-fatal**: one image-generation request
//!   failed. The illustrator hands it back as a value and the pipeline
//!   resolves it with the configured [`crate::config::FallbackPolicy`].

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pikbook library.
#[derive(Debug, Error)]
pub enum PikbookError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Source document is missing, unreadable, not a PDF, or corrupt.
    #[error("Cannot open PDF '{path}': {reason}")]
    NotFoundOrUnreadable { path: PathBuf, reason: String },

    /// A page index past the end of the source document was requested.
    #[error("Page index {index} is out of range (document has {total} pages)")]
    IndexOutOfRange { index: usize, total: usize },

    // ── Completion errors ─────────────────────────────────────────────────
    /// The configured completion provider could not be created.
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The completion service returned an error for a page.
    #[error("Prompt synthesis failed for page {page}: {detail}")]
    CompletionFailed { page: usize, detail: String },

    /// The completion service answered, but with nothing usable.
    #[error("Prompt synthesis for page {page} returned no text")]
    EmptyCompletion { page: usize },

    // ── Illustration errors ───────────────────────────────────────────────
    /// Image generation failed and there is no earlier illustration to reuse.
    #[error("No illustration available for page {page}: {cause}")]
    NoIllustrationAvailable { page: usize, cause: IllustrationError },

    /// Image generation failed under the abort policy.
    #[error("Illustration failed for page {page}: {cause}")]
    IllustrationFailed { page: usize, cause: IllustrationError },

    /// The illustration payload is not valid base64 or not a decodable image.
    #[error("Invalid illustration payload for page {page}: {detail}")]
    InvalidPayload { page: usize, detail: String },

    // ── Assembly errors ───────────────────────────────────────────────────
    /// pdfium rejected an operation on the output or a single-page document.
    #[error("PDF assembly failed at {path}: {detail}")]
    Assembly { path: PathBuf, detail: String },

    /// Could not create the images directory, the log or the output file.
    #[error("Failed to write '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or place the library in the working directory."
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error from a single image-generation request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IllustrationError {
    /// No API key in the config or `OPENAI_API_KEY`.
    #[error("no API key configured for the image service")]
    MissingApiKey,

    /// The service answered with a non-success status.
    #[error("image service returned HTTP {status}: {detail}")]
    Status { status: u16, detail: String },

    /// The request did not complete in time.
    #[error("image request timed out after {secs}s")]
    Timeout { secs: u64 },

    /// Connection or transport failure.
    #[error("image request failed: {0}")]
    Transport(String),

    /// The response body could not be understood or held no image.
    #[error("malformed image response: {0}")]
    MalformedResponse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_out_of_range_display() {
        let e = PikbookError::IndexOutOfRange { index: 7, total: 3 };
        let msg = e.to_string();
        assert!(msg.contains("7"), "got: {msg}");
        assert!(msg.contains("3 pages"), "got: {msg}");
    }

    #[test]
    fn no_illustration_carries_cause() {
        let e = PikbookError::NoIllustrationAvailable {
            page: 0,
            cause: IllustrationError::Status {
                status: 400,
                detail: "content policy".into(),
            },
        };
        let msg = e.to_string();
        assert!(msg.contains("page 0"));
        assert!(msg.contains("HTTP 400"));
        assert!(msg.contains("content policy"));
    }

    #[test]
    fn timeout_display() {
        let e = IllustrationError::Timeout { secs: 120 };
        assert!(e.to_string().contains("120s"));
    }

    #[test]
    fn not_found_display_includes_reason() {
        let e = PikbookError::NotFoundOrUnreadable {
            path: PathBuf::from("/tmp/missing.pdf"),
            reason: "file not found".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("missing.pdf"));
        assert!(msg.contains("file not found"));
    }
}
