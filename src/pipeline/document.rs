//! Source-document access via pdfium: page count, page text, page objects.
//!
//! The document is opened once and stays read-only for the whole run. Page
//! objects never leave pdfium: the assembler copies a page by handing the
//! [`SourceDocument`] and an index to pdfium's own page-import routine, which
//! preserves the page's content and formatting untouched.

use crate::error::PikbookError;
use crate::pipeline::input::resolve_local;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Bind to a pdfium shared library.
///
/// Resolution order: `PDFIUM_LIB_PATH`, then a library in the working
/// directory, then the system library search path.
pub fn bind_pdfium() -> Result<Pdfium, PikbookError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(path) if !path.is_empty() => Pdfium::bind_to_library(&path),
        _ => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| PikbookError::PdfiumBindingFailed(format!("{e:?}")))?;

    Ok(Pdfium::new(bindings))
}

/// An opened source PDF.
pub struct SourceDocument<'a> {
    path: PathBuf,
    document: PdfDocument<'a>,
    page_count: usize,
}

impl<'a> SourceDocument<'a> {
    /// Open and parse the PDF at `path`.
    pub fn open(pdfium: &'a Pdfium, path: &Path) -> Result<Self, PikbookError> {
        let path = resolve_local(path)?;

        let document = pdfium.load_pdf_from_file(&path, None).map_err(|e| {
            PikbookError::NotFoundOrUnreadable {
                path: path.clone(),
                reason: format!("{e:?}"),
            }
        })?;

        let page_count = document.pages().len() as usize;
        info!("PDF loaded: {} pages", page_count);

        Ok(Self {
            path,
            document,
            page_count,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Extracted text of page `index`; empty when the page has no text layer.
    pub fn page_text(&self, index: usize) -> Result<String, PikbookError> {
        let page = self.page_object(index)?;
        let text = match page.text() {
            Ok(text) => text.all(),
            Err(e) => {
                debug!("Page {}: no extractable text ({:?})", index, e);
                String::new()
            }
        };
        debug!("Page {}: extracted {} chars", index, text.len());
        Ok(text)
    }

    /// The pdfium page object for `index`.
    pub fn page_object(&self, index: usize) -> Result<PdfPage<'_>, PikbookError> {
        let pdf_index = self.checked_index(index)?;
        self.document
            .pages()
            .get(pdf_index)
            .map_err(|e| PikbookError::NotFoundOrUnreadable {
                path: self.path.clone(),
                reason: format!("page {index}: {e:?}"),
            })
    }

    /// Validate `index` and convert it to pdfium's page index type.
    pub(crate) fn checked_index(&self, index: usize) -> Result<PdfPageIndex, PikbookError> {
        if index >= self.page_count {
            return Err(PikbookError::IndexOutOfRange {
                index,
                total: self.page_count,
            });
        }
        PdfPageIndex::try_from(index).map_err(|_| PikbookError::IndexOutOfRange {
            index,
            total: self.page_count,
        })
    }

    pub(crate) fn document(&self) -> &PdfDocument<'a> {
        &self.document
    }
}

/// Open `path` and report its page count without touching any service.
pub fn inspect(path: impl AsRef<Path>) -> Result<usize, PikbookError> {
    let pdfium = bind_pdfium()?;
    let source = SourceDocument::open(&pdfium, path.as_ref())?;
    Ok(source.page_count())
}
