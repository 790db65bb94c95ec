//! Input validation and the file layout of a run.
//!
//! Before pdfium touches the file we check it exists, is readable and starts
//! with the `%PDF` magic bytes, so callers get a meaningful
//! [`PikbookError::NotFoundOrUnreadable`] instead of a parser error.
//!
//! Every artifact of a run is named after the source document:
//!
//! ```text
//! books/fable.pdf            source
//! books/fable.log            diagnostic log
//! books/fable-images/        image_page0.pdf, image_page1.pdf, …
//! books/fable-pikbook.pdf    combined output
//! ```

use crate::error::PikbookError;
use std::ffi::OsString;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Validate that `path` is a readable PDF file.
pub fn resolve_local(path: &Path) -> Result<PathBuf, PikbookError> {
    let unreadable = |reason: String| PikbookError::NotFoundOrUnreadable {
        path: path.to_path_buf(),
        reason,
    };

    if !path.exists() {
        return Err(unreadable("file not found".into()));
    }
    if path.is_dir() {
        return Err(unreadable("path is a directory".into()));
    }

    match std::fs::File::open(path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_err() {
                return Err(unreadable("file is too short to be a PDF".into()));
            }
            if &magic != b"%PDF" {
                return Err(unreadable(format!("not a PDF, first bytes: {magic:?}")));
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(unreadable("permission denied".into()));
        }
        Err(e) => return Err(unreadable(e.to_string())),
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(path.to_path_buf())
}

/// Paths of every file a run reads or writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPaths {
    pub source: PathBuf,
    pub log: PathBuf,
    pub images_dir: PathBuf,
    pub output: PathBuf,
}

impl RunPaths {
    /// Derive the artifact paths from the source path.
    pub fn for_source(source: impl AsRef<Path>) -> Self {
        let source = source.as_ref().to_path_buf();
        let stem = source.with_extension("");
        let ext = source
            .extension()
            .map(|e| e.to_os_string())
            .unwrap_or_else(|| OsString::from("pdf"));

        let mut output = with_suffix(&stem, "-pikbook.");
        output.push(&ext);

        Self {
            log: with_suffix(&stem, ".log").into(),
            images_dir: with_suffix(&stem, "-images").into(),
            output: output.into(),
            source,
        }
    }

    /// Path of the single-page document holding page `index`'s illustration.
    pub fn illustration_page(&self, index: usize) -> PathBuf {
        self.images_dir.join(format!("image_page{index}.pdf"))
    }

    /// Create the images directory. Succeeds if it already exists.
    pub fn ensure_images_dir(&self) -> Result<(), PikbookError> {
        std::fs::create_dir_all(&self.images_dir).map_err(|e| PikbookError::OutputWriteFailed {
            path: self.images_dir.clone(),
            source: e,
        })
    }
}

fn with_suffix(stem: &Path, suffix: &str) -> OsString {
    let mut s = stem.as_os_str().to_os_string();
    s.push(suffix);
    s
}
