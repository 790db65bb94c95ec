//! Output assembly: illustration → single-page PDF, page pairs → output PDF.
//!
//! Each illustration is first written to its own one-page PDF in the images
//! directory, sized to the image at one point per pixel, and then imported
//! into the output document right after the original page it illustrates.
//! The staging files are kept after the run.

use crate::error::PikbookError;
use crate::pipeline::document::SourceDocument;
use crate::pipeline::encode::decode_payload;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

fn assembly_error(path: &Path, e: PdfiumError) -> PikbookError {
    PikbookError::Assembly {
        path: path.to_path_buf(),
        detail: format!("{e:?}"),
    }
}

/// Decode `payload` and write it as a one-page PDF at `path`.
///
/// Overwrites any file already at `path`.
pub fn decode_to_single_page_document(
    pdfium: &Pdfium,
    page: usize,
    payload: &str,
    path: &Path,
) -> Result<(), PikbookError> {
    let image = decode_payload(page, payload)?;
    write_single_page_document(pdfium, &image, path)
}

/// Write `image` as the only page of a new PDF at `path`.
pub fn write_single_page_document(
    pdfium: &Pdfium,
    image: &DynamicImage,
    path: &Path,
) -> Result<(), PikbookError> {
    let mut document = pdfium
        .create_new_pdf()
        .map_err(|e| assembly_error(path, e))?;

    let width = PdfPoints::new(image.width() as f32);
    let height = PdfPoints::new(image.height() as f32);

    {
        let mut pdf_page = document
            .pages_mut()
            .create_page_at_end(PdfPagePaperSize::from_points(width, height))
            .map_err(|e| assembly_error(path, e))?;

        pdf_page
            .objects_mut()
            .create_image_object(PdfPoints::ZERO, PdfPoints::ZERO, image, Some(width), Some(height))
            .map_err(|e| assembly_error(path, e))?;
    }

    document
        .save_to_file(path)
        .map_err(|e| assembly_error(path, e))?;

    debug!(
        "Wrote {}x{} px illustration to {}",
        image.width(),
        image.height(),
        path.display()
    );
    Ok(())
}

/// The combined document being built, one page pair at a time.
pub struct OutputDocument<'a> {
    pdfium: &'a Pdfium,
    document: PdfDocument<'a>,
}

impl<'a> OutputDocument<'a> {
    /// Start an empty output document.
    pub fn new(pdfium: &'a Pdfium) -> Result<Self, PikbookError> {
        let document = pdfium
            .create_new_pdf()
            .map_err(|e| assembly_error(Path::new("<output>"), e))?;
        Ok(Self { pdfium, document })
    }

    pub fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    /// Copy page `index` of `source` unmodified to the end of the output.
    pub fn append_original(
        &mut self,
        source: &SourceDocument<'_>,
        index: usize,
    ) -> Result<(), PikbookError> {
        let src_index = source.checked_index(index)?;
        let dest_index = self.page_count() as PdfPageIndex;
        self.document
            .pages_mut()
            .copy_page_from_document(source.document(), src_index, dest_index)
            .map_err(|e| assembly_error(source.path(), e))?;
        debug!("Appended original page {} as output page {}", index, dest_index);
        Ok(())
    }

    /// Open the one-page PDF at `path` and append its page to the output.
    pub fn append_illustration(&mut self, path: &Path) -> Result<(), PikbookError> {
        let single = self
            .pdfium
            .load_pdf_from_file(path, None)
            .map_err(|e| assembly_error(path, e))?;

        let dest_index = self.page_count() as PdfPageIndex;
        self.document
            .pages_mut()
            .copy_page_from_document(&single, 0, dest_index)
            .map_err(|e| assembly_error(path, e))?;
        debug!("Appended {} as output page {}", path.display(), dest_index);
        Ok(())
    }

    /// Serialise the output to `path` and release it.
    ///
    /// The document is saved to a temporary file in the destination
    /// directory and then moved into place, so an interrupted save never
    /// leaves a truncated output behind.
    pub fn finalize(self, path: &Path) -> Result<PathBuf, PikbookError> {
        let write_failed = |e: std::io::Error| PikbookError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        };

        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent).map_err(write_failed)?;

        let tmp = tempfile::Builder::new()
            .prefix(".pikbook-")
            .suffix(".pdf.tmp")
            .tempfile_in(&parent)
            .map_err(write_failed)?;

        self.document
            .save_to_file(tmp.path())
            .map_err(|e| assembly_error(path, e))?;

        let pages = self.page_count();
        drop(self.document);

        publish(tmp, path).map_err(write_failed)?;
        info!("Wrote {} pages to {}", pages, path.display());
        Ok(path.to_path_buf())
    }
}

/// Move a finished temp file to `path` with regular file permissions.
///
/// Temp files are created owner-only; the published output is not.
fn publish(tmp: NamedTempFile, path: &Path) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o644))?;
    }
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn publish_moves_file_into_place() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("book-pikbook.pdf");
        let mut tmp = tempfile::Builder::new()
            .prefix(".pikbook-")
            .suffix(".pdf.tmp")
            .tempfile_in(dir.path())
            .unwrap();
        tmp.write_all(b"%PDF-1.7\n").unwrap();
        let staged = tmp.path().to_path_buf();

        publish(tmp, &target).unwrap();

        assert_eq!(std::fs::read(&target).unwrap(), b"%PDF-1.7\n");
        assert!(!staged.exists());
    }

    #[cfg(unix)]
    #[test]
    fn published_output_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("book-pikbook.pdf");
        let tmp = tempfile::Builder::new()
            .prefix(".pikbook-")
            .suffix(".pdf.tmp")
            .tempfile_in(dir.path())
            .unwrap();
        assert_eq!(tmp.as_file().metadata().unwrap().permissions().mode() & 0o777, 0o600);

        publish(tmp, &target).unwrap();

        let mode = std::fs::metadata(&target).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644, "got {mode:o}");
    }

    #[test]
    fn publish_replaces_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("book-pikbook.pdf");
        std::fs::write(&target, b"old").unwrap();

        let mut tmp = tempfile::NamedTempFile::new_in(dir.path()).unwrap();
        tmp.write_all(b"new").unwrap();
        publish(tmp, &target).unwrap();

        assert_eq!(std::fs::read(&target).unwrap(), b"new");
    }
}
