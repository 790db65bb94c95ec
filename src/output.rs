//! Result types of a completed run.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where a page's illustration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IllustrationSource {
    /// Generated for this page.
    Fresh,
    /// The image request failed; the illustration of `from_page` was reused.
    Reused { from_page: usize },
}

/// Outcome of one page pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageOutcome {
    /// 0-based page index in the source document.
    pub index: usize,
    /// The synthesised image prompt.
    pub prompt: String,
    pub illustration: IllustrationSource,
    /// Single-page PDF holding this page's illustration.
    pub illustration_path: PathBuf,
}

/// Summary of a finished run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub source: PathBuf,
    pub output: PathBuf,
    pub log: PathBuf,
    pub images_dir: PathBuf,
    /// Pages in the source document.
    pub total_pages: usize,
    /// One entry per source page, in source order.
    pub pages: Vec<PageOutcome>,
    pub duration_ms: u64,
}

impl RunReport {
    /// Pages whose illustration was carried over from an earlier page.
    pub fn reused_count(&self) -> usize {
        self.pages
            .iter()
            .filter(|p| matches!(p.illustration, IllustrationSource::Reused { .. }))
            .count()
    }

    /// Pages in the combined output: one original plus one illustration each.
    pub fn output_page_count(&self) -> usize {
        self.pages.len() * 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(index: usize, illustration: IllustrationSource) -> PageOutcome {
        PageOutcome {
            index,
            prompt: format!("prompt {index}"),
            illustration,
            illustration_path: PathBuf::from(format!("doc-images/image_page{index}.pdf")),
        }
    }

    #[test]
    fn counts() {
        let report = RunReport {
            source: "doc.pdf".into(),
            output: "doc-pikbook.pdf".into(),
            log: "doc.log".into(),
            images_dir: "doc-images".into(),
            total_pages: 3,
            pages: vec![
                outcome(0, IllustrationSource::Fresh),
                outcome(1, IllustrationSource::Reused { from_page: 0 }),
                outcome(2, IllustrationSource::Fresh),
            ],
            duration_ms: 10,
        };
        assert_eq!(report.reused_count(), 1);
        assert_eq!(report.output_page_count(), 6);
    }

    #[test]
    fn illustration_source_json() {
        let json = serde_json::to_string(&IllustrationSource::Reused { from_page: 4 }).unwrap();
        assert_eq!(json, r#"{"kind":"reused","from_page":4}"#);
        let json = serde_json::to_string(&IllustrationSource::Fresh).unwrap();
        assert_eq!(json, r#"{"kind":"fresh"}"#);
    }
}
