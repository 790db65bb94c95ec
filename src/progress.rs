//! Progress-callback trait for per-page pipeline events.
//!
//! Inject an [`Arc<dyn PikbookProgressCallback>`] via
//! [`crate::config::PikbookConfigBuilder::progress_callback`] to follow a run
//! page by page. The library knows nothing about terminals; the `pikbook`
//! binary renders these events as an indicatif progress bar.
//!
//! # Example
//!
//! ```rust
//! use pikbook::{PikbookConfig, PikbookProgressCallback, ProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl PikbookProgressCallback for CountingCallback {
//!     fn on_page_complete(&self, page_index: usize, total_pages: usize, _reused: bool) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("page {}/{} illustrated", page_index + 1, total_pages);
//!     }
//! }
//!
//! let cb: ProgressCallback = Arc::new(CountingCallback { completed: AtomicUsize::new(0) });
//! let config = PikbookConfig::builder().progress_callback(cb).build().unwrap();
//! ```

use std::sync::Arc;

/// Called by the pipeline as it processes each page.
///
/// Pages are processed strictly in order, so events for page `i` always
/// precede events for page `i + 1`. All methods default to no-ops.
pub trait PikbookProgressCallback: Send + Sync {
    /// Called once after the source document is opened.
    fn on_run_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called before text extraction for a page (0-indexed).
    fn on_page_start(&self, page_index: usize, total_pages: usize) {
        let _ = (page_index, total_pages);
    }

    /// Called once a page pair has been appended to the output.
    ///
    /// `reused` is true when the illustration was carried over from an
    /// earlier page because the image request failed.
    fn on_page_complete(&self, page_index: usize, total_pages: usize, reused: bool) {
        let _ = (page_index, total_pages, reused);
    }

    /// Called when an image request fails, before the fallback policy runs.
    fn on_illustration_fallback(&self, page_index: usize, error: &str) {
        let _ = (page_index, error);
    }

    /// Called once after the output document has been written.
    fn on_run_complete(&self, total_pages: usize, reused_count: usize) {
        let _ = (total_pages, reused_count);
    }
}

/// A no-op implementation, used when no callback is configured.
pub struct NoopProgressCallback;

impl PikbookProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::PikbookConfig`].
pub type ProgressCallback = Arc<dyn PikbookProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        reused: AtomicUsize,
        fallbacks: AtomicUsize,
    }

    impl PikbookProgressCallback for TrackingCallback {
        fn on_page_start(&self, _page_index: usize, _total_pages: usize) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_page_complete(&self, _page_index: usize, _total_pages: usize, reused: bool) {
            self.completes.fetch_add(1, Ordering::SeqCst);
            if reused {
                self.reused.fetch_add(1, Ordering::SeqCst);
            }
        }

        fn on_illustration_fallback(&self, _page_index: usize, _error: &str) {
            self.fallbacks.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_run_start(2);
        cb.on_page_start(0, 2);
        cb.on_page_complete(0, 2, false);
        cb.on_illustration_fallback(1, "HTTP 500");
        cb.on_run_complete(2, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        tracker.on_page_start(0, 2);
        tracker.on_page_complete(0, 2, false);
        tracker.on_page_start(1, 2);
        tracker.on_illustration_fallback(1, "timeout");
        tracker.on_page_complete(1, 2, true);

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.reused.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.fallbacks.load(Ordering::SeqCst), 1);
    }
}
