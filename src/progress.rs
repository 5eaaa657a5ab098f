//! Progress-callback trait for extraction events.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::ExtractionConfigBuilder::progress`] to receive events as
//! the pipeline renders each page and drives the model request.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers can
//! forward events to a terminal progress bar, a log, or a UI without the
//! library knowing anything about how the host application communicates.
//! The trait is `Send + Sync` because rendering happens on a blocking-pool
//! thread while the caller may live on the async side.

use std::sync::Arc;

/// Called by the extraction pipeline as it progresses.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Events arrive strictly in order: one
/// `on_render_start`, then one `on_page_rendered` per page in page order,
/// then `on_request_start` and `on_request_complete` around the single
/// model call.
pub trait ExtractionProgressCallback: Send + Sync {
    /// Called once before any page is rendered.
    ///
    /// # Arguments
    /// * `pages_to_process` — number of pages that will be rasterised
    ///   (already bounded by `max_pages`)
    fn on_render_start(&self, pages_to_process: usize) {
        let _ = pages_to_process;
    }

    /// Called after each page has been rasterised and encoded.
    ///
    /// # Arguments
    /// * `page_num` — 1-indexed page number
    /// * `total`    — pages being processed
    fn on_page_rendered(&self, page_num: usize, total: usize) {
        let _ = (page_num, total);
    }

    /// Called just before the model request is sent.
    fn on_request_start(&self, image_count: usize) {
        let _ = image_count;
    }

    /// Called when the model reply has been received.
    ///
    /// # Arguments
    /// * `reply_len` — byte length of the raw reply text
    fn on_request_complete(&self, reply_len: usize) {
        let _ = reply_len;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExtractionConfig`].
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TrackingCallback {
        rendered: AtomicUsize,
        render_total: AtomicUsize,
        request_images: AtomicUsize,
        reply_len: AtomicUsize,
    }

    impl ExtractionProgressCallback for TrackingCallback {
        fn on_render_start(&self, pages_to_process: usize) {
            self.render_total.store(pages_to_process, Ordering::SeqCst);
        }

        fn on_page_rendered(&self, _page_num: usize, _total: usize) {
            self.rendered.fetch_add(1, Ordering::SeqCst);
        }

        fn on_request_start(&self, image_count: usize) {
            self.request_images.store(image_count, Ordering::SeqCst);
        }

        fn on_request_complete(&self, reply_len: usize) {
            self.reply_len.store(reply_len, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_render_start(5);
        cb.on_page_rendered(1, 5);
        cb.on_request_start(5);
        cb.on_request_complete(42);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback {
            rendered: AtomicUsize::new(0),
            render_total: AtomicUsize::new(0),
            request_images: AtomicUsize::new(0),
            reply_len: AtomicUsize::new(0),
        };

        tracker.on_render_start(3);
        tracker.on_page_rendered(1, 3);
        tracker.on_page_rendered(2, 3);
        tracker.on_page_rendered(3, 3);
        tracker.on_request_start(3);
        tracker.on_request_complete(120);

        assert_eq!(tracker.render_total.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.rendered.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.request_images.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.reply_len.load(Ordering::SeqCst), 120);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: Arc<dyn ExtractionProgressCallback> = Arc::new(NoopProgressCallback);
        cb.on_render_start(10);
        cb.on_page_rendered(1, 10);
    }
}
