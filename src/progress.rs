//! Progress-callback trait for per-group conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the pipeline finishes each group of pages.
//!
//! Callbacks are purely observational: the pipeline ignores anything they do
//! and their timing never affects the produced deck.
//!
//! # Example
//!
//! ```rust
//! use edgequake_pdf2pptx::{ConversionProgressCallback, ConversionConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: Arc<AtomicUsize>,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_group_complete(&self, done: usize, total: usize, message: &str) {
//!         self.completed.store(done, Ordering::SeqCst);
//!         eprintln!("{message} ({}%)", done * 100 / total);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     completed: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the conversion pipeline as it processes each group.
///
/// Implementations must be `Send + Sync`: groups are enriched concurrently
/// and `on_group_complete` may be called from different tasks. All methods
/// have default no-op implementations.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once after extraction and grouping, before any service call.
    fn on_conversion_start(&self, total_groups: usize) {
        let _ = total_groups;
    }

    /// Called after each group has been enriched and paginated.
    ///
    /// # Arguments
    /// * `done`    — groups finished so far (1..=total, increasing)
    /// * `total`   — total number of groups
    /// * `message` — human-readable label, e.g. `"Part 2/7"`
    fn on_group_complete(&self, done: usize, total: usize, message: &str) {
        let _ = (done, total, message);
    }

    /// Called once after every group has been processed.
    fn on_conversion_complete(&self, total_groups: usize, total_slides: usize) {
        let _ = (total_groups, total_slides);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
