//! Progress-callback trait for per-stage request events.
//!
//! Inject an [`Arc<dyn PipelineProgressCallback>`] via
//! [`crate::config::ReportConfigBuilder::progress_callback`] to be told when
//! each stage of a request starts and finishes. The CLI uses it to drive a
//! spinner; a host application could forward the events anywhere else.
//!
//! # Example
//!
//! ```rust
//! use edgequake_doc2report::{PipelineProgressCallback, ReportConfig};
//! use std::sync::Arc;
//!
//! struct LogStages;
//!
//! impl PipelineProgressCallback for LogStages {
//!     fn on_completion_start(&self, model: &str) {
//!         eprintln!("asking {model}…");
//!     }
//! }
//!
//! let config = ReportConfig::builder()
//!     .progress_callback(Arc::new(LogStages) as Arc<dyn PipelineProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the pipeline as a request moves through its stages.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Stages run one after another, so callbacks are never
/// invoked concurrently for the same request.
pub trait PipelineProgressCallback: Send + Sync {
    /// Called before text extraction starts.
    fn on_extraction_start(&self, file_name: &str) {
        let _ = file_name;
    }

    /// Called after the document text has been extracted.
    ///
    /// # Arguments
    /// * `chars`: number of characters extracted (0 for an empty document)
    fn on_extraction_complete(&self, chars: usize) {
        let _ = chars;
    }

    /// Called just before the model request is sent.
    fn on_completion_start(&self, model: &str) {
        let _ = model;
    }

    /// Called when the model reply has been received and parsed.
    ///
    /// # Arguments
    /// * `reply_len`: byte length of the cleaned reply
    /// * `sections` : number of sections parsed from it
    fn on_completion_complete(&self, reply_len: usize, sections: usize) {
        let _ = (reply_len, sections);
    }

    /// Called when the PDF report has been rendered.
    fn on_render_complete(&self, pages: usize, bytes: usize) {
        let _ = (pages, bytes);
    }

    /// Called when a stage fails; `error` is the user-facing message.
    fn on_error(&self, error: &str) {
        let _ = error;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl PipelineProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ReportConfig`].
pub type ProgressCallback = Arc<dyn PipelineProgressCallback>;
