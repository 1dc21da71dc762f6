//! # edgequake-doc2report
//!
//! Extract structured information from Word (`.docx`) and PDF documents with
//! an LLM, and render it as a downloadable PDF report.
//!
//! ## Why this crate?
//!
//! Course syllabi and similar documents carry the same handful of fields
//! (course name, code, credits, objectives, …) in wildly different layouts.
//! Instead of a template per layout, this crate hands the full document text
//! to a chat model together with an editable prompt asking for a numbered
//! list, then turns that list back into labelled sections.
//!
//! ## Pipeline Overview
//!
//! ```text
//! .docx / .pdf
//!  │
//!  ├─ 1. Input     check the extension, read the bytes
//!  ├─ 2. Extract   docx-lite / pdfium (spawn_blocking)
//!  ├─ 3. Model     one chat call: system + document + prompt
//!  ├─ 4. Clean     fences, line endings, bold item numbers
//!  ├─ 5. Sections  numbered-list parser
//!  └─ 6. Report    layout variant → paginated A4 PDF (printpdf)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_doc2report::{process_file, write_report, ReportConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / GEMINI_API_KEY
//!     let config = ReportConfig::default();
//!     let output = process_file("de_cuong.docx", &config).await?;
//!     println!("{}", output.reply);
//!     let pdf = write_report(&output, ".", &config).await?;
//!     eprintln!("report: {}", pdf.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `doc2report` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-doc2report = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod progress;
pub mod prompts;
pub mod report;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{FontSource, LayoutVariant, ReportConfig, ReportConfigBuilder};
pub use error::{CompletionError, Doc2ReportError, ExtractionError, RenderError, Severity};
pub use output::{DocumentKind, ExtractionOutput, ExtractionStats};
pub use pipeline::input::Upload;
pub use pipeline::llm::{Completion, CompletionClient, CompletionRequest, ProviderClient};
pub use pipeline::render::RenderedReport;
pub use process::{
    process_file, process_file_sync, process_upload, render_output, resolve_provider,
    write_report,
};
pub use progress::{NoopProgressCallback, PipelineProgressCallback, ProgressCallback};
pub use report::{Report, Section};
