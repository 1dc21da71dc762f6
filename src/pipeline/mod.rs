//! Pipeline stages for document-to-report extraction.
//!
//! Each submodule implements exactly one transformation step, so each can be
//! tested on its own and the two adapters (extraction, model) can be swapped
//! without touching the core.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ llm ──▶ postprocess ──▶ sections ──▶ layout ──▶ render
//! (upload)  (docx/pdf)  (model)  (cleanup)      (parser)     (blocks)   (printpdf)
//! ```
//!
//! 1. [`input`]  : read the upload and reject unsupported extensions early
//! 2. [`extract`]: document text from DOCX (`docx-lite`) or PDF (pdfium);
//!    runs in `spawn_blocking`
//! 3. [`llm`]    : one model call behind the [`llm::CompletionClient`] seam;
//!    the only stage with network I/O
//! 4. [`postprocess`]: deterministic cleanup of the reply
//! 5. [`sections`]: split the reply into labelled sections
//! 6. [`layout`] : map sections onto the block model of a layout variant
//! 7. [`render`] : paginate and draw the blocks into an A4 PDF, using the
//!    faces loaded by [`fonts`]

pub mod extract;
pub mod fonts;
pub mod input;
pub mod layout;
pub mod llm;
pub mod postprocess;
pub mod render;
pub mod sections;
