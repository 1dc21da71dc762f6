//! Error types for the edgequake-doc2report library.
//!
//! One request-level error type wraps one error type per pipeline stage:
//!
//! * [`Doc2ReportError`]: returned by the top-level `process*` functions.
//!   Every failure of a request ends up here, including the milder
//!   [`Doc2ReportError::EmptyDocument`] condition which callers should show
//!   as a warning (see [`Doc2ReportError::severity`]).
//!
//! * [`ExtractionError`], [`CompletionError`], [`RenderError`]: typed
//!   failures of the three adapters. Each stage converts its library errors
//!   into one of these at its boundary; nothing below the stage leaks out.
//!
//! Extraction and completion failures are terminal for the request: the
//! pipeline never retries them. A [`RenderError`] only affects the PDF
//! download; the textual result it was rendering from is never lost.

use crate::output::DocumentKind;
use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by a doc2report request.
#[derive(Debug, Error)]
pub enum Doc2ReportError {
    // ── Upload / input errors ─────────────────────────────────────────────
    /// No file was provided, or the given path does not exist.
    #[error("No document uploaded: '{path}' does not exist.\nUpload a .docx or .pdf file.")]
    UploadMissing { path: PathBuf },

    /// The upload's extension is neither `.docx` nor `.pdf`.
    #[error("Unsupported file type '{file_name}': only .docx and .pdf files are accepted")]
    UnsupportedFileType { file_name: String },

    /// The extraction prompt is empty (or whitespace only).
    #[error("The extraction prompt must not be empty")]
    PromptEmpty,

    // ── Stage errors ──────────────────────────────────────────────────────
    /// Text extraction failed; the request is aborted.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// The document was readable but contains no text.
    ///
    /// Reported as a warning, not an error: nothing is wrong with the file,
    /// there is just nothing to send to the model.
    #[error("No text content found in '{file_name}'")]
    EmptyDocument { file_name: String },

    /// The model completion failed; the request is aborted.
    #[error(transparent)]
    Completion(#[from] CompletionError),

    /// PDF report rendering failed.
    #[error(transparent)]
    Render(#[from] RenderError),

    // ── Provider / credential errors ──────────────────────────────────────
    /// The provider's API credential is not available.
    #[error("No API credential for provider '{provider}'.\nSet {env_var} or enter it when prompted.")]
    CredentialMissing { provider: String, env_var: String },

    /// The configured provider could not be initialised.
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── Config / I/O errors ───────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Reading the uploaded file failed after it was found.
    #[error("Failed to read '{path}': {source}")]
    UploadReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write the report file.
    #[error("Failed to write report file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// How a [`Doc2ReportError`] should be presented to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

impl Doc2ReportError {
    /// Classify the error for presentation.
    ///
    /// Input problems the user can fix by changing the form (no upload, empty
    /// prompt) and an empty document are warnings; everything else is an error.
    pub fn severity(&self) -> Severity {
        match self {
            Doc2ReportError::UploadMissing { .. }
            | Doc2ReportError::PromptEmpty
            | Doc2ReportError::EmptyDocument { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

/// Text extraction failure for an uploaded document.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The bytes do not start with the signature expected for the declared kind.
    #[error("'{file_name}' is not a valid {kind} file (first bytes: {magic:?})")]
    SignatureMismatch {
        file_name: String,
        kind: DocumentKind,
        magic: Vec<u8>,
    },

    /// The document is corrupt or uses a structure the parser cannot read.
    #[error("Failed to read {kind} file '{file_name}': {detail}")]
    Unreadable {
        file_name: String,
        kind: DocumentKind,
        detail: String,
    },

    /// The PDF is encrypted.
    #[error("PDF '{file_name}' is password-protected")]
    PasswordProtected { file_name: String },

    /// The PDF engine (libpdfium) could not be loaded.
    #[error(
        "PDF engine unavailable: {0}\n\
PDFium is downloaded automatically on first use.\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy."
    )]
    PdfEngineUnavailable(String),
}

/// Failure of the remote model completion call.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum CompletionError {
    /// Connection, DNS or transport failure.
    #[error("Network error while calling the model: {0}")]
    Network(String),

    /// The API rejected the credential (HTTP 401/403).
    #[error("Authentication failed: {0}\nCheck your API key.")]
    Authentication(String),

    /// Quota or rate limit exceeded (HTTP 429).
    #[error("Rate limit or quota exceeded: {0}")]
    RateLimited(String),

    /// The provider answered with something that is not a completion.
    #[error("Malformed response from the model: {0}")]
    MalformedResponse(String),

    /// The call did not finish within the configured timeout.
    #[error("Model call timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The model returned an empty completion.
    #[error("The model returned an empty reply")]
    EmptyReply,

    /// Any other provider error.
    #[error("Model call failed: {0}")]
    Provider(String),
}

/// Failure while laying out or writing the PDF report.
#[derive(Debug, Error)]
pub enum RenderError {
    /// No usable font file was found or it could not be read.
    #[error("Report font unavailable: {0}\nPass --font /path/to/font.ttf")]
    FontUnavailable(String),

    /// The font file could not be parsed as TrueType/OpenType.
    #[error("Report font '{font}' could not be parsed")]
    FontParse { font: String },

    /// The font lacks glyphs needed for the report alphabet.
    #[error("Report font '{font}' has no glyphs for: {missing}")]
    FontCoverage { font: String, missing: String },

    /// The PDF writer failed.
    #[error("Failed to write PDF: {0}")]
    Pdf(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_a_warning() {
        let e = Doc2ReportError::EmptyDocument {
            file_name: "scan.pdf".into(),
        };
        assert_eq!(e.severity(), Severity::Warning);
        assert!(e.to_string().contains("scan.pdf"));
    }

    #[test]
    fn stage_errors_are_errors() {
        let e: Doc2ReportError = CompletionError::Timeout { secs: 60 }.into();
        assert_eq!(e.severity(), Severity::Error);
        assert!(e.to_string().contains("60s"));

        let e: Doc2ReportError = RenderError::FontUnavailable("none found".into()).into();
        assert_eq!(e.severity(), Severity::Error);
    }

    #[test]
    fn unsupported_type_display() {
        let e = Doc2ReportError::UnsupportedFileType {
            file_name: "notes.txt".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("notes.txt"), "got: {msg}");
        assert!(msg.contains(".docx"));
    }

    #[test]
    fn credential_missing_names_env_var() {
        let e = Doc2ReportError::CredentialMissing {
            provider: "openai".into(),
            env_var: "OPENAI_API_KEY".into(),
        };
        assert!(e.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn font_coverage_display() {
        let e = RenderError::FontCoverage {
            font: "Helvetica".into(),
            missing: "ệ ữ".into(),
        };
        assert!(e.to_string().contains("ệ ữ"));
    }
}
