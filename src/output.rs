//! Output types of a processed request.

use crate::config::ReportConfig;
use crate::report::{Report, Section};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// The two accepted upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Docx,
    Pdf,
}

impl DocumentKind {
    /// Determine the kind from a file name's extension (case-insensitive).
    ///
    /// Returns `None` for any extension other than `.docx` / `.pdf`.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let ext = Path::new(file_name).extension()?.to_str()?;
        match ext.to_ascii_lowercase().as_str() {
            "docx" => Some(DocumentKind::Docx),
            "pdf" => Some(DocumentKind::Pdf),
            _ => None,
        }
    }

    /// Leading bytes every file of this kind starts with.
    pub fn signature(&self) -> &'static [u8] {
        match self {
            // DOCX is a ZIP container
            DocumentKind::Docx => b"PK\x03\x04",
            DocumentKind::Pdf => b"%PDF",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::Docx => f.write_str("docx"),
            DocumentKind::Pdf => f.write_str("pdf"),
        }
    }
}

/// Result of one successful request: the model reply and its sections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionOutput {
    /// Name of the uploaded file.
    pub file_name: String,
    pub kind: DocumentKind,
    /// Number of characters of extracted document text sent to the model.
    pub document_chars: usize,
    /// Cleaned model reply, as displayed to the user.
    pub reply: String,
    /// Sections parsed from `reply`.
    pub sections: Vec<Section>,
    pub stats: ExtractionStats,
}

impl ExtractionOutput {
    /// Build the renderer input using the configured title and footer.
    pub fn report(&self, config: &ReportConfig) -> Report {
        Report {
            title: config.title.clone(),
            sections: self.sections.clone(),
            footer: config.footer_text.clone(),
        }
    }
}

/// Timing and token statistics for one request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionStats {
    pub extract_duration_ms: u64,
    pub llm_duration_ms: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_from_extension() {
        assert_eq!(DocumentKind::from_file_name("de_cuong.docx"), Some(DocumentKind::Docx));
        assert_eq!(DocumentKind::from_file_name("SYLLABUS.PDF"), Some(DocumentKind::Pdf));
        assert_eq!(DocumentKind::from_file_name("/tmp/a.b/report.Pdf"), Some(DocumentKind::Pdf));
        assert_eq!(DocumentKind::from_file_name("notes.txt"), None);
        assert_eq!(DocumentKind::from_file_name("legacy.doc"), None);
        assert_eq!(DocumentKind::from_file_name("pdf"), None);
        assert_eq!(DocumentKind::from_file_name(""), None);
    }

    #[test]
    fn kind_display_and_signature() {
        assert_eq!(DocumentKind::Pdf.to_string(), "pdf");
        assert_eq!(DocumentKind::Docx.signature(), b"PK\x03\x04");
    }
}
