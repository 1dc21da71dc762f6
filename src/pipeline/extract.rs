//! Text extraction: uploaded `.docx` / `.pdf` bytes → raw document text.
//!
//! Both parsers are CPU-bound and synchronous, so each runs inside
//! `tokio::task::spawn_blocking`. Failures of either library are converted
//! into [`ExtractionError`] here; nothing raw crosses this boundary.
//!
//! * **DOCX**: parsed with `docx-lite` from an in-memory cursor over the
//!   upload bytes.
//! * **PDF**: parsed with pdfium straight from the byte slice. The library
//!   is bound through `pdfium-auto`, which downloads and caches libpdfium on
//!   first use (or honours `PDFIUM_LIB_PATH`).
//!
//! An empty result is not an error at this level; the caller decides how to
//! report a document without text.

use crate::error::ExtractionError;
use crate::output::DocumentKind;
use crate::pipeline::input::Upload;
use pdfium_render::prelude::*;
use std::io::Cursor;
use tracing::{debug, info};

/// Raw text extracted from an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    pub kind: DocumentKind,
    pub text: String,
}

impl ExtractedText {
    /// `true` when the document contains nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Extract the text of `upload` as a document of type `kind`.
pub async fn extract_text(
    upload: &Upload,
    kind: DocumentKind,
) -> Result<ExtractedText, ExtractionError> {
    check_signature(upload, kind)?;

    let file_name = upload.file_name.clone();
    let bytes = upload.bytes.clone();
    info!("Extracting text from {} ({} bytes)", file_name, bytes.len());

    let text = tokio::task::spawn_blocking(move || match kind {
        DocumentKind::Docx => extract_docx_blocking(&file_name, &bytes),
        DocumentKind::Pdf => extract_pdf_blocking(&file_name, &bytes),
    })
    .await
    .map_err(|e| ExtractionError::Unreadable {
        file_name: upload.file_name.clone(),
        kind,
        detail: format!("extraction task panicked: {e}"),
    })??;

    debug!("Extracted {} chars from {}", text.chars().count(), upload.file_name);
    Ok(ExtractedText { kind, text })
}

/// Verify the upload starts with the signature of its declared kind.
fn check_signature(upload: &Upload, kind: DocumentKind) -> Result<(), ExtractionError> {
    let signature = kind.signature();
    if upload.bytes.starts_with(signature) {
        return Ok(());
    }
    let magic = upload.bytes.iter().take(signature.len()).copied().collect();
    Err(ExtractionError::SignatureMismatch {
        file_name: upload.file_name.clone(),
        kind,
        magic,
    })
}

/// Paragraph text in document order, then the text of every table cell.
fn extract_docx_blocking(file_name: &str, bytes: &[u8]) -> Result<String, ExtractionError> {
    let document = docx_lite::parse_document(Cursor::new(bytes)).map_err(|e| {
        ExtractionError::Unreadable {
            file_name: file_name.to_string(),
            kind: DocumentKind::Docx,
            detail: e.to_string(),
        }
    })?;

    let mut parts: Vec<String> = document.paragraphs.iter().map(|p| p.to_text()).collect();

    for table in &document.tables {
        for row in &table.rows {
            for cell in &row.cells {
                let cell_text = cell
                    .paragraphs
                    .iter()
                    .map(|p| p.to_text())
                    .collect::<Vec<_>>()
                    .join("\n");
                parts.push(cell_text);
            }
        }
    }

    debug!(
        "DOCX {}: {} paragraphs, {} tables",
        file_name,
        document.paragraphs.len(),
        document.tables.len()
    );

    Ok(parts.join("\n"))
}

/// Text of every page, concatenated in page order.
fn extract_pdf_blocking(file_name: &str, bytes: &[u8]) -> Result<String, ExtractionError> {
    let pdfium = pdfium_auto::bind_pdfium_silent()
        .map_err(|e| ExtractionError::PdfEngineUnavailable(e.to_string()))?;

    let document = pdfium.load_pdf_from_byte_slice(bytes, None).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            ExtractionError::PasswordProtected {
                file_name: file_name.to_string(),
            }
        } else {
            ExtractionError::Unreadable {
                file_name: file_name.to_string(),
                kind: DocumentKind::Pdf,
                detail: err_str,
            }
        }
    })?;

    let pages = document.pages();
    info!("PDF loaded: {} pages", pages.len());

    let mut text = String::new();
    for (idx, page) in pages.iter().enumerate() {
        let page_text = page.text().map_err(|e| ExtractionError::Unreadable {
            file_name: file_name.to_string(),
            kind: DocumentKind::Pdf,
            detail: format!("page {}: {:?}", idx + 1, e),
        })?;
        text.push_str(&page_text.all());
        if !text.ends_with('\n') {
            text.push('\n');
        }
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn wrong_signature_is_rejected_before_parsing() {
        let upload = Upload::new("fake.pdf", b"hello world".to_vec());
        let err = extract_text(&upload, DocumentKind::Pdf).await.unwrap_err();
        match err {
            ExtractionError::SignatureMismatch { kind, magic, .. } => {
                assert_eq!(kind, DocumentKind::Pdf);
                assert_eq!(magic, b"hell");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_upload_is_rejected() {
        let upload = Upload::new("empty.docx", Vec::new());
        let err = extract_text(&upload, DocumentKind::Docx).await.unwrap_err();
        assert!(matches!(err, ExtractionError::SignatureMismatch { .. }));
    }

    #[tokio::test]
    async fn corrupt_docx_is_unreadable() {
        // Valid ZIP signature, garbage afterwards.
        let mut bytes = b"PK\x03\x04".to_vec();
        bytes.extend_from_slice(&[0u8; 64]);
        let upload = Upload::new("broken.docx", bytes);
        let err = extract_text(&upload, DocumentKind::Docx).await.unwrap_err();
        assert!(
            matches!(err, ExtractionError::Unreadable { kind: DocumentKind::Docx, .. }),
            "got {err:?}"
        );
    }

    fn docx_with_table(paragraph: &str, cell: &str) -> Vec<u8> {
        use std::io::Write;
        use zip::write::FileOptions;

        let document = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p><w:r><w:t>{paragraph}</w:t></w:r></w:p><w:tbl><w:tr><w:tc><w:p><w:r><w:t>{cell}</w:t></w:r></w:p></w:tc></w:tr></w:tbl></w:body></w:document>"#
        );
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(zip::CompressionMethod::Stored);
        zip.start_file("word/document.xml", options).unwrap();
        zip.write_all(document.as_bytes()).unwrap();
        zip.finish().unwrap().into_inner()
    }

    #[tokio::test]
    async fn docx_is_parsed_from_memory() {
        let upload = Upload::new(
            "de_cuong.docx",
            docx_with_table("Tên học phần: Toán rời rạc", "Số tín chỉ: 3"),
        );
        let text = extract_text(&upload, DocumentKind::Docx).await.unwrap();
        assert!(text.text.contains("Tên học phần: Toán rời rạc"), "{:?}", text.text);
        assert!(text.text.contains("Số tín chỉ: 3"), "{:?}", text.text);
        assert!(!text.is_blank());
    }

    #[test]
    fn blank_text_detection() {
        let t = ExtractedText {
            kind: DocumentKind::Pdf,
            text: " \n\t\n".into(),
        };
        assert!(t.is_blank());
        let t = ExtractedText {
            kind: DocumentKind::Pdf,
            text: "Toán".into(),
        };
        assert!(!t.is_blank());
        assert_eq!(t.char_count(), 4);
    }
}
