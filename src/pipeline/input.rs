//! Input resolution: turn a user-supplied file into a validated [`Upload`].
//!
//! The file type is decided from the extension alone and checked **before**
//! any bytes are read, so an unsupported upload is rejected without touching
//! the extractor (or the model). The content signature is verified later by
//! the extractor, which knows what a valid file of each kind starts with.

use crate::error::Doc2ReportError;
use crate::output::DocumentKind;
use std::path::Path;
use tracing::debug;

/// An uploaded document: its original file name and raw bytes.
#[derive(Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for Upload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Upload")
            .field("file_name", &self.file_name)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// The accepted kind of this upload, or `UnsupportedFileType`.
    pub fn kind(&self) -> Result<DocumentKind, Doc2ReportError> {
        DocumentKind::from_file_name(&self.file_name).ok_or_else(|| {
            Doc2ReportError::UnsupportedFileType {
                file_name: self.file_name.clone(),
            }
        })
    }

    /// Read a local file as an upload.
    ///
    /// Fails with `UploadMissing` if the path does not exist and with
    /// `UnsupportedFileType` (without reading the file) if the extension is
    /// not `.docx` / `.pdf`.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, Doc2ReportError> {
        let path = path.as_ref();

        if !path.is_file() {
            return Err(Doc2ReportError::UploadMissing {
                path: path.to_path_buf(),
            });
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if DocumentKind::from_file_name(&file_name).is_none() {
            return Err(Doc2ReportError::UnsupportedFileType { file_name });
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| Doc2ReportError::UploadReadFailed {
                path: path.to_path_buf(),
                source: e,
            })?;

        debug!("Read upload {} ({} bytes)", path.display(), bytes.len());
        Ok(Self { file_name, bytes })
    }
}
