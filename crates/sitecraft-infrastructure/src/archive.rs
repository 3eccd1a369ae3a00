//! Zip packaging for downloads.

use sitecraft_core::archive::{ARCHIVE_ENTRY_NAME, ArchivePackager};
use sitecraft_core::error::{Result, SitecraftError};
use std::io::{Cursor, Write};
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

/// Packages a document as a deflated zip holding a single `index.html`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipArchivePackager;

impl ZipArchivePackager {
    pub fn new() -> Self {
        Self
    }
}

impl ArchivePackager for ZipArchivePackager {
    fn package(&self, project_name: &str, document: &str) -> Result<Vec<u8>> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        writer
            .start_file(ARCHIVE_ENTRY_NAME, options)
            .map_err(|e| SitecraftError::archive(format!("Failed to start zip entry: {e}")))?;
        writer
            .write_all(document.as_bytes())
            .map_err(|e| SitecraftError::archive(format!("Failed to write zip entry: {e}")))?;
        let cursor = writer
            .finish()
            .map_err(|e| SitecraftError::archive(format!("Failed to finish zip: {e}")))?;

        let bytes = cursor.into_inner();
        tracing::debug!(project = project_name, bytes = bytes.len(), "Packaged archive");
        Ok(bytes)
    }
}
