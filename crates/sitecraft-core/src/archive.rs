//! Download packaging contract.

use crate::error::Result;

/// File name of the document inside a packaged archive.
pub const ARCHIVE_ENTRY_NAME: &str = "index.html";

/// Fallback base name when a project name has no usable characters.
pub const DEFAULT_ARCHIVE_STEM: &str = "sitecraft_project";

/// Packages a finished document for download.
pub trait ArchivePackager: Send + Sync {
    /// Returns archive bytes containing `document` as [`ARCHIVE_ENTRY_NAME`].
    fn package(&self, project_name: &str, document: &str) -> Result<Vec<u8>>;
}

/// Builds the download file name for a project.
///
/// Every character outside `[a-z0-9]` (case-insensitive) becomes `_` and the
/// result is lowercased.
pub fn archive_file_name(project_name: &str) -> String {
    let stem: String = project_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();

    if stem.is_empty() {
        format!("{DEFAULT_ARCHIVE_STEM}.zip")
    } else {
        format!("{stem}.zip")
    }
}
