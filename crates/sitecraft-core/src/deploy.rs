//! Deploy action contract.

use crate::error::Result;

/// Hosting provider page where a downloaded site can be dropped manually.
pub const DEFAULT_DEPLOY_URL: &str = "https://app.netlify.com/drop";

/// Opens a URL in a new browsing context.
///
/// Deploying transmits nothing programmatically; it only navigates the user
/// to the provider's upload page.
pub trait UrlOpener: Send + Sync {
    fn open(&self, url: &str) -> Result<()>;
}
