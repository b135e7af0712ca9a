//! `WebBrowseClient` collaborator interface, mirroring the `webbrowse.browse` action.

use async_trait::async_trait;

#[async_trait]
pub trait WebBrowseClient: Send + Sync {
    async fn browse(&self, url: &str) -> Result<String, String>;
}

/// Stub implementation that declines to perform any network access; live web fetching is out
/// of scope here. A real deployment substitutes a headless-browser backed implementation.
#[derive(Default)]
pub struct UnavailableWebBrowseClient;

#[async_trait]
impl WebBrowseClient for UnavailableWebBrowseClient {
    async fn browse(&self, _url: &str) -> Result<String, String> {
        Err("web browsing is not available in this deployment".to_string())
    }
}
