use async_trait::async_trait;
pub use formic_common::error::BackendError;
use formic_common::protocol::FormSnapshot;

#[derive(Debug, Clone)]
pub struct NavigationResult {
    pub url: String,
    pub title: String,
}

/// The browser-control boundary. Implementations drive an already
/// authenticated browser session over a debugging protocol; the engine never
/// sees protocol details, only this surface.
///
/// Failure to attach is a fatal precondition for the run. Everything else
/// maps to a single job attempt and is handled by the workflow's error
/// taxonomy.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Attach to the existing browser session.
    async fn attach(&mut self) -> Result<(), BackendError>;

    /// Detach and release resources. Never closes the operator's browser.
    async fn close(&mut self) -> Result<(), BackendError>;

    /// Whether the backend is attached and ready for commands.
    async fn is_ready(&self) -> bool;

    /// Navigate the shared tab to a URL.
    async fn navigate(&mut self, url: &str) -> Result<NavigationResult, BackendError>;

    /// Read the page (and reachable frames) into a snapshot.
    async fn snapshot(&mut self) -> Result<FormSnapshot, BackendError>;

    /// Set a form control's value, dispatching the input events a real user
    /// would produce. `frame` is the frame path from the snapshot.
    async fn set_value(
        &mut self,
        frame: &str,
        selector: &str,
        value: &str,
    ) -> Result<(), BackendError>;

    /// Click the element at `selector` within `frame`.
    async fn click(&mut self, frame: &str, selector: &str) -> Result<(), BackendError>;

    /// Click the first visible element matching any selector, else the first
    /// clickable element whose text contains one of the patterns. Searches
    /// the main document and reachable frames. Returns whether anything was
    /// clicked.
    async fn click_match(
        &mut self,
        selectors: &[&str],
        text_patterns: &[&str],
    ) -> Result<bool, BackendError>;

    /// Capture the current viewport as PNG bytes.
    async fn screenshot(&mut self) -> Result<Vec<u8>, BackendError>;

    /// The shared tab's current URL.
    async fn current_url(&mut self) -> Result<String, BackendError>;
}
