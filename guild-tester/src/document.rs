use async_trait::async_trait;
use std::fmt::Debug;

use crate::error::VerifyResult;
use crate::locator::Selector;

/// The live document the harness verifies against.
///
/// Implemented by the browser-automation layer ([`crate::browser::WebDriverDocument`])
/// and by the in-process [`crate::simulated::SimulatedGuild`]. `query` and
/// `text_of` must be side-effect free; the poller relies on that to retry
/// samples freely.
#[async_trait]
pub trait Document: Send + Sync {
    /// Handle to one live element. Handles may go stale after a re-render.
    type Element: Clone + Debug + Send + Sync;

    /// Load `url` and return once the navigation has completed.
    async fn navigate(&self, url: &str) -> VerifyResult<()>;

    async fn reload(&self) -> VerifyResult<()>;

    /// Resolve `selector` against the document as it is right now. Zero
    /// matches is not an error.
    async fn query(&self, selector: &Selector) -> VerifyResult<Vec<Self::Element>>;

    /// Like [`Document::query`], restricted to descendants of `scope`.
    async fn query_within(
        &self,
        scope: &Self::Element,
        selector: &Selector,
    ) -> VerifyResult<Vec<Self::Element>>;

    async fn click(&self, element: &Self::Element) -> VerifyResult<()>;

    /// Replace the value of a text input.
    async fn fill(&self, element: &Self::Element, text: &str) -> VerifyResult<()>;

    /// Rendered text, `None` when the element carries no text at all.
    async fn text_of(&self, element: &Self::Element) -> VerifyResult<Option<String>>;

    async fn is_visible(&self, element: &Self::Element) -> VerifyResult<bool>;

    async fn current_url(&self) -> VerifyResult<String>;
}
