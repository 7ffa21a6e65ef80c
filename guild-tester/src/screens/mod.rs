//! Page objects for the three QA Guild screens.

use regex::Regex;
use std::time::Duration;

use crate::document::Document;
use crate::error::{VerifyError, VerifyResult};
use crate::locator::LocatorRegistry;
use crate::poll::Poller;

pub mod configuration;
pub mod landing;
pub mod quest;

pub use configuration::ConfigurationScreen;
pub use landing::LandingScreen;
pub use quest::QuestScreen;

/// A registry bound to a live document and a poller. Every screen talks to
/// the document only through this.
#[derive(Debug)]
pub struct Surface<'a, D: Document> {
    document: &'a D,
    registry: LocatorRegistry,
    poller: Poller,
}

impl<'a, D: Document> Surface<'a, D> {
    pub const fn new(document: &'a D, registry: LocatorRegistry, poller: Poller) -> Self {
        Self {
            document,
            registry,
            poller,
        }
    }

    pub const fn document(&self) -> &'a D {
        self.document
    }

    pub const fn poller(&self) -> &Poller {
        &self.poller
    }

    pub async fn all(&self, concept: &str) -> VerifyResult<Vec<D::Element>> {
        self.registry.resolve(self.document, concept).await
    }

    pub async fn count(&self, concept: &str) -> VerifyResult<usize> {
        Ok(self.all(concept).await?.len())
    }

    /// First match, or an assertion failure naming the concept.
    pub async fn first(&self, concept: &str) -> VerifyResult<D::Element> {
        self.all(concept).await?.into_iter().next().ok_or_else(|| {
            VerifyError::assertion(format!(
                "no element for '{concept}' on the {} screen",
                self.registry.screen()
            ))
        })
    }

    pub async fn click(&self, concept: &str) -> VerifyResult<()> {
        let element = self.first(concept).await?;
        self.document.click(&element).await
    }

    pub async fn fill(&self, concept: &str, text: &str) -> VerifyResult<()> {
        let element = self.first(concept).await?;
        self.document.fill(&element, text).await
    }

    /// Text of the first match; `None` when nothing matches.
    pub async fn text(&self, concept: &str) -> VerifyResult<Option<String>> {
        match self.all(concept).await?.first() {
            Some(element) => self.document.text_of(element).await,
            None => Ok(None),
        }
    }

    /// Text of the first match inside `scope`; `None` when nothing matches.
    pub async fn text_within(
        &self,
        scope: &D::Element,
        concept: &str,
    ) -> VerifyResult<Option<String>> {
        let found = self
            .registry
            .resolve_within(self.document, scope, concept)
            .await?;
        match found.first() {
            Some(element) => self.document.text_of(element).await,
            None => Ok(None),
        }
    }

    /// True when at least one match is visible.
    pub async fn is_visible(&self, concept: &str) -> VerifyResult<bool> {
        for element in self.all(concept).await? {
            if self.document.is_visible(&element).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub async fn expect_visible(&self, concept: &str) -> VerifyResult<()> {
        let expected = format!("'{concept}' to be visible");
        self.poller
            .await_condition(&expected, || self.is_visible(concept), |visible| *visible)
            .await
            .map(|_| ())
    }

    pub async fn expect_hidden(&self, concept: &str) -> VerifyResult<()> {
        let expected = format!("'{concept}' to be hidden");
        self.poller
            .await_condition(&expected, || self.is_visible(concept), |visible| !*visible)
            .await
            .map(|_| ())
    }

    pub async fn expect_text(&self, concept: &str, expected: &str) -> VerifyResult<String> {
        let description = format!("'{concept}' to read {expected:?}");
        self.poller
            .await_condition(
                &description,
                || self.text(concept),
                |text| text.as_deref().map(str::trim) == Some(expected),
            )
            .await
            .map(Option::unwrap_or_default)
    }

    pub async fn expect_contains_text(&self, concept: &str, fragment: &str) -> VerifyResult<String> {
        let description = format!("'{concept}' to contain {fragment:?}");
        self.poller
            .await_condition(
                &description,
                || self.text(concept),
                |text| text.as_deref().is_some_and(|t| t.contains(fragment)),
            )
            .await
            .map(Option::unwrap_or_default)
    }

    pub async fn expect_url(&self, pattern: &Regex, timeout: Duration) -> VerifyResult<String> {
        self.poller.await_url(self.document, pattern, timeout).await
    }
}
