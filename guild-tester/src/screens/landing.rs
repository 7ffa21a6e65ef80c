
use super::Surface;
use super::configuration::CONFIG_URL;
use crate::config::HarnessConfig;
use crate::document::Document;
use crate::error::VerifyResult;
use crate::locator::{LocatorRegistry, Selector};
use crate::poll::Poller;
use crate::verify;

pub const SCREEN: &str = "landing";

pub const START_QUEST_BUTTON: &str = "start quest button";
pub const IMPROVE_SKILL_BUTTON: &str = "improve skill button";
pub const PAGE_TITLE: &str = "page title";
pub const PAGE_DESCRIPTION: &str = "page description";
pub const HERO_IMAGE: &str = "hero image";
pub const FOOTER: &str = "footer";

/// The signup page the flow starts on.
#[derive(Debug)]
pub struct LandingScreen<'a, D: Document> {
    surface: Surface<'a, D>,
    config: &'a HarnessConfig,
}

impl<'a, D: Document> LandingScreen<'a, D> {
    pub fn new(document: &'a D, poller: Poller, config: &'a HarnessConfig) -> VerifyResult<Self> {
        let registry = LocatorRegistry::builder(SCREEN)
            .register(
                START_QUEST_BUTTON,
                Selector::css_with_text("button", "Start your testing quest"),
            )
            .register(
                IMPROVE_SKILL_BUTTON,
                Selector::css_with_text("button", "Improve your skill"),
            )
            .register(PAGE_TITLE, Selector::css("h1"))
            .register(PAGE_DESCRIPTION, Selector::css(".description"))
            .register(HERO_IMAGE, Selector::css(".hero-image"))
            .register(FOOTER, Selector::css("footer"))
            .build()?;
        Ok(Self {
            surface: Surface::new(document, registry, poller),
            config,
        })
    }

    pub const fn surface(&self) -> &Surface<'a, D> {
        &self.surface
    }

    pub async fn open(&self) -> VerifyResult<()> {
        self.surface
            .document()
            .navigate(&self.config.url_for("/"))
            .await
    }

    /// Leaves for the configuration screen.
    pub async fn click_start_quest(&self) -> VerifyResult<()> {
        self.surface.click(START_QUEST_BUTTON).await?;
        self.surface
            .expect_url(&CONFIG_URL, self.config.poll.navigation_timeout())
            .await?;
        Ok(())
    }

    pub async fn click_improve_skill(&self) -> VerifyResult<()> {
        self.surface.click(IMPROVE_SKILL_BUTTON).await
    }

    pub async fn verify_loaded(&self) -> VerifyResult<()> {
        self.surface.expect_visible(PAGE_TITLE).await?;
        self.surface
            .expect_text(PAGE_TITLE, &self.config.quest.landing_title)
            .await?;
        self.surface.expect_visible(START_QUEST_BUTTON).await?;
        self.surface.expect_visible(IMPROVE_SKILL_BUTTON).await
    }

    pub async fn page_title(&self) -> VerifyResult<String> {
        Ok(self.surface.text(PAGE_TITLE).await?.unwrap_or_default())
    }

    pub async fn page_description(&self) -> VerifyResult<String> {
        Ok(self.surface.text(PAGE_DESCRIPTION).await?.unwrap_or_default())
    }

    pub async fn is_hero_image_visible(&self) -> VerifyResult<bool> {
        self.surface.is_visible(HERO_IMAGE).await
    }

    pub async fn verify_footer(&self, expected: Option<&str>) -> VerifyResult<()> {
        self.surface.expect_visible(FOOTER).await?;
        if let Some(fragment) = expected {
            self.surface.expect_contains_text(FOOTER, fragment).await?;
        }
        Ok(())
    }

    /// Landing page invariants beyond `verify_loaded`: copy, artwork and footer.
    pub async fn verify_content(&self) -> VerifyResult<()> {
        let description = self.page_description().await?;
        verify!(
            !description.trim().is_empty(),
            "landing description should not be empty"
        );
        verify!(
            self.is_hero_image_visible().await?,
            "hero image should be visible"
        );
        self.verify_footer(self.config.quest.footer_text.as_deref())
            .await
    }
}
