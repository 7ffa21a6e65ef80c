use regex::Regex;
use std::sync::LazyLock;

use super::Surface;
use crate::config::HarnessConfig;
use crate::document::Document;
use crate::error::{VerifyError, VerifyResult};
use crate::locator::{LocatorRegistry, Role, Selector};
use crate::poll::Poller;

pub const SCREEN: &str = "configuration";

pub const QUEST_NAME_INPUT: &str = "quest name input";
pub const QUEST_DESCRIPTION_INPUT: &str = "quest description input";
pub const INITIATE_BUTTON: &str = "initiate button";
pub const EMBARK_BUTTON: &str = "embark button";
pub const PAGE_TITLE: &str = "page title";
pub const ERROR_MESSAGE: &str = "error message";
pub const WARRIOR_SELECTION: &str = "warrior selection";
pub const WARRIOR_OPTIONS: &str = "warrior options";
pub const SELECTED_WARRIOR: &str = "selected warrior";

const TITLE_TEXT: &str = "QA Adventure Configuration";

/// Any URL on the configuration route.
pub static CONFIG_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/quest-config").expect("valid regex"));
// `/quest` but not `/quest-config`
static QUEST_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/quest(?:[/?#]|$)").expect("valid regex"));

/// Quest name, description and warrior choice.
#[derive(Debug)]
pub struct ConfigurationScreen<'a, D: Document> {
    surface: Surface<'a, D>,
    config: &'a HarnessConfig,
}

impl<'a, D: Document> ConfigurationScreen<'a, D> {
    pub fn new(document: &'a D, poller: Poller, config: &'a HarnessConfig) -> VerifyResult<Self> {
        let registry = LocatorRegistry::builder(SCREEN)
            .register(
                QUEST_NAME_INPUT,
                Selector::role(Role::Textbox, "Test Quest Name:"),
            )
            .register(
                QUEST_DESCRIPTION_INPUT,
                Selector::role(Role::Textbox, "Test Quest Description:"),
            )
            .register(
                INITIATE_BUTTON,
                Selector::css_with_text("button", "Initiate QA Adventure"),
            )
            .register(
                EMBARK_BUTTON,
                Selector::css_with_text("button", "Embark on Testing"),
            )
            .register(PAGE_TITLE, Selector::role(Role::Heading, TITLE_TEXT))
            .register(ERROR_MESSAGE, Selector::css(".error-message"))
            .register(WARRIOR_SELECTION, Selector::css(".warrior-selection"))
            .register(WARRIOR_OPTIONS, Selector::css(".warrior-option"))
            .register(SELECTED_WARRIOR, Selector::css(".selected-warrior"))
            .build()?;
        Ok(Self {
            surface: Surface::new(document, registry, poller),
            config,
        })
    }

    pub const fn surface(&self) -> &Surface<'a, D> {
        &self.surface
    }

    pub async fn configure_quest(&self, name: &str, description: &str) -> VerifyResult<()> {
        self.surface.fill(QUEST_NAME_INPUT, name).await?;
        self.surface.fill(QUEST_DESCRIPTION_INPUT, description).await
    }

    pub async fn initiate_adventure(&self) -> VerifyResult<()> {
        self.surface.click(INITIATE_BUTTON).await?;
        self.surface
            .expect_url(&CONFIG_URL, self.config.poll.navigation_timeout())
            .await?;
        Ok(())
    }

    pub async fn embark_on_testing(&self) -> VerifyResult<()> {
        // The embark button appears once the adventure has been initiated.
        self.surface.expect_visible(EMBARK_BUTTON).await?;
        self.surface.click(EMBARK_BUTTON).await?;
        self.surface
            .expect_url(&QUEST_URL, self.config.poll.navigation_timeout())
            .await?;
        Ok(())
    }

    pub async fn verify_loaded(&self) -> VerifyResult<()> {
        self.surface.expect_visible(PAGE_TITLE).await?;
        self.surface.expect_text(PAGE_TITLE, TITLE_TEXT).await?;
        self.surface.expect_visible(QUEST_NAME_INPUT).await?;
        self.surface.expect_visible(QUEST_DESCRIPTION_INPUT).await
    }

    /// Click the warrior option whose text contains `name`.
    pub async fn select_warrior(&self, name: &str) -> VerifyResult<()> {
        self.surface.expect_visible(WARRIOR_SELECTION).await?;
        let document = self.surface.document();
        for option in self.surface.all(WARRIOR_OPTIONS).await? {
            let text = document.text_of(&option).await?.unwrap_or_default();
            if text.contains(name) {
                return document.click(&option).await;
            }
        }
        Err(VerifyError::assertion(format!(
            "no warrior option named {name:?}"
        )))
    }

    pub async fn selected_warrior(&self) -> VerifyResult<String> {
        Ok(self
            .surface
            .text(SELECTED_WARRIOR)
            .await?
            .unwrap_or_default()
            .trim()
            .to_string())
    }

    pub async fn warrior_option_count(&self) -> VerifyResult<usize> {
        self.surface.count(WARRIOR_OPTIONS).await
    }

    pub async fn is_form_valid(&self) -> VerifyResult<bool> {
        Ok(!self.surface.is_visible(ERROR_MESSAGE).await?)
    }

    /// Visible error text, empty when the form is valid.
    pub async fn error_message(&self) -> VerifyResult<String> {
        if self.surface.is_visible(ERROR_MESSAGE).await? {
            Ok(self.surface.text(ERROR_MESSAGE).await?.unwrap_or_default())
        } else {
            Ok(String::new())
        }
    }

    /// Fill the form and walk through to the quest screen.
    pub async fn complete_configuration(
        &self,
        name: &str,
        description: &str,
        warrior: Option<&str>,
    ) -> VerifyResult<()> {
        self.configure_quest(name, description).await?;
        if let Some(warrior) = warrior {
            self.select_warrior(warrior).await?;
        }
        self.initiate_adventure().await?;
        self.embark_on_testing().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quest_url_pattern_skips_the_config_page() {
        assert!(QUEST_URL.is_match("http://localhost:5173/quest"));
        assert!(QUEST_URL.is_match("http://localhost:5173/quest?id=1"));
        assert!(!QUEST_URL.is_match("http://localhost:5173/quest-config"));
        assert!(CONFIG_URL.is_match("http://localhost:5173/quest-config"));
    }
}
