//! Semantic locators: stable names for UI concepts, decoupled from how the
//! document is queried for them.

use std::collections::HashMap;

use crate::document::Document;
use crate::error::{VerifyError, VerifyResult};

/// Accessible roles the screens locate by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Button,
    Heading,
    Textbox,
}

/// How a concept is found in the document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    /// CSS selector (e.g. `#goldCount`)
    Css(String),
    XPath(String),
    /// Any element whose own text contains the string
    Text(String),
    /// CSS selector filtered to elements whose text contains `text`
    CssWithText { css: String, text: String },
    /// Element with the given role and accessible name (substring match for
    /// headings, exact for buttons and textboxes)
    Role { role: Role, name: String },
}

impl Selector {
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    #[must_use]
    pub fn css_with_text(css: impl Into<String>, text: impl Into<String>) -> Self {
        Self::CssWithText {
            css: css.into(),
            text: text.into(),
        }
    }

    #[must_use]
    pub fn role(role: Role, name: impl Into<String>) -> Self {
        Self::Role {
            role,
            name: name.into(),
        }
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Css(s) | Self::XPath(s) | Self::Text(s) => s.trim().is_empty(),
            Self::CssWithText { css, text } => css.trim().is_empty() || text.is_empty(),
            Self::Role { name, .. } => name.trim().is_empty(),
        }
    }

    /// XPath form for the selectors CSS cannot express. `None` for `Css`
    /// and `CssWithText`, which drivers resolve natively.
    #[must_use]
    pub fn to_xpath(&self) -> Option<String> {
        self.xpath_from("")
    }

    /// Same as [`Selector::to_xpath`], anchored at a context element.
    #[must_use]
    pub fn to_relative_xpath(&self) -> Option<String> {
        self.xpath_from(".")
    }

    fn xpath_from(&self, root: &str) -> Option<String> {
        match self {
            Self::Css(_) | Self::CssWithText { .. } => None,
            Self::XPath(x) if x.starts_with('/') => Some(format!("{root}{x}")),
            Self::XPath(x) => Some(x.clone()),
            Self::Text(t) => Some(format!(
                "{root}//*[text()[contains(., {})]]",
                xpath_literal(t)
            )),
            Self::Role { role, name } => {
                let lit = xpath_literal(name);
                Some(match role {
                    Role::Button => format!(
                        "{root}//button[contains(normalize-space(.), {lit})] | {root}//*[@role='button'][contains(normalize-space(.), {lit})] | {root}//input[(@type='button' or @type='submit') and contains(@value, {lit})]"
                    ),
                    Role::Heading => format!(
                        "{root}//*[self::h1 or self::h2 or self::h3 or self::h4 or self::h5 or self::h6 or @role='heading'][contains(normalize-space(.), {lit})]"
                    ),
                    Role::Textbox => {
                        let labelled = format!(
                            "@aria-label={lit} or @placeholder={lit} or @id=//label[normalize-space(.)={lit}]/@for"
                        );
                        format!(
                            "{root}//input[not(@type) or @type='text' or @type='search' or @type='email'][{labelled}] | {root}//textarea[{labelled}]"
                        )
                    }
                })
            }
        }
    }
}

/// Quote `s` as an XPath 1.0 string literal.
fn xpath_literal(s: &str) -> String {
    if !s.contains('\'') {
        format!("'{s}'")
    } else if !s.contains('"') {
        format!("\"{s}\"")
    } else {
        let parts: Vec<String> = s.split('\'').map(|p| format!("'{p}'")).collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

/// A named UI concept on one screen. Its selector is fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemanticLocator {
    screen: &'static str,
    concept: &'static str,
    selector: Selector,
}

impl SemanticLocator {
    #[must_use]
    pub const fn screen(&self) -> &'static str {
        self.screen
    }

    #[must_use]
    pub const fn concept(&self) -> &'static str {
        self.concept
    }

    #[must_use]
    pub const fn selector(&self) -> &Selector {
        &self.selector
    }
}

/// The locators of one screen, keyed by concept name.
#[derive(Debug, Clone)]
pub struct LocatorRegistry {
    screen: &'static str,
    locators: HashMap<&'static str, SemanticLocator>,
}

impl LocatorRegistry {
    #[must_use]
    pub fn builder(screen: &'static str) -> LocatorRegistryBuilder {
        LocatorRegistryBuilder {
            screen,
            entries: Vec::new(),
        }
    }

    #[must_use]
    pub const fn screen(&self) -> &'static str {
        self.screen
    }

    pub fn locator(&self, concept: &str) -> VerifyResult<&SemanticLocator> {
        self.locators.get(concept).ok_or_else(|| {
            VerifyError::configuration(self.screen, format!("concept '{concept}' is not registered"))
        })
    }

    /// Query the document for every element currently matching `concept`.
    pub async fn resolve<D: Document>(
        &self,
        document: &D,
        concept: &str,
    ) -> VerifyResult<Vec<D::Element>> {
        let locator = self.locator(concept)?;
        document.query(locator.selector()).await
    }

    /// Like [`LocatorRegistry::resolve`], limited to descendants of `scope`.
    pub async fn resolve_within<D: Document>(
        &self,
        document: &D,
        scope: &D::Element,
        concept: &str,
    ) -> VerifyResult<Vec<D::Element>> {
        let locator = self.locator(concept)?;
        document.query_within(scope, locator.selector()).await
    }
}

#[derive(Debug)]
pub struct LocatorRegistryBuilder {
    screen: &'static str,
    entries: Vec<(&'static str, Selector)>,
}

impl LocatorRegistryBuilder {
    #[must_use]
    pub fn register(mut self, concept: &'static str, selector: Selector) -> Self {
        self.entries.push((concept, selector));
        self
    }

    pub fn build(self) -> VerifyResult<LocatorRegistry> {
        let mut locators = HashMap::with_capacity(self.entries.len());
        for (concept, selector) in self.entries {
            if concept.trim().is_empty() {
                return Err(VerifyError::configuration(self.screen, "empty concept name"));
            }
            if selector.is_blank() {
                return Err(VerifyError::configuration(
                    self.screen,
                    format!("concept '{concept}' has a blank selector"),
                ));
            }
            let locator = SemanticLocator {
                screen: self.screen,
                concept,
                selector,
            };
            if locators.insert(concept, locator).is_some() {
                return Err(VerifyError::configuration(
                    self.screen,
                    format!("concept '{concept}' registered twice"),
                ));
            }
        }
        Ok(LocatorRegistry {
            screen: self.screen,
            locators,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn unregistered_concept_is_a_configuration_error() {
        let registry = LocatorRegistry::builder("quest")
            .register("gold", Selector::css("#goldCount"))
            .build()
            .expect("valid registry");
        assert_eq!(registry.locator("gold").unwrap().concept(), "gold");
        let err = registry.locator("silver").expect_err("silver is unknown");
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("silver"));
    }

    #[test]
    fn build_rejects_duplicates_and_blank_selectors() {
        let err = LocatorRegistry::builder("landing")
            .register("title", Selector::css("h1"))
            .register("title", Selector::css("h2"))
            .build()
            .expect_err("duplicate concept");
        assert!(err.to_string().contains("registered twice"));

        let err = LocatorRegistry::builder("landing")
            .register("footer", Selector::css("  "))
            .build()
            .expect_err("blank selector");
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn role_selectors_lower_to_xpath() {
        let button = Selector::role(Role::Button, "Fix Bug").to_xpath().unwrap();
        assert!(button.starts_with("//button[contains(normalize-space(.), 'Fix Bug')]"));
        assert!(button.contains("contains(@value, 'Fix Bug')"));

        let heading = Selector::role(Role::Heading, "QA Quest:").to_xpath().unwrap();
        assert!(heading.contains("self::h1"));
        assert!(heading.contains("contains(normalize-space(.), 'QA Quest:')"));

        let textbox = Selector::role(Role::Textbox, "Test Quest Name:")
            .to_xpath()
            .unwrap();
        assert!(textbox.contains("//label[normalize-space(.)='Test Quest Name:']/@for"));
        assert!(textbox.contains("//textarea["));

        assert!(Selector::css("#goldCount").to_xpath().is_none());
    }

    #[test]
    fn relative_xpath_anchors_every_branch() {
        let button = Selector::role(Role::Button, "Fix Bug")
            .to_relative_xpath()
            .unwrap();
        assert!(button.starts_with(".//button["));
        assert!(button.contains(" | .//*[@role='button']"));
        assert!(button.contains(" | .//input["));

        let textbox = Selector::role(Role::Textbox, "Name").to_relative_xpath().unwrap();
        assert!(textbox.contains("@id=//label["), "label lookup stays document-wide");

        assert_eq!(
            Selector::text("Warrior").to_relative_xpath().as_deref(),
            Some(".//*[text()[contains(., 'Warrior')]]")
        );
        assert_eq!(
            Selector::XPath("//li".to_string()).to_relative_xpath().as_deref(),
            Some(".//li")
        );
    }

    #[test]
    fn xpath_literals_survive_quotes() {
        assert_eq!(xpath_literal("plain"), "'plain'");
        assert_eq!(xpath_literal("it's"), "\"it's\"");
        assert_eq!(
            xpath_literal(r#"it's "odd""#),
            r#"concat('it', "'", 's "odd"')"#
        );
    }
}
