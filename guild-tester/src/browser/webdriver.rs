use async_trait::async_trait;
use log::trace;
use thirtyfour::prelude::*;

use crate::document::Document;
use crate::error::{VerifyError, VerifyResult};
use crate::locator::Selector;

/// A live browser tab seen through the [`Document`] interface.
#[derive(Debug, Clone)]
pub struct WebDriverDocument<'a> {
    driver: &'a WebDriver,
}

impl<'a> WebDriverDocument<'a> {
    pub const fn new(driver: &'a WebDriver) -> Self {
        Self { driver }
    }
}

#[async_trait]
impl Document for WebDriverDocument<'_> {
    type Element = WebElement;

    async fn navigate(&self, url: &str) -> VerifyResult<()> {
        self.driver.goto(url).await?;
        Ok(())
    }

    async fn reload(&self) -> VerifyResult<()> {
        self.driver.refresh().await?;
        Ok(())
    }

    async fn query(&self, selector: &Selector) -> VerifyResult<Vec<WebElement>> {
        trace!("query {selector:?}");
        match selector {
            Selector::Css(css) => Ok(self.driver.find_all(By::Css(css.as_str())).await?),
            Selector::CssWithText { css, text } => {
                let mut matching = Vec::new();
                for element in self.driver.find_all(By::Css(css.as_str())).await? {
                    if element.text().await?.contains(text.as_str()) {
                        matching.push(element);
                    }
                }
                Ok(matching)
            }
            other => {
                let xpath = other.to_xpath().ok_or_else(|| {
                    VerifyError::Driver(format!("no xpath form for {other:?}"))
                })?;
                Ok(self.driver.find_all(By::XPath(xpath.as_str())).await?)
            }
        }
    }

    async fn query_within(
        &self,
        scope: &WebElement,
        selector: &Selector,
    ) -> VerifyResult<Vec<WebElement>> {
        trace!("query {selector:?} within {scope:?}");
        match selector {
            Selector::Css(css) => Ok(scope.find_all(By::Css(css.as_str())).await?),
            Selector::CssWithText { css, text } => {
                let mut matching = Vec::new();
                for element in scope.find_all(By::Css(css.as_str())).await? {
                    if element.text().await?.contains(text.as_str()) {
                        matching.push(element);
                    }
                }
                Ok(matching)
            }
            other => {
                let xpath = other.to_relative_xpath().ok_or_else(|| {
                    VerifyError::Driver(format!("no xpath form for {other:?}"))
                })?;
                Ok(scope.find_all(By::XPath(xpath.as_str())).await?)
            }
        }
    }

    async fn click(&self, element: &WebElement) -> VerifyResult<()> {
        element.click().await?;
        Ok(())
    }

    async fn fill(&self, element: &WebElement, text: &str) -> VerifyResult<()> {
        element.clear().await?;
        if !text.is_empty() {
            element.send_keys(text).await?;
        }
        Ok(())
    }

    async fn text_of(&self, element: &WebElement) -> VerifyResult<Option<String>> {
        Ok(Some(element.text().await?))
    }

    async fn is_visible(&self, element: &WebElement) -> VerifyResult<bool> {
        Ok(element.is_displayed().await?)
    }

    async fn current_url(&self) -> VerifyResult<String> {
        Ok(self.driver.current_url().await?.to_string())
    }
}
