//! WebDriver-backed target for browser runs.

mod session;
mod webdriver;

pub use session::{BrowserConfig, BrowserKind, new_session};
pub use webdriver::WebDriverDocument;
