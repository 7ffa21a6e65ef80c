//! Flat node model rendered by the simulated guild, and the subset of
//! selector syntax it understands.

use crate::error::{VerifyError, VerifyResult};
use crate::locator::{Role, Selector};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub key: String,
    pub tag: &'static str,
    pub id: Option<&'static str>,
    pub classes: Vec<&'static str>,
    /// Accessible name of an input (label, placeholder or aria-label).
    pub label: Option<String>,
    pub text: String,
    pub visible: bool,
}

impl Node {
    pub fn new(key: impl Into<String>, tag: &'static str) -> Self {
        Self {
            key: key.into(),
            tag,
            id: None,
            classes: Vec::new(),
            label: None,
            text: String::new(),
            visible: true,
        }
    }

    #[must_use]
    pub const fn id(mut self, id: &'static str) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn class(mut self, class: &'static str) -> Self {
        self.classes.push(class);
        self
    }

    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    #[must_use]
    pub const fn visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Nesting is encoded in keys: `quest.warrior.0.name` sits inside
    /// `quest.warrior.0`.
    pub fn is_within(&self, scope: &str) -> bool {
        self.key
            .strip_prefix(scope)
            .is_some_and(|rest| rest.starts_with('.'))
    }

    pub fn is_text_input(&self) -> bool {
        matches!(self.tag, "input" | "textarea")
    }

    pub fn matches(&self, selector: &Selector) -> VerifyResult<bool> {
        Ok(match selector {
            Selector::Css(css) => self.matches_css(css)?,
            Selector::CssWithText { css, text } => {
                self.matches_css(css)? && self.text.contains(text.as_str())
            }
            Selector::Text(text) => self.text.contains(text.as_str()),
            Selector::Role { role, name } => self.matches_role(*role, name),
            Selector::XPath(xpath) => {
                return Err(VerifyError::Driver(format!(
                    "xpath is not supported by the simulated guild: {xpath}"
                )));
            }
        })
    }

    fn matches_role(&self, role: Role, name: &str) -> bool {
        let own = normalize(&self.text);
        match role {
            Role::Button => self.tag == "button" && own.contains(name),
            Role::Heading => {
                matches!(self.tag, "h1" | "h2" | "h3" | "h4" | "h5" | "h6") && own.contains(name)
            }
            Role::Textbox => self.is_text_input() && self.label.as_deref() == Some(name),
        }
    }

    /// Comma-separated list of compound selectors (`tag#id.class`).
    fn matches_css(&self, css: &str) -> VerifyResult<bool> {
        for part in css.split(',') {
            if Compound::parse(part.trim())?.matches(self) {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Compound<'s> {
    tag: Option<&'s str>,
    id: Option<&'s str>,
    classes: Vec<&'s str>,
}

impl<'s> Compound<'s> {
    fn parse(source: &'s str) -> VerifyResult<Self> {
        let unsupported = || VerifyError::Driver(format!("unsupported css selector: {source:?}"));
        if source.is_empty() {
            return Err(unsupported());
        }

        let mut compound = Self::default();
        let mut rest = source;
        let tag_end = rest.find(['#', '.']).unwrap_or(rest.len());
        if tag_end > 0 {
            let tag = &rest[..tag_end];
            if tag != "*" {
                compound.tag = Some(ident(tag).ok_or_else(unsupported)?);
            }
            rest = &rest[tag_end..];
        }

        while let Some(marker) = rest.chars().next() {
            let body = &rest[1..];
            let end = body.find(['#', '.']).unwrap_or(body.len());
            let name = ident(&body[..end]).ok_or_else(unsupported)?;
            match marker {
                '#' => compound.id = Some(name),
                _ => compound.classes.push(name),
            }
            rest = &body[end..];
        }
        Ok(compound)
    }

    fn matches(&self, node: &Node) -> bool {
        self.tag.is_none_or(|tag| tag == node.tag)
            && self.id.is_none_or(|id| node.id == Some(id))
            && self.classes.iter().all(|class| node.classes.contains(class))
    }
}

fn ident(name: &str) -> Option<&str> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    valid.then_some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gold() -> Node {
        Node::new("gold", "span").id("goldCount").class("counter").text("10")
    }

    #[test]
    fn css_compounds_and_lists() {
        let node = gold();
        assert!(node.matches(&Selector::css("#goldCount")).unwrap());
        assert!(node.matches(&Selector::css("span.counter")).unwrap());
        assert!(node.matches(&Selector::css("span#goldCount.counter")).unwrap());
        assert!(node.matches(&Selector::css("#app, .counter")).unwrap());
        assert!(!node.matches(&Selector::css("div.counter")).unwrap());
        assert!(!node.matches(&Selector::css(".counter.missing")).unwrap());
    }

    #[test]
    fn descendant_and_attribute_selectors_are_rejected() {
        let node = gold();
        assert!(node.matches(&Selector::css(".warriors-list .warrior-item")).is_err());
        assert!(node.matches(&Selector::css("input[type=text]")).is_err());
        assert!(node.matches(&Selector::XPath("//span".to_string())).is_err());
    }

    #[test]
    fn roles_follow_accessible_names() {
        let button = Node::new("fix", "button").text(" Fix  Bug ");
        assert!(button.matches(&Selector::role(Role::Button, "Fix Bug")).unwrap());
        assert!(!button.matches(&Selector::role(Role::Button, "Find Bug")).unwrap());

        let heading = Node::new("title", "h2").text("QA Quest: Go Go Game");
        assert!(heading.matches(&Selector::role(Role::Heading, "QA Quest:")).unwrap());

        let input = Node::new("name", "input").label("Test Quest Name:");
        assert!(input.matches(&Selector::role(Role::Textbox, "Test Quest Name:")).unwrap());
        assert!(!input.matches(&Selector::role(Role::Button, "Test Quest Name:")).unwrap());
    }

    #[test]
    fn containment_follows_dotted_keys() {
        let name = Node::new("quest.warrior.1.name", "span");
        assert!(name.is_within("quest.warrior.1"));
        assert!(!name.is_within("quest.warrior"));
        assert!(!name.is_within("quest.warrior.1.name"));
        assert!(!Node::new("quest.warrior.10.name", "span").is_within("quest.warrior.1"));
    }

    #[test]
    fn decorated_button_labels_still_resolve() {
        let button = Node::new("fix", "button").text("🐞 Fix Bug");
        assert!(button.matches(&Selector::role(Role::Button, "Fix Bug")).unwrap());
        let link = Node::new("fix", "a").text("🐞 Fix Bug");
        assert!(!link.matches(&Selector::role(Role::Button, "Fix Bug")).unwrap());
    }

    #[test]
    fn text_selectors_match_substrings() {
        let node = Node::new("progress", "span").text("40% Defect-Free");
        assert!(node.matches(&Selector::text("% Defect-Free")).unwrap());
        assert!(node.matches(&Selector::css_with_text("span", "40%")).unwrap());
        assert!(!node.matches(&Selector::css_with_text("span", "50%")).unwrap());
    }
}
