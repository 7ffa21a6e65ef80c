//! An in-process QA Guild.
//!
//! `SimulatedGuild` renders the three screens as flat node lists and applies
//! the effect of every quest action after a configurable latency, measured
//! on a [`VirtualClock`]. It is the oracle the harness is tested against and
//! the target of the `simulated` run mode.

use async_trait::async_trait;
use log::{debug, trace};
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::clock::{Clock, VirtualClock};
use crate::config::{GameRules, HarnessConfig};
use crate::document::Document;
use crate::error::{VerifyError, VerifyResult};
use crate::locator::Selector;
use crate::snapshot::RewardKind;

mod dom;

pub use dom::Node;

pub const DEFAULT_LATENCY_MS: u64 = 400;

const VICTORY: &str = "🎉 Victory! All defects vanquished!";
const FAILURE: &str = "💀 Quest Failed! The bugs have taken over. 💀";
const INVALID_ACTION: &str = "Please enter a valid action";
const NAME_REQUIRED: &str = "Quest name is required";

/// Handle to a rendered node. Resolved again on every use, so it goes stale
/// when the route changes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SimElement {
    key: String,
}

impl SimElement {
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Landing,
    Configuration,
    Quest,
    NotFound,
}

impl Route {
    fn from_path(path: &str) -> Self {
        match path.split(['?', '#']).next().unwrap_or_default() {
            "" | "/" => Self::Landing,
            "/quest-config" => Self::Configuration,
            "/quest" | "/quest/" => Self::Quest,
            _ => Self::NotFound,
        }
    }
}

/// What survives a page load: the quest the user configured.
#[derive(Debug, Clone, Default)]
struct Session {
    name: String,
    description: String,
    warrior: Option<usize>,
}

#[derive(Debug, Clone, Default)]
struct ConfigForm {
    name: String,
    description: String,
    warrior: Option<usize>,
    error: Option<String>,
    initiated: bool,
}

#[derive(Debug, Clone)]
struct QuestState {
    progress: i64,
    gold: i64,
    artifacts: i64,
    days_off: i64,
    alert: Option<String>,
    custom_action: String,
}

impl QuestState {
    fn fresh(rules: &GameRules) -> Self {
        Self {
            progress: i64::from(rules.starting_progress),
            gold: 0,
            artifacts: 0,
            days_off: 0,
            alert: None,
            custom_action: String::new(),
        }
    }
}

#[derive(Debug, Clone)]
enum Effect {
    Initiate,
    Progress(i64),
    Reward(RewardKind, i64),
    Notify(String),
}

#[derive(Debug)]
struct Pending {
    due: Duration,
    effect: Effect,
}

#[derive(Debug)]
struct GuildState {
    route: Route,
    path: String,
    session: Session,
    form: ConfigForm,
    quest: QuestState,
    pending: VecDeque<Pending>,
    overrides: HashMap<String, String>,
}

#[derive(Debug)]
pub struct SimulatedGuild {
    clock: VirtualClock,
    latency: Duration,
    origin: String,
    rules: GameRules,
    landing_title: String,
    warriors: Vec<String>,
    state: Mutex<GuildState>,
}

impl SimulatedGuild {
    /// A guild on the landing page, with no latency.
    pub fn new(clock: VirtualClock, config: &HarnessConfig) -> Self {
        let rules = config.rules;
        Self {
            clock,
            latency: Duration::ZERO,
            origin: origin_of(&config.base_url),
            rules,
            landing_title: config.quest.landing_title.clone(),
            warriors: config.quest.warriors.clone(),
            state: Mutex::new(GuildState {
                route: Route::Landing,
                path: "/".to_string(),
                session: Session::default(),
                form: ConfigForm::default(),
                quest: QuestState::fresh(&rules),
                pending: VecDeque::new(),
                overrides: HashMap::new(),
            }),
        }
    }

    /// Delay between an action and its visible effect.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    #[must_use]
    pub const fn clock(&self) -> &VirtualClock {
        &self.clock
    }

    /// Replace the rendered text of the node with `key` until the next page
    /// load. Used to feed the harness text it cannot parse.
    pub fn override_text(&self, key: &str, text: &str) {
        self.lock()
            .overrides
            .insert(key.to_string(), text.to_string());
    }

    /// Keys of every node currently rendered, in document order.
    #[must_use]
    pub fn rendered_keys(&self) -> Vec<String> {
        let mut state = self.lock();
        self.settle(&mut state);
        self.render(&state).into_iter().map(|node| node.key).collect()
    }

    fn lock(&self) -> MutexGuard<'_, GuildState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn schedule(&self, state: &mut GuildState, effect: Effect) {
        let due = self.clock.now() + self.latency;
        trace!("scheduling {effect:?} at {due:?}");
        state.pending.push_back(Pending { due, effect });
    }

    /// Apply every effect whose time has come.
    fn settle(&self, state: &mut GuildState) {
        let now = self.clock.now();
        while state.pending.front().is_some_and(|pending| pending.due <= now) {
            if let Some(pending) = state.pending.pop_front() {
                self.apply(state, pending.effect);
            }
        }
    }

    fn apply(&self, state: &mut GuildState, effect: Effect) {
        debug!("applying {effect:?}");
        match effect {
            Effect::Initiate => {
                let form = &mut state.form;
                if form.name.trim().is_empty() {
                    form.error = Some(NAME_REQUIRED.to_string());
                    form.initiated = false;
                } else {
                    form.error = None;
                    form.initiated = true;
                    state.session = Session {
                        name: form.name.trim().to_string(),
                        description: form.description.trim().to_string(),
                        warrior: form.warrior,
                    };
                }
            }
            Effect::Progress(delta) => {
                let quest = &mut state.quest;
                let bounds = self.rules.progress_bounds;
                let next = bounds.clamp(quest.progress.saturating_add(delta));
                if next != quest.progress {
                    quest.progress = next;
                    if bounds.max.is_some_and(|max| next >= max) {
                        quest.alert = Some(VICTORY.to_string());
                    } else if next <= bounds.min {
                        quest.alert = Some(FAILURE.to_string());
                    }
                }
            }
            Effect::Reward(kind, amount) => {
                let counter = match kind {
                    RewardKind::Gold => &mut state.quest.gold,
                    RewardKind::Artifacts => &mut state.quest.artifacts,
                    RewardKind::DaysOff => &mut state.quest.days_off,
                };
                *counter = counter.saturating_add(amount).max(0);
            }
            Effect::Notify(message) => state.quest.alert = Some(message),
        }
    }

    /// A full page load of `path`: everything but the session starts over.
    fn load(&self, state: &mut GuildState, path: String) {
        state.route = Route::from_path(&path);
        state.path = path;
        state.form = ConfigForm::default();
        state.quest = QuestState::fresh(&self.rules);
        state.pending.clear();
        state.overrides.clear();
    }

    /// Client-side route change.
    fn route_to(&self, state: &mut GuildState, route: Route, path: &str) {
        state.route = route;
        state.path = path.to_string();
        state.pending.clear();
        if route == Route::Quest {
            state.quest = QuestState::fresh(&self.rules);
        }
    }

    fn render(&self, state: &GuildState) -> Vec<Node> {
        let mut nodes = match state.route {
            Route::Landing => self.render_landing(),
            Route::Configuration => self.render_configuration(&state.form),
            Route::Quest => self.render_quest(&state.session, &state.quest),
            Route::NotFound => vec![Node::new("not-found", "h1").text("404 Not Found")],
        };
        for node in &mut nodes {
            if let Some(text) = state.overrides.get(&node.key) {
                node.text.clone_from(text);
            }
        }
        nodes
    }

    fn render_landing(&self) -> Vec<Node> {
        vec![
            Node::new("landing.title", "h1").text(self.landing_title.as_str()),
            Node::new("landing.description", "p")
                .class("description")
                .text("Join the legion of quality warriors and hunt down every defect in the realm."),
            Node::new("landing.hero", "img").class("hero-image"),
            Node::new("landing.start", "button").text("Start your testing quest"),
            Node::new("landing.improve", "button").text("Improve your skill"),
            Node::new("landing.footer", "footer").text("© Legion QA Guild"),
        ]
    }

    fn render_configuration(&self, form: &ConfigForm) -> Vec<Node> {
        let mut nodes = vec![
            Node::new("config.title", "h2").text("QA Adventure Configuration"),
            Node::new("config.name", "input").label("Test Quest Name:"),
            Node::new("config.description", "textarea").label("Test Quest Description:"),
            Node::new("config.warriors", "div")
                .class("warrior-selection")
                .text("Choose your QA warrior"),
        ];
        for (index, name) in self.warriors.iter().enumerate() {
            nodes.push(
                Node::new(format!("config.warrior.{index}"), "div")
                    .class("warrior-option")
                    .text(name.as_str()),
            );
        }
        let selected = form.warrior.and_then(|index| self.warriors.get(index));
        nodes.push(
            Node::new("config.selected", "div")
                .class("selected-warrior")
                .text(selected.map_or_else(String::new, |name| format!("Selected: {name}")))
                .visible(selected.is_some()),
        );
        nodes.push(
            Node::new("config.error", "div")
                .class("error-message")
                .text(form.error.clone().unwrap_or_default())
                .visible(form.error.is_some()),
        );
        nodes.push(Node::new("config.initiate", "button").text("Initiate QA Adventure"));
        if form.initiated {
            nodes.push(Node::new("config.embark", "button").text("Embark on Testing"));
        }
        nodes
    }

    fn render_quest(&self, session: &Session, quest: &QuestState) -> Vec<Node> {
        let mut nodes = vec![
            Node::new("quest.title", "h2").text(format!("QA Quest: {}", session.name)),
            Node::new("quest.description", "p").text(session.description.as_str()),
            Node::new("quest.progress-bar", "div").id("progressBarFill"),
            Node::new("quest.progress-text", "span")
                .text(format!("{}% Defect-Free", quest.progress)),
            Node::new("quest.alert", "div")
                .id("customAlertMessage")
                .text(quest.alert.clone().unwrap_or_default())
                .visible(quest.alert.is_some()),
            Node::new("quest.gold", "span").id("goldCount").text(quest.gold.to_string()),
            Node::new("quest.artifacts", "span")
                .id("artifactCount")
                .text(quest.artifacts.to_string()),
            Node::new("quest.days-off", "span")
                .id("honorCount")
                .text(quest.days_off.to_string()),
            Node::new("quest.fix", "button").text("🛠️ Fix Bug"),
            Node::new("quest.find", "button").text("🐞 Find Bug"),
            Node::new("quest.bonus", "button").text("Claim Bonus"),
            Node::new("quest.artifact", "button").text("Obtain QA Artifact"),
            Node::new("quest.rest", "button").text("Earn Days Off"),
            Node::new("quest.custom-action", "input").label("Enter custom QA action"),
            Node::new("quest.submit", "button").text("Submit Action"),
            Node::new("quest.warriors", "div")
                .class("warriors-list")
                .text(self.warriors.join(" ")),
        ];
        for (index, name) in self.warriors.iter().enumerate() {
            let title = format!("Warrior {}: {name}", index + 1);
            let description = warrior_description(name);
            nodes.push(
                Node::new(format!("quest.warrior.{index}"), "li")
                    .class("warrior-item")
                    .text(format!("{title} {description}")),
            );
            nodes.push(
                Node::new(format!("quest.warrior.{index}.name"), "span")
                    .class("warrior-name")
                    .text(title),
            );
            nodes.push(
                Node::new(format!("quest.warrior.{index}.description"), "p")
                    .class("warrior-description")
                    .text(description),
            );
        }
        if let Some(name) = session.warrior.and_then(|index| self.warriors.get(index)) {
            nodes.push(
                Node::new("quest.warrior-details", "div")
                    .class("warrior-details")
                    .text(format!("Champion: {name}")),
            );
        }
        nodes
    }

    fn find(&self, state: &GuildState, element: &SimElement) -> Option<Node> {
        self.render(state)
            .into_iter()
            .find(|node| node.key == element.key)
    }

    fn stale(element: &SimElement) -> VerifyError {
        VerifyError::Driver(format!("stale element reference: {}", element.key))
    }

    fn on_click(&self, state: &mut GuildState, key: &str) {
        match key {
            "landing.start" => self.route_to(state, Route::Configuration, "/quest-config"),
            "config.initiate" => self.schedule(state, Effect::Initiate),
            "config.embark" => self.route_to(state, Route::Quest, "/quest"),
            "quest.fix" => self.schedule(state, Effect::Progress(self.rules.progress_step)),
            "quest.find" => self.schedule(state, Effect::Progress(-self.rules.progress_step)),
            "quest.bonus" => self.schedule(
                state,
                Effect::Reward(RewardKind::Gold, self.rules.gold_per_bonus),
            ),
            "quest.artifact" => self.schedule(
                state,
                Effect::Reward(RewardKind::Artifacts, self.rules.artifacts_per_claim),
            ),
            "quest.rest" => self.schedule(
                state,
                Effect::Reward(RewardKind::DaysOff, self.rules.days_off_per_claim),
            ),
            "quest.submit" => {
                let action = state.quest.custom_action.trim();
                let message = if action.is_empty() {
                    INVALID_ACTION.to_string()
                } else {
                    format!("You have performed the action: {action}")
                };
                self.schedule(state, Effect::Notify(message));
            }
            other => {
                if let Some(index) = other
                    .strip_prefix("config.warrior.")
                    .and_then(|index| index.parse::<usize>().ok())
                {
                    state.form.warrior = Some(index);
                }
            }
        }
    }
}

#[async_trait]
impl Document for SimulatedGuild {
    type Element = SimElement;

    async fn navigate(&self, url: &str) -> VerifyResult<()> {
        let mut state = self.lock();
        self.load(&mut state, path_of(url).to_string());
        debug!("navigated to {}", state.path);
        Ok(())
    }

    async fn reload(&self) -> VerifyResult<()> {
        let mut state = self.lock();
        let path = state.path.clone();
        self.load(&mut state, path);
        Ok(())
    }

    async fn query(&self, selector: &Selector) -> VerifyResult<Vec<SimElement>> {
        let mut state = self.lock();
        self.settle(&mut state);
        let mut found = Vec::new();
        for node in self.render(&state) {
            if node.matches(selector)? {
                found.push(SimElement { key: node.key });
            }
        }
        Ok(found)
    }

    async fn query_within(
        &self,
        scope: &SimElement,
        selector: &Selector,
    ) -> VerifyResult<Vec<SimElement>> {
        let mut state = self.lock();
        self.settle(&mut state);
        self.find(&state, scope).ok_or_else(|| Self::stale(scope))?;
        let mut found = Vec::new();
        for node in self.render(&state) {
            if node.is_within(&scope.key) && node.matches(selector)? {
                found.push(SimElement { key: node.key });
            }
        }
        Ok(found)
    }

    async fn click(&self, element: &SimElement) -> VerifyResult<()> {
        let mut state = self.lock();
        self.settle(&mut state);
        let node = self
            .find(&state, element)
            .ok_or_else(|| Self::stale(element))?;
        if !node.visible {
            return Err(VerifyError::Driver(format!(
                "element not interactable: {}",
                element.key
            )));
        }
        self.on_click(&mut state, &node.key);
        Ok(())
    }

    async fn fill(&self, element: &SimElement, text: &str) -> VerifyResult<()> {
        let mut state = self.lock();
        self.settle(&mut state);
        let node = self
            .find(&state, element)
            .ok_or_else(|| Self::stale(element))?;
        let slot = match node.key.as_str() {
            "config.name" => &mut state.form.name,
            "config.description" => &mut state.form.description,
            "quest.custom-action" => &mut state.quest.custom_action,
            _ => {
                return Err(VerifyError::Driver(format!(
                    "element is not a text input: {}",
                    element.key
                )));
            }
        };
        *slot = text.to_string();
        Ok(())
    }

    async fn text_of(&self, element: &SimElement) -> VerifyResult<Option<String>> {
        let mut state = self.lock();
        self.settle(&mut state);
        let node = self
            .find(&state, element)
            .ok_or_else(|| Self::stale(element))?;
        Ok(Some(node.text))
    }

    async fn is_visible(&self, element: &SimElement) -> VerifyResult<bool> {
        let mut state = self.lock();
        self.settle(&mut state);
        Ok(self.find(&state, element).is_some_and(|node| node.visible))
    }

    async fn current_url(&self) -> VerifyResult<String> {
        let state = self.lock();
        Ok(format!("{}{}", self.origin, state.path))
    }
}

fn origin_of(base_url: &str) -> String {
    match base_url.split_once("://") {
        Some((scheme, rest)) => {
            let host = rest.split('/').next().unwrap_or_default();
            format!("{scheme}://{host}")
        }
        None => base_url.trim_end_matches('/').to_string(),
    }
}

fn path_of(url: &str) -> &str {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    rest.find('/').map_or("/", |index| &rest[index..])
}

fn warrior_description(name: &str) -> &'static str {
    match name {
        "Bug Hunter" => "Tracks down bugs and defects before they reach production.",
        "Code Guardian" => "Protects the code base with careful reviews.",
        "Test Mage" => "Casts test magic to automate every check.",
        _ => "A loyal member of the guild.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guild(latency_ms: u64) -> SimulatedGuild {
        SimulatedGuild::new(VirtualClock::new(), &HarnessConfig::default())
            .with_latency(Duration::from_millis(latency_ms))
    }

    async fn click(guild: &SimulatedGuild, selector: Selector) {
        let element = guild.query(&selector).await.unwrap().remove(0);
        guild.click(&element).await.unwrap();
    }

    async fn text(guild: &SimulatedGuild, selector: Selector) -> String {
        let element = guild.query(&selector).await.unwrap().remove(0);
        guild.text_of(&element).await.unwrap().unwrap_or_default()
    }

    #[test]
    fn urls_split_into_origin_and_path() {
        assert_eq!(origin_of("http://localhost:5173/"), "http://localhost:5173");
        assert_eq!(path_of("http://localhost:5173/quest-config"), "/quest-config");
        assert_eq!(path_of("http://localhost:5173"), "/");
        assert_eq!(Route::from_path("/quest?seed=1"), Route::Quest);
        assert_eq!(Route::from_path("/nowhere"), Route::NotFound);
    }

    #[tokio::test]
    async fn effects_land_after_the_latency() {
        let guild = guild(400);
        guild.navigate("http://localhost:5173/quest").await.unwrap();
        click(&guild, Selector::css_with_text("button", "Fix Bug")).await;

        assert_eq!(text(&guild, Selector::text("% Defect-Free")).await, "30% Defect-Free");
        guild.clock().advance(Duration::from_millis(399));
        assert_eq!(text(&guild, Selector::text("% Defect-Free")).await, "30% Defect-Free");
        guild.clock().advance(Duration::from_millis(1));
        assert_eq!(text(&guild, Selector::text("% Defect-Free")).await, "40% Defect-Free");
    }

    #[tokio::test]
    async fn progress_clamps_and_raises_alerts() {
        let guild = guild(0);
        guild.navigate("http://localhost:5173/quest").await.unwrap();
        for _ in 0..9 {
            click(&guild, Selector::css_with_text("button", "Fix Bug")).await;
        }
        assert_eq!(text(&guild, Selector::text("% Defect-Free")).await, "100% Defect-Free");
        assert_eq!(text(&guild, Selector::css("#customAlertMessage")).await, VICTORY);

        for _ in 0..12 {
            click(&guild, Selector::css_with_text("button", "Find Bug")).await;
        }
        assert_eq!(text(&guild, Selector::text("% Defect-Free")).await, "0% Defect-Free");
        assert_eq!(text(&guild, Selector::css("#customAlertMessage")).await, FAILURE);
    }

    #[tokio::test]
    async fn empty_name_is_rejected_on_initiate() {
        let guild = guild(0);
        guild.navigate("http://localhost:5173/quest-config").await.unwrap();
        click(&guild, Selector::css_with_text("button", "Initiate QA Adventure")).await;

        let error = guild.query(&Selector::css(".error-message")).await.unwrap();
        assert!(guild.is_visible(&error[0]).await.unwrap());
        assert!(
            guild
                .query(&Selector::css_with_text("button", "Embark on Testing"))
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn route_change_makes_old_handles_stale() {
        let guild = guild(0);
        guild.navigate("http://localhost:5173/").await.unwrap();
        let start = guild
            .query(&Selector::css_with_text("button", "Start your testing quest"))
            .await
            .unwrap()
            .remove(0);
        guild.click(&start).await.unwrap();
        assert_eq!(
            guild.current_url().await.unwrap(),
            "http://localhost:5173/quest-config"
        );
        let err = guild.text_of(&start).await.expect_err("stale handle");
        assert!(err.to_string().contains("stale"));
    }

    #[tokio::test]
    async fn reload_keeps_the_session_but_resets_play() {
        let guild = guild(0);
        guild.navigate("http://localhost:5173/quest-config").await.unwrap();
        let name = guild
            .query(&Selector::css("input"))
            .await
            .unwrap()
            .remove(0);
        guild.fill(&name, "Night Shift").await.unwrap();
        click(&guild, Selector::css_with_text("button", "Initiate QA Adventure")).await;
        click(&guild, Selector::css_with_text("button", "Embark on Testing")).await;
        click(&guild, Selector::css_with_text("button", "Claim Bonus")).await;
        assert_eq!(text(&guild, Selector::css("#goldCount")).await, "10");

        guild.reload().await.unwrap();
        assert_eq!(text(&guild, Selector::css("#goldCount")).await, "0");
        assert_eq!(text(&guild, Selector::css("h2")).await, "QA Quest: Night Shift");
    }
}
