//! Asynchronous state verification for the QA Guild game.
//!
//! Screens name the UI concepts they read and act on through a
//! [`locator::LocatorRegistry`]; every expectation about state that the UI
//! applies later is resolved by the [`poll::Poller`]. Scenarios compose the
//! two and run either against a real browser ([`browser`]) or against the
//! in-process [`simulated::SimulatedGuild`].

pub mod browser;
pub mod clock;
pub mod config;
pub mod document;
pub mod error;
pub mod locator;
pub mod poll;
pub mod reports;
pub mod runner;
pub mod scenario;
pub mod screens;
pub mod simulated;
pub mod snapshot;
pub mod util;

pub use error::{VerifyError, VerifyResult};
