//! Keyword search over a bundled set of quiz questions.
//!
//! The question list is loaded once per session ([`loader`]), filtered with a
//! case-insensitive substring match ([`search`]) and turned into a highlighted
//! view model ([`render`]). [`controller`] wires UI events for the popup and
//! the in-page overlay, and [`message`] runs the background service that
//! answers question requests. With the `extract` feature, [`extract`] builds
//! the question asset from a saved exam page.

pub mod config;
pub mod controller;
pub mod error;
#[cfg(feature = "extract")]
pub mod extract;
pub mod keys;
pub mod loader;
pub mod message;
mod record;
pub mod render;
pub mod search;
pub mod store;

#[cfg(feature = "web")]
pub mod web;

pub use config::{AssetSource, SearchConfig};
pub use controller::{
    Controller, Effect, OverlayController, PopupController, ResultsView, UiEvent, Visibility,
};
pub use error::LoadError;
pub use loader::{load_questions, parse_questions};
pub use record::{MISSING_EXPLANATION, QuestionRecord};
pub use render::{RenderedList, count_label, render};
pub use search::{QueryMatcher, filter};
pub use store::QuestionStore;
