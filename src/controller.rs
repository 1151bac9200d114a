//! Event handling for the popup and in-page overlay.
//!
//! Controllers are plain state machines: the host feeds them [`UiEvent`]s and
//! reads back the [`ResultsView`] plus any [`Effect`] it has to carry out
//! (focusing the input after a delay, redrawing). They never touch timers or
//! I/O themselves.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use crate::QuestionRecord;
use crate::config::SearchConfig;
use crate::keys::{Key, KeyPress};
use crate::render::{RenderedList, count_label, render};
use crate::store::QuestionStore;

pub const LOADING_LABEL: &str = "Loading questions...";
pub const LOAD_ERROR_MESSAGE: &str =
    "Error loading questions. Please refresh the page and try again.";

#[derive(Debug, Clone)]
pub enum UiEvent {
    /// The search input changed.
    Input(String),
    /// Search button or Enter.
    Submit,
    Key(KeyPress),
    Clear,
    Toggle,
    Show,
    Hide,
    /// The close button.
    Close,
    /// A click on the dimmed background around the content panel.
    BackgroundClick,
    /// A click inside the content panel.
    ContentClick,
    /// The question list finished loading, or failed to.
    Loaded(Result<Arc<[QuestionRecord]>, String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Redraw,
    FocusInput { delay: Duration },
    VisibilityChanged(Visibility),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Visibility {
    #[default]
    Hidden,
    Visible,
}

/// Everything the results region shows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResultsView {
    pub count: String,
    pub list: RenderedList,
    pub loading: bool,
    /// Set when the question list could not be loaded. Never shown together
    /// with `no_results`.
    pub error: Option<String>,
    pub no_results: bool,
}

/// Search state shared by both UI variants.
#[derive(Debug, Clone)]
pub struct SearchSession {
    config: SearchConfig,
    store: QuestionStore,
    input: String,
    view: ResultsView,
}

impl SearchSession {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            config,
            store: QuestionStore::empty(),
            input: String::new(),
            view: ResultsView {
                count: LOADING_LABEL.to_string(),
                loading: true,
                ..ResultsView::default()
            },
        }
    }

    pub fn view(&self) -> &ResultsView {
        &self.view
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn store(&self) -> &QuestionStore {
        &self.store
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn load(&mut self, result: Result<Arc<[QuestionRecord]>, String>) {
        self.view.loading = false;
        match result {
            Ok(records) => {
                debug!(count = records.len(), "questions loaded into session");
                self.store = QuestionStore::new(records);
                self.store.apply(&self.input);
                let limit = if self.input.trim().is_empty() {
                    self.config.initial_limit
                } else {
                    self.config.search_limit
                };
                self.display(limit);
            }
            Err(message) => {
                warn!(%message, "question list unavailable");
                self.show_error();
            }
        }
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// Re-filters with the current input and shows up to the search limit.
    pub fn search(&mut self) {
        self.store.apply(&self.input);
        self.display(self.config.search_limit);
    }

    /// Empties the input and shows the first records of the full set.
    pub fn clear(&mut self) {
        self.input.clear();
        self.store.reset();
        self.display(self.config.initial_limit);
    }

    fn display(&mut self, limit: usize) {
        self.view.count = count_label(self.store.total(), self.store.matched(), &self.input);
        self.view.list = render(self.store.visible(limit), &self.input);
        self.view.error = None;
        self.view.no_results = self.view.list.is_empty();
    }

    fn show_error(&mut self) {
        self.view.count.clear();
        self.view.list = RenderedList::default();
        self.view.error = Some(LOAD_ERROR_MESSAGE.to_string());
        self.view.no_results = false;
    }
}

/// The seam hosts drive: both UI variants take the same events.
pub trait Controller {
    fn handle(&mut self, event: UiEvent) -> Vec<Effect>;
    fn session(&self) -> &SearchSession;

    fn view(&self) -> &ResultsView {
        self.session().view()
    }
}

/// The toolbar popup: always visible while open, so it only searches.
#[derive(Debug, Clone)]
pub struct PopupController {
    session: SearchSession,
}

impl PopupController {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            session: SearchSession::new(config),
        }
    }
}

impl Controller for PopupController {
    fn handle(&mut self, event: UiEvent) -> Vec<Effect> {
        match event {
            UiEvent::Input(text) => {
                self.session.set_input(text);
                self.session.search();
            }
            UiEvent::Submit => self.session.search(),
            UiEvent::Key(KeyPress {
                key: Key::Enter, ..
            }) => self.session.search(),
            UiEvent::Clear => self.session.clear(),
            UiEvent::Loaded(result) => self.session.load(result),
            _ => return Vec::new(),
        }
        vec![Effect::Redraw]
    }

    fn session(&self) -> &SearchSession {
        &self.session
    }
}

/// The floating in-page overlay, toggled by keyboard shortcut.
#[derive(Debug, Clone)]
pub struct OverlayController {
    session: SearchSession,
    visibility: Visibility,
}

impl OverlayController {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            session: SearchSession::new(config),
            visibility: Visibility::Hidden,
        }
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn is_visible(&self) -> bool {
        self.visibility == Visibility::Visible
    }

    fn show(&mut self) -> Vec<Effect> {
        if self.is_visible() {
            return Vec::new();
        }
        self.visibility = Visibility::Visible;
        vec![
            Effect::VisibilityChanged(Visibility::Visible),
            Effect::FocusInput {
                delay: self.session.config().focus_delay,
            },
        ]
    }

    fn hide(&mut self) -> Vec<Effect> {
        if !self.is_visible() {
            return Vec::new();
        }
        self.visibility = Visibility::Hidden;
        vec![Effect::VisibilityChanged(Visibility::Hidden)]
    }

    fn toggle(&mut self) -> Vec<Effect> {
        if self.is_visible() {
            self.hide()
        } else {
            self.show()
        }
    }

    fn key(&mut self, press: KeyPress) -> Vec<Effect> {
        if self.session.config().toggle_shortcut.matches(&press) {
            return self.toggle();
        }
        match press.key {
            Key::Escape => self.hide(),
            Key::Enter if self.is_visible() => {
                self.session.search();
                vec![Effect::Redraw]
            }
            _ => Vec::new(),
        }
    }
}

impl Controller for OverlayController {
    fn handle(&mut self, event: UiEvent) -> Vec<Effect> {
        match event {
            UiEvent::Input(text) => {
                self.session.set_input(text);
                self.session.search();
                vec![Effect::Redraw]
            }
            UiEvent::Submit => {
                self.session.search();
                vec![Effect::Redraw]
            }
            UiEvent::Clear => {
                self.session.clear();
                vec![
                    Effect::Redraw,
                    Effect::FocusInput {
                        delay: Duration::ZERO,
                    },
                ]
            }
            UiEvent::Key(press) => self.key(press),
            UiEvent::Toggle => self.toggle(),
            UiEvent::Show => self.show(),
            UiEvent::Hide | UiEvent::Close | UiEvent::BackgroundClick => self.hide(),
            UiEvent::ContentClick => Vec::new(),
            UiEvent::Loaded(result) => {
                self.session.load(result);
                vec![Effect::Redraw]
            }
        }
    }

    fn session(&self) -> &SearchSession {
        &self.session
    }
}
