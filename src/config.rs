use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::keys::Shortcut;
use crate::render::{INITIAL_DISPLAY_LIMIT, SEARCH_DISPLAY_LIMIT};

/// Delay between showing the overlay and focusing its input, so the show
/// animation can start first.
pub const FOCUS_DELAY: Duration = Duration::from_millis(200);

/// Where the question list is read from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AssetSource {
    /// The question set compiled into the binary.
    #[default]
    Bundled,
    File(PathBuf),
}

impl fmt::Display for AssetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetSource::Bundled => write!(f, "bundled"),
            AssetSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Knobs shared by the popup and overlay sessions.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub initial_limit: usize,
    pub search_limit: usize,
    pub focus_delay: Duration,
    pub toggle_shortcut: Shortcut,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            initial_limit: INITIAL_DISPLAY_LIMIT,
            search_limit: SEARCH_DISPLAY_LIMIT,
            focus_delay: FOCUS_DELAY,
            toggle_shortcut: Shortcut::default(),
        }
    }
}
