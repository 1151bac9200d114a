use std::fmt;
use std::str::FromStr;

use crate::error::ShortcutError;

/// Default overlay toggle; Command stands in for Ctrl on macOS.
pub const DEFAULT_TOGGLE_SHORTCUT: &str = "Ctrl+Shift+Q";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
    Escape,
    Other,
}

/// A key press delivered to a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyPress {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::default(),
        }
    }

    pub fn with_modifiers(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }
}

/// A `Ctrl+Shift+<key>` style chord. Ctrl and Command are interchangeable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shortcut {
    key: char,
    shift: bool,
    alt: bool,
}

impl Shortcut {
    pub fn matches(&self, press: &KeyPress) -> bool {
        let Key::Char(ch) = press.key else {
            return false;
        };
        let mods = press.modifiers;
        (mods.ctrl || mods.meta)
            && mods.shift == self.shift
            && mods.alt == self.alt
            && ch.eq_ignore_ascii_case(&self.key)
    }
}

impl Default for Shortcut {
    fn default() -> Self {
        Self {
            key: 'Q',
            shift: true,
            alt: false,
        }
    }
}

impl FromStr for Shortcut {
    type Err = ShortcutError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = value
            .split('+')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect();
        let Some((key, modifiers)) = parts.split_last() else {
            return Err(ShortcutError::Empty);
        };

        let mut primary = false;
        let mut shift = false;
        let mut alt = false;
        for modifier in modifiers {
            match modifier.to_ascii_lowercase().as_str() {
                "ctrl" | "control" | "cmd" | "command" | "meta" => primary = true,
                "shift" => shift = true,
                "alt" | "option" => alt = true,
                _ => return Err(ShortcutError::UnknownModifier(modifier.to_string())),
            }
        }
        if !primary {
            return Err(ShortcutError::MissingPrimary);
        }

        let mut chars = key.chars();
        let ch = match (chars.next(), chars.next()) {
            (Some(ch), None) if ch.is_ascii_alphanumeric() => ch.to_ascii_uppercase(),
            _ => return Err(ShortcutError::InvalidKey(key.to_string())),
        };
        Ok(Self {
            key: ch,
            shift,
            alt,
        })
    }
}

impl fmt::Display for Shortcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ctrl")?;
        if self.shift {
            write!(f, "+Shift")?;
        }
        if self.alt {
            write!(f, "+Alt")?;
        }
        write!(f, "+{}", self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chord(ch: char, ctrl: bool, meta: bool, shift: bool) -> KeyPress {
        KeyPress::with_modifiers(
            Key::Char(ch),
            Modifiers {
                ctrl,
                shift,
                alt: false,
                meta,
            },
        )
    }

    #[test]
    fn default_shortcut_accepts_ctrl_or_command() {
        let shortcut: Shortcut = DEFAULT_TOGGLE_SHORTCUT.parse().unwrap();
        assert_eq!(shortcut, Shortcut::default());
        assert!(shortcut.matches(&chord('Q', true, false, true)));
        assert!(shortcut.matches(&chord('Q', false, true, true)));
        assert!(shortcut.matches(&chord('q', true, false, true)));
        assert!(!shortcut.matches(&chord('Q', false, false, true)));
        assert!(!shortcut.matches(&chord('Q', true, false, false)));
        assert!(!shortcut.matches(&chord('W', true, false, true)));
        assert!(!shortcut.matches(&KeyPress::new(Key::Escape)));
    }

    #[test]
    fn parse_rejects_bad_chords() {
        assert_eq!("".parse::<Shortcut>(), Err(ShortcutError::Empty));
        assert_eq!(
            "Shift+Q".parse::<Shortcut>(),
            Err(ShortcutError::MissingPrimary)
        );
        assert_eq!(
            "Ctrl+Hyper+Q".parse::<Shortcut>(),
            Err(ShortcutError::UnknownModifier("Hyper".into()))
        );
        assert_eq!(
            "Ctrl+Shift+Tab".parse::<Shortcut>(),
            Err(ShortcutError::InvalidKey("Tab".into()))
        );
    }

    #[test]
    fn display_round_trips() {
        let shortcut: Shortcut = "command + alt + k".parse().unwrap();
        assert_eq!(shortcut.to_string(), "Ctrl+Alt+K");
        assert_eq!(shortcut.to_string().parse::<Shortcut>().unwrap(), shortcut);
    }
}
