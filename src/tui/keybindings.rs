//! Keybinding configuration for the TUI.
//!
//! Defaults cover every [`Action`]; the `custom_keybindings` table of the
//! config file adds keys on top of them.
//!
//! # Example
//!
//! ```
//! use qrscan::tui::keybindings::KeyBindings;
//! use qrscan::tui::Action;
//! use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
//!
//! let bindings = KeyBindings::default();
//! let c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE);
//! assert_eq!(bindings.resolve(&c), Some(Action::OpenCamera));
//! ```

use std::collections::HashMap;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::Action;

/// Error type for keybinding operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum KeybindingError {
    /// Invalid key specification.
    #[error("Invalid key specification: '{0}'. Examples: 'c', 'Ctrl+r', 'Enter', 'F5'")]
    InvalidKeySpec(String),

    /// Invalid action name.
    #[error("Unknown action: '{0}'. Valid actions: {}", Action::all_names().join(", "))]
    InvalidAction(String),
}

/// Mapping from actions to the key events that trigger them.
#[derive(Debug, Clone)]
pub struct KeyBindings {
    action_keys: HashMap<Action, Vec<KeyEvent>>,
}

/// Modifier display names, in the order they are printed.
const MODIFIER_NAMES: &[(KeyModifiers, &str)] = &[
    (KeyModifiers::CONTROL, "Ctrl"),
    (KeyModifiers::ALT, "Alt"),
    (KeyModifiers::SHIFT, "Shift"),
];

/// Canonical names of non-character keys.
const NAMED_KEYS: &[(&str, KeyCode)] = &[
    ("Space", KeyCode::Char(' ')),
    ("Enter", KeyCode::Enter),
    ("Esc", KeyCode::Esc),
    ("Tab", KeyCode::Tab),
    ("Backspace", KeyCode::Backspace),
    ("Delete", KeyCode::Delete),
    ("Up", KeyCode::Up),
    ("Down", KeyCode::Down),
    ("Left", KeyCode::Left),
    ("Right", KeyCode::Right),
    ("Home", KeyCode::Home),
    ("End", KeyCode::End),
];

/// Extra spellings accepted in config files.
const KEY_ALIASES: &[(&str, KeyCode)] = &[
    ("spc", KeyCode::Char(' ')),
    ("return", KeyCode::Enter),
    ("escape", KeyCode::Esc),
    ("bs", KeyCode::Backspace),
    ("del", KeyCode::Delete),
];

fn parse_modifier(name: &str) -> Option<KeyModifiers> {
    match name.to_ascii_lowercase().as_str() {
        "ctrl" | "control" => Some(KeyModifiers::CONTROL),
        "alt" | "meta" | "option" => Some(KeyModifiers::ALT),
        "shift" => Some(KeyModifiers::SHIFT),
        _ => None,
    }
}

fn parse_key_code(name: &str) -> Option<KeyCode> {
    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return c.is_ascii().then_some(KeyCode::Char(c));
    }

    if let Some(n) = name
        .strip_prefix(['f', 'F'])
        .and_then(|rest| rest.parse::<u8>().ok())
    {
        return (1..=12).contains(&n).then_some(KeyCode::F(n));
    }

    NAMED_KEYS
        .iter()
        .chain(KEY_ALIASES)
        .find(|(known, _)| known.eq_ignore_ascii_case(name))
        .map(|(_, code)| *code)
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            action_keys: Self::default_bindings(),
        }
    }
}

impl KeyBindings {
    /// Resolve a key press to an action.
    ///
    /// Key release and repeat events never resolve.
    #[must_use]
    pub fn resolve(&self, key: &KeyEvent) -> Option<Action> {
        if key.kind != KeyEventKind::Press {
            return None;
        }

        // Iterate in a fixed order so a key bound twice resolves predictably
        Action::all()
            .iter()
            .find(|action| {
                self.keys_for_action(action)
                    .iter()
                    .any(|k| Self::key_matches(k, key))
            })
            .copied()
    }

    /// Match code and modifiers, ignoring kind and state.
    fn key_matches(target: &KeyEvent, actual: &KeyEvent) -> bool {
        target.code == actual.code && target.modifiers == actual.modifiers
    }

    /// Keys bound to an action.
    #[must_use]
    pub fn keys_for_action(&self, action: &Action) -> &[KeyEvent] {
        self.action_keys
            .get(action)
            .map_or(&[], |keys| keys.as_slice())
    }

    /// Human-readable form of the first key bound to an action.
    #[must_use]
    pub fn key_hint(&self, action: &Action) -> String {
        self.keys_for_action(action)
            .first()
            .map_or_else(String::new, Self::format_key)
    }

    /// All keys bound to an action, joined with `/`.
    #[must_use]
    pub fn key_hints(&self, action: &Action) -> String {
        self.keys_for_action(action)
            .iter()
            .map(Self::format_key)
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Format a key event as a human-readable string (`"Ctrl+c"`, `"F1"`).
    #[must_use]
    pub fn format_key(key: &KeyEvent) -> String {
        let mut out: String = MODIFIER_NAMES
            .iter()
            .filter(|(modifier, _)| key.modifiers.contains(*modifier))
            .map(|(_, name)| format!("{name}+"))
            .collect();

        match key.code {
            KeyCode::F(n) => out.push_str(&format!("F{n}")),
            code => match NAMED_KEYS.iter().find(|(_, named)| *named == code) {
                Some((name, _)) => out.push_str(name),
                None => match code {
                    KeyCode::Char(c) => out.push(c),
                    _ => out.push('?'),
                },
            },
        }
        out
    }

    /// Parse a key specification such as `"r"`, `"Ctrl+r"`, `"Enter"` or `"F5"`.
    ///
    /// Modifiers come first, separated by `+`; a lone `"+"` is the plus key.
    ///
    /// # Errors
    ///
    /// Returns [`KeybindingError::InvalidKeySpec`] if the spec names no key,
    /// puts a modifier after the key, or uses an unknown key name.
    ///
    /// # Example
    ///
    /// ```
    /// use qrscan::tui::keybindings::KeyBindings;
    /// use crossterm::event::{KeyCode, KeyModifiers};
    ///
    /// let key = KeyBindings::parse_key("Ctrl+r").unwrap();
    /// assert_eq!(key.code, KeyCode::Char('r'));
    /// assert_eq!(key.modifiers, KeyModifiers::CONTROL);
    /// ```
    pub fn parse_key(spec: &str) -> Result<KeyEvent, KeybindingError> {
        let spec = spec.trim();
        let invalid = || KeybindingError::InvalidKeySpec(spec.to_string());

        let (prefix, key) = match spec.rsplit_once('+') {
            // "+" and "Ctrl++" name the plus key; "Ctrl+" names nothing
            Some(("", "")) => ("", "+"),
            Some((prefix, "")) if prefix.ends_with('+') => (prefix.trim_end_matches('+'), "+"),
            Some((prefix, key)) => (prefix, key.trim()),
            None => ("", spec),
        };
        if key.is_empty() {
            return Err(invalid());
        }

        let mut modifiers = KeyModifiers::NONE;
        for part in prefix.split('+').map(str::trim).filter(|p| !p.is_empty()) {
            modifiers |= parse_modifier(part).ok_or_else(invalid)?;
        }

        let code = parse_key_code(key).ok_or_else(invalid)?;
        Ok(KeyEvent::new(code, modifiers))
    }

    /// Parse an action name such as `"open_camera"`.
    ///
    /// # Errors
    ///
    /// Returns [`KeybindingError::InvalidAction`] for unknown names.
    pub fn parse_action(name: &str) -> Result<Action, KeybindingError> {
        name.parse::<Action>()
            .map_err(|_| KeybindingError::InvalidAction(name.to_string()))
    }

    /// Add custom keys on top of the defaults.
    ///
    /// A custom key is removed from every other action so the override wins.
    ///
    /// # Errors
    ///
    /// Returns an error if any action name or key specification is invalid.
    pub fn with_custom_overrides(
        mut self,
        custom: &HashMap<String, Vec<String>>,
    ) -> Result<Self, KeybindingError> {
        for (action_name, key_specs) in custom {
            let action = Self::parse_action(action_name)?;

            for key_spec in key_specs {
                let key_event = Self::parse_key(key_spec)?;

                for (other_action, other_keys) in &mut self.action_keys {
                    if *other_action != action {
                        other_keys.retain(|k| !Self::key_matches(k, &key_event));
                    }
                }

                let keys = self.action_keys.entry(action).or_default();
                if !keys.iter().any(|k| Self::key_matches(k, &key_event)) {
                    keys.push(key_event);
                }
            }
        }

        Ok(self)
    }

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    fn default_bindings() -> HashMap<Action, Vec<KeyEvent>> {
        let none = KeyModifiers::NONE;
        let mut bindings = HashMap::new();

        bindings.insert(
            Action::OpenCamera,
            vec![Self::key(KeyCode::Char('c'), none)],
        );
        bindings.insert(
            Action::UploadImage,
            vec![Self::key(KeyCode::Char('o'), none)],
        );
        bindings.insert(Action::Retry, vec![Self::key(KeyCode::Char('r'), none)]);
        bindings.insert(
            Action::ScanAgain,
            vec![
                Self::key(KeyCode::Char('s'), none),
                Self::key(KeyCode::Backspace, none),
            ],
        );
        bindings.insert(Action::UseName, vec![Self::key(KeyCode::Char('u'), none)]);
        bindings.insert(
            Action::ShowHelp,
            vec![
                Self::key(KeyCode::Char('?'), none),
                Self::key(KeyCode::F(1), none),
            ],
        );
        bindings.insert(Action::Confirm, vec![Self::key(KeyCode::Enter, none)]);
        bindings.insert(Action::Cancel, vec![Self::key(KeyCode::Esc, none)]);
        bindings.insert(
            Action::Quit,
            vec![
                Self::key(KeyCode::Char('q'), none),
                Self::key(KeyCode::Char('c'), KeyModifiers::CONTROL),
            ],
        );

        bindings
    }
}
