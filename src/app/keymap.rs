use std::sync::{Arc, LazyLock};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::Deserialize;
use thiserror::Error;

macro_rules! keymap_source {
    () => {
        include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/keymap/default.keymap.json"
        ))
    };
}

/// Where a key event was received.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeymapContext {
    /// Anywhere inside the attribute editor overlay.
    Editor,
    /// An activation list (menu items, field list) has focus.
    List,
}

impl KeymapContext {
    fn from_name(raw: &str) -> Option<Self> {
        match raw {
            "editor" => Some(KeymapContext::Editor),
            "list" => Some(KeymapContext::List),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyAction {
    /// Escape: try to finish, gated by mandatory-field validation.
    RequestCompletion,
    FocusStep(i32),
    Activate,
}

#[derive(Debug, Error)]
pub enum KeymapError {
    #[error("keymap is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("keymap entry {id}: {message}")]
    Entry { id: String, message: String },
    #[error("key '{spec}': {message}")]
    Key { spec: String, message: String },
}

#[derive(Deserialize)]
struct RawEntry {
    id: String,
    description: String,
    contexts: Vec<String>,
    action: RawAction,
    combos: Vec<String>,
}

#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
enum RawAction {
    RequestCompletion,
    FocusStep { delta: i32 },
    Activate,
}

impl RawAction {
    fn into_action(self) -> KeyAction {
        match self {
            RawAction::RequestCompletion => KeyAction::RequestCompletion,
            RawAction::FocusStep { delta } => KeyAction::FocusStep(delta),
            RawAction::Activate => KeyAction::Activate,
        }
    }
}

#[derive(Debug)]
struct KeyBinding {
    action: KeyAction,
    contexts: Vec<KeymapContext>,
    combos: Vec<KeyPattern>,
    snippet: String,
}

impl KeyBinding {
    fn from_raw(raw: RawEntry) -> Result<Self, KeymapError> {
        let entry_error = |message: String| KeymapError::Entry {
            id: raw.id.clone(),
            message,
        };
        let mut contexts = Vec::with_capacity(raw.contexts.len());
        for ctx in &raw.contexts {
            let context = KeymapContext::from_name(ctx)
                .ok_or_else(|| entry_error(format!("unknown context '{ctx}'")))?;
            contexts.push(context);
        }
        if contexts.is_empty() {
            return Err(entry_error("must declare at least one context".into()));
        }
        let mut combos = Vec::with_capacity(raw.combos.len());
        for combo in &raw.combos {
            let pattern = KeyPattern::parse(combo)
                .map_err(|err| entry_error(format!("combo '{combo}': {err}")))?;
            combos.push(pattern);
        }
        if combos.is_empty() {
            return Err(entry_error("must declare combos".into()));
        }
        let combos_display = combos
            .iter()
            .map(|pattern| pattern.display.as_str())
            .collect::<Vec<_>>()
            .join("/");
        let snippet = format!("{combos_display} {}", raw.description);
        Ok(Self {
            action: raw.action.into_action(),
            contexts,
            combos,
            snippet,
        })
    }

    fn matches(&self, context: KeymapContext, key: &KeyEvent) -> Option<KeyAction> {
        if !self.contexts.contains(&context) {
            return None;
        }
        self.combos
            .iter()
            .find(|pattern| pattern.matches(key))
            .map(|_| self.action)
    }
}

#[derive(Debug)]
struct KeyPattern {
    code: KeyCode,
    required: KeyModifiers,
    display: String,
}

impl KeyPattern {
    fn parse(spec: &str) -> Result<Self, String> {
        let display = spec.trim().to_string();
        let mut tokens = display
            .split('+')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>();
        let Some(key_token) = tokens.pop() else {
            return Err("combo must contain key".into());
        };
        let code = parse_code(key_token)?;
        let mut required = KeyModifiers::empty();
        for token in tokens {
            match token.to_lowercase().as_str() {
                "ctrl" | "control" => required |= KeyModifiers::CONTROL,
                "shift" => required |= KeyModifiers::SHIFT,
                "alt" => required |= KeyModifiers::ALT,
                other => return Err(format!("unsupported modifier '{other}'")),
            }
        }
        Ok(Self {
            code,
            required,
            display,
        })
    }

    fn matches(&self, key: &KeyEvent) -> bool {
        let code_matches = match (self.code, key.code) {
            (KeyCode::Char(expected), KeyCode::Char(actual)) => {
                actual.to_ascii_lowercase() == expected
            }
            (expected, actual) => expected == actual,
        };
        code_matches && key.modifiers == self.required
    }
}

fn parse_code(token: &str) -> Result<KeyCode, String> {
    let code = match token.to_lowercase().as_str() {
        "esc" | "escape" => KeyCode::Esc,
        "enter" | "return" => KeyCode::Enter,
        "up" | "arrowup" => KeyCode::Up,
        "down" | "arrowdown" => KeyCode::Down,
        "left" | "arrowleft" => KeyCode::Left,
        "right" | "arrowright" => KeyCode::Right,
        "tab" => KeyCode::Tab,
        "backtab" => KeyCode::BackTab,
        other => {
            let mut chars = other.chars();
            match (chars.next(), chars.next()) {
                (Some(ch), None) => KeyCode::Char(ch),
                _ => return Err(format!("unsupported key '{token}'")),
            }
        }
    };
    Ok(code)
}

/// Parsed key bindings. Lookups are first-match in file order.
#[derive(Debug)]
pub struct Keymap {
    bindings: Vec<KeyBinding>,
}

impl Keymap {
    pub fn from_json(source: &str) -> Result<Self, KeymapError> {
        let raw_entries: Vec<RawEntry> = serde_json::from_str(source)?;
        let bindings = raw_entries
            .into_iter()
            .map(KeyBinding::from_raw)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { bindings })
    }

    pub fn classify(&self, context: KeymapContext, key: &KeyEvent) -> Option<KeyAction> {
        self.bindings
            .iter()
            .find_map(|binding| binding.matches(context, key))
    }

    pub fn help_text(&self, context: KeymapContext) -> Option<String> {
        let snippets = self
            .bindings
            .iter()
            .filter(|binding| binding.contexts.contains(&context))
            .map(|binding| binding.snippet.as_str())
            .collect::<Vec<_>>();
        if snippets.is_empty() {
            None
        } else {
            Some(snippets.join(" • "))
        }
    }
}

/// Turns a combo such as `esc` or `ctrl+s` into the key press it denotes.
pub fn parse_key(spec: &str) -> Result<KeyEvent, KeymapError> {
    let pattern = KeyPattern::parse(spec).map_err(|message| KeymapError::Key {
        spec: spec.to_string(),
        message,
    })?;
    Ok(KeyEvent::new(pattern.code, pattern.required))
}

static DEFAULT_KEYMAP: LazyLock<Arc<Keymap>> = LazyLock::new(|| {
    Arc::new(Keymap::from_json(keymap_source!()).expect("invalid keymap/default.keymap.json"))
});

pub fn default_keymap() -> Arc<Keymap> {
    Arc::clone(&DEFAULT_KEYMAP)
}
