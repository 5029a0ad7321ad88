// ---------------- Keymap ----------------
// Optional `keymap.toml`:
//
//   [keys]
//   m = "toggle_learned"
//   " " = "flip"
//
// Navigation keys (q, Esc, Enter, Tab, arrows, j/k, 1-7) are fixed.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use code_route::action::Action;
use code_route::{Intent, Screen};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAction {
    ToggleLearned,
    Review,
    Flip,
    Next,
    Knew,
    ResetAnswer,
    ResetSource,
    StartFlashcards,
    StartQuiz,
    Back,
    EnglishFirst,
    Hints,
    Theme,
    Export,
    Import,
    ResetAll,
    Search,
    Help,
}

impl KeyAction {
    pub const ALL: [KeyAction; 18] = [
        KeyAction::ToggleLearned,
        KeyAction::Review,
        KeyAction::Flip,
        KeyAction::Next,
        KeyAction::Knew,
        KeyAction::ResetAnswer,
        KeyAction::ResetSource,
        KeyAction::StartFlashcards,
        KeyAction::StartQuiz,
        KeyAction::Back,
        KeyAction::EnglishFirst,
        KeyAction::Hints,
        KeyAction::Theme,
        KeyAction::Export,
        KeyAction::Import,
        KeyAction::ResetAll,
        KeyAction::Search,
        KeyAction::Help,
    ];

    pub fn describe(&self) -> &'static str {
        match self {
            Self::ToggleLearned => "mark / unmark learned",
            Self::Review => "review +1 (modules: mark as started)",
            Self::Flip => "flip flashcard",
            Self::Next => "next card or question",
            Self::Knew => "I knew this",
            Self::ResetAnswer => "reset quiz answer",
            Self::ResetSource => "reset source module",
            Self::StartFlashcards => "study module with flashcards",
            Self::StartQuiz => "practice module quiz",
            Self::Back => "back to modules",
            Self::EnglishFirst => "toggle English first",
            Self::Hints => "toggle hints",
            Self::Theme => "toggle theme",
            Self::Export => "export progress JSON",
            Self::Import => "import progress JSON",
            Self::ResetAll => "reset all progress",
            Self::Search => "search",
            Self::Help => "help",
        }
    }

    /// Whether an intent offered by the current view is the one this key runs.
    pub fn accepts(&self, intent: &Intent) -> bool {
        match (self, intent) {
            (Self::ToggleLearned, Intent::Apply(Action::ToggleLearned(_))) => true,
            (Self::Review, Intent::Apply(Action::AddReview(_) | Action::OpenModule(_))) => true,
            (Self::Flip, Intent::Apply(Action::FlipFlashcard)) => true,
            (Self::Next, Intent::Apply(Action::NextFlashcard | Action::NextQuestion)) => true,
            (Self::Knew, Intent::Apply(Action::MarkKnew(_))) => true,
            (Self::ResetAnswer, Intent::Apply(Action::ResetQuizAnswer(_))) => true,
            (Self::ResetSource, Intent::Apply(Action::ClearSourceModule(_))) => true,
            (Self::StartFlashcards, Intent::Apply(Action::StartFlashcards(_))) => true,
            (Self::StartQuiz, Intent::Apply(Action::StartQuiz(_))) => true,
            (Self::Back, Intent::Open(Screen::Modules)) => true,
            (Self::Export, Intent::ExportProgress) => true,
            (Self::Import, Intent::ImportProgress) => true,
            (Self::ResetAll, Intent::Apply(Action::ResetAllProgress)) => true,
            _ => false,
        }
    }
}

#[derive(Deserialize)]
struct KeyMapToml {
    keys: HashMap<String, String>,
}

/// First `keymap.toml` found among `candidates`, merged over the defaults.
pub fn load_keymap(candidates: &[PathBuf]) -> Result<HashMap<char, KeyAction>> {
    for p in candidates {
        if p.exists() {
            return read_keymap(p);
        }
    }
    Ok(default_keymap())
}

fn read_keymap(path: &Path) -> Result<HashMap<char, KeyAction>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read keymap: {}", path.display()))?;
    let km: KeyMapToml = toml::from_str(&content)
        .with_context(|| format!("failed to parse keymap: {}", path.display()))?;
    tracing::info!(path = %path.display(), bindings = km.keys.len(), "keymap loaded");
    Ok(parse_keymap(km.keys))
}

fn parse_keymap(map: HashMap<String, String>) -> HashMap<char, KeyAction> {
    let mut out = default_keymap();
    for (k, v) in map {
        let mut chars = k.chars();
        let (Some(ch), None) = (chars.next(), chars.next()) else {
            tracing::warn!(key = %k, "keymap entries must be a single character");
            continue;
        };
        match action_from_str(&v) {
            Some(act) => {
                out.retain(|_, bound| *bound != act);
                if let Some(replaced) = out.insert(ch, act) {
                    tracing::warn!(
                        key = %ch,
                        ?replaced,
                        action = ?act,
                        "keymap binding takes the key of another action"
                    );
                }
            }
            None => tracing::warn!(action = %v, "unknown keymap action"),
        }
    }
    for action in unbound_actions(&out) {
        tracing::warn!(?action, "no key left for action after applying keymap");
    }
    out
}

/// Actions with no key, in [`KeyAction::ALL`] order.
pub fn unbound_actions(keymap: &HashMap<char, KeyAction>) -> Vec<KeyAction> {
    KeyAction::ALL
        .into_iter()
        .filter(|action| key_for(keymap, *action).is_none())
        .collect()
}

fn action_from_str(s: &str) -> Option<KeyAction> {
    use KeyAction::*;
    Some(match s {
        "toggle_learned" => ToggleLearned,
        "review" => Review,
        "flip" => Flip,
        "next" => Next,
        "knew" => Knew,
        "reset_answer" => ResetAnswer,
        "reset_source" => ResetSource,
        "start_flashcards" => StartFlashcards,
        "start_quiz" => StartQuiz,
        "back" => Back,
        "english_first" => EnglishFirst,
        "hints" => Hints,
        "theme" => Theme,
        "export" => Export,
        "import" => Import,
        "reset_all" => ResetAll,
        "search" => Search,
        "help" => Help,
        _ => return None,
    })
}

pub fn default_keymap() -> HashMap<char, KeyAction> {
    use KeyAction::*;
    let mut m = HashMap::new();
    m.insert('m', ToggleLearned);
    m.insert('r', Review);
    m.insert(' ', Flip);
    m.insert('n', Next);
    m.insert('y', Knew);
    m.insert('x', ResetAnswer);
    m.insert('s', ResetSource);
    m.insert('f', StartFlashcards);
    m.insert('z', StartQuiz);
    m.insert('b', Back);
    m.insert('e', EnglishFirst);
    m.insert('i', Hints);
    m.insert('t', Theme);
    m.insert('E', Export);
    m.insert('I', Import);
    m.insert('R', ResetAll); // uppercase R
    m.insert('/', Search);
    m.insert('?', Help);
    m
}

/// Key bound to `action`, for on-screen hints.
pub fn key_for(keymap: &HashMap<char, KeyAction>, action: KeyAction) -> Option<char> {
    keymap
        .iter()
        .filter(|(_, bound)| **bound == action)
        .map(|(ch, _)| *ch)
        .min()
}
