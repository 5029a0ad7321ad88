//! Display settings, stored next to (but separately from) progress.

use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::storage::{Storage, ENGLISH_FIRST_KEY, HINTS_KEY, THEME_KEY};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeKind {
    #[default]
    Dark,
    Light,
}

impl ThemeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }
}

/// Ordering and visibility only; never changes what is filtered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplaySettings {
    pub english_first: bool,
    pub show_hints: bool,
    pub theme: ThemeKind,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            english_first: false,
            show_hints: true,
            theme: ThemeKind::Dark,
        }
    }
}

impl DisplaySettings {
    /// Hints stay on unless explicitly stored as "0"; any theme other than
    /// "light" is dark.
    pub fn load(storage: &impl Storage) -> Self {
        let english_first = storage.get(ENGLISH_FIRST_KEY).as_deref() == Some("1");
        let show_hints = storage.get(HINTS_KEY).as_deref() != Some("0");
        let theme = match storage.get(THEME_KEY).as_deref() {
            Some("light") => ThemeKind::Light,
            _ => ThemeKind::Dark,
        };
        Self {
            english_first,
            show_hints,
            theme,
        }
    }

    pub fn save(&self, storage: &mut impl Storage) -> Result<(), StorageError> {
        storage.set(ENGLISH_FIRST_KEY, flag(self.english_first))?;
        storage.set(HINTS_KEY, flag(self.show_hints))?;
        storage.set(THEME_KEY, self.theme.as_str())
    }

    /// Orders a French/English pair for display.
    pub fn order<'a>(&self, fr: &'a str, en: &'a str) -> (&'a str, &'a str) {
        if self.english_first {
            (en, fr)
        } else {
            (fr, en)
        }
    }
}

fn flag(on: bool) -> &'static str {
    if on {
        "1"
    } else {
        "0"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[test]
    fn defaults_when_nothing_stored() {
        let settings = DisplaySettings::load(&MemoryStorage::new());
        assert_eq!(settings, DisplaySettings::default());
        assert!(settings.show_hints);
    }

    #[test]
    fn save_then_load() {
        let mut storage = MemoryStorage::new();
        let settings = DisplaySettings {
            english_first: true,
            show_hints: false,
            theme: ThemeKind::Light,
        };
        settings.save(&mut storage).unwrap();
        assert_eq!(DisplaySettings::load(&storage), settings);
    }

    #[test]
    fn english_first_swaps_pairs() {
        let mut settings = DisplaySettings::default();
        assert_eq!(settings.order("Arrêt", "Stop"), ("Arrêt", "Stop"));
        settings.english_first = true;
        assert_eq!(settings.order("Arrêt", "Stop"), ("Stop", "Arrêt"));
    }

    #[test]
    fn unknown_hint_values_keep_hints_on() {
        let storage = MemoryStorage::new()
            .with_entry(HINTS_KEY, "yes")
            .with_entry(THEME_KEY, "sepia");
        let settings = DisplaySettings::load(&storage);
        assert!(settings.show_hints);
        assert_eq!(settings.theme, ThemeKind::Dark);
    }
}
