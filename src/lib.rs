//! Core of a bilingual (French/English) driving-theory study tool.
//!
//! Static content (modules, signs, rules, vocabulary, questions) is loaded once;
//! all mutable study state lives in a flat progress map. Screens are pure
//! functions of content, progress, search text and display settings.

pub mod action;
pub mod app;
pub mod content;
pub mod error;
pub mod pool;
pub mod progress;
pub mod search;
pub mod settings;
pub mod storage;
pub mod view;

pub use action::{dispatch, Action};
pub use app::{App, Followup, EXPORT_FILE_NAME};
pub use content::{ContentSource, ContentStore, DirSource, MemorySource};
pub use error::{AppError, ImportError, LoadError, StorageError};
pub use progress::{ProgressKey, ProgressMap, ProgressStore, ProgressValue, Scope};
pub use settings::{DisplaySettings, ThemeKind};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use view::{Intent, Screen, ScreenView};
