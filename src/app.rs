//! Application state: content, progress, settings, search text and the
//! current screen, owned in one place and driven by [`Intent`]s.

use std::path::{Path, PathBuf};

use crate::action::{dispatch, Action};
use crate::content::{ContentSource, ContentStore};
use crate::error::{AppError, ImportError, StorageError};
use crate::progress::ProgressStore;
use crate::settings::{DisplaySettings, ThemeKind};
use crate::storage::Storage;
use crate::view::{build, Intent, Screen, ScreenView, ViewContext};

/// Default file name offered for progress exports.
pub const EXPORT_FILE_NAME: &str = "code-route-progress.json";

/// What the front-end still has to do after an intent was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Followup {
    None,
    /// Pick a destination and call [`App::export_to`].
    Export,
    /// Pick a file and call [`App::import_from`].
    Import,
}

#[derive(Debug)]
pub struct App<S: Storage> {
    content: ContentStore,
    progress: ProgressStore<S>,
    settings: DisplaySettings,
    search: String,
    screen: Screen,
}

impl<S: Storage> App<S> {
    /// Settings and progress are both read from `storage`.
    pub fn new(content: ContentStore, storage: S) -> Self {
        let settings = DisplaySettings::load(&storage);
        Self {
            content,
            progress: ProgressStore::open(storage),
            settings,
            search: String::new(),
            screen: Screen::Modules,
        }
    }

    pub fn load(source: &impl ContentSource, storage: S) -> Result<Self, AppError> {
        Ok(Self::new(ContentStore::load(source)?, storage))
    }

    pub fn content(&self) -> &ContentStore {
        &self.content
    }

    pub fn progress(&self) -> &ProgressStore<S> {
        &self.progress
    }

    pub fn settings(&self) -> DisplaySettings {
        self.settings
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn view(&self) -> ScreenView {
        let ctx = ViewContext {
            content: &self.content,
            progress: self.progress.map(),
            search: &self.search,
            settings: self.settings,
        };
        build(&self.screen, &ctx)
    }

    pub fn set_search(&mut self, text: impl Into<String>) {
        self.search = text.into();
    }

    pub fn perform(&mut self, intent: &Intent) -> Result<Followup, AppError> {
        match intent {
            Intent::Apply(action) => self.apply(action)?,
            Intent::Open(screen) => self.navigate(screen.clone())?,
            Intent::ExportProgress => return Ok(Followup::Export),
            Intent::ImportProgress => return Ok(Followup::Import),
        }
        Ok(Followup::None)
    }

    /// Opening a module detail counts as opening the module.
    pub fn navigate(&mut self, screen: Screen) -> Result<(), AppError> {
        if let Screen::ModuleDetail(id) = &screen {
            self.dispatch(&Action::OpenModule(id.clone()))?;
        }
        tracing::debug!(?screen, "navigate");
        self.screen = screen;
        Ok(())
    }

    /// Runs an action; starting flashcards or a quiz also switches screen.
    pub fn apply(&mut self, action: &Action) -> Result<(), AppError> {
        self.dispatch(action)?;
        match action {
            Action::StartFlashcards(_) => self.screen = Screen::Flashcards,
            Action::StartQuiz(_) => self.screen = Screen::Quiz,
            _ => {}
        }
        Ok(())
    }

    fn dispatch(&mut self, action: &Action) -> Result<(), StorageError> {
        dispatch(action, &mut self.progress, &self.content, &self.search)
    }

    // ---------------- Settings ----------------

    pub fn toggle_english_first(&mut self) -> Result<(), StorageError> {
        self.settings.english_first = !self.settings.english_first;
        self.save_settings()
    }

    pub fn toggle_hints(&mut self) -> Result<(), StorageError> {
        self.settings.show_hints = !self.settings.show_hints;
        self.save_settings()
    }

    pub fn toggle_theme(&mut self) -> Result<(), StorageError> {
        self.set_theme(self.settings.theme.toggled())
    }

    pub fn set_theme(&mut self, theme: ThemeKind) -> Result<(), StorageError> {
        self.settings.theme = theme;
        self.save_settings()
    }

    fn save_settings(&mut self) -> Result<(), StorageError> {
        self.settings.save(self.progress.storage_mut())
    }

    // ---------------- Files ----------------

    /// Writes the progress map as pretty JSON. A directory target gets
    /// [`EXPORT_FILE_NAME`] appended. Returns the file written.
    pub fn export_to(&self, target: &Path) -> Result<PathBuf, StorageError> {
        let path = if target.is_dir() {
            target.join(EXPORT_FILE_NAME)
        } else {
            target.to_path_buf()
        };
        self.progress.export_to(&path)?;
        Ok(path)
    }

    /// Replaces progress with the file's contents; on error nothing changes.
    pub fn import_from(&mut self, path: &Path) -> Result<(), ImportError> {
        self.progress.import_from(path)
    }
}
