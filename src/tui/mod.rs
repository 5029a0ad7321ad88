//! Terminal front-end. Draws whatever [`ScreenView`] the app builds and turns
//! keys into the intents that view offers.

mod draw;
pub mod keymap;
pub mod theme;

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use code_route::action::Action;
use code_route::app::{App, Followup};
use code_route::storage::Storage;
use code_route::view::{Body, Intent, Screen, ScreenView, ViewAction};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, style::Style, widgets::ListState, Terminal};
use tui_textarea::TextArea;

use keymap::KeyAction;
use theme::{theme_of, Theme};

enum Popup {
    ConfirmReset,
    Import(TextArea<'static>),
    Help,
}

pub struct Tui<S: Storage> {
    app: App<S>,
    theme: Theme,
    keymap: HashMap<char, KeyAction>,
    selected: ListState,
    search: TextArea<'static>,
    searching: bool,
    popup: Option<Popup>,
    status: Option<String>,
    export_dir: PathBuf,
}

impl<S: Storage> Tui<S> {
    pub fn new(app: App<S>, keymap: HashMap<char, KeyAction>, export_dir: PathBuf) -> Self {
        let theme = theme_of(app.settings().theme);
        let mut selected = ListState::default();
        selected.select(Some(0));
        Self {
            app,
            theme,
            keymap,
            selected,
            search: single_line_input(),
            searching: false,
            popup: None,
            status: None,
            export_dir,
        }
    }

    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let res = self.event_loop(&mut terminal);

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;
        res
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        loop {
            terminal.draw(|f| draw::ui(f, self))?;
            if event::poll(Duration::from_millis(200))? {
                if let Event::Key(k) = event::read()? {
                    if k.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(k) {
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    /// Returns true when the user asked to quit. Errors end up in the
    /// status line, never in a crash.
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        match self.dispatch_key(key) {
            Ok(quit) => quit,
            Err(err) => {
                tracing::error!("{err:#}");
                self.status = Some(format!("Error: {err:#}"));
                false
            }
        }
    }

    fn dispatch_key(&mut self, key: KeyEvent) -> Result<bool> {
        if let Some(popup) = self.popup.take() {
            self.popup_key(popup, key)?;
            return Ok(false);
        }
        if self.searching {
            self.search_key(key);
            return Ok(false);
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Ok(true);
        }
        self.status = None;
        match key.code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Esc => {
                if matches!(self.app.screen(), Screen::ModuleDetail(_)) {
                    self.run_intent(Intent::Open(Screen::Modules))?;
                } else if !self.app.search().is_empty() {
                    self.clear_search();
                }
            }
            KeyCode::Tab => self.cycle_screen(1)?,
            KeyCode::BackTab => self.cycle_screen(Screen::NAV.len() - 1)?,
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(1),
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1),
            KeyCode::Enter => {
                if let Some(intent) = self.enter_intent() {
                    self.run_intent(intent)?;
                }
            }
            KeyCode::Char(c @ '1'..='7') => {
                let idx = c as usize - '1' as usize;
                self.run_intent(Intent::Open(Screen::NAV[idx].clone()))?;
            }
            KeyCode::Char(c) => {
                if let Some(action) = self.keymap.get(&c).copied() {
                    self.key_action(action)?;
                }
            }
            _ => {}
        }
        Ok(false)
    }

    fn key_action(&mut self, action: KeyAction) -> Result<()> {
        match action {
            KeyAction::EnglishFirst => {
                self.app.toggle_english_first()?;
                let order = if self.app.settings().english_first {
                    "English first"
                } else {
                    "French first"
                };
                self.status = Some(order.into());
            }
            KeyAction::Hints => {
                self.app.toggle_hints()?;
                let hints = if self.app.settings().show_hints {
                    "Hints on"
                } else {
                    "Hints off"
                };
                self.status = Some(hints.into());
            }
            KeyAction::Theme => {
                self.app.toggle_theme()?;
                self.theme = theme_of(self.app.settings().theme);
            }
            KeyAction::Search => self.searching = true,
            KeyAction::Help => self.popup = Some(Popup::Help),
            KeyAction::Export => self.run_intent(Intent::ExportProgress)?,
            KeyAction::Import => self.run_intent(Intent::ImportProgress)?,
            KeyAction::ResetAll => self.run_intent(Intent::Apply(Action::ResetAllProgress))?,
            _ => {
                let view = self.app.view();
                match find_intent(&view, self.selected.selected(), action) {
                    Some(intent) => self.run_intent(intent)?,
                    None => {
                        self.status = Some(format!("Not available here: {}", action.describe()))
                    }
                }
            }
        }
        Ok(())
    }

    /// Resetting everything always goes through a confirmation popup.
    fn run_intent(&mut self, intent: Intent) -> Result<()> {
        if intent == Intent::Apply(Action::ResetAllProgress) {
            self.popup = Some(Popup::ConfirmReset);
            return Ok(());
        }
        let before = self.app.screen().clone();
        match self.app.perform(&intent)? {
            Followup::None => {}
            Followup::Export => {
                let path = self.app.export_to(&self.export_dir)?;
                self.status = Some(format!("Exported to {}", path.display()));
            }
            Followup::Import => {
                let mut input = single_line_input();
                input.set_placeholder_text("path to progress JSON");
                self.popup = Some(Popup::Import(input));
            }
        }
        if *self.app.screen() != before {
            self.selected.select(Some(0));
        }
        Ok(())
    }

    fn popup_key(&mut self, popup: Popup, key: KeyEvent) -> Result<()> {
        match popup {
            Popup::ConfirmReset => {
                if matches!(key.code, KeyCode::Char('y' | 'Y')) {
                    self.app.apply(&Action::ResetAllProgress)?;
                    self.selected.select(Some(0));
                    self.status = Some("All progress reset.".into());
                } else {
                    self.status = Some("Reset cancelled.".into());
                }
            }
            Popup::Import(mut input) => match key.code {
                KeyCode::Esc => self.status = Some("Import cancelled.".into()),
                KeyCode::Enter => {
                    let raw = input.lines().join("");
                    let path = PathBuf::from(raw.trim());
                    self.status = Some(match self.app.import_from(&path) {
                        Ok(()) => "Progress imported.".into(),
                        Err(err) => {
                            tracing::warn!("import from {} failed: {err}", path.display());
                            err.user_message()
                        }
                    });
                }
                _ => {
                    input.input(key);
                    self.popup = Some(Popup::Import(input));
                }
            },
            Popup::Help => {}
        }
        Ok(())
    }

    fn search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.clear_search();
                self.searching = false;
            }
            KeyCode::Enter => self.searching = false,
            _ => {
                if self.search.input(key) {
                    self.app.set_search(self.search.lines().join(""));
                    self.selected.select(Some(0));
                }
            }
        }
    }

    fn clear_search(&mut self) {
        self.search = single_line_input();
        self.app.set_search("");
        self.selected.select(Some(0));
    }

    fn cycle_screen(&mut self, step: usize) -> Result<()> {
        let idx = (self.app.screen().nav_index() + step) % Screen::NAV.len();
        self.run_intent(Intent::Open(Screen::NAV[idx].clone()))
    }

    fn move_selection(&mut self, delta: isize) {
        let len = selectable_len(&self.app.view());
        if len == 0 {
            self.selected.select(None);
            return;
        }
        let cur = self.selected.selected().unwrap_or(0) as isize;
        let next = (cur + delta).clamp(0, len as isize - 1);
        self.selected.select(Some(next as usize));
    }

    fn clamp_selection(&mut self, view: &ScreenView) {
        let sel = match (selectable_len(view), self.selected.selected()) {
            (0, _) => None,
            (n, Some(i)) => Some(i.min(n - 1)),
            (_, None) => Some(0),
        };
        self.selected.select(sel);
    }

    fn enter_intent(&self) -> Option<Intent> {
        let view = self.app.view();
        let idx = self.selected.selected().unwrap_or(0);
        match &view.body {
            Body::Cards(list) => list.cards.get(idx).and_then(|c| primary(&c.actions)),
            Body::Quiz(quiz) => quiz
                .options
                .get(idx)
                .and_then(|o| o.intent.clone())
                .or_else(|| primary(&quiz.actions)),
            Body::Flashcard(card) => primary(&card.actions),
            Body::Progress(p) => p.tools.get(idx).map(|t| t.intent.clone()),
            Body::Empty(_) => None,
        }
    }
}

fn single_line_input() -> TextArea<'static> {
    let mut t = TextArea::default();
    t.set_cursor_line_style(Style::default());
    t
}

/// Rows the selection moves over: cards, quiz options or progress tools.
fn selectable_len(view: &ScreenView) -> usize {
    match &view.body {
        Body::Cards(list) => list.cards.len(),
        Body::Quiz(quiz) => quiz.options.len(),
        Body::Progress(p) => p.tools.len(),
        Body::Flashcard(_) | Body::Empty(_) => 0,
    }
}

fn primary(actions: &[ViewAction]) -> Option<Intent> {
    actions
        .iter()
        .find(|a| a.primary)
        .or_else(|| actions.first())
        .map(|a| a.intent.clone())
}

/// Looks for an intent the key accepts: first on the selected card, then on
/// the screen-level actions.
fn find_intent(view: &ScreenView, selected: Option<usize>, action: KeyAction) -> Option<Intent> {
    let idx = selected.unwrap_or(0);
    let groups: Vec<&[ViewAction]> = match &view.body {
        Body::Cards(list) => list
            .cards
            .get(idx)
            .map(|c| c.actions.as_slice())
            .into_iter()
            .chain(list.header.as_ref().map(|h| h.actions.as_slice()))
            .collect(),
        Body::Flashcard(card) => vec![card.actions.as_slice()],
        Body::Quiz(quiz) => vec![quiz.actions.as_slice()],
        Body::Progress(p) => vec![p.tools.as_slice()],
        Body::Empty(_) => vec![],
    };
    groups
        .into_iter()
        .flatten()
        .find(|a| action.accepts(&a.intent))
        .map(|a| a.intent.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use code_route::content::MemorySource;
    use code_route::storage::MemoryStorage;
    use code_route::ProgressKey;

    const MODULES: &str = r#"[
        {"id":"M1","title_fr":"Priorités","title_en":"Right of way","desc_fr":"Qui passe","desc_en":"Who goes","includes":["rules"],"tags":["priority"]}
    ]"#;
    const SIGNS: &str = r#"[
        {"id":"S1","title_fr":"Stop","title_en":"Stop","fr":"Arrêt","en":"Stop","category":"obligation","tags":["signs"]},
        {"id":"S2","title_fr":"Danger","title_en":"Danger","fr":"Triangle","en":"Triangle","category":"danger","tags":["danger"]}
    ]"#;
    const RULES: &str = r#"[
        {"id":"R1","title_fr":"Priorité à droite","title_en":"Priority to the right","fr":"Cédez à droite","en":"Yield right","topic":"priority","tags":["priority"]}
    ]"#;
    const QUESTIONS: &str = r#"[
        {"id":"Q1","q_fr":"Qui passe ?","q_en":"Who goes?","options":[{"fr":"Moi","en":"Me"},{"fr":"À droite","en":"Right"}],"correct":1,"tags":["priority"]}
    ]"#;

    fn tui() -> Tui<MemoryStorage> {
        let source = MemorySource::new()
            .with("modules", MODULES)
            .with("signs", SIGNS)
            .with("rules", RULES)
            .with("vocab", "[]")
            .with("questions", QUESTIONS);
        let app = App::load(&source, MemoryStorage::new()).unwrap();
        Tui::new(app, keymap::default_keymap(), std::env::temp_dir())
    }

    fn press(tui: &mut Tui<MemoryStorage>, keys: &str) {
        for c in keys.chars() {
            assert!(!tui.handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)));
        }
    }

    fn code(tui: &mut Tui<MemoryStorage>, code: KeyCode) {
        tui.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn count(tui: &Tui<MemoryStorage>, key: ProgressKey) -> i64 {
        tui.app.progress().get(&key)
    }

    #[test]
    fn enter_opens_module_and_esc_goes_back() {
        let mut tui = tui();
        code(&mut tui, KeyCode::Enter);
        assert_eq!(tui.app.screen(), &Screen::ModuleDetail("M1".into()));
        assert_eq!(count(&tui, ProgressKey::ModuleOpened("M1".into())), 1);
        code(&mut tui, KeyCode::Esc);
        assert_eq!(tui.app.screen(), &Screen::Modules);
    }

    #[test]
    fn learned_key_targets_selected_card() {
        let mut tui = tui();
        press(&mut tui, "2jm");
        assert_eq!(tui.app.screen(), &Screen::Signs);
        assert!(!tui.app.progress().map().is_learned("S1"));
        assert!(tui.app.progress().map().is_learned("S2"));
    }

    #[test]
    fn reset_requires_confirmation() {
        let mut tui = tui();
        press(&mut tui, "2r");
        assert_eq!(count(&tui, ProgressKey::ItemReview("S1".into())), 1);

        press(&mut tui, "Rn");
        assert_eq!(count(&tui, ProgressKey::ItemReview("S1".into())), 1);
        assert_eq!(tui.status.as_deref(), Some("Reset cancelled."));

        press(&mut tui, "Ry");
        assert!(tui.app.progress().map().is_empty());
    }

    #[test]
    fn typing_in_search_filters_and_esc_clears() {
        let mut tui = tui();
        press(&mut tui, "2/dan");
        assert_eq!(tui.app.search(), "dan");
        code(&mut tui, KeyCode::Enter);
        assert!(!tui.searching);
        let Body::Cards(list) = tui.app.view().body else {
            panic!("expected cards");
        };
        assert_eq!(list.cards.len(), 1);

        code(&mut tui, KeyCode::Esc);
        assert_eq!(tui.app.search(), "");
    }

    #[test]
    fn enter_answers_selected_quiz_option() {
        let mut tui = tui();
        press(&mut tui, "6j");
        code(&mut tui, KeyCode::Enter);
        assert!(tui.app.progress().map().is_answered("Q1"));
        assert_eq!(count(&tui, ProgressKey::QuizCorrect), 1);
    }

    #[test]
    fn failed_import_reports_user_message() {
        let mut tui = tui();
        press(&mut tui, "I");
        assert!(matches!(tui.popup, Some(Popup::Import(_))));
        press(&mut tui, "/no/such/file.json");
        code(&mut tui, KeyCode::Enter);
        assert!(tui.popup.is_none());
        assert!(tui.status.as_deref().unwrap_or_default().starts_with("Could not read"));
    }

    #[test]
    fn unavailable_key_sets_status() {
        let mut tui = tui();
        press(&mut tui, " ");
        assert_eq!(
            tui.status.as_deref(),
            Some("Not available here: flip flashcard")
        );
    }
}
