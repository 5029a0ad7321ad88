//! Candidate lists the flashcard and quiz screens cycle through.

use crate::content::{shares_tag, ContentStore, Module, Question, StudyItem};
use crate::progress::{ProgressKey, ProgressMap, Scope};
use crate::search::Query;

/// The module a scope is currently narrowed to, if it still exists.
pub fn source_module<'a>(
    content: &'a ContentStore,
    progress: &ProgressMap,
    scope: Scope,
) -> Option<&'a Module> {
    let id = progress.text(&ProgressKey::SourceModule(scope))?;
    let module = content.find_module(id);
    if module.is_none() {
        tracing::debug!(scope = scope.as_str(), id, "source module not found, using full pool");
    }
    module
}

/// Signs, rules then vocabulary, optionally narrowed to the flashcard source
/// module, then to the search query.
pub fn flashcard_pool<'a>(
    content: &'a ContentStore,
    progress: &ProgressMap,
    search: &str,
) -> Vec<StudyItem<'a>> {
    let items = match source_module(content, progress, Scope::Flashcards) {
        Some(module) => content.items_for_module(module).into_study_items(),
        None => content.all_items(),
    };
    let query = Query::new(search);
    items.into_iter().filter(|it| query.matches(it)).collect()
}

/// All questions, optionally narrowed by tag to the quiz source module, then
/// to the search query.
pub fn quiz_pool<'a>(
    content: &'a ContentStore,
    progress: &ProgressMap,
    search: &str,
) -> Vec<&'a Question> {
    let module = source_module(content, progress, Scope::Quiz);
    let query = Query::new(search);
    content
        .questions
        .iter()
        .filter(|q| module.map_or(true, |m| shares_tag(&q.tags, &m.tags)))
        .filter(|q| query.matches(*q))
        .collect()
}

/// Position inside a pool. Only exists for non-empty pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub index: usize,
    pub len: usize,
}

impl Cursor {
    /// Wraps a stored cursor into `0..len`; `None` when `len` is zero.
    pub fn resolve(stored: i64, len: usize) -> Option<Self> {
        if len == 0 {
            return None;
        }
        let index = stored.rem_euclid(len as i64) as usize;
        Some(Self { index, len })
    }

    pub fn current(progress: &ProgressMap, scope: Scope, len: usize) -> Option<Self> {
        Self::resolve(progress.count(&ProgressKey::Cursor(scope)), len)
    }

    pub fn next(self) -> Self {
        Self {
            index: (self.index + 1) % self.len,
            len: self.len,
        }
    }

    /// 1-based position for display.
    pub fn position(&self) -> usize {
        self.index + 1
    }
}
