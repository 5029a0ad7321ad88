//! Named mutations of the progress map.
//!
//! Each action reads the current progress, writes the new values through the
//! store (which persists them) and returns. The next view build sees the result.

use crate::content::ContentStore;
use crate::error::StorageError;
use crate::pool::{flashcard_pool, quiz_pool, Cursor};
use crate::progress::{ProgressKey, ProgressStore, ProgressValue, Scope};
use crate::storage::Storage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Bump `module:<id>:opened`.
    OpenModule(String),
    /// Flip `item:<id>:learned` between 0 and 1.
    ToggleLearned(String),
    AddReview(String),
    /// Narrow flashcards to a module and rewind.
    StartFlashcards(String),
    /// Narrow the quiz to a module and rewind.
    StartQuiz(String),
    FlipFlashcard,
    /// Advance, turn the card face down, count a review for the card just seen.
    NextFlashcard,
    /// "I knew this": the item becomes learned.
    MarkKnew(String),
    /// Lock in an answer. Ignored once the question is answered.
    ChooseQuizOption { question_id: String, option: usize },
    NextQuestion,
    ResetQuizAnswer(String),
    ClearSourceModule(Scope),
    /// Destructive; callers confirm with the user first.
    ResetAllProgress,
}

/// Applies `action`. `search` is the active query, needed wherever the
/// current pool decides the outcome.
pub fn dispatch<S: Storage>(
    action: &Action,
    progress: &mut ProgressStore<S>,
    content: &ContentStore,
    search: &str,
) -> Result<(), StorageError> {
    tracing::debug!(?action, "dispatch");
    match action {
        Action::OpenModule(id) => {
            progress.increment(&ProgressKey::ModuleOpened(id.clone()), 1)?;
        }
        Action::ToggleLearned(id) => {
            let key = ProgressKey::ItemLearned(id.clone());
            let next = if progress.get(&key) == 0 { 1 } else { 0 };
            progress.set(&key, next)?;
        }
        Action::AddReview(id) => {
            progress.increment(&ProgressKey::ItemReview(id.clone()), 1)?;
        }
        Action::StartFlashcards(module) => progress.update(|map| {
            map.insert(
                &ProgressKey::SourceModule(Scope::Flashcards),
                ProgressValue::Text(module.clone()),
            );
            map.insert(&ProgressKey::Cursor(Scope::Flashcards), ProgressValue::Count(0));
            map.insert(&ProgressKey::FlashcardFlipped, ProgressValue::Count(0));
        })?,
        Action::StartQuiz(module) => progress.update(|map| {
            map.insert(
                &ProgressKey::SourceModule(Scope::Quiz),
                ProgressValue::Text(module.clone()),
            );
            map.insert(&ProgressKey::Cursor(Scope::Quiz), ProgressValue::Count(0));
        })?,
        Action::FlipFlashcard => {
            let flipped = progress.get(&ProgressKey::FlashcardFlipped) == 1;
            progress.set(&ProgressKey::FlashcardFlipped, if flipped { 0 } else { 1 })?;
        }
        Action::NextFlashcard => {
            let step = {
                let pool = flashcard_pool(content, progress.map(), search);
                Cursor::current(progress.map(), Scope::Flashcards, pool.len())
                    .map(|cursor| (cursor.next(), pool[cursor.index].id().to_string()))
            };
            let Some((next, seen)) = step else {
                tracing::debug!("flashcard pool is empty, nothing to advance");
                return Ok(());
            };
            progress.update(|map| {
                map.insert(
                    &ProgressKey::Cursor(Scope::Flashcards),
                    ProgressValue::Count(next.index as i64),
                );
                map.insert(&ProgressKey::FlashcardFlipped, ProgressValue::Count(0));
                map.increment(&ProgressKey::ItemReview(seen), 1);
            })?;
        }
        Action::MarkKnew(id) => {
            progress.set(&ProgressKey::ItemLearned(id.clone()), 1)?;
        }
        Action::ChooseQuizOption {
            question_id,
            option,
        } => {
            let Some(question) = content.find_question(question_id) else {
                tracing::warn!(%question_id, "answer for unknown question ignored");
                return Ok(());
            };
            if progress.map().is_answered(question_id) {
                return Ok(());
            }
            if *option >= question.options.len() {
                tracing::warn!(%question_id, option, "answer index out of range ignored");
                return Ok(());
            }
            let tally = if *option == question.correct {
                ProgressKey::QuizCorrect
            } else {
                ProgressKey::QuizWrong
            };
            progress.update(|map| {
                map.insert(
                    &ProgressKey::QuizChosen(question_id.clone()),
                    ProgressValue::Count(*option as i64),
                );
                map.insert(
                    &ProgressKey::QuizAnswered(question_id.clone()),
                    ProgressValue::Count(1),
                );
                map.increment(&tally, 1);
            })?;
        }
        Action::NextQuestion => {
            let len = quiz_pool(content, progress.map(), search).len();
            if let Some(cursor) = Cursor::current(progress.map(), Scope::Quiz, len) {
                progress.set(&ProgressKey::Cursor(Scope::Quiz), cursor.next().index as i64)?;
            }
        }
        Action::ResetQuizAnswer(id) => {
            progress.update(|map| {
                map.remove(&ProgressKey::QuizAnswered(id.clone()));
                map.remove(&ProgressKey::QuizChosen(id.clone()));
            })?;
        }
        Action::ClearSourceModule(scope) => {
            progress.delete(&ProgressKey::SourceModule(*scope))?;
        }
        Action::ResetAllProgress => progress.reset()?,
    }
    Ok(())
}
