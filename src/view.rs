//! Screen descriptions derived from content, progress, search and settings.
//!
//! Builders are pure: they read a [`ViewContext`] and return plain data that a
//! renderer turns into pixels or terminal cells. Actions a screen offers are
//! carried as [`Intent`]s so the renderer can hand them straight back to
//! [`crate::app::App::perform`].

use crate::action::Action;
use crate::content::{ContentStore, Example, Module, Question, StudyItem};
use crate::pool::{flashcard_pool, quiz_pool, source_module, Cursor};
use crate::progress::{ProgressKey, ProgressMap, Scope};
use crate::search::Query;
use crate::settings::DisplaySettings;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Modules,
    ModuleDetail(String),
    Signs,
    Rules,
    Vocab,
    Flashcards,
    Quiz,
    Progress,
}

impl Screen {
    /// Screens reachable from the navigation bar, in display order.
    pub const NAV: [Screen; 7] = [
        Screen::Modules,
        Screen::Signs,
        Screen::Rules,
        Screen::Vocab,
        Screen::Flashcards,
        Screen::Quiz,
        Screen::Progress,
    ];

    pub fn nav_label(&self) -> &'static str {
        match self {
            Self::Modules | Self::ModuleDetail(_) => "Learn",
            Self::Signs => "Signs",
            Self::Rules => "Rules",
            Self::Vocab => "Vocabulary",
            Self::Flashcards => "Flashcards",
            Self::Quiz => "Quiz",
            Self::Progress => "Progress",
        }
    }

    /// Index into [`Screen::NAV`]; module details belong to "Learn".
    pub fn nav_index(&self) -> usize {
        match self {
            Self::Modules | Self::ModuleDetail(_) => 0,
            Self::Signs => 1,
            Self::Rules => 2,
            Self::Vocab => 3,
            Self::Flashcards => 4,
            Self::Quiz => 5,
            Self::Progress => 6,
        }
    }
}

/// Everything a builder may read.
#[derive(Debug, Clone, Copy)]
pub struct ViewContext<'a> {
    pub content: &'a ContentStore,
    pub progress: &'a ProgressMap,
    pub search: &'a str,
    pub settings: DisplaySettings,
}

// ---------------- View data ----------------

/// A French/English pair already put in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bilingual {
    pub primary: String,
    pub secondary: String,
    pub hint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Apply(Action),
    Open(Screen),
    ExportProgress,
    ImportProgress,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewAction {
    pub label: String,
    pub intent: Intent,
    pub primary: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub id: String,
    pub title: String,
    pub subtitle: String,
    pub badge: String,
    /// `Some` for study items, `None` for modules and headers.
    pub learned: Option<bool>,
    pub text: Option<Bilingual>,
    pub example: Option<Bilingual>,
    pub actions: Vec<ViewAction>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub hint: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CardList {
    pub header: Option<Card>,
    pub cards: Vec<Card>,
    /// Set when no card survived filtering.
    pub empty: Option<Notice>,
    pub notice: Option<Notice>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face {
    Front,
    Back,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashcardView {
    pub item_id: String,
    pub position: usize,
    pub pool_size: usize,
    pub source: String,
    pub face: Face,
    pub text: Bilingual,
    pub actions: Vec<ViewAction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionState {
    Neutral,
    Correct,
    Wrong,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionView {
    pub index: usize,
    pub letter: char,
    pub text: Bilingual,
    pub is_correct: bool,
    pub is_chosen: bool,
    /// Neutral until answered; then the correct option and a wrong choice
    /// are both marked.
    pub state: OptionState,
    pub intent: Option<Intent>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizView {
    pub question_id: String,
    pub position: usize,
    pub pool_size: usize,
    pub tags: String,
    pub answered: bool,
    pub question: Bilingual,
    pub options: Vec<OptionView>,
    pub explanation: Option<Bilingual>,
    pub actions: Vec<ViewAction>,
}

impl QuizView {
    pub fn badge(&self) -> &'static str {
        if self.answered {
            "Answered"
        } else {
            "Open"
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressView {
    pub learned_items: usize,
    pub total_reviews: i64,
    pub quiz_answered: i64,
    pub accuracy_percent: i64,
    pub tools: Vec<ViewAction>,
    pub advice: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Cards(CardList),
    Flashcard(FlashcardView),
    Quiz(QuizView),
    Progress(ProgressView),
    Empty(Notice),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenView {
    pub screen: Screen,
    pub title: String,
    pub subtitle: String,
    pub body: Body,
}

// ---------------- Builders ----------------

pub fn build(screen: &Screen, ctx: &ViewContext<'_>) -> ScreenView {
    match screen {
        Screen::Modules => modules_view(ctx),
        Screen::ModuleDetail(id) => module_detail_view(ctx, id),
        Screen::Signs => category_view(
            ctx,
            Screen::Signs,
            "Road signs",
            "Learn sign meaning in French and English. Use search for speed.",
            ctx.content.signs.iter().map(StudyItem::Sign).collect(),
            "Try fewer keywords. Example: stop, priorité, interdit, danger.",
        ),
        Screen::Rules => category_view(
            ctx,
            Screen::Rules,
            "Rules",
            "Priority, speed, overtaking, parking, lights. FR with EN support.",
            ctx.content.rules.iter().map(StudyItem::Rule).collect(),
            "Try: priorité à droite, dépassement, stationnement, vitesse.",
        ),
        Screen::Vocab => category_view(
            ctx,
            Screen::Vocab,
            "Vocabulary",
            "High frequency exam words. Learn meaning and usage.",
            ctx.content.vocab.iter().map(StudyItem::Vocab).collect(),
            "Try: chaussée, dépassement, intersection, prioritaire.",
        ),
        Screen::Flashcards => flashcards_view(ctx),
        Screen::Quiz => quiz_view(ctx),
        Screen::Progress => progress_view(ctx),
    }
}

fn bilingual(settings: &DisplaySettings, fr: &str, en: &str, tip: Option<&str>) -> Bilingual {
    let (primary, secondary) = settings.order(fr, en);
    Bilingual {
        primary: primary.to_string(),
        secondary: secondary.to_string(),
        hint: tip
            .filter(|t| settings.show_hints && !t.trim().is_empty())
            .map(str::to_string),
    }
}

fn example_text(settings: &DisplaySettings, example: Option<&Example>) -> Option<Bilingual> {
    example.map(|ex| {
        bilingual(
            settings,
            ex.fr.as_deref().unwrap_or_default(),
            ex.en.as_deref().unwrap_or_default(),
            ex.tip.as_deref(),
        )
    })
}

fn apply(label: &str, action: Action, primary: bool) -> ViewAction {
    ViewAction {
        label: label.to_string(),
        intent: Intent::Apply(action),
        primary,
    }
}

fn open(label: &str, screen: Screen, primary: bool) -> ViewAction {
    ViewAction {
        label: label.to_string(),
        intent: Intent::Open(screen),
        primary,
    }
}

fn notice(title: &str, hint: &str) -> Notice {
    Notice {
        title: title.to_string(),
        hint: hint.to_string(),
    }
}

fn first_non_empty<'a>(candidates: &[&'a str]) -> &'a str {
    candidates
        .iter()
        .copied()
        .find(|s| !s.is_empty())
        .unwrap_or_default()
}

fn module_card(ctx: &ViewContext<'_>, module: &Module) -> Card {
    let s = &ctx.settings;
    let opened = ctx
        .progress
        .count(&ProgressKey::ModuleOpened(module.id.clone()));
    let (title, subtitle) = s.order(&module.title_fr, &module.title_en);
    Card {
        id: module.id.clone(),
        title: title.to_string(),
        subtitle: subtitle.to_string(),
        badge: if opened > 0 { "Started" } else { "New" }.to_string(),
        learned: None,
        text: Some(bilingual(
            s,
            &module.desc_fr,
            &module.desc_en,
            module.tip.as_deref(),
        )),
        example: None,
        actions: vec![
            open(
                "Open module",
                Screen::ModuleDetail(module.id.clone()),
                true,
            ),
            apply(
                "Mark as started",
                Action::OpenModule(module.id.clone()),
                false,
            ),
        ],
    }
}

/// Card for a sign, rule or vocabulary entry. `badge` is supplied by the
/// caller: the learned state in module details, the item label elsewhere.
fn item_card(ctx: &ViewContext<'_>, item: StudyItem<'_>, badge: String, review_label: &str) -> Card {
    let s = &ctx.settings;
    let learned = ctx.progress.is_learned(item.id());
    let (title_fr, title_en) = item.title();
    let (body_fr, body_en) = item.body();
    let (title, subtitle) = s.order(title_fr, title_en);
    Card {
        id: item.id().to_string(),
        title: title.to_string(),
        subtitle: subtitle.to_string(),
        badge,
        learned: Some(learned),
        text: Some(bilingual(
            s,
            first_non_empty(&[body_fr, title_fr]),
            first_non_empty(&[body_en, title_en]),
            item.tip(),
        )),
        example: example_text(s, item.example()),
        actions: vec![
            apply(
                if learned { "Unmark learned" } else { "Mark learned" },
                Action::ToggleLearned(item.id().to_string()),
                true,
            ),
            apply(review_label, Action::AddReview(item.id().to_string()), false),
        ],
    }
}

fn learned_badge(ctx: &ViewContext<'_>, id: &str) -> String {
    if ctx.progress.is_learned(id) {
        "Learned"
    } else {
        "To learn"
    }
    .to_string()
}

fn modules_view(ctx: &ViewContext<'_>) -> ScreenView {
    let cards = ctx
        .content
        .modules
        .iter()
        .map(|m| module_card(ctx, m))
        .collect();
    let notice = (!Query::new(ctx.search).is_empty()).then(|| {
        notice(
            "Search results",
            "Filtered by your search input. Use navigation to view categories.",
        )
    });
    ScreenView {
        screen: Screen::Modules,
        title: "Learn".into(),
        subtitle: "Pick a module. Study FR with EN support. Mark items as learned.".into(),
        body: Body::Cards(CardList {
            header: None,
            cards,
            empty: None,
            notice,
        }),
    }
}

fn module_detail_view(ctx: &ViewContext<'_>, id: &str) -> ScreenView {
    let screen = Screen::ModuleDetail(id.to_string());
    let Some(module) = ctx.content.find_module(id) else {
        return ScreenView {
            screen,
            title: "Module not found".into(),
            subtitle: format!("No module with id {id}."),
            body: Body::Empty(notice(
                "Module not found",
                "Go back to modules and pick another one.",
            )),
        };
    };
    let s = &ctx.settings;
    let (title, subtitle) = s.order(&module.title_fr, &module.title_en);

    let header = Card {
        id: module.id.clone(),
        title: title.to_string(),
        subtitle: subtitle.to_string(),
        badge: String::new(),
        learned: None,
        text: Some(bilingual(
            s,
            &module.desc_fr,
            &module.desc_en,
            module.tip.as_deref(),
        )),
        example: None,
        actions: vec![
            open("Back to modules", Screen::Modules, false),
            apply(
                "Study with flashcards",
                Action::StartFlashcards(module.id.clone()),
                true,
            ),
            apply(
                "Practice quiz",
                Action::StartQuiz(module.id.clone()),
                false,
            ),
        ],
    };

    let query = Query::new(ctx.search);
    let cards: Vec<Card> = ctx
        .content
        .items_for_module(module)
        .into_study_items()
        .into_iter()
        .filter(|it| query.matches(it))
        .map(|it| item_card(ctx, it, learned_badge(ctx, it.id()), "Add +1 review"))
        .collect();
    let empty = cards.is_empty().then(|| {
        notice(
            "No items found",
            "Clear search or choose another module.",
        )
    });

    ScreenView {
        screen,
        title: title.to_string(),
        subtitle: subtitle.to_string(),
        body: Body::Cards(CardList {
            header: Some(header),
            cards,
            empty,
            notice: None,
        }),
    }
}

fn category_view(
    ctx: &ViewContext<'_>,
    screen: Screen,
    title: &str,
    subtitle: &str,
    items: Vec<StudyItem<'_>>,
    empty_hint: &str,
) -> ScreenView {
    let query = Query::new(ctx.search);
    let cards: Vec<Card> = items
        .into_iter()
        .filter(|it| query.matches(it))
        .map(|it| item_card(ctx, it, it.label().to_string(), "Review +1"))
        .collect();
    let empty = cards.is_empty().then(|| notice("No results", empty_hint));
    ScreenView {
        screen,
        title: title.to_string(),
        subtitle: subtitle.to_string(),
        body: Body::Cards(CardList {
            header: None,
            cards,
            empty,
            notice: None,
        }),
    }
}

fn flashcards_view(ctx: &ViewContext<'_>) -> ScreenView {
    let s = &ctx.settings;
    let pool = flashcard_pool(ctx.content, ctx.progress, ctx.search);
    let body = match Cursor::current(ctx.progress, Scope::Flashcards, pool.len()) {
        None => Body::Empty(notice(
            "No flashcards available",
            "Clear search or open a module and choose Study with flashcards.",
        )),
        Some(cursor) => {
            let item = pool[cursor.index];
            let flipped = ctx.progress.count(&ProgressKey::FlashcardFlipped) == 1;
            let (title_fr, title_en) = item.title();
            let (body_fr, body_en) = item.body();
            let example = item.example();
            let example_fr = example.and_then(|e| e.fr.as_deref()).unwrap_or_default();
            let example_en = example.and_then(|e| e.en.as_deref()).unwrap_or_default();

            let text = if flipped {
                bilingual(
                    s,
                    first_non_empty(&[body_fr, example_fr, title_fr]),
                    first_non_empty(&[body_en, example_en, title_en]),
                    item.tip(),
                )
            } else {
                bilingual(s, title_fr, title_en, Some("Flip to read the explanation"))
            };
            let source = source_module(ctx.content, ctx.progress, Scope::Flashcards)
                .map_or_else(|| "all".to_string(), |m| m.id.clone());

            Body::Flashcard(FlashcardView {
                item_id: item.id().to_string(),
                position: cursor.position(),
                pool_size: cursor.len,
                source,
                face: if flipped { Face::Back } else { Face::Front },
                text,
                actions: vec![
                    apply(
                        if flipped { "Show front" } else { "Flip" },
                        Action::FlipFlashcard,
                        true,
                    ),
                    apply("Next", Action::NextFlashcard, false),
                    apply("I knew this", Action::MarkKnew(item.id().to_string()), false),
                    apply(
                        "Reset source",
                        Action::ClearSourceModule(Scope::Flashcards),
                        false,
                    ),
                ],
            })
        }
    };
    ScreenView {
        screen: Screen::Flashcards,
        title: "Flashcards".into(),
        subtitle: "Short review. Flip card. Track recall.".into(),
        body,
    }
}

fn option_views(ctx: &ViewContext<'_>, q: &Question, answered: bool) -> Vec<OptionView> {
    let chosen = ctx.progress.chosen(&q.id);
    q.options
        .iter()
        .enumerate()
        .map(|(idx, opt)| {
            let is_correct = idx == q.correct;
            let is_chosen = chosen == Some(idx);
            let state = match (answered, is_correct, is_chosen) {
                (true, true, _) => OptionState::Correct,
                (true, false, true) => OptionState::Wrong,
                _ => OptionState::Neutral,
            };
            OptionView {
                index: idx,
                letter: option_letter(idx),
                text: bilingual(&ctx.settings, &opt.fr, &opt.en, None),
                is_correct,
                is_chosen,
                state,
                intent: (!answered).then(|| {
                    Intent::Apply(Action::ChooseQuizOption {
                        question_id: q.id.clone(),
                        option: idx,
                    })
                }),
            }
        })
        .collect()
}

/// A, B, C, ... wrapping after Z.
fn option_letter(idx: usize) -> char {
    char::from(b'A' + (idx % 26) as u8)
}

fn quiz_view(ctx: &ViewContext<'_>) -> ScreenView {
    let s = &ctx.settings;
    let pool = quiz_pool(ctx.content, ctx.progress, ctx.search);
    let body = match Cursor::current(ctx.progress, Scope::Quiz, pool.len()) {
        None => Body::Empty(notice(
            "No questions available",
            "Clear search or open a module and choose Practice quiz.",
        )),
        Some(cursor) => {
            let q = pool[cursor.index];
            let answered = ctx.progress.is_answered(&q.id);
            Body::Quiz(QuizView {
                question_id: q.id.clone(),
                position: cursor.position(),
                pool_size: cursor.len,
                tags: q.tags.join(", "),
                answered,
                question: bilingual(s, &q.q_fr, &q.q_en, q.tip.as_deref()),
                options: option_views(ctx, q, answered),
                explanation: answered.then(|| {
                    bilingual(
                        s,
                        &q.explain_fr,
                        &q.explain_en,
                        Some("Focus on the rule. Not on guessing."),
                    )
                }),
                actions: vec![
                    apply("Next question", Action::NextQuestion, true),
                    apply("Reset answer", Action::ResetQuizAnswer(q.id.clone()), false),
                    apply("Reset source", Action::ClearSourceModule(Scope::Quiz), false),
                ],
            })
        }
    };
    ScreenView {
        screen: Screen::Quiz,
        title: "Quiz".into(),
        subtitle: "Practice exam style questions. Read FR. Confirm with EN.".into(),
        body,
    }
}

/// Dashboard totals, shared by the progress screen and the `stats` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Totals {
    pub learned_items: usize,
    pub total_reviews: i64,
    pub quiz_correct: i64,
    pub quiz_wrong: i64,
}

impl Totals {
    pub fn from_progress(progress: &ProgressMap) -> Self {
        let mut totals = Self {
            quiz_correct: progress.count(&ProgressKey::QuizCorrect),
            quiz_wrong: progress.count(&ProgressKey::QuizWrong),
            ..Self::default()
        };
        for (key, value) in progress.typed() {
            let n = value.as_count().unwrap_or(0);
            match key {
                ProgressKey::ItemLearned(_) if n > 0 => totals.learned_items += 1,
                ProgressKey::ItemReview(_) => {
                    totals.total_reviews = totals.total_reviews.saturating_add(n)
                }
                _ => {}
            }
        }
        totals
    }

    /// Counters come from importable files, so sums saturate.
    pub fn quiz_answered(&self) -> i64 {
        self.quiz_correct.saturating_add(self.quiz_wrong)
    }

    /// Rounded half up, clamped to 0..=100; 0 before any answer.
    pub fn accuracy_percent(&self) -> i64 {
        let correct = i128::from(self.quiz_correct.max(0));
        let total = correct + i128::from(self.quiz_wrong.max(0));
        if total == 0 {
            return 0;
        }
        let percent = (correct * 200 + total) / (2 * total);
        percent.clamp(0, 100) as i64
    }
}

fn progress_view(ctx: &ViewContext<'_>) -> ScreenView {
    let totals = Totals::from_progress(ctx.progress);
    let tool = |label: &str, intent: Intent| ViewAction {
        label: label.to_string(),
        intent,
        primary: false,
    };
    ScreenView {
        screen: Screen::Progress,
        title: "Progress".into(),
        subtitle: "Track learning and quiz performance.".into(),
        body: Body::Progress(ProgressView {
            learned_items: totals.learned_items,
            total_reviews: totals.total_reviews,
            quiz_answered: totals.quiz_answered(),
            accuracy_percent: totals.accuracy_percent(),
            tools: vec![
                tool("Export progress JSON", Intent::ExportProgress),
                tool("Import progress JSON", Intent::ImportProgress),
                tool("Reset all progress", Intent::Apply(Action::ResetAllProgress)),
            ],
            advice: vec![
                "Study a module. Mark items learned. Review flashcards. Practice quiz daily.".into(),
                "If French is hard, enable English first and read EN then FR.".into(),
            ],
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::fixtures;
    use crate::progress::ProgressValue;

    struct Fixture {
        content: ContentStore,
        progress: ProgressMap,
        settings: DisplaySettings,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                content: fixtures::store(),
                progress: ProgressMap::new(),
                settings: DisplaySettings::default(),
            }
        }

        fn set(&mut self, key: ProgressKey, value: i64) -> &mut Self {
            self.progress.insert(&key, ProgressValue::Count(value));
            self
        }

        fn view(&self, screen: Screen, search: &str) -> ScreenView {
            let ctx = ViewContext {
                content: &self.content,
                progress: &self.progress,
                search,
                settings: self.settings,
            };
            build(&screen, &ctx)
        }
    }

    fn cards(view: &ScreenView) -> &CardList {
        match &view.body {
            Body::Cards(list) => list,
            other => panic!("expected cards, got {other:?}"),
        }
    }

    #[test]
    fn modules_show_started_badge_and_search_notice() {
        let mut fx = Fixture::new();
        fx.set(ProgressKey::ModuleOpened("M1".into()), 2);
        let view = fx.view(Screen::Modules, "");
        let list = cards(&view);
        assert_eq!(list.cards[0].badge, "Started");
        assert_eq!(list.cards[1].badge, "New");
        assert!(list.notice.is_none());
        assert_eq!(
            list.cards[0].actions[0].intent,
            Intent::Open(Screen::ModuleDetail("M1".into()))
        );

        let view = fx.view(Screen::Modules, "stop");
        assert_eq!(cards(&view).cards.len(), 2);
        assert!(cards(&view).notice.is_some());
    }

    #[test]
    fn module_detail_lists_matching_items_with_learned_badges() {
        let mut fx = Fixture::new();
        fx.set(ProgressKey::ItemLearned("R1".into()), 1);
        let view = fx.view(Screen::ModuleDetail("M1".into()), "");
        assert_eq!(view.title, "Priorités");
        let list = cards(&view);
        assert_eq!(list.cards.len(), 1);
        let r1 = &list.cards[0];
        assert_eq!(r1.badge, "Learned");
        assert_eq!(r1.actions[0].label, "Unmark learned");
        assert_eq!(
            r1.example.as_ref().map(|e| e.primary.as_str()),
            Some("Au carrefour sans panneau")
        );
        assert!(list.header.is_some());
        assert!(list.empty.is_none());

        let view = fx.view(Screen::ModuleDetail("M1".into()), "vitesse");
        assert!(cards(&view).cards.is_empty());
        assert_eq!(cards(&view).empty.as_ref().unwrap().title, "No items found");
    }

    #[test]
    fn unknown_module_detail_is_empty_state() {
        let fx = Fixture::new();
        let view = fx.view(Screen::ModuleDetail("ghost".into()), "");
        assert!(matches!(view.body, Body::Empty(_)));
    }

    #[test]
    fn category_screens_filter_and_badge_by_label() {
        let fx = Fixture::new();
        let view = fx.view(Screen::Signs, "");
        let list = cards(&view);
        assert_eq!(list.cards.len(), 2);
        assert_eq!(list.cards[0].badge, "obligation");
        assert_eq!(list.cards[0].learned, Some(false));

        let view = fx.view(Screen::Rules, "priorite");
        assert_eq!(cards(&view).cards.len(), 1);

        let view = fx.view(Screen::Vocab, "nothing-like-this");
        assert_eq!(cards(&view).empty.as_ref().unwrap().title, "No results");
    }

    #[test]
    fn english_first_and_hints_control_bilingual_pairs() {
        let mut fx = Fixture::new();
        let view = fx.view(Screen::Signs, "stop");
        let text = cards(&view).cards[0].text.clone().unwrap();
        assert_eq!(text.primary, "Arrêt absolu");
        assert_eq!(text.hint.as_deref(), Some("Marquez l'arrêt"));

        fx.settings.english_first = true;
        fx.settings.show_hints = false;
        let view = fx.view(Screen::Signs, "stop");
        let card = &cards(&view).cards[0];
        let text = card.text.clone().unwrap();
        assert_eq!(text.primary, "Full stop");
        assert_eq!(text.secondary, "Arrêt absolu");
        assert_eq!(text.hint, None);
        // A sign without a tip never gets a hint.
        fx.settings.show_hints = true;
        let view = fx.view(Screen::Signs, "triangle");
        assert_eq!(cards(&view).cards[0].text.as_ref().unwrap().hint, None);
    }

    #[test]
    fn flashcard_front_and_back() {
        let mut fx = Fixture::new();
        fx.set(ProgressKey::Cursor(Scope::Flashcards), 7);
        let view = fx.view(Screen::Flashcards, "");
        let Body::Flashcard(card) = view.body else {
            panic!("expected a flashcard");
        };
        assert_eq!(card.position, 3);
        assert_eq!(card.pool_size, 5);
        assert_eq!(card.item_id, "R1");
        assert_eq!(card.face, Face::Front);
        assert_eq!(card.source, "all");
        assert_eq!(card.text.primary, "Priorité à droite");
        assert_eq!(card.actions[0].label, "Flip");

        fx.set(ProgressKey::FlashcardFlipped, 1);
        let Body::Flashcard(card) = fx.view(Screen::Flashcards, "").body else {
            panic!("expected a flashcard");
        };
        assert_eq!(card.face, Face::Back);
        assert_eq!(card.text.primary, "Cédez le passage à droite");
        assert_eq!(card.actions[0].label, "Show front");
    }

    #[test]
    fn flashcard_source_label_and_empty_pool() {
        let mut fx = Fixture::new();
        fx.progress.insert(
            &ProgressKey::SourceModule(Scope::Flashcards),
            ProgressValue::Text("M1".into()),
        );
        let Body::Flashcard(card) = fx.view(Screen::Flashcards, "").body else {
            panic!("expected a flashcard");
        };
        assert_eq!(card.source, "M1");
        assert_eq!(card.pool_size, 1);

        let view = fx.view(Screen::Flashcards, "nothing matches");
        assert!(matches!(view.body, Body::Empty(ref n) if n.title == "No flashcards available"));
    }

    #[test]
    fn quiz_marks_correct_and_wrong_choice_together() {
        let mut fx = Fixture::new();
        fx.set(ProgressKey::QuizAnswered("Q1".into()), 1)
            .set(ProgressKey::QuizChosen("Q1".into()), 0);
        let Body::Quiz(quiz) = fx.view(Screen::Quiz, "").body else {
            panic!("expected a quiz");
        };
        assert!(quiz.answered);
        assert_eq!(quiz.badge(), "Answered");
        let states: Vec<_> = quiz.options.iter().map(|o| o.state).collect();
        assert_eq!(
            states,
            vec![OptionState::Wrong, OptionState::Neutral, OptionState::Correct]
        );
        assert!(quiz.options[0].is_chosen && !quiz.options[0].is_correct);
        assert!(quiz.options.iter().all(|o| o.intent.is_none()));
        assert!(quiz.explanation.is_some());
        assert_eq!(quiz.options[2].letter, 'C');
    }

    #[test]
    fn open_question_offers_choices() {
        let mut fx = Fixture::new();
        fx.set(ProgressKey::Cursor(Scope::Quiz), 1);
        let Body::Quiz(quiz) = fx.view(Screen::Quiz, "").body else {
            panic!("expected a quiz");
        };
        assert_eq!(quiz.question_id, "Q2");
        assert_eq!(quiz.position, 2);
        assert_eq!(quiz.pool_size, 3);
        assert!(!quiz.answered);
        assert!(quiz.explanation.is_none());
        assert!(quiz.options.iter().all(|o| o.state == OptionState::Neutral));
        assert_eq!(
            quiz.options[1].intent,
            Some(Intent::Apply(Action::ChooseQuizOption {
                question_id: "Q2".into(),
                option: 1
            }))
        );
    }

    #[test]
    fn progress_dashboard_totals() {
        let mut fx = Fixture::new();
        fx.set(ProgressKey::ItemLearned("R1".into()), 1)
            .set(ProgressKey::ItemLearned("S1".into()), 0)
            .set(ProgressKey::ItemLearned("S2".into()), 3)
            .set(ProgressKey::ItemReview("R1".into()), 4)
            .set(ProgressKey::ItemReview("V1".into()), 1)
            .set(ProgressKey::QuizCorrect, 2)
            .set(ProgressKey::QuizWrong, 1);
        let Body::Progress(p) = fx.view(Screen::Progress, "").body else {
            panic!("expected progress");
        };
        assert_eq!(p.learned_items, 2);
        assert_eq!(p.total_reviews, 5);
        assert_eq!(p.quiz_answered, 3);
        assert_eq!(p.accuracy_percent, 67);
        assert_eq!(p.tools.len(), 3);
    }

    #[test]
    fn accuracy_is_zero_without_answers() {
        assert_eq!(Totals::default().accuracy_percent(), 0);
        let half = Totals {
            quiz_correct: 1,
            quiz_wrong: 1,
            ..Totals::default()
        };
        assert_eq!(half.accuracy_percent(), 50);
    }

    #[test]
    fn huge_imported_counters_do_not_overflow() {
        let map = ProgressMap::from_json(
            r#"{"quiz:correct": 9223372036854775807, "quiz:wrong": 1,
                "item:a:review": 9223372036854775807, "item:b:review": 1}"#,
        )
        .unwrap();
        let totals = Totals::from_progress(&map);
        assert_eq!(totals.total_reviews, i64::MAX);
        assert_eq!(totals.quiz_answered(), i64::MAX);
        assert_eq!(totals.accuracy_percent(), 100);

        let all_wrong = Totals {
            quiz_wrong: i64::MAX,
            ..Totals::default()
        };
        assert_eq!(all_wrong.accuracy_percent(), 0);
    }

    #[test]
    fn nav_indexes_line_up() {
        for (i, screen) in Screen::NAV.iter().enumerate() {
            assert_eq!(screen.nav_index(), i);
        }
        assert_eq!(Screen::ModuleDetail("M1".into()).nav_label(), "Learn");
    }
}
