//! End-to-end study sessions against the bundled `data/` content.

use std::fs;
use std::path::PathBuf;

use code_route::view::Body;
use code_route::{
    Action, App, DirSource, FileStorage, ImportError, MemoryStorage, ProgressKey, Scope, Screen,
};

fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data")
}

fn app() -> App<MemoryStorage> {
    App::load(&DirSource::new(data_dir()), MemoryStorage::new()).unwrap()
}

fn card_ids(app: &App<MemoryStorage>) -> Vec<String> {
    match app.view().body {
        Body::Cards(list) => list.cards.into_iter().map(|c| c.id).collect(),
        other => panic!("expected cards, got {other:?}"),
    }
}

#[test]
fn bundled_content_loads() {
    let app = app();
    let content = app.content();
    assert_eq!(content.modules.len(), 3);
    assert!(content.find_question("q-right").is_some());
    assert_eq!(card_ids(&app).len(), 3);
}

#[test]
fn module_detail_groups_by_tag_and_counts_opens() {
    let mut app = app();
    app.navigate(Screen::ModuleDetail("mod-priority".into())).unwrap();
    app.navigate(Screen::ModuleDetail("mod-priority".into())).unwrap();
    assert_eq!(
        card_ids(&app),
        [
            "sign-ab4",
            "sign-ab3a",
            "rule-right",
            "rule-roundabout",
            "voc-chaussee",
            "voc-ceder"
        ]
    );
    assert_eq!(
        app.progress()
            .get(&ProgressKey::ModuleOpened("mod-priority".into())),
        2
    );

    app.apply(&Action::ToggleLearned("rule-right".into())).unwrap();
    assert!(app.progress().map().is_learned("rule-right"));
    app.apply(&Action::ToggleLearned("rule-right".into())).unwrap();
    assert!(!app.progress().map().is_learned("rule-right"));
}

#[test]
fn quiz_session_tallies_once_and_wraps() {
    let mut app = app();
    app.apply(&Action::StartQuiz("mod-priority".into())).unwrap();
    assert_eq!(app.screen(), &Screen::Quiz);

    let Body::Quiz(first) = app.view().body else {
        panic!("expected a question");
    };
    assert_eq!((first.question_id.as_str(), first.pool_size), ("q-right", 2));

    app.apply(&Action::ChooseQuizOption {
        question_id: "q-right".into(),
        option: 1,
    })
    .unwrap();
    app.apply(&Action::ChooseQuizOption {
        question_id: "q-right".into(),
        option: 0,
    })
    .unwrap();
    let map = app.progress().map();
    assert_eq!(map.chosen("q-right"), Some(1));
    assert_eq!(map.count(&ProgressKey::QuizCorrect), 1);
    assert_eq!(map.count(&ProgressKey::QuizWrong), 0);

    app.apply(&Action::NextQuestion).unwrap();
    app.apply(&Action::NextQuestion).unwrap();
    assert_eq!(app.progress().get(&ProgressKey::Cursor(Scope::Quiz)), 0);

    app.apply(&Action::ResetQuizAnswer("q-right".into())).unwrap();
    assert!(!app.progress().map().is_answered("q-right"));
    assert_eq!(app.progress().map().chosen("q-right"), None);
}

#[test]
fn search_narrows_signs_accent_insensitively() {
    let mut app = app();
    app.navigate(Screen::Signs).unwrap();
    app.set_search("ARRET");
    assert_eq!(card_ids(&app), ["sign-ab4"]);
    app.set_search("zzz");
    let Body::Cards(list) = app.view().body else {
        panic!("expected cards");
    };
    assert!(list.cards.is_empty());
    assert!(list.empty.is_some());
}

#[test]
fn bad_import_keeps_progress_and_export_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = app();
    app.apply(&Action::MarkKnew("sign-a1".into())).unwrap();
    app.apply(&Action::AddReview("sign-a1".into())).unwrap();

    let garbage = dir.path().join("garbage.json");
    fs::write(&garbage, "not json").unwrap();
    let err = app.import_from(&garbage).unwrap_err();
    assert!(matches!(err, ImportError::Malformed(_)));
    assert_eq!(err.user_message(), "Invalid JSON file.");
    assert!(app.progress().map().is_learned("sign-a1"));

    let exported = app.export_to(dir.path()).unwrap();
    assert_eq!(exported, dir.path().join(code_route::EXPORT_FILE_NAME));
    let before = app.progress().snapshot();

    app.apply(&Action::ResetAllProgress).unwrap();
    assert!(app.progress().map().is_empty());
    app.import_from(&exported).unwrap();
    assert_eq!(app.progress().snapshot(), before);
}

#[test]
fn file_storage_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().join("state").join("state.json");

    let mut app = App::load(
        &DirSource::new(data_dir()),
        FileStorage::open(&state).unwrap(),
    )
    .unwrap();
    app.apply(&Action::StartFlashcards("mod-speed".into())).unwrap();
    app.apply(&Action::NextFlashcard).unwrap();
    app.toggle_english_first().unwrap();
    drop(app);

    let app = App::load(
        &DirSource::new(data_dir()),
        FileStorage::open(&state).unwrap(),
    )
    .unwrap();
    assert!(app.settings().english_first);
    let map = app.progress().map();
    assert_eq!(map.text(&ProgressKey::SourceModule(Scope::Flashcards)), Some("mod-speed"));
    assert_eq!(map.count(&ProgressKey::Cursor(Scope::Flashcards)), 1);
    assert_eq!(map.count(&ProgressKey::ItemReview("rule-town-speed".into())), 1);
}

#[test]
fn corrupt_stored_progress_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().join("state.json");
    fs::write(&state, r#"{"cr_progress":"not json","cr_theme":"light"}"#).unwrap();

    let app = App::load(
        &DirSource::new(data_dir()),
        FileStorage::open(&state).unwrap(),
    )
    .unwrap();
    assert!(app.progress().map().is_empty());
    assert_eq!(app.settings().theme, code_route::ThemeKind::Light);
}
