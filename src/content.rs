//! Static study content: modules, signs, rules, vocabulary and quiz questions.
//!
//! Loaded once at startup from five JSON documents and never mutated after.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::LoadError;

// ---------------- Records ----------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Signs,
    Rules,
    Vocab,
    #[serde(other)]
    Other,
}

/// Worked example attached to a sign, rule or vocabulary entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    #[serde(default, rename = "example_fr")]
    pub fr: Option<String>,
    #[serde(default, rename = "example_en")]
    pub en: Option<String>,
    #[serde(default, rename = "example_tip")]
    pub tip: Option<String>,
}

impl Example {
    /// Present only when the French text is non-empty.
    pub fn present(&self) -> Option<&Self> {
        self.fr.as_deref().filter(|s| !s.is_empty()).map(|_| self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub id: String,
    pub title_fr: String,
    pub title_en: String,
    #[serde(default)]
    pub desc_fr: String,
    #[serde(default)]
    pub desc_en: String,
    #[serde(default)]
    pub tip: Option<String>,
    #[serde(default)]
    pub includes: Vec<ContentKind>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Module {
    pub fn includes(&self, kind: ContentKind) -> bool {
        self.includes.contains(&kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sign {
    pub id: String,
    pub title_fr: String,
    pub title_en: String,
    #[serde(default)]
    pub fr: String,
    #[serde(default)]
    pub en: String,
    #[serde(default)]
    pub tip: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(flatten)]
    pub example: Example,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub title_fr: String,
    pub title_en: String,
    #[serde(default)]
    pub fr: String,
    #[serde(default)]
    pub en: String,
    #[serde(default)]
    pub tip: Option<String>,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(flatten)]
    pub example: Example,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabEntry {
    pub id: String,
    pub word_fr: String,
    pub word_en: String,
    #[serde(default)]
    pub fr: String,
    #[serde(default)]
    pub en: String,
    #[serde(default)]
    pub tip: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(flatten)]
    pub example: Example,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOption {
    pub fr: String,
    pub en: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub q_fr: String,
    pub q_en: String,
    pub options: Vec<QuizOption>,
    pub correct: usize,
    #[serde(default)]
    pub explain_fr: String,
    #[serde(default)]
    pub explain_en: String,
    #[serde(default)]
    pub tip: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A sign, rule or vocabulary entry, the three kinds a module can group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudyItem<'a> {
    Sign(&'a Sign),
    Rule(&'a Rule),
    Vocab(&'a VocabEntry),
}

impl<'a> StudyItem<'a> {
    pub fn id(&self) -> &'a str {
        match self {
            Self::Sign(s) => &s.id,
            Self::Rule(r) => &r.id,
            Self::Vocab(v) => &v.id,
        }
    }

    /// Heading pair: sign/rule title or vocabulary word.
    pub fn title(&self) -> (&'a str, &'a str) {
        match self {
            Self::Sign(s) => (&s.title_fr, &s.title_en),
            Self::Rule(r) => (&r.title_fr, &r.title_en),
            Self::Vocab(v) => (&v.word_fr, &v.word_en),
        }
    }

    pub fn body(&self) -> (&'a str, &'a str) {
        match self {
            Self::Sign(s) => (&s.fr, &s.en),
            Self::Rule(r) => (&r.fr, &r.en),
            Self::Vocab(v) => (&v.fr, &v.en),
        }
    }

    pub fn tip(&self) -> Option<&'a str> {
        match self {
            Self::Sign(s) => s.tip.as_deref(),
            Self::Rule(r) => r.tip.as_deref(),
            Self::Vocab(v) => v.tip.as_deref(),
        }
    }

    pub fn example(&self) -> Option<&'a Example> {
        match self {
            Self::Sign(s) => s.example.present(),
            Self::Rule(r) => r.example.present(),
            Self::Vocab(v) => v.example.present(),
        }
    }

    /// Category for signs, topic for rules, word type for vocabulary.
    pub fn label(&self) -> &'a str {
        match self {
            Self::Sign(s) => &s.category,
            Self::Rule(r) => &r.topic,
            Self::Vocab(v) => &v.kind,
        }
    }

    pub fn tags(&self) -> &'a [String] {
        match self {
            Self::Sign(s) => &s.tags,
            Self::Rule(r) => &r.tags,
            Self::Vocab(v) => &v.tags,
        }
    }
}

/// Items of one module, grouped by kind in collection order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleItems<'a> {
    pub signs: Vec<&'a Sign>,
    pub rules: Vec<&'a Rule>,
    pub vocab: Vec<&'a VocabEntry>,
}

impl<'a> ModuleItems<'a> {
    /// Signs, then rules, then vocabulary.
    pub fn into_study_items(self) -> Vec<StudyItem<'a>> {
        self.signs
            .into_iter()
            .map(StudyItem::Sign)
            .chain(self.rules.into_iter().map(StudyItem::Rule))
            .chain(self.vocab.into_iter().map(StudyItem::Vocab))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.signs.len() + self.rules.len() + self.vocab.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn shares_tag(a: &[String], b: &[String]) -> bool {
    a.iter().any(|t| b.contains(t))
}

// ---------------- Sources ----------------

/// Where the five content documents come from.
pub trait ContentSource {
    /// Raw JSON text of one collection (`modules`, `signs`, ...).
    fn fetch(&self, collection: &str) -> std::io::Result<String>;
}

/// Reads `<dir>/<collection>.json`.
#[derive(Debug, Clone)]
pub struct DirSource {
    dir: PathBuf,
}

impl DirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ContentSource for DirSource {
    fn fetch(&self, collection: &str) -> std::io::Result<String> {
        fs::read_to_string(self.dir.join(format!("{collection}.json")))
    }
}

/// Collections held in memory, keyed by collection name.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    docs: HashMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, collection: &str, json: impl Into<String>) -> Self {
        self.docs.insert(collection.to_string(), json.into());
        self
    }
}

impl ContentSource for MemorySource {
    fn fetch(&self, collection: &str) -> std::io::Result<String> {
        self.docs.get(collection).cloned().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no {collection} document"),
            )
        })
    }
}

// ---------------- Store ----------------

#[derive(Debug, Clone, Default)]
pub struct ContentStore {
    pub modules: Vec<Module>,
    pub signs: Vec<Sign>,
    pub rules: Vec<Rule>,
    pub vocab: Vec<VocabEntry>,
    pub questions: Vec<Question>,
}

fn fetch_collection<T: DeserializeOwned>(
    source: &impl ContentSource,
    collection: &'static str,
) -> Result<Vec<T>, LoadError> {
    let raw = source
        .fetch(collection)
        .map_err(|source| LoadError::Fetch { collection, source })?;
    serde_json::from_str(&raw).map_err(|source| LoadError::Parse { collection, source })
}

impl ContentStore {
    /// Loads all five collections or fails; nothing is kept on failure.
    pub fn load(source: &impl ContentSource) -> Result<Self, LoadError> {
        let store = Self {
            modules: fetch_collection(source, "modules")?,
            signs: fetch_collection(source, "signs")?,
            rules: fetch_collection(source, "rules")?,
            vocab: fetch_collection(source, "vocab")?,
            questions: fetch_collection(source, "questions")?,
        };
        store.validate()?;
        tracing::info!(
            modules = store.modules.len(),
            signs = store.signs.len(),
            rules = store.rules.len(),
            vocab = store.vocab.len(),
            questions = store.questions.len(),
            "content loaded"
        );
        Ok(store)
    }

    fn validate(&self) -> Result<(), LoadError> {
        for q in &self.questions {
            if q.options.is_empty() {
                return Err(LoadError::Invalid {
                    collection: "questions",
                    id: q.id.clone(),
                    reason: "question has no options".into(),
                });
            }
            if q.correct >= q.options.len() {
                return Err(LoadError::Invalid {
                    collection: "questions",
                    id: q.id.clone(),
                    reason: format!(
                        "correct index {} out of range for {} options",
                        q.correct,
                        q.options.len()
                    ),
                });
            }
        }
        Ok(())
    }

    pub fn find_module(&self, id: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.id == id)
    }

    pub fn find_question(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    pub fn find_item(&self, id: &str) -> Option<StudyItem<'_>> {
        self.all_items().into_iter().find(|it| it.id() == id)
    }

    /// Kinds the module includes, restricted to items sharing one of its tags.
    pub fn items_for_module<'a>(&'a self, module: &Module) -> ModuleItems<'a> {
        let mut out = ModuleItems::default();
        if module.includes(ContentKind::Signs) {
            out.signs = self
                .signs
                .iter()
                .filter(|s| shares_tag(&module.tags, &s.tags))
                .collect();
        }
        if module.includes(ContentKind::Rules) {
            out.rules = self
                .rules
                .iter()
                .filter(|r| shares_tag(&module.tags, &r.tags))
                .collect();
        }
        if module.includes(ContentKind::Vocab) {
            out.vocab = self
                .vocab
                .iter()
                .filter(|v| shares_tag(&module.tags, &v.tags))
                .collect();
        }
        out
    }

    /// Every sign, rule and vocabulary entry, in that order.
    pub fn all_items(&self) -> Vec<StudyItem<'_>> {
        self.signs
            .iter()
            .map(StudyItem::Sign)
            .chain(self.rules.iter().map(StudyItem::Rule))
            .chain(self.vocab.iter().map(StudyItem::Vocab))
            .collect()
    }
}
