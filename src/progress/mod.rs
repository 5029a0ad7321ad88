//! The progress map: the only mutable study state.
//!
//! On disk and in export files progress is a flat JSON object whose keys follow
//! fixed namespaced conventions (`item:<id>:learned`, `quiz:index`, ...).
//! Inside the crate every key is a [`ProgressKey`]; the string form only exists
//! at the map boundary. Keys that do not decode (written by a newer version, or
//! hand-edited) are still carried through import and export untouched.

mod store;

pub use store::ProgressStore;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ImportError;

/// Which study screen a cursor or source-module filter belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Flashcards,
    Quiz,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Flashcards => "flashcards",
            Self::Quiz => "quiz",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProgressKey {
    /// `module:<id>:opened`
    ModuleOpened(String),
    /// `item:<id>:learned`, 0 or 1
    ItemLearned(String),
    /// `item:<id>:review`
    ItemReview(String),
    /// `flashcards:sourceModule` / `quiz:sourceModule`, holds a module id
    SourceModule(Scope),
    /// `flashcards:index` / `quiz:index`
    Cursor(Scope),
    /// `flashcards:flipped`
    FlashcardFlipped,
    /// `quiz:<id>:answered`
    QuizAnswered(String),
    /// `quiz:<id>:chosen`, -1 when nothing is chosen
    QuizChosen(String),
    /// `quiz:correct`
    QuizCorrect,
    /// `quiz:wrong`
    QuizWrong,
}

impl ProgressKey {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "flashcards:sourceModule" => return Some(Self::SourceModule(Scope::Flashcards)),
            "flashcards:index" => return Some(Self::Cursor(Scope::Flashcards)),
            "flashcards:flipped" => return Some(Self::FlashcardFlipped),
            "quiz:sourceModule" => return Some(Self::SourceModule(Scope::Quiz)),
            "quiz:index" => return Some(Self::Cursor(Scope::Quiz)),
            "quiz:correct" => return Some(Self::QuizCorrect),
            "quiz:wrong" => return Some(Self::QuizWrong),
            _ => {}
        }
        let (ns, rest) = raw.split_once(':')?;
        let (id, field) = rest.rsplit_once(':')?;
        if id.is_empty() {
            return None;
        }
        let id = id.to_string();
        match (ns, field) {
            ("module", "opened") => Some(Self::ModuleOpened(id)),
            ("item", "learned") => Some(Self::ItemLearned(id)),
            ("item", "review") => Some(Self::ItemReview(id)),
            ("quiz", "answered") => Some(Self::QuizAnswered(id)),
            ("quiz", "chosen") => Some(Self::QuizChosen(id)),
            _ => None,
        }
    }

    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ProgressKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModuleOpened(id) => write!(f, "module:{id}:opened"),
            Self::ItemLearned(id) => write!(f, "item:{id}:learned"),
            Self::ItemReview(id) => write!(f, "item:{id}:review"),
            Self::SourceModule(scope) => write!(f, "{}:sourceModule", scope.as_str()),
            Self::Cursor(scope) => write!(f, "{}:index", scope.as_str()),
            Self::FlashcardFlipped => f.write_str("flashcards:flipped"),
            Self::QuizAnswered(id) => write!(f, "quiz:{id}:answered"),
            Self::QuizChosen(id) => write!(f, "quiz:{id}:chosen"),
            Self::QuizCorrect => f.write_str("quiz:correct"),
            Self::QuizWrong => f.write_str("quiz:wrong"),
        }
    }
}

/// A counter, or the module id held by a `sourceModule` key. Anything else
/// found in an imported file is kept as `Raw` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProgressValue {
    Count(i64),
    Text(String),
    Raw(serde_json::Value),
}

impl ProgressValue {
    pub fn as_count(&self) -> Option<i64> {
        match self {
            Self::Count(n) => Some(*n),
            Self::Text(_) | Self::Raw(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Count(_) | Self::Raw(_) => None,
        }
    }

    /// Integral numbers become counters and booleans become 0/1.
    fn from_json(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Number(n) => match n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                    .map(|f| f as i64)
            }) {
                Some(count) => Self::Count(count),
                None => Self::Raw(Value::Number(n)),
            },
            Value::String(s) => Self::Text(s),
            Value::Bool(b) => Self::Count(i64::from(b)),
            other => Self::Raw(other),
        }
    }
}

/// Flat key → value snapshot. Absent keys read as 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgressMap {
    entries: BTreeMap<String, ProgressValue>,
}

impl ProgressMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON object. Non-object input is rejected. Values that are not
    /// counters or text are carried as [`ProgressValue::Raw`] and read as 0.
    pub fn from_json(text: &str) -> Result<Self, ImportError> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        let object = match value {
            serde_json::Value::Object(object) => object,
            other => {
                return Err(ImportError::NotAnObject {
                    found: json_kind(&other),
                })
            }
        };
        let entries: BTreeMap<String, ProgressValue> = object
            .into_iter()
            .map(|(key, value)| {
                let value = ProgressValue::from_json(value);
                if let ProgressValue::Raw(raw) = &value {
                    tracing::debug!(%key, kind = json_kind(raw), "keeping progress entry as raw value");
                }
                (key, value)
            })
            .collect();
        Ok(Self { entries })
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.entries)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.entries)
    }

    pub fn count(&self, key: &ProgressKey) -> i64 {
        self.count_raw(&key.encode())
    }

    pub fn count_raw(&self, key: &str) -> i64 {
        self.entries
            .get(key)
            .and_then(ProgressValue::as_count)
            .unwrap_or(0)
    }

    pub fn text(&self, key: &ProgressKey) -> Option<&str> {
        self.entries
            .get(&key.encode())
            .and_then(ProgressValue::as_text)
            .filter(|s| !s.is_empty())
    }

    pub fn value(&self, key: &ProgressKey) -> Option<&ProgressValue> {
        self.entries.get(&key.encode())
    }

    pub fn contains(&self, key: &ProgressKey) -> bool {
        self.entries.contains_key(&key.encode())
    }

    /// Learned badge: any positive counter, so legacy values above 1 still count.
    pub fn is_learned(&self, item_id: &str) -> bool {
        self.count(&ProgressKey::ItemLearned(item_id.to_string())) > 0
    }

    /// Chosen option for a question, if one is recorded.
    pub fn chosen(&self, question_id: &str) -> Option<usize> {
        match self.value(&ProgressKey::QuizChosen(question_id.to_string())) {
            Some(ProgressValue::Count(n)) if *n >= 0 => usize::try_from(*n).ok(),
            _ => None,
        }
    }

    pub fn is_answered(&self, question_id: &str) -> bool {
        self.count(&ProgressKey::QuizAnswered(question_id.to_string())) == 1
    }

    pub fn insert(&mut self, key: &ProgressKey, value: ProgressValue) {
        self.entries.insert(key.encode(), value);
    }

    /// Adds `delta` to the counter, saturating at the `i64` bounds, and
    /// returns the new value. A text or raw value is replaced.
    pub fn increment(&mut self, key: &ProgressKey, delta: i64) -> i64 {
        let next = self.count(key).saturating_add(delta);
        self.insert(key, ProgressValue::Count(next));
        next
    }

    pub fn remove(&mut self, key: &ProgressKey) -> Option<ProgressValue> {
        self.entries.remove(&key.encode())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ProgressValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Entries whose key decodes, paired with the decoded key.
    pub fn typed(&self) -> impl Iterator<Item = (ProgressKey, &ProgressValue)> {
        self.entries
            .iter()
            .filter_map(|(k, v)| ProgressKey::parse(k).map(|key| (key, v)))
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    use serde_json::Value;
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn fixed_keys_decode() {
        assert_eq!(
            ProgressKey::parse("flashcards:index"),
            Some(ProgressKey::Cursor(Scope::Flashcards))
        );
        assert_eq!(
            ProgressKey::parse("quiz:sourceModule"),
            Some(ProgressKey::SourceModule(Scope::Quiz))
        );
        assert_eq!(
            ProgressKey::parse("quiz:Q1:chosen"),
            Some(ProgressKey::QuizChosen("Q1".into()))
        );
        assert_eq!(ProgressKey::parse("item::learned"), None);
        assert_eq!(ProgressKey::parse("theme"), None);
        assert_eq!(ProgressKey::parse("item:R1:unknown"), None);
    }

    #[test]
    fn ids_may_contain_colons() {
        let key = ProgressKey::ItemReview("road:s-12".into());
        assert_eq!(key.encode(), "item:road:s-12:review");
        assert_eq!(ProgressKey::parse(&key.encode()), Some(key));
    }

    #[test]
    fn json_import_accepts_numbers_and_strings() {
        let map = ProgressMap::from_json(
            r#"{"item:R1:learned":1,"quiz:sourceModule":"M1","quiz:correct":2.0,"x":null,"y":true}"#,
        )
        .unwrap();
        assert!(map.is_learned("R1"));
        assert_eq!(map.text(&ProgressKey::SourceModule(Scope::Quiz)), Some("M1"));
        assert_eq!(map.count(&ProgressKey::QuizCorrect), 2);
        assert_eq!(map.count_raw("y"), 1);
        assert_eq!(map.count_raw("x"), 0);
        assert_eq!(map.len(), 5);
    }

    #[test]
    fn unsupported_values_survive_export() {
        let map = ProgressMap::from_json(
            r#"{"a":null,"b":[1,"two"],"c":{"nested":true},"d":1.5,"item:R1:review":3}"#,
        )
        .unwrap();
        assert_eq!(map.count_raw("d"), 0);
        assert_eq!(map.count_raw("b"), 0);

        let exported: serde_json::Value = serde_json::from_str(&map.to_json_pretty().unwrap()).unwrap();
        assert_eq!(
            exported,
            serde_json::json!({
                "a": null,
                "b": [1, "two"],
                "c": {"nested": true},
                "d": 1.5,
                "item:R1:review": 3
            })
        );
        assert_eq!(ProgressMap::from_json(&map.to_json().unwrap()).unwrap(), map);
    }

    #[test]
    fn increment_saturates_and_replaces_text() {
        let mut map = ProgressMap::from_json(r#"{"quiz:correct": 9223372036854775807, "quiz:wrong": "x"}"#).unwrap();
        assert_eq!(map.increment(&ProgressKey::QuizCorrect, 1), i64::MAX);
        assert_eq!(map.increment(&ProgressKey::QuizWrong, 2), 2);
    }

    #[test]
    fn non_object_json_is_rejected() {
        assert!(matches!(
            ProgressMap::from_json("[1,2]"),
            Err(ImportError::NotAnObject { found: "array" })
        ));
        assert!(matches!(
            ProgressMap::from_json("not json"),
            Err(ImportError::Malformed(_))
        ));
    }

    #[test]
    fn chosen_reads_negative_as_none() {
        let map = ProgressMap::from_json(r#"{"quiz:Q1:chosen":-1,"quiz:Q2:chosen":0}"#).unwrap();
        assert_eq!(map.chosen("Q1"), None);
        assert_eq!(map.chosen("Q2"), Some(0));
        assert_eq!(map.chosen("Q3"), None);
    }

    fn arb_key() -> impl Strategy<Value = ProgressKey> {
        let id = "[A-Za-z0-9_:-]{1,12}";
        prop_oneof![
            id.prop_map(ProgressKey::ModuleOpened),
            id.prop_map(ProgressKey::ItemLearned),
            id.prop_map(ProgressKey::ItemReview),
            id.prop_map(ProgressKey::QuizAnswered),
            id.prop_map(ProgressKey::QuizChosen),
            Just(ProgressKey::SourceModule(Scope::Flashcards)),
            Just(ProgressKey::SourceModule(Scope::Quiz)),
            Just(ProgressKey::Cursor(Scope::Flashcards)),
            Just(ProgressKey::Cursor(Scope::Quiz)),
            Just(ProgressKey::FlashcardFlipped),
            Just(ProgressKey::QuizCorrect),
            Just(ProgressKey::QuizWrong),
        ]
    }

    proptest! {
        #[test]
        fn typed_keys_survive_encoding(key in arb_key()) {
            prop_assert_eq!(ProgressKey::parse(&key.encode()), Some(key));
        }
    }
}
