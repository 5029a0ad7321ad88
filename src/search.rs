//! Accent- and case-insensitive search over study content.
//!
//! One predicate serves every list screen and the quiz pool, so "priorite"
//! finds "Priorité" everywhere.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::content::{Module, Question, Rule, Sign, StudyItem, VocabEntry};

/// Lowercase, decompose (NFD) and drop combining marks.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// Text fields a search query is matched against.
pub trait Searchable {
    fn title(&self) -> (&str, &str);

    fn body(&self) -> (&str, &str) {
        ("", "")
    }

    fn keywords(&self) -> &[String] {
        &[]
    }

    fn category(&self) -> &str {
        ""
    }

    fn kind(&self) -> &str {
        ""
    }

    fn haystack(&self) -> String {
        let (title_fr, title_en) = self.title();
        let (body_fr, body_en) = self.body();
        let keywords = self.keywords().join(" ");
        [
            title_fr,
            title_en,
            body_fr,
            body_en,
            keywords.as_str(),
            self.category(),
            self.kind(),
        ]
        .join(" ")
    }
}

/// An empty or blank query matches everything.
pub fn matches(item: &impl Searchable, query: &str) -> bool {
    let query = normalize(query.trim());
    if query.is_empty() {
        return true;
    }
    normalize(&item.haystack()).contains(&query)
}

/// Normalizes the query once for filtering a whole collection.
#[derive(Debug, Clone)]
pub struct Query {
    normalized: String,
}

impl Query {
    pub fn new(raw: &str) -> Self {
        Self {
            normalized: normalize(raw.trim()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.normalized.is_empty()
    }

    pub fn matches(&self, item: &impl Searchable) -> bool {
        self.is_empty() || normalize(&item.haystack()).contains(&self.normalized)
    }
}

impl Searchable for Sign {
    fn title(&self) -> (&str, &str) {
        (&self.title_fr, &self.title_en)
    }
    fn body(&self) -> (&str, &str) {
        (&self.fr, &self.en)
    }
    fn keywords(&self) -> &[String] {
        &self.keywords
    }
    fn category(&self) -> &str {
        &self.category
    }
}

impl Searchable for Rule {
    fn title(&self) -> (&str, &str) {
        (&self.title_fr, &self.title_en)
    }
    fn body(&self) -> (&str, &str) {
        (&self.fr, &self.en)
    }
    fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

impl Searchable for VocabEntry {
    fn title(&self) -> (&str, &str) {
        (&self.word_fr, &self.word_en)
    }
    fn body(&self) -> (&str, &str) {
        (&self.fr, &self.en)
    }
    fn keywords(&self) -> &[String] {
        &self.keywords
    }
    fn kind(&self) -> &str {
        &self.kind
    }
}

impl Searchable for Module {
    fn title(&self) -> (&str, &str) {
        (&self.title_fr, &self.title_en)
    }
    fn body(&self) -> (&str, &str) {
        (&self.desc_fr, &self.desc_en)
    }
}

/// Questions search their text and their tags.
impl Searchable for Question {
    fn title(&self) -> (&str, &str) {
        (&self.q_fr, &self.q_en)
    }
    fn keywords(&self) -> &[String] {
        &self.tags
    }
}

impl Searchable for StudyItem<'_> {
    fn title(&self) -> (&str, &str) {
        match self {
            Self::Sign(s) => s.title(),
            Self::Rule(r) => r.title(),
            Self::Vocab(v) => v.title(),
        }
    }
    fn body(&self) -> (&str, &str) {
        match self {
            Self::Sign(s) => s.body(),
            Self::Rule(r) => r.body(),
            Self::Vocab(v) => v.body(),
        }
    }
    fn keywords(&self) -> &[String] {
        match self {
            Self::Sign(s) => s.keywords(),
            Self::Rule(r) => r.keywords(),
            Self::Vocab(v) => v.keywords(),
        }
    }
    fn category(&self) -> &str {
        match self {
            Self::Sign(s) => s.category(),
            Self::Rule(r) => r.category(),
            Self::Vocab(v) => v.category(),
        }
    }
    fn kind(&self) -> &str {
        match self {
            Self::Sign(s) => s.kind(),
            Self::Rule(r) => r.kind(),
            Self::Vocab(v) => v.kind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::fixtures;

    #[test]
    fn accents_and_case_fold() {
        assert_eq!(normalize("Priorité"), normalize("priorite"));
        assert_eq!(normalize("CHAUSSÉE"), "chaussee");
        assert_eq!(normalize("Arrêt"), "arret");
    }

    #[test]
    fn blank_query_matches_everything() {
        let store = fixtures::store();
        assert!(matches(&store.signs[0], ""));
        assert!(matches(&store.signs[0], "   "));
        assert!(Query::new("").matches(&store.rules[1]));
    }

    #[test]
    fn matches_french_title_without_accents() {
        let store = fixtures::store();
        let r1 = &store.rules[0];
        assert!(matches(r1, "priorite"));
        assert!(matches(r1, "PRIORITÉ à"));
        assert!(!matches(r1, "vitesse"));
    }

    #[test]
    fn keywords_category_and_type_are_searched() {
        let store = fixtures::store();
        assert!(matches(&store.signs[0], "octogone"));
        assert!(matches(&store.signs[0], "obligation"));
        assert!(matches(&store.vocab[0], "noun"));
        assert!(matches(&store.vocab[0], "chaussee"));
    }

    #[test]
    fn question_matches_text_and_tags() {
        let store = fixtures::store();
        let q1 = &store.questions[0];
        assert!(matches(q1, "right of way"));
        assert!(matches(q1, "priority"));
        assert!(!matches(q1, "personne"));
    }

    #[test]
    fn study_item_delegates() {
        let store = fixtures::store();
        let items = store.all_items();
        let hits: Vec<_> = items
            .iter()
            .filter(|it| matches(*it, "danger"))
            .map(|it| it.id())
            .collect();
        assert_eq!(hits, vec!["S2"]);
    }
}
