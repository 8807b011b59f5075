use regex::Regex;
use serde::{Deserialize, Serialize};

/// One panel as declared in panels.json: the canonical id, the name
/// aliases under which lab reports announce it, and the ordered list of
/// canonical component names it may report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelDefinition {
    pub id: String,
    pub names: Vec<String>,
    pub components: Vec<String>,
}

/// A vocabulary category: a label plus the literal strings that belong to
/// it. Entries are compared case-insensitively but always handed back to
/// the caller exactly as stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyCategory {
    pub label: String,
    pub entries: Vec<String>,
}

/// Grouped literal vocabulary (units, analysis methods).
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    categories: Vec<VocabularyCategory>,
}

impl Vocabulary {
    pub fn new(categories: Vec<VocabularyCategory>) -> Self {
        Self { categories }
    }

    pub fn categories(&self) -> &[VocabularyCategory] {
        &self.categories
    }

    /// Case-insensitive exact membership test. Returns the entry as stored.
    pub fn find(&self, candidate: &str) -> Option<&str> {
        let upper = candidate.to_uppercase();
        self.categories
            .iter()
            .flat_map(|c| c.entries.iter())
            .find(|entry| entry.to_uppercase() == upper)
            .map(String::as_str)
    }

    /// First entry that occurs as a plain substring of `text` (which the
    /// caller has already uppercased). Categories are scanned in stored
    /// order, so lookups are deterministic.
    pub fn find_in(&self, text: &str) -> Option<&str> {
        self.categories
            .iter()
            .flat_map(|c| c.entries.iter())
            .find(|entry| text.contains(entry.to_uppercase().as_str()))
            .map(String::as_str)
    }
}

/// A compiled result-shape pattern (qualitative, numeric, ratio, ...).
#[derive(Debug, Clone)]
pub struct ResultPattern {
    pub name: String,
    pub regex: Regex,
}

/// How a matched reference-range expression is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    Range,
    UpTo,
    LessThan,
    GreaterThan,
    Normal,
}

/// A compiled reference-range pattern. The declaration order in
/// patterns.json is the match priority order.
#[derive(Debug, Clone)]
pub struct ReferencePattern {
    pub kind: ReferenceKind,
    pub regex: Regex,
}

/// All compiled result and reference patterns, built once at load.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    pub result: Vec<ResultPattern>,
    pub reference: Vec<ReferencePattern>,
}

impl PatternSet {
    /// Look up a result pattern by its declared name.
    pub fn result_pattern(&self, name: &str) -> Option<&Regex> {
        self.result
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.regex)
    }
}
