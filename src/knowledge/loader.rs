use std::collections::{HashMap, HashSet};
use std::path::Path;

use regex::Regex;
use serde::Deserialize;

use super::types::{
    PanelDefinition, PatternSet, ReferenceKind, ReferencePattern, ResultPattern, Vocabulary,
    VocabularyCategory,
};
use super::KnowledgeError;

const PANELS_FILE: &str = "panels.json";
const ALIASES_FILE: &str = "component_aliases.json";
const UNITS_FILE: &str = "units.json";
const METHODS_FILE: &str = "methods.json";
const PATTERNS_FILE: &str = "patterns.json";

/// Raw shape of patterns.json.
#[derive(Deserialize)]
struct RawPatternFile {
    result: Vec<RawNamedPattern>,
    reference: Vec<RawReferencePattern>,
}

#[derive(Deserialize)]
struct RawNamedPattern {
    name: String,
    pattern: String,
}

#[derive(Deserialize)]
struct RawReferencePattern {
    kind: ReferenceKind,
    pattern: String,
}

/// The immutable domain knowledge base: panel definitions, component
/// aliases, unit and method vocabularies, and the compiled result/reference
/// patterns. Built once at start-up and shared read-only afterwards; every
/// literal used for word-boundary matching is escaped and compiled here,
/// never per call.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    panels: Vec<PanelDefinition>,
    aliases: HashMap<String, Vec<String>>,
    units: Vocabulary,
    methods: Vocabulary,
    patterns: PatternSet,
    word_patterns: HashMap<String, Regex>,
}

impl KnowledgeBase {
    /// Load the five table files from a directory. Any missing or malformed
    /// file aborts the load; there is no partial knowledge base.
    pub fn load(dir: &Path) -> Result<Self, KnowledgeError> {
        let panels = parse_file(&read_file(dir, PANELS_FILE)?, PANELS_FILE)?;
        let aliases = parse_file(&read_file(dir, ALIASES_FILE)?, ALIASES_FILE)?;
        let units = parse_file(&read_file(dir, UNITS_FILE)?, UNITS_FILE)?;
        let methods = parse_file(&read_file(dir, METHODS_FILE)?, METHODS_FILE)?;
        let patterns = parse_file(&read_file(dir, PATTERNS_FILE)?, PATTERNS_FILE)?;
        Self::from_parts(panels, aliases, units, methods, patterns)
    }

    /// Build the knowledge base from the table files bundled into the
    /// binary. Still fallible: a corrupt bundle must abort start-up rather
    /// than degrade silently.
    pub fn bundled() -> Result<Self, KnowledgeError> {
        let panels = parse_file(include_str!("resources/panels.json"), PANELS_FILE)?;
        let aliases = parse_file(include_str!("resources/component_aliases.json"), ALIASES_FILE)?;
        let units = parse_file(include_str!("resources/units.json"), UNITS_FILE)?;
        let methods = parse_file(include_str!("resources/methods.json"), METHODS_FILE)?;
        let patterns = parse_file(include_str!("resources/patterns.json"), PATTERNS_FILE)?;
        Self::from_parts(panels, aliases, units, methods, patterns)
    }

    fn from_parts(
        panels: Vec<PanelDefinition>,
        aliases: HashMap<String, Vec<String>>,
        units: Vec<VocabularyCategory>,
        methods: Vec<VocabularyCategory>,
        raw_patterns: RawPatternFile,
    ) -> Result<Self, KnowledgeError> {
        let mut seen = HashSet::new();
        for panel in &panels {
            if !seen.insert(panel.id.clone()) {
                return Err(KnowledgeError::DuplicatePanel(panel.id.clone()));
            }
            if panel.names.is_empty() {
                return Err(KnowledgeError::NoNames(panel.id.clone()));
            }
            if panel.components.is_empty() {
                return Err(KnowledgeError::NoComponents(panel.id.clone()));
            }
        }

        let mut result = Vec::with_capacity(raw_patterns.result.len());
        for raw in raw_patterns.result {
            let regex = Regex::new(&raw.pattern).map_err(|source| {
                KnowledgeError::InvalidPattern {
                    name: raw.name.clone(),
                    source,
                }
            })?;
            result.push(ResultPattern {
                name: raw.name,
                regex,
            });
        }

        let mut reference = Vec::with_capacity(raw_patterns.reference.len());
        for raw in raw_patterns.reference {
            let regex = Regex::new(&raw.pattern).map_err(|source| {
                KnowledgeError::InvalidPattern {
                    name: format!("reference/{:?}", raw.kind),
                    source,
                }
            })?;
            reference.push(ReferencePattern {
                kind: raw.kind,
                regex,
            });
        }

        // Memoize one word-boundary regex per literal; clinical punctuation
        // (parentheses, slashes, dots) must never act as pattern syntax.
        // `\b` is only emitted next to a word character: a literal that ends
        // in `)` already sits at a word boundary, and demanding another one
        // would make the pattern unmatchable.
        let mut word_patterns = HashMap::new();
        let literals = panels
            .iter()
            .flat_map(|p| p.names.iter().chain(p.components.iter()))
            .chain(aliases.keys())
            .chain(aliases.values().flatten());
        for literal in literals {
            if word_patterns.contains_key(literal) {
                continue;
            }
            let mut source = String::new();
            if literal.chars().next().is_some_and(is_word_char) {
                source.push_str(r"\b");
            }
            source.push_str(&regex::escape(literal));
            if literal.chars().last().is_some_and(is_word_char) {
                source.push_str(r"\b");
            }
            let regex = Regex::new(&source).map_err(|source| KnowledgeError::InvalidPattern {
                name: literal.clone(),
                source,
            })?;
            word_patterns.insert(literal.clone(), regex);
        }

        tracing::info!(
            panels = panels.len(),
            aliased_components = aliases.len(),
            literals = word_patterns.len(),
            "knowledge base loaded"
        );

        Ok(Self {
            panels,
            aliases,
            units: Vocabulary::new(units),
            methods: Vocabulary::new(methods),
            patterns: PatternSet { result, reference },
            word_patterns,
        })
    }

    /// Panel definitions, in declaration order.
    pub fn panels(&self) -> &[PanelDefinition] {
        &self.panels
    }

    pub fn panel(&self, id: &str) -> Option<&PanelDefinition> {
        self.panels.iter().find(|p| p.id == id)
    }

    /// Alternate textual forms for a canonical component name. Empty when
    /// the component has no alias entry.
    pub fn aliases_for(&self, component: &str) -> &[String] {
        self.aliases
            .get(component)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The memoized word-boundary regex for a table literal. `None` only
    /// for strings that are not in any table, which callers treat as a
    /// non-match.
    pub fn word_pattern(&self, literal: &str) -> Option<&Regex> {
        self.word_patterns.get(literal)
    }

    pub fn units(&self) -> &Vocabulary {
        &self.units
    }

    pub fn methods(&self) -> &Vocabulary {
        &self.methods
    }

    pub fn patterns(&self) -> &PatternSet {
        &self.patterns
    }
}

/// Matches the regex crate's `\w` class closely enough for deciding
/// whether a literal edge needs an explicit boundary assertion.
fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn read_file(dir: &Path, name: &str) -> Result<String, KnowledgeError> {
    let path = dir.join(name);
    std::fs::read_to_string(&path).map_err(|source| KnowledgeError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn parse_file<T: for<'de> Deserialize<'de>>(raw: &str, file: &str) -> Result<T, KnowledgeError> {
    serde_json::from_str(raw).map_err(|e| KnowledgeError::Parse {
        file: file.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_tables_load() {
        let kb = KnowledgeBase::bundled().unwrap();
        assert!(kb.panels().len() >= 10);
        assert!(kb.panel("HEMOGRAMA").is_some());
        assert!(kb.panel("PERFIL_LIPIDICO").is_some());
        assert!(!kb.patterns().result.is_empty());
        assert_eq!(kb.patterns().reference.len(), 5);
    }

    #[test]
    fn every_panel_has_names_and_components() {
        let kb = KnowledgeBase::bundled().unwrap();
        for panel in kb.panels() {
            assert!(!panel.names.is_empty(), "panel {} has no names", panel.id);
            assert!(
                !panel.components.is_empty(),
                "panel {} has no components",
                panel.id
            );
        }
    }

    #[test]
    fn literals_with_regex_punctuation_are_escaped() {
        let kb = KnowledgeBase::bundled().unwrap();
        // Parentheses and slashes in this alias would be active syntax if
        // the literal were compiled unescaped.
        let re = kb.word_pattern("INDICE (COL. TOTAL/HDL)").unwrap();
        assert!(re.is_match("VER INDICE (COL. TOTAL/HDL) 4.2"));
        // A literal ending in ')' has no trailing word boundary to demand.
        assert!(re.is_match("INDICE (COL. TOTAL/HDL)"));
        assert!(!re.is_match("INDICE COL TOTAL HDL"));
        assert!(!re.is_match("VERINDICE (COL. TOTAL/HDL)"));
    }

    #[test]
    fn word_boundary_rejects_partial_words() {
        let kb = KnowledgeBase::bundled().unwrap();
        let re = kb.word_pattern("HEMOGLOBINA").unwrap();
        assert!(re.is_match("HEMOGLOBINA 13.2"));
        assert!(!re.is_match("CARBOXIHEMOGLOBINAS"));
    }

    #[test]
    fn unit_lookup_returns_stored_literal() {
        let kb = KnowledgeBase::bundled().unwrap();
        assert_eq!(kb.units().find("g/dl"), Some("G/DL"));
        assert_eq!(kb.units().find("G/DL"), Some("G/DL"));
        assert_eq!(kb.units().find("FURLONGS"), None);
    }

    #[test]
    fn method_substring_scan() {
        let kb = KnowledgeBase::bundled().unwrap();
        assert_eq!(
            kb.methods().find_in("DETERMINADO POR QUIMIOLUMINISCENCIA EN SUERO"),
            Some("QUIMIOLUMINISCENCIA")
        );
        assert_eq!(kb.methods().find_in("SIN INFORMACION"), None);
    }

    #[test]
    fn duplicate_panel_id_rejected() {
        let panels = vec![
            PanelDefinition {
                id: "X".into(),
                names: vec!["X".into()],
                components: vec!["A".into()],
            },
            PanelDefinition {
                id: "X".into(),
                names: vec!["X".into()],
                components: vec!["B".into()],
            },
        ];
        let err = KnowledgeBase::from_parts(
            panels,
            HashMap::new(),
            vec![],
            vec![],
            RawPatternFile {
                result: vec![],
                reference: vec![],
            },
        )
        .unwrap_err();
        assert!(matches!(err, KnowledgeError::DuplicatePanel(_)));
    }

    #[test]
    fn panel_without_components_rejected() {
        let panels = vec![PanelDefinition {
            id: "VACIO".into(),
            names: vec!["VACIO".into()],
            components: vec![],
        }];
        let err = KnowledgeBase::from_parts(
            panels,
            HashMap::new(),
            vec![],
            vec![],
            RawPatternFile {
                result: vec![],
                reference: vec![],
            },
        )
        .unwrap_err();
        assert!(matches!(err, KnowledgeError::NoComponents(_)));
    }

    #[test]
    fn invalid_pattern_entry_rejected() {
        let err = KnowledgeBase::from_parts(
            vec![],
            HashMap::new(),
            vec![],
            vec![],
            RawPatternFile {
                result: vec![RawNamedPattern {
                    name: "broken".into(),
                    pattern: "(unclosed".into(),
                }],
                reference: vec![],
            },
        )
        .unwrap_err();
        assert!(matches!(err, KnowledgeError::InvalidPattern { .. }));
    }

    #[test]
    fn load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        for (name, contents) in [
            (PANELS_FILE, include_str!("resources/panels.json")),
            (ALIASES_FILE, include_str!("resources/component_aliases.json")),
            (UNITS_FILE, include_str!("resources/units.json")),
            (METHODS_FILE, include_str!("resources/methods.json")),
            (PATTERNS_FILE, include_str!("resources/patterns.json")),
        ] {
            std::fs::write(dir.path().join(name), contents).unwrap();
        }
        let kb = KnowledgeBase::load(dir.path()).unwrap();
        assert_eq!(kb.panels().len(), KnowledgeBase::bundled().unwrap().panels().len());
    }

    #[test]
    fn load_fails_on_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = KnowledgeBase::load(dir.path()).unwrap_err();
        assert!(matches!(err, KnowledgeError::Io { .. }));
    }

    #[test]
    fn load_fails_on_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        for (name, contents) in [
            (PANELS_FILE, "{ not json"),
            (ALIASES_FILE, "{}"),
            (UNITS_FILE, "[]"),
            (METHODS_FILE, "[]"),
            (PATTERNS_FILE, r#"{"result": [], "reference": []}"#),
        ] {
            std::fs::write(dir.path().join(name), contents).unwrap();
        }
        let err = KnowledgeBase::load(dir.path()).unwrap_err();
        assert!(matches!(err, KnowledgeError::Parse { .. }));
    }
}
