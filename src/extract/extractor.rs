use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::types::{ExtractedComponentRecord, ReferenceRange, ValueKind};
use crate::detect::DetectedPanel;
use crate::knowledge::{KnowledgeBase, ReferenceKind};

/// Document labels that terminate a component-name span.
const LABEL_KEYWORDS: &[&str] = &[
    " METODO:",
    " MÉTODO:",
    " VALOR:",
    " RESULTADO:",
    " MUESTRA:",
];

/// Keyword roots used when scanning word by word.
const LABEL_ROOTS: &[&str] = &["METODO", "MÉTODO", "VALOR", "RESULTADO", "MUESTRA"];

static DIGIT_AFTER_SPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+\d").expect("valid regex"));
static PUNCT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[,:;]").expect("valid regex"));
static NUMERIC_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+[.,]?\d*").expect("valid regex"));
static METHOD_LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:METODO|MÉTODO)\s*:\s*(\w+)").expect("valid regex"));

/// Stage 2: walk the document line by line and produce one structured
/// record per line that reports a component of `panel`. Only this panel's
/// declared component list is consulted, so a stray mention of another
/// panel's analyte never leaks into these results.
///
/// Within a line, components are tried in declared order and the first
/// name/alias match claims the line; no second component is tested against
/// it, which keeps one line from producing two overlapping records.
pub fn extract(
    document_text: &str,
    panel: &DetectedPanel,
    kb: &KnowledgeBase,
) -> Vec<ExtractedComponentRecord> {
    let Some(definition) = kb.panel(&panel.panel_id) else {
        debug!(panel = %panel.panel_id, "unknown panel id, nothing to extract");
        return Vec::new();
    };

    let mut records = Vec::new();
    for line in document_text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let line_upper = line.to_uppercase();

        let claimed = definition
            .components
            .iter()
            .find(|component| component_matches(&line_upper, component, kb));
        if let Some(component) = claimed {
            if let Some(record) = extract_component_line(line, &line_upper, component, kb) {
                debug!(
                    component = %record.component,
                    value = %record.value,
                    "extracted record"
                );
                records.push(record);
            }
        }
    }
    records
}

/// Word-boundary match of the canonical name or any alias.
fn component_matches(line_upper: &str, component: &str, kb: &KnowledgeBase) -> bool {
    if kb
        .word_pattern(component)
        .is_some_and(|re| re.is_match(line_upper))
    {
        return true;
    }
    kb.aliases_for(component).iter().any(|alias| {
        kb.word_pattern(alias)
            .is_some_and(|re| re.is_match(line_upper))
    })
}

/// Run the resolution steps for one claimed line. Returns `None` when no
/// value could be resolved; every other field stays optional.
fn extract_component_line(
    line: &str,
    line_upper: &str,
    component: &str,
    kb: &KnowledgeBase,
) -> Option<ExtractedComponentRecord> {
    let resolved_name = resolve_component_name(line_upper, component, kb);

    let mut remaining = line_upper.replacen(&resolved_name, "", 1).trim().to_string();

    let mut value: Option<(String, ValueKind)> = None;
    let mut unit = None;

    // Qualitative takes priority: a number-like fragment inside a
    // qualitative phrase must not be misread as the value.
    if let Some(qual) = kb.patterns().result_pattern("qualitative") {
        if let Some(caps) = qual.captures(&remaining) {
            if let Some(m) = caps.get(1) {
                let phrase = m.as_str().to_string();
                remaining = remaining.replacen(&phrase, "", 1).trim().to_string();
                value = Some((phrase, ValueKind::Qualitative));
            }
        }
    }

    if value.is_none() {
        if let Some(m) = NUMERIC_TOKEN_RE.find(&remaining) {
            value = Some((m.as_str().replace(',', "."), ValueKind::Numeric));
            let stripped = format!("{}{}", &remaining[..m.start()], &remaining[m.end()..]);
            remaining = stripped.trim().to_string();

            // Units only accompany numeric values. The candidate is built
            // from the original line, since spacing around slashes may
            // differ from what survives in the remainder.
            if let Some(found) = resolve_unit(line_upper, kb) {
                remaining = remaining.replacen(found, "", 1).trim().to_string();
                unit = Some(found.to_string());
            }
        }
    }

    let reference_range = resolve_reference_range(&mut remaining, kb);
    let method = resolve_method(&remaining, kb);

    // A record without a value is not a record.
    let (value, value_kind) = value?;
    Some(ExtractedComponentRecord {
        component: resolved_name,
        source_line: line.to_string(),
        value,
        value_kind,
        unit,
        reference_range,
        method,
    })
}

/// Extend the captured span forward from the match position to the first
/// label keyword, digit preceded by whitespace, punctuation delimiter, or
/// qualitative result phrase; without any of those, take the full word run
/// up to a label keyword. Canonical name and aliases are all tried and the
/// longest capture wins, so multi-word names ("COLESTEROL TOTAL") come out
/// whole without needing their own table entry.
fn resolve_component_name(line_upper: &str, component: &str, kb: &KnowledgeBase) -> String {
    let qualitative = kb.patterns().result_pattern("qualitative");
    let mut candidates: Vec<String> = Vec::new();

    let literals = std::iter::once(component).chain(kb.aliases_for(component).iter().map(String::as_str));
    for literal in literals {
        let Some(start) = line_upper.find(literal) else {
            continue;
        };
        let tail = &line_upper[start..];

        let mut ends: Vec<usize> = Vec::new();
        for keyword in LABEL_KEYWORDS {
            if let Some(idx) = tail.find(keyword) {
                if idx > 0 {
                    ends.push(idx);
                }
            }
        }
        if let Some(m) = DIGIT_AFTER_SPACE_RE.find(tail) {
            ends.push(m.start());
        }
        if let Some(m) = PUNCT_RE.find(tail) {
            ends.push(m.start());
        }
        if let Some(m) = qualitative.and_then(|re| re.find(tail)) {
            if m.start() > 0 {
                ends.push(m.start());
            }
        }

        if let Some(&end) = ends.iter().min() {
            let name = tail[..end].trim();
            if !name.is_empty() {
                candidates.push(name.to_string());
            }
        } else {
            let mut words: Vec<&str> = Vec::new();
            for word in tail.split_whitespace() {
                if LABEL_ROOTS.iter().any(|root| word.contains(root)) {
                    break;
                }
                words.push(word);
            }
            if !words.is_empty() {
                candidates.push(words.join(" "));
            }
        }
    }

    candidates
        .into_iter()
        .max_by_key(String::len)
        .unwrap_or_else(|| component.to_string())
}

/// Rebuild candidate unit strings from the line: split on whitespace with
/// `/` as its own token, then try every contiguous token span, shortest
/// first from each start, joined without spaces, against the vocabulary.
/// The vocabulary literal is returned verbatim, never the document text.
fn resolve_unit<'kb>(line_upper: &str, kb: &'kb KnowledgeBase) -> Option<&'kb str> {
    let prepared = line_upper.replace('/', " / ");
    let words: Vec<&str> = prepared.split_whitespace().collect();
    for i in 0..words.len() {
        for j in (i + 1)..=words.len() {
            let candidate = words[i..j].concat();
            if let Some(found) = kb.units().find(&candidate) {
                return Some(found);
            }
        }
    }
    None
}

/// Match the reference patterns in their fixed priority order, pull the
/// numbers out of the matched span, and strip the span from the remainder.
fn resolve_reference_range(remaining: &mut String, kb: &KnowledgeBase) -> Option<ReferenceRange> {
    for pattern in &kb.patterns().reference {
        let Some(m) = pattern.regex.find(remaining) else {
            continue;
        };
        let numbers: Vec<f64> = NUMERIC_TOKEN_RE
            .find_iter(m.as_str())
            .filter_map(|n| n.as_str().replace(',', ".").parse().ok())
            .collect();

        let range = match pattern.kind {
            ReferenceKind::Range if numbers.len() >= 2 => Some(ReferenceRange {
                min: Some(numbers[0]),
                max: Some(numbers[1]),
            }),
            ReferenceKind::UpTo | ReferenceKind::LessThan if !numbers.is_empty() => {
                Some(ReferenceRange {
                    min: None,
                    max: Some(numbers[0]),
                })
            }
            ReferenceKind::GreaterThan if !numbers.is_empty() => Some(ReferenceRange {
                min: Some(numbers[0]),
                max: None,
            }),
            // "normal" and under-numbered spans carry no bounds.
            _ => None,
        };

        let stripped = format!("{}{}", &remaining[..m.start()], &remaining[m.end()..]);
        *remaining = stripped.trim().to_string();
        return range;
    }
    None
}

/// An explicit METODO:/MÉTODO: label wins when its token is a known
/// method; otherwise any vocabulary literal found as a plain substring.
fn resolve_method(remaining: &str, kb: &KnowledgeBase) -> Option<String> {
    if let Some(caps) = METHOD_LABEL_RE.captures(remaining) {
        if let Some(token) = caps.get(1) {
            if let Some(stored) = kb.methods().find(token.as_str()) {
                return Some(stored.to_string());
            }
        }
    }
    kb.methods().find_in(remaining).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::PANEL_CONFIDENCE;

    fn kb() -> KnowledgeBase {
        KnowledgeBase::bundled().unwrap()
    }

    fn panel(id: &str) -> DetectedPanel {
        DetectedPanel {
            panel_id: id.to_string(),
            confidence: PANEL_CONFIDENCE,
            matched_names: vec![],
            matched_components: vec![],
        }
    }

    #[test]
    fn numeric_line_with_unit_range_and_method() {
        let records = extract(
            "HEMOGLOBINA 13.2 G/DL 12.0 - 16.0 METODO: COLORIMETRICO",
            &panel("HEMOGRAMA"),
            &kb(),
        );
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.component, "HEMOGLOBINA");
        assert_eq!(r.value, "13.2");
        assert_eq!(r.value_kind, ValueKind::Numeric);
        assert_eq!(r.unit.as_deref(), Some("G/DL"));
        let range = r.reference_range.unwrap();
        assert_eq!(range.min, Some(12.0));
        assert_eq!(range.max, Some(16.0));
        assert_eq!(r.method.as_deref(), Some("COLORIMETRICO"));
    }

    #[test]
    fn qualitative_line() {
        let records = extract("VDRL NO REACTIVO", &panel("MICROBIOLOGIA"), &kb());
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.component, "VDRL");
        assert_eq!(r.value, "NO REACTIVO");
        assert_eq!(r.value_kind, ValueKind::Qualitative);
        assert!(r.unit.is_none());
        assert!(r.reference_range.is_none());
    }

    #[test]
    fn comma_decimal_is_normalized() {
        let records = extract("HEMOGLOBINA 13,2 G/DL", &panel("HEMOGRAMA"), &kb());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].value, "13.2");
    }

    #[test]
    fn first_declared_component_claims_the_line() {
        // HEMATOCRITO is declared before HEMOGLOBINA in the HEMOGRAMA
        // panel; a line naming both must yield exactly one record, for
        // HEMATOCRITO.
        let records = extract(
            "HEMATOCRITO 40 % HEMOGLOBINA 13.2 G/DL",
            &panel("HEMOGRAMA"),
            &kb(),
        );
        assert_eq!(records.len(), 1);
        assert!(records[0].component.starts_with("HEMATOCRITO"));
    }

    #[test]
    fn line_without_value_produces_no_record() {
        let records = extract("HEMOGLOBINA PENDIENTE", &panel("HEMOGRAMA"), &kb());
        assert!(records.is_empty());
    }

    #[test]
    fn multi_word_component_name_is_resolved_whole() {
        let records = extract(
            "COLESTEROL TOTAL 185 MG/DL HASTA 200",
            &panel("PERFIL_LIPIDICO"),
            &kb(),
        );
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.component, "COLESTEROL TOTAL");
        assert_eq!(r.value, "185");
        assert_eq!(r.unit.as_deref(), Some("MG/DL"));
        let range = r.reference_range.unwrap();
        assert_eq!(range.min, None);
        assert_eq!(range.max, Some(200.0));
    }

    #[test]
    fn greater_than_reference_sets_min_only() {
        let records = extract(
            "TESTOSTERONA 350 NG/ML MAYOR A 300",
            &panel("HORMONAS"),
            &kb(),
        );
        assert_eq!(records.len(), 1);
        let range = records[0].reference_range.unwrap();
        assert_eq!(range.min, Some(300.0));
        assert_eq!(range.max, None);
    }

    #[test]
    fn method_found_without_label() {
        let records = extract("GLICEMIA 90 MG/DL ENZIMATICO", &panel("PERFIL_BIOQUIMICO"), &kb());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].method.as_deref(), Some("ENZIMATICO"));
    }

    #[test]
    fn unit_is_returned_verbatim_from_vocabulary() {
        let records = extract("HEMOGLOBINA 13.2 g/dl", &panel("HEMOGRAMA"), &kb());
        assert_eq!(records.len(), 1);
        // Vocabulary spelling, not document spelling.
        assert_eq!(records[0].unit.as_deref(), Some("G/DL"));
    }

    #[test]
    fn alias_claims_the_line_for_its_canonical_component() {
        let records = extract("HB 13.2 G/DL", &panel("HEMOGRAMA"), &kb());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].component, "HB");
        assert_eq!(records[0].value, "13.2");
    }

    #[test]
    fn other_panels_components_do_not_leak() {
        // TSH belongs to PERFIL_TIROIDEO; extracting for HEMOGRAMA must
        // ignore the line entirely.
        let records = extract("TSH 2.5 UI/ML", &panel("HEMOGRAMA"), &kb());
        assert!(records.is_empty());
    }

    #[test]
    fn unknown_panel_id_extracts_nothing() {
        let records = extract("HEMOGLOBINA 13.2 G/DL", &panel("NO_SUCH_PANEL"), &kb());
        assert!(records.is_empty());
    }

    #[test]
    fn extraction_is_line_scoped() {
        let text = "HEMOGLOBINA 13.2 G/DL 12.0 - 16.0\nHEMATOCRITO 40 %\nPLAQUETAS 250 MIL/MM3";
        let records = extract(text, &panel("HEMOGRAMA"), &kb());
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].component, "HEMOGLOBINA");
        assert!(records[1].component.starts_with("HEMATOCRITO"));
        assert_eq!(records[2].component, "PLAQUETAS");
    }
}
