use tracing::debug;

use super::types::{DetectedPanel, DetectionSummary};
use crate::knowledge::KnowledgeBase;

/// Words whose presence counts as evidence that a document is a lab
/// report at all. At least two distinct indicators are required.
const MEDICAL_INDICATORS: &[&str] = &[
    "LABORATORIO",
    "HOSPITAL",
    "CLINICA",
    "RESULTADO",
    "INFORME",
    "EXAMEN",
];

/// Panel confidence is a fixed constant; no scoring formula exists yet.
pub const PANEL_CONFIDENCE: f32 = 1.0;

/// How many characters after a component mention are searched for a
/// result-shaped signal before the component counts as confirmed.
const LOOKAHEAD_CHARS: usize = 100;

/// Stage 1: decide whether the document is a medical report and, if so,
/// which panels it covers. Never fails; "no panels" is an ordinary result.
///
/// Panels come back in knowledge-base definition order, and confirmed
/// components in their declared panel order, so identical input always
/// yields an identical result.
pub fn detect(document_text: &str, kb: &KnowledgeBase) -> (Vec<DetectedPanel>, DetectionSummary) {
    let text = document_text.to_uppercase();

    if !is_medical_document(&text) {
        debug!("document does not look like a medical report");
        return (
            Vec::new(),
            DetectionSummary {
                is_medical: false,
                total_detected: 0,
            },
        );
    }

    let mut detected = Vec::new();
    for panel in kb.panels() {
        let matched_names: Vec<String> = panel
            .names
            .iter()
            .filter(|name| {
                kb.word_pattern(name)
                    .is_some_and(|re| re.is_match(&text))
            })
            .cloned()
            .collect();
        if matched_names.is_empty() {
            continue;
        }
        debug!(panel = %panel.id, names = matched_names.len(), "panel name matched");

        let mut matched_components = Vec::new();
        for component in &panel.components {
            if component_confirmed(&text, component, kb)
                || kb
                    .aliases_for(component)
                    .iter()
                    .any(|alias| component_confirmed(&text, alias, kb))
            {
                debug!(panel = %panel.id, component = %component, "component confirmed");
                matched_components.push(component.clone());
            }
        }

        // A name alone is not a panel; at least one component must carry
        // an actual result signal.
        if !matched_components.is_empty() {
            detected.push(DetectedPanel {
                panel_id: panel.id.clone(),
                confidence: PANEL_CONFIDENCE,
                matched_names,
                matched_components,
            });
        }
    }

    let summary = DetectionSummary {
        is_medical: true,
        total_detected: detected.len(),
    };
    debug!(total = summary.total_detected, "detection finished");
    (detected, summary)
}

/// At least 2 distinct indicator keywords present as substrings of the
/// already-uppercased text.
pub fn is_medical_document(upper_text: &str) -> bool {
    let count = MEDICAL_INDICATORS
        .iter()
        .filter(|indicator| upper_text.contains(*indicator))
        .count();
    count >= 2
}

/// A component is confirmed only when some occurrence of `literal` is
/// followed, within the lookahead window, by a result-shape match, a
/// reference-range match, or a known unit literal. Bare mentions in
/// headers or captions fail this test.
fn component_confirmed(text: &str, literal: &str, kb: &KnowledgeBase) -> bool {
    let Some(re) = kb.word_pattern(literal) else {
        return false;
    };
    for m in re.find_iter(text) {
        let context = lookahead(text, m.end(), LOOKAHEAD_CHARS);
        if kb
            .patterns()
            .result
            .iter()
            .any(|p| p.regex.is_match(context))
        {
            return true;
        }
        if kb
            .patterns()
            .reference
            .iter()
            .any(|p| p.regex.is_match(context))
        {
            return true;
        }
        if kb.units().find_in(context).is_some() {
            return true;
        }
    }
    false
}

/// The window of up to `chars` characters starting at byte `start`.
/// Counted in chars, not bytes: the uppercased text carries Ñ and accents.
fn lookahead(text: &str, start: usize, chars: usize) -> &str {
    let end = text[start..]
        .char_indices()
        .nth(chars)
        .map(|(i, _)| start + i)
        .unwrap_or(text.len());
    &text[start..end]
}
