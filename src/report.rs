//! End-to-end orchestration: detection followed by per-panel extraction.
//! Pure glue over the two stages; transport and persistence live outside
//! this crate.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::detect::{detect, DetectedPanel};
use crate::extract::{extract, ExtractedComponentRecord};
use crate::knowledge::KnowledgeBase;

/// One detected panel together with its extracted records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelReport {
    pub panel_id: String,
    pub confidence: f32,
    pub matched_names: Vec<String>,
    pub records: Vec<ExtractedComponentRecord>,
}

/// The full analysis of one document. A non-medical document produces an
/// analysis with `is_medical = false` and no panels, which is a valid
/// result, not a failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportAnalysis {
    pub document_id: Uuid,
    pub is_medical: bool,
    pub confidence: String,
    pub panels: Vec<PanelReport>,
    pub total_panels: usize,
}

/// Run both stages over a document. Deterministic: identical input and
/// knowledge base always produce the same panels and records, in the same
/// order.
pub fn analyze_report(document_id: Uuid, text: &str, kb: &KnowledgeBase) -> ReportAnalysis {
    let _span = tracing::info_span!("analyze_report", doc_id = %document_id).entered();

    let (detected, summary) = detect(text, kb);
    let panels: Vec<PanelReport> = detected
        .iter()
        .map(|panel| build_panel_report(text, panel, kb))
        .collect();

    tracing::info!(
        is_medical = summary.is_medical,
        panels = panels.len(),
        "report analysis finished"
    );

    ReportAnalysis {
        document_id,
        is_medical: summary.is_medical,
        confidence: if summary.is_medical { "1.0" } else { "0.0" }.to_string(),
        total_panels: panels.len(),
        panels,
    }
}

fn build_panel_report(text: &str, panel: &DetectedPanel, kb: &KnowledgeBase) -> PanelReport {
    PanelReport {
        panel_id: panel.panel_id.clone(),
        confidence: panel.confidence,
        matched_names: panel.matched_names.clone(),
        records: extract(text, panel, kb),
    }
}
