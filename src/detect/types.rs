use serde::{Deserialize, Serialize};

/// A panel found in a document, with the evidence that put it there.
/// Transient: produced per detection call and handed straight to the
/// caller, never stored by this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedPanel {
    pub panel_id: String,
    /// Fixed at 1.0 for now; the slot where a weighted scoring policy
    /// would plug in.
    pub confidence: f32,
    /// Panel name aliases that actually appeared in the text.
    pub matched_names: Vec<String>,
    /// Canonical components confirmed present, in declared panel order.
    pub matched_components: Vec<String>,
}

/// Summary metadata for one detection pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionSummary {
    pub is_medical: bool,
    pub total_detected: usize,
}
