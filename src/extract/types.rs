use serde::{Deserialize, Serialize};

/// Whether a resolved value is a phrase ("NO REACTIVO") or a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Qualitative,
    Numeric,
}

/// The clinically normal interval attached to a reported value. At least
/// one bound is always present; a rangeless record carries `None` at the
/// record level instead.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

/// One structured result extracted from one line of the report. Only ever
/// produced when a value was resolved; every other field is optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedComponentRecord {
    /// Component name as resolved from the line, which may extend the
    /// table entry (e.g. "COLESTEROL TOTAL" resolved from "COLESTEROL").
    pub component: String,
    pub source_line: String,
    pub value: String,
    pub value_kind: ValueKind,
    /// Unit literal, verbatim from the vocabulary when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_range: Option<ReferenceRange>,
    /// Analysis method, verbatim from the vocabulary when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}
