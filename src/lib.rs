//! labex — deterministic panel detection and structured result extraction
//! for clinical lab reports.
//!
//! The crate takes the raw text of a report (already recovered from its
//! container by an external collaborator) and runs a two-stage pipeline
//! over an immutable knowledge base: stage 1 decides which medical panels
//! the document covers, stage 2 turns each matched line into a structured
//! record (value, unit, reference range, analysis method). A set of pure
//! normalizers is shared with the patient-metadata scan.
//!
//! Everything after knowledge-base load is a pure function of its input:
//! no I/O, no shared mutable state, safe to call from any number of
//! threads.

pub mod knowledge;
pub mod normalize;
pub mod detect; // stage 1: panel detection
pub mod extract; // stage 2: per-line component extraction
pub mod metadata;
pub mod report;

pub use detect::{detect, DetectedPanel, DetectionSummary};
pub use extract::{extract, ExtractedComponentRecord, ReferenceRange, ValueKind};
pub use knowledge::{KnowledgeBase, KnowledgeError};
pub use metadata::{extract_patient_data, PatientMetadata};
pub use report::{analyze_report, PanelReport, ReportAnalysis};
