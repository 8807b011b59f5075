use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Bounds parsed out of a free-form reference-range string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RangeBounds {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
}

impl RangeBounds {
    pub fn is_empty(&self) -> bool {
        self.min_value.is_none() && self.max_value.is_none()
    }
}

enum Shape {
    Between,
    UpTo,
    AtLeast,
    Below,
}

static RANGE_SHAPES: LazyLock<Vec<(Shape, Regex)>> = LazyLock::new(|| {
    vec![
        (
            Shape::Between,
            Regex::new(r"(\d+\.?\d*)\s*[-–]\s*(\d+\.?\d*)").expect("valid regex"),
        ),
        (
            Shape::UpTo,
            Regex::new(r"HASTA\s*(\d+\.?\d*)").expect("valid regex"),
        ),
        (
            Shape::AtLeast,
            Regex::new(r"(?:>|MAYOR\s*(?:A|DE|QUE)?)\s*(\d+\.?\d*)").expect("valid regex"),
        ),
        (
            Shape::Below,
            Regex::new(r"(?:<|MENOR\s*(?:A|DE|QUE)?)\s*(\d+\.?\d*)").expect("valid regex"),
        ),
        (
            Shape::Between,
            Regex::new(r"ENTRE\s*(\d+\.?\d*)\s*Y\s*(\d+\.?\d*)").expect("valid regex"),
        ),
    ]
});

/// Parse a reference-range string ("12.0 - 16.0", "HASTA 200", "> 60",
/// "ENTRE 3.5 Y 5.0") into its bounds. Used by the patient-metadata scan
/// independently of the extractor's pattern tables. Unrecognized input
/// yields empty bounds, never an error.
pub fn normalize_reference_range(text: &str) -> RangeBounds {
    if text.trim().is_empty() {
        return RangeBounds::default();
    }
    let upper = text.to_uppercase();

    for (shape, regex) in RANGE_SHAPES.iter() {
        let Some(caps) = regex.captures(&upper) else {
            continue;
        };
        let number = |i: usize| -> Option<f64> {
            caps.get(i).and_then(|m| m.as_str().parse().ok())
        };
        return match shape {
            Shape::Between => RangeBounds {
                min_value: number(1),
                max_value: number(2),
            },
            Shape::UpTo | Shape::Below => RangeBounds {
                min_value: None,
                max_value: number(1),
            },
            Shape::AtLeast => RangeBounds {
                min_value: number(1),
                max_value: None,
            },
        };
    }
    RangeBounds::default()
}
