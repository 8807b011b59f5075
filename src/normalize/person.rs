use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Role and label words that must not survive inside a patient name.
static ROLE_WORDS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(paciente|nombre|edad|rut|dni|señor|señora|sr|sra|don|doña)\b")
        .expect("valid regex")
});

/// Age patterns, most specific first. The first pattern that captures at
/// least one group wins.
static AGE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        // Compact notation: "12A 3M 10D"
        Regex::new(r"(?i)(\d+)\s*A\s+(\d+)\s*M(?:\s+(\d+)\s*D)?").expect("valid regex"),
        // Years with optional months and days spelled out
        Regex::new(
            r"(?i)(\d+)\s*(?:AÑOS?|YEARS?|A)\s*(?:(\d+)\s*(?:MESES?|MONTHS?|M))?\s*(?:(\d+)\s*(?:DIAS?|DAYS?|D))?",
        )
        .expect("valid regex"),
        // Years only
        Regex::new(r"(?i)(\d+)\s*(?:AÑOS?|YEARS?|A)").expect("valid regex"),
        // Bare number as a last resort
        Regex::new(r"(\d+)").expect("valid regex"),
    ]
});

/// Patterns that locate the patient-name field inside a header line.
static NAME_FIELD_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)(?:Nombre del Paciente|Nombre|Paciente)\s*:?\s*([A-ZÁ-ÚÑ][A-ZÁ-ÚÑa-záéíóúñ\s,]+)")
            .expect("valid regex"),
        Regex::new(r"(?i)(?:Sr\.|Sra\.|Don|Doña)\s+([A-ZÁ-ÚÑ][A-ZÁ-ÚÑa-záéíóúñ\s,]+)")
            .expect("valid regex"),
        Regex::new(r"(?i)(?:Patient|Name)\s*:?\s*([A-ZÁ-ÚÑ][A-ZÁ-ÚÑa-záéíóúñ\s,]+)")
            .expect("valid regex"),
        // The delimiter is matched, not looked ahead at; only group 1 is
        // ever returned.
        Regex::new(r"^([A-ZÁ-ÚÑ][A-ZÁ-ÚÑa-záéíóúñ\s,]+)(?:\s*\d|\s*,|\s*Edad|\s*RUT)")
            .expect("valid regex"),
    ]
});

/// A structured age: components plus the composed short label ("12a 3m").
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Age {
    pub years: u32,
    pub months: u32,
    pub days: u32,
    pub label: String,
}

/// Normalize a patient name: handle "LASTNAME, FIRSTNAME" (swap) and
/// "LABEL: NAME" (tail) layouts, title-case the words, drop role words,
/// collapse whitespace.
pub fn normalize_name(text: &str) -> String {
    let trimmed = text.trim();

    let reordered = if let Some((last, first)) = trimmed.split_once(',') {
        format!("{} {}", first.trim(), last.trim())
    } else if let Some((_, tail)) = trimmed.split_once(':') {
        tail.trim().to_string()
    } else {
        trimmed.to_string()
    };

    let titled = reordered
        .split_whitespace()
        .map(title_case)
        .collect::<Vec<_>>()
        .join(" ");

    let stripped = ROLE_WORDS_RE.replace_all(&titled, "");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

/// Find the fragment of a header line that holds the patient name, if any.
pub fn identify_name_field(line: &str) -> Option<String> {
    for pattern in NAME_FIELD_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(line) {
            if let Some(m) = caps.get(1) {
                return Some(m.as_str().trim().to_string());
            }
        }
    }
    None
}

/// Normalize a RUT/DNI: drop dots and spaces, and insert the hyphen
/// before the check character when it is missing.
pub fn normalize_rut(rut: &str) -> String {
    let cleaned = rut.replace(['.', ' '], "");
    if !cleaned.contains('-') && cleaned.chars().count() > 1 {
        let split_at = cleaned
            .char_indices()
            .last()
            .map(|(i, _)| i)
            .unwrap_or_default();
        format!("{}-{}", &cleaned[..split_at], &cleaned[split_at..])
    } else {
        cleaned
    }
}

/// Parse a free-form age string into structured components. Tries the age
/// patterns from most to least specific; when none captures anything the
/// zeroed structure with an empty label is returned.
pub fn normalize_age(age_text: &str) -> Age {
    let text = age_text.trim();
    if text.is_empty() {
        return Age::default();
    }

    for pattern in AGE_PATTERNS.iter() {
        let Some(caps) = pattern.captures(text) else {
            continue;
        };
        let group = |i: usize| -> u32 {
            caps.get(i)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(0)
        };
        let years = group(1);
        let months = group(2);
        let days = group(3);

        let mut parts = Vec::new();
        if years > 0 {
            parts.push(format!("{years}a"));
        }
        if months > 0 {
            parts.push(format!("{months}m"));
        }
        if days > 0 {
            parts.push(format!("{days}d"));
        }
        let label = if parts.is_empty() {
            "0a".to_string()
        } else {
            parts.join(" ")
        };

        return Age {
            years,
            months,
            days,
            label,
        };
    }

    debug!(text = %text, "no age pattern matched");
    Age::default()
}
