use std::sync::LazyLock;

use regex::Regex;

static NUMBER_SHAPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d*\.?\d+$").expect("valid regex"));
static NON_TEXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s,.;:()/\-+]").expect("valid regex"));
static NON_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s/-]").expect("valid regex"));

/// Normalize a numeric value string: strip whitespace, comma to dot,
/// collapse extra decimal points (first separator kept as the decimal
/// point, remaining digit groups joined behind it), then validate the
/// digits[.digits] shape. Anything else comes back as an empty string.
pub fn normalize_value(value: &str) -> String {
    let collapsed: String = value.split_whitespace().collect();
    let mut v = collapsed.replace(',', ".");

    if v.matches('.').count() > 1 {
        let mut parts = v.split('.');
        let head = parts.next().unwrap_or_default();
        let tail: String = parts.collect();
        v = format!("{head}.{tail}");
    }

    if NUMBER_SHAPE_RE.is_match(&v) {
        v
    } else {
        String::new()
    }
}

/// Prepare a whole document for matching: drop everything outside word
/// characters, whitespace and clinical punctuation, collapse whitespace,
/// uppercase.
pub fn normalize_text(text: &str) -> String {
    let cleaned = NON_TEXT_RE.replace_all(text, " ");
    cleaned
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// Clean a component name for comparison: word characters, whitespace,
/// slash and hyphen survive; everything else is dropped.
pub fn clean_component_name(name: &str) -> String {
    let cleaned = NON_NAME_RE.replace_all(name, "");
    cleaned
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comma_becomes_dot() {
        assert_eq!(normalize_value("12,5"), "12.5");
    }

    #[test]
    fn multiple_separators_collapse() {
        assert_eq!(normalize_value("1.2.3"), "1.23");
        assert_eq!(normalize_value("1,2,3"), "1.23");
    }

    #[test]
    fn non_numeric_is_rejected() {
        assert_eq!(normalize_value("abc"), "");
        assert_eq!(normalize_value("12abc"), "");
        assert_eq!(normalize_value(""), "");
    }

    #[test]
    fn plain_numbers_pass_through() {
        assert_eq!(normalize_value("42"), "42");
        assert_eq!(normalize_value("0.5"), "0.5");
        assert_eq!(normalize_value(".5"), ".5");
    }

    #[test]
    fn embedded_whitespace_is_stripped() {
        assert_eq!(normalize_value(" 13 , 2 "), "13.2");
    }

    #[test]
    fn text_normalization_uppercases_and_collapses() {
        assert_eq!(
            normalize_text("Hemoglobina:  13.2   g/dl *"),
            "HEMOGLOBINA: 13.2 G/DL"
        );
    }

    #[test]
    fn component_name_cleaning() {
        assert_eq!(clean_component_name("Col. HDL (directo)"), "COL HDL DIRECTO");
        assert_eq!(clean_component_name("GOT/AST"), "GOT/AST");
    }
}
