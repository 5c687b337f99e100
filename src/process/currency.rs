use crate::decode::Cell;
use once_cell::sync::Lazy;
use regex::Regex;

static LEADING_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-?([0-9]+\.?[0-9]*|\.[0-9]+)").expect("leading number regex is valid")
});

/// Normalise a currency cell to a number. Missing or unreadable values become `0.0`.
/// Negative amounts are kept as they are.
pub fn parse_currency(raw: Option<&Cell>) -> f64 {
    match raw {
        Some(Cell::Number(n)) if n.is_finite() => *n,
        Some(Cell::Text(s)) => parse_currency_str(s),
        _ => 0.0,
    }
}

/// `"R$ 1.234,56"` → `1234.56`.
///
/// Everything except digits, `,`, `.` and `-` is dropped. If a comma survives,
/// the amount is in Brazilian notation: periods are thousands separators and the
/// (first) comma is the decimal mark. The longest leading number is then read,
/// so `"1.234.567"` without a comma reads as `1.234`.
pub fn parse_currency_str(raw: &str) -> f64 {
    let mut cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-'))
        .collect();

    if cleaned.contains(',') {
        cleaned = cleaned.replace('.', "").replacen(',', ".", 1);
    }

    LEADING_NUMBER
        .find(&cleaned)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}
