//! Coercion of noisy cell values into plain numbers.

use crate::models::table::{is_null_marker, Cell, Scalar};

/// Parse a currency-formatted amount such as `"$1,234.50"`.
///
/// Commas, currency symbols and every other character except digits, `.`
/// and `-` are stripped before parsing. Anything that does not leave a
/// finite number yields `None`.
pub fn parse_amount(text: &str) -> Option<f64> {
    if is_null_marker(text) {
        return None;
    }

    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    if matches!(cleaned.as_str(), "" | "-" | ".") {
        return None;
    }

    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Converts cells of any shape into numbers; never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumericCoercer;

impl NumericCoercer {
    pub fn new() -> Self {
        Self
    }

    /// Coerce a cell to a number, or `None` when it holds no usable number.
    ///
    /// Sequences contribute their first element that is not a null marker.
    pub fn coerce(&self, cell: &Cell) -> Option<f64> {
        match cell.present()? {
            Scalar::Number(n) => n.is_finite().then_some(*n),
            Scalar::Text(text) => parse_amount(text),
        }
    }

    /// Product of two optional numbers; a missing operand gives `None`.
    pub fn product(a: Option<f64>, b: Option<f64>) -> Option<f64> {
        Some(a? * b?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1,000.00"), Some(1000.0));
        assert_eq!(parse_amount("$3,250.00"), Some(3250.0));
        assert_eq!(parse_amount(" -12.5 USD"), Some(-12.5));
        assert_eq!(parse_amount("€ 7"), Some(7.0));
        assert_eq!(parse_amount("12 pcs"), Some(12.0));
    }

    #[test]
    fn test_parse_amount_rejects_degenerate() {
        for text in ["", "  ", "nan", "None", "-", ".", "$", "n/a", "1.2.3", "5-3", "--"] {
            assert_eq!(parse_amount(text), None, "input {text:?}");
        }
        assert_eq!(parse_amount(&"9".repeat(400)), None);
    }

    #[test]
    fn test_coerce_every_shape() {
        let coercer = NumericCoercer::new();

        assert_eq!(coercer.coerce(&Cell::Null), None);
        assert_eq!(coercer.coerce(&Cell::number(2.5)), Some(2.5));
        assert_eq!(coercer.coerce(&Cell::number(f64::NAN)), None);
        assert_eq!(coercer.coerce(&Cell::number(f64::INFINITY)), None);
        assert_eq!(coercer.coerce(&Cell::text("$1,234.50")), Some(1234.5));
        assert_eq!(coercer.coerce(&Cell::text("NaN")), None);
        assert_eq!(
            coercer.coerce(&Cell::Sequence(vec![
                None,
                Some(Scalar::Text("none".to_string())),
                Some(Scalar::Text("4".to_string())),
            ])),
            Some(4.0)
        );
        assert_eq!(coercer.coerce(&Cell::Sequence(vec![])), None);
        // First present element decides, even when it is not numeric.
        assert_eq!(
            coercer.coerce(&Cell::Sequence(vec![
                Some(Scalar::Text("abc".to_string())),
                Some(Scalar::Number(1.0)),
            ])),
            None
        );
    }

    #[test]
    fn test_product() {
        assert_eq!(NumericCoercer::product(Some(2.0), Some(1.5)), Some(3.0));
        assert_eq!(NumericCoercer::product(None, Some(1.5)), None);
        assert_eq!(NumericCoercer::product(Some(2.0), None), None);
    }
}
