//! Cell coercion
//!
//! Malformed cells are repaired here rather than rejected: text that is not a
//! number becomes `None` and the caller substitutes its default.

use crate::workbook::Cell;

/// Render a cell as trimmed text; `None` for blanks
///
/// Integral numbers render without a fractional part so that a numeric
/// guest OS or id cell reads naturally.
#[must_use]
pub(crate) fn text(cell: &Cell) -> Option<String> {
    match cell {
        Cell::Empty => None,
        Cell::Text(text) => {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Cell::Number(n) => Some(render_number(*n)),
        Cell::Bool(b) => Some(b.to_string()),
    }
}

/// Parse a cell as a number; `None` for blanks and unparsable text
#[must_use]
pub(crate) fn number(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Number(n) if n.is_finite() => Some(*n),
        Cell::Text(text) => {
            let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();
            cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
        }
        Cell::Empty | Cell::Number(_) | Cell::Bool(_) => None,
    }
}

/// Parse a cell as a non-negative count, truncating fractions
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn count(cell: &Cell) -> Option<u32> {
    number(cell).map(|n| {
        if n <= 0.0 {
            0
        } else if n >= f64::from(u32::MAX) {
            u32::MAX
        } else {
            n.trunc() as u32
        }
    })
}

#[allow(clippy::cast_possible_truncation)]
fn render_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_trims_and_renders_numbers() {
        assert_eq!(text(&Cell::from("  Ubuntu ")), Some("Ubuntu".to_string()));
        assert_eq!(text(&Cell::from(2019.0)), Some("2019".to_string()));
        assert_eq!(text(&Cell::from(1.5)), Some("1.5".to_string()));
        assert_eq!(text(&Cell::from(" ")), None);
        assert_eq!(text(&Cell::Empty), None);
    }

    #[test]
    fn number_parses_text() {
        assert_eq!(number(&Cell::from("1,024")), Some(1024.0));
        assert_eq!(number(&Cell::from("abc")), None);
        assert_eq!(number(&Cell::from(f64::NAN)), None);
        assert_eq!(number(&Cell::Bool(true)), None);
    }

    #[test]
    fn count_clamps() {
        assert_eq!(count(&Cell::from(-3.0)), Some(0));
        assert_eq!(count(&Cell::from(4.9)), Some(4));
        assert_eq!(count(&Cell::from("8")), Some(8));
        assert_eq!(count(&Cell::from("x")), None);
    }
}
