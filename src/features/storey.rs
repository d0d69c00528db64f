//! Storey-range parsing.

use crate::domain::STOREY_SEPARATOR;
use crate::error::AppError;
use crate::math::median;

/// Median storey of a range like `"07 TO 09"`.
///
/// The string must split on the literal `" TO "` into exactly two numeric
/// tokens (surrounding whitespace is ignored).
pub fn storey_median(storey_range: &str) -> Result<f64, AppError> {
    let tokens: Vec<&str> = storey_range.split(STOREY_SEPARATOR).collect();
    if tokens.len() != 2 {
        return Err(AppError::invalid_input(format!(
            "Storey range '{storey_range}' must look like '1 TO 3'."
        )));
    }

    let mut values = [0.0_f64; 2];
    for (slot, token) in values.iter_mut().zip(&tokens) {
        let token = token.trim();
        *slot = token
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| {
                AppError::invalid_input(format!(
                    "Storey range '{storey_range}': '{token}' is not a number."
                ))
            })?;
    }

    median(&values).ok_or_else(|| AppError::invalid_input(format!("Storey range '{storey_range}' has no median.")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn median_is_midpoint_of_bounds() {
        for (a, b) in [(1, 3), (7, 9), (10, 12), (40, 42), (1, 5), (4, 4)] {
            let s = format!("{a} TO {b}");
            assert_eq!(storey_median(&s).unwrap(), (a + b) as f64 / 2.0, "{s}");
        }
    }

    #[test]
    fn zero_padded_tokens_parse() {
        assert_eq!(storey_median("01 TO 03").unwrap(), 2.0);
        assert_eq!(storey_median(" 07 TO 09 ").unwrap(), 8.0);
    }

    #[test]
    fn malformed_ranges_are_invalid_input() {
        for s in [
            "",
            "1-3",
            "1 to 3",
            "1TO3",
            "1 TO",
            "TO 3",
            "a TO b",
            "1 TO 3 TO 5",
            "3",
            "1 TO NaN",
        ] {
            let err = storey_median(s).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput, "{s:?}");
        }
    }
}
