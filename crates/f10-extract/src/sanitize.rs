//! Cell text cleaning.
//!
//! Every scalar read from a table passes through [`sanitize`] before it is
//! coerced. Layout whitespace is stripped, quote characters become spaces,
//! and every null-like token collapses to the single [`MISSING`] sentinel.

use std::fmt::Display;

/// The in-band marker for "no data" after sanitization.
pub const MISSING: &str = "--";

/// Tokens the upstream layouts (and spreadsheet exports) use for empty cells.
const NULL_TOKENS: &[&str] = &["", MISSING, "nan", "none", "null"];

/// Whitespace artifacts removed from every cell.
const STRIPPED: &[char] = &[' ', '\t', '\r', '\n', '\u{a0}', '\u{3000}'];

/// Clean one raw cell value.
///
/// Removes embedded spaces and line breaks, replaces quote characters with a
/// space, and maps empty or null-like tokens to [`MISSING`].
///
/// # Example
/// ```
/// use f10_extract::sanitize::sanitize;
///
/// assert_eq!(sanitize(" 1 234.50\r\n"), "1234.50");
/// assert_eq!(sanitize("NaN"), "--");
/// assert_eq!(sanitize("\n"), "--");
/// ```
pub fn sanitize(raw: &str) -> String {
    let stripped: String = raw.chars().filter(|c| !STRIPPED.contains(c)).collect();

    if is_null_token(&stripped) {
        return MISSING.to_string();
    }

    stripped.replace(['"', '\''], " ")
}

/// Clean an optional scalar of any displayable type.
///
/// `None` is the absent-cell case and maps to [`MISSING`].
pub fn sanitize_value<T: Display>(raw: Option<T>) -> String {
    raw.map_or_else(|| MISSING.to_string(), |v| sanitize(&v.to_string()))
}

/// Returns true if the sanitized text is the missing-value sentinel.
pub fn is_missing(text: &str) -> bool {
    text == MISSING
}

fn is_null_token(text: &str) -> bool {
    NULL_TOKENS.iter().any(|t| text.eq_ignore_ascii_case(t))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("")]
    #[case("--")]
    #[case("nan")]
    #[case("NaN")]
    #[case("None")]
    #[case("\n")]
    #[case("  \r\n ")]
    fn test_null_tokens_map_to_sentinel(#[case] raw: &str) {
        assert_eq!(sanitize(raw), MISSING);
    }

    #[rstest]
    #[case("浦发 银行", "浦发银行")]
    #[case("1,000.00\r\n", "1,000.00")]
    #[case("\t上海市\u{3000}浦东新区", "上海市浦东新区")]
    #[case("2023-03-31 ", "2023-03-31")]
    fn test_strips_layout_whitespace(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(sanitize(raw), expected);
    }

    #[test]
    fn test_output_has_no_spaces_or_line_breaks() {
        let inputs = ["a b", " x\r\ny ", "第一行\n第二行", "  --  ", "1 2 3\r\n"];
        for raw in inputs {
            let out = sanitize(raw);
            assert!(!out.contains(' '), "{out:?}");
            assert!(!out.contains('\r') && !out.contains('\n'), "{out:?}");
        }
    }

    #[test]
    fn test_quotes_become_spaces() {
        assert_eq!(sanitize("O'Neil\"s"), "O Neil s");
        // replacement runs after the whitespace strip, so the spaces survive
        assert_eq!(sanitize("中国\"平安\""), "中国 平安 ");
    }

    #[test]
    fn test_sanitize_value() {
        assert_eq!(sanitize_value::<&str>(None), MISSING);
        assert_eq!(sanitize_value(Some(12.5)), "12.5");
        assert_eq!(sanitize_value(Some(f64::NAN)), MISSING);
    }

    #[test]
    fn test_is_missing() {
        assert!(is_missing(&sanitize("")));
        assert!(!is_missing("0"));
    }
}
