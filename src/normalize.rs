//! Name and value normalization shared by mapping and diffing

use crate::model::CellValue;

/// Textual tokens treated as a missing value
const MISSING_TOKENS: [&str; 3] = ["nan", "null", "none"];

/// Lower-case a column name and drop everything that is not a letter or digit.
///
/// `"Trade_Id"`, `"Trade Id."` and `"TRADEID"` all normalize to `"tradeid"`.
pub fn normalize_column_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Canonical identity of a key cell: its trimmed textual form.
///
/// `Int(1)` and `Text("1")` yield the same key; `Text("1.0")` does not.
pub fn normalize_key_value(value: &CellValue) -> String {
    value.as_text().trim().to_string()
}

/// Interpret a cell as a finite floating-point number
pub fn try_parse_number(value: &CellValue) -> Option<f64> {
    let parsed = match value {
        CellValue::Int(i) => Some(*i as f64),
        CellValue::Float(f) => Some(*f),
        CellValue::Text(s) => s.trim().parse::<f64>().ok(),
        CellValue::Null | CellValue::Bool(_) => None,
    };
    parsed.filter(|f| f.is_finite())
}

/// Null, blank, or one of the textual missing tokens
pub fn is_missing(value: &CellValue) -> bool {
    match value {
        CellValue::Null => true,
        CellValue::Text(s) => {
            let trimmed = s.trim();
            trimmed.is_empty() || MISSING_TOKENS.iter().any(|t| trimmed.eq_ignore_ascii_case(t))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_column_name() {
        assert_eq!(normalize_column_name("Trade_Id"), "tradeid");
        assert_eq!(normalize_column_name("TRADEID"), "tradeid");
        assert_eq!(normalize_column_name("Trade Id."), "tradeid");
        assert_eq!(normalize_column_name("Tr Id."), "trid");
        assert_eq!(normalize_column_name("__"), "");
        assert_eq!(normalize_column_name(""), "");
    }

    #[test]
    fn test_normalize_key_value() {
        assert_eq!(normalize_key_value(&CellValue::Int(1)), "1");
        assert_eq!(normalize_key_value(&"  1 ".into()), "1");
        assert_eq!(normalize_key_value(&CellValue::Null), "");
        assert_ne!(normalize_key_value(&"1.0".into()), normalize_key_value(&CellValue::Int(1)));
    }

    #[test]
    fn test_try_parse_number() {
        assert_eq!(try_parse_number(&CellValue::Int(105)), Some(105.0));
        assert_eq!(try_parse_number(&" 105.5 ".into()), Some(105.5));
        assert_eq!(try_parse_number(&"CITI".into()), None);
        assert_eq!(try_parse_number(&"inf".into()), None);
        assert_eq!(try_parse_number(&CellValue::Bool(true)), None);
        assert_eq!(try_parse_number(&CellValue::Null), None);
    }

    #[test]
    fn test_is_missing() {
        assert!(is_missing(&CellValue::Null));
        assert!(is_missing(&"  ".into()));
        assert!(is_missing(&"NaN".into()));
        assert!(is_missing(&"None".into()));
        assert!(!is_missing(&"0".into()));
        assert!(!is_missing(&CellValue::Int(0)));
    }
}
