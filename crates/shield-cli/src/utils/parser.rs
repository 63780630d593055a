use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid --set format: '{0}'. Expected KEY=VALUE.")]
    InvalidAssignment(String),

    #[error("Invalid number '{value}' for '{key}'.")]
    InvalidNumber { key: String, value: String },

    #[error("Invalid boolean '{value}' for '{key}'. Expected 'true' or 'false'.")]
    InvalidBool { key: String, value: String },

    #[error("List for '{0}' cannot be empty.")]
    EmptyList(String),
}

/// Splits a `KEY=VALUE` assignment at the first `=`.
pub fn parse_assignment(assignment: &str) -> Result<(&str, &str), ParseError> {
    match assignment.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value.trim())),
        _ => Err(ParseError::InvalidAssignment(assignment.to_string())),
    }
}

pub fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidNumber {
        key: key.to_string(),
        value: value.to_string(),
    })
}

pub fn parse_bool(key: &str, value: &str) -> Result<bool, ParseError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ParseError::InvalidBool {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Parses a comma-separated list of numbers; surrounding brackets are optional.
pub fn parse_list(key: &str, value: &str) -> Result<Vec<f64>, ParseError> {
    let inner = value
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .trim();
    if inner.is_empty() {
        return Err(ParseError::EmptyList(key.to_string()));
    }
    inner
        .split(',')
        .map(|item| parse_number(key, item.trim()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignment_is_split_at_the_first_equals_sign() {
        assert_eq!(
            parse_assignment("engine.args=a=b").unwrap(),
            ("engine.args", "a=b")
        );
        assert_eq!(
            parse_assignment(" transport.batches = 40 ").unwrap(),
            ("transport.batches", "40")
        );
    }

    #[test]
    fn assignment_without_key_or_equals_is_rejected() {
        assert!(matches!(
            parse_assignment("transport.batches"),
            Err(ParseError::InvalidAssignment(_))
        ));
        assert!(parse_assignment("=5").is_err());
    }

    #[test]
    fn lists_accept_optional_brackets() {
        assert_eq!(
            parse_list("grid.energies", "[0.1, 1, 5.0]").unwrap(),
            vec![0.1, 1.0, 5.0]
        );
        assert_eq!(parse_list("grid.energies", "2").unwrap(), vec![2.0]);
    }

    #[test]
    fn bad_list_items_are_reported() {
        assert_eq!(
            parse_list("grid.energies", "0.1, x"),
            Err(ParseError::InvalidNumber {
                key: "grid.energies".to_string(),
                value: "x".to_string()
            })
        );
        assert_eq!(
            parse_list("grid.energies", "[]"),
            Err(ParseError::EmptyList("grid.energies".to_string()))
        );
    }

    #[test]
    fn booleans_are_strict() {
        assert!(parse_bool("test-mode", "true").unwrap());
        assert!(!parse_bool("test-mode", "false").unwrap());
        assert!(parse_bool("test-mode", "yes").is_err());
    }
}
