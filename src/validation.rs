// validation.rs
use std::collections::HashSet;
use std::ops::RangeInclusive;

use serde::Serialize;
use thiserror::Error;

use crate::models::PollPayload;

pub const TITLE_LENGTH: RangeInclusive<usize> = 10..=200;
pub const OPTION_COUNT: RangeInclusive<usize> = 2..=10;
pub const OPTION_TEXT_MAX: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "detail")]
pub enum ValidationError {
    #[error(
        "poll title must be between {} and {} characters, got {len}",
        TITLE_LENGTH.start(),
        TITLE_LENGTH.end()
    )]
    TitleLength { len: usize },

    #[error(
        "poll must have between {} and {} options, got {count}",
        OPTION_COUNT.start(),
        OPTION_COUNT.end()
    )]
    OptionCount { count: usize },

    #[error("option text must not exceed {} characters, got {len}", OPTION_TEXT_MAX)]
    OptionLength { len: usize },

    #[error("duplicate option: {text}")]
    DuplicateOption { text: String },
}

/// Normalized output of a successful validation: trimmed fields and the
/// blank-filtered, order-preserving option list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedPoll {
    pub title: String,
    pub description: Option<String>,
    pub options: Vec<String>,
}

/// Checks a candidate poll shape for both the create and update paths.
///
/// All failures are collected and returned together so the caller can
/// surface every problem at once rather than one per round trip.
pub fn validate_poll(candidate: &PollPayload) -> Result<ValidatedPoll, Vec<ValidationError>> {
    let mut errors = Vec::new();

    let title = candidate.title.trim().to_string();
    let title_len = title.chars().count();
    if !TITLE_LENGTH.contains(&title_len) {
        errors.push(ValidationError::TitleLength { len: title_len });
    }

    let description = candidate
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(String::from);

    // Blank entries are dropped before any count or duplicate check.
    let options: Vec<String> = candidate
        .options
        .iter()
        .map(|opt| opt.trim().to_string())
        .filter(|opt| !opt.is_empty())
        .collect();

    if !OPTION_COUNT.contains(&options.len()) {
        errors.push(ValidationError::OptionCount {
            count: options.len(),
        });
    }

    let mut seen = HashSet::new();
    for opt in &options {
        let len = opt.chars().count();
        if len > OPTION_TEXT_MAX {
            errors.push(ValidationError::OptionLength { len });
        }
        if !seen.insert(opt.to_lowercase()) {
            errors.push(ValidationError::DuplicateOption { text: opt.clone() });
        }
    }

    if errors.is_empty() {
        Ok(ValidatedPoll {
            title,
            description,
            options,
        })
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(title: &str, options: &[&str]) -> PollPayload {
        PollPayload {
            title: title.to_string(),
            description: None,
            options: options.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn expect_errors(result: Result<ValidatedPoll, Vec<ValidationError>>) -> Vec<ValidationError> {
        result.expect_err("expected validation to fail")
    }

    #[test]
    fn accepts_well_formed_poll() {
        let validated = validate_poll(&payload(
            "  What should we have for lunch?  ",
            &["Pizza", " Sushi ", "Tacos"],
        ))
        .unwrap();
        assert_eq!(validated.title, "What should we have for lunch?");
        assert_eq!(validated.options, vec!["Pizza", "Sushi", "Tacos"]);
    }

    #[test]
    fn short_title_fails_even_with_valid_options() {
        let errors = expect_errors(validate_poll(&payload("Color", &["Red", "Blue"])));
        assert_eq!(errors, vec![ValidationError::TitleLength { len: 5 }]);
    }

    #[test]
    fn title_over_max_fails() {
        let long = "x".repeat(201);
        let errors = expect_errors(validate_poll(&payload(&long, &["Red", "Blue"])));
        assert_eq!(errors, vec![ValidationError::TitleLength { len: 201 }]);
    }

    #[test]
    fn blank_options_are_filtered_before_counting() {
        // Two blanks leave only one real option behind.
        let errors = expect_errors(validate_poll(&payload(
            "Favorite color?",
            &["Red", "", "   "],
        )));
        assert_eq!(errors, vec![ValidationError::OptionCount { count: 1 }]);
    }

    #[test]
    fn more_than_ten_options_fails() {
        let opts: Vec<String> = (0..11).map(|i| format!("Option {i}")).collect();
        let refs: Vec<&str> = opts.iter().map(String::as_str).collect();
        let errors = expect_errors(validate_poll(&payload("Favorite option?", &refs)));
        assert_eq!(errors, vec![ValidationError::OptionCount { count: 11 }]);
    }

    #[test]
    fn case_insensitive_duplicates_fail() {
        let errors = expect_errors(validate_poll(&payload(
            "Favorite color?",
            &["Red", "", "Blue", "Red"],
        )));
        assert_eq!(
            errors,
            vec![ValidationError::DuplicateOption {
                text: "Red".to_string()
            }]
        );

        let errors = expect_errors(validate_poll(&payload(
            "Favorite color?",
            &["red", "RED", "Blue"],
        )));
        assert_eq!(
            errors,
            vec![ValidationError::DuplicateOption {
                text: "RED".to_string()
            }]
        );
    }

    #[test]
    fn overlong_option_text_fails() {
        let long = "y".repeat(101);
        let errors = expect_errors(validate_poll(&payload("Favorite color?", &["Red", &long])));
        assert_eq!(errors, vec![ValidationError::OptionLength { len: 101 }]);
    }

    #[test]
    fn all_errors_are_collected_together() {
        let errors = expect_errors(validate_poll(&payload("Hi", &["Red"])));
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors[0], ValidationError::TitleLength { .. }));
        assert!(matches!(errors[1], ValidationError::OptionCount { .. }));
    }

    #[test]
    fn empty_description_normalizes_to_none() {
        let mut candidate = payload("Favorite color?", &["Red", "Blue"]);
        candidate.description = Some("   ".to_string());
        let validated = validate_poll(&candidate).unwrap();
        assert_eq!(validated.description, None);
    }
}
