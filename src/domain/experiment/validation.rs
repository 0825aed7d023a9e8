//! Experiment and choice name validation

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::error::ExperimentError;

/// Pattern shared by experiment names and choice names
static ALLOWED_NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

/// Returns whether a name is a legal experiment or choice name
pub fn is_valid_name(name: &str) -> bool {
    ALLOWED_NAME_PATTERN.is_match(name)
}

/// Validate an experiment name
pub fn validate_experiment_name(name: &str) -> Result<(), ExperimentError> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(ExperimentError::invalid_name(name, "Illegal name"))
    }
}

/// Validate a choice name belonging to `experiment`
pub fn validate_choice_name(experiment: &str, choice: &str) -> Result<(), ExperimentError> {
    if is_valid_name(choice) {
        Ok(())
    } else {
        Err(ExperimentError::invalid_name(
            experiment,
            format!("Illegal choice name: {}", choice),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::ExperimentErrorKind;

    #[test]
    fn test_valid_names() {
        assert!(is_valid_name("homepage"));
        assert!(is_valid_name("Homepage-2"));
        assert!(is_valid_name("signup_flow"));
        assert!(is_valid_name("-leading-hyphen"));
        assert!(is_valid_name("9"));
    }

    #[test]
    fn test_invalid_names() {
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("illegal name"));
        assert!(!is_valid_name("colon:name"));
        assert!(!is_valid_name("dotted.name"));
        assert!(!is_valid_name("ünïcode"));
    }

    #[test]
    fn test_validate_choice_name_reports_experiment() {
        let err = validate_choice_name("ex-choices", "illegal name").unwrap_err();
        assert_eq!(err.kind, ExperimentErrorKind::InvalidName);
        assert_eq!(err.experiment, "ex-choices");
        assert!(err.message.contains("illegal name"));
    }

    #[test]
    fn test_validate_experiment_name() {
        assert!(validate_experiment_name("ex-exists").is_ok());
        let err = validate_experiment_name("bad/name").unwrap_err();
        assert_eq!(err.kind, ExperimentErrorKind::InvalidName);
    }
}
