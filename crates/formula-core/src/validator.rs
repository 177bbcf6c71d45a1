//! Formula validation against the enabled-parameter set
//!
//! Ad-hoc validation for the wizard's formula step: empty check, parse,
//! self-reference check, then missing-parameter computation. Content-level
//! failures come back as a structured `FormulaValidation`, never as `Err`;
//! the outcome struct is the wire contract of the validate endpoint.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::parser::extract_identifiers;

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Reasons a formula fails validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormulaError {
    #[error("Expression cannot be empty")]
    EmptyExpression,

    #[error("Syntax error in expression: {0}")]
    InvalidSyntax(String),

    #[error("Self-reference detected: '{0}' cannot reference itself")]
    SelfReference(String),

    #[error("Unknown parameters: {0}")]
    UnknownParameters(String),
}

// =============================================================================
// VALIDATION RESULT
// =============================================================================

/// Structured outcome of validating one formula
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormulaValidation {
    pub valid: bool,
    pub missing: Vec<String>,
    pub depends_on: Vec<String>,
    pub error: Option<String>,
}

impl FormulaValidation {
    fn failure(error: FormulaError, depends_on: Vec<String>, missing: Vec<String>) -> Self {
        Self {
            valid: false,
            missing,
            depends_on,
            error: Some(error.to_string()),
        }
    }
}

// =============================================================================
// VALIDATOR
// =============================================================================

/// Validate a formula expression against the enabled parameters
///
/// `target_parameter` is the name this formula would compute; supplying it
/// enables the self-reference check. Malformed input never propagates as an
/// error; it is folded into the returned outcome.
pub fn validate_formula(
    expression: &str,
    enabled_parameters: &[String],
    target_parameter: Option<&str>,
) -> FormulaValidation {
    if expression.trim().is_empty() {
        return FormulaValidation::failure(FormulaError::EmptyExpression, vec![], vec![]);
    }

    let identifiers = match extract_identifiers(expression) {
        Ok(identifiers) => identifiers,
        Err(e) => {
            return FormulaValidation::failure(
                FormulaError::InvalidSyntax(e.to_string()),
                vec![],
                vec![],
            );
        }
    };

    if let Some(target) = target_parameter {
        if identifiers.iter().any(|name| name == target) {
            // depends_on is still populated so the caller can see what the
            // formula referenced.
            return FormulaValidation::failure(
                FormulaError::SelfReference(target.to_string()),
                identifiers,
                vec![],
            );
        }
    }

    let enabled: HashSet<&str> = enabled_parameters.iter().map(String::as_str).collect();
    let missing: Vec<String> = identifiers
        .iter()
        .filter(|name| !enabled.contains(name.as_str()))
        .cloned()
        .collect();

    if missing.is_empty() {
        FormulaValidation {
            valid: true,
            missing,
            depends_on: identifiers,
            error: None,
        }
    } else {
        let error = FormulaError::UnknownParameters(missing.join(", "));
        FormulaValidation {
            valid: false,
            missing,
            depends_on: identifiers,
            error: Some(error.to_string()),
        }
    }
}
