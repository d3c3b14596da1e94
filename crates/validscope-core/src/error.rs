#![forbid(unsafe_code)]

//! Error types for identifiers and validation scopes.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Empty identifier | `""` or whitespace passed to `Identifier::new` | `IdentifierError::Empty` |
//! | Duplicate identifier | Two live reporters share a name under one collector | Policy-dependent: warn or `ScopeError::DuplicateIdentifier` |

use crate::change::ReporterId;
use crate::identifier::Identifier;

/// Errors from identifier construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    /// The identifier was empty or whitespace-only.
    Empty,
}

impl std::fmt::Display for IdentifierError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "identifier must not be empty"),
        }
    }
}

impl std::error::Error for IdentifierError {}

/// Errors recorded by a collector while applying child notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeError {
    /// A reporter tried to write an identifier owned by another live reporter.
    DuplicateIdentifier {
        id: Identifier,
        owner: ReporterId,
        intruder: ReporterId,
    },
}

impl std::fmt::Display for ScopeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateIdentifier {
                id,
                owner,
                intruder,
            } => write!(
                f,
                "duplicate identifier '{id}': owned by {owner}, rejected write from {intruder}"
            ),
        }
    }
}

impl std::error::Error for ScopeError {}
