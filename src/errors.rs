// Copyright 2025 Cowboy AI, LLC.

//! Error types for categorization operations

use thiserror::Error;

/// Errors that can occur while building or querying categorizations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CategorizationError {
    /// Two categories (or one category twice) claim the same normalized code
    #[error("Duplicate code {code:?}: already used by category {existing}, claimed again by {duplicate}")]
    DuplicateCode {
        /// The offending code as it was spelled
        code: String,
        /// Canonical code of the category that owns the code first
        existing: String,
        /// Canonical code of the category that claims it again
        duplicate: String,
    },

    /// A referenced code does not exist
    #[error("Unknown code {code:?} in categorization {categorization}")]
    UnknownCode {
        /// The code that was searched for
        code: String,
        /// Name of the categorization that was searched
        categorization: String,
    },

    /// A category was defined without any code
    #[error("Category {title:?} has no codes")]
    EmptyCodes {
        /// Title of the rejected category
        title: String,
    },

    /// A code that can never be looked up
    #[error("Invalid code {code:?}: {reason}")]
    InvalidCode {
        /// The rejected code
        code: String,
        /// Why it was rejected
        reason: String,
    },

    /// Level requested without a canonical top-level category
    #[error("Level undefined in {categorization}: no canonical top-level category designated")]
    LevelUndefined {
        /// Name of the categorization
        categorization: String,
    },

    /// No upward path leads from the category to the top-level category
    #[error("Category {code} in {categorization} is not reachable from top-level category {top}")]
    UnreachableCategory {
        /// Canonical code of the category
        code: String,
        /// Name of the categorization
        categorization: String,
        /// Canonical code of the top-level category
        top: String,
    },

    /// Hierarchy data supplied to or required from a flat categorization
    #[error("Categorization {0} is not hierarchical")]
    NotHierarchical(String),

    /// Edge set that cannot form a valid hierarchy
    #[error("Invalid hierarchy in {categorization}: {reason}")]
    InvalidHierarchy {
        /// Name of the categorization
        categorization: String,
        /// What is wrong with the edges
        reason: String,
    },

    /// Total-sum check requested on a scheme that does not declare it
    #[error("Categorization {0} does not declare the total-sum contract")]
    TotalSumNotDeclared(String),

    /// Categorization not present in a registry
    #[error("Categorization not found: {0}")]
    CategorizationNotFound(String),

    /// Categorization name already taken in a registry
    #[error("Categorization already registered: {0}")]
    AlreadyRegistered(String),

    /// Conversion rule restricted by an auxiliary categorization the conversion does not declare
    #[error("Auxiliary categorization {0} is not declared by the conversion")]
    UndeclaredAuxiliary(String),

    /// Conversion formula or code list could not be parsed
    #[error("Could not parse {input:?}: {reason}, error at char {position}")]
    ParseError {
        /// The text that failed to parse
        input: String,
        /// What the parser expected
        reason: String,
        /// Character offset of the failure
        position: usize,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Result type for categorization operations
pub type CategorizationResult<T> = Result<T, CategorizationError>;

impl From<serde_json::Error> for CategorizationError {
    fn from(err: serde_json::Error) -> Self {
        CategorizationError::SerializationError(err.to_string())
    }
}

impl CategorizationError {
    /// Shorthand for an [`CategorizationError::UnknownCode`] error
    pub fn unknown_code(code: impl Into<String>, categorization: impl Into<String>) -> Self {
        CategorizationError::UnknownCode {
            code: code.into(),
            categorization: categorization.into(),
        }
    }

    /// Shorthand for an [`CategorizationError::InvalidHierarchy`] error
    pub fn invalid_hierarchy(categorization: impl Into<String>, reason: impl Into<String>) -> Self {
        CategorizationError::InvalidHierarchy {
            categorization: categorization.into(),
            reason: reason.into(),
        }
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CategorizationError::UnknownCode { .. } | CategorizationError::CategorizationNotFound(_)
        )
    }

    /// Check if this error rejects malformed input data
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            CategorizationError::DuplicateCode { .. }
                | CategorizationError::EmptyCodes { .. }
                | CategorizationError::InvalidCode { .. }
                | CategorizationError::InvalidHierarchy { .. }
                | CategorizationError::UndeclaredAuxiliary(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = CategorizationError::DuplicateCode {
            code: "1A".to_string(),
            existing: "1.A".to_string(),
            duplicate: "1.B".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Duplicate code \"1A\": already used by category 1.A, claimed again by 1.B"
        );

        let err = CategorizationError::unknown_code("does-not-exist", "IPCC2006");
        assert_eq!(
            err.to_string(),
            "Unknown code \"does-not-exist\" in categorization IPCC2006"
        );

        let err = CategorizationError::LevelUndefined {
            categorization: "RCMIP".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Level undefined in RCMIP: no canonical top-level category designated"
        );

        let err = CategorizationError::UnreachableCategory {
            code: "M.0".to_string(),
            categorization: "IPCC2006".to_string(),
            top: "0".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Category M.0 in IPCC2006 is not reachable from top-level category 0"
        );

        let err = CategorizationError::ParseError {
            input: "-A-".to_string(),
            reason: "Expected category code".to_string(),
            position: 3,
        };
        assert_eq!(
            err.to_string(),
            "Could not parse \"-A-\": Expected category code, error at char 3"
        );
    }

    #[test]
    fn test_is_not_found() {
        assert!(CategorizationError::unknown_code("x", "y").is_not_found());
        assert!(CategorizationError::CategorizationNotFound("y".to_string()).is_not_found());

        assert!(!CategorizationError::NotHierarchical("y".to_string()).is_not_found());
        assert!(!CategorizationError::AlreadyRegistered("y".to_string()).is_not_found());
    }

    #[test]
    fn test_is_validation_error() {
        assert!(CategorizationError::EmptyCodes {
            title: "Energy".to_string()
        }
        .is_validation_error());
        assert!(CategorizationError::invalid_hierarchy("y", "cycle").is_validation_error());

        assert!(!CategorizationError::unknown_code("x", "y").is_validation_error());
        assert!(!CategorizationError::TotalSumNotDeclared("y".to_string()).is_validation_error());

        let err = CategorizationError::UndeclaredAuxiliary("gas".to_string());
        assert!(err.is_validation_error());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_serde_json_conversion() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{ invalid json }").unwrap_err();
        let err: CategorizationError = serde_err.into();

        match err {
            CategorizationError::SerializationError(msg) => assert!(!msg.is_empty()),
            other => panic!("Expected SerializationError, got {other:?}"),
        }
    }
}
