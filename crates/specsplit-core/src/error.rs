//! Error types for decomposition
//!
//! Analysis itself never fails: malformed or empty input degrades to a
//! single candidate with warnings. Errors come from refinement requests,
//! configuration and (de)serialization.

/// Main decomposition error type
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecompositionError {
    /// Refinement request cannot be applied to the result
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Change name does not match `^[a-z][a-z0-9-]*$` or is already taken
    #[error("invalid change name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// Configuration is malformed or out of range
    #[error("configuration error: {0}")]
    Config(String),

    /// Result could not be encoded or decoded
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl DecompositionError {
    /// Build an invalid-operation error
    #[inline]
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation(message.into())
    }

    /// Build an invalid-name error
    #[inline]
    pub fn invalid_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidName {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Stable error code for reporting
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidOperation(_) => "D001",
            Self::InvalidName { .. } => "D002",
            Self::Config(_) => "D003",
            Self::Serialization(_) => "D004",
        }
    }

    /// Whether the caller can fix this by changing the request
    #[inline]
    #[must_use]
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidOperation(_) | Self::InvalidName { .. } | Self::Config(_)
        )
    }
}

impl From<serde_json::Error> for DecompositionError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for DecompositionError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result alias for decomposition operations
pub type Result<T, E = DecompositionError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(DecompositionError::invalid_operation("x").code(), "D001");
        assert_eq!(DecompositionError::invalid_name("X", "bad").code(), "D002");
        assert_eq!(DecompositionError::Config(String::new()).code(), "D003");
        assert_eq!(DecompositionError::Serialization(String::new()).code(), "D004");
    }

    #[test]
    fn messages_name_the_offender() {
        let err = DecompositionError::invalid_name("Bad Name", "must start with a lowercase letter");
        assert_eq!(
            err.to_string(),
            "invalid change name 'Bad Name': must start with a lowercase letter"
        );
        assert!(err.is_user_error());
        assert!(!DecompositionError::Serialization("eof".into()).is_user_error());
    }
}
