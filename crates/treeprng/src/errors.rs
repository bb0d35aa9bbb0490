//! Error type for tree and sequence operations
//!
//! Every error here is a local precondition violation. None of them are
//! transient: the only fix is to change the calling code so it respects the
//! node lifecycle or passes valid arguments.

/// Unified error type for treeprng operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// The node already produced a sequence and holds no hash context
    #[error("Node used after spent: cannot {operation} a node that already produced random values")]
    UsedAfterSpent {
        /// Operation that was attempted
        operation: String,
    },

    /// The node was indexed and can no longer produce random values
    #[error("Node used as dict after commit: cannot {operation} a node that was already indexed")]
    UsedAsDictAfterCommit {
        /// Operation that was attempted
        operation: String,
    },

    /// The operation is disabled at the node level
    #[error("Unsupported operation {operation}: {hint}")]
    UnsupportedOperation {
        /// Operation that was attempted
        operation: String,
        /// What to do instead
        hint: String,
    },

    /// An argument to a draw operation was out of range
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message describing the rejected argument
        message: String,
    },

    /// Configuration could not be parsed or validated
    #[error("Invalid config: {message}")]
    InvalidConfig {
        /// Error message describing the configuration problem
        message: String,
    },
}

impl TreeError {
    /// Create a used-after-spent error
    pub fn used_after_spent(operation: impl Into<String>) -> Self {
        Self::UsedAfterSpent {
            operation: operation.into(),
        }
    }

    /// Create a used-as-dict-after-commit error
    pub fn used_as_dict_after_commit(operation: impl Into<String>) -> Self {
        Self::UsedAsDictAfterCommit {
            operation: operation.into(),
        }
    }

    /// Create an unsupported operation error
    pub fn unsupported(operation: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::UnsupportedOperation {
            operation: operation.into(),
            hint: hint.into(),
        }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Whether this error reports a node lifecycle violation
    pub fn is_lifecycle_violation(&self) -> bool {
        matches!(
            self,
            Self::UsedAfterSpent { .. } | Self::UsedAsDictAfterCommit { .. }
        )
    }
}

/// Standard Result type for treeprng operations
pub type Result<T> = std::result::Result<T, TreeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_operation() {
        let err = TreeError::used_after_spent("index");
        assert!(err.to_string().contains("index"));

        let err = TreeError::unsupported("reseed", "build a new root");
        assert_eq!(err.to_string(), "Unsupported operation reseed: build a new root");
    }

    #[test]
    fn test_lifecycle_classification() {
        assert!(TreeError::used_after_spent("draw").is_lifecycle_violation());
        assert!(TreeError::used_as_dict_after_commit("draw").is_lifecycle_violation());
        assert!(!TreeError::invalid_argument("empty range").is_lifecycle_violation());
    }
}
