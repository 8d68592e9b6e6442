//! Error types for glossa.

use thiserror::Error;

/// Result type alias using glossa's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for glossa operations.
///
/// The hierarchy variants (`NotFound`, `TermNotFound`, `GlossaryNotFound`,
/// `InvalidHierarchy`, `InvalidMove`, `PermissionDenied`) are raised while a
/// mutation is being prepared, before anything is written.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Referenced entity not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Glossary term not found
    #[error("Glossary term not found: {0}")]
    TermNotFound(uuid::Uuid),

    /// Glossary not found (or soft-deleted where only active glossaries qualify)
    #[error("Glossary not found: {0}")]
    GlossaryNotFound(uuid::Uuid),

    /// Parent term does not belong to the declared glossary
    #[error("Invalid hierarchy: {0}")]
    InvalidHierarchy(String),

    /// Move would place a term under itself or one of its descendants
    #[error("Invalid move: {0}")]
    InvalidMove(String),

    /// Operation not allowed on this entity (e.g. renaming a system term)
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Search index operation failed
    #[error("Search error: {0}")]
    Search(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for the errors raised by hierarchy and reference validation.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::NotFound(_)
                | Error::TermNotFound(_)
                | Error::GlossaryNotFound(_)
                | Error::InvalidHierarchy(_)
                | Error::InvalidMove(_)
                | Error::PermissionDenied(_)
                | Error::InvalidInput(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("user 42".to_string());
        assert_eq!(err.to_string(), "Not found: user 42");
    }

    #[test]
    fn test_error_display_term_not_found() {
        let id = Uuid::nil();
        let err = Error::TermNotFound(id);
        assert_eq!(err.to_string(), format!("Glossary term not found: {}", id));
    }

    #[test]
    fn test_error_display_glossary_not_found() {
        let id = Uuid::new_v4();
        let err = Error::GlossaryNotFound(id);
        assert!(err.to_string().contains(&id.to_string()));
    }

    #[test]
    fn test_error_display_hierarchy_variants() {
        assert_eq!(
            Error::InvalidHierarchy("parent [H.a] not in [G]".to_string()).to_string(),
            "Invalid hierarchy: parent [H.a] not in [G]"
        );
        assert_eq!(
            Error::InvalidMove("G.a under G.a.b".to_string()).to_string(),
            "Invalid move: G.a under G.a.b"
        );
        assert_eq!(
            Error::PermissionDenied("system term".to_string()).to_string(),
            "Permission denied: system term"
        );
    }

    #[test]
    fn test_is_validation() {
        assert!(Error::InvalidMove("x".into()).is_validation());
        assert!(Error::TermNotFound(Uuid::nil()).is_validation());
        assert!(!Error::Search("down".into()).is_validation());
        assert!(!Error::Internal("bug".into()).is_validation());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number");
        assert!(json_err.is_err());

        let err: Error = json_err.unwrap_err().into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
