//! Error types for caseflow.

use thiserror::Error;
use uuid::Uuid;

/// Result type alias using caseflow's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for caseflow operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Participant not found
    #[error("Participant not found: {0}")]
    ParticipantNotFound(Uuid),

    /// Incident not found
    #[error("Incident not found: {0}")]
    IncidentNotFound(Uuid),

    /// Case not found
    #[error("Case not found: {0}")]
    CaseNotFound(Uuid),

    /// Individual contact not found
    #[error("Individual contact not found: {0}")]
    IndividualNotFound(Uuid),

    /// Signal instance not found
    #[error("Signal instance not found: {0}")]
    SignalInstanceNotFound(Uuid),

    /// Term not found
    #[error("Term not found: {0}")]
    TermNotFound(Uuid),

    /// Plugin lookup or invocation failed
    #[error("Plugin error: {0}")]
    Plugin(String),

    /// Notification dispatch failed
    #[error("Notification error: {0}")]
    Notification(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error is a PostgreSQL unique constraint violation.
    ///
    /// The participant resolver uses this to detect that a concurrent caller
    /// inserted the same (subject, individual) pair first, and falls back to
    /// a lookup instead of failing.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Error::Database(sqlx::Error::Database(db_err)) => {
                db_err.code().as_deref() == Some("23505")
            }
            _ => false,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("test resource".to_string());
        assert_eq!(err.to_string(), "Not found: test resource");
    }

    #[test]
    fn test_error_display_participant_not_found() {
        let id = Uuid::nil();
        let err = Error::ParticipantNotFound(id);
        assert_eq!(err.to_string(), format!("Participant not found: {}", id));
    }

    #[test]
    fn test_error_display_incident_not_found() {
        let id = Uuid::new_v4();
        let err = Error::IncidentNotFound(id);
        assert!(err.to_string().contains(&id.to_string()));
    }

    #[test]
    fn test_error_display_case_not_found() {
        let id = Uuid::new_v4();
        let err = Error::CaseNotFound(id);
        assert_eq!(err.to_string(), format!("Case not found: {}", id));
    }

    #[test]
    fn test_error_display_plugin() {
        let err = Error::Plugin("contact lookup timed out".to_string());
        assert_eq!(err.to_string(), "Plugin error: contact lookup timed out");
    }

    #[test]
    fn test_error_display_notification() {
        let err = Error::Notification("conversation channel gone".to_string());
        assert_eq!(
            err.to_string(),
            "Notification error: conversation channel gone"
        );
    }

    #[test]
    fn test_error_display_invalid_input() {
        let err = Error::InvalidInput("empty role list".to_string());
        assert_eq!(err.to_string(), "Invalid input: empty role list");
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
    fn test_is_unique_violation_false_for_other_errors() {
        assert!(!Error::NotFound("x".to_string()).is_unique_violation());
        assert!(!Error::Database(sqlx::Error::RowNotFound).is_unique_violation());
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }

    #[test]
    fn test_result_type_ok() {
        fn get_result() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(get_result().unwrap(), 42);
    }
}
