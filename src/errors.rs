use thiserror::Error;

/// Error taxonomy for every business operation. Validation-class kinds map to
/// 400-range responses with the message shown to the user; database and mail
/// failures stay internal.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("The user you are trying to invite has already received an invite")]
    DuplicateInvite,

    #[error("You have 0 invites remaining")]
    QuotaExceeded,

    #[error("Cannot update state: invalid transition '{transition}' from state '{state}'")]
    InvalidTransition { state: String, transition: String },

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("You cannot register to the conference without an invitation")]
    NoInvitation,

    #[error("You cannot register to the conference twice")]
    AlreadyRegistered,

    #[error("You cannot get a ticket without {}", .missing.join(", "))]
    IncompleteProfile { missing: Vec<String> },

    #[error("Failed to dispatch mail: {0}")]
    MailDelivery(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Validation(String),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
}

impl ServiceError {
    /// Validation-class errors are recovered locally and surfaced to the user;
    /// everything else is an internal fault.
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, ServiceError::Database(_) | ServiceError::Pool(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incomplete_profile_lists_missing_fields() {
        let err = ServiceError::IncompleteProfile {
            missing: vec!["public name".to_string(), "goals".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "You cannot get a ticket without public name, goals"
        );
    }

    #[test]
    fn database_errors_are_not_user_visible() {
        let err = ServiceError::Database(diesel::result::Error::NotFound);
        assert!(!err.is_user_visible());
        assert!(ServiceError::DuplicateInvite.is_user_visible());
    }
}
