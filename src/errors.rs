//! Error types shared across the voting system.

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The candidate catalog could not be loaded. Voting is blocked until
    /// the source file is fixed.
    #[error("catalog error: {message}")]
    CatalogLoad { message: String },

    /// The ballot store could not be read.
    #[error("ballot store read failed: {message}")]
    StoreRead { message: String },

    /// The ballot store could not be written. The caller must not advance
    /// draft/finalized state when it sees this.
    #[error("ballot store write failed: {message}")]
    StoreWrite { message: String },

    /// Input rejected before any persistence was attempted.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A report file could not be produced.
    #[error("report export failed: {message}")]
    Export { message: String },

    /// The shared admin password was missing or wrong.
    #[error("admin password rejected")]
    Unauthorized,

    /// An environment variable could not be parsed.
    #[error("configuration error: {message}")]
    Config { message: String },
}

/// Per-case validation failures, each with its own user-facing message.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("please enter a non-empty name")]
    EmptyVoterName,

    /// Login collision with a finalized ballot. Distinct from the draft
    /// case, which resumes the existing session instead.
    #[error("\"{voter}\" has already submitted a final ballot")]
    AlreadyFinalized { voter: String },

    #[error("at most {max} selections are allowed")]
    SelectionLimit { max: usize },

    #[error("a final ballot needs at least one selection")]
    EmptyBallot,

    #[error("no candidate with id {id}")]
    UnknownCandidate { id: u32 },
}

impl Error {
    pub fn catalog(message: impl Into<String>) -> Self {
        Self::CatalogLoad {
            message: message.into(),
        }
    }

    pub fn store_read(message: impl Into<String>) -> Self {
        Self::StoreRead {
            message: message.into(),
        }
    }

    pub fn store_write(message: impl Into<String>) -> Self {
        Self::StoreWrite {
            message: message.into(),
        }
    }

    pub fn export(message: impl Into<String>) -> Self {
        Self::Export {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_pick_the_right_variant() {
        assert!(matches!(Error::catalog("x"), Error::CatalogLoad { .. }));
        assert!(matches!(Error::store_read("x"), Error::StoreRead { .. }));
        assert!(matches!(Error::store_write("x"), Error::StoreWrite { .. }));
        assert!(matches!(Error::export("x"), Error::Export { .. }));
    }

    #[test]
    fn validation_converts_into_error() {
        let err: Error = ValidationError::EmptyVoterName.into();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::EmptyVoterName)
        ));
    }

    #[test]
    fn finalized_and_draft_collisions_are_distinct() {
        let finalized = ValidationError::AlreadyFinalized {
            voter: "alice".to_string(),
        };
        assert_ne!(finalized, ValidationError::EmptyVoterName);
        assert!(finalized.to_string().contains("alice"));
    }
}
