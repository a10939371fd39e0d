use std::fmt;

use rh_schemas::ValidationError;

#[derive(Debug)]
pub enum StoreError {
    /// IO or network failure while fetching the raw document.
    Transport(String),
    /// No document exists for the lender.
    NotFound { lender_id: String },
    /// The document is not valid JSON for the history shape.
    Decode(String),
    /// The document decoded but breaks a structural rule.
    Invalid(ValidationError),
    /// The document belongs to a different lender than the one requested.
    LenderMismatch { requested: String, found: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Transport(msg) => write!(f, "transport error: {msg}"),
            StoreError::NotFound { lender_id } => {
                write!(f, "no history document for lender={lender_id}")
            }
            StoreError::Decode(msg) => write!(f, "decode error: {msg}"),
            StoreError::Invalid(e) => write!(f, "invalid document: {e}"),
            StoreError::LenderMismatch { requested, found } => write!(
                f,
                "lender mismatch: requested={requested} document lenderId={found}"
            ),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Invalid(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ValidationError> for StoreError {
    fn from(e: ValidationError) -> Self {
        StoreError::Invalid(e)
    }
}
