use bitcoin::Amount;
use thiserror::Error;

use crate::types::CollaboratorError;

/// Errors from coin selection and defragmentation.
#[derive(Debug, Error)]
pub enum AllocError {
    /// The selected spendables cannot cover the requirement. Retriable once
    /// more funds are available.
    #[error("insufficient funds (required {required}, available {available})")]
    InsufficientFunds {
        /// Amount needed, outputs plus fee.
        required: Amount,
        /// Amount actually available across the allowed addresses.
        available: Amount,
    },

    /// The chain service collaborator failed.
    #[error("chain service: {0}")]
    Service(#[source] CollaboratorError),

    /// The tx signer collaborator failed.
    #[error("tx signer: {0}")]
    Signer(#[source] CollaboratorError),
}

/// Wrapper result type.
pub type AllocResult<T> = Result<T, AllocError>;
