use thiserror::Error;

/// Errors from signature construction and public key recovery.
#[derive(Debug, Error)]
pub enum MsgSigError {
    /// Signature material had the wrong length.
    #[error("invalid signature length {0}")]
    InvalidLength(usize),

    /// Header byte carries bits outside the recovery id and compressed flag.
    #[error("invalid signature parameter byte {0:#04x}")]
    InvalidSignatureParameter(u8),

    /// Hex signature string could not be parsed.
    #[error("invalid hex signature")]
    InvalidHex,

    /// Curve arithmetic failure during signing, recovery or validation.
    #[error("secp256k1: {0}")]
    Secp(#[from] bitcoin::secp256k1::Error),

    /// No recovery parameter combination self-verified; cannot occur for a
    /// correctly computed signature.
    #[error("no recovery params produced a verifiable signature")]
    RecoveryParamsNotFound,
}

/// Wrapper result type.
pub type MsgSigResult<T> = Result<T, MsgSigError>;
