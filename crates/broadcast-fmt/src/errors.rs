use thiserror::Error;
use txstore_blob_fmt::BlobFmtError;
use txstore_msg_sig::MsgSigError;

/// Errors from composing and parsing broadcast messages.
#[derive(Debug, Error)]
pub enum BroadcastFmtError {
    /// The transaction does not carry a valid broadcast message. Raised for
    /// missing blobs, short frames, decompression failures and bad
    /// signatures alike; a negative classification rather than a fault.
    #[error("tx does not contain a broadcast message")]
    NoBroadcastMessage,

    /// The blob layer rejected the frame while composing.
    #[error("blob: {0}")]
    BlobFmt(#[from] BlobFmtError),

    /// Signing the message failed.
    #[error("signature: {0}")]
    MsgSig(#[from] MsgSigError),
}

/// Wrapper result type.
pub type BroadcastFmtResult<T> = Result<T, BroadcastFmtError>;
