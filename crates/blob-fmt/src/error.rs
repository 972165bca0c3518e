use bitcoin::script::PushBytesError;
use thiserror::Error;

/// Errors for encoding and decoding data blobs.
#[derive(Debug, Error)]
pub enum BlobFmtError {
    /// The transaction has no nulldata output at all.
    #[error("tx has no nulldata output")]
    NoNulldataOutput,

    /// The transaction does not carry a well-formed data blob.
    #[error("tx does not contain a data blob")]
    NoDataBlob,

    /// The payload exceeds the 2-byte length prefix capacity.
    #[error("blob of {len} bytes exceeds {max} byte limit")]
    MaxBlobSizeExceeded {
        /// Maximum encodable payload length.
        max: usize,
        /// Length of the rejected payload.
        len: usize,
    },

    /// The transaction already carries a nulldata output.
    #[error("tx already has a nulldata output")]
    ExistingNulldataOutput,

    /// Error while converting data to `PushBytesBuf`, typically due to invalid length.
    #[error("pushbytes: {0}")]
    PushBytes(#[from] PushBytesError),
}

/// Wrapper result type.
pub type BlobFmtResult<T> = Result<T, BlobFmtError>;
