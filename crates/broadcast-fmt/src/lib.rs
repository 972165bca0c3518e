//! Signed broadcast messages carried in transaction data blobs.
//!
//! A broadcast message frames a recoverable signature with the sender's
//! identity and the compressed message text:
//!
//! ```text
//! [0..65]   recoverable signature over the UTF-8 message bytes
//! [65..78]  zero padding, so the hash160 lands on carrier-slot alignment
//! [78..98]  sender address hash160
//! [98..]    zlib-compressed message bytes
//! ```
//!
//! Compression happens after signing so that implementations with differing
//! compressors still produce verifiable signatures. The frame travels as an
//! ordinary data blob; reading one back recovers and checks the sender
//! identity before anything is returned.

mod errors;
mod message;

pub use errors::{BroadcastFmtError, BroadcastFmtResult};
pub use message::{
    BroadcastMessage, HASH160_LEN, MIN_FRAME_LEN, PAD_LEN, add_broadcast_message,
    get_broadcast_message,
};
