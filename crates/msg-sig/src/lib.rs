//! Compact publicly-recoverable message signatures tied to Bitcoin p2pkh
//! addresses.
//!
//! A signature is 65 bytes: one header byte encoding a 2-bit recovery id and
//! a compressed-key flag, followed by the compact `(r, s)` of a deterministic
//! ECDSA signature over the canonical Bitcoin signed-message digest. A
//! verifier recovers the signer's public key from the signature alone and
//! checks it against an address, without knowing the key in advance.

#[cfg(feature = "serde")]
mod serde;

mod digest;
mod error;
mod sig;

pub use digest::signed_message_digest;
pub use error::{MsgSigError, MsgSigResult};
pub use sig::{RecoverableSig, SIGNATURE_LEN, recover_pubkey, sign_message, verify_message};

// Dev-deps exercised only by the serde feature tests.
#[cfg(all(test, not(feature = "serde")))]
use bincode as _;
#[cfg(all(test, not(feature = "serde")))]
use serde_json as _;
