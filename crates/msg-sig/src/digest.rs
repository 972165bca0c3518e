//! The canonical Bitcoin signed-message digest.

use bitcoin::consensus::Encodable;
use bitcoin::consensus::encode::VarInt;
use bitcoin::hashes::{Hash, HashEngine, sha256d};

/// Fixed digest prefix, including its own length byte.
const SIGNED_MSG_PREFIX: &[u8] = b"\x18Bitcoin Signed Message:\n";

/// Computes the Bitcoin signed-message digest of raw `data`.
///
/// This is the double-SHA256 of the fixed prefix, the varint encoding of
/// `data.len()` and the data itself. The framing is the interop contract
/// with other Bitcoin message signing tools and must not change.
pub fn signed_message_digest(data: &[u8]) -> sha256d::Hash {
    let mut engine = sha256d::Hash::engine();
    engine.input(SIGNED_MSG_PREFIX);
    VarInt::from(data.len())
        .consensus_encode(&mut engine)
        .expect("engines don't error");
    engine.input(data);
    sha256d::Hash::from_engine(engine)
}
