//! The 65-byte signature layout, signing and recovery.

use std::fmt;
use std::str;
use std::sync::LazyLock;

use bitcoin::hashes::Hash as _;
use bitcoin::secp256k1::ecdsa::{RecoverableSignature, RecoveryId, Signature};
use bitcoin::secp256k1::{All, Message, Secp256k1};
use bitcoin::{Address, NetworkKind, PrivateKey, PublicKey, secp256k1};

use crate::digest::signed_message_digest;
use crate::error::{MsgSigError, MsgSigResult};

/// Exact byte length of a recoverable signature.
pub const SIGNATURE_LEN: usize = 65;

/// Base value of the header byte.
const HEADER_BASE: u8 = 27;

/// Header flag marking a compressed public key encoding.
const COMPRESSED_FLAG: u8 = 4;

/// Process-wide signing and verification context.
static SECP: LazyLock<Secp256k1<All>> = LazyLock::new(Secp256k1::new);

/// A 65-byte publicly-recoverable message signature.
///
/// Layout is one header byte ([`HEADER_BASE`] plus the 2-bit recovery id,
/// plus 4 if the signer's public key is compressed-encoded) followed by the
/// 32-byte `r` and 32-byte `s` of a compact ECDSA signature. Immutable once
/// produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecoverableSig([u8; SIGNATURE_LEN]);

impl RecoverableSig {
    /// Creates a signature from a raw [`SIGNATURE_LEN`]-byte array.
    ///
    /// The header byte is not validated here; a malformed header surfaces as
    /// a recovery failure instead.
    pub const fn from_byte_array(bytes: [u8; SIGNATURE_LEN]) -> Self {
        Self(bytes)
    }

    /// Returns the raw signature bytes.
    pub const fn as_bytes(&self) -> &[u8; SIGNATURE_LEN] {
        &self.0
    }

    /// Converts to the inner byte array.
    pub const fn to_byte_array(self) -> [u8; SIGNATURE_LEN] {
        self.0
    }

    /// Gets the recovery id encoded in the header byte.
    pub fn recovery_id(&self) -> MsgSigResult<u8> {
        self.params().map(|(recovery_id, _)| recovery_id)
    }

    /// Whether the header byte marks a compressed public key encoding.
    pub fn is_compressed(&self) -> MsgSigResult<bool> {
        self.params().map(|(_, compressed)| compressed)
    }

    /// Assembles a signature from recovery params and a compact `(r, s)`.
    fn from_parts(recovery_id: u8, compressed: bool, compact: &[u8; 64]) -> Self {
        let mut buf = [0u8; SIGNATURE_LEN];
        buf[0] = HEADER_BASE + recovery_id + if compressed { COMPRESSED_FLAG } else { 0 };
        buf[1..].copy_from_slice(compact);
        Self(buf)
    }

    /// Parses the header byte into recovery id and compressed flag. At most
    /// the low 3 bits may be set above the base.
    fn params(&self) -> MsgSigResult<(u8, bool)> {
        let header = self.0[0];
        let params = header
            .checked_sub(HEADER_BASE)
            .ok_or(MsgSigError::InvalidSignatureParameter(header))?;
        if params & !7 != 0 {
            return Err(MsgSigError::InvalidSignatureParameter(header));
        }
        Ok((params & 3, params & COMPRESSED_FLAG != 0))
    }

    /// The compact `(r, s)` following the header byte.
    fn compact(&self) -> &[u8] {
        &self.0[1..]
    }
}

impl AsRef<[u8]> for RecoverableSig {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<&[u8]> for RecoverableSig {
    type Error = MsgSigError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        let buf: [u8; SIGNATURE_LEN] = value
            .try_into()
            .map_err(|_| MsgSigError::InvalidLength(value.len()))?;
        Ok(Self(buf))
    }
}

impl fmt::Display for RecoverableSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl str::FromStr for RecoverableSig {
    type Err = MsgSigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|_| MsgSigError::InvalidHex)?;
        Self::try_from(bytes.as_slice())
    }
}

/// Signs `data` with `key`, producing a publicly-recoverable signature.
///
/// The ECDSA signature over the signed-message digest is deterministic
/// (RFC6979 nonces), so repeated calls yield identical bytes. The signature
/// alone does not encode which of the candidate public keys produced it, so
/// the header byte is found by exhaustively trying all recovery id and
/// compressed-flag combinations in fixed order and keeping the first that
/// self-verifies against the key's own address.
pub fn sign_message(data: &[u8], key: &PrivateKey) -> MsgSigResult<RecoverableSig> {
    let digest = signed_message_digest(data);
    let msg = Message::from_digest(digest.to_byte_array());
    let compact = SECP.sign_ecdsa(&msg, &key.inner).serialize_compact();

    let address = Address::p2pkh(key.public_key(&SECP), key.network);

    for recovery_id in 0..4u8 {
        for compressed in [true, false] {
            let candidate = RecoverableSig::from_parts(recovery_id, compressed, &compact);
            if verify_message(&address, &candidate, data, key.network) {
                return Ok(candidate);
            }
        }
    }
    Err(MsgSigError::RecoveryParamsNotFound)
}

/// Recovers the public key that produced `sig` over `data`.
///
/// Applies the SEC 1 §4.1.6 public key recovery operation for the recovery
/// id in the header, then re-validates the recovered key against the raw
/// `(r, s)` to guard against a spurious point satisfying the recovery
/// equation by construction but not the signature itself. Every failure mode
/// is an error value, never a panic.
pub fn recover_pubkey(sig: &RecoverableSig, data: &[u8]) -> MsgSigResult<secp256k1::PublicKey> {
    let (recovery_id, _) = sig.params()?;
    let recoverable =
        RecoverableSignature::from_compact(sig.compact(), RecoveryId::from_i32(recovery_id as i32)?)?;

    let digest = signed_message_digest(data);
    let msg = Message::from_digest(digest.to_byte_array());
    let pubkey = SECP.recover_ecdsa(&msg, &recoverable)?;

    SECP.verify_ecdsa(&msg, &Signature::from_compact(sig.compact())?, &pubkey)?;
    Ok(pubkey)
}

/// Checks that `sig` was produced over `data` by the key behind `address`.
///
/// The candidate key is recovered from the signature, turned into a p2pkh
/// address on `network` using the header's compressed flag, and compared.
/// Total and side-effect free: every internal failure yields `false`.
pub fn verify_message(
    address: &Address,
    sig: &RecoverableSig,
    data: &[u8],
    network: NetworkKind,
) -> bool {
    let Ok((_, compressed)) = sig.params() else {
        return false;
    };
    let Ok(pubkey) = recover_pubkey(sig, data) else {
        return false;
    };

    let recovered = if compressed {
        PublicKey::new(pubkey)
    } else {
        PublicKey::new_uncompressed(pubkey)
    };
    Address::p2pkh(recovered, network) == *address
}
