//! Frame composition and parsing.

use std::io::{Read, Write};
use std::sync::LazyLock;

use bitcoin::hashes::Hash;
use bitcoin::secp256k1::{All, Secp256k1};
use bitcoin::{Address, Amount, NetworkKind, PrivateKey, PubkeyHash, Transaction};
use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use txstore_blob_fmt::{decode_data_blob, encode_data_blob};
use txstore_msg_sig::{RecoverableSig, SIGNATURE_LEN, sign_message, verify_message};

use crate::errors::{BroadcastFmtError, BroadcastFmtResult};

/// Zero padding between the signature and the sender hash160, aligning the
/// hash160 with a carrier output slot. No semantic meaning.
pub const PAD_LEN: usize = 13;

/// Byte length of the sender address hash160 field.
pub const HASH160_LEN: usize = 20;

/// Minimum frame length: signature, padding and hash160 around an empty
/// message.
pub const MIN_FRAME_LEN: usize = SIGNATURE_LEN + PAD_LEN + HASH160_LEN;

static SECP: LazyLock<Secp256k1<All>> = LazyLock::new(Secp256k1::new);

/// A decoded broadcast message.
///
/// Derived from a transaction on read; never stored independently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastMessage {
    /// Sender p2pkh address carried in the frame.
    pub address: Address,
    /// The broadcast message text.
    pub message: String,
    /// Recoverable signature over the UTF-8 message bytes.
    pub signature: RecoverableSig,
}

/// Signs `message` with `sender_key` and appends the broadcast frame to the
/// given transaction as a data blob.
pub fn add_broadcast_message(
    tx: &mut Transaction,
    message: &str,
    sender_key: &PrivateKey,
    dust_limit: Amount,
) -> BroadcastFmtResult<()> {
    let msg_data = message.as_bytes();
    let signature = sign_message(msg_data, sender_key)?;
    let hash160 = sender_key.public_key(&SECP).pubkey_hash();

    // Compress after signing in case implementations compress differently.
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(9));
    encoder.write_all(msg_data).expect("vec write");
    let compressed = encoder.finish().expect("vec write");

    let mut frame = Vec::with_capacity(MIN_FRAME_LEN + compressed.len());
    frame.extend_from_slice(signature.as_bytes());
    frame.extend_from_slice(&[0u8; PAD_LEN]);
    frame.extend_from_slice(hash160.as_byte_array());
    frame.extend_from_slice(&compressed);

    encode_data_blob(tx, &frame, dust_limit)?;
    Ok(())
}

/// Extracts and verifies the broadcast message carried by a transaction.
///
/// Fails with [`BroadcastFmtError::NoBroadcastMessage`] if the transaction
/// carries no blob, the frame is too short, decompression or UTF-8 decoding
/// fails, or the signature does not verify against the framed sender
/// address.
pub fn get_broadcast_message(
    tx: &Transaction,
    network: NetworkKind,
) -> BroadcastFmtResult<BroadcastMessage> {
    let frame = decode_data_blob(tx).map_err(|_| BroadcastFmtError::NoBroadcastMessage)?;
    if frame.len() < MIN_FRAME_LEN {
        return Err(BroadcastFmtError::NoBroadcastMessage);
    }

    let mut sig_bytes = [0u8; SIGNATURE_LEN];
    sig_bytes.copy_from_slice(&frame[..SIGNATURE_LEN]);
    let signature = RecoverableSig::from_byte_array(sig_bytes);

    let hash_start = SIGNATURE_LEN + PAD_LEN;
    let mut hash160 = [0u8; HASH160_LEN];
    hash160.copy_from_slice(&frame[hash_start..hash_start + HASH160_LEN]);
    let address = Address::p2pkh(PubkeyHash::from_byte_array(hash160), network);

    // Decompress before verification in case implementations compress
    // differently.
    let mut decoder = ZlibDecoder::new(&frame[hash_start + HASH160_LEN..]);
    let mut msg_data = Vec::new();
    decoder
        .read_to_end(&mut msg_data)
        .map_err(|_| BroadcastFmtError::NoBroadcastMessage)?;

    if !verify_message(&address, &signature, &msg_data, network) {
        return Err(BroadcastFmtError::NoBroadcastMessage);
    }

    let message =
        String::from_utf8(msg_data).map_err(|_| BroadcastFmtError::NoBroadcastMessage)?;

    Ok(BroadcastMessage {
        address,
        message,
        signature,
    })
}
