//! The two script layouts a data blob is spread across.

use bitcoin::hashes::Hash;
use bitcoin::opcodes::all::OP_RETURN;
use bitcoin::script::{Instruction, PushBytesBuf};
use bitcoin::{PubkeyHash, Script, ScriptBuf, Transaction};

use crate::error::{BlobFmtError, BlobFmtResult};

/// Maximum payload carried by a single nulldata output, length prefix included.
pub const MAX_NULLDATA_LEN: usize = 40;

/// Payload bytes carried in the hash slot of a hash160 carrier output.
pub const HASH160_DATA_LEN: usize = 20;

/// Builds a nulldata script carrying `data` directly.
pub fn new_nulldata_script(data: &[u8]) -> BlobFmtResult<ScriptBuf> {
    let pushbytes = PushBytesBuf::try_from(data.to_vec())?;

    let script = ScriptBuf::builder()
        .push_opcode(OP_RETURN)
        .push_slice(pushbytes)
        .into_script();

    Ok(script)
}

/// Builds a standard p2pkh script whose 20-byte hash slot is repurposed to
/// hold raw payload bytes.
pub fn new_hash160data_script(chunk: [u8; HASH160_DATA_LEN]) -> ScriptBuf {
    ScriptBuf::new_p2pkh(&PubkeyHash::from_byte_array(chunk))
}

/// Extracts the raw bytes carried by a nulldata script.
///
/// A bare `OP_RETURN` with no push yields an empty slice.
pub fn extract_nulldata(script: &Script) -> BlobFmtResult<&[u8]> {
    let mut instrs = script.instructions();
    match instrs.next() {
        Some(Ok(Instruction::Op(op))) if op == OP_RETURN => {}
        _ => return Err(BlobFmtError::NoNulldataOutput),
    }

    match instrs.next() {
        None => Ok(&[]),
        Some(Ok(Instruction::PushBytes(data))) => Ok(data.as_bytes()),
        _ => Err(BlobFmtError::NoDataBlob),
    }
}

/// Extracts the 20 payload bytes from a hash160 carrier script.
pub fn extract_hash160_data(script: &Script) -> BlobFmtResult<[u8; HASH160_DATA_LEN]> {
    if !script.is_p2pkh() {
        return Err(BlobFmtError::NoDataBlob);
    }

    // p2pkh is OP_DUP OP_HASH160 <push 20> <hash> OP_EQUALVERIFY OP_CHECKSIG,
    // so after the shape check the hash slot sits at bytes 3..23.
    let mut chunk = [0u8; HASH160_DATA_LEN];
    chunk.copy_from_slice(&script.as_bytes()[3..3 + HASH160_DATA_LEN]);
    Ok(chunk)
}

/// Finds the nulldata output of a transaction, returning its index and raw
/// payload bytes.
///
/// The first matching output wins, even if later outputs are also
/// nulldata-shaped.
pub fn find_nulldata_output(tx: &Transaction) -> BlobFmtResult<(usize, &[u8])> {
    for (index, out) in tx.output.iter().enumerate() {
        if out.script_pubkey.is_op_return() {
            return Ok((index, extract_nulldata(&out.script_pubkey)?));
        }
    }
    Err(BlobFmtError::NoNulldataOutput)
}
