//! Splitting a framed blob across outputs and reassembling it.

use bitcoin::{Amount, Transaction, TxOut};

use crate::error::{BlobFmtError, BlobFmtResult};
use crate::script::{
    HASH160_DATA_LEN, MAX_NULLDATA_LEN, extract_hash160_data, find_nulldata_output,
    new_hash160data_script, new_nulldata_script,
};

/// Length of the big-endian size prefix framing a blob.
pub const SIZE_PREFIX_LEN: usize = 2;

/// Maximum payload length encodable in the size prefix.
pub const MAX_BLOB_LEN: usize = u16::MAX as usize;

/// Default value given to hash160 carrier outputs so they stay relayable.
pub const DUST_LIMIT: Amount = Amount::from_sat(548);

/// Appends outputs carrying `data` to the given transaction.
///
/// The payload is framed with a [`SIZE_PREFIX_LEN`]-byte big-endian length
/// prefix. If the framed blob fits a single nulldata output it is stored
/// there whole; otherwise the first [`MAX_NULLDATA_LEN`] bytes go into the
/// nulldata output and the rest is chunked into hash160 carrier outputs
/// valued at `dust_limit`, appended in chunk order. Existing inputs and
/// outputs are left untouched.
///
/// Fails with [`BlobFmtError::MaxBlobSizeExceeded`] if `data` is longer than
/// [`MAX_BLOB_LEN`] and with [`BlobFmtError::ExistingNulldataOutput`] if the
/// transaction already carries a nulldata output.
pub fn encode_data_blob(
    tx: &mut Transaction,
    data: &[u8],
    dust_limit: Amount,
) -> BlobFmtResult<()> {
    if data.len() > MAX_BLOB_LEN {
        return Err(BlobFmtError::MaxBlobSizeExceeded {
            max: MAX_BLOB_LEN,
            len: data.len(),
        });
    }
    // Any OP_RETURN-led script counts, even one too malformed to decode;
    // a transaction carries at most one nulldata output.
    if tx.output.iter().any(|out| out.script_pubkey.is_op_return()) {
        return Err(BlobFmtError::ExistingNulldataOutput);
    }

    let mut framed = Vec::with_capacity(SIZE_PREFIX_LEN + data.len());
    framed.extend_from_slice(&(data.len() as u16).to_be_bytes());
    framed.extend_from_slice(data);

    // Nulldata alone is sufficient.
    if framed.len() <= MAX_NULLDATA_LEN {
        tx.output.push(nulldata_txout(&framed)?);
        return Ok(());
    }

    // Prefix and initial data in the nulldata output, the remainder in
    // hash160 carrier outputs.
    tx.output.push(nulldata_txout(&framed[..MAX_NULLDATA_LEN])?);
    for chunk in framed[MAX_NULLDATA_LEN..].chunks(HASH160_DATA_LEN) {
        let mut slot = [0u8; HASH160_DATA_LEN];
        slot[..chunk.len()].copy_from_slice(chunk);
        tx.output.push(TxOut {
            value: dust_limit,
            script_pubkey: new_hash160data_script(slot),
        });
    }

    Ok(())
}

/// Reassembles the data blob carried by a transaction.
///
/// Reads the size prefix and initial chunk from the nulldata output, then
/// concatenates the hash slots of the required number of outputs immediately
/// following it, truncating the carrier padding. Any missing, short or
/// inconsistent piece fails with [`BlobFmtError::NoDataBlob`].
pub fn decode_data_blob(tx: &Transaction) -> BlobFmtResult<Vec<u8>> {
    let (nulldata_index, nulldata) =
        find_nulldata_output(tx).map_err(|_| BlobFmtError::NoDataBlob)?;

    if nulldata.len() < SIZE_PREFIX_LEN {
        return Err(BlobFmtError::NoDataBlob);
    }

    let size = u16::from_be_bytes([nulldata[0], nulldata[1]]) as usize;
    let mut data = nulldata[SIZE_PREFIX_LEN..].to_vec();

    // The declared size can never be smaller than what is already present.
    if size < data.len() {
        return Err(BlobFmtError::NoDataBlob);
    }
    if size == data.len() {
        return Ok(data);
    }

    let needed_outputs = (size - data.len()).div_ceil(HASH160_DATA_LEN);
    if nulldata_index + 1 + needed_outputs > tx.output.len() {
        return Err(BlobFmtError::NoDataBlob);
    }

    for out in &tx.output[nulldata_index + 1..nulldata_index + 1 + needed_outputs] {
        let chunk = extract_hash160_data(&out.script_pubkey)?;
        data.extend_from_slice(&chunk);
    }

    // Trim the zero padding of the last carrier output.
    data.truncate(size);
    Ok(data)
}

fn nulldata_txout(data: &[u8]) -> BlobFmtResult<TxOut> {
    Ok(TxOut {
        value: Amount::ZERO,
        script_pubkey: new_nulldata_script(data)?,
    })
}
