//! Encodes arbitrary byte payloads into a transaction's outputs and
//! reassembles them.
//!
//! A data blob is framed with a 2-byte big-endian length prefix and laid out
//! across outputs:
//!
//! ```text
//! output n     OP_RETURN <prefix + first 38 payload bytes>   (nulldata)
//! output n+1   p2pkh whose hash slot holds payload bytes     (hash160 carrier)
//! ...
//! output n+k   p2pkh, final chunk zero-padded to 20 bytes
//! ```
//!
//! Output order is the only reconstruction key; there is no chaining pointer.
//! A transaction carries at most one nulldata output.

mod blob;
mod error;
mod script;

pub use blob::{DUST_LIMIT, MAX_BLOB_LEN, SIZE_PREFIX_LEN, decode_data_blob, encode_data_blob};
pub use error::{BlobFmtError, BlobFmtResult};
pub use script::{
    HASH160_DATA_LEN, MAX_NULLDATA_LEN, extract_hash160_data, extract_nulldata,
    find_nulldata_output, new_hash160data_script, new_nulldata_script,
};
