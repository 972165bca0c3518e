//! Coin selection and dust-safe output splitting.
//!
//! The allocator prepares spendable inputs and outputs for data-carrying
//! transactions: greedy selection to fund a required amount, change handling,
//! and recursive partitioning of a spendable set into many equal-value
//! outputs for defragmentation. All computation is synchronous and stateless;
//! chain queries, signing and broadcast are delegated to the [`ChainService`]
//! and [`TxSigner`] collaborators.

mod alloc;
mod error;
mod split;
mod types;

pub use alloc::{build_tx, fund_transaction, select_for_amount};
pub use error::{AllocError, AllocResult};
pub use split::{DEFAULT_FEE, DEFAULT_MAX_OUTPUTS, split_utxos};
pub use types::{ChainService, CollaboratorError, Spendable, TxSigner, key_address};
