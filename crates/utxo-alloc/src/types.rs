//! The spendable model and external collaborator contracts.

use std::sync::LazyLock;

use bitcoin::secp256k1::{All, Secp256k1};
use bitcoin::{
    Address, Amount, OutPoint, PrivateKey, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Txid,
    Witness,
};

/// Process-wide key derivation context.
static SECP: LazyLock<Secp256k1<All>> = LazyLock::new(Secp256k1::new);

/// A reference to an unspent prior output available to fund a transaction.
///
/// Produced by the chain service; consumed and removed from the working set
/// as it is allocated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spendable {
    /// The previous transaction output being spent.
    pub outpoint: OutPoint,
    /// Coin value of the output.
    pub value: Amount,
    /// Address controlling the output.
    pub address: Address,
}

impl Spendable {
    /// Constructs a new instance.
    pub fn new(outpoint: OutPoint, value: Amount, address: Address) -> Self {
        Self {
            outpoint,
            value,
            address,
        }
    }

    /// Builds the unsigned input spending this output.
    pub fn to_txin(&self) -> TxIn {
        TxIn {
            previous_output: self.outpoint,
            script_sig: ScriptBuf::new(),
            sequence: Sequence::MAX,
            witness: Witness::new(),
        }
    }

    /// Rebuilds the previous output this spendable refers to, as needed by
    /// the signer.
    pub fn prev_txout(&self) -> TxOut {
        TxOut {
            value: self.value,
            script_pubkey: self.address.script_pubkey(),
        }
    }
}

/// Derives the p2pkh address controlled by a private key.
pub fn key_address(key: &PrivateKey) -> Address {
    Address::p2pkh(key.public_key(&SECP), key.network)
}

/// Opaque error produced by an external collaborator.
pub type CollaboratorError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Chain query and broadcast collaborator.
///
/// Implementations may block; the allocator performs no I/O of its own and
/// treats each returned spendable set as a snapshot.
pub trait ChainService {
    /// Lists spendable outputs controlled by any of the given addresses.
    fn spendables_for_addresses(
        &self,
        addresses: &[Address],
    ) -> Result<Vec<Spendable>, CollaboratorError>;

    /// Fetches a transaction by id.
    fn get_tx(&self, txid: &Txid) -> Result<Transaction, CollaboratorError>;

    /// Broadcasts a fully signed transaction, returning its id.
    fn send_tx(&self, tx: &Transaction) -> Result<Txid, CollaboratorError>;
}

/// Transaction signing collaborator.
pub trait TxSigner {
    /// Signs every input of `tx` with the given keys, where `prev_outs[i]`
    /// is the output spent by input `i`.
    fn sign_tx(
        &self,
        tx: &mut Transaction,
        keys: &[PrivateKey],
        prev_outs: &[TxOut],
    ) -> Result<(), CollaboratorError>;
}
