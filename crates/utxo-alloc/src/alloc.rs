//! Greedy selection of spendables to fund a transaction.

use bitcoin::{Address, Amount, PrivateKey, Transaction, TxIn, TxOut, absolute, transaction::Version};

use crate::error::{AllocError, AllocResult};
use crate::types::{ChainService, Spendable, key_address};

/// Builds a version-1 transaction skeleton from inputs and outputs.
pub fn build_tx(inputs: Vec<TxIn>, outputs: Vec<TxOut>) -> Transaction {
    Transaction {
        version: Version::ONE,
        lock_time: absolute::LockTime::ZERO,
        input: inputs,
        output: outputs,
    }
}

/// Greedily selects spendables, largest first, until `required` is covered.
///
/// Largest-first minimizes the input count at the cost of fragmenting large
/// outputs. The selection and its total are returned even when the set is
/// insufficient; callers check the total against the requirement.
pub fn select_for_amount(
    mut spendables: Vec<Spendable>,
    required: Amount,
) -> (Vec<Spendable>, Amount) {
    spendables.sort_by(|a, b| b.value.cmp(&a.value));

    let mut selected = Vec::new();
    let mut total = Amount::ZERO;
    for spendable in spendables {
        total += spendable.value;
        selected.push(spendable);
        if total >= required {
            break;
        }
    }
    (selected, total)
}

/// Funds a transaction from the keys' addresses and appends a change output.
///
/// The requirement is the sum of the existing outputs plus `fee`. Inputs are
/// selected greedily across all spendables the chain service reports for the
/// keys; the difference between the selected total and the requirement goes
/// to `change_address` (the first key's address when `None`). Returns the
/// selected spendables so the caller can hand their previous outputs to the
/// signer.
///
/// Fails with [`AllocError::InsufficientFunds`] when the available total
/// cannot cover the requirement.
pub fn fund_transaction<S: ChainService>(
    service: &S,
    tx: &mut Transaction,
    keys: &[PrivateKey],
    change_address: Option<Address>,
    fee: Amount,
) -> AllocResult<Vec<Spendable>> {
    let required = tx.output.iter().map(|out| out.value).sum::<Amount>() + fee;

    let addresses: Vec<Address> = keys.iter().map(key_address).collect();
    let spendables = service
        .spendables_for_addresses(&addresses)
        .map_err(AllocError::Service)?;

    let (selected, total) = select_for_amount(spendables, required);
    if total < required {
        return Err(AllocError::InsufficientFunds {
            required,
            available: total,
        });
    }

    tx.input.extend(selected.iter().map(Spendable::to_txin));

    let change_address = change_address.or_else(|| addresses.first().cloned());
    if let Some(address) = change_address {
        tx.output.push(TxOut {
            value: total - required,
            script_pubkey: address.script_pubkey(),
        });
    }

    Ok(selected)
}

#[cfg(test)]
mod tests {
    use bitcoin::hashes::Hash;
    use bitcoin::secp256k1::SecretKey;
    use bitcoin::{NetworkKind, OutPoint, Txid};

    use super::*;
    use crate::types::CollaboratorError;

    fn test_key(fill: u8) -> PrivateKey {
        let secret = SecretKey::from_slice(&[fill; 32]).unwrap();
        PrivateKey::new(secret, NetworkKind::Main)
    }

    fn spendable(vout: u32, sats: u64, address: &Address) -> Spendable {
        Spendable::new(
            OutPoint::new(Txid::all_zeros(), vout),
            Amount::from_sat(sats),
            address.clone(),
        )
    }

    struct FixedService {
        spendables: Vec<Spendable>,
    }

    impl ChainService for FixedService {
        fn spendables_for_addresses(
            &self,
            _addresses: &[Address],
        ) -> Result<Vec<Spendable>, CollaboratorError> {
            Ok(self.spendables.clone())
        }

        fn get_tx(&self, _txid: &Txid) -> Result<Transaction, CollaboratorError> {
            Err("not available".into())
        }

        fn send_tx(&self, tx: &Transaction) -> Result<Txid, CollaboratorError> {
            Ok(tx.compute_txid())
        }
    }

    #[test]
    fn test_select_descending_greedy() {
        let address = key_address(&test_key(0x42));
        let pool = vec![
            spendable(0, 5000, &address),
            spendable(1, 3000, &address),
            spendable(2, 1000, &address),
        ];

        let (selected, total) = select_for_amount(pool, Amount::from_sat(4000));
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].value, Amount::from_sat(5000));
        assert_eq!(total, Amount::from_sat(5000));
    }

    #[test]
    fn test_select_accumulates_until_covered() {
        let address = key_address(&test_key(0x42));
        let pool = vec![
            spendable(0, 1000, &address),
            spendable(1, 3000, &address),
            spendable(2, 5000, &address),
        ];

        let (selected, total) = select_for_amount(pool, Amount::from_sat(7500));
        assert_eq!(selected.len(), 2);
        assert_eq!(total, Amount::from_sat(8000));
    }

    #[test]
    fn test_select_insufficient_returns_everything() {
        let address = key_address(&test_key(0x42));
        let pool = vec![spendable(0, 100, &address), spendable(1, 200, &address)];

        let (selected, total) = select_for_amount(pool, Amount::from_sat(1000));
        assert_eq!(selected.len(), 2);
        assert_eq!(total, Amount::from_sat(300));
    }

    #[test]
    fn test_fund_adds_inputs_and_change() {
        let key = test_key(0x42);
        let address = key_address(&key);
        let service = FixedService {
            spendables: vec![spendable(0, 50_000, &address), spendable(1, 9_000, &address)],
        };

        let mut tx = build_tx(Vec::new(), Vec::new());
        tx.output.push(TxOut {
            value: Amount::from_sat(30_000),
            script_pubkey: address.script_pubkey(),
        });

        let selected =
            fund_transaction(&service, &mut tx, &[key], None, Amount::from_sat(10_000)).unwrap();

        assert_eq!(selected.len(), 1);
        assert_eq!(tx.input.len(), 1);
        // Change is selected total minus outputs minus fee, to the first
        // key's address.
        let change = tx.output.last().unwrap();
        assert_eq!(change.value, Amount::from_sat(10_000));
        assert_eq!(change.script_pubkey, address.script_pubkey());
    }

    #[test]
    fn test_fund_explicit_change_address() {
        let key = test_key(0x42);
        let address = key_address(&key);
        let change_address = key_address(&test_key(0x43));
        let service = FixedService {
            spendables: vec![spendable(0, 20_000, &address)],
        };

        let mut tx = build_tx(Vec::new(), Vec::new());
        tx.output.push(TxOut {
            value: Amount::from_sat(5_000),
            script_pubkey: address.script_pubkey(),
        });

        fund_transaction(
            &service,
            &mut tx,
            &[key],
            Some(change_address.clone()),
            Amount::from_sat(1_000),
        )
        .unwrap();

        let change = tx.output.last().unwrap();
        assert_eq!(change.value, Amount::from_sat(14_000));
        assert_eq!(change.script_pubkey, change_address.script_pubkey());
    }

    #[test]
    fn test_fund_insufficient() {
        let key = test_key(0x42);
        let address = key_address(&key);
        let service = FixedService {
            spendables: vec![spendable(0, 1_000, &address)],
        };

        let mut tx = build_tx(Vec::new(), Vec::new());
        tx.output.push(TxOut {
            value: Amount::from_sat(30_000),
            script_pubkey: address.script_pubkey(),
        });

        let err = fund_transaction(&service, &mut tx, &[key], None, Amount::from_sat(10_000))
            .unwrap_err();
        match err {
            AllocError::InsufficientFunds {
                required,
                available,
            } => {
                assert_eq!(required, Amount::from_sat(40_000));
                assert_eq!(available, Amount::from_sat(1_000));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
