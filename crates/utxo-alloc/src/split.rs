//! Recursive dust-safe splitting of a spendable set into equal outputs.

use bitcoin::{Address, Amount, PrivateKey, TxOut, Txid};

use crate::alloc::build_tx;
use crate::error::{AllocError, AllocResult};
use crate::types::{ChainService, Spendable, TxSigner, key_address};

/// Default flat fee per split transaction.
pub const DEFAULT_FEE: Amount = Amount::from_sat(10_000);

/// Default ceiling on outputs per split transaction.
pub const DEFAULT_MAX_OUTPUTS: usize = 100;

/// Partitions a spendable set into many equal-value outputs back to `key`.
///
/// Spendables worth no more than the fee or the per-output `limit` are
/// dropped up front. Each pass consumes the largest remaining spendables
/// until the per-transaction input cap is reached, partitions the input
/// total minus `fee` into up to `max_outputs` equal outputs (integer
/// division remainder on the first output, so no value is created or lost),
/// signs and broadcasts, then repeats on the remainder. Splitting stops once
/// the remaining total cannot fund a fee plus two limit-sized outputs.
///
/// The spendable set is treated as a snapshot taken once; the chain is not
/// re-queried between passes. A `max_outputs` of zero leaves nothing to
/// split into, so no transactions are produced. Returns the ids of the
/// broadcast transactions in production order.
pub fn split_utxos<S: ChainService, G: TxSigner>(
    service: &S,
    signer: &G,
    key: &PrivateKey,
    spendables: Vec<Spendable>,
    limit: Amount,
    fee: Amount,
    max_outputs: usize,
) -> AllocResult<Vec<Txid>> {
    if max_outputs == 0 {
        return Ok(Vec::new());
    }

    let address = key_address(key);
    let mut working = filter_dust(spendables, fee, limit);
    let mut txids = Vec::new();

    while enough_to_split(&working, fee, limit) {
        let (inputs, inputs_total) = take_inputs(&mut working, limit, max_outputs, fee);
        let outputs = split_outputs(&address, inputs_total, fee, max_outputs, limit);

        let prev_outs: Vec<TxOut> = inputs.iter().map(Spendable::prev_txout).collect();
        let mut tx = build_tx(inputs.iter().map(Spendable::to_txin).collect(), outputs);

        signer
            .sign_tx(&mut tx, std::slice::from_ref(key), &prev_outs)
            .map_err(AllocError::Signer)?;
        txids.push(service.send_tx(&tx).map_err(AllocError::Service)?);
    }

    Ok(txids)
}

/// Drops spendables that would be consumed whole by the fee or cannot fill a
/// limit-sized output, and sorts the rest ascending so fragmentation debt is
/// retired smallest-first.
fn filter_dust(spendables: Vec<Spendable>, fee: Amount, limit: Amount) -> Vec<Spendable> {
    let mut kept: Vec<Spendable> = spendables
        .into_iter()
        .filter(|s| s.value > fee && s.value > limit)
        .collect();
    kept.sort_by_key(|s| s.value);
    kept
}

/// Whether the remaining set can still fund a fee plus two limit-sized
/// outputs.
fn enough_to_split(spendables: &[Spendable], fee: Amount, limit: Amount) -> bool {
    let total: Amount = spendables.iter().map(|s| s.value).sum();
    total >= fee + limit * 2
}

/// Pops spendables from the tail of the ascending-sorted working set
/// (largest first) until the accumulated total exceeds the per-transaction
/// input cap or the set is exhausted.
fn take_inputs(
    spendables: &mut Vec<Spendable>,
    limit: Amount,
    max_outputs: usize,
    fee: Amount,
) -> (Vec<Spendable>, Amount) {
    let max_input = limit * max_outputs as u64 + fee;

    let mut inputs = Vec::new();
    let mut total = Amount::ZERO;
    while total <= max_input {
        match spendables.pop() {
            Some(spendable) => {
                total += spendable.value;
                inputs.push(spendable);
            }
            None => break,
        }
    }
    (inputs, total)
}

/// Partitions `inputs_total - fee` into equal-value outputs to `address`.
///
/// Output count is `max_outputs` when the distributable total exceeds that
/// many limits, otherwise however many limit-sized outputs fit. The integer
/// division remainder is added entirely to the first output so the output
/// sum equals the distributable total exactly.
fn split_outputs(
    address: &Address,
    inputs_total: Amount,
    fee: Amount,
    max_outputs: usize,
    limit: Amount,
) -> Vec<TxOut> {
    let distributable = (inputs_total - fee).to_sat();
    let limit = limit.to_sat();

    let count = if distributable > max_outputs as u64 * limit {
        max_outputs as u64
    } else {
        distributable / limit
    };
    let amount = distributable / count;
    let remainder = distributable - amount * count;

    (0..count)
        .map(|i| TxOut {
            value: Amount::from_sat(if i == 0 { amount + remainder } else { amount }),
            script_pubkey: address.script_pubkey(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use bitcoin::hashes::Hash;
    use bitcoin::secp256k1::SecretKey;
    use bitcoin::{NetworkKind, OutPoint, Transaction, Txid};

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

    /// Records every broadcast transaction.
    #[derive(Default)]
    struct RecordingService {
        sent: RefCell<Vec<Transaction>>,
    }

    impl ChainService for RecordingService {
        fn spendables_for_addresses(
            &self,
            _addresses: &[Address],
        ) -> Result<Vec<Spendable>, CollaboratorError> {
            Ok(Vec::new())
        }

        fn get_tx(&self, _txid: &Txid) -> Result<Transaction, CollaboratorError> {
            Err("not available".into())
        }

        fn send_tx(&self, tx: &Transaction) -> Result<Txid, CollaboratorError> {
            self.sent.borrow_mut().push(tx.clone());
            Ok(tx.compute_txid())
        }
    }

    /// A signer that accepts every transaction unchanged.
    struct NoopSigner;

    impl TxSigner for NoopSigner {
        fn sign_tx(
            &self,
            _tx: &mut Transaction,
            _keys: &[PrivateKey],
            _prev_outs: &[TxOut],
        ) -> Result<(), CollaboratorError> {
            Ok(())
        }
    }

    fn run_split(
        pool: Vec<Spendable>,
        limit: u64,
        fee: u64,
        max_outputs: usize,
    ) -> (Vec<Txid>, Vec<Transaction>) {
        let service = RecordingService::default();
        let txids = split_utxos(
            &service,
            &NoopSigner,
            &test_key(0x42),
            pool,
            Amount::from_sat(limit),
            Amount::from_sat(fee),
            max_outputs,
        )
        .unwrap();
        let sent = service.sent.into_inner();
        (txids, sent)
    }

    #[test]
    fn test_split_output_sum_is_exact() {
        let address = key_address(&test_key(0x42));
        let pool = vec![
            spendable(0, 100_000, &address),
            spendable(1, 70_001, &address),
            spendable(2, 35_007, &address),
        ];

        let (txids, sent) = run_split(pool, 10_000, 1_000, 100);
        assert_eq!(txids.len(), sent.len());
        assert!(!sent.is_empty());

        for tx in &sent {
            let inputs_total: u64 = tx
                .input
                .iter()
                .map(|txin| match txin.previous_output.vout {
                    0 => 100_000u64,
                    1 => 70_001,
                    2 => 35_007,
                    _ => unreachable!(),
                })
                .sum();
            let outputs_total: u64 = tx.output.iter().map(|out| out.value.to_sat()).sum();
            assert_eq!(outputs_total, inputs_total - 1_000);
        }
    }

    #[test]
    fn test_split_remainder_goes_to_first_output() {
        let address = key_address(&test_key(0x42));
        // One pass: 35_007 - 1_000 = 34_007 distributable, limit 10_000
        // gives 3 outputs of 11_335 with remainder 2 on the first.
        let pool = vec![spendable(0, 35_007, &address)];

        let (_, sent) = run_split(pool, 10_000, 1_000, 100);
        assert_eq!(sent.len(), 1);
        let values: Vec<u64> = sent[0].output.iter().map(|o| o.value.to_sat()).collect();
        assert_eq!(values, vec![11_337, 11_335, 11_335]);
    }

    #[test]
    fn test_split_respects_max_outputs() {
        let address = key_address(&test_key(0x42));
        let pool = vec![spendable(0, 1_000_000, &address)];

        let (_, sent) = run_split(pool, 10_000, 1_000, 5);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].output.len(), 5);
        let outputs_total: u64 = sent[0].output.iter().map(|o| o.value.to_sat()).sum();
        assert_eq!(outputs_total, 999_000);
    }

    #[test]
    fn test_split_zero_max_outputs_is_a_noop() {
        let address = key_address(&test_key(0x42));
        let pool = vec![spendable(0, 1_000_000, &address)];

        let (txids, sent) = run_split(pool, 10_000, 1_000, 0);
        assert!(txids.is_empty());
        assert!(sent.is_empty());
    }

    #[test]
    fn test_split_filters_dust() {
        let address = key_address(&test_key(0x42));
        // Every spendable is at or below the fee or the limit; nothing to do.
        let pool = vec![
            spendable(0, 900, &address),
            spendable(1, 10_000, &address),
            spendable(2, 1_000, &address),
        ];

        let (txids, sent) = run_split(pool, 10_000, 1_000, 100);
        assert!(txids.is_empty());
        assert!(sent.is_empty());
    }

    #[test]
    fn test_split_stop_condition() {
        let address = key_address(&test_key(0x42));
        // 20_999 < fee + 2 * limit = 21_000: not worth splitting.
        let pool = vec![spendable(0, 20_999, &address)];
        let (txids, _) = run_split(pool, 10_000, 1_000, 100);
        assert!(txids.is_empty());

        // One more satoshi makes the split worthwhile.
        let pool = vec![spendable(0, 21_000, &address)];
        let (txids, sent) = run_split(pool, 10_000, 1_000, 100);
        assert_eq!(txids.len(), 1);
        assert_eq!(sent[0].output.len(), 2);
    }

    #[test]
    fn test_split_multiple_passes() {
        let address = key_address(&test_key(0x42));
        // Cap per pass is limit * max_outputs + fee = 21_000, so the pool
        // cannot be consumed in one transaction.
        let pool = vec![
            spendable(0, 30_000, &address),
            spendable(1, 40_000, &address),
            spendable(2, 50_000, &address),
        ];

        let (txids, sent) = run_split(pool, 10_000, 1_000, 2);
        assert!(sent.len() > 1);
        assert_eq!(
            txids,
            sent.iter().map(|tx| tx.compute_txid()).collect::<Vec<_>>()
        );
        for tx in &sent {
            assert!(tx.output.len() <= 2);
        }
    }
}
