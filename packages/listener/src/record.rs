//! Transaction Records
//!
//! The per-event view of a pending transaction, built from the node's
//! `eth_getTransactionByHash` response, plus decoding of call payload tails.

use alloy::consensus::{Transaction as _, TxEnvelope};
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::rpc::types::Transaction;
use thiserror::Error;
use tracing::debug;

use crate::selector::{extract_method_id, SELECTOR_LEN};

/// Errors that can occur while decoding transaction input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Input of {0} bytes is too short to carry a selector")]
    InputTooShort(usize),

    #[error("Payload is not valid UTF-8: {0}")]
    InvalidUtf8(String),
}

/// A pending transaction as reported by the listeners
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionRecord {
    /// Transaction hash
    pub hash: TxHash,
    /// Sender address
    pub from: Address,
    /// Recipient address as a 0x hex string (None for contract creation)
    pub to: Option<String>,
    /// Transaction value in wei
    pub value: U256,
    /// Transaction nonce
    pub nonce: u64,
    /// Gas limit
    pub gas_limit: u64,
    /// Gas price, for legacy and EIP-2930 transactions
    pub gas_price: Option<u128>,
    /// Fee cap, for dynamic fee transactions
    pub max_fee_per_gas: Option<u128>,
    /// Priority fee cap, for dynamic fee transactions
    pub max_priority_fee_per_gas: Option<u128>,
    /// Chain id (None for pre-EIP-155 legacy transactions)
    pub chain_id: Option<u64>,
    /// EIP-2718 transaction type
    pub tx_type: u8,
    /// Transaction input data (calldata)
    pub input: Bytes,
}

impl TransactionRecord {
    /// Check whether the transaction carries any input payload
    pub fn has_input(&self) -> bool {
        !self.input.is_empty()
    }

    /// Input payload as a hex string with 0x prefix
    pub fn input_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.input))
    }

    /// First 4 bytes of the input, if present
    pub fn method_id(&self) -> Option<[u8; SELECTOR_LEN]> {
        extract_method_id(&self.input)
    }

    /// Get the method ID as a hex string with 0x prefix
    pub fn method_id_hex(&self) -> Option<String> {
        self.method_id().map(|id| format!("0x{}", hex::encode(id)))
    }
}

impl std::fmt::Display for TransactionRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "hash={:#x} from={:#x} to={} type={} nonce={} value={} gas_limit={}",
            self.hash,
            self.from,
            self.to.as_deref().unwrap_or("<contract creation>"),
            self.tx_type,
            self.nonce,
            self.value,
            self.gas_limit
        )?;
        if let Some(gas_price) = self.gas_price {
            write!(f, " gas_price={}", gas_price)?;
        }
        if let Some(max_fee) = self.max_fee_per_gas {
            write!(f, " max_fee_per_gas={}", max_fee)?;
        }
        if let Some(priority_fee) = self.max_priority_fee_per_gas {
            write!(f, " max_priority_fee_per_gas={}", priority_fee)?;
        }
        if let Some(chain_id) = self.chain_id {
            write!(f, " chain_id={}", chain_id)?;
        }
        write!(f, " input={}", self.input_hex())
    }
}

impl From<Transaction> for TransactionRecord {
    fn from(tx: Transaction) -> Self {
        let envelope = &tx.inner;
        let (to, input) = extract_call_fields(envelope);
        Self {
            hash: *envelope.tx_hash(),
            from: tx.from,
            to: to.map(|address| address.to_checksum(None)),
            value: envelope.value(),
            nonce: envelope.nonce(),
            gas_limit: envelope.gas_limit(),
            gas_price: envelope.gas_price(),
            max_fee_per_gas: envelope.is_dynamic_fee().then(|| envelope.max_fee_per_gas()),
            max_priority_fee_per_gas: envelope.max_priority_fee_per_gas(),
            chain_id: envelope.chain_id(),
            tx_type: envelope.ty(),
            input,
        }
    }
}

/// Extract destination and calldata from a TxEnvelope
fn extract_call_fields(tx_envelope: &TxEnvelope) -> (Option<Address>, Bytes) {
    match tx_envelope {
        TxEnvelope::Legacy(signed) => {
            let tx = signed.tx();
            (tx.to.to().copied(), tx.input.clone())
        }
        TxEnvelope::Eip2930(signed) => {
            let tx = signed.tx();
            (tx.to.to().copied(), tx.input.clone())
        }
        TxEnvelope::Eip1559(signed) => {
            let tx = signed.tx();
            (tx.to.to().copied(), tx.input.clone())
        }
        TxEnvelope::Eip4844(signed) => {
            let tx = signed.tx().tx();
            (Some(tx.to), tx.input.clone())
        }
        TxEnvelope::Eip7702(signed) => {
            let tx = signed.tx();
            (Some(tx.to), tx.input.clone())
        }
        other => {
            debug!(
                hash = %other.tx_hash(),
                tx_type = other.ty(),
                "Unsupported envelope type, destination and input left empty"
            );
            (None, Bytes::new())
        }
    }
}

/// Decode the bytes following the selector as UTF-8 text
///
/// An input consisting of only the selector decodes to an empty string.
pub fn decode_solution(input: &[u8]) -> Result<String, DecodeError> {
    if input.len() < SELECTOR_LEN {
        return Err(DecodeError::InputTooShort(input.len()));
    }
    String::from_utf8(input[SELECTOR_LEN..].to_vec())
        .map_err(|e| DecodeError::InvalidUtf8(e.utf8_error().to_string()))
}

/// Render arbitrary bytes as text, replacing malformed sequences
pub fn lossy_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::{FunctionSelector, SOLVE_SIGNATURE};
    use alloy::consensus::{
        Signed, TxEip1559, TxEip2930, TxEip4844, TxEip4844Variant, TxEip7702, TxLegacy,
    };
    use alloy::primitives::{address, b256, PrimitiveSignature, TxKind};

    const SENDER: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
    const ROUTER: Address = address!("7a250d5630b4cf539739df2c5dacb4c659f2488d");
    const HASH: TxHash = b256!("1234567890abcdef1234567890abcdef1234567890abcdef1234567890abcdef");

    fn record(input: Vec<u8>) -> TransactionRecord {
        TransactionRecord {
            to: Some("0xYourContractAddress".to_string()),
            input: Bytes::from(input),
            ..Default::default()
        }
    }

    fn signed<T>(tx: T) -> Signed<T> {
        let signature = PrimitiveSignature::new(U256::from(1), U256::from(2), false);
        Signed::new_unchecked(tx, signature, HASH)
    }

    fn rpc_transaction(inner: TxEnvelope) -> Transaction {
        Transaction {
            inner,
            block_hash: None,
            block_number: None,
            transaction_index: None,
            effective_gas_price: None,
            from: SENDER,
        }
    }

    fn calldata() -> Bytes {
        Bytes::from(vec![0xa9, 0x05, 0x9c, 0xbb, 0x00])
    }

    // ==================== TransactionRecord tests ====================

    #[test]
    fn test_record_has_input() {
        assert!(record(vec![0x01]).has_input());
        assert!(!record(vec![]).has_input());
    }

    #[test]
    fn test_record_input_hex_is_prefixed() {
        let tx = record(vec![0x76, 0xfe, 0x1e, 0x92, 0x34, 0x32]);
        assert_eq!(tx.input_hex(), "0x76fe1e923432");
    }

    #[test]
    fn test_record_empty_input_hex() {
        assert_eq!(record(vec![]).input_hex(), "0x");
    }

    #[test]
    fn test_record_method_id_hex() {
        let tx = record(vec![0x38, 0xed, 0x17, 0x39, 0x00]);
        assert_eq!(tx.method_id(), Some([0x38, 0xed, 0x17, 0x39]));
        assert_eq!(tx.method_id_hex(), Some("0x38ed1739".to_string()));
    }

    #[test]
    fn test_record_display() {
        let tx = record(vec![0x76, 0xfe, 0x1e, 0x92]);
        let shown = tx.to_string();
        assert!(shown.contains("to=0xYourContractAddress"));
        assert!(shown.contains("input=0x76fe1e92"));
    }

    #[test]
    fn test_record_display_contract_creation() {
        let mut tx = record(vec![0x60, 0x80]);
        tx.to = None;
        assert!(tx.to_string().contains("to=<contract creation>"));
    }

    #[test]
    fn test_record_method_id_hex_none() {
        let tx = record(vec![0x38, 0xed]);
        assert_eq!(tx.method_id_hex(), None);
    }

    // ==================== decode_solution tests ====================

    #[test]
    fn test_decode_solution_ascii_tail() {
        let mut input = FunctionSelector::from_signature(SOLVE_SIGNATURE).unwrap().bytes().to_vec();
        input.extend_from_slice(b"42");
        assert_eq!(decode_solution(&input), Ok("42".to_string()));
    }

    #[test]
    fn test_decode_solution_round_trip_unicode() {
        let text = "héllo, wörld ✓";
        let mut input = vec![0x76, 0xfe, 0x1e, 0x92];
        input.extend_from_slice(text.as_bytes());
        assert_eq!(decode_solution(&input).unwrap(), text);
    }

    #[test]
    fn test_decode_solution_selector_only_is_empty() {
        assert_eq!(decode_solution(&[0x76, 0xfe, 0x1e, 0x92]), Ok(String::new()));
    }

    #[test]
    fn test_decode_solution_short_input() {
        assert_eq!(decode_solution(&[0x76, 0xfe]), Err(DecodeError::InputTooShort(2)));
    }

    #[test]
    fn test_decode_solution_invalid_utf8() {
        let input = vec![0x76, 0xfe, 0x1e, 0x92, 0xff, 0xfe, 0x41];
        let result = decode_solution(&input);
        assert!(matches!(result, Err(DecodeError::InvalidUtf8(_))));
    }

    #[test]
    fn test_lossy_text_replaces_invalid_bytes() {
        assert_eq!(lossy_text(&[0x41, 0xff, 0x42]), "A\u{fffd}B");
    }

    #[test]
    fn test_decode_solution_from_hex_calldata() {
        // solve(string) selector followed by ASCII "42"
        let calldata = hex::decode("76fe1e923432").unwrap();
        assert_eq!(decode_solution(&calldata).unwrap(), "42");
    }

    // ==================== From<Transaction> tests ====================

    #[test]
    fn test_from_legacy_transaction() {
        let tx = TxLegacy {
            chain_id: Some(1),
            nonce: 7,
            gas_price: 20_000_000_000,
            gas_limit: 21_000,
            to: TxKind::Call(ROUTER),
            value: U256::from(1_000_000_000_000_000_000u128),
            input: calldata(),
        };
        let record = TransactionRecord::from(rpc_transaction(TxEnvelope::Legacy(signed(tx))));

        assert_eq!(record.hash, HASH);
        assert_eq!(record.from, SENDER);
        assert_eq!(record.to.as_deref(), Some("0x7a250d5630B4cF539739dF2C5dAcb4c659F2488D"));
        assert_eq!(record.value, U256::from(1_000_000_000_000_000_000u128));
        assert_eq!(record.nonce, 7);
        assert_eq!(record.gas_limit, 21_000);
        assert_eq!(record.gas_price, Some(20_000_000_000));
        assert_eq!(record.max_fee_per_gas, None);
        assert_eq!(record.max_priority_fee_per_gas, None);
        assert_eq!(record.chain_id, Some(1));
        assert_eq!(record.tx_type, 0);
        assert_eq!(record.input, calldata());
    }

    #[test]
    fn test_from_legacy_contract_creation() {
        let tx = TxLegacy {
            to: TxKind::Create,
            input: Bytes::from(vec![0x60, 0x80, 0x60, 0x40]),
            ..Default::default()
        };
        let record = TransactionRecord::from(rpc_transaction(TxEnvelope::Legacy(signed(tx))));

        assert_eq!(record.to, None);
        assert_eq!(record.chain_id, None);
        assert!(record.has_input());
        assert!(record.to_string().contains("to=<contract creation>"));
    }

    #[test]
    fn test_from_eip2930_transaction() {
        let tx = TxEip2930 {
            chain_id: 1,
            nonce: 3,
            gas_price: 15,
            gas_limit: 50_000,
            to: TxKind::Call(ROUTER),
            input: calldata(),
            ..Default::default()
        };
        let record = TransactionRecord::from(rpc_transaction(TxEnvelope::Eip2930(signed(tx))));

        assert_eq!(record.tx_type, 1);
        assert_eq!(record.gas_price, Some(15));
        assert_eq!(record.max_fee_per_gas, None);
        assert_eq!(record.to.as_deref(), Some("0x7a250d5630B4cF539739dF2C5dAcb4c659F2488D"));
        assert_eq!(record.input, calldata());
    }

    #[test]
    fn test_from_eip1559_transaction() {
        let tx = TxEip1559 {
            chain_id: 1,
            nonce: 42,
            gas_limit: 90_000,
            max_fee_per_gas: 30_000_000_000,
            max_priority_fee_per_gas: 1_500_000_000,
            to: TxKind::Call(ROUTER),
            value: U256::from(5),
            input: calldata(),
            ..Default::default()
        };
        let record = TransactionRecord::from(rpc_transaction(TxEnvelope::Eip1559(signed(tx))));

        assert_eq!(record.tx_type, 2);
        assert_eq!(record.nonce, 42);
        assert_eq!(record.gas_limit, 90_000);
        assert_eq!(record.gas_price, None);
        assert_eq!(record.max_fee_per_gas, Some(30_000_000_000));
        assert_eq!(record.max_priority_fee_per_gas, Some(1_500_000_000));
        assert_eq!(record.value, U256::from(5));
        assert_eq!(record.input, calldata());
    }

    #[test]
    fn test_from_eip1559_contract_creation() {
        let tx = TxEip1559 {
            to: TxKind::Create,
            input: Bytes::from(vec![0x60, 0x80]),
            ..Default::default()
        };
        let record = TransactionRecord::from(rpc_transaction(TxEnvelope::Eip1559(signed(tx))));
        assert_eq!(record.to, None);
    }

    #[test]
    fn test_from_eip4844_transaction() {
        let tx = TxEip4844 {
            chain_id: 1,
            nonce: 9,
            max_fee_per_gas: 40,
            max_priority_fee_per_gas: 2,
            to: ROUTER,
            input: calldata(),
            ..Default::default()
        };
        let envelope = TxEnvelope::Eip4844(signed(TxEip4844Variant::TxEip4844(tx)));
        let record = TransactionRecord::from(rpc_transaction(envelope));

        assert_eq!(record.tx_type, 3);
        assert_eq!(record.nonce, 9);
        assert_eq!(record.max_fee_per_gas, Some(40));
        assert_eq!(record.to.as_deref(), Some("0x7a250d5630B4cF539739dF2C5dAcb4c659F2488D"));
        assert_eq!(record.input, calldata());
    }

    #[test]
    fn test_from_eip7702_transaction() {
        let tx = TxEip7702 {
            chain_id: 1,
            nonce: 11,
            max_fee_per_gas: 50,
            max_priority_fee_per_gas: 3,
            to: ROUTER,
            input: calldata(),
            ..Default::default()
        };
        let record = TransactionRecord::from(rpc_transaction(TxEnvelope::Eip7702(signed(tx))));

        assert_eq!(record.tx_type, 4);
        assert_eq!(record.max_priority_fee_per_gas, Some(3));
        assert_eq!(record.to.as_deref(), Some("0x7a250d5630B4cF539739dF2C5dAcb4c659F2488D"));
        assert_eq!(record.input, calldata());
    }

    #[test]
    fn test_display_renders_full_transaction() {
        let tx = TxEip1559 {
            chain_id: 1,
            nonce: 7,
            gas_limit: 21_000,
            max_fee_per_gas: 30,
            max_priority_fee_per_gas: 2,
            to: TxKind::Call(ROUTER),
            value: U256::from(1_000_000_000_000_000_000u128),
            input: calldata(),
            ..Default::default()
        };
        let shown = TransactionRecord::from(rpc_transaction(TxEnvelope::Eip1559(signed(tx)))).to_string();

        assert!(shown.contains("value=1000000000000000000"));
        assert!(shown.contains("nonce=7"));
        assert!(shown.contains("gas_limit=21000"));
        assert!(shown.contains("max_fee_per_gas=30"));
        assert!(shown.contains("max_priority_fee_per_gas=2"));
        assert!(shown.contains("chain_id=1"));
        assert!(shown.contains("type=2"));
        assert!(shown.contains("input=0xa9059cbb00"));
        assert!(!shown.contains("gas_price="));
    }
}
