//! Function Selectors
//!
//! Computes 4-byte function selectors from textual signatures and matches
//! them against transaction input data.

use alloy::primitives::keccak256;
use thiserror::Error;

/// Signature watched for by default: `solve(string)` - 0x76fe1e92
pub const SOLVE_SIGNATURE: &str = "solve(string)";

/// Length of a function selector in bytes
pub const SELECTOR_LEN: usize = 4;

/// Errors that can occur while building a selector
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SelectorError {
    #[error("Function signature cannot be empty")]
    EmptySignature,

    #[error("Invalid function signature: {0}")]
    InvalidSignature(String),
}

/// A function signature together with its precomputed 4-byte selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSelector {
    signature: String,
    bytes: [u8; SELECTOR_LEN],
}

impl FunctionSelector {
    /// Build a selector from a canonical signature such as `solve(string)`
    ///
    /// # Arguments
    /// * `signature` - Function name followed by its parenthesised argument types
    ///
    /// # Returns
    /// The selector, or a `SelectorError` if the signature is malformed
    pub fn from_signature(signature: &str) -> Result<Self, SelectorError> {
        let signature = signature.trim();
        validate_signature(signature)?;

        let hash = keccak256(signature.as_bytes());
        let mut bytes = [0u8; SELECTOR_LEN];
        bytes.copy_from_slice(&hash[..SELECTOR_LEN]);

        Ok(Self {
            signature: signature.to_string(),
            bytes,
        })
    }

    /// Returns the 4-byte method selector
    pub fn bytes(&self) -> [u8; SELECTOR_LEN] {
        self.bytes
    }

    /// Returns the hex-encoded selector with 0x prefix
    pub fn hex(&self) -> String {
        format!("0x{}", hex::encode(self.bytes))
    }

    /// Returns the signature the selector was computed from
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Check whether transaction input begins with this selector
    ///
    /// Inputs shorter than a selector never match.
    pub fn matches(&self, input: &[u8]) -> bool {
        extract_method_id(input).is_some_and(|id| id == self.bytes)
    }
}

impl std::fmt::Display for FunctionSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.signature, self.hex())
    }
}

fn validate_signature(signature: &str) -> Result<(), SelectorError> {
    if signature.is_empty() {
        return Err(SelectorError::EmptySignature);
    }
    if signature.chars().any(char::is_whitespace) {
        return Err(SelectorError::InvalidSignature(format!(
            "'{}' contains whitespace",
            signature
        )));
    }

    let open = signature
        .find('(')
        .ok_or_else(|| SelectorError::InvalidSignature(format!("'{}' has no argument list", signature)))?;
    if open == 0 {
        return Err(SelectorError::InvalidSignature(format!(
            "'{}' has no function name",
            signature
        )));
    }
    if !signature.ends_with(')') {
        return Err(SelectorError::InvalidSignature(format!(
            "'{}' does not end with ')'",
            signature
        )));
    }

    Ok(())
}

/// Extract method ID from transaction input data
///
/// # Arguments
/// * `input` - The full transaction input/calldata
///
/// # Returns
/// `Some([u8; 4])` if input has at least 4 bytes, `None` otherwise
pub fn extract_method_id(input: &[u8]) -> Option<[u8; SELECTOR_LEN]> {
    if input.len() < SELECTOR_LEN {
        return None;
    }
    let mut method_id = [0u8; SELECTOR_LEN];
    method_id.copy_from_slice(&input[..SELECTOR_LEN]);
    Some(method_id)
}
