use thiserror::Error;

pub type Result<T> = std::result::Result<T, MerkleError>;

/// Validation failures raised while building an allowlist tree or its proofs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MerkleError {
    #[error("Invalid address {input:?}: {reason}")]
    InvalidAddress { input: String, reason: String },

    #[error("Cannot build a Merkle tree from an empty leaf list")]
    EmptyInput,

    #[error("Leaf index {index} is out of bounds for tree with {leaf_count} leaves")]
    IndexOutOfRange { index: usize, leaf_count: usize },
}

impl MerkleError {
    pub(crate) fn invalid_address(input: &str, reason: impl Into<String>) -> Self {
        MerkleError::InvalidAddress {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}
