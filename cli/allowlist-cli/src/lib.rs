pub mod address;
pub mod allowlist;
pub mod common;
pub mod config;
pub mod error;
pub mod merkle;
pub mod sale;

pub use address::Address;
pub use allowlist::{
    read_address_file, read_proof_map, split_address_list, Allowlist, MembershipProof, ProofMap,
};
pub use common::{hex_encode, keccak256, keccak256_pair, parse_hash32, write_file_atomic, Hash32};
pub use config::Config;
pub use error::MerkleError;
pub use merkle::{build_tree, get_proof, hash_leaf, verify_proof, Levels};
