//! Keccak256 Merkle tree over allowlisted addresses.
//!
//! Leaves are `keccak256(address_bytes)` over the raw 20 bytes. Parents are
//! `keccak256(left || right)` where `left` always sits at the even index. A
//! level with an odd number of nodes pairs its last node with itself; the
//! duplicate is only used for hashing and is never stored in the level.

use tracing::debug;

use crate::address::Address;
use crate::common::{keccak256, keccak256_pair, Hash32};
use crate::error::{MerkleError, Result};

/// Every level of a tree, leaves first, root last.
pub type Levels = Vec<Vec<Hash32>>;

/// Hashes an address string into a Merkle leaf.
///
/// # Errors
/// Returns `MerkleError::InvalidAddress` if the string is not a 20-byte hex address
pub fn hash_leaf(address: &str) -> Result<Hash32> {
    Address::parse(address).map(|addr| address_leaf(&addr))
}

/// Hashes an already-normalized address into a Merkle leaf.
pub fn address_leaf(address: &Address) -> Hash32 {
    keccak256(address.as_bytes())
}

/// Builds every level of the tree from the given leaves.
///
/// # Errors
/// Returns `MerkleError::EmptyInput` if `leaves` is empty
pub fn build_tree(leaves: &[Hash32]) -> Result<Levels> {
    if leaves.is_empty() {
        return Err(MerkleError::EmptyInput);
    }

    let mut tree: Levels = vec![leaves.to_vec()];

    while let Some(level) = tree.last().filter(|level| level.len() > 1) {
        let next_level: Vec<Hash32> = level
            .chunks(2)
            .map(|chunk| {
                let left = &chunk[0];
                let right = chunk.get(1).unwrap_or(left);
                keccak256_pair(left, right)
            })
            .collect();
        debug!(width = next_level.len(), depth = tree.len(), "built tree level");
        tree.push(next_level);
    }

    Ok(tree)
}

/// Returns the root of a built tree.
pub fn root(levels: &[Vec<Hash32>]) -> Result<Hash32> {
    levels
        .last()
        .and_then(|level| level.first())
        .copied()
        .ok_or(MerkleError::EmptyInput)
}

/// Generates a Merkle proof for the leaf at `index`.
///
/// Sibling hashes are returned bottom level first. A node that was paired
/// with itself has no distinct sibling, so that level contributes nothing.
///
/// # Errors
/// Returns `MerkleError::EmptyInput` for an empty tree and
/// `MerkleError::IndexOutOfRange` if `index` is not a leaf index
pub fn get_proof(levels: &[Vec<Hash32>], index: usize) -> Result<Vec<Hash32>> {
    let leaf_count = levels.first().map_or(0, Vec::len);
    if leaf_count == 0 {
        return Err(MerkleError::EmptyInput);
    }
    if index >= leaf_count {
        return Err(MerkleError::IndexOutOfRange { index, leaf_count });
    }

    let mut proof = Vec::with_capacity(levels.len().saturating_sub(1));
    let mut current_index = index;

    for level in &levels[..levels.len() - 1] {
        if let Some(sibling) = level.get(current_index ^ 1) {
            proof.push(*sibling);
        }
        current_index /= 2;
    }

    Ok(proof)
}

/// Checks that `leaf` at `index` in a tree of `leaf_count` leaves hashes up
/// to `root` through `proof`.
///
/// Level widths are derived from `leaf_count`, so a self-paired node is
/// hashed with itself without consuming a proof element.
pub fn verify_proof(
    root: &Hash32,
    leaf: &Hash32,
    index: usize,
    leaf_count: usize,
    proof: &[Hash32],
) -> bool {
    if index >= leaf_count {
        return false;
    }

    let mut siblings = proof.iter();
    let mut current = *leaf;
    let mut current_index = index;
    let mut width = leaf_count;

    while width > 1 {
        let sibling_index = current_index ^ 1;
        current = if sibling_index < width {
            let Some(sibling) = siblings.next() else {
                return false;
            };
            if current_index % 2 == 0 {
                keccak256_pair(&current, sibling)
            } else {
                keccak256_pair(sibling, &current)
            }
        } else {
            keccak256_pair(&current, &current)
        };
        current_index /= 2;
        width = width.div_ceil(2);
    }

    siblings.next().is_none() && current == *root
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn leaf(byte: u8) -> Hash32 {
        Hash32::repeat_byte(byte)
    }

    fn address_leaves(raw: &[[u8; 20]]) -> Vec<Hash32> {
        raw.iter()
            .map(|bytes| address_leaf(&Address::from_bytes(*bytes)))
            .collect()
    }

    /// An address list together with two positions in it.
    fn list_with_positions() -> impl Strategy<Value = (Vec<[u8; 20]>, usize, usize)> {
        prop::collection::vec(any::<[u8; 20]>(), 2..96).prop_flat_map(|list| {
            let len = list.len();
            (Just(list), 0..len, 0..len)
        })
    }

    #[test]
    fn test_hash_leaf_hashes_raw_address_bytes() {
        let addr = "0x057aFd2552c7F03B3A7dD58993aae61a3278b53D";
        let bytes = hex::decode("057afd2552c7f03b3a7dd58993aae61a3278b53d").unwrap();
        assert_eq!(hash_leaf(addr).unwrap(), keccak256(&bytes));
    }

    #[test]
    fn test_hash_leaf_ignores_case() {
        let checksummed = hash_leaf("0x057aFd2552c7F03B3A7dD58993aae61a3278b53D").unwrap();
        let lower = hash_leaf("0x057afd2552c7f03b3a7dd58993aae61a3278b53d").unwrap();
        assert_eq!(checksummed, lower);
    }

    #[test]
    fn test_hash_leaf_rejects_39_hex_chars() {
        let addr = format!("0x{}", "1".repeat(39));
        assert!(matches!(
            hash_leaf(&addr),
            Err(MerkleError::InvalidAddress { .. })
        ));
    }

    #[test]
    fn test_build_tree_empty() {
        assert_eq!(build_tree(&[]), Err(MerkleError::EmptyInput));
    }

    #[test]
    fn test_build_tree_single_leaf() {
        let tree = build_tree(&[leaf(7)]).unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(root(&tree).unwrap(), leaf(7));
        assert!(get_proof(&tree, 0).unwrap().is_empty());
    }

    #[test]
    fn test_build_tree_four_leaves() {
        let leaves = vec![leaf(1), leaf(2), leaf(3), leaf(4)];
        let tree = build_tree(&leaves).unwrap();

        let h01 = keccak256_pair(&leaf(1), &leaf(2));
        let h23 = keccak256_pair(&leaf(3), &leaf(4));
        assert_eq!(tree[0], leaves);
        assert_eq!(tree[1], vec![h01, h23]);
        assert_eq!(tree[2], vec![keccak256_pair(&h01, &h23)]);
    }

    #[test]
    fn test_odd_level_self_pairs_last_node() {
        let leaves = vec![leaf(1), leaf(2), leaf(3)];
        let tree = build_tree(&leaves).unwrap();

        assert_eq!(tree.len(), 3);
        assert_eq!(
            tree[1],
            vec![
                keccak256_pair(&leaf(1), &leaf(2)),
                keccak256_pair(&leaf(3), &leaf(3)),
            ]
        );
        assert_eq!(tree[2], vec![keccak256_pair(&tree[1][0], &tree[1][1])]);
        assert_eq!(get_proof(&tree, 2).unwrap(), vec![tree[1][0]]);
        assert_eq!(get_proof(&tree, 0).unwrap(), vec![leaf(2), tree[1][1]]);
    }

    #[test]
    fn test_every_proof_verifies() {
        for n in 1..=33usize {
            let leaves: Vec<Hash32> = (0..n).map(|i| keccak256(i.to_le_bytes())).collect();
            let tree = build_tree(&leaves).unwrap();
            let root = root(&tree).unwrap();
            for (i, leaf) in leaves.iter().enumerate() {
                let proof = get_proof(&tree, i).unwrap();
                assert!(proof.len() < tree.len());
                assert!(verify_proof(&root, leaf, i, n, &proof), "n = {n}, i = {i}");
            }
        }
    }

    #[test]
    fn test_verify_rejects_tampering() {
        let leaves = vec![leaf(1), leaf(2), leaf(3), leaf(4), leaf(5)];
        let tree = build_tree(&leaves).unwrap();
        let root = root(&tree).unwrap();
        let proof = get_proof(&tree, 1).unwrap();

        assert!(verify_proof(&root, &leaf(2), 1, 5, &proof));
        assert!(!verify_proof(&root, &leaf(9), 1, 5, &proof));
        assert!(!verify_proof(&root, &leaf(2), 0, 5, &proof));
        assert!(!verify_proof(&root, &leaf(2), 7, 5, &proof));
        assert!(!verify_proof(&root, &leaf(2), 1, 5, &proof[..1]));

        let mut extended = proof.clone();
        extended.push(leaf(0));
        assert!(!verify_proof(&root, &leaf(2), 1, 5, &extended));
    }

    #[test]
    fn test_get_proof_out_of_bounds() {
        let tree = build_tree(&[leaf(1), leaf(2)]).unwrap();
        assert_eq!(
            get_proof(&tree, 5),
            Err(MerkleError::IndexOutOfRange {
                index: 5,
                leaf_count: 2
            })
        );
    }

    #[test]
    fn test_get_proof_empty_tree() {
        let tree: Levels = vec![];
        assert_eq!(get_proof(&tree, 0), Err(MerkleError::EmptyInput));
    }

    #[test]
    fn test_two_leaves_have_two_levels() {
        let tree = build_tree(&[leaf(1), leaf(2)]).unwrap();
        assert_eq!(tree.len(), 2);
        assert_eq!(root(&tree).unwrap(), keccak256_pair(&leaf(1), &leaf(2)));
    }

    proptest! {
        #[test]
        fn test_level_count_is_ceil_log2_plus_one(raw in prop::collection::vec(any::<[u8; 20]>(), 1..300)) {
            let n = raw.len();
            let tree = build_tree(&address_leaves(&raw)).unwrap();
            let ceil_log2 = (usize::BITS - (n - 1).leading_zeros()) as usize;
            prop_assert_eq!(tree.len(), ceil_log2 + 1);
            prop_assert_eq!(tree.last().map(Vec::len), Some(1));
        }

        #[test]
        fn test_root_is_deterministic(raw in prop::collection::vec(any::<[u8; 20]>(), 1..96)) {
            let leaves = address_leaves(&raw);
            let first = root(&build_tree(&leaves).unwrap()).unwrap();
            let second = root(&build_tree(&leaves).unwrap()).unwrap();
            prop_assert_eq!(first, second);
        }

        #[test]
        fn test_every_address_proof_round_trips(raw in prop::collection::vec(any::<[u8; 20]>(), 1..96)) {
            let leaves = address_leaves(&raw);
            let tree = build_tree(&leaves).unwrap();
            let root = root(&tree).unwrap();
            for (i, leaf) in leaves.iter().enumerate() {
                let proof = get_proof(&tree, i).unwrap();
                prop_assert!(proof.len() < tree.len());
                prop_assert!(verify_proof(&root, leaf, i, leaves.len(), &proof));
            }
        }

        #[test]
        fn test_swapping_distinct_addresses_changes_root((raw, i, j) in list_with_positions()) {
            prop_assume!(raw[i] != raw[j]);
            let original = root(&build_tree(&address_leaves(&raw)).unwrap()).unwrap();

            let mut swapped = raw.clone();
            swapped.swap(i, j);
            let reordered = root(&build_tree(&address_leaves(&swapped)).unwrap()).unwrap();
            prop_assert_ne!(original, reordered);
        }
    }
}
