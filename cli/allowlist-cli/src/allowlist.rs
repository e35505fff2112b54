use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::Context;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::address::Address;
use crate::common::{hex_encode, parse_hash32, Hash32, StagedFile};
use crate::error::Result;
use crate::merkle::{self, Levels};

/// Proofs artifact: lowercase address to its `0x` hex sibling hashes.
pub type ProofMap = IndexMap<String, Vec<String>>;

/// A Merkle tree built over an ordered address list, with proof lookup by
/// address.
///
/// When an address repeats, every occurrence is a leaf. Its proof entry stays
/// at the position of the first occurrence but carries the proof of the last.
#[derive(Debug, Clone)]
pub struct Allowlist {
    addresses: Vec<Address>,
    index: IndexMap<Address, usize>,
    levels: Levels,
    root: Hash32,
}

impl Allowlist {
    /// Normalizes every address and builds the tree.
    ///
    /// Fails on the first malformed address without producing any tree.
    pub fn from_addresses<S: AsRef<str>>(raw: &[S]) -> Result<Self> {
        let addresses = raw
            .iter()
            .map(|s| Address::parse(s.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Self::from_parsed(addresses)
    }

    pub fn from_parsed(addresses: Vec<Address>) -> Result<Self> {
        let leaves: Vec<Hash32> = addresses.iter().map(merkle::address_leaf).collect();
        let levels = merkle::build_tree(&leaves)?;
        let root = merkle::root(&levels)?;

        let mut index = IndexMap::with_capacity(addresses.len());
        for (i, address) in addresses.iter().enumerate() {
            if let Some(previous) = index.insert(*address, i) {
                warn!(%address, previous, duplicate = i, "duplicate address in allowlist");
            }
        }

        debug!(
            leaves = addresses.len(),
            levels = levels.len(),
            "allowlist tree built"
        );

        Ok(Allowlist {
            addresses,
            index,
            levels,
            root,
        })
    }

    pub fn root(&self) -> Hash32 {
        self.root
    }

    pub fn levels(&self) -> &Levels {
        &self.levels
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    /// Leaf index owning the proof for `address`, the last occurrence when
    /// the list contains duplicates.
    pub fn index_of(&self, address: &Address) -> Option<usize> {
        self.index.get(address).copied()
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.index.contains_key(address)
    }

    pub fn proof_at(&self, index: usize) -> Result<Vec<Hash32>> {
        merkle::get_proof(&self.levels, index)
    }

    /// Proof for `address`, or `None` if it is not on the list.
    pub fn proof_for(&self, address: &Address) -> Option<Vec<Hash32>> {
        let index = self.index_of(address)?;
        self.proof_at(index).ok()
    }

    pub fn verify(&self, address: &Address, proof: &[Hash32]) -> bool {
        match self.index_of(address) {
            Some(index) => merkle::verify_proof(
                &self.root(),
                &merkle::address_leaf(address),
                index,
                self.len(),
                proof,
            ),
            None => false,
        }
    }

    /// Address and proof for every distinct address, in order of first
    /// appearance.
    pub fn entries(&self) -> Result<Vec<(Address, Vec<Hash32>)>> {
        self.index
            .iter()
            .map(|(address, &i)| Ok((*address, self.proof_at(i)?)))
            .collect()
    }

    pub fn proof_map(&self) -> Result<ProofMap> {
        Ok(self
            .entries()?
            .into_iter()
            .map(|(address, proof)| {
                (
                    address.to_string(),
                    proof.iter().map(hex_encode).collect(),
                )
            })
            .collect())
    }

    pub fn root_hex(&self) -> String {
        hex_encode(self.root())
    }

    /// Writes the proofs JSON and the root file.
    ///
    /// Both files are staged before either replaces its target, so a failure
    /// while staging leaves any previous pair untouched.
    pub fn write_artifacts(&self, proofs_path: &Path, root_path: &Path) -> anyhow::Result<()> {
        let proofs = self.proof_map()?;
        let json = serde_json::to_string_pretty(&proofs).context("Failed to serialize proofs")?;
        let staged_proofs =
            StagedFile::stage(proofs_path, &json).context("Failed to write proofs file")?;
        let staged_root = StagedFile::stage(root_path, &format!("{}\n", self.root_hex()))
            .context("Failed to write root file")?;
        staged_proofs.commit()?;
        staged_root.commit()?;
        Ok(())
    }
}

/// Everything needed to check one address against a published root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipProof {
    pub address: Address,
    pub leaf_index: usize,
    pub leaf_count: usize,
    pub merkle_root: String,
    pub merkle_proof: Vec<String>,
}

impl MembershipProof {
    pub fn root(&self) -> anyhow::Result<Hash32> {
        parse_hash32(&self.merkle_root).context("Invalid Merkle root")
    }

    pub fn proof(&self) -> anyhow::Result<Vec<Hash32>> {
        self.merkle_proof
            .iter()
            .map(|element| parse_hash32(element).context("Invalid proof element"))
            .collect()
    }

    /// Recomputes the leaf from the address and walks the proof up to the root.
    pub fn verify(&self) -> anyhow::Result<bool> {
        Ok(merkle::verify_proof(
            &self.root()?,
            &merkle::address_leaf(&self.address),
            self.leaf_index,
            self.leaf_count,
            &self.proof()?,
        ))
    }
}

impl Allowlist {
    /// Membership proof for `address`, or `None` if it is not on the list.
    pub fn membership_proof(&self, address: &Address) -> Option<MembershipProof> {
        let leaf_index = self.index_of(address)?;
        let proof = self.proof_at(leaf_index).ok()?;
        Some(MembershipProof {
            address: *address,
            leaf_index,
            leaf_count: self.len(),
            merkle_root: self.root_hex(),
            merkle_proof: proof.iter().map(hex_encode).collect(),
        })
    }
}

/// Reads addresses from a file, one per line. Blank lines and `#` comments
/// are skipped. The returned strings are not yet validated.
pub fn read_address_file(path: &Path) -> anyhow::Result<Vec<String>> {
    let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    let reader = BufReader::new(file);

    let mut addresses = Vec::new();
    for line in reader.lines() {
        let line = line.context("Failed to read line")?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        addresses.push(trimmed.to_string());
    }
    Ok(addresses)
}

/// Splits a comma-separated address list, skipping blank entries.
pub fn split_address_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Reads a proofs artifact back from disk.
pub fn read_proof_map(path: &Path) -> anyhow::Result<ProofMap> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read proofs file {:?}", path))?;
    serde_json::from_str(&content).context("Failed to parse proofs JSON")
}
