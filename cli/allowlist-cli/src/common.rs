use alloy_primitives::B256;
use anyhow::Context;
use sha3::{Digest, Keccak256};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// A 32-byte Keccak256 digest.
pub type Hash32 = B256;

/// Computes the Keccak256 hash of arbitrary bytes.
pub fn keccak256(data: impl AsRef<[u8]>) -> Hash32 {
    let digest: [u8; 32] = Keccak256::digest(data.as_ref()).into();
    B256::from(digest)
}

/// Computes a Keccak256 hash of two 32-byte values concatenated.
///
/// # Arguments
/// * `left` - First 32-byte value
/// * `right` - Second 32-byte value
///
/// # Returns
/// 32-byte hash of `left || right`
pub fn keccak256_pair(left: &Hash32, right: &Hash32) -> Hash32 {
    let digest: [u8; 32] = Keccak256::new()
        .chain_update(left)
        .chain_update(right)
        .finalize()
        .into();
    B256::from(digest)
}

/// Encodes bytes as a lowercase `0x`-prefixed hex string.
pub fn hex_encode(bytes: impl AsRef<[u8]>) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Parses a 32-byte hash from a hex string, with or without "0x" prefix.
///
/// # Errors
/// Returns an error if the value is not 64 hex characters
pub fn parse_hash32(value: &str) -> anyhow::Result<Hash32> {
    let trimmed = value.trim();
    let cleaned = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    if cleaned.len() != 64 {
        anyhow::bail!(
            "Invalid hash length: expected 64 hex chars, got {}",
            cleaned.len()
        );
    }
    let mut hash = [0u8; 32];
    hex::decode_to_slice(cleaned, &mut hash)
        .map_err(|e| anyhow::anyhow!("Invalid hex encoding: {}", e))?;
    Ok(B256::from(hash))
}

/// A file written and synced under a unique temp name next to its target,
/// waiting to be renamed into place.
pub struct StagedFile {
    temp: NamedTempFile,
    target: std::path::PathBuf,
}

impl StagedFile {
    /// Writes `contents` to a fresh temp file in the directory of `target`.
    pub fn stage(target: &Path, contents: &str) -> anyhow::Result<Self> {
        let dir = target
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut temp = NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temp file in {:?}", dir))?;
        temp.write_all(contents.as_bytes())
            .context("Failed to write temp file")?;
        temp.as_file()
            .sync_all()
            .context("Failed to sync temp file")?;
        Ok(StagedFile {
            temp,
            target: target.to_path_buf(),
        })
    }

    /// Renames the temp file over the target.
    pub fn commit(self) -> anyhow::Result<()> {
        self.temp
            .persist(&self.target)
            .with_context(|| format!("Failed to move temp file to {:?}", self.target))?;
        Ok(())
    }
}

/// Writes `contents` to `path` through a temp file and a rename, so a reader
/// never observes a half-written artifact.
pub fn write_file_atomic(path: &Path, contents: &str) -> anyhow::Result<()> {
    StagedFile::stage(path, contents)?.commit()
}
