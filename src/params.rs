//! Plot geometry and Shabal framing constants.
//!
//! These values are fixed by the on-disk plot format; every implementation
//! in the ecosystem must agree on them byte for byte.

/// Size of one Shabal-256 digest in bytes.
pub const HASH_SIZE: usize = 32;

/// Size of one nonce: 8192 chained hashes (256 KiB).
pub const NONCE_SIZE: usize = 262_144;

/// Longest message window absorbed by one link of the hash chain.
///
/// While the chain is shorter than this, each hash covers everything
/// generated so far plus the seed; afterwards it covers a sliding
/// 4096-byte window.
pub const HASH_CAP: usize = 4_096;

/// Size of one scoop: a pair of adjacent hashes.
pub const SCOOP_SIZE: usize = 64;

/// Number of scoops per nonce.
pub const SCOOPS_PER_NONCE: usize = 4_096;

/// Number of hashes per nonce.
pub const HASHES_PER_NONCE: usize = NONCE_SIZE / HASH_SIZE;

/// Number of hashes covered by a saturated `HASH_CAP` window.
pub const HASHES_PER_CAP: usize = HASH_CAP / HASH_SIZE;

/// Size of the seed appended to every chain message: big-endian account
/// id followed by the big-endian nonce index.
pub const SEED_SIZE: usize = 16;

/// Size of one Shabal message block.
pub const BLOCK_SIZE: usize = 64;

/// Size of a generation signature.
pub const GENSIG_SIZE: usize = 32;
