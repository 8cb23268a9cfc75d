//! # poc-core
//!
//! SIMD-accelerated proof-of-capacity plotting and mining core for the
//! Burst/Signum plot format.
//!
//! Two operations, both bottlenecked by Shabal-256 throughput and both
//! built on the same lane-parallel kernel:
//!
//! * **Nonce generation**: deterministically derive a 256 KiB nonce
//!   (4096 scoops of two hashes) for an (account, index) pair via a
//!   backward-filled Shabal chain and a whole-nonce XOR mask.
//! * **Deadline search**: hash each nonce's scoop pair with a round's
//!   generation signature and track the minimum 64-bit deadline.
//!
//! Batches of 4, 8 or 16 nonces are hashed in parallel in 128/256/512-bit
//! registers; the batch cache interleaves the nonces word by word so
//! every load feeds all lanes at once. Widths are selected at compile
//! time via `target_feature`; partitioning work across threads, plot file
//! I/O, and runtime CPU dispatch belong to the caller.
//!
//! Identical inputs produce byte-identical nonces and deadlines on every
//! width and platform; that compatibility contract is what the test
//! suite pins down.
//!
//! ## Example
//!
//! ```no_run
//! use poc_core::{NONCE_SIZE, best_deadline, plot_nonces};
//!
//! let mut cache = vec![0u8; 64 * NONCE_SIZE];
//! plot_nonces(&mut cache, 7_900_104_405_094_198_526, 0, 64)?;
//!
//! let gensig = [0u8; 32];
//! let best = best_deadline(&cache, 1337, 64, &gensig)?;
//! println!("deadline {} at nonce offset {}", best.value, best.offset);
//! # Ok::<(), poc_core::CoreError>(())
//! ```
//!
//! The one-shot [`shabal256`] digest is exposed for callers that need the
//! underlying hash:
//!
//! ```
//! let digest = poc_core::shabal256(b"");
//! assert_eq!(digest[0], 0xae);
//! ```

use thiserror::Error;

mod deadline;
mod ffi;
mod frames;
mod lanes;
mod noncegen;
mod params;
mod shabal;

pub use deadline::{Deadline, best_deadline, search_deadlines};
pub use lanes::{Scalar, ShabalLanes, Widest};
pub use noncegen::{copy_nonce_out, generate_nonces, plot_nonces, poc2_shuffle};
pub use params::*;
pub use shabal::{Shabal256, init_bootstrap, shabal256};

#[cfg(target_arch = "x86_64")]
pub use lanes::Sse2;

#[cfg(all(target_arch = "x86_64", target_feature = "avx2"))]
pub use lanes::Avx2;

#[cfg(all(target_arch = "x86_64", target_feature = "avx512f"))]
pub use lanes::Avx512;

#[cfg(target_arch = "aarch64")]
pub use lanes::Neon;

/// Precondition violations reported by the safe wrappers.
///
/// The kernels themselves are total: inside the unsafe entry points these
/// conditions are caller obligations, checked only in debug builds.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// The buffer cannot hold the requested nonce range.
    #[error("buffer holds {got} bytes but {need} are required")]
    CacheSize { got: u64, need: u64 },
    /// The scoop index is past the last scoop of a nonce.
    #[error("scoop index {0} is past the last scoop")]
    ScoopRange(u64),
    /// The buffer is not a whole number of lane-interleaved batches.
    #[error("buffer of {0} bytes is not a whole number of nonce batches")]
    BatchGeometry(u64),
}

#[cfg(test)]
mod tests;
