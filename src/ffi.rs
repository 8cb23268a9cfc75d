//! C ABI entry points, one triplet per vector width.
//!
//! The suffix names the register width in bits. `_128` maps to SSE2 on
//! x86_64 and NEON on aarch64; `_256` and `_512` exist in builds with the
//! matching `target_feature` enabled. Preconditions (sizing, lane
//! multiplicity) are caller obligations and only checked in debug
//! builds.

use crate::lanes::ShabalLanes;
use crate::params::GENSIG_SIZE;
use crate::{deadline, noncegen, shabal};

macro_rules! entry_points {
    ($init:ident, $plot:ident, $find:ident, $lanes:ty) => {
        /// Precompute the process-wide Shabal bootstrap state. Idempotent;
        /// Rust callers may skip it, the engines initialize lazily.
        #[unsafe(no_mangle)]
        pub extern "C" fn $init() {
            shabal::init_bootstrap();
        }

        /// Write `local_nonces * NONCE_SIZE` bytes of lane-interleaved
        /// plot data to `cache`.
        ///
        /// # Safety
        ///
        /// `cache` must be valid for writes of that many bytes and
        /// `local_nonces` must be a multiple of the lane count. Aligning
        /// the cache to the vector width is not required for correctness,
        /// only for throughput.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $plot(
            cache: *mut u8,
            numeric_id: u64,
            local_startnonce: u64,
            local_nonces: u64,
        ) {
            if cache.is_null() || local_nonces == 0 {
                return;
            }
            debug_assert_eq!(local_nonces % <$lanes as ShabalLanes>::LANES as u64, 0);
            unsafe {
                noncegen::generate_nonces::<$lanes>(
                    cache,
                    numeric_id,
                    local_startnonce,
                    local_nonces,
                );
            }
        }

        /// Scan `nonce_count` nonces for the lowest deadline at `scoop`,
        /// updating `best_deadline` and `best_offset` in place. A stored
        /// deadline of zero means "nothing yet".
        ///
        /// # Safety
        ///
        /// `data` must be valid for reads of `nonce_count * NONCE_SIZE`
        /// bytes of lane-interleaved plot data, `gensig` for reads of 32
        /// bytes, both out-pointers for read-write access, and
        /// `nonce_count` must be a multiple of the lane count.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $find(
            data: *const u8,
            scoop: u64,
            nonce_count: u64,
            gensig: *const u8,
            best_deadline: *mut u64,
            best_offset: *mut u64,
        ) {
            if data.is_null()
                || gensig.is_null()
                || best_deadline.is_null()
                || best_offset.is_null()
                || nonce_count == 0
            {
                return;
            }
            debug_assert_eq!(nonce_count % <$lanes as ShabalLanes>::LANES as u64, 0);
            let gensig = unsafe { &*(gensig as *const [u8; GENSIG_SIZE]) };
            unsafe {
                deadline::search_deadlines::<$lanes>(
                    data,
                    scoop,
                    nonce_count,
                    gensig,
                    &mut *best_deadline,
                    &mut *best_offset,
                );
            }
        }
    };
}

#[cfg(target_arch = "x86_64")]
entry_points!(
    init_shabal_128,
    noncegen_128,
    find_best_deadline_128,
    crate::lanes::Sse2
);

#[cfg(target_arch = "aarch64")]
entry_points!(
    init_shabal_128,
    noncegen_128,
    find_best_deadline_128,
    crate::lanes::Neon
);

#[cfg(all(target_arch = "x86_64", target_feature = "avx2"))]
entry_points!(
    init_shabal_256,
    noncegen_256,
    find_best_deadline_256,
    crate::lanes::Avx2
);

#[cfg(all(target_arch = "x86_64", target_feature = "avx512f"))]
entry_points!(
    init_shabal_512,
    noncegen_512,
    find_best_deadline_512,
    crate::lanes::Avx512
);
