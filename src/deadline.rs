//! Deadline search: one Shabal over gensig || scoop pair per nonce, and a
//! running minimum across lanes and batches.

use crate::CoreError;
use crate::frames::{Aligned, DeadlineFrames};
use crate::lanes::{Scalar, ShabalLanes, Widest};
use crate::params::{GENSIG_SIZE, HASH_SIZE, NONCE_SIZE, SCOOP_SIZE, SCOOPS_PER_NONCE};
use crate::shabal::ShabalCtx;

/// Best (deadline, offset) pair of a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    /// Lowest deadline seen; lower wins the round.
    pub value: u64,
    /// Offset of that nonce from the start of the scanned range.
    pub offset: u64,
}

/// Fold one candidate into the running minimum. Earlier candidates win
/// ties, so the smallest offset is kept.
#[inline(always)]
pub(crate) fn consider(best: &mut u64, offset: &mut u64, have: &mut bool, d: u64, idx: u64) {
    if !*have || d < *best {
        *best = d;
        *offset = idx;
        *have = true;
    }
}

/// Scan `nonces` nonces for the lowest deadline at `scoop`, folding
/// candidates into `best`/`offset` under an explicit `have` flag.
/// Offsets are relative to the start of `cache`.
///
/// # Safety
///
/// `cache` must be valid for reads of `nonces * NONCE_SIZE` bytes laid
/// out in `S::LANES`-interleaved batches, and `nonces` must be a multiple
/// of `S::LANES`.
pub(crate) unsafe fn scan_deadlines<S: ShabalLanes>(
    cache: *const u8,
    scoop: u64,
    nonces: u64,
    gensig: &[u8; GENSIG_SIZE],
    best: &mut u64,
    offset: &mut u64,
    have: &mut bool,
) {
    debug_assert!(nonces % S::LANES as u64 == 0);
    debug_assert!((scoop as usize) < SCOOPS_PER_NONCE);
    let lanes = S::LANES;
    let mut frames = DeadlineFrames::<S>::new(gensig);
    let mut ctx = ShabalCtx::<S>::fresh();
    let mut out = Aligned::<128>([0; 128]);

    let scoop_off = scoop as usize * SCOOP_SIZE * lanes;
    let mirror_off =
        (SCOOPS_PER_NONCE - 1 - scoop as usize) * SCOOP_SIZE * lanes + HASH_SIZE * lanes;

    let mut i = 0u64;
    while i < nonces {
        let batch = unsafe { cache.add(i as usize * NONCE_SIZE) };
        unsafe { frames.load_scoop_pair(batch.add(scoop_off), batch.add(mirror_off)) };
        ctx.reset();
        unsafe { ctx.finalize_into(frames.blocks(), 2, out.0.as_mut_ptr() as *mut u8) };
        for b in 0..lanes {
            let lo = u32::from_le(out.0[b]) as u64;
            let hi = u32::from_le(out.0[lanes + b]) as u64;
            consider(best, offset, have, lo | (hi << 32), i + b as u64);
        }
        i += lanes as u64;
    }
}

/// Scan `nonces` nonces for the lowest deadline at `scoop`, updating
/// `best_deadline` and `best_offset` in place.
///
/// The deadline input pairs the first hash of `scoop` with the second
/// hash of its mirror scoop, so a chain-ordered cache yields the same
/// deadlines a one-scoop read from a PoC2 plot file would.
///
/// A stored `*best_deadline` of zero means "nothing yet": the first
/// candidate always wins. Offsets count from the start of `cache`, so
/// callers accumulating across disjoint slabs rebase them.
///
/// # Safety
///
/// `cache` must be valid for reads of `nonces * NONCE_SIZE` bytes laid
/// out in `S::LANES`-interleaved batches, and `nonces` must be a multiple
/// of `S::LANES`.
pub unsafe fn search_deadlines<S: ShabalLanes>(
    cache: *const u8,
    scoop: u64,
    nonces: u64,
    gensig: &[u8; GENSIG_SIZE],
    best_deadline: &mut u64,
    best_offset: &mut u64,
) {
    let mut have = *best_deadline != 0;
    unsafe {
        scan_deadlines::<S>(
            cache,
            scoop,
            nonces,
            gensig,
            best_deadline,
            best_offset,
            &mut have,
        );
    }
}

/// Scan every nonce in `cache` and return the best deadline.
///
/// The cache must be laid out the way [`plot_nonces`](crate::plot_nonces)
/// wrote it: widest-lane batches first, single-lane remainder after. One
/// candidate flag spans both sub-scans, so the result is the true minimum
/// even when that minimum is zero.
pub fn best_deadline(
    cache: &[u8],
    scoop: u64,
    nonces: u64,
    gensig: &[u8; GENSIG_SIZE],
) -> Result<Deadline, CoreError> {
    if scoop as usize >= SCOOPS_PER_NONCE {
        return Err(CoreError::ScoopRange(scoop));
    }
    let need = nonces
        .checked_mul(NONCE_SIZE as u64)
        .ok_or(CoreError::CacheSize {
            got: cache.len() as u64,
            need: u64::MAX,
        })?;
    if (cache.len() as u64) < need {
        return Err(CoreError::CacheSize {
            got: cache.len() as u64,
            need,
        });
    }

    let mut value = 0u64;
    let mut offset = 0u64;
    let mut have = false;
    let full = nonces - nonces % Widest::LANES as u64;
    unsafe {
        if full > 0 {
            scan_deadlines::<Widest>(
                cache.as_ptr(),
                scoop,
                full,
                gensig,
                &mut value,
                &mut offset,
                &mut have,
            );
        }
        if nonces > full {
            let mut tail_value = 0u64;
            let mut tail_offset = 0u64;
            let mut tail_have = false;
            scan_deadlines::<Scalar>(
                cache.as_ptr().add(full as usize * NONCE_SIZE),
                scoop,
                nonces - full,
                gensig,
                &mut tail_value,
                &mut tail_offset,
                &mut tail_have,
            );
            // Tail offsets are relative to the slab; rebase before merging.
            if tail_have {
                consider(
                    &mut value,
                    &mut offset,
                    &mut have,
                    tail_value,
                    full + tail_offset,
                );
            }
        }
    }
    Ok(Deadline { value, offset })
}
