//! Nonce generation: the reverse hash chain, the whole-nonce XOR mask,
//! and cache layout helpers.
//!
//! A nonce is built backwards. The seed alone produces the hash stored at
//! the top of the chain (index 8191); every further hash covers the run
//! of hashes after it plus the seed, clipped to the absorb window; the
//! digest of the whole nonce is then XORed over every hash. The batch
//! cache holds `LANES` nonces interleaved word by word, so a run of
//! chain hashes is one contiguous region regardless of width.

use crate::CoreError;
use crate::frames::{Aligned, NonceFrames};
use crate::lanes::{Scalar, ShabalLanes, Widest};
use crate::params::{
    BLOCK_SIZE, HASH_CAP, HASH_SIZE, HASHES_PER_CAP, HASHES_PER_NONCE, NONCE_SIZE,
    SCOOPS_PER_NONCE,
};
use crate::shabal::ShabalCtx;

/// Plot `nonces` nonces into `cache`, lane-interleaved in batches of
/// `S::LANES`. Lane `b` of batch `n` holds nonce `start_nonce + n·B + b`.
///
/// # Safety
///
/// `cache` must be valid for writes of `nonces * NONCE_SIZE` bytes and
/// `nonces` must be a multiple of `S::LANES`.
pub unsafe fn generate_nonces<S: ShabalLanes>(
    cache: *mut u8,
    numeric_id: u64,
    start_nonce: u64,
    nonces: u64,
) {
    debug_assert!(nonces % S::LANES as u64 == 0);
    let mut frames = NonceFrames::<S>::new(numeric_id);
    let mut done = 0u64;
    while done < nonces {
        frames.patch_nonces(start_nonce + done);
        let batch = unsafe { cache.add(done as usize * NONCE_SIZE) };
        unsafe { generate_batch::<S>(batch, &mut frames) };
        done += S::LANES as u64;
    }
}

unsafe fn generate_batch<S: ShabalLanes>(cache: *mut u8, frames: &mut NonceFrames<S>) {
    let stride = HASH_SIZE * S::LANES;
    let mut ctx = ShabalCtx::<S>::fresh();

    // Synthetic first hash: the seed alone. It lands at the top of the
    // chain and doubles as the chain head inside the odd tail.
    let top = unsafe { cache.add((HASHES_PER_NONCE - 1) * stride) };
    unsafe { ctx.finalize_into(frames.even_tail(), 1, top) };
    unsafe { frames.set_chain_head(top) };

    // Early phase: the chain is still shorter than the absorb window.
    // Each message runs from the newest hash up through the chain head,
    // then the seed; whole block pairs come straight from the cache and
    // the remainder is one of the prebuilt tails.
    for h in (HASHES_PER_NONCE - HASHES_PER_CAP..=HASHES_PER_NONCE - 2).rev() {
        let picked = HASHES_PER_NONCE - 1 - h;
        let src = unsafe { cache.add((h + 1) * stride) };
        let dst = unsafe { cache.add(h * stride) };
        ctx.reset();
        if picked >= 2 {
            unsafe { ctx.compress(src, picked / 2) };
        }
        let tail = if picked % 2 == 0 {
            frames.even_tail()
        } else {
            frames.odd_tail()
        };
        unsafe { ctx.finalize_into(tail, 1, dst) };
    }

    // Saturated phase: a full window of 128 hashes per message, closed by
    // the bare 0x80 block.
    for h in (0..HASHES_PER_NONCE - HASHES_PER_CAP).rev() {
        let src = unsafe { cache.add((h + 1) * stride) };
        let dst = unsafe { cache.add(h * stride) };
        ctx.reset();
        unsafe { ctx.compress(src, HASH_CAP / BLOCK_SIZE) };
        unsafe { ctx.finalize_into(frames.cap_tail(), 1, dst) };
    }

    // Digest of the whole nonce plus the seed, XORed over every hash.
    let mut digest = Aligned::<128>([0; 128]);
    ctx.reset();
    unsafe { ctx.compress(cache, NONCE_SIZE / BLOCK_SIZE) };
    unsafe { ctx.finalize_into(frames.even_tail(), 1, digest.0.as_mut_ptr() as *mut u8) };

    let digest_ptr = digest.0.as_ptr() as *const u8;
    let mut mask = [S::splat(0); 8];
    for (w, word) in mask.iter_mut().enumerate() {
        *word = unsafe { S::load(digest_ptr.add(w * 4 * S::LANES)) };
    }
    for h in 0..HASHES_PER_NONCE {
        let hash = unsafe { cache.add(h * stride) };
        for (w, &word) in mask.iter().enumerate() {
            let p = unsafe { hash.add(w * 4 * S::LANES) };
            let v = unsafe { S::load(p) };
            unsafe { S::store(p, S::xor(v, word)) };
        }
    }
}

/// Plot `nonces` nonces with the widest lane set compiled into this
/// build, finishing any remainder in single-lane batches.
///
/// The cache becomes a sequence of lane-interleaved batches: the first
/// `nonces - nonces % B` nonces in batches of `B = Widest::LANES`, the
/// rest singly (single-lane layout is plain contiguous nonce data). Use
/// [`copy_nonce_out`] to de-interleave individual nonces.
pub fn plot_nonces(
    cache: &mut [u8],
    numeric_id: u64,
    start_nonce: u64,
    nonces: u64,
) -> Result<(), CoreError> {
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
    let full = nonces - nonces % Widest::LANES as u64;
    unsafe {
        if full > 0 {
            generate_nonces::<Widest>(cache.as_mut_ptr(), numeric_id, start_nonce, full);
        }
        if nonces > full {
            generate_nonces::<Scalar>(
                cache.as_mut_ptr().add(full as usize * NONCE_SIZE),
                numeric_id,
                start_nonce + full,
                nonces - full,
            );
        }
    }
    Ok(())
}

/// De-interleave one nonce out of a region generated with `lanes` lanes.
///
/// `index` counts nonces from the start of the region; `out` receives the
/// canonical contiguous nonce bytes.
pub fn copy_nonce_out(
    cache: &[u8],
    lanes: usize,
    index: usize,
    out: &mut [u8],
) -> Result<(), CoreError> {
    if lanes == 0 {
        return Err(CoreError::BatchGeometry(0));
    }
    if out.len() < NONCE_SIZE {
        return Err(CoreError::CacheSize {
            got: out.len() as u64,
            need: NONCE_SIZE as u64,
        });
    }
    let batch = index / lanes;
    let lane = index % lanes;
    let overflow = || CoreError::CacheSize {
        got: cache.len() as u64,
        need: u64::MAX,
    };
    let batch_bytes = lanes.checked_mul(NONCE_SIZE).ok_or_else(overflow)?;
    let base = batch.checked_mul(batch_bytes).ok_or_else(overflow)?;
    let need = base.checked_add(batch_bytes).ok_or_else(overflow)?;
    if cache.len() < need {
        return Err(CoreError::CacheSize {
            got: cache.len() as u64,
            need: need as u64,
        });
    }
    for w in 0..NONCE_SIZE / 4 {
        let src = base + (w * lanes + lane) * 4;
        out[4 * w..4 * w + 4].copy_from_slice(&cache[src..src + 4]);
    }
    Ok(())
}

/// Swap the second hashes of mirror scoops in place, converting the cache
/// between chain (PoC1) order and PoC2 order. Its own inverse.
pub fn poc2_shuffle(cache: &mut [u8], lanes: usize) -> Result<(), CoreError> {
    if lanes == 0 {
        return Err(CoreError::BatchGeometry(0));
    }
    let batch_bytes = lanes
        .checked_mul(NONCE_SIZE)
        .ok_or(CoreError::BatchGeometry(cache.len() as u64))?;
    if cache.is_empty() || cache.len() % batch_bytes != 0 {
        return Err(CoreError::BatchGeometry(cache.len() as u64));
    }
    let stride = HASH_SIZE * lanes;
    for batch in cache.chunks_exact_mut(batch_bytes) {
        for s in 0..SCOOPS_PER_NONCE / 2 {
            let lo = (2 * s + 1) * stride;
            let hi = (2 * (SCOOPS_PER_NONCE - 1 - s) + 1) * stride;
            let (head, tail) = batch.split_at_mut(hi);
            head[lo..lo + stride].swap_with_slice(&mut tail[..stride]);
        }
    }
    Ok(())
}
