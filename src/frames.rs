//! Padded final blocks for the chain and deadline engines.
//!
//! Every message the plotter hashes ends either in the 16-byte seed or on
//! a block boundary, so the 0x80-padded final block only ever takes three
//! shapes. They are built once per batch, lane-interleaved, and patched
//! in place instead of being reassembled per hash.

use core::marker::PhantomData;

use crate::lanes::ShabalLanes;
use crate::params::{GENSIG_SIZE, HASH_SIZE};

/// Cache-line aligned backing for lane-interleaved blocks, sized for the
/// widest lane set; narrower widths use a prefix.
#[repr(align(64))]
pub(crate) struct Aligned<const N: usize>(pub [u32; N]);

/// One 64-byte block across up to 16 lanes.
type TailBlock = Aligned<256>;

/// The three final-block shapes of the plot chain.
///
/// * `even_tail` is seed || 0x80 || zeros: the cache contributed an even
///   number of hashes. Also the whole message of the synthetic first
///   hash, and the tail of the whole-nonce digest.
/// * `odd_tail` is chain head || seed || 0x80-pad: the cache contributed
///   an odd number of hashes, leaving the head hash to ride with the
///   seed.
/// * `cap_tail` is 0x80 || zeros: the message filled whole blocks
///   (saturated window).
pub(crate) struct NonceFrames<S: ShabalLanes> {
    even_tail: TailBlock,
    odd_tail: TailBlock,
    cap_tail: TailBlock,
    _lanes: PhantomData<S>,
}

impl<S: ShabalLanes> NonceFrames<S> {
    pub fn new(numeric_id: u64) -> Self {
        let mut frames = NonceFrames {
            even_tail: Aligned([0; 256]),
            odd_tail: Aligned([0; 256]),
            cap_tail: Aligned([0; 256]),
            _lanes: PhantomData,
        };
        let lanes = S::LANES;
        // The seed is written big-endian, then read back as the two
        // little-endian words Shabal sees.
        let id_hi = ((numeric_id >> 32) as u32).swap_bytes();
        let id_lo = (numeric_id as u32).swap_bytes();
        for b in 0..lanes {
            frames.even_tail.0[b] = id_hi.to_le();
            frames.even_tail.0[lanes + b] = id_lo.to_le();
            frames.even_tail.0[4 * lanes + b] = 0x80u32.to_le();
            frames.odd_tail.0[8 * lanes + b] = id_hi.to_le();
            frames.odd_tail.0[9 * lanes + b] = id_lo.to_le();
            frames.odd_tail.0[12 * lanes + b] = 0x80u32.to_le();
            frames.cap_tail.0[b] = 0x80u32.to_le();
        }
        frames
    }

    /// Rewrite the per-lane nonce indices: lane `b` plots `start + b`.
    pub fn patch_nonces(&mut self, start: u64) {
        let lanes = S::LANES;
        for b in 0..lanes {
            let nonce = start + b as u64;
            let hi = ((nonce >> 32) as u32).swap_bytes().to_le();
            let lo = (nonce as u32).swap_bytes().to_le();
            self.even_tail.0[2 * lanes + b] = hi;
            self.even_tail.0[3 * lanes + b] = lo;
            self.odd_tail.0[10 * lanes + b] = hi;
            self.odd_tail.0[11 * lanes + b] = lo;
        }
    }

    /// Refresh the chain head (first half of the odd tail) from the top
    /// hash of the batch, freshly written to the cache.
    ///
    /// # Safety
    ///
    /// `src` must be valid for reads of `32 * S::LANES` bytes.
    pub unsafe fn set_chain_head(&mut self, src: *const u8) {
        unsafe {
            core::ptr::copy_nonoverlapping(
                src,
                self.odd_tail.0.as_mut_ptr() as *mut u8,
                HASH_SIZE * S::LANES,
            );
        }
    }

    pub fn even_tail(&self) -> *const u8 {
        self.even_tail.0.as_ptr() as *const u8
    }

    pub fn odd_tail(&self) -> *const u8 {
        self.odd_tail.0.as_ptr() as *const u8
    }

    pub fn cap_tail(&self) -> *const u8 {
        self.cap_tail.0.as_ptr() as *const u8
    }
}

/// Two-block staging frame for deadline hashing:
/// gensig || scoop hash || mirror hash || 0x80 || zeros.
///
/// The gensig and terminator words are broadcast once; only the two cache
/// slabs are copied in per batch.
pub(crate) struct DeadlineFrames<S: ShabalLanes> {
    blocks: Aligned<512>,
    _lanes: PhantomData<S>,
}

impl<S: ShabalLanes> DeadlineFrames<S> {
    pub fn new(gensig: &[u8; GENSIG_SIZE]) -> Self {
        let mut frames = DeadlineFrames {
            blocks: Aligned([0; 512]),
            _lanes: PhantomData,
        };
        let lanes = S::LANES;
        for w in 0..8 {
            let word = u32::from_le_bytes(gensig[4 * w..4 * w + 4].try_into().unwrap());
            for b in 0..lanes {
                frames.blocks.0[w * lanes + b] = word.to_le();
            }
        }
        for b in 0..lanes {
            frames.blocks.0[24 * lanes + b] = 0x80u32.to_le();
        }
        frames
    }

    /// Copy the scoop hash and its mirror partner for the current batch.
    ///
    /// # Safety
    ///
    /// Both pointers must be valid for reads of `32 * S::LANES` bytes.
    pub unsafe fn load_scoop_pair(&mut self, u1: *const u8, u2: *const u8) {
        let lanes = S::LANES;
        let base = self.blocks.0.as_mut_ptr() as *mut u8;
        unsafe {
            core::ptr::copy_nonoverlapping(u1, base.add(HASH_SIZE * lanes), HASH_SIZE * lanes);
            core::ptr::copy_nonoverlapping(u2, base.add(2 * HASH_SIZE * lanes), HASH_SIZE * lanes);
        }
    }

    pub fn blocks(&self) -> *const u8 {
        self.blocks.0.as_ptr() as *const u8
    }
}
