//! M-lane Shabal-256 kernel.
//!
//! Shabal keeps three register files: A (12 words), B (16 words) and
//! C (16 words), plus a 64-bit block counter W. Per block: the message is
//! added into B, W is folded into A, B is pre-rotated by 17, three rounds
//! of sixteen permutation steps run, C picks up 36 additions into A, the
//! message is subtracted from C, and B and C trade places. Closing a
//! message replays the padded final block three more times under its
//! original counter value and reads the digest out of the high half of
//! the swapped-in register file.
//!
//! The kernel is generic over [`ShabalLanes`], so the same code body
//! serves the scalar reference path and every vector width. Counters are
//! scalar: all lanes always absorb the same number of blocks.

use once_cell::sync::Lazy;

use crate::lanes::{Scalar, ShabalLanes};
use crate::params::{BLOCK_SIZE, HASH_SIZE};

/// Output size parameter absorbed into the IV prefix blocks.
const DIGEST_BITS: u32 = 256;

/// Scalar snapshot of the state after the IV prefix, shared process-wide
/// and broadcast into lanes whenever a context is (re)created.
pub(crate) struct BootstrapState {
    a: [u32; 12],
    b: [u32; 16],
    c: [u32; 16],
    wlow: u32,
    whigh: u32,
}

impl BootstrapState {
    fn compute() -> Self {
        let mut ctx = ShabalCtx::<Scalar> {
            a: [0; 12],
            b: [0; 16],
            c: [0; 16],
            // The IV prefix runs with W starting at -1; after the two
            // prefix blocks the counter stands at 1, ready for the first
            // message block.
            wlow: u32::MAX,
            whigh: u32::MAX,
        };
        let mut block = [0u8; BLOCK_SIZE];
        for u in 0..16u32 {
            block[4 * u as usize..4 * u as usize + 4]
                .copy_from_slice(&(DIGEST_BITS + u).to_le_bytes());
        }
        unsafe { ctx.compress(block.as_ptr(), 1) };
        for u in 0..16u32 {
            block[4 * u as usize..4 * u as usize + 4]
                .copy_from_slice(&(DIGEST_BITS + 16 + u).to_le_bytes());
        }
        unsafe { ctx.compress(block.as_ptr(), 1) };
        BootstrapState {
            a: ctx.a,
            b: ctx.b,
            c: ctx.c,
            wlow: ctx.wlow,
            whigh: ctx.whigh,
        }
    }
}

static BOOTSTRAP: Lazy<BootstrapState> = Lazy::new(BootstrapState::compute);

pub(crate) fn bootstrap() -> &'static BootstrapState {
    &BOOTSTRAP
}

/// Force the one-time bootstrap computation. Idempotent; plotting and
/// mining calls do this lazily on first use, C callers do it up front.
pub fn init_bootstrap() {
    Lazy::force(&BOOTSTRAP);
}

/// Shabal-256 state over `S::LANES` independent message streams.
pub struct ShabalCtx<S: ShabalLanes> {
    a: [S::Word; 12],
    b: [S::Word; 16],
    c: [S::Word; 16],
    wlow: u32,
    whigh: u32,
}

impl<S: ShabalLanes> ShabalCtx<S> {
    /// A fresh clone of the process-wide bootstrap state.
    pub fn fresh() -> Self {
        let mut ctx = ShabalCtx {
            a: [S::splat(0); 12],
            b: [S::splat(0); 16],
            c: [S::splat(0); 16],
            wlow: 0,
            whigh: 0,
        };
        ctx.reset();
        ctx
    }

    /// Rewind to the bootstrap state; cheaper than building a new context.
    pub fn reset(&mut self) {
        let boot = bootstrap();
        for (dst, &src) in self.a.iter_mut().zip(boot.a.iter()) {
            *dst = S::splat(src);
        }
        for (dst, &src) in self.b.iter_mut().zip(boot.b.iter()) {
            *dst = S::splat(src);
        }
        for (dst, &src) in self.c.iter_mut().zip(boot.c.iter()) {
            *dst = S::splat(src);
        }
        self.wlow = boot.wlow;
        self.whigh = boot.whigh;
    }

    /// Absorb `blocks` 64-byte blocks per lane from a lane-interleaved
    /// buffer.
    ///
    /// # Safety
    ///
    /// `input` must be valid for reads of `blocks * 64 * S::LANES` bytes.
    pub unsafe fn compress(&mut self, input: *const u8, blocks: usize) {
        let stride = 4 * S::LANES;
        let mut p = input;
        for _ in 0..blocks {
            let mut m = [S::splat(0); 16];
            for (i, word) in m.iter_mut().enumerate() {
                *word = unsafe { S::load(p.add(i * stride)) };
            }
            self.mix(&m);
            p = unsafe { p.add(BLOCK_SIZE * S::LANES) };
        }
    }

    /// Absorb `blocks` blocks, the last of which must carry the 0x80
    /// close marker, then replay that final block three more times under
    /// its original counter value and write the 32-byte digest per lane,
    /// lane-interleaved, to `out`.
    ///
    /// # Safety
    ///
    /// `input` must be valid for reads of `blocks * 64 * S::LANES` bytes
    /// and `out` for writes of `32 * S::LANES` bytes.
    pub unsafe fn finalize_into(&mut self, input: *const u8, blocks: usize, out: *mut u8) {
        debug_assert!(blocks >= 1);
        unsafe { self.compress(input, blocks) };
        let last = unsafe { input.add((blocks - 1) * BLOCK_SIZE * S::LANES) };
        for _ in 0..3 {
            if self.wlow == 0 {
                self.whigh = self.whigh.wrapping_sub(1);
            }
            self.wlow = self.wlow.wrapping_sub(1);
            unsafe { self.compress(last, 1) };
        }
        // The closing swap leaves the digest words in the C half.
        let stride = 4 * S::LANES;
        for i in 0..8 {
            unsafe { S::store(out.add(i * stride), self.c[8 + i]) };
        }
    }

    #[inline(always)]
    fn mix(&mut self, m: &[S::Word; 16]) {
        let ShabalCtx {
            a,
            b,
            c,
            wlow,
            whigh,
        } = self;

        for i in 0..16 {
            b[i] = S::add(b[i], m[i]);
        }
        a[0] = S::xor(a[0], S::splat(*wlow));
        a[1] = S::xor(a[1], S::splat(*whigh));
        for i in 0..16 {
            b[i] = S::rotl17(b[i]);
        }

        macro_rules! perm {
            ($a0:literal, $a1:literal, $b0:literal, $b1:literal, $b2:literal, $b3:literal, $c:literal, $m:literal) => {
                let t = S::mul5(S::rotl15(a[$a1]));
                let t = S::mul3(S::xor(S::xor(a[$a0], t), c[$c]));
                let t = S::xor(
                    S::xor(t, b[$b1]),
                    S::xor(S::andnot(b[$b3], b[$b2]), m[$m]),
                );
                a[$a0] = t;
                b[$b0] = S::not(S::xor(S::rotl1(b[$b0]), t));
            };
        }

        perm!(0, 11, 0, 13, 9, 6, 8, 0);
        perm!(1, 0, 1, 14, 10, 7, 7, 1);
        perm!(2, 1, 2, 15, 11, 8, 6, 2);
        perm!(3, 2, 3, 0, 12, 9, 5, 3);
        perm!(4, 3, 4, 1, 13, 10, 4, 4);
        perm!(5, 4, 5, 2, 14, 11, 3, 5);
        perm!(6, 5, 6, 3, 15, 12, 2, 6);
        perm!(7, 6, 7, 4, 0, 13, 1, 7);
        perm!(8, 7, 8, 5, 1, 14, 0, 8);
        perm!(9, 8, 9, 6, 2, 15, 15, 9);
        perm!(10, 9, 10, 7, 3, 0, 14, 10);
        perm!(11, 10, 11, 8, 4, 1, 13, 11);
        perm!(0, 11, 12, 9, 5, 2, 12, 12);
        perm!(1, 0, 13, 10, 6, 3, 11, 13);
        perm!(2, 1, 14, 11, 7, 4, 10, 14);
        perm!(3, 2, 15, 12, 8, 5, 9, 15);

        perm!(4, 3, 0, 13, 9, 6, 8, 0);
        perm!(5, 4, 1, 14, 10, 7, 7, 1);
        perm!(6, 5, 2, 15, 11, 8, 6, 2);
        perm!(7, 6, 3, 0, 12, 9, 5, 3);
        perm!(8, 7, 4, 1, 13, 10, 4, 4);
        perm!(9, 8, 5, 2, 14, 11, 3, 5);
        perm!(10, 9, 6, 3, 15, 12, 2, 6);
        perm!(11, 10, 7, 4, 0, 13, 1, 7);
        perm!(0, 11, 8, 5, 1, 14, 0, 8);
        perm!(1, 0, 9, 6, 2, 15, 15, 9);
        perm!(2, 1, 10, 7, 3, 0, 14, 10);
        perm!(3, 2, 11, 8, 4, 1, 13, 11);
        perm!(4, 3, 12, 9, 5, 2, 12, 12);
        perm!(5, 4, 13, 10, 6, 3, 11, 13);
        perm!(6, 5, 14, 11, 7, 4, 10, 14);
        perm!(7, 6, 15, 12, 8, 5, 9, 15);

        perm!(8, 7, 0, 13, 9, 6, 8, 0);
        perm!(9, 8, 1, 14, 10, 7, 7, 1);
        perm!(10, 9, 2, 15, 11, 8, 6, 2);
        perm!(11, 10, 3, 0, 12, 9, 5, 3);
        perm!(0, 11, 4, 1, 13, 10, 4, 4);
        perm!(1, 0, 5, 2, 14, 11, 3, 5);
        perm!(2, 1, 6, 3, 15, 12, 2, 6);
        perm!(3, 2, 7, 4, 0, 13, 1, 7);
        perm!(4, 3, 8, 5, 1, 14, 0, 8);
        perm!(5, 4, 9, 6, 2, 15, 15, 9);
        perm!(6, 5, 10, 7, 3, 0, 14, 10);
        perm!(7, 6, 11, 8, 4, 1, 13, 11);
        perm!(8, 7, 12, 9, 5, 2, 12, 12);
        perm!(9, 8, 13, 10, 6, 3, 11, 13);
        perm!(10, 9, 14, 11, 7, 4, 10, 14);
        perm!(11, 10, 15, 12, 8, 5, 9, 15);

        for j in 0..36 {
            a[j % 12] = S::add(a[j % 12], c[(j + 3) % 16]);
        }

        for i in 0..16 {
            c[i] = S::sub(c[i], m[i]);
        }
        core::mem::swap(b, c);

        *wlow = wlow.wrapping_add(1);
        if *wlow == 0 {
            *whigh = whigh.wrapping_add(1);
        }
    }
}

/// Buffered single-stream Shabal-256; the reference path for tests and
/// scalar tails.
pub struct Shabal256 {
    ctx: ShabalCtx<Scalar>,
    buf: [u8; BLOCK_SIZE],
    fill: usize,
}

impl Shabal256 {
    pub fn new() -> Self {
        Shabal256 {
            ctx: ShabalCtx::fresh(),
            buf: [0; BLOCK_SIZE],
            fill: 0,
        }
    }

    pub fn update(&mut self, mut data: &[u8]) {
        if self.fill > 0 {
            let take = (BLOCK_SIZE - self.fill).min(data.len());
            self.buf[self.fill..self.fill + take].copy_from_slice(&data[..take]);
            self.fill += take;
            data = &data[take..];
            if self.fill == BLOCK_SIZE {
                unsafe { self.ctx.compress(self.buf.as_ptr(), 1) };
                self.fill = 0;
            }
        }
        let whole = data.len() / BLOCK_SIZE;
        if whole > 0 {
            unsafe { self.ctx.compress(data.as_ptr(), whole) };
            data = &data[whole * BLOCK_SIZE..];
        }
        if !data.is_empty() {
            self.buf[..data.len()].copy_from_slice(data);
            self.fill = data.len();
        }
    }

    pub fn finalize(mut self) -> [u8; HASH_SIZE] {
        self.buf[self.fill] = 0x80;
        for byte in &mut self.buf[self.fill + 1..] {
            *byte = 0;
        }
        let mut out = [0u8; HASH_SIZE];
        unsafe { self.ctx.finalize_into(self.buf.as_ptr(), 1, out.as_mut_ptr()) };
        out
    }
}

impl Default for Shabal256 {
    fn default() -> Self {
        Self::new()
    }
}

/// One-shot Shabal-256.
pub fn shabal256(data: &[u8]) -> [u8; HASH_SIZE] {
    let mut hasher = Shabal256::new();
    hasher.update(data);
    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_message_kat() {
        // Published Shabal-256 vector for the empty message.
        assert_eq!(
            hex::encode(shabal256(b"")),
            "aec750d11feee9f16271922fbaf5a9be142f62019ef8d720f858940070889014"
        );
    }

    #[test]
    fn deterministic() {
        let data = [0x5au8; 200];
        assert_eq!(shabal256(&data), shabal256(&data));
    }

    #[test]
    fn streaming_matches_one_shot() {
        let data: Vec<u8> = (0..1000u32).map(|i| (i * 7 + 3) as u8).collect();
        for split in [0, 1, 16, 63, 64, 65, 128, 999, 1000] {
            let mut hasher = Shabal256::new();
            hasher.update(&data[..split]);
            hasher.update(&data[split..]);
            assert_eq!(hasher.finalize(), shabal256(&data), "split at {split}");
        }
    }
}
