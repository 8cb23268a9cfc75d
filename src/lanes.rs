//! Lane-parallel 32-bit word operations for the Shabal kernel.
//!
//! The whole core is generic over the number of independent message
//! streams hashed per instruction. Each implementation of [`ShabalLanes`]
//! maps the kernel's word arithmetic onto one register width: plain `u32`
//! (the reference and tail path), SSE2/AVX2/AVX-512 on x86_64, NEON on
//! aarch64. Wider widths are compiled in only when the corresponding
//! `target_feature` is enabled at build time; runtime dispatch is the
//! caller's business.
//!
//! Buffers exchanged with the kernel are lane-interleaved at 32-bit
//! granularity: word `w` of lane `b` lives at u32 slot `w * LANES + b`.

/// Word arithmetic over `LANES` parallel 32-bit streams.
pub trait ShabalLanes: Copy {
    /// Number of independent message streams.
    const LANES: usize;

    /// A vector of `LANES` 32-bit words, one per stream.
    type Word: Copy;

    fn splat(x: u32) -> Self::Word;

    /// Load `LANES` consecutive little-endian words.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for reads of `4 * LANES` bytes. No alignment
    /// is required; aligning to the vector width is faster.
    unsafe fn load(ptr: *const u8) -> Self::Word;

    /// Store `LANES` consecutive little-endian words.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for writes of `4 * LANES` bytes.
    unsafe fn store(ptr: *mut u8, w: Self::Word);

    fn add(a: Self::Word, b: Self::Word) -> Self::Word;
    fn sub(a: Self::Word, b: Self::Word) -> Self::Word;
    fn xor(a: Self::Word, b: Self::Word) -> Self::Word;
    /// `!a & b`, the operand order of the x86 `andnot` instructions.
    fn andnot(a: Self::Word, b: Self::Word) -> Self::Word;
    fn not(w: Self::Word) -> Self::Word;

    fn rotl1(w: Self::Word) -> Self::Word;
    fn rotl15(w: Self::Word) -> Self::Word;
    fn rotl17(w: Self::Word) -> Self::Word;

    /// `w * 3` as an add chain; SSE2 has no 32-bit low multiply.
    #[inline(always)]
    fn mul3(w: Self::Word) -> Self::Word {
        Self::add(Self::add(w, w), w)
    }

    /// `w * 5` as an add chain.
    #[inline(always)]
    fn mul5(w: Self::Word) -> Self::Word {
        let w2 = Self::add(w, w);
        Self::add(Self::add(w2, w2), w)
    }
}

/// Single-stream path: the bit-for-bit reference, and the tail handler
/// for nonce counts that do not fill a vector batch.
#[derive(Clone, Copy)]
pub struct Scalar;

impl ShabalLanes for Scalar {
    const LANES: usize = 1;
    type Word = u32;

    #[inline(always)]
    fn splat(x: u32) -> u32 {
        x
    }

    #[inline(always)]
    unsafe fn load(ptr: *const u8) -> u32 {
        u32::from_le(unsafe { (ptr as *const u32).read_unaligned() })
    }

    #[inline(always)]
    unsafe fn store(ptr: *mut u8, w: u32) {
        unsafe { (ptr as *mut u32).write_unaligned(w.to_le()) }
    }

    #[inline(always)]
    fn add(a: u32, b: u32) -> u32 {
        a.wrapping_add(b)
    }

    #[inline(always)]
    fn sub(a: u32, b: u32) -> u32 {
        a.wrapping_sub(b)
    }

    #[inline(always)]
    fn xor(a: u32, b: u32) -> u32 {
        a ^ b
    }

    #[inline(always)]
    fn andnot(a: u32, b: u32) -> u32 {
        !a & b
    }

    #[inline(always)]
    fn not(w: u32) -> u32 {
        !w
    }

    #[inline(always)]
    fn rotl1(w: u32) -> u32 {
        w.rotate_left(1)
    }

    #[inline(always)]
    fn rotl15(w: u32) -> u32 {
        w.rotate_left(15)
    }

    #[inline(always)]
    fn rotl17(w: u32) -> u32 {
        w.rotate_left(17)
    }
}

#[cfg(target_arch = "x86_64")]
mod x86 {
    use super::ShabalLanes;
    use core::arch::x86_64::*;

    /// Four lanes in 128-bit registers. SSE2 is x86_64 baseline, so this
    /// width is always available there.
    #[derive(Clone, Copy)]
    pub struct Sse2;

    impl ShabalLanes for Sse2 {
        const LANES: usize = 4;
        type Word = __m128i;

        #[inline(always)]
        fn splat(x: u32) -> __m128i {
            unsafe { _mm_set1_epi32(x as i32) }
        }

        #[inline(always)]
        unsafe fn load(ptr: *const u8) -> __m128i {
            unsafe { _mm_loadu_si128(ptr as *const __m128i) }
        }

        #[inline(always)]
        unsafe fn store(ptr: *mut u8, w: __m128i) {
            unsafe { _mm_storeu_si128(ptr as *mut __m128i, w) }
        }

        #[inline(always)]
        fn add(a: __m128i, b: __m128i) -> __m128i {
            unsafe { _mm_add_epi32(a, b) }
        }

        #[inline(always)]
        fn sub(a: __m128i, b: __m128i) -> __m128i {
            unsafe { _mm_sub_epi32(a, b) }
        }

        #[inline(always)]
        fn xor(a: __m128i, b: __m128i) -> __m128i {
            unsafe { _mm_xor_si128(a, b) }
        }

        #[inline(always)]
        fn andnot(a: __m128i, b: __m128i) -> __m128i {
            unsafe { _mm_andnot_si128(a, b) }
        }

        #[inline(always)]
        fn not(w: __m128i) -> __m128i {
            unsafe { _mm_xor_si128(w, _mm_set1_epi32(-1)) }
        }

        #[inline(always)]
        fn rotl1(w: __m128i) -> __m128i {
            unsafe { _mm_or_si128(_mm_slli_epi32::<1>(w), _mm_srli_epi32::<31>(w)) }
        }

        #[inline(always)]
        fn rotl15(w: __m128i) -> __m128i {
            unsafe { _mm_or_si128(_mm_slli_epi32::<15>(w), _mm_srli_epi32::<17>(w)) }
        }

        #[inline(always)]
        fn rotl17(w: __m128i) -> __m128i {
            unsafe { _mm_or_si128(_mm_slli_epi32::<17>(w), _mm_srli_epi32::<15>(w)) }
        }
    }

    /// Eight lanes in 256-bit registers.
    #[cfg(target_feature = "avx2")]
    #[derive(Clone, Copy)]
    pub struct Avx2;

    #[cfg(target_feature = "avx2")]
    impl ShabalLanes for Avx2 {
        const LANES: usize = 8;
        type Word = __m256i;

        #[inline(always)]
        fn splat(x: u32) -> __m256i {
            unsafe { _mm256_set1_epi32(x as i32) }
        }

        #[inline(always)]
        unsafe fn load(ptr: *const u8) -> __m256i {
            unsafe { _mm256_loadu_si256(ptr as *const __m256i) }
        }

        #[inline(always)]
        unsafe fn store(ptr: *mut u8, w: __m256i) {
            unsafe { _mm256_storeu_si256(ptr as *mut __m256i, w) }
        }

        #[inline(always)]
        fn add(a: __m256i, b: __m256i) -> __m256i {
            unsafe { _mm256_add_epi32(a, b) }
        }

        #[inline(always)]
        fn sub(a: __m256i, b: __m256i) -> __m256i {
            unsafe { _mm256_sub_epi32(a, b) }
        }

        #[inline(always)]
        fn xor(a: __m256i, b: __m256i) -> __m256i {
            unsafe { _mm256_xor_si256(a, b) }
        }

        #[inline(always)]
        fn andnot(a: __m256i, b: __m256i) -> __m256i {
            unsafe { _mm256_andnot_si256(a, b) }
        }

        #[inline(always)]
        fn not(w: __m256i) -> __m256i {
            unsafe { _mm256_xor_si256(w, _mm256_set1_epi32(-1)) }
        }

        #[inline(always)]
        fn rotl1(w: __m256i) -> __m256i {
            unsafe { _mm256_or_si256(_mm256_slli_epi32::<1>(w), _mm256_srli_epi32::<31>(w)) }
        }

        #[inline(always)]
        fn rotl15(w: __m256i) -> __m256i {
            unsafe { _mm256_or_si256(_mm256_slli_epi32::<15>(w), _mm256_srli_epi32::<17>(w)) }
        }

        #[inline(always)]
        fn rotl17(w: __m256i) -> __m256i {
            unsafe { _mm256_or_si256(_mm256_slli_epi32::<17>(w), _mm256_srli_epi32::<15>(w)) }
        }
    }

    /// Sixteen lanes in 512-bit registers.
    #[cfg(target_feature = "avx512f")]
    #[derive(Clone, Copy)]
    pub struct Avx512;

    #[cfg(target_feature = "avx512f")]
    impl ShabalLanes for Avx512 {
        const LANES: usize = 16;
        type Word = __m512i;

        #[inline(always)]
        fn splat(x: u32) -> __m512i {
            unsafe { _mm512_set1_epi32(x as i32) }
        }

        #[inline(always)]
        unsafe fn load(ptr: *const u8) -> __m512i {
            unsafe { _mm512_loadu_si512(ptr as *const _) }
        }

        #[inline(always)]
        unsafe fn store(ptr: *mut u8, w: __m512i) {
            unsafe { _mm512_storeu_si512(ptr as *mut _, w) }
        }

        #[inline(always)]
        fn add(a: __m512i, b: __m512i) -> __m512i {
            unsafe { _mm512_add_epi32(a, b) }
        }

        #[inline(always)]
        fn sub(a: __m512i, b: __m512i) -> __m512i {
            unsafe { _mm512_sub_epi32(a, b) }
        }

        #[inline(always)]
        fn xor(a: __m512i, b: __m512i) -> __m512i {
            unsafe { _mm512_xor_si512(a, b) }
        }

        #[inline(always)]
        fn andnot(a: __m512i, b: __m512i) -> __m512i {
            unsafe { _mm512_andnot_si512(a, b) }
        }

        #[inline(always)]
        fn not(w: __m512i) -> __m512i {
            unsafe { _mm512_xor_si512(w, _mm512_set1_epi32(-1)) }
        }

        #[inline(always)]
        fn rotl1(w: __m512i) -> __m512i {
            unsafe { _mm512_rol_epi32::<1>(w) }
        }

        #[inline(always)]
        fn rotl15(w: __m512i) -> __m512i {
            unsafe { _mm512_rol_epi32::<15>(w) }
        }

        #[inline(always)]
        fn rotl17(w: __m512i) -> __m512i {
            unsafe { _mm512_rol_epi32::<17>(w) }
        }
    }
}

#[cfg(target_arch = "x86_64")]
pub use x86::Sse2;

#[cfg(all(target_arch = "x86_64", target_feature = "avx2"))]
pub use x86::Avx2;

#[cfg(all(target_arch = "x86_64", target_feature = "avx512f"))]
pub use x86::Avx512;

#[cfg(target_arch = "aarch64")]
mod arm {
    use super::ShabalLanes;
    use core::arch::aarch64::*;

    /// Four lanes in NEON registers, the aarch64 baseline.
    #[derive(Clone, Copy)]
    pub struct Neon;

    impl ShabalLanes for Neon {
        const LANES: usize = 4;
        type Word = uint32x4_t;

        #[inline(always)]
        fn splat(x: u32) -> uint32x4_t {
            vdupq_n_u32(x)
        }

        #[inline(always)]
        unsafe fn load(ptr: *const u8) -> uint32x4_t {
            unsafe { vld1q_u32(ptr as *const u32) }
        }

        #[inline(always)]
        unsafe fn store(ptr: *mut u8, w: uint32x4_t) {
            unsafe { vst1q_u32(ptr as *mut u32, w) }
        }

        #[inline(always)]
        fn add(a: uint32x4_t, b: uint32x4_t) -> uint32x4_t {
            vaddq_u32(a, b)
        }

        #[inline(always)]
        fn sub(a: uint32x4_t, b: uint32x4_t) -> uint32x4_t {
            vsubq_u32(a, b)
        }

        #[inline(always)]
        fn xor(a: uint32x4_t, b: uint32x4_t) -> uint32x4_t {
            veorq_u32(a, b)
        }

        #[inline(always)]
        fn andnot(a: uint32x4_t, b: uint32x4_t) -> uint32x4_t {
            // vbic computes first & !second
            vbicq_u32(b, a)
        }

        #[inline(always)]
        fn not(w: uint32x4_t) -> uint32x4_t {
            vmvnq_u32(w)
        }

        #[inline(always)]
        fn rotl1(w: uint32x4_t) -> uint32x4_t {
            vorrq_u32(vshlq_n_u32::<1>(w), vshrq_n_u32::<31>(w))
        }

        #[inline(always)]
        fn rotl15(w: uint32x4_t) -> uint32x4_t {
            vorrq_u32(vshlq_n_u32::<15>(w), vshrq_n_u32::<17>(w))
        }

        #[inline(always)]
        fn rotl17(w: uint32x4_t) -> uint32x4_t {
            vorrq_u32(vshlq_n_u32::<17>(w), vshrq_n_u32::<15>(w))
        }
    }
}

#[cfg(target_arch = "aarch64")]
pub use arm::Neon;

/// Widest lane set available in this build; what the safe wrappers use.
#[cfg(all(target_arch = "x86_64", target_feature = "avx512f"))]
pub type Widest = Avx512;

#[cfg(all(target_arch = "x86_64", target_feature = "avx2", not(target_feature = "avx512f")))]
pub type Widest = Avx2;

#[cfg(all(
    target_arch = "x86_64",
    not(target_feature = "avx2"),
    not(target_feature = "avx512f")
))]
pub type Widest = Sse2;

#[cfg(target_arch = "aarch64")]
pub type Widest = Neon;

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
pub type Widest = Scalar;
