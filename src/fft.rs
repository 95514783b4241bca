//! Complex FFT kernel for arbitrary transform lengths.
//!
//! Power-of-two lengths use an iterative Stockham auto-sort radix-2 pass.
//! Composite lengths fall back to a recursive mixed-radix Cooley-Tukey
//! decomposition over the smallest prime factor, and prime lengths use either
//! a direct DFT (small sizes) or Bluestein's chirp-Z convolution. A
//! [`FftPlanner`] caches twiddle tables and chirp pairs per length so repeated
//! transforms of the same size do not recompute trigonometry.

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::cell::RefCell;
use hashbrown::HashMap;

pub use crate::num::{Complex, Complex32, Complex64, Float};

/// Largest prime length handled by the direct `O(n^2)` DFT before switching
/// to Bluestein's algorithm.
const DIRECT_DFT_MAX: usize = 31;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FftError {
    EmptyInput,
    MismatchedLengths,
    UnrepresentableLength,
}

impl core::fmt::Display for FftError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            FftError::EmptyInput => write!(f, "transform length must be at least 1"),
            FftError::MismatchedLengths => write!(f, "buffer lengths do not match"),
            FftError::UnrepresentableLength => {
                write!(f, "length is not exactly representable in the sample type")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for FftError {}

type BluesteinPair<T> = (Arc<[Complex<T>]>, Arc<[Complex<T>]>);

/// Caches per-length twiddle tables and Bluestein chirp pairs.
pub struct FftPlanner<T: Float> {
    /// Stage twiddles for the Stockham pass: `n/2` entries `exp(-2πi k / n)`.
    stage_cache: HashMap<usize, Arc<[Complex<T>]>>,
    /// Full-length tables `exp(-2πi k / n)` for `k = 0..n`, used by the
    /// mixed-radix combine step and the direct DFT.
    full_cache: HashMap<usize, Arc<[Complex<T>]>>,
    /// Chirp sequence and transformed convolution kernel per length.
    bluestein_cache: HashMap<usize, BluesteinPair<T>>,
    scratch: Vec<Complex<T>>,
}

impl<T: Float> Default for FftPlanner<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Float> FftPlanner<T> {
    pub fn new() -> Self {
        Self {
            stage_cache: HashMap::new(),
            full_cache: HashMap::new(),
            bluestein_cache: HashMap::new(),
            scratch: Vec::new(),
        }
    }

    /// Twiddle table for the Stockham stages of a length-`n` transform. The
    /// returned slice has `n/2` entries containing `exp(-2πi k / n)`.
    pub fn get_stage_twiddles(&mut self, n: usize) -> Result<Arc<[Complex<T>]>, FftError> {
        if !self.stage_cache.contains_key(&n) {
            let n_t = T::from_usize(n).ok_or(FftError::UnrepresentableLength)?;
            let half = n / 2;
            let angle = -(T::from_f32(2.0) * T::pi()) / n_t;
            let (sin_step, cos_step) = angle.sin_cos();

            let mut table: Vec<Complex<T>> = Vec::with_capacity(half);
            let mut w_re = T::one();
            let mut w_im = T::zero();
            for _ in 0..half {
                table.push(Complex::new(w_re, w_im));
                let tmp = w_re;
                w_re = w_re.mul_add(cos_step, -(w_im * sin_step));
                w_im = w_im.mul_add(cos_step, tmp * sin_step);
            }
            self.stage_cache.insert(n, Arc::from(table));
        }
        Ok(Arc::clone(self.stage_cache.get(&n).unwrap()))
    }

    /// Full table `exp(-2πi k / n)` for `k = 0..n`.
    pub fn get_full_twiddles(&mut self, n: usize) -> Result<Arc<[Complex<T>]>, FftError> {
        if !self.full_cache.contains_key(&n) {
            let n_t = T::from_usize(n).ok_or(FftError::UnrepresentableLength)?;
            let step = -(T::from_f32(2.0) * T::pi()) / n_t;
            let mut table: Vec<Complex<T>> = Vec::with_capacity(n);
            for k in 0..n {
                let k_t = T::from_usize(k).ok_or(FftError::UnrepresentableLength)?;
                table.push(Complex::expi(step * k_t));
            }
            self.full_cache.insert(n, Arc::from(table));
        }
        Ok(Arc::clone(self.full_cache.get(&n).unwrap()))
    }
}

/// FFT backend interface. The scalar implementation below is the only backend
/// in this crate; the trait keeps the kernel swappable for callers that bring
/// their own.
pub trait FftImpl<T: Float> {
    fn fft(&self, input: &mut [Complex<T>]) -> Result<(), FftError>;
    fn ifft(&self, input: &mut [Complex<T>]) -> Result<(), FftError>;
    fn fft_out_of_place(
        &self,
        input: &[Complex<T>],
        output: &mut [Complex<T>],
    ) -> Result<(), FftError> {
        if input.len() != output.len() {
            return Err(FftError::MismatchedLengths);
        }
        output.copy_from_slice(input);
        self.fft(output)
    }
    fn ifft_out_of_place(
        &self,
        input: &[Complex<T>],
        output: &mut [Complex<T>],
    ) -> Result<(), FftError> {
        if input.len() != output.len() {
            return Err(FftError::MismatchedLengths);
        }
        output.copy_from_slice(input);
        self.ifft(output)
    }
}

pub struct ScalarFftImpl<T: Float> {
    planner: RefCell<FftPlanner<T>>,
}

impl<T: Float> Default for ScalarFftImpl<T> {
    fn default() -> Self {
        Self {
            planner: RefCell::new(FftPlanner::new()),
        }
    }
}

impl<T: Float> ScalarFftImpl<T> {
    pub fn with_planner(planner: FftPlanner<T>) -> Self {
        Self {
            planner: RefCell::new(planner),
        }
    }

    /// Stockham auto-sort radix-2 FFT for power-of-two lengths, using a
    /// double-buffered pass over a planner-owned scratch buffer.
    fn stockham_fft(&self, input: &mut [Complex<T>]) -> Result<(), FftError> {
        let n = input.len();
        debug_assert!(n.is_power_of_two() && n >= 2);

        let (twiddles, mut scratch) = {
            let mut planner = self.planner.borrow_mut();
            let twiddles = planner.get_stage_twiddles(n)?;
            let scratch = core::mem::take(&mut planner.scratch);
            (twiddles, scratch)
        };
        if scratch.len() < n {
            scratch.resize(n, Complex::zero());
        }

        let mut in_input = true;
        {
            let scratch = &mut scratch[..n];
            // n1 = number of butterfly groups, n2 = half-size of each group.
            let mut n1 = 1usize;
            let mut n2 = n;
            while n1 < n {
                n2 >>= 1;
                let (src, dst): (&mut [Complex<T>], &mut [Complex<T>]) = if in_input {
                    (&mut *input, &mut *scratch)
                } else {
                    (&mut *scratch, &mut *input)
                };
                for k in 0..n1 {
                    // Twiddle for this group: exp(-2πi k / (2*n1)) = table[k * n2].
                    let w = twiddles[k * n2];
                    let base0 = 2 * k * n2;
                    let base1 = base0 + n2;
                    let dst0 = k * n2;
                    let dst1 = (k + n1) * n2;
                    for j in 0..n2 {
                        let u = src[base0 + j];
                        let v = src[base1 + j].mul(w);
                        dst[dst0 + j] = u.add(v);
                        dst[dst1 + j] = u.sub(v);
                    }
                }
                in_input = !in_input;
                n1 <<= 1;
            }
            if !in_input {
                input.copy_from_slice(scratch);
            }
        }

        self.planner.borrow_mut().scratch = scratch;
        Ok(())
    }

    /// Direct `O(n^2)` DFT for small prime lengths.
    fn direct_dft(&self, input: &mut [Complex<T>]) -> Result<(), FftError> {
        let n = input.len();
        let twiddles = self.planner.borrow_mut().get_full_twiddles(n)?;
        let mut out: Vec<Complex<T>> = Vec::with_capacity(n);
        for k in 0..n {
            let mut sum = Complex::zero();
            for (j, &x) in input.iter().enumerate() {
                sum = sum.add(x.mul(twiddles[(j * k) % n]));
            }
            out.push(sum);
        }
        input.copy_from_slice(&out);
        Ok(())
    }

    /// Recursive Cooley-Tukey step for composite `n = p * m` where `p` is the
    /// smallest prime factor of `n`.
    fn mixed_radix_fft(&self, input: &mut [Complex<T>], p: usize) -> Result<(), FftError> {
        let n = input.len();
        let m = n / p;
        let twiddles = self.planner.borrow_mut().get_full_twiddles(n)?;

        // Decimate in time: residue class r becomes a contiguous length-m
        // sub-transform.
        let mut cols: Vec<Complex<T>> = Vec::with_capacity(n);
        for r in 0..p {
            for j in 0..m {
                cols.push(input[j * p + r]);
            }
        }
        for r in 0..p {
            self.fft(&mut cols[r * m..(r + 1) * m])?;
        }

        // Combine: X[k] = sum_r exp(-2πi r k / n) * Y_r[k mod m].
        for (k, out) in input.iter_mut().enumerate() {
            let q = k % m;
            let mut sum = cols[q];
            for r in 1..p {
                sum = sum.add(cols[r * m + q].mul(twiddles[(r * k) % n]));
            }
            *out = sum;
        }
        Ok(())
    }

    /// Bluestein's chirp-Z transform for prime lengths: rewrites the DFT as a
    /// convolution evaluated with a power-of-two FFT.
    fn bluestein_fft(&self, input: &mut [Complex<T>]) -> Result<(), FftError> {
        let n = input.len();
        let (chirp, kernel_fft) = self.get_bluestein(n)?;
        let m = kernel_fft.len();

        let mut a: Vec<Complex<T>> = Vec::with_capacity(m);
        for (i, &x) in input.iter().enumerate() {
            a.push(x.mul(chirp[i]));
        }
        a.resize(m, Complex::zero());
        self.fft(&mut a)?;
        for (ai, &bi) in a.iter_mut().zip(kernel_fft.iter()) {
            *ai = ai.mul(bi);
        }
        self.ifft(&mut a)?;
        for (i, out) in input.iter_mut().enumerate() {
            *out = a[i].mul(chirp[i]);
        }
        Ok(())
    }

    fn get_bluestein(&self, n: usize) -> Result<BluesteinPair<T>, FftError> {
        {
            let planner = self.planner.borrow();
            if let Some(pair) = planner.bluestein_cache.get(&n) {
                return Ok((Arc::clone(&pair.0), Arc::clone(&pair.1)));
            }
        }
        let n_t = T::from_usize(n).ok_or(FftError::UnrepresentableLength)?;
        let m = (2 * n - 1).next_power_of_two();
        let mut chirp: Vec<Complex<T>> = Vec::with_capacity(n);
        let mut b: Vec<Complex<T>> = Vec::with_capacity(m);
        for i in 0..n {
            // i*i is reduced mod 2n before the float conversion; exp() has
            // period 2π = π*(2n)/n, and the reduction keeps the angle small
            // enough to stay accurate for large lengths.
            let sq = (i * i) % (2 * n);
            let sq_t = T::from_usize(sq).ok_or(FftError::UnrepresentableLength)?;
            let angle = T::pi() * sq_t / n_t;
            chirp.push(Complex::expi(-angle));
            b.push(Complex::expi(angle));
        }
        b.resize(m, Complex::zero());
        for i in 1..n {
            b[m - i] = b[i];
        }
        let mut kernel_fft = b;
        self.fft(&mut kernel_fft)?;

        let chirp_arc: Arc<[Complex<T>]> = Arc::from(chirp);
        let kernel_arc: Arc<[Complex<T>]> = Arc::from(kernel_fft);
        let mut planner = self.planner.borrow_mut();
        planner
            .bluestein_cache
            .insert(n, (Arc::clone(&chirp_arc), Arc::clone(&kernel_arc)));
        Ok((chirp_arc, kernel_arc))
    }
}

fn smallest_prime_factor(n: usize) -> usize {
    if n % 2 == 0 {
        return 2;
    }
    let mut f = 3;
    while f * f <= n {
        if n % f == 0 {
            return f;
        }
        f += 2;
    }
    n
}

impl<T: Float> FftImpl<T> for ScalarFftImpl<T> {
    fn fft(&self, input: &mut [Complex<T>]) -> Result<(), FftError> {
        let n = input.len();
        if n == 0 {
            return Err(FftError::EmptyInput);
        }
        if n == 1 {
            return Ok(());
        }
        if n.is_power_of_two() {
            return self.stockham_fft(input);
        }
        let p = smallest_prime_factor(n);
        if p == n {
            if n <= DIRECT_DFT_MAX {
                self.direct_dft(input)
            } else {
                self.bluestein_fft(input)
            }
        } else {
            self.mixed_radix_fft(input, p)
        }
    }

    fn ifft(&self, input: &mut [Complex<T>]) -> Result<(), FftError> {
        let n = input.len();
        if n == 0 {
            return Err(FftError::EmptyInput);
        }
        if n == 1 {
            return Ok(());
        }
        for c in input.iter_mut() {
            c.im = -c.im;
        }
        self.fft(input)?;
        let n_t = T::from_usize(n).ok_or(FftError::UnrepresentableLength)?;
        let scale = T::one() / n_t;
        for c in input.iter_mut() {
            c.im = -c.im;
            c.re = c.re * scale;
            c.im = c.im * scale;
        }
        Ok(())
    }
}
