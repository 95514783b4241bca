//! Real-input FFT with a packed in-place layout, for arbitrary lengths.
//!
//! The packed layout stores the non-redundant half of a real signal's
//! spectrum in the same `n` slots as the input:
//!
//! - even `n`: `[X0.re, X(n/2).re, X1.re, X1.im, X2.re, X2.im, ...]`
//!   (DC and Nyquist are purely real for real input, so their imaginary
//!   slots are reused),
//! - odd `n`: `[X0.re, X1.re, X1.im, X2.re, X2.im, ...]` up to bin
//!   `(n-1)/2` (no Nyquist bin exists).
//!
//! Neither direction applies any normalization: `inverse(compute(x))`
//! returns `n * x` and the caller decides between `1/n` and `1/sqrt(n)`
//! conventions.
//!
//! Even lengths go through a half-size complex FFT with Hermitian
//! untangling; odd lengths fall back to a full-length complex transform of
//! the zero-imaginary input.

use alloc::vec::Vec;
use core::cell::RefCell;

use crate::fft::{FftError, FftImpl, ScalarFftImpl};
use crate::num::{Complex, Float};

/// Packed real FFT planned for a fixed transform length.
///
/// Construction precomputes the untangling twiddles for the configured
/// length; `compute`/`inverse` then run without recomputing trigonometry.
/// The internal scratch buffer is reused across calls, so a single instance
/// must not be used from multiple threads concurrently.
pub struct RealFft<T: Float> {
    n: usize,
    fft: ScalarFftImpl<T>,
    /// `exp(-πi k / (n/2))` for `k = 0..n/2`; empty for odd `n`.
    pack_twiddles: Vec<Complex<T>>,
    scratch: RefCell<Vec<Complex<T>>>,
}

impl<T: Float> RealFft<T> {
    pub fn new(n: usize) -> Result<Self, FftError> {
        if n == 0 {
            return Err(FftError::EmptyInput);
        }
        let mut pack_twiddles = Vec::new();
        if n % 2 == 0 {
            let m = n / 2;
            let m_t = T::from_usize(m).ok_or(FftError::UnrepresentableLength)?;
            pack_twiddles.reserve(m);
            for k in 0..m {
                let k_t = T::from_usize(k).ok_or(FftError::UnrepresentableLength)?;
                pack_twiddles.push(Complex::expi(-(T::pi() * k_t) / m_t));
            }
        } else {
            // Odd lengths use the full complex path; validate representability
            // up front so compute/inverse cannot fail on length conversion.
            T::from_usize(n).ok_or(FftError::UnrepresentableLength)?;
        }
        Ok(Self {
            n,
            fft: ScalarFftImpl::default(),
            pack_twiddles,
            scratch: RefCell::new(Vec::new()),
        })
    }

    /// Transform length this instance was planned for, always at least 1.
    pub fn size(&self) -> usize {
        self.n
    }

    /// Forward transform: replaces `in_out` (real samples) with the packed
    /// spectrum. Matches the non-redundant bins of the standard DFT
    /// `X_k = Σ x_j · exp(-2πi jk / n)`.
    pub fn compute(&self, in_out: &mut [T]) -> Result<(), FftError> {
        if in_out.len() != self.n {
            return Err(FftError::MismatchedLengths);
        }
        if self.n == 1 {
            return Ok(());
        }
        if self.n % 2 == 0 {
            self.compute_even(in_out)
        } else {
            self.compute_odd(in_out)
        }
    }

    /// Inverse transform: replaces `in_out` (packed spectrum) with `n` times
    /// the real time-domain signal. The caller applies `1/n`.
    pub fn inverse(&self, in_out: &mut [T]) -> Result<(), FftError> {
        if in_out.len() != self.n {
            return Err(FftError::MismatchedLengths);
        }
        if self.n == 1 {
            return Ok(());
        }
        if self.n % 2 == 0 {
            self.inverse_even(in_out)
        } else {
            self.inverse_odd(in_out)
        }
    }

    fn compute_even(&self, in_out: &mut [T]) -> Result<(), FftError> {
        let m = self.n / 2;
        let mut buf = self.scratch.borrow_mut();
        buf.clear();
        buf.reserve(m);
        // View the real input as m interleaved complex samples.
        for i in 0..m {
            buf.push(Complex::new(in_out[2 * i], in_out[2 * i + 1]));
        }
        self.fft.fft(&mut buf[..m])?;

        // Untangle the two interleaved real sequences. With Y the half-size
        // transform and w_k = exp(-πi k / m):
        //   X_k = (Y_k + conj(Y_{m-k}))/2 - i*w_k*(Y_k - conj(Y_{m-k}))/2
        let y0 = buf[0];
        in_out[0] = y0.re + y0.im;
        in_out[1] = y0.re - y0.im;
        let half = T::from_f32(0.5);
        for k in 1..m {
            let a = buf[k];
            let b = buf[m - k].conj();
            let sum = a.add(b);
            let diff = a.sub(b);
            let t = self.pack_twiddles[k].mul(diff);
            // sum - i*t, halved
            in_out[2 * k] = (sum.re + t.im) * half;
            in_out[2 * k + 1] = (sum.im - t.re) * half;
        }
        Ok(())
    }

    fn inverse_even(&self, in_out: &mut [T]) -> Result<(), FftError> {
        let m = self.n / 2;
        let mut buf = self.scratch.borrow_mut();
        buf.clear();
        buf.resize(m, Complex::zero());

        // Repack the spectrum halves into the half-size complex domain. The
        // forward untangle halves each bin, so this direction doubles; with
        // the unscaled conjugate-forward-conjugate inverse below, the overall
        // round trip comes out at exactly n times the input.
        buf[0] = Complex::new(in_out[0] + in_out[1], in_out[0] - in_out[1]);
        for k in 1..m {
            let a = Complex::new(in_out[2 * k], in_out[2 * k + 1]);
            let b = Complex::new(in_out[2 * (m - k)], -in_out[2 * (m - k) + 1]);
            let sum = a.add(b);
            let diff = a.sub(b);
            let t = self.pack_twiddles[k].conj().mul(diff);
            // sum + i*t
            buf[k] = Complex::new(sum.re - t.im, sum.im + t.re);
        }

        // Unscaled inverse: conj -> forward -> conj leaves a factor of m.
        for c in buf.iter_mut() {
            c.im = -c.im;
        }
        self.fft.fft(&mut buf[..m])?;
        for i in 0..m {
            in_out[2 * i] = buf[i].re;
            in_out[2 * i + 1] = -buf[i].im;
        }
        Ok(())
    }

    fn compute_odd(&self, in_out: &mut [T]) -> Result<(), FftError> {
        let n = self.n;
        let mut buf = self.scratch.borrow_mut();
        buf.clear();
        buf.reserve(n);
        for &x in in_out.iter() {
            buf.push(Complex::new(x, T::zero()));
        }
        self.fft.fft(&mut buf[..n])?;
        in_out[0] = buf[0].re;
        for k in 1..=(n - 1) / 2 {
            in_out[2 * k - 1] = buf[k].re;
            in_out[2 * k] = buf[k].im;
        }
        Ok(())
    }

    fn inverse_odd(&self, in_out: &mut [T]) -> Result<(), FftError> {
        let n = self.n;
        let mut buf = self.scratch.borrow_mut();
        buf.clear();
        buf.resize(n, Complex::zero());
        // Rebuild the full Hermitian spectrum from the packed half.
        buf[0] = Complex::new(in_out[0], T::zero());
        for k in 1..=(n - 1) / 2 {
            let c = Complex::new(in_out[2 * k - 1], in_out[2 * k]);
            buf[k] = c;
            buf[n - k] = c.conj();
        }
        // Unscaled inverse of a Hermitian spectrum: conj -> forward gives the
        // real signal times n directly.
        for c in buf.iter_mut() {
            c.im = -c.im;
        }
        self.fft.fft(&mut buf[..n])?;
        for (out, c) in in_out.iter_mut().zip(buf.iter()) {
            *out = c.re;
        }
        Ok(())
    }
}
