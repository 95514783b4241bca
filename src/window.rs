//! Analysis window functions.
//!
//! All closed forms are periodic: the cosine argument divides by the window
//! length rather than `length - 1`, which is what makes overlap-add
//! reconstruction with hop = length / k exact for the cosine family.

use alloc::vec;
use alloc::vec::Vec;

/// Errors from materializing a [`Window`] selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowError {
    /// A custom coefficient table does not match the requested length.
    CustomLengthMismatch { expected: usize, got: usize },
}

impl core::fmt::Display for WindowError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            WindowError::CustomLengthMismatch { expected, got } => write!(
                f,
                "custom window has {} coefficients, expected {}",
                got, expected
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for WindowError {}

/// Window selection for framing and transforms.
#[derive(Debug, Clone, PartialEq)]
pub enum Window {
    Rectangular,
    Hann,
    /// Square root of the Hann window, used as a matched
    /// analysis/synthesis pair.
    HannSqrt,
    Hamming,
    /// Kaldi's default window, `hann^0.85`.
    Povey,
    Blackman,
    /// Caller-provided coefficients; the length must match the frame
    /// length it is built for.
    Custom(Vec<f32>),
}

impl Window {
    /// Materialize the coefficient table for a frame of `len` samples.
    pub fn build(&self, len: usize) -> Result<Vec<f32>, WindowError> {
        match self {
            Window::Rectangular => Ok(vec![1.0; len]),
            Window::Hann => Ok(hann(len)),
            Window::HannSqrt => Ok(hann_sqrt(len)),
            Window::Hamming => Ok(hamming(len)),
            Window::Povey => Ok(povey(len)),
            Window::Blackman => Ok(blackman(len)),
            Window::Custom(coeffs) => {
                if coeffs.len() != len {
                    return Err(WindowError::CustomLengthMismatch {
                        expected: len,
                        got: coeffs.len(),
                    });
                }
                Ok(coeffs.clone())
            }
        }
    }
}

#[inline]
fn phase(i: usize, len: usize) -> f32 {
    2.0 * core::f32::consts::PI * i as f32 / len as f32
}

/// Periodic Hann window: `0.5 - 0.5 cos(2πi/N)`.
pub fn hann(len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| 0.5 - 0.5 * libm::cosf(phase(i, len)))
        .collect()
}

/// Square root of the periodic Hann window.
pub fn hann_sqrt(len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| libm::sqrtf(0.5 - 0.5 * libm::cosf(phase(i, len))))
        .collect()
}

/// Periodic Hamming window: `0.54 - 0.46 cos(2πi/N)`.
pub fn hamming(len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| 0.54 - 0.46 * libm::cosf(phase(i, len)))
        .collect()
}

/// Povey window: the periodic Hann window raised to 0.85.
pub fn povey(len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| libm::powf(0.5 - 0.5 * libm::cosf(phase(i, len)), 0.85))
        .collect()
}

/// Periodic Blackman window:
/// `0.42 - 0.5 cos(2πi/N) + 0.08 cos(4πi/N)`.
pub fn blackman(len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| {
            let p = phase(i, len);
            0.42 - 0.5 * libm::cosf(p) + 0.08 * libm::cosf(2.0 * p)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hann_closed_form() {
        let w = hann(8);
        assert_eq!(w.len(), 8);
        assert!(w[0].abs() < 1e-7);
        assert!((w[4] - 1.0).abs() < 1e-6);
        // Periodic symmetry: w[i] == w[N - i] for 0 < i < N.
        for i in 1..8 {
            assert!((w[i] - w[8 - i]).abs() < 1e-6);
        }
    }

    #[test]
    fn povey_is_hann_to_085() {
        let h = hann(16);
        let p = povey(16);
        for (h, p) in h.iter().zip(p.iter()) {
            assert!((h.powf(0.85) - p).abs() < 1e-6);
        }
    }

    #[test]
    fn hann_sqrt_squares_to_hann() {
        let h = hann(10);
        let s = hann_sqrt(10);
        for (h, s) in h.iter().zip(s.iter()) {
            assert!((s * s - h).abs() < 1e-6);
        }
    }

    #[test]
    fn hamming_endpoints() {
        let w = hamming(400);
        assert!((w[0] - 0.08).abs() < 1e-6);
        assert!((w[200] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn blackman_endpoint() {
        let w = blackman(64);
        // 0.42 - 0.5 + 0.08 = 0 at the first sample.
        assert!(w[0].abs() < 1e-6);
    }

    #[test]
    fn rectangular_is_ones() {
        let w = Window::Rectangular.build(5).unwrap();
        assert_eq!(w, vec![1.0; 5]);
    }

    #[test]
    fn custom_length_checked() {
        let w = Window::Custom(vec![1.0, 2.0, 3.0]);
        assert_eq!(w.build(3).unwrap(), vec![1.0, 2.0, 3.0]);
        assert!(matches!(
            w.build(4),
            Err(WindowError::CustomLengthMismatch { expected: 4, got: 3 })
        ));
    }

    #[test]
    fn zero_length_is_empty() {
        assert!(hann(0).is_empty());
        assert!(Window::Povey.build(0).unwrap().is_empty());
    }
}
