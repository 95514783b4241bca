//! Forward and inverse short-time Fourier transform.
//!
//! [`Stft`] maps a signal to a matrix of per-frame spectra; [`IStft`] maps
//! such a matrix back through weighted overlap-add. Both precompute the
//! window coefficients and the transform plan at construction and reuse
//! them across calls. A single instance reuses internal scratch, so calls
//! on one instance must not overlap across threads; independent instances
//! are fully isolated.

use alloc::vec;
use alloc::vec::Vec;

use crate::fft::FftError;
use crate::frame::{fill_frame, num_frames, PadMode};
use crate::rfft::RealFft;
use crate::window::{Window, WindowError};

/// Envelope values below this are treated as a violated overlap-add
/// condition rather than divided through.
const NOLA_EPSILON: f32 = 1e-8;

/// Construction-time validation failures for [`StftConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    ZeroNFft,
    ZeroHopLength,
    ZeroWinLength,
    WinLengthExceedsNFft { win_length: usize, n_fft: usize },
    WindowLengthMismatch { expected: usize, got: usize },
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::ZeroNFft => write!(f, "n_fft must be at least 1"),
            ConfigError::ZeroHopLength => write!(f, "hop_length must be at least 1"),
            ConfigError::ZeroWinLength => write!(f, "win_length must be at least 1"),
            ConfigError::WinLengthExceedsNFft { win_length, n_fft } => write!(
                f,
                "win_length {} exceeds n_fft {}",
                win_length, n_fft
            ),
            ConfigError::WindowLengthMismatch { expected, got } => write!(
                f,
                "window vector has {} coefficients, expected {}",
                got, expected
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

/// Call-time failures of the forward and inverse transforms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StftError {
    /// The real and imaginary planes of a spectrum disagree in size.
    Dimension {
        real_len: usize,
        imag_len: usize,
        expected: usize,
    },
    /// The spectrum's bin count does not match this instance's `n_fft`.
    BinCount { expected: usize, got: usize },
    /// The squared-window envelope vanishes somewhere in the output, so
    /// overlap-add reconstruction is undefined for this window/hop pair.
    NolaViolation { position: usize },
    Fft(FftError),
}

impl core::fmt::Display for StftError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            StftError::Dimension {
                real_len,
                imag_len,
                expected,
            } => write!(
                f,
                "spectrum planes have {} / {} entries, expected {}",
                real_len, imag_len, expected
            ),
            StftError::BinCount { expected, got } => {
                write!(f, "spectrum has {} bins, expected {}", got, expected)
            }
            StftError::NolaViolation { position } => write!(
                f,
                "window envelope vanishes at output sample {} (NOLA not satisfied)",
                position
            ),
            StftError::Fft(e) => write!(f, "fft kernel: {}", e),
        }
    }
}

impl From<FftError> for StftError {
    fn from(e: FftError) -> Self {
        StftError::Fft(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for StftError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StftError::Fft(e) => Some(e),
            _ => None,
        }
    }
}

/// Transform configuration shared by [`Stft`] and [`IStft`].
///
/// `pad_mode` only takes effect when `center` is set; uncentered framing
/// never reads outside the signal.
#[derive(Debug, Clone, PartialEq)]
pub struct StftConfig {
    pub n_fft: usize,
    pub hop_length: usize,
    pub win_length: usize,
    pub window: Window,
    pub center: bool,
    pub pad_mode: PadMode,
    pub normalized: bool,
}

impl Default for StftConfig {
    fn default() -> Self {
        Self {
            n_fft: 512,
            hop_length: 128,
            win_length: 512,
            window: Window::Hann,
            center: true,
            pad_mode: PadMode::Reflect,
            normalized: false,
        }
    }
}

impl StftConfig {
    fn validate(&self) -> Result<Vec<f32>, ConfigError> {
        if self.n_fft == 0 {
            return Err(ConfigError::ZeroNFft);
        }
        if self.hop_length == 0 {
            return Err(ConfigError::ZeroHopLength);
        }
        if self.win_length == 0 {
            return Err(ConfigError::ZeroWinLength);
        }
        if self.win_length > self.n_fft {
            return Err(ConfigError::WinLengthExceedsNFft {
                win_length: self.win_length,
                n_fft: self.n_fft,
            });
        }
        self.window.build(self.win_length).map_err(|e| match e {
            WindowError::CustomLengthMismatch { expected, got } => {
                ConfigError::WindowLengthMismatch { expected, got }
            }
        })
    }

    fn num_bins(&self) -> usize {
        self.n_fft / 2 + 1
    }
}

/// Per-frame spectra in planar row-major form: entry `(f, k)` of either
/// plane lives at `f * num_bins + k`.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    pub real: Vec<f32>,
    pub imag: Vec<f32>,
    pub num_frames: usize,
    pub num_bins: usize,
}

impl Spectrum {
    pub fn re(&self, frame: usize, bin: usize) -> f32 {
        self.real[frame * self.num_bins + bin]
    }

    pub fn im(&self, frame: usize, bin: usize) -> f32 {
        self.imag[frame * self.num_bins + bin]
    }
}

/// Forward short-time Fourier transform for one configuration.
pub struct Stft {
    config: StftConfig,
    window: Vec<f32>,
    rfft: RealFft<f32>,
}

impl Stft {
    pub fn new(config: StftConfig) -> Result<Self, ConfigError> {
        let window = config.validate()?;
        // n_fft was validated nonzero, so planning cannot fail.
        let rfft = RealFft::new(config.n_fft).map_err(|_| ConfigError::ZeroNFft)?;
        Ok(Self {
            config,
            window,
            rfft,
        })
    }

    pub fn config(&self) -> &StftConfig {
        &self.config
    }

    /// Transform `signal` into per-frame spectra. An empty signal yields a
    /// zero-frame spectrum, not an error.
    pub fn forward(&self, signal: &[f32]) -> Result<Spectrum, StftError> {
        let cfg = &self.config;
        let frames = num_frames(signal.len(), cfg.win_length, cfg.hop_length, cfg.center);
        let bins = cfg.num_bins();
        #[cfg(feature = "verbose-logging")]
        log::trace!(
            "stft forward: {} samples -> {} frames x {} bins (n_fft {})",
            signal.len(),
            frames,
            bins,
            cfg.n_fft
        );

        let mut out = Spectrum {
            real: vec![0.0; frames * bins],
            imag: vec![0.0; frames * bins],
            num_frames: frames,
            num_bins: bins,
        };
        let scale = if cfg.normalized {
            1.0 / libm::sqrtf(cfg.n_fft as f32)
        } else {
            1.0
        };

        let mut buf = vec![0.0f32; cfg.n_fft];
        for f in 0..frames {
            // Frame, taper, zero-pad left-aligned to n_fft.
            fill_frame(
                signal,
                f,
                cfg.hop_length,
                cfg.center,
                cfg.pad_mode,
                &mut buf[..cfg.win_length],
            );
            for (sample, w) in buf[..cfg.win_length].iter_mut().zip(self.window.iter()) {
                *sample *= w;
            }
            for slot in buf[cfg.win_length..].iter_mut() {
                *slot = 0.0;
            }
            self.rfft.compute(&mut buf)?;
            unpack_bins(
                &buf,
                scale,
                &mut out.real[f * bins..(f + 1) * bins],
                &mut out.imag[f * bins..(f + 1) * bins],
            );
        }
        Ok(out)
    }
}

/// Inverse short-time Fourier transform for one configuration.
pub struct IStft {
    config: StftConfig,
    window: Vec<f32>,
    rfft: RealFft<f32>,
}

impl IStft {
    pub fn new(config: StftConfig) -> Result<Self, ConfigError> {
        let window = config.validate()?;
        let rfft = RealFft::new(config.n_fft).map_err(|_| ConfigError::ZeroNFft)?;
        Ok(Self {
            config,
            window,
            rfft,
        })
    }

    pub fn config(&self) -> &StftConfig {
        &self.config
    }

    /// Reconstruct a signal by weighted overlap-add. A zero-frame spectrum
    /// yields an empty signal.
    pub fn inverse(&self, spectrum: &Spectrum) -> Result<Vec<f32>, StftError> {
        let cfg = &self.config;
        let bins = cfg.num_bins();
        if spectrum.num_bins != bins {
            return Err(StftError::BinCount {
                expected: bins,
                got: spectrum.num_bins,
            });
        }
        let expected = spectrum.num_frames * spectrum.num_bins;
        if spectrum.real.len() != expected || spectrum.imag.len() != expected {
            return Err(StftError::Dimension {
                real_len: spectrum.real.len(),
                imag_len: spectrum.imag.len(),
                expected,
            });
        }
        if spectrum.num_frames == 0 {
            return Ok(Vec::new());
        }
        #[cfg(feature = "verbose-logging")]
        log::trace!(
            "istft: {} frames x {} bins -> overlap-add (hop {})",
            spectrum.num_frames,
            spectrum.num_bins,
            cfg.hop_length
        );

        let frames = spectrum.num_frames;
        let total = (frames - 1) * cfg.hop_length + cfg.win_length;
        let mut output = vec![0.0f32; total];
        let mut envelope = vec![0.0f32; total];

        let unscale = if cfg.normalized {
            libm::sqrtf(cfg.n_fft as f32)
        } else {
            1.0
        };
        // The packed inverse returns n_fft times the segment.
        let inv_n = 1.0 / cfg.n_fft as f32;

        let mut buf = vec![0.0f32; cfg.n_fft];
        for f in 0..frames {
            pack_bins(
                &spectrum.real[f * bins..(f + 1) * bins],
                &spectrum.imag[f * bins..(f + 1) * bins],
                unscale,
                &mut buf,
            );
            self.rfft.inverse(&mut buf)?;
            let offset = f * cfg.hop_length;
            for (j, w) in self.window.iter().enumerate() {
                output[offset + j] += buf[j] * inv_n * w;
                envelope[offset + j] += w * w;
            }
        }

        let trim = if cfg.center { cfg.win_length / 2 } else { 0 };
        let end = total.saturating_sub(trim);
        let start = trim.min(end);

        // Fail fast before dividing: a vanishing envelope anywhere in the
        // surviving region means this window/hop pair cannot reconstruct.
        for (i, &e) in envelope[start..end].iter().enumerate() {
            if e < NOLA_EPSILON {
                return Err(StftError::NolaViolation { position: start + i });
            }
        }
        let mut result = Vec::with_capacity(end - start);
        for i in start..end {
            result.push(output[i] / envelope[i]);
        }
        Ok(result)
    }
}

/// Spread a packed spectrum into separate real/imag bin rows, applying
/// `scale` to every entry. DC and (for even sizes) Nyquist get a zero
/// imaginary part.
fn unpack_bins(packed: &[f32], scale: f32, real: &mut [f32], imag: &mut [f32]) {
    let n = packed.len();
    real[0] = packed[0] * scale;
    imag[0] = 0.0;
    if n % 2 == 0 {
        for k in 1..n / 2 {
            real[k] = packed[2 * k] * scale;
            imag[k] = packed[2 * k + 1] * scale;
        }
        real[n / 2] = packed[1] * scale;
        imag[n / 2] = 0.0;
    } else {
        for k in 1..=(n - 1) / 2 {
            real[k] = packed[2 * k - 1] * scale;
            imag[k] = packed[2 * k] * scale;
        }
    }
}

/// Inverse of [`unpack_bins`]: rebuild the packed layout from bin rows,
/// applying `scale` to every entry.
fn pack_bins(real: &[f32], imag: &[f32], scale: f32, packed: &mut [f32]) {
    let n = packed.len();
    packed[0] = real[0] * scale;
    if n % 2 == 0 {
        packed[1] = real[n / 2] * scale;
        for k in 1..n / 2 {
            packed[2 * k] = real[k] * scale;
            packed[2 * k + 1] = imag[k] * scale;
        }
    } else {
        for k in 1..=(n - 1) / 2 {
            packed[2 * k - 1] = real[k] * scale;
            packed[2 * k] = imag[k] * scale;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(cfg: StftConfig, signal: &[f32]) -> Vec<f32> {
        let stft = Stft::new(cfg.clone()).unwrap();
        let istft = IStft::new(cfg).unwrap();
        let spec = stft.forward(signal).unwrap();
        istft.inverse(&spec).unwrap()
    }

    fn ramp(n: usize) -> Vec<f32> {
        (0..n).map(|i| (i as f32 * 0.11).sin() * 3.0).collect()
    }

    #[test]
    fn single_rectangular_frame_reconstructs_head() {
        let signal = [
            1.0, 0.0, -2.0, 5.0, 9.0, -3.0, 2.5, 4.0, -1.0, 0.5, 3.5, -5.0, 6.5, 7.0, -2.75,
            8.0, 12.0, -13.0,
        ];
        let cfg = StftConfig {
            n_fft: 16,
            hop_length: 4,
            win_length: 16,
            window: Window::Rectangular,
            center: false,
            pad_mode: PadMode::Reflect,
            normalized: false,
        };
        let stft = Stft::new(cfg.clone()).unwrap();
        let spec = stft.forward(&signal).unwrap();
        assert_eq!(spec.num_frames, 1);
        assert_eq!(spec.num_bins, 9);
        let out = IStft::new(cfg).unwrap().inverse(&spec).unwrap();
        assert_eq!(out.len(), 16);
        for (got, want) in out.iter().zip(signal.iter()) {
            assert!((got - want).abs() < 1e-3, "{} vs {}", got, want);
        }
    }

    #[test]
    fn centered_hann_roundtrip() {
        for &n_fft in &[6usize, 10, 64, 400] {
            let cfg = StftConfig {
                n_fft,
                hop_length: (n_fft / 4).max(1),
                win_length: n_fft,
                window: Window::Hann,
                center: true,
                pad_mode: PadMode::Reflect,
                normalized: false,
            };
            let signal = ramp(n_fft * 3 + 7);
            let out = roundtrip(cfg, &signal);
            assert_eq!(out.len(), {
                let frames = num_frames(signal.len(), n_fft, (n_fft / 4).max(1), true);
                (frames - 1) * (n_fft / 4).max(1) + n_fft - 2 * (n_fft / 2)
            });
            let common = out.len().min(signal.len());
            for i in 0..common {
                assert!(
                    (out[i] - signal[i]).abs() < 1e-2,
                    "n_fft {}: sample {}: {} vs {}",
                    n_fft,
                    i,
                    out[i],
                    signal[i]
                );
            }
        }
    }

    #[test]
    fn normalized_roundtrip_matches_unnormalized() {
        let base = StftConfig {
            n_fft: 32,
            hop_length: 8,
            win_length: 32,
            window: Window::HannSqrt,
            center: true,
            pad_mode: PadMode::Replicate,
            normalized: false,
        };
        let signal = ramp(100);
        let plain = roundtrip(base.clone(), &signal);
        let normalized = roundtrip(
            StftConfig {
                normalized: true,
                ..base
            },
            &signal,
        );
        assert_eq!(plain.len(), normalized.len());
        for (a, b) in plain.iter().zip(normalized.iter()) {
            assert!((a - b).abs() < 1e-4);
        }
    }

    #[test]
    fn normalized_scales_spectrum() {
        let signal = ramp(64);
        let mut cfg = StftConfig {
            n_fft: 16,
            hop_length: 4,
            win_length: 16,
            window: Window::Hann,
            center: false,
            pad_mode: PadMode::Reflect,
            normalized: false,
        };
        let plain = Stft::new(cfg.clone()).unwrap().forward(&signal).unwrap();
        cfg.normalized = true;
        let scaled = Stft::new(cfg).unwrap().forward(&signal).unwrap();
        let k = 1.0 / 4.0; // 1/sqrt(16)
        for (p, s) in plain.real.iter().zip(scaled.real.iter()) {
            assert!((p * k - s).abs() < 1e-5);
        }
    }

    #[test]
    fn short_window_is_zero_padded() {
        let cfg = StftConfig {
            n_fft: 16,
            hop_length: 4,
            win_length: 8,
            window: Window::Hann,
            center: true,
            pad_mode: PadMode::Reflect,
            normalized: false,
        };
        let signal = ramp(40);
        let out = roundtrip(cfg, &signal);
        for (i, (got, want)) in out.iter().zip(signal.iter()).enumerate() {
            assert!((got - want).abs() < 1e-2, "sample {}: {} vs {}", i, got, want);
        }
    }

    #[test]
    fn empty_signal_gives_zero_frames() {
        let stft = Stft::new(StftConfig::default()).unwrap();
        let spec = stft.forward(&[]).unwrap();
        assert_eq!(spec.num_frames, 0);
        assert!(spec.real.is_empty());
        let out = IStft::new(StftConfig::default()).unwrap().inverse(&spec).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn dc_and_nyquist_have_zero_imag() {
        let cfg = StftConfig {
            n_fft: 16,
            hop_length: 4,
            win_length: 16,
            window: Window::Hamming,
            center: true,
            pad_mode: PadMode::Reflect,
            normalized: false,
        };
        let spec = Stft::new(cfg).unwrap().forward(&ramp(50)).unwrap();
        for f in 0..spec.num_frames {
            assert_eq!(spec.im(f, 0), 0.0);
            assert_eq!(spec.im(f, spec.num_bins - 1), 0.0);
        }
    }

    #[test]
    fn gapped_hops_violate_nola() {
        // hop > win with a tapered window leaves zero-envelope gaps.
        let cfg = StftConfig {
            n_fft: 8,
            hop_length: 12,
            win_length: 8,
            window: Window::Hann,
            center: false,
            pad_mode: PadMode::Reflect,
            normalized: false,
        };
        let signal = ramp(40);
        let spec = Stft::new(cfg.clone()).unwrap().forward(&signal).unwrap();
        assert!(spec.num_frames >= 2);
        let err = IStft::new(cfg).unwrap().inverse(&spec).unwrap_err();
        assert!(matches!(err, StftError::NolaViolation { .. }));
    }

    #[test]
    fn config_validation() {
        let ok = StftConfig::default();
        assert!(Stft::new(ok.clone()).is_ok());
        assert_eq!(
            Stft::new(StftConfig { n_fft: 0, ..ok.clone() }).err().unwrap(),
            ConfigError::ZeroNFft
        );
        assert_eq!(
            Stft::new(StftConfig {
                hop_length: 0,
                ..ok.clone()
            })
            .err()
            .unwrap(),
            ConfigError::ZeroHopLength
        );
        assert_eq!(
            Stft::new(StftConfig {
                win_length: 600,
                ..ok.clone()
            })
            .err()
            .unwrap(),
            ConfigError::WinLengthExceedsNFft {
                win_length: 600,
                n_fft: 512
            }
        );
        assert_eq!(
            Stft::new(StftConfig {
                window: Window::Custom(vec![1.0; 100]),
                ..ok
            })
            .err()
            .unwrap(),
            ConfigError::WindowLengthMismatch {
                expected: 512,
                got: 100
            }
        );
    }

    #[test]
    fn bin_count_mismatch_rejected() {
        let istft = IStft::new(StftConfig::default()).unwrap();
        let bogus = Spectrum {
            real: vec![0.0; 10],
            imag: vec![0.0; 10],
            num_frames: 1,
            num_bins: 10,
        };
        assert!(matches!(
            istft.inverse(&bogus).unwrap_err(),
            StftError::BinCount { expected: 257, got: 10 }
        ));
    }

    #[test]
    fn plane_size_mismatch_rejected() {
        let istft = IStft::new(StftConfig::default()).unwrap();
        let bogus = Spectrum {
            real: vec![0.0; 257],
            imag: vec![0.0; 256],
            num_frames: 1,
            num_bins: 257,
        };
        assert!(matches!(
            istft.inverse(&bogus).unwrap_err(),
            StftError::Dimension { .. }
        ));
    }
}
