//! Streaming STFT/ISTFT engine for speech front ends.
//!
//! The crate is organized around a real-input FFT kernel that supports any
//! transform length, with framing, windowing, and forward/inverse
//! short-time transform layers on top, plus an incremental frame source for
//! waveform that arrives in chunks:
//!
//! - [`rfft::RealFft`]: packed real FFT for arbitrary N (mixed-radix with a
//!   Bluestein fallback for awkward prime sizes),
//! - [`window::Window`]: analysis window tables (periodic closed forms),
//! - [`frame`]: overlapping frame extraction with reflect/replicate
//!   centering,
//! - [`stft::Stft`] / [`stft::IStft`]: forward transform and weighted
//!   overlap-add inverse with envelope normalization,
//! - [`stream::StreamingFrameSource`]: chunked waveform in, windowed frames
//!   out, invariant to delivery granularity.
//!
//! `no_std` by default (with `alloc`); the `std` feature adds
//! `std::error::Error` impls.
//!
//! ```
//! use specfft::{IStft, Stft, StftConfig};
//!
//! let cfg = StftConfig::default();
//! let signal: Vec<f32> = (0..2000).map(|i| (i as f32 * 0.02).sin()).collect();
//! let spectrum = Stft::new(cfg.clone()).unwrap().forward(&signal).unwrap();
//! let recovered = IStft::new(cfg).unwrap().inverse(&spectrum).unwrap();
//! assert!((recovered[500] - signal[500]).abs() < 1e-3);
//! ```
#![no_std]
#![deny(unsafe_code)]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

pub mod fft;
pub mod frame;
pub mod num;
pub mod rfft;
pub mod stft;
pub mod stream;
pub mod window;

pub use fft::{FftError, FftImpl, FftPlanner, ScalarFftImpl};
pub use frame::PadMode;
pub use num::{Complex, Complex32, Complex64, Float};
pub use rfft::RealFft;
pub use stft::{ConfigError, IStft, Spectrum, Stft, StftConfig, StftError};
pub use stream::{FrameExtractionOptions, OptionsError, StreamError, StreamingFrameSource};
pub use window::{Window, WindowError};
