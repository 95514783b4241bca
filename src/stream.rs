//! Streaming frame extraction: windowed frames from waveform arriving in
//! chunks.
//!
//! [`StreamingFrameSource`] accepts waveform incrementally, computes each
//! frame exactly once as soon as all of its samples have arrived, and keeps
//! computed frames in an index-addressable store for repeated reads. Because
//! frames are produced in order from the same sample positions regardless of
//! how the waveform was chunked, results are independent of delivery
//! granularity.

use alloc::vec::Vec;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::frame::{resolve, PadMode};
use crate::window::{Window, WindowError};

/// Construction-time validation failures for [`FrameExtractionOptions`].
#[derive(Debug, Clone, PartialEq)]
pub enum OptionsError {
    NonPositiveSampleRate,
    ZeroFrameLength,
    ZeroFrameShift,
    Window(WindowError),
}

impl core::fmt::Display for OptionsError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            OptionsError::NonPositiveSampleRate => write!(f, "sample rate must be positive"),
            OptionsError::ZeroFrameLength => {
                write!(f, "frame length must cover at least one sample")
            }
            OptionsError::ZeroFrameShift => {
                write!(f, "frame shift must cover at least one sample")
            }
            OptionsError::Window(e) => write!(f, "window: {}", e),
        }
    }
}

impl From<WindowError> for OptionsError {
    fn from(e: WindowError) -> Self {
        OptionsError::Window(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for OptionsError {}

/// Call-time failures of the streaming source.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamError {
    /// A chunk arrived with a sample rate different from the configured one.
    SampleRateMismatch { expected: f32, got: f32 },
    /// Waveform arrived after `input_finished`.
    InputFinished,
}

impl core::fmt::Display for StreamError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            StreamError::SampleRateMismatch { expected, got } => {
                write!(f, "expected sample rate {}, got {}", expected, got)
            }
            StreamError::InputFinished => {
                write!(f, "waveform delivered after input_finished")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for StreamError {}

/// Framing options for the streaming source, in the conventional
/// milliseconds-at-a-sample-rate form.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameExtractionOptions {
    pub samp_freq: f32,
    pub frame_length_ms: f32,
    pub frame_shift_ms: f32,
    pub window: Window,
    /// When set, count only frames that fit entirely inside the waveform.
    /// Otherwise frames are centered at `f * shift + shift / 2` and edge
    /// samples are synthesized by reflection once the input is finished.
    pub snip_edges: bool,
    /// Standard deviation of Gaussian noise added to each frame's samples
    /// before windowing; zero disables dithering.
    pub dither: f32,
}

impl Default for FrameExtractionOptions {
    fn default() -> Self {
        Self {
            samp_freq: 16_000.0,
            frame_length_ms: 25.0,
            frame_shift_ms: 10.0,
            window: Window::Povey,
            snip_edges: true,
            dither: 0.0,
        }
    }
}

impl FrameExtractionOptions {
    pub fn window_size(&self) -> usize {
        (self.samp_freq * 0.001 * self.frame_length_ms) as usize
    }

    pub fn window_shift(&self) -> usize {
        (self.samp_freq * 0.001 * self.frame_shift_ms) as usize
    }

    fn validate(&self) -> Result<Vec<f32>, OptionsError> {
        if !(self.samp_freq > 0.0) {
            return Err(OptionsError::NonPositiveSampleRate);
        }
        if self.window_size() == 0 {
            return Err(OptionsError::ZeroFrameLength);
        }
        if self.window_shift() == 0 {
            return Err(OptionsError::ZeroFrameShift);
        }
        Ok(self.window.build(self.window_size())?)
    }
}

/// Incremental frame source over chunked waveform input.
pub struct StreamingFrameSource {
    opts: FrameExtractionOptions,
    window: Vec<f32>,
    /// Unconsumed waveform tail; absolute sample `i` lives at
    /// `samples[i - offset]`.
    samples: Vec<f32>,
    offset: usize,
    frames: Vec<Vec<f32>>,
    flushed: bool,
    rng: SmallRng,
}

impl StreamingFrameSource {
    pub fn new(opts: FrameExtractionOptions) -> Result<Self, OptionsError> {
        let window = opts.validate()?;
        Ok(Self {
            opts,
            window,
            samples: Vec::new(),
            offset: 0,
            frames: Vec::new(),
            flushed: false,
            rng: SmallRng::seed_from_u64(0x5eed),
        })
    }

    pub fn options(&self) -> &FrameExtractionOptions {
        &self.opts
    }

    /// Append newly arrived samples and compute every frame that is now
    /// complete.
    pub fn accept_waveform(&mut self, sample_rate: f32, chunk: &[f32]) -> Result<(), StreamError> {
        if self.flushed {
            return Err(StreamError::InputFinished);
        }
        if sample_rate != self.opts.samp_freq {
            return Err(StreamError::SampleRateMismatch {
                expected: self.opts.samp_freq,
                got: sample_rate,
            });
        }
        self.samples.extend_from_slice(chunk);
        self.compute_ready_frames();
        Ok(())
    }

    /// Number of frames currently retrievable through [`get_frame`].
    ///
    /// [`get_frame`]: StreamingFrameSource::get_frame
    pub fn num_frames_ready(&self) -> usize {
        self.frames.len()
    }

    /// Retrieve a previously computed frame by index. Frames are retained,
    /// so any index below `num_frames_ready` stays readable.
    pub fn get_frame(&self, index: usize) -> Option<&[f32]> {
        self.frames.get(index).map(|f| f.as_slice())
    }

    /// Mark the input complete. With `snip_edges = false` this computes the
    /// trailing frames whose right edge extends past the waveform,
    /// synthesizing the missing samples by reflection; with
    /// `snip_edges = true` it is a no-op on the frame count.
    pub fn input_finished(&mut self) {
        if self.flushed {
            return;
        }
        self.flushed = true;
        self.compute_ready_frames();
    }

    fn total_samples(&self) -> usize {
        self.offset + self.samples.len()
    }

    /// First (possibly negative) sample position of frame `f`.
    fn first_sample(&self, f: usize) -> isize {
        let shift = self.opts.window_shift() as isize;
        let len = self.opts.window_size() as isize;
        if self.opts.snip_edges {
            f as isize * shift
        } else {
            f as isize * shift + shift / 2 - len / 2
        }
    }

    /// Total frame count for the waveform seen so far, under the final
    /// (flushed) counting rule.
    fn total_frame_count(&self) -> usize {
        let n = self.total_samples();
        let len = self.opts.window_size();
        let shift = self.opts.window_shift();
        if self.opts.snip_edges {
            if n < len {
                0
            } else {
                (n - len) / shift + 1
            }
        } else {
            (n + shift / 2) / shift
        }
    }

    fn compute_ready_frames(&mut self) {
        let n = self.total_samples();
        let len = self.opts.window_size();
        let limit = self.total_frame_count();
        loop {
            let f = self.frames.len();
            if f >= limit {
                break;
            }
            let first = self.first_sample(f);
            // Before the flush, only frames whose samples have all arrived.
            if !self.flushed && first + len as isize > n as isize {
                break;
            }
            self.compute_frame(f);
        }
        self.trim_consumed();
    }

    fn compute_frame(&mut self, f: usize) {
        let n = self.total_samples();
        let first = self.first_sample(f);
        let mut frame = Vec::with_capacity(self.window.len());
        for j in 0..self.window.len() {
            let pos = resolve(first + j as isize, n, PadMode::Reflect);
            debug_assert!(pos >= self.offset);
            frame.push(self.samples[pos - self.offset]);
        }
        if self.opts.dither > 0.0 {
            let dither = self.opts.dither;
            for sample in frame.iter_mut() {
                *sample += rand_gauss(&mut self.rng) * dither;
            }
        }
        for (sample, w) in frame.iter_mut().zip(self.window.iter()) {
            *sample *= w;
        }
        self.frames.push(frame);
    }

    /// Drop samples no future frame can read. The last `window_size`
    /// samples are always kept so end-of-input reflection stays in range.
    fn trim_consumed(&mut self) {
        if self.flushed {
            self.offset = self.total_samples();
            self.samples.clear();
            return;
        }
        let n = self.total_samples();
        let len = self.opts.window_size();
        let next_first = self.first_sample(self.frames.len()).max(0) as usize;
        let keep_from = next_first.min(n.saturating_sub(len));
        if keep_from > self.offset {
            let drop = keep_from - self.offset;
            self.samples.drain(..drop);
            self.offset = keep_from;
        }
    }
}

/// Standard normal sample via the Box-Muller transform.
fn rand_gauss(rng: &mut SmallRng) -> f32 {
    let u1: f32 = 1.0 - rng.gen::<f32>();
    let u2: f32 = rng.gen();
    libm::sqrtf(-2.0 * libm::logf(u1)) * libm::cosf(2.0 * core::f32::consts::PI * u2)
}
