//! Framing: slicing a signal into overlapping, optionally centered frames.
//!
//! Centered framing pads the signal virtually by `win_length / 2` samples on
//! each side so that frame `f` is centered on sample `f * hop`. Padding is
//! synthesized by index mapping into the original signal, so no padded copy
//! of the input is ever materialized.

/// How out-of-range reads are mapped back into the signal when framing
/// with `center = true`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadMode {
    /// Mirror about the boundary sample without repeating it:
    /// `[a, b, c]` extends left as `..., c, b | a, b, c`.
    Reflect,
    /// Repeat the boundary sample: `..., a, a | a, b, c`.
    Replicate,
}

/// Number of complete frames a signal of `signal_len` samples yields.
///
/// An empty signal yields zero frames even when centered; with
/// `center = false` a signal shorter than the window also yields zero.
pub fn num_frames(signal_len: usize, win_length: usize, hop: usize, center: bool) -> usize {
    debug_assert!(win_length > 0 && hop > 0);
    if signal_len == 0 {
        return 0;
    }
    let effective = if center {
        signal_len + 2 * (win_length / 2)
    } else {
        signal_len
    };
    if effective < win_length {
        return 0;
    }
    (effective - win_length) / hop + 1
}

/// Copy frame `index` of `signal` into `out` (`out.len()` is the window
/// length). Reads outside the signal are resolved through `pad_mode`;
/// callers must ensure `index < num_frames(...)`.
pub fn fill_frame(
    signal: &[f32],
    index: usize,
    hop: usize,
    center: bool,
    pad_mode: PadMode,
    out: &mut [f32],
) {
    let win_length = out.len();
    let pad = if center { (win_length / 2) as isize } else { 0 };
    let start = (index * hop) as isize - pad;
    let n = signal.len();
    debug_assert!(n > 0);
    for (j, slot) in out.iter_mut().enumerate() {
        *slot = signal[resolve(start + j as isize, n, pad_mode)];
    }
}

/// Map a possibly out-of-range position into `0..n`.
pub(crate) fn resolve(pos: isize, n: usize, pad_mode: PadMode) -> usize {
    let n = n as isize;
    if pos >= 0 && pos < n {
        return pos as usize;
    }
    match pad_mode {
        PadMode::Replicate => {
            if pos < 0 {
                0
            } else {
                (n - 1) as usize
            }
        }
        PadMode::Reflect => {
            if n == 1 {
                return 0;
            }
            // Fold until in range; short signals may need several folds.
            let mut p = pos;
            while p < 0 || p >= n {
                if p < 0 {
                    p = -p;
                }
                if p >= n {
                    p = 2 * (n - 1) - p;
                }
            }
            p as usize
        }
    }
}
