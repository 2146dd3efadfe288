//! Short-time Fourier analysis
//!
//! Frames the mono signal with a 50% overlap, applies a Hann window and
//! keeps the magnitude of the positive-frequency bins per frame.

use ndarray::Array2;
use rayon::prelude::*;
use rustfft::{num_complex::Complex, FftPlanner};

use crate::error::DecodeError;

/// Magnitude spectrogram, one row per frame.
///
/// Stored as a single contiguous buffer; `mags[[t, f]]` is the magnitude
/// of bin `f` in frame `t`. All values are non-negative and finite.
#[derive(Debug, Clone)]
pub struct Spectrogram {
    pub mags: Array2<f64>,
}

impl Spectrogram {
    pub fn num_frames(&self) -> usize {
        self.mags.nrows()
    }

    pub fn num_bins(&self) -> usize {
        self.mags.ncols()
    }
}

fn hann_window(frame_size: usize) -> Vec<f64> {
    use std::f64::consts::PI;
    (0..frame_size)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f64 / (frame_size - 1) as f64).cos()))
        .collect()
}

/// Compute the magnitude spectrogram of `samples`.
///
/// `num_frames = (len - frame_size) / hop_size`; a signal yielding zero
/// frames cannot be fingerprinted and is rejected. Each frame is windowed
/// on its own scratch buffer because adjacent frames share half of their
/// samples; the input is never mutated.
pub fn compute(
    samples: &[f64],
    frame_size: usize,
    hop_size: usize,
) -> Result<Spectrogram, DecodeError> {
    let num_frames = samples.len().saturating_sub(frame_size) / hop_size;
    if num_frames == 0 {
        return Err(DecodeError::ClipTooShort {
            samples: samples.len(),
            needed: frame_size + hop_size,
        });
    }

    let bins = frame_size / 2;
    let window = hann_window(frame_size);
    let fft = FftPlanner::new().plan_fft_forward(frame_size);

    // Frames are independent, so rows can be computed in parallel; indexed
    // collection keeps them in frame order.
    let rows: Vec<Vec<f64>> = (0..num_frames)
        .into_par_iter()
        .map(|t| {
            let start = t * hop_size;
            let mut buffer: Vec<Complex<f64>> = samples[start..start + frame_size]
                .iter()
                .zip(&window)
                .map(|(&s, &w)| Complex::new(s * w, 0.0))
                .collect();
            fft.process(&mut buffer);
            buffer[..bins].iter().map(|c| c.norm()).collect()
        })
        .collect();

    let mut mags = Array2::zeros((num_frames, bins));
    for (t, row) in rows.into_iter().enumerate() {
        for (f, magnitude) in row.into_iter().enumerate() {
            mags[[t, f]] = magnitude;
        }
    }
    Ok(Spectrogram { mags })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_count_follows_hop_arithmetic() {
        let samples = vec![0.0; 2048 + 1024 * 3];
        let spec = compute(&samples, 2048, 1024).unwrap();
        assert_eq!(spec.num_frames(), 3);
        assert_eq!(spec.num_bins(), 1024);
    }

    #[test]
    fn zero_signal_yields_zero_magnitudes() {
        let spec = compute(&vec![0.0; 8192], 2048, 1024).unwrap();
        assert!(spec.mags.iter().all(|&m| m == 0.0));
    }

    #[test]
    fn signals_below_one_frame_are_rejected() {
        assert!(matches!(
            compute(&[0.0; 2048], 2048, 1024),
            Err(DecodeError::ClipTooShort { samples: 2048, .. })
        ));
        assert!(matches!(
            compute(&[], 2048, 1024),
            Err(DecodeError::ClipTooShort { .. })
        ));
    }

    #[test]
    fn sine_energy_lands_in_the_expected_bin() {
        let sample_rate = 44_100.0;
        let freq = 440.0;
        let samples: Vec<f64> = (0..44_100)
            .map(|i| (2.0 * std::f64::consts::PI * freq * i as f64 / sample_rate).sin())
            .collect();
        let spec = compute(&samples, 2048, 1024).unwrap();

        let row = spec.mags.row(spec.num_frames() / 2);
        let max_bin = row
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .unwrap()
            .0;
        let expected = (freq * 2048.0 / sample_rate).round() as usize;
        assert!(max_bin.abs_diff(expected) <= 1);
        assert!(spec.mags.iter().all(|&m| m.is_finite() && m >= 0.0));
    }

    #[test]
    fn windowing_leaves_the_input_untouched() {
        let samples: Vec<f64> = (0..8192).map(|i| (i as f64 * 0.01).sin()).collect();
        let before = samples.clone();
        compute(&samples, 2048, 1024).unwrap();
        assert_eq!(samples, before);
    }
}
