//! PCM normalization and channel downmix

use crate::error::DecodeError;

const SUPPORTED_BIT_DEPTHS: [u16; 4] = [8, 16, 24, 32];

/// A decoded PCM clip as handed over by the container layer.
///
/// Samples are interleaved integers in the source bit depth; nothing has
/// been scaled or downmixed yet.
#[derive(Debug, Clone)]
pub struct PcmClip {
    pub samples: Vec<i32>,
    pub channels: u16,
    pub bit_depth: u16,
    pub sample_rate: u32,
}

impl PcmClip {
    /// Duration of the clip in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.channels == 0 || self.sample_rate == 0 {
            return 0.0;
        }
        (self.samples.len() as f64 / self.channels as f64) / self.sample_rate as f64
    }
}

/// Downmix to mono and scale to the unit range.
///
/// Channels are averaged per sample frame before scaling, then each value
/// is divided by `2^(bit_depth - 1)`, preserving sign. The sample rate is
/// carried along unchanged; no resampling happens anywhere in the pipeline,
/// so corpus and query clips must agree on it.
pub fn downmix_to_mono(clip: &PcmClip) -> Result<Vec<f64>, DecodeError> {
    if !SUPPORTED_BIT_DEPTHS.contains(&clip.bit_depth) {
        return Err(DecodeError::UnsupportedBitDepth(clip.bit_depth));
    }
    if clip.samples.is_empty() {
        return Err(DecodeError::EmptyClip);
    }
    if clip.channels == 0 || clip.samples.len() % clip.channels as usize != 0 {
        return Err(DecodeError::MalformedPcm {
            len: clip.samples.len(),
            channels: clip.channels,
        });
    }

    let scale = (1i64 << (clip.bit_depth - 1)) as f64;
    let channels = clip.channels as usize;
    let mono = clip
        .samples
        .chunks_exact(channels)
        .map(|frame| {
            let sum: f64 = frame.iter().map(|&s| s as f64).sum();
            sum / channels as f64 / scale
        })
        .collect();
    Ok(mono)
}
