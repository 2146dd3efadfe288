//! WAV boundary adapter
//!
//! The engine consumes decoded PCM; this is the seam where container bytes
//! from an upload become a [`PcmClip`]. Only integer PCM is accepted.

use std::io::Cursor;

use hound::{SampleFormat, WavReader};

use crate::audio::PcmClip;
use crate::error::DecodeError;

/// Decode WAV bytes into an integer PCM clip.
pub fn decode_wav(bytes: &[u8]) -> Result<PcmClip, DecodeError> {
    let mut reader = WavReader::new(Cursor::new(bytes))?;
    let spec = reader.spec();
    if spec.sample_format != SampleFormat::Int {
        return Err(DecodeError::UnsupportedSampleFormat);
    }

    let samples: Vec<i32> = reader.samples::<i32>().collect::<Result<_, _>>()?;
    Ok(PcmClip {
        samples,
        channels: spec.channels,
        bit_depth: spec.bits_per_sample,
        sample_rate: spec.sample_rate,
    })
}
