//! Error types for the fingerprinting engine

use thiserror::Error;

use crate::index::TrackId;

/// Failures while turning raw bytes or PCM into analysis frames.
///
/// Decode failures are raised before the index store is touched, so they
/// never leave partial state behind.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("unsupported bit depth: {0} (expected 8, 16, 24 or 32)")]
    UnsupportedBitDepth(u16),

    #[error("unsupported sample format: only integer PCM is accepted")]
    UnsupportedSampleFormat,

    #[error("PCM length {len} is not a multiple of the channel count {channels}")]
    MalformedPcm { len: usize, channels: u16 },

    #[error("clip contains no samples")]
    EmptyClip,

    #[error("clip too short: {samples} samples yield no analysis frames (need at least {needed})")]
    ClipTooShort { samples: usize, needed: usize },

    #[error("invalid WAV data: {0}")]
    InvalidWav(#[from] hound::Error),
}

/// Top-level error surface of the engine.
///
/// Nothing is recovered internally; every failure bubbles to the caller
/// with its originating kind preserved. An empty match set is a valid query
/// outcome and is never reported through this type.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("index store error: {0}")]
    Index(#[from] sqlx::Error),

    #[error("corrupt posting list: {0}")]
    PostingList(#[from] serde_json::Error),

    #[error("track not found: {0}")]
    TrackNotFound(TrackId),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}
