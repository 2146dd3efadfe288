//! Resona, a landmark-based audio fingerprinting engine for music
//! recognition.
//!
//! Given a decoded PCM clip the engine extracts a sparse constellation of
//! spectrogram peaks, hashes anchor/target peak pairs into compact tokens
//! and either files them under a new track id (`ingest`) or counts shared
//! tokens against a previously built index (`query`). Matching is gated by
//! a z-score so a winner must stand out of the score population instead of
//! merely having the largest count.
//!
//! # Usage
//!
//! ```no_run
//! use resona_engine::{Engine, MemoryStore, wav};
//!
//! # async fn run() -> Result<(), resona_engine::EngineError> {
//! let engine = Engine::new(Default::default(), MemoryStore::new());
//!
//! let clip = wav::decode_wav(&std::fs::read("song.wav").unwrap())?;
//! engine.ingest(&clip, "song").await?;
//!
//! let matches = engine.query(&clip).await?;
//! assert_eq!(matches, vec!["song".to_string()]);
//! # Ok(())
//! # }
//! ```

pub mod audio;
pub mod config;
pub mod database;
pub mod error;
pub mod fingerprint;
pub mod index;
pub mod scoring;
pub mod spectrogram;
pub mod wav;

use std::collections::HashMap;
use std::time::Instant;

use tracing::{debug, info};

pub use audio::PcmClip;
pub use config::{Config, DatabaseConfig, EngineConfig};
pub use database::SqliteStore;
pub use error::{DecodeError, EngineError};
pub use fingerprint::Fingerprint;
pub use index::{FingerprintStore, MemoryStore, TrackId};

/// Fingerprinting and matching engine over a pluggable index store.
///
/// The engine holds no mutable state; every invocation is a pure
/// computation over the clip plus whatever the store returns, so a single
/// instance can serve concurrent queries.
pub struct Engine<S> {
    config: EngineConfig,
    store: S,
}

impl<S: FingerprintStore> Engine<S> {
    pub fn new(config: EngineConfig, store: S) -> Self {
        Self { config, store }
    }

    /// Borrow the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run the analysis pipeline on a clip: normalize, frame, pick peaks,
    /// hash pairs. A pure function of the samples and the parameter set,
    /// two calls on the same clip yield identical token sequences.
    pub fn fingerprint(&self, clip: &PcmClip) -> Result<Vec<Fingerprint>, EngineError> {
        let mono = audio::downmix_to_mono(clip)?;
        let spec = spectrogram::compute(&mono, self.config.frame_size, self.config.hop_size)?;
        let peaks = fingerprint::find_peaks(
            &spec,
            self.config.neighborhood,
            self.config.threshold_multiplier,
        );
        let fingerprints =
            fingerprint::pair_peaks(&peaks, self.config.fanout, self.config.max_delta_t);
        debug!(
            frames = spec.num_frames(),
            peaks = peaks.len(),
            fingerprints = fingerprints.len(),
            sample_rate = clip.sample_rate,
            "clip analyzed"
        );
        Ok(fingerprints)
    }

    /// Fingerprint `clip` and persist its tokens under `title`.
    ///
    /// The store write is transactional: on failure neither the track nor
    /// any posting remains.
    pub async fn ingest(&self, clip: &PcmClip, title: &str) -> Result<TrackId, EngineError> {
        let started = Instant::now();
        let fingerprints = self.fingerprint(clip)?;
        let id = self.store.save_track(title, &fingerprints).await?;
        info!(
            track_id = id,
            title,
            fingerprints = fingerprints.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "track ingested"
        );
        Ok(id)
    }

    /// Match `clip` against the index.
    ///
    /// Returns the titles of every track tied for the highest shared-token
    /// count, or an empty list when no track stands out of the score
    /// population. An empty result is a valid outcome, not an error.
    pub async fn query(&self, clip: &PcmClip) -> Result<Vec<String>, EngineError> {
        let started = Instant::now();
        let fingerprints = self.fingerprint(clip)?;

        let mut scores: HashMap<TrackId, u32> = HashMap::new();
        for fp in &fingerprints {
            for id in self.store.lookup(&fp.hash).await? {
                *scores.entry(id).or_insert(0) += 1;
            }
        }

        let winners = scoring::rank(&scores, self.config.z_score_gate);
        let mut titles = Vec::with_capacity(winners.len());
        for id in winners {
            titles.push(self.store.title_of(id).await?);
        }
        info!(
            candidates = scores.len(),
            matches = titles.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "query scored"
        );
        Ok(titles)
    }

    /// Titles of every ingested track, in insertion order.
    pub async fn list_tracks(&self) -> Result<Vec<String>, EngineError> {
        self.store.list_titles().await
    }
}

impl Engine<SqliteStore> {
    /// Build an engine backed by the persistent store the configuration
    /// names.
    ///
    /// ```no_run
    /// # async fn run() -> Result<(), resona_engine::EngineError> {
    /// use resona_engine::{Config, Engine};
    ///
    /// let engine = Engine::from_config(Config::load()?).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn from_config(config: Config) -> Result<Self, EngineError> {
        let store = SqliteStore::connect(&config.database.url).await?;
        Ok(Self::new(config.engine, store))
    }
}
