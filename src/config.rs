//! Configuration for the engine and its store

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub engine: EngineConfig,
    pub database: DatabaseConfig,
}

/// Analysis parameters.
///
/// These are part of the on-disk contract: fingerprints written under one
/// parameter set are not matchable under another, so changing any of them
/// invalidates an existing index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Samples per analysis frame.
    pub frame_size: usize,
    /// Stride between successive frames.
    pub hop_size: usize,
    /// Half-width of the square region a peak must dominate.
    pub neighborhood: usize,
    /// Successor peaks paired with each anchor.
    pub fanout: usize,
    /// Largest frame delta a pair may span.
    pub max_delta_t: usize,
    /// Factor applied to the mean magnitude for the peak energy floor.
    pub threshold_multiplier: f64,
    /// Standard deviations the winning score must clear.
    pub z_score_gate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            frame_size: 2048,
            hop_size: 1024,
            neighborhood: 8,
            fanout: 5,
            max_delta_t: 200,
            threshold_multiplier: 2.0,
            z_score_gate: 1.0,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:resona.db".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from an optional `resona.toml` in the working
    /// directory and `RESONA_`-prefixed environment variables, layered over
    /// the defaults.
    pub fn load() -> Result<Self, config::ConfigError> {
        let defaults = config::Config::try_from(&Config::default())?;
        config::Config::builder()
            .add_source(defaults)
            .add_source(config::File::with_name("resona").required(false))
            .add_source(
                config::Environment::with_prefix("RESONA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_carry_the_analysis_parameters() {
        let config = EngineConfig::default();
        assert_eq!(config.frame_size, 2048);
        assert_eq!(config.hop_size, 1024);
        assert_eq!(config.neighborhood, 8);
        assert_eq!(config.fanout, 5);
        assert_eq!(config.max_delta_t, 200);
        assert_eq!(config.threshold_multiplier, 2.0);
        assert_eq!(config.z_score_gate, 1.0);
    }

    #[test]
    fn defaults_are_internally_consistent() {
        let config = Config::default();
        assert_eq!(config.engine.hop_size * 2, config.engine.frame_size);
        assert!(config.engine.fanout > 0);
        assert!(!config.database.url.is_empty());
    }
}
