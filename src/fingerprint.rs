//! Constellation peak extraction and combinatorial pair hashing
//!
//! Peaks are time-frequency local maxima above an adaptive energy floor.
//! Each anchor peak is paired with a small fanout of successors; the pair
//! `(f1, f2, dt)` becomes a hash token keyed by the anchor's frame.

use crate::spectrogram::Spectrogram;

const DB_EPSILON: f64 = 1e-12;

/// Magnitude to decibels, floored so silence stays finite.
pub fn to_decibel(magnitude: f64) -> f64 {
    20.0 * (magnitude + DB_EPSILON).log10()
}

/// A time-frequency landmark: frame index and bin index of a local maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Peak {
    pub time: usize,
    pub freq: usize,
}

/// A single hash token tied to the frame of its anchor peak.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    pub hash: String,
    pub time_anchor: usize,
}

/// The stable wire form of a peak pair.
///
/// Three decimal fields joined by dots; clips ingested by one build must
/// stay matchable by later builds, so this format never changes.
pub fn hash_peak(f1: usize, f2: usize, delta_t: usize) -> String {
    format!("{}.{}.{}", f1, f2, delta_t)
}

/// Inverse of [`hash_peak`]. Returns `None` for anything malformed.
pub fn parse_hash(hash: &str) -> Option<(usize, usize, usize)> {
    let mut parts = hash.split('.');
    let f1 = parts.next()?.parse().ok()?;
    let f2 = parts.next()?.parse().ok()?;
    let delta_t = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((f1, f2, delta_t))
}

/// Extract constellation peaks from the spectrogram.
///
/// The energy floor is `20·log10(2·mean + eps)` over the whole spectrogram.
/// A cell is a peak when it clears the floor and no cell within the square
/// neighborhood is strictly louder; equal neighbors both stand. The border
/// band is skipped so every neighborhood lookup stays in range.
///
/// Peaks come out in row-major order (time, then bin). Pairing relies on
/// that ordering.
pub fn find_peaks(spec: &Spectrogram, neighborhood: usize, threshold_multiplier: f64) -> Vec<Peak> {
    let frames = spec.num_frames();
    let bins = spec.num_bins();
    if frames <= 2 * neighborhood || bins <= 2 * neighborhood {
        return Vec::new();
    }

    let mean = spec.mags.mean().unwrap_or(0.0);
    let threshold_db = to_decibel(mean * threshold_multiplier);
    let reach = neighborhood as isize;

    let mut peaks = Vec::new();
    for t in neighborhood..frames - neighborhood {
        for f in neighborhood..bins - neighborhood {
            let magnitude_db = to_decibel(spec.mags[[t, f]]);
            if magnitude_db < threshold_db {
                continue;
            }

            let mut local_max = true;
            'neighbors: for dt in -reach..=reach {
                for df in -reach..=reach {
                    if dt == 0 && df == 0 {
                        continue;
                    }
                    let neighbor =
                        spec.mags[[(t as isize + dt) as usize, (f as isize + df) as usize]];
                    if to_decibel(neighbor) > magnitude_db {
                        local_max = false;
                        break 'neighbors;
                    }
                }
            }

            if local_max {
                peaks.push(Peak { time: t, freq: f });
            }
        }
    }
    peaks
}

/// Pair each anchor with up to `fanout` successor peaks.
///
/// Only pairs with `0 < dt <= max_delta_t` are emitted, which drops
/// same-frame pairs and bounds how far a target may trail its anchor.
pub fn pair_peaks(peaks: &[Peak], fanout: usize, max_delta_t: usize) -> Vec<Fingerprint> {
    let mut fingerprints = Vec::new();
    for (i, anchor) in peaks.iter().enumerate() {
        for j in 1..=fanout {
            let Some(target) = peaks.get(i + j) else {
                break;
            };
            // Row-major peak order guarantees target.time >= anchor.time.
            let delta_t = target.time - anchor.time;
            if delta_t > 0 && delta_t <= max_delta_t {
                fingerprints.push(Fingerprint {
                    hash: hash_peak(anchor.freq, target.freq, delta_t),
                    time_anchor: anchor.time,
                });
            }
        }
    }
    fingerprints
}
