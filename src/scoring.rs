//! Statistical ranking of candidate tracks
//!
//! Raw shared-token counts alone produce false positives whenever a common
//! hash appears in many tracks, so the winning count must also stand a full
//! standard deviation above the observed score population before a match is
//! reported.

use std::collections::HashMap;

use crate::index::TrackId;

/// z-score of `x` against `population`, using the population (not sample)
/// standard deviation. Degenerate populations score zero.
pub fn z_score(x: f64, population: &[f64]) -> f64 {
    if population.is_empty() {
        return 0.0;
    }
    let n = population.len() as f64;
    let mean = population.iter().sum::<f64>() / n;
    let variance = population.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();
    if std_dev == 0.0 {
        return 0.0;
    }
    (x - mean) / std_dev
}

/// Pick the winning track ids out of the per-track counts.
///
/// The z-score population is one zero per scored track followed by the real
/// counts. A lone scored track therefore lands exactly on the gate and
/// passes; so does an all-way tie. Ids tied for the highest count are all
/// returned, ordered by id.
pub fn rank(scores: &HashMap<TrackId, u32>, gate: f64) -> Vec<TrackId> {
    let max_score = scores.values().copied().max().unwrap_or(0);

    let mut population = vec![0.0; scores.len()];
    population.extend(scores.values().map(|&count| f64::from(count)));

    if z_score(f64::from(max_score), &population) < gate {
        return Vec::new();
    }

    let mut winners: Vec<TrackId> = scores
        .iter()
        .filter(|&(_, &count)| count == max_score)
        .map(|(&id, _)| id)
        .collect();
    winners.sort_unstable();
    winners
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(pairs: &[(TrackId, u32)]) -> HashMap<TrackId, u32> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn z_score_of_empty_population_is_zero() {
        assert_eq!(z_score(5.0, &[]), 0.0);
    }

    #[test]
    fn z_score_of_constant_population_is_zero() {
        assert_eq!(z_score(3.0, &[3.0, 3.0, 3.0]), 0.0);
    }

    #[test]
    fn z_score_matches_hand_computation() {
        // mean 2, population variance 2/3.
        let z = z_score(3.0, &[1.0, 2.0, 3.0]);
        assert!((z - 1.0 / (2.0f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn no_scores_means_no_winners() {
        assert!(rank(&HashMap::new(), 1.0).is_empty());
    }

    #[test]
    fn a_lone_track_passes_the_gate() {
        assert_eq!(rank(&scores(&[(7, 12)]), 1.0), vec![7]);
    }

    #[test]
    fn tied_tracks_are_all_returned_in_id_order() {
        assert_eq!(rank(&scores(&[(3, 4), (1, 4), (2, 4)]), 1.0), vec![1, 2, 3]);
    }

    #[test]
    fn a_dominant_track_wins_alone() {
        assert_eq!(rank(&scores(&[(1, 50), (2, 1), (3, 2)]), 1.0), vec![1]);
    }

    #[test]
    fn a_stricter_gate_can_reject_the_winner() {
        assert!(rank(&scores(&[(7, 12)]), 2.0).is_empty());
    }
}
