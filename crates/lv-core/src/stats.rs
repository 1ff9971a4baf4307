//! Descriptive statistics over a population history.

use crate::PopulationRecord;
use serde::{Deserialize, Serialize};

/// Minimum spacing, in samples, between two counted peaks
pub const DEFAULT_PEAK_DISTANCE: usize = 10;

/// Summary of one species' time series
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    pub mean: f64,
    /// Population standard deviation
    pub std: f64,
    pub min: usize,
    pub max: usize,
    /// Number of local maxima at least `DEFAULT_PEAK_DISTANCE` apart
    pub peaks: usize,
}

impl SeriesSummary {
    pub fn from_values(values: &[usize], peak_distance: usize) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let n = values.len() as f64;
        let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n;
        let variance = values
            .iter()
            .map(|&v| {
                let d = v as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / n;

        Self {
            mean,
            std: variance.sqrt(),
            min: values.iter().copied().min().unwrap_or(0),
            max: values.iter().copied().max().unwrap_or(0),
            peaks: find_peaks(values, peak_distance).len(),
        }
    }
}

/// Summary of a whole run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistorySummary {
    /// Number of recorded samples
    pub duration: usize,
    pub prey: SeriesSummary,
    pub predators: SeriesSummary,
}

impl HistorySummary {
    pub fn from_history(history: &[PopulationRecord]) -> Self {
        Self::with_peak_distance(history, DEFAULT_PEAK_DISTANCE)
    }

    pub fn with_peak_distance(history: &[PopulationRecord], peak_distance: usize) -> Self {
        let prey: Vec<usize> = history.iter().map(|r| r.prey).collect();
        let predators: Vec<usize> = history.iter().map(|r| r.predators).collect();

        Self {
            duration: history.len(),
            prey: SeriesSummary::from_values(&prey, peak_distance),
            predators: SeriesSummary::from_values(&predators, peak_distance),
        }
    }
}

/// Indices of local maxima, thinned so kept peaks are at least `distance` apart.
///
/// A flat top counts once, at its middle sample (rounded down). Endpoints are
/// never peaks. When two candidates are too close the higher one wins, and on
/// equal height the later one.
pub fn find_peaks(values: &[usize], distance: usize) -> Vec<usize> {
    let n = values.len();
    let mut candidates = Vec::new();

    let mut i = 1;
    while i + 1 < n {
        if values[i - 1] < values[i] {
            let mut ahead = i + 1;
            while ahead + 1 < n && values[ahead] == values[i] {
                ahead += 1;
            }
            if values[ahead] < values[i] {
                candidates.push((i + ahead - 1) / 2);
                i = ahead;
            }
        }
        i += 1;
    }

    if distance <= 1 || candidates.len() < 2 {
        return candidates;
    }

    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.sort_by(|&a, &b| {
        values[candidates[b]]
            .cmp(&values[candidates[a]])
            .then(candidates[b].cmp(&candidates[a]))
    });

    let mut keep = vec![true; candidates.len()];
    for &slot in &order {
        if !keep[slot] {
            continue;
        }
        let peak = candidates[slot];
        for (other, &pos) in candidates.iter().enumerate() {
            if other != slot && keep[other] && pos.abs_diff(peak) < distance {
                keep[other] = false;
            }
        }
    }

    candidates
        .into_iter()
        .zip(keep)
        .filter_map(|(pos, kept)| kept.then_some(pos))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_summary() {
        let summary = SeriesSummary::from_values(&[2, 4, 4, 4, 5, 5, 7, 9], 1);
        assert!((summary.mean - 5.0).abs() < 1e-9);
        assert!((summary.std - 2.0).abs() < 1e-9);
        assert_eq!(summary.min, 2);
        assert_eq!(summary.max, 9);
    }

    #[test]
    fn test_empty_series() {
        let summary = SeriesSummary::from_values(&[], DEFAULT_PEAK_DISTANCE);
        assert_eq!(summary, SeriesSummary::default());
    }

    #[test]
    fn test_find_simple_peaks() {
        let values = [0, 3, 1, 4, 1, 5, 0];
        assert_eq!(find_peaks(&values, 1), vec![1, 3, 5]);
    }

    #[test]
    fn test_plateau_counts_once() {
        let values = [0, 2, 2, 2, 0];
        assert_eq!(find_peaks(&values, 1), vec![2]);

        let values = [0, 2, 2, 0];
        assert_eq!(find_peaks(&values, 1), vec![1]);

        // Rising into the final sample is not a peak
        let values = [0, 1, 2, 2];
        assert!(find_peaks(&values, 1).is_empty());
    }

    #[test]
    fn test_distance_keeps_highest() {
        let values = [0, 3, 1, 4, 1, 5, 0];
        assert_eq!(find_peaks(&values, 3), vec![1, 5]);
        assert_eq!(find_peaks(&values, 10), vec![5]);
    }

    #[test]
    fn test_equal_peaks_keep_later() {
        let values = [0, 5, 0, 0, 0, 0, 0, 0, 5, 0, 0, 0, 0, 0, 0, 4, 0];
        assert_eq!(find_peaks(&values, 10), vec![8]);
        assert_eq!(find_peaks(&values, 7), vec![8]);
        assert_eq!(find_peaks(&values, 1), vec![1, 8, 15]);
    }

    #[test]
    fn test_history_summary() {
        let history: Vec<PopulationRecord> = (0..5)
            .map(|step| PopulationRecord::new(step, 10 + step as usize, 3))
            .collect();

        let summary = HistorySummary::from_history(&history);
        assert_eq!(summary.duration, 5);
        assert_eq!(summary.prey.min, 10);
        assert_eq!(summary.prey.max, 14);
        assert_eq!(summary.predators.std, 0.0);
        assert_eq!(summary.prey.peaks, 0);
    }
}
