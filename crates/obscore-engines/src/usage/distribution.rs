// crates/obscore-engines/src/usage/distribution.rs
// ============================================================================
// Module: Distributions
// Description: Summary statistics and linear-interpolation percentiles over
//              a flat sample of latency/token/cost values.
// Dependencies: serde
// ============================================================================

use serde::Serialize;

/// A named percentile and its interpolated value.
#[derive(Debug, Clone, Serialize)]
pub struct Percentile {
    pub label: String,
    pub value: f64,
}

/// Summary statistics over one flat sample.
#[derive(Debug, Clone, Serialize)]
pub struct Distribution {
    pub count: u64,
    pub sum: f64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub variance: f64,
    pub percentiles: Vec<Percentile>,
}

/// Builds a distribution over `values`, or `None` if the sample is empty or
/// every value is zero.
#[must_use]
pub fn distribution(values: &[f64], percentile_ranks: &[f64]) -> Option<Distribution> {
    if values.is_empty() || values.iter().all(|value| *value == 0.0) {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let count = sorted.len();
    let sum: f64 = sorted.iter().sum();
    let mean = sum / count as f64;
    let variance = sorted.iter().map(|value| (value - mean).powi(2)).sum::<f64>() / count as f64;
    let std_dev = variance.sqrt();

    let percentiles = percentile_ranks
        .iter()
        .map(|rank| Percentile { label: format!("p{}", *rank as u32), value: percentile(&sorted, *rank) })
        .collect();

    Some(Distribution {
        count: count as u64,
        sum,
        min: sorted[0],
        max: sorted[count - 1],
        mean,
        median: percentile(&sorted, 50.0),
        std_dev,
        variance,
        percentiles,
    })
}

/// Linear-interpolation percentile over an already-sorted sample.
#[must_use]
pub fn percentile(sorted: &[f64], rank: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = rank.clamp(0.0, 100.0) / 100.0;
    let position = rank * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

/// Coefficient of variation (`std_dev / mean`), `0.0` when the mean is zero.
#[must_use]
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    if mean == 0.0 {
        return 0.0;
    }
    let variance = values.iter().map(|value| (value - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt() / mean
}

#[cfg(test)]
mod tests {
    use super::coefficient_of_variation;
    use super::distribution;
    use super::percentile;

    #[test]
    fn all_zero_sample_is_skipped() {
        assert!(distribution(&[0.0, 0.0, 0.0], &[50.0, 90.0]).is_none());
    }

    #[test]
    fn median_interpolates_between_middle_values() {
        let sorted = vec![1.0, 2.0, 3.0, 4.0];
        assert!((percentile(&sorted, 50.0) - 2.5).abs() < 1e-9);
    }

    #[test]
    fn cv_of_constant_series_is_zero() {
        assert!((coefficient_of_variation(&[100.0, 100.0, 100.0]) - 0.0).abs() < 1e-9);
    }
}
