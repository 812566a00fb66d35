// crates/obscore-engines/src/usage/trend.rs
// ============================================================================
// Module: Trends
// Description: Ordinary-least-squares regression of a metric over bucket
//              index, with a direction classification.
// Dependencies: serde
// ============================================================================

use serde::Serialize;

use super::distribution::coefficient_of_variation;

/// Minimum number of buckets required before a trend is computed.
pub const MIN_SAMPLE_SIZE_FOR_TRENDS: usize = 30;

/// Direction a metric's regression line is classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
    Volatile,
}

/// One metric's regression result.
#[derive(Debug, Clone, Serialize)]
pub struct Trend {
    pub metric: String,
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    pub direction: TrendDirection,
    pub confidence: f64,
}

/// Fits `values` (indexed `0..values.len()`) with ordinary least squares and
/// classifies the resulting slope.
#[must_use]
pub fn trend(metric: &str, values: &[f64]) -> Trend {
    let n = values.len() as f64;
    let xs: Vec<f64> = (0..values.len()).map(|index| index as f64).collect();

    let sum_x: f64 = xs.iter().sum();
    let sum_y: f64 = values.iter().sum();
    let sum_xy: f64 = xs.iter().zip(values).map(|(x, y)| x * y).sum();
    let sum_xx: f64 = xs.iter().map(|x| x * x).sum();

    let denominator = n * sum_xx - sum_x * sum_x;
    let slope = if denominator == 0.0 { 0.0 } else { (n * sum_xy - sum_x * sum_y) / denominator };
    let intercept = if n == 0.0 { 0.0 } else { (sum_y - slope * sum_x) / n };

    let mean_y = sum_y / n;
    let ss_tot: f64 = values.iter().map(|y| (y - mean_y).powi(2)).sum();
    let ss_res: f64 =
        xs.iter().zip(values).map(|(x, y)| (y - (slope * x + intercept)).powi(2)).sum();
    let r_squared = if ss_tot == 0.0 { 1.0 } else { 1.0 - ss_res / ss_tot };

    let cv = coefficient_of_variation(values);
    let direction = if cv > 0.5 {
        TrendDirection::Volatile
    } else if slope.abs() < 0.01 * mean_y.abs() {
        TrendDirection::Stable
    } else if slope > 0.0 {
        TrendDirection::Increasing
    } else {
        TrendDirection::Decreasing
    };

    Trend { metric: metric.to_owned(), slope, intercept, r_squared, direction, confidence: r_squared }
}

#[cfg(test)]
mod tests {
    use super::trend;
    use super::TrendDirection;

    #[test]
    fn perfectly_increasing_series_has_r_squared_one() {
        let values: Vec<f64> = (0..40).map(|i| i as f64 * 2.0).collect();
        let result = trend("request_count", &values);
        assert_eq!(result.direction, TrendDirection::Increasing);
        assert!((result.r_squared - 1.0).abs() < 1e-9);
        assert!((result.slope - 2.0).abs() < 1e-9);
    }

    #[test]
    fn constant_series_is_stable() {
        let values = vec![100.0; 40];
        let result = trend("request_count", &values);
        assert_eq!(result.direction, TrendDirection::Stable);
    }
}
