// crates/obscore-engines/src/usage/growth.rs
// ============================================================================
// Module: Growth Patterns
// Description: Period-over-period and compound growth, classified into
//              bands, per metric time series.
// Dependencies: serde
// ============================================================================

use serde::Serialize;

use super::distribution::coefficient_of_variation;

/// Growth-band classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthClassification {
    RapidGrowth,
    ModerateGrowth,
    Stable,
    ModerateDecline,
    RapidDecline,
}

/// One metric's growth pattern.
#[derive(Debug, Clone, Serialize)]
pub struct GrowthPattern {
    pub metric: String,
    pub period_over_period: f64,
    pub compound: f64,
    pub classification: GrowthClassification,
    pub confidence: f64,
}

fn classify(period_over_period: f64) -> GrowthClassification {
    if period_over_period > 20.0 {
        GrowthClassification::RapidGrowth
    } else if period_over_period > 5.0 {
        GrowthClassification::ModerateGrowth
    } else if period_over_period >= -5.0 {
        GrowthClassification::Stable
    } else if period_over_period >= -20.0 {
        GrowthClassification::ModerateDecline
    } else {
        GrowthClassification::RapidDecline
    }
}

/// Splits `values` in half, computes period-over-period and compound growth,
/// and classifies the result. Returns `None` for series too short to split.
#[must_use]
pub fn growth_pattern(metric: &str, values: &[f64]) -> Option<GrowthPattern> {
    if values.len() < 2 {
        return None;
    }

    let mid = values.len() / 2;
    let (first_half, second_half) = values.split_at(mid);
    let mean_first = first_half.iter().sum::<f64>() / first_half.len() as f64;
    let mean_second = second_half.iter().sum::<f64>() / second_half.len() as f64;
    let period_over_period =
        if mean_first == 0.0 { 0.0 } else { (mean_second - mean_first) / mean_first * 100.0 };

    let first = values[0];
    let last = values[values.len() - 1];
    let periods = (values.len() - 1) as f64;
    let compound = if first == 0.0 || periods == 0.0 {
        0.0
    } else {
        ((last / first).powf(1.0 / periods) - 1.0) * 100.0
    };

    let cv = coefficient_of_variation(values);
    Some(GrowthPattern {
        metric: metric.to_owned(),
        period_over_period,
        compound,
        classification: classify(period_over_period),
        confidence: (1.0 - cv).max(0.0),
    })
}

#[cfg(test)]
mod tests {
    //! Test-only lint relaxations for panic-based assertions and debug output.
    #![allow(
        clippy::panic,
        clippy::print_stdout,
        clippy::print_stderr,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::use_debug,
        clippy::dbg_macro,
        clippy::panic_in_result_fn,
        clippy::unwrap_in_result,
        reason = "Test-only output and panic-based assertions are permitted."
    )]

    use super::growth_pattern;
    use super::GrowthClassification;

    #[test]
    fn doubling_series_is_rapid_growth() {
        let mut values = vec![100.0; 5];
        values.extend(vec![200.0; 5]);
        let result = growth_pattern("request_count", &values).expect("series has >= 2 points");
        assert!((result.period_over_period - 100.0).abs() < 1e-9);
        assert_eq!(result.classification, GrowthClassification::RapidGrowth);
    }
}
