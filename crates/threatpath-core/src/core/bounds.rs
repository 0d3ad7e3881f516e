// threatpath-core/src/core/bounds.rs
// ============================================================================
// Module: ThreatPath Boundary Guards
// Description: Defensive clamps for scores, probabilities, and thresholds.
// Purpose: Keep computed values inside their declared ranges and log drift.
// Dependencies: tracing
// ============================================================================

//! ## Overview
//! Every score, probability, and governance threshold has a declared range.
//! These helpers clamp values back into range and emit a warning when a
//! computation escaped its bounds, so boundary violations are observable
//! without ever propagating out-of-range values downstream.

// ============================================================================
// SECTION: Imports
// ============================================================================

use tracing::warn;

// ============================================================================
// SECTION: Clamp Helpers
// ============================================================================

/// Clamps a probability or confidence into `[0.0, 1.0]`.
#[must_use]
pub fn clamp_probability(value: f64, context: &str) -> f64 {
    clamp_with_warning(value, 0.0, 1.0, context)
}

/// Clamps an anomaly score into `[0.0, 100.0]`.
#[must_use]
pub fn clamp_score(value: f64, context: &str) -> f64 {
    clamp_with_warning(value, 0.0, 100.0, context)
}

/// Clamps trust momentum into `[-0.35, 0.35]`.
#[must_use]
pub fn clamp_momentum(value: f64) -> f64 {
    value.clamp(-0.35, 0.35)
}

/// Clamps a governance threshold into its declared `[lower, upper]` band.
#[must_use]
pub fn clamp_threshold(value: f64, lower: f64, upper: f64, context: &str) -> f64 {
    clamp_with_warning(value, lower, upper, context)
}

/// Clamps a value and warns when it fell outside its declared range.
fn clamp_with_warning(value: f64, lower: f64, upper: f64, context: &str) -> f64 {
    if value.is_nan() {
        warn!(context, "non-finite value clamped to lower bound");
        return lower;
    }
    if value < lower || value > upper {
        warn!(context, value, lower, upper, "value escaped declared range; clamping");
    }
    value.clamp(lower, upper)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::clamp_momentum;
    use super::clamp_probability;
    use super::clamp_score;
    use super::clamp_threshold;

    #[test]
    fn probability_clamps_both_ends() {
        assert!((clamp_probability(1.7, "test") - 1.0).abs() < f64::EPSILON);
        assert!((clamp_probability(-0.2, "test") - 0.0).abs() < f64::EPSILON);
        assert!((clamp_probability(0.42, "test") - 0.42).abs() < f64::EPSILON);
    }

    #[test]
    fn score_clamps_to_hundred() {
        assert!((clamp_score(140.0, "test") - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn momentum_stays_in_band() {
        assert!((clamp_momentum(-0.9) + 0.35).abs() < f64::EPSILON);
        assert!((clamp_momentum(0.9) - 0.35).abs() < f64::EPSILON);
    }

    #[test]
    fn nan_maps_to_lower_bound() {
        assert!((clamp_threshold(f64::NAN, 0.4, 0.95, "test") - 0.4).abs() < f64::EPSILON);
    }
}
