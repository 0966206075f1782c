//! Peak-to-trough drawdown analysis of an equity curve.

use serde::{Deserialize, Serialize};
use stratgate_core::{EquityCurve, ValidationError};

/// Result of a drawdown check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawdownCheck {
    /// Largest peak-to-trough decline as a positive fraction of the peak.
    pub max_drawdown: f64,
    /// Index of the peak that starts the deepest decline.
    pub peak_index: usize,
    /// Index where the deepest decline bottoms out.
    pub trough_index: usize,
    /// Longest run of consecutive points below the running peak.
    pub longest_underwater: usize,
    pub passed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawdownChecker {
    threshold: f64,
}

impl DrawdownChecker {
    pub fn new(threshold: f64) -> Result<Self, ValidationError> {
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(ValidationError::invalid(
                "max_drawdown",
                format!("threshold must be in (0, 1], got {threshold}"),
            ));
        }
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn check(&self, curve: &EquityCurve) -> DrawdownCheck {
        self.check_values(&curve.values())
    }

    /// Same as [`check`](Self::check) on raw values; an empty slice passes
    /// with zero drawdown.
    pub fn check_values(&self, values: &[f64]) -> DrawdownCheck {
        let profile = drawdown_profile(values);
        DrawdownCheck {
            passed: profile.max_drawdown <= self.threshold,
            max_drawdown: profile.max_drawdown,
            peak_index: profile.peak_index,
            trough_index: profile.trough_index,
            longest_underwater: profile.longest_underwater,
        }
    }
}

struct Profile {
    max_drawdown: f64,
    peak_index: usize,
    trough_index: usize,
    longest_underwater: usize,
}

fn drawdown_profile(values: &[f64]) -> Profile {
    let mut profile = Profile {
        max_drawdown: 0.0,
        peak_index: 0,
        trough_index: 0,
        longest_underwater: 0,
    };
    let Some(&first) = values.first() else {
        return profile;
    };

    let mut peak = first;
    let mut peak_at = 0;
    let mut underwater = 0;
    for (i, &v) in values.iter().enumerate() {
        if v >= peak {
            peak = v;
            peak_at = i;
            underwater = 0;
            continue;
        }
        underwater += 1;
        profile.longest_underwater = profile.longest_underwater.max(underwater);
        if peak > 0.0 {
            let dd = (peak - v) / peak;
            if dd > profile.max_drawdown {
                profile.max_drawdown = dd;
                profile.peak_index = peak_at;
                profile.trough_index = i;
            }
        }
    }
    profile
}

/// Maximum drawdown as a positive fraction (0.15 = 15% below the peak).
///
/// Zero for constant or non-decreasing curves and for fewer than two points.
/// Drawdown is undefined while the running peak is non-positive and counts
/// as zero there.
pub fn max_drawdown(values: &[f64]) -> f64 {
    drawdown_profile(values).max_drawdown
}
