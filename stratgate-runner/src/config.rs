//! Serializable validation configuration.
//!
//! One flat [`ValidationConfig`] carries every threshold. It is loaded from
//! TOML (missing keys fall back to defaults), checked once by
//! [`ValidationConfig::validate`], and projected per gate through
//! [`GateSettings`].

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or checking a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid config value '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// Every threshold and knob of a validation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    // ── performance ──
    pub min_win_rate: f64,
    pub min_sharpe: f64,
    pub min_sortino: f64,
    pub periods_per_year: f64,

    // ── drawdown ──
    /// Maximum tolerated drawdown as a fraction in (0, 1].
    pub max_drawdown: f64,

    // ── monte carlo ──
    pub simulations: usize,
    pub initial_equity: f64,
    pub pass_threshold_ratio: f64,

    // ── noise robustness ──
    pub noise_level: f64,
    pub trials: usize,
    pub max_instability_ratio: f64,

    // ── walk forward ──
    pub n_splits: usize,
    pub min_walk_forward_score: f64,

    // ── regime stability ──
    pub n_clusters: usize,
    pub min_regime_share: f64,
    pub max_regime_dispersion: f64,
    pub kmeans_max_iterations: usize,
    pub kmeans_restarts: usize,

    // ── latency ──
    pub latency_enabled: bool,
    pub max_latency_ms: u64,
    pub slippage_pct: f64,

    // ── alpha decay ──
    pub decay_threshold: f64,
    /// `|ρ_near|` must reach `decay_significance_z / √n` before a decay
    /// score is computed; weaker signals fail with a numeric domain error.
    pub decay_significance_z: f64,
    /// Forward-return horizons, nearest first.
    pub decay_horizons: Vec<usize>,

    // ── orchestration ──
    pub seed: u64,
    pub test_timeout_ms: u64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_win_rate: 0.4,
            min_sharpe: 0.5,
            min_sortino: 0.5,
            periods_per_year: 252.0,
            max_drawdown: 0.25,
            simulations: 1000,
            initial_equity: 100_000.0,
            pass_threshold_ratio: 1.0,
            noise_level: 0.01,
            trials: 100,
            max_instability_ratio: 0.2,
            n_splits: 5,
            min_walk_forward_score: 0.5,
            n_clusters: 3,
            min_regime_share: 0.05,
            max_regime_dispersion: 1.5,
            kmeans_max_iterations: 100,
            kmeans_restarts: 4,
            latency_enabled: false,
            max_latency_ms: 50,
            slippage_pct: 0.0005,
            decay_threshold: 0.3,
            decay_significance_z: 2.0,
            decay_horizons: vec![1, 5, 10, 20],
            seed: 42,
            test_timeout_ms: 30_000,
        }
    }
}

impl ValidationConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check every field; the first violation is returned.
    pub fn validate(&self) -> Result<(), ConfigError> {
        unit_interval("min_win_rate", self.min_win_rate)?;
        finite("min_sharpe", self.min_sharpe)?;
        finite("min_sortino", self.min_sortino)?;
        positive("periods_per_year", self.periods_per_year)?;

        if !(self.max_drawdown > 0.0 && self.max_drawdown <= 1.0) {
            return Err(invalid(
                "max_drawdown",
                format!("must be in (0, 1], got {}", self.max_drawdown),
            ));
        }

        at_least_one("simulations", self.simulations)?;
        positive("initial_equity", self.initial_equity)?;
        positive("pass_threshold_ratio", self.pass_threshold_ratio)?;

        if !self.noise_level.is_finite() || self.noise_level < 0.0 {
            return Err(invalid(
                "noise_level",
                format!("must be finite and >= 0, got {}", self.noise_level),
            ));
        }
        at_least_one("trials", self.trials)?;
        unit_interval("max_instability_ratio", self.max_instability_ratio)?;

        at_least_one("n_splits", self.n_splits)?;
        unit_interval("min_walk_forward_score", self.min_walk_forward_score)?;

        at_least_one("n_clusters", self.n_clusters)?;
        unit_interval("min_regime_share", self.min_regime_share)?;
        positive("max_regime_dispersion", self.max_regime_dispersion)?;
        at_least_one("kmeans_max_iterations", self.kmeans_max_iterations)?;
        at_least_one("kmeans_restarts", self.kmeans_restarts)?;

        if self.max_latency_ms == 0 {
            return Err(invalid("max_latency_ms", "must be >= 1"));
        }
        if !self.slippage_pct.is_finite() || !(0.0..1.0).contains(&self.slippage_pct) {
            return Err(invalid(
                "slippage_pct",
                format!("must be in [0, 1), got {}", self.slippage_pct),
            ));
        }

        finite("decay_threshold", self.decay_threshold)?;
        if !self.decay_significance_z.is_finite() || self.decay_significance_z < 0.0 {
            return Err(invalid(
                "decay_significance_z",
                format!("must be finite and >= 0, got {}", self.decay_significance_z),
            ));
        }
        if self.decay_horizons.len() < 2 {
            return Err(invalid("decay_horizons", "needs at least two horizons"));
        }
        if self.decay_horizons.contains(&0) {
            return Err(invalid("decay_horizons", "horizons must be >= 1"));
        }
        if self.decay_horizons.windows(2).any(|w| w[0] >= w[1]) {
            return Err(invalid(
                "decay_horizons",
                "horizons must be strictly increasing (nearest first)",
            ));
        }

        if self.test_timeout_ms == 0 {
            return Err(invalid("test_timeout_ms", "must be >= 1"));
        }
        Ok(())
    }

    /// Project the settings one gate needs.
    pub fn gate_settings(&self, gate: GateKind) -> GateSettings {
        match gate {
            GateKind::MonteCarlo => GateSettings::MonteCarlo {
                simulations: self.simulations,
                initial_equity: self.initial_equity,
                pass_threshold_ratio: self.pass_threshold_ratio,
            },
            GateKind::Drawdown => GateSettings::Drawdown {
                max_drawdown: self.max_drawdown,
                initial_equity: self.initial_equity,
            },
            GateKind::WalkForward => GateSettings::WalkForward {
                n_splits: self.n_splits,
                min_score: self.min_walk_forward_score,
            },
            GateKind::RegimeStability => GateSettings::RegimeStability {
                n_clusters: self.n_clusters,
                max_iterations: self.kmeans_max_iterations,
                restarts: self.kmeans_restarts,
                min_share: self.min_regime_share,
                max_dispersion: self.max_regime_dispersion,
            },
            GateKind::NoiseRobustness => GateSettings::NoiseRobustness {
                noise_level: self.noise_level,
                trials: self.trials,
                max_instability_ratio: self.max_instability_ratio,
            },
            GateKind::AlphaDecay => GateSettings::AlphaDecay {
                threshold: self.decay_threshold,
                significance_z: self.decay_significance_z,
                horizons: self.decay_horizons.clone(),
            },
            GateKind::Performance => GateSettings::Performance {
                min_win_rate: self.min_win_rate,
                min_sharpe: self.min_sharpe,
                min_sortino: self.min_sortino,
                periods_per_year: self.periods_per_year,
            },
        }
    }
}

fn finite(field: &'static str, v: f64) -> Result<(), ConfigError> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(invalid(field, format!("must be finite, got {v}")))
    }
}

fn positive(field: &'static str, v: f64) -> Result<(), ConfigError> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("must be > 0, got {v}")))
    }
}

fn unit_interval(field: &'static str, v: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&v) {
        Ok(())
    } else {
        Err(invalid(field, format!("must be in [0, 1], got {v}")))
    }
}

fn at_least_one(field: &'static str, v: usize) -> Result<(), ConfigError> {
    if v >= 1 {
        Ok(())
    } else {
        Err(invalid(field, "must be >= 1"))
    }
}

// ─── Per-gate projection ─────────────────────────────────────────────

/// The built-in gates, in default execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateKind {
    MonteCarlo,
    Drawdown,
    WalkForward,
    RegimeStability,
    NoiseRobustness,
    AlphaDecay,
    Performance,
}

impl GateKind {
    pub const ALL: [GateKind; 7] = [
        GateKind::MonteCarlo,
        GateKind::Drawdown,
        GateKind::WalkForward,
        GateKind::RegimeStability,
        GateKind::NoiseRobustness,
        GateKind::AlphaDecay,
        GateKind::Performance,
    ];

    /// Report key for this gate.
    pub fn name(self) -> &'static str {
        match self {
            GateKind::MonteCarlo => "monte_carlo",
            GateKind::Drawdown => "drawdown",
            GateKind::WalkForward => "walk_forward",
            GateKind::RegimeStability => "regime_stability",
            GateKind::NoiseRobustness => "noise_robustness",
            GateKind::AlphaDecay => "alpha_decay",
            GateKind::Performance => "performance",
        }
    }
}

/// Settings for one gate (serializable enum).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GateSettings {
    MonteCarlo {
        simulations: usize,
        initial_equity: f64,
        pass_threshold_ratio: f64,
    },
    Drawdown {
        max_drawdown: f64,
        initial_equity: f64,
    },
    WalkForward {
        n_splits: usize,
        min_score: f64,
    },
    RegimeStability {
        n_clusters: usize,
        max_iterations: usize,
        restarts: usize,
        min_share: f64,
        max_dispersion: f64,
    },
    NoiseRobustness {
        noise_level: f64,
        trials: usize,
        max_instability_ratio: f64,
    },
    AlphaDecay {
        threshold: f64,
        significance_z: f64,
        horizons: Vec<usize>,
    },
    Performance {
        min_win_rate: f64,
        min_sharpe: f64,
        min_sortino: f64,
        periods_per_year: f64,
    },
}
