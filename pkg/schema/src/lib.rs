use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Benchmark configuration
// ---------------------------------------------------------------------------

pub const DEFAULT_SAMPLE_COUNT: usize = 10_000;
pub const DEFAULT_DIMENSIONALITY: usize = 128;
pub const DEFAULT_QUERY_COUNT: usize = 100;
pub const DEFAULT_TOP_K: usize = 10;
pub const DEFAULT_RANDOM_SEED: u64 = 42;

/// Dataset shape and seed for one benchmark run.
///
/// The serialized key names match the result files written by earlier
/// tooling, so older baselines stay loadable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    #[serde(rename = "n_samples")]
    pub sample_count: usize,
    #[serde(rename = "n_dims")]
    pub dimensionality: usize,
    #[serde(rename = "n_queries")]
    pub query_count: usize,
    pub top_k: usize,
    #[serde(rename = "seed")]
    pub random_seed: u64,
}

impl BenchmarkConfig {
    pub fn new(
        sample_count: usize,
        dimensionality: usize,
        query_count: usize,
        top_k: usize,
        random_seed: u64,
    ) -> Result<Self, ValidationError> {
        let config = Self {
            sample_count,
            dimensionality,
            query_count,
            top_k,
            random_seed,
        };
        validate_config(&config)?;
        Ok(config)
    }
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            sample_count: DEFAULT_SAMPLE_COUNT,
            dimensionality: DEFAULT_DIMENSIONALITY,
            query_count: DEFAULT_QUERY_COUNT,
            top_k: DEFAULT_TOP_K,
            random_seed: DEFAULT_RANDOM_SEED,
        }
    }
}

// ---------------------------------------------------------------------------
// Measurements
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct EngineResult {
    pub engine_name: String,
    pub build_seconds: f64,
    pub search_seconds: f64,
}

impl EngineResult {
    pub fn new(engine_name: impl Into<String>, build_seconds: f64, search_seconds: f64) -> Self {
        Self {
            engine_name: engine_name.into(),
            build_seconds,
            search_seconds,
        }
    }
}

/// Outcome of one complete benchmark run.
///
/// Metrics keep engine invocation order and engine names are unique. The
/// record can only be built through [`BenchmarkRecord::new`], so a value in
/// hand always satisfies both.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkRecord {
    config: BenchmarkConfig,
    metrics: Vec<EngineResult>,
}

impl BenchmarkRecord {
    pub fn new(
        config: BenchmarkConfig,
        metrics: Vec<EngineResult>,
    ) -> Result<Self, ValidationError> {
        validate_config(&config)?;
        validate_metrics(&metrics)?;
        Ok(Self { config, metrics })
    }

    pub fn config(&self) -> &BenchmarkConfig {
        &self.config
    }

    pub fn metrics(&self) -> &[EngineResult] {
        &self.metrics
    }

    pub fn metric(&self, engine_name: &str) -> Option<&EngineResult> {
        self.metrics
            .iter()
            .find(|result| result.engine_name == engine_name)
    }

    pub fn engine_names(&self) -> impl Iterator<Item = &str> {
        self.metrics.iter().map(|result| result.engine_name.as_str())
    }

    /// Search latency per engine in invocation order; the series charted
    /// after a run.
    pub fn search_seconds_by_engine(&self) -> Vec<(&str, f64)> {
        self.metrics
            .iter()
            .map(|result| (result.engine_name.as_str(), result.search_seconds))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("invalid benchmark config: {0}")]
    InvalidConfig(String),
    #[error("duplicate engine name '{0}'")]
    DuplicateEngine(String),
    #[error("engine '{engine}' has invalid {field} value {value}")]
    InvalidDuration {
        engine: String,
        field: &'static str,
        value: f64,
    },
}

pub fn validate_config(config: &BenchmarkConfig) -> Result<(), ValidationError> {
    let checks = [
        ("sample_count", config.sample_count),
        ("dimensionality", config.dimensionality),
        ("query_count", config.query_count),
        ("top_k", config.top_k),
    ];
    for (field, value) in checks {
        if value == 0 {
            return Err(ValidationError::InvalidConfig(format!(
                "{field} must be > 0"
            )));
        }
    }
    Ok(())
}

pub fn validate_engine_result(result: &EngineResult) -> Result<(), ValidationError> {
    if result.engine_name.trim().is_empty() {
        return Err(ValidationError::InvalidConfig(
            "engine name cannot be empty".to_string(),
        ));
    }
    for (field, value) in [
        ("build_seconds", result.build_seconds),
        ("search_seconds", result.search_seconds),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(ValidationError::InvalidDuration {
                engine: result.engine_name.clone(),
                field,
                value,
            });
        }
    }
    Ok(())
}

fn validate_metrics(metrics: &[EngineResult]) -> Result<(), ValidationError> {
    let mut seen = HashSet::with_capacity(metrics.len());
    for result in metrics {
        validate_engine_result(result)?;
        if !seen.insert(result.engine_name.as_str()) {
            return Err(ValidationError::DuplicateEngine(result.engine_name.clone()));
        }
    }
    Ok(())
}
