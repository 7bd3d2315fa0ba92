//! Search-latency regression check between two benchmark records.
//!
//! Only `search_seconds` participates. Build time is reported by the
//! benchmark but never gates a run.

use std::fmt;

use schema::BenchmarkRecord;
use thiserror::Error;

/// Default tolerance: current search may take up to 1.5x the baseline.
pub const DEFAULT_RATIO_LIMIT: f64 = 1.50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordSide {
    Baseline,
    Current,
}

impl RecordSide {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Baseline => "baseline",
            Self::Current => "current",
        }
    }
}

impl fmt::Display for RecordSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegressionError {
    #[error("engine '{engine}' is missing from the {side} record")]
    MissingEngine { engine: String, side: RecordSide },
    #[error("ratio limit must be a finite value > 0, got {0}")]
    InvalidRatioLimit(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineComparison {
    pub engine_name: String,
    pub baseline_seconds: f64,
    pub current_seconds: f64,
    pub ratio: f64,
    pub exceeded: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegressionVerdict {
    comparisons: Vec<EngineComparison>,
    ratio_limit: f64,
    passed: bool,
}

impl RegressionVerdict {
    pub fn passed(&self) -> bool {
        self.passed
    }

    pub fn ratio_limit(&self) -> f64 {
        self.ratio_limit
    }

    /// Per-engine comparisons in the order the engines were requested.
    pub fn comparisons(&self) -> &[EngineComparison] {
        &self.comparisons
    }

    pub fn comparison(&self, engine_name: &str) -> Option<&EngineComparison> {
        self.comparisons
            .iter()
            .find(|comparison| comparison.engine_name == engine_name)
    }

    pub fn regressions(&self) -> impl Iterator<Item = &EngineComparison> {
        self.comparisons.iter().filter(|comparison| comparison.exceeded)
    }
}

/// `current / baseline`, or `+inf` when the baseline is not positive.
pub fn search_ratio(baseline_seconds: f64, current_seconds: f64) -> f64 {
    if baseline_seconds > 0.0 {
        current_seconds / baseline_seconds
    } else {
        f64::INFINITY
    }
}

/// Compares search latency for each of `engines` between the two records.
///
/// Every engine must be present in both records; presence is verified for
/// all of them before any comparison is made. A repeated engine name is
/// compared once, at its first position.
pub fn check<S: AsRef<str>>(
    baseline: &BenchmarkRecord,
    current: &BenchmarkRecord,
    engines: &[S],
    ratio_limit: f64,
) -> Result<RegressionVerdict, RegressionError> {
    if !ratio_limit.is_finite() || ratio_limit <= 0.0 {
        return Err(RegressionError::InvalidRatioLimit(ratio_limit));
    }

    let mut pairs: Vec<(&str, f64, f64)> = Vec::with_capacity(engines.len());
    for engine in engines {
        let engine = engine.as_ref();
        if pairs.iter().any(|(name, _, _)| *name == engine) {
            continue;
        }
        let missing = |side: RecordSide| RegressionError::MissingEngine {
            engine: engine.to_string(),
            side,
        };
        let base = baseline
            .metric(engine)
            .ok_or_else(|| missing(RecordSide::Baseline))?;
        let curr = current
            .metric(engine)
            .ok_or_else(|| missing(RecordSide::Current))?;
        pairs.push((engine, base.search_seconds, curr.search_seconds));
    }

    let comparisons: Vec<EngineComparison> = pairs
        .into_iter()
        .map(|(engine, baseline_seconds, current_seconds)| {
            let ratio = search_ratio(baseline_seconds, current_seconds);
            EngineComparison {
                engine_name: engine.to_string(),
                baseline_seconds,
                current_seconds,
                ratio,
                exceeded: ratio > ratio_limit,
            }
        })
        .collect();
    let passed = comparisons.iter().all(|comparison| !comparison.exceeded);

    Ok(RegressionVerdict {
        comparisons,
        ratio_limit,
        passed,
    })
}
