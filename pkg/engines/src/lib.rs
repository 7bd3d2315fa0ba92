//! Search engines driven by the benchmark harness.
//!
//! Every engine sits behind [`EngineAdapter`]: build an index from a corpus,
//! then answer top-k queries against it. The harness only times the two
//! calls, so new engines plug in by implementing the trait and registering
//! under a unique name.

use std::cmp::Ordering;

use dataset::VectorSet;
use thiserror::Error;

mod flat;
mod graph;

pub use flat::FlatInnerProductEngine;
pub use graph::{AnnTuningConfig, GraphAnnEngine};

pub const FLAT_IP_ENGINE: &str = "flat_ip";
pub const GRAPH_ANN_ENGINE: &str = "graph_ann";

/// Engines compared by default, in invocation order.
pub const DEFAULT_ENGINE_NAMES: [&str; 2] = [GRAPH_ANN_ENGINE, FLAT_IP_ENGINE];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("search called before build")]
    NotBuilt,
    #[error("cannot build an index from an empty corpus")]
    EmptyCorpus,
    #[error("top_k must be > 0")]
    InvalidTopK,
    #[error("vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("engine '{0}' is already registered")]
    DuplicateEngine(String),
}

/// One ranked search hit: the corpus row id and its inner-product score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub id: usize,
    pub score: f32,
}

pub trait EngineAdapter {
    /// Builds the adapter-owned index over `vectors`, replacing any index
    /// from an earlier build.
    fn build(&mut self, vectors: &VectorSet) -> Result<(), EngineError>;

    /// Returns up to `top_k` neighbors per query, best first.
    fn search(&self, queries: &VectorSet, top_k: usize) -> Result<Vec<Vec<Neighbor>>, EngineError>;
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

pub struct RegisteredEngine {
    pub name: String,
    pub adapter: Box<dyn EngineAdapter>,
}

impl std::fmt::Debug for RegisteredEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredEngine")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Ordered set of named engines. Iteration follows registration order.
#[derive(Debug, Default)]
pub struct EngineRegistry {
    engines: Vec<RegisteredEngine>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Graph engine first, then the exact flat engine.
    pub fn default_engines(tuning: AnnTuningConfig) -> Self {
        let mut registry = Self::new();
        registry.engines.push(RegisteredEngine {
            name: GRAPH_ANN_ENGINE.to_string(),
            adapter: Box::new(GraphAnnEngine::new(tuning)),
        });
        registry.engines.push(RegisteredEngine {
            name: FLAT_IP_ENGINE.to_string(),
            adapter: Box::new(FlatInnerProductEngine::new()),
        });
        registry
    }

    pub fn register<A>(&mut self, name: impl Into<String>, adapter: A) -> Result<(), EngineError>
    where
        A: EngineAdapter + 'static,
    {
        self.register_boxed(name, Box::new(adapter))
    }

    pub fn register_boxed(
        &mut self,
        name: impl Into<String>,
        adapter: Box<dyn EngineAdapter>,
    ) -> Result<(), EngineError> {
        let name = name.into();
        if self.engines.iter().any(|engine| engine.name == name) {
            return Err(EngineError::DuplicateEngine(name));
        }
        self.engines.push(RegisteredEngine { name, adapter });
        Ok(())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.engines.iter().map(|engine| engine.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }
}

impl IntoIterator for EngineRegistry {
    type Item = RegisteredEngine;
    type IntoIter = std::vec::IntoIter<RegisteredEngine>;

    fn into_iter(self) -> Self::IntoIter {
        self.engines.into_iter()
    }
}

// ---------------------------------------------------------------------------
// Shared scoring helpers
// ---------------------------------------------------------------------------

pub(crate) fn inner_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

pub(crate) fn check_dim(expected: usize, actual: usize) -> Result<(), EngineError> {
    if expected != actual {
        return Err(EngineError::DimensionMismatch { expected, actual });
    }
    Ok(())
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct ScoredNode {
    pub(crate) id: usize,
    pub(crate) score: f32,
}

impl PartialEq for ScoredNode {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.score.to_bits() == other.score.to_bits()
    }
}

impl Eq for ScoredNode {}

impl PartialOrd for ScoredNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Higher score wins; ties go to the lower id so rankings are stable.
impl Ord for ScoredNode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl From<ScoredNode> for Neighbor {
    fn from(node: ScoredNode) -> Self {
        Self {
            id: node.id,
            score: node.score,
        }
    }
}
