use anndists::dist::Distance;
use dataset::VectorSet;
use hnsw_rs::prelude::*;
use tracing::debug;

use crate::{EngineAdapter, EngineError, Neighbor, ScoredNode, check_dim, inner_product};

const ANN_MAX_CONNECTIONS_DEFAULT: usize = 16;
const ANN_CONSTRUCTION_EXPANSION_DEFAULT: usize = 100;
const ANN_SEARCH_EXPANSION_FACTOR_DEFAULT: usize = 12;
const ANN_SEARCH_EXPANSION_MIN_DEFAULT: usize = 64;
const ANN_SEARCH_EXPANSION_MAX_DEFAULT: usize = 4096;
const ANN_MAX_LAYERS: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnTuningConfig {
    /// Links kept per node on the upper layers; the base layer keeps twice
    /// as many.
    pub max_connections: usize,
    /// Candidate list size while inserting.
    pub construction_expansion: usize,
    pub search_expansion_factor: usize,
    pub search_expansion_min: usize,
    pub search_expansion_max: usize,
}

impl Default for AnnTuningConfig {
    fn default() -> Self {
        Self {
            max_connections: ANN_MAX_CONNECTIONS_DEFAULT,
            construction_expansion: ANN_CONSTRUCTION_EXPANSION_DEFAULT,
            search_expansion_factor: ANN_SEARCH_EXPANSION_FACTOR_DEFAULT,
            search_expansion_min: ANN_SEARCH_EXPANSION_MIN_DEFAULT,
            search_expansion_max: ANN_SEARCH_EXPANSION_MAX_DEFAULT,
        }
    }
}

impl AnnTuningConfig {
    /// Candidate list size for a query: `top_k * factor` clamped to
    /// `[min, max]`, and never below `top_k`.
    fn search_budget(&self, top_k: usize) -> usize {
        let min = self.search_expansion_min.max(1);
        top_k
            .saturating_mul(self.search_expansion_factor.max(1))
            .clamp(min, self.search_expansion_max.max(min))
            .max(top_k)
    }
}

/// `1 - <a, b>` for unit vectors, floored at zero so rounding on
/// near-identical rows cannot go negative.
#[derive(Debug, Clone, Copy, Default)]
struct InnerProductDistance;

impl Distance<f32> for InnerProductDistance {
    fn eval(&self, va: &[f32], vb: &[f32]) -> f32 {
        (1.0 - inner_product(va, vb)).max(0.0)
    }
}

/// Approximate search over an `hnsw_rs` hierarchical navigable small world
/// graph. Inputs are expected to be L2-normalized.
#[derive(Default)]
pub struct GraphAnnEngine {
    tuning: AnnTuningConfig,
    index: Option<GraphIndex>,
}

struct GraphIndex {
    dim: usize,
    hnsw: Hnsw<'static, f32, InnerProductDistance>,
}

impl GraphAnnEngine {
    pub fn new(tuning: AnnTuningConfig) -> Self {
        Self {
            tuning,
            index: None,
        }
    }
}

impl EngineAdapter for GraphAnnEngine {
    fn build(&mut self, vectors: &VectorSet) -> Result<(), EngineError> {
        self.index = None;
        if vectors.is_empty() {
            return Err(EngineError::EmptyCorpus);
        }

        let layers = layer_count(vectors.len());
        let mut hnsw = Hnsw::<f32, InnerProductDistance>::new(
            self.tuning.max_connections.max(1),
            vectors.len(),
            layers,
            self.tuning.construction_expansion.max(1),
            InnerProductDistance,
        );
        for (id, row) in vectors.iter().enumerate() {
            hnsw.insert_slice((row, id));
        }
        hnsw.set_searching_mode(true);
        debug!(
            nodes = vectors.len(),
            layers,
            max_connections = self.tuning.max_connections,
            "graph index built"
        );

        self.index = Some(GraphIndex {
            dim: vectors.dim(),
            hnsw,
        });
        Ok(())
    }

    fn search(&self, queries: &VectorSet, top_k: usize) -> Result<Vec<Vec<Neighbor>>, EngineError> {
        let index = self.index.as_ref().ok_or(EngineError::NotBuilt)?;
        if top_k == 0 {
            return Err(EngineError::InvalidTopK);
        }
        check_dim(index.dim, queries.dim())?;

        let budget = self.tuning.search_budget(top_k);
        Ok(queries
            .iter()
            .map(|query| index.search(query, top_k, budget))
            .collect())
    }
}

impl GraphIndex {
    fn search(&self, query: &[f32], top_k: usize, budget: usize) -> Vec<Neighbor> {
        let mut hits: Vec<ScoredNode> = self
            .hnsw
            .search(query, top_k, budget)
            .into_iter()
            .map(|hit| ScoredNode {
                id: hit.d_id,
                score: 1.0 - hit.distance,
            })
            .collect();
        hits.sort_by(|a, b| b.cmp(a));
        hits.truncate(top_k);
        hits.into_iter().map(Neighbor::from).collect()
    }
}

fn layer_count(nodes: usize) -> usize {
    ((nodes as f64).ln().ceil() as usize).clamp(1, ANN_MAX_LAYERS)
}
