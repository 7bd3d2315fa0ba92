use std::{cmp::Reverse, collections::BinaryHeap};

use dataset::VectorSet;

use crate::{EngineAdapter, EngineError, Neighbor, ScoredNode, check_dim, inner_product};

/// Exact search: every query is scored against every corpus vector.
#[derive(Debug, Default)]
pub struct FlatInnerProductEngine {
    index: Option<VectorSet>,
}

impl FlatInnerProductEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EngineAdapter for FlatInnerProductEngine {
    fn build(&mut self, vectors: &VectorSet) -> Result<(), EngineError> {
        self.index = None;
        if vectors.is_empty() {
            return Err(EngineError::EmptyCorpus);
        }
        self.index = Some(vectors.clone());
        Ok(())
    }

    fn search(&self, queries: &VectorSet, top_k: usize) -> Result<Vec<Vec<Neighbor>>, EngineError> {
        let index = self.index.as_ref().ok_or(EngineError::NotBuilt)?;
        if top_k == 0 {
            return Err(EngineError::InvalidTopK);
        }
        check_dim(index.dim(), queries.dim())?;

        Ok(queries
            .iter()
            .map(|query| exact_top_k(index, query, top_k))
            .collect())
    }
}

fn exact_top_k(index: &VectorSet, query: &[f32], top_k: usize) -> Vec<Neighbor> {
    // Min-heap of the best `top_k` seen so far; the root is the weakest keeper.
    let mut best: BinaryHeap<Reverse<ScoredNode>> = BinaryHeap::with_capacity(top_k + 1);
    for (id, vector) in index.iter().enumerate() {
        let node = ScoredNode {
            id,
            score: inner_product(query, vector),
        };
        if best.len() < top_k {
            best.push(Reverse(node));
        } else if best.peek().is_some_and(|Reverse(weakest)| node > *weakest) {
            best.pop();
            best.push(Reverse(node));
        }
    }
    best.into_sorted_vec()
        .into_iter()
        .map(|Reverse(node)| node.into())
        .collect()
}
