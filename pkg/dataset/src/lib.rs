//! Reproducible synthetic corpora for the ANN benchmark.
//!
//! Every vector is drawn uniformly from [`VALUE_RANGE`] and scaled to unit
//! Euclidean norm, so inner product and cosine similarity agree for every
//! engine that consumes the data.

use std::ops::Range;

use rand::{Rng, SeedableRng, distributions::Uniform};
use rand_chacha::ChaCha8Rng;
use schema::{BenchmarkConfig, ValidationError, validate_config};

pub const VALUE_RANGE: Range<f32> = 0.0..1.0;

// ---------------------------------------------------------------------------
// Vector storage
// ---------------------------------------------------------------------------

/// Row-major set of equal-length `f32` vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorSet {
    dim: usize,
    data: Vec<f32>,
}

impl VectorSet {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            data: Vec::new(),
        }
    }

    /// Wraps flat row-major data. Returns `None` when `dim` is zero or the
    /// data length is not a multiple of `dim`.
    pub fn from_flat(dim: usize, data: Vec<f32>) -> Option<Self> {
        if dim == 0 || data.len() % dim != 0 {
            return None;
        }
        Some(Self { dim, data })
    }

    /// Appends one row. Returns `false` and leaves the set unchanged when the
    /// row length differs from `dim`.
    pub fn push(&mut self, row: &[f32]) -> bool {
        if row.len() != self.dim {
            return false;
        }
        self.data.extend_from_slice(row);
        true
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        if self.dim == 0 {
            0
        } else {
            self.data.len() / self.dim
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<&[f32]> {
        let start = index.checked_mul(self.dim)?;
        let end = start.checked_add(self.dim)?;
        self.data.get(start..end)
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &[f32]> {
        self.data.chunks_exact(self.dim.max(1))
    }

    pub fn as_flat(&self) -> &[f32] {
        &self.data
    }

    fn rows_mut(&mut self) -> impl Iterator<Item = &mut [f32]> {
        self.data.chunks_exact_mut(self.dim.max(1))
    }
}

// ---------------------------------------------------------------------------
// Dataset generation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub vectors: VectorSet,
    pub queries: VectorSet,
}

/// Generates the dataset for `config`, seeding a ChaCha8 stream from
/// `config.random_seed`.
pub fn generate(config: &BenchmarkConfig) -> Result<Dataset, ValidationError> {
    let mut rng = ChaCha8Rng::seed_from_u64(config.random_seed);
    generate_with_rng(config, &mut rng)
}

/// Generates the dataset from a caller-owned random source. Corpus rows are
/// drawn before query rows.
pub fn generate_with_rng<R: Rng + ?Sized>(
    config: &BenchmarkConfig,
    rng: &mut R,
) -> Result<Dataset, ValidationError> {
    validate_config(config)?;
    let vectors = random_unit_vectors(rng, config.sample_count, config.dimensionality);
    let queries = random_unit_vectors(rng, config.query_count, config.dimensionality);
    Ok(Dataset { vectors, queries })
}

fn random_unit_vectors<R: Rng + ?Sized>(rng: &mut R, rows: usize, dim: usize) -> VectorSet {
    let uniform = Uniform::from(VALUE_RANGE);
    let data: Vec<f32> = (0..rows * dim).map(|_| rng.sample(uniform)).collect();
    let mut set = VectorSet { dim, data };
    for row in set.rows_mut() {
        l2_normalize(row);
    }
    set
}

/// Scales `row` to unit Euclidean norm in place. Zero rows stay zero.
pub fn l2_normalize(row: &mut [f32]) {
    let norm = row
        .iter()
        .map(|value| f64::from(*value) * f64::from(*value))
        .sum::<f64>()
        .sqrt();
    if norm <= f64::EPSILON || !norm.is_finite() {
        return;
    }
    for value in row.iter_mut() {
        *value = (f64::from(*value) / norm) as f32;
    }
}
