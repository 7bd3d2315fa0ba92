//! Durable storage for benchmark records.
//!
//! Records are written as pretty-printed JSON:
//!
//! ```json
//! {
//!   "config": { "n_samples": 10000, "n_dims": 128, "n_queries": 100, "top_k": 10, "seed": 42 },
//!   "metrics": { "graph_ann": { "build_sec": 1.25, "search_sec": 0.004 } }
//! }
//! ```
//!
//! `metrics` keeps engine invocation order. Loading never fills in a missing
//! field; anything absent or mistyped is a [`StoreError::MalformedRecord`].

use std::{
    fmt,
    fs::{OpenOptions, create_dir_all, read_to_string, remove_file, rename},
    io::Write,
    path::{Path, PathBuf},
};

use schema::{BenchmarkConfig, BenchmarkRecord, EngineResult};
use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{self, MapAccess, Visitor},
    ser::SerializeMap,
};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed benchmark record: {0}")]
    MalformedRecord(String),
    #[error("failed to encode benchmark record: {0}")]
    Encode(#[source] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct RecordDocumentRef<'a> {
    config: &'a BenchmarkConfig,
    metrics: MetricsRef<'a>,
}

struct MetricsRef<'a>(&'a [EngineResult]);

#[derive(Deserialize)]
struct RecordDocument {
    config: BenchmarkConfig,
    metrics: MetricsDocument,
}

struct MetricsDocument(Vec<EngineResult>);

#[derive(Serialize, Deserialize)]
struct MetricDocument {
    build_sec: f64,
    search_sec: f64,
}

impl Serialize for MetricsRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for result in self.0 {
            map.serialize_entry(
                &result.engine_name,
                &MetricDocument {
                    build_sec: result.build_seconds,
                    search_sec: result.search_seconds,
                },
            )?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for MetricsDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MetricsVisitor;

        impl<'de> Visitor<'de> for MetricsVisitor {
            type Value = MetricsDocument;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("an object keyed by engine name")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut metrics: Vec<EngineResult> =
                    Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((engine_name, metric)) =
                    access.next_entry::<String, MetricDocument>()?
                {
                    if metrics.iter().any(|m| m.engine_name == engine_name) {
                        return Err(de::Error::custom(format!(
                            "duplicate engine '{engine_name}' in metrics"
                        )));
                    }
                    metrics.push(EngineResult::new(
                        engine_name,
                        metric.build_sec,
                        metric.search_sec,
                    ));
                }
                Ok(MetricsDocument(metrics))
            }
        }

        deserializer.deserialize_map(MetricsVisitor)
    }
}

// ---------------------------------------------------------------------------
// Encode / decode
// ---------------------------------------------------------------------------

pub fn encode_record(record: &BenchmarkRecord) -> Result<String, StoreError> {
    let document = RecordDocumentRef {
        config: record.config(),
        metrics: MetricsRef(record.metrics()),
    };
    let mut out = serde_json::to_string_pretty(&document).map_err(StoreError::Encode)?;
    out.push('\n');
    Ok(out)
}

pub fn decode_record(text: &str) -> Result<BenchmarkRecord, StoreError> {
    let document: RecordDocument = serde_json::from_str(text)
        .map_err(|err| StoreError::MalformedRecord(err.to_string()))?;
    BenchmarkRecord::new(document.config, document.metrics.0)
        .map_err(|err| StoreError::MalformedRecord(err.to_string()))
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

/// Writes `record` to `path` atomically: the JSON goes to a sibling temp file
/// first and is renamed over the destination once synced.
pub fn save_record(record: &BenchmarkRecord, path: impl AsRef<Path>) -> Result<(), StoreError> {
    let path = path.as_ref();
    let encoded = encode_record(record)?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        create_dir_all(parent)?;
    }
    let tmp_path = temp_path(path);
    if let Err(err) = write_synced(&tmp_path, encoded.as_bytes())
        .and_then(|()| rename(&tmp_path, path))
    {
        let _ = remove_file(&tmp_path);
        return Err(err.into());
    }
    debug!(
        path = %path.display(),
        engines = record.metrics().len(),
        "benchmark record saved"
    );
    Ok(())
}

pub fn load_record(path: impl AsRef<Path>) -> Result<BenchmarkRecord, StoreError> {
    let path = path.as_ref();
    let text = read_to_string(path)?;
    let record = decode_record(&text)?;
    debug!(
        path = %path.display(),
        engines = record.metrics().len(),
        "benchmark record loaded"
    );
    Ok(record)
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

fn temp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf().into_os_string();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}
