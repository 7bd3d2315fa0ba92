//! Build/search latency benchmark for the registered search engines, plus the
//! reporting helpers shared by the `ann-benchmark` and
//! `check-ann-regression` binaries.


pub use chart::{ChartError, render_search_chart, write_search_chart};
pub use runner::{Phase, RunError, run};

use tracing_subscriber::EnvFilter;

/// Installs the stderr `fmt` subscriber. `RUST_LOG` overrides the default
/// `info` level.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
