use std::{path::PathBuf, process::ExitCode};

use ann_benchmark::{init_tracing, report::print_record_summary, run, write_search_chart};
use clap::Parser;
use engines::{AnnTuningConfig, EngineRegistry};
use schema::{
    BenchmarkConfig, DEFAULT_DIMENSIONALITY, DEFAULT_QUERY_COUNT, DEFAULT_RANDOM_SEED,
    DEFAULT_SAMPLE_COUNT, DEFAULT_TOP_K,
};
use tracing::info;

/// Times index build and top-k search for every engine on a synthetic
/// corpus, then writes the result record and a search-time bar chart.
#[derive(Parser, Debug)]
#[command(name = "ann-benchmark")]
struct Args {
    #[arg(long, env = "ANN_BENCH_N_SAMPLES", default_value_t = DEFAULT_SAMPLE_COUNT, value_parser = positive_usize)]
    n_samples: usize,

    #[arg(long, env = "ANN_BENCH_N_DIMS", default_value_t = DEFAULT_DIMENSIONALITY, value_parser = positive_usize)]
    n_dims: usize,

    #[arg(long, env = "ANN_BENCH_N_QUERIES", default_value_t = DEFAULT_QUERY_COUNT, value_parser = positive_usize)]
    n_queries: usize,

    #[arg(long, env = "ANN_BENCH_TOP_K", default_value_t = DEFAULT_TOP_K, value_parser = positive_usize)]
    top_k: usize,

    #[arg(long, env = "ANN_BENCH_SEED", default_value_t = DEFAULT_RANDOM_SEED)]
    seed: u64,

    /// Result record destination
    #[arg(
        long,
        env = "ANN_BENCH_JSON_OUTPUT",
        default_value = "benchmarks/results/ann_latest.json"
    )]
    json_output: PathBuf,

    /// Search-time bar chart destination (SVG)
    #[arg(
        long,
        env = "ANN_BENCH_CHART_OUTPUT",
        default_value = "benchmarks/results/ann_benchmark_results.svg"
    )]
    chart_output: PathBuf,

    #[arg(long, env = "ANN_BENCH_ANN_MAX_CONNECTIONS", value_parser = positive_usize)]
    ann_max_connections: Option<usize>,

    #[arg(long, env = "ANN_BENCH_ANN_CONSTRUCTION_EXPANSION", value_parser = positive_usize)]
    ann_construction_expansion: Option<usize>,

    #[arg(long, env = "ANN_BENCH_ANN_SEARCH_EXPANSION_FACTOR", value_parser = positive_usize)]
    ann_search_expansion_factor: Option<usize>,

    #[arg(long, env = "ANN_BENCH_ANN_SEARCH_EXPANSION_MIN", value_parser = positive_usize)]
    ann_search_expansion_min: Option<usize>,

    #[arg(long, env = "ANN_BENCH_ANN_SEARCH_EXPANSION_MAX", value_parser = positive_usize)]
    ann_search_expansion_max: Option<usize>,
}

impl Args {
    fn benchmark_config(&self) -> Result<BenchmarkConfig, String> {
        BenchmarkConfig::new(
            self.n_samples,
            self.n_dims,
            self.n_queries,
            self.top_k,
            self.seed,
        )
        .map_err(|err| err.to_string())
    }

    fn ann_tuning(&self) -> Result<AnnTuningConfig, String> {
        let defaults = AnnTuningConfig::default();
        let tuning = AnnTuningConfig {
            max_connections: self
                .ann_max_connections
                .unwrap_or(defaults.max_connections),
            construction_expansion: self
                .ann_construction_expansion
                .unwrap_or(defaults.construction_expansion),
            search_expansion_factor: self
                .ann_search_expansion_factor
                .unwrap_or(defaults.search_expansion_factor),
            search_expansion_min: self
                .ann_search_expansion_min
                .unwrap_or(defaults.search_expansion_min),
            search_expansion_max: self
                .ann_search_expansion_max
                .unwrap_or(defaults.search_expansion_max),
        };
        if tuning.search_expansion_max < tuning.search_expansion_min {
            return Err(
                "--ann-search-expansion-max must be >= --ann-search-expansion-min".to_string(),
            );
        }
        Ok(tuning)
    }
}

fn positive_usize(raw: &str) -> Result<usize, String> {
    let parsed = raw
        .parse::<usize>()
        .map_err(|_| format!("invalid value '{raw}'"))?;
    if parsed == 0 {
        return Err("value must be > 0".to_string());
    }
    Ok(parsed)
}

fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();

    let (config, tuning) = match (args.benchmark_config(), args.ann_tuning()) {
        (Ok(config), Ok(tuning)) => (config, tuning),
        (Err(message), _) | (_, Err(message)) => {
            eprintln!("{message}");
            return ExitCode::from(2);
        }
    };

    let record = match run(&config, EngineRegistry::default_engines(tuning)) {
        Ok(record) => record,
        Err(err) => {
            eprintln!("Benchmark failed: {err}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = print_record_summary(&record, &mut std::io::stdout().lock()) {
        eprintln!("Benchmark failed: unable to print summary ({err}).");
        return ExitCode::FAILURE;
    }
    if let Err(err) = store::save_record(&record, &args.json_output) {
        eprintln!("Benchmark failed: unable to write result record ({err}).");
        return ExitCode::FAILURE;
    }
    println!("Saved results to {}", args.json_output.display());
    if let Err(err) = write_search_chart(&record, &args.chart_output) {
        eprintln!("Benchmark failed: unable to write chart ({err}).");
        return ExitCode::FAILURE;
    }
    println!("Saved chart to {}", args.chart_output.display());
    info!(engines = record.metrics().len(), "benchmark complete");
    ExitCode::SUCCESS
}
