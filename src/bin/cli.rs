//! poi-cluster CLI - Debug tool for POI clustering
//!
//! Usage:
//!   poi-cluster-cli cluster <file> [--format json|csv] [--config <cfg.json>] [--output <file>]
//!   poi-cluster-cli validate <file> [--format json|csv]
//!
//! Input files hold `id`, `name`, `lat`, `lng` per POI, either as a JSON
//! array of objects or as a CSV file with those headers. The tool prints
//! which strategy produced the clusters and a summary of each one.

use clap::{Parser, Subcommand, ValueEnum};
use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use poi_cluster::{
    ClusterConfig, ClusterEngine, ClusteringResult, PoiPoint, Result, StrategyKind, validate_batch,
};

#[derive(Parser)]
#[command(name = "poi-cluster-cli")]
#[command(about = "Debug tool for geographic POI clustering", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose debug output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Cluster a batch of POIs
    Cluster {
        /// File containing the POIs
        file: PathBuf,

        /// Input format (detected from the file extension when omitted)
        #[arg(short, long)]
        format: Option<InputFormat>,

        /// JSON config file with clustering constants
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the threshold and neighbor-chain radius in km
        #[arg(long)]
        radius_km: Option<f64>,

        /// Strategies to try, in order (repeatable)
        #[arg(long = "strategy", value_enum)]
        strategies: Vec<StrategyArg>,

        /// Write clusters and assignment as JSON to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check a batch for invalid coordinates and duplicate ids
    Validate {
        /// File containing the POIs
        file: PathBuf,

        /// Input format (detected from the file extension when omitted)
        #[arg(short, long)]
        format: Option<InputFormat>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum InputFormat {
    Json,
    Csv,
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    Density,
    Threshold,
    NeighborChain,
}

impl From<StrategyArg> for StrategyKind {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Density => StrategyKind::Density,
            StrategyArg::Threshold => StrategyKind::Threshold,
            StrategyArg::NeighborChain => StrategyKind::NeighborChain,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format(|buf, record| writeln!(buf, "[{:5}] {}", record.level(), record.args()))
        .init();

    let outcome = match cli.command {
        Commands::Cluster {
            file,
            format,
            config,
            radius_km,
            strategies,
            output,
        } => run_cluster(
            &file,
            format,
            config.as_deref(),
            radius_km,
            &strategies,
            output.as_deref(),
        ),
        Commands::Validate { file, format } => run_validate(&file, format),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Load POIs from a JSON or CSV file
fn load_pois(path: &Path, format: Option<InputFormat>) -> Result<Vec<PoiPoint>> {
    let format = format.unwrap_or_else(|| {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => InputFormat::Csv,
            _ => InputFormat::Json,
        }
    });

    let pois = match format {
        InputFormat::Json => {
            let reader = BufReader::new(File::open(path)?);
            serde_json::from_reader(reader)?
        }
        InputFormat::Csv => {
            let mut reader = csv::Reader::from_path(path)?;
            reader
                .deserialize::<PoiPoint>()
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
    };
    Ok(pois)
}

fn run_cluster(
    file: &Path,
    format: Option<InputFormat>,
    config_path: Option<&Path>,
    radius_km: Option<f64>,
    strategies: &[StrategyArg],
    output: Option<&Path>,
) -> Result<()> {
    let mut config = match config_path {
        Some(path) => ClusterConfig::from_json_file(path)?,
        None => ClusterConfig::default(),
    };
    if let Some(radius) = radius_km {
        config.threshold_radius_km = radius;
        config.neighbor_chain_max_km = radius;
    }
    if !strategies.is_empty() {
        config.strategies = strategies.iter().map(|&s| s.into()).collect();
    }

    let engine = ClusterEngine::new(config)?;
    let pois = load_pois(file, format)?;

    println!("\n{}", "=".repeat(60));
    println!("Clustering {} POIs from: {}", pois.len(), file.display());
    println!("{}", "=".repeat(60));

    let result = engine.run_checked(pois)?;
    print_result(&result);

    if let Some(path) = output {
        write_output(path, &result)?;
        println!("\nWrote clusters to {}", path.display());
    }

    Ok(())
}

fn print_result(result: &ClusteringResult) {
    let strategy = result
        .strategy
        .map(|s| s.to_string())
        .unwrap_or_else(|| "none (base case)".to_string());

    println!("\nStrategy: {strategy}");
    println!("Clusters: {}", result.clusters.len());
    if result.noise_count > 0 {
        println!("Noise points (trailing cluster): {}", result.noise_count);
    }
    println!();

    for (cluster, summary) in result.clusters.iter().zip(result.summaries()) {
        println!(
            "  {:<12} {:>4} POIs  center ({:.5}, {:.5})  radius {:.2}km",
            summary.cluster_id, summary.size, summary.center_lat, summary.center_lng, summary.radius_km
        );
        for poi in &cluster.members {
            log::debug!("      {} {} ({:.5}, {:.5})", poi.id, poi.name, poi.lat, poi.lng);
        }
    }
}

fn write_output(path: &Path, result: &ClusteringResult) -> Result<()> {
    let payload = serde_json::json!({
        "strategy": result.strategy,
        "clusters": result.clusters,
        "assignment": result.assignment(),
    });
    fs::write(path, serde_json::to_string_pretty(&payload)?)?;
    Ok(())
}

fn run_validate(file: &Path, format: Option<InputFormat>) -> Result<()> {
    let pois = load_pois(file, format)?;
    validate_batch(&pois)?;
    println!("[OK] {} POIs, all coordinates valid, ids unique", pois.len());
    Ok(())
}
