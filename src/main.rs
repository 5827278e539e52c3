use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use station_stats::config::{DEFAULT_CHUNKS_PER_WORKER, DEFAULT_MIN_CHUNK_BYTES};
use station_stats::generate::{self, Generator, DEFAULT_SAMPLE};
use station_stats::{format, Config};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print min/mean/max per station, sorted by name
    Aggregate {
        /// Path to measurements file
        file: PathBuf,
        /// Worker threads (defaults to available cores)
        #[arg(short, long, env = "STATION_STATS_WORKERS")]
        workers: Option<usize>,
        #[arg(long, env = "STATION_STATS_CHUNKS_PER_WORKER", default_value_t = DEFAULT_CHUNKS_PER_WORKER)]
        chunks_per_worker: usize,
        #[arg(long, env = "STATION_STATS_MIN_CHUNK_BYTES", default_value_t = DEFAULT_MIN_CHUNK_BYTES)]
        min_chunk_bytes: usize,
        /// Print everything on one line as `{a=.., b=..}`
        #[arg(long)]
        braces: bool,
    },
    /// Write a synthetic measurements file
    Generate {
        /// Number of rows, underscores allowed (1_000_000_000)
        #[arg(value_parser = parse_rows)]
        rows: u64,
        #[arg(short, long, default_value = "data/measurements.txt")]
        output: PathBuf,
        /// `weather_stations.csv`-style list of names
        #[arg(long)]
        stations: Option<PathBuf>,
        /// Size of the working set of station names
        #[arg(long, default_value_t = DEFAULT_SAMPLE)]
        sample: usize,
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn parse_rows(raw: &str) -> Result<u64, String> {
    raw.replace('_', "").parse().map_err(|e| format!("invalid row count '{}': {}", raw, e))
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    match args.command {
        Command::Aggregate {
            file,
            workers,
            chunks_per_worker,
            min_chunk_bytes,
            braces,
        } => {
            if !file.is_file() {
                bail!("no such file: {}", file.display());
            }
            let mut config = Config::default()
                .with_chunks_per_worker(chunks_per_worker)
                .with_min_chunk_bytes(min_chunk_bytes);
            if let Some(workers) = workers {
                config = config.with_workers(workers);
            }
            let report = station_stats::aggregate_file(&file, &config)
                .with_context(|| format!("aggregating {}", file.display()))?;

            let out = BufWriter::new(io::stdout().lock());
            if braces {
                format::write_braced(out, &report.stations)?;
            } else {
                format::write_lines(out, &report.stations)?;
            }
            info!(lines = report.lines, skipped = report.skipped, "done");
        }
        Command::Generate {
            rows,
            output,
            stations,
            sample,
            seed,
        } => {
            let names = match stations {
                Some(path) => generate::load_station_names(&path)
                    .with_context(|| format!("loading station names from {}", path.display()))?,
                None => generate::builtin_station_names(),
            };
            info!(
                estimated_bytes = generate::estimate_file_size(&names, rows),
                "creating the file"
            );
            let mut generator = Generator::new(&names, sample, seed)?;
            let summary = generate::generate_file(&output, &mut generator, rows)
                .with_context(|| format!("writing {}", output.display()))?;
            info!(
                path = %output.display(),
                bytes = summary.bytes,
                stations = summary.stations.len(),
                "file written"
            );
        }
    }
    Ok(())
}
