//! generate-sample - write a synthetic capacitor or resistor table.
//!
//! Usage:
//!   generate-sample                                  # 200 capacitors as CSV
//!   generate-sample --kind resistor --count 500
//!   generate-sample --kind r --output sample_resistor_data.csv
//!   generate-sample --format parquet --output data/caps.parquet

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};

use circuit_viewer::data::model::ComponentKind;
use circuit_viewer::data::sample::synthetic_table;
use circuit_viewer::data::writer::save_file;

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Csv,
    Parquet,
    Json,
}

impl Format {
    fn extension(self) -> &'static str {
        match self {
            Format::Csv => "csv",
            Format::Parquet => "parquet",
            Format::Json => "json",
        }
    }
}

/// Write a synthetic component table for trying out the viewer.
#[derive(Parser)]
#[command(name = "generate-sample", about = "Generate a synthetic component table")]
struct Args {
    /// Component kind to generate (capacitor or resistor, or c / r).
    #[arg(long, default_value = "capacitor")]
    kind: ComponentKind,

    /// Number of components.
    #[arg(long, default_value_t = 200)]
    count: usize,

    /// Output format. An explicit --output path is written in the format
    /// of its own extension.
    #[arg(long, value_enum, default_value = "csv")]
    format: Format,

    /// Output path (default: sample_<kind>_data.<format>).
    #[arg(long, short = 'o', value_name = "PATH")]
    output: Option<PathBuf>,

    /// Seed for the deterministic generator.
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let kind = args.kind;
    let output = args.output.unwrap_or_else(|| {
        PathBuf::from(format!("sample_{kind}_data.{}", args.format.extension()))
    });

    let table = synthetic_table(kind, args.count, args.seed);
    save_file(&table, &output).with_context(|| format!("writing {}", output.display()))?;

    println!(
        "Wrote {} {} to {}",
        table.len(),
        kind.plural(),
        output.display()
    );
    Ok(())
}
