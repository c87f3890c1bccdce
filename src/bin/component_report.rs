//! component-report - print the value distribution and closest pairs of a
//! component table, optionally exporting the 3D chart.
//!
//! Usage:
//!   component-report                         # data/sample_capacitor_data.csv
//!   component-report caps.csv --bins 8 --log
//!   component-report caps.csv --threshold 0.02 --top 10
//!   component-report caps.csv --export caps.pdf --scheme plasma
//!   component-report caps.csv res.csv         # overlay a resistor table
//!   component-report sample_capacitor_data.csv --no-partner
//!
//! A table named like `*capacitor*` picks up its `*resistor*` sibling (and
//! the other way round) when that file exists, unless `--no-partner` is given.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;

use circuit_viewer::analysis::{analyze, closest_pairs, find_close_pairs, ValueSummary};
use circuit_viewer::config::ViewerConfig;
use circuit_viewer::data::filter::ValueFilter;
use circuit_viewer::color::ColorScheme;
use circuit_viewer::data::loader::{load_file, partner_path};
use circuit_viewer::data::model::ComponentTable;
use circuit_viewer::export::export_scene;
use circuit_viewer::report::{format_distribution_table, format_pair_table, format_summary};
use circuit_viewer::scene::{render_overlaid, Camera, DisplayOptions};

/// Summarize a capacitor or resistor table.
#[derive(Parser)]
#[command(name = "component-report", about = "Value distribution and proximity report")]
struct Args {
    /// Table to analyze (.csv, .json or .parquet).
    /// Default: the configured data file.
    #[arg(value_name = "DATA_FILE")]
    data_file: Option<PathBuf>,

    /// Table of the other component kind to report and draw alongside.
    /// Default: the sibling file with capacitor/resistor swapped in its name.
    #[arg(value_name = "PARTNER_FILE")]
    partner_file: Option<PathBuf>,

    /// Do not look for a sibling table of the other kind.
    #[arg(long, conflicts_with = "partner_file")]
    no_partner: bool,

    /// Number of value bins (2-20).
    #[arg(long, value_name = "N")]
    bins: Option<usize>,

    /// Request logarithmic bins.
    #[arg(long)]
    log: bool,

    /// Endpoint distance below which two components count as close.
    #[arg(long, value_name = "T")]
    threshold: Option<f64>,

    /// How many of the closest pairs to list.
    #[arg(long, value_name = "N")]
    top: Option<usize>,

    /// Colour scheme for the chart (viridis, plasma, inferno, magma,
    /// cividis or rainbow).
    #[arg(long, value_name = "NAME")]
    scheme: Option<ColorScheme>,

    /// Also draw the chart to this file (.png, .jpg, .svg or .pdf).
    #[arg(long, value_name = "PATH")]
    export: Option<PathBuf>,
}

impl Args {
    /// Display options from the config with command-line overrides applied.
    fn display_options(&self, config: &ViewerConfig) -> DisplayOptions {
        let mut options = config.display.clone();
        if let Some(bins) = self.bins {
            options.num_bins = bins;
        }
        options.use_log |= self.log;
        if let Some(threshold) = self.threshold {
            options.proximity_threshold = threshold;
        }
        if let Some(top) = self.top {
            options.closest_pairs = top;
        }
        if let Some(scheme) = self.scheme {
            options.color_scheme = scheme;
        }
        options.sanitized()
    }

    /// The overlay table path: explicit, guessed from the name, or none.
    fn partner(&self, path: &Path) -> Option<PathBuf> {
        if self.no_partner {
            return None;
        }
        self.partner_file
            .clone()
            .or_else(|| partner_path(path).filter(|p| p.is_file()))
    }
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if let Err(e) = run(&args) {
        log::error!("{e:#}");
        eprintln!("Error: {e:#}");
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    let config = ViewerConfig::load();
    let options = args.display_options(&config);
    let path = args
        .data_file
        .clone()
        .unwrap_or_else(|| config.default_data_file.clone());

    let table = load_file(&path).with_context(|| format!("loading {}", path.display()))?;
    let partner = match args.partner(&path) {
        Some(partner_file) => Some(load_partner(&table, &partner_file)?),
        None => None,
    };

    print_table_report(&table, &path, &options)?;

    let records = find_close_pairs(&table.components, options.proximity_threshold);
    let nearest = closest_pairs(&records, options.closest_pairs);
    let title = format!(
        "Closest edges ({} of {} pairs below {})",
        nearest.len(),
        records.len(),
        options.proximity_threshold
    );
    println!("{}", format_pair_table(&nearest, Some(&title)));

    if let Some((partner, partner_file)) = &partner {
        println!();
        println!("Overlay:");
        print_table_report(partner, partner_file, &options)?;
    }

    if let Some(export) = &args.export {
        export_chart(
            &table,
            partner.as_ref().map(|(t, _)| t),
            &options,
            &config,
            export,
        )?;
        println!();
        println!("Saved chart to {}", export.display());
    }
    Ok(())
}

fn load_partner(
    table: &ComponentTable,
    path: &Path,
) -> anyhow::Result<(ComponentTable, PathBuf)> {
    let partner = load_file(path).with_context(|| format!("loading {}", path.display()))?;
    anyhow::ensure!(
        partner.kind == table.kind.other(),
        "{} holds {}; the overlay must hold {}",
        path.display(),
        partner.kind.plural(),
        table.kind.other().plural()
    );
    Ok((partner, path.to_path_buf()))
}

/// Header, summary and distribution table of one table.
fn print_table_report(
    table: &ComponentTable,
    path: &Path,
    options: &DisplayOptions,
) -> anyhow::Result<()> {
    let values = table.values();

    println!(
        "{} ({} {}, unit: {})",
        path.display(),
        table.len(),
        table.kind.plural(),
        table.unit
    );
    println!();

    if let Some(summary) = ValueSummary::from_values(&values) {
        println!("{}", format_summary(&summary, &table.unit));
        println!();
    }

    let distribution = analyze(&values, options.num_bins, options.use_log)
        .with_context(|| format!("binning the {} column", table.kind.quantity()))?;
    let title = format!(
        "{} distribution ({} bins)",
        table.kind.quantity(),
        distribution.scale
    );
    println!("{}", format_distribution_table(&distribution, Some(&title)));
    println!();
    Ok(())
}

fn export_chart(
    table: &ComponentTable,
    partner: Option<&ComponentTable>,
    options: &DisplayOptions,
    config: &ViewerConfig,
    path: &Path,
) -> anyhow::Result<()> {
    let filter = ValueFilter::for_table(table).context("table has no values")?;
    let scene = render_overlaid(table, partner, &filter, options)?;
    export_scene(
        &scene,
        &Camera::default(),
        path,
        (config.export_width, config.export_height),
    )
    .with_context(|| format!("exporting {}", path.display()))
}
