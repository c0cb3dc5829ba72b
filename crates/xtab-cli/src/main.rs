mod config;
mod dataset;
mod report;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::debug;

use xtab_core::{analyze_crosstab, AnalysisOptions, ContingencyTable};
use xtab_worker::WorkerInfo;

use crate::config::Config;
use crate::dataset::Dataset;
use crate::report::ReportOptions;

#[derive(Parser)]
#[command(
    name = "xtab",
    version,
    about = "Crosstabulation with chi-square tests and association measures"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crosstabulate two variables and run every test and measure
    Analyze {
        /// JSON dataset (object of columns or array of records)
        file: PathBuf,

        /// Row variable
        #[arg(short, long)]
        row: String,

        /// Column variable
        #[arg(short, long)]
        col: String,

        /// Case weight variable
        #[arg(short, long)]
        weight: Option<String>,

        /// Confidence level for intervals (default from config)
        #[arg(long)]
        confidence: Option<f64>,

        /// Output format (default from config)
        #[arg(short, long)]
        format: Option<OutputFormat>,
    },

    /// Print the crosstab with its marginals only
    Table {
        /// JSON dataset (object of columns or array of records)
        file: PathBuf,

        /// Row variable
        #[arg(short, long)]
        row: String,

        /// Column variable
        #[arg(short, long)]
        col: String,

        /// Case weight variable
        #[arg(short, long)]
        weight: Option<String>,
    },

    /// Run the JSON-RPC analysis worker on stdio
    Serve,

    /// Show the resolved configuration
    Config,
}

#[derive(Clone, Copy, Debug, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    fn from_config(value: &str) -> Result<Self> {
        match value {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => bail!("invalid output.format '{other}' (expected text or json)"),
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config()?;

    match cli.command {
        Commands::Analyze {
            file,
            row,
            col,
            weight,
            confidence,
            format,
        } => cmd_analyze(&cfg, &file, &row, &col, weight.as_deref(), confidence, format),
        Commands::Table {
            file,
            row,
            col,
            weight,
        } => cmd_table(&cfg, &file, &row, &col, weight.as_deref()),
        Commands::Serve => xtab_worker::run_server(&WorkerInfo {
            instructions: cfg.worker.instructions,
        }),
        Commands::Config => cmd_config(&cfg),
    }
}

/// Variables pulled out of a dataset, ready for the engine.
struct Selection {
    x: Vec<Option<xtab_core::RawValue>>,
    y: Vec<Option<xtab_core::RawValue>>,
    weights: Option<Vec<f64>>,
}

fn select(file: &Path, row: &str, col: &str, weight: Option<&str>) -> Result<Selection> {
    let data = Dataset::load(file)?;
    let selection = Selection {
        x: data.variable(row)?,
        y: data.variable(col)?,
        weights: weight.map(|w| data.weights(w)).transpose()?,
    };
    debug!(
        file = %file.display(),
        cases = selection.x.len(),
        weighted = selection.weights.is_some(),
        "dataset loaded"
    );
    Ok(selection)
}

fn report_options<'a>(cfg: &Config, row: &'a str, col: &'a str) -> ReportOptions<'a> {
    ReportOptions {
        row_label: row,
        col_label: col,
        decimals: cfg.output.decimals,
        show_expected: cfg.output.show_expected,
        show_residuals: cfg.output.show_residuals,
    }
}

fn cmd_analyze(
    cfg: &Config,
    file: &Path,
    row: &str,
    col: &str,
    weight: Option<&str>,
    confidence: Option<f64>,
    format: Option<OutputFormat>,
) -> Result<()> {
    let format = match format {
        Some(f) => f,
        None => OutputFormat::from_config(&cfg.output.format)?,
    };
    let options = AnalysisOptions {
        confidence_level: confidence.unwrap_or(cfg.analysis.confidence_level),
    };
    if !(options.confidence_level > 0.0 && options.confidence_level < 1.0) {
        bail!(
            "confidence level must be between 0 and 1, got {}",
            options.confidence_level
        );
    }

    let sel = select(file, row, col, weight)?;
    let analysis = analyze_crosstab(&sel.x, &sel.y, sel.weights.as_deref(), &options)
        .with_context(|| format!("analyzing {row} * {col}"))?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&analysis)?),
        OutputFormat::Text => print!(
            "{}",
            report::render_analysis(&analysis, &report_options(cfg, row, col))
        ),
    }
    Ok(())
}

fn cmd_table(cfg: &Config, file: &Path, row: &str, col: &str, weight: Option<&str>) -> Result<()> {
    let sel = select(file, row, col, weight)?;
    let table = ContingencyTable::build(&sel.x, &sel.y, sel.weights.as_deref())
        .with_context(|| format!("tabulating {row} * {col}"))?;
    let opts = ReportOptions {
        show_expected: false,
        show_residuals: false,
        ..report_options(cfg, row, col)
    };
    print!("{}", report::render_table(&table, &opts));
    Ok(())
}

fn cmd_config(cfg: &Config) -> Result<()> {
    println!("Config: {}", config::show_config_path());
    println!();
    println!("[analysis]");
    println!("  confidence_level = {}", cfg.analysis.confidence_level);
    println!();
    println!("[output]");
    println!("  format = {}", cfg.output.format);
    println!("  decimals = {}", cfg.output.decimals);
    println!("  show_expected = {}", cfg.output.show_expected);
    println!("  show_residuals = {}", cfg.output.show_residuals);
    println!();
    println!("[worker]");
    if let Some(ref instr) = cfg.worker.instructions {
        println!("  instructions = {instr}");
    } else {
        println!("  instructions = (none)");
    }
    Ok(())
}
