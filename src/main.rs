//! RAN trace preparation CLI
//!
//! Command-line interface for building training tables and comparing
//! predicted UE trajectories.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::{filter::LevelFilter, EnvFilter, FmtSubscriber};

use ran_trace_prep::{
    analytics::logger::{
        load_report, print_comparison_summary, print_preparation_summary, save_comparison, ResultsLogger,
    },
    config::{ComparisonConfig, PipelineConfig},
    pipeline::runner::BatchRunner,
    run_comparison,
};

#[derive(Parser)]
#[command(name = "ran-prep")]
#[command(author = "RAN Localization Team")]
#[command(version = "0.1.0")]
#[command(about = "Training-data preparation for RAN simulation traces", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Preset {
    /// 3GPP hexagonal layout, combined table enabled
    #[value(name = "3gpp")]
    ThreeGpp,
    /// LOS layout, per-scenario tables only
    Los,
}

#[derive(Subcommand)]
enum Commands {
    /// Build training tables from every scenario under a data root
    Prepare {
        /// Data root containing the scenario directories
        #[arg(short, long)]
        root: PathBuf,

        /// Output directory (defaults to <root>/output)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Scenario directory name prefix
        #[arg(short, long)]
        prefix: Option<String>,

        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Built-in configuration used when no file is given
        #[arg(long, value_enum, default_value = "3gpp")]
        preset: Preset,

        /// Skip the combined table
        #[arg(long)]
        no_combined: bool,

        /// Add neighbor cell coordinate columns
        #[arg(long)]
        neighbor_coordinates: bool,

        /// Skip failing scenarios instead of aborting
        #[arg(long)]
        keep_going: bool,
    },

    /// Compare actual and predicted UE trajectories
    Compare {
        /// Actual position trace
        #[arg(short, long)]
        actual: Option<PathBuf>,

        /// Predicted trajectory file
        #[arg(short, long)]
        predicted: Option<PathBuf>,

        /// Output JSON file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the summary of a saved run or comparison report
    Report {
        /// Input JSON file written by `prepare` or `compare`
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Print the effective configuration
    Info {
        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(log_level).into())
        .from_env_lossy();
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    match cli.command {
        Commands::Prepare {
            root,
            output,
            prefix,
            config,
            preset,
            no_combined,
            neighbor_coordinates,
            keep_going,
        } => {
            let mut config = load_config(config.as_deref(), preset)?;
            if let Some(prefix) = prefix {
                config.scenario_prefix = prefix;
            }
            config.write_combined &= !no_combined;
            config.include_neighbor_coordinates |= neighbor_coordinates;
            config.continue_on_error |= keep_going;

            let output = output.unwrap_or_else(|| root.join("output"));
            run_preparation(config, &root, &output)?;
        }

        Commands::Compare {
            actual,
            predicted,
            output,
        } => {
            let defaults = ComparisonConfig::default();
            let config = ComparisonConfig {
                actual_file: actual.unwrap_or(defaults.actual_file),
                predicted_file: predicted.unwrap_or(defaults.predicted_file),
                output_file: output.unwrap_or(defaults.output_file),
                ..defaults
            };
            run_trajectory_comparison(&config)?;
        }

        Commands::Report { input } => {
            show_report(&input)?;
        }

        Commands::Info { config } => {
            let config = load_config(config.as_deref(), Preset::ThreeGpp)?;
            print_info(&config)?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>, preset: Preset) -> Result<PipelineConfig> {
    match path {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            PipelineConfig::from_json_file(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))
        }
        None => Ok(match preset {
            Preset::ThreeGpp => PipelineConfig::default(),
            Preset::Los => PipelineConfig::offline_los(),
        }),
    }
}

fn run_preparation(config: PipelineConfig, root: &Path, output: &Path) -> Result<()> {
    println!();
    println!("╔══════════════════════════════════════════════════════════╗");
    println!("║       RAN Trace Preparation                              ║");
    println!("╚══════════════════════════════════════════════════════════╝");
    println!();

    info!("Configuration:");
    info!("  Data root:        {}", root.display());
    info!("  Scenario prefix:  {}", config.scenario_prefix);
    info!("  Cells:            {:?}", config.cell_ids);
    info!("  Neighbors kept:   {}", config.neighbor_count);
    info!("  Window duration:  {}", config.window_duration);
    println!();

    let runner = BatchRunner::new(config, root, output);
    let results = runner.run()?;

    print_preparation_summary(&results);

    let logger = ResultsLogger::new(output);
    let summary_path = logger.save_preparation(&results)?;

    println!();
    println!("📁 Scenario tables saved in: {}", runner.scenario_dir().display());
    println!("📁 Run summary: {}", summary_path.display());
    println!();

    Ok(())
}

fn run_trajectory_comparison(config: &ComparisonConfig) -> Result<()> {
    info!("Comparing {} against {}", config.predicted_file.display(), config.actual_file.display());

    let results = run_comparison(config).context("Trajectory comparison failed")?;
    print_comparison_summary(&results);
    save_comparison(&results, &config.output_file)?;

    println!();
    println!("📊 Comparison saved to: {}", config.output_file.display());
    println!();

    Ok(())
}

fn show_report(input: &Path) -> Result<()> {
    info!("Loading results from: {}", input.display());
    let report = load_report(input)?;
    println!("{}", report.format_summary());
    Ok(())
}

fn print_info(config: &PipelineConfig) -> Result<()> {
    println!();
    println!("╔══════════════════════════════════════════════════════════╗");
    println!("║       RAN Trace Preparation - Info                       ║");
    println!("╚══════════════════════════════════════════════════════════╝");
    println!();
    println!("STAGES:");
    println!("  • Log Loader          - cell logs + UE position trace");
    println!("  • Time Normalizer     - per-source relative timestamps");
    println!("  • Neighbor Selector   - top-N valid neighbors per row");
    println!("  • Position Joiner     - exact (time, UE) left join");
    println!("  • Smoother            - per-UE trailing moving average");
    println!("  • Coordinate Mapper   - cell site coordinates");
    println!("  • Finalizer           - rounding, rescaling, CSV output");
    println!();
    println!("USAGE:");
    println!("  ran-prep prepare --root data            # Build training tables");
    println!("  ran-prep compare -a actual -p predicted  # Trajectory errors");
    println!("  ran-prep report -i output/logs/x.json    # Reprint a saved summary");
    println!();
    println!("CONFIGURATION:");
    println!(
        "{}",
        serde_json::to_string_pretty(config).context("Failed to serialize configuration")?
    );
    println!();
    Ok(())
}
