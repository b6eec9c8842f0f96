//! CLI entry point for tally.
//!
//! This binary counts the matches of one regular expression in every file
//! under a directory and renders the per-file counts.
//!
//! # Usage
//!
//! ```bash
//! tally [OPTIONS] <COMMAND>
//!
//! # Bar chart of digit counts under ./data
//! tally scan --pattern '[0-9]' --path ./data
//!
//! # JSON output, sequential traversal, with a completeness check
//! tally scan --pattern '[abc]' --format json --sequential --verify
//!
//! # Compare recursive scans against generated ground truth
//! tally selftest --trials 100
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::eyre;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tally_core::{Config, ReportFormat, TraversalOrder, compile_pattern};
use tally_fixture::character_class_pattern;
use tally_report::{BarChart, JsonReport, ReportSink};
use tally_scanner::{ScanConfig as ScannerConfig, Scanner};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// CLI ARGUMENT TYPES
// =============================================================================

/// Count regular expression matches in every file under a directory.
#[derive(Parser)]
#[command(name = "tally", version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    command: Commands,

    /// Path to a JSON configuration file.
    #[arg(short, long, global = true, env = "TALLY_CONFIG")]
    config: Option<Utf8PathBuf>,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Scan a directory tree and render match counts per file.
    Scan {
        /// Regular expression to count.
        #[arg(short = 'e', long)]
        pattern: String,

        /// Directory to scan.
        #[arg(short, long, env = "TALLY_PATH", default_value = ".")]
        path: Utf8PathBuf,

        /// Scan one entry at a time instead of in parallel.
        #[arg(long)]
        sequential: bool,

        /// Worker thread count (defaults to all cores).
        #[arg(long)]
        threads: Option<usize>,

        /// Skip unreadable files instead of aborting.
        #[arg(long)]
        skip_unreadable: bool,

        /// Directory entry visitation order.
        #[arg(long, value_enum)]
        order: Option<OrderArg>,

        /// Seed for `--order shuffled` (default 0).
        #[arg(long, requires = "order")]
        seed: Option<u64>,

        /// Output format.
        #[arg(short, long, value_enum)]
        format: Option<FormatArg>,

        /// Check the result against a flat enumeration of the tree.
        #[arg(long)]
        verify: bool,
    },

    /// Compare recursive scans of generated trees with their ground truth.
    Selftest {
        /// Number of randomized trials.
        #[arg(short, long, default_value_t = 100)]
        trials: usize,

        /// Seed for the trials (random if omitted).
        #[arg(long)]
        seed: Option<u64>,
    },
}

/// Entry order choices.
#[derive(Clone, Copy, ValueEnum)]
enum OrderArg {
    /// Operating-system listing order.
    Listed,
    /// Lexicographic order.
    Sorted,
    /// Seeded random order.
    Shuffled,
}

impl OrderArg {
    /// Combines the order with `--seed`, which only a shuffled order accepts.
    fn into_order(self, seed: Option<u64>) -> color_eyre::Result<TraversalOrder> {
        match (self, seed) {
            (Self::Listed, None) => Ok(TraversalOrder::Listed),
            (Self::Sorted, None) => Ok(TraversalOrder::Sorted),
            (Self::Shuffled, seed) => Ok(TraversalOrder::Shuffled {
                seed: seed.unwrap_or(0),
            }),
            (Self::Listed | Self::Sorted, Some(_)) => {
                Err(eyre!("--seed only applies to --order shuffled"))
            }
        }
    }
}

/// Report output format.
#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    /// Text bar chart.
    Bars,
    /// JSON document.
    Json,
}

impl From<FormatArg> for ReportFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Bars => Self::Bars,
            FormatArg::Json => Self::Json,
        }
    }
}

/// Options for the `scan` command after CLI parsing.
struct ScanArgs<'a> {
    pattern: &'a str,
    path: &'a Utf8Path,
    sequential: bool,
    threads: Option<usize>,
    skip_unreadable: bool,
    order: Option<OrderArg>,
    seed: Option<u64>,
    format: Option<FormatArg>,
    verify: bool,
}

// =============================================================================
// INITIALIZATION FUNCTIONS
// =============================================================================

/// Initializes the tracing subscriber for logging.
///
/// Respects the `RUST_LOG` environment variable if set. Otherwise, uses
/// `debug` level if `--verbose` is set, or `info` level by default. Logs go
/// to stderr so reports on stdout stay machine-readable.
fn init_tracing(verbose: bool, no_color: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { "info" };
        EnvFilter::new(level)
    });

    // Check if colors should be disabled (flag or NO_COLOR env var)
    let use_ansi = !no_color && std::env::var("NO_COLOR").is_err();

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(use_ansi)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

/// Loads the configuration file, or defaults when none is given.
fn load_config(path: Option<&Utf8Path>) -> color_eyre::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };

    let config = Config::load(path)?;
    info!(path = %path, "Loaded configuration");
    Ok(config)
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

/// Runs a scan and renders the result to stdout.
fn run_scan(config: &Config, args: &ScanArgs<'_>) -> color_eyre::Result<()> {
    let mut settings = config.scan;
    if args.sequential {
        settings.parallel = false;
    }
    if args.threads.is_some() {
        settings.max_parallel_jobs = args.threads;
    }
    if args.skip_unreadable {
        settings.skip_unreadable = true;
    }
    if let Some(order) = args.order {
        settings.order = order.into_order(args.seed)?;
    }
    let format = args.format.map_or(config.report.format, ReportFormat::from);

    let pattern = compile_pattern(args.pattern)?;
    let scanner = Scanner::new(ScannerConfig::from_settings(args.path, &settings))?;
    let report = scanner.scan(&pattern)?;

    let label = args.path.as_str();
    let stdout = std::io::stdout();
    let handle = stdout.lock();
    match format {
        ReportFormat::Bars => {
            BarChart::new(handle, config.report.bar_width).render(&report.result, &pattern, label)?;
        }
        ReportFormat::Json => {
            JsonReport::new(handle, true).render(&report.result, &pattern, label)?;
        }
    }

    if !report.skipped.is_empty() {
        let stderr = std::io::stderr();
        let mut handle = stderr.lock();
        writeln!(handle)?;
        writeln!(handle, "Skipped ({}):", report.skipped.len())?;
        for (path, error) in &report.skipped {
            writeln!(handle, "  {path} - {error}")?;
        }
    }

    if args.verify {
        let audit = scanner.audit(&report.result)?;
        if !audit.is_complete() {
            let stderr = std::io::stderr();
            let mut handle = stderr.lock();
            for path in &audit.missing {
                writeln!(handle, "  missing: {path}")?;
            }
            for path in &audit.unexpected {
                writeln!(handle, "  unexpected: {path}")?;
            }
            return Err(eyre!(
                "scan result does not cover the tree: {} missing, {} unexpected",
                audit.missing.len(),
                audit.unexpected.len()
            ));
        }
        info!(files = report.result.len(), "Verified scan covers every file");
    }

    Ok(())
}

/// Runs randomized trials comparing recursive scans with ground truth.
///
/// Each trial draws a character-class pattern, generates a fixture with it,
/// and checks both a sequential and a parallel scan against the counts
/// recorded while the fixture was written.
fn run_selftest(config: &Config, trials: usize, seed: Option<u64>) -> color_eyre::Result<()> {
    let seed = seed.unwrap_or_else(rand::random);
    info!(trials, seed, "Starting self-test");

    let mut rng = StdRng::seed_from_u64(seed);
    let mut failures = 0_usize;
    let stderr = std::io::stderr();

    for trial in 0..trials {
        let source = character_class_pattern(&mut rng);
        let pattern = compile_pattern(&source)?;
        let fixture = tally_fixture::generate(&pattern, &mut rng)?;

        let sequential = tally_scanner::scan(fixture.root(), &pattern)?;
        let parallel = Scanner::new(
            ScannerConfig::from_settings(fixture.root(), &config.scan).with_parallel(true),
        )?
        .scan(&pattern)?
        .result;

        let truth = fixture.ground_truth();
        if &sequential != truth || &parallel != truth {
            failures += 1;
            writeln!(
                stderr.lock(),
                "trial {trial}: mismatch for pattern {source} under {}",
                fixture.root()
            )?;
        } else {
            debug!(trial, pattern = %source, files = truth.len(), "Trial matched");
        }
    }

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    if failures > 0 {
        writeln!(handle, "Outputs from recursion do not match creation result!")?;
        return Err(eyre!("{failures} of {trials} trials mismatched (seed {seed})"));
    }

    writeln!(
        handle,
        "Outputs from recursion match creation result! ({trials} trials, seed {seed})"
    )?;
    Ok(())
}

// =============================================================================
// MAIN ENTRY POINT
// =============================================================================

/// Application entry point.
fn main() -> color_eyre::Result<()> {
    // 1. Install color-eyre FIRST (before any potential panics)
    color_eyre::install()?;

    // 2. Parse CLI arguments
    let cli = Cli::parse();

    // 3. Initialize tracing (handles --no-color for log output)
    init_tracing(cli.verbose, cli.no_color);

    // 4. Load configuration
    let config = load_config(cli.config.as_deref())?;

    // 5. Route to appropriate command
    match &cli.command {
        Commands::Scan {
            pattern,
            path,
            sequential,
            threads,
            skip_unreadable,
            order,
            seed,
            format,
            verify,
        } => {
            let args = ScanArgs {
                pattern,
                path,
                sequential: *sequential,
                threads: *threads,
                skip_unreadable: *skip_unreadable,
                order: *order,
                seed: *seed,
                format: *format,
                verify: *verify,
            };
            run_scan(&config, &args)
        }
        Commands::Selftest { trials, seed } => run_selftest(&config, *trials, *seed),
    }
}
