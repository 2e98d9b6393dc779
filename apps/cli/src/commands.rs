//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use convarchive_core::maintenance::{clean_pairs, scaffold_pairs};
use convarchive_core::pipeline::{
    ConvertOptions, MergeOptions, MergeOutcome, ProgressReporter, convert, merge,
};
use convarchive_shared::{AppConfig, init_config, load_config};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// convarchive: turn AI conversation exports into markdown archives.
#[derive(Parser)]
#[command(
    name = "convarchive",
    version,
    about = "Convert AI conversation exports into question/answer files and merge them into one document.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Convert transcript JSON exports into numbered question/answer files.
    Convert {
        /// Directory to write pair files into (created if missing).
        target_directory: PathBuf,

        /// Number assigned to the first pair.
        start_number: u64,

        /// Transcript JSON files to read.
        #[arg(required = true)]
        json_files: Vec<PathBuf>,
    },

    /// Merge a directory's question/answer files into one markdown document.
    Merge {
        /// Directory holding the pair files.
        directory: PathBuf,

        /// Output file name, written inside the directory.
        output_filename: Option<String>,

        /// Shallowest heading level allowed inside a question or answer.
        #[arg(long)]
        heading_depth: Option<usize>,

        /// Title of the merged document.
        #[arg(long)]
        title: Option<String>,
    },

    /// Pre-create empty question/answer files for a range of numbers.
    Scaffold {
        /// Directory to create the files in (created if missing).
        directory: PathBuf,

        /// First pair number.
        start_number: u64,

        /// Number of pairs to create.
        count: u64,
    },

    /// Delete all question/answer files in a directory.
    Clean {
        /// Directory to clean.
        directory: PathBuf,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "convarchive=info",
        1 => "convarchive=debug",
        _ => "convarchive=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Convert {
            target_directory,
            start_number,
            json_files,
        } => cmd_convert(&target_directory, start_number, json_files),
        Command::Merge {
            directory,
            output_filename,
            heading_depth,
            title,
        } => cmd_merge(&directory, output_filename, heading_depth, title),
        Command::Scaffold {
            directory,
            start_number,
            count,
        } => cmd_scaffold(&directory, start_number, count),
        Command::Clean { directory } => cmd_clean(&directory),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_convert(target_dir: &Path, start_number: u64, json_files: Vec<PathBuf>) -> Result<()> {
    let config = load_config()?;

    let opts = ConvertOptions {
        target_dir: target_dir.to_path_buf(),
        start_index: start_number,
        inputs: json_files,
        dedup_prefix_chars: config.convert.dedup_prefix_chars,
    };

    info!(
        target = %target_dir.display(),
        start_number,
        files = opts.inputs.len(),
        "converting transcripts"
    );

    let reporter = CliProgress::new();
    let result = convert(&opts, &reporter)?;

    println!();
    println!("  Conversion complete!");
    println!("  Target:   {}", result.target_dir.display());
    println!(
        "  Inputs:   {} read, {} skipped",
        result.files_read, result.files_skipped
    );
    println!(
        "  Messages: {} extracted, {} unique",
        result.messages_extracted, result.unique_messages
    );
    match result.indices {
        Some((first, last)) => println!("  Pairs:    {} ({first}..={last})", result.pair_count),
        None => println!("  Pairs:    0"),
    }
    println!("  Files:    {}", result.files_written);
    println!("  Time:     {:.1}s", result.elapsed.as_secs_f64());
    println!();

    Ok(())
}

fn cmd_merge(
    directory: &Path,
    output_filename: Option<String>,
    heading_depth: Option<usize>,
    title: Option<String>,
) -> Result<()> {
    let mut config = load_config()?;
    if let Some(name) = output_filename {
        config.merge.output_filename = name;
    }
    if let Some(depth) = heading_depth {
        config.merge.heading_depth = depth;
    }
    if let Some(title) = title {
        config.merge.title = title;
    }
    config.validate()?;

    let opts = MergeOptions {
        dir: directory.to_path_buf(),
        output_filename: config.merge.output_filename,
        title: config.merge.title,
        heading_depth: config.merge.heading_depth,
    };

    info!(dir = %directory.display(), output = %opts.output_filename, "merging pair files");

    let reporter = CliProgress::new();
    match merge(&opts, &reporter)? {
        MergeOutcome::Merged {
            output_path,
            pair_count,
        } => {
            println!(
                "Merged {pair_count} conversation pairs into {}",
                output_path.display()
            );
        }
        MergeOutcome::NothingToMerge => {
            println!("No conversation files found to merge.");
        }
    }

    Ok(())
}

fn cmd_scaffold(directory: &Path, start_number: u64, count: u64) -> Result<()> {
    info!(dir = %directory.display(), start_number, count, "scaffolding pair files");
    let summary = scaffold_pairs(directory, start_number, count)?;
    println!(
        "Created {} files, skipped {} existing in {}",
        summary.created,
        summary.skipped,
        directory.display()
    );
    Ok(())
}

fn cmd_clean(directory: &Path) -> Result<()> {
    info!(dir = %directory.display(), "cleaning pair files");
    let deleted = clean_pairs(directory)?;
    println!(
        "Deleted {deleted} conversation files in {}",
        directory.display()
    );
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn file_read(&self, path: &Path, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Reading [{current}/{total}] {}", path.display()));
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}
