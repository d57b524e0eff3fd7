//! filehandler command-line interface
//!
//! Load, convert and write files of every supported format from the shell.
//! Per-file failures are printed and never change the exit status; only
//! malformed calls (missing input paths, unreadable manifests, bad flags)
//! exit non-zero.

mod config;
mod logging;
mod progress;

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use colored::Colorize;
use config::{Config, IoConfig, CONFIG_FILE_NAME, DEFAULT_CONFIG, DEFAULT_LOG_FILE};
use filehandler_backend::{resolve, FileHandler, LoadResult, PathSpec, WriteResult, WriteSpec};
use filehandler_core::{FileFormat, Progress};
use progress::BarProgress;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Verbosity level for output control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verbosity {
    /// Suppress all output except errors
    Quiet,
    /// Normal output (default)
    Normal,
    /// Verbose output with extra details
    Verbose,
}

impl Verbosity {
    /// Create from CLI flags
    const fn from_flags(quiet: bool, verbose: bool) -> Self {
        if quiet {
            Self::Quiet
        } else if verbose {
            Self::Verbose
        } else {
            Self::Normal
        }
    }

    /// Check if output should be shown (not quiet)
    const fn should_show_output(self) -> bool {
        !matches!(self, Self::Quiet)
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "filehandler",
    about = "Load, convert and write txt, json, csv, parquet, xlsx, pptx and pdf files",
    version
)]
struct Args {
    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Show detailed processing information
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Append log records to this file (overrides the config file)
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Transfer flags shared by the I/O commands.
#[derive(ClapArgs, Debug, Default)]
struct IoFlags {
    /// Text encoding for txt and json files ("none" disables decoding)
    #[arg(long, value_name = "LABEL")]
    encoding: Option<String>,

    /// Transfer mode; a mode containing "b" moves raw bytes
    #[arg(long)]
    mode: Option<String>,

    /// Spread the batch over a worker pool
    #[arg(long)]
    parallel: bool,

    /// Worker count for --parallel
    #[arg(long, value_name = "N")]
    workers: Option<usize>,
}

impl IoFlags {
    /// Overlay the flags on a config section.
    fn apply(self, section: IoConfig) -> IoConfig {
        section.overlay(IoConfig {
            encoding: self.encoding,
            mode: self.mode,
            parallel: self.parallel.then_some(true),
            workers: self.workers,
            backoff_secs: None,
        })
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load files and print what each one holds
    #[command(long_about = "Load one or more files and print a summary per file.\n\
                      \n\
                      The format is chosen by extension; unknown extensions are read as text.\n\
                      Files that fail to load are reported and do not stop the batch.\n\
                      \n\
                      Examples:\n\
                        filehandler load notes.txt data.csv\n\
                        filehandler load report.pdf --password report.pdf=secret\n\
                        filehandler load *.json --parallel --json")]
    Load {
        /// Files to load
        #[arg(required = true, value_name = "PATH")]
        paths: Vec<PathBuf>,

        /// Password for a file, as PATH=PASSWORD (only used by pdf)
        #[arg(long = "password", value_name = "PATH=PASSWORD", value_parser = parse_password)]
        passwords: Vec<(PathBuf, String)>,

        /// Print each payload as JSON instead of a summary
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        io: IoFlags,
    },

    /// Load one file and write its content to another format
    Convert {
        /// Source file
        input: PathBuf,

        /// Target file (format chosen by extension)
        output: PathBuf,

        #[command(flatten)]
        io: IoFlags,
    },

    /// Write the files described by a JSON manifest of path to data
    #[command(long_about = "Write files from a JSON manifest.\n\
                      \n\
                      The manifest is an object whose keys are target paths. String values\n\
                      are written as text, anything else as structured data.\n\
                      \n\
                      Example manifest:\n\
                        {\"out/notes.txt\": \"hello\", \"out/data.json\": {\"n\": 1}}")]
    Write {
        /// JSON manifest
        manifest: PathBuf,

        /// Print the result mapping as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        io: IoFlags,
    },

    /// List supported formats
    Formats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage configuration files
    #[command(long_about = "Manage filehandler configuration files.\n\
                      \n\
                      Configuration files are loaded in this order (later overrides earlier):\n\
                        1. User config: ~/.filehandler.toml\n\
                        2. Project config: ./.filehandler.toml\n\
                        3. Command-line arguments")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Create a .filehandler.toml with commented defaults
    Init {
        /// Create in the home directory instead of the current directory
        #[arg(long)]
        global: bool,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Display the effective configuration
    Show {
        /// Output as JSON instead of TOML
        #[arg(long)]
        json: bool,
    },

    /// Show the path of the effective configuration file
    Path,
}

fn parse_password(s: &str) -> Result<(PathBuf, String), String> {
    s.split_once('=')
        .filter(|(path, _)| !path.is_empty())
        .map(|(path, password)| (PathBuf::from(path), password.to_string()))
        .ok_or_else(|| format!("expected PATH=PASSWORD, got '{s}'"))
}

fn main() -> Result<()> {
    let config = Config::discover();
    let args = Args::parse();
    let verbosity = Verbosity::from_flags(args.quiet, args.verbose);

    let logging = config.logging_section();
    let log_file = match (&args.log_file, logging.file.as_deref()) {
        (Some(path), _) => Some(path.clone()),
        (None, Some("")) => None,
        (None, Some(path)) => Some(PathBuf::from(path)),
        (None, None) => Some(PathBuf::from(DEFAULT_LOG_FILE)),
    };
    let file_level = logging::parse_level(logging.level.as_deref().unwrap_or("info"))?;
    logging::init(verbosity, log_file.as_deref(), file_level)?;

    let show_progress = verbosity.should_show_output() && logging.progress.unwrap_or(true);
    let progress: Arc<dyn Progress> = if show_progress {
        Arc::new(BarProgress::new())
    } else {
        Arc::new(BarProgress::hidden())
    };

    match args.command {
        Commands::Load {
            paths,
            passwords,
            json,
            io,
        } => {
            let handler = FileHandler::new()
                .with_options(io.apply(config.load_section()).to_options())
                .with_progress(progress);
            load_command(&handler, paths, passwords, json)
        }
        Commands::Convert { input, output, io } => {
            let reader = FileHandler::new()
                .with_options(config.load_section().to_options())
                .with_progress(progress.clone());
            let writer = FileHandler::new()
                .with_options(io.apply(config.write_section()).to_options())
                .with_progress(progress);
            convert_command(&reader, &writer, &input, &output, verbosity)
        }
        Commands::Write { manifest, json, io } => {
            let handler = FileHandler::new()
                .with_options(io.apply(config.write_section()).to_options())
                .with_progress(progress);
            write_command(&handler, &manifest, json)
        }
        Commands::Formats { json } => formats_command(json),
        Commands::Config { action } => config_command(action, &config, verbosity),
    }
}

fn load_command(
    handler: &FileHandler,
    paths: Vec<PathBuf>,
    passwords: Vec<(PathBuf, String)>,
    json_output: bool,
) -> Result<()> {
    let mut spec = PathSpec::from_paths(paths);
    for (path, password) in passwords {
        spec.insert(path, Some(password));
    }
    let results = handler.load_spec(&spec)?;

    if json_output {
        let rendered: serde_json::Map<String, serde_json::Value> = results
            .into_iter()
            .map(|(path, outcome)| {
                let value = match outcome {
                    Ok(payload) => payload.to_json(),
                    Err(message) => serde_json::json!({ "error": message }),
                };
                (path, value)
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rendered)?);
    } else {
        print_load_results(&results);
    }
    Ok(())
}

fn print_load_results(results: &LoadResult) {
    for (path, outcome) in results {
        match outcome {
            Ok(payload) => println!("{} {}: {}", "✓".green().bold(), path, payload.summary()),
            Err(message) => println!("{} {}", "✗".red().bold(), message),
        }
    }
}

fn print_write_results(results: &WriteResult) {
    for (path, outcome) in results {
        match outcome.message() {
            None => println!("{} {}", "✓".green().bold(), path),
            Some(message) => println!("{} {}", "✗".red().bold(), message),
        }
    }
}

fn convert_command(
    reader: &FileHandler,
    writer: &FileHandler,
    input: &Path,
    output: &Path,
    verbosity: Verbosity,
) -> Result<()> {
    let mut loaded = reader.load(input)?;
    let payload = match loaded.swap_remove(&input.display().to_string()) {
        Some(Ok(payload)) => payload,
        Some(Err(message)) => {
            println!("{} {}", "✗".red().bold(), message);
            return Ok(());
        }
        None => anyhow::bail!("No result for {}", input.display()),
    };

    let mode = writer.options().mode.as_deref().unwrap_or("w");
    let target = resolve(output, mode);
    if verbosity.should_show_output() {
        eprintln!(
            "{} {} ({}) -> {} ({})",
            "Info:".blue().bold(),
            input.display(),
            payload.kind(),
            output.display(),
            target
        );
    }

    let spec = WriteSpec::new().with(output, payload.into_format(target));
    print_write_results(&writer.write(&spec)?);
    Ok(())
}

fn write_command(handler: &FileHandler, manifest: &Path, json_output: bool) -> Result<()> {
    let content = fs::read_to_string(manifest)
        .with_context(|| format!("Failed to read manifest: {}", manifest.display()))?;
    let data: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse manifest: {}", manifest.display()))?;
    let results = handler.write_json(&data)?;

    if json_output {
        let rendered: serde_json::Map<String, serde_json::Value> = results
            .iter()
            .map(|(path, outcome)| (path.clone(), outcome.to_json()))
            .collect();
        println!("{}", serde_json::to_string_pretty(&rendered)?);
    } else {
        print_write_results(&results);
    }
    Ok(())
}

fn format_description(format: FileFormat) -> &'static str {
    match format {
        FileFormat::Text => "Plain text; also used for unknown extensions and binary mode",
        FileFormat::Json => "JSON with native date-time values",
        FileFormat::Csv => "Comma-separated values as a typed frame",
        FileFormat::Parquet => "Apache Parquet as a typed frame",
        FileFormat::Xlsx => "Excel workbook, one frame per sheet",
        FileFormat::Pptx => "PowerPoint deck, text per slide",
        FileFormat::Pdf => "PDF document, reflowed text per page",
    }
}

fn formats_command(json_output: bool) -> Result<()> {
    if json_output {
        let formats: Vec<serde_json::Value> = FileFormat::ALL
            .iter()
            .map(|format| {
                serde_json::json!({
                    "format": format,
                    "extensions": format.extensions(),
                    "write": !format.is_read_only(),
                    "description": format_description(*format),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&formats)?);
        return Ok(());
    }

    println!("{}", "Supported formats:".bold());
    println!();
    for format in FileFormat::ALL {
        let access = if format.is_read_only() {
            "read".yellow()
        } else {
            "read/write".green()
        };
        println!(
            "  {:<8} {:<14} {:<11} {}",
            format.to_string().cyan(),
            format.extensions().join(", "),
            access,
            format_description(format).bright_black()
        );
    }
    Ok(())
}

fn config_command(action: ConfigAction, config: &Config, verbosity: Verbosity) -> Result<()> {
    match action {
        ConfigAction::Init { global, force } => config_init(global, force, verbosity),
        ConfigAction::Show { json } => config_show(config, json),
        ConfigAction::Path => {
            config_path();
            Ok(())
        }
    }
}

/// Create a new configuration file with commented defaults
fn config_init(global: bool, force: bool, verbosity: Verbosity) -> Result<()> {
    let config_path = if global {
        Config::user_path().ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?
    } else {
        Config::project_path()
    };

    if config_path.exists() && !force {
        anyhow::bail!(
            "Configuration file already exists: {} (use --force to overwrite)",
            config_path.display()
        );
    }

    fs::write(&config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

    if verbosity.should_show_output() {
        println!(
            "{} Created configuration file: {}",
            "Success:".green().bold(),
            config_path.display()
        );
    }
    Ok(())
}

/// Display the current effective configuration
fn config_show(config: &Config, json_output: bool) -> Result<()> {
    if json_output {
        println!("{}", serde_json::to_string_pretty(config)?);
    } else {
        println!("{}", toml::to_string_pretty(config)?);
    }
    Ok(())
}

/// Print the effective config path: project if present, else user, else
/// where a project config would be created.
fn config_path() {
    let project = Config::project_path();
    let user = Config::user_path().filter(|p| p.exists());
    if project.exists() {
        println!("{}", project.display());
    } else if let Some(user) = user {
        println!("{}", user.display());
    } else {
        println!("{CONFIG_FILE_NAME}");
    }
}
