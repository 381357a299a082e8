//! CLI for parcelsheet - runs the processing flows on local files
//!
//! Usage:
//!   parcelsheet_cli chunk manifest.xlsx --template template.xlsx --size 500
//!   parcelsheet_cli passport manifest.xlsx -o fixed.xlsx
//!   parcelsheet_cli pinfl manifest.xlsx pinfl.xlsx --log replacements.txt

use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use parcelsheet::{
    export_chunks, run_passport_macro, run_pinfl, ArtifactKind, Config, Delivery, ParcelError,
};

#[derive(Parser, Debug)]
#[command(name = "parcelsheet_cli", version, about = "Parcel manifest spreadsheet processing")]
struct Cli {
    /// Show progress logs (honours RUST_LOG)
    #[arg(long, short = 'v', global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress all logs
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Config file (default: ./parcelsheet.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print a JSON run report instead of the summary line
    #[arg(long, global = true)]
    json: bool,

    /// Name embedded in output file names
    #[arg(long, global = true, default_value = "cli")]
    caller: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Normalize, split into chunks, render into the template and bundle as ZIP
    Chunk {
        input: PathBuf,
        /// Template workbook (overrides `template_path`)
        #[arg(long)]
        template: Option<PathBuf>,
        /// Rows per output document (overrides `chunk_size`)
        #[arg(long)]
        size: Option<usize>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replace passports with the placeholder where they start with a flagged character
    Passport {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replace passports with PINFL values from a lookup workbook
    Pinfl {
        source: PathBuf,
        lookup: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Replacement log destination
        #[arg(long)]
        log: Option<PathBuf>,
    },
}

fn init_tracing(cli: &Cli) {
    //   --quiet   → off
    //   --verbose → RUST_LOG if set, otherwise info
    //   default   → RUST_LOG if set, otherwise warn
    let filter = if cli.quiet {
        tracing_subscriber::EnvFilter::new("off")
    } else {
        let fallback = if cli.verbose { "info" } else { "warn" };
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), ParcelError> {
    let mut config = Config::load(cli.config.as_deref())?;

    let (delivery, output, log) = match &cli.command {
        Command::Chunk {
            input,
            template,
            size,
            output,
        } => {
            if let Some(template) = template {
                config.template_path.clone_from(template);
            }
            let size = size.unwrap_or(config.chunk_size);
            let delivery = export_chunks(&fs::read(input)?, &config, size, &cli.caller)?;
            (delivery, output.as_deref(), None)
        }
        Command::Passport { input, output } => {
            let delivery = run_passport_macro(fs::read(input)?, &config, &cli.caller)?;
            (delivery, output.as_deref(), None)
        }
        Command::Pinfl {
            source,
            lookup,
            output,
            log,
        } => {
            let delivery = run_pinfl(fs::read(source)?, &fs::read(lookup)?, &config, &cli.caller)?;
            (delivery, output.as_deref(), log.as_deref())
        }
    };

    write_artifacts(&delivery, output, log)?;

    if cli.json {
        let report = serde_json::to_string_pretty(&delivery.report)
            .map_err(|e| ParcelError::Io(std::io::Error::other(e)))?;
        println!("{report}");
    } else {
        println!("{}", delivery.summary);
    }
    Ok(())
}

/// Write every artifact, using the explicit destinations where given and
/// the artifact's own name in the working directory otherwise.
fn write_artifacts(
    delivery: &Delivery,
    output: Option<&Path>,
    log: Option<&Path>,
) -> Result<(), ParcelError> {
    for artifact in &delivery.artifacts {
        let explicit = match artifact.kind {
            ArtifactKind::Log => log,
            ArtifactKind::Archive | ArtifactKind::Workbook => output,
        };
        let path = explicit.map_or_else(|| PathBuf::from(&artifact.name), Path::to_path_buf);
        fs::write(&path, &artifact.bytes)?;
        eprintln!("Written: {}", path.display());
    }
    Ok(())
}
