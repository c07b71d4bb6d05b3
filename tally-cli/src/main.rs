use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tally_core::{BankProfile, PositionedToken};
use tally_finance::{labelled_values, reconcile, scrape_totals, write_records, ExportFormat};
use tally_ingest::{Engine, Extraction, BUILTIN};

mod config;

/// Exit status when reconciliation finds a mismatch.
const EXIT_RECON_MISMATCH: i32 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "tally",
    version,
    long_version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("TALLY_BUILD_SHA"), ")"),
    about = "Rebuild bank statement tables from positioned tokens"
)]
struct Cli {
    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract movement records from a token file
    Extract {
        /// JSON token file: a list of tokens or a list of pages
        #[arg(long)]
        tokens: PathBuf,

        /// Built-in profile name or path to a TOML profile
        #[arg(long)]
        profile: Option<String>,

        /// csv or json (default from config.toml)
        #[arg(long)]
        format: Option<ExportFormat>,

        /// Write to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Extract, then compare computed totals with the statement's own totals
    Recon {
        #[arg(long)]
        tokens: PathBuf,

        #[arg(long)]
        profile: Option<String>,

        /// Allowed difference in currency units (default 0.01)
        #[arg(long)]
        tolerance: Option<f64>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List every `label amount` line of the statement (summary boxes, fees)
    Labels {
        #[arg(long)]
        tokens: PathBuf,

        #[arg(long)]
        profile: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// List built-in profiles
    Profiles,

    /// Write a default config.toml under $TALLY_HOME (~/.tally)
    InitConfig,
}

/// Token files come from different extractors: some emit one flat list
/// with page numbers set, others one list per page.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TokenInput {
    Pages(Vec<Vec<PositionedToken>>),
    Flat(Vec<PositionedToken>),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact().with_writer(io::stderr))
        .init();

    match cli.command {
        Command::Extract {
            tokens,
            profile,
            format,
            output,
        } => {
            let cfg = config::load_config()?;
            let profile = config::resolve_profile(profile.as_deref(), &cfg)?;
            let extraction = run_engine(&tokens, &profile)?;
            let format = format.unwrap_or(cfg.defaults.format);

            match output {
                Some(path) => {
                    let file = File::create(&path).with_context(|| format!("create {}", path.display()))?;
                    write_records(&extraction.records, format, BufWriter::new(file))?;
                    info!(records = extraction.records.len(), path = %path.display(), "wrote records");
                }
                None => {
                    let stdout = io::stdout();
                    write_records(&extraction.records, format, stdout.lock())?;
                }
            }
        }

        Command::Recon {
            tokens,
            profile,
            tolerance,
            json,
        } => {
            let cfg = config::load_config()?;
            let profile = config::resolve_profile(profile.as_deref(), &cfg)?;
            let extraction = run_engine(&tokens, &profile)?;

            let found = scrape_totals(&extraction.rows, &profile);
            let report = reconcile(
                &extraction.records,
                &found,
                &profile,
                tolerance.unwrap_or(cfg.defaults.tolerance),
            );

            let mut out = io::stdout().lock();
            if json {
                serde_json::to_writer_pretty(&mut out, &report).context("serialize report")?;
                writeln!(out)?;
            } else {
                writeln!(out, "{report}")?;
            }
            out.flush()?;

            if !report.passed() {
                std::process::exit(EXIT_RECON_MISMATCH);
            }
        }

        Command::Labels { tokens, profile, json } => {
            let cfg = config::load_config()?;
            let profile = config::resolve_profile(profile.as_deref(), &cfg)?;
            let extraction = run_engine(&tokens, &profile)?;
            let found = labelled_values(&extraction.rows);

            let mut out = io::stdout().lock();
            if json {
                serde_json::to_writer_pretty(&mut out, &found).context("serialize labels")?;
                writeln!(out)?;
            } else {
                for v in &found {
                    writeln!(out, "{:>3}  {:<40} {}", v.page + 1, v.label, v.value)?;
                }
            }
            out.flush()?;
        }

        Command::Profiles => {
            for (name, about) in BUILTIN {
                println!("{name:<16} {about}");
            }
        }

        Command::InitConfig => {
            config::init_config()?;
        }
    }

    Ok(())
}

fn read_tokens(path: &Path) -> Result<TokenInput> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    serde_json::from_reader(io::BufReader::new(file)).with_context(|| format!("parse tokens from {}", path.display()))
}

fn run_engine(tokens: &Path, profile: &BankProfile) -> Result<Extraction> {
    let engine = Engine::new(profile);
    Ok(match read_tokens(tokens)? {
        TokenInput::Pages(pages) => engine.run_pages(pages),
        TokenInput::Flat(tokens) => engine.run(tokens),
    })
}
