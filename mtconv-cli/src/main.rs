use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use mtconv_ingest::export::{write_csv, write_json};
use mtconv_ingest::{IngestError, ParseOptions, ParsedTransaction, StatementParse, parse_mt940_file};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use config::{Config, OutputFormat};

mod config;
mod state;


const LONG_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("MTCONV_BUILD_SHA"), ")");

#[derive(Parser, Debug)]
#[command(
    name = "mtconv",
    version,
    long_version = LONG_VERSION,
    about = "Convert MT940 bank statements to JSON or CSV"
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (default: $MTCONV_HOME/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert an MT940 statement into flat transaction records
    Convert {
        /// MT940 statement file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format (default from config: json)
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,

        /// Single-line JSON
        #[arg(long)]
        compact: bool,

        /// First year of the two-digit year window (default from config: 1950)
        #[arg(long)]
        century_window_start: Option<i32>,
    },

    /// List parsed transactions and skipped records in readable form
    Inspect {
        /// MT940 statement file
        input: PathBuf,

        #[arg(long)]
        century_window_start: Option<i32>,
    },

    /// Config file commands
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config.toml if none exists
    Init,
    /// Print the effective config
    Show,
    /// Print the config file location
    Path,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(io::stderr).compact())
        .init();

    let cfg = config::load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Convert {
            input,
            output,
            format,
            compact,
            century_window_start,
        } => {
            let options = parse_options(&cfg, century_window_start);
            let format = format.unwrap_or(cfg.output.format);
            let pretty = cfg.output.pretty && !compact;
            convert(&input, output.as_deref(), format, pretty, options)?;
        }

        Command::Inspect {
            input,
            century_window_start,
        } => {
            let result = load_statement(&input, parse_options(&cfg, century_window_start))?;
            print!("{}", render_inspect(&result));
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => print!("{}", config::render_config(&cfg)?),
            ConfigCommand::Path => println!("{}", config::config_path()?.display()),
        },
    }

    Ok(())
}

fn parse_options(cfg: &Config, century_window_start: Option<i32>) -> ParseOptions {
    ParseOptions {
        century_window_start: century_window_start.unwrap_or(cfg.parse.century_window_start),
    }
}

fn load_statement(input: &Path, options: ParseOptions) -> Result<StatementParse> {
    match parse_mt940_file(input, options) {
        Ok(result) => Ok(result),
        Err(IngestError::InputNotFound { path }) => {
            bail!("Input not found: {} (pass an existing MT940 file)", path.display())
        }
        Err(e) => Err(e).with_context(|| format!("parsing {}", input.display())),
    }
}

fn convert(
    input: &Path,
    output: Option<&Path>,
    format: OutputFormat,
    pretty: bool,
    options: ParseOptions,
) -> Result<()> {
    let result = load_statement(input, options)?;

    match output {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
            let mut w = BufWriter::new(file);
            write_output(&mut w, format, pretty, &result.transactions)?;
            w.flush().with_context(|| format!("write {}", path.display()))?;
        }
        None => {
            let stdout = io::stdout();
            write_output(stdout.lock(), format, pretty, &result.transactions)?;
        }
    }

    info!(
        parsed = result.transactions.len(),
        skipped = result.skipped.len(),
        "converted {}",
        input.display()
    );
    Ok(())
}

fn write_output<W: Write>(
    w: W,
    format: OutputFormat,
    pretty: bool,
    txns: &[ParsedTransaction],
) -> Result<()> {
    match format {
        OutputFormat::Json => write_json(w, txns, pretty)?,
        OutputFormat::Csv => write_csv(w, txns)?,
    }
    Ok(())
}

fn describe(txn: &ParsedTransaction) -> String {
    let (role, party) = match (txn.payer(), txn.recipient()) {
        (Some(p), _) => ("from", p),
        (_, Some(r)) => ("to", r),
        (None, None) => ("", &txn.counterparty),
    };

    let mut line = format!("{} {:?} {}", txn.value_date, txn.direction, txn.amount);
    if !party.is_empty() {
        line.push_str(&format!(
            " | {} {} <{}>",
            role,
            party.name.as_deref().unwrap_or("?"),
            party.iban.as_deref().unwrap_or("no IBAN")
        ));
    }
    if let Some(reference) = &txn.sepa_reference {
        line.push_str(&format!(" | ref {}", reference));
    }
    line
}

fn render_inspect(result: &StatementParse) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Parsed {} transactions, skipped {}\n\n",
        result.transactions.len(),
        result.skipped.len()
    ));

    for (i, txn) in result.transactions.iter().enumerate() {
        out.push_str(&format!("{:>3}. {}\n", i + 1, describe(txn)));
        out.push_str(&format!("     {}\n", txn.memo));
    }

    if !result.skipped.is_empty() {
        out.push_str("\nSkipped:\n");
        for s in &result.skipped {
            out.push_str(&format!("- pair #{}: {}\n", s.index, s.reason));
        }
    }
    out
}
