use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use remold::Transformer;

/// Transform JSON documents with a declarative specification.
#[derive(Parser)]
#[command(name = "remold", version, about)]
struct Cli {
    /// Transformation specification file (required).
    #[arg(long)]
    spec: PathBuf,

    /// Input file; stdin when omitted.
    #[arg(long = "in")]
    input: Option<PathBuf>,

    /// Output file; stdout when omitted.
    #[arg(long = "out")]
    output: Option<PathBuf>,

    /// Verbose logging to stderr.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let spec = fs::read_to_string(&cli.spec)
        .with_context(|| format!("unable to read specification file {}", cli.spec.display()))?;
    let transformer = Transformer::new(&spec).context("unable to load specification")?;
    tracing::debug!(spec = %cli.spec.display(), "specification loaded");

    let input = match &cli.input {
        Some(path) => fs::read(path)
            .with_context(|| format!("unable to read input file {}", path.display()))?,
        None => {
            let mut buf = Vec::new();
            io::stdin()
                .read_to_end(&mut buf)
                .context("unable to read input from stdin")?;
            buf
        }
    };

    let output = transformer
        .transform(&input)
        .context("unable to transform message")?;
    tracing::debug!(bytes = output.len(), "document transformed");

    match &cli.output {
        Some(path) => fs::write(path, &output)
            .with_context(|| format!("unable to write output file {}", path.display()))?,
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(&output)
                .and_then(|_| stdout.flush())
                .context("unable to write output to stdout")?;
        }
    }

    Ok(())
}
