//! sqlxp - export the result of a SQL query as CSV or JSON
//!
//! ```text
//! sqlxp 'postgres://reader@localhost/shop' -q 'select * from orders' -o orders.csv
//! sqlxp ./app.db -q 'select id, name from people' --print --format json --orientation column
//! ```

mod args;

use std::ffi::OsString;
use std::fs::File;
use std::io::{self, BufWriter, IsTerminal, Write};
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow};
use clap::error::ErrorKind as ClapErrorKind;
use clap::{CommandFactory, Parser};
use sqlxp_core::{Connection, RowSource};
use sqlxp_drivers::{DriverRegistry, block_on_tokio};
use sqlxp_encode::{EncodeSummary, Encoder, encoder_for};
use tracing_subscriber::EnvFilter;

use crate::args::{Args, Config, Sink};

fn main() -> ExitCode {
    let argv: Vec<OsString> = std::env::args_os().collect();
    if argv.len() == 1 {
        let _ = Args::command().print_help();
        return ExitCode::SUCCESS;
    }

    let args = match Args::try_parse_from(argv) {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            return match err.kind() {
                ClapErrorKind::DisplayHelp => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };

    if args.version {
        println!("{}", args::version_line());
        return ExitCode::SUCCESS;
    }

    init_tracing(args.verbose);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr so stdout only ever carries the exported document.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .try_init();
}

fn run(args: Args) -> Result<()> {
    let registry = DriverRegistry::with_defaults();
    let config = args.validate(&registry)?;

    let driver = registry
        .get(&config.driver)
        .ok_or_else(|| anyhow!("driver '{}' is not available in this build", config.driver))?;

    let conn = block_on_tokio(driver.connect(&config.connection))?
        .context("could not connect to database")?;

    let result = if config.ping {
        block_on_tokio(conn.ping())?.map_err(anyhow::Error::from).map(|()| {
            println!("Pong");
        })
    } else {
        export(&config, conn.as_ref())
    };

    if let Err(e) = block_on_tokio(conn.close()).and_then(|closed| closed) {
        tracing::warn!(error = %e, "failed to close connection");
    }

    result
}

fn export(config: &Config, conn: &dyn Connection) -> Result<()> {
    let query = config
        .query
        .as_deref()
        .ok_or_else(|| anyhow!("query cannot be empty"))?;

    let mut rows = block_on_tokio(conn.query_rows(query))?.context("query failed")?;
    let encoder = encoder_for(config.format, &config.encoder_options);

    let summary = match &config.sink {
        Sink::Stdout => {
            let stdout = io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            encode_into(encoder.as_ref(), &mut rows, &mut out)?
        }
        Sink::File(path) => {
            let file = File::create(path)
                .with_context(|| format!("could not create file {}", path.display()))?;
            let mut out = BufWriter::new(file);
            encode_into(encoder.as_ref(), &mut rows, &mut out)?
        }
    };

    tracing::info!(
        format = encoder.name(),
        rows = summary.rows,
        "export finished"
    );
    Ok(())
}

/// Encode every row, then flush whatever the encoder left buffered. Output
/// already written stays in place when encoding fails part way.
fn encode_into(
    encoder: &dyn Encoder,
    rows: &mut dyn RowSource,
    out: &mut dyn Write,
) -> Result<EncodeSummary> {
    let encoded = encoder.encode(rows, out);
    let flushed = out.flush();
    let summary = encoded.with_context(|| format!("{} export failed", encoder.name()))?;
    flushed.context("failed to flush output")?;
    Ok(summary)
}
