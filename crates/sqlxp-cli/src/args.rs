//! Command line arguments and their validation

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use clap::{ArgAction, Parser};
use sqlxp_core::ConnectionConfig;
use sqlxp_drivers::DriverRegistry;
use sqlxp_encode::{ArrayStrategy, CsvOptions, EncoderOptions, OutputFormat};

pub const VERSION: &str = "1.0.0";

#[derive(Debug, Parser)]
#[command(
    name = "sqlxp",
    about = "Export the result of a SQL query as CSV or JSON",
    override_usage = "sqlxp [OPTIONS] [DSN]",
    disable_help_flag = true,
    disable_version_flag = true
)]
pub struct Args {
    /// Database driver: postgres (pg), mysql (mariadb, maria) or sqlite (sqlite3)
    #[arg(short = 'D', long)]
    pub driver: Option<String>,

    /// Database user
    #[arg(short = 'u', long)]
    pub user: Option<String>,

    /// Database password
    #[arg(short = 'p', long, env = "SQLXP_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Database host
    #[arg(short = 'h', long, default_value = "localhost")]
    pub host: String,

    /// Database port
    #[arg(short = 'P', long, default_value_t = 0, allow_negative_numbers = true)]
    pub port: i64,

    /// Database name
    #[arg(short = 'd', long)]
    pub database: Option<String>,

    /// Output file; its extension picks the format
    #[arg(short = 'o', long)]
    pub out: Option<PathBuf>,

    /// Query to execute
    #[arg(short = 'q', long)]
    pub query: Option<String>,

    /// File to read the query from
    #[arg(short = 'f', long)]
    pub file: Option<PathBuf>,

    /// Orientation for JSON output: row, column or array
    #[arg(long, default_value = "")]
    pub orientation: String,

    /// Validate the connection without running a query
    #[arg(long)]
    pub ping: bool,

    /// Print the output instead of writing to a file
    #[arg(long)]
    pub print: bool,

    /// Output format when no output file is given
    #[arg(long, default_value = "csv")]
    pub format: String,

    /// CSV field delimiter
    #[arg(long, default_value_t = ',')]
    pub delimiter: char,

    /// Terminate CSV records with \r\n
    #[arg(long)]
    pub crlf: bool,

    /// Stream JSON arrays row by row instead of buffering the document
    #[arg(long)]
    pub stream: bool,

    /// Log debug output to stderr
    #[arg(short = 'V', long)]
    pub verbose: bool,

    /// Show usage
    #[arg(long, action = ArgAction::Help)]
    pub help: Option<bool>,

    /// Print version
    #[arg(short = 'v', long)]
    pub version: bool,

    /// Connection string; the driver is inferred from it
    pub dsn: Option<String>,
}

/// Where the encoded document goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sink {
    Stdout,
    File(PathBuf),
}

/// A validated invocation
#[derive(Debug, Clone)]
pub struct Config {
    /// Canonical driver name from the registry
    pub driver: String,
    pub connection: ConnectionConfig,
    /// `None` when only pinging
    pub query: Option<String>,
    pub format: OutputFormat,
    pub encoder_options: EncoderOptions,
    pub sink: Sink,
    pub ping: bool,
}

impl Args {
    /// Check the arguments and resolve them into a [`Config`].
    pub fn validate(self, registry: &DriverRegistry) -> Result<Config> {
        if self.port < 0 {
            bail!("port must be a positive integer");
        }
        let port = u16::try_from(self.port)
            .map_err(|_| anyhow!("port must be at most {}", u16::MAX))?;

        let (driver, connection) = match self.dsn.as_deref().filter(|dsn| !dsn.is_empty()) {
            Some(dsn) => {
                let driver = registry
                    .detect(dsn)
                    .ok_or_else(|| anyhow!("no driver accepts the connection string"))?;
                (
                    driver.name().to_string(),
                    ConnectionConfig::from_dsn(driver.name(), dsn),
                )
            }
            None => {
                let (Some(name), Some(user), Some(password), Some(database)) = (
                    non_empty(&self.driver),
                    non_empty(&self.user),
                    non_empty(&self.password),
                    non_empty(&self.database),
                ) else {
                    bail!("either dsn or all of the connection options are required");
                };
                if self.host.is_empty() || port == 0 {
                    bail!("either dsn or all of the connection options are required");
                }

                let driver = registry
                    .resolve(name)
                    .ok_or_else(|| anyhow!("unsupported driver '{}'", name))?;
                (
                    driver.name().to_string(),
                    ConnectionConfig::new_server(
                        driver.name(),
                        &self.host,
                        port,
                        database,
                        user,
                        password,
                    ),
                )
            }
        };

        let mut query = self.query.clone();
        if let Some(file) = &self.file {
            if file.extension().and_then(|ext| ext.to_str()) != Some("sql") {
                bail!("query file should be a .sql file");
            }
            let content = std::fs::read_to_string(file)
                .with_context(|| format!("failed to read query file {}", file.display()))?;
            query = Some(content);
        }

        let query = if self.ping {
            None
        } else {
            let query = query
                .filter(|query| !query.trim().is_empty())
                .ok_or_else(|| anyhow!("query cannot be empty"))?;
            if !is_select_query(&query) {
                bail!("only 'select' queries can be executed");
            }
            Some(query)
        };

        let format_name = match &self.out {
            Some(path) => OutputFormat::extension_of(&path.to_string_lossy()).to_string(),
            None => self.format.clone(),
        };
        if format_name.is_empty() {
            bail!("format is required when no output is specified");
        }
        let format = OutputFormat::parse(&format_name, &self.orientation)?;

        let sink = match self.out {
            Some(path) => Sink::File(path),
            None if self.print || self.ping => Sink::Stdout,
            None => bail!("no output file specified"),
        };

        if !self.delimiter.is_ascii() {
            bail!("delimiter must be a single ASCII character");
        }
        let delimiter = self.delimiter as u8;

        Ok(Config {
            driver,
            connection,
            query,
            format,
            encoder_options: EncoderOptions {
                csv: CsvOptions {
                    delimiter,
                    crlf: self.crlf,
                },
                array_strategy: if self.stream {
                    ArrayStrategy::Streamed
                } else {
                    ArrayStrategy::Buffered
                },
            },
            sink,
            ping: self.ping,
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Whether the first word of `query` is `select`, ignoring case.
pub fn is_select_query(query: &str) -> bool {
    query
        .trim_start()
        .get(..6)
        .is_some_and(|head| head.eq_ignore_ascii_case("select"))
}

/// Line printed for `-v/--version`
pub fn version_line() -> String {
    format!("sqlxp version {}", VERSION)
}
