//! Client configuration from flags, environment and an optional YAML file.
//!
//! Precedence: flag or environment variable, then the YAML file, then the
//! built-in default.

use std::num::{NonZeroU32, NonZeroUsize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser};
use frames::BetRecord;
use serde::Deserialize;

pub const DEFAULT_SERVER_ADDRESS: &str = "server:12345";
pub const DEFAULT_BATCH_MAX_AMOUNT: usize = 100;
pub const DEFAULT_POLL_RETRY_MS: u64 = 1000;
pub const DEFAULT_CONNECT_DELAY_MS: u64 = 1000;
pub const DEFAULT_DATA_FILE: &str = "agency-data.csv";
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("missing required setting `{0}`")]
    Missing(&'static str),
    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Parser, Debug)]
#[command(name = "client", about = "Lottery agency client: submits bets in batches and polls for winners")]
pub struct Cli {
    #[arg(long, env = "CLI_CONFIG_FILE", default_value = "config.yaml")]
    pub config: PathBuf,

    #[arg(long, env = "CLI_ID")]
    pub id: Option<String>,

    #[arg(long, env = "CLI_SERVER_ADDRESS")]
    pub server_address: Option<String>,

    #[arg(long, env = "CLI_BATCH_MAXAMOUNT")]
    pub batch_max_amount: Option<usize>,

    #[arg(long, env = "CLI_POLL_RETRY_MS")]
    pub poll_retry_ms: Option<u64>,

    #[arg(long, env = "CLI_POLL_MAX_ATTEMPTS")]
    pub poll_max_attempts: Option<u32>,

    #[arg(long, env = "CLI_CONNECT_DELAY_MS")]
    pub connect_delay_ms: Option<u64>,

    #[arg(long, env = "CLI_IO_TIMEOUT_MS")]
    pub io_timeout_ms: Option<u64>,

    #[arg(long, env = "CLI_DATA_FILE", help = "Agency bet file, one bet per line")]
    pub data_file: Option<PathBuf>,

    #[arg(long, env = "CLI_LOG_LEVEL")]
    pub log_level: Option<String>,

    #[command(flatten)]
    pub bet: SingleBetArgs,
}

/// Fields of a single bet; when any is set the client submits only that bet.
#[derive(Args, Debug, Default)]
pub struct SingleBetArgs {
    #[arg(long = "bet-first-name", env = "BET_FIRST_NAME")]
    pub first_name: Option<String>,

    #[arg(long = "bet-last-name", env = "BET_LAST_NAME")]
    pub last_name: Option<String>,

    #[arg(long = "bet-document", env = "BET_DOCUMENT")]
    pub document: Option<String>,

    #[arg(long = "bet-birthdate", env = "BET_BIRTHDATE")]
    pub birthdate: Option<String>,

    #[arg(long = "bet-number", env = "BET_NUMBER")]
    pub number: Option<String>,
}

impl SingleBetArgs {
    fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.document.is_none()
            && self.birthdate.is_none()
            && self.number.is_none()
    }
}

// =============================================================================
// YAML FILE
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub id: Option<String>,
    pub server: ServerSection,
    pub batch: BatchSection,
    pub poll: PollSection,
    pub connect: ConnectSection,
    pub log: LogSection,
    pub data: DataSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSection {
    pub address: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct BatchSection {
    pub max_amount: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct PollSection {
    pub retry_ms: Option<u64>,
    pub max_attempts: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct ConnectSection {
    pub delay_ms: Option<u64>,
    pub io_timeout_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogSection {
    pub level: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataSection {
    pub file: Option<PathBuf>,
}

impl FileConfig {
    /// Read the YAML file at `path`. A missing file yields the empty config.
    pub fn read_optional(path: &Path) -> Result<Self, ConfigError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        Self::parse(&raw, path)
    }

    fn parse(raw: &str, path: &Path) -> Result<Self, ConfigError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

// =============================================================================
// RESOLVED CONFIG
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub id: String,
    pub server_address: String,
    pub max_batch_size: NonZeroUsize,
    pub poll_retry: Duration,
    pub poll_max_attempts: Option<NonZeroU32>,
    pub connect_delay: Duration,
    pub io_timeout: Option<Duration>,
    pub data_file: PathBuf,
    pub log_level: String,
    pub single_bet: Option<BetRecord>,
}

impl ClientConfig {
    /// Load the YAML file named by `cli` and merge it under the flag values.
    pub fn load(cli: Cli) -> Result<Self, ConfigError> {
        let file = FileConfig::read_optional(&cli.config)?;
        Self::resolve(cli, file)
    }

    pub fn resolve(cli: Cli, file: FileConfig) -> Result<Self, ConfigError> {
        let id = cli
            .id
            .or(file.id)
            .map(|id| id.trim().to_owned())
            .filter(|id| !id.is_empty())
            .ok_or(ConfigError::Missing("id"))?;
        if id.contains([',', '|']) {
            return Err(ConfigError::Invalid {
                field: "id",
                reason: format!("{id:?} must not contain ',' or '|'"),
            });
        }

        let server_address = cli
            .server_address
            .or(file.server.address)
            .unwrap_or_else(|| DEFAULT_SERVER_ADDRESS.to_owned());

        let batch_max_amount = cli
            .batch_max_amount
            .or(file.batch.max_amount)
            .unwrap_or(DEFAULT_BATCH_MAX_AMOUNT);
        let max_batch_size = NonZeroUsize::new(batch_max_amount).ok_or(ConfigError::Invalid {
            field: "batch_max_amount",
            reason: "must be greater than zero".to_owned(),
        })?;

        let poll_max_attempts = match cli.poll_max_attempts.or(file.poll.max_attempts) {
            None => None,
            Some(raw) => Some(NonZeroU32::new(raw).ok_or(ConfigError::Invalid {
                field: "poll_max_attempts",
                reason: "must be greater than zero".to_owned(),
            })?),
        };

        let poll_retry = Duration::from_millis(
            cli.poll_retry_ms
                .or(file.poll.retry_ms)
                .unwrap_or(DEFAULT_POLL_RETRY_MS),
        );
        let connect_delay = Duration::from_millis(
            cli.connect_delay_ms
                .or(file.connect.delay_ms)
                .unwrap_or(DEFAULT_CONNECT_DELAY_MS),
        );
        let io_timeout = cli
            .io_timeout_ms
            .or(file.connect.io_timeout_ms)
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis);

        let data_file = cli
            .data_file
            .or(file.data.file)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_FILE));
        let log_level = cli
            .log_level
            .or(file.log.level)
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_owned());

        let single_bet = single_bet(cli.bet, &id)?;

        Ok(Self {
            id,
            server_address,
            max_batch_size,
            poll_retry,
            poll_max_attempts,
            connect_delay,
            io_timeout,
            data_file,
            log_level,
            single_bet,
        })
    }
}

fn single_bet(args: SingleBetArgs, agency_id: &str) -> Result<Option<BetRecord>, ConfigError> {
    if args.is_empty() {
        return Ok(None);
    }

    let field = |value: Option<String>, name: &'static str| -> Result<String, ConfigError> {
        let value = value.map(|v| v.trim().to_owned()).ok_or(ConfigError::Missing(name))?;
        if value.contains([',', '|', '\n']) {
            return Err(ConfigError::Invalid {
                field: name,
                reason: "must not contain ',', '|' or newlines".to_owned(),
            });
        }
        Ok(value)
    };

    Ok(Some(BetRecord {
        agency_id: agency_id.to_owned(),
        first_name: field(args.first_name, "bet_first_name")?,
        last_name: field(args.last_name, "bet_last_name")?,
        document: field(args.document, "bet_document")?,
        birthdate: field(args.birthdate, "bet_birthdate")?,
        number: field(args.number, "bet_number")?,
    }))
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
