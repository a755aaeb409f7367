//! Local harness for the record contract over a SQLite ledger.
//!
//! # Responsibility
//! - Drive `AddRecord`, `GetRecord`, `GetRecords` and `RevokeRecord` from a
//!   shell against one ledger file.
//! - Print results as JSON so runs are easy to diff.
//!
//! # Invariants
//! - The peer organization equals the caller organization unless
//!   `--peer-msp` / `CRO_PEER_MSP` is set.
//! - Exit code is non-zero on any failure.

use clap::{Parser, Subcommand};
use cro_core::{
    default_log_level, init_logging, RecordContract, SqliteLedger, StaticIdentity, StoreConfig,
    TransientInput, RECORD_PROPERTIES_KEY,
};
use log::info;
use std::path::PathBuf;
use std::process::ExitCode;

/// Privacy-partitioned record store harness
#[derive(Parser, Debug)]
#[command(name = "cro")]
#[command(version, about, long_about = None)]
struct Cli {
    /// SQLite ledger file, created when missing
    db_path: PathBuf,

    /// MSP id of the calling organization
    msp_id: String,

    /// MSP id of the organization hosting the executing node
    #[arg(long, env = "CRO_PEER_MSP")]
    peer_msp: Option<String>,

    /// JSON store configuration file
    #[arg(long, env = "CRO_CONFIG")]
    config: Option<PathBuf>,

    /// Absolute directory for rolling log files; logging is off when unset
    #[arg(long, env = "CRO_LOG_DIR")]
    log_dir: Option<String>,

    /// trace|debug|info|warn|error
    #[arg(long, env = "CRO_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print core linkage and version
    Ping,

    /// Create a record from a JSON payload
    Add {
        /// Record payload, delivered as the `record_properties` input
        payload: String,
    },

    /// Fetch one record
    Get { record_id: String },

    /// List records carrying an ISO number
    List {
        iso_number: String,

        /// Lower `createdAtUTC` bound; 0 leaves the range unset
        #[arg(default_value_t = 0)]
        date_from: u64,

        /// Upper `createdAtUTC` bound; 0 leaves the range unset
        #[arg(default_value_t = 0)]
        date_to: u64,

        /// Maximum number of records; 0 is unbounded
        #[arg(default_value_t = 0)]
        limit: u64,
    },

    /// Revoke a record
    Revoke {
        record_id: String,

        #[arg(default_value = "")]
        reason: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::Add { .. } => "add",
            Self::Get { .. } => "get",
            Self::List { .. } => "list",
            Self::Revoke { .. } => "revoke",
        }
    }
}

fn run(cli: Cli) -> Result<String, String> {
    if let Command::Ping = cli.command {
        return Ok(ping_output());
    }

    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir)?;
    }
    let config = match cli.config.as_ref() {
        Some(path) => StoreConfig::from_json_file(path).map_err(|err| err.to_string())?,
        None => StoreConfig::default(),
    };
    let ledger = SqliteLedger::open(&cli.db_path).map_err(|err| err.to_string())?;
    let mut contract = RecordContract::new(ledger, config);

    let peer_msp = cli.peer_msp.unwrap_or_else(|| cli.msp_id.clone());
    let principal = format!("cro-cli@{}", cli.msp_id);
    let identity =
        StaticIdentity::same_org(cli.msp_id.as_str(), &principal).with_peer_org(Some(peer_msp));
    info!(
        "event=cli_command module=cli command={} msp_id={}",
        cli.command.name(),
        cli.msp_id
    );

    match cli.command {
        Command::Ping => Ok(ping_output()),
        Command::Add { payload } => {
            let transient = TransientInput::new().with(RECORD_PROPERTIES_KEY, payload.into_bytes());
            let record_id = contract
                .add_record(&identity, &transient)
                .map_err(|err| err.to_string())?;
            to_json(&serde_json::json!({ "recordId": record_id }))
        }
        Command::Get { record_id } => {
            let record = contract
                .get_record(&identity, &record_id)
                .map_err(|err| err.to_string())?;
            to_json(&record)
        }
        Command::List {
            iso_number,
            date_from,
            date_to,
            limit,
        } => {
            let records = contract
                .get_records(&identity, &iso_number, date_from, date_to, limit)
                .map_err(|err| err.to_string())?;
            to_json(&records)
        }
        Command::Revoke { record_id, reason } => {
            contract
                .revoke_record(&identity, &record_id, &reason)
                .map_err(|err| err.to_string())?;
            to_json(&serde_json::json!({ "recordId": record_id, "revoked": true }))
        }
    }
}

fn ping_output() -> String {
    format!(
        "cro_core ping={} version={}",
        cro_core::ping(),
        cro_core::core_version()
    )
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|err| format!("failed to encode output: {err}"))
}

#[cfg(test)]
mod tests {
    use super::{run, Cli, Command};
    use clap::{CommandFactory, Parser};

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn list_bounds_default_to_zero() {
        let cli = Cli::try_parse_from(["cro", "ledger.db", "Org1MSP", "list", "A123"])
            .expect("parse list");
        match cli.command {
            Command::List {
                iso_number,
                date_from,
                date_to,
                limit,
            } => {
                assert_eq!(iso_number, "A123");
                assert_eq!((date_from, date_to, limit), (0, 0, 0));
            }
            other => panic!("unexpected command: {other:?}"),
        }

        Cli::try_parse_from(["cro", "ledger.db", "Org1MSP", "list", "A123", "-1"])
            .expect_err("negative bound must fail");
    }

    #[test]
    fn revoke_reason_defaults_to_empty() {
        let cli = Cli::try_parse_from(["cro", "ledger.db", "Org1MSP", "revoke", "R1"])
            .expect("parse revoke");
        match cli.command {
            Command::Revoke { record_id, reason } => {
                assert_eq!(record_id, "R1");
                assert!(reason.is_empty());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn peer_flag_overrides_caller_org() {
        let cli = Cli::try_parse_from([
            "cro",
            "ledger.db",
            "Org1MSP",
            "--peer-msp",
            "Org2MSP",
            "get",
            "R1",
        ])
        .expect("parse get");
        assert_eq!(cli.peer_msp.as_deref(), Some("Org2MSP"));
    }

    #[test]
    fn ping_needs_no_ledger() {
        let cli = Cli::try_parse_from(["cro", "/missing/dir/ledger.db", "Org1MSP", "ping"])
            .expect("parse ping");
        let output = run(cli).expect("ping");
        assert!(output.contains("ping=pong"));
    }

    #[test]
    fn missing_subcommand_is_rejected() {
        Cli::try_parse_from(["cro", "ledger.db"]).expect_err("usage error");
    }
}
