//! `walcatch <backup_name> <destination>` — estimate how long a replica
//! bootstrapped from `backup_name` needs to apply the WAL produced since,
//! after validating identity and timeline against the destination.
//!
//! Exit code 0 with a single line on stdout on success; one error line on
//! stderr and a non-zero exit otherwise. Diagnostics go to stderr through
//! `tracing` (filtered by `RUST_LOG`, default `info`).

use std::env;
use std::io::ErrorKind;
use std::net::{TcpStream, ToSocketAddrs};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use tracing::info;
use tracing_subscriber::EnvFilter;
use walcatch_catalog::ProcessCatalog;
use walcatch_catalog::tool::run_tool_bounded;
use walcatch_core::{CatchupEstimator, FixedCostModel, PrimaryServer, RunControl, format_duration};
use walcatch_error::{Result, WalcatchError};
use walcatch_types::ServerIdentity;

/// Environment overrides, read once at startup.
#[derive(Debug)]
struct Config {
    walg_bin: String,
    psql_bin: String,
    /// Whole-run deadline. Absent means blocking calls may hang until the
    /// peer or tool responds.
    timeout: Option<Duration>,
}

impl Config {
    fn from_env() -> Result<Self> {
        Ok(Self {
            walg_bin: env::var("WALCATCH_WALG_BIN").unwrap_or_else(|_| "wal-g".to_owned()),
            psql_bin: env::var("WALCATCH_PSQL_BIN").unwrap_or_else(|_| "psql".to_owned()),
            timeout: parse_timeout(env::var("WALCATCH_TIMEOUT_SECS").ok())?,
        })
    }
}

fn parse_timeout(value: Option<String>) -> Result<Option<Duration>> {
    match value {
        None => Ok(None),
        Some(text) => text
            .parse::<u64>()
            .map(|secs| Some(Duration::from_secs(secs)))
            .map_err(|_| {
                WalcatchError::parse(format!("WALCATCH_TIMEOUT_SECS `{text}` is not whole seconds"))
            }),
    }
}

/// Primary server access through `psql` one-liners.
#[derive(Debug)]
struct ProcessPrimary {
    psql_bin: String,
    deadline: Option<Instant>,
}

impl ProcessPrimary {
    fn new(psql_bin: impl Into<String>, deadline: Option<Instant>) -> Self {
        Self { psql_bin: psql_bin.into(), deadline }
    }

    fn query_one(&self, sql: &str) -> Result<String> {
        let remaining = self
            .deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()));
        let output =
            run_tool_bounded(&self.psql_bin, &["-At", "-c", sql], remaining, "primary-query")?;
        Ok(output.trim().to_owned())
    }
}

impl PrimaryServer for ProcessPrimary {
    fn identity(&self) -> Result<ServerIdentity> {
        let sysid_text = self.query_one("SELECT system_identifier FROM pg_control_system()")?;
        let system_identifier = sysid_text.parse::<u64>().map_err(|_| {
            WalcatchError::parse(format!("bad system identifier `{sysid_text}` from primary"))
        })?;
        let timeline_text = self.query_one("SELECT timeline_id FROM pg_control_checkpoint()")?;
        let timeline = timeline_text.parse::<u32>().map_err(|_| {
            WalcatchError::parse(format!("bad timeline `{timeline_text}` from primary"))
        })?;
        Ok(ServerIdentity { system_identifier, timeline })
    }

    fn start_backup(&self, label: &str) -> Result<String> {
        self.query_one(&format!("SELECT pg_backup_start('{label}', true)"))
    }
}

/// Connect to the destination, bounded by the remaining run budget when
/// one is set.
fn connect_destination(destination: &str, remaining: Option<Duration>) -> Result<TcpStream> {
    let Some(budget) = remaining else {
        return Ok(TcpStream::connect(destination)?);
    };
    if budget.is_zero() {
        return Err(WalcatchError::Timeout { stage: "connecting" });
    }
    let addr = destination.to_socket_addrs()?.next().ok_or_else(|| {
        WalcatchError::parse(format!("destination `{destination}` does not resolve"))
    })?;
    TcpStream::connect_timeout(&addr, budget).map_err(|err| {
        if matches!(err.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) {
            WalcatchError::Timeout { stage: "connecting" }
        } else {
            err.into()
        }
    })
}

fn run(backup_name: &str, destination: &str) -> Result<()> {
    let config = Config::from_env()?;
    let control = config
        .timeout
        .map_or_else(RunControl::unbounded, RunControl::with_deadline);
    let catalog = ProcessCatalog::new(&config.walg_bin).with_deadline(control.deadline());
    let primary = ProcessPrimary::new(&config.psql_bin, control.deadline());

    let channel = connect_destination(destination, control.remaining())?;
    info!(destination, "connected to destination");

    let report = CatchupEstimator::new(
        &catalog,
        &primary,
        &FixedCostModel::default(),
        channel,
        control,
    )
    .run(backup_name)?;

    println!("Estimated catchup time: {}", format_duration(report.estimate.total));
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut args = env::args().skip(1);
    let (Some(backup_name), Some(destination), None) = (args.next(), args.next(), args.next())
    else {
        eprintln!("{}", WalcatchError::Usage);
        return ExitCode::from(2);
    };

    match run(&backup_name, &destination) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("walcatch: {err}");
            ExitCode::from(1)
        }
    }
}
