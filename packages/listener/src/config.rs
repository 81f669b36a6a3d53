//! Command line and environment configuration shared by the listener binaries.

use clap::{Args, Parser};

use crate::report::OutputFormat;
use crate::selector::{FunctionSelector, SelectorError, SOLVE_SIGNATURE};
use crate::source::{Endpoint, SourceError, CONNECTION_TIMEOUT_MS};
use crate::watch::TargetedCall;

/// Node endpoint used when none is configured; replace the project id
pub const DEFAULT_ENDPOINT: &str = "wss://mainnet.infura.io/ws/v3/YOUR_INFURA_PROJECT_ID";

/// Contract watched by `selector_watch` when none is configured
pub const DEFAULT_TARGET: &str = "0xYourContractAddress";

/// Function watched by `selector_watch` when none is configured
pub const DEFAULT_SIGNATURE: &str = SOLVE_SIGNATURE;

/// Connection, output and logging options common to both listeners
#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// WebSocket URL or IPC socket path of the node
    #[arg(short, long, env = "MEMPOOL_ENDPOINT", default_value = DEFAULT_ENDPOINT, hide_env_values = true)]
    pub endpoint: String,

    /// Give up connecting after this many milliseconds
    #[arg(long, default_value_t = CONNECTION_TIMEOUT_MS)]
    pub connect_timeout_ms: u64,

    /// Report layout on stdout
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Emit diagnostics as JSON
    #[arg(long, env = "MEMPOOL_LOG_JSON")]
    pub log_json: bool,
}

impl ConnectionArgs {
    pub fn endpoint(&self) -> Result<Endpoint, SourceError> {
        self.endpoint.parse()
    }
}

/// Report every pending transaction that carries input data
#[derive(Parser, Debug, Clone)]
#[command(name = "pending_observer", version)]
pub struct ObserverArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,
}

/// Report pending calls of one function on one contract and extract their text argument
#[derive(Parser, Debug, Clone)]
#[command(name = "selector_watch", version)]
pub struct SelectorWatchArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Destination address to watch, compared ignoring case
    #[arg(short, long, env = "MEMPOOL_TARGET", default_value = DEFAULT_TARGET)]
    pub target: String,

    /// Function signature whose selector calls must start with
    #[arg(short, long, env = "MEMPOOL_SIGNATURE", default_value = DEFAULT_SIGNATURE)]
    pub signature: String,
}

impl SelectorWatchArgs {
    pub fn targeted_call(&self) -> Result<TargetedCall, SelectorError> {
        let selector = FunctionSelector::from_signature(&self.signature)?;
        Ok(TargetedCall::new(self.target.trim(), selector))
    }
}

/// Install the global tracing subscriber, writing to stderr so stdout
/// carries only reports. `RUST_LOG` overrides the default `info` filter.
pub fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .init();
    }
}
