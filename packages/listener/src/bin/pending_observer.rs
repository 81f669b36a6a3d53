//! Reports every pending transaction that carries an input payload.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;

use mempool_listener::config::{init_logging, ObserverArgs};
use mempool_listener::{run, StdoutSink, Watch};

#[tokio::main]
async fn main() -> Result<()> {
    let args = ObserverArgs::parse();
    init_logging(args.connection.log_json);

    let endpoint = args.connection.endpoint().context("Invalid --endpoint")?;
    info!(endpoint = %endpoint, format = ?args.connection.format, "pending_observer starting");

    let sink = Arc::new(StdoutSink::new(args.connection.format));

    tokio::select! {
        outcome = run(&endpoint, args.connection.connect_timeout_ms, Watch::Observe, sink) => {
            let outcome = outcome.context("Listener failed")?;
            bail!(
                "Pending transaction subscription closed after {} events ({} subscription errors)",
                outcome.events,
                outcome.subscription_errors
            );
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, shutting down");
        }
    }

    Ok(())
}
