//! Reports pending calls of one function on one contract, together with the
//! text argument carried after the selector.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;

use mempool_listener::config::{init_logging, SelectorWatchArgs};
use mempool_listener::{run, StdoutSink, Watch};

#[tokio::main]
async fn main() -> Result<()> {
    let args = SelectorWatchArgs::parse();
    init_logging(args.connection.log_json);

    let endpoint = args.connection.endpoint().context("Invalid --endpoint")?;
    let call = args.targeted_call().context("Invalid --signature")?;
    info!(
        endpoint = %endpoint,
        target = call.target(),
        selector = %call.selector(),
        "selector_watch starting"
    );

    let sink = Arc::new(StdoutSink::new(args.connection.format));
    let watch = Watch::Targeted(call);

    tokio::select! {
        outcome = run(&endpoint, args.connection.connect_timeout_ms, watch, sink) => {
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
