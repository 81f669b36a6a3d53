//! Mempool Listener Library
//!
//! This crate provides components for watching an Ethereum node's pending
//! transactions, matching them against function selectors, and reporting
//! what it finds on standard output.

pub mod config;
pub mod listener;
pub mod record;
pub mod report;
pub mod selector;
pub mod source;
pub mod watch;

// Re-export commonly used types
pub use listener::{listen, process_event, run, EventOutcome, ListenOutcome};
pub use record::{decode_solution, DecodeError, TransactionRecord};
pub use report::{OutputFormat, Report, ReportSink, StdoutSink, TransactionReport};
pub use selector::{FunctionSelector, SelectorError, SOLVE_SIGNATURE};
pub use source::{Endpoint, NodeSource, PendingEvent, SourceError, TransactionSource};
pub use watch::{TargetedCall, Watch};
