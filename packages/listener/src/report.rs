//! Report Output
//!
//! Formats reports for observed and matched transactions and writes them to
//! standard output, either as plain text lines or as one JSON object per line.

use std::io::Write;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::record::{lossy_text, DecodeError, TransactionRecord};
use crate::selector::SELECTOR_LEN;

/// Something worth telling the operator about a pending transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    /// A transaction carrying an input payload
    Observed(TransactionRecord),
    /// A call of the watched function on the watched contract
    Matched {
        record: TransactionRecord,
        signature: String,
        solution: Result<String, DecodeError>,
    },
}

impl Report {
    /// The transaction the report is about
    pub fn record(&self) -> &TransactionRecord {
        match self {
            Report::Observed(record) => record,
            Report::Matched { record, .. } => record,
        }
    }

    /// Report kind as it appears in JSON output
    pub fn kind(&self) -> &'static str {
        match self {
            Report::Observed(_) => "observed",
            Report::Matched { .. } => "matched",
        }
    }

    /// Human-readable rendering, one entry per output line
    pub fn text_lines(&self) -> Vec<String> {
        match self {
            Report::Observed(record) => {
                vec![format!("pending transaction with input: {}", record)]
            }
            Report::Matched {
                record,
                signature,
                solution,
            } => {
                let detected = format!("detected {} call: {}", signature, record);
                let extracted = match solution {
                    Ok(text) => format!("solution extracted: {:?}", text),
                    Err(e) => format!(
                        "solution not decodable ({}): {:?}",
                        e,
                        lossy_text(record.input.get(SELECTOR_LEN..).unwrap_or_default())
                    ),
                };
                vec![detected, extracted]
            }
        }
    }
}

/// Report format for JSON output
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReport {
    /// "observed" or "matched"
    pub kind: String,
    /// Transaction hash with 0x prefix
    pub hash: String,
    /// Sender address
    pub from: String,
    /// Recipient address, empty string for contract creation
    pub to: String,
    /// EIP-2718 transaction type
    #[serde(default)]
    pub tx_type: u8,
    /// Transaction nonce
    #[serde(default)]
    pub nonce: u64,
    /// Transaction value in wei as decimal string
    #[serde(default)]
    pub value: String,
    /// Gas limit
    #[serde(default)]
    pub gas_limit: u64,
    /// Gas price in wei as decimal string, for legacy and EIP-2930 transactions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<String>,
    /// Fee cap in wei as decimal string, for dynamic fee transactions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_fee_per_gas: Option<String>,
    /// Priority fee cap in wei as decimal string, for dynamic fee transactions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_priority_fee_per_gas: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    /// Full input payload with 0x prefix
    pub input: String,
    /// First 4 bytes of input with 0x prefix, if present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method_id: Option<String>,
    /// Watched signature, for matched reports
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    /// Decoded text argument, for matched reports
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution: Option<String>,
    /// Why the argument could not be decoded, for matched reports
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decode_error: Option<String>,
    /// Unix timestamp in milliseconds when the report was produced
    pub timestamp: u64,
}

impl TransactionReport {
    pub fn from_report(report: &Report) -> Self {
        let record = report.record();
        let (signature, solution, decode_error) = match report {
            Report::Observed(_) => (None, None, None),
            Report::Matched {
                signature,
                solution,
                ..
            } => match solution {
                Ok(text) => (Some(signature.clone()), Some(text.clone()), None),
                Err(e) => (Some(signature.clone()), None, Some(e.to_string())),
            },
        };

        TransactionReport {
            kind: report.kind().to_string(),
            hash: format!("{:#x}", record.hash),
            from: format!("{:#x}", record.from),
            to: record.to.clone().unwrap_or_default(),
            tx_type: record.tx_type,
            nonce: record.nonce,
            value: record.value.to_string(),
            gas_limit: record.gas_limit,
            gas_price: record.gas_price.map(|fee| fee.to_string()),
            max_fee_per_gas: record.max_fee_per_gas.map(|fee| fee.to_string()),
            max_priority_fee_per_gas: record.max_priority_fee_per_gas.map(|fee| fee.to_string()),
            chain_id: record.chain_id,
            input: record.input_hex(),
            method_id: record.method_id_hex(),
            signature,
            solution,
            decode_error,
            timestamp: current_timestamp_millis(),
        }
    }

    /// Serialize the report to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize a report from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Get current timestamp in milliseconds
pub fn current_timestamp_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// Output layout for reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Destination for reports, shared by every in-flight event task
pub trait ReportSink: Send + Sync {
    fn emit(&self, report: &Report);
}

/// Writes reports to standard output
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink {
    format: OutputFormat,
}

impl StdoutSink {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Lines that `emit` would write for a report
    pub fn render(&self, report: &Report) -> Result<Vec<String>, serde_json::Error> {
        match self.format {
            OutputFormat::Text => Ok(report.text_lines()),
            OutputFormat::Json => Ok(vec![TransactionReport::from_report(report).to_json()?]),
        }
    }
}

impl ReportSink for StdoutSink {
    fn emit(&self, report: &Report) {
        let lines = match self.render(report) {
            Ok(lines) => lines,
            Err(e) => {
                error!(hash = %report.record().hash, "Failed to serialize report: {}", e);
                return;
            }
        };

        // One lock per report keeps multi-line text reports together
        let mut out = std::io::stdout().lock();
        for line in lines {
            if let Err(e) = writeln!(out, "{}", line) {
                error!("Failed to write report to stdout: {}", e);
                return;
            }
        }
    }
}
