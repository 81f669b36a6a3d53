//! Watch Rules
//!
//! Decides which fetched transactions are worth reporting. `Observe` reports
//! any transaction carrying input; `Targeted` reports calls of one function
//! on one contract and extracts the text argument.

use crate::record::{decode_solution, TransactionRecord};
use crate::report::Report;
use crate::selector::FunctionSelector;

/// A contract/function pair to look for in pending transactions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetedCall {
    target: String,
    selector: FunctionSelector,
}

impl TargetedCall {
    /// # Arguments
    /// * `target` - Destination address, compared as a 0x string ignoring ASCII case
    /// * `selector` - Function selector the input must start with
    pub fn new(target: impl Into<String>, selector: FunctionSelector) -> Self {
        Self {
            target: target.into(),
            selector,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn selector(&self) -> &FunctionSelector {
        &self.selector
    }

    /// Compare a destination against the target, ignoring ASCII case so
    /// checksummed and lowercase renderings of one address agree.
    /// A missing destination (contract creation) never matches.
    pub fn is_target(&self, to: Option<&str>) -> bool {
        to.is_some_and(|to| to.eq_ignore_ascii_case(&self.target))
    }

    /// Both conditions must hold: destination and selector prefix
    pub fn matches(&self, record: &TransactionRecord) -> bool {
        self.is_target(record.to.as_deref()) && self.selector.matches(&record.input)
    }
}

/// Inspection rule applied to every fetched pending transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Watch {
    /// Report every transaction with a non-empty input payload
    Observe,
    /// Report calls matching a target contract and selector
    Targeted(TargetedCall),
}

impl Watch {
    /// Inspect one record, returning the report to emit if any
    pub fn inspect(&self, record: &TransactionRecord) -> Option<Report> {
        match self {
            Watch::Observe => record.has_input().then(|| Report::Observed(record.clone())),
            Watch::Targeted(call) => {
                if !call.matches(record) {
                    return None;
                }
                Some(Report::Matched {
                    record: record.clone(),
                    signature: call.selector().signature().to_string(),
                    solution: decode_solution(&record.input),
                })
            }
        }
    }

    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Watch::Observe => "observe",
            Watch::Targeted(_) => "targeted",
        }
    }
}
