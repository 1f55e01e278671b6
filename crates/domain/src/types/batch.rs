//! Batch execution types: configuration, per-item results and output shaping

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::{DEFAULT_BATCH_INTERVAL_MS, DEFAULT_BATCH_SIZE};
use crate::errors::K3Error;
use crate::impl_wire_name_conversions;

/// Execution mode and pacing for one batch.
///
/// `enabled == false` runs items strictly one after another. With
/// `enabled == true` every item is launched without waiting for earlier ones,
/// and each group of `batch_size` launches is delayed by `batch_interval`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    /// Parallel mode.
    pub enabled: bool,
    batch_size: u32,
    /// Delay before each launch group after the first.
    pub batch_interval: Duration,
}

impl BatchConfig {
    /// Serial mode with the default pacing values kept for reference.
    pub fn serial() -> Self {
        Self {
            enabled: false,
            batch_size: DEFAULT_BATCH_SIZE,
            batch_interval: Duration::from_millis(DEFAULT_BATCH_INTERVAL_MS),
        }
    }

    /// Parallel mode. A `batch_size` of 0 is treated as 1.
    pub fn parallel(batch_size: u32, batch_interval: Duration) -> Self {
        Self { enabled: true, batch_size: batch_size.max(1), batch_interval }
    }

    /// Options present means parallel mode, absent means serial.
    pub fn from_options(options: Option<&BatchingOptions>) -> Self {
        match options {
            Some(opts) => Self::parallel(
                opts.batch_size.unwrap_or(DEFAULT_BATCH_SIZE),
                Duration::from_millis(opts.batch_interval_ms.unwrap_or(DEFAULT_BATCH_INTERVAL_MS)),
            ),
            None => Self::serial(),
        }
    }

    /// Always at least 1.
    pub fn batch_size(&self) -> u32 {
        self.batch_size
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self::serial()
    }
}

/// User-facing batching options as they appear in configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchingOptions {
    /// Launches per group.
    #[serde(default)]
    pub batch_size: Option<u32>,
    /// Milliseconds between launch groups.
    #[serde(default)]
    pub batch_interval_ms: Option<u64>,
}

/// Output-shaping policy selected by an operation result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// The item's own entries are appended.
    Single,
    /// The item replaces the whole output.
    Multiple,
    /// The item contributes nothing.
    None,
}

impl_wire_name_conversions!(OutputKind {
    Single => "single",
    Multiple => "multiple",
    None => "none",
});

/// One entry of batch output, tagged with the input position it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputEntry {
    /// The entry's data.
    pub json: Value,
    /// Input index the entry came from.
    #[serde(rename = "pairedItem", skip_serializing_if = "Option::is_none", default)]
    pub paired_item: Option<usize>,
}

impl OutputEntry {
    /// Entry tagged with its input index.
    pub fn new(json: Value, paired_item: usize) -> Self {
        Self { json, paired_item: Some(paired_item) }
    }

    /// Entry with no input index, as supplied inside a `multiple` directive.
    pub fn untagged(json: Value) -> Self {
        Self { json, paired_item: None }
    }

    /// Error entry written in place of a failed item when continue-on-error
    /// is active.
    pub fn error(err: &K3Error, paired_item: usize) -> Self {
        Self::new(serde_json::json!({ "error": err.to_string() }), paired_item)
    }
}

/// Ordered output groups. Normal batches produce exactly one group.
pub type OutputGroups = Vec<Vec<OutputEntry>>;

/// Explicit output-shaping directive attached to an operation result.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputDirective {
    /// Emit the value as this item's output.
    Single(Value),
    /// Replace the whole batch output with these groups.
    Multiple(OutputGroups),
    /// Emit nothing for this item.
    None,
}

/// What a per-item operation hands back to the executor.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationResult {
    /// A single data value.
    Item(Value),
    /// Several data values, each becoming its own output entry.
    Items(Vec<Value>),
    /// Explicit shaping.
    Directive(OutputDirective),
}

impl OperationResult {
    /// Shorthand for [`OutputDirective::None`].
    pub fn none() -> Self {
        Self::Directive(OutputDirective::None)
    }

    /// Shorthand for [`OutputDirective::Multiple`].
    pub fn multiple(groups: OutputGroups) -> Self {
        Self::Directive(OutputDirective::Multiple(groups))
    }

    /// The shaping policy this result selects.
    pub fn kind(&self) -> OutputKind {
        match self {
            Self::Item(_) | Self::Items(_) | Self::Directive(OutputDirective::Single(_)) => {
                OutputKind::Single
            }
            Self::Directive(OutputDirective::Multiple(_)) => OutputKind::Multiple,
            Self::Directive(OutputDirective::None) => OutputKind::None,
        }
    }
}

impl From<Value> for OperationResult {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) => Self::Items(items),
            other => Self::Item(other),
        }
    }
}

/// Processing state of one input item.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    /// Not settled yet.
    Pending,
    /// The operation returned a result.
    Success(OperationResult),
    /// The operation failed.
    Error(K3Error),
}

/// One input position and what became of it. Settled exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchItem {
    /// Zero-based input position.
    pub index: usize,
    outcome: ItemOutcome,
}

impl BatchItem {
    /// Unsettled item at `index`.
    pub fn pending(index: usize) -> Self {
        Self { index, outcome: ItemOutcome::Pending }
    }

    /// True until [`Self::settle`] succeeds.
    pub fn is_pending(&self) -> bool {
        matches!(self.outcome, ItemOutcome::Pending)
    }

    /// Record the operation result. A second call is an internal error and
    /// leaves the first outcome in place.
    pub fn settle(&mut self, result: Result<OperationResult, K3Error>) -> Result<(), K3Error> {
        if !self.is_pending() {
            return Err(K3Error::Internal(format!("batch item {} settled twice", self.index)));
        }
        self.outcome = match result {
            Ok(value) => ItemOutcome::Success(value),
            Err(err) => ItemOutcome::Error(err),
        };
        Ok(())
    }

    /// Consume the item, keeping its outcome.
    pub fn into_outcome(self) -> ItemOutcome {
        self.outcome
    }
}
