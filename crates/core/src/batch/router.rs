//! Output shaping for batch results

use k3bridge_domain::{K3Error, OperationResult, OutputDirective, OutputEntry, OutputGroups};

/// What [`OutputRouter::route`] did with one result.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteOutcome {
    /// This many entries were appended to the output group.
    Appended(usize),
    /// The result asked for no output.
    Skipped,
    /// The result carries the whole batch output.
    Replaced(OutputGroups),
}

/// Accumulates the single output group of a batch.
#[derive(Debug, Default)]
pub struct OutputRouter {
    entries: Vec<OutputEntry>,
}

impl OutputRouter {
    /// Empty router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the result's shaping policy. Every appended entry is tagged
    /// with `index`.
    pub fn route(&mut self, index: usize, result: OperationResult) -> RouteOutcome {
        match result {
            OperationResult::Item(json)
            | OperationResult::Directive(OutputDirective::Single(json)) => {
                self.entries.push(OutputEntry::new(json, index));
                RouteOutcome::Appended(1)
            }
            OperationResult::Items(values) => {
                let count = values.len();
                self.entries.extend(values.into_iter().map(|json| OutputEntry::new(json, index)));
                RouteOutcome::Appended(count)
            }
            OperationResult::Directive(OutputDirective::None) => RouteOutcome::Skipped,
            OperationResult::Directive(OutputDirective::Multiple(groups)) => {
                RouteOutcome::Replaced(groups)
            }
        }
    }

    /// Record a failed item in place of its output.
    pub fn push_error(&mut self, index: usize, err: &K3Error) {
        self.entries.push(OutputEntry::error(err, index));
    }

    /// Entries collected so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True before any entry is collected.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The collected entries as a single output group.
    pub fn finish(self) -> OutputGroups {
        vec![self.entries]
    }
}
