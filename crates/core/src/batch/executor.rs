//! Serial and paced-parallel batch execution

use std::future::Future;

use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use k3bridge_domain::{
    BatchConfig, BatchError, BatchItem, ItemOutcome, K3Error, OperationResult, OutputGroups,
    Result,
};
use tracing::{debug, error, instrument};

use super::router::{OutputRouter, RouteOutcome};

/// Runs one operation per input index and collects the shaped output.
///
/// In serial mode items run strictly one after another. In parallel mode
/// every item is launched without waiting for earlier ones; launches are
/// grouped by `batch_size` and each group after the first waits
/// `batch_interval` before starting. The wait only delays launches, calls
/// already in flight keep running. Output is always in input order.
#[derive(Debug, Clone, Default)]
pub struct BatchExecutor {
    config: BatchConfig,
    continue_on_error: bool,
}

impl BatchExecutor {
    /// Executor that aborts on the first failing item.
    pub fn new(config: BatchConfig) -> Self {
        Self { config, continue_on_error: false }
    }

    /// Record failed items as `{"error": ..}` entries instead of aborting.
    pub fn with_continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = continue_on_error;
        self
    }

    /// Run `op(0)..op(item_count - 1)`.
    ///
    /// # Errors
    /// Without continue-on-error, the first failing item (lowest index)
    /// aborts the batch and is returned with its index.
    #[instrument(skip_all, fields(items = item_count, parallel = self.config.enabled))]
    pub async fn run<F, Fut>(
        &self,
        item_count: usize,
        op: F,
    ) -> std::result::Result<OutputGroups, BatchError>
    where
        F: Fn(usize) -> Fut,
        Fut: Future<Output = Result<OperationResult>>,
    {
        if self.config.enabled {
            self.run_parallel(item_count, op).await
        } else {
            self.run_serial(item_count, op).await
        }
    }

    async fn run_serial<F, Fut>(
        &self,
        item_count: usize,
        op: F,
    ) -> std::result::Result<OutputGroups, BatchError>
    where
        F: Fn(usize) -> Fut,
        Fut: Future<Output = Result<OperationResult>>,
    {
        let mut router = OutputRouter::new();
        for index in 0..item_count {
            debug!(item_index = index, "running item");
            let mut item = BatchItem::pending(index);
            item.settle(op(index).await).map_err(|source| BatchError { index, source })?;
            if let Some(groups) = self.absorb(&mut router, item)? {
                return Ok(groups);
            }
        }
        debug!(entries = router.len(), "batch output collected");
        Ok(router.finish())
    }

    async fn run_parallel<F, Fut>(
        &self,
        item_count: usize,
        op: F,
    ) -> std::result::Result<OutputGroups, BatchError>
    where
        F: Fn(usize) -> Fut,
        Fut: Future<Output = Result<OperationResult>>,
    {
        let batch_size = self.config.batch_size() as usize;
        let interval = self.config.batch_interval;
        let mut items: Vec<BatchItem> = (0..item_count).map(BatchItem::pending).collect();
        let mut in_flight = FuturesUnordered::new();

        for index in 0..item_count {
            if index > 0 && index % batch_size == 0 && !interval.is_zero() {
                let pause = tokio::time::sleep(interval);
                tokio::pin!(pause);
                loop {
                    tokio::select! {
                        () = &mut pause => break,
                        Some(done) = in_flight.next(), if !in_flight.is_empty() => {
                            settle(&mut items, done)?;
                        }
                    }
                }
            }

            debug!(item_index = index, batch = index / batch_size, "launching item");
            let call = op(index);
            in_flight.push(async move { (index, call.await) });

            // Drive the new call to its first suspension point.
            while let Some(Some(done)) = in_flight.next().now_or_never() {
                settle(&mut items, done)?;
            }
        }

        while let Some(done) = in_flight.next().await {
            settle(&mut items, done)?;
        }

        let mut router = OutputRouter::new();
        for item in items {
            if let Some(groups) = self.absorb(&mut router, item)? {
                return Ok(groups);
            }
        }
        debug!(entries = router.len(), "batch output collected");
        Ok(router.finish())
    }

    /// Feed one settled item to the router. `Some` means the item replaced
    /// the whole output.
    fn absorb(
        &self,
        router: &mut OutputRouter,
        item: BatchItem,
    ) -> std::result::Result<Option<OutputGroups>, BatchError> {
        let index = item.index;
        match item.into_outcome() {
            ItemOutcome::Success(result) => {
                debug!(item_index = index, kind = %result.kind(), "routing item result");
                match router.route(index, result) {
                    RouteOutcome::Replaced(groups) => {
                        debug!(item_index = index, groups = groups.len(), "item replaced batch output");
                        Ok(Some(groups))
                    }
                    RouteOutcome::Appended(_) | RouteOutcome::Skipped => Ok(None),
                }
            }
            ItemOutcome::Error(source) => {
                error!(item_index = index, error = %source, "batch item failed");
                if self.continue_on_error {
                    router.push_error(index, &source);
                    Ok(None)
                } else {
                    Err(BatchError { index, source })
                }
            }
            ItemOutcome::Pending => Err(BatchError {
                index,
                source: K3Error::Internal(format!("batch item {index} never settled")),
            }),
        }
    }
}

fn settle(
    items: &mut [BatchItem],
    (index, result): (usize, Result<OperationResult>),
) -> std::result::Result<(), BatchError> {
    match items.get_mut(index) {
        Some(item) => item.settle(result).map_err(|source| BatchError { index, source }),
        None => Err(BatchError {
            index,
            source: K3Error::Internal(format!("batch item {index} out of range")),
        }),
    }
}
