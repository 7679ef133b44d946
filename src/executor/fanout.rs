//! Channel-join fan-out executor
//!
//! Every leaf scan runs as its own tokio task; all tasks report into one
//! mpsc channel as `(group, leaf, result)` and a single coordinator drains
//! exactly as many reports as it dispatched. The first failed leaf ends the
//! join: the receiver is dropped, late sends go nowhere, and the outcome is
//! failed. Completion is decided by the drain count alone, never by shared
//! counters.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::compiler::{LeafScanSpec, TableKind};
use crate::observability::{Logger, Severity};

use super::errors::ScanError;
use super::merge;
use super::scan::{RowRecord, ScanService};

/// Terminal status of one WHERE execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryStatus {
    Completed,
    Failed,
}

/// Result of executing a compiled WHERE clause: merged rows on success,
/// the first leaf failure otherwise.
#[derive(Debug, Clone)]
pub struct WhereOutcome {
    pub status: QueryStatus,
    pub rows: Vec<RowRecord>,
    pub error: Option<ScanError>,
    pub elapsed_ms: u64,
}

impl WhereOutcome {
    fn completed(rows: Vec<RowRecord>, started: Instant) -> Self {
        Self {
            status: QueryStatus::Completed,
            rows,
            error: None,
            elapsed_ms: started.elapsed().as_millis() as u64,
        }
    }

    fn failed(error: ScanError, started: Instant) -> Self {
        Self {
            status: QueryStatus::Failed,
            rows: Vec::new(),
            error: Some(error),
            elapsed_ms: started.elapsed().as_millis() as u64,
        }
    }
}

/// Executor tuning knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FanOutConfig {
    /// Capacity of the result channel the leaf tasks report into
    pub channel_capacity: usize,
}

impl Default for FanOutConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 64,
        }
    }
}

/// Fans compiled leaf batches out over the scan service and fans the
/// results back in: intersection within a group, union across groups,
/// identity dedup for flow-record queries.
pub struct FanOutExecutor {
    service: Arc<dyn ScanService>,
    config: FanOutConfig,
}

impl FanOutExecutor {
    pub fn new(service: Arc<dyn ScanService>, config: FanOutConfig) -> Self {
        Self { service, config }
    }

    /// Runs every leaf of every OR-group concurrently and joins the
    /// results. Never panics on leaf failure; the outcome carries it.
    pub async fn run(&self, batches: Vec<Vec<LeafScanSpec>>, kind: TableKind) -> WhereOutcome {
        let started = Instant::now();

        let total: usize = batches.iter().map(Vec::len).sum();
        let mut per_group: Vec<Vec<Vec<RowRecord>>> =
            batches.iter().map(|b| Vec::with_capacity(b.len())).collect();

        if total > 0 {
            let (tx, mut rx) = mpsc::channel(self.config.channel_capacity.max(1));
            for (group, leaves) in batches.into_iter().enumerate() {
                for leaf in leaves {
                    let tx = tx.clone();
                    let scan = self.service.scan(leaf);
                    tokio::spawn(async move {
                        let result = scan.await;
                        // The receiver is gone after a failure; that is fine
                        let _ = tx.send((group, result)).await;
                    });
                }
            }
            drop(tx);

            for _ in 0..total {
                let Some((group, result)) = rx.recv().await else {
                    // All senders dropped without reporting
                    return self.fail(ScanError::TaskAborted, started);
                };
                match result {
                    Ok(rows) => {
                        Logger::log(
                            Severity::Trace,
                            "WHERE_LEAF_DONE",
                            &[
                                ("group", &group.to_string()),
                                ("rows", &rows.len().to_string()),
                            ],
                        );
                        per_group[group].push(rows);
                    }
                    Err(err) => {
                        drop(rx);
                        return self.fail(err, started);
                    }
                }
            }
        }

        let merged = merge::union(per_group.into_iter().map(merge::intersect).collect());
        let rows = if kind.dedups_by_identity() {
            merge::dedup_by_identity(merged)
        } else {
            merged
        };

        let outcome = WhereOutcome::completed(rows, started);
        Logger::log(
            Severity::Info,
            "WHERE_MERGE_DONE",
            &[
                ("elapsed_ms", &outcome.elapsed_ms.to_string()),
                ("leaves", &total.to_string()),
                ("rows", &outcome.rows.len().to_string()),
            ],
        );
        outcome
    }

    /// Runs the clause and hands the outcome to `on_done`. The callback is
    /// `FnOnce`, so delivery is structurally once.
    pub async fn run_with_callback<F>(
        &self,
        batches: Vec<Vec<LeafScanSpec>>,
        kind: TableKind,
        on_done: F,
    ) where
        F: FnOnce(WhereOutcome) + Send + 'static,
    {
        let outcome = self.run(batches, kind).await;
        on_done(outcome);
    }

    fn fail(&self, error: ScanError, started: Instant) -> WhereOutcome {
        Logger::log_stderr(
            Severity::Error,
            "WHERE_FAILED",
            &[("reason", &error.to_string())],
        );
        WhereOutcome::failed(error, started)
    }
}
