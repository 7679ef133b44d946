//! Observability
//!
//! Structured JSON logging for the compile and scan pipeline. Logging is
//! read-only, synchronous, and must never affect query results.
//!
//! Events:
//! - `WHERE_COMPILE` — a clause compiled; group and leaf counts
//! - `WHERE_LEAF_DONE` — one leaf scan reported; row count
//! - `WHERE_MERGE_DONE` — fan-in finished; merged rows and elapsed time
//! - `WHERE_FAILED` — compile rejection or first leaf failure

mod logger;

pub use logger::{Logger, Severity};
