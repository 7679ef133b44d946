//! Fan-out scan execution
//!
//! Takes the compiler's leaf batches, runs every leaf concurrently against
//! the store-side `ScanService`, and fans the results back in: per-group
//! intersection, cross-group union, and identity dedup where the table
//! kind calls for it.

pub mod errors;
pub mod fanout;
pub mod merge;
pub mod scan;

pub use errors::{ScanError, ScanResult};
pub use fanout::{FanOutConfig, FanOutExecutor, QueryStatus, WhereOutcome};
pub use scan::{RowRecord, ScanService};
