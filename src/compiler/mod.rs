//! WHERE predicate compilation
//!
//! Turns a query's WHERE clause (JSON, OR-of-ANDs) into batches of leaf
//! scan specifications. Each table kind has its own strategy module; the
//! `WhereCompiler` drives parsing, validation, and dispatch. All rejection
//! happens here, before any scan is issued.

pub mod compiler;
pub mod errors;
pub mod flow;
pub mod message;
pub mod object;
pub mod parse;
pub mod slicer;
pub mod spec;
pub mod stats;
pub mod table;

pub use compiler::WhereCompiler;
pub use errors::{CompileError, CompileErrorCode, CompileResult};
pub use parse::{parse_where, Term};
pub use spec::{cf, ColumnRange, LeafScanSpec};
pub use stats::{StatSuffix, StatTerm};
pub use table::{Table, TableKind};
