//! Value and operator model for quarry
//!
//! Everything the compiler and executor touch is expressed over a closed,
//! tagged scalar model:
//!
//! - `Value`: the three predicate value types (string, u64, double)
//! - `KeyPart`: the wider set of composite key components a leaf scan carries
//! - `DataType`: schema-declared column types (including Blank = unknown)
//! - `MatchOp`: the fixed integer operator enum shared with callers
//!
//! # Invariants
//!
//! - Equality and ordering are defined within one `Value` tag only;
//!   cross-tag comparison is a programming error and compares as unequal/None
//! - Operator integer codes are a wire contract and never change

mod op;
mod value;

pub use op::MatchOp;
pub use value::{DataType, KeyPart, SuffixSet, Value};

pub(crate) use value::json_scalar_to_string;
