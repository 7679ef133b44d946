//! Object-index table strategy
//!
//! Object ids live in one shared column family keyed by table name. A
//! group that never constrains the object id still needs a scan, so the
//! wildcard bounds the range with sentinels covering every printable id.

use crate::model::{KeyPart, MatchOp, Value};

use super::errors::{CompileError, CompileResult};
use super::slicer;
use super::spec::{cf, LeafScanSpec};

// Low/high sentinels spanning all printable object ids.
const OBJECT_ID_LOW: &str = "\x1b";
const OBJECT_ID_HIGH: &str = "\x7f";

/// Compiles an ObjectId term into an object-table leaf.
pub fn compile_term(table_name: &str, op: MatchOp, value: &str) -> CompileResult<LeafScanSpec> {
    if !matches!(op, MatchOp::Equal | MatchOp::Prefix) {
        return Err(CompileError::bad_operator("ObjectId", op.name()));
    }
    let (start, finish) = slicer::slice(op, Value::Str(value.to_string()), None)?;

    let mut leaf = LeafScanSpec::new(cf::OBJECT_TABLE);
    leaf.row_key_suffix.push(KeyPart::Str(table_name.to_string()));
    leaf.column_range.push(start.into(), finish.into());
    Ok(leaf)
}

/// Unconstrained object-id scan: the full printable range for this table.
pub fn wildcard(table_name: &str) -> LeafScanSpec {
    let mut leaf = LeafScanSpec::new(cf::OBJECT_TABLE);
    leaf.row_key_suffix.push(KeyPart::Str(table_name.to_string()));
    leaf.column_range.push(
        KeyPart::Str(OBJECT_ID_LOW.to_string()),
        KeyPart::Str(OBJECT_ID_HIGH.to_string()),
    );
    leaf
}
