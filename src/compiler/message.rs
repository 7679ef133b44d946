//! Message/log table strategy
//!
//! Every recognized message field maps 1:1 to a dedicated column family.
//! The row key is the table identity (no suffix components here) and the
//! column range comes from the slicer over the string value. Only EQUAL and
//! PREFIX are supported. Keyword values are case-folded before compare,
//! matching the write path.

use crate::model::{KeyPart, MatchOp, Value};

use super::errors::{CompileError, CompileResult};
use super::slicer;
use super::spec::{cf, LeafScanSpec};
use super::table::field;

fn cf_for_field(name: &str) -> Option<&'static str> {
    match name {
        field::SOURCE => Some(cf::MESSAGE_TABLE_SOURCE),
        field::KEYWORD => Some(cf::MESSAGE_TABLE_KEYWORD),
        field::MODULE => Some(cf::MESSAGE_TABLE_MODULE_ID),
        field::MESSAGE_TYPE => Some(cf::MESSAGE_TABLE_MESSAGETYPE),
        field::CATEGORY => Some(cf::MESSAGE_TABLE_CATEGORY),
        _ => None,
    }
}

/// Compiles one message-table term into a leaf, or `None` if the field is
/// not a message field.
pub fn compile_term(name: &str, op: MatchOp, value: &str) -> CompileResult<Option<LeafScanSpec>> {
    let Some(cfname) = cf_for_field(name) else {
        return Ok(None);
    };

    if !matches!(op, MatchOp::Equal | MatchOp::Prefix) {
        return Err(CompileError::bad_operator(name, op.name()));
    }

    let value = if name == field::KEYWORD {
        value.to_lowercase()
    } else {
        value.to_string()
    };

    let (start, finish) = slicer::slice(op, Value::Str(value), None)?;

    let mut leaf = LeafScanSpec::new(cfname);
    leaf.col_time_only = true;
    leaf.column_range.push(start.into(), finish.into());
    Ok(Some(leaf))
}

/// Wildcard scan for an empty WHERE: the timestamp column family, keyed and
/// ranged by time only.
pub fn wildcard() -> LeafScanSpec {
    let mut leaf = LeafScanSpec::new(cf::MESSAGE_TABLE_TIMESTAMP);
    leaf.col_time_only = true;
    leaf.row_time_only = true;
    leaf
}
