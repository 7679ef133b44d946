//! WHERE predicate JSON parsing
//!
//! Grammar: `where := array<OR-group>`, `OR-group := array<term>`,
//! `term := {name, value, op, value2?, suffix?}`. Parsing only checks
//! structure and JSON types; operator/field semantics are validated by the
//! per-kind strategies.

use crate::model::{json_scalar_to_string, MatchOp};

use super::errors::{CompileError, CompileResult};

/// One structurally valid WHERE term. The raw suffix object is kept as-is
/// for the stats path, which applies its own parse rules to it.
#[derive(Debug, Clone)]
pub struct Term {
    pub name: String,
    pub op: MatchOp,
    pub value: serde_json::Value,
    pub value2: Option<serde_json::Value>,
    pub suffix: Option<serde_json::Value>,
}

impl Term {
    /// Parses one term object.
    pub fn parse(raw: &serde_json::Value) -> CompileResult<Term> {
        let obj = raw
            .as_object()
            .ok_or_else(|| CompileError::parse_invalid("term is not an object"))?;

        let name = obj
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| CompileError::invalid_term("term 'name' must be a string"))?
            .to_string();

        let value = obj
            .get("value")
            .filter(|v| v.is_string() || v.is_number())
            .cloned()
            .ok_or_else(|| {
                CompileError::invalid_term("term 'value' must be a string or number")
            })?;

        let op_code = obj
            .get("op")
            .and_then(|v| v.as_i64())
            .ok_or_else(|| CompileError::invalid_term("term 'op' must be an integer"))?;
        let op = MatchOp::from_code(op_code)
            .ok_or_else(|| CompileError::invalid_term(format!("unknown op code {}", op_code)))?;

        let value2 = match obj.get("value2") {
            Some(v) if v.is_string() || v.is_number() => Some(v.clone()),
            Some(v) if v.is_null() => None,
            Some(_) => {
                return Err(CompileError::invalid_term(
                    "term 'value2' must be a string or number",
                ))
            }
            None => None,
        };

        let suffix = match obj.get("suffix") {
            Some(v) if v.is_object() => Some(v.clone()),
            Some(v) if v.is_null() => None,
            Some(_) => return Err(CompileError::invalid_term("term 'suffix' must be an object")),
            None => None,
        };

        Ok(Term {
            name,
            op,
            value,
            value2,
            suffix,
        })
    }

    /// Term value stringified for per-field re-parsing.
    pub fn value_str(&self) -> String {
        json_scalar_to_string(&self.value)
    }

    /// Term value2 stringified, if present.
    pub fn value2_str(&self) -> Option<String> {
        self.value2.as_ref().map(json_scalar_to_string)
    }
}

/// Parses the WHERE body into OR-groups of structurally valid terms.
/// Empty AND-groups are rejected; empty input must be handled by the caller
/// as the wildcard case before JSON parsing.
pub fn parse_where(where_json: &str) -> CompileResult<Vec<Vec<Term>>> {
    let parsed: serde_json::Value = serde_json::from_str(where_json)
        .map_err(|e| CompileError::parse_invalid(format!("where clause: {}", e)))?;

    let or_groups = parsed
        .as_array()
        .ok_or_else(|| CompileError::parse_invalid("where clause is not an array"))?;

    let mut groups = Vec::with_capacity(or_groups.len());
    for or_group in or_groups {
        let terms = or_group
            .as_array()
            .ok_or_else(|| CompileError::parse_invalid("OR-group is not an array"))?;
        if terms.is_empty() {
            return Err(CompileError::parse_invalid("OR-group is empty"));
        }
        groups.push(terms.iter().map(Term::parse).collect::<CompileResult<_>>()?);
    }
    Ok(groups)
}
