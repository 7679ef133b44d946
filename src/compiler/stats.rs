//! Stats table strategy
//!
//! A stats term has a prefix half and an optional suffix half. The schema
//! (static or per-query dynamic) decides the authoritative value types and
//! whether a one-tag or two-tag index applies; JSON-inferred types are only
//! provisional. Six physical index layouts exist, selected by the
//! (prefix type, suffix type) pair.
//!
//! Parse rules, in order (suffix refinement rides on an exact prefix match):
//!
//! 1. extract prefix name/value/value2/op, provisionally typed from JSON
//! 2. a suffix object forces prefix op EQUAL and no prefix value2
//! 3. resolve the prefix descriptor; unknown or unindexed rejects
//! 4. re-coerce prefix values to the declared type
//! 5. no declared suffixes: any supplied suffix rejects (one-tag index)
//! 6. declared suffixes, none supplied: synthesize the null suffix from the
//!    first declared suffix field with a type-appropriate zero
//! 7. supplied suffix: must be declared, then re-coerce to its type

use crate::model::{json_scalar_to_string, DataType, KeyPart, MatchOp, Value};
use crate::schema::{ColumnDescriptor, SchemaSource};

use super::errors::{CompileError, CompileResult};
use super::parse::Term;
use super::slicer;
use super::spec::{cf, LeafScanSpec};
use super::table::Table;

/// Suffix half of a parsed stats term. `op` is `None` for the synthesized
/// null suffix, which only addresses the two-tag index without filtering.
#[derive(Debug, Clone)]
pub struct StatSuffix {
    pub name: String,
    pub op: Option<MatchOp>,
    pub value: Value,
    pub value2: Option<Value>,
}

/// Fully parsed and schema-coerced stats term.
#[derive(Debug, Clone)]
pub struct StatTerm {
    pub prefix_name: String,
    pub prefix_op: MatchOp,
    pub prefix_value: Value,
    pub prefix_value2: Option<Value>,
    pub suffix: Option<StatSuffix>,
}

enum Resolved {
    /// Descriptor found (possibly Blank for unknown columns)
    Desc(ColumnDescriptor),
    /// Dynamic table without a schema fragment: skip the term entirely
    SkipTerm,
    /// Schema fragment present but empty: keep provisional typing
    Provisional,
}

fn resolve(source: &SchemaSource, name: &str) -> CompileResult<Resolved> {
    match source {
        SchemaSource::Static(schema) => Ok(Resolved::Desc(
            schema
                .column_desc(name)
                .unwrap_or_else(ColumnDescriptor::blank),
        )),
        SchemaSource::Dynamic(None) => Ok(Resolved::SkipTerm),
        SchemaSource::Dynamic(Some(ds)) if ds.is_empty() => Ok(Resolved::Provisional),
        SchemaSource::Dynamic(Some(ds)) => Ok(Resolved::Desc(ds.column_desc(name))),
        SchemaSource::None => Err(CompileError::invalid_term(
            "stats term outside a stats query",
        )),
    }
}

/// Suffix positions exist only on string and u64 index layouts. A dynamic
/// fragment can name a suffix column it never declares, which is bad input;
/// a static schema doing the same is a schema bug and asserts.
fn check_suffix_datatype(
    source: &SchemaSource,
    name: &str,
    datatype: DataType,
) -> CompileResult<()> {
    if matches!(datatype, DataType::Str | DataType::U64) {
        return Ok(());
    }
    if matches!(source, SchemaSource::Dynamic(_)) {
        return Err(CompileError::bad_suffix(format!(
            "suffix '{}' has no addressable datatype",
            name
        )));
    }
    unreachable!("static suffix datatype {:?} is not addressable", datatype)
}

fn coerce_to(raw: &serde_json::Value, datatype: DataType) -> CompileResult<Value> {
    Value::coerce(&json_scalar_to_string(raw), datatype)
        .ok_or_else(|| CompileError::invalid_term("column datatype is not filterable"))
}

/// Parses one stats WHERE term against the schema source.
///
/// `Ok(None)` means the term is benignly skipped (dynamic table with no
/// schema fragment); every real defect is an error.
pub fn parse_stat_term(term: &Term, source: &SchemaSource) -> CompileResult<Option<StatTerm>> {
    // Step 1: provisional prefix typing straight from JSON
    let prefix_value = Value::from_json(&term.value)
        .ok_or_else(|| CompileError::invalid_term("stats prefix value must be a scalar"))?;
    let prefix_value2 = term.value2.as_ref().and_then(Value::from_json);

    // Step 2: a suffix object constrains the prefix to an exact match
    let mut suffix = match &term.suffix {
        Some(raw) => {
            if term.op != MatchOp::Equal {
                return Err(CompileError::bad_suffix(
                    "suffix refinement requires an EQUAL prefix",
                ));
            }
            if term.value2.is_some() {
                return Err(CompileError::bad_suffix(
                    "suffix refinement forbids a prefix value2",
                ));
            }
            Some(parse_suffix_half(raw)?)
        }
        None => None,
    };

    // Step 3: resolve the prefix descriptor
    let desc = match resolve(source, &term.name)? {
        Resolved::SkipTerm => return Ok(None),
        Resolved::Provisional => {
            return Ok(Some(StatTerm {
                prefix_name: term.name.clone(),
                prefix_op: term.op,
                prefix_value,
                prefix_value2,
                suffix,
            }))
        }
        Resolved::Desc(desc) => desc,
    };
    if desc.datatype == DataType::Blank || !desc.indexed {
        return Err(CompileError::unindexed_field(&term.name));
    }

    // Step 4: authoritative re-coercion of the prefix values
    let prefix_value = coerce_to(&term.value, desc.datatype)?;
    let prefix_value2 = match &term.value2 {
        Some(raw) => Some(coerce_to(raw, desc.datatype)?),
        None => None,
    };

    if desc.suffixes.is_empty() {
        // Step 5: one-tag index, the term must not carry a suffix
        if suffix.is_some() {
            return Err(CompileError::bad_suffix(format!(
                "field '{}' declares no suffixes",
                term.name
            )));
        }
    } else {
        match &mut suffix {
            None => {
                // Step 6: null suffix so the two-tag index is addressable
                let sname = desc
                    .first_suffix()
                    .expect("non-empty suffix set")
                    .to_string();
                let sdesc = match resolve(source, &sname)? {
                    Resolved::Desc(d) => d,
                    _ => ColumnDescriptor::blank(),
                };
                check_suffix_datatype(source, &sname, sdesc.datatype)?;
                let value = match sdesc.datatype {
                    DataType::Str => Value::Str(String::new()),
                    _ => Value::U64(0),
                };
                suffix = Some(StatSuffix {
                    name: sname,
                    op: None,
                    value,
                    value2: None,
                });
            }
            Some(s) => {
                // Step 7: the supplied suffix must be declared and re-typed
                if !desc.suffixes.contains(&s.name) {
                    return Err(CompileError::bad_suffix(format!(
                        "'{}' is not a declared suffix of '{}'",
                        s.name, term.name
                    )));
                }
                let sdesc = match resolve(source, &s.name)? {
                    Resolved::Desc(d) => d,
                    _ => ColumnDescriptor::blank(),
                };
                check_suffix_datatype(source, &s.name, sdesc.datatype)?;
                s.value = Value::coerce(&value_to_raw_string(&s.value), sdesc.datatype)
                    .ok_or_else(|| CompileError::bad_suffix("suffix value not coercible"))?;
                if let Some(v2) = &s.value2 {
                    s.value2 = Some(
                        Value::coerce(&value_to_raw_string(v2), sdesc.datatype)
                            .ok_or_else(|| CompileError::bad_suffix("suffix value2 not coercible"))?,
                    );
                }
            }
        }
    }

    Ok(Some(StatTerm {
        prefix_name: term.name.clone(),
        prefix_op: term.op,
        prefix_value,
        prefix_value2,
        suffix,
    }))
}

fn parse_suffix_half(raw: &serde_json::Value) -> CompileResult<StatSuffix> {
    let name = raw
        .get("name")
        .and_then(|v| v.as_str())
        .ok_or_else(|| CompileError::bad_suffix("suffix 'name' must be a string"))?
        .to_string();
    let value = raw
        .get("value")
        .filter(|v| v.is_string() || v.is_number())
        .and_then(Value::from_json)
        .ok_or_else(|| CompileError::bad_suffix("suffix 'value' must be a string or number"))?;
    let op_code = raw
        .get("op")
        .and_then(|v| v.as_i64())
        .ok_or_else(|| CompileError::bad_suffix("suffix 'op' must be an integer"))?;
    let op = MatchOp::from_code(op_code)
        .ok_or_else(|| CompileError::bad_suffix(format!("unknown suffix op code {}", op_code)))?;
    let value2 = raw.get("value2").and_then(Value::from_json);
    Ok(StatSuffix {
        name,
        op: Some(op),
        value,
        value2,
    })
}

fn value_to_raw_string(v: &Value) -> String {
    match v {
        Value::Str(s) => s.clone(),
        Value::U64(u) => u.to_string(),
        Value::Dbl(d) => d.to_string(),
    }
}

/// Builds the leaf scan for a parsed stats term: picks the index variant
/// from the (prefix, suffix) type pair, lays out the row key, and slices
/// the column range over whichever half carries the operator.
pub fn build_stat_leaf(term: &StatTerm, table: &Table) -> CompileResult<LeafScanSpec> {
    let (module, attr) = table
        .stat_name_parts()
        .ok_or_else(|| CompileError::invalid_term("stats term against a non-stat table"))?;

    let cfname = match &term.suffix {
        None => match &term.prefix_value {
            Value::Str(_) => cf::STATS_BY_STR_TAG,
            Value::U64(_) => cf::STATS_BY_U64_TAG,
            Value::Dbl(_) => cf::STATS_BY_DBL_TAG,
        },
        Some(s) => match (&term.prefix_value, &s.value) {
            (Value::Str(_), Value::Str(_)) => cf::STATS_BY_STR_STR_TAG,
            (Value::Str(_), Value::U64(_)) => cf::STATS_BY_STR_U64_TAG,
            (Value::U64(_), Value::Str(_)) => cf::STATS_BY_U64_STR_TAG,
            (Value::U64(_), Value::U64(_)) => cf::STATS_BY_U64_U64_TAG,
            _ => {
                return Err(CompileError::invalid_term(
                    "no two-tag index for this type pair",
                ))
            }
        },
    };

    let mut leaf = LeafScanSpec::new(cfname);
    leaf.row_key_suffix.push(KeyPart::Str(module.to_string()));
    leaf.row_key_suffix.push(KeyPart::Str(attr.to_string()));
    leaf.row_key_suffix
        .push(KeyPart::Str(term.prefix_name.clone()));

    match &term.suffix {
        None => {
            let (start, finish) = slicer::slice(
                term.prefix_op,
                term.prefix_value.clone(),
                term.prefix_value2.clone(),
            )?;
            leaf.column_range.push(start.into(), finish.into());
        }
        Some(s) => {
            leaf.row_key_suffix.push(KeyPart::Str(s.name.clone()));
            match s.op {
                None => {
                    // Only the prefix filters; the suffix position spans its domain
                    let (start, finish) = slicer::slice(
                        term.prefix_op,
                        term.prefix_value.clone(),
                        term.prefix_value2.clone(),
                    )?;
                    leaf.column_range.push(start.into(), finish.into());
                    match &s.value {
                        Value::Str(_) => leaf.column_range.push(
                            KeyPart::Str("\x00".to_string()),
                            KeyPart::Str("\x7f".to_string()),
                        ),
                        Value::U64(_) => leaf
                            .column_range
                            .push(KeyPart::U64(0), KeyPart::U64(u64::MAX)),
                        Value::Dbl(_) => {
                            return Err(CompileError::invalid_term(
                                "no two-tag index for a double suffix",
                            ))
                        }
                    }
                }
                Some(sop) => {
                    // The suffix filters; the prefix pins an exact component
                    if term.prefix_op != MatchOp::Equal {
                        return Err(CompileError::bad_operator(
                            term.prefix_name.clone(),
                            term.prefix_op.name(),
                        ));
                    }
                    leaf.column_range.push(
                        term.prefix_value.clone().into(),
                        term.prefix_value.clone().into(),
                    );
                    let (start, finish) = slicer::slice(sop, s.value.clone(), s.value2.clone())?;
                    leaf.column_range.push(start.into(), finish.into());
                }
            }
        }
    }

    Ok(leaf)
}

/// Parses and compiles one stats term; `Ok(None)` when the term is skipped.
pub fn compile_term(
    term: &Term,
    table: &Table,
    source: &SchemaSource,
) -> CompileResult<Option<LeafScanSpec>> {
    match parse_stat_term(term, source)? {
        Some(parsed) => Ok(Some(build_stat_leaf(&parsed, table)?)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::StatSchema;
    use serde_json::json;
    use std::sync::Arc;

    struct TestSchema;

    impl StatSchema for TestSchema {
        fn column_desc(&self, name: &str) -> Option<ColumnDescriptor> {
            match name {
                "vn_stats.vn" => Some(
                    ColumnDescriptor::new(DataType::Str, true)
                        .with_suffixes(["vn_stats.in_bytes"]),
                ),
                "vn_stats.in_bytes" => Some(ColumnDescriptor::new(DataType::U64, false)),
                "cpu_info.cpu_share" => Some(ColumnDescriptor::new(DataType::Dbl, true)),
                "plain.tag" => Some(ColumnDescriptor::new(DataType::U64, true)),
                "raw.blob" => Some(ColumnDescriptor::new(DataType::Str, false)),
                _ => None,
            }
        }
    }

    fn static_source() -> SchemaSource {
        SchemaSource::Static(Arc::new(TestSchema))
    }

    fn stat_table() -> Table {
        Table::classify("StatTable.VnStats.vn_stats", true)
    }

    fn term(raw: serde_json::Value) -> Term {
        Term::parse(&raw).unwrap()
    }

    #[test]
    fn test_one_tag_leaf() {
        let t = term(json!({"name": "plain.tag", "value": 7, "op": 1}));
        let leaf = compile_term(&t, &stat_table(), &static_source())
            .unwrap()
            .unwrap();
        assert_eq!(leaf.cfname, "StatsTableByU64Tag");
        assert_eq!(
            leaf.row_key_suffix,
            vec![
                KeyPart::Str("VnStats".into()),
                KeyPart::Str("vn_stats".into()),
                KeyPart::Str("plain.tag".into()),
            ]
        );
        assert_eq!(leaf.column_range.start, vec![KeyPart::U64(7)]);
        assert_eq!(leaf.column_range.finish, vec![KeyPart::U64(7)]);
    }

    #[test]
    fn test_one_tag_double_leaf() {
        let t = term(json!({"name": "cpu_info.cpu_share", "value": 0.5, "op": 1}));
        let leaf = compile_term(&t, &stat_table(), &static_source())
            .unwrap()
            .unwrap();
        assert_eq!(leaf.cfname, "StatsTableByDblTag");
    }

    #[test]
    fn test_schema_coercion_overrides_json_type() {
        // JSON gives a number, schema says the column is a string
        let t = term(json!({"name": "vn_stats.vn", "value": 42, "op": 1}));
        let parsed = parse_stat_term(&t, &static_source()).unwrap().unwrap();
        assert_eq!(parsed.prefix_value, Value::Str("42".into()));
    }

    #[test]
    fn test_null_suffix_synthesis() {
        let t = term(json!({"name": "vn_stats.vn", "value": "vn1", "op": 1}));
        let parsed = parse_stat_term(&t, &static_source()).unwrap().unwrap();
        let s = parsed.suffix.as_ref().unwrap();
        assert_eq!(s.name, "vn_stats.in_bytes");
        assert_eq!(s.op, None);
        assert_eq!(s.value, Value::U64(0));

        let leaf = build_stat_leaf(&parsed, &stat_table()).unwrap();
        assert_eq!(leaf.cfname, "StatsTableByStrU64Tag");
        assert_eq!(leaf.row_key_suffix.len(), 4);
        // prefix sliced, suffix position spans the full u64 domain
        assert_eq!(
            leaf.column_range.start,
            vec![KeyPart::Str("vn1".into()), KeyPart::U64(0)]
        );
        assert_eq!(
            leaf.column_range.finish,
            vec![KeyPart::Str("vn1".into()), KeyPart::U64(u64::MAX)]
        );
    }

    #[test]
    fn test_supplied_suffix_slices_over_suffix() {
        let t = term(json!({
            "name": "vn_stats.vn", "value": "vn1", "op": 1,
            "suffix": {"name": "vn_stats.in_bytes", "value": 1000, "op": 3, "value2": 2000}
        }));
        let leaf = compile_term(&t, &stat_table(), &static_source())
            .unwrap()
            .unwrap();
        assert_eq!(leaf.cfname, "StatsTableByStrU64Tag");
        assert_eq!(
            leaf.column_range.start,
            vec![KeyPart::Str("vn1".into()), KeyPart::U64(1000)]
        );
        assert_eq!(
            leaf.column_range.finish,
            vec![KeyPart::Str("vn1".into()), KeyPart::U64(2000)]
        );
    }

    #[test]
    fn test_suffix_requires_equal_prefix() {
        let t = term(json!({
            "name": "vn_stats.vn", "value": "vn", "op": 6,
            "suffix": {"name": "vn_stats.in_bytes", "value": 1, "op": 1}
        }));
        let err = parse_stat_term(&t, &static_source()).unwrap_err();
        assert_eq!(err.code().code(), "QUARRY_BAD_SUFFIX");
    }

    #[test]
    fn test_suffix_forbids_prefix_value2() {
        let t = term(json!({
            "name": "vn_stats.vn", "value": "a", "op": 1, "value2": "b",
            "suffix": {"name": "vn_stats.in_bytes", "value": 1, "op": 1}
        }));
        assert!(parse_stat_term(&t, &static_source()).is_err());
    }

    #[test]
    fn test_unknown_and_unindexed_fields_rejected() {
        let t = term(json!({"name": "nope", "value": 1, "op": 1}));
        let err = parse_stat_term(&t, &static_source()).unwrap_err();
        assert_eq!(err.code().code(), "QUARRY_UNINDEXED_FIELD");

        let t = term(json!({"name": "raw.blob", "value": "x", "op": 1}));
        let err = parse_stat_term(&t, &static_source()).unwrap_err();
        assert_eq!(err.code().code(), "QUARRY_UNINDEXED_FIELD");
    }

    #[test]
    fn test_suffix_on_suffixless_field_rejected() {
        let t = term(json!({
            "name": "plain.tag", "value": 1, "op": 1,
            "suffix": {"name": "x", "value": 1, "op": 1}
        }));
        let err = parse_stat_term(&t, &static_source()).unwrap_err();
        assert_eq!(err.code().code(), "QUARRY_BAD_SUFFIX");
    }

    #[test]
    fn test_undeclared_suffix_rejected() {
        let t = term(json!({
            "name": "vn_stats.vn", "value": "vn1", "op": 1,
            "suffix": {"name": "vn_stats.out_bytes", "value": 1, "op": 1}
        }));
        let err = parse_stat_term(&t, &static_source()).unwrap_err();
        assert_eq!(err.code().code(), "QUARRY_BAD_SUFFIX");
    }

    #[test]
    fn test_dynamic_without_fragment_skips_term() {
        let t = term(json!({"name": "anything", "value": 1, "op": 1}));
        let source = SchemaSource::Dynamic(None);
        assert!(parse_stat_term(&t, &source).unwrap().is_none());
    }

    #[test]
    fn test_dynamic_rejections_match_static() {
        let fragment = r#"[{"name": "known", "datatype": "int", "index": false}]"#;
        let source = SchemaSource::from_fragment(Some(fragment)).unwrap();

        let t = term(json!({"name": "known", "value": 1, "op": 1}));
        let err = parse_stat_term(&t, &source).unwrap_err();
        assert_eq!(err.code().code(), "QUARRY_UNINDEXED_FIELD");

        let t = term(json!({"name": "unknown", "value": 1, "op": 1}));
        let err = parse_stat_term(&t, &source).unwrap_err();
        assert_eq!(err.code().code(), "QUARRY_UNINDEXED_FIELD");
    }

    #[test]
    fn test_dynamic_undeclared_suffix_column_rejected() {
        // The fragment names a suffix column it never declares; both the
        // null-suffix and supplied-suffix paths must reject, not assert.
        let fragment =
            r#"[{"name": "p", "datatype": "string", "index": true, "suffixes": ["ghost"]}]"#;
        let source = SchemaSource::from_fragment(Some(fragment)).unwrap();

        let t = term(json!({"name": "p", "value": "x", "op": 1}));
        let err = parse_stat_term(&t, &source).unwrap_err();
        assert_eq!(err.code().code(), "QUARRY_BAD_SUFFIX");

        let t = term(json!({
            "name": "p", "value": "x", "op": 1,
            "suffix": {"name": "ghost", "value": 1, "op": 1}
        }));
        let err = parse_stat_term(&t, &source).unwrap_err();
        assert_eq!(err.code().code(), "QUARRY_BAD_SUFFIX");
    }

    #[test]
    fn test_empty_fragment_keeps_provisional_typing() {
        let source = SchemaSource::from_fragment(Some("[]")).unwrap();
        let t = term(json!({"name": "field", "value": 9, "op": 1}));
        let parsed = parse_stat_term(&t, &source).unwrap().unwrap();
        assert_eq!(parsed.prefix_value, Value::U64(9));
        assert!(parsed.suffix.is_none());

        let leaf = build_stat_leaf(&parsed, &stat_table()).unwrap();
        assert_eq!(leaf.cfname, "StatsTableByU64Tag");
    }

    #[test]
    fn test_determinism() {
        let t = term(json!({"name": "vn_stats.vn", "value": "vn1", "op": 6}));
        let a = compile_term(&t, &stat_table(), &static_source()).unwrap();
        let b = compile_term(&t, &stat_table(), &static_source()).unwrap();
        assert_eq!(a, b);
    }
}
