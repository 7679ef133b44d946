//! WHERE predicate compiler
//!
//! Drives the per-table strategies: parses the OR-of-ANDs predicate JSON,
//! validates every term, and compiles each AND-group into the leaf scans
//! the executor fans out. Compilation is pure and deterministic; it never
//! touches the store.

use crate::model::MatchOp;
use crate::observability::{Logger, Severity};
use crate::schema::SchemaSource;

use super::errors::{CompileError, CompileResult};
use super::flow::FlowTerms;
use super::parse::{parse_where, Term};
use super::spec::LeafScanSpec;
use super::table::{field, Table, TableKind};
use super::{message, object, stats};

/// Compiler for one query's WHERE clause, bound to its target table,
/// schema source, and flow direction.
pub struct WhereCompiler {
    table: Table,
    schema: SchemaSource,
    direction: u8,
}

impl WhereCompiler {
    pub fn new(table: Table, schema: SchemaSource, direction: u8) -> Self {
        Self {
            table,
            schema,
            direction,
        }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Compiles the full WHERE clause: one leaf batch per OR-group.
    ///
    /// An absent or empty clause compiles to the single wildcard batch for
    /// the table kind. Any rejected term fails the whole compile.
    pub fn compile(&self, where_json: Option<&str>) -> CompileResult<Vec<Vec<LeafScanSpec>>> {
        let result = self.compile_inner(where_json);
        match &result {
            Ok(batches) => {
                let groups = batches.len().to_string();
                let leaves = batches.iter().map(Vec::len).sum::<usize>().to_string();
                Logger::log(
                    Severity::Trace,
                    "WHERE_COMPILE",
                    &[
                        ("groups", &groups),
                        ("leaves", &leaves),
                        ("table", self.table.name()),
                    ],
                );
            }
            Err(err) => {
                Logger::log_stderr(
                    Severity::Warn,
                    "WHERE_FAILED",
                    &[
                        ("code", err.code().code()),
                        ("reason", err.message()),
                        ("table", self.table.name()),
                    ],
                );
            }
        }
        result
    }

    fn compile_inner(&self, where_json: Option<&str>) -> CompileResult<Vec<Vec<LeafScanSpec>>> {
        let raw = where_json.map(str::trim).filter(|s| !s.is_empty());
        let Some(raw) = raw else {
            return Ok(vec![self.wildcard()?]);
        };

        let groups = parse_where(raw)?;
        if groups.is_empty() {
            return Ok(vec![self.wildcard()?]);
        }

        groups
            .iter()
            .map(|terms| self.compile_and_group(terms))
            .collect()
    }

    /// Compiles one OR-group of the clause, addressed by index.
    ///
    /// An empty clause stands for one implicit group: the table-kind
    /// wildcard at index 0, same as `compile`.
    pub fn compile_group(&self, where_json: &str, index: usize) -> CompileResult<Vec<LeafScanSpec>> {
        let empty = where_json.trim().is_empty();
        let groups = if empty {
            Vec::new()
        } else {
            parse_where(where_json)?
        };
        if groups.is_empty() {
            if index > 0 {
                return Err(CompileError::parse_invalid(format!(
                    "OR-group index {} out of range (1 group)",
                    index
                )));
            }
            return self.wildcard();
        }
        let terms = groups.get(index).ok_or_else(|| {
            CompileError::parse_invalid(format!(
                "OR-group index {} out of range ({} groups)",
                index,
                groups.len()
            ))
        })?;
        self.compile_and_group(terms)
    }

    /// The scan batch an empty WHERE stands for.
    fn wildcard(&self) -> CompileResult<Vec<LeafScanSpec>> {
        match self.table.kind() {
            TableKind::Message => Ok(vec![message::wildcard()]),
            TableKind::ObjectIndex => Ok(vec![object::wildcard(self.table.name())]),
            TableKind::Flow { .. } => Ok(vec![FlowTerms::wildcard(self.direction)]),
            // Object-value listings read the value table directly; no scans
            TableKind::ObjectValue => Ok(Vec::new()),
            TableKind::Stats { .. } => {
                Err(CompileError::wildcard_unsupported(self.table.name()))
            }
        }
    }

    fn compile_and_group(&self, terms: &[Term]) -> CompileResult<Vec<LeafScanSpec>> {
        if self.table.kind().is_stats() {
            return self.compile_stats_group(terms);
        }

        let mut leaves = Vec::new();
        let mut flow = FlowTerms::default();
        let mut object_id_seen = false;

        for term in terms {
            if !self.table.recognizes_field(&term.name) {
                return Err(CompileError::unknown_field(&term.name));
            }
            if term.value2.is_some() && term.op != MatchOp::InRange {
                return Err(CompileError::invalid_term(format!(
                    "{}: value2 is only valid with IN_RANGE",
                    term.name
                )));
            }

            if self.table.kind().is_flow() {
                let collected = flow.collect(
                    &term.name,
                    term.op,
                    &term.value_str(),
                    term.value2_str().as_deref(),
                )?;
                if !collected {
                    return Err(CompileError::unknown_field(&term.name));
                }
                continue;
            }

            if term.name == field::OBJECT_ID {
                leaves.push(object::compile_term(
                    self.table.name(),
                    term.op,
                    &term.value_str(),
                )?);
                object_id_seen = true;
                continue;
            }

            match message::compile_term(&term.name, term.op, &term.value_str())? {
                Some(leaf) => leaves.push(leaf),
                None => return Err(CompileError::unknown_field(&term.name)),
            }
        }

        if self.table.kind().is_flow() {
            flow.validate()?;
            leaves.extend(flow.build_leaves(self.direction)?);
        } else if self.table.kind() == TableKind::ObjectIndex && !object_id_seen {
            // Message-field terms alone still need the per-object row scan
            leaves.push(object::wildcard(self.table.name()));
        }

        Ok(leaves)
    }

    fn compile_stats_group(&self, terms: &[Term]) -> CompileResult<Vec<LeafScanSpec>> {
        let mut leaves = Vec::new();
        for term in terms {
            if let Some(leaf) = stats::compile_term(term, &self.table, &self.schema)? {
                leaves.push(leaf);
            }
        }
        Ok(leaves)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::spec::cf;
    use crate::model::{DataType, KeyPart};
    use crate::schema::{ColumnDescriptor, StatSchema};
    use std::sync::Arc;

    fn message_compiler() -> WhereCompiler {
        WhereCompiler::new(
            Table::classify("MessageTable", false),
            SchemaSource::None,
            0,
        )
    }

    fn flow_compiler(series: bool, direction: u8) -> WhereCompiler {
        let name = if series {
            "FlowSeriesTable"
        } else {
            "FlowRecordTable"
        };
        WhereCompiler::new(Table::classify(name, false), SchemaSource::None, direction)
    }

    #[test]
    fn test_source_equal_single_leaf() {
        let batches = message_compiler()
            .compile(Some(r#"[[{"name": "Source", "value": "vrouter1", "op": 1}]]"#))
            .unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 1);
        let leaf = &batches[0][0];
        assert_eq!(leaf.cfname, cf::MESSAGE_TABLE_SOURCE);
        assert_eq!(leaf.column_range.start, vec![KeyPart::Str("vrouter1".into())]);
        assert_eq!(leaf.column_range.finish, vec![KeyPart::Str("vrouter1".into())]);
        assert!(leaf.col_time_only);
    }

    #[test]
    fn test_source_prefix_sentinel_finish() {
        let batches = message_compiler()
            .compile(Some(r#"[[{"name": "Source", "value": "vr", "op": 6}]]"#))
            .unwrap();
        let leaf = &batches[0][0];
        assert_eq!(leaf.column_range.start, vec![KeyPart::Str("vr".into())]);
        assert_eq!(leaf.column_range.finish, vec![KeyPart::Str("vr\x7f".into())]);
    }

    #[test]
    fn test_keyword_lowercased() {
        let batches = message_compiler()
            .compile(Some(r#"[[{"name": "Keyword", "value": "ERROR", "op": 1}]]"#))
            .unwrap();
        assert_eq!(
            batches[0][0].column_range.start,
            vec![KeyPart::Str("error".into())]
        );
    }

    #[test]
    fn test_and_group_yields_one_leaf_per_term() {
        let batches = message_compiler()
            .compile(Some(
                r#"[[{"name": "Source", "value": "a", "op": 1},
                     {"name": "ModuleId", "value": "m", "op": 1}]]"#,
            ))
            .unwrap();
        assert_eq!(batches[0].len(), 2);
    }

    #[test]
    fn test_or_groups_stay_separate() {
        let batches = message_compiler()
            .compile(Some(
                r#"[[{"name": "Source", "value": "a", "op": 1}],
                    [{"name": "Source", "value": "b", "op": 1}]]"#,
            ))
            .unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].len(), 1);
        assert_eq!(batches[1].len(), 1);
    }

    #[test]
    fn test_empty_where_message_wildcard() {
        for clause in [None, Some(""), Some("  "), Some("[]")] {
            let batches = message_compiler().compile(clause).unwrap();
            assert_eq!(batches.len(), 1);
            assert_eq!(batches[0][0].cfname, cf::MESSAGE_TABLE_TIMESTAMP);
            assert!(batches[0][0].row_time_only);
            assert!(batches[0][0].col_time_only);
        }
    }

    #[test]
    fn test_empty_where_flow_wildcard_by_direction() {
        let batches = flow_compiler(false, 1).compile(None).unwrap();
        let leaf = &batches[0][0];
        assert_eq!(leaf.cfname, cf::FLOW_TABLE_PROT_SP);
        assert_eq!(leaf.row_key_suffix, vec![KeyPart::U8(1)]);
        assert_eq!(leaf.column_range.start, vec![KeyPart::U8(0)]);
        assert_eq!(
            leaf.column_range.finish,
            vec![KeyPart::U8(0xff), KeyPart::U16(0xffff)]
        );
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = message_compiler()
            .compile(Some(r#"[[{"name": "bogus", "value": "x", "op": 1}]]"#))
            .unwrap_err();
        assert_eq!(err.code().code(), "QUARRY_UNKNOWN_FIELD");

        // Flow field on a message table is just as unknown
        let err = message_compiler()
            .compile(Some(r#"[[{"name": "sourcevn", "value": "x", "op": 1}]]"#))
            .unwrap_err();
        assert_eq!(err.code().code(), "QUARRY_UNKNOWN_FIELD");
    }

    #[test]
    fn test_value2_without_in_range_rejected() {
        let err = message_compiler()
            .compile(Some(
                r#"[[{"name": "Source", "value": "a", "op": 1, "value2": "b"}]]"#,
            ))
            .unwrap_err();
        assert_eq!(err.code().code(), "QUARRY_INVALID_TERM");
    }

    #[test]
    fn test_object_table_group() {
        let compiler = WhereCompiler::new(
            Table::classify("ObjectVNTable", false),
            SchemaSource::None,
            0,
        );
        let batches = compiler
            .compile(Some(r#"[[{"name": "ObjectId", "value": "vn1", "op": 1}]]"#))
            .unwrap();
        assert_eq!(batches[0].len(), 1);
        assert_eq!(batches[0][0].cfname, cf::OBJECT_TABLE);
        assert_eq!(
            batches[0][0].row_key_suffix,
            vec![KeyPart::Str("ObjectVNTable".into())]
        );
    }

    #[test]
    fn test_object_table_without_object_id_appends_wildcard() {
        let compiler = WhereCompiler::new(
            Table::classify("ObjectVNTable", false),
            SchemaSource::None,
            0,
        );
        let batches = compiler
            .compile(Some(r#"[[{"name": "Source", "value": "a", "op": 1}]]"#))
            .unwrap();
        // message leaf plus the full object-id span for the table
        assert_eq!(batches[0].len(), 2);
        assert_eq!(batches[0][1].cfname, cf::OBJECT_TABLE);
        assert_eq!(
            batches[0][1].column_range.start,
            vec![KeyPart::Str("\x1b".into())]
        );
        assert_eq!(
            batches[0][1].column_range.finish,
            vec![KeyPart::Str("\x7f".into())]
        );
    }

    #[test]
    fn test_flow_group_compiles_through_context() {
        let batches = flow_compiler(false, 0)
            .compile(Some(
                r#"[[{"name": "protocol", "value": 6, "op": 1},
                     {"name": "sport", "value": 80, "op": 1}]]"#,
            ))
            .unwrap();
        assert_eq!(batches[0].len(), 1);
        let leaf = &batches[0][0];
        assert_eq!(leaf.cfname, cf::FLOW_TABLE_PROT_SP);
        assert_eq!(
            leaf.column_range.start,
            vec![KeyPart::U8(6), KeyPart::U16(80)]
        );
    }

    #[test]
    fn test_flow_correlation_enforced_per_group() {
        let err = flow_compiler(false, 0)
            .compile(Some(r#"[[{"name": "sourceip", "value": "10.0.0.1", "op": 1}]]"#))
            .unwrap_err();
        assert_eq!(err.code().code(), "QUARRY_MISSING_CORRELATE");

        // The same term is fine when its correlate is present
        let ok = flow_compiler(false, 0)
            .compile(Some(
                r#"[[{"name": "sourceip", "value": "10.0.0.1", "op": 1},
                     {"name": "sourcevn", "value": "vn1", "op": 1}]]"#,
            ))
            .unwrap();
        assert_eq!(ok[0].len(), 1);
    }

    #[test]
    fn test_object_value_table_compiles_to_no_scans() {
        let compiler = WhereCompiler::new(
            Table::classify("ObjectValueTable", false),
            SchemaSource::None,
            0,
        );
        let batches = compiler.compile(None).unwrap();
        assert_eq!(batches.len(), 1);
        assert!(batches[0].is_empty());

        // Any WHERE term on the listing table is meaningless
        let err = compiler
            .compile(Some(r#"[[{"name": "ObjectId", "value": "x", "op": 1}]]"#))
            .unwrap_err();
        assert_eq!(err.code().code(), "QUARRY_UNKNOWN_FIELD");
    }

    #[test]
    fn test_stats_wildcard_rejected() {
        let compiler = WhereCompiler::new(
            Table::classify("StatTable.VnStats.vn_stats", false),
            SchemaSource::Dynamic(None),
            0,
        );
        let err = compiler.compile(None).unwrap_err();
        assert_eq!(err.code().code(), "QUARRY_WILDCARD_UNSUPPORTED");
    }

    struct OneField;

    impl StatSchema for OneField {
        fn column_desc(&self, name: &str) -> Option<ColumnDescriptor> {
            (name == "vn_stats.vn").then(|| ColumnDescriptor::new(DataType::Str, true))
        }
    }

    #[test]
    fn test_stats_group_dispatch() {
        let compiler = WhereCompiler::new(
            Table::classify("StatTable.VnStats.vn_stats", true),
            SchemaSource::Static(Arc::new(OneField)),
            0,
        );
        let batches = compiler
            .compile(Some(r#"[[{"name": "vn_stats.vn", "value": "vn1", "op": 1}]]"#))
            .unwrap();
        assert_eq!(batches[0][0].cfname, cf::STATS_BY_STR_TAG);
    }

    #[test]
    fn test_compile_group_by_index() {
        let clause = r#"[[{"name": "Source", "value": "a", "op": 1}],
                         [{"name": "Source", "value": "b", "op": 1}]]"#;
        let leaves = message_compiler().compile_group(clause, 1).unwrap();
        assert_eq!(
            leaves[0].column_range.start,
            vec![KeyPart::Str("b".into())]
        );

        let err = message_compiler().compile_group(clause, 2).unwrap_err();
        assert_eq!(err.code().code(), "QUARRY_PARSE_INVALID");
    }

    #[test]
    fn test_compile_group_empty_clause_is_wildcard() {
        // The empty clause stands for one implicit wildcard group
        for clause in ["", "  ", "[]"] {
            let leaves = flow_compiler(false, 1).compile_group(clause, 0).unwrap();
            assert_eq!(leaves.len(), 1);
            assert_eq!(leaves[0].cfname, cf::FLOW_TABLE_PROT_SP);
            assert_eq!(leaves[0].row_key_suffix, vec![KeyPart::U8(1)]);
        }

        // Both entry points agree on it
        let whole = message_compiler().compile(Some("")).unwrap();
        let group = message_compiler().compile_group("", 0).unwrap();
        assert_eq!(whole[0], group);

        // The implicit group exists only at index 0
        let err = message_compiler().compile_group("", 1).unwrap_err();
        assert_eq!(err.code().code(), "QUARRY_PARSE_INVALID");
    }

    #[test]
    fn test_compile_is_deterministic() {
        let clause = r#"[[{"name": "Source", "value": "a", "op": 6},
                          {"name": "Keyword", "value": "K", "op": 1}]]"#;
        let a = message_compiler().compile(Some(clause)).unwrap();
        let b = message_compiler().compile(Some(clause)).unwrap();
        assert_eq!(a, b);
    }
}
