//! Table kinds and field recognition
//!
//! Each logical table kind knows which physical indexes exist and which
//! WHERE field names it recognizes. The kind is classified once from the
//! table name; everything downstream dispatches on the closed enum instead
//! of repeating name comparisons.

use serde::Serialize;

/// WHERE field names, as they appear in predicate JSON.
pub mod field {
    pub const SOURCE: &str = "Source";
    pub const KEYWORD: &str = "Keyword";
    pub const MODULE: &str = "ModuleId";
    pub const MESSAGE_TYPE: &str = "Messagetype";
    pub const CATEGORY: &str = "Category";
    pub const OBJECT_ID: &str = "ObjectId";

    pub const FLOW_VROUTER: &str = "vrouter";
    pub const FLOW_SOURCEVN: &str = "sourcevn";
    pub const FLOW_SOURCEIP: &str = "sourceip";
    pub const FLOW_DESTVN: &str = "destvn";
    pub const FLOW_DESTIP: &str = "destip";
    pub const FLOW_PROTOCOL: &str = "protocol";
    pub const FLOW_SPORT: &str = "sport";
    pub const FLOW_DPORT: &str = "dport";
}

/// Well-known table names.
pub const MESSAGE_TABLE: &str = "MessageTable";
pub const FLOW_RECORD_TABLE: &str = "FlowRecordTable";
pub const FLOW_SERIES_TABLE: &str = "FlowSeriesTable";
pub const OBJECT_VALUE_TABLE: &str = "ObjectValueTable";
pub const STAT_TABLE_PREFIX: &str = "StatTable.";

const MESSAGE_FIELDS: [&str; 5] = [
    field::SOURCE,
    field::KEYWORD,
    field::MODULE,
    field::MESSAGE_TYPE,
    field::CATEGORY,
];

const FLOW_FIELDS: [&str; 8] = [
    field::FLOW_VROUTER,
    field::FLOW_SOURCEVN,
    field::FLOW_SOURCEIP,
    field::FLOW_DESTVN,
    field::FLOW_DESTIP,
    field::FLOW_PROTOCOL,
    field::FLOW_SPORT,
    field::FLOW_DPORT,
];

/// Closed set of logical table kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TableKind {
    /// Generic message/log table
    Message,
    /// Per-object-type index table (object logs)
    ObjectIndex,
    /// Flow record or flow series table
    Flow { series: bool },
    /// Object-value listing table; compiles to no scans
    ObjectValue,
    /// Stat table, static (compiled-in schema) or dynamic (request schema)
    Stats { dynamic: bool },
}

impl TableKind {
    pub fn is_stats(&self) -> bool {
        matches!(self, TableKind::Stats { .. })
    }

    pub fn is_flow(&self) -> bool {
        matches!(self, TableKind::Flow { .. })
    }

    /// Flow-record queries deduplicate merged rows by record identity.
    pub fn dedups_by_identity(&self) -> bool {
        matches!(self, TableKind::Flow { series: false })
    }
}

/// The target table of one query: its name and classified kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Table {
    name: String,
    kind: TableKind,
}

impl Table {
    /// Classifies a table by name. `has_static_schema` distinguishes static
    /// from dynamic stat tables; it is ignored for other kinds.
    pub fn classify(name: impl Into<String>, has_static_schema: bool) -> Table {
        let name = name.into();
        let kind = if name == MESSAGE_TABLE {
            TableKind::Message
        } else if name == FLOW_RECORD_TABLE {
            TableKind::Flow { series: false }
        } else if name == FLOW_SERIES_TABLE {
            TableKind::Flow { series: true }
        } else if name == OBJECT_VALUE_TABLE {
            TableKind::ObjectValue
        } else if name.starts_with(STAT_TABLE_PREFIX) {
            TableKind::Stats {
                dynamic: !has_static_schema,
            }
        } else {
            TableKind::ObjectIndex
        };
        Table { name, kind }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> TableKind {
        self.kind
    }

    /// Early validation: is this field name meaningful for the table kind?
    ///
    /// Object-index tables accept message fields too, since object logs are
    /// messages. Stats fields are validated against the schema instead.
    pub fn recognizes_field(&self, name: &str) -> bool {
        match self.kind {
            TableKind::Message => MESSAGE_FIELDS.contains(&name),
            TableKind::ObjectIndex => {
                name == field::OBJECT_ID || MESSAGE_FIELDS.contains(&name)
            }
            TableKind::Flow { .. } => FLOW_FIELDS.contains(&name),
            TableKind::ObjectValue => false,
            TableKind::Stats { .. } => true,
        }
    }

    /// Splits `StatTable.<module>.<attr>` into its row-key components.
    pub fn stat_name_parts(&self) -> Option<(&str, &str)> {
        let rest = self.name.strip_prefix(STAT_TABLE_PREFIX)?;
        let dot = rest.find('.')?;
        Some((&rest[..dot], &rest[dot + 1..]))
    }
}
