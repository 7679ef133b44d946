//! Leaf scan specifications
//!
//! A `LeafScanSpec` is the unit of compiled, dispatchable work: one column
//! family, one row-key suffix, one composite column range. One AND-group
//! compiles to one or more leaves; the executor intersects their results.

use serde::Serialize;

use crate::model::KeyPart;

/// Physical column family names.
///
/// These are store-side identifiers and must match the write path exactly.
pub mod cf {
    pub const MESSAGE_TABLE_SOURCE: &str = "MessageTableSource";
    pub const MESSAGE_TABLE_KEYWORD: &str = "MessageTableKeyword";
    pub const MESSAGE_TABLE_MODULE_ID: &str = "MessageTableModuleId";
    pub const MESSAGE_TABLE_MESSAGETYPE: &str = "MessageTableMessagetype";
    pub const MESSAGE_TABLE_CATEGORY: &str = "MessageTableCategory";
    pub const MESSAGE_TABLE_TIMESTAMP: &str = "MessageTableTimestamp";

    pub const OBJECT_TABLE: &str = "ObjectTable";

    pub const FLOW_TABLE_VROUTER: &str = "FlowTableVrouter";
    pub const FLOW_TABLE_SVN_SIP: &str = "FlowTableSvnSip";
    pub const FLOW_TABLE_DVN_DIP: &str = "FlowTableDvnDip";
    pub const FLOW_TABLE_PROT_SP: &str = "FlowTableProtSp";
    pub const FLOW_TABLE_PROT_DP: &str = "FlowTableProtDp";

    pub const STATS_BY_STR_TAG: &str = "StatsTableByStrTag";
    pub const STATS_BY_U64_TAG: &str = "StatsTableByU64Tag";
    pub const STATS_BY_DBL_TAG: &str = "StatsTableByDblTag";
    pub const STATS_BY_STR_STR_TAG: &str = "StatsTableByStrStrTag";
    pub const STATS_BY_STR_U64_TAG: &str = "StatsTableByStrU64Tag";
    pub const STATS_BY_U64_STR_TAG: &str = "StatsTableByU64StrTag";
    pub const STATS_BY_U64_U64_TAG: &str = "StatsTableByU64U64Tag";
}

/// Composite column range: ordered start/finish key-component sequences.
///
/// The sequences need not be the same length; an absent trailing start
/// component means "from the beginning of that position's domain".
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ColumnRange {
    pub start: Vec<KeyPart>,
    pub finish: Vec<KeyPart>,
}

impl ColumnRange {
    /// Appends one component to both bounds.
    pub fn push(&mut self, start: KeyPart, finish: KeyPart) {
        self.start.push(start);
        self.finish.push(finish);
    }
}

/// One compiled leaf scan: column family, row-key suffix, column range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeafScanSpec {
    /// Target column family
    pub cfname: &'static str,
    /// Row-key components beyond the fixed table namespace
    pub row_key_suffix: Vec<KeyPart>,
    /// Column-key range to scan within the row
    pub column_range: ColumnRange,
    /// Column key is the timestamp position only
    pub col_time_only: bool,
    /// Row key is the timestamp position only
    pub row_time_only: bool,
}

impl LeafScanSpec {
    pub fn new(cfname: &'static str) -> Self {
        Self {
            cfname,
            row_key_suffix: Vec::new(),
            column_range: ColumnRange::default(),
            col_time_only: false,
            row_time_only: false,
        }
    }
}
