//! Column descriptors and the static schema collaborator trait

use crate::model::{DataType, SuffixSet};

/// Everything the compiler needs to know about one stats column: its
/// declared type, whether it is indexed, and which suffix fields may refine
/// it (empty set = one-tag index only).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub datatype: DataType,
    pub indexed: bool,
    pub suffixes: SuffixSet,
}

impl ColumnDescriptor {
    pub fn new(datatype: DataType, indexed: bool) -> Self {
        Self {
            datatype,
            indexed,
            suffixes: SuffixSet::new(),
        }
    }

    pub fn with_suffixes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.suffixes = names.into_iter().map(Into::into).collect();
        self
    }

    /// Descriptor for a column the schema does not know: Blank, unindexed.
    pub fn blank() -> Self {
        Self::new(DataType::Blank, false)
    }

    /// First declared suffix field, used for null-suffix synthesis.
    /// Deterministic because the set is ordered.
    pub fn first_suffix(&self) -> Option<&str> {
        self.suffixes.iter().next().map(String::as_str)
    }
}

/// Compiled-in schema lookup for statically declared stat tables.
///
/// Implemented by the schema-storage collaborator; quarry only reads it.
pub trait StatSchema: Send + Sync {
    /// Resolves a column name to its descriptor, if the table declares it.
    fn column_desc(&self, name: &str) -> Option<ColumnDescriptor>;
}
