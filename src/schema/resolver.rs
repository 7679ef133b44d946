//! Static and dynamic schema sources

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::model::DataType;

use super::errors::{SchemaError, SchemaResult};
use super::types::{ColumnDescriptor, StatSchema};

/// Name → descriptor map parsed once per query from the request's schema
/// fragment: a JSON array of `{name, datatype, index, suffixes[]}` entries.
#[derive(Debug, Clone, Default)]
pub struct DynamicSchema {
    columns: BTreeMap<String, ColumnDescriptor>,
}

impl DynamicSchema {
    /// Parses a schema fragment. An empty array yields an empty schema,
    /// which callers treat as "keep provisional typing".
    pub fn parse(fragment: &str) -> SchemaResult<DynamicSchema> {
        let parsed: serde_json::Value = serde_json::from_str(fragment)
            .map_err(|e| SchemaError::invalid(format!("schema fragment: {}", e)))?;
        let entries = parsed
            .as_array()
            .ok_or_else(|| SchemaError::invalid("schema fragment is not an array"))?;

        let mut columns = BTreeMap::new();
        for entry in entries {
            let name = entry
                .get("name")
                .and_then(|v| v.as_str())
                .ok_or_else(|| SchemaError::invalid("schema entry is missing 'name'"))?;
            let datatype = entry
                .get("datatype")
                .and_then(|v| v.as_str())
                .ok_or_else(|| SchemaError::invalid("schema entry is missing 'datatype'"))?;
            let indexed = entry
                .get("index")
                .and_then(|v| v.as_bool())
                .unwrap_or(false);

            let mut desc = ColumnDescriptor::new(DataType::from_schema_str(datatype), indexed);
            if let Some(suffixes) = entry.get("suffixes").and_then(|v| v.as_array()) {
                desc = desc.with_suffixes(suffixes.iter().filter_map(|s| s.as_str()));
            }
            columns.insert(name.to_string(), desc);
        }
        Ok(DynamicSchema { columns })
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Unknown columns resolve to the Blank descriptor, which rejects.
    pub fn column_desc(&self, name: &str) -> ColumnDescriptor {
        self.columns
            .get(name)
            .cloned()
            .unwrap_or_else(ColumnDescriptor::blank)
    }
}

/// Where a stats query's column descriptors come from.
#[derive(Clone)]
pub enum SchemaSource {
    /// Statically declared stat table: compiled-in schema collaborator.
    Static(Arc<dyn StatSchema>),
    /// Dynamic stat table: fragment from the request, if one was supplied.
    Dynamic(Option<DynamicSchema>),
    /// Not a stats query at all.
    None,
}

impl SchemaSource {
    /// Builds the dynamic source from an optional request fragment.
    pub fn from_fragment(fragment: Option<&str>) -> SchemaResult<SchemaSource> {
        match fragment {
            Some(text) => Ok(SchemaSource::Dynamic(Some(DynamicSchema::parse(text)?))),
            None => Ok(SchemaSource::Dynamic(None)),
        }
    }
}

impl std::fmt::Debug for SchemaSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaSource::Static(_) => write!(f, "SchemaSource::Static"),
            SchemaSource::Dynamic(d) => write!(f, "SchemaSource::Dynamic({:?})", d),
            SchemaSource::None => write!(f, "SchemaSource::None"),
        }
    }
}
