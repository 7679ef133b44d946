//! Stats schema resolution for quarry
//!
//! Stats tables are filtered only through indexed columns, and which index
//! layout applies depends on the column's declared type and suffix set. The
//! descriptor for a field comes from one of two places:
//!
//! - a compiled-in static schema, reached through the `StatSchema`
//!   collaborator trait, or
//! - a per-query dynamic schema fragment embedded in the request JSON,
//!   parsed once into a name → descriptor map.
//!
//! A dynamic table with no fragment at all skips schema validation; a
//! fragment that is present but empty keeps the term's provisional JSON
//! typing.

mod errors;
mod resolver;
mod types;

pub use errors::{SchemaError, SchemaErrorCode, SchemaResult};
pub use resolver::{DynamicSchema, SchemaSource};
pub use types::{ColumnDescriptor, StatSchema};
