//! quarry - WHERE predicate compilation and fan-out scan execution for a
//! column-family analytics store

pub mod compiler;
pub mod executor;
pub mod model;
pub mod observability;
pub mod schema;
