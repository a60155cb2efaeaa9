//! SQL composition for Object Catalog
//!
//! Pure functions over a [`SchemaSnapshot`](crate::schema::SchemaSnapshot):
//! identifier sanitization, join planning, projection, filter and order
//! compilation, and statement assembly. Nothing here touches the database.

pub mod builder;
pub mod filter;
pub mod join;
pub mod order;
pub mod projection;
pub mod query;
pub mod sanitize;

pub use builder::{Params, Statement};
pub use filter::compile_filters;
pub use join::{ChainTarget, Join, JoinPlan};
pub use order::compile_orders;
pub use projection::Projection;
pub use query::{Assignment, LookupKey, SelectQuery};
pub use sanitize::{quote_identifier, validate_identifier};
