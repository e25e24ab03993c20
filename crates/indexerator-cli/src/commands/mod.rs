pub mod index;
pub mod schema;

pub use index::IndexCommand;
pub use schema::SchemaCommand;
