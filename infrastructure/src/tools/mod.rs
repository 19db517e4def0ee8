//! Tool schema conversion for the inference service.

mod schema;

pub use schema::JsonSchemaToolConverter;
