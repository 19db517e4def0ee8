//! Tool domain module
//!
//! Defines how the model reaches the AWS account: only through a closed
//! catalog of read-only [`InspectionTool`]s.
//!
//! ```text
//! ┌──────────────┐    ┌────────────────┐    ┌──────────────┐
//! │ ToolSpec     │───▶│ normalize +    │───▶│ ToolResult   │
//! │ (catalog)    │    │ validate       │    │ (payload)    │
//! └──────┬───────┘    └────────────────┘    └──────────────┘
//!        │
//!        ├─ aliases: "describe_instances" → "get_ec2_instances"
//!        └─ tools:   "get_ec2_instances"  → ToolDefinition
//! ```
//!
//! # Tool Name Aliases
//!
//! Models frequently guess SDK operation names (`describe_instances`,
//! `list_buckets`) instead of catalog names. [`ToolSpec::resolve`] maps those
//! to the canonical name without an extra inference round-trip.
//!
//! # Key Types
//!
//! - [`ToolSpec`] - catalog of definitions + alias mappings
//! - [`ToolDefinition`] - schema for a single tool
//! - [`InspectionTool`] - closed enum of concrete operations
//! - [`ToolResult`] - `Success { data }` or `Failure { error_code, message, recoverable }`
//! - [`CacheKey`] - identity of a normalized call
//! - [`ToolValidator`] - pure argument validation

pub mod arguments;
pub mod catalog;
pub mod entities;
pub mod traits;
pub mod value_objects;

pub use arguments::{Arguments, CacheKey, canonical_json, normalize};
pub use catalog::{InspectionTool, REGION_PARAM, ROLE_ARN_PARAM};
pub use entities::{ParamType, ToolDefinition, ToolParameter, ToolSpec};
pub use traits::{DefaultToolValidator, ToolValidator};
pub use value_objects::{ToolErrorCode, ToolResult};
