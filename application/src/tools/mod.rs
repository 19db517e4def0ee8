//! The tool pipeline between the orchestration loop and the remote account.
//!
//! - [`registry`] - name resolution, normalization, validation, dispatch
//! - [`cache`] - per-run memoization of successful results
//! - [`retry`] - exponential backoff for transient faults
//! - [`pagination`] - merging cursor-paginated listings

pub mod cache;
pub mod pagination;
pub mod registry;
pub mod retry;

pub use cache::{CacheLookup, ResultCache};
pub use pagination::{DEFAULT_MAX_PAGES, Page, PaginationMerger};
pub use registry::ToolRegistry;
pub use retry::{InvokeError, RetryingInvoker, Transient};
