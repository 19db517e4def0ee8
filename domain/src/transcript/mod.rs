//! Transcript domain
//!
//! The ordered record of one orchestration run. A transcript is append-only:
//! turns are pushed, never edited, and the pairing between tool calls and
//! tool results is checked on every append.
//!
//! ```text
//! User ──▶ Assistant{calls: [a, b]} ──▶ ToolResult{a} ──▶ ToolResult{b} ──▶ Assistant{..} ──▶ …
//! ```

pub mod entities;

pub use entities::{ToolCallRequest, Transcript, Turn};
