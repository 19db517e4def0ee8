//! Output formatting for analysis outcomes.

pub mod console;
pub mod formatter;
