//! Interactive analysis module
//!
//! Provides a readline-based interactive interface: each line is one
//! analysis of the configured account.

mod repl;

pub use repl::AnalysisRepl;
