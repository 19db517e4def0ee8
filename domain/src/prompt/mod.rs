//! Prompt domain
//!
//! Templates for the text sent to the inference service.

mod analysis;

pub use analysis::{AnalysisPromptTemplate, USER_REQUEST_MARKER};
