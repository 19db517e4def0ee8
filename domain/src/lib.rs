//! Domain layer for costpilot
//!
//! This crate contains the core entities and value objects of the cost
//! analysis agent. It has no dependencies on infrastructure or presentation
//! concerns: no AWS SDK, no async runtime, no I/O.
//!
//! # Core Concepts
//!
//! ## Transcript
//!
//! An analysis run is a conversation between the agent and a remote inference
//! service. The [`Transcript`] is the append-only record of that conversation:
//! user turns, assistant turns (optionally requesting tool calls), and one
//! tool-result turn per requested call.
//!
//! ## Inspection Tools
//!
//! The model never touches the AWS account directly. It asks for read-only
//! [`InspectionTool`]s by name; the application layer resolves, validates and
//! executes them, folding every [`ToolResult`] back into the transcript.
//!
//! ## Outcome
//!
//! Every run ends in an [`AnalysisOutcome`] whose [`AnalysisStatus`] tells the
//! caller whether the analysis completed, ran out of budget, failed, or was
//! cancelled. There is no silent partial success.

pub mod analysis;
pub mod core;
pub mod fault;
pub mod orchestration;
pub mod prompt;
pub mod tool;
pub mod transcript;
pub mod util;

// Re-export commonly used types
pub use analysis::{
    outcome::{AnalysisOutcome, AnalysisStatus},
    profile::ClientProfile,
    recommendation::Recommendation,
};
pub use core::error::DomainError;
pub use fault::{FaultCategory, RemoteFault};
pub use orchestration::state::{Decision, FinishReason, LoopState};
pub use prompt::AnalysisPromptTemplate;
pub use tool::{
    arguments::{Arguments, CacheKey, canonical_json},
    catalog::InspectionTool,
    entities::{ParamType, ToolDefinition, ToolParameter, ToolSpec},
    traits::{DefaultToolValidator, ToolValidator},
    value_objects::{ToolErrorCode, ToolResult},
};
pub use transcript::entities::{ToolCallRequest, Transcript, Turn};
