//! Analysis domain
//!
//! The inputs and outputs of one orchestration run:
//!
//! - [`profile::ClientProfile`] - whose account to inspect, and where
//! - [`outcome::AnalysisOutcome`] - the terminal artifact of a run
//! - [`recommendation::Recommendation`] - a record derived from a successful outcome

pub mod outcome;
pub mod profile;
pub mod recommendation;
