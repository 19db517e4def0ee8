//! Progress reporting during an analysis run.

pub mod reporter;
