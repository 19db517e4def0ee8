//! Inference providers
//!
//! Adapters implementing the application's `InferenceClient` port.

pub mod bedrock;

pub use bedrock::BedrockInferenceClient;
