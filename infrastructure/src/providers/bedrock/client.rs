//! Bedrock inference client
//!
//! Wraps the Bedrock Converse API to implement [`InferenceClient`]. The API
//! is stateless: every request carries the full transcript, converted from
//! the run's [`Transcript`](costpilot_domain::Transcript).

use super::types;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_bedrockruntime::Client as BedrockClient;
use aws_sdk_bedrockruntime::types as bedrock;
use costpilot_application::{InferenceClient, InferenceError, InferenceRequest, InferenceResponse};
use tracing::debug;

pub struct BedrockInferenceClient {
    client: BedrockClient,
    model_id: String,
}

impl BedrockInferenceClient {
    /// Client for `model_id` using the identity and region in `config`.
    pub fn new(config: &SdkConfig, model_id: impl Into<String>) -> Self {
        Self::from_client(BedrockClient::new(config), model_id)
    }

    pub fn from_client(client: BedrockClient, model_id: impl Into<String>) -> Self {
        Self {
            client,
            model_id: model_id.into(),
        }
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }
}

#[async_trait]
impl InferenceClient for BedrockInferenceClient {
    async fn complete(
        &self,
        request: InferenceRequest<'_>,
    ) -> Result<InferenceResponse, InferenceError> {
        let messages = types::convert_transcript(request.transcript.turns())?;
        let tool_config = types::convert_tool_config(request.tool_schemas)?;
        let max_tokens = i32::try_from(request.max_tokens).unwrap_or(i32::MAX);

        debug!(
            model = %self.model_id,
            messages = messages.len(),
            tools = request.tool_schemas.len(),
            "Calling Bedrock Converse API"
        );

        let response = self
            .client
            .converse()
            .model_id(&self.model_id)
            .set_messages(Some(messages))
            .set_tool_config(tool_config)
            .inference_config(
                bedrock::InferenceConfiguration::builder()
                    .max_tokens(max_tokens)
                    .build(),
            )
            .send()
            .await
            .map_err(|e| types::convert_converse_error(&e))?;

        if let Some(usage) = response.usage() {
            debug!(
                input_tokens = usage.input_tokens(),
                output_tokens = usage.output_tokens(),
                "Bedrock usage"
            );
        }

        let output = response.output().ok_or_else(|| {
            InferenceError::InvalidResponse("No output in Bedrock response".to_string())
        })?;

        types::convert_converse_output(output, response.stop_reason())
    }
}
