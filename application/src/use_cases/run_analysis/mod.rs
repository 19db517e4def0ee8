//! Run Analysis use case
//!
//! The orchestration loop. Each iteration sends the whole transcript and the
//! tool catalog to the inference service, then decides what to do with the
//! answer:
//!
//! | Answer                          | Next                                  |
//! |---------------------------------|---------------------------------------|
//! | tool calls (any finish reason)  | execute, append results, ask again    |
//! | stop, no tool calls             | done, `success`                       |
//! | anything else                   | stalled, `error`                      |
//!
//! The run also ends on budget exhaustion (`partial`), cancellation
//! (`cancelled`) or an inference fault (`error`). Tool failures never end a
//! run; they are appended as results for the model to react to.

mod types;

pub use types::RunAnalysisInput;

use types::{RequestFailure, RunState};

use crate::config::AnalysisParams;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::inference_client::{
    InferenceClient, InferenceError, InferenceRequest, InferenceResponse,
};
use crate::ports::progress::{AnalysisProgressNotifier, NoAnalysisProgress};
use crate::ports::tool_executor::{ToolExecution, ToolExecutorPort, ToolScope};
use crate::ports::tool_schema::ToolSchemaPort;
use crate::tools::retry::{InvokeError, RetryingInvoker};
use costpilot_domain::util::preview;
use costpilot_domain::{
    AnalysisOutcome, AnalysisPromptTemplate, AnalysisStatus, ClientProfile, Decision,
    ToolCallRequest, Transcript,
};
use futures::future::join_all;
use serde_json::{Value, json};
use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Message attached to a run that used its whole iteration budget.
pub const MAX_ITERATIONS_MESSAGE: &str = "Analysis incomplete - max iterations reached";

/// Message attached to a cancelled run.
pub const CANCELLED_MESSAGE: &str = "Analysis cancelled";

/// Use case for running one cost analysis against one account
pub struct RunAnalysisUseCase<I: InferenceClient + 'static, T: ToolExecutorPort + 'static> {
    inference: Arc<I>,
    tools: Arc<T>,
    tool_schemas: Arc<Vec<Value>>,
    conversation_logger: Arc<dyn ConversationLogger>,
    cancellation_token: Option<CancellationToken>,
    params: AnalysisParams,
}

impl<I, T> Clone for RunAnalysisUseCase<I, T>
where
    I: InferenceClient + 'static,
    T: ToolExecutorPort + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inference: self.inference.clone(),
            tools: self.tools.clone(),
            tool_schemas: self.tool_schemas.clone(),
            conversation_logger: self.conversation_logger.clone(),
            cancellation_token: self.cancellation_token.clone(),
            params: self.params.clone(),
        }
    }
}

impl<I: InferenceClient + 'static, T: ToolExecutorPort + 'static> RunAnalysisUseCase<I, T> {
    /// Build the use case. The tool catalog is converted to schemas once
    /// and reused by every request of every run.
    pub fn new(inference: Arc<I>, tools: Arc<T>, schema: &dyn ToolSchemaPort) -> Self {
        let tool_schemas = schema.all_tools_schema(tools.tool_spec());
        debug!("Advertising {} tools to the inference service", tool_schemas.len());
        Self {
            inference,
            tools,
            tool_schemas: Arc::new(tool_schemas),
            conversation_logger: Arc::new(NoConversationLogger),
            cancellation_token: None,
            params: AnalysisParams::default(),
        }
    }

    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    /// Set a cancellation token for graceful interruption
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    /// Parameters for every run whose input does not carry its own.
    pub fn with_params(mut self, params: AnalysisParams) -> Self {
        self.params = params;
        self
    }

    pub fn tool_schemas(&self) -> &[Value] {
        &self.tool_schemas
    }

    /// Analyze one account with the configured parameters and no progress
    /// reporting.
    pub async fn analyze(
        &self,
        profile: ClientProfile,
        prompt: &str,
        max_iterations: usize,
    ) -> AnalysisOutcome {
        let input = RunAnalysisInput::new(profile, prompt).with_max_iterations(max_iterations);
        self.execute(input, &NoAnalysisProgress).await
    }

    /// Run the orchestration loop to a terminal outcome.
    ///
    /// Never fails: every way a run can end is an [`AnalysisStatus`].
    pub async fn execute(
        &self,
        input: RunAnalysisInput,
        progress: &dyn AnalysisProgressNotifier,
    ) -> AnalysisOutcome {
        let params = input.effective_params(&self.params);
        let RunAnalysisInput { profile, prompt, .. } = input;

        info!(
            "Starting analysis for {} in {} (max {} iterations)",
            profile.identity_ref, profile.region, params.max_iterations
        );
        self.log_event(
            "analysis_start",
            json!({
                "identity_ref": profile.identity_ref,
                "region": profile.region,
                "prompt": prompt,
                "max_iterations": params.max_iterations,
            }),
        );

        let state = RunState::new(Transcript::seeded(AnalysisPromptTemplate::seed(&prompt)));
        let outcome = match profile.validate() {
            Ok(()) => {
                let scope = ToolScope::new(profile);
                let outcome = self.run_loop(&scope, &params, state, progress).await;
                debug!(
                    "Tool cache: {} results, {} hits, {} misses",
                    scope.cache.len(),
                    scope.cache.hits(),
                    scope.cache.misses()
                );
                outcome
            }
            Err(e) => {
                error!("Refusing to analyze: {}", e);
                state.finish(AnalysisStatus::Error, None, Some(e.to_string()))
            }
        };

        info!(
            "Analysis finished: {} after {} iterations and {} tool calls",
            outcome.status, outcome.iteration_count, outcome.tool_call_count
        );
        self.log_event(
            "analysis_complete",
            json!({
                "status": outcome.status,
                "message": outcome.message,
                "iterations": outcome.iteration_count,
                "tool_calls": outcome.tool_call_count,
            }),
        );
        progress.on_complete(&outcome);
        outcome
    }

    async fn run_loop(
        &self,
        scope: &ToolScope,
        params: &AnalysisParams,
        mut state: RunState,
        progress: &dyn AnalysisProgressNotifier,
    ) -> AnalysisOutcome {
        loop {
            if self.is_cancelled() {
                info!("Analysis cancelled after {} iterations", state.iteration);
                return state.finish(
                    AnalysisStatus::Cancelled,
                    None,
                    Some(CANCELLED_MESSAGE.to_string()),
                );
            }

            if state.iteration >= params.max_iterations {
                warn!("Max iterations ({}) reached", params.max_iterations);
                return state.finish(
                    AnalysisStatus::Partial,
                    None,
                    Some(MAX_ITERATIONS_MESSAGE.to_string()),
                );
            }

            state.iteration += 1;
            debug!(
                "Iteration {}/{}: requesting",
                state.iteration, params.max_iterations
            );
            progress.on_iteration_start(state.iteration, params.max_iterations);

            let response = match self.request(&state.transcript, params, progress).await {
                Ok(response) => response,
                Err(RequestFailure::Cancelled) => {
                    info!("Analysis cancelled during inference");
                    return state.finish(
                        AnalysisStatus::Cancelled,
                        None,
                        Some(CANCELLED_MESSAGE.to_string()),
                    );
                }
                Err(failure) => {
                    let message = failure.message();
                    error!("{}", message);
                    return state.finish(AnalysisStatus::Error, None, Some(message));
                }
            };

            let InferenceResponse {
                finish_reason,
                content,
                tool_calls,
            } = response;
            let tool_calls = dedupe_call_ids(tool_calls);

            progress.on_inference_complete(&finish_reason, tool_calls.len());
            if !content.trim().is_empty() {
                progress.on_assistant_text(&content);
            }
            self.log_event(
                "assistant_turn",
                json!({
                    "iteration": state.iteration,
                    "finish_reason": finish_reason.to_string(),
                    "text": content,
                    "tool_calls": tool_calls
                        .iter()
                        .map(|c| json!({"id": c.id, "name": c.tool_name}))
                        .collect::<Vec<_>>(),
                }),
            );

            let decision = Decision::decide(&finish_reason, tool_calls.len());
            debug!(
                "Iteration {}: finish reason {}, {} tool calls -> {}",
                state.iteration,
                finish_reason,
                tool_calls.len(),
                decision.next_state()
            );

            if let Err(e) = state
                .transcript
                .push_assistant(content.clone(), tool_calls.clone())
            {
                error!("Transcript rejected assistant turn: {}", e);
                return state.finish(
                    AnalysisStatus::Error,
                    None,
                    Some(format!("Protocol anomaly: {}", e)),
                );
            }

            match decision {
                Decision::Complete => {
                    info!("Analysis completed in {} iterations", state.iteration);
                    let text = Some(content).filter(|t| !t.trim().is_empty());
                    return state.finish(AnalysisStatus::Success, text, None);
                }
                Decision::Stall => {
                    warn!(
                        "Unexpected finish reason '{}' with no tool calls",
                        finish_reason
                    );
                    return state.finish(
                        AnalysisStatus::Error,
                        None,
                        Some(format!("Unexpected finish reason: {}", finish_reason)),
                    );
                }
                Decision::ExecuteTools => {
                    let executions = self
                        .execute_tools(scope, &tool_calls, params.parallel_tool_calls, progress)
                        .await;

                    for (call, execution) in tool_calls.iter().zip(executions) {
                        state.tool_call_count += 1;
                        if let Err(e) = state
                            .transcript
                            .push_tool_result(&call.id, execution.result.to_payload())
                        {
                            error!("Transcript rejected tool result: {}", e);
                            return state.finish(
                                AnalysisStatus::Error,
                                None,
                                Some(format!("Protocol anomaly: {}", e)),
                            );
                        }
                    }
                }
            }
        }
    }

    /// One inference round: retried while throttled, bounded by the
    /// inference timeout, abandoned on cancellation.
    async fn request(
        &self,
        transcript: &Transcript,
        params: &AnalysisParams,
        progress: &dyn AnalysisProgressNotifier,
    ) -> Result<InferenceResponse, RequestFailure> {
        let invoker = RetryingInvoker::new(params.retry);
        let max_attempts = invoker.max_attempts();
        let timeout = params.inference_timeout;
        let request = InferenceRequest {
            transcript,
            tool_schemas: &self.tool_schemas,
            max_tokens: params.max_tokens,
        };

        let call = invoker.invoke_observed(
            |attempt| async move {
                debug!("Inference attempt {}", attempt);
                match tokio::time::timeout(timeout, self.inference.complete(request)).await {
                    Ok(result) => result,
                    Err(_) => Err(InferenceError::Timeout),
                }
            },
            |attempt, error: &InferenceError, _delay| {
                progress.on_retry("inference", attempt, max_attempts, &error.to_string())
            },
        );

        let result = match &self.cancellation_token {
            Some(token) => tokio::select! {
                _ = token.cancelled() => return Err(RequestFailure::Cancelled),
                result = call => result,
            },
            None => call.await,
        };

        result.map_err(|e| match e {
            InvokeError::Immediate { fault } => RequestFailure::Inference(fault),
            InvokeError::Exhausted { fault, attempts } => RequestFailure::Exhausted {
                error: fault,
                attempts,
            },
        })
    }

    /// Run the calls of one assistant turn. Results come back in request
    /// order whether or not they ran concurrently.
    async fn execute_tools(
        &self,
        scope: &ToolScope,
        calls: &[ToolCallRequest],
        parallel: bool,
        progress: &dyn AnalysisProgressNotifier,
    ) -> Vec<ToolExecution> {
        if parallel && calls.len() > 1 {
            debug!("Executing {} tool calls concurrently", calls.len());
            let futures = calls
                .iter()
                .map(|call| self.execute_tool(scope, call, progress));
            return join_all(futures).await;
        }

        let mut executions = Vec::with_capacity(calls.len());
        for call in calls {
            executions.push(self.execute_tool(scope, call, progress).await);
        }
        executions
    }

    async fn execute_tool(
        &self,
        scope: &ToolScope,
        call: &ToolCallRequest,
        progress: &dyn AnalysisProgressNotifier,
    ) -> ToolExecution {
        let args = serde_json::to_string(&call.arguments).unwrap_or_default();
        info!(
            "Executing tool: {} with args: {}",
            call.tool_name,
            preview(&args, 200)
        );
        progress.on_tool_call(&call.tool_name, &args);

        let execution = self
            .tools
            .execute(scope, &call.tool_name, &call.arguments)
            .await;

        if execution.tool_name != call.tool_name {
            progress.on_tool_resolved(&call.tool_name, &execution.tool_name);
        }
        progress.on_tool_result(
            &execution.tool_name,
            execution.result.is_success(),
            execution.cached,
        );
        if !execution.result.is_success() {
            warn!(
                "Tool {} failed: {}",
                execution.tool_name,
                preview(&execution.result.to_payload().to_string(), 300)
            );
        }

        self.log_event(
            "tool_call",
            json!({
                "id": call.id,
                "requested": call.tool_name,
                "tool": execution.tool_name,
                "arguments": call.arguments,
                "cached": execution.cached,
                "result": execution.result.to_payload(),
            }),
        );
        execution
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation_token
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }

    fn log_event(&self, event_type: &'static str, payload: Value) {
        self.conversation_logger
            .log(ConversationEvent::new(event_type, payload));
    }
}

/// Keep the first call for each id; a repeated id could never be answered
/// unambiguously.
fn dedupe_call_ids(calls: Vec<ToolCallRequest>) -> Vec<ToolCallRequest> {
    let mut seen = HashSet::new();
    calls
        .into_iter()
        .filter(|call| {
            let first = seen.insert(call.id.clone());
            if !first {
                warn!(
                    "Dropping duplicate tool call id {} ({})",
                    call.id, call.tool_name
                );
            }
            first
        })
        .collect()
}
