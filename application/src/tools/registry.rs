//! Tool Registry
//!
//! The [`ToolRegistry`] is the only way the model reaches the account. It
//! implements [`ToolExecutorPort`] with a fixed pipeline per call:
//!
//! 1. Resolve the name (canonical or alias) to an [`InspectionTool`]
//! 2. Normalize arguments (defaults, `region`, `role_arn`)
//! 3. Validate against the definition
//! 4. Let the backend check the values it will send
//! 5. Look up the run's [`ResultCache`](super::cache::ResultCache)
//! 6. On a miss: exchange credentials and call the backend, under the
//!    per-attempt timeout and the [`RetryingInvoker`]
//!
//! ```ignore
//! let registry = ToolRegistry::new(backend, broker, &params);
//! let scope = ToolScope::new(profile);
//! let execution = registry.execute(&scope, "describe_instances", &Arguments::new()).await;
//! assert_eq!(execution.tool_name, "get_ec2_instances");
//! ```

use super::retry::{InvokeError, RetryingInvoker};
use crate::config::AnalysisParams;
use crate::ports::credential_broker::CredentialBroker;
use crate::ports::inventory::InventoryBackend;
use crate::ports::tool_executor::{ToolExecution, ToolExecutorPort, ToolScope};
use async_trait::async_trait;
use costpilot_domain::tool::normalize;
use costpilot_domain::{
    Arguments, CacheKey, ClientProfile, DefaultToolValidator, InspectionTool, RemoteFault,
    ToolResult, ToolSpec, ToolValidator,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct ToolRegistry {
    spec: ToolSpec,
    backend: Arc<dyn InventoryBackend>,
    broker: Arc<dyn CredentialBroker>,
    validator: DefaultToolValidator,
    invoker: RetryingInvoker,
    tool_timeout: Duration,
    session_duration: Duration,
}

impl ToolRegistry {
    /// Registry over the full inspection catalog.
    pub fn new(
        backend: Arc<dyn InventoryBackend>,
        broker: Arc<dyn CredentialBroker>,
        params: &AnalysisParams,
    ) -> Self {
        Self {
            spec: InspectionTool::spec(),
            backend,
            broker,
            validator: DefaultToolValidator,
            invoker: RetryingInvoker::new(params.retry),
            tool_timeout: params.tool_timeout,
            session_duration: params.session_duration,
        }
    }

    async fn call_remote(
        &self,
        tool: InspectionTool,
        profile: &ClientProfile,
        arguments: &Arguments,
    ) -> ToolResult {
        let identity_ref = profile.identity_ref.as_str();

        let outcome = self
            .invoker
            .invoke(|attempt| async move {
                debug!("Calling {} (attempt {})", tool, attempt);
                match tokio::time::timeout(
                    self.tool_timeout,
                    self.attempt(tool, identity_ref, arguments),
                )
                .await
                {
                    Ok(result) => result,
                    Err(_) => Err(RemoteFault::timeout(tool.name())),
                }
            })
            .await;

        match outcome {
            Ok(data) => ToolResult::success(data),
            Err(InvokeError::Immediate { fault }) => {
                warn!("{} failed: {}", tool, fault);
                ToolResult::remote(&fault)
            }
            Err(InvokeError::Exhausted { fault, attempts }) => {
                warn!("{} gave up after {} attempts: {}", tool, attempts, fault);
                ToolResult::failure(
                    fault.code,
                    format!("Gave up after {} attempts: {}", attempts, fault.message),
                    false,
                )
            }
        }
    }

    /// One attempt: fresh credentials, then the inspection itself.
    async fn attempt(
        &self,
        tool: InspectionTool,
        identity_ref: &str,
        arguments: &Arguments,
    ) -> Result<Value, RemoteFault> {
        let credentials = self
            .broker
            .assume(identity_ref, self.session_duration)
            .await
            .map_err(RemoteFault::from)?;
        self.backend.invoke(tool, arguments, &credentials).await
    }
}

#[async_trait]
impl ToolExecutorPort for ToolRegistry {
    fn tool_spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(&self, scope: &ToolScope, name: &str, arguments: &Arguments) -> ToolExecution {
        let Some(canonical) = self.spec.resolve(name) else {
            warn!("Unknown tool requested: {}", name);
            return ToolExecution::new(name, ToolResult::unknown_tool(name));
        };
        let (Some(tool), Some(definition)) =
            (InspectionTool::from_name(canonical), self.spec.get(canonical))
        else {
            warn!("Tool {} has no inspection handler", canonical);
            return ToolExecution::new(name, ToolResult::unknown_tool(name));
        };
        if canonical != name {
            info!("Resolved tool alias {} -> {}", name, canonical);
        }

        let normalized = normalize(
            definition,
            arguments,
            &scope.profile.identity_ref,
            &scope.profile.region,
        );

        if let Err(message) = self
            .validator
            .validate(&normalized, definition)
            .and_then(|()| self.backend.check(tool, &normalized))
        {
            debug!("Rejected {} arguments: {}", canonical, message);
            return ToolExecution::new(canonical, ToolResult::invalid_argument(message));
        }

        let key = CacheKey::new(canonical, &normalized);
        let lookup = scope
            .cache
            .get_or_compute(key, || self.call_remote(tool, &scope.profile, &normalized))
            .await;

        ToolExecution::from_lookup(canonical, lookup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryPolicy;
    use crate::ports::credential_broker::{AuthFault, ScopedCredentials};
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const ROLE: &str = "arn:aws:iam::123456789012:role/CostReadOnly";

    /// Counts exchanges; optionally fails them.
    struct MockBroker {
        calls: AtomicUsize,
        fail_with: Option<RemoteFault>,
    }

    impl MockBroker {
        fn ok() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_with: None,
            }
        }

        fn failing(fault: RemoteFault) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_with: Some(fault),
            }
        }
    }

    #[async_trait]
    impl CredentialBroker for MockBroker {
        async fn assume(
            &self,
            identity_ref: &str,
            _session_duration: Duration,
        ) -> Result<ScopedCredentials, AuthFault> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.fail_with {
                Some(fault) => Err(AuthFault::new(identity_ref, fault.clone())),
                None => Ok(ScopedCredentials::new("AKIA", "secret", "token")),
            }
        }
    }

    /// Records every call; replies from a script, then with an echo envelope.
    /// Rejects `start_date` values that are not `YYYY-MM-DD`.
    struct MockBackend {
        calls: Mutex<Vec<(InspectionTool, Arguments)>>,
        checks: AtomicUsize,
        script: Mutex<VecDeque<Result<Value, RemoteFault>>>,
        delay: Option<Duration>,
    }

    impl MockBackend {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                checks: AtomicUsize::new(0),
                script: Mutex::new(VecDeque::new()),
                delay: None,
            }
        }

        fn scripted(replies: Vec<Result<Value, RemoteFault>>) -> Self {
            let backend = Self::new();
            *backend.script.lock().unwrap() = replies.into();
            backend
        }

        fn slow(delay: Duration) -> Self {
            Self {
                delay: Some(delay),
                ..Self::new()
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl InventoryBackend for MockBackend {
        fn check(&self, _tool: InspectionTool, arguments: &Arguments) -> Result<(), String> {
            self.checks.fetch_add(1, Ordering::SeqCst);
            match arguments.get("start_date").and_then(Value::as_str) {
                Some(date) if chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() => {
                    Err(format!("start_date must be YYYY-MM-DD, got '{}'", date))
                }
                _ => Ok(()),
            }
        }

        async fn invoke(
            &self,
            tool: InspectionTool,
            arguments: &Arguments,
            _credentials: &ScopedCredentials,
        ) -> Result<Value, RemoteFault> {
            self.calls.lock().unwrap().push((tool, arguments.clone()));
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if let Some(reply) = self.script.lock().unwrap().pop_front() {
                return reply;
            }
            Ok(json!({"data_type": tool.data_type(), "data": []}))
        }
    }

    fn params() -> AnalysisParams {
        AnalysisParams::default()
            .with_tool_timeout(Duration::from_secs(5))
            .with_retry(RetryPolicy::new(
                3,
                Duration::from_millis(10),
                Duration::from_secs(1),
            ))
    }

    fn registry(backend: Arc<MockBackend>, broker: Arc<MockBroker>) -> ToolRegistry {
        ToolRegistry::new(backend, broker, &params())
    }

    fn scope() -> ToolScope {
        ToolScope::new(ClientProfile::new(ROLE, "eu-west-1"))
    }

    fn args(value: Value) -> Arguments {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn unknown_tool_never_reaches_backend() {
        let backend = Arc::new(MockBackend::new());
        let registry = registry(backend.clone(), Arc::new(MockBroker::ok()));

        let execution = registry.execute(&scope(), "terminate_instances", &Arguments::new()).await;

        assert_eq!(execution.result.error_code(), Some("UnknownTool"));
        assert!(matches!(execution.result, ToolResult::Failure { recoverable: false, .. }));
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn alias_resolves_to_canonical_tool() {
        let backend = Arc::new(MockBackend::new());
        let registry = registry(backend.clone(), Arc::new(MockBroker::ok()));

        let execution = registry.execute(&scope(), "describe_instances", &Arguments::new()).await;

        assert_eq!(execution.tool_name, "get_ec2_instances");
        assert!(execution.result.is_success());
        assert_eq!(backend.calls.lock().unwrap()[0].0, InspectionTool::Ec2Instances);
    }

    #[tokio::test]
    async fn arguments_are_normalized_before_the_backend() {
        let backend = Arc::new(MockBackend::new());
        let registry = registry(backend.clone(), Arc::new(MockBroker::ok()));

        registry
            .execute(&scope(), "get_ec2_cpu_utilization", &args(json!({"instance_id": "i-1"})))
            .await;

        let calls = backend.calls.lock().unwrap();
        let sent = &calls[0].1;
        assert_eq!(sent["role_arn"], ROLE);
        assert_eq!(sent["region"], "eu-west-1");
        assert_eq!(sent["start_hours_ago"], 168);
    }

    #[tokio::test]
    async fn invalid_arguments_are_recoverable() {
        let backend = Arc::new(MockBackend::new());
        let registry = registry(backend.clone(), Arc::new(MockBroker::ok()));

        let execution = registry
            .execute(&scope(), "get_ec2_cpu_utilization", &Arguments::new())
            .await;

        assert_eq!(execution.result.error_code(), Some("InvalidArgument"));
        assert!(matches!(execution.result, ToolResult::Failure { recoverable: true, .. }));
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn malformed_dates_are_rejected_before_credentials() {
        let backend = Arc::new(MockBackend::new());
        let broker = Arc::new(MockBroker::ok());
        let registry = registry(backend.clone(), broker.clone());
        let scope = scope();

        let execution = registry
            .execute(&scope, "get_cost_and_usage", &args(json!({"start_date": "01/02/2024"})))
            .await;

        match &execution.result {
            ToolResult::Failure {
                error_code,
                message,
                recoverable,
            } => {
                assert_eq!(error_code, "InvalidArgument");
                assert!(message.contains("01/02/2024"));
                assert!(*recoverable);
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(backend.checks.load(Ordering::SeqCst), 1);
        assert_eq!(broker.calls.load(Ordering::SeqCst), 0);
        assert_eq!(backend.call_count(), 0);
        assert!(scope.cache.is_empty());

        let corrected = registry
            .execute(&scope, "get_cost_and_usage", &args(json!({"start_date": "2024-01-02"})))
            .await;
        assert!(corrected.result.is_success());
        assert_eq!(broker.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn schema_failures_skip_the_backend_check() {
        let backend = Arc::new(MockBackend::new());
        let registry = registry(backend.clone(), Arc::new(MockBroker::ok()));

        registry
            .execute(&scope(), "get_ec2_cpu_utilization", &Arguments::new())
            .await;

        assert_eq!(backend.checks.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn identical_calls_hit_the_cache() {
        let backend = Arc::new(MockBackend::new());
        let broker = Arc::new(MockBroker::ok());
        let registry = registry(backend.clone(), broker.clone());
        let scope = scope();

        let first = registry.execute(&scope, "get_s3_buckets", &Arguments::new()).await;
        let second = registry.execute(&scope, "list_buckets", &Arguments::new()).await;

        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(first.result, second.result);
        assert_eq!(backend.call_count(), 1);
        assert_eq!(broker.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cache_is_scoped_to_the_run() {
        let backend = Arc::new(MockBackend::new());
        let registry = registry(backend.clone(), Arc::new(MockBroker::ok()));

        registry.execute(&scope(), "get_s3_buckets", &Arguments::new()).await;
        registry.execute(&scope(), "get_s3_buckets", &Arguments::new()).await;

        assert_eq!(backend.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn throttling_is_retried_with_fresh_credentials() {
        let backend = Arc::new(MockBackend::scripted(vec![
            Err(RemoteFault::from_code("ThrottlingException", "Rate exceeded")),
            Ok(json!({"data_type": "rds_instances", "data": []})),
        ]));
        let broker = Arc::new(MockBroker::ok());
        let registry = registry(backend.clone(), broker.clone());

        let execution = registry.execute(&scope(), "get_rds_instances", &Arguments::new()).await;

        assert!(execution.result.is_success());
        assert_eq!(backend.call_count(), 2);
        assert_eq!(broker.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_are_reported() {
        let throttled = || Err(RemoteFault::from_code("RequestLimitExceeded", "slow down"));
        let backend = Arc::new(MockBackend::scripted(vec![throttled(), throttled(), throttled()]));
        let registry = registry(backend.clone(), Arc::new(MockBroker::ok()));
        let scope = scope();

        let execution = registry.execute(&scope, "get_ec2_instances", &Arguments::new()).await;

        assert_eq!(backend.call_count(), 3);
        match &execution.result {
            ToolResult::Failure {
                error_code,
                message,
                recoverable,
            } => {
                assert_eq!(error_code, "RequestLimitExceeded");
                assert!(message.starts_with("Gave up after 3 attempts"));
                assert!(!recoverable);
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert!(scope.cache.is_empty());
    }

    #[tokio::test]
    async fn denied_role_fails_without_retry() {
        let backend = Arc::new(MockBackend::new());
        let broker = Arc::new(MockBroker::failing(RemoteFault::from_code(
            "AccessDenied",
            "not authorized to perform sts:AssumeRole",
        )));
        let registry = registry(backend.clone(), broker.clone());

        let execution = registry.execute(&scope(), "get_lambda_functions", &Arguments::new()).await;

        assert_eq!(execution.result.error_code(), Some("AccessDenied"));
        assert_eq!(broker.calls.load(Ordering::SeqCst), 1);
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_is_a_permanent_failure() {
        let backend = Arc::new(MockBackend::slow(Duration::from_secs(60)));
        let registry = registry(backend.clone(), Arc::new(MockBroker::ok()));

        let execution = registry.execute(&scope(), "get_log_groups", &Arguments::new()).await;

        assert_eq!(execution.result.error_code(), Some("Timeout"));
        assert_eq!(backend.call_count(), 1);
    }
}
