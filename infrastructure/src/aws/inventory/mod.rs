//! AWS inventory backend
//!
//! [`AwsInventoryBackend`] implements [`InventoryBackend`] by dispatching each
//! [`InspectionTool`] to a read-only AWS call made with the scoped
//! credentials of the current attempt. Responses are normalized into a
//! common envelope:
//!
//! ```json
//! {"account_id": "...", "region": "...", "data_type": "...", "timestamp": "...", "data": ...}
//! ```
//!
//! Global services (S3, Cost Explorer) report the region as `"global"`.

mod compute;
mod containers;
mod database;
mod functions;
mod logs;
mod metrics;
mod spend;
mod storage;

use super::session::scoped_config;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use costpilot_application::{InventoryBackend, PaginationMerger, ScopedCredentials};
use costpilot_domain::{Arguments, InspectionTool, RemoteFault};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;

/// Region label used by account-wide services.
pub const GLOBAL_REGION: &str = "global";

/// Region where global control planes (S3 listing, Cost Explorer) are called.
pub const CONTROL_PLANE_REGION: &str = "us-east-1";

/// Account id reported when the credential exchange did not name one.
const UNKNOWN_ACCOUNT: &str = "unknown";

/// A tool call with its arguments parsed into the query it will send.
#[derive(Debug)]
enum Request {
    Ec2Instances,
    Ec2Tags,
    Metric(metrics::MetricQuery),
    MetricList(String),
    BucketSize(String),
    RdsInstances,
    RdsClusters,
    LambdaFunctions,
    LambdaConfig(String),
    EcsClusters,
    EcsTasks(String),
    LogGroups,
    LogStreams(logs::StreamQuery),
    LogEvents(logs::EventQuery),
    S3Buckets,
    Usage(spend::UsageQuery),
    Forecast(spend::ForecastQuery),
    CostTags(spend::TagQuery),
}

impl Request {
    /// Parse `arguments` for `tool`. The error is a message for the model.
    fn parse(tool: InspectionTool, arguments: &Arguments, today: NaiveDate) -> Result<Self, String> {
        let request = match tool {
            InspectionTool::Ec2Instances => Request::Ec2Instances,
            InspectionTool::Ec2Tags => Request::Ec2Tags,
            InspectionTool::Ec2CpuUtilization => {
                let args: metrics::CpuArgs = parse_args(tool, arguments)?;
                Request::Metric(args.into_query())
            }
            InspectionTool::MetricStatistics => {
                let args: metrics::MetricArgs = parse_args(tool, arguments)?;
                Request::Metric(args.into_query()?)
            }
            InspectionTool::CloudWatchMetrics => {
                let args: metrics::NamespaceArgs = parse_args(tool, arguments)?;
                Request::MetricList(args.into_namespace()?)
            }
            InspectionTool::S3BucketSize => {
                let args: metrics::BucketArgs = parse_args(tool, arguments)?;
                Request::BucketSize(args.into_bucket()?)
            }
            InspectionTool::RdsInstances => Request::RdsInstances,
            InspectionTool::RdsClusters => Request::RdsClusters,
            InspectionTool::LambdaFunctions => Request::LambdaFunctions,
            InspectionTool::LambdaFunctionConfig => {
                let args: functions::ConfigArgs = parse_args(tool, arguments)?;
                Request::LambdaConfig(args.into_function()?)
            }
            InspectionTool::EcsClusters => Request::EcsClusters,
            InspectionTool::EcsTasks => {
                let args: containers::TaskArgs = parse_args(tool, arguments)?;
                Request::EcsTasks(args.into_cluster()?)
            }
            InspectionTool::LogGroups => Request::LogGroups,
            InspectionTool::LogStreams => {
                let args: logs::StreamArgs = parse_args(tool, arguments)?;
                Request::LogStreams(args.into_query()?)
            }
            InspectionTool::LogEvents => {
                let args: logs::EventArgs = parse_args(tool, arguments)?;
                Request::LogEvents(args.into_query()?)
            }
            InspectionTool::S3Buckets => Request::S3Buckets,
            InspectionTool::CostAndUsage => {
                let args: spend::UsageArgs = parse_args(tool, arguments)?;
                Request::Usage(args.into_query(today)?)
            }
            InspectionTool::CostByService => {
                let args: spend::ServiceArgs = parse_args(tool, arguments)?;
                Request::Usage(args.into_query(today)?)
            }
            InspectionTool::CostForecast => {
                let args: spend::ForecastArgs = parse_args(tool, arguments)?;
                Request::Forecast(args.into_query(today)?)
            }
            InspectionTool::CostTags => {
                let args: spend::TagArgs = parse_args(tool, arguments)?;
                Request::CostTags(args.into_query(today)?)
            }
        };
        Ok(request)
    }

    /// Account-wide requests are answered from the control plane.
    fn is_global(&self) -> bool {
        matches!(
            self,
            Request::S3Buckets | Request::Usage(_) | Request::Forecast(_) | Request::CostTags(_)
        )
    }
}

pub struct AwsInventoryBackend {
    default_region: String,
    merger: PaginationMerger,
}

impl AwsInventoryBackend {
    /// `default_region` is used when a regional call arrives without a region.
    pub fn new(default_region: impl Into<String>) -> Self {
        Self {
            default_region: default_region.into(),
            merger: PaginationMerger::default(),
        }
    }

    pub fn with_merger(mut self, merger: PaginationMerger) -> Self {
        self.merger = merger;
        self
    }

    fn region_of(&self, arguments: &Arguments) -> String {
        arguments
            .get("region")
            .and_then(Value::as_str)
            .filter(|r| !r.trim().is_empty())
            .unwrap_or(&self.default_region)
            .to_string()
    }

    async fn dispatch(
        &self,
        request: Request,
        region: &str,
        credentials: &ScopedCredentials,
    ) -> Result<Value, RemoteFault> {
        let config = scoped_config(credentials, region);
        let merger = &self.merger;
        match request {
            Request::Ec2Instances => compute::list_instances(&config, merger).await,
            Request::Ec2Tags => compute::list_tags(&config, merger).await,
            Request::Metric(query) => metrics::metric_statistics(&config, query).await,
            Request::MetricList(namespace) => {
                metrics::list_metrics(&config, merger, &namespace).await
            }
            Request::BucketSize(bucket) => metrics::bucket_size(&config, &bucket).await,
            Request::RdsInstances => database::list_db_instances(&config, merger).await,
            Request::RdsClusters => database::list_db_clusters(&config, merger).await,
            Request::LambdaFunctions => functions::list_functions(&config, merger).await,
            Request::LambdaConfig(name) => functions::function_config(&config, &name).await,
            Request::EcsClusters => containers::list_clusters(&config, merger).await,
            Request::EcsTasks(cluster) => containers::list_tasks(&config, merger, &cluster).await,
            Request::LogGroups => logs::list_log_groups(&config, merger).await,
            Request::LogStreams(query) => logs::recent_streams(&config, query).await,
            Request::LogEvents(query) => logs::filter_events(&config, query).await,
            Request::S3Buckets => storage::list_buckets(credentials).await,
            Request::Usage(query) => spend::cost_and_usage(&config, merger, query).await,
            Request::Forecast(query) => spend::cost_forecast(&config, query).await,
            Request::CostTags(query) => spend::cost_tags(&config, merger, query).await,
        }
    }
}

#[async_trait]
impl InventoryBackend for AwsInventoryBackend {
    fn check(&self, tool: InspectionTool, arguments: &Arguments) -> Result<(), String> {
        Request::parse(tool, arguments, Utc::now().date_naive()).map(|_| ())
    }

    async fn invoke(
        &self,
        tool: InspectionTool,
        arguments: &Arguments,
        credentials: &ScopedCredentials,
    ) -> Result<Value, RemoteFault> {
        let request =
            Request::parse(tool, arguments, Utc::now().date_naive()).map_err(invalid_parameter)?;
        let (call_region, region) = if request.is_global() {
            (CONTROL_PLANE_REGION.to_string(), GLOBAL_REGION.to_string())
        } else {
            let region = self.region_of(arguments);
            (region.clone(), region)
        };

        let data = self.dispatch(request, &call_region, credentials).await?;
        debug!(tool = %tool, region = %region, "Inspection complete");

        let account_id = credentials
            .account_id
            .as_deref()
            .unwrap_or(UNKNOWN_ACCOUNT);
        Ok(envelope(account_id, &region, tool.data_type(), Utc::now(), data))
    }
}

/// Wrap normalized data in the response envelope.
pub fn envelope(
    account_id: &str,
    region: &str,
    data_type: &str,
    timestamp: DateTime<Utc>,
    data: Value,
) -> Value {
    json!({
        "account_id": account_id,
        "region": region,
        "data_type": data_type,
        "timestamp": timestamp.to_rfc3339(),
        "data": data,
    })
}

/// Deserialize normalized arguments into a tool's typed argument struct.
///
/// Fields the struct does not name (`role_arn`, `region`) are ignored.
fn parse_args<T: DeserializeOwned>(tool: InspectionTool, arguments: &Arguments) -> Result<T, String> {
    serde_json::from_value(Value::Object(arguments.clone())).map_err(|e| format!("{}: {}", tool, e))
}

/// Trimmed `value`, or an error naming `field` when nothing is left.
fn non_blank(field: &str, value: String) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(format!("{} must not be empty", field));
    }
    Ok(trimmed.to_string())
}

/// Argument rejection that reached the remote call, reported the way AWS
/// reports bad input.
fn invalid_parameter(message: impl Into<String>) -> RemoteFault {
    RemoteFault::permanent("InvalidParameterValue", message)
}

/// ISO-8601 rendering of an SDK timestamp.
fn iso(timestamp: &aws_smithy_types::DateTime) -> Option<String> {
    DateTime::<Utc>::from_timestamp(timestamp.secs(), timestamp.subsec_nanos())
        .map(|dt| dt.to_rfc3339())
}

/// SDK timestamp from a chrono one.
fn smithy_time(timestamp: DateTime<Utc>) -> aws_smithy_types::DateTime {
    aws_smithy_types::DateTime::from_secs(timestamp.timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde::Deserialize;

    #[test]
    fn envelope_carries_every_field() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let value = envelope("123456789012", "eu-west-1", "ec2_instances", at, json!([]));

        assert_eq!(value["account_id"], "123456789012");
        assert_eq!(value["region"], "eu-west-1");
        assert_eq!(value["data_type"], "ec2_instances");
        assert_eq!(value["timestamp"], "2024-05-01T12:00:00+00:00");
        assert_eq!(value["data"], json!([]));
    }

    #[test]
    fn region_falls_back_to_backend_default() {
        let backend = AwsInventoryBackend::new("ap-southeast-2");
        let mut args = Arguments::new();
        assert_eq!(backend.region_of(&args), "ap-southeast-2");

        args.insert("region".into(), json!(""));
        assert_eq!(backend.region_of(&args), "ap-southeast-2");

        args.insert("region".into(), json!("us-west-2"));
        assert_eq!(backend.region_of(&args), "us-west-2");
    }

    #[derive(Debug, Deserialize)]
    struct InstanceTarget {
        instance_id: String,
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn args(value: Value) -> Arguments {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn parse_args_ignores_injected_fields() {
        let mut args = Arguments::new();
        args.insert("instance_id".into(), json!("i-1"));
        args.insert("role_arn".into(), json!("arn:aws:iam::1:role/R"));

        let target: InstanceTarget = parse_args(InspectionTool::Ec2CpuUtilization, &args).unwrap();
        assert_eq!(target.instance_id, "i-1");
    }

    #[test]
    fn parse_args_rejects_wrong_types() {
        let mut args = Arguments::new();
        args.insert("instance_id".into(), json!(42));

        let message =
            parse_args::<InstanceTarget>(InspectionTool::Ec2CpuUtilization, &args).unwrap_err();
        assert!(message.starts_with("get_ec2_cpu_utilization"));
    }

    #[test]
    fn check_rejects_bad_dates_before_any_call() {
        let backend = AwsInventoryBackend::new("eu-west-1");
        let message = backend
            .check(InspectionTool::CostAndUsage, &args(json!({"start_date": "01/02/2024"})))
            .unwrap_err();
        assert_eq!(message, "start_date must be YYYY-MM-DD, got '01/02/2024'");

        assert!(backend.check(InspectionTool::CostAndUsage, &Arguments::new()).is_ok());
        assert!(backend.check(InspectionTool::Ec2Instances, &Arguments::new()).is_ok());
    }

    #[test]
    fn targeted_tools_need_a_target() {
        let missing = Request::parse(InspectionTool::EcsTasks, &Arguments::new(), today());
        assert!(missing.unwrap_err().contains("cluster_name"));

        let blank = Request::parse(
            InspectionTool::LambdaFunctionConfig,
            &args(json!({"function_name": "  "})),
            today(),
        );
        assert_eq!(blank.unwrap_err(), "function_name must not be empty");
    }

    #[test]
    fn account_wide_requests_are_global() {
        let global = [
            InspectionTool::S3Buckets,
            InspectionTool::CostByService,
            InspectionTool::CostForecast,
        ];
        for tool in global {
            let request = Request::parse(tool, &Arguments::new(), today()).unwrap();
            assert!(request.is_global(), "{tool}");
        }

        let tags = Request::parse(InspectionTool::CostTags, &args(json!({"tag_key": "Team"})), today());
        assert!(tags.unwrap().is_global());

        let bucket = Request::parse(
            InspectionTool::S3BucketSize,
            &args(json!({"bucket_name": "logs-archive"})),
            today(),
        );
        assert!(!bucket.unwrap().is_global());
        assert!(!Request::parse(InspectionTool::Ec2Tags, &Arguments::new(), today())
            .unwrap()
            .is_global());
    }

    #[test]
    fn sdk_timestamps_render_as_rfc3339() {
        let ts = aws_smithy_types::DateTime::from_secs(1_700_000_000);
        assert_eq!(iso(&ts).as_deref(), Some("2023-11-14T22:13:20+00:00"));

        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(smithy_time(at).secs(), at.timestamp());
    }
}
