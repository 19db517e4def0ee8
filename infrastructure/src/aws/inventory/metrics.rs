//! CloudWatch metrics: statistics, namespace listings and S3 bucket size.

use super::{iso, non_blank, smithy_time};
use crate::aws::fault::remote_fault;
use aws_config::SdkConfig;
use aws_sdk_cloudwatch::Client as CloudWatchClient;
use aws_sdk_cloudwatch::types::{Datapoint, Dimension, Metric, Statistic};
use chrono::{Duration as ChronoDuration, Utc};
use costpilot_application::{Page, PaginationMerger};
use costpilot_domain::RemoteFault;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::ops::RangeInclusive;
use tracing::debug;

const EC2_NAMESPACE: &str = "AWS/EC2";
const CPU_METRIC: &str = "CPUUtilization";
const S3_NAMESPACE: &str = "AWS/S3";
const HOURLY: i32 = 3600;
const DAILY: i32 = 86_400;
const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;
const MIN_PERIOD: i32 = 60;
/// CloudWatch keeps hourly data for 90 days.
const HOURS_RANGE: RangeInclusive<i64> = 1..=2160;

fn default_statistics() -> Vec<String> {
    vec!["Average".into(), "Maximum".into(), "Minimum".into()]
}

fn default_cpu_hours() -> i64 {
    168
}

fn default_metric_hours() -> i64 {
    24
}

fn default_period() -> i32 {
    HOURLY
}

/// Arguments of `get_ec2_cpu_utilization`.
#[derive(Debug, Deserialize)]
pub(super) struct CpuArgs {
    instance_id: String,
    #[serde(default = "default_cpu_hours")]
    start_hours_ago: i64,
}

impl CpuArgs {
    pub(super) fn into_query(self) -> MetricQuery {
        MetricQuery {
            namespace: EC2_NAMESPACE.to_string(),
            metric_name: CPU_METRIC.to_string(),
            dimensions: vec![DimensionArg {
                name: "InstanceId".to_string(),
                value: self.instance_id,
            }],
            hours: self.start_hours_ago.clamp(*HOURS_RANGE.start(), *HOURS_RANGE.end()),
            period: HOURLY,
            statistics: default_statistics(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(super) struct DimensionArg {
    #[serde(alias = "Name")]
    name: String,
    #[serde(alias = "Value")]
    value: String,
}

/// Arguments of `get_metric_statistics`.
#[derive(Debug, Deserialize)]
pub(super) struct MetricArgs {
    namespace: String,
    metric_name: String,
    dimensions: Vec<DimensionArg>,
    #[serde(default = "default_metric_hours")]
    start_hours_ago: i64,
    #[serde(default = "default_period")]
    period: i32,
    #[serde(default = "default_statistics")]
    statistics: Vec<String>,
}

impl MetricArgs {
    pub(super) fn into_query(self) -> Result<MetricQuery, String> {
        if !HOURS_RANGE.contains(&self.start_hours_ago) {
            return Err(format!(
                "start_hours_ago must be between {} and {}, got {}",
                HOURS_RANGE.start(),
                HOURS_RANGE.end(),
                self.start_hours_ago
            ));
        }
        if self.period < MIN_PERIOD {
            return Err(format!(
                "period must be at least {} seconds, got {}",
                MIN_PERIOD, self.period
            ));
        }
        let statistics = if self.statistics.is_empty() {
            default_statistics()
        } else {
            self.statistics
        };

        Ok(MetricQuery {
            namespace: non_blank("namespace", self.namespace)?,
            metric_name: non_blank("metric_name", self.metric_name)?,
            dimensions: self.dimensions,
            hours: self.start_hours_ago,
            period: self.period,
            statistics,
        })
    }
}

/// Arguments of `get_cloudwatch_metrics`.
#[derive(Debug, Deserialize)]
pub(super) struct NamespaceArgs {
    namespace: String,
}

impl NamespaceArgs {
    pub(super) fn into_namespace(self) -> Result<String, String> {
        non_blank("namespace", self.namespace)
    }
}

/// Arguments of `get_s3_bucket_size`.
#[derive(Debug, Deserialize)]
pub(super) struct BucketArgs {
    bucket_name: String,
}

impl BucketArgs {
    pub(super) fn into_bucket(self) -> Result<String, String> {
        non_blank("bucket_name", self.bucket_name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct MetricQuery {
    namespace: String,
    metric_name: String,
    dimensions: Vec<DimensionArg>,
    hours: i64,
    period: i32,
    statistics: Vec<String>,
}

pub(super) async fn metric_statistics(
    config: &SdkConfig,
    query: MetricQuery,
) -> Result<Value, RemoteFault> {
    let client = CloudWatchClient::new(config);
    let end = Utc::now();
    let start = end - ChronoDuration::hours(query.hours);

    let dimensions = query
        .dimensions
        .iter()
        .map(|d| Dimension::builder().name(&d.name).value(&d.value).build())
        .collect();
    let statistics = query
        .statistics
        .iter()
        .map(|s| Statistic::from(s.as_str()))
        .collect();

    let output = client
        .get_metric_statistics()
        .namespace(&query.namespace)
        .metric_name(&query.metric_name)
        .set_dimensions(Some(dimensions))
        .start_time(smithy_time(start))
        .end_time(smithy_time(end))
        .period(query.period)
        .set_statistics(Some(statistics))
        .send()
        .await
        .map_err(|e| remote_fault("GetMetricStatistics", &e))?;

    let mut points: Vec<&Datapoint> = output.datapoints().iter().collect();
    points.sort_by_key(|p| p.timestamp().map(|t| (t.secs(), t.subsec_nanos())));
    let datapoints: Vec<Value> = points.into_iter().map(datapoint_json).collect();

    let dimensions: Vec<Value> = query
        .dimensions
        .iter()
        .map(|d| json!({"Name": d.name, "Value": d.value}))
        .collect();

    Ok(json!({
        "namespace": query.namespace,
        "metric_name": query.metric_name,
        "dimensions": dimensions,
        "start_time": start.to_rfc3339(),
        "end_time": end.to_rfc3339(),
        "period": query.period,
        "statistics": query.statistics,
        "datapoint_count": datapoints.len(),
        "datapoints": datapoints,
    }))
}

pub(super) async fn list_metrics(
    config: &SdkConfig,
    merger: &PaginationMerger,
    namespace: &str,
) -> Result<Value, RemoteFault> {
    let client = CloudWatchClient::new(config);
    let first = list_page(&client, namespace, None).await?;
    let metrics = merger
        .drain(first, |token| list_page(&client, namespace, Some(token)))
        .await?;
    Ok(Value::Array(metrics))
}

async fn list_page(
    client: &CloudWatchClient,
    namespace: &str,
    token: Option<String>,
) -> Result<Page<Value>, RemoteFault> {
    let output = client
        .list_metrics()
        .namespace(namespace)
        .set_next_token(token)
        .send()
        .await
        .map_err(|e| remote_fault("ListMetrics", &e))?;

    let items = output.metrics().iter().map(metric_json).collect();
    Ok(Page::new(items, output.next_token().map(str::to_string)))
}

fn metric_json(metric: &Metric) -> Value {
    let dimensions: Vec<Value> = metric
        .dimensions()
        .iter()
        .map(|d| json!({"Name": d.name(), "Value": d.value()}))
        .collect();
    json!({
        "namespace": metric.namespace(),
        "metric_name": metric.metric_name(),
        "dimensions": dimensions,
    })
}

/// Daily S3 storage metrics of one bucket.
///
/// Either statistic may be missing (new bucket, no request metrics yet);
/// a failed lookup leaves its field null instead of failing the call.
pub(super) async fn bucket_size(config: &SdkConfig, bucket: &str) -> Result<Value, RemoteFault> {
    let client = CloudWatchClient::new(config);
    let size = daily_average(&client, bucket, "BucketSizeBytes", "StandardStorage").await;
    let objects = daily_average(&client, bucket, "NumberOfObjects", "AllStorageTypes").await;
    Ok(bucket_size_json(bucket, size, objects))
}

async fn daily_average(
    client: &CloudWatchClient,
    bucket: &str,
    metric_name: &str,
    storage_type: &str,
) -> Option<f64> {
    let end = Utc::now();
    let start = end - ChronoDuration::days(1);
    let result = client
        .get_metric_statistics()
        .namespace(S3_NAMESPACE)
        .metric_name(metric_name)
        .dimensions(Dimension::builder().name("BucketName").value(bucket).build())
        .dimensions(Dimension::builder().name("StorageType").value(storage_type).build())
        .start_time(smithy_time(start))
        .end_time(smithy_time(end))
        .period(DAILY)
        .statistics(Statistic::Average)
        .send()
        .await;

    match result {
        Ok(output) => latest_average(output.datapoints()),
        Err(e) => {
            let fault = remote_fault("GetMetricStatistics", &e);
            debug!("{} lookup failed for {}: {}", metric_name, bucket, fault);
            None
        }
    }
}

fn latest_average(points: &[Datapoint]) -> Option<f64> {
    points
        .iter()
        .max_by_key(|p| p.timestamp().map(|t| (t.secs(), t.subsec_nanos())))
        .and_then(Datapoint::average)
}

fn bucket_size_json(bucket: &str, size_bytes: Option<f64>, object_count: Option<f64>) -> Value {
    json!({
        "bucket_name": bucket,
        "size_bytes": size_bytes,
        "size_gb": size_bytes.map(|b| (b / BYTES_PER_GB * 100.0).round() / 100.0),
        "object_count": object_count.map(|c| c as i64),
    })
}

/// Only the statistics CloudWatch returned are present.
fn datapoint_json(point: &Datapoint) -> Value {
    let mut out = Map::new();
    out.insert("Timestamp".into(), json!(point.timestamp().and_then(iso)));
    let stats = [
        ("Average", point.average()),
        ("Maximum", point.maximum()),
        ("Minimum", point.minimum()),
        ("Sum", point.sum()),
        ("SampleCount", point.sample_count()),
    ];
    for (name, value) in stats {
        if let Some(value) = value {
            out.insert(name.into(), json!(value));
        }
    }
    if let Some(unit) = point.unit() {
        out.insert("Unit".into(), json!(unit.as_str()));
    }
    Value::Object(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_cloudwatch::types::StandardUnit;

    fn metric_args(value: Value) -> MetricArgs {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn cpu_query_targets_instance_hourly() {
        let args: CpuArgs = serde_json::from_value(json!({"instance_id": "i-1"})).unwrap();
        let query = args.into_query();

        assert_eq!(query.namespace, "AWS/EC2");
        assert_eq!(query.metric_name, "CPUUtilization");
        assert_eq!(query.hours, 168);
        assert_eq!(query.period, 3600);
        assert_eq!(query.statistics, vec!["Average", "Maximum", "Minimum"]);
        assert_eq!(query.dimensions[0].name, "InstanceId");
        assert_eq!(query.dimensions[0].value, "i-1");
    }

    #[test]
    fn dimensions_accept_either_case() {
        let query = metric_args(json!({
            "namespace": "AWS/RDS",
            "metric_name": "CPUUtilization",
            "dimensions": [{"Name": "DBInstanceIdentifier", "Value": "orders"}, {"name": "x", "value": "y"}],
        }))
        .into_query()
        .unwrap();

        assert_eq!(query.dimensions.len(), 2);
        assert_eq!(query.dimensions[0].name, "DBInstanceIdentifier");
        assert_eq!(query.hours, 24);
        assert_eq!(query.period, 3600);
    }

    #[test]
    fn out_of_range_window_is_rejected() {
        let message = metric_args(json!({
            "namespace": "AWS/EC2",
            "metric_name": "NetworkIn",
            "dimensions": [],
            "start_hours_ago": 5000,
        }))
        .into_query()
        .unwrap_err();
        assert!(message.contains("start_hours_ago"));

        let message = metric_args(json!({
            "namespace": "AWS/EC2",
            "metric_name": "NetworkIn",
            "dimensions": [],
            "period": 30,
        }))
        .into_query()
        .unwrap_err();
        assert!(message.contains("period"));
    }

    #[test]
    fn blank_namespace_is_rejected() {
        let args: NamespaceArgs = serde_json::from_value(json!({"namespace": "  "})).unwrap();
        assert!(args.into_namespace().unwrap_err().contains("namespace"));

        let args: NamespaceArgs = serde_json::from_value(json!({"namespace": "AWS/Lambda"})).unwrap();
        assert_eq!(args.into_namespace().unwrap(), "AWS/Lambda");
    }

    #[test]
    fn listed_metric_keeps_dimensions() {
        let metric = Metric::builder()
            .namespace("AWS/Lambda")
            .metric_name("Duration")
            .dimensions(Dimension::builder().name("FunctionName").value("resize").build())
            .build();

        let value = metric_json(&metric);
        assert_eq!(value["namespace"], "AWS/Lambda");
        assert_eq!(value["metric_name"], "Duration");
        assert_eq!(value["dimensions"], json!([{"Name": "FunctionName", "Value": "resize"}]));
    }

    #[test]
    fn bucket_size_uses_latest_datapoint() {
        let points = vec![
            Datapoint::builder()
                .timestamp(aws_smithy_types::DateTime::from_secs(1_700_000_000))
                .average(1.0)
                .build(),
            Datapoint::builder()
                .timestamp(aws_smithy_types::DateTime::from_secs(1_700_086_400))
                .average(3_221_225_472.0)
                .build(),
        ];
        assert_eq!(latest_average(&points), Some(3_221_225_472.0));
        assert_eq!(latest_average(&[]), None);

        let value = bucket_size_json("logs-archive", latest_average(&points), Some(1234.0));
        assert_eq!(value["bucket_name"], "logs-archive");
        assert_eq!(value["size_gb"], 3.0);
        assert_eq!(value["object_count"], 1234);
    }

    #[test]
    fn missing_bucket_metrics_are_null() {
        let value = bucket_size_json("empty", None, None);
        assert_eq!(value["size_bytes"], Value::Null);
        assert_eq!(value["size_gb"], Value::Null);
        assert_eq!(value["object_count"], Value::Null);
    }

    #[test]
    fn datapoint_keeps_only_present_statistics() {
        let point = Datapoint::builder()
            .timestamp(aws_smithy_types::DateTime::from_secs(1_700_000_000))
            .average(12.5)
            .maximum(80.0)
            .unit(StandardUnit::Percent)
            .build();

        let value = datapoint_json(&point);
        assert_eq!(value["Timestamp"], "2023-11-14T22:13:20+00:00");
        assert_eq!(value["Average"], 12.5);
        assert_eq!(value["Maximum"], 80.0);
        assert!(value.get("Minimum").is_none());
        assert_eq!(value["Unit"], "Percent");
    }
}
