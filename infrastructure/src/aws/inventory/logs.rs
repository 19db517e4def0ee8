//! CloudWatch Logs: groups, recent streams and filtered events.

use super::non_blank;
use crate::aws::fault::remote_fault;
use aws_config::SdkConfig;
use aws_sdk_cloudwatchlogs::Client as LogsClient;
use aws_sdk_cloudwatchlogs::types::{FilteredLogEvent, LogGroup, LogStream, OrderBy};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use costpilot_application::{Page, PaginationMerger};
use costpilot_domain::RemoteFault;
use serde::Deserialize;
use serde_json::{Value, json};
use std::ops::RangeInclusive;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;
const STREAM_LIMIT: RangeInclusive<i32> = 1..=50;
const EVENT_LIMIT: RangeInclusive<i32> = 1..=10_000;
const MIN_HOURS: i64 = 1;

fn default_stream_limit() -> i32 {
    50
}

fn default_event_limit() -> i32 {
    100
}

fn default_event_hours() -> i64 {
    24
}

fn checked_limit(value: i32, range: RangeInclusive<i32>) -> Result<i32, String> {
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(format!(
            "limit must be between {} and {}, got {}",
            range.start(),
            range.end(),
            value
        ))
    }
}

/// Arguments of `get_log_streams`.
#[derive(Debug, Deserialize)]
pub(super) struct StreamArgs {
    log_group_name: String,
    #[serde(default = "default_stream_limit")]
    limit: i32,
}

impl StreamArgs {
    pub(super) fn into_query(self) -> Result<StreamQuery, String> {
        Ok(StreamQuery {
            log_group_name: non_blank("log_group_name", self.log_group_name)?,
            limit: checked_limit(self.limit, STREAM_LIMIT)?,
        })
    }
}

/// Arguments of `filter_log_events`.
#[derive(Debug, Deserialize)]
pub(super) struct EventArgs {
    log_group_name: String,
    #[serde(default)]
    filter_pattern: String,
    #[serde(default = "default_event_hours")]
    start_hours_ago: i64,
    #[serde(default = "default_event_limit")]
    limit: i32,
}

impl EventArgs {
    pub(super) fn into_query(self) -> Result<EventQuery, String> {
        if self.start_hours_ago < MIN_HOURS {
            return Err(format!(
                "start_hours_ago must be at least {}, got {}",
                MIN_HOURS, self.start_hours_ago
            ));
        }
        Ok(EventQuery {
            log_group_name: non_blank("log_group_name", self.log_group_name)?,
            filter_pattern: self.filter_pattern.trim().to_string(),
            hours: self.start_hours_ago,
            limit: checked_limit(self.limit, EVENT_LIMIT)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct StreamQuery {
    log_group_name: String,
    limit: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct EventQuery {
    log_group_name: String,
    filter_pattern: String,
    hours: i64,
    limit: i32,
}

pub(super) async fn list_log_groups(
    config: &SdkConfig,
    merger: &PaginationMerger,
) -> Result<Value, RemoteFault> {
    let client = LogsClient::new(config);
    let first = describe_page(&client, None).await?;
    let groups = merger
        .drain(first, |token| describe_page(&client, Some(token)))
        .await?;
    Ok(Value::Array(groups))
}

async fn describe_page(
    client: &LogsClient,
    token: Option<String>,
) -> Result<Page<Value>, RemoteFault> {
    let output = client
        .describe_log_groups()
        .set_next_token(token)
        .send()
        .await
        .map_err(|e| remote_fault("DescribeLogGroups", &e))?;

    let items = output.log_groups().iter().map(log_group_json).collect();
    Ok(Page::new(items, output.next_token().map(str::to_string)))
}

fn log_group_json(group: &LogGroup) -> Value {
    let stored_bytes = group.stored_bytes().unwrap_or(0);
    json!({
        "log_group_name": group.log_group_name(),
        "creation_time": group.creation_time().and_then(millis_to_iso),
        "retention_in_days": group.retention_in_days(),
        "stored_bytes": stored_bytes,
        "stored_mb": stored_mb(stored_bytes),
        "metric_filter_count": group.metric_filter_count().unwrap_or(0),
    })
}

/// The most recently written streams first, at most `limit` of them.
pub(super) async fn recent_streams(
    config: &SdkConfig,
    query: StreamQuery,
) -> Result<Value, RemoteFault> {
    let output = LogsClient::new(config)
        .describe_log_streams()
        .log_group_name(&query.log_group_name)
        .order_by(OrderBy::LastEventTime)
        .descending(true)
        .limit(query.limit)
        .send()
        .await
        .map_err(|e| remote_fault("DescribeLogStreams", &e))?;

    Ok(Value::Array(
        output.log_streams().iter().map(log_stream_json).collect(),
    ))
}

/// One page of matching events, capped at `limit`.
pub(super) async fn filter_events(
    config: &SdkConfig,
    query: EventQuery,
) -> Result<Value, RemoteFault> {
    let end = Utc::now();
    let start = end - ChronoDuration::hours(query.hours);

    let output = LogsClient::new(config)
        .filter_log_events()
        .log_group_name(&query.log_group_name)
        .start_time(start.timestamp_millis())
        .end_time(end.timestamp_millis())
        .limit(query.limit)
        .set_filter_pattern(
            (!query.filter_pattern.is_empty()).then(|| query.filter_pattern.clone()),
        )
        .send()
        .await
        .map_err(|e| remote_fault("FilterLogEvents", &e))?;

    Ok(events_json(output.events(), &query.filter_pattern, start, end))
}

// `stored_bytes` is deprecated on streams but still reported.
#[allow(deprecated)]
fn log_stream_json(stream: &LogStream) -> Value {
    json!({
        "log_stream_name": stream.log_stream_name(),
        "creation_time": stream.creation_time().and_then(millis_to_iso),
        "first_event_timestamp": stream.first_event_timestamp().and_then(millis_to_iso),
        "last_event_timestamp": stream.last_event_timestamp().and_then(millis_to_iso),
        "stored_bytes": stream.stored_bytes(),
    })
}

fn events_json(
    events: &[FilteredLogEvent],
    filter_pattern: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Value {
    let events: Vec<Value> = events
        .iter()
        .map(|event| {
            json!({
                "log_stream_name": event.log_stream_name(),
                "timestamp": event.timestamp().and_then(millis_to_iso),
                "message": event.message(),
                "ingestion_time": event.ingestion_time().and_then(millis_to_iso),
            })
        })
        .collect();

    json!({
        "event_count": events.len(),
        "events": events,
        "filter_pattern": filter_pattern,
        "searched_time_range": {
            "start": start.to_rfc3339(),
            "end": end.to_rfc3339(),
        },
    })
}

/// Megabytes rounded to two decimals.
fn stored_mb(bytes: i64) -> f64 {
    (bytes as f64 / BYTES_PER_MB * 100.0).round() / 100.0
}

fn millis_to_iso(millis: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp_millis(millis).map(|dt| dt.to_rfc3339())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_size_is_rounded_megabytes() {
        assert_eq!(stored_mb(0), 0.0);
        assert_eq!(stored_mb(1_048_576), 1.0);
        assert_eq!(stored_mb(1_572_864), 1.5);
        assert_eq!(stored_mb(1_000_000), 0.95);
    }

    #[test]
    fn log_group_without_retention() {
        let group = LogGroup::builder()
            .log_group_name("/aws/lambda/resize-images")
            .creation_time(1_700_000_000_000)
            .stored_bytes(5 * 1_048_576)
            .build();

        let value = log_group_json(&group);
        assert_eq!(value["log_group_name"], "/aws/lambda/resize-images");
        assert_eq!(value["creation_time"], "2023-11-14T22:13:20+00:00");
        assert_eq!(value["retention_in_days"], Value::Null);
        assert_eq!(value["stored_mb"], 5.0);
        assert_eq!(value["metric_filter_count"], 0);
    }

    #[test]
    fn stream_limit_is_bounded() {
        let args: StreamArgs =
            serde_json::from_value(json!({"log_group_name": "/aws/lambda/etl"})).unwrap();
        assert_eq!(args.into_query().unwrap().limit, 50);

        let args: StreamArgs =
            serde_json::from_value(json!({"log_group_name": "/aws/lambda/etl", "limit": 500}))
                .unwrap();
        assert!(args.into_query().unwrap_err().contains("limit"));
    }

    #[test]
    fn event_search_defaults_to_last_day() {
        let args: EventArgs =
            serde_json::from_value(json!({"log_group_name": "/ecs/api", "filter_pattern": " ERROR "}))
                .unwrap();
        let query = args.into_query().unwrap();

        assert_eq!(query.hours, 24);
        assert_eq!(query.limit, 100);
        assert_eq!(query.filter_pattern, "ERROR");

        let args: EventArgs =
            serde_json::from_value(json!({"log_group_name": "/ecs/api", "start_hours_ago": 0}))
                .unwrap();
        assert!(args.into_query().unwrap_err().contains("start_hours_ago"));
    }

    #[test]
    fn stream_timestamps_are_optional() {
        let stream = LogStream::builder()
            .log_stream_name("2024/05/01/[$LATEST]abc")
            .creation_time(1_700_000_000_000)
            .build();

        let value = log_stream_json(&stream);
        assert_eq!(value["log_stream_name"], "2024/05/01/[$LATEST]abc");
        assert_eq!(value["creation_time"], "2023-11-14T22:13:20+00:00");
        assert_eq!(value["last_event_timestamp"], Value::Null);
    }

    #[test]
    fn events_report_count_and_search_window() {
        let start = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        let end = start + ChronoDuration::hours(24);
        let event = FilteredLogEvent::builder()
            .log_stream_name("web-1")
            .timestamp(1_700_000_000_000)
            .message("ERROR timeout talking to db")
            .ingestion_time(1_700_000_001_000)
            .build();

        let value = events_json(&[event], "ERROR", start, end);
        assert_eq!(value["event_count"], 1);
        assert_eq!(value["events"][0]["message"], "ERROR timeout talking to db");
        assert_eq!(value["events"][0]["ingestion_time"], "2023-11-14T22:13:21+00:00");
        assert_eq!(value["filter_pattern"], "ERROR");
        assert_eq!(value["searched_time_range"]["start"], "2023-11-14T22:13:20+00:00");
    }
}
