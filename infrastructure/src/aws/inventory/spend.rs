//! Cost Explorer queries: usage, per-service breakdown, forecast and tags.
//!
//! Dates are `YYYY-MM-DD`; Cost Explorer treats `end` as exclusive.

use super::{invalid_parameter, non_blank};
use crate::aws::fault::remote_fault;
use aws_config::SdkConfig;
use aws_sdk_costexplorer::Client as CostExplorerClient;
use aws_sdk_costexplorer::types::{
    DateInterval, DimensionValuesWithAttributes, ForecastResult, Granularity, GroupDefinition,
    GroupDefinitionType, Metric, MetricValue, ResultByTime,
};
use chrono::{Days, Months, NaiveDate};
use costpilot_application::{Page, PaginationMerger};
use costpilot_domain::RemoteFault;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::collections::HashMap;

const DATE_FORMAT: &str = "%Y-%m-%d";
const USAGE_LOOKBACK_DAYS: u64 = 30;
const FORECAST_MONTHS: u32 = 3;
const USAGE_GRANULARITIES: &[&str] = &["DAILY", "MONTHLY", "HOURLY"];
const FORECAST_GRANULARITIES: &[&str] = &["DAILY", "MONTHLY"];

fn default_usage_granularity() -> String {
    "DAILY".to_string()
}

fn default_forecast_granularity() -> String {
    "MONTHLY".to_string()
}

fn default_usage_metrics() -> Vec<String> {
    vec!["UnblendedCost".into(), "UsageQuantity".into()]
}

fn default_forecast_metric() -> String {
    "UNBLENDED_COST".to_string()
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(super) struct GroupByArg {
    #[serde(alias = "Type", rename = "type")]
    kind: String,
    #[serde(alias = "Key")]
    key: String,
}

/// Arguments of `get_cost_and_usage`.
#[derive(Debug, Deserialize)]
pub(super) struct UsageArgs {
    start_date: Option<String>,
    end_date: Option<String>,
    #[serde(default = "default_usage_granularity")]
    granularity: String,
    #[serde(default = "default_usage_metrics")]
    metrics: Vec<String>,
    #[serde(default)]
    group_by: Vec<GroupByArg>,
}

impl UsageArgs {
    pub(super) fn into_query(self, today: NaiveDate) -> Result<UsageQuery, String> {
        let (start, end) = usage_period(self.start_date, self.end_date, today)?;
        let granularity = checked_granularity(self.granularity, USAGE_GRANULARITIES)?;
        let metrics = if self.metrics.is_empty() {
            default_usage_metrics()
        } else {
            self.metrics
        };
        Ok(UsageQuery {
            start,
            end,
            granularity,
            metrics,
            group_by: self.group_by,
        })
    }
}

/// Arguments of `get_cost_by_service`.
#[derive(Debug, Deserialize)]
pub(super) struct ServiceArgs {
    start_date: Option<String>,
    end_date: Option<String>,
}

impl ServiceArgs {
    pub(super) fn into_query(self, today: NaiveDate) -> Result<UsageQuery, String> {
        let (start, end) = usage_period(self.start_date, self.end_date, today)?;
        Ok(UsageQuery {
            start,
            end,
            granularity: "MONTHLY".to_string(),
            metrics: vec!["UnblendedCost".to_string()],
            group_by: vec![GroupByArg {
                kind: "DIMENSION".to_string(),
                key: "SERVICE".to_string(),
            }],
        })
    }
}

/// Arguments of `get_cost_forecast`.
#[derive(Debug, Deserialize)]
pub(super) struct ForecastArgs {
    start_date: Option<String>,
    end_date: Option<String>,
    #[serde(default = "default_forecast_granularity")]
    granularity: String,
    #[serde(default = "default_forecast_metric")]
    metric: String,
}

impl ForecastArgs {
    pub(super) fn into_query(self, today: NaiveDate) -> Result<ForecastQuery, String> {
        let start = match self.start_date {
            Some(date) => parse_date("start_date", &date)?,
            None => today,
        };
        let end = match self.end_date {
            Some(date) => parse_date("end_date", &date)?,
            None => start
                .checked_add_months(Months::new(FORECAST_MONTHS))
                .ok_or_else(|| "start_date is out of range".to_string())?,
        };
        check_order(start, end)?;

        Ok(ForecastQuery {
            start,
            end,
            granularity: checked_granularity(self.granularity, FORECAST_GRANULARITIES)?,
            metric: self.metric,
        })
    }
}

/// Arguments of `get_cost_tags`.
#[derive(Debug, Deserialize)]
pub(super) struct TagArgs {
    tag_key: String,
}

impl TagArgs {
    /// Tag values are searched over the thirty days up to `today`.
    pub(super) fn into_query(self, today: NaiveDate) -> Result<TagQuery, String> {
        let (start, end) = usage_period(None, None, today)?;
        Ok(TagQuery {
            tag_key: non_blank("tag_key", self.tag_key)?,
            start,
            end,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct UsageQuery {
    start: NaiveDate,
    end: NaiveDate,
    granularity: String,
    metrics: Vec<String>,
    group_by: Vec<GroupByArg>,
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct ForecastQuery {
    start: NaiveDate,
    end: NaiveDate,
    granularity: String,
    metric: String,
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct TagQuery {
    tag_key: String,
    start: NaiveDate,
    end: NaiveDate,
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| format!("{} must be YYYY-MM-DD, got '{}'", field, value))
}

fn check_order(start: NaiveDate, end: NaiveDate) -> Result<(), String> {
    if start >= end {
        return Err(format!(
            "start_date {} must be before end_date {}",
            start, end
        ));
    }
    Ok(())
}

/// Explicit dates win; otherwise the last thirty days up to `today`.
fn usage_period(
    start: Option<String>,
    end: Option<String>,
    today: NaiveDate,
) -> Result<(NaiveDate, NaiveDate), String> {
    let end = match end {
        Some(date) => parse_date("end_date", &date)?,
        None => today,
    };
    let start = match start {
        Some(date) => parse_date("start_date", &date)?,
        None => end
            .checked_sub_days(Days::new(USAGE_LOOKBACK_DAYS))
            .ok_or_else(|| "end_date is out of range".to_string())?,
    };
    check_order(start, end)?;
    Ok((start, end))
}

fn checked_granularity(value: String, allowed: &[&str]) -> Result<String, String> {
    let upper = value.to_ascii_uppercase();
    if allowed.contains(&upper.as_str()) {
        Ok(upper)
    } else {
        Err(format!(
            "granularity must be one of {}, got '{}'",
            allowed.join(", "),
            value
        ))
    }
}

fn date_interval(start: NaiveDate, end: NaiveDate) -> Result<DateInterval, RemoteFault> {
    DateInterval::builder()
        .start(start.format(DATE_FORMAT).to_string())
        .end(end.format(DATE_FORMAT).to_string())
        .build()
        .map_err(|e| invalid_parameter(e.to_string()))
}

/// Items of one `GetCostAndUsage` page.
enum UsageItem {
    Result(Value),
    Attribute(Value),
}

pub(super) async fn cost_and_usage(
    config: &SdkConfig,
    merger: &PaginationMerger,
    query: UsageQuery,
) -> Result<Value, RemoteFault> {
    let client = CostExplorerClient::new(config);
    let first = usage_page(&client, &query, None).await?;
    let items = merger
        .drain(first, |token| usage_page(&client, &query, Some(token)))
        .await?;

    let mut results = Vec::new();
    let mut attributes = Vec::new();
    for item in items {
        match item {
            UsageItem::Result(value) => results.push(value),
            UsageItem::Attribute(value) => attributes.push(value),
        }
    }

    Ok(json!({
        "time_period": {
            "start": query.start.format(DATE_FORMAT).to_string(),
            "end": query.end.format(DATE_FORMAT).to_string(),
        },
        "granularity": query.granularity,
        "metrics": query.metrics,
        "results_by_time": results,
        "dimension_value_attributes": attributes,
    }))
}

async fn usage_page(
    client: &CostExplorerClient,
    query: &UsageQuery,
    token: Option<String>,
) -> Result<Page<UsageItem>, RemoteFault> {
    let group_by = query
        .group_by
        .iter()
        .map(|g| {
            GroupDefinition::builder()
                .r#type(GroupDefinitionType::from(g.kind.to_ascii_uppercase().as_str()))
                .key(&g.key)
                .build()
        })
        .collect::<Vec<_>>();

    let output = client
        .get_cost_and_usage()
        .time_period(date_interval(query.start, query.end)?)
        .granularity(Granularity::from(query.granularity.as_str()))
        .set_metrics(Some(query.metrics.clone()))
        .set_group_by((!group_by.is_empty()).then_some(group_by))
        .set_next_page_token(token)
        .send()
        .await
        .map_err(|e| remote_fault("GetCostAndUsage", &e))?;

    let items = output
        .results_by_time()
        .iter()
        .map(|r| UsageItem::Result(result_by_time_json(r)))
        .chain(
            output
                .dimension_value_attributes()
                .iter()
                .map(|a| UsageItem::Attribute(dimension_attributes_json(a))),
        )
        .collect();
    Ok(Page::new(
        items,
        output.next_page_token().map(str::to_string),
    ))
}

pub(super) async fn cost_forecast(
    config: &SdkConfig,
    query: ForecastQuery,
) -> Result<Value, RemoteFault> {
    let client = CostExplorerClient::new(config);
    let output = client
        .get_cost_forecast()
        .time_period(date_interval(query.start, query.end)?)
        .granularity(Granularity::from(query.granularity.as_str()))
        .metric(Metric::from(query.metric.as_str()))
        .send()
        .await
        .map_err(|e| remote_fault("GetCostForecast", &e))?;

    let forecasts: Vec<Value> = output
        .forecast_results_by_time()
        .iter()
        .map(forecast_json)
        .collect();

    Ok(json!({
        "time_period": {
            "start": query.start.format(DATE_FORMAT).to_string(),
            "end": query.end.format(DATE_FORMAT).to_string(),
        },
        "granularity": query.granularity,
        "metric": query.metric,
        "total": output.total().map(metric_value_json),
        "forecast_results_by_time": forecasts,
    }))
}

pub(super) async fn cost_tags(
    config: &SdkConfig,
    merger: &PaginationMerger,
    query: TagQuery,
) -> Result<Value, RemoteFault> {
    let client = CostExplorerClient::new(config);
    let first = tags_page(&client, &query, None).await?;
    let tags = merger
        .drain(first, |token| tags_page(&client, &query, Some(token)))
        .await?;

    Ok(json!({
        "tag_key": query.tag_key,
        "tags": tags,
        "time_period": {
            "start": query.start.format(DATE_FORMAT).to_string(),
            "end": query.end.format(DATE_FORMAT).to_string(),
        },
    }))
}

async fn tags_page(
    client: &CostExplorerClient,
    query: &TagQuery,
    token: Option<String>,
) -> Result<Page<String>, RemoteFault> {
    let output = client
        .get_tags()
        .time_period(date_interval(query.start, query.end)?)
        .tag_key(&query.tag_key)
        .set_next_page_token(token)
        .send()
        .await
        .map_err(|e| remote_fault("GetTags", &e))?;

    Ok(Page::new(
        output.tags().to_vec(),
        output.next_page_token().map(str::to_string),
    ))
}

fn metric_value_json(value: &MetricValue) -> Value {
    json!({"Amount": value.amount(), "Unit": value.unit()})
}

fn metrics_json(metrics: Option<&HashMap<String, MetricValue>>) -> Value {
    let map: Map<String, Value> = metrics
        .into_iter()
        .flatten()
        .map(|(name, value)| (name.clone(), metric_value_json(value)))
        .collect();
    Value::Object(map)
}

fn interval_json(interval: Option<&DateInterval>) -> Value {
    match interval {
        Some(interval) => json!({"Start": interval.start(), "End": interval.end()}),
        None => Value::Null,
    }
}

fn result_by_time_json(result: &ResultByTime) -> Value {
    let groups: Vec<Value> = result
        .groups()
        .iter()
        .map(|group| json!({"Keys": group.keys(), "Metrics": metrics_json(group.metrics())}))
        .collect();

    json!({
        "TimePeriod": interval_json(result.time_period()),
        "Total": metrics_json(result.total()),
        "Groups": groups,
        "Estimated": result.estimated(),
    })
}

fn dimension_attributes_json(attributes: &DimensionValuesWithAttributes) -> Value {
    json!({
        "Value": attributes.value(),
        "Attributes": attributes.attributes(),
    })
}

fn forecast_json(result: &ForecastResult) -> Value {
    json!({
        "TimePeriod": interval_json(result.time_period()),
        "MeanValue": result.mean_value(),
        "PredictionIntervalLowerBound": result.prediction_interval_lower_bound(),
        "PredictionIntervalUpperBound": result.prediction_interval_upper_bound(),
    })
}
