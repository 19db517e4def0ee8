//! The inspection tool catalog
//!
//! A closed set of read-only AWS inspection operations. Dispatch is a `match`
//! over [`InspectionTool`]; there is no dynamic registration.

use super::entities::{ParamType, ToolDefinition, ToolParameter, ToolSpec};
use serde_json::json;

/// Parameter injected into every call: the role to assume.
pub const ROLE_ARN_PARAM: &str = "role_arn";
/// Parameter defaulted to the profile region when a tool declares it.
pub const REGION_PARAM: &str = "region";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InspectionTool {
    Ec2Instances,
    Ec2Tags,
    Ec2CpuUtilization,
    MetricStatistics,
    CloudWatchMetrics,
    RdsInstances,
    RdsClusters,
    LambdaFunctions,
    LambdaFunctionConfig,
    EcsClusters,
    EcsTasks,
    S3Buckets,
    S3BucketSize,
    LogGroups,
    LogStreams,
    LogEvents,
    CostAndUsage,
    CostByService,
    CostForecast,
    CostTags,
}

impl InspectionTool {
    pub const ALL: [InspectionTool; 20] = [
        InspectionTool::Ec2Instances,
        InspectionTool::Ec2Tags,
        InspectionTool::Ec2CpuUtilization,
        InspectionTool::MetricStatistics,
        InspectionTool::CloudWatchMetrics,
        InspectionTool::RdsInstances,
        InspectionTool::RdsClusters,
        InspectionTool::LambdaFunctions,
        InspectionTool::LambdaFunctionConfig,
        InspectionTool::EcsClusters,
        InspectionTool::EcsTasks,
        InspectionTool::S3Buckets,
        InspectionTool::S3BucketSize,
        InspectionTool::LogGroups,
        InspectionTool::LogStreams,
        InspectionTool::LogEvents,
        InspectionTool::CostAndUsage,
        InspectionTool::CostByService,
        InspectionTool::CostForecast,
        InspectionTool::CostTags,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            InspectionTool::Ec2Instances => "get_ec2_instances",
            InspectionTool::Ec2Tags => "get_ec2_tags",
            InspectionTool::Ec2CpuUtilization => "get_ec2_cpu_utilization",
            InspectionTool::MetricStatistics => "get_metric_statistics",
            InspectionTool::CloudWatchMetrics => "get_cloudwatch_metrics",
            InspectionTool::RdsInstances => "get_rds_instances",
            InspectionTool::RdsClusters => "get_rds_clusters",
            InspectionTool::LambdaFunctions => "get_lambda_functions",
            InspectionTool::LambdaFunctionConfig => "get_lambda_function_config",
            InspectionTool::EcsClusters => "get_ecs_clusters",
            InspectionTool::EcsTasks => "get_ecs_tasks",
            InspectionTool::S3Buckets => "get_s3_buckets",
            InspectionTool::S3BucketSize => "get_s3_bucket_size",
            InspectionTool::LogGroups => "get_log_groups",
            InspectionTool::LogStreams => "get_log_streams",
            InspectionTool::LogEvents => "filter_log_events",
            InspectionTool::CostAndUsage => "get_cost_and_usage",
            InspectionTool::CostByService => "get_cost_by_service",
            InspectionTool::CostForecast => "get_cost_forecast",
            InspectionTool::CostTags => "get_cost_tags",
        }
    }

    /// Look up a tool by canonical name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.name() == name)
    }

    /// `data_type` tag of the normalized response envelope.
    pub fn data_type(&self) -> &'static str {
        match self {
            InspectionTool::Ec2Instances => "ec2_instances",
            InspectionTool::Ec2Tags => "ec2_tags",
            InspectionTool::Ec2CpuUtilization | InspectionTool::MetricStatistics => {
                "metric_statistics"
            }
            InspectionTool::CloudWatchMetrics => "cloudwatch_metrics",
            InspectionTool::RdsInstances => "rds_instances",
            InspectionTool::RdsClusters => "rds_clusters",
            InspectionTool::LambdaFunctions => "lambda_functions",
            InspectionTool::LambdaFunctionConfig => "lambda_function_config",
            InspectionTool::EcsClusters => "ecs_clusters",
            InspectionTool::EcsTasks => "ecs_tasks",
            InspectionTool::S3Buckets => "s3_buckets",
            InspectionTool::S3BucketSize => "s3_bucket_metrics",
            InspectionTool::LogGroups => "log_groups",
            InspectionTool::LogStreams => "log_streams",
            InspectionTool::LogEvents => "log_events",
            InspectionTool::CostAndUsage | InspectionTool::CostByService => "cost_and_usage",
            InspectionTool::CostForecast => "cost_forecast",
            InspectionTool::CostTags => "cost_tags",
        }
    }

    /// Names models commonly use for this operation.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            InspectionTool::Ec2Instances => &["describe_instances", "list_ec2_instances", "ec2_instances"],
            InspectionTool::Ec2Tags => &["describe_tags", "list_ec2_tags"],
            InspectionTool::Ec2CpuUtilization => &["get_cpu_utilization", "ec2_cpu_utilization"],
            InspectionTool::MetricStatistics => &["get_cloudwatch_metric", "cloudwatch_metric_statistics"],
            InspectionTool::CloudWatchMetrics => &["list_metrics", "list_cloudwatch_metrics"],
            InspectionTool::RdsInstances => &["describe_db_instances", "list_rds_instances"],
            InspectionTool::RdsClusters => &["describe_db_clusters", "list_rds_clusters"],
            InspectionTool::LambdaFunctions => &["list_functions", "list_lambda_functions"],
            InspectionTool::LambdaFunctionConfig => &["get_function_configuration", "get_lambda_config"],
            InspectionTool::EcsClusters => &["list_clusters", "list_ecs_clusters"],
            InspectionTool::EcsTasks => &["list_tasks", "list_ecs_tasks"],
            InspectionTool::S3Buckets => &["list_buckets", "list_s3_buckets"],
            InspectionTool::S3BucketSize => &["get_bucket_size", "s3_bucket_size"],
            InspectionTool::LogGroups => &["describe_log_groups", "list_log_groups"],
            InspectionTool::LogStreams => &["describe_log_streams", "list_log_streams"],
            InspectionTool::LogEvents => &["search_logs", "get_log_events"],
            InspectionTool::CostAndUsage => &["get_costs", "get_cost"],
            InspectionTool::CostByService => &["get_service_costs", "cost_by_service"],
            InspectionTool::CostForecast => &["forecast_costs", "get_forecast"],
            InspectionTool::CostTags => &["get_tag_values", "cost_tags"],
        }
    }

    pub fn definition(&self) -> ToolDefinition {
        let def = ToolDefinition::new(self.name(), self.description());
        match self {
            InspectionTool::Ec2Instances
            | InspectionTool::Ec2Tags
            | InspectionTool::RdsInstances
            | InspectionTool::RdsClusters
            | InspectionTool::LambdaFunctions
            | InspectionTool::EcsClusters
            | InspectionTool::LogGroups => def.with_parameter(region_param()),
            InspectionTool::CloudWatchMetrics => def
                .with_parameter(ToolParameter::new(
                    "namespace",
                    "CloudWatch namespace (e.g., AWS/EC2, AWS/Lambda)",
                    true,
                ))
                .with_parameter(region_param()),
            InspectionTool::LambdaFunctionConfig => def
                .with_parameter(ToolParameter::new("function_name", "Lambda function name or ARN", true))
                .with_parameter(region_param()),
            InspectionTool::EcsTasks => def
                .with_parameter(ToolParameter::new("cluster_name", "ECS cluster name or ARN", true))
                .with_parameter(region_param()),
            InspectionTool::S3BucketSize => def
                .with_parameter(ToolParameter::new("bucket_name", "S3 bucket name", true))
                .with_parameter(region_param()),
            InspectionTool::LogStreams => def
                .with_parameter(log_group_param())
                .with_parameter(
                    ToolParameter::new("limit", "Maximum number of streams (1-50)", false)
                        .with_type(ParamType::Integer)
                        .with_default(50),
                )
                .with_parameter(region_param()),
            InspectionTool::LogEvents => def
                .with_parameter(log_group_param())
                .with_parameter(
                    ToolParameter::new("filter_pattern", "CloudWatch Logs filter pattern", false)
                        .with_default(""),
                )
                .with_parameter(
                    ToolParameter::new("start_hours_ago", "Hours of history to search", false)
                        .with_type(ParamType::Integer)
                        .with_default(24),
                )
                .with_parameter(
                    ToolParameter::new("limit", "Maximum number of events (1-10000)", false)
                        .with_type(ParamType::Integer)
                        .with_default(100),
                )
                .with_parameter(region_param()),
            InspectionTool::CostTags => def.with_parameter(ToolParameter::new(
                "tag_key",
                "Cost allocation tag key (e.g., Environment, Team)",
                true,
            )),
            InspectionTool::Ec2CpuUtilization => def
                .with_parameter(ToolParameter::new(
                    "instance_id",
                    "EC2 instance ID (e.g., i-1234567890abcdef0)",
                    true,
                ))
                .with_parameter(
                    ToolParameter::new("start_hours_ago", "Hours of history to retrieve", false)
                        .with_type(ParamType::Integer)
                        .with_default(168),
                )
                .with_parameter(region_param()),
            InspectionTool::MetricStatistics => def
                .with_parameter(ToolParameter::new(
                    "namespace",
                    "CloudWatch namespace (e.g., AWS/EC2, AWS/RDS)",
                    true,
                ))
                .with_parameter(ToolParameter::new("metric_name", "Metric name", true))
                .with_parameter(
                    ToolParameter::new(
                        "dimensions",
                        "Metric dimensions as a list of {\"Name\": ..., \"Value\": ...} objects",
                        true,
                    )
                    .with_type(ParamType::Array),
                )
                .with_parameter(
                    ToolParameter::new("start_hours_ago", "Hours of history (1-2160)", false)
                        .with_type(ParamType::Integer)
                        .with_default(24),
                )
                .with_parameter(
                    ToolParameter::new("period", "Period in seconds (>= 60)", false)
                        .with_type(ParamType::Integer)
                        .with_default(3600),
                )
                .with_parameter(
                    ToolParameter::new("statistics", "Statistics to retrieve", false)
                        .with_type(ParamType::Array)
                        .with_default(json!(["Average", "Maximum", "Minimum"])),
                )
                .with_parameter(region_param()),
            InspectionTool::S3Buckets => def,
            InspectionTool::CostAndUsage => def
                .with_parameter(start_date_param())
                .with_parameter(end_date_param())
                .with_parameter(
                    ToolParameter::new(
                        "granularity",
                        "Time granularity: DAILY, MONTHLY or HOURLY",
                        false,
                    )
                    .with_default("DAILY"),
                )
                .with_parameter(
                    ToolParameter::new("metrics", "Cost metrics to retrieve", false)
                        .with_type(ParamType::Array)
                        .with_default(json!(["UnblendedCost", "UsageQuantity"])),
                )
                .with_parameter(
                    ToolParameter::new(
                        "group_by",
                        "Optional grouping, e.g. [{\"Type\": \"DIMENSION\", \"Key\": \"SERVICE\"}]",
                        false,
                    )
                    .with_type(ParamType::Array),
                ),
            InspectionTool::CostByService => def
                .with_parameter(start_date_param())
                .with_parameter(end_date_param()),
            InspectionTool::CostForecast => def
                .with_parameter(start_date_param())
                .with_parameter(end_date_param())
                .with_parameter(
                    ToolParameter::new("granularity", "Time granularity: DAILY or MONTHLY", false)
                        .with_default("MONTHLY"),
                )
                .with_parameter(
                    ToolParameter::new("metric", "Forecast metric", false)
                        .with_default("UNBLENDED_COST"),
                ),
        }
    }

    fn description(&self) -> &'static str {
        match self {
            InspectionTool::Ec2Instances => {
                "Retrieve all EC2 instances with metadata including state, type, launch time, and tags. Use this to analyze compute resources."
            }
            InspectionTool::Ec2Tags => {
                "List all tags attached to EC2 resources. Use this to attribute compute spend to teams or environments."
            }
            InspectionTool::Ec2CpuUtilization => {
                "Get CPU utilization metrics for a specific EC2 instance over the past 7 days. Use this to identify underutilized instances."
            }
            InspectionTool::MetricStatistics => {
                "Get CloudWatch statistics for any metric. Use this when a more specific tool does not exist."
            }
            InspectionTool::CloudWatchMetrics => {
                "List the metrics available in a CloudWatch namespace with their dimensions. Use this before requesting metric statistics."
            }
            InspectionTool::RdsInstances => {
                "Retrieve all RDS database instances with configuration and status. Use this to analyze database resources."
            }
            InspectionTool::RdsClusters => {
                "Retrieve all RDS (Aurora) database clusters with endpoints and members. Use this to analyze clustered database resources."
            }
            InspectionTool::LambdaFunctions => {
                "List all Lambda functions with configuration details. Use this to identify unused or oversized functions."
            }
            InspectionTool::LambdaFunctionConfig => {
                "Get the full configuration of a single Lambda function. Use this to check memory, timeout and runtime settings."
            }
            InspectionTool::EcsClusters => {
                "List ECS clusters with task and service counts. Use this to analyze container workloads."
            }
            InspectionTool::EcsTasks => {
                "List the tasks of an ECS cluster with CPU, memory and launch type. Use this to find oversized or idle containers."
            }
            InspectionTool::S3Buckets => {
                "List all S3 buckets with metadata including versioning, encryption, and lifecycle policies. Use this for storage optimization."
            }
            InspectionTool::S3BucketSize => {
                "Get the storage size and object count of an S3 bucket from CloudWatch. Use this to find the largest buckets."
            }
            InspectionTool::LogGroups => {
                "List CloudWatch Log Groups with storage size. Use this to identify expensive log storage."
            }
            InspectionTool::LogStreams => {
                "List the most recently active streams of a log group. Use this to see which sources write the most logs."
            }
            InspectionTool::LogEvents => {
                "Search a log group for events matching a filter pattern. Use this to investigate errors or noisy logging."
            }
            InspectionTool::CostAndUsage => {
                "Retrieve AWS cost and usage data from Cost Explorer. Use this to analyze spending patterns."
            }
            InspectionTool::CostByService => {
                "Get cost breakdown by AWS service. Use this to identify which services cost the most."
            }
            InspectionTool::CostForecast => {
                "Get forecasted AWS costs for the next 3 months. Use this to predict future spending."
            }
            InspectionTool::CostTags => {
                "List the values of a cost allocation tag seen over the last 30 days. Use this to break spending down by tag."
            }
        }
    }

    /// Build the full catalog with every alias registered.
    pub fn spec() -> ToolSpec {
        Self::ALL.iter().fold(ToolSpec::new(), |spec, tool| {
            spec.register(tool.definition())
                .register_aliases(tool.aliases().iter().map(|a| (*a, tool.name())))
        })
    }
}

impl std::fmt::Display for InspectionTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

fn region_param() -> ToolParameter {
    ToolParameter::new(REGION_PARAM, "AWS region to query", false)
}

fn start_date_param() -> ToolParameter {
    ToolParameter::new("start_date", "Start date in YYYY-MM-DD format", false)
}

fn end_date_param() -> ToolParameter {
    ToolParameter::new("end_date", "End date in YYYY-MM-DD format", false)
}

fn log_group_param() -> ToolParameter {
    ToolParameter::new("log_group_name", "CloudWatch Logs group name", true)
}
