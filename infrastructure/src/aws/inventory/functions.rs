//! Lambda function listing and single-function configuration.

use super::non_blank;
use crate::aws::fault::remote_fault;
use aws_config::SdkConfig;
use aws_sdk_lambda::Client as LambdaClient;
use aws_sdk_lambda::types::{FunctionConfiguration, VpcConfigResponse};
use costpilot_application::{Page, PaginationMerger};
use costpilot_domain::RemoteFault;
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::HashMap;

/// Arguments of `get_lambda_function_config`.
#[derive(Debug, Deserialize)]
pub(super) struct ConfigArgs {
    function_name: String,
}

impl ConfigArgs {
    pub(super) fn into_function(self) -> Result<String, String> {
        non_blank("function_name", self.function_name)
    }
}

pub(super) async fn list_functions(
    config: &SdkConfig,
    merger: &PaginationMerger,
) -> Result<Value, RemoteFault> {
    let client = LambdaClient::new(config);
    let first = list_page(&client, None).await?;
    let functions = merger
        .drain(first, |marker| list_page(&client, Some(marker)))
        .await?;
    Ok(Value::Array(functions))
}

async fn list_page(
    client: &LambdaClient,
    marker: Option<String>,
) -> Result<Page<Value>, RemoteFault> {
    let output = client
        .list_functions()
        .set_marker(marker)
        .send()
        .await
        .map_err(|e| remote_fault("ListFunctions", &e))?;

    let items = output.functions().iter().map(function_json).collect();
    Ok(Page::new(items, output.next_marker().map(str::to_string)))
}

pub(super) async fn function_config(
    config: &SdkConfig,
    function_name: &str,
) -> Result<Value, RemoteFault> {
    let output = LambdaClient::new(config)
        .get_function_configuration()
        .function_name(function_name)
        .send()
        .await
        .map_err(|e| remote_fault("GetFunctionConfiguration", &e))?;

    let mut value = FunctionFields {
        function_name: output.function_name(),
        function_arn: output.function_arn(),
        runtime: output.runtime().map(|r| r.as_str()),
        handler: output.handler(),
        code_size: output.code_size(),
        description: output.description(),
        timeout: output.timeout(),
        memory_size: output.memory_size(),
        last_modified: output.last_modified(),
        version: output.version(),
        vpc_config: output.vpc_config(),
        variables: output.environment().and_then(|env| env.variables()),
        architectures: output.architectures().iter().map(|a| a.as_str()).collect(),
        package_type: output.package_type().map(|p| p.as_str()),
    }
    .to_json();

    if let Value::Object(map) = &mut value {
        map.insert("state".into(), json!(output.state().map(|s| s.as_str())));
        map.insert("role".into(), json!(output.role()));
        map.insert(
            "ephemeral_storage_mb".into(),
            json!(output.ephemeral_storage().map(|e| e.size())),
        );
    }
    Ok(value)
}

fn function_json(function: &FunctionConfiguration) -> Value {
    FunctionFields {
        function_name: function.function_name(),
        function_arn: function.function_arn(),
        runtime: function.runtime().map(|r| r.as_str()),
        handler: function.handler(),
        code_size: function.code_size(),
        description: function.description(),
        timeout: function.timeout(),
        memory_size: function.memory_size(),
        last_modified: function.last_modified(),
        version: function.version(),
        vpc_config: function.vpc_config(),
        variables: function.environment().and_then(|env| env.variables()),
        architectures: function.architectures().iter().map(|a| a.as_str()).collect(),
        package_type: function.package_type().map(|p| p.as_str()),
    }
    .to_json()
}

/// Fields shared by `ListFunctions` entries and `GetFunctionConfiguration`,
/// which the SDK models as distinct types.
struct FunctionFields<'a> {
    function_name: Option<&'a str>,
    function_arn: Option<&'a str>,
    runtime: Option<&'a str>,
    handler: Option<&'a str>,
    code_size: i64,
    description: Option<&'a str>,
    timeout: Option<i32>,
    memory_size: Option<i32>,
    last_modified: Option<&'a str>,
    version: Option<&'a str>,
    vpc_config: Option<&'a VpcConfigResponse>,
    variables: Option<&'a HashMap<String, String>>,
    architectures: Vec<&'a str>,
    package_type: Option<&'a str>,
}

impl FunctionFields<'_> {
    /// Environment variable values are never reported, only their names.
    fn to_json(&self) -> Value {
        let vpc_config = self.vpc_config.map(|vpc| {
            json!({
                "subnet_ids": vpc.subnet_ids(),
                "security_group_ids": vpc.security_group_ids(),
                "vpc_id": vpc.vpc_id(),
            })
        });

        let mut environment_vars: Vec<&str> = self
            .variables
            .map(|vars| vars.keys().map(String::as_str).collect())
            .unwrap_or_default();
        environment_vars.sort_unstable();

        json!({
            "function_name": self.function_name,
            "function_arn": self.function_arn,
            "runtime": self.runtime,
            "handler": self.handler,
            "code_size": self.code_size,
            "description": self.description.unwrap_or_default(),
            "timeout": self.timeout,
            "memory_size": self.memory_size,
            "last_modified": self.last_modified,
            "version": self.version,
            "vpc_config": vpc_config,
            "environment_vars": environment_vars,
            "architectures": self.architectures,
            "package_type": self.package_type,
        })
    }
}
