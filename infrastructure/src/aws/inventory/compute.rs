//! EC2 instance and tag listings.

use super::iso;
use crate::aws::fault::remote_fault;
use aws_config::SdkConfig;
use aws_sdk_ec2::Client as Ec2Client;
use aws_sdk_ec2::types::{Instance, TagDescription};
use costpilot_application::{Page, PaginationMerger};
use costpilot_domain::RemoteFault;
use serde_json::{Map, Value, json};

pub(super) async fn list_instances(
    config: &SdkConfig,
    merger: &PaginationMerger,
) -> Result<Value, RemoteFault> {
    let client = Ec2Client::new(config);
    let first = describe_page(&client, None).await?;
    let instances = merger
        .drain(first, |token| describe_page(&client, Some(token)))
        .await?;
    Ok(Value::Array(instances))
}

async fn describe_page(
    client: &Ec2Client,
    token: Option<String>,
) -> Result<Page<Value>, RemoteFault> {
    let output = client
        .describe_instances()
        .set_next_token(token)
        .send()
        .await
        .map_err(|e| remote_fault("DescribeInstances", &e))?;

    let items = output
        .reservations()
        .iter()
        .flat_map(|reservation| reservation.instances())
        .map(instance_json)
        .collect();
    Ok(Page::new(items, output.next_token().map(str::to_string)))
}

pub(super) async fn list_tags(
    config: &SdkConfig,
    merger: &PaginationMerger,
) -> Result<Value, RemoteFault> {
    let client = Ec2Client::new(config);
    let first = tags_page(&client, None).await?;
    let tags = merger
        .drain(first, |token| tags_page(&client, Some(token)))
        .await?;
    Ok(Value::Array(tags))
}

async fn tags_page(client: &Ec2Client, token: Option<String>) -> Result<Page<Value>, RemoteFault> {
    let output = client
        .describe_tags()
        .set_next_token(token)
        .send()
        .await
        .map_err(|e| remote_fault("DescribeTags", &e))?;

    let items = output.tags().iter().map(tag_json).collect();
    Ok(Page::new(items, output.next_token().map(str::to_string)))
}

fn tag_json(tag: &TagDescription) -> Value {
    json!({
        "resource_id": tag.resource_id(),
        "resource_type": tag.resource_type().map(|t| t.as_str()),
        "key": tag.key(),
        "value": tag.value().unwrap_or_default(),
    })
}

fn instance_json(instance: &Instance) -> Value {
    let tags: Map<String, Value> = instance
        .tags()
        .iter()
        .filter_map(|tag| Some((tag.key()?.to_string(), json!(tag.value().unwrap_or_default()))))
        .collect();

    json!({
        "instance_id": instance.instance_id(),
        "instance_type": instance.instance_type().map(|t| t.as_str()),
        "state": instance.state().and_then(|s| s.name()).map(|n| n.as_str()),
        "launch_time": instance.launch_time().and_then(iso),
        "availability_zone": instance.placement().and_then(|p| p.availability_zone()),
        "private_ip": instance.private_ip_address(),
        "public_ip": instance.public_ip_address(),
        "vpc_id": instance.vpc_id(),
        "subnet_id": instance.subnet_id(),
        "tags": tags,
        "platform": instance.platform().map(|p| p.as_str()).unwrap_or("linux"),
        "monitoring": instance.monitoring().and_then(|m| m.state()).map(|s| s.as_str()),
    })
}
