//! ECS cluster and task listings.
//!
//! Both are list-then-describe: ARNs are paged in, then described in
//! batches of at most [`DESCRIBE_BATCH`].

use super::{iso, non_blank};
use crate::aws::fault::remote_fault;
use aws_config::SdkConfig;
use aws_sdk_ecs::Client as EcsClient;
use aws_sdk_ecs::types::{Cluster, Task};
use costpilot_application::{Page, PaginationMerger};
use costpilot_domain::RemoteFault;
use serde::Deserialize;
use serde_json::{Value, json};

/// Largest ARN list `DescribeClusters` and `DescribeTasks` accept.
const DESCRIBE_BATCH: usize = 100;

/// Arguments of `get_ecs_tasks`.
#[derive(Debug, Deserialize)]
pub(super) struct TaskArgs {
    cluster_name: String,
}

impl TaskArgs {
    pub(super) fn into_cluster(self) -> Result<String, String> {
        non_blank("cluster_name", self.cluster_name)
    }
}

pub(super) async fn list_clusters(
    config: &SdkConfig,
    merger: &PaginationMerger,
) -> Result<Value, RemoteFault> {
    let client = EcsClient::new(config);
    let first = cluster_arns_page(&client, None).await?;
    let arns = merger
        .drain(first, |token| cluster_arns_page(&client, Some(token)))
        .await?;

    let mut clusters = Vec::with_capacity(arns.len());
    for batch in arns.chunks(DESCRIBE_BATCH) {
        let output = client
            .describe_clusters()
            .set_clusters(Some(batch.to_vec()))
            .send()
            .await
            .map_err(|e| remote_fault("DescribeClusters", &e))?;
        clusters.extend(output.clusters().iter().map(cluster_json));
    }
    Ok(Value::Array(clusters))
}

async fn cluster_arns_page(
    client: &EcsClient,
    token: Option<String>,
) -> Result<Page<String>, RemoteFault> {
    let output = client
        .list_clusters()
        .set_next_token(token)
        .send()
        .await
        .map_err(|e| remote_fault("ListClusters", &e))?;
    Ok(Page::new(
        output.cluster_arns().to_vec(),
        output.next_token().map(str::to_string),
    ))
}

pub(super) async fn list_tasks(
    config: &SdkConfig,
    merger: &PaginationMerger,
    cluster: &str,
) -> Result<Value, RemoteFault> {
    let client = EcsClient::new(config);
    let first = task_arns_page(&client, cluster, None).await?;
    let arns = merger
        .drain(first, |token| task_arns_page(&client, cluster, Some(token)))
        .await?;

    let mut tasks = Vec::with_capacity(arns.len());
    for batch in arns.chunks(DESCRIBE_BATCH) {
        let output = client
            .describe_tasks()
            .cluster(cluster)
            .set_tasks(Some(batch.to_vec()))
            .send()
            .await
            .map_err(|e| remote_fault("DescribeTasks", &e))?;
        tasks.extend(output.tasks().iter().map(task_json));
    }
    Ok(Value::Array(tasks))
}

async fn task_arns_page(
    client: &EcsClient,
    cluster: &str,
    token: Option<String>,
) -> Result<Page<String>, RemoteFault> {
    let output = client
        .list_tasks()
        .cluster(cluster)
        .set_next_token(token)
        .send()
        .await
        .map_err(|e| remote_fault("ListTasks", &e))?;
    Ok(Page::new(
        output.task_arns().to_vec(),
        output.next_token().map(str::to_string),
    ))
}

fn cluster_json(cluster: &Cluster) -> Value {
    json!({
        "cluster_name": cluster.cluster_name(),
        "cluster_arn": cluster.cluster_arn(),
        "status": cluster.status(),
        "registered_container_instances_count": cluster.registered_container_instances_count(),
        "running_tasks_count": cluster.running_tasks_count(),
        "pending_tasks_count": cluster.pending_tasks_count(),
        "active_services_count": cluster.active_services_count(),
    })
}

/// `cpu` and `memory` are the task-level strings ECS reports (units and vCPU).
fn task_json(task: &Task) -> Value {
    json!({
        "task_arn": task.task_arn(),
        "task_definition_arn": task.task_definition_arn(),
        "cluster_arn": task.cluster_arn(),
        "last_status": task.last_status(),
        "desired_status": task.desired_status(),
        "cpu": task.cpu(),
        "memory": task.memory(),
        "created_at": task.created_at().and_then(iso),
        "started_at": task.started_at().and_then(iso),
        "launch_type": task.launch_type().map(|l| l.as_str()),
    })
}
