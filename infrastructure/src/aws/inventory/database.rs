//! RDS instance and cluster listings.

use super::iso;
use crate::aws::fault::remote_fault;
use aws_config::SdkConfig;
use aws_sdk_rds::Client as RdsClient;
use aws_sdk_rds::types::{DbCluster, DbInstance};
use costpilot_application::{Page, PaginationMerger};
use costpilot_domain::RemoteFault;
use serde_json::{Value, json};

pub(super) async fn list_db_instances(
    config: &SdkConfig,
    merger: &PaginationMerger,
) -> Result<Value, RemoteFault> {
    let client = RdsClient::new(config);
    let first = describe_page(&client, None).await?;
    let instances = merger
        .drain(first, |marker| describe_page(&client, Some(marker)))
        .await?;
    Ok(Value::Array(instances))
}

async fn describe_page(
    client: &RdsClient,
    marker: Option<String>,
) -> Result<Page<Value>, RemoteFault> {
    let output = client
        .describe_db_instances()
        .set_marker(marker)
        .send()
        .await
        .map_err(|e| remote_fault("DescribeDBInstances", &e))?;

    let items = output.db_instances().iter().map(db_instance_json).collect();
    Ok(Page::new(items, output.marker().map(str::to_string)))
}

pub(super) async fn list_db_clusters(
    config: &SdkConfig,
    merger: &PaginationMerger,
) -> Result<Value, RemoteFault> {
    let client = RdsClient::new(config);
    let first = clusters_page(&client, None).await?;
    let clusters = merger
        .drain(first, |marker| clusters_page(&client, Some(marker)))
        .await?;
    Ok(Value::Array(clusters))
}

async fn clusters_page(
    client: &RdsClient,
    marker: Option<String>,
) -> Result<Page<Value>, RemoteFault> {
    let output = client
        .describe_db_clusters()
        .set_marker(marker)
        .send()
        .await
        .map_err(|e| remote_fault("DescribeDBClusters", &e))?;

    let items = output.db_clusters().iter().map(db_cluster_json).collect();
    Ok(Page::new(items, output.marker().map(str::to_string)))
}

fn db_instance_json(db: &DbInstance) -> Value {
    json!({
        "db_instance_identifier": db.db_instance_identifier(),
        "db_instance_class": db.db_instance_class(),
        "engine": db.engine(),
        "engine_version": db.engine_version(),
        "db_instance_status": db.db_instance_status(),
        "allocated_storage": db.allocated_storage(),
        "storage_type": db.storage_type(),
        "multi_az": db.multi_az().unwrap_or(false),
        "availability_zone": db.availability_zone(),
        "endpoint": db.endpoint().and_then(|e| e.address()),
        "port": db.endpoint().and_then(|e| e.port()),
        "instance_create_time": db.instance_create_time().and_then(iso),
        "backup_retention_period": db.backup_retention_period(),
        "vpc_id": db.db_subnet_group().and_then(|g| g.vpc_id()),
        "publicly_accessible": db.publicly_accessible().unwrap_or(false),
    })
}

fn db_cluster_json(cluster: &DbCluster) -> Value {
    let members: Vec<&str> = cluster
        .db_cluster_members()
        .iter()
        .filter_map(|m| m.db_instance_identifier())
        .collect();

    json!({
        "db_cluster_identifier": cluster.db_cluster_identifier(),
        "engine": cluster.engine(),
        "engine_version": cluster.engine_version(),
        "status": cluster.status(),
        "endpoint": cluster.endpoint(),
        "reader_endpoint": cluster.reader_endpoint(),
        "multi_az": cluster.multi_az().unwrap_or(false),
        "database_name": cluster.database_name(),
        "cluster_create_time": cluster.cluster_create_time().and_then(iso),
        "members": members,
        "allocated_storage": cluster.allocated_storage(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_rds::types::{DbClusterMember, DbSubnetGroup, Endpoint};

    #[test]
    fn db_instance_fields_are_flattened() {
        let db = DbInstance::builder()
            .db_instance_identifier("orders")
            .db_instance_class("db.r5.large")
            .engine("postgres")
            .engine_version("15.4")
            .db_instance_status("available")
            .allocated_storage(100)
            .storage_type("gp3")
            .multi_az(true)
            .endpoint(
                Endpoint::builder()
                    .address("orders.abc.us-east-1.rds.amazonaws.com")
                    .port(5432)
                    .build(),
            )
            .backup_retention_period(7)
            .db_subnet_group(DbSubnetGroup::builder().vpc_id("vpc-9").build())
            .build();

        let value = db_instance_json(&db);
        assert_eq!(value["db_instance_identifier"], "orders");
        assert_eq!(value["engine"], "postgres");
        assert_eq!(value["allocated_storage"], 100);
        assert_eq!(value["multi_az"], true);
        assert_eq!(value["endpoint"], "orders.abc.us-east-1.rds.amazonaws.com");
        assert_eq!(value["port"], 5432);
        assert_eq!(value["vpc_id"], "vpc-9");
        assert_eq!(value["publicly_accessible"], false);
        assert_eq!(value["instance_create_time"], Value::Null);
    }

    #[test]
    fn cluster_members_are_listed_by_identifier() {
        let cluster = DbCluster::builder()
            .db_cluster_identifier("orders-aurora")
            .engine("aurora-postgresql")
            .engine_version("15.4")
            .status("available")
            .endpoint("orders-aurora.cluster-abc.eu-west-1.rds.amazonaws.com")
            .reader_endpoint("orders-aurora.cluster-ro-abc.eu-west-1.rds.amazonaws.com")
            .cluster_create_time(aws_smithy_types::DateTime::from_secs(1_700_000_000))
            .db_cluster_members(
                DbClusterMember::builder()
                    .db_instance_identifier("orders-aurora-1")
                    .is_cluster_writer(true)
                    .build(),
            )
            .db_cluster_members(
                DbClusterMember::builder()
                    .db_instance_identifier("orders-aurora-2")
                    .build(),
            )
            .build();

        let value = db_cluster_json(&cluster);
        assert_eq!(value["db_cluster_identifier"], "orders-aurora");
        assert_eq!(value["engine"], "aurora-postgresql");
        assert_eq!(value["members"], json!(["orders-aurora-1", "orders-aurora-2"]));
        assert_eq!(value["cluster_create_time"], "2023-11-14T22:13:20+00:00");
        assert_eq!(value["multi_az"], false);
        assert_eq!(value["database_name"], Value::Null);
    }
}
