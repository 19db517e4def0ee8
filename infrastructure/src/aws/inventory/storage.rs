//! S3 bucket listing with per-bucket configuration lookups.
//!
//! Buckets are listed from the control-plane region, then each lookup is
//! sent to a client in the bucket's own region. A failed lookup degrades its
//! field to `"unknown"` (or `-1` for the lifecycle rule count) instead of
//! failing the listing.

use super::{CONTROL_PLANE_REGION, iso};
use crate::aws::fault::{error_code, remote_fault};
use crate::aws::session::scoped_config;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::types::Bucket;
use costpilot_application::ScopedCredentials;
use costpilot_domain::RemoteFault;
use serde_json::{Value, json};
use std::collections::HashMap;
use tracing::debug;

const UNKNOWN: &str = "unknown";
const NO_ENCRYPTION_CODE: &str = "ServerSideEncryptionConfigurationNotFoundError";
const NO_LIFECYCLE_CODE: &str = "NoSuchLifecycleConfiguration";

pub(super) async fn list_buckets(credentials: &ScopedCredentials) -> Result<Value, RemoteFault> {
    let control = S3Client::new(&scoped_config(credentials, CONTROL_PLANE_REGION));
    let output = control
        .list_buckets()
        .send()
        .await
        .map_err(|e| remote_fault("ListBuckets", &e))?;

    let mut regional: HashMap<String, S3Client> = HashMap::new();
    let mut buckets = Vec::with_capacity(output.buckets().len());

    for bucket in output.buckets() {
        let Some(name) = bucket.name() else { continue };
        let region = bucket_region(&control, name).await;

        let client = match region.as_deref() {
            Some(region) => &*regional
                .entry(region.to_string())
                .or_insert_with(|| S3Client::new(&scoped_config(credentials, region))),
            None => &control,
        };
        let settings = BucketSettings {
            region: region.clone().unwrap_or_else(|| UNKNOWN.to_string()),
            versioning: versioning(client, name).await,
            encryption: encryption(client, name).await,
            lifecycle_rules: lifecycle_rules(client, name).await,
        };
        buckets.push(bucket_json(bucket, settings));
    }

    Ok(Value::Array(buckets))
}

struct BucketSettings {
    region: String,
    versioning: String,
    encryption: &'static str,
    lifecycle_rules: i64,
}

fn bucket_json(bucket: &Bucket, settings: BucketSettings) -> Value {
    json!({
        "name": bucket.name(),
        "creation_date": bucket.creation_date().and_then(iso),
        "region": settings.region,
        "versioning": settings.versioning,
        "encryption": settings.encryption,
        "lifecycle_rules": settings.lifecycle_rules,
    })
}

/// An empty location constraint means `us-east-1`.
async fn bucket_region(client: &S3Client, bucket: &str) -> Option<String> {
    match client.get_bucket_location().bucket(bucket).send().await {
        Ok(output) => Some(location_region(
            output.location_constraint().map(|c| c.as_str()),
        )),
        Err(e) => {
            let fault = remote_fault("GetBucketLocation", &e);
            debug!("Region lookup failed for {}: {}", bucket, fault);
            None
        }
    }
}

fn location_region(constraint: Option<&str>) -> String {
    match constraint {
        Some(region) if !region.is_empty() => region.to_string(),
        _ => CONTROL_PLANE_REGION.to_string(),
    }
}

async fn versioning(client: &S3Client, bucket: &str) -> String {
    match client.get_bucket_versioning().bucket(bucket).send().await {
        Ok(output) => output
            .status()
            .map(|s| s.as_str().to_string())
            .unwrap_or_else(|| "Disabled".to_string()),
        Err(e) => {
            let fault = remote_fault("GetBucketVersioning", &e);
            debug!("Versioning lookup failed for {}: {}", bucket, fault);
            UNKNOWN.to_string()
        }
    }
}

async fn encryption(client: &S3Client, bucket: &str) -> &'static str {
    match client.get_bucket_encryption().bucket(bucket).send().await {
        Ok(_) => "Enabled",
        Err(e) => encryption_from_code(error_code(&e)),
    }
}

fn encryption_from_code(code: Option<&str>) -> &'static str {
    match code {
        Some(NO_ENCRYPTION_CODE) => "Disabled",
        _ => UNKNOWN,
    }
}

async fn lifecycle_rules(client: &S3Client, bucket: &str) -> i64 {
    match client
        .get_bucket_lifecycle_configuration()
        .bucket(bucket)
        .send()
        .await
    {
        Ok(output) => output.rules().len() as i64,
        Err(e) => lifecycle_from_code(error_code(&e)),
    }
}

fn lifecycle_from_code(code: Option<&str>) -> i64 {
    match code {
        Some(NO_LIFECYCLE_CODE) => 0,
        _ => -1,
    }
}
