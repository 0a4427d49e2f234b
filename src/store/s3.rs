// s3-rewind/src/store/s3.rs
use async_trait::async_trait;
use aws_sdk_s3 as s3;
use chrono::{DateTime, TimeZone, Utc};
use s3::config::Region;
use s3::operation::head_bucket::HeadBucketError;
use s3::operation::list_object_versions::ListObjectVersionsOutput;
use s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use tracing::debug;
use url::form_urlencoded;

use super::ObjectStore;
use crate::config::S3Settings;
use crate::errors::Result;
use crate::target::{TargetMode, TargetSpec};
use crate::versions::VersionEntry;

const DEFAULT_REGION: &str = "us-east-1";

/// [`ObjectStore`] backed by the AWS SDK (or any S3-compatible endpoint).
pub struct S3Store {
    client: s3::Client,
    region: Option<String>,
}

impl S3Store {
    /// Builds a client from the default AWS config chain, overridden by
    /// whatever endpoint, region and static credentials are configured.
    pub async fn connect(settings: &S3Settings) -> Self {
        let mut loader = aws_config::defaults(s3::config::BehaviorVersion::latest());
        if let Some(endpoint) = &settings.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        if let Some(region) = &settings.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(credentials) = &settings.credentials {
            loader = loader.credentials_provider(s3::config::Credentials::new(
                &credentials.access_key_id,
                &credentials.secret_access_key,
                None,     // session_token
                None,     // expiry
                "Static", // provider_name
            ));
        }
        let sdk_config = loader.load().await;
        let region = sdk_config.region().map(|r| r.to_string());

        let s3_config = s3::config::Builder::from(&sdk_config)
            .force_path_style(settings.force_path_style)
            .build();

        S3Store {
            client: s3::Client::from_conf(s3_config),
            region,
        }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn versioning_status(&self, bucket: &str) -> Result<Option<String>> {
        let output = self.client.get_bucket_versioning().bucket(bucket).send().await?;
        Ok(output.status().map(|status| status.as_str().to_string()))
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(err) => {
                let status = err.raw_response().map(|response| response.status().as_u16());
                if head_bucket_not_found(err.as_service_error(), status) {
                    Ok(false)
                } else {
                    Err(err.into())
                }
            }
        }
    }

    async fn create_bucket(&self, bucket: &str, region: Option<&str>) -> Result<()> {
        let region = region
            .map(str::to_string)
            .or_else(|| self.region.clone())
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        let mut request = self.client.create_bucket().bucket(bucket);
        // us-east-1 rejects an explicit location constraint.
        if region != DEFAULT_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region.as_str()))
                    .build(),
            );
        }
        request.send().await?;
        debug!(bucket, region = %region, "bucket created");
        Ok(())
    }

    async fn list_candidate_keys(&self, target: &TargetSpec) -> Result<Vec<String>> {
        if target.mode == TargetMode::Exact {
            return Ok(target.key.iter().cloned().collect());
        }

        let mut keys = Vec::new();
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(&target.bucket)
            .prefix(target.listing_prefix())
            .into_paginator()
            .send();
        while let Some(page) = pages.next().await {
            let page = page?;
            for object in page.contents() {
                if let Some(key) = object.key().filter(|k| !k.is_empty()) {
                    keys.push(key.to_string());
                }
            }
        }
        Ok(keys)
    }

    async fn list_object_versions(&self, bucket: &str, key: &str) -> Result<Vec<VersionEntry>> {
        let mut entries = Vec::new();
        let mut key_marker: Option<String> = None;
        let mut version_id_marker: Option<String> = None;

        loop {
            let page = self
                .client
                .list_object_versions()
                .bucket(bucket)
                .prefix(key)
                .set_key_marker(key_marker.take())
                .set_version_id_marker(version_id_marker.take())
                .send()
                .await?;

            entries.extend(history_from_page(&page, key)?);

            match next_markers(&page) {
                Some((next_key, next_version_id)) => {
                    key_marker = next_key;
                    version_id_marker = next_version_id;
                }
                None => break,
            }
        }

        debug!(bucket, key, versions = entries.len(), "fetched version history");
        Ok(entries)
    }

    async fn copy_version(
        &self,
        source_bucket: &str,
        key: &str,
        version_id: &str,
        destination_bucket: &str,
    ) -> Result<()> {
        self.client
            .copy_object()
            .bucket(destination_bucket)
            .key(key)
            .copy_source(copy_source(source_bucket, key, version_id))
            .send()
            .await?;
        Ok(())
    }
}

/// HeadBucket answers a missing bucket with a bare 404 on some endpoints,
/// so the status code counts as well as the modeled error.
fn head_bucket_not_found(service_error: Option<&HeadBucketError>, status: Option<u16>) -> bool {
    service_error.map(HeadBucketError::is_not_found).unwrap_or(false) || status == Some(404)
}

/// Turns one ListObjectVersions page into history entries for `key`.
///
/// `Prefix=key` also returns siblings such as `key.bak`; those are dropped.
/// Entries without a version id are skipped, entries without a timestamp
/// are refused.
fn history_from_page(page: &ListObjectVersionsOutput, key: &str) -> Result<Vec<VersionEntry>> {
    let mut entries = Vec::new();
    for item in page.versions() {
        if item.key() != Some(key) {
            continue;
        }
        let Some(version_id) = item.version_id() else {
            continue;
        };
        entries.push(VersionEntry::from_listing(
            key,
            version_id,
            item.last_modified().and_then(to_utc),
            false,
            item.is_latest().unwrap_or(false),
        )?);
    }
    for item in page.delete_markers() {
        if item.key() != Some(key) {
            continue;
        }
        let Some(version_id) = item.version_id() else {
            continue;
        };
        entries.push(VersionEntry::from_listing(
            key,
            version_id,
            item.last_modified().and_then(to_utc),
            true,
            item.is_latest().unwrap_or(false),
        )?);
    }
    Ok(entries)
}

/// Markers for the following page, or `None` once the listing is complete.
fn next_markers(page: &ListObjectVersionsOutput) -> Option<(Option<String>, Option<String>)> {
    if !page.is_truncated().unwrap_or(false) {
        return None;
    }
    let key_marker = page.next_key_marker().map(str::to_string);
    let version_id_marker = page.next_version_id_marker().map(str::to_string);
    if key_marker.is_none() && version_id_marker.is_none() {
        return None;
    }
    Some((key_marker, version_id_marker))
}

fn to_utc(timestamp: &s3::primitives::DateTime) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(timestamp.secs(), timestamp.subsec_nanos()).single()
}

/// `bucket/<url-encoded key>?versionId=<id>`, as CopyObject expects.
///
/// The key is encoded segment by segment and never normalised: `.` and `..`
/// are legal key segments and must reach S3 untouched.
fn copy_source(bucket: &str, key: &str, version_id: &str) -> String {
    let encoded_key = key.split('/').map(encode_segment).collect::<Vec<_>>().join("/");
    let version: String = form_urlencoded::byte_serialize(version_id.as_bytes()).collect();
    format!("{}/{}?versionId={}", bucket, encoded_key, version)
}

/// Percent-encodes everything but `A-Z a-z 0-9 * - . _`. The form encoder
/// writes a space as `+`; a literal `+` always comes out as `%2B`, so the
/// swap back to `%20` is unambiguous.
fn encode_segment(segment: &str) -> String {
    form_urlencoded::byte_serialize(segment.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}
