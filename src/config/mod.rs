// s3-rewind/src/config/mod.rs
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::num::NonZeroUsize;
use std::path::Path;

use crate::target::{TargetSpec, parse_s3_url};
use crate::versions::{SelectionPolicy, parse_as_of_timestamp};

pub const DEFAULT_MAX_WORKERS: usize = 16;

// Structs for deserializing the JSON config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JsonS3StorageConfig {
    pub endpoint_url: Option<String>,
    pub region: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub force_path_style: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawJsonConfig {
    pub s3_storage: Option<JsonS3StorageConfig>,
    pub max_workers: Option<usize>,
}

impl RawJsonConfig {
    pub fn load_from_json(config_path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;
        serde_json::from_str(&config_content).with_context(|| {
            format!(
                "Failed to parse JSON from config file at {}",
                config_path.display()
            )
        })
    }
}

/// Values taken from the command line. They win over the config file.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub s3_url: String,
    pub versions: Option<usize>,
    pub as_of_timestamp: Option<String>,
    pub ignore_delete_markers: bool,
    pub target_bucket: Option<String>,
    pub target_region: Option<String>,
    pub max_workers: Option<usize>,
    pub endpoint_url: Option<String>,
    pub region: Option<String>,
    pub assume_yes: bool,
}

// Application's internal configuration structs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct S3Settings {
    pub endpoint_url: Option<String>,
    pub region: Option<String>,
    pub credentials: Option<StaticCredentials>,
    pub force_path_style: bool,
}

#[derive(Debug, Clone)]
pub struct RestoreConfig {
    pub target: TargetSpec,
    pub policy: SelectionPolicy,
    pub target_bucket: Option<String>,
    pub target_region: Option<String>,
    pub max_workers: NonZeroUsize,
    pub assume_yes: bool,
}

impl RestoreConfig {
    /// Where restored copies are written; the source bucket unless overridden.
    pub fn destination_bucket(&self) -> &str {
        self.target_bucket.as_deref().unwrap_or(&self.target.bucket)
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub s3: S3Settings,
    pub restore: RestoreConfig,
}

impl AppConfig {
    pub fn load(config_path: Option<&Path>, cli: &CliOverrides) -> Result<Self> {
        let raw = match config_path {
            Some(path) => RawJsonConfig::load_from_json(path)?,
            None => RawJsonConfig::default(),
        };
        Self::from_raw(&raw, cli)
    }

    pub fn from_raw(raw: &RawJsonConfig, cli: &CliOverrides) -> Result<Self> {
        Ok(AppConfig {
            s3: load_s3_settings(raw, cli)?,
            restore: load_restore_config(raw, cli)?,
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().map(|s| s.trim()).filter(|s| !s.is_empty()).map(str::to_string)
}

fn load_s3_settings(raw: &RawJsonConfig, cli: &CliOverrides) -> Result<S3Settings> {
    let storage = raw.s3_storage.clone().unwrap_or_default();

    let credentials = match (
        non_empty(&storage.access_key_id),
        non_empty(&storage.secret_access_key),
    ) {
        (Some(access_key_id), Some(secret_access_key)) => Some(StaticCredentials {
            access_key_id,
            secret_access_key,
        }),
        (None, None) => None,
        _ => anyhow::bail!(
            "s3_storage in the config file must set both access_key_id and secret_access_key, or neither."
        ),
    };

    Ok(S3Settings {
        endpoint_url: non_empty(&cli.endpoint_url).or_else(|| non_empty(&storage.endpoint_url)),
        region: non_empty(&cli.region).or_else(|| non_empty(&storage.region)),
        credentials,
        force_path_style: storage.force_path_style.unwrap_or(false),
    })
}

fn load_restore_config(raw: &RawJsonConfig, cli: &CliOverrides) -> Result<RestoreConfig> {
    let target = parse_s3_url(&cli.s3_url)?;

    let policy = match (cli.versions, &cli.as_of_timestamp) {
        (Some(_), Some(_)) => {
            anyhow::bail!("Use either --versions or --as-of-timestamp, not both.")
        }
        (_, Some(raw_timestamp)) => SelectionPolicy::as_of(
            parse_as_of_timestamp(raw_timestamp)?,
            cli.ignore_delete_markers,
        ),
        (Some(0), None) => anyhow::bail!("--versions must be at least 1."),
        (versions, None) => SelectionPolicy::by_depth(versions.unwrap_or(1), cli.ignore_delete_markers),
    };

    let requested_workers = cli.max_workers.or(raw.max_workers).unwrap_or(DEFAULT_MAX_WORKERS);
    let max_workers = NonZeroUsize::new(requested_workers)
        .context("max_workers must be at least 1")?;

    Ok(RestoreConfig {
        target,
        policy,
        target_bucket: non_empty(&cli.target_bucket),
        target_region: non_empty(&cli.target_region),
        max_workers,
        assume_yes: cli.assume_yes,
    })
}
