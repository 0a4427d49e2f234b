// s3-rewind/src/restore/logic.rs
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use super::copy::execute_copy_plan;
use super::plan::build_restore_plan;
use super::report::RunReport;
use crate::config::RestoreConfig;
use crate::errors::RestoreError;
use crate::prompt::{InsufficientChoice, Prompter};
use crate::store::ObjectStore;

const SAMPLE_KEY_LIMIT: usize = 5;

/// Orchestrates one restore run.
///
/// 1. Verifies versioning on the source bucket.
/// 2. Resolves the candidate keys and shows what is about to happen.
/// 3. Asks for confirmation.
/// 4. Makes sure a separate destination bucket exists.
/// 5. Builds the restore plan and settles keys without enough history.
/// 6. Copies the selected versions.
pub async fn perform_restore_orchestration(
    store: Arc<dyn ObjectStore>,
    prompter: &dyn Prompter,
    restore_config: &RestoreConfig,
) -> Result<RunReport> {
    let mut report = RunReport::default();
    let source_bucket = restore_config.target.bucket.as_str();
    let destination_bucket = restore_config.destination_bucket();

    check_versioning_enabled(store.as_ref(), source_bucket).await?;

    let keys = store
        .list_candidate_keys(&restore_config.target)
        .await
        .with_context(|| format!("Failed to list candidate keys in bucket {}", source_bucket))?;
    if keys.is_empty() {
        println!("No matching keys found. No changes made.");
        return Ok(report);
    }

    println!("Matched keys: {}", keys.len());
    println!("Destination bucket: {}", destination_bucket);
    println!("Selection mode: {}", restore_config.policy.describe());
    println!("Sample keys: {}", sample_keys(&keys, SAMPLE_KEY_LIMIT));
    if !prompter.confirm("Proceed with restore operations?")? {
        return Err(RestoreError::Cancelled("restore not confirmed".to_string()).into());
    }

    if let Some(target_bucket) = &restore_config.target_bucket {
        ensure_target_bucket(
            store.as_ref(),
            prompter,
            target_bucket,
            restore_config.target_region.as_deref(),
        )
        .await?;
    }

    let plan = build_restore_plan(
        Arc::clone(&store),
        source_bucket,
        keys,
        restore_config.policy,
        restore_config.max_workers,
    )
    .await
    .context("Failed to build restore plan")?;
    info!(
        candidates = plan.candidate_count(),
        ready = plan.ready.len(),
        insufficient = plan.insufficient_keys.len(),
        "restore plan built"
    );

    report.skipped += settle_insufficient_keys(prompter, &plan.insufficient_keys)?;

    report += execute_copy_plan(
        store,
        source_bucket,
        destination_bucket,
        &plan,
        restore_config.max_workers,
    )
    .await
    .context("Copy phase did not complete")?;

    info!(total = report.total(), "restore run finished");
    Ok(report)
}

async fn check_versioning_enabled(store: &dyn ObjectStore, bucket: &str) -> Result<()> {
    let status = store
        .versioning_status(bucket)
        .await
        .with_context(|| format!("Failed to read versioning status of bucket {}", bucket))?;
    if status.as_deref() != Some("Enabled") {
        return Err(RestoreError::VersioningDisabled {
            bucket: bucket.to_string(),
            status,
        }
        .into());
    }
    Ok(())
}

async fn ensure_target_bucket(
    store: &dyn ObjectStore,
    prompter: &dyn Prompter,
    target_bucket: &str,
    target_region: Option<&str>,
) -> Result<()> {
    if store.bucket_exists(target_bucket).await? {
        return Ok(());
    }

    let question = format!("Target bucket '{}' does not exist. Create it now?", target_bucket);
    if !prompter.confirm(&question)? {
        return Err(RestoreError::Cancelled(format!(
            "target bucket '{}' was not created",
            target_bucket
        ))
        .into());
    }
    store
        .create_bucket(target_bucket, target_region)
        .await
        .with_context(|| format!("Failed to create target bucket {}", target_bucket))?;
    println!("✅ Created target bucket {}", target_bucket);
    Ok(())
}

/// Asks what to do with each key lacking history. Returns how many were skipped.
fn settle_insufficient_keys(prompter: &dyn Prompter, insufficient_keys: &[String]) -> Result<usize> {
    let mut skip_all = false;
    let mut skipped = 0;

    for key in insufficient_keys {
        if !skip_all {
            match prompter.insufficient_choice(key)? {
                InsufficientChoice::SkipThis => {}
                InsufficientChoice::SkipAll => skip_all = true,
                InsufficientChoice::Abort => {
                    return Err(RestoreError::Cancelled(format!(
                        "aborted on '{}': insufficient historical versions",
                        key
                    ))
                    .into());
                }
            }
        }
        println!("Skipping '{}': insufficient historical versions.", key);
        skipped += 1;
    }
    Ok(skipped)
}

fn sample_keys(keys: &[String], limit: usize) -> String {
    if keys.is_empty() {
        return "(none)".to_string();
    }
    let mut sample: Vec<&str> = keys.iter().take(limit).map(String::as_str).collect();
    if keys.len() > limit {
        sample.push("...");
    }
    sample.join(", ")
}
