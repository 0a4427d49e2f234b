use thiserror::Error;

#[derive(Error, Debug)]
pub enum RestoreError {
    #[error("Invalid S3 URL '{url}': {reason}")]
    InvalidTarget { url: String, reason: String },

    #[error("Invalid timestamp '{0}': expected an ISO-8601 datetime such as 2026-02-20T10:30:00Z")]
    InvalidTimestamp(String),

    #[error("Bucket '{bucket}' versioning is not enabled (Status={status:?}).")]
    VersioningDisabled {
        bucket: String,
        status: Option<String>,
    },

    /// An entry in a key's history that cannot be placed in canonical order.
    #[error("Malformed version history for '{key}': {detail}")]
    MalformedHistory { key: String, detail: String },

    #[error("AWS SDK S3 error: {0}")]
    S3Sdk(String),

    #[error("Worker task failed: {0}")]
    Scheduler(String),

    #[error("Operation cancelled: {0}")]
    Cancelled(String),
}

impl<E> From<aws_sdk_s3::error::SdkError<E>> for RestoreError
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(err: aws_sdk_s3::error::SdkError<E>) -> Self {
        RestoreError::S3Sdk(aws_sdk_s3::error::DisplayErrorContext(&err).to_string())
    }
}

pub type Result<T> = std::result::Result<T, RestoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versioning_disabled_mentions_bucket_and_status() {
        let err = RestoreError::VersioningDisabled {
            bucket: "photos".to_string(),
            status: Some("Suspended".to_string()),
        };
        let msg = err.to_string();
        assert!(msg.contains("photos"));
        assert!(msg.contains("Suspended"));
    }

    #[test]
    fn test_malformed_history_mentions_key() {
        let err = RestoreError::MalformedHistory {
            key: "a/b.txt".to_string(),
            detail: "missing LastModified".to_string(),
        };
        assert!(err.to_string().contains("a/b.txt"));
    }
}
