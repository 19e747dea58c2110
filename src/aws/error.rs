//! Provisioning error classification and handling
//!
//! Provides typed errors for AWS SDK operations using the `.code()` method
//! from `ProvideErrorMetadata` instead of string matching on Debug format.
//! Each ensure operation maps only the conflict/not-found codes it knows how
//! to recover from; everything else propagates as [`ProvisionError::Provider`]
//! and halts the sequence.

use std::time::Duration;
use thiserror::Error;

// The trait and BuildError are shared across every aws-sdk crate; the s3
// re-export is as good as any.
use aws_sdk_s3::error::{BuildError, ProvideErrorMetadata};

/// Fault taxonomy for the provisioning sequence
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// The resource name is already taken. Recoverable when the existing
    /// resource can be adopted (same owner), fatal otherwise.
    #[error("{resource} '{name}' already exists")]
    NameConflict {
        resource: &'static str,
        name: String,
    },

    /// A referenced resource is absent
    #[error("{resource} '{id}' not found")]
    NotFound {
        resource: &'static str,
        id: String,
    },

    /// A read-modify-write was submitted with a stale concurrency token
    #[error("conflicting update to {resource}: {detail}")]
    Conflict {
        resource: &'static str,
        detail: String,
    },

    /// Polling exceeded its deadline
    #[error("timed out waiting for {waiting_for} after {waited:?}")]
    Timeout {
        waiting_for: String,
        waited: Duration,
    },

    /// Some of the bucket's post-create configuration failed to apply.
    /// What did apply stays applied; there is no rollback.
    #[error("bucket '{bucket}' configuration partially applied, failed: {}", failed.join(", "))]
    PartialBucketConfig {
        bucket: String,
        failed: Vec<String>,
    },

    /// A request could not be assembled (missing required field)
    #[error("invalid request: {0}")]
    Build(#[from] BuildError),

    /// Generic provider fault (throttling, auth, validation, ...)
    #[error("provider error during {operation}: {message}")]
    Provider {
        operation: &'static str,
        code: Option<String>,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, ProvisionError>;

impl ProvisionError {
    pub fn is_name_conflict(&self) -> bool {
        matches!(self, ProvisionError::NameConflict { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ProvisionError::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, ProvisionError::Conflict { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ProvisionError::Timeout { .. })
    }

    /// Generic provider fault with no usable error code.
    pub fn provider(operation: &'static str, message: impl Into<String>) -> Self {
        ProvisionError::Provider {
            operation,
            code: None,
            message: message.into(),
        }
    }
}

/// Known provider codes for "name already taken" conditions
const NAME_CONFLICT_CODES: &[&str] = &[
    "BucketAlreadyExists",
    "HostedZoneAlreadyExists",
    "PipelineNameInUseException",
    "ResponseHeadersPolicyAlreadyExists",
    "OriginAccessControlAlreadyExists",
    "DistributionAlreadyExists",
];

/// Known provider codes for "not found" conditions
const NOT_FOUND_CODES: &[&str] = &[
    "NoSuchBucket",
    "NoSuchHostedZone",
    "NoSuchDistribution",
    "NoSuchResponseHeadersPolicy",
    "NoSuchOriginAccessControl",
    "ResourceNotFoundException",
    "PipelineNotFoundException",
];

/// Known provider codes for stale-token / concurrent-update conditions
const CONFLICT_CODES: &[&str] = &["PreconditionFailed", "InvalidIfMatchVersion"];

/// Classify a provider fault from its error code.
///
/// `name` is the resource identifier the operation was addressing, used for
/// the conflict/not-found variants.
pub fn classify_code(
    operation: &'static str,
    resource: &'static str,
    name: &str,
    code: Option<&str>,
    message: Option<&str>,
) -> ProvisionError {
    let message = message.unwrap_or("unknown error").to_string();

    match code {
        Some(c) if NAME_CONFLICT_CODES.contains(&c) => ProvisionError::NameConflict {
            resource,
            name: name.to_string(),
        },
        Some(c) if NOT_FOUND_CODES.contains(&c) => ProvisionError::NotFound {
            resource,
            id: name.to_string(),
        },
        Some(c) if CONFLICT_CODES.contains(&c) => ProvisionError::Conflict {
            resource,
            detail: message,
        },
        _ => ProvisionError::Provider {
            operation,
            code: code.map(|c| c.to_string()),
            message,
        },
    }
}

/// Classify any AWS SDK error through its metadata.
pub fn classify_sdk<E>(
    operation: &'static str,
    resource: &'static str,
    name: &str,
    err: &E,
) -> ProvisionError
where
    E: ProvideErrorMetadata + std::fmt::Display,
{
    let meta = ProvideErrorMetadata::meta(err);
    let fallback = err.to_string();
    classify_code(
        operation,
        resource,
        name,
        meta.code(),
        meta.message().or(Some(fallback.as_str())),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_conflict_codes() {
        for code in NAME_CONFLICT_CODES {
            let err = classify_code("create", "resource", "web", Some(code), Some("taken"));
            assert!(err.is_name_conflict(), "expected NameConflict for {code}");
        }
    }

    #[test]
    fn not_found_codes() {
        for code in NOT_FOUND_CODES {
            let err = classify_code("describe", "resource", "web", Some(code), Some("gone"));
            assert!(err.is_not_found(), "expected NotFound for {code}");
        }
    }

    #[test]
    fn conflict_codes() {
        for code in CONFLICT_CODES {
            let err = classify_code("update", "distribution", "E123", Some(code), Some("stale"));
            assert!(err.is_conflict(), "expected Conflict for {code}");
        }
    }

    #[test]
    fn unknown_and_missing_codes_are_provider_faults() {
        let err = classify_code("create", "bucket", "web", Some("Throttling"), Some("slow down"));
        assert!(matches!(err, ProvisionError::Provider { code: Some(_), .. }));

        let err = classify_code("create", "bucket", "web", None, Some("boom"));
        assert!(matches!(err, ProvisionError::Provider { code: None, .. }));
    }

    #[test]
    fn display_messages() {
        let err = ProvisionError::NameConflict {
            resource: "s3 bucket",
            name: "example.com".to_string(),
        };
        assert_eq!(err.to_string(), "s3 bucket 'example.com' already exists");

        let err = ProvisionError::Timeout {
            waiting_for: "certificate validation record".to_string(),
            waited: Duration::from_secs(600),
        };
        assert!(err.to_string().contains("certificate validation record"));

        let err = ProvisionError::PartialBucketConfig {
            bucket: "example.com".to_string(),
            failed: vec!["website hosting".to_string(), "bucket policy".to_string()],
        };
        assert!(err.to_string().contains("website hosting, bucket policy"));
    }

    #[test]
    fn variant_checks() {
        assert!(
            ProvisionError::NotFound {
                resource: "certificate",
                id: "arn:x".to_string()
            }
            .is_not_found()
        );
        assert!(!ProvisionError::provider("create", "boom").is_not_found());
        assert!(
            ProvisionError::Timeout {
                waiting_for: "x".to_string(),
                waited: Duration::from_secs(1)
            }
            .is_timeout()
        );
    }
}
