//! Immutable run state threaded through the provisioning sequence
//!
//! Each phase consumes the current `RunState` and returns a new one with its
//! handles filled in and the stage advanced. Nothing is mutated in place and
//! nothing is shared between phases except what is recorded here.

use crate::types::{DistributionHandle, ValidationRecord};
use serde::Serialize;

/// Coarse progress of a provisioning run.
///
/// A failure at any stage halts forward progress but does not undo prior
/// stages; re-running converges through the create-or-reuse paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    NotStarted,
    BucketReady,
    PipelineReady,
    ZoneReady,
    CertificateRequested,
    CertificateValidationPending,
    DistributionReady,
    DnsRepointed,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::NotStarted => write!(f, "not_started"),
            Stage::BucketReady => write!(f, "bucket_ready"),
            Stage::PipelineReady => write!(f, "pipeline_ready"),
            Stage::ZoneReady => write!(f, "zone_ready"),
            Stage::CertificateRequested => write!(f, "certificate_requested"),
            Stage::CertificateValidationPending => write!(f, "certificate_validation_pending"),
            Stage::DistributionReady => write!(f, "distribution_ready"),
            Stage::DnsRepointed => write!(f, "dns_repointed"),
        }
    }
}

/// Handles accumulated over a run.
///
/// Every field is provider-owned; the lifetime of the underlying resources is
/// the external resource's lifetime, not this process's.
#[derive(Debug, Clone, Serialize)]
pub struct RunState {
    pub stage: Stage,
    pub bucket: Option<String>,
    pub artifact_bucket: Option<String>,
    pub pipeline: Option<String>,
    pub hosted_zone_id: Option<String>,
    pub certificate_arn: Option<String>,
    pub validation_record: Option<ValidationRecord>,
    pub distribution: Option<DistributionHandle>,
}

impl RunState {
    pub fn new() -> Self {
        Self {
            stage: Stage::NotStarted,
            bucket: None,
            artifact_bucket: None,
            pipeline: None,
            hosted_zone_id: None,
            certificate_arn: None,
            validation_record: None,
            distribution: None,
        }
    }

    pub fn advanced(mut self, stage: Stage) -> Self {
        self.stage = stage;
        self
    }

    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }

    pub fn with_artifact_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.artifact_bucket = Some(bucket.into());
        self
    }

    pub fn with_pipeline(mut self, name: impl Into<String>) -> Self {
        self.pipeline = Some(name.into());
        self
    }

    pub fn with_hosted_zone(mut self, zone_id: impl Into<String>) -> Self {
        self.hosted_zone_id = Some(zone_id.into());
        self
    }

    pub fn with_certificate(mut self, arn: impl Into<String>) -> Self {
        self.certificate_arn = Some(arn.into());
        self
    }

    pub fn with_validation_record(mut self, record: ValidationRecord) -> Self {
        self.validation_record = Some(record);
        self
    }

    pub fn with_distribution(mut self, handle: DistributionHandle) -> Self {
        self.distribution = Some(handle);
        self
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_are_ordered() {
        assert!(Stage::NotStarted < Stage::BucketReady);
        assert!(Stage::CertificateRequested < Stage::CertificateValidationPending);
        assert!(Stage::DistributionReady < Stage::DnsRepointed);
    }

    #[test]
    fn builders_accumulate_handles() {
        let state = RunState::new()
            .with_bucket("example.com")
            .advanced(Stage::BucketReady)
            .with_hosted_zone("Z123456")
            .advanced(Stage::ZoneReady);

        assert_eq!(state.stage, Stage::ZoneReady);
        assert_eq!(state.bucket.as_deref(), Some("example.com"));
        assert_eq!(state.hosted_zone_id.as_deref(), Some("Z123456"));
        assert!(state.certificate_arn.is_none());
    }

    #[test]
    fn stage_display() {
        assert_eq!(Stage::DnsRepointed.to_string(), "dns_repointed");
        assert_eq!(Stage::NotStarted.to_string(), "not_started");
    }
}
