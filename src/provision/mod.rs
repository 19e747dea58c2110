//! The provisioning sequence
//!
//! `Provisioner` runs the seven phases in fixed order, threading an
//! immutable [`RunState`] through each one. Every phase is safe to re-run:
//! create calls that hit an existing resource recover the existing handle
//! through the matching find primitive, or adopt it outright where the
//! provider confirms ownership.
//!
//! No phase retries, and no phase rolls back what an earlier phase applied;
//! a failure halts the sequence and the operator re-runs to converge.

pub mod ops;

use crate::aws::error::{ProvisionError, Result};
use crate::aws::{
    AwsContext, BucketClient, CdnClient, CertificateClient, DnsClient, PipelineClient, policy,
};
use crate::config::{SiteConfig, s3_website_endpoint, s3_website_zone_id};
use crate::state::{RunState, Stage};
use crate::types::{
    AliasTarget, CLOUDFRONT_ALIAS_ZONE_ID, DistributionSpec, PipelineSpec, PublicAccess,
    RecordAction, RecordSet,
};
use crate::wait::{WaitConfig, wait_for_value};
use ops::{BucketOps, CdnOps, CertificateOps, DnsOps, PipelineOps};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// The service clients a run drives, bundled to keep signatures short.
pub struct Services<B, P, D, C, N> {
    pub buckets: B,
    pub pipelines: P,
    pub dns: D,
    pub certificates: C,
    pub cdn: N,
}

/// The real client set, built from one shared context.
pub type AwsServices =
    Services<BucketClient, PipelineClient, DnsClient, CertificateClient, CdnClient>;

impl AwsServices {
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            buckets: BucketClient::from_context(ctx),
            pipelines: PipelineClient::from_context(ctx),
            dns: DnsClient::from_context(ctx),
            certificates: CertificateClient::from_context(ctx),
            cdn: CdnClient::from_context(ctx),
        }
    }
}

/// Runs the provisioning sequence against a set of service operations.
pub struct Provisioner<B, P, D, C, N> {
    services: Services<B, P, D, C, N>,
    config: SiteConfig,
    wait: WaitConfig,
}

impl<B, P, D, C, N> Provisioner<B, P, D, C, N>
where
    B: BucketOps,
    P: PipelineOps,
    D: DnsOps,
    C: CertificateOps,
    N: CdnOps,
{
    pub fn new(services: Services<B, P, D, C, N>, config: SiteConfig) -> Self {
        let wait = WaitConfig {
            timeout: config.certificate_wait,
            ..WaitConfig::default()
        };
        Self {
            services,
            config,
            wait,
        }
    }

    /// Override the certificate-poll wait configuration.
    pub fn with_wait_config(mut self, wait: WaitConfig) -> Self {
        self.wait = wait;
        self
    }

    /// Run the full sequence.
    ///
    /// The optional token cancels the certificate-validation poll; the
    /// underlying certificate continues provisioning provider-side
    /// regardless.
    pub async fn run(&self, cancel: Option<&CancellationToken>) -> Result<RunState> {
        let state = RunState::new();
        let state = self.ensure_bucket(state).await?;
        let state = self.ensure_pipeline(state).await?;
        let state = self.ensure_hosted_zone(state).await?;
        let state = self.ensure_certificate(state, cancel).await?;
        let state = self.create_validation_record(state).await?;
        let state = self.ensure_distribution(state).await?;
        let state = self.repoint_alias(state).await?;

        info!(
            domain = %self.config.site.domain,
            stage = %state.stage,
            "Provisioning sequence complete"
        );
        Ok(state)
    }

    /// Phase 1: origin bucket with website hosting and public reads.
    ///
    /// The three post-create operations are independent: a failure in one
    /// does not roll back the others. What failed is surfaced as
    /// [`ProvisionError::PartialBucketConfig`].
    async fn ensure_bucket(&self, state: RunState) -> Result<RunState> {
        let bucket = &self.config.site.bucket;
        info!(bucket = %bucket, "[1/7] Ensuring origin bucket");

        self.services.buckets.create_bucket(bucket).await?;

        let mut failed = Vec::new();

        if let Err(e) = self
            .services
            .buckets
            .apply_public_access(bucket, PublicAccess::Open)
            .await
        {
            warn!(bucket = %bucket, error = %e, "Failed to apply public access configuration");
            failed.push("public access block".to_string());
        }

        if let Err(e) = self
            .services
            .buckets
            .apply_website_hosting(bucket, &self.config.site.index_document)
            .await
        {
            warn!(bucket = %bucket, error = %e, "Failed to enable website hosting");
            failed.push("website hosting".to_string());
        }

        if let Err(e) = self
            .services
            .buckets
            .apply_bucket_policy(bucket, &policy::public_read(bucket))
            .await
        {
            warn!(bucket = %bucket, error = %e, "Failed to apply bucket policy");
            failed.push("bucket policy".to_string());
        }

        if !failed.is_empty() {
            return Err(ProvisionError::PartialBucketConfig {
                bucket: bucket.clone(),
                failed,
            });
        }

        Ok(state.with_bucket(bucket).advanced(Stage::BucketReady))
    }

    /// Phase 2: artifact bucket and the deploy pipeline.
    async fn ensure_pipeline(&self, state: RunState) -> Result<RunState> {
        let settings = &self.config.pipeline;
        info!(pipeline = %settings.name, "[2/7] Ensuring deploy pipeline");

        self.services
            .buckets
            .create_bucket(&settings.artifact_bucket)
            .await?;
        self.services
            .buckets
            .apply_bucket_policy(
                &settings.artifact_bucket,
                &policy::artifact_store(&settings.artifact_bucket),
            )
            .await?;

        let spec = PipelineSpec {
            name: settings.name.clone(),
            role_arn: settings.role_arn.clone(),
            source: settings.source.clone(),
            deploy_bucket: self.config.site.bucket.clone(),
            artifact_bucket: settings.artifact_bucket.clone(),
            region: self.config.aws.region.clone(),
        };

        match self.services.pipelines.create_pipeline(&spec).await {
            Ok(()) => {}
            Err(e) if e.is_name_conflict() => {
                info!(pipeline = %spec.name, "Pipeline already exists, reusing");
            }
            Err(e) => return Err(e),
        }

        Ok(state
            .with_artifact_bucket(&settings.artifact_bucket)
            .with_pipeline(&settings.name)
            .advanced(Stage::PipelineReady))
    }

    /// Phase 3: hosted zone plus the apex alias at the S3 website endpoint.
    async fn ensure_hosted_zone(&self, state: RunState) -> Result<RunState> {
        let domain = &self.config.site.domain;
        let region = &self.config.aws.region;
        info!(domain = %domain, "[3/7] Ensuring hosted zone");

        let zone_id = match self.services.dns.create_hosted_zone(domain).await {
            Ok(zone_id) => zone_id,
            Err(e) if e.is_name_conflict() => {
                match self.services.dns.find_hosted_zone(domain).await? {
                    Some(zone_id) => {
                        info!(zone_id = %zone_id, "Hosted zone already exists, reusing");
                        zone_id
                    }
                    None => return Err(e),
                }
            }
            Err(e) => return Err(e),
        };

        let endpoint = s3_website_endpoint(region).ok_or_else(|| {
            ProvisionError::provider(
                "resolve website endpoint",
                format!("region '{region}' has no S3 website endpoint"),
            )
        })?;
        let endpoint_zone = s3_website_zone_id(region).ok_or_else(|| {
            ProvisionError::provider(
                "resolve website endpoint",
                format!("region '{region}' has no S3 website hosted zone"),
            )
        })?;

        let record = RecordSet::AliasA {
            name: domain.clone(),
            target: AliasTarget {
                hosted_zone_id: endpoint_zone.to_string(),
                dns_name: endpoint.to_string(),
            },
        };
        self.services
            .dns
            .change_record_set(&zone_id, RecordAction::Upsert, &record)
            .await?;

        Ok(state.with_hosted_zone(zone_id).advanced(Stage::ZoneReady))
    }

    /// Phase 4: certificate request and the validation-record poll.
    async fn ensure_certificate(
        &self,
        state: RunState,
        cancel: Option<&CancellationToken>,
    ) -> Result<RunState> {
        let site = &self.config.site;
        info!(domain = %site.domain, "[4/7] Ensuring certificate");

        let arn = self
            .services
            .certificates
            .request_certificate(
                &site.domain,
                &site.alternate_domain,
                &self.config.certificate_idempotency_token(),
            )
            .await?;
        let state = state.with_certificate(&arn).advanced(Stage::CertificateRequested);

        let certificates = &self.services.certificates;
        let record = wait_for_value(
            self.wait.clone(),
            cancel,
            || certificates.validation_record(&arn),
            "certificate validation record",
        )
        .await?;

        info!(record = %record.name, "Validation record available");
        Ok(state.with_validation_record(record))
    }

    /// Phase 5: publish the validation CNAME in the hosted zone.
    async fn create_validation_record(&self, state: RunState) -> Result<RunState> {
        info!("[5/7] Publishing certificate validation record");

        let zone_id = state.hosted_zone_id.clone().ok_or_else(|| {
            ProvisionError::provider("publish validation record", "no hosted zone id in run state")
        })?;
        let validation = state.validation_record.clone().ok_or_else(|| {
            ProvisionError::provider("publish validation record", "no validation record in run state")
        })?;

        let record = RecordSet::Cname {
            name: validation.name,
            value: validation.value,
            ttl: 300,
        };
        self.services
            .dns
            .change_record_set(&zone_id, RecordAction::Upsert, &record)
            .await?;

        Ok(state.advanced(Stage::CertificateValidationPending))
    }

    /// Phase 6: distribution, bucket lock-down, and origin-access attach.
    async fn ensure_distribution(&self, state: RunState) -> Result<RunState> {
        let config = &self.config;
        info!(domain = %config.site.domain, "[6/7] Ensuring distribution");

        let header_name = &config.cdn.header_policy_name;
        let header_policy_id = match self
            .services
            .cdn
            .create_response_headers_policy(header_name)
            .await
        {
            Ok(id) => id,
            Err(e) if e.is_name_conflict() => {
                match self.services.cdn.find_response_headers_policy(header_name).await? {
                    Some(id) => {
                        info!(policy = %header_name, id = %id, "Response headers policy already exists, reusing");
                        id
                    }
                    None => return Err(e),
                }
            }
            Err(e) => return Err(e),
        };

        let certificate_arn = state.certificate_arn.clone().ok_or_else(|| {
            ProvisionError::provider("create distribution", "no certificate ARN in run state")
        })?;
        let spec = DistributionSpec {
            aliases: config.aliases(),
            default_root_object: config.site.index_document.clone(),
            origin_domain: config.origin_domain(),
            cache_policy_id: config.cdn.cache_policy_id.clone(),
            response_headers_policy_id: header_policy_id,
            certificate_arn,
            comment: config.cdn.comment.clone(),
        };

        let handle = match self.services.cdn.create_distribution(&spec).await {
            Ok(handle) => handle,
            Err(e) if e.is_name_conflict() => {
                match self
                    .services
                    .cdn
                    .find_distribution_by_alias(&config.site.domain)
                    .await?
                {
                    Some(handle) => {
                        info!(id = %handle.id, "Distribution already exists, reusing");
                        handle
                    }
                    None => return Err(e),
                }
            }
            Err(e) => return Err(e),
        };

        // Replace public reads with distribution-scoped reads now that the
        // distribution ARN is known.
        let bucket = &config.site.bucket;
        self.services
            .buckets
            .apply_bucket_policy(bucket, &policy::cloudfront_read(bucket, &handle.arn))
            .await?;
        self.services
            .buckets
            .apply_public_access(bucket, PublicAccess::Locked)
            .await?;

        let oac_name = &config.cdn.origin_access_name;
        let oac_id = match self.services.cdn.create_origin_access_control(oac_name).await {
            Ok(id) => id,
            Err(e) if e.is_name_conflict() => {
                match self.services.cdn.find_origin_access_control(oac_name).await? {
                    Some(id) => {
                        info!(oac = %oac_name, id = %id, "Origin access control already exists, reusing");
                        id
                    }
                    None => return Err(e),
                }
            }
            Err(e) => return Err(e),
        };

        self.services
            .cdn
            .attach_origin_access(&handle.id, &oac_id)
            .await?;

        Ok(state.with_distribution(handle).advanced(Stage::DistributionReady))
    }

    /// Phase 7: repoint the apex alias from the bucket endpoint to the
    /// distribution.
    async fn repoint_alias(&self, state: RunState) -> Result<RunState> {
        let domain = &self.config.site.domain;
        info!(domain = %domain, "[7/7] Repointing alias at the distribution");

        let zone_id = state.hosted_zone_id.clone().ok_or_else(|| {
            ProvisionError::provider("repoint alias", "no hosted zone id in run state")
        })?;
        let distribution = state.distribution.clone().ok_or_else(|| {
            ProvisionError::provider("repoint alias", "no distribution in run state")
        })?;

        let record = RecordSet::AliasA {
            name: domain.clone(),
            target: AliasTarget {
                hosted_zone_id: CLOUDFRONT_ALIAS_ZONE_ID.to_string(),
                dns_name: distribution.domain.clone(),
            },
        };
        self.services
            .dns
            .change_record_set(&zone_id, RecordAction::Upsert, &record)
            .await?;

        Ok(state.advanced(Stage::DnsRepointed))
    }
}
