//! Per-service operation traits
//!
//! These traits abstract the AWS client wrappers so the provisioning
//! sequence can be driven against mocks in tests. "Create" and
//! "find-by-name" are separate primitives; the ensure steps compose them,
//! because the provider's AlreadyExists faults do not echo existing ids.

use crate::aws::error::Result;
use crate::types::{
    BucketCreation, DistributionHandle, DistributionSpec, PipelineSpec, PublicAccess, RecordAction,
    RecordSet, ValidationRecord,
};
use std::future::Future;

/// Bucket operations (origin and artifact buckets)
pub trait BucketOps: Send + Sync {
    /// Create a bucket, reporting whether it was created or already owned
    fn create_bucket(&self, name: &str) -> impl Future<Output = Result<BucketCreation>> + Send;

    /// Apply the public-access block posture
    fn apply_public_access(
        &self,
        name: &str,
        access: PublicAccess,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Enable static-website hosting
    fn apply_website_hosting(
        &self,
        name: &str,
        index_document: &str,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Attach a bucket policy document
    fn apply_bucket_policy(
        &self,
        name: &str,
        policy: &serde_json::Value,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Pipeline operations
pub trait PipelineOps: Send + Sync {
    /// Create the deploy pipeline
    fn create_pipeline(&self, spec: &PipelineSpec) -> impl Future<Output = Result<()>> + Send;
}

/// Hosted zone and record-set operations
pub trait DnsOps: Send + Sync {
    /// Create a hosted zone, returning its id
    fn create_hosted_zone(&self, domain: &str) -> impl Future<Output = Result<String>> + Send;

    /// Find an existing hosted zone by domain name
    fn find_hosted_zone(
        &self,
        domain: &str,
    ) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Apply a record-set change with an explicit action
    fn change_record_set(
        &self,
        zone_id: &str,
        action: RecordAction,
        record: &RecordSet,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Certificate operations
pub trait CertificateOps: Send + Sync {
    /// Request a DNS-validated certificate, returning its ARN
    fn request_certificate(
        &self,
        domain: &str,
        alternate_name: &str,
        idempotency_token: &str,
    ) -> impl Future<Output = Result<String>> + Send;

    /// Fetch the domain-validation record once the provider has produced it
    fn validation_record(
        &self,
        certificate_arn: &str,
    ) -> impl Future<Output = Result<Option<ValidationRecord>>> + Send;
}

/// Distribution, response-headers policy and origin-access operations
pub trait CdnOps: Send + Sync {
    fn create_response_headers_policy(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<String>> + Send;

    fn find_response_headers_policy(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<String>>> + Send;

    fn create_distribution(
        &self,
        spec: &DistributionSpec,
    ) -> impl Future<Output = Result<DistributionHandle>> + Send;

    fn find_distribution_by_alias(
        &self,
        alias: &str,
    ) -> impl Future<Output = Result<Option<DistributionHandle>>> + Send;

    fn create_origin_access_control(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<String>> + Send;

    fn find_origin_access_control(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Attach the origin-access control to every origin lacking one
    /// (read-modify-write with the fetched concurrency token)
    fn attach_origin_access(
        &self,
        distribution_id: &str,
        oac_id: &str,
    ) -> impl Future<Output = Result<()>> + Send;
}

// Real client implementations delegate to the inherent methods.

impl BucketOps for crate::aws::BucketClient {
    async fn create_bucket(&self, name: &str) -> Result<BucketCreation> {
        crate::aws::BucketClient::create_bucket(self, name).await
    }

    async fn apply_public_access(&self, name: &str, access: PublicAccess) -> Result<()> {
        crate::aws::BucketClient::apply_public_access(self, name, access).await
    }

    async fn apply_website_hosting(&self, name: &str, index_document: &str) -> Result<()> {
        crate::aws::BucketClient::apply_website_hosting(self, name, index_document).await
    }

    async fn apply_bucket_policy(&self, name: &str, policy: &serde_json::Value) -> Result<()> {
        crate::aws::BucketClient::apply_bucket_policy(self, name, policy).await
    }
}

impl PipelineOps for crate::aws::PipelineClient {
    async fn create_pipeline(&self, spec: &PipelineSpec) -> Result<()> {
        crate::aws::PipelineClient::create_pipeline(self, spec).await
    }
}

impl DnsOps for crate::aws::DnsClient {
    async fn create_hosted_zone(&self, domain: &str) -> Result<String> {
        crate::aws::DnsClient::create_hosted_zone(self, domain).await
    }

    async fn find_hosted_zone(&self, domain: &str) -> Result<Option<String>> {
        crate::aws::DnsClient::find_hosted_zone(self, domain).await
    }

    async fn change_record_set(
        &self,
        zone_id: &str,
        action: RecordAction,
        record: &RecordSet,
    ) -> Result<()> {
        crate::aws::DnsClient::change_record_set(self, zone_id, action, record).await
    }
}

impl CertificateOps for crate::aws::CertificateClient {
    async fn request_certificate(
        &self,
        domain: &str,
        alternate_name: &str,
        idempotency_token: &str,
    ) -> Result<String> {
        crate::aws::CertificateClient::request_certificate(
            self,
            domain,
            alternate_name,
            idempotency_token,
        )
        .await
    }

    async fn validation_record(&self, certificate_arn: &str) -> Result<Option<ValidationRecord>> {
        crate::aws::CertificateClient::validation_record(self, certificate_arn).await
    }
}

impl CdnOps for crate::aws::CdnClient {
    async fn create_response_headers_policy(&self, name: &str) -> Result<String> {
        crate::aws::CdnClient::create_response_headers_policy(self, name).await
    }

    async fn find_response_headers_policy(&self, name: &str) -> Result<Option<String>> {
        crate::aws::CdnClient::find_response_headers_policy(self, name).await
    }

    async fn create_distribution(&self, spec: &DistributionSpec) -> Result<DistributionHandle> {
        crate::aws::CdnClient::create_distribution(self, spec).await
    }

    async fn find_distribution_by_alias(&self, alias: &str) -> Result<Option<DistributionHandle>> {
        crate::aws::CdnClient::find_distribution_by_alias(self, alias).await
    }

    async fn create_origin_access_control(&self, name: &str) -> Result<String> {
        crate::aws::CdnClient::create_origin_access_control(self, name).await
    }

    async fn find_origin_access_control(&self, name: &str) -> Result<Option<String>> {
        crate::aws::CdnClient::find_origin_access_control(self, name).await
    }

    async fn attach_origin_access(&self, distribution_id: &str, oac_id: &str) -> Result<()> {
        crate::aws::CdnClient::attach_origin_access(self, distribution_id, oac_id).await
    }
}
