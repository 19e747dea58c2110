//! S3 bucket management

use crate::aws::context::AwsContext;
use crate::aws::error::{ProvisionError, Result, classify_sdk};
use crate::types::{BucketCreation, PublicAccess};
use aws_sdk_s3::Client;
use aws_sdk_s3::types::{
    BucketLocationConstraint, CreateBucketConfiguration, IndexDocument,
    PublicAccessBlockConfiguration, WebsiteConfiguration,
};
use tracing::{debug, info};

/// S3 client for the origin and artifact buckets
pub struct BucketClient {
    client: Client,
    region: String,
}

impl BucketClient {
    /// Create a new bucket client
    pub async fn new(region: &str) -> Result<Self> {
        let ctx = AwsContext::new(region).await;
        Ok(Self::from_context(&ctx))
    }

    /// Create a bucket client from a pre-loaded AWS context
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.s3_client(),
            region: ctx.region().to_string(),
        }
    }

    /// Create a bucket, treating "already owned by you" as success.
    ///
    /// A name held by another account is a fatal [`ProvisionError::NameConflict`]:
    /// bucket names are global and there is nothing to reuse.
    pub async fn create_bucket(&self, name: &str) -> Result<BucketCreation> {
        info!(bucket = %name, region = %self.region, "Creating S3 bucket");

        let mut request = self.client.create_bucket().bucket(name);
        // us-east-1 is the default location and rejects an explicit constraint
        if self.region != "us-east-1" {
            let constraint = BucketLocationConstraint::from(self.region.as_str());
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(constraint)
                    .build(),
            );
        }

        match request.send().await {
            Ok(_) => Ok(BucketCreation::Created),
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_bucket_already_owned_by_you() {
                    info!(bucket = %name, "Bucket already owned by this account, reusing");
                    Ok(BucketCreation::AlreadyOwned)
                } else if service_error.is_bucket_already_exists() {
                    Err(ProvisionError::NameConflict {
                        resource: "s3 bucket",
                        name: name.to_string(),
                    })
                } else {
                    Err(classify_sdk("create bucket", "s3 bucket", name, &service_error))
                }
            }
        }
    }

    /// Apply the public-access block settings for the desired posture.
    pub async fn apply_public_access(&self, name: &str, access: PublicAccess) -> Result<()> {
        let blocked = matches!(access, PublicAccess::Locked);
        debug!(bucket = %name, blocked, "Applying public access block configuration");

        self.client
            .put_public_access_block()
            .bucket(name)
            .public_access_block_configuration(
                PublicAccessBlockConfiguration::builder()
                    .block_public_acls(blocked)
                    .ignore_public_acls(blocked)
                    .block_public_policy(blocked)
                    .restrict_public_buckets(blocked)
                    .build(),
            )
            .send()
            .await
            .map_err(|e| classify_sdk("put public access block", "s3 bucket", name, &e))?;

        Ok(())
    }

    /// Enable static-website hosting with the given index document.
    pub async fn apply_website_hosting(&self, name: &str, index_document: &str) -> Result<()> {
        debug!(bucket = %name, index = %index_document, "Enabling static website hosting");

        self.client
            .put_bucket_website()
            .bucket(name)
            .website_configuration(
                WebsiteConfiguration::builder()
                    .index_document(IndexDocument::builder().suffix(index_document).build()?)
                    .build(),
            )
            .send()
            .await
            .map_err(|e| classify_sdk("put bucket website", "s3 bucket", name, &e))?;

        Ok(())
    }

    /// Attach a bucket policy document.
    pub async fn apply_bucket_policy(&self, name: &str, policy: &serde_json::Value) -> Result<()> {
        debug!(bucket = %name, "Applying bucket policy");

        self.client
            .put_bucket_policy()
            .bucket(name)
            .policy(policy.to_string())
            .send()
            .await
            .map_err(|e| classify_sdk("put bucket policy", "s3 bucket", name, &e))?;

        Ok(())
    }
}
