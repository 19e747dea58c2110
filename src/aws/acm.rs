//! ACM certificate management
//!
//! CloudFront only accepts certificates from us-east-1, so the client is
//! always pinned there regardless of the run's region.

use crate::aws::context::AwsContext;
use crate::aws::error::{ProvisionError, Result, classify_sdk};
use crate::aws::tags;
use crate::types::ValidationRecord;
use aws_sdk_acm::Client;
use aws_sdk_acm::types::ValidationMethod;
use tracing::{debug, info};

/// ACM client for the site certificate
pub struct CertificateClient {
    client: Client,
}

impl CertificateClient {
    /// Create a new certificate client
    pub async fn new(region: &str) -> Result<Self> {
        let ctx = AwsContext::new(region).await;
        Ok(Self::from_context(&ctx))
    }

    /// Create a certificate client from a pre-loaded AWS context
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.acm_client(),
        }
    }

    /// Request a DNS-validated public certificate covering the domain and
    /// its alternate name.
    ///
    /// The idempotency token is stable per domain, so a re-run converges on
    /// the same certificate ARN instead of minting a duplicate.
    pub async fn request_certificate(
        &self,
        domain: &str,
        alternate_name: &str,
        idempotency_token: &str,
    ) -> Result<String> {
        info!(domain = %domain, alternate = %alternate_name, "Requesting certificate");

        let mut request = self
            .client
            .request_certificate()
            .domain_name(domain)
            .validation_method(ValidationMethod::Dns)
            .subject_alternative_names(alternate_name)
            .idempotency_token(idempotency_token);
        for tag in tags::acm_tags(domain)? {
            request = request.tags(tag);
        }

        let response = request
            .send()
            .await
            .map_err(|e| classify_sdk("request certificate", "certificate", domain, &e))?;

        let arn = response
            .certificate_arn()
            .ok_or_else(|| {
                ProvisionError::provider("request certificate", "no certificate ARN in response")
            })?
            .to_string();

        info!(certificate_arn = %arn, "Certificate requested");
        Ok(arn)
    }

    /// Fetch the domain-validation record, if the provider has produced it
    /// yet.
    ///
    /// Returns `Ok(None)` while the provider is still populating the
    /// validation options; an unknown certificate ARN is
    /// [`ProvisionError::NotFound`] so the poll terminates instead of
    /// spinning.
    pub async fn validation_record(&self, certificate_arn: &str) -> Result<Option<ValidationRecord>> {
        let result = self
            .client
            .describe_certificate()
            .certificate_arn(certificate_arn)
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_resource_not_found_exception() {
                    return Err(ProvisionError::NotFound {
                        resource: "certificate",
                        id: certificate_arn.to_string(),
                    });
                }
                return Err(classify_sdk(
                    "describe certificate",
                    "certificate",
                    certificate_arn,
                    &service_error,
                ));
            }
        };

        let record = response.certificate().and_then(|certificate| {
            certificate
                .domain_validation_options()
                .iter()
                .find_map(|option| option.resource_record())
                .map(|record| ValidationRecord {
                    name: record.name().to_string(),
                    record_type: record.r#type().as_str().to_string(),
                    value: record.value().to_string(),
                })
        });

        if record.is_none() {
            debug!(certificate_arn = %certificate_arn, "Validation record not yet available");
        }
        Ok(record)
    }
}
