//! Run configuration for a provisioning run
//!
//! Composed of focused sub-configs (site, AWS, pipeline, CDN). Everything is
//! resolved up front: derived names are deterministic so that re-runs address
//! the same resources and converge through the create-or-reuse paths.

use crate::types::SourceRepo;
use std::time::Duration;
use thiserror::Error;

/// Managed cache policy "CachingDisabled". Appropriate while the pipeline
/// redeploys frequently; operators can switch to a caching policy id later.
pub const CACHING_DISABLED_POLICY_ID: &str = "4135ea2d-6df8-44a3-9df3-4b5a84be39ad";

/// Default index document for website hosting
pub const DEFAULT_INDEX_DOCUMENT: &str = "index.html";

/// Default deadline for the certificate-validation poll
pub const DEFAULT_CERTIFICATE_WAIT: Duration = Duration::from_secs(600);

/// S3 static-website endpoints and their alias hosted-zone ids, per region.
/// Newer regions use the dotted endpoint form.
const WEBSITE_ENDPOINTS: &[(&str, &str, &str)] = &[
    ("us-east-1", "Z3AQBSTGFYJSTF", "s3-website-us-east-1.amazonaws.com"),
    ("us-east-2", "Z2O1EMRO9K5GLX", "s3-website.us-east-2.amazonaws.com"),
    ("us-west-1", "Z2F56UZL2M1ACD", "s3-website-us-west-1.amazonaws.com"),
    ("us-west-2", "Z3BJ6K6RIION7M", "s3-website-us-west-2.amazonaws.com"),
    ("eu-west-1", "Z1BKCTXD74EZPE", "s3-website-eu-west-1.amazonaws.com"),
    ("eu-central-1", "Z21DNDUVLTQW6Q", "s3-website.eu-central-1.amazonaws.com"),
    ("ap-southeast-1", "Z3O0J2DXBE1FTB", "s3-website-ap-southeast-1.amazonaws.com"),
    ("ap-southeast-2", "Z1WCIGYICN2BYD", "s3-website-ap-southeast-2.amazonaws.com"),
    ("ap-northeast-1", "Z2M4EHUR26P7ZW", "s3-website-ap-northeast-1.amazonaws.com"),
];

/// Regional S3 website endpoint (no bucket prefix; alias records target the
/// regional endpoint directly).
pub fn s3_website_endpoint(region: &str) -> Option<&'static str> {
    WEBSITE_ENDPOINTS
        .iter()
        .find(|(r, _, _)| *r == region)
        .map(|(_, _, endpoint)| *endpoint)
}

/// Hosted zone id owning the regional S3 website endpoint, required by alias
/// records that target it.
pub fn s3_website_zone_id(region: &str) -> Option<&'static str> {
    WEBSITE_ENDPOINTS
        .iter()
        .find(|(r, _, _)| *r == region)
        .map(|(_, zone, _)| *zone)
}

/// Configuration validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("domain cannot be empty")]
    EmptyDomain,

    #[error("domain must be a bare host name, got: {0}")]
    InvalidDomain(String),

    #[error("region cannot be empty")]
    EmptyRegion,

    #[error("region '{0}' has no S3 website endpoint")]
    UnsupportedRegion(String),

    #[error("{0} cannot be empty")]
    EmptySourceField(&'static str),

    #[error("{field} must be an ARN, got: {value}")]
    InvalidArn {
        field: &'static str,
        value: String,
    },
}

/// Website identity
#[derive(Debug, Clone)]
pub struct SiteSettings {
    /// Apex domain; must match the bucket name for S3 website hosting
    pub domain: String,
    /// Subject alternative name on the certificate
    pub alternate_domain: String,
    /// Origin bucket name
    pub bucket: String,
    pub index_document: String,
}

/// AWS connection settings
#[derive(Debug, Clone)]
pub struct AwsSettings {
    pub region: String,
    /// AWS profile name (overrides default credential resolution)
    pub profile: Option<String>,
}

/// Deployment pipeline settings
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub name: String,
    pub source: SourceRepo,
    /// IAM role ARN the pipeline assumes
    pub role_arn: String,
    pub artifact_bucket: String,
}

/// CDN settings
#[derive(Debug, Clone)]
pub struct CdnSettings {
    pub cache_policy_id: String,
    pub header_policy_name: String,
    pub origin_access_name: String,
    pub comment: String,
}

/// Configuration for a provisioning run
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub site: SiteSettings,
    pub aws: AwsSettings,
    pub pipeline: PipelineSettings,
    pub cdn: CdnSettings,
    /// Deadline for the certificate-validation poll
    pub certificate_wait: Duration,
}

impl SiteConfig {
    /// Build a configuration with derived defaults for every name not given
    /// explicitly by the caller.
    pub fn new(
        domain: impl Into<String>,
        region: impl Into<String>,
        source: SourceRepo,
        role_arn: impl Into<String>,
    ) -> Self {
        let domain = domain.into();
        let region = region.into();
        let slug = name_slug(&domain);

        Self {
            site: SiteSettings {
                alternate_domain: format!("www.{domain}"),
                bucket: domain.clone(),
                index_document: DEFAULT_INDEX_DOCUMENT.to_string(),
                domain,
            },
            pipeline: PipelineSettings {
                name: format!("{slug}-pipeline"),
                source,
                role_arn: role_arn.into(),
                artifact_bucket: artifact_bucket_name(&slug, &region),
            },
            cdn: CdnSettings {
                cache_policy_id: CACHING_DISABLED_POLICY_ID.to_string(),
                header_policy_name: format!("{slug}-headers"),
                origin_access_name: format!("{slug}-origin-access"),
                comment: format!("Distribution for {slug}"),
            },
            aws: AwsSettings {
                region,
                profile: None,
            },
            certificate_wait: DEFAULT_CERTIFICATE_WAIT,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let domain = &self.site.domain;
        if domain.is_empty() {
            return Err(ConfigError::EmptyDomain);
        }
        if domain.contains('/') || domain.contains(':') || domain.contains(char::is_whitespace) {
            return Err(ConfigError::InvalidDomain(domain.clone()));
        }
        if self.aws.region.is_empty() {
            return Err(ConfigError::EmptyRegion);
        }
        if s3_website_endpoint(&self.aws.region).is_none() {
            return Err(ConfigError::UnsupportedRegion(self.aws.region.clone()));
        }
        let source = &self.pipeline.source;
        if source.owner.is_empty() {
            return Err(ConfigError::EmptySourceField("repository owner"));
        }
        if source.repo.is_empty() {
            return Err(ConfigError::EmptySourceField("repository name"));
        }
        if source.branch.is_empty() {
            return Err(ConfigError::EmptySourceField("branch"));
        }
        if !source.connection_arn.starts_with("arn:") {
            return Err(ConfigError::InvalidArn {
                field: "connection ARN",
                value: source.connection_arn.clone(),
            });
        }
        if !self.pipeline.role_arn.starts_with("arn:") {
            return Err(ConfigError::InvalidArn {
                field: "pipeline role ARN",
                value: self.pipeline.role_arn.clone(),
            });
        }
        Ok(())
    }

    /// REST endpoint of the origin bucket; CloudFront's origin domain and id.
    pub fn origin_domain(&self) -> String {
        format!(
            "{}.s3.{}.amazonaws.com",
            self.site.bucket, self.aws.region
        )
    }

    /// Alias names the distribution answers for.
    pub fn aliases(&self) -> Vec<String> {
        vec![self.site.domain.clone(), self.site.alternate_domain.clone()]
    }

    /// Stable idempotency token for RequestCertificate so re-runs converge
    /// on the same certificate instead of minting duplicates.
    pub fn certificate_idempotency_token(&self) -> String {
        let mut token: String = self
            .site
            .domain
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        token.truncate(32);
        token
    }
}

/// Deterministic artifact bucket name for a site + region.
fn artifact_bucket_name(slug: &str, region: &str) -> String {
    format!("{slug}-artifacts-{region}")
}

/// Replace characters that pipeline and policy names reject.
fn name_slug(domain: &str) -> String {
    domain.replace('.', "-")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> SourceRepo {
        SourceRepo {
            owner: "octocat".to_string(),
            repo: "website".to_string(),
            branch: "main".to_string(),
            connection_arn: "arn:aws:codestar-connections:us-east-1:123:connection/abc".to_string(),
        }
    }

    fn config() -> SiteConfig {
        SiteConfig::new(
            "example.com",
            "us-east-1",
            source(),
            "arn:aws:iam::123456789012:role/pipeline",
        )
    }

    #[test]
    fn derived_defaults() {
        let config = config();
        assert_eq!(config.site.bucket, "example.com");
        assert_eq!(config.site.alternate_domain, "www.example.com");
        assert_eq!(config.pipeline.name, "example-com-pipeline");
        assert_eq!(config.pipeline.artifact_bucket, "example-com-artifacts-us-east-1");
        assert_eq!(config.cdn.header_policy_name, "example-com-headers");
        assert_eq!(config.cdn.cache_policy_id, CACHING_DISABLED_POLICY_ID);
    }

    #[test]
    fn derived_names_are_stable_across_runs() {
        assert_eq!(config().pipeline.artifact_bucket, config().pipeline.artifact_bucket);
        assert_eq!(
            config().certificate_idempotency_token(),
            config().certificate_idempotency_token()
        );
    }

    #[test]
    fn origin_domain_and_aliases() {
        let config = config();
        assert_eq!(config.origin_domain(), "example.com.s3.us-east-1.amazonaws.com");
        assert_eq!(
            config.aliases(),
            vec!["example.com".to_string(), "www.example.com".to_string()]
        );
    }

    #[test]
    fn validation_catches_bad_input() {
        let mut config = config();
        config.site.domain = String::new();
        assert!(matches!(config.validate(), Err(ConfigError::EmptyDomain)));

        let mut config = self::config();
        config.site.domain = "https://example.com".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidDomain(_))));

        let mut config = self::config();
        config.aws.region = "mars-north-1".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::UnsupportedRegion(_))));

        let mut config = self::config();
        config.pipeline.role_arn = "not-an-arn".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidArn { .. })));

        assert!(self::config().validate().is_ok());
    }

    #[test]
    fn website_endpoint_table() {
        assert_eq!(
            s3_website_endpoint("ap-southeast-1"),
            Some("s3-website-ap-southeast-1.amazonaws.com")
        );
        assert_eq!(s3_website_zone_id("ap-southeast-1"), Some("Z3O0J2DXBE1FTB"));
        assert_eq!(s3_website_endpoint("mars-north-1"), None);

        // newer regions use the dotted form
        assert_eq!(
            s3_website_endpoint("us-east-2"),
            Some("s3-website.us-east-2.amazonaws.com")
        );
    }

    #[test]
    fn idempotency_token_is_alphanumeric_and_bounded() {
        let config = SiteConfig::new(
            "a-very-long-subdomain.with-dashes.example.com",
            "us-east-1",
            source(),
            "arn:aws:iam::123456789012:role/pipeline",
        );
        let token = config.certificate_idempotency_token();
        assert!(token.len() <= 32);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
