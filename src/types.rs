//! Handles and records exchanged between provisioning phases
//!
//! Provider-assigned identifiers are carried as opaque strings; the structs
//! here only group the ones that travel together.

use serde::Serialize;

/// Hosted zone id used for alias records that route to any CloudFront
/// distribution. Fixed by the provider, not account-specific.
pub const CLOUDFRONT_ALIAS_ZONE_ID: &str = "Z2FDTNDATAQYW2";

/// Outcome of a bucket create call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketCreation {
    /// The bucket was created by this call
    Created,
    /// The bucket already exists and is owned by this account
    AlreadyOwned,
}

/// Identifiers returned for a CloudFront distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DistributionHandle {
    pub id: String,
    pub arn: String,
    /// The distribution's own domain name (e.g. `d111111abcdef8.cloudfront.net`)
    pub domain: String,
}

/// The DNS record a certificate authority requires to prove domain
/// ownership. Produced by the certificate phase, consumed by the DNS phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationRecord {
    pub name: String,
    pub record_type: String,
    pub value: String,
}

/// Explicit record-set mutation action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordAction {
    Create,
    Upsert,
    Delete,
}

impl std::fmt::Display for RecordAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordAction::Create => write!(f, "CREATE"),
            RecordAction::Upsert => write!(f, "UPSERT"),
            RecordAction::Delete => write!(f, "DELETE"),
        }
    }
}

/// Target of an alias A record: the hosted zone that owns the target
/// endpoint plus the endpoint's DNS name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasTarget {
    pub hosted_zone_id: String,
    pub dns_name: String,
}

/// A record set to create, upsert or delete in a hosted zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordSet {
    /// Apex A record aliased at an AWS endpoint
    AliasA { name: String, target: AliasTarget },
    /// Plain CNAME with a TTL
    Cname { name: String, value: String, ttl: i64 },
}

impl RecordSet {
    pub fn name(&self) -> &str {
        match self {
            RecordSet::AliasA { name, .. } => name,
            RecordSet::Cname { name, .. } => name,
        }
    }
}

/// Source repository a pipeline deploys from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRepo {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    /// CodeStar Connections ARN authorizing access to the repository
    pub connection_arn: String,
}

impl SourceRepo {
    /// The `owner/repo` form the source action expects.
    pub fn full_repository_id(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

/// Everything needed to create the deployment pipeline.
#[derive(Debug, Clone)]
pub struct PipelineSpec {
    pub name: String,
    pub role_arn: String,
    pub source: SourceRepo,
    /// Bucket the deploy stage extracts into
    pub deploy_bucket: String,
    /// Bucket the pipeline stores artifacts in
    pub artifact_bucket: String,
    pub region: String,
}

/// Everything needed to create the CloudFront distribution.
#[derive(Debug, Clone)]
pub struct DistributionSpec {
    pub aliases: Vec<String>,
    pub default_root_object: String,
    /// REST endpoint of the origin bucket, also used as the origin id
    pub origin_domain: String,
    pub cache_policy_id: String,
    pub response_headers_policy_id: String,
    pub certificate_arn: String,
    pub comment: String,
}

/// Desired public-access posture for a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicAccess {
    /// All public-access blocks off: the bucket serves a public website
    Open,
    /// All public-access blocks on: only the CDN may read
    Locked,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_repository_id() {
        let repo = SourceRepo {
            owner: "octocat".to_string(),
            repo: "website".to_string(),
            branch: "main".to_string(),
            connection_arn: "arn:aws:codestar-connections:us-east-1:123:connection/abc".to_string(),
        };
        assert_eq!(repo.full_repository_id(), "octocat/website");
    }

    #[test]
    fn record_action_display() {
        assert_eq!(RecordAction::Create.to_string(), "CREATE");
        assert_eq!(RecordAction::Upsert.to_string(), "UPSERT");
        assert_eq!(RecordAction::Delete.to_string(), "DELETE");
    }

    #[test]
    fn record_set_name() {
        let alias = RecordSet::AliasA {
            name: "example.com".to_string(),
            target: AliasTarget {
                hosted_zone_id: CLOUDFRONT_ALIAS_ZONE_ID.to_string(),
                dns_name: "d1234.cloudfront.net".to_string(),
            },
        };
        assert_eq!(alias.name(), "example.com");
    }
}
