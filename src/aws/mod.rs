//! AWS client modules
//!
//! Thin wrappers around the AWS SDK clients, one per service the sequence
//! provisions:
//! - S3: origin and artifact buckets
//! - CodePipeline: the deploy pipeline
//! - Route 53: hosted zone and record sets
//! - ACM: the TLS certificate (always us-east-1)
//! - CloudFront: distribution, response-headers policy, origin access
//! - STS: account preflight

pub mod account;
pub mod acm;
pub mod cloudfront;
pub mod codepipeline;
pub mod context;
pub mod error;
pub mod policy;
pub mod route53;
pub mod s3;
pub mod tags;

pub use account::{AccountId, get_current_account_id};
pub use acm::CertificateClient;
pub use cloudfront::CdnClient;
pub use codepipeline::PipelineClient;
pub use context::AwsContext;
pub use error::{ProvisionError, Result, classify_code, classify_sdk};
pub use route53::DnsClient;
pub use s3::BucketClient;
