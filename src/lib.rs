//! sitelift - static-website provisioning on AWS
//!
//! This crate stands up everything a static website needs on AWS in one
//! fixed, idempotent sequence: an S3 origin bucket, a CodePipeline that
//! deploys from a source repository, a Route 53 hosted zone, an ACM
//! certificate (validated via DNS), and a CloudFront distribution locked to
//! the bucket through an origin-access control.
//!
//! ## Modules
//!
//! - [`aws`]: thin clients over the AWS SDK, one per service
//! - [`config`]: run configuration and derivation of default names
//! - [`provision`]: the ordered provisioning sequence
//! - [`state`]: the immutable run state threaded through each phase
//! - [`types`]: handles and small records exchanged between phases
//! - [`wait`]: bounded polling with exponential backoff

pub mod aws;
pub mod config;
pub mod provision;
pub mod state;
pub mod types;
pub mod wait;

pub use config::SiteConfig;
pub use provision::{Provisioner, Services};
pub use state::{RunState, Stage};
