//! sitelift: provision a static website on AWS
//!
//! Runs the fixed seven-phase sequence: origin bucket, deploy pipeline,
//! hosted zone, certificate, validation record, distribution, DNS repoint.

use anyhow::Result;
use clap::Parser;
use sitelift::aws::{AwsContext, get_current_account_id};
use sitelift::config::{CACHING_DISABLED_POLICY_ID, SiteConfig};
use sitelift::provision::{AwsServices, Provisioner};
use sitelift::types::SourceRepo;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "sitelift")]
#[command(about = "Provision a static website on AWS")]
#[command(version)]
struct Args {
    /// Apex domain of the site; also the origin bucket name
    #[arg(short, long)]
    domain: String,

    /// AWS region for the bucket and pipeline
    #[arg(long, default_value = "us-east-1")]
    region: String,

    /// AWS profile to use (overrides AWS_PROFILE env var)
    #[arg(long)]
    aws_profile: Option<String>,

    /// Repository owner the pipeline deploys from
    #[arg(long)]
    repo_owner: String,

    /// Repository name the pipeline deploys from
    #[arg(long)]
    repo_name: String,

    /// Branch the pipeline tracks
    #[arg(long, default_value = "main")]
    branch: String,

    /// CodeStar Connections ARN authorizing repository access
    #[arg(long, env = "SITELIFT_CONNECTION_ARN")]
    connection_arn: String,

    /// IAM role ARN the pipeline assumes
    #[arg(long, env = "SITELIFT_PIPELINE_ROLE_ARN")]
    pipeline_role_arn: String,

    /// Override the derived pipeline name
    #[arg(long)]
    pipeline_name: Option<String>,

    /// Override the derived artifact bucket name
    #[arg(long)]
    artifact_bucket: Option<String>,

    /// CloudFront cache policy id for the default behavior
    #[arg(long, default_value = CACHING_DISABLED_POLICY_ID)]
    cache_policy_id: String,

    /// Deadline in seconds for the certificate-validation poll
    #[arg(long, default_value = "600")]
    certificate_wait: u64,

    /// Write the final run state as JSON to this file
    #[arg(short, long)]
    output: Option<String>,
}

impl From<Args> for SiteConfig {
    fn from(args: Args) -> Self {
        let source = SourceRepo {
            owner: args.repo_owner,
            repo: args.repo_name,
            branch: args.branch,
            connection_arn: args.connection_arn,
        };
        let mut config = SiteConfig::new(
            args.domain,
            args.region,
            source,
            args.pipeline_role_arn,
        );
        config.aws.profile = args.aws_profile;
        config.cdn.cache_policy_id = args.cache_policy_id;
        config.certificate_wait = Duration::from_secs(args.certificate_wait);
        if let Some(name) = args.pipeline_name {
            config.pipeline.name = name;
        }
        if let Some(bucket) = args.artifact_bucket {
            config.pipeline.artifact_bucket = bucket;
        }
        config
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&e);
        std::process::exit(1);
    }
}

/// Print error in a user-friendly way
fn print_error(e: &anyhow::Error) {
    use std::io::Write;

    let mut stderr = std::io::stderr();

    let _ = writeln!(stderr, "\n\x1b[1;31mError:\x1b[0m {e}");

    let mut source = e.source();
    while let Some(cause) = source {
        let _ = writeln!(stderr, "  \x1b[33mCaused by:\x1b[0m {cause}");
        source = cause.source();
    }
}

async fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    let output = args.output.clone();
    let config: SiteConfig = args.into();
    config.validate()?;

    if let Some(profile) = &config.aws.profile {
        info!(profile = %profile, "Using AWS profile");
    }
    info!(
        domain = %config.site.domain,
        bucket = %config.site.bucket,
        region = %config.aws.region,
        pipeline = %config.pipeline.name,
        "Starting provisioning run"
    );

    // Ctrl-C abandons the certificate poll; the certificate itself keeps
    // provisioning provider-side.
    let cancel = CancellationToken::new();
    let ctrl_c_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, abandoning the run");
            ctrl_c_token.cancel();
        }
    });

    let ctx = AwsContext::with_profile(&config.aws.region, config.aws.profile.as_deref()).await;
    let account = get_current_account_id(ctx.sdk_config()).await?;
    info!(account_id = %account, region = %ctx.region(), "Preflight complete");

    let services = AwsServices::from_context(&ctx);
    let provisioner = Provisioner::new(services, config);
    let state = provisioner.run(Some(&cancel)).await?;

    if let Some(distribution) = &state.distribution {
        info!(
            distribution = %distribution.domain,
            stage = %state.stage,
            "Site is provisioned; DNS now points at the distribution"
        );
    }

    if let Some(path) = output {
        let summary = serde_json::to_string_pretty(&state)?;
        std::fs::write(&path, summary)?;
        info!(path = %path, "Wrote run state");
    }

    Ok(())
}
