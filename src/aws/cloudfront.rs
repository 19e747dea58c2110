//! CloudFront distribution, response-headers policy and origin access
//!
//! The three "AlreadyExists" faults in this service do not echo the existing
//! resource id, so every ensure here is a create primitive plus a
//! list-and-match fallback. The origin-access attach is the one
//! read-modify-write: fetch config + ETag, patch, submit with `IfMatch`.

use crate::aws::context::AwsContext;
use crate::aws::error::{ProvisionError, Result, classify_sdk};
use crate::types::{DistributionHandle, DistributionSpec};
use aws_sdk_cloudfront::Client;
use aws_sdk_cloudfront::types::{
    Aliases, DefaultCacheBehavior, DistributionConfig, HttpVersion, MinimumProtocolVersion, Origin,
    OriginAccessControlConfig, OriginAccessControlOriginTypes, OriginAccessControlSigningBehaviors,
    OriginAccessControlSigningProtocols, Origins, PriceClass,
    ResponseHeadersPolicyAccessControlAllowHeaders, ResponseHeadersPolicyAccessControlAllowMethods,
    ResponseHeadersPolicyAccessControlAllowMethodsValues,
    ResponseHeadersPolicyAccessControlAllowOrigins, ResponseHeadersPolicyAccessControlExposeHeaders,
    ResponseHeadersPolicyConfig, ResponseHeadersPolicyCorsConfig, ResponseHeadersPolicyType,
    S3OriginConfig, SslSupportMethod, ViewerCertificate, ViewerProtocolPolicy,
};
use tracing::{debug, info};

/// CloudFront client for the site distribution
pub struct CdnClient {
    client: Client,
}

impl CdnClient {
    /// Create a new CDN client
    pub async fn new(region: &str) -> Result<Self> {
        let ctx = AwsContext::new(region).await;
        Ok(Self::from_context(&ctx))
    }

    /// Create a CDN client from a pre-loaded AWS context
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.cloudfront_client(),
        }
    }

    /// Create the CORS response-headers policy.
    ///
    /// An existing policy with the same name is a
    /// [`ProvisionError::NameConflict`]; the fault does not carry the
    /// existing id, callers recover through
    /// [`CdnClient::find_response_headers_policy`].
    pub async fn create_response_headers_policy(&self, name: &str) -> Result<String> {
        info!(policy = %name, "Creating response headers policy");

        let result = self
            .client
            .create_response_headers_policy()
            .response_headers_policy_config(header_policy_config(name)?)
            .send()
            .await;

        match result {
            Ok(response) => response
                .response_headers_policy()
                .map(|policy| policy.id().to_string())
                .ok_or_else(|| {
                    ProvisionError::provider(
                        "create response headers policy",
                        "no policy in response",
                    )
                }),
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_response_headers_policy_already_exists() {
                    Err(ProvisionError::NameConflict {
                        resource: "response headers policy",
                        name: name.to_string(),
                    })
                } else {
                    Err(classify_sdk(
                        "create response headers policy",
                        "response headers policy",
                        name,
                        &service_error,
                    ))
                }
            }
        }
    }

    /// Find a custom response-headers policy by name.
    pub async fn find_response_headers_policy(&self, name: &str) -> Result<Option<String>> {
        let mut marker: Option<String> = None;
        loop {
            let mut request = self
                .client
                .list_response_headers_policies()
                .r#type(ResponseHeadersPolicyType::Custom);
            if let Some(marker) = &marker {
                request = request.marker(marker);
            }

            let response = request.send().await.map_err(|e| {
                classify_sdk("list response headers policies", "response headers policy", name, &e)
            })?;

            let Some(list) = response.response_headers_policy_list() else {
                return Ok(None);
            };

            for summary in list.items() {
                let Some(policy) = summary.response_headers_policy() else {
                    continue;
                };
                let Some(config) = policy.response_headers_policy_config() else {
                    continue;
                };
                if config.name() == name {
                    debug!(policy = %name, id = %policy.id(), "Found existing response headers policy");
                    return Ok(Some(policy.id().to_string()));
                }
            }

            match list.next_marker() {
                Some(next) if !next.is_empty() => marker = Some(next.to_string()),
                _ => return Ok(None),
            }
        }
    }

    /// Create the distribution and return its identifiers.
    pub async fn create_distribution(&self, spec: &DistributionSpec) -> Result<DistributionHandle> {
        info!(aliases = ?spec.aliases, origin = %spec.origin_domain, "Creating distribution");

        let result = self
            .client
            .create_distribution()
            .distribution_config(build_distribution_config(spec)?)
            .send()
            .await;

        match result {
            Ok(response) => {
                let handle = response
                    .distribution()
                    .map(|distribution| DistributionHandle {
                        id: distribution.id().to_string(),
                        arn: distribution.arn().to_string(),
                        domain: distribution.domain_name().to_string(),
                    })
                    .ok_or_else(|| {
                        ProvisionError::provider("create distribution", "no distribution in response")
                    })?;
                info!(id = %handle.id, domain = %handle.domain, "Distribution created");
                Ok(handle)
            }
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_distribution_already_exists() {
                    Err(ProvisionError::NameConflict {
                        resource: "distribution",
                        name: spec.aliases.join(","),
                    })
                } else {
                    Err(classify_sdk(
                        "create distribution",
                        "distribution",
                        &spec.origin_domain,
                        &service_error,
                    ))
                }
            }
        }
    }

    /// Find an existing distribution answering for the given alias.
    pub async fn find_distribution_by_alias(&self, alias: &str) -> Result<Option<DistributionHandle>> {
        let mut marker: Option<String> = None;
        loop {
            let mut request = self.client.list_distributions();
            if let Some(marker) = &marker {
                request = request.marker(marker);
            }

            let response = request
                .send()
                .await
                .map_err(|e| classify_sdk("list distributions", "distribution", alias, &e))?;

            let Some(list) = response.distribution_list() else {
                return Ok(None);
            };

            for summary in list.items() {
                let aliased = summary
                    .aliases()
                    .map(|aliases| aliases.items().iter().any(|candidate| candidate == alias))
                    .unwrap_or(false);
                if aliased {
                    debug!(alias = %alias, id = %summary.id(), "Found existing distribution");
                    return Ok(Some(DistributionHandle {
                        id: summary.id().to_string(),
                        arn: summary.arn().to_string(),
                        domain: summary.domain_name().to_string(),
                    }));
                }
            }

            match list.next_marker() {
                Some(next) if !next.is_empty() => marker = Some(next.to_string()),
                _ => return Ok(None),
            }
        }
    }

    /// Create the origin-access control restricting bucket fetches to
    /// signed CloudFront requests.
    pub async fn create_origin_access_control(&self, name: &str) -> Result<String> {
        info!(oac = %name, "Creating origin access control");

        let config = OriginAccessControlConfig::builder()
            .name(name)
            .description(format!("Restrict public access to the origin: {name}"))
            .signing_protocol(OriginAccessControlSigningProtocols::Sigv4)
            .signing_behavior(OriginAccessControlSigningBehaviors::Always)
            .origin_access_control_origin_type(OriginAccessControlOriginTypes::S3)
            .build()?;

        let result = self
            .client
            .create_origin_access_control()
            .origin_access_control_config(config)
            .send()
            .await;

        match result {
            Ok(response) => response
                .origin_access_control()
                .map(|control| control.id().to_string())
                .ok_or_else(|| {
                    ProvisionError::provider(
                        "create origin access control",
                        "no origin access control in response",
                    )
                }),
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_origin_access_control_already_exists() {
                    Err(ProvisionError::NameConflict {
                        resource: "origin access control",
                        name: name.to_string(),
                    })
                } else {
                    Err(classify_sdk(
                        "create origin access control",
                        "origin access control",
                        name,
                        &service_error,
                    ))
                }
            }
        }
    }

    /// Find an existing origin-access control by name.
    pub async fn find_origin_access_control(&self, name: &str) -> Result<Option<String>> {
        let mut marker: Option<String> = None;
        loop {
            let mut request = self.client.list_origin_access_controls();
            if let Some(marker) = &marker {
                request = request.marker(marker);
            }

            let response = request.send().await.map_err(|e| {
                classify_sdk("list origin access controls", "origin access control", name, &e)
            })?;

            let Some(list) = response.origin_access_control_list() else {
                return Ok(None);
            };

            for summary in list.items() {
                if summary.name() == name {
                    debug!(oac = %name, id = %summary.id(), "Found existing origin access control");
                    return Ok(Some(summary.id().to_string()));
                }
            }

            match list.next_marker() {
                Some(next) if !next.is_empty() => marker = Some(next.to_string()),
                _ => return Ok(None),
            }
        }
    }

    /// Attach an origin-access control to every origin that lacks one.
    ///
    /// Read-modify-write against the distribution config: the update is
    /// submitted with the ETag fetched alongside the config, so a concurrent
    /// change surfaces as [`ProvisionError::Conflict`] and nothing is
    /// partially applied. Already-patched origins make this a no-op.
    pub async fn attach_origin_access(&self, distribution_id: &str, oac_id: &str) -> Result<()> {
        let result = self
            .client
            .get_distribution_config()
            .id(distribution_id)
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_no_such_distribution() {
                    return Err(ProvisionError::NotFound {
                        resource: "distribution",
                        id: distribution_id.to_string(),
                    });
                }
                return Err(classify_sdk(
                    "get distribution config",
                    "distribution",
                    distribution_id,
                    &service_error,
                ));
            }
        };

        let etag = response
            .e_tag()
            .ok_or_else(|| {
                ProvisionError::provider("get distribution config", "no ETag in response")
            })?
            .to_string();
        let mut config = response.distribution_config().cloned().ok_or_else(|| {
            ProvisionError::provider("get distribution config", "no distribution config in response")
        })?;

        let patched = assign_origin_access(&mut config, oac_id);
        if patched == 0 {
            debug!(id = %distribution_id, "All origins already carry an origin access control");
            return Ok(());
        }

        info!(id = %distribution_id, oac = %oac_id, patched, "Attaching origin access control");

        self.client
            .update_distribution()
            .id(distribution_id)
            .if_match(&etag)
            .distribution_config(config)
            .send()
            .await
            .map_err(|e| {
                let service_error = e.into_service_error();
                if service_error.is_precondition_failed()
                    || service_error.is_invalid_if_match_version()
                {
                    ProvisionError::Conflict {
                        resource: "distribution",
                        detail: format!("config token {etag} went stale during update"),
                    }
                } else {
                    classify_sdk("update distribution", "distribution", distribution_id, &service_error)
                }
            })?;

        Ok(())
    }
}

/// Point every origin without an access control at the given one.
/// Returns the number of origins patched.
pub(crate) fn assign_origin_access(config: &mut DistributionConfig, oac_id: &str) -> usize {
    let mut patched = 0;
    let Some(origins) = config.origins.as_mut() else {
        return patched;
    };
    for origin in origins.items.iter_mut() {
        let missing = origin
            .origin_access_control_id
            .as_deref()
            .map(str::is_empty)
            .unwrap_or(true);
        if missing {
            origin.origin_access_control_id = Some(oac_id.to_string());
            patched += 1;
        }
    }
    patched
}

/// CORS policy config mirroring what the website needs: any origin may read,
/// with the policy overriding origin-supplied headers.
fn header_policy_config(name: &str) -> Result<ResponseHeadersPolicyConfig> {
    let cors = ResponseHeadersPolicyCorsConfig::builder()
        .access_control_allow_origins(
            ResponseHeadersPolicyAccessControlAllowOrigins::builder()
                .quantity(1)
                .items("*")
                .build()?,
        )
        .access_control_allow_headers(
            ResponseHeadersPolicyAccessControlAllowHeaders::builder()
                .quantity(1)
                .items("*")
                .build()?,
        )
        .access_control_allow_methods(
            ResponseHeadersPolicyAccessControlAllowMethods::builder()
                .quantity(1)
                .items(ResponseHeadersPolicyAccessControlAllowMethodsValues::All)
                .build()?,
        )
        .access_control_allow_credentials(false)
        .access_control_expose_headers(
            ResponseHeadersPolicyAccessControlExposeHeaders::builder()
                .quantity(1)
                .items("None")
                .build()?,
        )
        .access_control_max_age_sec(60)
        .origin_override(true)
        .build()?;

    Ok(ResponseHeadersPolicyConfig::builder()
        .name(name)
        .comment("Response header policy for the site distribution")
        .cors_config(cors)
        .build()?)
}

/// Assemble the distribution config from our spec.
///
/// The origin-access-control id starts empty; it is attached after creation
/// via [`CdnClient::attach_origin_access`] because the control references
/// the distribution's ARN in the bucket policy.
pub(crate) fn build_distribution_config(spec: &DistributionSpec) -> Result<DistributionConfig> {
    let origin = Origin::builder()
        .id(&spec.origin_domain)
        .domain_name(&spec.origin_domain)
        .origin_access_control_id("")
        .s3_origin_config(S3OriginConfig::builder().origin_access_identity("").build())
        .build()?;

    let cache_behavior = DefaultCacheBehavior::builder()
        .target_origin_id(&spec.origin_domain)
        .viewer_protocol_policy(ViewerProtocolPolicy::RedirectToHttps)
        .compress(true)
        .cache_policy_id(&spec.cache_policy_id)
        .response_headers_policy_id(&spec.response_headers_policy_id)
        .build()?;

    let viewer_certificate = ViewerCertificate::builder()
        .cloud_front_default_certificate(false)
        .acm_certificate_arn(&spec.certificate_arn)
        .ssl_support_method(SslSupportMethod::SniOnly)
        .minimum_protocol_version(MinimumProtocolVersion::from("TLSv1.2_2021"))
        .build();

    let mut aliases = Aliases::builder().quantity(spec.aliases.len() as i32);
    for alias in &spec.aliases {
        aliases = aliases.items(alias);
    }

    Ok(DistributionConfig::builder()
        .caller_reference(uuid::Uuid::new_v4().to_string())
        .aliases(aliases.build()?)
        .default_root_object(&spec.default_root_object)
        .origins(Origins::builder().quantity(1).items(origin).build()?)
        .default_cache_behavior(cache_behavior)
        .comment(&spec.comment)
        .price_class(PriceClass::PriceClass100)
        .enabled(true)
        .viewer_certificate(viewer_certificate)
        .http_version(HttpVersion::Http2)
        .build()?)
}
