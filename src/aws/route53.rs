//! Route 53 hosted zone and record-set management

use crate::aws::context::AwsContext;
use crate::aws::error::{ProvisionError, Result, classify_sdk};
use crate::types::{RecordAction, RecordSet};
use aws_sdk_route53::Client;
use aws_sdk_route53::types::{
    AliasTarget, Change, ChangeAction, ChangeBatch, HostedZoneConfig, ResourceRecord,
    ResourceRecordSet, RrType,
};
use tracing::{debug, info};

/// Route 53 client for the site's hosted zone
pub struct DnsClient {
    client: Client,
}

impl DnsClient {
    /// Create a new DNS client
    pub async fn new(region: &str) -> Result<Self> {
        let ctx = AwsContext::new(region).await;
        Ok(Self::from_context(&ctx))
    }

    /// Create a DNS client from a pre-loaded AWS context
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.route53_client(),
        }
    }

    /// Create a public hosted zone for the domain.
    ///
    /// An existing zone surfaces as [`ProvisionError::NameConflict`]; callers
    /// recover through [`DnsClient::find_hosted_zone`].
    pub async fn create_hosted_zone(&self, domain: &str) -> Result<String> {
        info!(domain = %domain, "Creating hosted zone");

        let result = self
            .client
            .create_hosted_zone()
            .name(domain)
            .caller_reference(uuid::Uuid::new_v4().to_string())
            .hosted_zone_config(
                HostedZoneConfig::builder()
                    .comment(format!("Hosted zone for {domain}"))
                    .private_zone(false)
                    .build(),
            )
            .send()
            .await;

        match result {
            Ok(response) => {
                let zone_id = response
                    .hosted_zone()
                    .map(|zone| normalize_zone_id(zone.id()).to_string())
                    .ok_or_else(|| {
                        ProvisionError::provider("create hosted zone", "no hosted zone in response")
                    })?;
                info!(zone_id = %zone_id, "Hosted zone created");
                Ok(zone_id)
            }
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_hosted_zone_already_exists() {
                    Err(ProvisionError::NameConflict {
                        resource: "hosted zone",
                        name: domain.to_string(),
                    })
                } else {
                    Err(classify_sdk("create hosted zone", "hosted zone", domain, &service_error))
                }
            }
        }
    }

    /// Find an existing hosted zone by domain name.
    pub async fn find_hosted_zone(&self, domain: &str) -> Result<Option<String>> {
        let response = self
            .client
            .list_hosted_zones_by_name()
            .dns_name(domain)
            .send()
            .await
            .map_err(|e| classify_sdk("list hosted zones", "hosted zone", domain, &e))?;

        let wanted = format!("{}.", domain.trim_end_matches('.'));
        let found = response
            .hosted_zones()
            .iter()
            .find(|zone| zone.name() == wanted)
            .map(|zone| normalize_zone_id(zone.id()).to_string());

        debug!(domain = %domain, found = ?found, "Hosted zone lookup");
        Ok(found)
    }

    /// Apply a single record-set change with an explicit action.
    pub async fn change_record_set(
        &self,
        zone_id: &str,
        action: RecordAction,
        record: &RecordSet,
    ) -> Result<()> {
        info!(
            zone_id = %zone_id,
            action = %action,
            record = %record.name(),
            "Changing record set"
        );

        let change = Change::builder()
            .action(change_action(action))
            .resource_record_set(build_record_set(record)?)
            .build()?;

        self.client
            .change_resource_record_sets()
            .hosted_zone_id(zone_id)
            .change_batch(ChangeBatch::builder().changes(change).build()?)
            .send()
            .await
            .map_err(|e| classify_sdk("change record sets", "record set", record.name(), &e))?;

        Ok(())
    }
}

fn change_action(action: RecordAction) -> ChangeAction {
    match action {
        RecordAction::Create => ChangeAction::Create,
        RecordAction::Upsert => ChangeAction::Upsert,
        RecordAction::Delete => ChangeAction::Delete,
    }
}

/// Route 53 returns zone ids as `/hostedzone/Z123...`; keep the bare id.
pub(crate) fn normalize_zone_id(id: &str) -> &str {
    id.trim_start_matches("/hostedzone/")
}

/// Build the SDK record set for one of our record shapes.
pub(crate) fn build_record_set(record: &RecordSet) -> Result<ResourceRecordSet> {
    let record_set = match record {
        RecordSet::AliasA { name, target } => ResourceRecordSet::builder()
            .name(name)
            .r#type(RrType::A)
            .alias_target(
                AliasTarget::builder()
                    .hosted_zone_id(&target.hosted_zone_id)
                    .dns_name(&target.dns_name)
                    .evaluate_target_health(false)
                    .build()?,
            )
            .build()?,
        RecordSet::Cname { name, value, ttl } => ResourceRecordSet::builder()
            .name(name)
            .r#type(RrType::Cname)
            .ttl(*ttl)
            .resource_records(ResourceRecord::builder().value(value).build()?)
            .build()?,
    };
    Ok(record_set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AliasTarget as AliasTargetSpec;

    #[test]
    fn normalize_strips_the_prefix() {
        assert_eq!(normalize_zone_id("/hostedzone/Z0123456789"), "Z0123456789");
        assert_eq!(normalize_zone_id("Z0123456789"), "Z0123456789");
    }

    #[test]
    fn alias_record_set_shape() {
        let record = RecordSet::AliasA {
            name: "example.com".to_string(),
            target: AliasTargetSpec {
                hosted_zone_id: "Z2FDTNDATAQYW2".to_string(),
                dns_name: "d1234.cloudfront.net".to_string(),
            },
        };

        let record_set = build_record_set(&record).unwrap();
        assert_eq!(record_set.name(), "example.com");
        assert_eq!(record_set.r#type(), &RrType::A);

        let alias = record_set.alias_target().unwrap();
        assert_eq!(alias.hosted_zone_id(), "Z2FDTNDATAQYW2");
        assert_eq!(alias.dns_name(), "d1234.cloudfront.net");
        assert!(!alias.evaluate_target_health());
    }

    #[test]
    fn cname_record_set_shape() {
        let record = RecordSet::Cname {
            name: "_abc123.example.com".to_string(),
            value: "_def456.acm-validations.aws".to_string(),
            ttl: 300,
        };

        let record_set = build_record_set(&record).unwrap();
        assert_eq!(record_set.r#type(), &RrType::Cname);
        assert_eq!(record_set.ttl(), Some(300));
        let values = record_set.resource_records();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].value(), "_def456.acm-validations.aws");
    }

    #[test]
    fn change_action_mapping() {
        assert_eq!(change_action(RecordAction::Create), ChangeAction::Create);
        assert_eq!(change_action(RecordAction::Upsert), ChangeAction::Upsert);
        assert_eq!(change_action(RecordAction::Delete), ChangeAction::Delete);
    }
}
