//! Resource tag constants
//!
//! Resources whose create call accepts tags in-band (certificate, pipeline)
//! carry these tags so they can be found later. The other services in the
//! sequence would need separate tagging calls; those ride nothing and stay
//! untagged.

use crate::aws::error::Result;

/// Tag key for tool identification
pub const TAG_TOOL: &str = "sitelift:tool";

/// Tag value for tool identification
pub const TAG_TOOL_VALUE: &str = "sitelift";

/// Tag key for the site (apex domain) a resource belongs to
pub const TAG_SITE: &str = "sitelift:site";

/// Tag key for creation timestamp (RFC 3339 format)
pub const TAG_CREATED_AT: &str = "sitelift:created-at";

/// Helper to format creation timestamp for tags
pub fn format_created_at(time: chrono::DateTime<chrono::Utc>) -> String {
    time.to_rfc3339()
}

/// Standard tags for RequestCertificate.
pub fn acm_tags(site: &str) -> Result<Vec<aws_sdk_acm::types::Tag>> {
    use aws_sdk_acm::types::Tag;

    let created_at = format_created_at(chrono::Utc::now());
    Ok(vec![
        Tag::builder().key(TAG_TOOL).value(TAG_TOOL_VALUE).build()?,
        Tag::builder().key(TAG_SITE).value(site).build()?,
        Tag::builder().key(TAG_CREATED_AT).value(&created_at).build()?,
    ])
}

/// Standard tags for CreatePipeline.
pub fn pipeline_tags(site: &str) -> Result<Vec<aws_sdk_codepipeline::types::Tag>> {
    use aws_sdk_codepipeline::types::Tag;

    let created_at = format_created_at(chrono::Utc::now());
    Ok(vec![
        Tag::builder().key(TAG_TOOL).value(TAG_TOOL_VALUE).build()?,
        Tag::builder().key(TAG_SITE).value(site).build()?,
        Tag::builder().key(TAG_CREATED_AT).value(&created_at).build()?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acm_tags_carry_the_schema() {
        let tags = acm_tags("example.com").unwrap();
        let keys: Vec<&str> = tags.iter().map(|t| t.key()).collect();
        assert_eq!(keys, vec![TAG_TOOL, TAG_SITE, TAG_CREATED_AT]);
        assert_eq!(tags[1].value(), Some("example.com"));
    }

    #[test]
    fn pipeline_tags_carry_the_schema() {
        let tags = pipeline_tags("example.com").unwrap();
        assert_eq!(tags.len(), 3);
        assert_eq!(tags[0].key(), TAG_TOOL);
        assert_eq!(tags[0].value(), TAG_TOOL_VALUE);
    }

    #[test]
    fn created_at_is_rfc3339() {
        let formatted = format_created_at(chrono::Utc::now());
        assert!(chrono::DateTime::parse_from_rfc3339(&formatted).is_ok());
    }
}
