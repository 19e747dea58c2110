//! Bucket policy documents
//!
//! The three policy documents the sequence applies: public website reads,
//! the pipeline artifact store (encrypted uploads over TLS only), and the
//! CloudFront-only read policy that replaces public access once the
//! distribution exists.

use serde_json::{Value, json};

/// Anonymous read access to every object; the bucket serves a public
/// website until the distribution takes over.
pub fn public_read(bucket: &str) -> Value {
    json!({
        "Version": "2012-10-17",
        "Statement": [
            {
                "Effect": "Allow",
                "Principal": "*",
                "Action": "s3:GetObject",
                "Resource": format!("arn:aws:s3:::{bucket}/*")
            }
        ]
    })
}

/// Artifact-store policy: deny uploads without KMS encryption and deny any
/// access over plain HTTP.
pub fn artifact_store(bucket: &str) -> Value {
    json!({
        "Version": "2012-10-17",
        "Id": "SSEAndSSLPolicy",
        "Statement": [
            {
                "Sid": "DenyUnEncryptedObjectUploads",
                "Effect": "Deny",
                "Principal": "*",
                "Action": "s3:PutObject",
                "Resource": format!("arn:aws:s3:::{bucket}/*"),
                "Condition": {
                    "StringNotEquals": {
                        "s3:x-amz-server-side-encryption": "aws:kms"
                    }
                }
            },
            {
                "Sid": "DenyInsecureConnections",
                "Effect": "Deny",
                "Principal": "*",
                "Action": "s3:*",
                "Resource": format!("arn:aws:s3:::{bucket}/*"),
                "Condition": {
                    "Bool": {
                        "aws:SecureTransport": "false"
                    }
                }
            }
        ]
    })
}

/// Read-only access for the CloudFront service principal, conditioned on the
/// requesting distribution's ARN. Applied together with re-blocking public
/// access once the distribution fronts the bucket.
pub fn cloudfront_read(bucket: &str, distribution_arn: &str) -> Value {
    json!({
        "Version": "2008-10-17",
        "Id": "PolicyForCloudFrontPrivateContent",
        "Statement": [
            {
                "Sid": "AllowCloudFrontServicePrincipal",
                "Effect": "Allow",
                "Principal": {
                    "Service": "cloudfront.amazonaws.com"
                },
                "Action": "s3:GetObject",
                "Resource": format!("arn:aws:s3:::{bucket}/*"),
                "Condition": {
                    "StringEquals": {
                        "AWS:SourceArn": distribution_arn
                    }
                }
            }
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_read_targets_all_objects() {
        let policy = public_read("example.com");
        assert_eq!(policy["Statement"][0]["Principal"], "*");
        assert_eq!(
            policy["Statement"][0]["Resource"],
            "arn:aws:s3:::example.com/*"
        );
        assert_eq!(policy["Statement"][0]["Effect"], "Allow");
    }

    #[test]
    fn artifact_store_denies_plaintext_and_http() {
        let policy = artifact_store("example-com-artifacts-us-east-1");
        let statements = policy["Statement"].as_array().unwrap();
        assert_eq!(statements.len(), 2);
        assert!(statements.iter().all(|s| s["Effect"] == "Deny"));
        assert_eq!(
            statements[0]["Condition"]["StringNotEquals"]["s3:x-amz-server-side-encryption"],
            "aws:kms"
        );
        assert_eq!(
            statements[1]["Condition"]["Bool"]["aws:SecureTransport"],
            "false"
        );
    }

    #[test]
    fn cloudfront_read_is_scoped_to_the_distribution() {
        let arn = "arn:aws:cloudfront::123456789012:distribution/E2EXAMPLE";
        let policy = cloudfront_read("example.com", arn);
        let statement = &policy["Statement"][0];
        assert_eq!(statement["Principal"]["Service"], "cloudfront.amazonaws.com");
        assert_eq!(statement["Condition"]["StringEquals"]["AWS:SourceArn"], arn);
        assert_eq!(statement["Action"], "s3:GetObject");
    }
}
