//! AWS account validation and identity

use crate::aws::error::{ProvisionError, Result, classify_sdk};
use tracing::info;

/// Strongly-typed AWS account ID (12-digit string)
///
/// This newtype prevents accidentally mixing account IDs with other strings
/// and ensures account validation happens at specific points in the code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display, derive_more::Deref)]
pub struct AccountId(String);

impl AccountId {
    /// Create an AccountId for testing purposes
    #[cfg(test)]
    pub fn new(s: String) -> Self {
        AccountId(s)
    }
}

/// Fetch the current AWS account ID from credentials via STS GetCallerIdentity
///
/// This operation requires no special permissions - it always succeeds if
/// credentials are valid. The run calls it before touching any resource so
/// that bad credentials fail the preflight, not a half-finished sequence.
pub async fn get_current_account_id(config: &aws_config::SdkConfig) -> Result<AccountId> {
    let sts = aws_sdk_sts::Client::new(config);
    let identity = sts
        .get_caller_identity()
        .send()
        .await
        .map_err(|e| classify_sdk("get caller identity", "credentials", "", &e))?;

    let account = identity
        .account()
        .ok_or_else(|| {
            ProvisionError::provider(
                "get caller identity",
                "no account ID returned from STS GetCallerIdentity",
            )
        })?;

    info!(account_id = %account, "AWS account validated");

    Ok(AccountId(account.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_id_display_and_deref() {
        let id = AccountId::new("123456789012".to_string());
        assert_eq!(id.to_string(), "123456789012");
        assert_eq!(id.len(), 12);
    }
}
