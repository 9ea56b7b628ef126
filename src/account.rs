use std::fmt;

use miden_client::account::{AccountId, Address};
use tracing::{debug, info, instrument};

use crate::client::{AccountHandle, LedgerClient};
use crate::errors::{AccountParseError, WorkflowError};
use crate::COMPONENT;

// ACCOUNT REFERENCE
// ================================================================================================

/// An account as written by a user: either a hex account id (`0x...`) or a bech32 address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRef(String);

impl AccountRef {
    pub fn parse(&self) -> Result<AccountId, AccountParseError> {
        let input = self.0.trim();

        if input.starts_with("0x") {
            return AccountId::from_hex(input).map_err(|source| AccountParseError::Hex {
                input: input.to_string(),
                source: source.into(),
            });
        }

        let (_network, address) =
            Address::from_bech32(input).map_err(|source| AccountParseError::Address {
                input: input.to_string(),
                source: source.into(),
            })?;

        #[allow(unreachable_patterns)]
        match address {
            Address::AccountId(address) => Ok(address.id()),
            _ => Err(AccountParseError::NotAnAccount(input.to_string())),
        }
    }
}

impl From<&str> for AccountRef {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for AccountRef {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<AccountId> for AccountRef {
    fn from(id: AccountId) -> Self {
        Self(id.to_hex())
    }
}

impl fmt::Display for AccountRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ACCOUNT RESOLUTION
// ================================================================================================

/// Returns the local handle of `id`, importing the account from the node if the client does not
/// track it yet.
///
/// On a miss the account is imported once, the client is synced and the lookup is retried once.
/// A second miss is fatal.
#[instrument(target = COMPONENT, name = "resolve-account", skip_all, fields(account = %id))]
pub async fn resolve_account<C>(client: &mut C, id: AccountId) -> Result<AccountHandle, WorkflowError>
where
    C: LedgerClient + ?Sized,
{
    if let Some(account) = client.get_account(id).await? {
        debug!(target: COMPONENT, nonce = account.nonce, "account found locally");
        return Ok(account);
    }

    info!(target: COMPONENT, "account not tracked locally, importing from node");
    client.import_account(id).await?;
    client.sync_state().await?;

    client.get_account(id).await?.ok_or(WorkflowError::AccountNotFound(id))
}

#[cfg(test)]
mod tests {
    use super::AccountRef;
    use crate::config::DEFAULT_RECIPIENT;
    use crate::errors::AccountParseError;

    #[test]
    fn parses_hex_account_ids() {
        let id = AccountRef::from("0x300d81593c4e7e2054c497c114b9e5").parse().unwrap();
        assert_eq!(id.to_hex(), "0x300d81593c4e7e2054c497c114b9e5");
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let id = AccountRef::from(" 0x3973b471f2101b005c5327803da9aa\n").parse().unwrap();
        assert_eq!(id.to_hex(), "0x3973b471f2101b005c5327803da9aa");
    }

    #[test]
    fn parses_bech32_addresses() {
        let id = AccountRef::from(DEFAULT_RECIPIENT).parse().unwrap();
        assert_eq!(id.to_hex(), "0x152239873f44c5103a24c98f6f5391");
    }

    #[rstest::rstest]
    #[case::short_hex("0x1234")]
    #[case::non_hex("0xzz0d81593c4e7e2054c497c114b9e5")]
    fn rejects_malformed_hex(#[case] input: &str) {
        let err = AccountRef::from(input).parse().unwrap_err();
        assert!(matches!(err, AccountParseError::Hex { .. }), "unexpected error: {err:?}");
    }

    #[test]
    fn rejects_garbage_addresses() {
        let err = AccountRef::from("not-an-address").parse().unwrap_err();
        assert!(matches!(err, AccountParseError::Address { .. }), "unexpected error: {err:?}");
    }
}
