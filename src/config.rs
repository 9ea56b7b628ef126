use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use miden_client::note::NoteType;

use crate::account::AccountRef;
use crate::client::FaucetSpec;

// CONSTANTS
// ================================================================================================

/// Registry contract deployed on testnet.
pub const DEFAULT_REGISTRY_CONTRACT_ID: &str = "0x3973b471f2101b005c5327803da9aa";

/// Payment token written into the registry by default.
pub const DEFAULT_PAYMENT_TOKEN_ID: &str = "0x508ade02b85a6220218f85140adf52";

/// Pre-existing faucet used to mint registration tokens.
pub const DEFAULT_FAUCET_ID: &str = "0x300d81593c4e7e2054c497c114b9e5";

/// Account receiving minted tokens by default.
pub const DEFAULT_RECIPIENT: &str = "mtst1qq2jywv88azv2yp6ynyc7m6nj9cqqedpxzq";

pub const DEFAULT_TOKEN_SYMBOL: &str = "REG";

pub const DEFAULT_MINT_AMOUNT: u64 = 50_000_000_000;

/// Symbolic path the registry contract library is linked under.
pub const REGISTRY_LIBRARY_PATH: &str = "external_contract::registry_contract";

const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(1);
const DEFAULT_MINT_CONFIRMATION_DELAY: Duration = Duration::from_secs(30);
const DEFAULT_POLL_BACKOFF: Duration = Duration::from_secs(15);
const DEFAULT_POLL_RETRIES: u32 = 3;

// NODE ENDPOINT
// ================================================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum NodeEndpoint {
    #[default]
    Testnet,
    Devnet,
    Localhost,
    Custom(String),
}

impl FromStr for NodeEndpoint {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "testnet" => Self::Testnet,
            "devnet" => Self::Devnet,
            "localhost" => Self::Localhost,
            url => Self::Custom(url.to_string()),
        })
    }
}

impl fmt::Display for NodeEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Testnet => f.write_str("https://rpc.testnet.miden.io"),
            Self::Devnet => f.write_str("https://rpc.devnet.miden.io"),
            Self::Localhost => f.write_str("http://localhost:57291"),
            Self::Custom(url) => f.write_str(url),
        }
    }
}

// TIMING
// ================================================================================================

/// Delay applied before the n-th retry of a poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    Fixed(Duration),
    /// Doubles after every retry, starting at `initial` and capped at `max`.
    Exponential { initial: Duration, max: Duration },
}

impl Backoff {
    /// Returns the delay preceding retry number `retry`, counting from 1.
    pub fn delay(&self, retry: u32) -> Duration {
        match *self {
            Self::Fixed(delay) => delay,
            Self::Exponential { initial, max } => {
                let factor = 1u32.checked_shl(retry.saturating_sub(1)).unwrap_or(u32::MAX);
                initial.saturating_mul(factor).min(max)
            },
        }
    }
}

/// Bounds the consumable-note polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_retries: u32,
    pub backoff: Backoff,
}

impl PollPolicy {
    /// Total number of queries, the initial one included.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_POLL_RETRIES,
            backoff: Backoff::Fixed(DEFAULT_POLL_BACKOFF),
        }
    }
}

/// Fixed pauses between dependent steps of the faucet workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delays {
    /// Applied after creating the intermediary account and again before minting.
    pub settle: Duration,
    /// Applied after the mint is submitted, before looking for notes.
    pub mint_confirmation: Duration,
}

impl Default for Delays {
    fn default() -> Self {
        Self {
            settle: DEFAULT_SETTLE_DELAY,
            mint_confirmation: DEFAULT_MINT_CONFIRMATION_DELAY,
        }
    }
}

// CONFIG UPDATE
// ================================================================================================

/// Contract source text together with the path it is linked under in scripts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractLibrary {
    pub path: String,
    pub source: String,
}

impl ContractLibrary {
    pub fn new(path: impl Into<String>, source: impl Into<String>) -> Self {
        Self { path: path.into(), source: source.into() }
    }

    /// The registry contract linked under [`REGISTRY_LIBRARY_PATH`].
    pub fn registry(source: impl Into<String>) -> Self {
        Self::new(REGISTRY_LIBRARY_PATH, source)
    }

    /// Name scripts refer to the library by, i.e. the last path segment.
    pub fn alias(&self) -> &str {
        self.path.rsplit("::").next().unwrap_or(&self.path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigUpdateConfig {
    pub endpoint: NodeEndpoint,
    pub contract_id: AccountRef,
    pub payment_token_id: AccountRef,
    pub library: ContractLibrary,
}

impl ConfigUpdateConfig {
    /// Testnet defaults with the registry contract compiled from `registry_source`.
    pub fn new(registry_source: impl Into<String>) -> Self {
        Self {
            endpoint: NodeEndpoint::default(),
            contract_id: AccountRef::from(DEFAULT_REGISTRY_CONTRACT_ID),
            payment_token_id: AccountRef::from(DEFAULT_PAYMENT_TOKEN_ID),
            library: ContractLibrary::registry(registry_source),
        }
    }
}

// FAUCET
// ================================================================================================

/// Where the minting faucet comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaucetSource {
    /// Resolve a faucet that already exists on chain.
    Existing(AccountRef),
    /// Deploy a fresh fungible faucet.
    Deploy(FaucetSpec),
}

impl Default for FaucetSource {
    fn default() -> Self {
        Self::Existing(AccountRef::from(DEFAULT_FAUCET_ID))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaucetConfig {
    pub endpoint: NodeEndpoint,
    pub recipient: AccountRef,
    pub faucet: FaucetSource,
    pub amount: u64,
    pub note_type: NoteType,
    /// Display only, shown in logs.
    pub token_symbol: String,
    pub delays: Delays,
    pub poll: PollPolicy,
}

impl Default for FaucetConfig {
    fn default() -> Self {
        Self {
            endpoint: NodeEndpoint::default(),
            recipient: AccountRef::from(DEFAULT_RECIPIENT),
            faucet: FaucetSource::default(),
            amount: DEFAULT_MINT_AMOUNT,
            note_type: NoteType::Public,
            token_symbol: DEFAULT_TOKEN_SYMBOL.to_string(),
            delays: Delays::default(),
            poll: PollPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{Backoff, ContractLibrary, NodeEndpoint, PollPolicy, REGISTRY_LIBRARY_PATH};

    const SECOND: Duration = Duration::from_secs(1);

    #[rstest::rstest]
    #[case::fixed_first(Backoff::Fixed(15 * SECOND), 1, 15 * SECOND)]
    #[case::fixed_third(Backoff::Fixed(15 * SECOND), 3, 15 * SECOND)]
    #[case::exp_first(Backoff::Exponential { initial: SECOND, max: 60 * SECOND }, 1, SECOND)]
    #[case::exp_second(Backoff::Exponential { initial: SECOND, max: 60 * SECOND }, 2, 2 * SECOND)]
    #[case::exp_fourth(Backoff::Exponential { initial: SECOND, max: 60 * SECOND }, 4, 8 * SECOND)]
    #[case::exp_capped(Backoff::Exponential { initial: SECOND, max: 60 * SECOND }, 10, 60 * SECOND)]
    #[case::exp_overflow(Backoff::Exponential { initial: SECOND, max: 60 * SECOND }, 40, 60 * SECOND)]
    fn backoff_delay(#[case] backoff: Backoff, #[case] retry: u32, #[case] expected: Duration) {
        assert_eq!(backoff.delay(retry), expected);
    }

    #[test]
    fn default_policy_allows_four_queries() {
        let policy = PollPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.max_attempts(), 4);
        assert_eq!(policy.backoff, Backoff::Fixed(15 * SECOND));
    }

    #[rstest::rstest]
    #[case::testnet("testnet", NodeEndpoint::Testnet)]
    #[case::devnet("devnet", NodeEndpoint::Devnet)]
    #[case::localhost("localhost", NodeEndpoint::Localhost)]
    #[case::custom("https://node.example:443", NodeEndpoint::Custom("https://node.example:443".into()))]
    fn endpoint_from_str(#[case] input: &str, #[case] expected: NodeEndpoint) {
        assert_eq!(input.parse::<NodeEndpoint>().unwrap(), expected);
    }

    #[test]
    fn registry_library_alias_is_last_segment() {
        let library = ContractLibrary::registry("export.foo\nend");
        assert_eq!(library.path, REGISTRY_LIBRARY_PATH);
        assert_eq!(library.alias(), "registry_contract");
        assert_eq!(ContractLibrary::new("plain", "").alias(), "plain");
    }
}
