//! Seams between the workflows and the ledger client that performs the actual work.

use std::time::Duration;

use async_trait::async_trait;
use miden_client::account::{AccountId, AccountStorageMode};
use miden_client::note::{NoteId, NoteType};
use miden_objects::block::BlockNumber;
use miden_objects::transaction::TransactionId;

use crate::config::NodeEndpoint;
use crate::errors::{EnvironmentError, LedgerError};
use crate::script::ScriptedCall;

// ACCOUNTS AND NOTES
// ================================================================================================

/// An account known to the local client state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountHandle {
    pub id: AccountId,
    pub nonce: u64,
}

/// A note observed as consumable by a specific account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsumableNote {
    id: NoteId,
}

impl ConsumableNote {
    pub fn new(id: NoteId) -> Self {
        Self { id }
    }

    pub fn id(&self) -> NoteId {
        self.id
    }
}

/// Parameters of a new fungible faucet account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaucetSpec {
    pub symbol: String,
    pub decimals: u8,
    pub max_supply: u64,
    pub storage_mode: AccountStorageMode,
}

impl FaucetSpec {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            decimals: 8,
            max_supply: 1_000_000_000_000_000,
            storage_mode: AccountStorageMode::Public,
        }
    }
}

// TRANSACTION INTENTS
// ================================================================================================

/// Mints `amount` base units of the faucet's asset into a note for `target_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintRequest {
    pub faucet_id: AccountId,
    pub target_id: AccountId,
    pub amount: u64,
    pub note_type: NoteType,
}

/// Consumes a set of notes in a single transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumeRequest {
    note_ids: Vec<NoteId>,
}

impl ConsumeRequest {
    /// Builds a request covering every note in `notes`, or `None` when there is nothing to
    /// consume.
    pub fn from_notes(notes: &[ConsumableNote]) -> Option<Self> {
        if notes.is_empty() {
            return None;
        }
        Some(Self {
            note_ids: notes.iter().map(ConsumableNote::id).collect(),
        })
    }

    pub fn note_ids(&self) -> &[NoteId] {
        &self.note_ids
    }
}

/// A fully specified transaction, handed to [`LedgerClient::submit`] by value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionIntent {
    CustomScript(ScriptedCall),
    Mint(MintRequest),
    Consume(ConsumeRequest),
}

impl TransactionIntent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CustomScript(_) => "custom-script",
            Self::Mint(_) => "mint",
            Self::Consume(_) => "consume",
        }
    }
}

// LEDGER CLIENT
// ================================================================================================

/// The capability surface the workflows consume from a ledger client.
///
/// Futures are not required to be `Send`: a client is driven by exactly one workflow on a
/// single thread.
#[async_trait(?Send)]
pub trait LedgerClient {
    /// Syncs local state with the node and returns the chain tip.
    async fn sync_state(&mut self) -> Result<BlockNumber, LedgerError>;

    /// Looks an account up in local client state.
    async fn get_account(&mut self, id: AccountId) -> Result<Option<AccountHandle>, LedgerError>;

    /// Imports a public account from the node into local client state.
    async fn import_account(&mut self, id: AccountId) -> Result<(), LedgerError>;

    async fn new_wallet(
        &mut self,
        storage_mode: AccountStorageMode,
    ) -> Result<AccountHandle, LedgerError>;

    async fn new_faucet(&mut self, spec: &FaucetSpec) -> Result<AccountHandle, LedgerError>;

    /// Executes `intent` against `executor` and submits the result to the node.
    async fn submit(
        &mut self,
        executor: AccountId,
        intent: TransactionIntent,
    ) -> Result<TransactionId, LedgerError>;

    async fn consumable_notes(
        &mut self,
        account: AccountId,
    ) -> Result<Vec<ConsumableNote>, LedgerError>;
}

/// Creates ledger clients, after checking that the process can host one.
#[async_trait(?Send)]
pub trait ClientProvider {
    type Client: LedgerClient;

    fn check_environment(&self) -> Result<(), EnvironmentError>;

    async fn connect(&self, endpoint: &NodeEndpoint) -> Result<Self::Client, LedgerError>;
}

// SLEEPER
// ================================================================================================

/// Wall-clock delays between dependent steps.
#[async_trait(?Send)]
pub trait Sleeper {
    async fn sleep(&mut self, duration: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait(?Send)]
impl Sleeper for TokioSleeper {
    async fn sleep(&mut self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
