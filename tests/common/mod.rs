//! Shared fakes for the workflow tests.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, VecDeque};
use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use miden_client::account::{AccountId, AccountStorageMode, AccountType};
use miden_client::note::NoteId;
use miden_client::{Felt, Word};
use miden_objects::block::BlockNumber;
use miden_objects::testing::account_id::AccountIdBuilder;
use miden_objects::transaction::TransactionId;
use registry_workflows::{
    AccountHandle, ClientProvider, ConsumableNote, EnvironmentError, FaucetSpec, LedgerClient,
    LedgerError, NodeEndpoint, Sleeper, TransactionIntent,
};

// IDS
// ================================================================================================

/// Creates a distinct public account id of `account_type` from a seed.
pub fn mock_account_id(seed: u8, account_type: AccountType) -> AccountId {
    AccountIdBuilder::new()
        .account_type(account_type)
        .storage_mode(AccountStorageMode::Public)
        .build_with_seed([seed; 32])
}

pub fn mock_wallet_id(seed: u8) -> AccountId {
    mock_account_id(seed, AccountType::RegularAccountUpdatableCode)
}

fn word(n: u64) -> Word {
    Word::from([Felt::new(n), Felt::new(0), Felt::new(0), Felt::new(0)])
}

/// Creates a unique `TransactionId` from a seed value.
pub fn mock_tx_id(seed: u64) -> TransactionId {
    TransactionId::new(word(seed), word(seed + 1), word(seed + 2), word(seed + 3))
}

pub fn mock_note(seed: u64) -> ConsumableNote {
    ConsumableNote::new(NoteId::new(word(seed), word(seed + 1_000)))
}

// FAKE LEDGER
// ================================================================================================

/// A call received by [`FakeLedger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    SyncState,
    GetAccount(AccountId),
    ImportAccount(AccountId),
    NewWallet,
    NewFaucet(String),
    Submit { executor: AccountId, intent: TransactionIntent },
    ConsumableNotes(AccountId),
}

/// Answer to one consumable-notes query.
pub type NotesAnswer = Result<Vec<ConsumableNote>, &'static str>;

#[derive(Debug, Default)]
struct LedgerState {
    local: BTreeSet<AccountId>,
    importable: BTreeSet<AccountId>,
    note_answers: VecDeque<NotesAnswer>,
    rejected_kinds: BTreeSet<&'static str>,
    calls: Vec<Call>,
    block: u32,
    next_tx: u64,
    next_account: u8,
}

/// In-memory ledger recording every call it receives.
///
/// Clones share state, so a test can keep a handle on a ledger it gave away.
#[derive(Debug, Clone, Default)]
pub struct FakeLedger {
    state: Rc<RefCell<LedgerState>>,
}

impl FakeLedger {
    pub fn new() -> Self {
        let ledger = Self::default();
        ledger.state.borrow_mut().next_account = 100;
        ledger
    }

    /// Marks `id` as tracked by the local client state.
    pub fn with_local(self, id: AccountId) -> Self {
        self.state.borrow_mut().local.insert(id);
        self
    }

    /// Marks `id` as public on chain, so importing it makes it local.
    pub fn with_importable(self, id: AccountId) -> Self {
        self.state.borrow_mut().importable.insert(id);
        self
    }

    /// Queues the answer to the next consumable-notes query. Queries beyond the queued answers
    /// see no notes.
    pub fn answer_notes(self, answer: NotesAnswer) -> Self {
        self.state.borrow_mut().note_answers.push_back(answer);
        self
    }

    /// Makes every submission of `kind` fail as a remote execution error.
    pub fn reject(self, kind: &'static str) -> Self {
        self.state.borrow_mut().rejected_kinds.insert(kind);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.state.borrow().calls.iter().filter(|call| predicate(call)).count()
    }

    pub fn submissions(&self) -> Vec<(AccountId, TransactionIntent)> {
        self.state
            .borrow()
            .calls
            .iter()
            .filter_map(|call| match call {
                Call::Submit { executor, intent } => Some((*executor, intent.clone())),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.state.borrow_mut().calls.push(call);
    }

    fn create_account(&self, account_type: AccountType) -> AccountHandle {
        let mut state = self.state.borrow_mut();
        state.next_account += 1;
        let id = mock_account_id(state.next_account, account_type);
        state.local.insert(id);
        AccountHandle { id, nonce: 0 }
    }
}

#[async_trait(?Send)]
impl LedgerClient for FakeLedger {
    async fn sync_state(&mut self) -> Result<BlockNumber, LedgerError> {
        self.record(Call::SyncState);
        let mut state = self.state.borrow_mut();
        state.block += 1;
        Ok(BlockNumber::from(state.block))
    }

    async fn get_account(&mut self, id: AccountId) -> Result<Option<AccountHandle>, LedgerError> {
        self.record(Call::GetAccount(id));
        let known = self.state.borrow().local.contains(&id);
        Ok(known.then_some(AccountHandle { id, nonce: 1 }))
    }

    async fn import_account(&mut self, id: AccountId) -> Result<(), LedgerError> {
        self.record(Call::ImportAccount(id));
        let mut state = self.state.borrow_mut();
        if state.importable.contains(&id) {
            state.local.insert(id);
        }
        Ok(())
    }

    async fn new_wallet(
        &mut self,
        _storage_mode: AccountStorageMode,
    ) -> Result<AccountHandle, LedgerError> {
        self.record(Call::NewWallet);
        Ok(self.create_account(AccountType::RegularAccountUpdatableCode))
    }

    async fn new_faucet(&mut self, spec: &FaucetSpec) -> Result<AccountHandle, LedgerError> {
        self.record(Call::NewFaucet(spec.symbol.clone()));
        Ok(self.create_account(AccountType::FungibleFaucet))
    }

    async fn submit(
        &mut self,
        executor: AccountId,
        intent: TransactionIntent,
    ) -> Result<TransactionId, LedgerError> {
        let kind = intent.kind();
        self.record(Call::Submit { executor, intent });

        let mut state = self.state.borrow_mut();
        if state.rejected_kinds.contains(kind) {
            return Err(LedgerError::new("execute transaction", "transaction rejected by node"));
        }
        state.next_tx += 10;
        Ok(mock_tx_id(state.next_tx))
    }

    async fn consumable_notes(
        &mut self,
        account: AccountId,
    ) -> Result<Vec<ConsumableNote>, LedgerError> {
        self.record(Call::ConsumableNotes(account));
        match self.state.borrow_mut().note_answers.pop_front() {
            Some(Ok(notes)) => Ok(notes),
            Some(Err(message)) => Err(LedgerError::new("get consumable notes", message)),
            None => Ok(Vec::new()),
        }
    }
}

// FAKE PROVIDER
// ================================================================================================

pub struct FakeProvider {
    supported: bool,
    ledger: FakeLedger,
    connects: Cell<u32>,
}

impl FakeProvider {
    pub fn new(ledger: FakeLedger) -> Self {
        Self { supported: true, ledger, connects: Cell::new(0) }
    }

    /// A provider running somewhere clients cannot be hosted.
    pub fn unsupported(ledger: FakeLedger) -> Self {
        Self { supported: false, ..Self::new(ledger) }
    }

    pub fn connects(&self) -> u32 {
        self.connects.get()
    }
}

#[async_trait(?Send)]
impl ClientProvider for FakeProvider {
    type Client = FakeLedger;

    fn check_environment(&self) -> Result<(), EnvironmentError> {
        if self.supported {
            Ok(())
        } else {
            Err(EnvironmentError::MissingRuntime)
        }
    }

    async fn connect(&self, _endpoint: &NodeEndpoint) -> Result<FakeLedger, LedgerError> {
        self.connects.set(self.connects.get() + 1);
        Ok(self.ledger.clone())
    }
}

// RECORDING SLEEPER
// ================================================================================================

/// Records requested delays without waiting.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    pub sleeps: Vec<Duration>,
}

#[async_trait(?Send)]
impl Sleeper for RecordingSleeper {
    async fn sleep(&mut self, duration: Duration) {
        self.sleeps.push(duration);
    }
}
