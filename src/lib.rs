//! Orchestration of registry and faucet workflows against a Miden node.
//!
//! Two workflows are provided:
//!
//! - [`change_token`] updates the payment token stored by the registry contract by executing a
//!   transaction script that calls its exported `set_payment_token` procedure.
//! - [`create_faucet`] mints tokens from a faucet to a recipient account, waits for the minted
//!   notes to become consumable and consumes them into the recipient.
//!
//! Both workflows talk to the network exclusively through the [`LedgerClient`] seam and obtain
//! their client from a [`ClientProvider`], so the orchestration can be exercised against a fake
//! ledger. The miden-client backed implementation lives in the `helpers` crate.

pub mod account;
pub mod client;
pub mod config;
pub mod errors;
pub mod poll;
pub mod script;
pub mod stage;

mod workflow;

pub use account::{resolve_account, AccountRef};
pub use client::{
    AccountHandle, ClientProvider, ConsumableNote, ConsumeRequest, FaucetSpec, LedgerClient,
    MintRequest, Sleeper, TokioSleeper, TransactionIntent,
};
pub use config::{
    Backoff, ConfigUpdateConfig, ContractLibrary, Delays, FaucetConfig, FaucetSource,
    NodeEndpoint, PollPolicy,
};
pub use errors::{AccountParseError, EnvironmentError, LedgerError, WorkflowError};
pub use stage::{StageLog, WorkflowStage};
pub use workflow::{
    change_token, create_faucet, provision_faucet, update_payment_token, Consumption,
    FaucetOutcome, TokenUpdate,
};

/// Tracing target used by every workflow span and event.
pub const COMPONENT: &str = "registry-workflows";
