use std::path::PathBuf;

use miden_client::account::AccountId;
use thiserror::Error;

/// Boxed error used as the source of collaborator failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// ENVIRONMENT ERROR
// ================================================================================================

/// The process is not able to host a client. Raised before any remote call is made.
#[derive(Debug, Error)]
pub enum EnvironmentError {
    #[error("workflows must run inside an async runtime")]
    MissingRuntime,
    #[error("client data directory {} is not usable", path.display())]
    DataDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// LEDGER ERROR
// ================================================================================================

/// A failure reported by the ledger client or the remote node.
#[derive(Debug, Error)]
#[error("{operation} failed")]
pub struct LedgerError {
    operation: &'static str,
    #[source]
    source: BoxError,
}

impl LedgerError {
    pub fn new(operation: &'static str, source: impl Into<BoxError>) -> Self {
        Self { operation, source: source.into() }
    }

    /// Returns a closure wrapping an error into a [`LedgerError`] for `operation`.
    ///
    /// Meant to be used as `.map_err(LedgerError::during("sync state"))`.
    pub fn during<E: Into<BoxError>>(operation: &'static str) -> impl FnOnce(E) -> Self {
        move |source| Self::new(operation, source)
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }
}

// ACCOUNT PARSE ERROR
// ================================================================================================

#[derive(Debug, Error)]
pub enum AccountParseError {
    #[error("invalid hex account id `{input}`")]
    Hex {
        input: String,
        #[source]
        source: BoxError,
    },
    #[error("invalid account address `{input}`")]
    Address {
        input: String,
        #[source]
        source: BoxError,
    },
    #[error("address `{0}` does not reference an account")]
    NotAnAccount(String),
}

// WORKFLOW ERROR
// ================================================================================================

/// Fatal workflow failures. Exhausting the note polling budget is not one of them.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("unsupported execution environment")]
    Environment(#[from] EnvironmentError),
    #[error("account not found after import: {0}")]
    AccountNotFound(AccountId),
    #[error(transparent)]
    InvalidAccount(#[from] AccountParseError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("failed to retrieve consumable notes for {account} after {attempts} attempts")]
    NoteQuery {
        account: AccountId,
        attempts: u32,
        #[source]
        source: LedgerError,
    },
}
