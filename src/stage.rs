use std::fmt;

use miden_client::account::AccountId;
use miden_objects::block::BlockNumber;
use miden_objects::transaction::TransactionId;
use tracing::info;

use crate::COMPONENT;

/// A step a workflow has reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowStage {
    ClientReady { block: BlockNumber },
    AccountCreated(AccountId),
    AccountsResolved,
    TransactionSubmitted(TransactionId),
    StateSynced { block: BlockNumber },
    Polling { attempt: u32 },
    NotesFound { count: usize },
    Exhausted { attempts: u32 },
    NotesConsumed(TransactionId),
}

impl fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClientReady { block } => write!(f, "client ready at block {block}"),
            Self::AccountCreated(id) => write!(f, "account {id} created"),
            Self::AccountsResolved => f.write_str("accounts resolved"),
            Self::TransactionSubmitted(id) => write!(f, "transaction {} submitted", id.to_hex()),
            Self::StateSynced { block } => write!(f, "state synced to block {block}"),
            Self::Polling { attempt } => write!(f, "polling for notes, attempt {attempt}"),
            Self::NotesFound { count } => write!(f, "found {count} consumable note(s)"),
            Self::Exhausted { attempts } => {
                write!(f, "no consumable notes after {attempts} attempts")
            },
            Self::NotesConsumed(id) => write!(f, "notes consumed by {}", id.to_hex()),
        }
    }
}

/// Ordered record of the stages a workflow went through.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StageLog {
    stages: Vec<WorkflowStage>,
}

impl StageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, stage: WorkflowStage) {
        info!(target: COMPONENT, %stage, "workflow stage reached");
        self.stages.push(stage);
    }

    pub fn stages(&self) -> &[WorkflowStage] {
        &self.stages
    }

    pub fn last(&self) -> Option<&WorkflowStage> {
        self.stages.last()
    }

    pub fn contains(&self, stage: &WorkflowStage) -> bool {
        self.stages.contains(stage)
    }
}
