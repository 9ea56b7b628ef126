//! Bounded polling for notes that become consumable once a mint is confirmed.
//!
//! Each attempt queries the consumable notes of one account:
//!
//! - a non-empty answer ends the loop immediately with that set;
//! - an empty answer or a query error is followed by one backoff sleep and the next attempt,
//!   as long as retries remain;
//! - once the last attempt comes back empty the loop is [`PollOutcome::Exhausted`], which is not
//!   an error;
//! - an error on the last attempt is fatal.

use std::time::Duration;

use miden_client::account::AccountId;
use tracing::{debug, instrument, warn};

use crate::client::{ConsumableNote, LedgerClient, Sleeper};
use crate::config::PollPolicy;
use crate::errors::{LedgerError, WorkflowError};
use crate::stage::{StageLog, WorkflowStage};
use crate::COMPONENT;

// STATE MACHINE
// ================================================================================================

/// Terminal states of a poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Notes observed on `attempt`, counting from 0.
    NotesFound { attempt: u32, notes: Vec<ConsumableNote> },
    /// Every attempt came back empty.
    Exhausted { attempts: u32 },
}

/// What to do after an attempt.
#[derive(Debug)]
pub enum Transition {
    Done(PollOutcome),
    /// Sleep for `delay`, then run attempt `next_attempt`.
    Retry {
        next_attempt: u32,
        delay: Duration,
        error: Option<LedgerError>,
    },
    Failed(LedgerError),
}

/// Decides the transition following attempt `attempt` which observed `observed`.
pub fn transition(
    policy: &PollPolicy,
    attempt: u32,
    observed: Result<Vec<ConsumableNote>, LedgerError>,
) -> Transition {
    let last_attempt = attempt >= policy.max_retries;

    match observed {
        Ok(notes) if !notes.is_empty() => Transition::Done(PollOutcome::NotesFound { attempt, notes }),
        Ok(_) if last_attempt => {
            Transition::Done(PollOutcome::Exhausted { attempts: attempt.saturating_add(1) })
        },
        Err(error) if last_attempt => Transition::Failed(error),
        observed => Transition::Retry {
            next_attempt: attempt.saturating_add(1),
            delay: policy.backoff.delay(attempt.saturating_add(1)),
            error: observed.err(),
        },
    }
}

// DRIVER
// ================================================================================================

/// Polls `account` for consumable notes according to `policy`.
///
/// Retries sync the client before querying again so that notes committed in the meantime become
/// visible. A failing sync counts as a failed attempt.
#[instrument(
    target = COMPONENT,
    name = "poll-consumable-notes",
    skip_all,
    fields(%account, max_attempts = policy.max_attempts())
)]
pub async fn poll_consumable_notes<C, S>(
    client: &mut C,
    sleeper: &mut S,
    account: AccountId,
    policy: &PollPolicy,
    stages: &mut StageLog,
) -> Result<PollOutcome, WorkflowError>
where
    C: LedgerClient + ?Sized,
    S: Sleeper + ?Sized,
{
    let mut attempt = 0;

    loop {
        stages.record(WorkflowStage::Polling { attempt });

        let observed = if attempt == 0 {
            client.consumable_notes(account).await
        } else {
            match client.sync_state().await {
                Ok(block) => {
                    debug!(target: COMPONENT, %block, "synced before retry");
                    client.consumable_notes(account).await
                },
                Err(err) => Err(err),
            }
        };

        match transition(policy, attempt, observed) {
            Transition::Done(outcome) => {
                match &outcome {
                    PollOutcome::NotesFound { notes, .. } => {
                        stages.record(WorkflowStage::NotesFound { count: notes.len() });
                    },
                    PollOutcome::Exhausted { attempts } => {
                        stages.record(WorkflowStage::Exhausted { attempts: *attempts });
                    },
                }
                return Ok(outcome);
            },
            Transition::Retry { next_attempt, delay, error } => {
                match error {
                    Some(err) => warn!(
                        target: COMPONENT,
                        error = ?err,
                        retry = next_attempt,
                        max_retries = policy.max_retries,
                        "failed to query consumable notes, retrying in {delay:?}",
                    ),
                    None => debug!(
                        target: COMPONENT,
                        retry = next_attempt,
                        max_retries = policy.max_retries,
                        "no consumable notes yet, retrying in {delay:?}",
                    ),
                }
                sleeper.sleep(delay).await;
                attempt = next_attempt;
            },
            Transition::Failed(source) => {
                return Err(WorkflowError::NoteQuery {
                    account,
                    attempts: attempt.saturating_add(1),
                    source,
                });
            },
        }
    }
}
