use miden_client::account::{AccountId, AccountStorageMode};
use miden_objects::transaction::TransactionId;
use tracing::{info, instrument, warn};

use crate::account::resolve_account;
use crate::client::{
    AccountHandle, ClientProvider, ConsumeRequest, FaucetSpec, LedgerClient, MintRequest, Sleeper,
    TransactionIntent,
};
use crate::config::{FaucetConfig, FaucetSource};
use crate::errors::WorkflowError;
use crate::poll::{poll_consumable_notes, PollOutcome};
use crate::stage::{StageLog, WorkflowStage};
use crate::COMPONENT;

// OUTCOME
// ================================================================================================

/// What happened to the minted notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Consumption {
    /// All notes found were consumed by this transaction.
    Consumed(TransactionId),
    /// No note became consumable within the polling budget. The mint may still land later, in
    /// which case the notes have to be consumed manually.
    Pending { attempts: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaucetOutcome {
    pub faucet_id: AccountId,
    pub consumption: Consumption,
}

impl FaucetOutcome {
    /// Id of the consumption transaction, absent if consumption is still pending.
    pub fn tx_id(&self) -> Option<TransactionId> {
        match self.consumption {
            Consumption::Consumed(tx_id) => Some(tx_id),
            Consumption::Pending { .. } => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.consumption, Consumption::Pending { .. })
    }
}

// WORKFLOW
// ================================================================================================

/// Faucet source with its account id already parsed.
enum FaucetPlan<'a> {
    Resolve(AccountId),
    Deploy(&'a FaucetSpec),
}

/// Connects to the configured node, mints tokens to the recipient and consumes them.
///
/// Fails with [`WorkflowError::Environment`] before any remote call if the provider cannot host
/// a client.
#[instrument(target = COMPONENT, name = "create-faucet", skip_all, fields(endpoint = %config.endpoint))]
pub async fn create_faucet<P, S>(
    provider: &P,
    sleeper: &mut S,
    config: &FaucetConfig,
    stages: &mut StageLog,
) -> Result<FaucetOutcome, WorkflowError>
where
    P: ClientProvider + ?Sized,
    S: Sleeper + ?Sized,
{
    provider.check_environment()?;
    let mut client = provider.connect(&config.endpoint).await?;

    provision_faucet(&mut client, sleeper, config, stages).await
}

/// Runs the faucet workflow on an already connected client.
///
/// Steps run strictly in sequence:
///
/// 1. create a disposable intermediary wallet, then let client state settle;
/// 2. resolve (or deploy) the faucet and resolve the recipient, then settle again;
/// 3. submit the mint and wait for it to be confirmed;
/// 4. poll for consumable notes;
/// 5. consume every note found in one transaction.
///
/// If step 4 finds nothing the workflow still succeeds, with [`Consumption::Pending`].
pub async fn provision_faucet<C, S>(
    client: &mut C,
    sleeper: &mut S,
    config: &FaucetConfig,
    stages: &mut StageLog,
) -> Result<FaucetOutcome, WorkflowError>
where
    C: LedgerClient + ?Sized,
    S: Sleeper + ?Sized,
{
    let recipient_id = config.recipient.parse()?;
    let faucet_plan = match &config.faucet {
        FaucetSource::Existing(faucet) => FaucetPlan::Resolve(faucet.parse()?),
        FaucetSource::Deploy(spec) => FaucetPlan::Deploy(spec),
    };

    let block = client.sync_state().await?;
    stages.record(WorkflowStage::ClientReady { block });

    let intermediary = client.new_wallet(AccountStorageMode::Public).await?;
    stages.record(WorkflowStage::AccountCreated(intermediary.id));
    sleeper.sleep(config.delays.settle).await;

    let faucet = match faucet_plan {
        FaucetPlan::Resolve(faucet_id) => resolve_account(client, faucet_id).await?,
        FaucetPlan::Deploy(spec) => {
            let faucet = client.new_faucet(spec).await?;
            stages.record(WorkflowStage::AccountCreated(faucet.id));
            faucet
        },
    };
    let recipient = resolve_account(client, recipient_id).await?;
    stages.record(WorkflowStage::AccountsResolved);

    info!(
        target: COMPONENT,
        faucet_id = %faucet.id,
        recipient = %recipient.id,
        symbol = %config.token_symbol,
        amount = config.amount,
        "minting tokens"
    );
    sleeper.sleep(config.delays.settle).await;

    let mint_tx = mint(client, &faucet, &recipient, config).await?;
    stages.record(WorkflowStage::TransactionSubmitted(mint_tx));

    info!(
        target: COMPONENT,
        delay = ?config.delays.mint_confirmation,
        "waiting for mint confirmation"
    );
    sleeper.sleep(config.delays.mint_confirmation).await;

    let block = client.sync_state().await?;
    stages.record(WorkflowStage::StateSynced { block });

    let outcome =
        poll_consumable_notes(client, sleeper, recipient.id, &config.poll, stages).await?;
    let (request, attempts) = match outcome {
        PollOutcome::NotesFound { attempt, notes } => {
            (ConsumeRequest::from_notes(&notes), attempt + 1)
        },
        PollOutcome::Exhausted { attempts } => (None, attempts),
    };

    let Some(request) = request else {
        warn!(
            target: COMPONENT,
            faucet_id = %faucet.id,
            attempts,
            "no consumable notes found, notes may need to be consumed manually later"
        );
        return Ok(FaucetOutcome {
            faucet_id: faucet.id,
            consumption: Consumption::Pending { attempts },
        });
    };

    let consume_tx = consume(client, &recipient, request).await?;
    stages.record(WorkflowStage::NotesConsumed(consume_tx));

    Ok(FaucetOutcome {
        faucet_id: faucet.id,
        consumption: Consumption::Consumed(consume_tx),
    })
}

#[instrument(target = COMPONENT, name = "mint", skip_all, fields(faucet_id = %faucet.id))]
async fn mint<C>(
    client: &mut C,
    faucet: &AccountHandle,
    recipient: &AccountHandle,
    config: &FaucetConfig,
) -> Result<TransactionId, WorkflowError>
where
    C: LedgerClient + ?Sized,
{
    let request = MintRequest {
        faucet_id: faucet.id,
        target_id: recipient.id,
        amount: config.amount,
        note_type: config.note_type,
    };

    Ok(client.submit(faucet.id, TransactionIntent::Mint(request)).await?)
}

#[instrument(target = COMPONENT, name = "consume-notes", skip_all, fields(account = %recipient.id))]
async fn consume<C>(
    client: &mut C,
    recipient: &AccountHandle,
    request: ConsumeRequest,
) -> Result<TransactionId, WorkflowError>
where
    C: LedgerClient + ?Sized,
{
    info!(target: COMPONENT, notes = ?request.note_ids(), "consuming notes");

    Ok(client.submit(recipient.id, TransactionIntent::Consume(request)).await?)
}
