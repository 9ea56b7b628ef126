use miden_client::account::AccountId;
use miden_client::Felt;
use miden_objects::block::BlockNumber;
use miden_objects::transaction::TransactionId;
use tracing::{info, instrument};

use crate::account::resolve_account;
use crate::client::{ClientProvider, LedgerClient, TransactionIntent};
use crate::config::ConfigUpdateConfig;
use crate::errors::WorkflowError;
use crate::script::{self, TokenId};
use crate::stage::{StageLog, WorkflowStage};
use crate::COMPONENT;

/// Result of a successful payment token update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenUpdate {
    pub contract_id: AccountId,
    pub token_id: AccountId,
    pub token_prefix: Felt,
    pub token_suffix: Felt,
    pub tx_id: TransactionId,
    /// Chain tip after the confirming sync.
    pub block: BlockNumber,
}

/// Connects to the configured node and sets the registry's payment token.
///
/// Fails with [`WorkflowError::Environment`] before any remote call if the provider cannot host
/// a client.
#[instrument(target = COMPONENT, name = "change-token", skip_all, fields(endpoint = %config.endpoint))]
pub async fn change_token<P>(
    provider: &P,
    config: &ConfigUpdateConfig,
    stages: &mut StageLog,
) -> Result<TokenUpdate, WorkflowError>
where
    P: ClientProvider + ?Sized,
{
    provider.check_environment()?;
    let mut client = provider.connect(&config.endpoint).await?;

    update_payment_token(&mut client, config, stages).await
}

/// Sets the registry's payment token using an already connected client.
pub async fn update_payment_token<C>(
    client: &mut C,
    config: &ConfigUpdateConfig,
    stages: &mut StageLog,
) -> Result<TokenUpdate, WorkflowError>
where
    C: LedgerClient + ?Sized,
{
    let contract_id = config.contract_id.parse()?;
    let token = TokenId::new(config.payment_token_id.parse()?);

    let block = client.sync_state().await?;
    stages.record(WorkflowStage::ClientReady { block });

    info!(
        target: COMPONENT,
        token_id = %token.account_id(),
        token_prefix = token.prefix().as_int(),
        token_suffix = token.suffix().as_int(),
        "payment token"
    );

    let contract = resolve_account(client, contract_id).await?;
    stages.record(WorkflowStage::AccountsResolved);

    let call = script::set_payment_token(config.library.clone(), token);
    let tx_id = client.submit(contract.id, TransactionIntent::CustomScript(call)).await?;
    stages.record(WorkflowStage::TransactionSubmitted(tx_id));

    let block = client.sync_state().await?;
    stages.record(WorkflowStage::StateSynced { block });

    info!(
        target: COMPONENT,
        tx_id = %tx_id.to_hex(),
        token_id = %token.account_id(),
        "payment token set"
    );

    Ok(TokenUpdate {
        contract_id: contract.id,
        token_id: token.account_id(),
        token_prefix: token.prefix(),
        token_suffix: token.suffix(),
        tx_id,
        block,
    })
}
