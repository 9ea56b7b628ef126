//! miden-client backed implementation of the workflow seams.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use miden_client::{
    account::{
        component::{AuthRpoFalcon512, BasicFungibleFaucet, BasicWallet},
        Account, AccountId, AccountStorageMode, AccountType,
    },
    asset::{FungibleAsset, TokenSymbol},
    auth::AuthSecretKey,
    builder::ClientBuilder,
    crypto::SecretKey,
    keystore::FilesystemKeyStore,
    rpc::{Endpoint, TonicRpcClient},
    transaction::{
        TransactionKernel, TransactionRequest, TransactionRequestBuilder, TransactionScript,
    },
    Client, Felt, Word,
};
use miden_lib::utils::ScriptBuilder;
use miden_objects::{
    account::{AccountBuilder, AccountComponent},
    assembly::{DefaultSourceManager, Library, LibraryPath, Module, ModuleKind},
    block::BlockNumber,
    transaction::TransactionId,
};
use rand::{rngs::StdRng, RngCore};
use registry_workflows::{
    script::ScriptedCall, AccountHandle, ClientProvider, ConsumableNote, ContractLibrary,
    EnvironmentError, FaucetSpec, LedgerClient, LedgerError, NodeEndpoint, TransactionIntent,
    COMPONENT,
};
use tracing::{debug, info};

/// Default RPC timeout.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

const KEYSTORE_DIR: &str = "keystore";
const STORE_FILE: &str = "store.sqlite3";

// CLIENT SETUP
// ================================================================================================

/// A client together with the keystore holding its account keys.
pub struct ClientSetup {
    pub client: Client<FilesystemKeyStore<StdRng>>,
    pub keystore: Arc<FilesystemKeyStore<StdRng>>,
}

/// Initialize a client talking to `endpoint`, keeping its store and keystore under `data_dir`.
pub async fn setup_client(
    endpoint: &NodeEndpoint,
    data_dir: &Path,
    timeout_ms: u64,
) -> Result<ClientSetup, LedgerError> {
    // Initialize RPC connection
    let endpoint = rpc_endpoint(endpoint)?;
    let rpc_api = Arc::new(TonicRpcClient::new(&endpoint, timeout_ms));

    // Initialize keystore
    let keystore_path = data_dir.join(KEYSTORE_DIR);
    let keystore = Arc::new(
        FilesystemKeyStore::<StdRng>::new(keystore_path)
            .map_err(LedgerError::during("open keystore"))?,
    );

    let store_path = data_dir.join(STORE_FILE);
    let client = ClientBuilder::new()
        .rpc(rpc_api)
        .sqlite_store(&store_path.to_string_lossy())
        .authenticator(keystore.clone())
        .in_debug_mode(true.into())
        .build()
        .await
        .map_err(LedgerError::during("build client"))?;

    info!(target: COMPONENT, %endpoint, data_dir = %data_dir.display(), "client created");

    Ok(ClientSetup { client, keystore })
}

fn rpc_endpoint(endpoint: &NodeEndpoint) -> Result<Endpoint, LedgerError> {
    Ok(match endpoint {
        NodeEndpoint::Testnet => Endpoint::testnet(),
        NodeEndpoint::Devnet => Endpoint::devnet(),
        NodeEndpoint::Localhost => Endpoint::localhost(),
        NodeEndpoint::Custom(url) => {
            Endpoint::try_from(url.as_str()).map_err(LedgerError::during("parse node endpoint"))?
        },
    })
}

// PROVIDER
// ================================================================================================

/// Creates sqlite backed clients under a data directory.
#[derive(Debug, Clone)]
pub struct MidenProvider {
    data_dir: PathBuf,
    timeout_ms: u64,
}

impl MidenProvider {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}

#[async_trait(?Send)]
impl ClientProvider for MidenProvider {
    type Client = MidenLedger;

    /// The client drives its RPC connection on the ambient tokio runtime and keeps its store on
    /// disk, so both have to be available.
    fn check_environment(&self) -> Result<(), EnvironmentError> {
        tokio::runtime::Handle::try_current().map_err(|_| EnvironmentError::MissingRuntime)?;
        std::fs::create_dir_all(&self.data_dir).map_err(|source| {
            EnvironmentError::DataDirectory { path: self.data_dir.clone(), source }
        })
    }

    async fn connect(&self, endpoint: &NodeEndpoint) -> Result<MidenLedger, LedgerError> {
        let setup = setup_client(endpoint, &self.data_dir, self.timeout_ms).await?;
        Ok(MidenLedger::new(setup))
    }
}

// LEDGER
// ================================================================================================

pub struct MidenLedger {
    client: Client<FilesystemKeyStore<StdRng>>,
    keystore: Arc<FilesystemKeyStore<StdRng>>,
}

impl MidenLedger {
    pub fn new(setup: ClientSetup) -> Self {
        Self { client: setup.client, keystore: setup.keystore }
    }

    /// Builds an account authenticated by a fresh RpoFalcon512 key and adds it, together with
    /// its key, to the client.
    async fn create_account(
        &mut self,
        account_type: AccountType,
        storage_mode: AccountStorageMode,
        component: impl Into<AccountComponent>,
    ) -> Result<AccountHandle, LedgerError> {
        let mut init_seed = [0_u8; 32];
        self.client.rng().fill_bytes(&mut init_seed);

        let key_pair = SecretKey::with_rng(self.client.rng());

        let (account, seed) = AccountBuilder::new(init_seed)
            .account_type(account_type)
            .storage_mode(storage_mode)
            .with_auth_component(AuthRpoFalcon512::new(key_pair.public_key()))
            .with_component(component)
            .build()
            .map_err(LedgerError::during("build account"))?;

        self.track(&account, seed, key_pair).await?;
        debug!(target: COMPONENT, account = %account.id(), ?account_type, "account created");

        Ok(account_handle(&account))
    }

    async fn track(
        &mut self,
        account: &Account,
        seed: Word,
        key_pair: SecretKey,
    ) -> Result<(), LedgerError> {
        self.client
            .add_account(account, Some(seed), false)
            .await
            .map_err(LedgerError::during("add account"))?;
        self.keystore
            .add_key(&AuthSecretKey::RpoFalcon512(key_pair))
            .map_err(LedgerError::during("store account key"))
    }

    fn transaction_request(
        &mut self,
        intent: TransactionIntent,
    ) -> Result<TransactionRequest, LedgerError> {
        match intent {
            TransactionIntent::CustomScript(call) => {
                let script = compile_script(&call)?;
                TransactionRequestBuilder::new()
                    .custom_script(script)
                    .build()
                    .map_err(LedgerError::during("build script transaction request"))
            },
            TransactionIntent::Mint(mint) => {
                let asset = FungibleAsset::new(mint.faucet_id, mint.amount)
                    .map_err(LedgerError::during("create fungible asset"))?;
                TransactionRequestBuilder::new()
                    .build_mint_fungible_asset(
                        asset,
                        mint.target_id,
                        mint.note_type,
                        self.client.rng(),
                    )
                    .map_err(LedgerError::during("build mint transaction request"))
            },
            TransactionIntent::Consume(consume) => TransactionRequestBuilder::new()
                .build_consume_notes(consume.note_ids().to_vec())
                .map_err(LedgerError::during("build consume transaction request")),
        }
    }
}

fn account_handle(account: &Account) -> AccountHandle {
    AccountHandle {
        id: account.id(),
        nonce: account.nonce().as_int(),
    }
}

#[async_trait(?Send)]
impl LedgerClient for MidenLedger {
    async fn sync_state(&mut self) -> Result<BlockNumber, LedgerError> {
        let summary = self.client.sync_state().await.map_err(LedgerError::during("sync state"))?;
        Ok(summary.block_num)
    }

    async fn get_account(&mut self, id: AccountId) -> Result<Option<AccountHandle>, LedgerError> {
        let record = self.client.get_account(id).await.map_err(LedgerError::during("get account"))?;
        Ok(record.map(|record| account_handle(record.account())))
    }

    async fn import_account(&mut self, id: AccountId) -> Result<(), LedgerError> {
        self.client
            .import_account_by_id(id)
            .await
            .map_err(LedgerError::during("import account"))
    }

    async fn new_wallet(
        &mut self,
        storage_mode: AccountStorageMode,
    ) -> Result<AccountHandle, LedgerError> {
        self.create_account(AccountType::RegularAccountUpdatableCode, storage_mode, BasicWallet)
            .await
    }

    async fn new_faucet(&mut self, spec: &FaucetSpec) -> Result<AccountHandle, LedgerError> {
        let symbol =
            TokenSymbol::new(&spec.symbol).map_err(LedgerError::during("parse token symbol"))?;
        let faucet = BasicFungibleFaucet::new(symbol, spec.decimals, Felt::new(spec.max_supply))
            .map_err(LedgerError::during("create faucet component"))?;

        self.create_account(AccountType::FungibleFaucet, spec.storage_mode, faucet).await
    }

    async fn submit(
        &mut self,
        executor: AccountId,
        intent: TransactionIntent,
    ) -> Result<TransactionId, LedgerError> {
        let kind = intent.kind();
        let request = self.transaction_request(intent)?;

        let tx_result = self
            .client
            .new_transaction(executor, request)
            .await
            .map_err(LedgerError::during("execute transaction"))?;
        let tx_id = tx_result.executed_transaction().id();

        self.client
            .submit_transaction(tx_result)
            .await
            .map_err(LedgerError::during("submit transaction"))?;

        info!(target: COMPONENT, kind, %executor, tx_id = %tx_id.to_hex(), "transaction submitted");
        Ok(tx_id)
    }

    async fn consumable_notes(
        &mut self,
        account: AccountId,
    ) -> Result<Vec<ConsumableNote>, LedgerError> {
        let notes = self
            .client
            .get_consumable_notes(Some(account))
            .await
            .map_err(LedgerError::during("get consumable notes"))?;

        Ok(notes.into_iter().map(|(record, _)| ConsumableNote::new(record.id())).collect())
    }
}

// SCRIPTS
// ================================================================================================

/// Assembles `library` into a library that transaction scripts can call into.
pub fn create_library(library: &ContractLibrary) -> Result<Library, LedgerError> {
    let assembler = TransactionKernel::assembler().with_debug_mode(true);
    let source_manager = Arc::new(DefaultSourceManager::default());

    let path = LibraryPath::new(&library.path).map_err(LedgerError::during("parse library path"))?;
    let module = Module::parser(ModuleKind::Library)
        .parse_str(path, library.source.as_str(), &source_manager)
        .map_err(|report| LedgerError::new("parse contract source", report.to_string()))?;

    assembler
        .assemble_library([module])
        .map_err(|report| LedgerError::new("assemble contract library", report.to_string()))
}

/// Compiles `call` against its contract library.
pub fn compile_script(call: &ScriptedCall) -> Result<TransactionScript, LedgerError> {
    let library = create_library(call.library())?;

    ScriptBuilder::new(true)
        .with_dynamically_linked_library(&library)
        .map_err(LedgerError::during("link contract library"))?
        .compile_tx_script(call.source())
        .map_err(LedgerError::during("compile transaction script"))
}
