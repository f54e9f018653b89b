#![allow(dead_code)]

use anyhow::{Context, Result};
use async_trait::async_trait;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    hash::Hash,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    transaction::Transaction,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wallet_demo_sdk::{
    AccountFilter, AgentEndpoint, DemoConfig, DemoError, LedgerClient, ProgramAccount,
    SessionManager, WalletAgent,
};

//=============================================================================
// Ledger
//=============================================================================

/// A call received by [`FakeLedger`]
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerCall {
    LatestBlockhash,
    SendRawTransaction(Signature),
    Confirm(Signature, CommitmentConfig),
    Balance(Pubkey),
    Airdrop(Pubkey, u64),
    ProgramAccounts(Pubkey, Vec<AccountFilter>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Failure {
    Blockhash,
    Submit,
    StaleBlockhash,
    ConfirmTimeout,
    Airdrop,
    Query,
}

/// In-memory ledger recording every call
pub struct FakeLedger {
    pub blockhash: Hash,
    pub balance: u64,
    pub program_accounts: Vec<ProgramAccount>,
    calls: Mutex<Vec<LedgerCall>>,
    failures: Mutex<HashSet<Failure>>,
}

impl FakeLedger {
    pub fn new() -> Self {
        Self {
            blockhash: Hash::new_unique(),
            balance: 10_000_000_000,
            program_accounts: Vec::new(),
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(HashSet::new()),
        }
    }

    pub fn with_program_accounts(mut self, accounts: Vec<ProgramAccount>) -> Self {
        self.program_accounts = accounts;
        self
    }

    pub fn fail(&self, failure: Failure) {
        self.failures.lock().unwrap().insert(failure);
    }

    pub fn calls(&self) -> Vec<LedgerCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: LedgerCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn fails(&self, failure: Failure) -> bool {
        self.failures.lock().unwrap().contains(&failure)
    }
}

#[async_trait]
impl LedgerClient for FakeLedger {
    async fn get_latest_blockhash(&self) -> wallet_demo_sdk::Result<Hash> {
        self.record(LedgerCall::LatestBlockhash);
        if self.fails(Failure::Blockhash) {
            return Err(DemoError::Connection("rpc unreachable".to_string()));
        }
        Ok(self.blockhash)
    }

    async fn send_raw_transaction(&self, wire: &[u8]) -> wallet_demo_sdk::Result<Signature> {
        let tx: Transaction = bincode::deserialize(wire)?;
        let signature = tx.signatures[0];
        self.record(LedgerCall::SendRawTransaction(signature));

        if self.fails(Failure::StaleBlockhash) {
            return Err(DemoError::StaleFreshnessToken(
                "Blockhash not found".to_string(),
            ));
        }
        if self.fails(Failure::Submit) {
            return Err(DemoError::SubmissionFailed(
                "insufficient funds for fee".to_string(),
            ));
        }
        if tx.message.recent_blockhash != self.blockhash || tx.verify().is_err() {
            return Err(DemoError::SubmissionFailed("bad transaction".to_string()));
        }
        Ok(signature)
    }

    async fn confirm_transaction(
        &self,
        signature: &Signature,
        commitment: CommitmentConfig,
    ) -> wallet_demo_sdk::Result<()> {
        self.record(LedgerCall::Confirm(*signature, commitment));
        if self.fails(Failure::ConfirmTimeout) {
            return Err(DemoError::ConfirmationTimeout(*signature));
        }
        Ok(())
    }

    async fn get_balance(&self, pubkey: &Pubkey) -> wallet_demo_sdk::Result<u64> {
        self.record(LedgerCall::Balance(*pubkey));
        Ok(self.balance)
    }

    async fn request_airdrop(
        &self,
        pubkey: &Pubkey,
        lamports: u64,
    ) -> wallet_demo_sdk::Result<Signature> {
        self.record(LedgerCall::Airdrop(*pubkey, lamports));
        if self.fails(Failure::Airdrop) {
            return Err(DemoError::Connection("airdrop limit reached".to_string()));
        }
        Ok(Signature::new_unique())
    }

    async fn get_program_accounts(
        &self,
        program_id: &Pubkey,
        filters: &[AccountFilter],
    ) -> wallet_demo_sdk::Result<Vec<ProgramAccount>> {
        self.record(LedgerCall::ProgramAccounts(*program_id, filters.to_vec()));
        if self.fails(Failure::Query) {
            return Err(DemoError::QueryFailed("rpc timeout".to_string()));
        }
        Ok(self.program_accounts.clone())
    }
}

//=============================================================================
// Agent
//=============================================================================

/// Scriptable wallet agent backed by a fresh keypair
pub struct FakeAgent {
    pub keypair: Keypair,
    endpoint: AgentEndpoint,
    pub reject_connect: AtomicBool,
    pub reject_sign: AtomicBool,
    pub connect_delay: Duration,
    pub sign_delay: Duration,
    pub connect_calls: AtomicUsize,
    pub disconnect_calls: AtomicUsize,
    pub sign_calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl FakeAgent {
    pub fn new() -> Self {
        Self::with_endpoint(AgentEndpoint::Injected)
    }

    pub fn with_endpoint(endpoint: AgentEndpoint) -> Self {
        Self {
            keypair: Keypair::new(),
            endpoint,
            reject_connect: AtomicBool::new(false),
            reject_sign: AtomicBool::new(false),
            connect_delay: Duration::ZERO,
            sign_delay: Duration::ZERO,
            connect_calls: AtomicUsize::new(0),
            disconnect_calls: AtomicUsize::new(0),
            sign_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    async fn enter_sign(&self) -> Result<(), String> {
        self.sign_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.sign_delay.is_zero() {
            tokio::time::sleep(self.sign_delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if self.reject_sign.load(Ordering::SeqCst) {
            return Err("User rejected the request".to_string());
        }
        Ok(())
    }
}

#[async_trait]
impl WalletAgent for FakeAgent {
    fn endpoint(&self) -> AgentEndpoint {
        self.endpoint.clone()
    }

    async fn connect(&self) -> Result<Pubkey, String> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        if !self.connect_delay.is_zero() {
            tokio::time::sleep(self.connect_delay).await;
        }
        if self.reject_connect.load(Ordering::SeqCst) {
            return Err("User rejected the request".to_string());
        }
        Ok(self.keypair.pubkey())
    }

    async fn disconnect(&self) -> Result<(), String> {
        self.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn sign_message(&self, message: &[u8]) -> Result<Signature, String> {
        self.enter_sign().await?;
        Ok(self.keypair.sign_message(message))
    }

    async fn sign_transaction(&self, mut transaction: Transaction) -> Result<Transaction, String> {
        self.enter_sign().await?;
        let blockhash = transaction.message.recent_blockhash;
        transaction
            .try_partial_sign(&[&self.keypair], blockhash)
            .map_err(|e| e.to_string())?;
        Ok(transaction)
    }
}

//=============================================================================
// Context
//=============================================================================

pub struct TestContext {
    pub ledger: Arc<FakeLedger>,
    pub manager: SessionManager,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_ledger(FakeLedger::new())
    }

    pub fn with_ledger(ledger: FakeLedger) -> Self {
        let ledger = Arc::new(ledger);
        let manager = SessionManager::new(DemoConfig::default(), ledger.clone());
        Self { ledger, manager }
    }

    /// Select a fresh agent and wait for the handshake
    pub async fn connected() -> Result<(Self, Arc<FakeAgent>)> {
        let ctx = Self::new();
        let agent = Arc::new(FakeAgent::new());
        ctx.manager
            .select_agent(agent.clone())
            .await
            .context("fake agent connects")?;
        Ok((ctx, agent))
    }

    pub fn messages(&self) -> Vec<String> {
        self.manager.log().messages()
    }
}
