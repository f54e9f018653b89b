use crate::error::{DemoError, Result};
use async_trait::async_trait;
use base64::{prelude::BASE64_STANDARD, Engine};
use serde::{Deserialize, Serialize};
use serde_json::json;
use solana_client::client_error::ClientError;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::RpcProgramAccountsConfig;
use solana_client::rpc_filter::{Memcmp, RpcFilterType};
use solana_client::rpc_request::RpcRequest;
use solana_sdk::account::Account;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::TransactionError;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// Remote ledger operations used by the demo flows.
///
/// Implemented over JSON-RPC by [`RpcLedgerClient`]; tests provide in-memory fakes.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    async fn get_latest_blockhash(&self) -> Result<Hash>;

    /// Submit an already signed transaction in wire format.
    async fn send_raw_transaction(&self, wire: &[u8]) -> Result<Signature>;

    /// Wait until `signature` reaches `commitment`.
    async fn confirm_transaction(
        &self,
        signature: &Signature,
        commitment: CommitmentConfig,
    ) -> Result<()>;

    async fn get_balance(&self, pubkey: &Pubkey) -> Result<u64>;

    async fn request_airdrop(&self, pubkey: &Pubkey, lamports: u64) -> Result<Signature>;

    async fn get_program_accounts(
        &self,
        program_id: &Pubkey,
        filters: &[AccountFilter],
    ) -> Result<Vec<ProgramAccount>>;
}

/// Filter applied server-side to a program account query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountFilter {
    /// Account data must contain `bytes` starting at `offset`
    Memcmp { offset: usize, bytes: Vec<u8> },
}

impl AccountFilter {
    pub fn memcmp_pubkey(offset: usize, pubkey: &Pubkey) -> Self {
        Self::Memcmp {
            offset,
            bytes: pubkey.to_bytes().to_vec(),
        }
    }

    /// Base58 form of the compared bytes, as sent over RPC
    pub fn encoded_bytes(&self) -> String {
        match self {
            Self::Memcmp { bytes, .. } => bs58::encode(bytes).into_string(),
        }
    }

    pub fn to_rpc_filter(&self) -> RpcFilterType {
        match self {
            Self::Memcmp { offset, bytes } => {
                RpcFilterType::Memcmp(Memcmp::new_base58_encoded(*offset, bytes))
            },
        }
    }
}

/// One account returned by a program account query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramAccount {
    pub pubkey: String,
    pub lamports: u64,
    pub owner: String,
    /// Base64 account data
    pub data: String,
    pub executable: bool,
    pub rent_epoch: u64,
}

impl ProgramAccount {
    pub fn new(pubkey: &Pubkey, account: &Account) -> Self {
        Self {
            pubkey: pubkey.to_string(),
            lamports: account.lamports,
            owner: account.owner.to_string(),
            data: BASE64_STANDARD.encode(&account.data),
            executable: account.executable,
            rent_epoch: account.rent_epoch,
        }
    }
}

//=============================================================================
// JSON-RPC adapter
//=============================================================================

pub struct RpcLedgerClient {
    client: RpcClient,
    confirm_timeout: Duration,
    poll_interval: Duration,
}

impl RpcLedgerClient {
    pub const DEFAULT_CONFIRM_TIMEOUT: Duration = Duration::from_secs(60);
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

    pub fn new(rpc_url: impl Into<String>, commitment: CommitmentConfig) -> Self {
        Self {
            client: RpcClient::new_with_commitment(rpc_url.into(), commitment),
            confirm_timeout: Self::DEFAULT_CONFIRM_TIMEOUT,
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_confirm_timeout(mut self, timeout: Duration) -> Self {
        self.confirm_timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

fn submission_error(err: ClientError) -> DemoError {
    match err.get_transaction_error() {
        Some(TransactionError::BlockhashNotFound) => {
            DemoError::StaleFreshnessToken(err.to_string())
        },
        _ => DemoError::SubmissionFailed(err.to_string()),
    }
}

#[async_trait]
impl LedgerClient for RpcLedgerClient {
    async fn get_latest_blockhash(&self) -> Result<Hash> {
        self.client
            .get_latest_blockhash()
            .await
            .map_err(|e| DemoError::Connection(e.to_string()))
    }

    async fn send_raw_transaction(&self, wire: &[u8]) -> Result<Signature> {
        let params = json!([
            BASE64_STANDARD.encode(wire),
            {
                "encoding": "base64",
                "preflightCommitment": self.client.commitment().commitment,
            }
        ]);
        let signature: String = self
            .client
            .send(RpcRequest::SendTransaction, params)
            .await
            .map_err(submission_error)?;

        Signature::from_str(&signature).map_err(|e| DemoError::SubmissionFailed(e.to_string()))
    }

    async fn confirm_transaction(
        &self,
        signature: &Signature,
        commitment: CommitmentConfig,
    ) -> Result<()> {
        let poll = async {
            loop {
                match self
                    .client
                    .get_signature_status_with_commitment(signature, commitment)
                    .await
                {
                    Ok(Some(Ok(()))) => return Ok(()),
                    Ok(Some(Err(err))) => return Err(DemoError::SubmissionFailed(err.to_string())),
                    Ok(None) => debug!(%signature, "signature not yet at requested commitment"),
                    Err(err) => return Err(DemoError::Connection(err.to_string())),
                }
                tokio::time::sleep(self.poll_interval).await;
            }
        };

        tokio::time::timeout(self.confirm_timeout, poll)
            .await
            .map_err(|_| DemoError::ConfirmationTimeout(*signature))?
    }

    async fn get_balance(&self, pubkey: &Pubkey) -> Result<u64> {
        self.client
            .get_balance(pubkey)
            .await
            .map_err(|e| DemoError::Connection(e.to_string()))
    }

    async fn request_airdrop(&self, pubkey: &Pubkey, lamports: u64) -> Result<Signature> {
        self.client
            .request_airdrop(pubkey, lamports)
            .await
            .map_err(|e| DemoError::Connection(e.to_string()))
    }

    async fn get_program_accounts(
        &self,
        program_id: &Pubkey,
        filters: &[AccountFilter],
    ) -> Result<Vec<ProgramAccount>> {
        let config = RpcProgramAccountsConfig {
            filters: Some(filters.iter().map(AccountFilter::to_rpc_filter).collect()),
            ..RpcProgramAccountsConfig::default()
        };
        let accounts = self
            .client
            .get_program_accounts_with_config(program_id, config)
            .await
            .map_err(|e| DemoError::QueryFailed(e.to_string()))?;

        Ok(accounts
            .iter()
            .map(|(pubkey, account)| ProgramAccount::new(pubkey, account))
            .collect())
    }
}
