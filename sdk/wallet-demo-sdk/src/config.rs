use crate::core::constants::{
    DEFAULT_AIRDROP_LAMPORTS, DEFAULT_PROVIDER_URL, DEFAULT_RPC_URL, DEFAULT_STAKE_LAMPORTS,
    DEFAULT_TRANSFER_LAMPORTS, DEFAULT_TRANSFER_RECIPIENT, DEFAULT_VALIDATOR_VOTE, NETWORK,
    STAKE_VOTER_OFFSET,
};
use crate::error::{DemoError, Result};
use serde::{Deserialize, Deserializer};
use solana_sdk::commitment_config::{CommitmentConfig, CommitmentLevel};
use solana_sdk::pubkey::Pubkey;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Runtime settings for the demo.
///
/// The network is fixed; everything else can be overridden from JSON or the
/// environment (`RPC_URL`, `PROVIDER_URL`, `COMMITMENT`, `VALIDATOR_VOTE`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DemoConfig {
    pub rpc_url: String,
    /// Signing agent endpoint offered for URL-based wallets
    pub provider_url: String,
    pub commitment: CommitmentLevel,
    pub connect_timeout_secs: u64,
    pub confirm_timeout_secs: u64,
    /// How often a pending signature is polled while confirming
    pub confirm_poll_millis: u64,
    #[serde(deserialize_with = "pubkey_from_str")]
    pub transfer_recipient: Pubkey,
    pub transfer_lamports: u64,
    pub airdrop_lamports: u64,
    pub stake_lamports: u64,
    #[serde(deserialize_with = "pubkey_from_str")]
    pub validator_vote: Pubkey,
    pub stake_filter_offset: usize,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            provider_url: DEFAULT_PROVIDER_URL.to_string(),
            commitment: CommitmentLevel::Confirmed,
            connect_timeout_secs: 30,
            confirm_timeout_secs: 60,
            confirm_poll_millis: 500,
            transfer_recipient: DEFAULT_TRANSFER_RECIPIENT,
            transfer_lamports: DEFAULT_TRANSFER_LAMPORTS,
            airdrop_lamports: DEFAULT_AIRDROP_LAMPORTS,
            stake_lamports: DEFAULT_STAKE_LAMPORTS,
            validator_vote: DEFAULT_VALIDATOR_VOTE,
            stake_filter_offset: STAKE_VOTER_OFFSET,
        }
    }
}

fn pubkey_from_str<'de, D>(deserializer: D) -> std::result::Result<Pubkey, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Pubkey::from_str(&s).map_err(serde::de::Error::custom)
}

impl DemoConfig {
    pub fn network(&self) -> &'static str {
        NETWORK
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| DemoError::Config(e.to_string()))
    }

    /// Defaults overridden by process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each known variable
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(url) = lookup("RPC_URL") {
            config.rpc_url = url;
        }
        if let Some(url) = lookup("PROVIDER_URL") {
            let url = url.trim();
            if url.is_empty() {
                return Err(DemoError::Config("PROVIDER_URL is empty".to_string()));
            }
            config.provider_url = url.to_string();
        }
        if let Some(level) = lookup("COMMITMENT") {
            config.commitment = CommitmentLevel::from_str(&level)
                .map_err(|e| DemoError::Config(format!("COMMITMENT {}: {}", level, e)))?;
        }
        if let Some(vote) = lookup("VALIDATOR_VOTE") {
            config.validator_vote = Pubkey::from_str(&vote)
                .map_err(|e| DemoError::Config(format!("VALIDATOR_VOTE {}: {}", vote, e)))?;
        }

        Ok(config)
    }

    pub fn commitment_config(&self) -> CommitmentConfig {
        CommitmentConfig {
            commitment: self.commitment,
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn confirm_timeout(&self) -> Duration {
        Duration::from_secs(self.confirm_timeout_secs)
    }

    pub fn confirm_poll_interval(&self) -> Duration {
        Duration::from_millis(self.confirm_poll_millis)
    }
}
