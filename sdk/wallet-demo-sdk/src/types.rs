use crate::core::agent::AgentEndpoint;
use crate::log::LogEntry;
use serde::Serialize;
use solana_sdk::pubkey::Pubkey;
use std::collections::BTreeMap;
use std::fmt;

/// Connection state of a wallet session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Text encoding of a message signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureEncoding {
    Hex,
    Base58,
}

impl SignatureEncoding {
    pub fn encode(&self, signature: &[u8]) -> String {
        match self {
            Self::Hex => hex::encode(signature),
            Self::Base58 => bs58::encode(signature).into_string(),
        }
    }
}

/// The user-triggered operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum FlowKind {
    Transfer,
    SignMessage,
    Airdrop,
    CreateAndDelegateStake,
    GetStakeAccount,
}

impl fmt::Display for FlowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Transfer => "transfer",
            Self::SignMessage => "sign-message",
            Self::Airdrop => "airdrop",
            Self::CreateAndDelegateStake => "create-and-delegate-stake",
            Self::GetStakeAccount => "get-stake-account",
        };
        f.write_str(name)
    }
}

/// Lifecycle of the most recent run of a flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum FlowState {
    #[default]
    Idle,
    InProgress,
    Succeeded,
    Failed,
}

impl FlowState {
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// Read-only view of the application state handed to the display layer
#[derive(Debug, Clone)]
pub struct AppSnapshot {
    pub network: String,
    pub provider_url: String,
    pub endpoint: Option<AgentEndpoint>,
    pub connection_state: ConnectionState,
    /// Present only while connected
    pub identity: Option<Pubkey>,
    pub flows: BTreeMap<FlowKind, FlowState>,
    pub log: Vec<LogEntry>,
}

impl AppSnapshot {
    pub fn is_connected(&self) -> bool {
        self.connection_state == ConnectionState::Connected
    }

    pub fn flow_state(&self, flow: FlowKind) -> FlowState {
        self.flows.get(&flow).copied().unwrap_or_default()
    }
}
