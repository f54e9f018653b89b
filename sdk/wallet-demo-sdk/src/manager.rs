use crate::config::DemoConfig;
use crate::core::agent::{AgentEndpoint, WalletAgent};
use crate::core::connection::{LedgerClient, RpcLedgerClient};
use crate::error::{DemoError, Result};
use crate::log::EventLog;
use crate::session::{Subscription, WalletSession};
use crate::types::{AppSnapshot, ConnectionState, FlowKind, FlowState};
use crate::utils::lock;
use solana_sdk::pubkey::Pubkey;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tracing::warn;

/// Session held by the manager together with the handlers it registered
struct ActiveSession {
    session: Arc<WalletSession>,
    subscriptions: Vec<Subscription>,
}

impl ActiveSession {
    /// Disconnect, then drop the manager's listeners
    async fn teardown(self) {
        if let Err(err) = self.session.disconnect().await {
            warn!(error = %err, "failed to disconnect replaced wallet");
        }
        for subscription in self.subscriptions {
            subscription.unsubscribe();
        }
    }
}

/// Owns the application state: the current wallet session, the ledger client,
/// the activity log and the state of each flow.
///
/// The display layer only reads through [`SessionManager::snapshot`] and acts
/// through the methods here. Flows live in `flows.rs`.
pub struct SessionManager {
    pub(crate) config: DemoConfig,
    pub(crate) ledger: Arc<dyn LedgerClient>,
    pub(crate) log: EventLog,
    provider_url: Mutex<String>,
    current: Mutex<Option<ActiveSession>>,
    flows: Mutex<BTreeMap<FlowKind, FlowState>>,
}

impl SessionManager {
    pub fn new(config: DemoConfig, ledger: Arc<dyn LedgerClient>) -> Self {
        Self {
            provider_url: Mutex::new(config.provider_url.clone()),
            config,
            ledger,
            log: EventLog::new(),
            current: Mutex::new(None),
            flows: Mutex::new(BTreeMap::new()),
        }
    }

    /// Manager talking to `config.rpc_url` over JSON-RPC
    pub fn with_rpc(config: DemoConfig) -> Self {
        let ledger = RpcLedgerClient::new(config.rpc_url.clone(), config.commitment_config())
            .with_confirm_timeout(config.confirm_timeout())
            .with_poll_interval(config.confirm_poll_interval());
        Self::new(config, Arc::new(ledger))
    }

    pub fn config(&self) -> &DemoConfig {
        &self.config
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    //=========================================================================
    // Provider endpoint
    //=========================================================================

    pub fn provider_url(&self) -> String {
        lock(&self.provider_url).clone()
    }

    /// Change the provider used for URL-based agents. Affects the next selection only.
    pub fn set_provider_url(&self, url: &str) -> Result<()> {
        let url = url.trim();
        if url.is_empty() {
            return Err(DemoError::Config("provider url is empty".to_string()));
        }
        *lock(&self.provider_url) = url.to_string();
        Ok(())
    }

    pub fn provider_endpoint(&self) -> AgentEndpoint {
        AgentEndpoint::Url(self.provider_url())
    }

    //=========================================================================
    // Session lifecycle
    //=========================================================================

    /// Replace the current agent with `agent` and connect to it.
    ///
    /// A previously selected session is disconnected and its listeners removed
    /// before the new handshake starts.
    pub async fn select_agent(&self, agent: Arc<dyn WalletAgent>) -> Result<Pubkey> {
        let previous = lock(&self.current).take();
        if let Some(previous) = previous {
            previous.teardown().await;
        }

        let session = Arc::new(
            WalletSession::new(agent, self.config.network())
                .with_connect_timeout(self.config.connect_timeout()),
        );

        let connected_log = self.log.clone();
        let disconnected_log = self.log.clone();
        let subscriptions = vec![
            session.on_connected(move |identity| {
                connected_log.append(None, format!("Connected to wallet {}", identity));
            }),
            session.on_disconnected(move || {
                disconnected_log.append(None, "Disconnected from wallet");
            }),
        ];

        *lock(&self.current) = Some(ActiveSession {
            session: session.clone(),
            subscriptions,
        });

        session.connect().await.map_err(|err| {
            self.log.append(None, format!("Error: {}", err));
            err
        })
    }

    /// Disconnect the current session, keeping it selected
    pub async fn disconnect(&self) -> Result<()> {
        match self.current_session() {
            Some(session) => session.disconnect().await,
            None => Ok(()),
        }
    }

    /// Forward an agent-initiated drop to the current session
    pub fn agent_disconnected(&self) {
        if let Some(session) = self.current_session() {
            session.handle_agent_disconnect();
        }
    }

    /// Disconnect and release the current session's listeners
    pub async fn shutdown(&self) {
        let current = lock(&self.current).take();
        if let Some(current) = current {
            current.teardown().await;
        }
    }

    pub fn current_session(&self) -> Option<Arc<WalletSession>> {
        lock(&self.current)
            .as_ref()
            .map(|active| active.session.clone())
    }

    pub(crate) fn connected_session(&self) -> Result<Arc<WalletSession>> {
        match self.current_session() {
            Some(session) if session.connection_state() == ConnectionState::Connected => {
                Ok(session)
            },
            _ => Err(DemoError::NotConnected),
        }
    }

    //=========================================================================
    // Flow bookkeeping
    //=========================================================================

    pub(crate) fn start_flow(&self, flow: FlowKind) {
        lock(&self.flows).insert(flow, FlowState::InProgress);
    }

    /// Record the outcome of a flow, logging the error if there is one
    pub(crate) fn finish_flow(&self, flow: FlowKind, result: Result<()>) -> FlowState {
        let state = match result {
            Ok(()) => FlowState::Succeeded,
            Err(err) => {
                warn!(%flow, error = %err, "flow failed");
                self.log.append(Some(flow), format!("Error: {}", err));
                FlowState::Failed
            },
        };
        lock(&self.flows).insert(flow, state);
        state
    }

    pub fn flow_state(&self, flow: FlowKind) -> FlowState {
        lock(&self.flows).get(&flow).copied().unwrap_or_default()
    }

    pub fn snapshot(&self) -> AppSnapshot {
        let session = self.current_session();
        AppSnapshot {
            network: self.config.network().to_string(),
            provider_url: self.provider_url(),
            endpoint: session.as_ref().map(|s| s.endpoint()),
            connection_state: session
                .as_ref()
                .map(|s| s.connection_state())
                .unwrap_or(ConnectionState::Disconnected),
            identity: session.as_ref().and_then(|s| s.public_key()),
            flows: lock(&self.flows).clone(),
            log: self.log.entries(),
        }
    }
}
