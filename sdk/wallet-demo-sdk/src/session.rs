use crate::core::agent::{AgentEndpoint, WalletAgent};
use crate::error::{DemoError, Result};
use crate::transaction::{SignedTransaction, TransactionDraft};
use crate::types::{ConnectionState, SignatureEncoding};
use crate::utils::lock;
use solana_sdk::pubkey::Pubkey;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tracing::{debug, info, warn};

type ConnectedHandler = Arc<dyn Fn(&str) + Send + Sync>;
type DisconnectedHandler = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    connected: Vec<(u64, ConnectedHandler)>,
    disconnected: Vec<(u64, DisconnectedHandler)>,
}

impl Listeners {
    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn len(&self) -> usize {
        self.connected.len() + self.disconnected.len()
    }
}

/// Handle returned by [`WalletSession::on_connected`] and
/// [`WalletSession::on_disconnected`].
///
/// Dropping it keeps the handler registered; call [`Subscription::unsubscribe`]
/// to remove it.
#[must_use = "keep the subscription to be able to unsubscribe"]
pub struct Subscription {
    id: u64,
    listeners: Weak<Mutex<Listeners>>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        if let Some(listeners) = self.listeners.upgrade() {
            let mut listeners = lock(&listeners);
            listeners.connected.retain(|(id, _)| *id != self.id);
            listeners.disconnected.retain(|(id, _)| *id != self.id);
        }
    }
}

struct SessionState {
    connection: ConnectionState,
    identity: Option<Pubkey>,
}

/// Connection to one signing agent.
///
/// The identity is only observable while connected. Signing requests are
/// serialised: the agent sees at most one outstanding request per session.
pub struct WalletSession {
    agent: Arc<dyn WalletAgent>,
    network: String,
    connect_timeout: Duration,
    state: Mutex<SessionState>,
    listeners: Arc<Mutex<Listeners>>,
    sign_gate: tokio::sync::Mutex<()>,
}

impl WalletSession {
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(agent: Arc<dyn WalletAgent>, network: impl Into<String>) -> Self {
        Self {
            agent,
            network: network.into(),
            connect_timeout: Self::DEFAULT_CONNECT_TIMEOUT,
            state: Mutex::new(SessionState {
                connection: ConnectionState::Disconnected,
                identity: None,
            }),
            listeners: Arc::new(Mutex::new(Listeners::default())),
            sign_gate: tokio::sync::Mutex::new(()),
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> AgentEndpoint {
        self.agent.endpoint()
    }

    pub fn network(&self) -> &str {
        &self.network
    }

    pub fn connection_state(&self) -> ConnectionState {
        lock(&self.state).connection
    }

    /// Wallet public key, `None` unless connected
    pub fn public_key(&self) -> Option<Pubkey> {
        let state = lock(&self.state);
        match state.connection {
            ConnectionState::Connected => state.identity,
            _ => None,
        }
    }

    /// Wallet public key or [`DemoError::NotConnected`]
    pub fn identity(&self) -> Result<Pubkey> {
        self.public_key().ok_or(DemoError::NotConnected)
    }

    //=========================================================================
    // Notifications
    //=========================================================================

    /// Register `handler` to run with the base58 identity after each successful connect
    pub fn on_connected(&self, handler: impl Fn(&str) + Send + Sync + 'static) -> Subscription {
        let mut listeners = lock(&self.listeners);
        let id = listeners.next_id();
        listeners.connected.push((id, Arc::new(handler)));
        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    /// Register `handler` to run after each transition to disconnected
    pub fn on_disconnected(&self, handler: impl Fn() + Send + Sync + 'static) -> Subscription {
        let mut listeners = lock(&self.listeners);
        let id = listeners.next_id();
        listeners.disconnected.push((id, Arc::new(handler)));
        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    /// Number of registered handlers
    pub fn listener_count(&self) -> usize {
        lock(&self.listeners).len()
    }

    fn notify_connected(&self, identity: &str) {
        let handlers: Vec<ConnectedHandler> = lock(&self.listeners)
            .connected
            .iter()
            .map(|(_, h)| h.clone())
            .collect();
        for handler in handlers {
            handler(identity);
        }
    }

    fn notify_disconnected(&self) {
        let handlers: Vec<DisconnectedHandler> = lock(&self.listeners)
            .disconnected
            .iter()
            .map(|(_, h)| h.clone())
            .collect();
        for handler in handlers {
            handler();
        }
    }

    //=========================================================================
    // Lifecycle
    //=========================================================================

    /// Handshake with the agent.
    ///
    /// Connecting an already connected session returns the current identity
    /// without notifying again.
    pub async fn connect(&self) -> Result<Pubkey> {
        {
            let mut state = lock(&self.state);
            match state.connection {
                ConnectionState::Connected => {
                    if let Some(identity) = state.identity {
                        return Ok(identity);
                    }
                    state.connection = ConnectionState::Connecting;
                },
                ConnectionState::Connecting => {
                    return Err(DemoError::ConnectRejected(
                        "handshake already in progress".to_string(),
                    ))
                },
                ConnectionState::Disconnected => state.connection = ConnectionState::Connecting,
            }
        }

        let endpoint = self.agent.endpoint();
        debug!(%endpoint, network = %self.network, "connecting to wallet");

        let identity =
            match tokio::time::timeout(self.connect_timeout, self.agent.connect()).await {
                Ok(Ok(identity)) => identity,
                Ok(Err(reason)) => {
                    self.abort_connect();
                    warn!(%endpoint, %reason, "wallet rejected connection");
                    return Err(DemoError::ConnectRejected(reason));
                },
                Err(_) => {
                    self.abort_connect();
                    warn!(%endpoint, "wallet connection timed out");
                    return Err(DemoError::ConnectTimeout);
                },
            };

        let closed_during_handshake = {
            let mut state = lock(&self.state);
            if state.connection == ConnectionState::Connecting {
                state.connection = ConnectionState::Connected;
                state.identity = Some(identity);
                false
            } else {
                true
            }
        };
        if closed_during_handshake {
            // Closed while the handshake ran; release the agent as well
            if let Err(reason) = self.agent.disconnect().await {
                warn!(%endpoint, %reason, "wallet failed to disconnect after cancelled handshake");
            }
            return Err(DemoError::ConnectRejected(
                "session closed during handshake".to_string(),
            ));
        }

        info!(%endpoint, %identity, "wallet connected");
        self.notify_connected(&identity.to_string());
        Ok(identity)
    }

    fn abort_connect(&self) {
        let mut state = lock(&self.state);
        state.connection = ConnectionState::Disconnected;
        state.identity = None;
    }

    /// Ask the agent to end the session. No-op when already disconnected.
    ///
    /// During a handshake the session is only marked closed; `connect` then
    /// disconnects the agent once its handshake returns.
    pub async fn disconnect(&self) -> Result<()> {
        match self.connection_state() {
            ConnectionState::Disconnected => return Ok(()),
            ConnectionState::Connecting => {
                self.mark_disconnected();
                return Ok(());
            },
            ConnectionState::Connected => {},
        }
        if let Err(reason) = self.agent.disconnect().await {
            warn!(endpoint = %self.agent.endpoint(), %reason, "wallet failed to disconnect cleanly");
        }
        self.mark_disconnected();
        Ok(())
    }

    /// The agent dropped the session on its own
    pub fn handle_agent_disconnect(&self) {
        self.mark_disconnected();
    }

    /// Move to disconnected. Only a session that was connected notifies.
    fn mark_disconnected(&self) {
        let previous = {
            let mut state = lock(&self.state);
            let previous = state.connection;
            state.connection = ConnectionState::Disconnected;
            state.identity = None;
            previous
        };
        match previous {
            ConnectionState::Connected => {
                info!(endpoint = %self.agent.endpoint(), "wallet disconnected");
                self.notify_disconnected();
            },
            ConnectionState::Connecting => {
                debug!(endpoint = %self.agent.endpoint(), "handshake abandoned");
            },
            ConnectionState::Disconnected => {},
        }
    }

    //=========================================================================
    // Signing
    //=========================================================================

    /// Sign arbitrary bytes and return the signature in `encoding`
    pub async fn sign(&self, message: &[u8], encoding: SignatureEncoding) -> Result<String> {
        let _gate = self.sign_gate.lock().await;
        self.identity()?;

        let signature = self
            .agent
            .sign_message(message)
            .await
            .map_err(DemoError::SigningRejected)?;
        Ok(encoding.encode(signature.as_ref()))
    }

    /// Have the agent sign `draft` as fee payer.
    ///
    /// The draft must name the connected identity as fee payer and carry a blockhash.
    pub async fn sign_transaction(&self, draft: &TransactionDraft) -> Result<SignedTransaction> {
        let _gate = self.sign_gate.lock().await;
        let identity = self.identity()?;

        match draft.fee_payer() {
            Some(payer) if payer == identity => {},
            Some(payer) => {
                return Err(DemoError::InvalidDraft(format!(
                    "fee payer {} is not the connected wallet {}",
                    payer, identity
                )))
            },
            None => return Err(DemoError::InvalidDraft("fee payer not set".to_string())),
        }

        let transaction = draft.compile()?;
        let expected_message = transaction.message.clone();
        let signed = self
            .agent
            .sign_transaction(transaction)
            .await
            .map_err(DemoError::SigningRejected)?;

        if signed.message != expected_message {
            return Err(DemoError::SigningRejected(
                "wallet returned a different transaction".to_string(),
            ));
        }
        SignedTransaction::new(signed)
    }
}
