use crate::error::{DemoError, Result};
use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{read_keypair_file, Keypair, Signature, Signer};
use solana_sdk::transaction::Transaction;
use std::fmt;
use std::path::Path;

/// Where a signing agent lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentEndpoint {
    /// Remote provider reached through a URL (e.g. a hosted wallet)
    Url(String),
    /// Agent injected into the host environment
    Injected,
}

impl fmt::Display for AgentEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => write!(f, "{}", url),
            Self::Injected => write!(f, "injected"),
        }
    }
}

/// Abstraction for the external wallet that holds the user's key.
/// The session never sees key material, only public keys and signatures.
///
/// Errors are free-form strings; the session maps them onto [`DemoError`].
#[async_trait]
pub trait WalletAgent: Send + Sync {
    fn endpoint(&self) -> AgentEndpoint;

    /// Perform the handshake and return the wallet's public key.
    async fn connect(&self) -> std::result::Result<Pubkey, String>;

    async fn disconnect(&self) -> std::result::Result<(), String>;

    /// Sign arbitrary bytes.
    async fn sign_message(&self, message: &[u8]) -> std::result::Result<Signature, String>;

    /// Add the wallet's signature to `transaction`.
    async fn sign_transaction(
        &self,
        transaction: Transaction,
    ) -> std::result::Result<Transaction, String>;
}

/// Agent backed by a keypair held in process, standing in for an injected wallet
pub struct LocalKeypairAgent {
    keypair: Keypair,
}

impl LocalKeypairAgent {
    pub fn new(keypair: Keypair) -> Self {
        Self { keypair }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let keypair = read_keypair_file(path).map_err(|e| {
            DemoError::Config(format!("cannot read keypair {}: {}", path.display(), e))
        })?;
        Ok(Self::new(keypair))
    }

    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }
}

#[async_trait]
impl WalletAgent for LocalKeypairAgent {
    fn endpoint(&self) -> AgentEndpoint {
        AgentEndpoint::Injected
    }

    async fn connect(&self) -> std::result::Result<Pubkey, String> {
        Ok(self.keypair.pubkey())
    }

    async fn disconnect(&self) -> std::result::Result<(), String> {
        Ok(())
    }

    async fn sign_message(&self, message: &[u8]) -> std::result::Result<Signature, String> {
        self.keypair
            .try_sign_message(message)
            .map_err(|e| e.to_string())
    }

    async fn sign_transaction(
        &self,
        mut transaction: Transaction,
    ) -> std::result::Result<Transaction, String> {
        let recent_blockhash = transaction.message.recent_blockhash;
        transaction
            .try_partial_sign(&[&self.keypair], recent_blockhash)
            .map_err(|e| e.to_string())?;
        Ok(transaction)
    }
}
