use solana_sdk::signature::Signature;
use thiserror::Error;

/// Errors raised by the wallet session, the transaction pipeline and the ledger adapter
#[derive(Debug, Error)]
pub enum DemoError {
    /// A flow or signing request was issued without a connected wallet
    #[error("Wallet not connected")]
    NotConnected,

    /// The agent refused the handshake
    #[error("Wallet connection rejected: {0}")]
    ConnectRejected(String),

    /// The agent did not answer the handshake in time
    #[error("Wallet connection timed out")]
    ConnectTimeout,

    /// The agent declined or failed to produce a signature
    #[error("Signing rejected: {0}")]
    SigningRejected(String),

    /// Draft is missing a fee payer or blockhash, or is signed by the wrong identity
    #[error("Invalid transaction draft: {0}")]
    InvalidDraft(String),

    /// The ledger no longer accepts the attached blockhash
    #[error("Blockhash expired: {0}")]
    StaleFreshnessToken(String),

    /// The ledger rejected the submitted transaction
    #[error("Transaction submission failed: {0}")]
    SubmissionFailed(String),

    /// The transaction did not reach the requested commitment in time
    #[error("Transaction {0} was not confirmed in time")]
    ConfirmationTimeout(Signature),

    /// Program account lookup failed
    #[error("Account query failed: {0}")]
    QueryFailed(String),

    /// Any other RPC failure
    #[error("Connection error: {0}")]
    Connection(String),

    /// Wire encoding of a transaction failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type alias for SDK operations
pub type Result<T> = std::result::Result<T, DemoError>;
