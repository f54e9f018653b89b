pub mod config;
pub mod core;
pub mod error;
pub mod flows;
pub mod log;
pub mod manager;
pub mod session;
pub mod transaction;
pub mod types;
pub mod utils;

pub use crate::config::DemoConfig;
pub use crate::core::agent::{AgentEndpoint, LocalKeypairAgent, WalletAgent};
pub use crate::core::connection::{AccountFilter, LedgerClient, ProgramAccount, RpcLedgerClient};
pub use crate::error::{DemoError, Result};
pub use crate::log::{EventLog, LogEntry};
pub use crate::manager::SessionManager;
pub use crate::session::{Subscription, WalletSession};
pub use crate::transaction::{
    LedgerInstruction, SignedTransaction, TransactionBuilder, TransactionDraft,
};
pub use crate::types::{AppSnapshot, ConnectionState, FlowKind, FlowState, SignatureEncoding};
