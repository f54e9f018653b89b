pub mod builder;
pub mod instructions;

pub use builder::{SignedTransaction, TransactionBuilder, TransactionDraft};
pub use instructions::LedgerInstruction;
