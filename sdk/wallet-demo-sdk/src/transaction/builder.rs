use crate::error::{DemoError, Result};
use crate::transaction::instructions::LedgerInstruction;
use solana_sdk::hash::Hash;
use solana_sdk::instruction::Instruction;
use solana_sdk::message::Message;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;

/// Fluent builder collecting instructions into a [`TransactionDraft`].
#[derive(Debug, Default)]
pub struct TransactionBuilder {
    instructions: Vec<LedgerInstruction>,
}

impl TransactionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_instruction(mut self, instruction: LedgerInstruction) -> Self {
        self.instructions.push(instruction);
        self
    }

    pub fn add_instructions(
        mut self,
        instructions: impl IntoIterator<Item = LedgerInstruction>,
    ) -> Self {
        self.instructions.extend(instructions);
        self
    }

    pub fn build(self) -> TransactionDraft {
        TransactionDraft::new(self.instructions)
    }
}

/// Unsigned transaction under assembly.
///
/// Instructions execute in the order given; a failure at one aborts the rest.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionDraft {
    instructions: Vec<LedgerInstruction>,
    fee_payer: Option<Pubkey>,
    recent_blockhash: Option<Hash>,
}

impl TransactionDraft {
    pub fn new(instructions: Vec<LedgerInstruction>) -> Self {
        Self {
            instructions,
            fee_payer: None,
            recent_blockhash: None,
        }
    }

    pub fn instructions(&self) -> &[LedgerInstruction] {
        &self.instructions
    }

    pub fn fee_payer(&self) -> Option<Pubkey> {
        self.fee_payer
    }

    pub fn recent_blockhash(&self) -> Option<Hash> {
        self.recent_blockhash
    }

    /// Attach the blockhash the ledger will check for freshness. Fetch it right
    /// before signing: an expired blockhash is rejected at submission.
    pub fn attach_freshness(&mut self, blockhash: Hash) {
        self.recent_blockhash = Some(blockhash);
    }

    pub fn set_fee_payer(&mut self, payer: Pubkey) {
        self.fee_payer = Some(payer);
    }

    /// All native instructions in execution order
    pub fn lower(&self) -> Vec<Instruction> {
        self.instructions
            .iter()
            .flat_map(LedgerInstruction::lower)
            .collect()
    }

    /// Target program of every native instruction, in execution order
    pub fn program_ids(&self) -> Vec<Pubkey> {
        self.lower().iter().map(|ix| ix.program_id).collect()
    }

    /// Build the unsigned transaction
    pub fn compile(&self) -> Result<Transaction> {
        if self.instructions.is_empty() {
            return Err(DemoError::InvalidDraft("no instructions".to_string()));
        }
        let payer = self
            .fee_payer
            .ok_or_else(|| DemoError::InvalidDraft("fee payer not set".to_string()))?;
        let blockhash = self
            .recent_blockhash
            .ok_or_else(|| DemoError::InvalidDraft("recent blockhash not set".to_string()))?;

        let message = Message::new_with_blockhash(&self.lower(), Some(&payer), &blockhash);
        Ok(Transaction::new_unsigned(message))
    }
}

/// Transaction carrying the fee payer's signature, ready for submission
#[derive(Debug, Clone)]
pub struct SignedTransaction {
    transaction: Transaction,
}

impl SignedTransaction {
    /// Wrap a transaction returned by the wallet. The fee payer slot must be signed.
    pub fn new(transaction: Transaction) -> Result<Self> {
        match transaction.signatures.first() {
            Some(signature) if *signature != Signature::default() => Ok(Self { transaction }),
            _ => Err(DemoError::SigningRejected(
                "wallet returned a transaction without the fee payer signature".to_string(),
            )),
        }
    }

    /// Fee payer signature, which is also the transaction id
    pub fn signature(&self) -> Signature {
        self.transaction.signatures[0]
    }

    pub fn transaction(&self) -> &Transaction {
        &self.transaction
    }

    /// Wire encoding accepted by `sendTransaction`
    pub fn to_wire(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(&self.transaction)?)
    }
}
