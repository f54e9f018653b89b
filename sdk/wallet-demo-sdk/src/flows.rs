//! The five user-triggered operations.
//!
//! Each flow logs what it is about to do, the request it sends, and either the
//! result or the error message. Errors never leave the flow; the returned
//! [`FlowState`] tells the caller how it ended.

use crate::core::connection::AccountFilter;
use crate::core::constants::PROOF_OF_OWNERSHIP_MESSAGE;
use crate::error::{DemoError, Result};
use crate::manager::SessionManager;
use crate::transaction::{LedgerInstruction, TransactionBuilder};
use crate::types::{FlowKind, FlowState, SignatureEncoding};
use crate::utils::program_label;
use solana_sdk::signature::{Keypair, Signer};
use solana_sdk::stake;

impl SessionManager {
    fn log_step(&self, flow: FlowKind, message: impl Into<String>) {
        self.log.append(Some(flow), message);
    }

    /// Transfer the configured amount to the configured recipient.
    ///
    /// Blockhash fetch, signing, submission and confirmation run strictly in
    /// that order; the first failure ends the flow.
    pub async fn transfer(&self) -> FlowState {
        let flow = FlowKind::Transfer;
        self.start_flow(flow);
        let result = self.transfer_steps(flow).await;
        self.finish_flow(flow, result)
    }

    async fn transfer_steps(&self, flow: FlowKind) -> Result<()> {
        let session = self.connected_session()?;
        let identity = session.identity()?;

        let mut draft = TransactionBuilder::new()
            .add_instruction(LedgerInstruction::transfer(
                identity,
                self.config.transfer_recipient,
                self.config.transfer_lamports,
            ))
            .build();

        self.log_step(flow, "Getting recent blockhash");
        let blockhash = self.ledger.get_latest_blockhash().await?;
        draft.attach_freshness(blockhash);
        draft.set_fee_payer(identity);

        self.log_step(flow, "Sending signature request to wallet");
        let signed = session.sign_transaction(&draft).await?;

        self.log_step(flow, "Got signature, submitting transaction");
        let wire = signed.to_wire()?;
        let signature = self.ledger.send_raw_transaction(&wire).await?;

        self.log_step(
            flow,
            format!("Submitted transaction {}, awaiting confirmation", signature),
        );
        self.ledger
            .confirm_transaction(&signature, self.config.commitment_config())
            .await?;

        self.log_step(flow, format!("Transaction {} confirmed", signature));
        Ok(())
    }

    /// Ask the wallet to sign the proof-of-ownership message
    pub async fn sign_message(&self) -> FlowState {
        let flow = FlowKind::SignMessage;
        self.start_flow(flow);
        let result = self.sign_message_steps(flow).await;
        self.finish_flow(flow, result)
    }

    async fn sign_message_steps(&self, flow: FlowKind) -> Result<()> {
        let session = self.connected_session()?;

        self.log_step(flow, "Sending message signature request to wallet");
        let signature = session
            .sign(PROOF_OF_OWNERSHIP_MESSAGE.as_bytes(), SignatureEncoding::Hex)
            .await?;

        self.log_step(flow, format!("Got signature: {}", signature));
        Ok(())
    }

    /// Request test funds, then read the balance.
    ///
    /// The balance read may not yet include the airdrop.
    pub async fn airdrop(&self) -> FlowState {
        let flow = FlowKind::Airdrop;
        self.start_flow(flow);
        let result = self.airdrop_steps(flow).await;
        self.finish_flow(flow, result)
    }

    async fn airdrop_steps(&self, flow: FlowKind) -> Result<()> {
        let identity = self.connected_session()?.identity()?;
        let lamports = self.config.airdrop_lamports;

        self.log_step(flow, format!("Requesting airdrop of {} lamports", lamports));
        let signature = self.ledger.request_airdrop(&identity, lamports).await?;
        self.log_step(flow, format!("Airdrop {}", signature));

        let balance = self.ledger.get_balance(&identity).await?;
        self.log_step(flow, format!("Balance lamport {}", balance));
        Ok(())
    }

    /// Build stake creation and delegation transactions and log their programs.
    /// Neither transaction is signed or submitted.
    pub async fn create_and_delegate_stake(&self) -> FlowState {
        let flow = FlowKind::CreateAndDelegateStake;
        self.start_flow(flow);
        let result = self.create_and_delegate_stake_steps(flow);
        self.finish_flow(flow, result)
    }

    fn create_and_delegate_stake_steps(&self, flow: FlowKind) -> Result<()> {
        let identity = self.connected_session()?.identity()?;
        let stake_account = Keypair::new().pubkey();

        let mut create = TransactionBuilder::new()
            .add_instruction(LedgerInstruction::create_stake_account(
                identity,
                stake_account,
                self.config.stake_lamports,
            ))
            .build();
        create.set_fee_payer(identity);

        self.log_step(flow, format!("Stake account public key {}", stake_account));
        for program_id in create.program_ids() {
            self.log_step(
                flow,
                format!(
                    "{} instruction program id {}",
                    program_label(&program_id),
                    program_id
                ),
            );
        }

        let mut delegate = TransactionBuilder::new()
            .add_instruction(LedgerInstruction::delegate_stake(
                stake_account,
                identity,
                self.config.validator_vote,
            ))
            .build();
        delegate.set_fee_payer(identity);

        for program_id in delegate.program_ids() {
            self.log_step(flow, format!("Delegate instruction program id {}", program_id));
        }
        Ok(())
    }

    /// List stake accounts delegated to the configured validator.
    ///
    /// Does not need a connected wallet.
    pub async fn get_stake_account(&self) -> FlowState {
        let flow = FlowKind::GetStakeAccount;
        self.start_flow(flow);
        let result = self.get_stake_account_steps(flow).await;
        self.finish_flow(flow, result)
    }

    async fn get_stake_account_steps(&self, flow: FlowKind) -> Result<()> {
        let vote = self.config.validator_vote;
        self.log_step(flow, format!("Pub key {}", vote));

        let filters = [AccountFilter::memcmp_pubkey(
            self.config.stake_filter_offset,
            &vote,
        )];
        let accounts = self
            .ledger
            .get_program_accounts(&stake::program::id(), &filters)
            .await?;

        let rendered = serde_json::to_string_pretty(&accounts)
            .map_err(|e| DemoError::QueryFailed(e.to_string()))?;
        self.log_step(flow, format!("Stake accounts for {}: {}", vote, rendered));
        Ok(())
    }
}
