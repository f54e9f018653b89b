use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::stake::instruction as stake_instruction;
use solana_sdk::stake::state::{Authorized, Lockup};
use solana_sdk::system_instruction;

/// Ledger operations the demo knows how to build.
///
/// Each variant lowers to one or more native instructions; see [`LedgerInstruction::lower`].
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerInstruction {
    /// Move lamports between two system accounts
    Transfer {
        from: Pubkey,
        to: Pubkey,
        lamports: u64,
    },

    /// Allocate and initialize a stake account funded by `from`
    CreateStakeAccount {
        from: Pubkey,
        stake: Pubkey,
        authorized: Authorized,
        lockup: Lockup,
        lamports: u64,
    },

    /// Delegate an initialized stake account to a vote account
    DelegateStake {
        stake: Pubkey,
        authorized: Pubkey,
        vote: Pubkey,
    },
}

impl LedgerInstruction {
    pub fn transfer(from: Pubkey, to: Pubkey, lamports: u64) -> Self {
        Self::Transfer { from, to, lamports }
    }

    /// Stake account where `owner` is both staker and withdrawer, with no lockup
    /// beyond naming `owner` as custodian.
    pub fn create_stake_account(owner: Pubkey, stake: Pubkey, lamports: u64) -> Self {
        Self::CreateStakeAccount {
            from: owner,
            stake,
            authorized: Authorized {
                staker: owner,
                withdrawer: owner,
            },
            lockup: Lockup {
                unix_timestamp: 0,
                epoch: 0,
                custodian: owner,
            },
            lamports,
        }
    }

    pub fn delegate_stake(stake: Pubkey, authorized: Pubkey, vote: Pubkey) -> Self {
        Self::DelegateStake {
            stake,
            authorized,
            vote,
        }
    }

    /// Native instructions for this operation, in execution order.
    ///
    /// `CreateStakeAccount` yields the system `create_account` followed by the
    /// stake `initialize`.
    pub fn lower(&self) -> Vec<Instruction> {
        match self {
            Self::Transfer { from, to, lamports } => {
                vec![system_instruction::transfer(from, to, *lamports)]
            },
            Self::CreateStakeAccount {
                from,
                stake,
                authorized,
                lockup,
                lamports,
            } => stake_instruction::create_account(from, stake, authorized, lockup, *lamports),
            Self::DelegateStake {
                stake,
                authorized,
                vote,
            } => vec![stake_instruction::delegate_stake(stake, authorized, vote)],
        }
    }
}
