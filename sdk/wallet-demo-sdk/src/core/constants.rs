use solana_sdk::pubkey;
use solana_sdk::pubkey::Pubkey;

/// Cluster the demo talks to. Fixed; there is no multi-network support.
pub const NETWORK: &str = "testnet";

pub const DEFAULT_RPC_URL: &str = "https://api.testnet.solana.com";

pub const DEFAULT_PROVIDER_URL: &str = "https://www.sollet.io";

/// Recipient of the demo transfer
pub const DEFAULT_TRANSFER_RECIPIENT: Pubkey =
    pubkey!("7QqYu69Sh5WB58JjXEmnuKVfvybC4dxWTsDFmNqiY9d4");

/// Validator vote account used for delegation and stake lookup
pub const DEFAULT_VALIDATOR_VOTE: Pubkey = pubkey!("5aGC2ugXkQBDnBpFbhFrEtink5EP29M1o7xEuo7zPyYQ");

pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

pub const DEFAULT_TRANSFER_LAMPORTS: u64 = LAMPORTS_PER_SOL;
pub const DEFAULT_AIRDROP_LAMPORTS: u64 = 10 * LAMPORTS_PER_SOL;
pub const DEFAULT_STAKE_LAMPORTS: u64 = 30 * LAMPORTS_PER_SOL;

/// Offset of the delegated vote account inside a stake account's data
pub const STAKE_VOTER_OFFSET: usize = 124;

pub const PROOF_OF_OWNERSHIP_MESSAGE: &str =
    "Please sign this message for proof of address ownership.";
