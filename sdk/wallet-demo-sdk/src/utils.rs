use solana_sdk::pubkey::Pubkey;
use solana_sdk::{stake, system_program};
use std::sync::{Mutex, MutexGuard};

/// Lock a mutex whose data stays consistent even if a holder panicked
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Human name of a native program, for log lines
pub fn program_label(program_id: &Pubkey) -> &'static str {
    if *program_id == system_program::id() {
        "System"
    } else if *program_id == stake::program::id() {
        "Stake"
    } else {
        "Unknown"
    }
}
