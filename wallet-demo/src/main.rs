use anyhow::{Context, Result};
use std::env;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use wallet_demo_sdk::{DemoConfig, FlowKind, FlowState, LocalKeypairAgent, SessionManager};

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = DemoConfig::from_env().context("loading configuration")?;
    let keypair_path = env::var("KEYPAIR")
        .unwrap_or_else(|_| shellexpand::tilde("~/.config/solana/id.json").into_owned());
    let agent = LocalKeypairAgent::from_file(&keypair_path)
        .with_context(|| format!("loading wallet keypair from {}", keypair_path))?;

    info!(rpc_url = %config.rpc_url, network = config.network(), "starting wallet demo");
    println!("Wallet Adapter Demo");
    println!("Network: {}", config.network());

    let manager = SessionManager::with_rpc(config);
    println!("Agent endpoint: {}", manager.provider_endpoint());

    // A failed handshake is already in the log
    if manager.select_agent(Arc::new(agent)).await.is_ok() {
        let snapshot = manager.snapshot();
        if let Some(identity) = snapshot.identity {
            println!("Wallet address: {}", identity);
        }

        manager.transfer().await;
        manager.sign_message().await;
        manager.airdrop().await;
        manager.create_and_delegate_stake().await;
    }
    manager.get_stake_account().await;
    manager.shutdown().await;

    let snapshot = manager.snapshot();
    println!();
    for entry in &snapshot.log {
        println!("{}", entry);
    }

    println!();
    for flow in [
        FlowKind::Transfer,
        FlowKind::SignMessage,
        FlowKind::Airdrop,
        FlowKind::CreateAndDelegateStake,
        FlowKind::GetStakeAccount,
    ] {
        let state = snapshot.flow_state(flow);
        let mark = match state {
            _ if !state.is_finished() => "skipped",
            FlowState::Failed => "FAILED",
            _ => "ok",
        };
        println!("{:<28} {}", flow.to_string(), mark);
    }

    Ok(())
}
