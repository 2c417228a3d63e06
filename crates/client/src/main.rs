//! Battle client binary.
//!
//! ```bash
//! BATTLE_ROOM=crypt-3 BATTLE_SEED=7 RUST_LOG=debug cargo run -p battle-client
//! ```

use anyhow::Result;
use battle_client::{ClientConfig, logging, run_battle};
use runtime::CancelToken;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = ClientConfig::from_env();
    let _log_guard = logging::setup_logging(config.log_dir.as_deref())?;

    let cancel = CancelToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!(target: "client", "Interrupted, cancelling battle");
            on_interrupt.cancel();
        }
    });

    tracing::info!(target: "client", room = %config.room_id, "Starting battle");
    let report = run_battle(&config, &cancel).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
