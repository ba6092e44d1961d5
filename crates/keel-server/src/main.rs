//! Keel server binary.

use keel_config::SettingsLoader;
use keel_server::{bootstrap, logging, server};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = SettingsLoader::new()
        .with_dotenv()
        .with_optional_file("keel.toml")?
        .with_env_prefix("KEEL")
        .load()?;

    logging::init_logging(&settings.log)?;

    let state = bootstrap::build_state_with_redis(settings).await?;

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_token.cancel();
        }
    });

    server::run(state, shutdown).await?;
    Ok(())
}
