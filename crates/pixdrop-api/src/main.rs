use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use pixdrop_api::setup::{initialize_app, server::start_server};
use pixdrop_core::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    let (state, app) = initialize_app(config).await?;

    start_server(&state.config, app).await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}
