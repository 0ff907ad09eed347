use anyhow::{Context, Result};
use slopguard::{
    app::SlopApp,
    banlist::{describe_preset, list_presets},
    config,
    infrastructure::{directories, logging},
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let targets: Vec<String> = std::env::args().skip(1).collect();
    if targets.is_empty() {
        anyhow::bail!("usage: slopguard <url|domain|file>...  |  slopguard --presets");
    }
    if targets.iter().any(|arg| arg == "--presets") {
        for name in list_presets() {
            println!("{name}\t{}", describe_preset(name)?);
        }
        return Ok(());
    }

    let config = config::load_config().context("invalid configuration")?;
    let paths = directories::ensure_directories(&config.directories)?;
    logging::init_tracing(&config, &paths)?;

    tracing::info!(
        target: "app",
        version = env!("CARGO_PKG_VERSION"),
        targets = targets.len(),
        "slopguard starting"
    );
    let app = SlopApp::initialize(config)?;
    app.run(&targets).await
}
