use std::path::Path;

use opensearch::{config::Config, web};
use tracing::info;

#[tokio::main(flavor = "current_thread")]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt::init();

    info!(
        "Starting opensearch {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH_SHORT")
    );

    let config_path = std::env::args().nth(1).unwrap_or("config.toml".into());
    let config = Config::read_or_create(Path::new(&config_path))?;

    web::run(config).await
}
