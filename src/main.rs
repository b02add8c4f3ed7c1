use std::sync::Arc;

use clap::Parser;

use flowtels::cli::Cli;
use flowtels::config::EnvConfig;
use flowtels::logging::init_logging;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = EnvConfig::from_env()?;
    init_logging(config.profile);

    cli.run(Arc::new(config)).await
}
