use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use sts_gateway::app::{self, Args};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match app::run(args).await {
        Ok(_) => Ok(()),
        Err(e) => {
            error!("error:{:?}", e);
            Err(e)
        }
    }
}
