use anyhow::Result;
use tracing::{error, info};

mod cli;
mod crawler;
mod error;
mod fetch;
mod storage;
mod utils;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments first so --verbose can shape the logger
    let args = cli::parse_args();

    utils::logging::init_logging(args.verbose, args.log_file.clone())?;

    info!("Starting harvester v{}", env!("CARGO_PKG_VERSION"));

    match cli::process_command(args).await {
        Ok(_) => {
            info!("Command completed successfully");
            Ok(())
        }
        Err(e) => {
            error!("Command failed: {:#}", e);
            Err(e)
        }
    }
}
