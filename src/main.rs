#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![warn(clippy::nursery)]
#![allow(clippy::multiple_crate_versions)]
mod cli;

use crate::cli::{Cli, Commands, EngineConfig};
use anyhow::Context;
use carzone::inventory::InventoryService;
use carzone::listing::NewListing;
use carzone::server;
use carzone::storage::{Config, InventoryStore, MemoryStorage, RocksStorage};
use clap::Parser;
use log::info;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Start(cmd) => {
            let storage: Arc<dyn InventoryStore> = if cmd.server_config.memory {
                info!("Using in-memory inventory");
                Arc::new(MemoryStorage::new())
            } else {
                Arc::new(RocksStorage::open(&engine_config(&cmd.engine_config))?)
            };

            server::start_server(storage, &cmd.server_config.address).await?;
        }
        Commands::Import(cmd) => {
            let raw = std::fs::read_to_string(&cmd.file)
                .with_context(|| format!("reading {}", cmd.file.display()))?;
            let batch: Vec<NewListing> = serde_json::from_str(&raw)
                .with_context(|| format!("parsing {}", cmd.file.display()))?;

            let storage = RocksStorage::open(&engine_config(&cmd.engine_config))?;
            let imported = InventoryService::new(Arc::new(storage))
                .import(batch)
                .await?;
            info!("Imported {} listings from {}", imported.len(), cmd.file.display());
        }
    }

    Ok(())
}

fn engine_config(engine: &EngineConfig) -> Config {
    Config {
        data_dir: engine.data_dir.clone(),
        write_buffer_size_mb: engine.write_buffer_size,
        max_write_buffer_number: engine.max_write_buffers,
        max_background_jobs: engine.max_background_jobs,
        parallelism: engine.parallelism,
    }
}
