use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    version,
    name = "CarZone",
    about = r#"
Catalog search service for the CarZone car marketplace.

Serves listing search, filter options, featured cars and inventory
management over a length-prefixed MessagePack protocol."#
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start the server
    Start(StartCommand),
    /// Import a JSON array of listings into the store
    Import(ImportCommand),
}

#[derive(Debug, Clone, Args)]
pub struct ServerConfig {
    /// Address for the catalog server.
    #[arg(long, short, env = "CARZONE_ADDRESS", default_value = "127.0.0.1:6969")]
    pub address: String,
    /// Keep the inventory in memory instead of RocksDB.
    #[arg(long, default_value_t = false)]
    pub memory: bool,
}

#[derive(Debug, Clone, Args)]
pub struct EngineConfig {
    /// Path to the inventory directory.
    #[arg(long, short, env = "CARZONE_DATA_DIR", default_value = "./carzone_data")]
    pub data_dir: String,
    /// Size of the write buffer in megabytes.
    #[arg(long, env = "CARZONE_WRITE_BUFFER_SIZE", default_value_t = 64)]
    pub write_buffer_size: usize,
    /// Maximum number of write buffers.
    #[arg(long, env = "CARZONE_MAX_WRITE_BUFFERS", default_value_t = 4)]
    pub max_write_buffers: i32,
    /// Maximum background jobs.
    #[arg(long, env = "CARZONE_MAX_BACKGROUND_JOBS", default_value_t = num_cpus::get() as i32 * 2)]
    pub max_background_jobs: i32,
    /// Number of background threads for flush and compaction.
    #[arg(long, env = "CARZONE_PARALLELISM", default_value_t = num_cpus::get() as i32)]
    pub parallelism: i32,
}

#[derive(Debug, Clone, Args)]
pub struct StartCommand {
    #[command(flatten)]
    pub server_config: ServerConfig,

    #[command(flatten)]
    pub engine_config: EngineConfig,
}

#[derive(Debug, Clone, Args)]
pub struct ImportCommand {
    /// JSON file holding an array of listings.
    pub file: PathBuf,

    #[command(flatten)]
    pub engine_config: EngineConfig,
}
