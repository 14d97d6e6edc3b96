use clap::Parser;
use log::{error, info};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use uno_rooms::config::{Cli, ServerConfig, StoreConfig};
use uno_rooms::uno_game::api::start_api_server;
use uno_rooms::uno_game::{
    FileRoomStore, MemoryRoomStore, RoomService, RoomStore, SeededShuffler, Shuffler,
    ThreadShuffler,
};

/// Application logs go through `log`; HTTP spans from the trace layer go
/// through `tracing`.
fn init_logging() {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        error!("Failed to install tracing subscriber: {}", e);
    }
}

#[tokio::main]
async fn main() {
    init_logging();

    let config = match ServerConfig::from_env(Cli::parse()) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(2);
        }
    };

    let store: Arc<dyn RoomStore> = match &config.store {
        StoreConfig::Memory => {
            info!("Keeping rooms in memory");
            Arc::new(MemoryRoomStore::new())
        }
        StoreConfig::Files(dir) => match FileRoomStore::new(dir.clone()) {
            Ok(store) => {
                info!("Storing rooms in {}", dir.display());
                Arc::new(store)
            }
            Err(e) => {
                error!("Failed to open room directory {}: {}", dir.display(), e);
                std::process::exit(1);
            }
        },
    };

    let shuffler: Arc<dyn Shuffler> = match config.seed {
        Some(seed) => {
            info!("Using seeded shuffles (seed {})", seed);
            Arc::new(SeededShuffler::new(seed))
        }
        None => Arc::new(ThreadShuffler),
    };

    if let Err(e) = start_api_server(config.bind, RoomService::new(store, shuffler)).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}
