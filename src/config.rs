//! Server configuration from the command line and the environment.

use clap::Parser;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Parser)]
#[command(name = "uno-rooms", about = "Multiplayer UNO room server")]
pub struct Cli {
    /// Address to listen on. Defaults to 0.0.0.0 on $PORT (or 8000).
    #[arg(long)]
    pub bind: Option<SocketAddr>,

    /// Directory holding one JSON document per room.
    #[arg(long, default_value = "rooms")]
    pub rooms_dir: PathBuf,

    /// Keep rooms in memory only.
    #[arg(long)]
    pub in_memory: bool,

    /// Seed for reproducible shuffles.
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    Files(PathBuf),
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub store: StoreConfig,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidPort(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort(value) => write!(f, "Invalid PORT value '{}'", value),
        }
    }
}

impl std::error::Error for ConfigError {}

impl ServerConfig {
    /// Combines CLI arguments with the `PORT` variable. `--bind` wins over `PORT`.
    pub fn resolve(cli: Cli, port_env: Option<String>) -> Result<Self, ConfigError> {
        let bind = match cli.bind {
            Some(bind) => bind,
            None => {
                let port = match port_env {
                    Some(value) => value
                        .trim()
                        .parse::<u16>()
                        .map_err(|_| ConfigError::InvalidPort(value))?,
                    None => DEFAULT_PORT,
                };
                SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port)
            }
        };

        let store = if cli.in_memory {
            StoreConfig::Memory
        } else {
            StoreConfig::Files(cli.rooms_dir)
        };

        Ok(Self {
            bind,
            store,
            seed: cli.seed,
        })
    }

    pub fn from_env(cli: Cli) -> Result<Self, ConfigError> {
        Self::resolve(cli, std::env::var("PORT").ok())
    }
}
