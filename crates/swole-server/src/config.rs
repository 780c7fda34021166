//! Server configuration from command-line flags with environment fallbacks

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DATABASE_FILE_NAME: &str = "app.sqlite";

#[derive(Debug, Clone, Parser)]
#[command(name = "swole-server")]
#[command(version, about = "Swole - users and workouts API", long_about = None)]
pub struct Config {
    /// Address to listen on
    #[arg(long = "bind", env = "BIND_ADDRESS", default_value = "127.0.0.1:5000")]
    pub bind_address: SocketAddr,

    /// Directory holding the database file
    #[arg(long, env = "DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Database file, overrides <data-dir>/app.sqlite
    #[arg(long = "database", env = "DATABASE_PATH")]
    pub database_path: Option<PathBuf>,

    /// Log filter, e.g. "info" or "swole_server=debug,tower_http=debug"
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

impl Config {
    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join(DATABASE_FILE_NAME))
    }
}
