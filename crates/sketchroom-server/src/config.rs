//! Command-line and environment configuration.

use clap::Parser;
use std::net::SocketAddr;

/// Sketchroom relay server
#[derive(Parser, Debug, Clone)]
#[command(name = "sketchroom-server")]
#[command(about = "WebSocket relay for shared Sketchroom documents")]
#[command(version)]
pub struct ServerConfig {
    /// Address to listen on
    #[arg(long, env = "SKETCHROOM_ADDR", default_value = "0.0.0.0:3030")]
    pub addr: SocketAddr,

    /// Per-room broadcast buffer; slow peers lag behind after this many messages
    #[arg(long, env = "SKETCHROOM_CHANNEL_CAPACITY", default_value_t = 256)]
    pub channel_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 3030)),
            channel_capacity: 256,
        }
    }
}
