use serde::{Deserialize, Serialize};

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8888";
pub const DEFAULT_BUS_URL: &str = "redis://127.0.0.1:6379";
pub const DEFAULT_MAX_PACKET_SIZE: usize = 16 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub listen_addr: String,
    pub bus_url: String,
    pub max_packet_size: usize,
}

impl Default for AgentConfig {
    fn default() -> AgentConfig {
        AgentConfig {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            bus_url: DEFAULT_BUS_URL.to_string(),
            max_packet_size: DEFAULT_MAX_PACKET_SIZE,
        }
    }
}
