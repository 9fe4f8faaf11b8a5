use serde::{Deserialize, Serialize};

pub const DEFAULT_AGENT_ADDR: &str = "127.0.0.1:8888";
pub const DEFAULT_MAX_PACKET_SIZE: usize = 16 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub agent_addr: String,
    pub max_packet_size: usize,
}

impl Default for ClientConfig {
    fn default() -> ClientConfig {
        ClientConfig {
            agent_addr: DEFAULT_AGENT_ADDR.to_string(),
            max_packet_size: DEFAULT_MAX_PACKET_SIZE,
        }
    }
}
