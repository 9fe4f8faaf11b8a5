use serde::{Deserialize, Serialize};

pub const DEFAULT_BUS_URL: &str = "redis://127.0.0.1:6379";
pub const DEFAULT_GLOBAL_TARGET: &str = "global";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneConfig {
    pub zone_id: String,
    pub bus_url: String,
    /// The broadcast target every Zone subscribes to in addition to its own
    /// `zone_id.*` pattern.
    pub global_target: String,
}

impl ZoneConfig {
    pub fn new(zone_id: impl Into<String>) -> ZoneConfig {
        ZoneConfig {
            zone_id: zone_id.into(),
            bus_url: DEFAULT_BUS_URL.to_string(),
            global_target: DEFAULT_GLOBAL_TARGET.to_string(),
        }
    }
}

impl Default for ZoneConfig {
    fn default() -> ZoneConfig {
        ZoneConfig::new("default")
    }
}
