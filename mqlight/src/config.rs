use core::time::Duration;

use compact_str::{CompactString, ToCompactString as _};
use mqlight_common::discovery::{Announcement, DeviceInfo};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Config {
    pub broker: BrokerConfig,
    pub device: DeviceConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BrokerConfig {
    pub host: String,
    pub port: u16,
    pub keep_alive: Duration,
    pub client_id: String,
    /// How long startup waits for the broker to acknowledge the command
    /// subscription before publishing the initial state anyway
    pub subscribe_timeout: Duration,
}

impl BrokerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: "10.1.1.2".to_owned(),
            port: 1883,
            keep_alive: Duration::from_secs(60),
            client_id: "mqlight-example".to_owned(),
            subscribe_timeout: Duration::from_secs(1),
        }
    }
}

/// Identity and topics of the light. Everything here ends up in the discovery
/// announcement.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceConfig {
    pub discovery_topic: String,
    pub command_topic: String,
    pub state_topic: String,
    pub name: String,
    pub unique_id: String,
    pub identifiers: Vec<String>,
    pub sw_version: String,
    pub model: String,
    pub manufacturer: String,
    pub brightness_scale: u16,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            discovery_topic: "homeassistant/light/example/light/config".to_owned(),
            command_topic: "example/set".to_owned(),
            state_topic: "example/state".to_owned(),
            name: "example LED light".to_owned(),
            unique_id: "f3dfb856-1479-4094-8ded-6e252d73d24e".to_owned(),
            identifiers: vec!["example".to_owned()],
            sw_version: "0.69 beta alpha".to_owned(),
            model: "Mayhems personal silly lighting projects".to_owned(),
            manufacturer: "Mayhem & Chaos Labs".to_owned(),
            brightness_scale: 254,
        }
    }
}

impl DeviceConfig {
    pub fn announcement(&self) -> Announcement {
        Announcement {
            brightness: true,
            xy: true,
            schema: CompactString::const_new(Announcement::SCHEMA),
            command_topic: self.command_topic.to_compact_string(),
            state_topic: self.state_topic.to_compact_string(),
            json_attributes_topic: self.state_topic.to_compact_string(),
            brightness_scale: self.brightness_scale,
            name: self.name.to_compact_string(),
            unique_id: self.unique_id.to_compact_string(),
            device: DeviceInfo {
                identifiers: self.identifiers.iter().map(|id| id.to_compact_string()).collect(),
                name: self.name.to_compact_string(),
                sw_version: self.sw_version.to_compact_string(),
                model: self.model.to_compact_string(),
                manufacturer: self.manufacturer.to_compact_string(),
            },
        }
    }
}
