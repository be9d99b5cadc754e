//! Home Assistant MQTT discovery descriptor for a JSON-schema light

use alloc::vec::Vec;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    /// Supports brightness
    pub brightness: bool,
    /// Supports CIE xy color
    pub xy: bool,
    /// Always `"json"`
    pub schema: CompactString,
    pub command_topic: CompactString,
    pub state_topic: CompactString,
    pub json_attributes_topic: CompactString,
    pub brightness_scale: u16,
    pub name: CompactString,
    pub unique_id: CompactString,
    pub device: DeviceInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub identifiers: Vec<CompactString>,
    pub name: CompactString,
    pub sw_version: CompactString,
    pub model: CompactString,
    pub manufacturer: CompactString,
}

impl Announcement {
    pub const SCHEMA: &'static str = "json";
}
