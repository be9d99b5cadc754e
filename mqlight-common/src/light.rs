//! State and command payloads of a JSON-schema light
//!
//! ```plain
//! example/state  -> {"state": "ON", "brightness": 120, "color": {"x": 0.3, "y": 0.4}}
//! example/set    <- {"state"?: "ON" | "OFF", "brightness"?: int, "color"?: {"x", "y"}}
//! ```

use core::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PowerState {
    On,
    Off,
}

impl PowerState {
    pub fn is_on(self) -> bool {
        self == PowerState::On
    }
}

impl From<bool> for PowerState {
    fn from(on: bool) -> Self {
        if on { PowerState::On } else { PowerState::Off }
    }
}

/// CIE 1931 color space x,y coordinates (nominally 0.0-1.0)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Color {
    pub x: f64,
    pub y: f64,
}

impl Color {
    /// Reads `{"x": .., "y": ..}`. Anything else, including an object missing
    /// either coordinate, yields `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        let x = value.get("x")?.as_f64()?;
        let y = value.get("y")?.as_f64()?;
        Some(Color { x, y })
    }

    pub fn in_gamut(&self) -> bool {
        (0.0..=1.0).contains(&self.x) && (0.0..=1.0).contains(&self.y)
    }
}

/// Published on the state topic after every command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub state: PowerState,
    pub brightness: u16,
    pub color: Color,
}

/// Partial update; `None` fields leave the current state untouched.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CommandPatch {
    pub power: Option<bool>,
    /// Raw requested value, not yet clamped to the brightness scale
    pub brightness: Option<i64>,
    pub color: Option<Color>,
}

impl CommandPatch {
    pub fn is_empty(&self) -> bool {
        self.power.is_none() && self.brightness.is_none() && self.color.is_none()
    }

    /// Picks out the recognized fields of a command payload.
    ///
    /// Unknown keys are ignored, and so is any known key whose value has the
    /// wrong shape. Only a payload that isn't an object at all is an error.
    pub fn from_value(value: &Value) -> Result<Self, PatchError> {
        let Value::Object(fields) = value else {
            return Err(PatchError::NotAnObject);
        };

        let power = match fields.get("state").and_then(Value::as_str) {
            Some("ON") => Some(true),
            Some("OFF") => Some(false),
            _ => None,
        };

        Ok(CommandPatch {
            power,
            brightness: fields.get("brightness").and_then(as_brightness),
            color: fields.get("color").and_then(Color::from_value),
        })
    }
}

/// Any JSON integer; those beyond `i64::MAX` saturate so they still clamp.
fn as_brightness(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_u64().map(|_| i64::MAX))
}

impl From<&StatusRecord> for CommandPatch {
    fn from(status: &StatusRecord) -> Self {
        CommandPatch {
            power: Some(status.state.is_on()),
            brightness: Some(status.brightness.into()),
            color: Some(status.color),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchError {
    NotAnObject,
}

impl Display for PatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchError::NotAnObject => f.write_str("command payload is not a JSON object"),
        }
    }
}

impl core::error::Error for PatchError {}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn status_format() {
        let status = StatusRecord {
            state: PowerState::On,
            brightness: 120,
            color: Color { x: 0.3, y: 0.4 },
        };

        assert_eq!(
            serde_json::to_value(&status).unwrap(),
            json!({ "state": "ON", "brightness": 120, "color": { "x": 0.3, "y": 0.4 } })
        );

        assert_eq!(serde_json::to_value(PowerState::Off).unwrap(), json!("OFF"));
    }

    #[test]
    fn parse_full_patch() {
        let patch = CommandPatch::from_value(&json!({
            "state": "ON",
            "brightness": 120,
            "color": { "x": 0.3, "y": 0.4 },
        }))
        .unwrap();

        assert_eq!(patch, CommandPatch {
            power: Some(true),
            brightness: Some(120),
            color: Some(Color { x: 0.3, y: 0.4 }),
        });
    }

    #[test]
    fn parse_partial_patches() {
        let patch = CommandPatch::from_value(&json!({ "brightness": 7 })).unwrap();
        assert_eq!(patch, CommandPatch { brightness: Some(7), ..Default::default() });

        let patch = CommandPatch::from_value(&json!({ "state": "OFF" })).unwrap();
        assert_eq!(patch, CommandPatch { power: Some(false), ..Default::default() });

        let patch = CommandPatch::from_value(&json!({ "brightness": -3 })).unwrap();
        assert_eq!(patch.brightness, Some(-3));

        let patch = CommandPatch::from_value(&json!({ "brightness": u64::MAX })).unwrap();
        assert_eq!(patch.brightness, Some(i64::MAX));

        let patch = CommandPatch::from_value(&json!({})).unwrap();
        assert!(patch.is_empty());
    }

    #[test]
    fn ignore_malformed_fields() {
        let patch = CommandPatch::from_value(&json!({
            "state": "bogus",
            "brightness": "high",
            "color": { "x": 0.3 },
            "effect": "rainbow",
        }))
        .unwrap();
        assert!(patch.is_empty());

        let patch = CommandPatch::from_value(&json!({ "state": "on" })).unwrap();
        assert_eq!(patch.power, None);

        let patch = CommandPatch::from_value(&json!({ "brightness": 12.5 })).unwrap();
        assert_eq!(patch.brightness, None);

        let patch = CommandPatch::from_value(&json!({ "color": [0.3, 0.4] })).unwrap();
        assert_eq!(patch.color, None);

        let patch = CommandPatch::from_value(&json!({ "color": { "x": "a", "y": 0.4 } })).unwrap();
        assert_eq!(patch.color, None);
    }

    #[test]
    fn reject_non_objects() {
        assert_eq!(CommandPatch::from_value(&json!(5)), Err(PatchError::NotAnObject));
        assert_eq!(CommandPatch::from_value(&json!("ON")), Err(PatchError::NotAnObject));
        assert_eq!(CommandPatch::from_value(&json!(null)), Err(PatchError::NotAnObject));
    }

    #[test]
    fn integer_coordinates() {
        assert_eq!(
            Color::from_value(&json!({ "x": 0, "y": 1 })),
            Some(Color { x: 0.0, y: 1.0 })
        );
    }

    #[test]
    fn gamut() {
        assert!(Color { x: 0.3, y: 0.4 }.in_gamut());
        assert!(Color::default().in_gamut());
        assert!(!Color { x: 1.5, y: 0.4 }.in_gamut());
        assert!(!Color { x: 0.3, y: -0.1 }.in_gamut());
    }
}
