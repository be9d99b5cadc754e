use mqlight_common::light::{Color, CommandPatch, PowerState, StatusRecord};

/// In-memory state of the one light this process pretends to be.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceState {
    power: bool,
    brightness: u16,
    color: Color,
    scale: u16,
}

impl DeviceState {
    /// Starts off, dark, at `(0, 0)`.
    pub fn new(scale: u16) -> Self {
        Self { power: false, brightness: 0, color: Color::default(), scale }
    }

    pub fn scale(&self) -> u16 {
        self.scale
    }

    pub fn set_power(&mut self, on: bool) {
        self.power = on;
    }

    /// Clamps to `[0, scale]`.
    pub fn set_brightness(&mut self, brightness: i64) {
        let clamped = brightness.clamp(0, i64::from(self.scale));

        if clamped != brightness {
            tracing::warn!(
                requested = brightness,
                clamped,
                scale = self.scale,
                "Brightness out of range",
            );
        }

        // fits: clamped into [0, scale]
        self.brightness = clamped as u16;
    }

    pub fn set_color(&mut self, color: Color) {
        if !color.in_gamut() {
            tracing::warn!(x = color.x, y = color.y, "Color outside the CIE xy unit square");
        }

        self.color = color;
    }

    pub fn apply_command(&mut self, patch: CommandPatch) {
        if let Some(on) = patch.power {
            self.set_power(on);
        }

        if let Some(brightness) = patch.brightness {
            self.set_brightness(brightness);
        }

        if let Some(color) = patch.color {
            self.set_color(color);
        }
    }

    pub fn snapshot(&self) -> StatusRecord {
        StatusRecord {
            state: PowerState::from(self.power),
            brightness: self.brightness,
            color: self.color,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn lit() -> DeviceState {
        let mut light = DeviceState::new(254);
        light.apply_command(CommandPatch {
            power: Some(true),
            brightness: Some(200),
            color: Some(Color { x: 0.5, y: 0.25 }),
        });
        light
    }

    #[test]
    fn initial_state() {
        assert_eq!(
            serde_json::to_value(DeviceState::new(254).snapshot()).unwrap(),
            json!({ "state": "OFF", "brightness": 0, "color": { "x": 0.0, "y": 0.0 } })
        );
    }

    #[test]
    fn brightness_only_patch() {
        for mut light in [DeviceState::new(254), lit()] {
            let before = light.snapshot();

            light.apply_command(CommandPatch { brightness: Some(42), ..Default::default() });

            let after = light.snapshot();
            assert_eq!(after.brightness, 42);
            assert_eq!(after.state, before.state);
            assert_eq!(after.color, before.color);
        }
    }

    #[test]
    fn power_toggle() {
        let mut light = DeviceState::new(254);

        for payload in [json!({ "state": "ON" }), json!({ "state": "OFF" })] {
            light.apply_command(CommandPatch::from_value(&payload).unwrap());
        }
        assert_eq!(light.snapshot().state, PowerState::Off);

        light.apply_command(CommandPatch::from_value(&json!({ "state": "ON" })).unwrap());
        light.apply_command(CommandPatch::from_value(&json!({ "state": "bogus" })).unwrap());
        assert_eq!(light.snapshot().state, PowerState::On);
    }

    #[test]
    fn last_write_wins() {
        let mut light = DeviceState::new(254);

        light.apply_command(CommandPatch { brightness: Some(10), ..Default::default() });
        light.apply_command(CommandPatch {
            color: Some(Color { x: 0.1, y: 0.2 }),
            ..Default::default()
        });
        light.apply_command(CommandPatch { power: Some(true), brightness: Some(30), color: None });
        light.apply_command(CommandPatch::default());

        assert_eq!(light.snapshot(), StatusRecord {
            state: PowerState::On,
            brightness: 30,
            color: Color { x: 0.1, y: 0.2 },
        });
    }

    #[test]
    fn brightness_is_clamped() {
        let mut light = DeviceState::new(254);

        light.set_brightness(1000);
        assert_eq!(light.snapshot().brightness, light.scale());

        light.apply_command(
            CommandPatch::from_value(&json!({ "brightness": u64::MAX })).unwrap(),
        );
        assert_eq!(light.snapshot().brightness, 254);

        light.set_brightness(-5);
        assert_eq!(light.snapshot().brightness, 0);

        let mut light = DeviceState::new(100);
        light.apply_command(CommandPatch { brightness: Some(254), ..Default::default() });
        assert_eq!(light.snapshot().brightness, 100);
    }

    #[test]
    fn out_of_gamut_color_is_kept() {
        let mut light = DeviceState::new(254);
        light.set_color(Color { x: 1.5, y: -0.2 });
        assert_eq!(light.snapshot().color, Color { x: 1.5, y: -0.2 });
    }

    #[test]
    fn snapshot_round_trip_is_idempotent() {
        let mut light = lit();
        let before = light.snapshot();

        let encoded = serde_json::to_string(&before).unwrap();
        let decoded: serde_json::Value = serde_json::from_str(&encoded).unwrap();
        light.apply_command(CommandPatch::from_value(&decoded).unwrap());

        assert_eq!(light.snapshot(), before);
        assert_eq!(CommandPatch::from(&before), CommandPatch::from_value(&decoded).unwrap());
    }
}
