//! RGB main light on three LEDC PWM channels.
//!
//! Cluster attributes arrive as level / hue / saturation on a 0–254 scale.
//! [`hsv_to_rgb`] converts them to 8-bit channel duties.

use crate::app::ports::LightPort;
use crate::drivers::hw_init;

/// Colour as (R, G, B) duty, each 0–255.
pub type Rgb = (u8, u8, u8);

const SCALE_MAX: u32 = 254;

/// Convert level / hue / saturation (each 0–254) into channel duties.
pub fn hsv_to_rgb(level: u8, hue: u8, saturation: u8) -> Rgb {
    let v = u32::from(level).min(SCALE_MAX) * 255 / SCALE_MAX;
    let s = u32::from(saturation).min(SCALE_MAX) * 255 / SCALE_MAX;
    if s == 0 {
        let v = v as u8;
        return (v, v, v);
    }

    // Hue in sixths of the wheel, 0..=1530 (6 * 255).
    let h = u32::from(hue) * 6 * 255 / (SCALE_MAX + 1);
    let sector = h / 255;
    let frac = h % 255;

    let p = v * (255 - s) / 255;
    let q = v * (255 - s * frac / 255) / 255;
    let t = v * (255 - s * (255 - frac) / 255) / 255;

    let (r, g, b) = match sector {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    (r as u8, g as u8, b as u8)
}

pub struct RgbLight {
    current: Rgb,
}

impl Default for RgbLight {
    fn default() -> Self {
        Self::new()
    }
}

impl RgbLight {
    pub fn new() -> Self {
        Self { current: (0, 0, 0) }
    }

    pub fn current(&self) -> Rgb {
        self.current
    }

    fn write(&mut self, rgb: Rgb) {
        hw_init::ledc_set(hw_init::LEDC_CH_LIGHT_R, rgb.0);
        hw_init::ledc_set(hw_init::LEDC_CH_LIGHT_G, rgb.1);
        hw_init::ledc_set(hw_init::LEDC_CH_LIGHT_B, rgb.2);
        self.current = rgb;
    }
}

impl LightPort for RgbLight {
    fn set_level(&mut self, level: u8) {
        let v = (u32::from(level) * 255 / SCALE_MAX) as u8;
        self.write((v, v, v));
    }

    fn set_color(&mut self, level: u8, hue: u8, saturation: u8) {
        self.write(hsv_to_rgb(level, hue, saturation));
    }
}
