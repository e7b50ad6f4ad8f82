//! Light output ↔ cluster attributes.

use crate::app::ports::{AttributePath, LightAttribute, LightPort, StackAccess, StackError};

/// Level written alongside on/off by [`write_on_off`].
pub const FULL_LEVEL: u8 = 254;

/// Snapshot of the light cluster attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightState {
    pub on: bool,
    pub level: u8,
    pub hue: u8,
    pub saturation: u8,
}

/// Read on/off, level, hue and saturation, in that order.  The first
/// failure aborts the read.
pub fn read_light_state<K: StackAccess + ?Sized>(
    stack: &K,
    endpoint: u16,
) -> Result<LightState, StackError> {
    let read = |attribute| stack.read_attribute(AttributePath::new(endpoint, attribute));
    let on = read(LightAttribute::OnOff)? != 0;
    let level = read(LightAttribute::CurrentLevel)?;
    let hue = read(LightAttribute::CurrentHue)?;
    let saturation = read(LightAttribute::CurrentSaturation)?;
    Ok(LightState {
        on,
        level,
        hue,
        saturation,
    })
}

/// Drive the light from a cluster snapshot.
pub fn apply_light_state<L: LightPort + ?Sized>(light: &mut L, state: &LightState, color: bool) {
    if !state.on {
        light.set_level(0);
    } else if color {
        light.set_color(state.level, state.hue, state.saturation);
    } else {
        light.set_level(state.level);
    }
}

/// Write on/off, then current level = [`FULL_LEVEL`].
pub fn write_on_off<K: StackAccess + ?Sized>(
    stack: &mut K,
    endpoint: u16,
    on: bool,
) -> Result<(), StackError> {
    stack.write_attribute(
        AttributePath::new(endpoint, LightAttribute::OnOff),
        u8::from(on),
    )?;
    stack.write_attribute(
        AttributePath::new(endpoint, LightAttribute::CurrentLevel),
        FULL_LEVEL,
    )
}
