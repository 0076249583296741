//! Raw register value conversions.
//!
//! The LW-3010EC stores voltage and current as ×100 fixed point: raw 1200
//! is 12.00 V, raw 301 is 3.01 A. The relay and mode registers are plain
//! enumerations with no scaling.

/// Raw-to-physical divisor for the voltage and current registers.
pub const FIXED_POINT_DIVISOR: u16 = 100;

/// Convert a raw centivolt register value to millivolts.
#[inline]
pub const fn raw_to_millivolts(raw: u16) -> u32 {
    (raw as u32) * 10
}

/// Convert millivolts to the raw centivolt register encoding.
///
/// Sub-centivolt precision is truncated, matching the device resolution.
#[inline]
pub const fn millivolts_to_raw(millivolts: u32) -> u16 {
    (millivolts / 10) as u16
}

/// Convert a raw centiamp register value to milliamps.
#[inline]
pub const fn raw_to_milliamps(raw: u16) -> u32 {
    (raw as u32) * 10
}

/// Convert milliamps to the raw centiamp register encoding.
#[inline]
pub const fn milliamps_to_raw(milliamps: u32) -> u16 {
    (milliamps / 10) as u16
}

/// Display helper: raw fixed-point value to physical units (volts or amps).
#[inline]
pub fn raw_to_display(raw: u16) -> f32 {
    raw as f32 / FIXED_POINT_DIVISOR as f32
}
