//! Data types shared by the device client and the dispatcher.

use strum_macros::{EnumIter, FromRepr};

/// Regulation mode reported by the supply.
///
/// The supply switches between constant-voltage and constant-current
/// regulation on its own; over-current protection is latched by the
/// firmware and can only be cleared from the front panel.
#[derive(Debug, Copy, Clone, PartialEq, Eq, EnumIter, FromRepr)]
#[repr(u16)]
pub enum RegulationMode {
    ConstantCurrent = 0,
    ConstantVoltage = 1,
    OvercurrentProtection = 2,
}

/// Used to be less ambiguous about whether the output relay is on or off.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OutputState {
    /// Relay open, no output.
    Off,
    /// Relay closed, output live.
    On,
}

impl From<OutputState> for bool {
    fn from(value: OutputState) -> Self {
        matches!(value, OutputState::On)
    }
}

impl From<bool> for OutputState {
    fn from(value: bool) -> Self {
        if value { OutputState::On } else { OutputState::Off }
    }
}

impl From<OutputState> for u16 {
    fn from(value: OutputState) -> Self {
        match value {
            OutputState::Off => 0,
            OutputState::On => 1,
        }
    }
}

/// One self-consistent read of the six status registers.
///
/// Produced atomically by a single block read, so the fields describe the
/// device at one instant. Superseded by the next poll, never mutated.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub set_voltage_raw: u16,
    pub set_current_raw: u16,
    pub output_voltage_raw: u16,
    pub output_current_raw: u16,
    pub output_on: bool,
    pub mode: RegulationMode,
}

impl StatusSnapshot {
    /// Build a snapshot from the raw status block
    /// (SetVoltage, SetCurrent, OutputVoltage, OutputCurrent, RunStop,
    /// RegulationMode). Returns `None` for a short block or an unknown
    /// regulation-mode value.
    pub fn from_block(block: &[u16]) -> Option<Self> {
        if block.len() < 6 {
            return None;
        }
        Some(Self {
            set_voltage_raw: block[0],
            set_current_raw: block[1],
            output_voltage_raw: block[2],
            output_current_raw: block[3],
            output_on: block[4] != 0,
            mode: RegulationMode::from_repr(block[5])?,
        })
    }

    /// Voltage set-point in millivolts.
    pub const fn set_voltage_millivolts(&self) -> u32 {
        crate::scaling::raw_to_millivolts(self.set_voltage_raw)
    }

    /// Current set-point in milliamps.
    pub const fn set_current_milliamps(&self) -> u32 {
        crate::scaling::raw_to_milliamps(self.set_current_raw)
    }

    /// Measured output voltage in millivolts.
    pub const fn output_millivolts(&self) -> u32 {
        crate::scaling::raw_to_millivolts(self.output_voltage_raw)
    }

    /// Measured output current in milliamps.
    pub const fn output_milliamps(&self) -> u32 {
        crate::scaling::raw_to_milliamps(self.output_current_raw)
    }
}

/// Which snapshot fields differ from the previously delivered snapshot.
///
/// Comparison is exact raw integer equality, field by field.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct ChangedFields {
    pub set_voltage: bool,
    pub set_current: bool,
    pub output_voltage: bool,
    pub output_current: bool,
    pub output_on: bool,
    pub mode: bool,
}

impl ChangedFields {
    /// Every field marked changed (used for the very first delivery).
    pub const fn all() -> Self {
        Self {
            set_voltage: true,
            set_current: true,
            output_voltage: true,
            output_current: true,
            output_on: true,
            mode: true,
        }
    }

    pub fn diff(prev: &StatusSnapshot, next: &StatusSnapshot) -> Self {
        Self {
            set_voltage: prev.set_voltage_raw != next.set_voltage_raw,
            set_current: prev.set_current_raw != next.set_current_raw,
            output_voltage: prev.output_voltage_raw != next.output_voltage_raw,
            output_current: prev.output_current_raw != next.output_current_raw,
            output_on: prev.output_on != next.output_on,
            mode: prev.mode != next.mode,
        }
    }

    pub fn any(&self) -> bool {
        self.set_voltage
            || self.set_current
            || self.output_voltage
            || self.output_current
            || self.output_on
            || self.mode
    }
}
