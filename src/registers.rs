//! Register map of the LW-3010EC.
//!
//! Addresses are the raw protocol addresses from the vendor's Modbus
//! programming guide (0x1000 base, zero-based protocol addressing). Some
//! firmware revisions document the same table one-based; this crate uses
//! the protocol addresses verbatim and nothing else.

/// Highest accepted raw voltage set-point (exclusive). 3000 => 30.00 V.
pub const MAX_VOLTAGE_RAW: u16 = 3000;
/// Highest accepted raw current set-point (exclusive). 1050 => 10.50 A.
pub const MAX_CURRENT_RAW: u16 = 1050;
/// Highest assignable Modbus slave address.
pub const MAX_SLAVE_ADDRESS: u8 = 247;

/// First register of the contiguous status block.
pub const STATUS_BLOCK_START: u16 = LwRegister::SetVoltage as u16;
/// Number of registers in the status block (SetVoltage..=RegulationMode).
pub const STATUS_BLOCK_LEN: u16 = 6;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u16)]
pub enum LwRegister {
    /// __W__ - Voltage set-point, raw centivolts (0-3000 => 0-30.00 V).
    SetVoltage = 0x1000,
    /// __W__ - Current set-point, raw centiamps (0-1050 => 0-10.50 A).
    SetCurrent = 0x1001,
    /// __R__ - Measured output voltage, raw centivolts.
    OutputVoltage = 0x1002,
    /// __R__ - Measured output current, raw centiamps.
    OutputCurrent = 0x1003,
    /// __R__ - Output relay state.
    /// * `0` - Output off.
    /// * `1` - Output on.
    RunStop = 0x1004,
    /// __R__ - Regulation mode.
    /// * `0` - Constant current.
    /// * `1` - Constant voltage.
    /// * `2` - Over-current protection tripped.
    ///
    /// See [`RegulationMode`](crate::types::RegulationMode).
    RegulationMode = 0x1005,
    /// __W__ - Output relay control. Same encoding as [`LwRegister::RunStop`].
    SetRunStop = 0x1006,
    /// __W__ - Slave address of the machine, 1-247. Applied after power cycle.
    SetSlaveAddress = 0x1008,
}

impl From<LwRegister> for u16 {
    fn from(value: LwRegister) -> Self {
        value as u16
    }
}

/// Access mode of a register as exposed by the device firmware.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

/// Static description of one register: fixed at definition time, never
/// mutated at runtime.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RegisterInfo {
    pub address: u16,
    pub name: &'static str,
    pub access: Access,
    /// Raw-to-physical divisor (100 for the fixed-point V/A registers,
    /// 1 for the plain enumerations).
    pub scale: u16,
    /// Largest raw value the device firmware stores in this register.
    pub max_raw: u16,
}

impl LwRegister {
    pub const fn info(self) -> RegisterInfo {
        match self {
            LwRegister::SetVoltage => RegisterInfo {
                address: 0x1000,
                name: "Set-U",
                access: Access::Write,
                scale: 100,
                max_raw: MAX_VOLTAGE_RAW,
            },
            LwRegister::SetCurrent => RegisterInfo {
                address: 0x1001,
                name: "Set-I",
                access: Access::Write,
                scale: 100,
                max_raw: MAX_CURRENT_RAW,
            },
            LwRegister::OutputVoltage => RegisterInfo {
                address: 0x1002,
                name: "U",
                access: Access::Read,
                scale: 100,
                max_raw: MAX_VOLTAGE_RAW,
            },
            LwRegister::OutputCurrent => RegisterInfo {
                address: 0x1003,
                name: "I",
                access: Access::Read,
                scale: 100,
                max_raw: MAX_CURRENT_RAW,
            },
            LwRegister::RunStop => RegisterInfo {
                address: 0x1004,
                name: "Run-Stop",
                access: Access::Read,
                scale: 1,
                max_raw: 1,
            },
            LwRegister::RegulationMode => RegisterInfo {
                address: 0x1005,
                name: "CC-CV-OC",
                access: Access::Read,
                scale: 1,
                max_raw: 2,
            },
            LwRegister::SetRunStop => RegisterInfo {
                address: 0x1006,
                name: "Set-Run-Stop",
                access: Access::Write,
                scale: 1,
                max_raw: 1,
            },
            LwRegister::SetSlaveAddress => RegisterInfo {
                address: 0x1008,
                name: "Set-Address",
                access: Access::Write,
                scale: 1,
                max_raw: MAX_SLAVE_ADDRESS as u16,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn info_addresses_match_discriminants() {
        for reg in [
            LwRegister::SetVoltage,
            LwRegister::SetCurrent,
            LwRegister::OutputVoltage,
            LwRegister::OutputCurrent,
            LwRegister::RunStop,
            LwRegister::RegulationMode,
            LwRegister::SetRunStop,
            LwRegister::SetSlaveAddress,
        ] {
            assert_eq!(reg.info().address, reg as u16);
        }
    }

    #[test]
    fn status_block_covers_read_registers() {
        assert_eq!(STATUS_BLOCK_START, 0x1000);
        // SetVoltage..=RegulationMode are contiguous.
        assert_eq!(
            STATUS_BLOCK_START + STATUS_BLOCK_LEN - 1,
            LwRegister::RegulationMode as u16
        );
    }

    #[test]
    fn voltage_and_current_are_fixed_point() {
        assert_eq!(LwRegister::SetVoltage.info().scale, 100);
        assert_eq!(LwRegister::OutputCurrent.info().scale, 100);
        assert_eq!(LwRegister::RunStop.info().scale, 1);
    }
}
