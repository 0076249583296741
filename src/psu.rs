//! Device client for the Longwei LW-3010EC bench supply.
//!
//! Wraps an [`RtuSession`] with the register map, fixed-point scaling and
//! set-point validation. Every method is one device interaction (or, for
//! [`LwPsu::apply_set_points`], a short fixed sequence); policy such as
//! retries and scheduling lives in the dispatcher, not here.

use crate::error::{Error, Result};
use crate::registers::{
    LwRegister, MAX_CURRENT_RAW, MAX_SLAVE_ADDRESS, MAX_VOLTAGE_RAW, STATUS_BLOCK_LEN,
    STATUS_BLOCK_START,
};
use crate::scaling;
use crate::session::RtuSession;
use crate::types::{OutputState, StatusSnapshot};

pub struct LwPsu<S: embedded_io::Read + embedded_io::Write, const L: usize = 128> {
    session: RtuSession<S, L>,
}

impl<S: embedded_io::Read + embedded_io::Write, const L: usize> LwPsu<S, L> {
    pub fn new(interface: S, unit_id: u8) -> Self {
        Self {
            session: RtuSession::new(interface, unit_id),
        }
    }

    pub fn unit_id(&self) -> u8 {
        self.session.unit_id()
    }

    #[cfg(test)]
    pub(crate) fn interface(&self) -> &S {
        &self.session.interface
    }

    /// Read the six status registers as one block and decode them into a
    /// self-consistent snapshot.
    pub fn read_status(&mut self) -> Result<StatusSnapshot, S::Error> {
        let block = self
            .session
            .read_holdings(STATUS_BLOCK_START, STATUS_BLOCK_LEN)?;
        StatusSnapshot::from_block(&block).ok_or(Error::InvalidResponse)
    }

    /// Set the voltage limit from a raw centivolt value.
    ///
    /// Accepts `0 < raw < 3000` exclusive on both ends: zero and the rail
    /// maximum are rejected before anything is sent to the device.
    pub fn set_voltage_raw(&mut self, raw: u16) -> Result<(), S::Error> {
        validate_set_point(raw, MAX_VOLTAGE_RAW)?;
        self.session.write_holding(LwRegister::SetVoltage.into(), raw)
    }

    /// Set the current limit from a raw centiamp value.
    ///
    /// Accepts `0 < raw < 1050` exclusive on both ends.
    pub fn set_current_raw(&mut self, raw: u16) -> Result<(), S::Error> {
        validate_set_point(raw, MAX_CURRENT_RAW)?;
        self.session.write_holding(LwRegister::SetCurrent.into(), raw)
    }

    /// Set the voltage limit in millivolts. Sub-centivolt precision is
    /// truncated to the device resolution.
    pub fn set_voltage_millivolts(&mut self, millivolts: u32) -> Result<(), S::Error> {
        self.set_voltage_raw(scaling::millivolts_to_raw(millivolts))
    }

    /// Set the current limit in milliamps.
    pub fn set_current_milliamps(&mut self, milliamps: u32) -> Result<(), S::Error> {
        self.set_current_raw(scaling::milliamps_to_raw(milliamps))
    }

    /// Write both set-points in a single bulk transaction.
    ///
    /// Both values are validated before any bytes go out, so a rejected
    /// pair leaves the device untouched.
    pub fn write_set_points(&mut self, voltage_raw: u16, current_raw: u16) -> Result<(), S::Error> {
        validate_set_point(voltage_raw, MAX_VOLTAGE_RAW)?;
        validate_set_point(current_raw, MAX_CURRENT_RAW)?;
        self.session
            .write_holdings(LwRegister::SetVoltage.into(), &[voltage_raw, current_raw])
    }

    /// Switch the output relay.
    pub fn set_output(&mut self, state: OutputState) -> Result<(), S::Error> {
        self.session
            .write_holding(LwRegister::SetRunStop.into(), state.into())
    }

    /// Read the relay state and write back its inverse.
    pub fn toggle_output(&mut self) -> Result<OutputState, S::Error> {
        let status = self.read_status()?;
        let next = OutputState::from(!status.output_on);
        self.set_output(next)?;
        Ok(next)
    }

    /// Apply a new set-point pair, optionally forcing the output off for
    /// the duration of the write and back on afterwards.
    ///
    /// The supply slews to a new voltage with whatever is connected; going
    /// through an off state keeps the load from seeing the transition.
    /// Validation happens before the disable step, so a rejected pair
    /// never drops the output.
    pub fn apply_set_points(
        &mut self,
        voltage_raw: u16,
        current_raw: u16,
        disable_before: bool,
        enable_after: bool,
    ) -> Result<(), S::Error> {
        validate_set_point(voltage_raw, MAX_VOLTAGE_RAW)?;
        validate_set_point(current_raw, MAX_CURRENT_RAW)?;

        if disable_before {
            self.set_output(OutputState::Off)?;
        }
        self.session
            .write_holdings(LwRegister::SetVoltage.into(), &[voltage_raw, current_raw])?;
        if enable_after {
            self.set_output(OutputState::On)?;
        }
        Ok(())
    }

    /// Reassign the slave address (1-247). The device keeps answering on
    /// the old address until power cycled.
    pub fn set_slave_address(&mut self, address: u8) -> Result<(), S::Error> {
        if address == 0 || address > MAX_SLAVE_ADDRESS {
            return Err(Error::OutOfRange {
                requested: address as u16,
                limit: MAX_SLAVE_ADDRESS as u16,
            });
        }
        self.session
            .write_holding(LwRegister::SetSlaveAddress.into(), address as u16)
    }
}

fn validate_set_point<I: embedded_io::Error>(raw: u16, limit: u16) -> Result<(), I> {
    if raw == 0 || raw >= limit {
        return Err(Error::OutOfRange {
            requested: raw,
            limit,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_serial::MockSupply;

    fn psu(mock: MockSupply) -> LwPsu<MockSupply, 128> {
        LwPsu::new(mock, 0x01)
    }

    #[test]
    fn read_status_decodes_block() {
        let mut mock = MockSupply::new();
        mock.queue_holdings(&[1200, 300, 1199, 301, 1, 1]);

        let snap = psu(mock).read_status().unwrap();
        assert_eq!(snap.set_voltage_raw, 1200);
        assert!(snap.output_on);
    }

    #[test]
    fn over_limit_voltage_rejected_without_traffic() {
        let mut psu = psu(MockSupply::new());

        let err = psu.set_voltage_raw(3200).unwrap_err();
        assert!(matches!(
            err,
            Error::OutOfRange {
                requested: 3200,
                limit: 3000
            }
        ));
        assert!(psu.interface().requests().is_empty());
    }

    #[test]
    fn boundary_set_points_rejected() {
        let mut psu = psu(MockSupply::new());
        assert!(psu.set_voltage_raw(0).is_err());
        assert!(psu.set_voltage_raw(3000).is_err());
        assert!(psu.set_current_raw(1050).is_err());
        assert!(psu.interface().requests().is_empty());
    }

    #[test]
    fn in_range_set_points_accepted() {
        let mut psu = psu(MockSupply::new());
        psu.set_voltage_raw(2999).unwrap();
        psu.set_current_raw(1).unwrap();
        assert_eq!(psu.interface().requests().len(), 2);
    }

    #[test]
    fn scaled_setters_convert_to_raw() {
        let mut psu = psu(MockSupply::new());
        psu.set_voltage_millivolts(12000).unwrap();
        psu.set_current_milliamps(3010).unwrap();

        let requests = psu.interface().requests();
        // 12000 mV => raw 1200 (0x04B0), 3010 mA => raw 301 (0x012D).
        assert_eq!(&requests[0][2..6], &[0x10, 0x00, 0x04, 0xB0]);
        assert_eq!(&requests[1][2..6], &[0x10, 0x01, 0x01, 0x2D]);
    }

    #[test]
    fn bulk_write_rejects_pair_atomically() {
        let mut psu = psu(MockSupply::new());
        // In-range voltage, out-of-range current: nothing hits the wire.
        assert!(psu.write_set_points(1200, 2000).is_err());
        assert!(psu.interface().requests().is_empty());

        psu.write_set_points(1200, 300).unwrap();
        let requests = psu.interface().requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0][1], 0x10); // write multiple registers
    }

    #[test]
    fn apply_cycles_output_around_write() {
        let mut psu = psu(MockSupply::new());
        psu.apply_set_points(1200, 300, true, true).unwrap();

        // Output off, bulk set-point write, output on.
        assert_eq!(psu.interface().request_functions(), vec![0x06, 0x10, 0x06]);
        let off = &psu.interface().requests()[0];
        assert_eq!(&off[2..6], &[0x10, 0x06, 0x00, 0x00]);
        let on = &psu.interface().requests()[2];
        assert_eq!(&on[2..6], &[0x10, 0x06, 0x00, 0x01]);
    }

    #[test]
    fn apply_without_relay_cycling() {
        let mut psu = psu(MockSupply::new());
        psu.apply_set_points(1200, 300, false, false).unwrap();
        assert_eq!(psu.interface().request_functions(), vec![0x10]);
    }

    #[test]
    fn apply_validates_before_touching_relay() {
        let mut psu = psu(MockSupply::new());
        assert!(psu.apply_set_points(1200, 1050, true, true).is_err());
        assert!(psu.interface().requests().is_empty());
    }

    #[test]
    fn toggle_inverts_relay() {
        let mut mock = MockSupply::new();
        mock.queue_holdings(&[500, 100, 499, 99, 1, 1]);

        let mut psu = psu(mock);
        assert_eq!(psu.toggle_output().unwrap(), OutputState::Off);
        let off = &psu.interface().requests()[1];
        assert_eq!(&off[2..6], &[0x10, 0x06, 0x00, 0x00]);
    }

    #[test]
    fn slave_address_bounds() {
        let mut psu = psu(MockSupply::new());
        assert!(psu.set_slave_address(0).is_err());
        assert!(psu.set_slave_address(248).is_err());
        psu.set_slave_address(2).unwrap();
        let frame = &psu.interface().requests()[0];
        assert_eq!(&frame[2..6], &[0x10, 0x08, 0x00, 0x02]);
    }
}
