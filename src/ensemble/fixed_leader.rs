use serde::{Deserialize, Serialize};

use crate::bytes::Bytes;
use crate::prelude::*;

/// System configuration word kept as binary digit strings, most significant bit first,
/// e.g., `"11001010"`.
///
/// The bits are intentionally not decoded into named flags so consumers can continue to
/// index the strings directly.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SystemConfiguration {
    pub lsb: String,
    pub msb: String,
}

impl SystemConfiguration {
    fn new(lsb: u8, msb: u8) -> Self {
        SystemConfiguration {
            lsb: format!("{lsb:08b}"),
            msb: format!("{msb:08b}"),
        }
    }

    /// Raw 16-bit configuration word, or `None` if either string is not 8 binary digits.
    #[must_use]
    pub fn bits(&self) -> Option<u16> {
        if self.lsb.len() != 8 || self.msb.len() != 8 {
            return None;
        }
        let lsb = u8::from_str_radix(&self.lsb, 2).ok()?;
        let msb = u8::from_str_radix(&self.msb, 2).ok()?;
        Some(u16::from_le_bytes([lsb, msb]))
    }
}

/// Static instrument configuration.
///
/// Lengths are in centimeters, angles in hundredths of a degree, and velocities in mm/s as
/// reported by the instrument; no unit conversion is applied.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FixedLeader {
    pub cpu_firmware_version: u8,
    pub cpu_firmware_revision: u8,
    pub system_configuration: SystemConfiguration,
    pub real_sim_flag: u8,
    pub lag_length: u8,
    pub num_beams: u8,
    pub num_cells: u8,
    pub pings_per_ensemble: u16,
    pub depth_cell_length: u16,
    pub blank_after_transmit: u16,
    pub profiling_mode: u8,
    pub low_corr_threshold: u8,
    pub num_code_reps: u8,
    pub percent_good_minimum: u8,
    pub error_velocity_maximum: u16,
    pub tpp_minutes: u8,
    pub tpp_seconds: u8,
    pub tpp_hundredths: u8,
    pub coordinate_transform: u8,
    pub heading_alignment: i16,
    pub heading_bias: i16,
    pub sensor_source: u8,
    pub sensors_available: u8,
    pub bin1_distance: u16,
    pub xmit_pulse_length: u16,
    pub ref_layer_start_cell: u8,
    pub ref_layer_end_cell: u8,
    pub false_target_threshold: u8,
    pub transmit_lag_distance: u16,
    pub cpu_board_serial_number: u64,
    pub system_bandwidth: u16,
    pub system_power: u8,
    /// Only reported by firmware 16.30 and later.
    pub serial_number: Option<u32>,
    /// Only reported by firmware 16.30 and later.
    pub beam_angle: Option<u8>,
}

impl FixedLeader {
    /// Bytes required for the fields present in all firmware versions.
    pub const MIN_LEN: usize = 54;
    /// Bytes required when the firmware reports serial number and beam angle.
    pub const LEN: usize = 59;
    /// First firmware (version, revision) reporting serial number and beam angle.
    pub const SERIAL_FIRMWARE: (u8, u8) = (16, 30);

    /// Decode from the bytes starting at the section identifier.
    ///
    /// # Errors
    /// [Error::NotEnoughData] if `dat` is too short for the fields the firmware reports.
    pub fn decode(dat: &[u8]) -> Result<Self> {
        let b = Bytes::new(dat, Self::MIN_LEN)?;
        let firmware = (b.u8(2), b.u8(3));
        let has_serial = firmware >= Self::SERIAL_FIRMWARE;
        if has_serial && !b.has(Self::LEN) {
            return Err(Error::NotEnoughData {
                actual: dat.len(),
                minimum: Self::LEN,
            });
        }

        Ok(FixedLeader {
            cpu_firmware_version: firmware.0,
            cpu_firmware_revision: firmware.1,
            system_configuration: SystemConfiguration::new(b.u8(4), b.u8(5)),
            real_sim_flag: b.u8(6),
            lag_length: b.u8(7),
            num_beams: b.u8(8),
            num_cells: b.u8(9),
            pings_per_ensemble: b.u16(10),
            depth_cell_length: b.u16(12),
            blank_after_transmit: b.u16(14),
            profiling_mode: b.u8(16),
            low_corr_threshold: b.u8(17),
            num_code_reps: b.u8(18),
            percent_good_minimum: b.u8(19),
            error_velocity_maximum: b.u16(20),
            tpp_minutes: b.u8(22),
            tpp_seconds: b.u8(23),
            tpp_hundredths: b.u8(24),
            coordinate_transform: b.u8(25),
            heading_alignment: b.i16(26),
            heading_bias: b.i16(28),
            sensor_source: b.u8(30),
            sensors_available: b.u8(31),
            bin1_distance: b.u16(32),
            xmit_pulse_length: b.u16(34),
            ref_layer_start_cell: b.u8(36),
            ref_layer_end_cell: b.u8(37),
            false_target_threshold: b.u8(38),
            transmit_lag_distance: b.u16(40),
            cpu_board_serial_number: b.u64(42),
            system_bandwidth: b.u16(50),
            system_power: b.u8(52),
            serial_number: has_serial.then(|| b.u32(54)),
            beam_angle: has_serial.then(|| b.u8(58)),
        })
    }

    /// Firmware as (version, revision).
    #[must_use]
    pub fn firmware(&self) -> (u8, u8) {
        (self.cpu_firmware_version, self.cpu_firmware_revision)
    }
}
