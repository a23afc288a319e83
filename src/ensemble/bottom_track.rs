use serde::{Deserialize, Serialize};

use super::beams::velocity_or_missing;
use crate::bytes::Bytes;
use crate::prelude::*;

/// Bottom track data: range and velocity relative to the seabed for each beam plus the
/// water reference layer.
///
/// Ranges are in centimeters, velocities in mm/s. Bad velocities are `None`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BottomTrack {
    pub pings_per_ensemble: u16,
    pub delay_before_reacquire: u16,
    pub corr_mag_minimum: u8,
    pub eval_amp_minimum: u8,
    pub percent_good_minimum: u8,
    pub mode: u8,
    pub error_velocity_maximum: u16,
    /// Low 16 bits of the range to bottom. See [BottomTrack::ranges].
    pub range: [u16; 4],
    pub velocity: [Option<i16>; 4],
    pub correlation: [u8; 4],
    pub eval_amp: [u8; 4],
    pub percent_good: [u8; 4],
    pub ref_layer_minimum: u16,
    pub ref_layer_near: u16,
    pub ref_layer_far: u16,
    pub ref_velocity: [Option<i16>; 4],
    pub ref_correlation: [u8; 4],
    pub ref_intensity: [u8; 4],
    pub ref_percent_good: [u8; 4],
    pub max_depth: u16,
    pub rssi_amp: [u8; 4],
    pub gain: u8,
    /// High byte of the range to bottom.
    pub range_msb: [u8; 4],
}

impl BottomTrack {
    pub const LEN: usize = 81;

    /// Decode from the bytes starting at the section identifier.
    ///
    /// # Errors
    /// [Error::NotEnoughData] if `dat` is shorter than [BottomTrack::LEN].
    pub fn decode(dat: &[u8]) -> Result<Self> {
        let b = Bytes::new(dat, Self::LEN)?;
        Ok(BottomTrack {
            pings_per_ensemble: b.u16(2),
            delay_before_reacquire: b.u16(4),
            corr_mag_minimum: b.u8(6),
            eval_amp_minimum: b.u8(7),
            percent_good_minimum: b.u8(8),
            mode: b.u8(9),
            error_velocity_maximum: b.u16(10),
            range: b.u16s(16),
            velocity: b.i16s::<4>(24).map(velocity_or_missing),
            correlation: b.array(32),
            eval_amp: b.array(36),
            percent_good: b.array(40),
            ref_layer_minimum: b.u16(44),
            ref_layer_near: b.u16(46),
            ref_layer_far: b.u16(48),
            ref_velocity: b.i16s::<4>(50).map(velocity_or_missing),
            ref_correlation: b.array(58),
            ref_intensity: b.array(62),
            ref_percent_good: b.array(66),
            max_depth: b.u16(70),
            rssi_amp: b.array(72),
            gain: b.u8(76),
            range_msb: b.array(77),
        })
    }

    /// Full 24-bit range to bottom for each beam.
    #[must_use]
    pub fn ranges(&self) -> [u32; 4] {
        std::array::from_fn(|i| u32::from(self.range[i]) | (u32::from(self.range_msb[i]) << 16))
    }
}
