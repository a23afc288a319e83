use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::bytes::Bytes;
use crate::prelude::*;

/// Per-ensemble telemetry: clock, attitude, and environment.
///
/// Heading, pitch, roll, and temperature are in hundredths, pressure in decapascals, as
/// reported by the instrument.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct VariableLeader {
    /// Low 16 bits of the ensemble number. See [VariableLeader::ensemble_number].
    pub ensemble_number_lsb: u16,
    pub rtc_year: u8,
    pub rtc_month: u8,
    pub rtc_day: u8,
    pub rtc_hour: u8,
    pub rtc_minute: u8,
    pub rtc_second: u8,
    pub rtc_hundredths: u8,
    /// Number of times `ensemble_number_lsb` has rolled over.
    pub ensemble_number_msb: u8,
    pub bit_result: u16,
    pub speed_of_sound: u16,
    pub depth_of_transducer: u16,
    pub heading: u16,
    pub pitch: i16,
    pub roll: i16,
    pub salinity: u16,
    pub temperature: i16,
    pub mpt_minutes: u8,
    pub mpt_seconds: u8,
    pub mpt_hundredths: u8,
    pub heading_std_dev: u8,
    pub pitch_std_dev: u8,
    pub roll_std_dev: u8,
    pub adc_channels: [u8; 8],
    pub error_status_word: u32,
    /// Read as signed so near-surface readings just below zero remain small negative
    /// values rather than wrapping to huge positive values.
    pub pressure: i32,
    pub pressure_variance: u32,
    pub y2k_century: u8,
    pub y2k_year: u8,
    pub y2k_month: u8,
    pub y2k_day: u8,
    pub y2k_hour: u8,
    pub y2k_minute: u8,
    pub y2k_second: u8,
    pub y2k_hundredths: u8,
}

impl VariableLeader {
    pub const LEN: usize = 65;

    /// Decode from the bytes starting at the section identifier.
    ///
    /// # Errors
    /// [Error::NotEnoughData] if `dat` is shorter than [VariableLeader::LEN].
    pub fn decode(dat: &[u8]) -> Result<Self> {
        let b = Bytes::new(dat, Self::LEN)?;
        Ok(VariableLeader {
            ensemble_number_lsb: b.u16(2),
            rtc_year: b.u8(4),
            rtc_month: b.u8(5),
            rtc_day: b.u8(6),
            rtc_hour: b.u8(7),
            rtc_minute: b.u8(8),
            rtc_second: b.u8(9),
            rtc_hundredths: b.u8(10),
            ensemble_number_msb: b.u8(11),
            bit_result: b.u16(12),
            speed_of_sound: b.u16(14),
            depth_of_transducer: b.u16(16),
            heading: b.u16(18),
            pitch: b.i16(20),
            roll: b.i16(22),
            salinity: b.u16(24),
            temperature: b.i16(26),
            mpt_minutes: b.u8(28),
            mpt_seconds: b.u8(29),
            mpt_hundredths: b.u8(30),
            heading_std_dev: b.u8(31),
            pitch_std_dev: b.u8(32),
            roll_std_dev: b.u8(33),
            adc_channels: b.array(34),
            error_status_word: b.u32(42),
            pressure: b.i32(48),
            pressure_variance: b.u32(52),
            y2k_century: b.u8(57),
            y2k_year: b.u8(58),
            y2k_month: b.u8(59),
            y2k_day: b.u8(60),
            y2k_hour: b.u8(61),
            y2k_minute: b.u8(62),
            y2k_second: b.u8(63),
            y2k_hundredths: b.u8(64),
        })
    }

    /// Full ensemble number including roll-overs.
    #[must_use]
    pub fn ensemble_number(&self) -> u32 {
        u32::from(self.ensemble_number_lsb) + (u32::from(self.ensemble_number_msb) << 16)
    }

    /// Ensemble time from the Y2K compliant clock, or `None` if the clock fields do not
    /// form a valid date and time.
    #[must_use]
    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        let year = i32::from(self.y2k_century) * 100 + i32::from(self.y2k_year);
        NaiveDate::from_ymd_opt(year, self.y2k_month.into(), self.y2k_day.into())?
            .and_hms_milli_opt(
                self.y2k_hour.into(),
                self.y2k_minute.into(),
                self.y2k_second.into(),
                u32::from(self.y2k_hundredths) * 10,
            )
    }
}
