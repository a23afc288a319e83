use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

use super::SectionType;
use crate::prelude::*;

/// Number of beams in every profile section.
pub const NUM_BEAMS: usize = 4;
/// Velocity value the instrument uses to flag a bad or missing measurement.
pub const BAD_VELOCITY: i16 = i16::MIN;
/// Bytes of section identifier preceding profile data.
const ID_LEN: usize = 2;

/// Normalize the instrument's bad velocity value to `None`.
#[must_use]
pub fn velocity_or_missing(raw: i16) -> Option<i16> {
    (raw != BAD_VELOCITY).then_some(raw)
}

/// Split beam-interleaved `values`, i.e., cell 0 beam 1..4, cell 1 beam 1..4, etc., into
/// one vector per beam.
fn deinterleave<T: Copy>(values: &[T], num_cells: usize) -> Result<[Vec<T>; NUM_BEAMS]> {
    let view = ArrayView2::from_shape((num_cells, NUM_BEAMS), values).map_err(|_| {
        Error::NotEnoughData {
            actual: values.len(),
            minimum: num_cells * NUM_BEAMS,
        }
    })?;
    Ok(std::array::from_fn(|beam| view.column(beam).to_vec()))
}

/// Profile section bytes after the identifier, or [Error::NotEnoughData].
fn profile(dat: &[u8], num_cells: usize, elem_size: usize) -> Result<&[u8]> {
    let minimum = ID_LEN + num_cells * NUM_BEAMS * elem_size;
    dat.get(ID_LEN..minimum).ok_or(Error::NotEnoughData {
        actual: dat.len(),
        minimum,
    })
}

/// Per-cell water velocities for each beam, in mm/s. Bad values are `None`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct VelocityRecord {
    pub beam1: Vec<Option<i16>>,
    pub beam2: Vec<Option<i16>>,
    pub beam3: Vec<Option<i16>>,
    pub beam4: Vec<Option<i16>>,
}

impl VelocityRecord {
    /// Decode `num_cells` cells from the bytes starting at the section identifier.
    ///
    /// # Errors
    /// [Error::NotEnoughData] if `dat` does not contain `num_cells` cells for all beams.
    pub fn decode(dat: &[u8], num_cells: usize) -> Result<Self> {
        let values: Vec<Option<i16>> = profile(dat, num_cells, 2)?
            .chunks_exact(2)
            .map(|x| velocity_or_missing(i16::from_le_bytes([x[0], x[1]])))
            .collect();
        let [beam1, beam2, beam3, beam4] = deinterleave(&values, num_cells)?;
        Ok(VelocityRecord {
            beam1,
            beam2,
            beam3,
            beam4,
        })
    }

    #[must_use]
    pub fn beams(&self) -> [&[Option<i16>]; NUM_BEAMS] {
        [&self.beam1, &self.beam2, &self.beam3, &self.beam4]
    }
}

/// Per-cell single byte values for each beam. Used for correlation magnitude, echo
/// intensity, and percent good, which share a layout and differ only by `kind`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BeamArrayRecord {
    pub kind: SectionType,
    pub beam1: Vec<u8>,
    pub beam2: Vec<u8>,
    pub beam3: Vec<u8>,
    pub beam4: Vec<u8>,
}

impl BeamArrayRecord {
    /// Decode `num_cells` cells from the bytes starting at the section identifier.
    ///
    /// # Errors
    /// [Error::NotEnoughData] if `dat` does not contain `num_cells` cells for all beams.
    pub fn decode(dat: &[u8], num_cells: usize, kind: SectionType) -> Result<Self> {
        let values = profile(dat, num_cells, 1)?;
        let [beam1, beam2, beam3, beam4] = deinterleave(values, num_cells)?;
        Ok(BeamArrayRecord {
            kind,
            beam1,
            beam2,
            beam3,
            beam4,
        })
    }

    #[must_use]
    pub fn beams(&self) -> [&[u8]; NUM_BEAMS] {
        [&self.beam1, &self.beam2, &self.beam3, &self.beam4]
    }
}
