//! Ensemble section decoding and assembly.
//!
//! Each verified [EnsembleSpan] begins with an offset table listing where each data type,
//! or section, begins relative to the start of the ensemble. The first two bytes of each
//! section identify its type. See [section_offsets].
mod beams;
mod bottom_track;
mod fixed_leader;
mod variable_leader;

pub use beams::*;
pub use bottom_track::*;
pub use fixed_leader::*;
pub use variable_leader::*;

use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, span, trace, Level};

use crate::bytes::read_u16;
use crate::framing::EnsembleSpan;

/// Offset of the number of data types within an ensemble header.
const NUM_DATA_TYPES_OFFSET: usize = 5;
/// Offset of the first data type offset within an ensemble header.
const OFFSETS_OFFSET: usize = 6;

/// Known section types.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SectionType {
    FixedLeader,
    VariableLeader,
    Velocity,
    Correlation,
    EchoIntensity,
    PercentGood,
    BottomTrack,
}

impl SectionType {
    /// Section type for an identifier code, or `None` if the code is not recognized.
    #[must_use]
    pub fn from_code(code: u16) -> Option<Self> {
        Some(match code {
            0x0000 => SectionType::FixedLeader,
            0x0080 => SectionType::VariableLeader,
            0x0100 => SectionType::Velocity,
            0x0200 => SectionType::Correlation,
            0x0300 => SectionType::EchoIntensity,
            0x0400 => SectionType::PercentGood,
            0x0600 => SectionType::BottomTrack,
            _ => return None,
        })
    }

    #[must_use]
    pub fn code(&self) -> u16 {
        match self {
            SectionType::FixedLeader => 0x0000,
            SectionType::VariableLeader => 0x0080,
            SectionType::Velocity => 0x0100,
            SectionType::Correlation => 0x0200,
            SectionType::EchoIntensity => 0x0300,
            SectionType::PercentGood => 0x0400,
            SectionType::BottomTrack => 0x0600,
        }
    }
}

/// A single entry from an ensemble's offset table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionOffset {
    /// Absolute offset of the section within the stream.
    pub offset: usize,
    /// Section identifier code read at `offset`.
    pub code: u16,
}

impl SectionOffset {
    /// The known type for this section, if any.
    #[must_use]
    pub fn section_type(&self) -> Option<SectionType> {
        SectionType::from_code(self.code)
    }

    /// Section bytes from the identifier to the end of `span`'s payload.
    fn bytes<'a>(&self, dat: &'a [u8], span: &EnsembleSpan) -> &'a [u8] {
        dat.get(self.offset..span.end()).unwrap_or_default()
    }
}

/// Read the offset table of the ensemble at `span`.
///
/// Entries whose offset, or section identifier, would fall outside the span are dropped.
/// Unrecognized identifiers are returned; use [SectionOffset::section_type] to filter them.
#[must_use]
pub fn section_offsets(dat: &[u8], span: &EnsembleSpan) -> Vec<SectionOffset> {
    let Some(&num) = dat.get(span.start + NUM_DATA_TYPES_OFFSET) else {
        return Vec::default();
    };
    let mut offsets = Vec::with_capacity(num as usize);
    for idx in 0..num as usize {
        let slot = span.start + OFFSETS_OFFSET + 2 * idx;
        if slot + 2 > span.end() {
            debug!(start = span.start, idx, "offset table runs past ensemble; dropping");
            continue;
        }
        let Some(rel) = read_u16(dat, slot) else {
            continue;
        };
        let offset = span.start + rel as usize;
        if offset + 2 > span.end() {
            debug!(start = span.start, idx, rel, "section offset outside ensemble; dropping");
            continue;
        }
        if let Some(code) = read_u16(dat, offset) {
            offsets.push(SectionOffset { offset, code });
        }
    }
    offsets
}

/// Decode the first decodable fixed leader from `spans`.
#[must_use]
pub fn find_fixed_leader(dat: &[u8], spans: &[EnsembleSpan]) -> Option<FixedLeader> {
    for span in spans {
        for section in section_offsets(dat, span) {
            if section.section_type() != Some(SectionType::FixedLeader) {
                continue;
            }
            match FixedLeader::decode(section.bytes(dat, span)) {
                Ok(fl) => return Some(fl),
                Err(err) => debug!(start = span.start, "failed to decode fixed leader: {err}"),
            }
        }
    }
    None
}

/// A single decoded ensemble.
///
/// The fixed leader is decoded once per stream and shared by all ensembles.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Ensemble {
    pub span: EnsembleSpan,
    pub fixed_leader: Arc<FixedLeader>,
    pub variable_leader: VariableLeader,
    pub velocity: Option<VelocityRecord>,
    pub correlation: Option<BeamArrayRecord>,
    pub echo_intensity: Option<BeamArrayRecord>,
    pub percent_good: Option<BeamArrayRecord>,
    pub bottom_track: Option<BottomTrack>,
}

impl Ensemble {
    /// Decode all sections of the ensemble at `span`.
    ///
    /// Sections that fail to decode are omitted. Only the first section of each type is
    /// used. Returns `None` if there is no decodable variable leader.
    #[must_use]
    pub fn decode(
        dat: &[u8],
        span: &EnsembleSpan,
        fixed_leader: &Arc<FixedLeader>,
    ) -> Option<Self> {
        let tspan = span!(Level::TRACE, "ensemble", start = span.start, len = span.len);
        let _guard = tspan.enter();

        let num_cells = fixed_leader.num_cells as usize;
        let mut variable_leader = None;
        let mut velocity = None;
        let mut correlation = None;
        let mut echo_intensity = None;
        let mut percent_good = None;
        let mut bottom_track = None;

        for section in section_offsets(dat, span) {
            let Some(typ) = section.section_type() else {
                trace!(code = section.code, "skipping unknown section");
                continue;
            };
            let bytes = section.bytes(dat, span);
            let zult = match typ {
                SectionType::FixedLeader => Ok(()),
                SectionType::VariableLeader if variable_leader.is_none() => {
                    VariableLeader::decode(bytes).map(|x| variable_leader = Some(x))
                }
                SectionType::Velocity if velocity.is_none() => {
                    VelocityRecord::decode(bytes, num_cells).map(|x| velocity = Some(x))
                }
                SectionType::Correlation if correlation.is_none() => {
                    BeamArrayRecord::decode(bytes, num_cells, typ).map(|x| correlation = Some(x))
                }
                SectionType::EchoIntensity if echo_intensity.is_none() => {
                    BeamArrayRecord::decode(bytes, num_cells, typ)
                        .map(|x| echo_intensity = Some(x))
                }
                SectionType::PercentGood if percent_good.is_none() => {
                    BeamArrayRecord::decode(bytes, num_cells, typ).map(|x| percent_good = Some(x))
                }
                SectionType::BottomTrack if bottom_track.is_none() => {
                    BottomTrack::decode(bytes).map(|x| bottom_track = Some(x))
                }
                _ => {
                    trace!(?typ, "skipping duplicate section");
                    Ok(())
                }
            };
            if let Err(err) = zult {
                debug!(?typ, offset = section.offset, "failed to decode section: {err}");
            }
        }

        let Some(variable_leader) = variable_leader else {
            debug!("no variable leader; dropping ensemble");
            return None;
        };

        Some(Ensemble {
            span: *span,
            fixed_leader: fixed_leader.clone(),
            variable_leader,
            velocity,
            correlation,
            echo_intensity,
            percent_good,
            bottom_track,
        })
    }

    /// See [VariableLeader::ensemble_number].
    #[must_use]
    pub fn ensemble_number(&self) -> u32 {
        self.variable_leader.ensemble_number()
    }

    /// See [VariableLeader::timestamp].
    #[must_use]
    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        self.variable_leader.timestamp()
    }

    /// Types of the sections decoded for this ensemble, in type order. Always includes the
    /// fixed and variable leaders.
    #[must_use]
    pub fn section_types(&self) -> Vec<SectionType> {
        let mut types = vec![SectionType::FixedLeader, SectionType::VariableLeader];
        if self.velocity.is_some() {
            types.push(SectionType::Velocity);
        }
        if self.correlation.is_some() {
            types.push(SectionType::Correlation);
        }
        if self.echo_intensity.is_some() {
            types.push(SectionType::EchoIntensity);
        }
        if self.percent_good.is_some() {
            types.push(SectionType::PercentGood);
        }
        if self.bottom_track.is_some() {
            types.push(SectionType::BottomTrack);
        }
        types
    }
}
