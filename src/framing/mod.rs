//! Ensemble framing.
//!
//! Workhorse ensembles have no length prefix that can be trusted in isolation: the
//! two byte header marker `0x7f7f` also occurs inside payload data. Ensembles are
//! located by scanning for every marker, verifying each candidate's trailing checksum
//! using a [ChecksumIndex], and finally cross-checking the candidates' declared lengths
//! against the gaps between them. See [locate].
mod checksum;
mod locator;

pub use checksum::*;
pub use locator::*;

use serde::{Deserialize, Serialize};

/// Header identification byte.
pub const HEADER_ID: u8 = 0x7f;
/// Data source identification byte following [HEADER_ID].
pub const DATA_SOURCE_ID: u8 = 0x7f;
/// Number of checksum bytes trailing every ensemble.
pub const CHECKSUM_LEN: usize = 2;
/// Smallest declared length able to hold the header fields up to the data type count.
pub const MIN_ENSEMBLE_LEN: u16 = 6;

/// Location of a single ensemble within a stream.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnsembleSpan {
    /// Offset of the header ID byte.
    pub start: usize,
    /// Number of bytes in the ensemble as declared by the header, not including the
    /// trailing checksum.
    pub len: u16,
    /// True when this span passed all verification.
    pub valid: bool,
}

impl EnsembleSpan {
    /// Offset one past the last payload byte, i.e., the offset of the checksum.
    #[must_use]
    pub fn end(&self) -> usize {
        self.start + self.len as usize
    }

    /// Total bytes occupied in the stream, including checksum.
    #[must_use]
    pub fn footprint(&self) -> usize {
        self.len as usize + CHECKSUM_LEN
    }

    /// Payload bytes for this span, or `None` if `dat` is too short.
    #[must_use]
    pub fn payload<'a>(&self, dat: &'a [u8]) -> Option<&'a [u8]> {
        dat.get(self.start..self.end())
    }
}
