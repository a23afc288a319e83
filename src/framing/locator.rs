use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use super::{ChecksumIndex, EnsembleSpan, DATA_SOURCE_ID, HEADER_ID, MIN_ENSEMBLE_LEN};
use crate::bytes::read_u16;
use crate::prelude::*;

/// Reason an ensemble candidate was not accepted.
///
/// Rejections are expected in normal streams and are never surfaced as errors.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rejection {
    /// Declared footprint runs past the end of the stream.
    Truncated,
    /// Declared length cannot hold an ensemble header.
    TooShort,
    /// Computed checksum does not match the stored checksum.
    ChecksumMismatch,
    /// Declared length disagrees with the dominant record length.
    InconsistentLength,
    /// Starts within the footprint of an already accepted ensemble.
    Overlapping,
}

/// Result of locating ensembles within a stream.
#[derive(Debug, Clone, Default)]
pub struct Located {
    /// Verified spans in stream order. Spans are strictly increasing and do not overlap.
    pub spans: Vec<EnsembleSpan>,
    /// Total number of header markers found.
    pub candidates: usize,
    /// Number of rejected candidates per reason.
    pub rejected: BTreeMap<Rejection, usize>,
    /// The dominant record length, if the fallback to a single length was required.
    pub dominant_len: Option<u16>,
}

impl Located {
    fn reject(&mut self, offset: usize, len: Option<u16>, reason: Rejection) {
        debug!(offset, ?len, ?reason, "rejected ensemble candidate");
        *self.rejected.entry(reason).or_default() += 1;
    }

    /// Total number of rejected candidates.
    #[must_use]
    pub fn num_rejected(&self) -> usize {
        self.rejected.values().sum()
    }

    /// True when some, but fewer than half, of the candidates were rejected.
    #[must_use]
    pub fn rejected_minority(&self) -> bool {
        let rejected = self.num_rejected();
        rejected > 0 && rejected * 2 < self.candidates
    }
}

/// Iterate the offset of every header marker, i.e., `0x7f7f`, in `dat`.
pub fn find_candidates(dat: &[u8]) -> impl Iterator<Item = usize> + '_ {
    dat.windows(2)
        .enumerate()
        .filter(|(_, w)| w[0] == HEADER_ID && w[1] == DATA_SOURCE_ID)
        .map(|(i, _)| i)
}

/// Check a single candidate at `start`, returning its span if the declared footprint fits
/// and its checksum is correct.
///
/// # Errors
/// The [Rejection] reason for an invalid candidate.
pub fn verify_candidate(
    dat: &[u8],
    index: &ChecksumIndex,
    start: usize,
) -> std::result::Result<EnsembleSpan, Rejection> {
    let len = read_u16(dat, start + 2).ok_or(Rejection::Truncated)?;
    if len < MIN_ENSEMBLE_LEN {
        return Err(Rejection::TooShort);
    }
    let span = EnsembleSpan {
        start,
        len,
        valid: false,
    };
    if span.start + span.footprint() > dat.len() {
        return Err(Rejection::Truncated);
    }
    let computed = index
        .checksum(start, len as usize)
        .ok_or(Rejection::Truncated)?;
    let stored = read_u16(dat, span.end()).ok_or(Rejection::Truncated)?;
    if computed != stored {
        trace!(start, computed, stored, "checksum mismatch");
        return Err(Rejection::ChecksumMismatch);
    }
    Ok(EnsembleSpan {
        valid: true,
        ..span
    })
}

/// True if all spans declare the same length and each span's footprint ends exactly where
/// the next span begins.
fn is_self_consistent(spans: &[EnsembleSpan]) -> bool {
    let Some(first) = spans.first() else {
        return true;
    };
    spans.iter().all(|s| s.len == first.len)
        && spans
            .windows(2)
            .all(|w| w[1].start - w[0].start == w[0].footprint())
}

/// Most common declared length, or an error if there is a tie for most common.
fn dominant_len(spans: &[EnsembleSpan]) -> Result<u16> {
    let mut counts: HashMap<u16, usize> = HashMap::default();
    for span in spans {
        *counts.entry(span.len).or_default() += 1;
    }
    let mut lengths: Vec<(u16, usize)> = counts.into_iter().collect();
    lengths.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    match lengths.as_slice() {
        [] => Err(Error::NoEnsemblesFound),
        [(len, _)] => Ok(*len),
        [(len, first), (_, second), ..] if first > second => Ok(*len),
        _ => Err(Error::AmbiguousRecordLength { lengths }),
    }
}

/// Locate all verified ensembles in `dat`.
///
/// Every `0x7f7f` marker is treated as a candidate ensemble start. Candidates whose declared
/// footprint runs past the end of `dat`, or whose checksum does not match, are dropped.
/// The survivors are then checked for self-consistency: all must declare the same length and
/// the gap between consecutive starts must equal the declared length plus the checksum. If
/// any length or gap disagrees, only candidates with the dominant declared length are kept, which removes checksum-valid markers that
/// happen to occur within payload data. Finally, any candidate overlapping an earlier accepted
/// span is dropped.
///
/// A candidate inside a payload that coincidentally has the dominant length and a valid
/// checksum cannot be distinguished from a real ensemble by its length, but it is still
/// removed if it overlaps an earlier span.
///
/// # Errors
/// [Error::AmbiguousRecordLength] if candidates disagree and no single length dominates,
/// and [Error::NoEnsemblesFound] if no candidates survive.
pub fn locate(dat: &[u8], index: &ChecksumIndex) -> Result<Located> {
    let mut located = Located::default();

    let mut spans: Vec<EnsembleSpan> = Vec::default();
    for start in find_candidates(dat) {
        located.candidates += 1;
        match verify_candidate(dat, index, start) {
            Ok(span) => spans.push(span),
            Err(reason) => located.reject(start, read_u16(dat, start + 2), reason),
        }
    }

    if spans.is_empty() {
        return Err(Error::NoEnsemblesFound);
    }

    if !is_self_consistent(&spans) {
        let len = dominant_len(&spans)?;
        located.dominant_len = Some(len);
        let (keep, drop): (Vec<_>, Vec<_>) = spans.into_iter().partition(|s| s.len == len);
        if !drop.is_empty() {
            warn!(
                dominant_len = len,
                dropped = drop.len(),
                "ensemble lengths are inconsistent; keeping only the dominant length"
            );
        }
        for span in drop {
            located.reject(span.start, Some(span.len), Rejection::InconsistentLength);
        }
        spans = keep;
    }

    let mut next_free = 0usize;
    for span in spans {
        if span.start < next_free {
            located.reject(span.start, Some(span.len), Rejection::Overlapping);
            continue;
        }
        next_free = span.start + span.footprint();
        located.spans.push(span);
    }

    if located.spans.is_empty() {
        return Err(Error::NoEnsemblesFound);
    }

    debug!(
        candidates = located.candidates,
        accepted = located.spans.len(),
        rejected = located.num_rejected(),
        "located ensembles"
    );

    Ok(located)
}
