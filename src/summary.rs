use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ensemble::{Ensemble, SectionType};
use crate::framing::{Located, Rejection};

/// Counts describing a single decode.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    /// Stream length in bytes.
    pub bytes: usize,
    /// Number of header markers found.
    pub candidates: usize,
    /// Number of candidates verified as ensembles.
    pub accepted: usize,
    /// Rejected candidates by reason.
    pub rejected: BTreeMap<Rejection, usize>,
    /// Record length all ensembles were filtered to, if the stream lengths were inconsistent.
    pub dominant_len: Option<u16>,
    /// Number of ensembles decoded.
    pub ensembles: usize,
    /// Number of decoded ensembles containing each section type.
    pub sections: BTreeMap<SectionType, usize>,
}

impl Summary {
    #[must_use]
    pub fn from_located(bytes: usize, located: &Located) -> Self {
        Summary {
            bytes,
            candidates: located.candidates,
            accepted: located.spans.len(),
            rejected: located.rejected.clone(),
            dominant_len: located.dominant_len,
            ..Default::default()
        }
    }

    pub fn add(&mut self, ensemble: &Ensemble) {
        self.ensembles += 1;
        for typ in ensemble.section_types() {
            *self.sections.entry(typ).or_default() += 1;
        }
    }

    /// Number of verified spans that did not produce an ensemble.
    #[must_use]
    pub fn dropped(&self) -> usize {
        self.accepted.saturating_sub(self.ensembles)
    }
}
