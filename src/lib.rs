#![doc = include_str!("../README.md")]

mod bytes;
mod error;

pub mod decoder;
pub mod ensemble;
pub mod framing;
pub mod summary;

pub use decoder::{decode, decode_file, Decoded, Decoder, EnsembleIter};
pub use ensemble::{Ensemble, FixedLeader, SectionType, VariableLeader};
pub use error::{Error, Result};
pub use summary::Summary;

pub(crate) mod prelude {
    pub use crate::error::{Error, Result};
}
