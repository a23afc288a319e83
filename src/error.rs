#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("Not enough bytes")]
    NotEnoughData { actual: usize, minimum: usize },
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Candidates disagree on record length and no single length dominates.
    #[error("ambiguous ensemble record length; candidates (length, count): {lengths:?}")]
    AmbiguousRecordLength { lengths: Vec<(u16, usize)> },
    #[error("no valid ensembles found")]
    NoEnsemblesFound,
    #[error("no accepted ensemble contains a fixed leader")]
    NoFixedLeader,
    #[error("stream length {len} exceeds maximum of {max}")]
    StreamTooLarge { len: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
