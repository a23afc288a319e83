use std::{
    path::Path,
    sync::Arc,
    thread::{self, JoinHandle},
};

use crossbeam::channel::{bounded, Receiver};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use typed_builder::TypedBuilder;

use crate::ensemble::{find_fixed_leader, Ensemble, FixedLeader};
use crate::framing::{locate, ChecksumIndex, Located};
use crate::prelude::*;
use crate::summary::Summary;

/// Decodes Workhorse binary ensemble streams held in memory.
///
/// # Examples
/// Decode using defaults, i.e., a fully materialized checksum index and parallel section
/// decoding.
/// ```no_run
/// use workhorse::Decoder;
///
/// let dat = std::fs::read("deployment.000").unwrap();
/// let decoded = Decoder::default().decode(&dat).unwrap();
/// for ensemble in &decoded.ensembles {
///     println!("{} {:?}", ensemble.ensemble_number(), ensemble.timestamp());
/// }
/// ```
/// Bound memory used by the checksum index and refuse overly large streams.
/// ```no_run
/// use workhorse::Decoder;
///
/// let dat = std::fs::read("deployment.000").unwrap();
/// let decoder = Decoder::builder()
///     .memory_budget(64 * 1024 * 1024)
///     .max_stream_len(1 << 30)
///     .num_threads(4)
///     .build();
/// let decoded = decoder.decode(&dat).unwrap();
/// ```
#[derive(TypedBuilder, Debug, Clone, PartialEq, Eq)]
pub struct Decoder {
    /// Bytes available for the checksum index. If `None`, or large enough, the full
    /// prefix sum is kept; otherwise a chunked index is used. See [ChecksumIndex].
    #[builder(default, setter(strip_option))]
    memory_budget: Option<usize>,
    /// Number of threads used to decode ensembles. 0 lets rayon decide.
    #[builder(default)]
    num_threads: usize,
    /// Decode ensembles in parallel. Results are the same either way.
    #[builder(default = true)]
    parallel: bool,
    /// Streams longer than this are refused with [Error::StreamTooLarge].
    #[builder(default, setter(strip_option))]
    max_stream_len: Option<usize>,
}

impl Default for Decoder {
    fn default() -> Self {
        Decoder::builder().build()
    }
}

/// Result of decoding a stream.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Decoded {
    /// The single fixed leader shared by all ensembles.
    pub fixed_leader: Arc<FixedLeader>,
    /// Ensembles in stream order.
    pub ensembles: Vec<Ensemble>,
    pub summary: Summary,
}

impl Decoder {
    /// Number of decoded ensembles to buffer ahead of the consumer of an [EnsembleIter].
    const DEFAULT_BUFFER_SIZE: usize = 1024;

    fn check_len(&self, len: usize) -> Result<()> {
        match self.max_stream_len {
            Some(max) if len > max => Err(Error::StreamTooLarge { len, max }),
            _ => Ok(()),
        }
    }

    fn pool(&self) -> Option<rayon::ThreadPool> {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(self.num_threads)
            .build()
        {
            Ok(pool) => Some(pool),
            Err(err) => {
                warn!("failed to construct decode threadpool, decoding sequentially: {err}");
                None
            }
        }
    }

    /// Locate ensembles and resolve the fixed leader.
    fn prepare(&self, dat: &[u8]) -> Result<(Located, Arc<FixedLeader>)> {
        self.check_len(dat.len())?;

        let index = ChecksumIndex::new(dat, self.memory_budget);
        debug!(
            bytes = dat.len(),
            stride = index.stride(),
            memory = index.memory(),
            "built checksum index"
        );
        let located = locate(dat, &index)?;
        let rejected = located.num_rejected();
        if located.rejected_minority() {
            warn!(
                candidates = located.candidates,
                rejected,
                accepted = located.spans.len(),
                "some ensemble candidates were rejected"
            );
        } else {
            debug!(
                candidates = located.candidates,
                rejected,
                accepted = located.spans.len(),
                "ensemble candidates checked"
            );
        }

        let fixed_leader = find_fixed_leader(dat, &located.spans).ok_or(Error::NoFixedLeader)?;
        debug!(
            firmware = ?fixed_leader.firmware(),
            cells = fixed_leader.num_cells,
            beams = fixed_leader.num_beams,
            "decoded fixed leader"
        );
        Ok((located, Arc::new(fixed_leader)))
    }

    /// Decode all ensembles in `dat`.
    ///
    /// # Errors
    /// [Error::StreamTooLarge] if `dat` exceeds the configured maximum,
    /// [Error::NoEnsemblesFound] if no candidate ensemble is verified,
    /// [Error::AmbiguousRecordLength] if no record length dominates, and
    /// [Error::NoFixedLeader] if no verified ensemble has a decodable fixed leader.
    pub fn decode(&self, dat: &[u8]) -> Result<Decoded> {
        let (located, fixed_leader) = self.prepare(dat)?;
        let mut summary = Summary::from_located(dat.len(), &located);

        let pool = if self.parallel { self.pool() } else { None };
        let ensembles: Vec<Ensemble> = match pool {
            Some(pool) => pool.install(|| {
                located
                    .spans
                    .par_iter()
                    .filter_map(|span| Ensemble::decode(dat, span, &fixed_leader))
                    .collect()
            }),
            None => located
                .spans
                .iter()
                .filter_map(|span| Ensemble::decode(dat, span, &fixed_leader))
                .collect(),
        };

        for ensemble in &ensembles {
            summary.add(ensemble);
        }
        debug!(
            ensembles = summary.ensembles,
            dropped = summary.dropped(),
            "decoded ensembles"
        );

        Ok(Decoded {
            fixed_leader,
            ensembles,
            summary,
        })
    }

    /// Locate ensembles in `dat` and return an iterator that decodes them in the background.
    ///
    /// Locating is done before returning so stream-level errors are reported immediately.
    /// Ensembles are decoded on a thread pool and produced in stream order.
    ///
    /// # Errors
    /// The same as [Decoder::decode].
    ///
    /// # Panics
    /// If the background thread could not be started.
    pub fn decode_iter(self, dat: Arc<[u8]>) -> Result<EnsembleIter> {
        let (located, fixed_leader) = self.prepare(&dat)?;
        let summary = Summary::from_located(dat.len(), &located);
        let (jobs_tx, jobs_rx) = bounded(Self::DEFAULT_BUFFER_SIZE);

        let shared = fixed_leader.clone();
        let handle = thread::Builder::new()
            .name("ensemble_decoder".into())
            .spawn(move || {
                let pool = if self.parallel { self.pool() } else { None };
                for span in located.spans {
                    let (future_tx, future_rx) = bounded(1);
                    let dat = dat.clone();
                    let fixed_leader = shared.clone();
                    let job = move || {
                        if future_tx
                            .send(Ensemble::decode(&dat, &span, &fixed_leader))
                            .is_err()
                        {
                            debug!(start = span.start, "failed to send ensemble");
                        }
                    };
                    match pool {
                        // spawn_fifo makes sure the ensemble order is maintained
                        Some(ref pool) => pool.spawn_fifo(job),
                        None => job(),
                    }
                    if let Err(err) = jobs_tx.send(future_rx) {
                        debug!("failed to send ensemble future: {err}");
                        break;
                    }
                }
                debug!("ensemble_decoder thread exit");
            })
            .expect("failed to spawn ensemble decoder thread");

        Ok(EnsembleIter {
            jobs: jobs_rx,
            handle: Some(handle),
            fixed_leader,
            summary,
        })
    }
}

/// Provides [Ensemble]s, in stream order, decoded in the background by [Decoder::decode_iter].
pub struct EnsembleIter {
    jobs: Receiver<Receiver<Option<Ensemble>>>,
    handle: Option<JoinHandle<()>>,
    fixed_leader: Arc<FixedLeader>,
    summary: Summary,
}

impl EnsembleIter {
    /// The single fixed leader shared by all ensembles.
    #[must_use]
    pub fn fixed_leader(&self) -> &Arc<FixedLeader> {
        &self.fixed_leader
    }

    /// Summary of the decode so far. Ensemble counts are only complete once the iterator
    /// is exhausted.
    #[must_use]
    pub fn summary(&self) -> &Summary {
        &self.summary
    }
}

impl Iterator for EnsembleIter {
    type Item = Ensemble;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            // recv blocks current thread until data is available.
            let Ok(rx) = self.jobs.recv() else {
                if let Some(handle) = self.handle.take() {
                    if handle.join().is_err() {
                        warn!("ensemble decoder thread panicked");
                    }
                }
                return None;
            };
            match rx.recv() {
                Ok(Some(ensemble)) => {
                    self.summary.add(&ensemble);
                    return Some(ensemble);
                }
                Ok(None) => continue,
                Err(err) => debug!("failed to receive ensemble: {err}"),
            }
        }
    }
}

/// Decode `dat` using the default [Decoder].
///
/// # Errors
/// See [Decoder::decode].
pub fn decode(dat: &[u8]) -> Result<Decoded> {
    Decoder::default().decode(dat)
}

/// Read the file at `path` into memory and decode it using the default [Decoder].
///
/// # Errors
/// [Error::Io] if the file cannot be read, otherwise see [Decoder::decode].
pub fn decode_file<P: AsRef<Path>>(path: P) -> Result<Decoded> {
    let dat = std::fs::read(path)?;
    Decoder::default().decode(&dat)
}
