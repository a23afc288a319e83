/// Size in bytes of a single cumulative sum entry.
const SUM_SIZE: usize = std::mem::size_of::<u64>();

/// Prefix-sum index over a byte stream providing range checksums.
///
/// Cumulative byte sums are kept every `stride` bytes. A stride of 1 is a fully
/// materialized prefix sum answering each query with two lookups. Larger strides bound
/// the index to roughly `len / stride` entries at the cost of summing at most
/// `2 * stride` bytes per query.
///
/// Sums are accumulated in a `u64` so multi-gigabyte streams cannot overflow.
///
/// # Example
/// ```
/// use workhorse::framing::ChecksumIndex;
///
/// let dat = [0x7f, 0x7f, 0x08, 0x00, 0x00, 0x00, 0x01, 0x02];
/// let index = ChecksumIndex::new(&dat, None);
/// assert_eq!(index.checksum(0, 8), Some(0x7f + 0x7f + 0x08 + 0x01 + 0x02));
/// ```
#[derive(Debug, Clone)]
pub struct ChecksumIndex<'a> {
    dat: &'a [u8],
    stride: usize,
    // sums[j] is the sum of dat[..j * stride]
    sums: Vec<u64>,
}

impl<'a> ChecksumIndex<'a> {
    /// Build an index over `dat`.
    ///
    /// `memory_budget` is the number of bytes the index may use. `None`, or a budget large
    /// enough for one entry per byte, selects the fully materialized prefix sum. Otherwise
    /// a chunked index is built whose checkpoints fit within the budget.
    #[must_use]
    pub fn new(dat: &'a [u8], memory_budget: Option<usize>) -> Self {
        let stride = stride_for_budget(dat.len(), memory_budget);
        let mut sums = Vec::with_capacity(dat.len() / stride + 2);
        let mut acc = 0u64;
        sums.push(acc);
        for chunk in dat.chunks(stride) {
            acc += chunk.iter().map(|b| u64::from(*b)).sum::<u64>();
            sums.push(acc);
        }
        ChecksumIndex { dat, stride, sums }
    }

    /// Number of bytes between stored cumulative sums.
    #[must_use]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Approximate number of bytes used by the stored sums.
    #[must_use]
    pub fn memory(&self) -> usize {
        self.sums.len() * SUM_SIZE
    }

    /// Sum of all bytes before `end`.
    fn prefix(&self, end: usize) -> u64 {
        let j = end / self.stride;
        let base = j * self.stride;
        let partial: u64 = self.dat[base..end].iter().map(|b| u64::from(*b)).sum();
        self.sums[j] + partial
    }

    /// Sum of the `len` bytes starting at `start`, masked to 16 bits, or `None` if the
    /// range runs past the end of the stream.
    #[must_use]
    pub fn checksum(&self, start: usize, len: usize) -> Option<u16> {
        let end = start.checked_add(len)?;
        if end > self.dat.len() {
            return None;
        }
        let sum = self.prefix(end) - self.prefix(start);
        Some((sum & 0xffff) as u16)
    }
}

fn stride_for_budget(len: usize, memory_budget: Option<usize>) -> usize {
    let Some(budget) = memory_budget else {
        return 1;
    };
    let full = (len + 1) * SUM_SIZE;
    if budget >= full {
        return 1;
    }
    // Always keep at least the two end-point sums.
    let slots = (budget / SUM_SIZE).max(2);
    len.div_ceil(slots - 1).max(1)
}
