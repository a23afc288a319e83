use crate::prelude::*;

/// Bytes provides fixed-offset, little-endian field access over a section of an
/// ensemble. The minimum length is checked once at construction so the accessors
/// can index directly.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Bytes<'a> {
    dat: &'a [u8],
}

impl<'a> Bytes<'a> {
    /// Wrap `dat`, requiring at least `minimum` bytes.
    ///
    /// # Errors
    /// [Error::NotEnoughData] if `dat` is shorter than `minimum`.
    pub fn new(dat: &'a [u8], minimum: usize) -> Result<Self> {
        if dat.len() < minimum {
            return Err(Error::NotEnoughData {
                actual: dat.len(),
                minimum,
            });
        }
        Ok(Bytes { dat })
    }

    /// True when there are enough bytes for a field ending at `end`.
    pub fn has(&self, end: usize) -> bool {
        self.dat.len() >= end
    }

    pub fn u8(&self, offset: usize) -> u8 {
        self.dat[offset]
    }

    pub fn u16(&self, offset: usize) -> u16 {
        u16::from_le_bytes([self.dat[offset], self.dat[offset + 1]])
    }

    pub fn i16(&self, offset: usize) -> i16 {
        i16::from_le_bytes([self.dat[offset], self.dat[offset + 1]])
    }

    pub fn u32(&self, offset: usize) -> u32 {
        u32::from_le_bytes(self.array(offset))
    }

    pub fn i32(&self, offset: usize) -> i32 {
        i32::from_le_bytes(self.array(offset))
    }

    pub fn u64(&self, offset: usize) -> u64 {
        u64::from_le_bytes(self.array(offset))
    }

    /// `N` consecutive bytes starting at `offset`.
    pub fn array<const N: usize>(&self, offset: usize) -> [u8; N] {
        let mut buf = [0u8; N];
        buf.copy_from_slice(&self.dat[offset..offset + N]);
        buf
    }

    /// `N` consecutive little-endian i16 values starting at `offset`.
    pub fn i16s<const N: usize>(&self, offset: usize) -> [i16; N] {
        let mut out = [0i16; N];
        for (i, x) in out.iter_mut().enumerate() {
            *x = self.i16(offset + 2 * i);
        }
        out
    }

    /// `N` consecutive little-endian u16 values starting at `offset`.
    pub fn u16s<const N: usize>(&self, offset: usize) -> [u16; N] {
        let mut out = [0u16; N];
        for (i, x) in out.iter_mut().enumerate() {
            *x = self.u16(offset + 2 * i);
        }
        out
    }
}

/// Read a little-endian u16 at `offset`, or `None` if it would run past the end of `dat`.
pub(crate) fn read_u16(dat: &[u8], offset: usize) -> Option<u16> {
    let end = offset.checked_add(2)?;
    let x = dat.get(offset..end)?;
    Some(u16::from_le_bytes([x[0], x[1]]))
}
