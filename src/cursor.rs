//! Cursor over a byte slice used when encoding advertising data.

use crate::Error;

/// Tracks where a byte slice is being written.
pub struct WriteCursor<'d> {
    pos: usize,
    data: &'d mut [u8],
}

impl<'d> WriteCursor<'d> {
    /// Creates a new write cursor at the beginning of the data.
    pub fn new(data: &'d mut [u8]) -> Self {
        Self { pos: 0, data }
    }

    /// Append byte slice
    pub fn append(&mut self, data: &[u8]) -> Result<(), Error> {
        if self.available() < data.len() {
            Err(Error::InsufficientSpace)
        } else {
            self.data[self.pos..self.pos + data.len()].copy_from_slice(data);
            self.pos += data.len();
            Ok(())
        }
    }

    /// Append a length-prefixed, type-tagged run: `[len, ty, payload...]` where `len` covers the
    /// type byte and the payload.
    pub fn append_tagged(&mut self, ty: u8, payload: &[&[u8]]) -> Result<(), Error> {
        let len: usize = payload.iter().map(|p| p.len()).sum::<usize>() + 1;
        if len > u8::MAX as usize || self.available() < len + 1 {
            return Err(Error::InsufficientSpace);
        }
        self.append(&[len as u8, ty])?;
        for p in payload {
            self.append(p)?;
        }
        Ok(())
    }

    /// Returns amount of bytes that remain available.
    pub fn available(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Returns the current length of the data written.
    pub fn len(&self) -> usize {
        self.pos
    }

    /// Returns the byte slice that was written by this cursor.
    pub fn finish(self) -> &'d mut [u8] {
        &mut self.data[..self.pos]
    }
}
