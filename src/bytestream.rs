//! The bidirectional byte cursor shared by every serializer in the crate.
//!
//! A [`Stream`] wraps an in-memory buffer, a cursor position, and a mode
//! (reading from the buffer or writing into it). Every `rw_*` method
//! performs the read or the write depending on the stream's mode, and
//! conditionally byte-swaps depending on the stream's endianness versus
//! the host's — this mirrors `hx_stream_rw16`/`hx_stream_rw32` in the
//! source library, which collapse read and write into one routine per
//! primitive width.

use std::error::Error;
use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::Cuuid;

/// Byte order of a stream or container version.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Endianness {
    /// Least-significant byte first.
    Little,
    /// Most-significant byte first.
    Big,
}

impl Endianness {
    #[must_use]
    fn host() -> Self {
        if cfg!(target_endian = "big") {
            Self::Big
        } else {
            Self::Little
        }
    }
}

/// Direction a [`Stream`] is currently being driven in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Values are copied out of the buffer into the caller.
    Read,
    /// Values are copied from the caller into the buffer.
    Write,
}

/// A bidirectional, position-tracked view over an in-memory byte buffer.
///
/// `Stream` always owns its buffer. Reading and writing share the same
/// set of `rw_*` methods; which direction a call performs depends on
/// [`Stream::mode`].
#[derive(Debug)]
pub struct Stream {
    buf: Vec<u8>,
    pos: usize,
    mode: Mode,
    endian: Endianness,
}

impl Stream {
    /// Creates a stream in read mode over an existing buffer.
    #[must_use]
    pub fn reader(buf: Vec<u8>, endian: Endianness) -> Self {
        Self { buf, pos: 0, mode: Mode::Read, endian }
    }

    /// Creates a stream in write mode with `capacity` bytes preallocated.
    #[must_use]
    pub fn writer(capacity: usize, endian: Endianness) -> Self {
        Self { buf: Vec::with_capacity(capacity), pos: 0, mode: Mode::Write, endian }
    }

    /// Returns the stream's current cursor position.
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns the stream's mode.
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Returns the stream's endianness.
    #[must_use]
    pub fn endianness(&self) -> Endianness {
        self.endian
    }

    /// Returns the number of bytes currently in the buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` if the buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Consumes the stream, returning its buffer.
    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    /// Borrows the stream's buffer.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Moves the cursor to an absolute position.
    ///
    /// # Errors
    /// Returns [`StreamError::Overrun`] if `pos` is past the end of the
    /// buffer while reading.
    pub fn seek(&mut self, pos: usize) -> Result<(), StreamError> {
        if self.mode == Mode::Read && pos > self.buf.len() {
            return Err(StreamError::overrun(pos, 0, self.buf.len()));
        }
        self.pos = pos;
        Ok(())
    }

    /// Advances the cursor by `delta` bytes.
    pub fn advance(&mut self, delta: usize) {
        self.pos += delta;
    }

    fn swaps(&self, mode: Mode) -> bool {
        self.endian != Endianness::host() && self.mode == mode
    }

    /// Copies `n` bytes between the buffer and `data`, advancing the cursor.
    ///
    /// In [`Mode::Read`], bytes are copied from the buffer into `data`.
    /// In [`Mode::Write`], bytes are copied from `data` into the buffer
    /// (appending, if the cursor sits at the end).
    ///
    /// # Errors
    /// Returns [`StreamError::Overrun`] if a read would run past the end
    /// of the buffer.
    pub fn rw_bytes(&mut self, data: &mut [u8]) -> Result<(), StreamError> {
        let n = data.len();
        match self.mode {
            Mode::Read => {
                let end = self
                    .pos
                    .checked_add(n)
                    .filter(|&end| end <= self.buf.len())
                    .ok_or_else(|| StreamError::overrun(self.pos, n, self.buf.len()))?;
                data.copy_from_slice(&self.buf[self.pos..end]);
            }
            Mode::Write => {
                if self.pos == self.buf.len() {
                    self.buf.extend_from_slice(data);
                } else {
                    let end = self.pos + n;
                    if end > self.buf.len() {
                        self.buf.resize(end, 0);
                    }
                    self.buf[self.pos..end].copy_from_slice(data);
                }
            }
        }
        self.pos += n;
        Ok(())
    }

    /// Reads-or-writes a single byte.
    ///
    /// # Errors
    /// See [`Stream::rw_bytes`].
    pub fn rw_u8(&mut self, value: &mut u8) -> Result<(), StreamError> {
        let mut buf = [*value];
        self.rw_bytes(&mut buf)?;
        *value = buf[0];
        Ok(())
    }

    /// Reads-or-writes a 16-bit unsigned integer, honoring stream endianness.
    ///
    /// # Errors
    /// See [`Stream::rw_bytes`].
    pub fn rw_u16(&mut self, value: &mut u16) -> Result<(), StreamError> {
        let mut buf = if self.swaps(Mode::Write) {
            value.swap_bytes().to_ne_bytes()
        } else {
            value.to_ne_bytes()
        };
        self.rw_bytes(&mut buf)?;
        let mut out = u16::from_ne_bytes(buf);
        if self.swaps(Mode::Read) {
            out = out.swap_bytes();
        }
        *value = out;
        Ok(())
    }

    /// Reads-or-writes a 32-bit unsigned integer, honoring stream endianness.
    ///
    /// # Errors
    /// See [`Stream::rw_bytes`].
    pub fn rw_u32(&mut self, value: &mut u32) -> Result<(), StreamError> {
        let mut buf = if self.swaps(Mode::Write) {
            value.swap_bytes().to_ne_bytes()
        } else {
            value.to_ne_bytes()
        };
        self.rw_bytes(&mut buf)?;
        let mut out = u32::from_ne_bytes(buf);
        if self.swaps(Mode::Read) {
            out = out.swap_bytes();
        }
        *value = out;
        Ok(())
    }

    /// Reads-or-writes a signed 16-bit integer, honoring stream endianness.
    ///
    /// # Errors
    /// See [`Stream::rw_bytes`].
    pub fn rw_i16(&mut self, value: &mut i16) -> Result<(), StreamError> {
        let mut bits = *value as u16;
        self.rw_u16(&mut bits)?;
        *value = bits as i16;
        Ok(())
    }

    /// Reads-or-writes an IEEE-754 single-precision float, honoring stream endianness.
    ///
    /// # Errors
    /// See [`Stream::rw_bytes`].
    pub fn rw_f32(&mut self, value: &mut f32) -> Result<(), StreamError> {
        let mut bits = value.to_bits();
        self.rw_u32(&mut bits)?;
        *value = f32::from_bits(bits);
        Ok(())
    }

    /// Reads-or-writes a [`Cuuid`], always wire-ordered upper-half first,
    /// with each half subject to the stream's endianness.
    ///
    /// # Errors
    /// See [`Stream::rw_bytes`].
    pub fn rw_cuuid(&mut self, value: &mut Cuuid) -> Result<(), StreamError> {
        let mut hi = (value.0 >> 32) as u32;
        let mut lo = value.0 as u32;
        self.rw_u32(&mut hi)?;
        self.rw_u32(&mut lo)?;
        value.0 = (u64::from(hi) << 32) | u64::from(lo);
        Ok(())
    }

    /// Reads-or-writes a fixed-length raw byte string (no length prefix).
    ///
    /// # Errors
    /// See [`Stream::rw_bytes`].
    pub fn rw_raw(&mut self, data: &mut Vec<u8>, len: usize) -> Result<(), StreamError> {
        match self.mode {
            Mode::Read => {
                let mut buf = vec![0u8; len];
                self.rw_bytes(&mut buf)?;
                *data = buf;
            }
            Mode::Write => {
                debug_assert_eq!(data.len(), len);
                let mut buf = data.clone();
                self.rw_bytes(&mut buf)?;
            }
        }
        Ok(())
    }
}

/// An error produced by a [`Stream`] operation.
#[derive(Debug)]
pub struct StreamError {
    kind: StreamErrorKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StreamErrorKind {
    Overrun { position: usize, requested: usize, len: usize },
}

impl StreamError {
    fn overrun(position: usize, requested: usize, len: usize) -> Self {
        Self { kind: StreamErrorKind::Overrun { position, requested, len } }
    }
}

impl Display for StreamError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let StreamErrorKind::Overrun { position, requested, len } = self.kind;
        f.write_str(&format!(
            "stream overrun: requested {requested} bytes at position {position}, buffer is {len} bytes"
        ))
    }
}

impl Error for StreamError {}

#[cfg(test)]
mod test {
    use super::{Endianness, Mode, Stream};
    use crate::Cuuid;

    #[test]
    fn read_primitives_little_endian_native() {
        let mut s = Stream::reader(vec![0x11, 0x00, 0x00, 0x00, 0x34, 0x12], Endianness::Little);
        let mut a = 0u32;
        s.rw_u32(&mut a).unwrap();
        assert_eq!(a, 17);
        let mut b = 0u16;
        s.rw_u16(&mut b).unwrap();
        assert_eq!(b, 0x1234);
    }

    #[test]
    fn swap_on_mismatched_endianness() {
        let mut s = Stream::reader(vec![0x00, 0x00, 0x00, 0x11], Endianness::Big);
        let mut a = 0u32;
        s.rw_u32(&mut a).unwrap();
        assert_eq!(a, 17);
    }

    #[test]
    fn write_then_readback_roundtrip() {
        let mut w = Stream::writer(8, Endianness::Big);
        let mut value = 0xDEAD_BEEFu32;
        w.rw_u32(&mut value).unwrap();
        assert_eq!(value, 0xDEAD_BEEF, "caller's variable must be unchanged after write");

        let bytes = w.into_inner();
        let mut r = Stream::reader(bytes, Endianness::Big);
        let mut readback = 0u32;
        r.rw_u32(&mut readback).unwrap();
        assert_eq!(readback, 0xDEAD_BEEF);
    }

    #[test]
    fn cuuid_upper_half_first_on_wire() {
        let mut w = Stream::writer(8, Endianness::Little);
        let mut cuuid = Cuuid(0x1122_3344_5566_7788);
        w.rw_cuuid(&mut cuuid).unwrap();
        let bytes = w.into_inner();
        assert_eq!(&bytes[0..4], &0x1122_3344u32.to_le_bytes());
        assert_eq!(&bytes[4..8], &0x5566_7788u32.to_le_bytes());
    }

    #[test]
    fn overrun_on_short_buffer() {
        let mut s = Stream::reader(vec![0, 0], Endianness::Little);
        let mut a = 0u32;
        assert!(s.rw_u32(&mut a).is_err());
    }

    #[test]
    fn seek_past_end_in_read_mode_errors() {
        let mut s = Stream::reader(vec![0, 0], Endianness::Little);
        assert!(s.seek(10).is_err());
        assert!(s.seek(2).is_ok());
    }

    #[test]
    fn mode_accessor() {
        let s = Stream::writer(0, Endianness::Little);
        assert_eq!(s.mode(), Mode::Write);
    }
}
