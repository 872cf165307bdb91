//! Pull-based character sources feeding the sliding buffer.
//!
//! The readers never perform charset decoding themselves; a [`CharSource`]
//! hands them pre-decoded scalar values. Seek support is a runtime capability
//! so that the same reader type works over both in-memory text (seekable) and
//! one-shot streams.

use std::io::{self, Read};

use bstr::decode_utf8;

/// A pull-based stream of pre-decoded characters.
///
/// Implementations block in [`read`](CharSource::read) until at least one
/// character is available or the stream is exhausted.
pub trait CharSource {
    /// Pulls characters into `buf`, returning how many were obtained.
    ///
    /// Returning `0` means the stream is exhausted; the caller will not ask
    /// again.
    ///
    /// # Errors
    ///
    /// Propagates failures from the underlying transport.
    fn read(&mut self, buf: &mut [char]) -> io::Result<usize>;

    /// Current read position in characters, or `None` for a forward-only
    /// source.
    fn position(&self) -> Option<u64> {
        None
    }

    /// Moves the read position, returning whether the source honored it.
    ///
    /// Forward-only sources return `false` and leave their state untouched.
    fn set_position(&mut self, position: u64) -> bool {
        let _ = position;
        false
    }

    /// Total length in characters, when known up front.
    fn len(&self) -> Option<u64> {
        None
    }
}

impl<S: CharSource + ?Sized> CharSource for &mut S {
    fn read(&mut self, buf: &mut [char]) -> io::Result<usize> {
        (**self).read(buf)
    }

    fn position(&self) -> Option<u64> {
        (**self).position()
    }

    fn set_position(&mut self, position: u64) -> bool {
        (**self).set_position(position)
    }

    fn len(&self) -> Option<u64> {
        (**self).len()
    }
}

/// An in-memory, seekable character source.
#[derive(Debug, Clone)]
pub struct StringSource {
    data: Vec<char>,
    position: usize,
}

impl StringSource {
    /// Creates a source over the given text.
    pub fn new(text: impl AsRef<str>) -> Self {
        Self {
            data: text.as_ref().chars().collect(),
            position: 0,
        }
    }
}

impl CharSource for StringSource {
    fn read(&mut self, buf: &mut [char]) -> io::Result<usize> {
        let count = buf.len().min(self.data.len() - self.position);
        buf[..count].copy_from_slice(&self.data[self.position..self.position + count]);
        self.position += count;
        Ok(count)
    }

    fn position(&self) -> Option<u64> {
        Some(self.position as u64)
    }

    fn set_position(&mut self, position: u64) -> bool {
        self.position = usize::try_from(position)
            .unwrap_or(self.data.len())
            .min(self.data.len());
        true
    }

    fn len(&self) -> Option<u64> {
        Some(self.data.len() as u64)
    }
}

const DEFAULT_BYTE_CAPACITY: usize = 8 * 1024;

/// Forward-only source decoding UTF-8 from any [`io::Read`].
///
/// Decoding is incremental: a scalar split across two reads of the inner
/// stream is reassembled transparently. Invalid byte sequences surface as
/// [`io::ErrorKind::InvalidData`].
#[derive(Debug)]
pub struct Utf8CharReader<R> {
    inner: R,
    bytes: Vec<u8>,
    start: usize,
    end: usize,
    eof: bool,
}

impl<R: Read> Utf8CharReader<R> {
    /// Wraps `inner` with the default byte buffer capacity.
    pub fn new(inner: R) -> Self {
        Self::with_capacity(inner, DEFAULT_BYTE_CAPACITY)
    }

    /// Wraps `inner` with an explicit byte buffer capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is smaller than 4, the longest UTF-8 sequence.
    pub fn with_capacity(inner: R, capacity: usize) -> Self {
        assert!(capacity >= 4, "byte buffer must hold one UTF-8 sequence");
        Self {
            inner,
            bytes: vec![0; capacity],
            start: 0,
            end: 0,
            eof: false,
        }
    }

    /// Consumes the adapter, returning the inner reader.
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Compacts pending bytes to the front and pulls more from the inner
    /// reader. Returns whether any new bytes arrived.
    fn refill(&mut self) -> io::Result<bool> {
        if self.eof {
            return Ok(false);
        }
        self.bytes.copy_within(self.start..self.end, 0);
        self.end -= self.start;
        self.start = 0;
        let obtained = self.inner.read(&mut self.bytes[self.end..])?;
        self.end += obtained;
        if obtained == 0 {
            self.eof = true;
        }
        Ok(obtained > 0)
    }
}

impl<R: Read> CharSource for Utf8CharReader<R> {
    fn read(&mut self, buf: &mut [char]) -> io::Result<usize> {
        let mut decoded = 0;
        while decoded < buf.len() {
            if self.start == self.end && !self.refill()? {
                break;
            }
            let (ch, size) = decode_utf8(&self.bytes[self.start..self.end]);
            match ch {
                Some(c) => {
                    buf[decoded] = c;
                    decoded += 1;
                    self.start += size;
                }
                None => {
                    // A maximal prefix at the end of the window may simply be
                    // a scalar cut off by the read boundary.
                    if self.start + size == self.end && !self.eof && self.refill()? {
                        continue;
                    }
                    if decoded > 0 {
                        // Hand back what decoded cleanly; the next call will
                        // land on the bad bytes again and report them.
                        break;
                    }
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        "stream contains invalid UTF-8",
                    ));
                }
            }
        }
        Ok(decoded)
    }
}
