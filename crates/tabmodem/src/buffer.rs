//! The sliding character window backing every reader.
//!
//! A [`CharBuffer`] is a fixed-capacity window over a [`CharSource`]. Refills
//! can retain the tail of the window (`fill(keep)`), shifting it to the front
//! and rebasing the read position and any bookmarks, so tokenizers can scan
//! across refill boundaries without re-reading consumed data. Content beyond
//! the kept tail is overwritten by a refill; callers that still need it must
//! copy it out (into the value builder) first.

use std::collections::HashMap;
use std::io;

use crate::source::CharSource;

#[derive(Debug)]
pub(crate) struct CharBuffer<S> {
    pub(crate) data: Box<[char]>,
    /// Number of valid characters in `data`.
    pub(crate) len: usize,
    /// Read position; meaningful while `pos < len`.
    pub(crate) pos: usize,
    bookmarks: HashMap<String, usize>,
    source: S,
    eof: bool,
}

impl<S: CharSource> CharBuffer<S> {
    /// Creates a window of `capacity` characters over `source`.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub(crate) fn new(source: S, capacity: usize) -> Self {
        assert!(capacity >= 1, "buffer capacity must be at least 1");
        Self {
            data: vec!['\0'; capacity].into_boxed_slice(),
            len: 0,
            pos: 0,
            bookmarks: HashMap::new(),
            source,
            eof: false,
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.data.len()
    }

    /// The character at the current position.
    pub(crate) fn current(&self) -> char {
        debug_assert!(self.pos < self.len);
        self.data[self.pos]
    }

    /// True when unconsumed characters remain, refilling once if needed.
    pub(crate) fn ensure_has_data(&mut self) -> io::Result<bool> {
        if self.pos < self.len {
            return Ok(true);
        }
        self.fill(0)
    }

    /// Refills the window, retaining its last `keep` characters.
    ///
    /// The kept tail is shifted to the front; the position and all bookmarks
    /// are rebased by the number of discarded characters. Returns whether any
    /// new characters were obtained. When `keep` would not fit, the window
    /// grows (capacity never shrinks).
    pub(crate) fn fill(&mut self, keep: usize) -> io::Result<bool> {
        debug_assert!(keep <= self.len);

        if keep == 0 {
            self.pos = 0;
            self.bookmarks.clear();
        } else {
            if keep >= self.capacity() {
                self.grow(keep + 1);
            }

            let discarded = self.len - keep;
            self.data.copy_within(self.len - keep..self.len, 0);
            debug_assert!(self.pos >= discarded, "consumed data cannot be kept behind");
            self.pos -= discarded;
            self.bookmarks.retain(|_, offset| {
                if *offset < discarded {
                    return false;
                }
                *offset -= discarded;
                true
            });
        }

        let obtained = if self.eof {
            0
        } else {
            self.source.read(&mut self.data[keep..])?
        };
        if obtained == 0 {
            self.eof = true;
        }
        self.len = keep + obtained;
        Ok(obtained > 0)
    }

    fn grow(&mut self, minimum: usize) {
        let capacity = (self.capacity() * 2).max(minimum);
        let mut data = vec!['\0'; capacity].into_boxed_slice();
        data[..self.len].copy_from_slice(&self.data[..self.len]);
        self.data = data;
    }

    /// Records a named offset into the current window.
    pub(crate) fn set_bookmark(&mut self, name: &str, offset: usize) {
        debug_assert!(offset <= self.len);
        self.bookmarks.insert(name.to_string(), offset);
    }

    /// Looks up a bookmark, rebased to the current window.
    ///
    /// Returns `None` when the bookmark was never set or its position has
    /// been discarded by a refill.
    pub(crate) fn bookmark(&self, name: &str) -> Option<usize> {
        self.bookmarks.get(name).copied()
    }

    pub(crate) fn clear_bookmark(&mut self, name: &str) {
        self.bookmarks.remove(name);
    }

    /// Position of the next unconsumed character within the source, in
    /// characters, when the source can tell.
    pub(crate) fn source_position(&self) -> Option<u64> {
        self.source
            .position()
            .map(|p| p - (self.len - self.pos) as u64)
    }

    pub(crate) fn source_is_seekable(&self) -> bool {
        self.source.position().is_some()
    }

    /// Repositions the source and discards the window. Returns whether the
    /// source honored the seek.
    pub(crate) fn seek(&mut self, position: u64) -> bool {
        if !self.source.set_position(position) {
            return false;
        }
        self.pos = 0;
        self.len = 0;
        self.eof = false;
        self.bookmarks.clear();
        true
    }

    pub(crate) fn into_source(self) -> S {
        self.source
    }
}
