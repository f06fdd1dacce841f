//! Pull-based byte sources and the parser cursor.

use std::io::{self, Read};

/// A pull source yielding one byte at a time.
///
/// `None` means end of input. Sources are stateless beyond their cursor;
/// the parser never rewinds.
pub trait ByteSource {
    fn next_byte(&mut self) -> Option<u8>;
}

/// In-memory source over a byte slice or string.
pub struct SliceSource<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> SliceSource<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }
}

impl ByteSource for SliceSource<'_> {
    fn next_byte(&mut self) -> Option<u8> {
        let byte = self.bytes.get(self.pos).copied();
        self.pos += usize::from(byte.is_some());
        byte
    }
}

/// Source over any [`io::Read`] (files included), pulling one byte at a
/// time. Read errors end the input like EOF does.
pub struct ReadSource<R> {
    inner: R,
    done: bool,
}

impl<R: Read> ReadSource<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, done: false }
    }
}

impl<R: Read> ByteSource for ReadSource<R> {
    fn next_byte(&mut self) -> Option<u8> {
        if self.done {
            return None;
        }
        let mut buf = [0u8; 1];
        loop {
            match self.inner.read(&mut buf) {
                Ok(0) => {
                    self.done = true;
                    return None;
                }
                Ok(_) => return Some(buf[0]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(_) => {
                    self.done = true;
                    return None;
                }
            }
        }
    }
}

/// One-lookahead cursor over a [`ByteSource`].
///
/// `pos` is the byte offset of the current lookahead byte, which is the
/// offset reported in parse results: the first byte not consumed as part
/// of the document, or the offending byte on failure. At end of input it
/// equals the total number of bytes read.
pub(crate) struct Cursor<'s> {
    source: &'s mut dyn ByteSource,
    current: Option<u8>,
    pos: usize,
}

impl<'s> Cursor<'s> {
    pub(crate) fn new(source: &'s mut dyn ByteSource) -> Self {
        let current = source.next_byte();
        Self {
            source,
            current,
            pos: 0,
        }
    }

    pub(crate) fn cur(&self) -> Option<u8> {
        self.current
    }

    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    /// Advance one byte. Past the end this is a no-op, so `pos` stays at
    /// the input length.
    pub(crate) fn bump(&mut self) {
        if self.current.is_some() {
            self.current = self.source.next_byte();
            self.pos += 1;
        }
    }

    pub(crate) fn skip_whitespace(&mut self) {
        while matches!(self.current, Some(b' ' | b'\t' | b'\r' | b'\n')) {
            self.bump();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_source_yields_and_ends() {
        let mut src = SliceSource::new(b"ab");
        assert_eq!(src.next_byte(), Some(b'a'));
        assert_eq!(src.next_byte(), Some(b'b'));
        assert_eq!(src.next_byte(), None);
        assert_eq!(src.next_byte(), None);
    }

    #[test]
    fn read_source_over_reader() {
        let mut src = ReadSource::new(&b"xy"[..]);
        assert_eq!(src.next_byte(), Some(b'x'));
        assert_eq!(src.next_byte(), Some(b'y'));
        assert_eq!(src.next_byte(), None);
    }

    #[test]
    fn cursor_tracks_offset_of_current() {
        let mut src = SliceSource::new(b"abc");
        let mut cur = Cursor::new(&mut src);
        assert_eq!(cur.cur(), Some(b'a'));
        assert_eq!(cur.pos(), 0);
        cur.bump();
        assert_eq!(cur.cur(), Some(b'b'));
        assert_eq!(cur.pos(), 1);
        cur.bump();
        cur.bump();
        assert_eq!(cur.cur(), None);
        assert_eq!(cur.pos(), 3);
        // Bumping past the end must not move the offset.
        cur.bump();
        assert_eq!(cur.pos(), 3);
    }

    #[test]
    fn cursor_skips_whitespace_kinds() {
        let mut src = SliceSource::new(b" \t\r\n1");
        let mut cur = Cursor::new(&mut src);
        cur.skip_whitespace();
        assert_eq!(cur.cur(), Some(b'1'));
        assert_eq!(cur.pos(), 4);
    }
}
