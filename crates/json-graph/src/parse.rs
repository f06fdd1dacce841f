//! Recursive-descent parser over a pull byte source.
//!
//! One byte of lookahead, no rewinding, no global state: the cursor is
//! threaded through the call chain. Values are assembled bottom-up
//! through the adopt-only append path, so a parse never copies and never
//! runs the cycle walk. Every failure path releases the nodes built so
//! far before returning, leaving `live_nodes()` untouched.

use std::io;

use crate::error::JsonError;
use crate::graph::JsonGraph;
use crate::node::{Kind, NodeId};
use crate::source::{ByteSource, Cursor, ReadSource, SliceSource};

fn fail_at<T>(cur: &Cursor) -> Result<T, JsonError> {
    Err(JsonError::MalformedInput { offset: cur.pos() })
}

fn is_digit(byte: Option<u8>) -> bool {
    matches!(byte, Some(b'0'..=b'9'))
}

fn hex_val(byte: u8) -> Option<u32> {
    match byte {
        b'0'..=b'9' => Some(u32::from(byte - b'0')),
        b'a'..=b'f' => Some(u32::from(byte - b'a') + 10),
        b'A'..=b'F' => Some(u32::from(byte - b'A') + 10),
        _ => None,
    }
}

/// Scans one number, returning its verbatim text. The cursor ends on the
/// first byte past the number.
fn scan_number(cur: &mut Cursor) -> Result<Vec<u8>, JsonError> {
    let mut text = Vec::new();
    if cur.cur() == Some(b'-') {
        text.push(b'-');
        cur.bump();
    }
    match cur.cur() {
        Some(b'0') => {
            text.push(b'0');
            cur.bump();
        }
        Some(digit @ b'1'..=b'9') => {
            text.push(digit);
            cur.bump();
            while let Some(digit @ b'0'..=b'9') = cur.cur() {
                text.push(digit);
                cur.bump();
            }
        }
        _ => return fail_at(cur),
    }
    if cur.cur() == Some(b'.') {
        text.push(b'.');
        cur.bump();
        if !is_digit(cur.cur()) {
            return fail_at(cur);
        }
        while let Some(digit @ b'0'..=b'9') = cur.cur() {
            text.push(digit);
            cur.bump();
        }
    }
    if let Some(e @ (b'e' | b'E')) = cur.cur() {
        text.push(e);
        cur.bump();
        if let Some(sign @ (b'+' | b'-')) = cur.cur() {
            text.push(sign);
            cur.bump();
        }
        if !is_digit(cur.cur()) {
            return fail_at(cur);
        }
        while let Some(digit @ b'0'..=b'9') = cur.cur() {
            text.push(digit);
            cur.bump();
        }
    }
    Ok(text)
}

/// Scans a string with the cursor on the opening quote, decoding escapes
/// into raw payload bytes. The cursor ends past the closing quote.
fn scan_string(cur: &mut Cursor) -> Result<Vec<u8>, JsonError> {
    if cur.cur() != Some(b'"') {
        return fail_at(cur);
    }
    cur.bump();
    let mut text = Vec::new();
    loop {
        match cur.cur() {
            None | Some(0) => return fail_at(cur),
            Some(b'"') => {
                cur.bump();
                return Ok(text);
            }
            Some(b'\\') => {
                cur.bump();
                match cur.cur() {
                    Some(raw @ (b'"' | b'\\' | b'/')) => {
                        text.push(raw);
                        cur.bump();
                    }
                    Some(b'b') => {
                        text.push(0x08);
                        cur.bump();
                    }
                    Some(b'f') => {
                        text.push(0x0c);
                        cur.bump();
                    }
                    Some(b'n') => {
                        text.push(b'\n');
                        cur.bump();
                    }
                    Some(b'r') => {
                        text.push(b'\r');
                        cur.bump();
                    }
                    Some(b't') => {
                        text.push(b'\t');
                        cur.bump();
                    }
                    Some(b'u') => {
                        let mut code: u32 = 0;
                        for _ in 0..4 {
                            cur.bump();
                            match cur.cur().and_then(hex_val) {
                                Some(digit) => code = code * 16 + digit,
                                None => return fail_at(cur),
                            }
                        }
                        cur.bump();
                        push_code_point(&mut text, code);
                    }
                    _ => return fail_at(cur),
                }
            }
            Some(raw) => {
                text.push(raw);
                cur.bump();
            }
        }
    }
}

/// Encodes a `\uXXXX` code point as 1–3 UTF-8 bytes. Surrogate halves
/// are encoded independently, never recombined into one code point.
fn push_code_point(out: &mut Vec<u8>, code: u32) {
    if code < 0x80 {
        out.push(code as u8);
    } else if code < 0x800 {
        out.push(0xc0 | (code >> 6) as u8);
        out.push(0x80 | (code & 0x3f) as u8);
    } else {
        out.push(0xe0 | (code >> 12) as u8);
        out.push(0x80 | ((code >> 6) & 0x3f) as u8);
        out.push(0x80 | (code & 0x3f) as u8);
    }
}

/// Whether `text` is exactly one number per the grammar. The number
/// constructor runs the same scanner the parser does.
pub(crate) fn is_valid_number(text: &[u8]) -> bool {
    let mut source = SliceSource::new(text);
    let mut cur = Cursor::new(&mut source);
    scan_number(&mut cur).is_ok() && cur.cur().is_none()
}

struct Parser<'g, 's> {
    graph: &'g mut JsonGraph,
    cur: Cursor<'s>,
    depth: usize,
}

impl<'g, 's> Parser<'g, 's> {
    fn new(graph: &'g mut JsonGraph, source: &'s mut dyn ByteSource) -> Self {
        Self {
            graph,
            cur: Cursor::new(source),
            depth: 0,
        }
    }

    /// Parses one document. On success the offset is the position just
    /// past the last byte belonging to the document.
    fn parse_document(mut self) -> Result<(NodeId, usize), JsonError> {
        let node = self.parse_value()?;
        Ok((node, self.cur.pos()))
    }

    fn parse_value(&mut self) -> Result<NodeId, JsonError> {
        self.cur.skip_whitespace();
        match self.cur.cur() {
            Some(open @ (b'[' | b'{')) => {
                if self.depth >= self.graph.limits.max_depth {
                    return Err(JsonError::DepthLimitExceeded);
                }
                self.depth += 1;
                let result = if open == b'[' {
                    self.parse_array()
                } else {
                    self.parse_object()
                };
                self.depth -= 1;
                result
            }
            Some(b'"') => {
                let text = scan_string(&mut self.cur)?;
                self.graph.alloc_leaf(Kind::String, text)
            }
            Some(b't') => self.literal(b"true", NodeId::TRUE),
            Some(b'f') => self.literal(b"false", NodeId::FALSE),
            Some(b'n') => self.literal(b"null", NodeId::NULL),
            _ => {
                let text = scan_number(&mut self.cur)?;
                self.graph.alloc_leaf(Kind::Number, text)
            }
        }
    }

    fn literal(&mut self, text: &'static [u8], node: NodeId) -> Result<NodeId, JsonError> {
        for &expected in text {
            if self.cur.cur() != Some(expected) {
                return fail_at(&self.cur);
            }
            self.cur.bump();
        }
        Ok(node)
    }

    fn parse_array(&mut self) -> Result<NodeId, JsonError> {
        self.cur.bump();
        let array = self.graph.new_value(Kind::Array, None)?;
        self.cur.skip_whitespace();
        if self.cur.cur() == Some(b']') {
            self.cur.bump();
            return Ok(array);
        }
        loop {
            match self.parse_value() {
                Ok(elem) => self.graph.adopt_append(array, elem),
                Err(e) => {
                    self.graph.release(array);
                    return Err(e);
                }
            }
            self.cur.skip_whitespace();
            match self.cur.cur() {
                Some(b',') => self.cur.bump(),
                Some(b']') => {
                    self.cur.bump();
                    return Ok(array);
                }
                _ => {
                    self.graph.release(array);
                    return fail_at(&self.cur);
                }
            }
        }
    }

    fn parse_object(&mut self) -> Result<NodeId, JsonError> {
        self.cur.bump();
        let object = self.graph.new_value(Kind::Object, None)?;
        self.cur.skip_whitespace();
        if self.cur.cur() == Some(b'}') {
            self.cur.bump();
            return Ok(object);
        }
        loop {
            self.cur.skip_whitespace();
            let key = match scan_string(&mut self.cur) {
                Ok(text) => match self.graph.alloc_leaf(Kind::String, text) {
                    Ok(key) => key,
                    Err(e) => {
                        self.graph.release(object);
                        return Err(e);
                    }
                },
                Err(e) => {
                    self.graph.release(object);
                    return Err(e);
                }
            };
            self.cur.skip_whitespace();
            if self.cur.cur() != Some(b':') {
                self.graph.release(key);
                self.graph.release(object);
                return fail_at(&self.cur);
            }
            self.cur.bump();
            let value = match self.parse_value() {
                Ok(value) => value,
                Err(e) => {
                    self.graph.release(key);
                    self.graph.release(object);
                    return Err(e);
                }
            };
            // Repeated keys from the source are kept verbatim; only the
            // key-based setter deduplicates.
            self.graph.adopt_append(object, key);
            self.graph.adopt_append(object, value);
            self.cur.skip_whitespace();
            match self.cur.cur() {
                Some(b',') => self.cur.bump(),
                Some(b'}') => {
                    self.cur.bump();
                    return Ok(object);
                }
                _ => {
                    self.graph.release(object);
                    return fail_at(&self.cur);
                }
            }
        }
    }
}

impl JsonGraph {
    /// Parses one document from a string.
    ///
    /// On success also returns the offset of the first byte that is not
    /// part of the document; the caller decides what leftover bytes
    /// mean. On failure the offset inside
    /// [`MalformedInput`](JsonError::MalformedInput) points at the
    /// offending byte.
    pub fn parse_str(&mut self, text: &str) -> Result<(NodeId, usize), JsonError> {
        self.parse_bytes(text.as_bytes())
    }

    /// [`parse_str`](JsonGraph::parse_str) over raw bytes.
    pub fn parse_bytes(&mut self, bytes: &[u8]) -> Result<(NodeId, usize), JsonError> {
        let mut source = SliceSource::new(bytes);
        Parser::new(self, &mut source).parse_document()
    }

    /// Parses one document from any pull source.
    pub fn parse_source(&mut self, source: &mut dyn ByteSource) -> Result<NodeId, JsonError> {
        Ok(Parser::new(self, source).parse_document()?.0)
    }

    /// Parses one document from an [`io::Read`] — an open file
    /// included. Read errors end the input like EOF.
    pub fn parse_reader<R: io::Read>(&mut self, reader: R) -> Result<NodeId, JsonError> {
        let mut source = ReadSource::new(reader);
        self.parse_source(&mut source)
    }
}
