//! Text printer for [`json-graph`](json_graph) value graphs.
//!
//! The printer walks a graph depth-first through the read-only
//! accessors only — it never mutates and works with any node, anchored
//! or not. Scalars emit their literal text; strings emit with `"` and
//! `\` escaped and every other byte passed through raw, so whatever the
//! parser stored round-trips byte-for-byte. With `indent == 0` no
//! whitespace is inserted at all; with `indent > 0` a newline and
//! `indent * depth` spaces precede each element and the closing
//! bracket.
//!
//! ```
//! use json_graph::JsonGraph;
//! use json_graph_print::print_to_string;
//!
//! let mut g = JsonGraph::new();
//! let (root, _) = g.parse_str("[ 1 , \"s\" ]").unwrap();
//! assert_eq!(print_to_string(&g, root, 0).unwrap(), r#"[1,"s"]"#);
//! ```

use std::io::{self, Write};

use json_graph::{JsonError, JsonGraph, Kind, NodeId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrintError {
    /// The sink refused a byte.
    #[error("sink error: {0}")]
    Sink(#[from] io::Error),
    /// The graph rejected a read (stale handle, mostly).
    #[error(transparent)]
    Graph(#[from] JsonError),
}

/// Byte sink the printer emits into.
pub trait Sink {
    fn put_byte(&mut self, byte: u8) -> io::Result<()>;
}

impl Sink for Vec<u8> {
    fn put_byte(&mut self, byte: u8) -> io::Result<()> {
        self.push(byte);
        Ok(())
    }
}

/// Discards output; useful to size a print without storing it.
#[derive(Debug, Default)]
pub struct CountingSink;

impl Sink for CountingSink {
    fn put_byte(&mut self, _byte: u8) -> io::Result<()> {
        Ok(())
    }
}

/// Adapts any [`io::Write`] (a file, a socket) as a sink.
#[derive(Debug)]
pub struct WriteSink<W: Write>(pub W);

impl<W: Write> Sink for WriteSink<W> {
    fn put_byte(&mut self, byte: u8) -> io::Result<()> {
        self.0.write_all(&[byte])
    }
}

struct Printer<'a, S: Sink> {
    graph: &'a JsonGraph,
    sink: &'a mut S,
    indent: usize,
    level: usize,
    written: usize,
}

impl<'a, S: Sink> Printer<'a, S> {
    fn put(&mut self, byte: u8) -> Result<(), PrintError> {
        self.sink.put_byte(byte)?;
        self.written += 1;
        Ok(())
    }

    fn put_all(&mut self, bytes: &[u8]) -> Result<(), PrintError> {
        for &byte in bytes {
            self.put(byte)?;
        }
        Ok(())
    }

    fn put_quoted(&mut self, bytes: &[u8]) -> Result<(), PrintError> {
        self.put(b'"')?;
        for &byte in bytes {
            if byte == b'"' || byte == b'\\' {
                self.put(b'\\')?;
            }
            self.put(byte)?;
        }
        self.put(b'"')
    }

    fn put_break(&mut self) -> Result<(), PrintError> {
        if self.indent == 0 {
            return Ok(());
        }
        self.put(b'\n')?;
        for _ in 0..self.level * self.indent {
            self.put(b' ')?;
        }
        Ok(())
    }

    fn print_node(&mut self, node: NodeId) -> Result<(), PrintError> {
        let kind = self.graph.kind(node)?;
        match kind {
            Kind::Null | Kind::True | Kind::False | Kind::Number => {
                let text = self.graph.text_raw(node)?;
                self.put_all(text)
            }
            Kind::String => {
                let text = self.graph.text_raw(node)?;
                self.put_quoted(text)
            }
            Kind::Array | Kind::Object => {
                let object = kind == Kind::Object;
                self.put(if object { b'{' } else { b'[' })?;
                self.level += 1;
                for i in 0..self.graph.size(node)? {
                    if i != 0 {
                        self.put(b',')?;
                    }
                    self.put_break()?;
                    if object {
                        let key = self.graph.key_at_raw(node, i)?;
                        self.put_quoted(key)?;
                        self.put(b':')?;
                    }
                    self.print_node(self.graph.child_at(node, i)?)?;
                }
                self.level -= 1;
                self.put_break()?;
                self.put(if object { b'}' } else { b']' })
            }
        }
    }
}

/// Prints `node` into `sink`, returning the number of bytes emitted.
/// `indent == 0` is the compact canonical form.
pub fn print<S: Sink>(
    graph: &JsonGraph,
    node: NodeId,
    indent: usize,
    sink: &mut S,
) -> Result<usize, PrintError> {
    let mut printer = Printer {
        graph,
        sink,
        indent,
        level: 0,
        written: 0,
    };
    printer.print_node(node)?;
    Ok(printer.written)
}

/// Prints into a fresh byte buffer.
pub fn print_to_vec(graph: &JsonGraph, node: NodeId, indent: usize) -> Result<Vec<u8>, PrintError> {
    let mut out = Vec::new();
    print(graph, node, indent, &mut out)?;
    Ok(out)
}

/// Prints into a `String`; fails with [`JsonError::NotUtf8`] when a
/// string payload is not valid UTF-8.
pub fn print_to_string(
    graph: &JsonGraph,
    node: NodeId,
    indent: usize,
) -> Result<String, PrintError> {
    let out = print_to_vec(graph, node, indent)?;
    String::from_utf8(out).map_err(|_| PrintError::Graph(JsonError::NotUtf8))
}

/// Size of a print without producing it.
pub fn printed_len(graph: &JsonGraph, node: NodeId, indent: usize) -> Result<usize, PrintError> {
    print(graph, node, indent, &mut CountingSink)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(text: &str) -> (JsonGraph, NodeId) {
        let mut g = JsonGraph::new();
        let (node, _) = g.parse_str(text).unwrap();
        (g, node)
    }

    #[test]
    fn compact_form_has_no_whitespace() {
        let (g, node) = parsed("{ \"a\" : [ 1 , true , null ] }");
        assert_eq!(
            print_to_string(&g, node, 0).unwrap(),
            r#"{"a":[1,true,null]}"#
        );
    }

    #[test]
    fn scalars_print_their_literal_text() {
        for text in ["null", "true", "false", "-12.5e3", "0"] {
            let (g, node) = parsed(text);
            assert_eq!(print_to_string(&g, node, 0).unwrap(), text);
        }
    }

    #[test]
    fn strings_escape_only_quote_and_backslash() {
        let (g, node) = parsed(r#""a\"b\\c\/d\n""#);
        // The parsed newline prints raw; the slash lost its escape.
        assert_eq!(print_to_string(&g, node, 0).unwrap(), "\"a\\\"b\\\\c/d\n\"");
    }

    #[test]
    fn indent_form_breaks_before_elements_and_close() {
        let (g, node) = parsed("[1,[2],{}]");
        assert_eq!(
            print_to_string(&g, node, 2).unwrap(),
            "[\n  1,\n  [\n    2\n  ],\n  {\n  }\n]"
        );
    }

    #[test]
    fn object_keys_keep_colon_tight() {
        let (g, node) = parsed(r#"{"k":1}"#);
        assert_eq!(print_to_string(&g, node, 1).unwrap(), "{\n \"k\":1\n}");
    }

    #[test]
    fn byte_count_matches_output() {
        let (g, node) = parsed(r#"{"a":[1,2,3],"b":"x"}"#);
        for indent in [0, 2, 4] {
            let out = print_to_vec(&g, node, indent).unwrap();
            assert_eq!(printed_len(&g, node, indent).unwrap(), out.len());
        }
    }

    #[test]
    fn sink_failure_aborts() {
        struct FullSink;
        impl Sink for FullSink {
            fn put_byte(&mut self, _byte: u8) -> io::Result<()> {
                Err(io::Error::new(io::ErrorKind::WriteZero, "full"))
            }
        }
        let (g, node) = parsed("[1]");
        assert!(matches!(
            print(&g, node, 0, &mut FullSink),
            Err(PrintError::Sink(_))
        ));
    }

    #[test]
    fn write_sink_adapts_io_write() {
        let (g, node) = parsed("[1,2]");
        let mut sink = WriteSink(Vec::new());
        let n = print(&g, node, 0, &mut sink).unwrap();
        assert_eq!(sink.0, b"[1,2]");
        assert_eq!(n, 5);
    }

    #[test]
    fn non_utf8_payload_fails_string_output_only() {
        let mut g = JsonGraph::new();
        let (node, _) = g.parse_str(r#""\ud834""#).unwrap();
        let bytes = print_to_vec(&g, node, 0).unwrap();
        assert_eq!(bytes, [b'"', 0xed, 0xa0, 0xb4, b'"']);
        assert!(matches!(
            print_to_string(&g, node, 0),
            Err(PrintError::Graph(JsonError::NotUtf8))
        ));
    }
}
