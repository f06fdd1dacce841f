//! JSON value graphs with an explicit ownership protocol.
//!
//! A [`JsonGraph`] is an arena of JSON nodes: immortal `null`/`true`/
//! `false` sentinels, immutable `Number`/`String` leaves shared between
//! parents by a share count, and mutable `Array`/`Object` containers
//! exclusively owned by at most one parent. Installing a node that
//! already has a parent — or that would close a cycle — deep copies the
//! argument instead, so the live graph is always finite and acyclic.
//!
//! Parsing is a recursive-descent reader over a pull [`ByteSource`]
//! that assembles values through the cheap adopt path and releases every
//! partially built node on failure. Numbers are kept as their source
//! text; strings carry raw bytes.
//!
//! ```
//! use json_graph::{JsonGraph, Kind};
//!
//! let mut g = JsonGraph::new();
//! let (root, _) = g.parse_str(r#"{"items":[1,2]}"#).unwrap();
//! let items = g.child_by_key(root, "items").unwrap();
//! let three = g.new_value(Kind::Number, Some("3")).unwrap();
//! g.set_by_index(items, three, 2).unwrap();
//! assert_eq!(g.size(items).unwrap(), 3);
//! ```

pub mod error;
pub mod graph;
pub mod limits;
pub mod node;
mod ops;
mod parse;
pub mod source;
pub mod view;

pub use error::JsonError;
pub use graph::JsonGraph;
pub use limits::Limits;
pub use node::{Kind, NodeId};
pub use source::{ByteSource, ReadSource, SliceSource};

/// Returns the crate version at compile time.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
