//! `serde_json` interop.
//!
//! The graph keeps more than `serde_json::Value` can express (verbatim
//! number text, duplicate keys, non-UTF-8 string payloads), so `view`
//! is a best-effort projection; `build` is exact.

use serde_json::{Map, Number, Value};

use crate::error::JsonError;
use crate::graph::JsonGraph;
use crate::node::{Kind, NodeId};

/// Renders a node as a `serde_json::Value`.
///
/// Numbers become `serde_json::Number` when the text is representable,
/// otherwise the source text is kept as a string. String payloads are
/// decoded lossily. Duplicate object keys collapse to the first
/// occurrence, agreeing with
/// [`child_by_key`](JsonGraph::child_by_key).
pub fn view(graph: &JsonGraph, node: NodeId) -> Result<Value, JsonError> {
    Ok(match graph.kind(node)? {
        Kind::Null => Value::Null,
        Kind::True => Value::Bool(true),
        Kind::False => Value::Bool(false),
        Kind::Number => {
            let text = String::from_utf8_lossy(graph.text_raw(node)?).into_owned();
            match text.parse::<Number>() {
                Ok(number) => Value::Number(number),
                Err(_) => Value::String(text),
            }
        }
        Kind::String => {
            Value::String(String::from_utf8_lossy(graph.text_raw(node)?).into_owned())
        }
        Kind::Array => {
            let size = graph.size(node)?;
            let mut items = Vec::with_capacity(size);
            for i in 0..size {
                items.push(view(graph, graph.child_at(node, i)?)?);
            }
            Value::Array(items)
        }
        Kind::Object => {
            let mut map = Map::new();
            for i in 0..graph.size(node)? {
                let key = String::from_utf8_lossy(graph.key_at_raw(node, i)?).into_owned();
                if !map.contains_key(&key) {
                    let value = view(graph, graph.child_at(node, i)?)?;
                    map.insert(key, value);
                }
            }
            Value::Object(map)
        }
    })
}

/// Builds a graph value from a `serde_json::Value`. Fails only when the
/// node budget runs out, releasing everything built so far.
pub fn build(graph: &mut JsonGraph, value: &Value) -> Result<NodeId, JsonError> {
    match value {
        Value::Null => Ok(NodeId::NULL),
        Value::Bool(true) => Ok(NodeId::TRUE),
        Value::Bool(false) => Ok(NodeId::FALSE),
        Value::Number(number) => graph.new_value(Kind::Number, Some(&number.to_string())),
        Value::String(text) => graph.new_value(Kind::String, Some(text)),
        Value::Array(items) => {
            let array = graph.new_value(Kind::Array, None)?;
            for item in items {
                match build(graph, item) {
                    Ok(child) => graph.adopt_append(array, child),
                    Err(e) => {
                        graph.release(array);
                        return Err(e);
                    }
                }
            }
            Ok(array)
        }
        Value::Object(map) => {
            let object = graph.new_value(Kind::Object, None)?;
            for (key, item) in map {
                let key_node = match graph.new_value(Kind::String, Some(key)) {
                    Ok(key_node) => key_node,
                    Err(e) => {
                        graph.release(object);
                        return Err(e);
                    }
                };
                match build(graph, item) {
                    Ok(child) => {
                        graph.adopt_append(object, key_node);
                        graph.adopt_append(object, child);
                    }
                    Err(e) => {
                        graph.release(key_node);
                        graph.release(object);
                        return Err(e);
                    }
                }
            }
            Ok(object)
        }
    }
}
