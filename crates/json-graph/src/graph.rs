//! The value-graph arena.
//!
//! Nodes live in a slot vector addressed by [`NodeId`]; freed slots go to
//! a free list and bump a generation counter, so a handle that outlives
//! its node reports [`JsonError::StaleHandle`] instead of dangling.
//!
//! Ownership protocol:
//!
//! - `null`/`true`/`false` are immortal sentinels with no bookkeeping.
//! - `Number`/`String` leaves are immutable and may be shared by many
//!   parents; a `shares` count tracks the owners.
//! - `Array`/`Object` containers are mutable in place and exclusively
//!   owned by at most one installing parent (`has_parent`).

use std::str;

use crate::error::JsonError;
use crate::limits::Limits;
use crate::node::{Body, Kind, NodeId, Repr, Slot};
use crate::parse;

/// Arena holding one or more JSON value graphs.
///
/// All nodes — including roots obtained from separate parses — share one
/// arena, so values from different documents can be installed into each
/// other freely.
pub struct JsonGraph {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
    pub(crate) limits: Limits,
}

impl JsonGraph {
    pub fn new() -> Self {
        Self::with_limits(Limits::default())
    }

    pub fn with_limits(limits: Limits) -> Self {
        let sentinel = |kind| Slot {
            gen: 0,
            body: Some(Body {
                has_parent: false,
                repr: Repr::Value(kind),
            }),
        };
        Self {
            slots: vec![
                sentinel(Kind::Null),
                sentinel(Kind::True),
                sentinel(Kind::False),
            ],
            free: Vec::new(),
            live: 0,
            limits,
        }
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// Sets the remaining node-allocation budget; `None` lifts it.
    pub fn set_node_budget(&mut self, budget: Option<u64>) {
        self.limits.node_budget = budget;
    }

    /// Number of occupied non-sentinel slots. The leak observable: any
    /// failed operation must leave this unchanged.
    pub fn live_nodes(&self) -> usize {
        self.live
    }

    // -----------------------------------------------------------------
    // Slot management
    // -----------------------------------------------------------------

    fn charge(&mut self) -> Result<(), JsonError> {
        match &mut self.limits.node_budget {
            Some(0) => Err(JsonError::AllocationFailure),
            Some(remaining) => {
                *remaining -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }

    pub(crate) fn alloc(&mut self, repr: Repr) -> Result<NodeId, JsonError> {
        self.charge()?;
        let body = Body {
            has_parent: false,
            repr,
        };
        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.body = Some(body);
                NodeId {
                    index,
                    gen: slot.gen,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    gen: 0,
                    body: Some(body),
                });
                NodeId { index, gen: 0 }
            }
        };
        self.live += 1;
        Ok(id)
    }

    pub(crate) fn alloc_leaf(&mut self, kind: Kind, text: Vec<u8>) -> Result<NodeId, JsonError> {
        self.alloc(Repr::Leaf {
            kind,
            text: text.into_boxed_slice(),
            shares: 1,
        })
    }

    /// Frees a slot and returns its body. Sentinels are never retired.
    pub(crate) fn retire(&mut self, index: u32) -> Option<Body> {
        let slot = self.slots.get_mut(index as usize)?;
        let body = slot.body.take()?;
        slot.gen = slot.gen.wrapping_add(1);
        self.free.push(index);
        self.live -= 1;
        Some(body)
    }

    pub(crate) fn body(&self, id: NodeId) -> Result<&Body, JsonError> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.gen == id.gen)
            .and_then(|slot| slot.body.as_ref())
            .ok_or(JsonError::StaleHandle)
    }

    pub(crate) fn body_mut(&mut self, id: NodeId) -> Result<&mut Body, JsonError> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.gen == id.gen)
            .and_then(|slot| slot.body.as_mut())
            .ok_or(JsonError::StaleHandle)
    }

    pub(crate) fn mark_anchored(&mut self, id: NodeId) {
        if id.is_sentinel() {
            return;
        }
        if let Ok(body) = self.body_mut(id) {
            body.has_parent = true;
        }
    }

    // -----------------------------------------------------------------
    // Construction, copy, release
    // -----------------------------------------------------------------

    /// Builds a fresh node of `kind`.
    ///
    /// Sentinel kinds return their sentinel and ignore `text`. `Number`
    /// text must satisfy the number grammar and defaults to `"0"`;
    /// `String` defaults to `""`. Containers start empty and reject text.
    pub fn new_value(&mut self, kind: Kind, text: Option<&str>) -> Result<NodeId, JsonError> {
        match kind {
            Kind::Null => Ok(NodeId::NULL),
            Kind::True => Ok(NodeId::TRUE),
            Kind::False => Ok(NodeId::FALSE),
            Kind::Number => {
                let text = text.unwrap_or("0");
                if !parse::is_valid_number(text.as_bytes()) {
                    return Err(JsonError::BadNumber);
                }
                self.alloc_leaf(Kind::Number, text.as_bytes().to_vec())
            }
            Kind::String => {
                let text = text.unwrap_or("");
                self.alloc_leaf(Kind::String, text.as_bytes().to_vec())
            }
            Kind::Array | Kind::Object => {
                if text.is_some() {
                    return Err(JsonError::NotApplicable { kind });
                }
                self.alloc(match kind {
                    Kind::Array => Repr::Array(Vec::new()),
                    _ => Repr::Object(Vec::new()),
                })
            }
        }
    }

    /// Copies a node.
    ///
    /// Sentinels return themselves. Leaves are never duplicated: the
    /// share count goes up and the same node comes back. Containers get
    /// a fresh container per level, with every child run through this
    /// same `copy` — so the copy shares no container with the original
    /// but may share its leaves.
    pub fn copy(&mut self, node: NodeId) -> Result<NodeId, JsonError> {
        if node.is_sentinel() {
            return Ok(node);
        }
        let plan = match &self.body(node)?.repr {
            Repr::Value(Kind::True) => return Ok(NodeId::TRUE),
            Repr::Value(Kind::False) => return Ok(NodeId::FALSE),
            Repr::Value(_) => return Ok(NodeId::NULL),
            Repr::Leaf { .. } => None,
            Repr::Array(children) => Some((false, children.clone())),
            Repr::Object(children) => Some((true, children.clone())),
        };
        let Some((is_object, children)) = plan else {
            if let Repr::Leaf { shares, .. } = &mut self.body_mut(node)?.repr {
                *shares += 1;
            }
            return Ok(node);
        };
        let id = self.alloc(if is_object {
            Repr::Object(Vec::new())
        } else {
            Repr::Array(Vec::new())
        })?;
        let mut copied = Vec::with_capacity(children.len());
        for child in children {
            match self.copy(child) {
                Ok(c) => copied.push(c),
                Err(e) => {
                    for c in copied {
                        self.slot_release(c);
                    }
                    self.retire(id.index);
                    return Err(e);
                }
            }
        }
        for &c in &copied {
            self.mark_anchored(c);
        }
        match &mut self.body_mut(id)?.repr {
            Repr::Array(slots) | Repr::Object(slots) => *slots = copied,
            _ => {}
        }
        Ok(id)
    }

    /// Releases an owned handle.
    ///
    /// No-op for sentinels, stale handles, and anchored nodes (a handle
    /// to an anchored node is borrowed; only its owning container frees
    /// it). Otherwise leaves lose one share and containers tear down
    /// recursively.
    pub fn release(&mut self, node: NodeId) {
        if node.is_sentinel() {
            return;
        }
        let Ok(body) = self.body(node) else { return };
        if body.has_parent {
            return;
        }
        self.slot_release(node);
    }

    /// Drops one ownership claim regardless of anchoredness — the path a
    /// container takes when a child slot is overwritten or the container
    /// itself is torn down.
    pub(crate) fn slot_release(&mut self, node: NodeId) {
        if node.is_sentinel() {
            return;
        }
        let Ok(body) = self.body_mut(node) else { return };
        if let Repr::Leaf { shares, .. } = &mut body.repr {
            *shares -= 1;
            if *shares > 0 {
                return;
            }
        }
        if let Some(Body {
            repr: Repr::Array(children) | Repr::Object(children),
            ..
        }) = self.retire(node.index)
        {
            for child in children {
                self.slot_release(child);
            }
        }
    }

    // -----------------------------------------------------------------
    // Read accessors
    // -----------------------------------------------------------------

    pub fn kind(&self, node: NodeId) -> Result<Kind, JsonError> {
        Ok(self.body(node)?.kind())
    }

    /// Literal text for value-like nodes, stored payload for leaves.
    /// Payloads are raw bytes; see [`JsonGraph::text`] for the UTF-8
    /// view.
    pub fn text_raw(&self, node: NodeId) -> Result<&[u8], JsonError> {
        let body = self.body(node)?;
        match &body.repr {
            Repr::Value(kind) => Ok(kind.as_str().as_bytes()),
            Repr::Leaf { text, .. } => Ok(text),
            Repr::Array(_) | Repr::Object(_) => Err(JsonError::NotApplicable { kind: body.kind() }),
        }
    }

    pub fn text(&self, node: NodeId) -> Result<&str, JsonError> {
        str::from_utf8(self.text_raw(node)?).map_err(|_| JsonError::NotUtf8)
    }

    /// Element count for arrays, pair count for objects.
    pub fn size(&self, node: NodeId) -> Result<usize, JsonError> {
        let body = self.body(node)?;
        match &body.repr {
            Repr::Array(children) => Ok(children.len()),
            Repr::Object(children) => Ok(children.len() / 2),
            _ => Err(JsonError::NotApplicable { kind: body.kind() }),
        }
    }

    /// The `index`-th array element, or the value of the `index`-th
    /// object pair. The result is a borrowed handle: releasing it has no
    /// effect while the node stays anchored.
    pub fn child_at(&self, node: NodeId, index: usize) -> Result<NodeId, JsonError> {
        let body = self.body(node)?;
        match &body.repr {
            Repr::Array(children) => children.get(index).copied().ok_or(JsonError::OutOfRange {
                index,
                size: children.len(),
            }),
            Repr::Object(children) => index
                .checked_mul(2)
                .and_then(|slot| slot.checked_add(1))
                .and_then(|slot| children.get(slot))
                .copied()
                .ok_or(JsonError::OutOfRange {
                    index,
                    size: children.len() / 2,
                }),
            _ => Err(JsonError::NotApplicable { kind: body.kind() }),
        }
    }

    /// Raw text of the `index`-th object key.
    pub fn key_at_raw(&self, node: NodeId, index: usize) -> Result<&[u8], JsonError> {
        let body = self.body(node)?;
        match &body.repr {
            Repr::Object(children) => {
                let key = index
                    .checked_mul(2)
                    .and_then(|slot| children.get(slot))
                    .copied()
                    .ok_or(JsonError::OutOfRange {
                        index,
                        size: children.len() / 2,
                    })?;
                self.text_raw(key)
            }
            _ => Err(JsonError::NotApplicable { kind: body.kind() }),
        }
    }

    pub fn key_at(&self, node: NodeId, index: usize) -> Result<&str, JsonError> {
        str::from_utf8(self.key_at_raw(node, index)?).map_err(|_| JsonError::NotUtf8)
    }

    /// First-match key lookup, in storage order. Later duplicates of the
    /// same key are unreachable through this accessor but survive in the
    /// pair slots.
    pub fn child_by_key(&self, node: NodeId, key: &str) -> Result<NodeId, JsonError> {
        let body = self.body(node)?;
        match &body.repr {
            Repr::Object(children) => {
                for pair in children.chunks_exact(2) {
                    if self.text_raw(pair[0])? == key.as_bytes() {
                        return Ok(pair[1]);
                    }
                }
                Err(JsonError::NotFound)
            }
            _ => Err(JsonError::NotApplicable { kind: body.kind() }),
        }
    }
}

impl Default for JsonGraph {
    fn default() -> Self {
        Self::new()
    }
}
