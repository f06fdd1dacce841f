//! Mutation engine: install with adopt-or-copy and cycle resolution.
//!
//! Installing an element into a container follows one rule everywhere:
//! an argument that already has a parent, or whose subtree reaches the
//! destination, is deep copied first; anything else is adopted as-is.
//! The reachability walk is the only place true cycles are prevented, so
//! it runs before every adopt decision.

use std::mem;

use crate::error::JsonError;
use crate::graph::JsonGraph;
use crate::node::{Kind, NodeId, Repr};

enum Payload {
    Value(Kind),
    Leaf(Kind, Box<[u8]>),
    Container { adopt: bool },
}

impl JsonGraph {
    /// Depth-first walk over `from`'s subtree: does it contain `target`
    /// (or equal it)? Containers form a tree, so no visited set is
    /// needed and the walk is bounded by the subtree size.
    fn reaches(&self, from: NodeId, target: NodeId) -> bool {
        let mut stack = vec![from];
        while let Some(node) = stack.pop() {
            if node == target {
                return true;
            }
            if let Ok(body) = self.body(node) {
                if let Repr::Array(children) | Repr::Object(children) = &body.repr {
                    stack.extend_from_slice(children);
                }
            }
        }
        false
    }

    /// Adopt-or-copy resolution for installing `elem` under `container`.
    fn resolve_install(&mut self, container: NodeId, elem: NodeId) -> Result<NodeId, JsonError> {
        if elem.is_sentinel() {
            return Ok(elem);
        }
        let anchored = self.body(elem)?.has_parent;
        if anchored || self.reaches(elem, container) {
            self.copy(elem)
        } else {
            Ok(elem)
        }
    }

    /// Stores `elem` into flat slot `slot`, appending when `slot` is one
    /// past the end. The previous occupant is released after the store.
    fn install_at_slot(
        &mut self,
        container: NodeId,
        elem: NodeId,
        slot: usize,
    ) -> Result<(), JsonError> {
        let old = {
            let body = self.body_mut(container)?;
            match &mut body.repr {
                Repr::Array(children) | Repr::Object(children) => {
                    if slot == children.len() {
                        children.push(elem);
                        None
                    } else {
                        Some(mem::replace(&mut children[slot], elem))
                    }
                }
                _ => return Err(JsonError::NotApplicable { kind: body.kind() }),
            }
        };
        self.mark_anchored(elem);
        if let Some(old) = old {
            self.slot_release(old);
        }
        Ok(())
    }

    /// Installs `elem` at `index`.
    ///
    /// Arrays accept `0..=size`, where `index == size` appends. Objects
    /// accept `0..size` and replace the value of the `index`-th pair.
    pub fn set_by_index(
        &mut self,
        container: NodeId,
        elem: NodeId,
        index: usize,
    ) -> Result<(), JsonError> {
        self.body(elem)?;
        let body = self.body(container)?;
        let slot = match &body.repr {
            Repr::Array(children) => {
                if index > children.len() {
                    return Err(JsonError::OutOfRange {
                        index,
                        size: children.len(),
                    });
                }
                index
            }
            Repr::Object(children) => match index
                .checked_mul(2)
                .and_then(|slot| slot.checked_add(1))
            {
                Some(slot) if slot < children.len() => slot,
                _ => {
                    return Err(JsonError::OutOfRange {
                        index,
                        size: children.len() / 2,
                    })
                }
            },
            _ => return Err(JsonError::NotApplicable { kind: body.kind() }),
        };
        let installed = self.resolve_install(container, elem)?;
        self.install_at_slot(container, installed, slot)
    }

    /// Installs `elem` under `key`. Objects only.
    ///
    /// The first pair with a matching key has its value replaced in
    /// place; otherwise a fresh `(key, elem)` pair is appended. The key
    /// node is always newly constructed, never shared with the caller.
    pub fn set_by_key(
        &mut self,
        container: NodeId,
        elem: NodeId,
        key: &str,
    ) -> Result<(), JsonError> {
        self.body(elem)?;
        let body = self.body(container)?;
        let children = match &body.repr {
            Repr::Object(children) => children,
            _ => return Err(JsonError::NotApplicable { kind: body.kind() }),
        };
        let mut existing = None;
        for (i, pair) in children.chunks_exact(2).enumerate() {
            if self.text_raw(pair[0])? == key.as_bytes() {
                existing = Some(i * 2 + 1);
                break;
            }
        }
        if let Some(slot) = existing {
            let installed = self.resolve_install(container, elem)?;
            return self.install_at_slot(container, installed, slot);
        }
        let key_node = self.alloc_leaf(Kind::String, key.as_bytes().to_vec())?;
        let installed = match self.resolve_install(container, elem) {
            Ok(id) => id,
            Err(e) => {
                self.release(key_node);
                return Err(e);
            }
        };
        if let Ok(body) = self.body_mut(container) {
            if let Repr::Object(children) = &mut body.repr {
                children.push(key_node);
                children.push(installed);
            }
        }
        self.mark_anchored(key_node);
        self.mark_anchored(installed);
        Ok(())
    }

    /// Whole-value replace: `target` takes on
    /// `source`'s value in place, keeping its own identity and
    /// anchoredness, so a parent holding `target` observes the new value
    /// at the same slot.
    ///
    /// `source` goes through the usual copy-or-adopt rule. An adopted
    /// unanchored container is consumed — its handle goes stale, its
    /// children now belong to `target`. Leaves and sentinels leave
    /// `source` untouched. Sentinels and leaves shared by several
    /// parents cannot be replaced in place (`NotApplicable`), since the
    /// change would leak into unrelated structures.
    pub fn replace(&mut self, target: NodeId, source: NodeId) -> Result<(), JsonError> {
        if target.is_sentinel() {
            return Err(JsonError::NotApplicable {
                kind: self.kind(target)?,
            });
        }
        if let Repr::Leaf { shares, .. } = &self.body(target)?.repr {
            if *shares > 1 {
                return Err(JsonError::NotApplicable {
                    kind: self.kind(target)?,
                });
            }
        }
        if source == target {
            return Ok(());
        }
        let new_repr = if source.is_sentinel() {
            Repr::Value(self.kind(source)?)
        } else {
            let payload = {
                let body = self.body(source)?;
                match &body.repr {
                    Repr::Value(kind) => Payload::Value(*kind),
                    Repr::Leaf { kind, text, .. } => Payload::Leaf(*kind, text.clone()),
                    Repr::Array(_) | Repr::Object(_) => Payload::Container {
                        adopt: !body.has_parent,
                    },
                }
            };
            match payload {
                Payload::Value(kind) => Repr::Value(kind),
                Payload::Leaf(kind, text) => Repr::Leaf {
                    kind,
                    text,
                    shares: 1,
                },
                Payload::Container { adopt } => {
                    let adopt = adopt && !self.reaches(source, target);
                    let donor = if adopt { source } else { self.copy(source)? };
                    match self.retire(donor.index) {
                        Some(body) => body.repr,
                        None => return Err(JsonError::StaleHandle),
                    }
                }
            }
        };
        let old_repr = {
            let body = self.body_mut(target)?;
            mem::replace(&mut body.repr, new_repr)
        };
        if let Repr::Array(children) | Repr::Object(children) = old_repr {
            for child in children {
                self.slot_release(child);
            }
        }
        Ok(())
    }

    /// Parser-only append: the child is freshly built, unowned and
    /// acyclic by construction, so the adopt decision is skipped.
    pub(crate) fn adopt_append(&mut self, container: NodeId, child: NodeId) {
        if let Ok(body) = self.body_mut(container) {
            if let Repr::Array(children) | Repr::Object(children) = &mut body.repr {
                children.push(child);
            }
        }
        self.mark_anchored(child);
    }
}
