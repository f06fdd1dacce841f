//! Printed-form checks for the ownership protocol: self-insertion
//! snapshots, shared subgraphs expanding into independent trees, copy
//! independence.

use json_graph::{JsonGraph, NodeId};
use json_graph_print::print_to_string;

fn parsed(g: &mut JsonGraph, text: &str) -> NodeId {
    g.parse_str(text).expect("fixture must parse").0
}

fn printed(g: &JsonGraph, node: NodeId) -> String {
    print_to_string(g, node, 0).unwrap()
}

#[test]
fn self_insert_prints_one_extra_level() {
    let mut g = JsonGraph::new();
    let root = parsed(&mut g, "[]");
    g.set_by_index(root, root, 0).unwrap();
    assert_eq!(printed(&g, root), "[[]]");
}

#[test]
fn self_insert_with_null_prints_the_snapshot() {
    let mut g = JsonGraph::new();
    for (input, expected) in [
        ("[null]", "[[null]]"),
        ("[[]]", "[[[]]]"),
        ("[[null]]", "[[[null]]]"),
    ] {
        let root = parsed(&mut g, input);
        g.set_by_index(root, root, 0).unwrap();
        assert_eq!(printed(&g, root), expected, "for input {input:?}");
        g.release(root);
    }
}

#[test]
fn double_self_insert_prints_both_snapshots() {
    let mut g = JsonGraph::new();
    let root = parsed(&mut g, "[null]");
    g.set_by_index(root, root, 1).unwrap();
    g.set_by_index(root, root, 2).unwrap();
    assert_eq!(printed(&g, root), "[null,[null],[null,[null]]]");
}

#[test]
fn insert_into_own_descendant_prints_the_nested_snapshot() {
    let mut g = JsonGraph::new();
    let root = parsed(&mut g, "[[null]]");
    let inner = g.child_at(root, 0).unwrap();
    g.set_by_index(inner, root, 0).unwrap();
    assert_eq!(printed(&g, root), "[[[[null]]]]");
}

#[test]
fn copy_independence_shows_in_printed_form() {
    let mut g = JsonGraph::new();
    let a = parsed(&mut g, "[1]");
    let b = g.copy(a).unwrap();
    let before = printed(&g, b);
    let two = parsed(&mut g, "2");
    g.set_by_index(a, two, 0).unwrap();
    assert_eq!(printed(&g, a), "[2]");
    assert_eq!(printed(&g, b), before);
}

#[test]
fn borrowed_release_does_not_change_the_print() {
    let mut g = JsonGraph::new();
    let root = parsed(&mut g, "[[123]]");
    let child = g.child_at(root, 0).unwrap();
    g.release(child);
    assert_eq!(printed(&g, root), "[[123]]");
}

const NODE6: &str = "[6]";
const NODE5: &str = "[5,[6]]";
const NODE4: &str = "[4,[5,[6]]]";
const NODE3: &str = "[3,[5,[6]],[6]]";
const NODE2: &str = "[2,[4,[5,[6]]],[5,[6]]]";
const NODE1: &str = "[1,[2,[4,[5,[6]]],[5,[6]]],[3,[5,[6]],[6]],[5,[6]]]";

/// Builds the six-node diamond: later installs of already-anchored
/// nodes copy, so every handle prints as its own expanded tree.
///
/// ```text
/// 1 -> 2, 3, 5
/// 2 -> 4, 5
/// 3 -> 5, 6
/// 4 -> 5
/// 5 -> 6
/// ```
fn build_diamond(g: &mut JsonGraph) -> NodeId {
    let node1 = parsed(g, "[1]");
    let node2 = parsed(g, "[2]");
    let node3 = parsed(g, "[3]");
    let node4 = parsed(g, "[4]");
    let node5 = parsed(g, "[5]");
    let node6 = parsed(g, "[6]");
    g.set_by_index(node5, node6, 1).unwrap();
    g.set_by_index(node4, node5, 1).unwrap();
    g.set_by_index(node2, node4, 1).unwrap();
    g.set_by_index(node2, node5, 2).unwrap();
    g.set_by_index(node3, node5, 1).unwrap();
    g.set_by_index(node3, node6, 2).unwrap();
    g.set_by_index(node1, node2, 1).unwrap();
    g.set_by_index(node1, node3, 2).unwrap();
    g.set_by_index(node1, node5, 3).unwrap();

    assert_eq!(printed(g, node6), NODE6);
    assert_eq!(printed(g, node5), NODE5);
    assert_eq!(printed(g, node4), NODE4);
    assert_eq!(printed(g, node3), NODE3);
    assert_eq!(printed(g, node2), NODE2);
    assert_eq!(printed(g, node1), NODE1);

    // All of these are anchored by now; releasing the handles is a
    // no-op and the full tree keeps printing the same.
    for node in [node2, node3, node4, node5, node6] {
        g.release(node);
    }
    assert_eq!(printed(g, node1), NODE1);
    node1
}

#[test]
fn diamond_expands_into_independent_trees() {
    let mut g = JsonGraph::new();
    build_diamond(&mut g);
}

#[test]
fn diamond_copy_prints_identically() {
    let mut g = JsonGraph::new();
    let node1 = build_diamond(&mut g);
    let copy = g.copy(node1).unwrap();
    assert_eq!(printed(&g, copy), NODE1);
    g.release(copy);
    assert_eq!(printed(&g, node1), NODE1);
}

#[test]
fn diamond_self_insert_replaces_one_branch_with_the_snapshot() {
    for (index, expected) in [
        (1, format!("[1,{NODE1},{NODE3},{NODE5}]")),
        (2, format!("[1,{NODE2},{NODE1},{NODE5}]")),
        (3, format!("[1,{NODE2},{NODE3},{NODE1}]")),
    ] {
        let mut g = JsonGraph::new();
        let node1 = build_diamond(&mut g);
        let node = g.copy(node1).unwrap();
        g.set_by_index(node, node, index).unwrap();
        assert_eq!(printed(&g, node), expected, "insert at {index}");
        // The original is untouched by mutating its copy.
        assert_eq!(printed(&g, node1), NODE1);
    }
}
