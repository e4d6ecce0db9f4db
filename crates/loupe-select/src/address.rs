//! Structural addressing
//!
//! Positional paths and short stable identifiers for elements. Paths are
//! pure functions of the current tree shape; they are recomputed on demand
//! and never cached across mutations.

use loupe_dom::{DomTree, NodeId};

const ID_WIDTH: usize = 6;
const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Structural path of an element from the document root
///
/// Each step is `tag[n]` where `n` is the 1-based index among preceding
/// siblings sharing the tag, e.g. `/html[1]/body[1]/div[2]/p[1]`.
/// Returns `None` for non-element nodes.
pub fn node_path(tree: &DomTree, id: NodeId) -> Option<String> {
    tree.as_element(id)?;

    let mut steps = Vec::new();
    let mut current = id;
    loop {
        let elem = match tree.as_element(current) {
            Some(e) => e,
            // Reached the document node (or a detached non-element host)
            None => break,
        };
        steps.push(format!("{}[{}]", elem.tag, same_tag_index(tree, current)));
        match tree.get(current).and_then(|n| n.parent) {
            Some(parent) => current = parent,
            None => break,
        }
    }

    steps.reverse();
    let mut path = String::new();
    for step in &steps {
        path.push('/');
        path.push_str(step);
    }
    Some(path)
}

/// 1-based index of an element among preceding same-tag siblings
fn same_tag_index(tree: &DomTree, id: NodeId) -> usize {
    let tag = tree.tag_name(id).unwrap_or_default().to_string();
    let mut index = 1;
    let mut prev = tree.get(id).and_then(|n| n.prev_sibling);
    while let Some(p) = prev {
        if tree.tag_name(p) == Some(tag.as_str()) {
            index += 1;
        }
        prev = tree.get(p).and_then(|n| n.prev_sibling);
    }
    index
}

/// Stable identifier for a structural path
///
/// Rolling djb2-xor hash (`h = h*33 ^ c`) over the path, truncated to u32,
/// base-36 encoded, zero-padded to 6 characters. Identical paths always
/// produce identical identifiers; distinct paths can collide and no
/// disambiguation is attempted (accepted risk).
pub fn stable_id(path: &str) -> Option<String> {
    if path.is_empty() {
        return None;
    }

    let mut hash: u32 = 5381;
    for c in path.chars() {
        hash = hash.wrapping_mul(33) ^ (c as u32);
    }
    Some(base36(hash))
}

fn base36(mut value: u32) -> String {
    let mut digits = [b'0'; ID_WIDTH];
    let mut i = ID_WIDTH;
    while value > 0 && i > 0 {
        i -= 1;
        digits[i] = BASE36[(value % 36) as usize];
        value /= 36;
    }
    String::from_utf8_lossy(&digits).into_owned()
}

/// Resolve a structural path back to a live element
///
/// Positional tree-walk equivalent of an XPath query. Returns `None` when
/// the addressed subtree no longer exists; malformed paths are logged and
/// also yield `None` rather than failing.
pub fn resolve_path(tree: &DomTree, path: &str) -> Option<NodeId> {
    let mut current = tree.root();
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        let (tag, index) = match parse_segment(segment) {
            Some(parts) => parts,
            None => {
                tracing::warn!("unsupported path segment: {:?}", segment);
                return None;
            }
        };
        current = tree
            .children(current)
            .filter(|&c| tree.tag_name(c) == Some(tag))
            .nth(index - 1)?;
    }
    if current == tree.root() { None } else { Some(current) }
}

fn parse_segment(segment: &str) -> Option<(&str, usize)> {
    let open = segment.find('[')?;
    let inner = segment.strip_suffix(']')?;
    let tag = &segment[..open];
    let index: usize = inner[open + 1..].parse().ok()?;
    if tag.is_empty() || index == 0 {
        return None;
    }
    Some((tag, index))
}
