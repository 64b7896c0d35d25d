use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use crate::name::Name;

/// A node in the linearized name trie.
///
/// Children are indices into the `nodes` pool rather than pointers, so the
/// whole trie is one contiguous allocation that clones cheaply.
#[derive(Clone, Debug)]
struct TrieNode {
    /// The name component leading into this node (empty for the root).
    component: Box<[u8]>,
    /// Offsets of child nodes in the `nodes` pool.
    children: Vec<u32>,
    /// Route handle bound to the prefix ending here (`NULL_HANDLE` = none).
    route_handle: u32,
}

pub const NULL_HANDLE: u32 = u32::MAX;

/// Prefix trie mapping name prefixes to route handles (the FIB index).
#[derive(Clone)]
pub struct NameTrie {
    nodes: Vec<TrieNode>,
    /// Bumped on every association change so readers can detect stale views.
    pub sequence_number: u64,
}

impl fmt::Debug for NameTrie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NameTrie")
            .field("nodes_len", &self.nodes.len())
            .field("sequence_number", &self.sequence_number)
            .finish()
    }
}

impl Default for NameTrie {
    fn default() -> Self {
        Self::new(64)
    }
}

impl NameTrie {
    pub fn new(capacity: usize) -> Self {
        let mut nodes = Vec::with_capacity(capacity.max(1));
        nodes.push(TrieNode {
            component: Box::from(&[][..]),
            children: Vec::new(),
            route_handle: NULL_HANDLE,
        });
        Self {
            nodes,
            sequence_number: 0,
        }
    }

    pub fn nodes_len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    fn child(&self, curr: usize, component: &[u8]) -> Option<usize> {
        self.nodes[curr]
            .children
            .iter()
            .map(|&c| c as usize)
            .find(|&c| &*self.nodes[c].component == component)
    }

    /// Walks `name` as far as the trie allows and returns the terminal node.
    fn walk(&self, name: &Name) -> Option<usize> {
        let mut curr = 0;
        for component in name.components() {
            curr = self.child(curr, component)?;
        }
        Some(curr)
    }

    /// Pre-populates the path for `name` without binding a handle.
    /// Returns the index of the terminal node.
    pub fn warm(&mut self, name: &Name) -> usize {
        let mut curr = 0;
        for component in name.components() {
            curr = match self.child(curr, component) {
                Some(next) => next,
                None => {
                    let new_idx = self.nodes.len();
                    self.nodes.push(TrieNode {
                        component: Box::from(component),
                        children: Vec::new(),
                        route_handle: NULL_HANDLE,
                    });
                    self.nodes[curr].children.push(new_idx as u32);
                    new_idx
                }
            };
        }
        curr
    }

    /// Binds `handle` to the prefix `name`, creating the path if needed.
    /// Returns the previously bound handle, if any.
    pub fn associate(&mut self, name: &Name, handle: u32) -> Option<u32> {
        debug_assert_ne!(handle, NULL_HANDLE, "NULL_HANDLE is reserved");
        let idx = self.warm(name);
        let prev = core::mem::replace(&mut self.nodes[idx].route_handle, handle);
        self.sequence_number += 1;
        (prev != NULL_HANDLE).then_some(prev)
    }

    /// Unbinds the handle for exactly `name`. Nodes are kept for reuse.
    pub fn dissociate(&mut self, name: &Name) -> Option<u32> {
        let idx = self.walk(name)?;
        let prev = core::mem::replace(&mut self.nodes[idx].route_handle, NULL_HANDLE);
        if prev == NULL_HANDLE {
            return None;
        }
        self.sequence_number += 1;
        Some(prev)
    }

    /// Returns the handle bound to exactly `name`.
    pub fn exact(&self, name: &Name) -> Option<u32> {
        let idx = self.walk(name)?;
        let handle = self.nodes[idx].route_handle;
        (handle != NULL_HANDLE).then_some(handle)
    }

    /// Returns the handle of the longest bound prefix of `name`, together with
    /// the number of components it matched.
    pub fn longest_prefix_match(&self, name: &Name) -> Option<(u32, usize)> {
        let mut curr = 0;
        let mut best = None;
        if self.nodes[0].route_handle != NULL_HANDLE {
            best = Some((self.nodes[0].route_handle, 0));
        }
        for (depth, component) in name.components().enumerate() {
            match self.child(curr, component) {
                Some(next) => curr = next,
                None => break,
            }
            let handle = self.nodes[curr].route_handle;
            if handle != NULL_HANDLE {
                best = Some((handle, depth + 1));
            }
        }
        best
    }
}

#[cfg(kani)]
mod proofs {
    use super::*;

    #[kani::proof]
    #[kani::unwind(5)]
    fn prove_prefix_match_stays_in_bounds() {
        let mut trie = NameTrie::new(4);
        let a: [u8; 2] = kani::any();
        let b: [u8; 2] = kani::any();
        trie.associate(&Name::from_components([a]), 1);

        // Traversal only follows offsets it pushed itself, so lookups of any
        // name can never index past the node pool.
        let _ = trie.longest_prefix_match(&Name::from_components([a, b]));
    }
}
