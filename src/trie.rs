//! The prefix trie that indexes dictionary patterns.
//!
//! Nodes live in parallel flat arrays and refer to their children by index. Nodes are never
//! removed individually, the whole trie is reset at once by rewinding the node pool, so there is
//! no ownership between nodes to manage.
use core::marker::PhantomData;

use crate::alloc::vec::Vec;
use crate::intlist::IntList;
use crate::{Code, LITERALS, MAX_ENTRIES};

/// The index of a node in the trie.
pub type Node = u32;

/// The root node, which never stores a code.
pub const ROOT: Node = 0;

/// The child count from which the sorted search bisects instead of scanning.
pub const BINARY_SEARCH_CUTOFF: usize = 40;

/// The strategy used to find the child of a node reached by an edge byte.
pub trait ChildSearch {
    /// Search `children` for the node whose edge byte is `byte`.
    ///
    /// On a miss, return the position in `children` at which a new child for `byte` has to be
    /// linked to keep the order this strategy relies on.
    fn find(children: &[Node], edges: &[u8], byte: u8) -> Result<Node, usize>;
}

/// Children in insertion order, found by a linear scan.
///
/// Nodes of an LZW dictionary usually have few successors, where this beats anything smarter.
#[derive(Clone, Copy, Debug, Default)]
pub struct Linear;

/// Children ordered by edge byte, bisected once a node has many of them.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sorted;

/// Maps byte patterns to codes.
#[derive(Clone, Debug)]
pub struct PrefixTrie<S: ChildSearch = Linear> {
    /// The byte on the edge leading into each node.
    edges: Vec<u8>,
    /// The code of the pattern spelled by the path to each node, if it is an entry.
    values: Vec<Option<Code>>,
    /// The child indices of each node.
    children: Vec<IntList>,
    /// The number of nodes in use, including the root.
    used: usize,
    search: PhantomData<S>,
}

impl ChildSearch for Linear {
    fn find(children: &[Node], edges: &[u8], byte: u8) -> Result<Node, usize> {
        children
            .iter()
            .copied()
            .find(|&child| edges[child as usize] == byte)
            .ok_or(children.len())
    }
}

impl ChildSearch for Sorted {
    fn find(children: &[Node], edges: &[u8], byte: u8) -> Result<Node, usize> {
        if children.len() < BINARY_SEARCH_CUTOFF {
            for (position, &child) in children.iter().enumerate() {
                match edges[child as usize].cmp(&byte) {
                    core::cmp::Ordering::Less => {}
                    core::cmp::Ordering::Equal => return Ok(child),
                    core::cmp::Ordering::Greater => return Err(position),
                }
            }
            return Err(children.len());
        }

        children
            .binary_search_by_key(&byte, |&child| edges[child as usize])
            .map(|position| children[position])
    }
}

impl<S: ChildSearch> PrefixTrie<S> {
    /// Create an empty trie with room for one node per code.
    pub fn new() -> Self {
        Self::with_capacity(MAX_ENTRIES + 1)
    }

    /// Create an empty trie with room for `nodes` nodes before the pool grows.
    pub fn with_capacity(nodes: usize) -> Self {
        let nodes = nodes.max(1);
        let mut trie = PrefixTrie {
            edges: Vec::new(),
            values: Vec::new(),
            children: Vec::new(),
            used: 1,
            search: PhantomData,
        };
        trie.resize(nodes);
        trie.children[ROOT as usize] = IntList::with_capacity(LITERALS);
        trie
    }

    /// The number of nodes in use, including the root.
    pub fn node_count(&self) -> usize {
        self.used
    }

    /// The number of node slots allocated.
    pub fn capacity(&self) -> usize {
        self.edges.len()
    }

    /// The number of children of `node`.
    pub fn child_count(&self, node: Node) -> usize {
        self.children[node as usize].len()
    }

    /// Follow the edge labelled `byte` out of `node`.
    pub fn child(&self, node: Node, byte: u8) -> Option<Node> {
        S::find(self.children[node as usize].as_slice(), &self.edges, byte).ok()
    }

    /// The code stored at `node`, if its pattern is a dictionary entry.
    pub fn value(&self, node: Node) -> Option<Code> {
        self.values[node as usize]
    }

    /// Store `code` for `pattern`, creating the nodes along its path as needed.
    ///
    /// Returns the node of the pattern.
    pub fn insert(&mut self, pattern: &[u8], code: Code) -> Node {
        let mut node = ROOT;
        for &byte in pattern {
            let children = self.children[node as usize].as_slice();
            node = match S::find(children, &self.edges, byte) {
                Ok(child) => child,
                Err(position) => {
                    let child = self.allocate(byte);
                    self.children[node as usize].insert(position, child);
                    child
                }
            };
        }

        self.values[node as usize] = Some(code);
        node
    }

    /// The code of exactly `pattern`.
    ///
    /// A pattern that is only a prefix of stored patterns has no code, and neither has the empty
    /// pattern.
    pub fn lookup(&self, pattern: &[u8]) -> Option<Code> {
        let mut node = ROOT;
        for &byte in pattern {
            node = self.child(node, byte)?;
        }

        self.value(node)
    }

    /// Discard all patterns, keeping the node storage for reuse.
    pub fn clear(&mut self) {
        for node in 0..self.used {
            self.edges[node] = 0;
            self.values[node] = None;
            self.children[node].clear();
        }
        self.used = 1;
    }

    fn allocate(&mut self, byte: u8) -> Node {
        let node = self.used;
        if node == self.edges.len() {
            let nodes = 2 * self.edges.len();
            tracing::trace!(from = self.edges.len(), to = nodes, "trie node pool grows");
            self.resize(nodes);
        }

        self.used += 1;
        self.edges[node] = byte;
        self.values[node] = None;
        node as Node
    }

    fn resize(&mut self, nodes: usize) {
        self.edges.resize(nodes, 0);
        self.values.resize(nodes, None);
        self.children.resize_with(nodes, IntList::new);
    }
}

impl<S: ChildSearch> Default for PrefixTrie<S> {
    fn default() -> Self {
        PrefixTrie::new()
    }
}
