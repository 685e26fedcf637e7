//! # Sparse Table
//!
//! A persistent map from signed depth to shared values.
//!
//! The table is a 16-way bitmap-compressed trie over the 32 bits of the
//! depth (eight levels, most significant nibble first). Depths are biased
//! by flipping the sign bit, so walking the trie in slot order yields
//! ascending depths, negative ones included.
//!
//! Nodes are reference counted and mutated through [`Arc::make_mut`]: a
//! node still referenced by a snapshot is copied on first write, a node
//! owned only by the working table is edited in place. A snapshot is a
//! clone of the root pointer, so committing a frame costs O(1) and two
//! successive snapshots share every subtree the frame did not touch.

use std::fmt;
use std::sync::Arc;

const BITS: u32 = 4;
const WIDTH: usize = 1 << BITS;
const MASK: u32 = WIDTH as u32 - 1;
const LEVELS: u32 = u32::BITS / BITS;

fn key_of(depth: i32) -> u32 {
    (depth as u32) ^ 0x8000_0000
}

fn depth_of(key: u32) -> i32 {
    (key ^ 0x8000_0000) as i32
}

fn shift_for(level: u32) -> u32 {
    BITS * (LEVELS - 1 - level)
}

fn slot_of(key: u32, level: u32) -> u32 {
    (key >> shift_for(level)) & MASK
}

enum Node<T> {
    Branch(Branch<T>),
    Leaf(Arc<T>),
}

struct Branch<T> {
    bitmap: u16,
    children: Vec<Arc<Node<T>>>,
}

// Manual impls: cloning a node clones child pointers, never `T`.
impl<T> Clone for Node<T> {
    fn clone(&self) -> Self {
        match self {
            Node::Branch(branch) => Node::Branch(Branch {
                bitmap: branch.bitmap,
                children: branch.children.clone(),
            }),
            Node::Leaf(value) => Node::Leaf(Arc::clone(value)),
        }
    }
}

impl<T> Branch<T> {
    fn has(&self, slot: u32) -> bool {
        self.bitmap & (1 << slot) != 0
    }

    fn position(&self, slot: u32) -> usize {
        (u32::from(self.bitmap) & ((1 << slot) - 1)).count_ones() as usize
    }
}

impl<T> Node<T> {
    /// A chain of single-child branches from `level` down to the leaf.
    fn singleton(key: u32, level: u32, value: Arc<T>) -> Self {
        if level == LEVELS {
            return Node::Leaf(value);
        }
        Node::Branch(Branch {
            bitmap: 1 << slot_of(key, level),
            children: vec![Arc::new(Node::singleton(key, level + 1, value))],
        })
    }

    fn is_empty_branch(&self) -> bool {
        matches!(self, Node::Branch(branch) if branch.bitmap == 0)
    }
}

fn insert_at<T>(node: &mut Arc<Node<T>>, key: u32, level: u32, value: Arc<T>) -> Option<Arc<T>> {
    match Arc::make_mut(node) {
        Node::Leaf(existing) => Some(std::mem::replace(existing, value)),
        Node::Branch(branch) => {
            let slot = slot_of(key, level);
            let pos = branch.position(slot);
            if branch.has(slot) {
                insert_at(&mut branch.children[pos], key, level + 1, value)
            } else {
                let child = Node::singleton(key, level + 1, value);
                branch.children.insert(pos, Arc::new(child));
                branch.bitmap |= 1 << slot;
                None
            }
        }
    }
}

/// Only called once the key is known to be present, so that a miss never
/// copies a shared path.
fn remove_at<T>(node: &mut Arc<Node<T>>, key: u32, level: u32) -> Option<Arc<T>> {
    let Node::Branch(branch) = Arc::make_mut(node) else {
        return None;
    };
    let slot = slot_of(key, level);
    if !branch.has(slot) {
        return None;
    }
    let pos = branch.position(slot);
    let (removed, prune) = if level + 1 == LEVELS {
        let removed = match &*branch.children[pos] {
            Node::Leaf(value) => Some(Arc::clone(value)),
            Node::Branch(_) => None,
        };
        (removed, true)
    } else {
        let removed = remove_at(&mut branch.children[pos], key, level + 1);
        (removed, branch.children[pos].is_empty_branch())
    };
    if prune {
        branch.children.remove(pos);
        branch.bitmap &= !(1 << slot);
    }
    removed
}

/// Persistent depth-keyed table. Cloning is O(1) and shares all structure.
pub struct SparseTable<T> {
    root: Option<Arc<Node<T>>>,
    len: usize,
}

impl<T> Clone for SparseTable<T> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            len: self.len,
        }
    }
}

impl<T> Default for SparseTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SparseTable<T> {
    pub fn new() -> Self {
        Self { root: None, len: 0 }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, depth: i32) -> Option<&Arc<T>> {
        let key = key_of(depth);
        let mut node = self.root.as_deref()?;
        let mut level = 0;
        loop {
            match node {
                Node::Leaf(value) => return Some(value),
                Node::Branch(branch) => {
                    let slot = slot_of(key, level);
                    if !branch.has(slot) {
                        return None;
                    }
                    node = &*branch.children[branch.position(slot)];
                    level += 1;
                }
            }
        }
    }

    pub fn contains(&self, depth: i32) -> bool {
        self.get(depth).is_some()
    }

    /// Stores `value` at `depth`, returning the previous occupant.
    ///
    /// Snapshots taken earlier are unaffected.
    pub fn insert(&mut self, depth: i32, value: Arc<T>) -> Option<Arc<T>> {
        let key = key_of(depth);
        let previous = match &mut self.root {
            Some(root) => insert_at(root, key, 0, value),
            None => {
                self.root = Some(Arc::new(Node::singleton(key, 0, value)));
                None
            }
        };
        if previous.is_none() {
            self.len += 1;
        }
        previous
    }

    /// Clears `depth`, returning the removed occupant. Removing an empty
    /// depth is a no-op.
    pub fn remove(&mut self, depth: i32) -> Option<Arc<T>> {
        if !self.contains(depth) {
            return None;
        }
        let root = self.root.as_mut()?;
        let removed = remove_at(root, key_of(depth), 0);
        if removed.is_some() {
            self.len -= 1;
        }
        if self.len == 0 {
            self.root = None;
        }
        removed
    }

    /// An immutable view of the current contents. O(1).
    pub fn snapshot(&self) -> Self {
        self.clone()
    }

    /// Returns a new table with `value` stored at `depth`, leaving `self`
    /// untouched.
    pub fn with_inserted(&self, depth: i32, value: Arc<T>) -> Self {
        let mut next = self.clone();
        next.insert(depth, value);
        next
    }

    /// Returns a new table without `depth`, leaving `self` untouched.
    pub fn with_removed(&self, depth: i32) -> Self {
        let mut next = self.clone();
        next.remove(depth);
        next
    }

    /// True when both tables are the same version (same root node).
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.root, &other.root) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    /// Entries in ascending depth order.
    pub fn iter(&self) -> Iter<'_, T> {
        let mut stack = Vec::with_capacity(LEVELS as usize * WIDTH);
        if let Some(root) = self.root.as_deref() {
            stack.push((root, 0, 0));
        }
        Iter {
            stack,
            remaining: self.len,
        }
    }

    pub fn depths(&self) -> impl Iterator<Item = i32> + '_ {
        self.iter().map(|(depth, _)| depth)
    }

    pub fn values(&self) -> impl Iterator<Item = &Arc<T>> + '_ {
        self.iter().map(|(_, value)| value)
    }
}

impl<T> FromIterator<(i32, Arc<T>)> for SparseTable<T> {
    fn from_iter<I: IntoIterator<Item = (i32, Arc<T>)>>(iter: I) -> Self {
        let mut table = SparseTable::new();
        for (depth, value) in iter {
            table.insert(depth, value);
        }
        table
    }
}

impl<T: fmt::Debug> fmt::Debug for SparseTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

pub struct Iter<'a, T> {
    // (node, level, key prefix accumulated above `level`)
    stack: Vec<(&'a Node<T>, u32, u32)>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (i32, &'a Arc<T>);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((node, level, prefix)) = self.stack.pop() {
            match node {
                Node::Leaf(value) => {
                    self.remaining -= 1;
                    return Some((depth_of(prefix), value));
                }
                Node::Branch(branch) => {
                    let shift = shift_for(level);
                    let mut slots = [0u32; WIDTH];
                    let mut count = 0;
                    let mut bits = branch.bitmap;
                    while bits != 0 {
                        slots[count] = bits.trailing_zeros();
                        count += 1;
                        bits &= bits - 1;
                    }
                    // Pushed in reverse so the lowest slot is popped first.
                    for i in (0..count).rev() {
                        self.stack
                            .push((&*branch.children[i], level + 1, prefix | (slots[i] << shift)));
                    }
                }
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<'a, T> IntoIterator for &'a SparseTable<T> {
    type Item = (i32, &'a Arc<T>);
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
