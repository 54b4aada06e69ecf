//! Union-Find (disjoint set) with path compression and union by rank.
//!
//! Used to merge DBSCAN core points into connected clusters.

use std::collections::HashMap;
use std::hash::Hash;

/// Union-Find over arbitrary hashable keys.
#[derive(Debug, Clone, Default)]
pub struct UnionFind<T> {
    parent: HashMap<T, T>,
    rank: HashMap<T, u32>,
}

impl<T> UnionFind<T>
where
    T: Clone + Eq + Hash + Ord,
{
    /// Create an empty structure.
    pub fn new() -> Self {
        Self {
            parent: HashMap::new(),
            rank: HashMap::new(),
        }
    }

    /// Create an empty structure with room for `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            parent: HashMap::with_capacity(capacity),
            rank: HashMap::with_capacity(capacity),
        }
    }

    /// Add an element as its own singleton set. No-op if already present.
    pub fn make_set(&mut self, x: T) {
        if !self.parent.contains_key(&x) {
            self.parent.insert(x.clone(), x.clone());
            self.rank.insert(x, 0);
        }
    }

    /// Find the root of the set containing `x`, compressing the path.
    ///
    /// Unknown elements are treated as singletons and returned unchanged.
    pub fn find(&mut self, x: &T) -> T {
        let mut root = x.clone();
        while let Some(parent) = self.parent.get(&root) {
            if *parent == root {
                break;
            }
            root = parent.clone();
        }

        // Path compression
        let mut current = x.clone();
        while current != root {
            let next = match self.parent.get(&current) {
                Some(p) => p.clone(),
                None => break,
            };
            self.parent.insert(current, root.clone());
            current = next;
        }

        root
    }

    /// Merge the sets containing `x` and `y`. Returns true if they were separate.
    pub fn union(&mut self, x: &T, y: &T) -> bool {
        let root_x = self.find(x);
        let root_y = self.find(y);
        if root_x == root_y {
            return false;
        }

        let rank_x = self.rank.get(&root_x).copied().unwrap_or(0);
        let rank_y = self.rank.get(&root_y).copied().unwrap_or(0);

        if rank_x < rank_y {
            self.parent.insert(root_x, root_y);
        } else if rank_x > rank_y {
            self.parent.insert(root_y, root_x);
        } else {
            self.parent.insert(root_y, root_x.clone());
            self.rank.insert(root_x, rank_x + 1);
        }
        true
    }

    /// Check if two elements are in the same set.
    pub fn connected(&mut self, x: &T, y: &T) -> bool {
        self.find(x) == self.find(y)
    }

    /// Number of elements tracked.
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    /// Check if no elements are tracked.
    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// All sets, keyed by root. Members are sorted so output is deterministic.
    pub fn groups(&mut self) -> HashMap<T, Vec<T>> {
        let mut keys: Vec<T> = self.parent.keys().cloned().collect();
        keys.sort();

        let mut groups: HashMap<T, Vec<T>> = HashMap::new();
        for key in keys {
            let root = self.find(&key);
            groups.entry(root).or_default().push(key);
        }
        groups
    }
}
