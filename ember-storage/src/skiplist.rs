//! Ordered index over keys with full per-key version history.
//!
//! A probabilistic skip list: level 0 is a sorted linked list over every key,
//! higher levels skip ahead for expected-logarithmic search. Node links are
//! indices into the list's node arena rather than pointers, which keeps the
//! structure in safe code and the nodes cache-adjacent.
//!
//! The list has no internal synchronization. It assumes a single-writer
//! discipline enforced by its owner: one mutator for the list's whole
//! lifetime, and ordered iteration only once mutation has quiesced.

use std::cmp::Ordering;

use ember_core::{Key, Value, VersionedValue};

use crate::probability::geometric;
use crate::versions::VersionStack;

struct Node {
    key: Key,
    versions: VersionStack,
    // Outgoing link per level, sized once at creation. None = end of level.
    links: Box<[Option<usize>]>,
}

/// Probabilistically balanced ordered index.
pub struct SkipList {
    // Sentinel links: entry points into every level.
    head: Box<[Option<usize>]>,
    nodes: Vec<Node>,
    max_height: usize,
    level_probability: f64,
    distinct_keys: u64,
    update_count: u64,
}

impl SkipList {
    /// Create a skip list sized for `estimated_capacity` keys.
    ///
    /// Panics unless the capacity is a power of two; the max level height is
    /// its base-2 logarithm, so capacity 1024 gives 10 levels.
    pub fn new(estimated_capacity: u64, level_probability: f64) -> Self {
        assert!(
            estimated_capacity.is_power_of_two(),
            "estimated capacity {estimated_capacity} is not a power of two"
        );
        assert!(
            level_probability > 0.0 && level_probability < 1.0,
            "level probability {level_probability} is not in (0, 1)"
        );
        let max_height = estimated_capacity.ilog2().max(1) as usize;
        Self {
            head: vec![None; max_height].into_boxed_slice(),
            nodes: Vec::new(),
            max_height,
            level_probability,
            distinct_keys: 0,
            update_count: 0,
        }
    }

    pub fn max_height(&self) -> usize {
        self.max_height
    }

    /// Distinct keys in the list.
    pub fn len(&self) -> u64 {
        self.distinct_keys
    }

    pub fn is_empty(&self) -> bool {
        self.distinct_keys == 0
    }

    /// Total accepted writes: distinct keys plus history pushes onto
    /// existing keys.
    pub fn size(&self) -> u64 {
        self.distinct_keys + self.update_count
    }

    // Outgoing link of `node` (None = sentinel) at `level`.
    fn next_of(&self, node: Option<usize>, level: usize) -> Option<usize> {
        let links = match node {
            None => &self.head,
            Some(index) => &self.nodes[index].links,
        };
        links.get(level).copied().flatten()
    }

    /// Insert a new key or push another version onto an existing one.
    ///
    /// Panics if `version` does not advance past the key's current top
    /// version; the history invariant is not repairable after the fact.
    pub fn put(&mut self, key: Key, value: Value, version: u64) {
        // Per level: the node whose link will point at the new node, and the
        // node the new node will point onward to.
        let mut preds: Vec<Option<usize>> = vec![None; self.max_height];
        let mut succs: Vec<Option<usize>> = vec![None; self.max_height];

        let mut current: Option<usize> = None;
        for level in (0..self.max_height).rev() {
            let mut next = self.next_of(current, level);
            loop {
                match next {
                    None => {
                        // End of this level, every key here is smaller.
                        preds[level] = current;
                        succs[level] = None;
                        break;
                    }
                    Some(index) => match key.as_ref().cmp(self.nodes[index].key.as_ref()) {
                        Ordering::Equal => {
                            self.nodes[index]
                                .versions
                                .push(VersionedValue::new(value, version));
                            self.update_count += 1;
                            return;
                        }
                        Ordering::Less => {
                            // Next key is bigger, this level's bracket found.
                            preds[level] = current;
                            succs[level] = Some(index);
                            break;
                        }
                        Ordering::Greater => {
                            current = next;
                            next = self.next_of(current, level);
                        }
                    },
                }
            }
        }

        let height = self.draw_height();
        let mut versions = VersionStack::new();
        versions.push(VersionedValue::new(value, version));
        let links: Box<[Option<usize>]> = succs[..height].to_vec().into_boxed_slice();

        let new_index = self.nodes.len();
        self.nodes.push(Node {
            key,
            versions,
            links,
        });
        for level in 0..height {
            match preds[level] {
                None => self.head[level] = Some(new_index),
                Some(pred) => self.nodes[pred].links[level] = Some(new_index),
            }
        }
        self.distinct_keys += 1;
    }

    // One geometric draw per insertion, clamped to the max height. No
    // rebalancing afterward.
    fn draw_height(&self) -> usize {
        let mut rng = rand::thread_rng();
        let drawn = geometric(&mut rng, self.level_probability) + 1;
        drawn.min(self.max_height as u64) as usize
    }

    /// Latest version for `key`, if present.
    pub fn get(&self, key: &[u8]) -> Option<&VersionedValue> {
        self.lookup(key).0.and_then(VersionStack::top)
    }

    /// Full history for `key`, plus the number of comparison steps the
    /// descent took. The step count is diagnostic only.
    pub fn lookup(&self, key: &[u8]) -> (Option<&VersionStack>, u64) {
        let mut steps = 0;
        let mut current: Option<usize> = None;
        for level in (0..self.max_height).rev() {
            let mut next = self.next_of(current, level);
            steps += 1;
            loop {
                match next {
                    None => break,
                    Some(index) => match key.cmp(self.nodes[index].key.as_ref()) {
                        Ordering::Equal => {
                            return (Some(&self.nodes[index].versions), steps);
                        }
                        Ordering::Less => break,
                        Ordering::Greater => {
                            current = next;
                            next = self.next_of(current, level);
                            steps += 1;
                        }
                    },
                }
            }
        }
        (None, steps)
    }

    /// Lazy ascending iterator over every key, starting at the level-0
    /// successor of the sentinel. Single pass, not restartable.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            list: self,
            current: self.head.first().copied().flatten(),
        }
    }
}

/// One key's slot in the list, exposed during iteration.
pub struct Entry<'a> {
    key: &'a Key,
    versions: &'a VersionStack,
}

impl<'a> Entry<'a> {
    pub fn key(&self) -> &'a [u8] {
        self.key.as_ref()
    }

    /// Full version history, oldest to newest.
    pub fn versions(&self) -> &'a VersionStack {
        self.versions
    }

    /// Latest value and version. Nodes always hold at least one version.
    pub fn latest(&self) -> Option<&'a VersionedValue> {
        self.versions.top()
    }
}

/// Ascending single-pass iterator over the bottom level.
pub struct Iter<'a> {
    list: &'a SkipList,
    current: Option<usize>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = Entry<'a>;

    fn next(&mut self) -> Option<Entry<'a>> {
        let index = self.current?;
        let node = &self.list.nodes[index];
        self.current = node.links.first().copied().flatten();
        Some(Entry {
            key: &node.key,
            versions: &node.versions,
        })
    }
}
