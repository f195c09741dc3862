/*
 * SPDX-FileCopyrightText: 2026 Inria
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The personalization source set.

use anyhow::{Result, ensure};
use std::collections::HashMap;

/// The ordered set of personalization sources.
///
/// The position of a node id in the list is its *slot*: slot `i` of every
/// mass vector holds the score personalized on the `i`-th source. The set is
/// immutable and is passed to the stages that need it instead of being kept
/// in shared state.
///
/// If the same id appears more than once, the last occurrence wins the
/// id-to-slot mapping.
#[derive(Debug, Clone)]
pub struct SourceSet {
    sources: Box<[usize]>,
    slot_of: HashMap<usize, usize>,
}

impl SourceSet {
    /// Creates a source set from an ordered list of node ids.
    ///
    /// # Errors
    ///
    /// An empty list is rejected: without sources the teleport has no
    /// destination and no round can run.
    pub fn new(sources: impl Into<Vec<usize>>) -> Result<Self> {
        let sources: Vec<usize> = sources.into();
        ensure!(!sources.is_empty(), "The source list cannot be empty");
        let slot_of = sources
            .iter()
            .enumerate()
            .map(|(slot, &node)| (node, slot))
            .collect();
        Ok(Self {
            sources: sources.into_boxed_slice(),
            slot_of,
        })
    }

    /// Returns the number of sources, that is, the length of every mass
    /// vector in the run.
    pub fn num_sources(&self) -> usize {
        self.sources.len()
    }

    /// Returns the slot of the given node id, or `None` if the node is not a
    /// source.
    pub fn slot(&self, node: usize) -> Option<usize> {
        self.slot_of.get(&node).copied()
    }

    /// Returns the source ids in slot order.
    pub fn nodes(&self) -> &[usize] {
        &self.sources
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_empty_rejected() {
        assert!(SourceSet::new(vec![]).is_err());
    }

    #[test]
    fn test_slots() {
        let s = SourceSet::new(vec![42, 7]).unwrap();
        assert_eq!(s.num_sources(), 2);
        assert_eq!(s.slot(42), Some(0));
        assert_eq!(s.slot(7), Some(1));
        assert_eq!(s.slot(0), None);
    }

    #[test]
    fn test_duplicate_last_wins() {
        let s = SourceSet::new(vec![5, 5]).unwrap();
        assert_eq!(s.num_sources(), 2);
        assert_eq!(s.slot(5), Some(1));
    }
}
