/*
 * SPDX-FileCopyrightText: 2026 Inria
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Node records and the messages exchanged between stages.

use crate::math::LOG_ZERO;

/// One graph node as stored in a snapshot.
///
/// A record couples the node's adjacency (the targets of its out-edges, in
/// order, possibly empty) with its mass vector: one log-probability per
/// personalization source, in source order. The vector length is fixed for a
/// whole run.
///
/// Records are never mutated across a shuffle: the distribution stage copies
/// them into messages and the accumulation stage rebuilds them from scratch.
/// Only the redistribution stage, which is a pure per-record transform,
/// rewrites the mass vector in place.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
    /// The node id.
    pub node: usize,
    /// The targets of the node's out-edges.
    pub successors: Vec<usize>,
    /// The node's mass, one natural-log probability per source.
    pub mass: Vec<f64>,
}

impl NodeRecord {
    /// Creates a record with the given adjacency and zero mass
    /// ([`LOG_ZERO`]) in each of `num_sources` slots.
    pub fn empty(node: usize, successors: Vec<usize>, num_sources: usize) -> Self {
        Self {
            node,
            successors,
            mass: vec![LOG_ZERO; num_sources],
        }
    }

    /// Returns the node's out-degree.
    pub fn outdegree(&self) -> usize {
        self.successors.len()
    }

    /// Returns true if the node has no out-edges.
    ///
    /// The mass of such a node cannot be propagated along edges and is
    /// recovered by the redistribution stage at the end of the round.
    pub fn is_dangling(&self) -> bool {
        self.successors.is_empty()
    }
}

/// A message produced during a round, addressed to a node id.
///
/// The addressee is carried as the key of the exchange, not inside the
/// message. Messages exist only between the distribution and accumulation
/// stages of one round and are never persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Carries a node's edge list forward unchanged.
    ///
    /// Exactly one structure message must reach each surviving node id per
    /// round: zero marks a dangling reference, more than one marks upstream
    /// corruption.
    Structure {
        /// The edge list of the addressee.
        successors: Vec<usize>,
    },
    /// A partial contribution of probability mass for the addressee.
    Mass {
        /// One log-probability per source.
        mass: Vec<f64>,
    },
}
