/*
 * SPDX-FileCopyrightText: 2026 Inria
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The three per-round stages.
//!
//! A round transforms snapshot *k* into snapshot *k* + 1 through
//! [distribution](distribute::distribute), a shuffle by node id,
//! [accumulation](accumulate::accumulate), and
//! [redistribution](redistribute::redistribute). The stages are plain
//! record-in/record-out functions with no shared state: the driver runs them
//! over partitions and merges the [`Counters`] they return.

pub mod accumulate;
pub mod distribute;
pub mod redistribute;

pub use accumulate::{PartitionOutput, accumulate, accumulate_partition};
pub use distribute::{combine, distribute};
pub use redistribute::redistribute;

/// Observability counters returned by stage tasks.
///
/// Counters are values, not shared state: every task starts from
/// [`Counters::default`] and the driver merges the results. Nothing in the
/// algorithm reads them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    /// Nodes processed by the distribution stage.
    pub nodes: u64,
    /// Edges traversed by the distribution stage.
    pub edges: u64,
    /// Mass messages emitted by the distribution stage.
    pub mass_messages_sent: u64,
    /// Mass messages removed by the pre-shuffle combiner.
    pub mass_messages_combined: u64,
    /// Mass messages folded by the accumulation stage.
    pub mass_messages_received: u64,
    /// Node ids that received mass but no structure message.
    pub missing_structure: u64,
}

impl std::ops::Add for Counters {
    type Output = Counters;

    fn add(self, rhs: Counters) -> Counters {
        Counters {
            nodes: self.nodes + rhs.nodes,
            edges: self.edges + rhs.edges,
            mass_messages_sent: self.mass_messages_sent + rhs.mass_messages_sent,
            mass_messages_combined: self.mass_messages_combined + rhs.mass_messages_combined,
            mass_messages_received: self.mass_messages_received + rhs.mass_messages_received,
            missing_structure: self.missing_structure + rhs.missing_structure,
        }
    }
}

impl std::ops::AddAssign for Counters {
    fn add_assign(&mut self, rhs: Counters) {
        *self = *self + rhs;
    }
}

impl std::fmt::Display for Counters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "nodes: {}, edges: {}, mass messages sent: {}, combined: {}, received: {}, missing structure: {}",
            self.nodes,
            self.edges,
            self.mass_messages_sent,
            self.mass_messages_combined,
            self.mass_messages_received,
            self.missing_structure
        )
    }
}
