/*
 * SPDX-FileCopyrightText: 2026 Inria
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Mass-accumulation stage.

use anyhow::{Result, bail, ensure};
use std::collections::BTreeMap;

use super::Counters;
use crate::math::{LOG_ZERO, log_sum};
use crate::records::{Message, NodeRecord};

/// Rebuilds one node record from the messages addressed to its id.
///
/// Mass messages are folded slot by slot with [`log_sum`] into an accumulator
/// that starts at [`LOG_ZERO`]; the order of the fold is irrelevant because
/// `log_sum` commutes. The structure message supplies the adjacency.
///
/// Returns `Some(record)` when exactly one structure message arrived, the
/// normal case. Returns `None` when no structure message arrived: the id was
/// referenced by an edge but has no record in the graph, so the accumulated
/// mass is discarded and the occurrence counted.
///
/// # Errors
///
/// More than one structure message for the same id means duplicate records
/// upstream and aborts the round, as does a mass vector whose length differs
/// from `num_sources`.
pub fn accumulate(
    node: usize,
    messages: impl IntoIterator<Item = Message>,
    num_sources: usize,
    counters: &mut Counters,
) -> Result<Option<NodeRecord>> {
    let mut accumulator = vec![LOG_ZERO; num_sources];
    let mut successors = Vec::new();
    let mut structure_received = 0usize;

    for message in messages {
        match message {
            Message::Structure { successors: list } => {
                successors = list;
                structure_received += 1;
            }
            Message::Mass { mass } => {
                ensure!(
                    mass.len() == num_sources,
                    "Mass message for node {node} has {} slots instead of {num_sources}",
                    mass.len()
                );
                for (slot, m) in accumulator.iter_mut().zip(mass) {
                    *slot = log_sum(*slot, m);
                }
                counters.mass_messages_received += 1;
            }
        }
    }

    match structure_received {
        1 => Ok(Some(NodeRecord {
            node,
            successors,
            mass: accumulator,
        })),
        0 => {
            // Mass addressed to a node that does not exist vanishes: it must
            // not enter the retained total.
            log::warn!("No structure received for node {node}; its mass is dropped");
            counters.missing_structure += 1;
            Ok(None)
        }
        _ => bail!("Multiple structure messages received for node {node}"),
    }
}

/// The result of accumulating one partition.
#[derive(Debug, Clone)]
pub struct PartitionOutput {
    /// The rebuilt records, in ascending node order.
    pub records: Vec<NodeRecord>,
    /// The natural log of the total mass this worker retained, for the
    /// designated source slot.
    pub retained_mass: f64,
    /// The counters of this worker.
    pub counters: Counters,
}

/// Accumulates every id group of a partition and totals the retained mass.
///
/// The retained total is tracked for slot 0 only, the designated source
/// slot, and the driver applies the missing-mass scalar derived from it to
/// every slot of the redistribution. With more than one source this
/// conflates the leakage of the individual sources; the multi-source tests
/// exercise the resulting asymmetry.
pub fn accumulate_partition(
    groups: BTreeMap<usize, Vec<Message>>,
    num_sources: usize,
) -> Result<PartitionOutput> {
    let mut counters = Counters::default();
    let mut records = Vec::new();
    let mut retained_mass = LOG_ZERO;

    for (node, messages) in groups {
        if let Some(record) = accumulate(node, messages, num_sources, &mut counters)? {
            retained_mass = log_sum(retained_mass, record.mass[0]);
            records.push(record);
        }
    }

    Ok(PartitionOutput {
        records,
        retained_mass,
        counters,
    })
}
