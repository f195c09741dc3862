/*
 * SPDX-FileCopyrightText: 2026 Inria
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Mass-distribution stage.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use super::Counters;
use crate::math::log_sum;
use crate::records::{Message, NodeRecord};

/// Distributes a node's mass along its out-edges.
///
/// Emits a [`Message::Structure`] keyed by the node's own id, carrying the
/// adjacency forward, and then, for a node of out-degree *d* > 0, one
/// [`Message::Mass`] per successor. The mass vector of those messages is the
/// node's vector with ln *d* subtracted from every slot: an equal-share split
/// in log space. Every successor receives the full vector, since the sources
/// are independent copies of mass flowing through the same topology.
///
/// A dangling node (*d* = 0) emits no mass messages at all; its mass leaks
/// and is recovered by the redistribution stage at the end of the round.
pub fn distribute(
    record: &NodeRecord,
    counters: &mut Counters,
    mut emit: impl FnMut(usize, Message),
) {
    emit(
        record.node,
        Message::Structure {
            successors: record.successors.clone(),
        },
    );

    if !record.successors.is_empty() {
        let log_degree = (record.outdegree() as f64).ln();
        let share: Vec<f64> = record.mass.iter().map(|&m| m - log_degree).collect();

        counters.edges += record.outdegree() as u64;

        for &successor in &record.successors {
            emit(
                successor,
                Message::Mass {
                    mass: share.clone(),
                },
            );
            counters.mass_messages_sent += 1;
        }
    }

    counters.nodes += 1;
}

/// Merges the mass messages of a map batch that share a target id.
///
/// This is the optional pre-shuffle combiner: it folds mass vectors with
/// [`log_sum`] slot by slot, leaves structure messages untouched, and counts
/// the messages it removed. The merged batch carries exactly the same total
/// mass per target, so enabling the combiner changes only shuffle volume,
/// within floating-point rounding of the final scores.
///
/// Structure messages keep their original order; the merged mass messages
/// follow in ascending target order, so the output is deterministic.
pub fn combine(messages: Vec<(usize, Message)>, counters: &mut Counters) -> Vec<(usize, Message)> {
    let mut combined: HashMap<usize, (Vec<f64>, u64)> = HashMap::new();
    let mut output = Vec::new();

    for (target, message) in messages {
        match message {
            Message::Structure { .. } => output.push((target, message)),
            Message::Mass { mass } => match combined.entry(target) {
                Entry::Vacant(entry) => {
                    entry.insert((mass, 0));
                }
                Entry::Occupied(mut entry) => {
                    let (acc, saved) = entry.get_mut();
                    for (slot, m) in acc.iter_mut().zip(mass) {
                        *slot = log_sum(*slot, m);
                    }
                    *saved += 1;
                }
            },
        }
    }

    let mut merged: Vec<(usize, (Vec<f64>, u64))> = combined.into_iter().collect();
    merged.sort_unstable_by_key(|&(target, _)| target);

    for (target, (mass, saved)) in merged {
        counters.mass_messages_combined += saved;
        output.push((target, Message::Mass { mass }));
    }

    output
}
