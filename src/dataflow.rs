/*
 * SPDX-FileCopyrightText: 2026 Inria
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The execution-substrate interface: partitioning, exchange, group-by-key.
//!
//! The core algorithm only requires a partitioned group-by-key between the
//! distribution and accumulation stages. This module realizes that contract
//! in process, over the Rayon thread pool; a distributed dataflow engine
//! providing the same primitives can replace it without touching the stages.
//!
//! Everything here is deterministic: [`exchange`] merges map batches in batch
//! order and [`group_by_key`] returns groups in ascending key order, so the
//! output of a run depends on the partition count but never on the number of
//! threads.

use rayon::prelude::*;
use std::collections::BTreeMap;

/// Maps node ids to partitions.
#[derive(Debug, Clone, Copy)]
pub enum Partitioner {
    /// Id modulo the number of partitions.
    Hash {
        /// The number of partitions.
        num_partitions: usize,
    },
    /// Contiguous id ranges of roughly equal size over `0..num_nodes`.
    ///
    /// Keeps each output partition sorted-range aligned with the id space,
    /// which helps when downstream consumers read snapshots in id order.
    Range {
        /// The number of partitions.
        num_partitions: usize,
        /// The total number of nodes in the graph.
        num_nodes: usize,
    },
}

impl Partitioner {
    /// Returns the number of partitions.
    pub fn num_partitions(&self) -> usize {
        match *self {
            Self::Hash { num_partitions } | Self::Range { num_partitions, .. } => num_partitions,
        }
    }

    /// Returns the partition of the given node id.
    pub fn partition(&self, node: usize) -> usize {
        match *self {
            Self::Hash { num_partitions } => node % num_partitions,
            Self::Range {
                num_partitions,
                num_nodes,
            } => {
                // Ids at or past num_nodes land in the last partition.
                (node * num_partitions / num_nodes.max(1)).min(num_partitions - 1)
            }
        }
    }
}

/// Routes keyed items from map batches to partition batches.
///
/// Each input batch is scattered into per-partition buckets in parallel;
/// buckets are then concatenated in batch order, so the result is the same
/// however many threads run the scatter.
pub fn exchange<T: Send>(
    batches: Vec<Vec<(usize, T)>>,
    partitioner: &Partitioner,
) -> Vec<Vec<(usize, T)>> {
    let num_partitions = partitioner.num_partitions();

    let scattered: Vec<Vec<Vec<(usize, T)>>> = batches
        .into_par_iter()
        .map(|batch| {
            let mut buckets: Vec<Vec<(usize, T)>> =
                (0..num_partitions).map(|_| Vec::new()).collect();
            for (key, value) in batch {
                buckets[partitioner.partition(key)].push((key, value));
            }
            buckets
        })
        .collect();

    let mut partitions: Vec<Vec<(usize, T)>> = (0..num_partitions).map(|_| Vec::new()).collect();
    for buckets in scattered {
        for (partition, bucket) in partitions.iter_mut().zip(buckets) {
            partition.extend(bucket);
        }
    }

    partitions
}

/// Groups the items of a partition batch by key.
///
/// Groups come out in ascending key order; within a group, items keep the
/// order in which [`exchange`] delivered them.
pub fn group_by_key<T>(batch: Vec<(usize, T)>) -> BTreeMap<usize, Vec<T>> {
    let mut groups: BTreeMap<usize, Vec<T>> = BTreeMap::new();
    for (key, value) in batch {
        groups.entry(key).or_default().push(value);
    }
    groups
}
