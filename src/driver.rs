/*
 * SPDX-FileCopyrightText: 2026 Inria
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The iteration driver.
//!
//! A [`Driver`] advances a run one round at a time, from a start to an end
//! iteration. Every round reads the snapshot of iteration *k* and produces
//! the snapshot of iteration *k* + 1 in two phases:
//!
//! 1. the distribution stage runs over every input partition, its messages
//!    are exchanged by node id, and the accumulation stage rebuilds the
//!    pre-correction snapshot, each worker writing the log of the mass it
//!    retained to a side file;
//! 2. the driver combines the side files into a single total, derives the
//!    missing mass as 1 − e^total, and the redistribution stage rewrites
//!    every record into the final snapshot.
//!
//! The two phases are separated by hard barriers: accumulation cannot start
//! before the exchange has every message, and redistribution cannot start
//! before every retained-mass scalar has been read back. Rounds are strictly
//! sequential.
//!
//! The missing-mass total is derived from the designated source slot alone
//! (slot 0); see [`accumulate_partition`](crate::stages::accumulate_partition).
//! The value 1 − e^total is used as is, without clamping.
//!
//! # Examples
//!
//! ```no_run
//! use logrank::driver::Driver;
//! use logrank::snapshot::SnapshotStore;
//! use logrank::sources::SourceSet;
//!
//! # fn main() -> anyhow::Result<()> {
//! let store = SnapshotStore::new("/data/graph");
//! let sources = SourceSet::new(vec![367, 249])?;
//! let mut driver = Driver::new(store, sources, 1_000_000);
//! driver.alpha(0.15).combiner(true);
//! driver.run(0, 10)?;
//! # Ok(())
//! # }
//! ```

use anyhow::{Result, ensure};
use dsi_progress_logger::{ConcurrentProgressLog, ProgressLog, no_logging};
use rayon::prelude::*;
use std::path::Path;

use crate::dataflow::{Partitioner, exchange, group_by_key};
use crate::records::Message;
use crate::snapshot::{self, SnapshotStore};
use crate::sources::SourceSet;
use crate::stages::{Counters, accumulate_partition, combine, distribute, redistribute};

/// The phase a driver is currently in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum State {
    /// No round is running.
    #[default]
    Idle,
    /// The distribution stage is running.
    Distributing,
    /// The accumulation stage is running.
    Accumulating,
    /// The redistribution stage is running.
    Redistributing,
    /// The configured end iteration has been reached.
    Done,
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            State::Idle => f.write_str("idle"),
            State::Distributing => f.write_str("distributing"),
            State::Accumulating => f.write_str("accumulating"),
            State::Redistributing => f.write_str("redistributing"),
            State::Done => f.write_str("done"),
        }
    }
}

/// Drives rounds of personalized PageRank over a snapshot store.
///
/// The struct is configured via setters and then executed via
/// [`run`](Self::run). Iteration 0's snapshot must already exist under the
/// store's base path; producing it is the concern of external bootstrap
/// tooling (or of [`snapshot::write_partition`] in tests).
pub struct Driver {
    store: SnapshotStore,
    sources: SourceSet,
    num_nodes: usize,
    alpha: f64,
    use_combiner: bool,
    range_partitioning: bool,
    num_partitions: Option<usize>,

    state: State,
    counters: Counters,
    missing_mass: f64,
}

impl std::fmt::Debug for Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Driver")
            .field("base", &self.store.base())
            .field("num_nodes", &self.num_nodes)
            .field("alpha", &self.alpha)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Driver {
    /// Creates a driver over the given store and source set.
    ///
    /// `num_nodes` is the total number of nodes in the graph; the algorithm
    /// itself does not depend on it, but range partitioning does.
    pub fn new(store: SnapshotStore, sources: SourceSet, num_nodes: usize) -> Self {
        Self {
            store,
            sources,
            num_nodes,
            alpha: 0.15,
            use_combiner: false,
            range_partitioning: false,
            num_partitions: None,
            state: State::Idle,
            counters: Counters::default(),
            missing_mass: 0.0,
        }
    }

    /// Sets the teleport probability α.
    ///
    /// # Panics
    ///
    /// Panics if `alpha` is not in the interval (0 . . 1).
    pub fn alpha(&mut self, alpha: f64) -> &mut Self {
        assert!(
            alpha > 0.0 && alpha < 1.0,
            "The teleport probability must be in (0 . . 1), got {alpha}"
        );
        self.alpha = alpha;
        self
    }

    /// Enables or disables the pre-shuffle combiner.
    ///
    /// The combiner reduces shuffle volume only; scores are unchanged up to
    /// floating-point rounding.
    pub fn combiner(&mut self, use_combiner: bool) -> &mut Self {
        self.use_combiner = use_combiner;
        self
    }

    /// Selects range partitioning instead of the default hash partitioning.
    ///
    /// Performance-only: the choice of partitioner never affects scores.
    pub fn range_partitioning(&mut self, range_partitioning: bool) -> &mut Self {
        self.range_partitioning = range_partitioning;
        self
    }

    /// Overrides the number of shuffle partitions.
    ///
    /// By default every round uses as many partitions as the input snapshot
    /// has partition files.
    ///
    /// # Panics
    ///
    /// Panics if `num_partitions` is `Some(0)`.
    pub fn num_partitions(&mut self, num_partitions: Option<usize>) -> &mut Self {
        assert!(
            num_partitions != Some(0),
            "The number of partitions must be positive"
        );
        self.num_partitions = num_partitions;
        self
    }

    /// Returns the current [`State`].
    pub fn state(&self) -> State {
        self.state
    }

    /// Returns the counters aggregated over all rounds run so far.
    pub fn counters(&self) -> Counters {
        self.counters
    }

    /// Returns the missing mass computed by the last completed round.
    pub fn missing_mass(&self) -> f64 {
        self.missing_mass
    }

    /// Runs every round from `start` to `end`.
    ///
    /// The round for iteration *k* reads `iterK` and produces `iterK+1`, so
    /// after the call the final scores are in the `end` iteration's snapshot.
    pub fn run(&mut self, start: usize, end: usize) -> Result<()> {
        self.run_with_logging(start, end, no_logging![], no_logging![])
    }

    /// Runs every round from `start` to `end`, logging progress.
    ///
    /// `pl` is a sequential [`ProgressLog`] counting iterations; `cpl` is a
    /// [`ConcurrentProgressLog`] counting nodes inside each phase. Either can
    /// be [`no_logging![]`](dsi_progress_logger::no_logging).
    pub fn run_with_logging(
        &mut self,
        start: usize,
        end: usize,
        pl: &mut impl ProgressLog,
        cpl: &mut impl ConcurrentProgressLog,
    ) -> Result<()> {
        ensure!(
            start <= end,
            "The start iteration ({start}) is past the end iteration ({end})"
        );

        log::info!("Base path: {}", self.store.base().display());
        log::info!("Start iteration: {start}");
        log::info!("End iteration: {end}");
        log::info!("Number of nodes: {}", self.num_nodes);
        log::info!("Sources: {:?}", self.sources.nodes());
        log::info!("Alpha: {}", self.alpha);
        log::info!("Combiner: {}", self.use_combiner);
        log::info!("Range partitioning: {}", self.range_partitioning);

        pl.item_name("iteration");
        pl.expected_updates(Some(end - start));
        pl.start(format!("Computing personalized PageRank (alpha={})...", self.alpha));

        for i in start..end {
            self.round(i, i + 1, cpl)?;
            pl.update_and_display();
        }

        self.state = State::Done;
        pl.done();
        Ok(())
    }

    /// Runs the round that turns snapshot `i` into snapshot `j` = `i` + 1.
    fn round(&mut self, i: usize, j: usize, cpl: &mut impl ConcurrentProgressLog) -> Result<()> {
        let total_mass = self.distribution_phase(i, j, cpl)?;
        let missing_mass = 1.0 - total_mass.exp();
        log::info!("Iteration {j}: retained mass (ln) = {total_mass}, missing mass = {missing_mass}");
        self.missing_mass = missing_mass;

        self.redistribution_phase(j, missing_mass, cpl)
    }

    /// Distribution, exchange, and accumulation: snapshot `i` to the
    /// pre-correction snapshot of iteration `j`, plus one retained-mass side
    /// file per worker. Returns the combined retained-mass total.
    fn distribution_phase(
        &mut self,
        i: usize,
        j: usize,
        cpl: &mut impl ConcurrentProgressLog,
    ) -> Result<f64> {
        let input = self.store.iteration(i);
        let output = self.store.pre_correction(j);
        let mass_dir = self.store.mass(j);
        snapshot::prepare_dir(&output)?;
        snapshot::prepare_dir(&mass_dir)?;

        let inputs = snapshot::partition_files(&input)?;
        ensure!(
            !inputs.is_empty(),
            "No partition files found in {}",
            input.display()
        );

        let num_partitions = self.num_partitions.unwrap_or(inputs.len());
        let partitioner = if self.range_partitioning {
            Partitioner::Range {
                num_partitions,
                num_nodes: self.num_nodes,
            }
        } else {
            Partitioner::Hash { num_partitions }
        };

        let num_sources = self.sources.num_sources();
        let use_combiner = self.use_combiner;

        // Map side: one message batch per input partition.
        self.state = State::Distributing;
        cpl.item_name("node");
        cpl.expected_updates(Some(self.num_nodes));
        cpl.start(format!("Iteration {j}: distributing mass..."));

        let map_outputs: Vec<(Vec<(usize, Message)>, Counters)> = inputs
            .par_iter()
            .map(|path| {
                let mut cpl = cpl.clone();
                let (partition_sources, records) = snapshot::read_partition(path)?;
                ensure!(
                    partition_sources == num_sources,
                    "Partition {} has {partition_sources} mass slots instead of {num_sources}",
                    path.display()
                );

                let mut counters = Counters::default();
                let mut messages = Vec::new();
                for record in &records {
                    distribute(record, &mut counters, |target, message| {
                        messages.push((target, message))
                    });
                }
                if use_combiner {
                    messages = combine(messages, &mut counters);
                }

                cpl.update_with_count(records.len());
                Ok((messages, counters))
            })
            .collect::<Result<_>>()?;

        cpl.done();

        let mut batches = Vec::with_capacity(map_outputs.len());
        for (messages, counters) in map_outputs {
            batches.push(messages);
            self.counters += counters;
        }

        // The shuffle barrier: every message is routed before any group is
        // reduced.
        let partitions = exchange(batches, &partitioner);

        // Reduce side: rebuild one record per id, one output partition and
        // one mass file per worker.
        self.state = State::Accumulating;
        cpl.item_name("node");
        cpl.expected_updates(Some(self.num_nodes));
        cpl.start(format!("Iteration {j}: accumulating mass..."));

        let reduce_counters: Vec<Counters> = partitions
            .into_par_iter()
            .enumerate()
            .map(|(worker, batch)| {
                let mut cpl = cpl.clone();
                let groups = group_by_key(batch);
                let output_partition = accumulate_partition(groups, num_sources)?;
                snapshot::write_partition(
                    &output,
                    worker,
                    num_sources,
                    &output_partition.records,
                )?;
                snapshot::write_mass(&mass_dir, worker, output_partition.retained_mass)?;
                cpl.update_with_count(output_partition.records.len());
                Ok(output_partition.counters)
            })
            .collect::<Result<_>>()?;

        cpl.done();
        for counters in reduce_counters {
            self.counters += counters;
        }

        // The side-file barrier: all retained-mass scalars are on disk, read
        // them back and combine.
        snapshot::total_mass(&mass_dir)
    }

    /// Redistribution: the pre-correction snapshot of iteration `j` to its
    /// final snapshot. A pure per-record pass, no shuffle.
    fn redistribution_phase(
        &mut self,
        j: usize,
        missing_mass: f64,
        cpl: &mut impl ConcurrentProgressLog,
    ) -> Result<()> {
        let input = self.store.pre_correction(j);
        let output = self.store.iteration(j);
        snapshot::prepare_dir(&output)?;

        let inputs = snapshot::partition_files(&input)?;
        let num_sources = self.sources.num_sources();
        let sources = &self.sources;
        let alpha = self.alpha;
        let output: &Path = &output;

        self.state = State::Redistributing;
        cpl.item_name("node");
        cpl.expected_updates(Some(self.num_nodes));
        cpl.start(format!("Iteration {j}: redistributing missing mass..."));

        inputs
            .par_iter()
            .enumerate()
            .map(|(worker, path)| {
                let mut cpl = cpl.clone();
                let (partition_sources, mut records) = snapshot::read_partition(path)?;
                ensure!(
                    partition_sources == num_sources,
                    "Partition {} has {partition_sources} mass slots instead of {num_sources}",
                    path.display()
                );

                for record in &mut records {
                    redistribute(record, sources, alpha, missing_mass);
                }

                snapshot::write_partition(output, worker, num_sources, &records)?;
                cpl.update_with_count(records.len());
                Ok(())
            })
            .collect::<Result<()>>()?;

        cpl.done();
        Ok(())
    }
}
