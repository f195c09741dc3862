/*
 * SPDX-FileCopyrightText: 2026 Inria
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Snapshot storage.
//!
//! A run lives under a base path holding one directory per iteration:
//! `iter0000`, `iter0001`, and so on, each a set of ε-serde partition files.
//! Round *k* additionally produces the pre-correction snapshot `iterXXXXt`
//! and the side directory `iterXXXXt-mass`, where every accumulation worker
//! leaves the log of the mass it retained; the driver combines those scalars
//! with [`log_sum`] before running the redistribution stage. Snapshots are
//! never rewritten once produced: output directories are cleared before a
//! phase starts and read-only afterwards.

use anyhow::{Context, Result, ensure};
use epserde::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

use crate::math::{LOG_ZERO, log_sum};
use crate::records::NodeRecord;

/// How a partition of node records is stored on disk.
///
/// The records are flattened into parallel arrays: ids, cumulative
/// successor offsets, the successors themselves, and the mass matrix in row
/// order (`num_sources` slots per record).
#[derive(Epserde, Debug, Clone)]
pub struct PartitionStore<A, B> {
    /// The number of mass slots per record.
    pub num_sources: usize,
    /// The node ids, in ascending order.
    pub nodes: A,
    /// Cumulative out-degrees; `nodes.len() + 1` entries starting at 0.
    pub offsets: A,
    /// The concatenated successor lists.
    pub successors: A,
    /// The concatenated mass vectors.
    pub mass: B,
}

/// How a worker's retained-mass scalar is stored on disk.
#[derive(Epserde, Debug, Clone, Copy)]
pub struct MassStore {
    /// The worker (partition) index.
    pub worker: usize,
    /// The natural log of the mass the worker retained.
    pub log_mass: f64,
}

/// Path layout of a run.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    base: PathBuf,
}

impl SnapshotStore {
    /// Creates a layout rooted at the given base path.
    pub fn new(base: impl AsRef<Path>) -> Self {
        Self {
            base: base.as_ref().to_owned(),
        }
    }

    /// Returns the base path.
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Returns the directory of the given iteration's final snapshot.
    pub fn iteration(&self, iteration: usize) -> PathBuf {
        self.base.join(format!("iter{iteration:04}"))
    }

    /// Returns the directory of the given iteration's pre-correction
    /// snapshot, the output of accumulation before redistribution runs.
    pub fn pre_correction(&self, iteration: usize) -> PathBuf {
        self.base.join(format!("iter{iteration:04}t"))
    }

    /// Returns the directory of the given iteration's retained-mass side
    /// files.
    pub fn mass(&self, iteration: usize) -> PathBuf {
        self.base.join(format!("iter{iteration:04}t-mass"))
    }
}

/// Clears and recreates an output directory.
pub fn prepare_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        fs::remove_dir_all(dir)
            .with_context(|| format!("Could not remove {}", dir.display()))?;
    }
    fs::create_dir_all(dir).with_context(|| format!("Could not create {}", dir.display()))
}

/// Enumerates the files of a directory with the given name prefix and a
/// `.bin` extension, in name order.
fn binary_files(dir: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Could not list {}", dir.display()))?
        .filter_map(Result::ok)
        .filter(|entry| {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            name.starts_with(prefix)
                && name.ends_with(".bin")
                && entry.file_type().is_ok_and(|ft| ft.is_file())
        })
        .map(|entry| entry.path())
        .collect();
    files.sort();
    Ok(files)
}

/// Enumerates the partition files of a snapshot directory, in name order.
pub fn partition_files(dir: &Path) -> Result<Vec<PathBuf>> {
    binary_files(dir, "part_")
}

/// Writes one partition of records.
///
/// # Errors
///
/// Every record must carry exactly `num_sources` mass slots.
pub fn write_partition(
    dir: &Path,
    index: usize,
    num_sources: usize,
    records: &[NodeRecord],
) -> Result<()> {
    let mut nodes = Vec::with_capacity(records.len());
    let mut offsets = Vec::with_capacity(records.len() + 1);
    let mut successors = Vec::new();
    let mut mass = Vec::with_capacity(records.len() * num_sources);

    offsets.push(0);
    for record in records {
        ensure!(
            record.mass.len() == num_sources,
            "Record for node {} has {} mass slots instead of {num_sources}",
            record.node,
            record.mass.len()
        );
        nodes.push(record.node);
        successors.extend_from_slice(&record.successors);
        offsets.push(successors.len());
        mass.extend_from_slice(&record.mass);
    }

    let store = PartitionStore {
        num_sources,
        nodes,
        offsets,
        successors,
        mass,
    };

    let path = dir.join(format!("part_{index:04}.bin"));
    // SAFETY: the type is ε-serde serializable and the path is valid.
    unsafe { store.store(&path) }
        .with_context(|| format!("Could not serialize partition to {}", path.display()))?;
    Ok(())
}

/// Reads one partition of records, returning its slot count as well.
pub fn read_partition(path: &Path) -> Result<(usize, Vec<NodeRecord>)> {
    // SAFETY: partition files are written by write_partition with this
    // ε-serde schema.
    let store = unsafe { <PartitionStore<Vec<usize>, Vec<f64>>>::load_mem(path) }
        .with_context(|| format!("Could not load partition from {}", path.display()))?;
    let store = &*store;

    let num_sources = store.num_sources;
    ensure!(
        store.offsets.len() == store.nodes.len() + 1
            && store.mass.len() == store.nodes.len() * num_sources,
        "Partition file {} is corrupt",
        path.display()
    );

    let mut records = Vec::with_capacity(store.nodes.len());
    for (i, &node) in store.nodes.iter().enumerate() {
        records.push(NodeRecord {
            node,
            successors: store.successors[store.offsets[i]..store.offsets[i + 1]].to_vec(),
            mass: store.mass[i * num_sources..(i + 1) * num_sources].to_vec(),
        });
    }

    Ok((num_sources, records))
}

/// Writes one worker's retained-mass scalar.
pub fn write_mass(dir: &Path, worker: usize, log_mass: f64) -> Result<()> {
    let store = MassStore { worker, log_mass };
    let path = dir.join(format!("mass_{worker:04}.bin"));
    // SAFETY: the type is ε-serde serializable and the path is valid.
    unsafe { store.store(&path) }
        .with_context(|| format!("Could not serialize retained mass to {}", path.display()))?;
    Ok(())
}

/// Combines every retained-mass scalar found in a side directory with
/// [`log_sum`].
///
/// # Errors
///
/// A side directory with no mass files means the accumulation stage did not
/// complete and is rejected.
pub fn total_mass(dir: &Path) -> Result<f64> {
    let files = binary_files(dir, "mass_")?;
    ensure!(!files.is_empty(), "No mass files found in {}", dir.display());

    let mut total = LOG_ZERO;
    for path in &files {
        // SAFETY: mass files are written by write_mass with this ε-serde
        // schema.
        let store = unsafe { <MassStore>::load_mem(path) }
            .with_context(|| format!("Could not load retained mass from {}", path.display()))?;
        total = log_sum(total, store.log_mass);
    }
    Ok(total)
}
