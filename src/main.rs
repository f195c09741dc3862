/*
 * SPDX-FileCopyrightText: 2026 Inria
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use anyhow::{Context, Result, ensure};
use clap::Parser;
use dsi_progress_logger::{ProgressLog, concurrent_progress_logger, progress_logger};
use std::path::PathBuf;

use logrank::driver::Driver;
use logrank::snapshot::SnapshotStore;
use logrank::sources::SourceSet;

#[derive(Parser, Debug)]
#[command(
    name = "logrank",
    about = "Compute personalized PageRank by rounds of a partitioned dataflow.",
    long_about = None
)]
struct CliArgs {
    /// The base path holding the iteration snapshots.
    ///
    /// The run starts from BASE/iterXXXX at the start iteration and leaves
    /// the final scores at the end iteration's directory.
    pub base: PathBuf,

    #[arg(short, long)]
    /// The start iteration.
    pub start: usize,

    #[arg(short, long)]
    /// The end iteration.
    pub end: usize,

    #[arg(short, long)]
    /// The total number of nodes in the graph.
    pub num_nodes: usize,

    #[arg(short = 'S', long, required = true, value_delimiter = ',')]
    /// The source node ids, in slot order.
    pub sources: Vec<usize>,

    #[arg(short, long, default_value_t = 0.15)]
    /// The teleport probability α (must be in the interval (0 . . 1)).
    pub alpha: f64,

    #[arg(long)]
    /// Merge mass messages per target before the shuffle.
    pub combiner: bool,

    #[arg(long)]
    /// Partition the shuffle by id ranges instead of hashing.
    pub range: bool,

    #[arg(long)]
    /// Override the number of shuffle partitions (default: the number of
    /// input partition files).
    pub partitions: Option<usize>,

    #[arg(short, long, default_value_t = num_cpus::get())]
    /// The number of threads.
    pub threads: usize,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = CliArgs::parse();
    ensure!(
        args.alpha > 0.0 && args.alpha < 1.0,
        "The teleport probability must be in (0 . . 1), got {}",
        args.alpha
    );

    let mut pl = progress_logger![];
    pl.display_memory(true);
    let mut cpl = concurrent_progress_logger![];
    cpl.display_memory(true);

    let thread_pool = rayon::ThreadPoolBuilder::new()
        .num_threads(args.threads)
        .build()
        .context("Could not create thread pool")?;

    let sources = SourceSet::new(args.sources)?;
    let mut driver = Driver::new(SnapshotStore::new(&args.base), sources, args.num_nodes);
    driver
        .alpha(args.alpha)
        .combiner(args.combiner)
        .range_partitioning(args.range)
        .num_partitions(args.partitions);

    thread_pool.install(|| driver.run_with_logging(args.start, args.end, &mut pl, &mut cpl))?;

    log::info!("Counters: {}", driver.counters());
    log::info!("Missing mass after the last round: {}", driver.missing_mass());

    Ok(())
}
