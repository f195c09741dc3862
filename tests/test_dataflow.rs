/*
 * SPDX-FileCopyrightText: 2026 Inria
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use logrank::dataflow::{Partitioner, exchange, group_by_key};

#[test]
fn test_hash_partitioner() {
    let p = Partitioner::Hash { num_partitions: 4 };
    assert_eq!(p.num_partitions(), 4);
    for node in 0..100 {
        assert_eq!(p.partition(node), node % 4);
    }
}

#[test]
fn test_range_partitioner_covers_and_is_monotone() {
    let p = Partitioner::Range {
        num_partitions: 3,
        num_nodes: 10,
    };
    let partitions: Vec<usize> = (0..10).map(|node| p.partition(node)).collect();

    // Monotone over the id space, all partitions used, ids past num_nodes
    // clamped into the last partition.
    assert!(partitions.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(partitions[0], 0);
    assert_eq!(partitions[9], 2);
    assert_eq!(p.partition(10_000), 2);
}

#[test]
fn test_exchange_routes_by_key_and_preserves_batch_order() {
    let batches = vec![
        vec![(0, "a0"), (1, "a1"), (2, "a2")],
        vec![(2, "b2"), (0, "b0")],
        vec![(4, "c4"), (0, "c0")],
    ];
    let partitions = exchange(batches, &Partitioner::Hash { num_partitions: 2 });

    assert_eq!(
        partitions[0],
        vec![(0, "a0"), (2, "a2"), (2, "b2"), (0, "b0"), (4, "c4"), (0, "c0")]
    );
    assert_eq!(partitions[1], vec![(1, "a1")]);
}

#[test]
fn test_exchange_is_deterministic_across_thread_counts() {
    let batches: Vec<Vec<(usize, usize)>> = (0..8)
        .map(|b| (0..100).map(|i| (i * 7 % 50, b * 1000 + i)).collect())
        .collect();

    let run = |threads: usize| {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .unwrap();
        pool.install(|| {
            exchange(
                batches.clone(),
                &Partitioner::Hash { num_partitions: 5 },
            )
        })
    };

    assert_eq!(run(1), run(4));
}

#[test]
fn test_group_by_key_sorted_keys() {
    let groups = group_by_key(vec![(3, 'a'), (1, 'b'), (3, 'c'), (2, 'd')]);

    let keys: Vec<usize> = groups.keys().copied().collect();
    assert_eq!(keys, vec![1, 2, 3]);
    assert_eq!(groups[&3], vec!['a', 'c']);
}
