//! Parallel CPM move search.
//!
//! Workers evaluate moves concurrently; the driver commits at most one
//! move per outer iteration, so the aggregate state stays exactly as a
//! sequential commit order would leave it. The parallelism accelerates
//! move *evaluation*, not move *commitment*, and pays off when the
//! graph is large relative to per-node work.

use std::collections::HashMap;
use std::ops::Range;

use rayon::prelude::*;

use super::{initialize_communities, neighbor_community_weights};
use crate::error::{Error, Result};
use crate::network::{CommunityId, Network, NodeId};

/// CPM engine with shared-nothing parallel move search.
///
/// Per outer iteration: the node array is split into contiguous ranges
/// balanced by weighted degree, each worker scans its range against a
/// read-only size snapshot and reports its single best candidate move,
/// and the driver commits the globally best proposal (ties go to the
/// lowest worker index, then to the worker's scan order). The loop
/// ends when no worker can propose a move that clears `min_gain`.
///
/// There is no randomized sweep here: with one commit per iteration
/// the outcome is deterministic for a given worker count.
#[derive(Debug, Clone)]
pub struct ParallelPotts {
    /// Resolution parameter (gamma). Higher = smaller communities.
    resolution: f64,
    /// Minimum gain for a proposal to be considered.
    min_gain: f64,
    /// Worker count; defaults to rayon's thread-pool size.
    workers: Option<usize>,
}

impl ParallelPotts {
    /// Create an engine with resolution 1.0 and `min_gain` 1e-6.
    pub fn new() -> Self {
        Self {
            resolution: 1.0,
            min_gain: 1e-6,
            workers: None,
        }
    }

    /// Set the resolution parameter. Must be positive.
    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = resolution;
        self
    }

    /// Set the minimum gain threshold. Must be positive.
    pub fn with_min_gain(mut self, min_gain: f64) -> Self {
        self.min_gain = min_gain;
        self
    }

    /// Set the number of scan ranges. Must be at least 1.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Run the engine, relabeling the network's nodes in place.
    pub fn run(&self, net: &mut Network) -> Result<()> {
        if self.resolution <= 0.0 {
            return Err(Error::InvalidParameter {
                name: "resolution",
                message: "must be positive",
            });
        }
        if self.min_gain <= 0.0 {
            return Err(Error::InvalidParameter {
                name: "min_gain",
                message: "must be positive",
            });
        }
        if self.workers == Some(0) {
            return Err(Error::InvalidParameter {
                name: "workers",
                message: "must be at least 1",
            });
        }
        if net.node_count() == 0 {
            return Ok(());
        }
        let workers = self.workers.unwrap_or_else(rayon::current_num_threads).max(1);

        initialize_communities(net);

        // Node order and degrees are fixed for the whole run; only the
        // labels and the size table evolve.
        let order: Vec<NodeId> = net.node_ids().collect();
        let degrees: Vec<f64> = order.iter().map(|&v| net.weighted_degree(v)).collect();
        let ranges = balance_ranges(&degrees, workers);

        let mut iterations = 0usize;
        loop {
            iterations += 1;

            // Serial prologue: fresh size snapshot for this iteration.
            let mut sizes: HashMap<CommunityId, usize> = HashMap::new();
            for node in net.nodes() {
                *sizes.entry(node.community()).or_insert(0) += 1;
            }

            let shared: &Network = net;
            let proposals: Vec<Option<Proposal>> = ranges
                .par_iter()
                .map(|range| {
                    scan_range(
                        shared,
                        &order[range.clone()],
                        &sizes,
                        self.resolution,
                        self.min_gain,
                    )
                })
                .collect();

            // Serial epilogue: commit the single best proposal. The
            // strict comparison keeps ties with the lowest worker.
            let mut best: Option<Proposal> = None;
            for proposal in proposals.into_iter().flatten() {
                if best.map_or(true, |b| proposal.gain > b.gain) {
                    best = Some(proposal);
                }
            }
            let Some(accepted) = best else { break };
            if let Some(node) = net.node_mut(accepted.node) {
                node.set_community(accepted.target);
            }
        }

        tracing::debug!(
            iterations,
            workers,
            communities = net.communities().len(),
            "parallel cpm run done"
        );
        Ok(())
    }
}

impl Default for ParallelPotts {
    fn default() -> Self {
        Self::new()
    }
}

/// A worker's best candidate move.
#[derive(Debug, Clone, Copy)]
struct Proposal {
    node: NodeId,
    target: CommunityId,
    gain: f64,
}

/// Split `0..degrees.len()` into `workers` contiguous ranges, each
/// accumulating roughly `total_degree / workers` of scan work. Trailing
/// ranges may be empty once the sweep exhausts the nodes.
fn balance_ranges(degrees: &[f64], workers: usize) -> Vec<Range<usize>> {
    let total: f64 = degrees.iter().sum();
    let share = total / workers as f64;

    let mut ranges = Vec::with_capacity(workers);
    let mut start = 0usize;
    let mut acc = 0.0;
    for (i, &degree) in degrees.iter().enumerate() {
        acc += degree;
        if acc >= share && ranges.len() + 1 < workers {
            ranges.push(start..i + 1);
            start = i + 1;
            acc = 0.0;
        }
    }
    ranges.push(start..degrees.len());
    while ranges.len() < workers {
        ranges.push(degrees.len()..degrees.len());
    }
    ranges
}

/// Scan one range read-only and report the best move clearing
/// `min_gain`, if any. Ties within the range go to the node scanned
/// first.
fn scan_range(
    net: &Network,
    nodes: &[NodeId],
    sizes: &HashMap<CommunityId, usize>,
    resolution: f64,
    min_gain: f64,
) -> Option<Proposal> {
    let mut best: Option<Proposal> = None;
    for &v in nodes {
        let Some(node) = net.node(v) else { continue };
        let current = node.community();
        let weights = neighbor_community_weights(net, node);
        let w_current = weights.get(&current).copied().unwrap_or(0.0);
        let size_current = sizes.get(&current).copied().unwrap_or(0) as f64;

        for (&candidate, &w_candidate) in &weights {
            if candidate == current {
                continue;
            }
            let size_candidate = sizes.get(&candidate).copied().unwrap_or(0) as f64;
            let gain =
                (w_candidate - w_current) + resolution * (size_current - size_candidate - 1.0);
            if gain > min_gain && best.map_or(true, |b| gain > b.gain) {
                best = Some(Proposal {
                    node: v,
                    target: candidate,
                    gain,
                });
            }
        }
    }
    best
}

#[cfg(test)]
#[allow(clippy::unwrap_used, unused_results)]
mod tests {
    use super::*;
    use crate::network::Node;
    use crate::optimize::ConstantPotts;
    use std::collections::BTreeSet;

    fn bridged_triangles() -> Network {
        let mut net = Network::new();
        net.add_edge(1, 2, 1.0);
        net.add_edge(2, 3, 1.0);
        net.add_edge(1, 3, 1.0);
        net.add_edge(4, 5, 1.0);
        net.add_edge(5, 6, 1.0);
        net.add_edge(4, 6, 1.0);
        net.add_edge(3, 4, 0.1);
        net
    }

    fn community_sets(net: &Network) -> BTreeSet<BTreeSet<NodeId>> {
        net.communities()
            .into_values()
            .map(|members| members.into_iter().collect())
            .collect()
    }

    #[test]
    fn test_balance_ranges_cover_all_nodes() {
        let degrees = vec![2.0, 2.0, 2.1, 2.1, 2.0, 2.0];
        for workers in 1..=8 {
            let ranges = balance_ranges(&degrees, workers);
            assert_eq!(ranges.len(), workers);
            let mut next = 0;
            for range in &ranges {
                assert_eq!(range.start, next);
                next = range.end;
            }
            assert_eq!(next, degrees.len());
        }
    }

    #[test]
    fn test_balance_ranges_zero_total_degree() {
        let degrees = vec![0.0; 4];
        let ranges = balance_ranges(&degrees, 3);
        assert_eq!(ranges.len(), 3);
        assert_eq!(ranges.last().unwrap().end, 4);
    }

    #[test]
    fn test_finds_triangle_communities() {
        let mut net = bridged_triangles();
        ParallelPotts::new()
            .with_resolution(0.5)
            .run(&mut net)
            .unwrap();
        let sets = community_sets(&net);
        assert!(sets.contains(&BTreeSet::from([1, 2, 3])));
        assert!(sets.contains(&BTreeSet::from([4, 5, 6])));
    }

    #[test]
    fn test_worker_count_does_not_change_community_sets() {
        let mut reference = bridged_triangles();
        ConstantPotts::new()
            .with_resolution(0.5)
            .with_seed(17)
            .run(&mut reference)
            .unwrap();
        let expected = community_sets(&reference);

        for workers in [1, 2, 4] {
            let mut net = bridged_triangles();
            ParallelPotts::new()
                .with_resolution(0.5)
                .with_workers(workers)
                .run(&mut net)
                .unwrap();
            assert_eq!(community_sets(&net), expected, "workers = {workers}");
        }
    }

    #[test]
    fn test_runs_are_deterministic() {
        let mut a = bridged_triangles();
        let mut b = bridged_triangles();
        let engine = ParallelPotts::new().with_resolution(0.5).with_workers(3);
        engine.run(&mut a).unwrap();
        engine.run(&mut b).unwrap();
        let la: Vec<_> = a.nodes().map(Node::community).collect();
        let lb: Vec<_> = b.nodes().map(Node::community).collect();
        assert_eq!(la, lb);
    }

    #[test]
    fn test_empty_network_is_noop() {
        let mut net = Network::new();
        ParallelPotts::new().run(&mut net).unwrap();
        assert_eq!(net.node_count(), 0);
    }

    #[test]
    fn test_invalid_workers() {
        let mut net = Network::new();
        let err = ParallelPotts::new().with_workers(0).run(&mut net);
        assert!(matches!(err, Err(Error::InvalidParameter { .. })));
    }

    #[test]
    fn test_high_resolution_keeps_singletons() {
        let mut net = bridged_triangles();
        ParallelPotts::new()
            .with_resolution(10.0)
            .run(&mut net)
            .unwrap();
        assert_eq!(net.communities().len(), 6);
    }
}
