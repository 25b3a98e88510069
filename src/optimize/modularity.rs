//! Modularity local moving.

use std::collections::HashMap;

use super::{initialize_communities, local_moving, make_rng, Objective};
use crate::error::{Error, Result};
use crate::network::{CommunityId, Edge, Network, NodeId};

/// Modularity-optimizing community engine.
///
/// Relabels each node's community in place by greedy local moves; see
/// the [module docs](super) for the objective and the move policy.
///
/// ## Example
///
/// ```rust
/// use commune::{Modularity, Network};
///
/// let mut net = Network::new();
/// net.add_edge(1, 2, 1.0);
/// net.add_edge(2, 3, 1.0);
/// net.add_edge(1, 3, 1.0);
///
/// Modularity::new().run(&mut net).unwrap();
///
/// let c = net.node(1).unwrap().community();
/// assert_eq!(net.node(2).unwrap().community(), c);
/// assert_eq!(net.node(3).unwrap().community(), c);
/// ```
#[derive(Debug, Clone)]
pub struct Modularity {
    /// Minimum gain for a move to be accepted.
    min_gain: f64,
    /// Safety cap on full passes.
    max_passes: usize,
    /// Random seed for the pass permutation.
    seed: Option<u64>,
}

impl Modularity {
    /// Create an engine with the default `min_gain` of 1e-6.
    pub fn new() -> Self {
        Self {
            min_gain: 1e-6,
            max_passes: 100,
            seed: None,
        }
    }

    /// Set the minimum gain threshold. Must be positive.
    pub fn with_min_gain(mut self, min_gain: f64) -> Self {
        self.min_gain = min_gain;
        self
    }

    /// Set the maximum number of full passes.
    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes;
        self
    }

    /// Set a random seed for reproducible label assignments.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Run the engine, relabeling the network's nodes in place.
    ///
    /// Empty networks and networks with zero total weight are left as
    /// the singleton partition.
    pub fn run(&self, net: &mut Network) -> Result<()> {
        if self.min_gain <= 0.0 {
            return Err(Error::InvalidParameter {
                name: "min_gain",
                message: "must be positive",
            });
        }
        if net.node_count() == 0 {
            return Ok(());
        }

        initialize_communities(net);

        let mut objective = DegreeAggregates::default();
        if !objective.prepare(net) {
            return Ok(());
        }

        let mut rng = make_rng(self.seed);
        let passes = local_moving(
            net,
            &mut objective,
            self.min_gain,
            self.max_passes,
            rng.as_mut(),
        );
        tracing::debug!(passes, communities = net.communities().len(), "modularity run done");
        Ok(())
    }
}

impl Default for Modularity {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-run modularity aggregates: `m` and `k[v]` are constant across
/// the run, `Σ_tot[c]` tracks accepted moves incrementally.
#[derive(Debug, Default)]
struct DegreeAggregates {
    m: f64,
    degrees: HashMap<NodeId, f64>,
    community_degrees: HashMap<CommunityId, f64>,
}

impl Objective for DegreeAggregates {
    fn prepare(&mut self, net: &Network) -> bool {
        self.m = net.total_weight();
        self.degrees.clear();
        self.community_degrees.clear();
        if self.m == 0.0 {
            return false;
        }
        for node in net.nodes() {
            let k: f64 = node
                .adjacency()
                .iter()
                .filter_map(|&e| net.edge(e))
                .map(Edge::weight)
                .sum();
            let _ = self.degrees.insert(node.id(), k);
            *self.community_degrees.entry(node.community()).or_insert(0.0) += k;
        }
        true
    }

    fn gain(&self, v: NodeId, from: CommunityId, to: CommunityId, w_from: f64, w_to: f64) -> f64 {
        let k = self.degrees.get(&v).copied().unwrap_or(0.0);
        let sigma_from = self.community_degrees.get(&from).copied().unwrap_or(0.0);
        let sigma_to = self.community_degrees.get(&to).copied().unwrap_or(0.0);
        (w_to - w_from) / self.m + k * (sigma_from - sigma_to - k) / (2.0 * self.m * self.m)
    }

    fn commit(&mut self, v: NodeId, from: CommunityId, to: CommunityId) {
        let k = self.degrees.get(&v).copied().unwrap_or(0.0);
        *self.community_degrees.entry(from).or_insert(0.0) -= k;
        *self.community_degrees.entry(to).or_insert(0.0) += k;
    }
}
