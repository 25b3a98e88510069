//! # commune
//!
//! Community detection on mutable weighted networks.
//!
//! The crate has three parts: a [`Network`] store with stable ids and
//! consistent adjacency under mutation, local-moving optimization
//! engines for two quality functions ([`Modularity`] and the Constant
//! Potts Model, [`ConstantPotts`], plus a parallel CPM variant), and
//! a contraction pass ([`merge_communities`]) that collapses each
//! discovered community into a super-node so the engines can recurse.
//!
//! ```rust
//! use commune::{merge_communities, Modularity, Network};
//!
//! let mut net = Network::new();
//! net.add_edge(1, 2, 1.0);
//! net.add_edge(2, 3, 1.0);
//! net.add_edge(1, 3, 1.0);
//!
//! Modularity::new().with_seed(7).run(&mut net).unwrap();
//! merge_communities(&mut net);
//!
//! // The triangle collapsed into one super-node covering all of it.
//! assert_eq!(net.node_count(), 1);
//! assert_eq!(net.nodes().next().unwrap().members(), &[1, 2, 3]);
//! ```

pub mod contract;
pub mod error;
pub mod loader;
pub mod network;
pub mod optimize;

#[cfg(test)]
mod scenario_tests;

pub use contract::merge_communities;
pub use error::{Error, Result};
pub use loader::load_network_csv;
pub use network::{CommunityId, Edge, EdgeId, Network, Node, NodeId};
pub use optimize::{ConstantPotts, Modularity};

#[cfg(feature = "parallel")]
pub use optimize::ParallelPotts;
