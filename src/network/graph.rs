//! The network store.

use std::collections::BTreeMap;

use petgraph::graph::UnGraph;
use petgraph::visit::EdgeRef;

use super::{CommunityId, Edge, EdgeId, Node, NodeId};

/// A mutable weighted undirected graph.
///
/// Owns its nodes and edges in id-keyed tables and keeps adjacency
/// lists consistent on every mutation. See the
/// [module docs](super) for the full set of guarantees.
///
/// ## Example
///
/// ```rust
/// use commune::Network;
///
/// let mut net = Network::new();
/// let e = net.add_edge(1, 2, 0.5);
/// net.add_edge(2, 3, 1.0);
///
/// assert_eq!(net.node_count(), 3);
/// assert_eq!(net.edges_of(2).len(), 2);
///
/// net.remove_edge(e);
/// assert_eq!(net.edges_of(1).len(), 0);
/// ```
#[derive(Debug, Default)]
pub struct Network {
    nodes: BTreeMap<NodeId, Node>,
    edges: BTreeMap<EdgeId, Edge>,
    next_edge_id: EdgeId,
}

impl Network {
    /// Create an empty network.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of live edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Look up a node by id.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Look up a node by id, mutably.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// Look up an edge by id.
    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(&id)
    }

    /// Insert a node, or return the existing one unchanged.
    pub fn add_node(&mut self, id: NodeId) -> &mut Node {
        self.nodes.entry(id).or_insert_with(|| Node::new(id))
    }

    /// Insert an edge between `origin` and `destiny`, creating either
    /// endpoint if it does not exist yet.
    ///
    /// Self-loops and parallel edges are permitted; each call allocates
    /// a fresh edge id. Returns the new edge's id.
    pub fn add_edge(&mut self, origin: NodeId, destiny: NodeId, weight: f64) -> EdgeId {
        let _ = self.add_node(origin);
        let _ = self.add_node(destiny);

        let id = self.next_edge_id;
        self.next_edge_id += 1;
        let _ = self.edges.insert(id, Edge::new(id, origin, destiny, weight));

        if let Some(node) = self.nodes.get_mut(&origin) {
            node.add_incident(id);
        }
        // A self-loop appears in the adjacency once.
        if origin != destiny {
            if let Some(node) = self.nodes.get_mut(&destiny) {
                node.add_incident(id);
            }
        }
        id
    }

    /// Remove an edge from the table and from both endpoints'
    /// adjacencies. No-op if the id is not live.
    pub fn remove_edge(&mut self, id: EdgeId) {
        let Some(edge) = self.edges.remove(&id) else {
            return;
        };
        let (n1, n2) = edge.endpoints();
        if let Some(node) = self.nodes.get_mut(&n1) {
            node.remove_incident(id);
        }
        if n2 != n1 {
            if let Some(node) = self.nodes.get_mut(&n2) {
                node.remove_incident(id);
            }
        }
    }

    /// Remove a node and all its incident edges. No-op if absent.
    pub fn remove_node(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        // Snapshot first: remove_edge mutates the adjacency we iterate.
        let incident: Vec<EdgeId> = node.adjacency().to_vec();
        for edge in incident {
            self.remove_edge(edge);
        }
        let _ = self.nodes.remove(&id);
    }

    /// The adjacency of a node, or an empty slice if the node is absent.
    pub fn edges_of(&self, id: NodeId) -> &[EdgeId] {
        self.nodes.get(&id).map(|n| n.adjacency()).unwrap_or(&[])
    }

    /// Sum of the weights of a node's incident edges (self-loops
    /// counted once). `0.0` if the node is absent.
    pub fn weighted_degree(&self, id: NodeId) -> f64 {
        self.edges_of(id)
            .iter()
            .filter_map(|&e| self.edge(e))
            .map(Edge::weight)
            .sum()
    }

    /// Total weight of all live edges.
    pub fn total_weight(&self) -> f64 {
        self.edges.values().map(Edge::weight).sum()
    }

    /// Nodes in ascending id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Mutable access to all nodes, in ascending id order.
    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.values_mut()
    }

    /// Node ids in ascending order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Edges in ascending id order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Group node ids by their current community label.
    pub fn communities(&self) -> BTreeMap<CommunityId, Vec<NodeId>> {
        let mut groups: BTreeMap<CommunityId, Vec<NodeId>> = BTreeMap::new();
        for node in self.nodes.values() {
            groups.entry(node.community()).or_default().push(node.id());
        }
        groups
    }

    /// Build a network from a petgraph undirected graph with `f64` edge
    /// weights. Node indices become node ids.
    pub fn from_ungraph<N>(graph: &UnGraph<N, f64>) -> Self {
        let mut net = Self::new();
        for idx in graph.node_indices() {
            let _ = net.add_node(idx.index() as NodeId);
        }
        for edge in graph.edge_references() {
            let _ = net.add_edge(
                edge.source().index() as NodeId,
                edge.target().index() as NodeId,
                *edge.weight(),
            );
        }
        net
    }
}
