//! Community contraction.
//!
//! After an optimization run has labeled the network, each multi-node
//! community can be collapsed into a single super-node whose adjacency
//! is the weighted sum of the community's external edges. The
//! contracted network is a valid optimizer input again, which is how a
//! hierarchy of partitions is built: run, contract, run again.

use std::collections::{BTreeMap, HashSet};

use crate::network::{Network, NodeId};

/// Replace every community of two or more nodes with one super-node.
///
/// Super-nodes get fresh ids starting past the largest live node id,
/// allocated in community-label order, and keep the community label of
/// the nodes they replace. Their `members` list records the original
/// base-graph ids; unions of members survive repeated contraction, so
/// provenance is never lost. Edges internal to a community are dropped;
/// external edges are merged per neighbor into one weighted edge.
///
/// Communities of size 1 are left untouched, which keeps singletons
/// stable across repeated contraction rounds.
pub fn merge_communities(net: &mut Network) {
    let groups = net.communities();
    let Some(max_id) = net.node_ids().last() else {
        return;
    };
    let mut next_id = max_id + 1;

    for (community, originals) in groups {
        if originals.len() < 2 {
            continue;
        }
        let original_set: HashSet<NodeId> = originals.iter().copied().collect();

        // Roll provenance up: a node already produced by contraction
        // contributes its members, a base node contributes itself.
        let mut members: Vec<NodeId> = Vec::new();
        // External weight per outside neighbor, in neighbor-id order.
        let mut external: BTreeMap<NodeId, f64> = BTreeMap::new();

        for &u in &originals {
            let Some(node) = net.node(u) else { continue };
            if node.members().is_empty() {
                members.push(u);
            } else {
                members.extend_from_slice(node.members());
            }
            for &eid in node.adjacency() {
                let Some(edge) = net.edge(eid) else { continue };
                let Some(opposite) = edge.opposite(u) else { continue };
                if original_set.contains(&opposite) {
                    // Internal to the community (self-loops included):
                    // not represented in the contracted graph.
                    continue;
                }
                *external.entry(opposite).or_insert(0.0) += edge.weight();
            }
        }

        let super_id = next_id;
        next_id += 1;
        {
            let super_node = net.add_node(super_id);
            super_node.set_community(community);
            super_node.set_members(members);
        }
        for (neighbor, total) in external {
            let _ = net.add_edge(super_id, neighbor, total);
        }
        for u in originals {
            net.remove_node(u);
        }
    }

    tracing::debug!(
        nodes = net.node_count(),
        edges = net.edge_count(),
        "contraction complete"
    );
}
