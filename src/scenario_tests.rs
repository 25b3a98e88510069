//! End-to-end scenarios: optimize, contract, repeat.

#[cfg(test)]
#[allow(clippy::unwrap_used, unused_results)]
mod tests {
    use std::collections::BTreeSet;

    use crate::contract::merge_communities;
    use crate::network::{Network, NodeId};
    use crate::optimize::{ConstantPotts, Modularity};

    fn triangles(bridge: Option<f64>) -> Network {
        let mut net = Network::new();
        net.add_edge(1, 2, 1.0);
        net.add_edge(2, 3, 1.0);
        net.add_edge(1, 3, 1.0);
        net.add_edge(4, 5, 1.0);
        net.add_edge(5, 6, 1.0);
        net.add_edge(4, 6, 1.0);
        if let Some(weight) = bridge {
            net.add_edge(3, 4, weight);
        }
        net
    }

    fn community_sets(net: &Network) -> BTreeSet<BTreeSet<NodeId>> {
        net.communities()
            .into_values()
            .map(|members| members.into_iter().collect())
            .collect()
    }

    #[test]
    fn empty_network_full_pipeline_is_noop() {
        let mut net = Network::new();
        Modularity::new().run(&mut net).unwrap();
        ConstantPotts::new().run(&mut net).unwrap();
        merge_communities(&mut net);
        assert_eq!(net.node_count(), 0);
        assert_eq!(net.edge_count(), 0);
    }

    #[test]
    fn disconnected_triangles_contract_to_two_isolated_supers() {
        let mut net = triangles(None);
        Modularity::new().with_seed(21).run(&mut net).unwrap();
        assert_eq!(net.communities().len(), 2);

        merge_communities(&mut net);
        assert_eq!(net.node_count(), 2);
        assert_eq!(net.edge_count(), 0);

        let members: BTreeSet<BTreeSet<NodeId>> = net
            .nodes()
            .map(|n| n.members().iter().copied().collect())
            .collect();
        assert!(members.contains(&BTreeSet::from([1, 2, 3])));
        assert!(members.contains(&BTreeSet::from([4, 5, 6])));
        // Fresh super-node ids start past the largest original id.
        let ids: Vec<NodeId> = net.node_ids().collect();
        assert_eq!(ids, vec![7, 8]);
    }

    #[test]
    fn bridged_triangles_keep_the_bridge_weight_through_contraction() {
        let mut net = triangles(Some(0.1));
        Modularity::new().with_seed(21).run(&mut net).unwrap();
        assert_eq!(net.communities().len(), 2);

        merge_communities(&mut net);
        assert_eq!(net.node_count(), 2);
        assert_eq!(net.edge_count(), 1);
        let edge = net.edges().next().unwrap();
        assert!((edge.weight() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn cpm_resolution_controls_clique_granularity() {
        let four_clique = || {
            let mut net = Network::new();
            for a in 1..=4u32 {
                for b in (a + 1)..=4 {
                    net.add_edge(a, b, 1.0);
                }
            }
            net
        };

        let mut coarse = four_clique();
        ConstantPotts::new()
            .with_resolution(0.5)
            .with_seed(2)
            .run(&mut coarse)
            .unwrap();
        assert_eq!(coarse.communities().len(), 1);

        let mut fine = four_clique();
        ConstantPotts::new()
            .with_resolution(10.0)
            .with_seed(2)
            .run(&mut fine)
            .unwrap();
        assert_eq!(fine.communities().len(), 4);
    }

    #[test]
    fn self_loop_singleton_survives_the_pipeline() {
        let mut net = Network::new();
        net.add_edge(1, 1, 2.0);

        Modularity::new().run(&mut net).unwrap();
        assert_eq!(net.node(1).unwrap().community(), 1);

        merge_communities(&mut net);
        assert_eq!(net.node_count(), 1);
        assert_eq!(net.edge_count(), 1);
        assert!(net.node(1).unwrap().members().is_empty());
    }

    #[test]
    fn modularity_rerun_is_stable() {
        let mut net = triangles(Some(0.1));
        Modularity::new().with_seed(1).run(&mut net).unwrap();
        let first = community_sets(&net);
        Modularity::new().with_seed(99).run(&mut net).unwrap();
        assert_eq!(community_sets(&net), first);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn parallel_and_sequential_cpm_agree_on_bridged_triangles() {
        use crate::optimize::ParallelPotts;

        let mut sequential = triangles(Some(0.1));
        ConstantPotts::new()
            .with_resolution(0.5)
            .with_seed(13)
            .run(&mut sequential)
            .unwrap();
        let expected = community_sets(&sequential);

        for workers in [1, 2, 4, 8] {
            let mut net = triangles(Some(0.1));
            ParallelPotts::new()
                .with_resolution(0.5)
                .with_workers(workers)
                .run(&mut net)
                .unwrap();
            assert_eq!(community_sets(&net), expected, "workers = {workers}");
        }
    }

    #[test]
    fn two_rounds_of_contraction_roll_up_to_base_ids() {
        let mut net = triangles(Some(0.1));
        Modularity::new().with_seed(4).run(&mut net).unwrap();
        merge_communities(&mut net);
        assert_eq!(net.node_count(), 2);

        // Coarse graph: one bridge edge between two supers. A second
        // run sees too little weight to merge them; force the merge to
        // check provenance rollup.
        for id in net.node_ids().collect::<Vec<_>>() {
            net.node_mut(id).unwrap().set_community(1);
        }
        merge_communities(&mut net);

        assert_eq!(net.node_count(), 1);
        let root = net.nodes().next().unwrap();
        let members: BTreeSet<NodeId> = root.members().iter().copied().collect();
        assert_eq!(members, BTreeSet::from([1, 2, 3, 4, 5, 6]));
    }
}
