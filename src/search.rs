use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::frontier::LabelFrontier;
use crate::graph::{LayeredGraph, NodeId, DEFAULT_WEIGHT_ATTR};
use crate::multidistance::{multimerge, MultiDistance};

/// Per-call search parameters; there is no global configuration.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Edge attribute holding the scalar weight.
    pub weight_attr: String,
    /// Prune labels that fail to strictly dominate the per-layer maximum
    /// one-hop distance out of the source. Lossy by construction: labels
    /// as heavy as the cut itself are discarded.
    pub cut_by_neighbors: bool,
    /// Discard fringe entries deeper than this many hops. `None` is
    /// unbounded.
    pub depth_cut: Option<usize>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            weight_attr: DEFAULT_WEIGHT_ATTR.to_string(),
            cut_by_neighbors: false,
            depth_cut: None,
        }
    }
}

/// Pareto-minimal multidistance sets keyed by reachable node. Nodes the
/// search never reached are absent.
pub type DistanceMap = BTreeMap<NodeId, Vec<MultiDistance>>;

fn neighbor_cut(
    graph: &LayeredGraph,
    source: &NodeId,
    weight_attr: &str,
) -> Result<MultiDistance> {
    let mut components = vec![0.0; graph.n_layers()];
    for (layer, slot) in components.iter_mut().enumerate() {
        if !graph.contains(&NodeId::new(source.name.clone(), layer)) {
            continue;
        }
        for (_, weight) in graph.layer_out_edges(layer, &source.name, weight_attr)? {
            if weight > *slot {
                *slot = weight;
            }
        }
    }
    Ok(MultiDistance::from_components(components))
}

/// Labeled best-first search from `source` over multidistance antichains.
///
/// Every reachable node ends up mapped to the Pareto-minimal set of
/// multidistances over all paths from the source. Labels are copied at
/// push time; stored antichains are only ever replaced wholesale, never
/// mutated, so previously returned sets stay valid.
pub fn pareto_shortest_distances(
    graph: &LayeredGraph,
    source: &NodeId,
    options: &SearchOptions,
) -> Result<DistanceMap> {
    if !graph.contains(source) {
        return Err(Error::UnknownNode(source.to_string()));
    }

    let n_layers = graph.n_layers();
    let mut dist: DistanceMap = BTreeMap::new();
    let mut seen: BTreeMap<NodeId, Vec<MultiDistance>> = BTreeMap::new();
    let mut fringe = LabelFrontier::new();

    seen.insert(source.clone(), vec![MultiDistance::zero(n_layers)]);
    fringe.push(vec![MultiDistance::zero(n_layers)], source.clone(), 0);

    let cut = if options.cut_by_neighbors {
        Some(neighbor_cut(graph, source, &options.weight_attr)?)
    } else {
        None
    };

    while let Some((labels, node, depth)) = fringe.pop() {
        if options.depth_cut.is_some_and(|limit| depth > limit) {
            continue;
        }

        let merged = multimerge(dist.get(&node).map_or(&[][..], Vec::as_slice), &labels);
        if dist.get(&node) == Some(&merged) {
            // Popped labels are all dominated by what we already hold.
            continue;
        }
        dist.insert(node.clone(), merged);
        let current = &dist[&node];

        for neighbor in graph.neighbors(&node)? {
            let mut labels_via = current.clone();
            if neighbor.layer == node.layer {
                // Intralayer hop accumulates at this layer's index;
                // interlayer identity crossings stay free.
                let weight = graph.edge_weight(&node, &neighbor, &options.weight_attr)?;
                for label in &mut labels_via {
                    label.add_to_layer(node.layer, weight)?;
                }
            }

            if let Some(cut) = &cut {
                if labels_via.iter().any(|label| !label.dominates(cut)) {
                    continue;
                }
            }

            let seen_at = seen.get(&neighbor).map_or(&[][..], Vec::as_slice);
            let merged_at = multimerge(&labels_via, seen_at);
            if seen.get(&neighbor) != Some(&merged_at) {
                seen.insert(neighbor.clone(), merged_at.clone());
                fringe.push(merged_at, neighbor, depth + 1);
            }
        }
    }

    Ok(dist)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::graph::{build_graph, EdgeInput, LayerInput};
    use crate::multidistance::Dominance;

    fn md(components: &[f64]) -> MultiDistance {
        MultiDistance::from_components(components.to_vec())
    }

    fn single_layer(edges: Vec<EdgeInput>) -> LayeredGraph {
        let layers = BTreeMap::from([(
            "L0".to_string(),
            LayerInput {
                nodes: vec![],
                edges,
            },
        )]);
        build_graph(&layers).expect("graph builds")
    }

    #[test]
    fn triangle_finds_the_two_hop_detour() {
        let graph = single_layer(vec![
            EdgeInput::weighted("A", "B", 1.0),
            EdgeInput::weighted("B", "C", 1.0),
            EdgeInput::weighted("A", "C", 3.0),
        ]);
        let source = graph.node("A", "L0").expect("A@L0");
        let dist = pareto_shortest_distances(&graph, &source, &SearchOptions::default())
            .expect("search runs");

        assert_eq!(dist[&NodeId::new("C", 0)], vec![md(&[2.0])]);
        assert_eq!(dist[&NodeId::new("B", 0)], vec![md(&[1.0])]);
    }

    #[test]
    fn source_keeps_exactly_the_zero_vector() {
        let graph = single_layer(vec![
            EdgeInput::weighted("A", "B", 1.0),
            EdgeInput::weighted("B", "A", 1.0),
        ]);
        let source = graph.node("A", "L0").expect("A@L0");
        let dist = pareto_shortest_distances(&graph, &source, &SearchOptions::default())
            .expect("search runs");

        assert_eq!(dist[&source], vec![MultiDistance::zero(1)]);
    }

    #[test]
    fn zero_weight_edges_terminate_and_propagate() {
        let graph = single_layer(vec![
            EdgeInput::weighted("A", "B", 0.0),
            EdgeInput::weighted("B", "C", 1.0),
        ]);
        let source = graph.node("A", "L0").expect("A@L0");
        let dist = pareto_shortest_distances(&graph, &source, &SearchOptions::default())
            .expect("search runs");

        assert_eq!(dist[&NodeId::new("B", 0)], vec![md(&[0.0])]);
        assert_eq!(dist[&NodeId::new("C", 0)], vec![md(&[1.0])]);
    }

    #[test]
    fn unreachable_nodes_are_absent() {
        let graph = single_layer(vec![
            EdgeInput::weighted("A", "B", 1.0),
            EdgeInput::weighted("C", "D", 1.0),
        ]);
        let source = graph.node("A", "L0").expect("A@L0");
        let dist = pareto_shortest_distances(&graph, &source, &SearchOptions::default())
            .expect("search runs");

        assert!(!dist.contains_key(&NodeId::new("C", 0)));
        assert!(!dist.contains_key(&NodeId::new("D", 0)));
    }

    #[test]
    fn depth_cut_discards_deeper_fringe_entries() {
        let graph = single_layer(vec![
            EdgeInput::weighted("A", "B", 1.0),
            EdgeInput::weighted("B", "C", 1.0),
            EdgeInput::weighted("C", "D", 1.0),
        ]);
        let source = graph.node("A", "L0").expect("A@L0");
        let options = SearchOptions {
            depth_cut: Some(2),
            ..SearchOptions::default()
        };
        let dist = pareto_shortest_distances(&graph, &source, &options).expect("search runs");

        assert_eq!(dist[&NodeId::new("C", 0)], vec![md(&[2.0])]);
        assert!(!dist.contains_key(&NodeId::new("D", 0)));
    }

    #[test]
    fn neighbor_cut_still_discovers_cheap_detours() {
        let graph = single_layer(vec![
            EdgeInput::weighted("A", "B", 10.0),
            EdgeInput::weighted("A", "C", 1.0),
            EdgeInput::weighted("C", "B", 1.0),
        ]);
        let source = graph.node("A", "L0").expect("A@L0");
        let options = SearchOptions {
            cut_by_neighbors: true,
            ..SearchOptions::default()
        };
        let dist = pareto_shortest_distances(&graph, &source, &options).expect("search runs");

        // The cut is [10]; the detour through C dominates it strictly and
        // survives, while the direct label [10] itself is discarded.
        assert_eq!(dist[&NodeId::new("B", 0)], vec![md(&[2.0])]);
    }

    #[test]
    fn interlayer_crossings_accumulate_nothing() {
        let layers = BTreeMap::from([
            (
                "L0".to_string(),
                LayerInput {
                    nodes: vec![],
                    edges: vec![EdgeInput::weighted("A", "B", 5.0)],
                },
            ),
            (
                "L1".to_string(),
                LayerInput {
                    nodes: vec![],
                    edges: vec![EdgeInput::weighted("A", "B", 1.0)],
                },
            ),
        ]);
        let graph = build_graph(&layers).expect("graph builds");
        let source = graph.node("A", "L0").expect("A@L0");
        let dist = pareto_shortest_distances(&graph, &source, &SearchOptions::default())
            .expect("search runs");

        // Reaching B@L0 via L1 costs [0,1]; the direct [5,0] is
        // incomparable with it, so both survive.
        assert_eq!(
            dist[&NodeId::new("B", 0)],
            vec![md(&[0.0, 1.0]), md(&[5.0, 0.0])]
        );
        assert_eq!(
            dist[&NodeId::new("B", 1)],
            vec![md(&[0.0, 1.0]), md(&[5.0, 0.0])]
        );
    }

    #[test]
    fn every_stored_set_is_an_antichain() {
        let layers = BTreeMap::from([
            (
                "L0".to_string(),
                LayerInput {
                    nodes: vec![],
                    edges: vec![
                        EdgeInput::weighted("A", "B", 3.0),
                        EdgeInput::weighted("A", "C", 1.0),
                        EdgeInput::weighted("C", "B", 1.0),
                    ],
                },
            ),
            (
                "L1".to_string(),
                LayerInput {
                    nodes: vec![],
                    edges: vec![
                        EdgeInput::weighted("A", "B", 1.0),
                        EdgeInput::weighted("A", "C", 1.0),
                        EdgeInput::weighted("C", "B", 1.0),
                    ],
                },
            ),
        ]);
        let graph = build_graph(&layers).expect("graph builds");
        let source = graph.node("A", "L0").expect("A@L0");
        let dist = pareto_shortest_distances(&graph, &source, &SearchOptions::default())
            .expect("search runs");

        for labels in dist.values() {
            for (i, a) in labels.iter().enumerate() {
                for b in labels.iter().skip(i + 1) {
                    assert_eq!(a.compare(b), Dominance::Incomparable);
                }
            }
        }
    }
}
