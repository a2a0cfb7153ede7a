use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::closure::{pareto_distance_closure, Closure, ClosureOptions};
use crate::error::{Error, Result};
use crate::frontier::LabelFrontier;
use crate::graph::{LayeredGraph, NodeId};
use crate::multidistance::{multimerge, Dominance, MultiDistance};

/// Directed intralayer edges marked for removal. An edge is in the
/// backbone iff it is not in this set.
pub type EdgeSet = BTreeSet<(NodeId, NodeId)>;

#[derive(Debug, Clone, Default)]
pub enum BackboneAlgorithm {
    /// Closure-based Pareto backbone: drop edges strictly dominated by
    /// some Pareto path between their endpoints.
    #[default]
    ParetoClosure,
    /// Scalar backbone: drop edges whose direct cost exceeds the best
    /// weighted sum over the closure entry.
    Weighted { layer_weights: Option<Vec<f64>> },
    /// Per-source bounded searches instead of a full closure, pruning
    /// against each undecided direct edge individually.
    StructuralSimas,
    /// Per-source bounded searches pruning against the running
    /// componentwise maximum of the undecided direct edges, candidates
    /// seeded heaviest first.
    StructuralCosta,
}

#[derive(Debug, Clone, Default)]
pub struct BackboneConfig {
    pub algorithm: BackboneAlgorithm,
    pub closure: ClosureOptions,
}

pub fn compute_backbone_removed_edges(
    graph: &LayeredGraph,
    config: &BackboneConfig,
) -> Result<EdgeSet> {
    match &config.algorithm {
        BackboneAlgorithm::ParetoClosure => pareto_backbone_edges(graph, None, &config.closure),
        BackboneAlgorithm::Weighted { layer_weights } => {
            weighted_backbone_edges(graph, None, layer_weights.as_deref(), &config.closure)
        }
        BackboneAlgorithm::StructuralSimas => {
            structural_backbone_simas(graph, &config.closure.search.weight_attr)
        }
        BackboneAlgorithm::StructuralCosta => {
            structural_backbone_costa(graph, &config.closure.search.weight_attr)
        }
    }
}

fn direct_vector(n_layers: usize, layer: usize, weight: f64) -> Result<MultiDistance> {
    let mut direct = MultiDistance::zero(n_layers);
    direct.add_to_layer(layer, weight)?;
    Ok(direct)
}

/// Every intralayer edge whose one-hop multidistance is strictly
/// dominated by a closure entry between its endpoints. When no closure is
/// supplied one is computed from `options` over all source layers.
pub fn pareto_backbone_edges(
    graph: &LayeredGraph,
    closure: Option<&Closure>,
    options: &ClosureOptions,
) -> Result<EdgeSet> {
    let computed;
    let closure = match closure {
        Some(existing) => existing,
        None => {
            computed = pareto_distance_closure(graph, None, options)?;
            &computed
        }
    };

    let weight_attr = &options.search.weight_attr;
    let mut removed = EdgeSet::new();

    for node in graph.nodes() {
        for (target, weight) in graph.layer_out_edges(node.layer, &node.name, weight_attr)? {
            let Some(labels) = closure
                .get(&node.name)
                .and_then(|row| row.get(&target))
            else {
                continue;
            };
            let direct = direct_vector(graph.n_layers(), node.layer, weight)?;
            if labels.iter().any(|d| d.dominates(&direct)) {
                removed.insert((node.clone(), NodeId::new(target, node.layer)));
            }
        }
    }

    debug!(removed = removed.len(), "pareto backbone computed");
    Ok(removed)
}

/// Every intralayer edge whose scalar direct cost is beaten by the best
/// weighted sum over the closure entry. `layer_weights`, when given, must
/// hold one non-negative factor per layer.
pub fn weighted_backbone_edges(
    graph: &LayeredGraph,
    closure: Option<&Closure>,
    layer_weights: Option<&[f64]>,
    options: &ClosureOptions,
) -> Result<EdgeSet> {
    if let Some(weights) = layer_weights {
        if weights.len() != graph.n_layers() {
            return Err(Error::DimensionMismatch {
                left: weights.len(),
                right: graph.n_layers(),
            });
        }
    }

    let computed;
    let closure = match closure {
        Some(existing) => existing,
        None => {
            computed = pareto_distance_closure(graph, None, options)?;
            &computed
        }
    };

    let weight_attr = &options.search.weight_attr;
    let mut removed = EdgeSet::new();

    for node in graph.nodes() {
        for (target, weight) in graph.layer_out_edges(node.layer, &node.name, weight_attr)? {
            let Some(labels) = closure
                .get(&node.name)
                .and_then(|row| row.get(&target))
            else {
                continue;
            };
            let direct = match layer_weights {
                None => weight,
                Some(weights) => weight * weights[node.layer],
            };
            let mut best = f64::INFINITY;
            for label in labels {
                best = best.min(label.weighted_sum(layer_weights)?);
            }
            if best < direct {
                removed.insert((node.clone(), NodeId::new(target, node.layer)));
            }
        }
    }

    debug!(removed = removed.len(), "weighted backbone computed");
    Ok(removed)
}

#[derive(Debug, Clone, Copy)]
enum StructuralPrune {
    /// Keep a label iff it is weakly dominated by some undecided direct
    /// edge vector.
    PerEdge,
    /// Keep a label iff it is weakly dominated by the componentwise
    /// maximum of the undecided direct edge vectors.
    MaxCut,
}

fn componentwise_max<'a>(
    vectors: impl Iterator<Item = &'a MultiDistance>,
    n_layers: usize,
) -> MultiDistance {
    let mut components = vec![0.0; n_layers];
    for vector in vectors {
        for (slot, value) in components.iter_mut().zip(vector.components()) {
            if *value > *slot {
                *slot = *value;
            }
        }
    }
    MultiDistance::from_components(components)
}

fn weakly_dominates(label: &MultiDistance, bound: &MultiDistance) -> bool {
    matches!(label.compare(bound), Dominance::Less | Dominance::Equal)
}

/// Bounded Pareto search from one source that only tracks labels still
/// able to prove one of the source's direct edges redundant, and stops as
/// soon as every direct edge is decided.
fn structural_redundant_from(
    graph: &LayeredGraph,
    source: &NodeId,
    weight_attr: &str,
    prune: StructuralPrune,
    heaviest_first: bool,
) -> Result<EdgeSet> {
    let n_layers = graph.n_layers();
    let mut candidates = graph.layer_out_edges(source.layer, &source.name, weight_attr)?;
    if heaviest_first {
        candidates.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    }

    let mut undecided: BTreeMap<String, MultiDistance> = BTreeMap::new();
    for (target, weight) in candidates {
        undecided.insert(target, direct_vector(n_layers, source.layer, weight)?);
    }
    let mut removed = EdgeSet::new();
    if undecided.is_empty() {
        return Ok(removed);
    }

    let mut cut = componentwise_max(undecided.values(), n_layers);
    let mut dist: BTreeMap<NodeId, Vec<MultiDistance>> = BTreeMap::new();
    let mut seen: BTreeMap<NodeId, Vec<MultiDistance>> = BTreeMap::new();
    let mut fringe = LabelFrontier::new();

    seen.insert(source.clone(), vec![MultiDistance::zero(n_layers)]);
    fringe.push(vec![MultiDistance::zero(n_layers)], source.clone(), 0);

    while let Some((labels, node, _)) = fringe.pop() {
        let merged = multimerge(dist.get(&node).map_or(&[][..], Vec::as_slice), &labels);
        if dist.get(&node) == Some(&merged) {
            continue;
        }
        dist.insert(node.clone(), merged);

        if let Some(direct) = undecided.get(&node.name) {
            if dist[&node].iter().any(|d| d.dominates(direct)) {
                removed.insert((
                    source.clone(),
                    NodeId::new(node.name.clone(), source.layer),
                ));
                undecided.remove(&node.name);
                if undecided.is_empty() {
                    break;
                }
                cut = componentwise_max(undecided.values(), n_layers);
            }
        }

        let current = &dist[&node];
        for neighbor in graph.neighbors(&node)? {
            let mut labels_via = current.clone();
            if neighbor.layer == node.layer {
                let weight = graph.edge_weight(&node, &neighbor, weight_attr)?;
                for label in &mut labels_via {
                    label.add_to_layer(node.layer, weight)?;
                }
            }
            labels_via.retain(|label| match prune {
                StructuralPrune::PerEdge => undecided
                    .values()
                    .any(|direct| weakly_dominates(label, direct)),
                StructuralPrune::MaxCut => weakly_dominates(label, &cut),
            });
            if labels_via.is_empty() {
                continue;
            }

            let seen_at = seen.get(&neighbor).map_or(&[][..], Vec::as_slice);
            let merged_at = multimerge(&labels_via, seen_at);
            if seen.get(&neighbor) != Some(&merged_at) {
                seen.insert(neighbor.clone(), merged_at.clone());
                fringe.push(merged_at, neighbor, 0);
            }
        }
    }

    Ok(removed)
}

/// Structural Pareto backbone, pruning per direct edge. Produces exactly
/// the edge set of [`pareto_backbone_edges`] without materializing the
/// closure.
pub fn structural_backbone_simas(graph: &LayeredGraph, weight_attr: &str) -> Result<EdgeSet> {
    let mut removed = EdgeSet::new();
    for node in graph.nodes() {
        removed.extend(structural_redundant_from(
            graph,
            &node,
            weight_attr,
            StructuralPrune::PerEdge,
            false,
        )?);
    }
    debug!(removed = removed.len(), "structural backbone (simas) computed");
    Ok(removed)
}

/// Structural Pareto backbone, pruning against the aggregate cut with
/// heaviest-first candidate seeding. Same edge set as the closure-based
/// routine.
pub fn structural_backbone_costa(graph: &LayeredGraph, weight_attr: &str) -> Result<EdgeSet> {
    let mut removed = EdgeSet::new();
    for node in graph.nodes() {
        removed.extend(structural_redundant_from(
            graph,
            &node,
            weight_attr,
            StructuralPrune::MaxCut,
            true,
        )?);
    }
    debug!(removed = removed.len(), "structural backbone (costa) computed");
    Ok(removed)
}
