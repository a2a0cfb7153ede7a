//! Multi-objective distance closure and distance backbone of multilayer
//! directed graphs: vector-valued shortest paths under Pareto dominance,
//! and the minimal subgraph preserving them.

mod backbone;
mod closure;
mod error;
mod frontier;
mod graph;
mod multidistance;
mod search;

pub use backbone::{
    compute_backbone_removed_edges, pareto_backbone_edges, structural_backbone_costa,
    structural_backbone_simas, weighted_backbone_edges, BackboneAlgorithm, BackboneConfig,
    EdgeSet,
};
pub use closure::{
    all_pairs_pareto_distances, pareto_distance_closure, Closure, ClosureOptions,
};
pub use error::{Error, Result};
pub use graph::{
    build_graph, EdgeInput, EdgeRecord, FlattenStrategy, LayerInput, LayeredGraph, NodeId,
    DEFAULT_WEIGHT_ATTR,
};
pub use multidistance::{lexicographic_order, multimerge, multimin, Dominance, MultiDistance};
pub use search::{pareto_shortest_distances, DistanceMap, SearchOptions};
