use std::collections::BTreeMap;

use rayon::prelude::*;
use tracing::debug;

use crate::error::Result;
use crate::graph::{LayeredGraph, NodeId};
use crate::multidistance::{multimerge, MultiDistance};
use crate::search::{pareto_shortest_distances, DistanceMap, SearchOptions};

/// Parameters for the all-sources driver.
#[derive(Debug, Clone, Default)]
pub struct ClosureOptions {
    pub search: SearchOptions,
    /// Fan the per-source searches out over the rayon thread pool. The
    /// graph is shared read-only; every search produces an independent
    /// result, so ordering is normalized afterwards either way.
    pub parallel: bool,
}

/// Nested Pareto distance sets keyed by node name at both levels.
pub type Closure = BTreeMap<String, BTreeMap<String, Vec<MultiDistance>>>;

/// Runs one Pareto search per source node and returns the rows sorted by
/// source id. With `start_layer` set only that layer's nodes seed
/// searches; `None` uses every node of every layer, which is redundant on
/// identity-connected multilayers but permitted.
pub fn all_pairs_pareto_distances(
    graph: &LayeredGraph,
    start_layer: Option<&str>,
    options: &ClosureOptions,
) -> Result<Vec<(NodeId, DistanceMap)>> {
    let sources: Vec<NodeId> = match start_layer {
        None => graph.nodes(),
        Some(layer_id) => {
            let layer = graph.layer_index(layer_id)?;
            graph.layer_nodes(layer)?
        }
    };

    let run = |source: NodeId| -> Result<(NodeId, DistanceMap)> {
        let dist = pareto_shortest_distances(graph, &source, &options.search)?;
        Ok((source, dist))
    };

    let mut rows: Vec<(NodeId, DistanceMap)> = if options.parallel {
        sources.into_par_iter().map(run).collect::<Result<_>>()?
    } else {
        sources.into_iter().map(run).collect::<Result<_>>()?
    };
    rows.sort_by(|a, b| a.0.cmp(&b.0));

    debug!(sources = rows.len(), "all-pairs pareto distances computed");
    Ok(rows)
}

/// Collapses the all-pairs result into a name-keyed closure. Same-named
/// entries from different layer copies are merged into one antichain, so
/// the result is deterministic whatever the source enumeration order.
pub fn pareto_distance_closure(
    graph: &LayeredGraph,
    start_layer: Option<&str>,
    options: &ClosureOptions,
) -> Result<Closure> {
    let rows = all_pairs_pareto_distances(graph, start_layer, options)?;

    let mut closure: Closure = BTreeMap::new();
    for (source, dist) in rows {
        let row = closure.entry(source.name).or_default();
        for (target, labels) in dist {
            let slot = row.entry(target.name).or_default();
            *slot = multimerge(slot, &labels);
        }
    }
    Ok(closure)
}
