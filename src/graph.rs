use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::multidistance::MultiDistance;

pub const DEFAULT_WEIGHT_ATTR: &str = "weight";

/// A node qualified by the layer copy it lives in. `layer` is the index
/// assigned to the layer id in sorted order at construction time and is
/// carried here so the search inner loop never re-resolves it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct NodeId {
    pub name: String,
    pub layer: usize,
}

impl NodeId {
    pub fn new(name: impl Into<String>, layer: usize) -> Self {
        Self {
            name: name.into(),
            layer,
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@L{}", self.name, self.layer)
    }
}

/// One directed intralayer edge in loader input. Attributes are numeric;
/// the attribute selected as the weight is chosen per call and defaults to
/// `"weight"`.
#[derive(Debug, Clone, Deserialize)]
pub struct EdgeInput {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub attrs: BTreeMap<String, f64>,
}

impl EdgeInput {
    pub fn weighted(from: impl Into<String>, to: impl Into<String>, weight: f64) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            attrs: BTreeMap::from([(DEFAULT_WEIGHT_ATTR.to_string(), weight)]),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LayerInput {
    #[serde(default)]
    pub nodes: Vec<String>,
    #[serde(default)]
    pub edges: Vec<EdgeInput>,
}

/// Flat edge-list record: `layer_from == layer_to` describes an intralayer
/// edge, anything else must be a zero-weight identity coupling.
#[derive(Debug, Clone, Deserialize)]
pub struct EdgeRecord {
    pub from: String,
    pub to: String,
    pub layer_from: String,
    pub layer_to: String,
    pub weight: f64,
}

/// How `flatten` projects a multilayer graph onto a single digraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlattenStrategy {
    /// Keep the lightest copy of each edge found in any layer.
    Min,
    /// Keep the heaviest copy, restricted to edges present in every layer.
    Max,
}

type Adjacency = BTreeMap<String, BTreeMap<String, BTreeMap<String, f64>>>;

/// Immutable multilayer directed graph. Same-named nodes in different
/// layers are copies of one underlying entity, linked by implicit
/// zero-cost identity edges; intralayer edges carry per-layer weights.
#[derive(Debug, Clone)]
pub struct LayeredGraph {
    layer_ids: Vec<String>,
    layer_index: BTreeMap<String, usize>,
    adjacency: Vec<Adjacency>,
    membership: BTreeMap<String, BTreeSet<usize>>,
}

/// Builds a [`LayeredGraph`] from per-layer node and edge lists. Layer
/// indices follow the sorted order of layer ids. Self-loops are dropped,
/// duplicate or negatively weighted edges reject the whole input.
pub fn build_graph(layers: &BTreeMap<String, LayerInput>) -> Result<LayeredGraph> {
    let layer_ids: Vec<String> = layers.keys().cloned().collect();
    let layer_index: BTreeMap<String, usize> = layer_ids
        .iter()
        .enumerate()
        .map(|(i, id)| (id.clone(), i))
        .collect();

    let mut adjacency: Vec<Adjacency> = vec![BTreeMap::new(); layer_ids.len()];
    let mut membership: BTreeMap<String, BTreeSet<usize>> = BTreeMap::new();

    for (layer_id, input) in layers {
        let layer = layer_index[layer_id];
        let adj = &mut adjacency[layer];

        for name in &input.nodes {
            adj.entry(name.clone()).or_default();
            membership.entry(name.clone()).or_default().insert(layer);
        }

        for edge in &input.edges {
            if edge.from == edge.to {
                continue;
            }
            for (attr, value) in &edge.attrs {
                if !value.is_finite() || *value < 0.0 {
                    return Err(Error::InvalidWeight {
                        subject: format!("attr `{attr}` on edge `{}` -> `{}`", edge.from, edge.to),
                        weight: *value,
                    });
                }
            }
            adj.entry(edge.to.clone()).or_default();
            let out = adj.entry(edge.from.clone()).or_default();
            if out.contains_key(&edge.to) {
                return Err(Error::DuplicateEdge {
                    from: edge.from.clone(),
                    to: edge.to.clone(),
                    layer: layer_id.clone(),
                });
            }
            out.insert(edge.to.clone(), edge.attrs.clone());
            membership
                .entry(edge.from.clone())
                .or_default()
                .insert(layer);
            membership.entry(edge.to.clone()).or_default().insert(layer);
        }
    }

    Ok(LayeredGraph {
        layer_ids,
        layer_index,
        adjacency,
        membership,
    })
}

impl LayeredGraph {
    /// Builds a graph from a flat edge list, the form produced by external
    /// multilayer combiners. Interlayer records must be zero-weight
    /// identity couplings; identity edges remain implicit afterwards.
    pub fn from_edge_records(records: &[EdgeRecord]) -> Result<Self> {
        let mut layers: BTreeMap<String, LayerInput> = BTreeMap::new();

        for record in records {
            if record.layer_from == record.layer_to {
                layers
                    .entry(record.layer_from.clone())
                    .or_default()
                    .edges
                    .push(EdgeInput::weighted(
                        record.from.clone(),
                        record.to.clone(),
                        record.weight,
                    ));
                continue;
            }
            if record.from != record.to {
                return Err(Error::NotConnected {
                    from: record.from.clone(),
                    to: record.to.clone(),
                });
            }
            if record.weight != 0.0 {
                return Err(Error::InvalidWeight {
                    subject: format!(
                        "identity coupling `{}`: `{}` -> `{}`",
                        record.from, record.layer_from, record.layer_to
                    ),
                    weight: record.weight,
                });
            }
            layers
                .entry(record.layer_from.clone())
                .or_default()
                .nodes
                .push(record.from.clone());
            layers
                .entry(record.layer_to.clone())
                .or_default()
                .nodes
                .push(record.to.clone());
        }

        build_graph(&layers)
    }

    pub fn n_layers(&self) -> usize {
        self.layer_ids.len()
    }

    pub fn layer_ids(&self) -> &[String] {
        &self.layer_ids
    }

    pub fn layer_index(&self, layer_id: &str) -> Result<usize> {
        self.layer_index
            .get(layer_id)
            .copied()
            .ok_or_else(|| Error::UnknownLayer(layer_id.to_string()))
    }

    pub fn layer_id(&self, layer: usize) -> Result<&str> {
        self.layer_ids
            .get(layer)
            .map(String::as_str)
            .ok_or(Error::InvalidLayerIndex {
                index: layer,
                layers: self.layer_ids.len(),
            })
    }

    pub fn node(&self, name: &str, layer_id: &str) -> Result<NodeId> {
        let layer = self.layer_index(layer_id)?;
        if !self.adjacency[layer].contains_key(name) {
            return Err(Error::UnknownNode(format!("{name}@{layer_id}")));
        }
        Ok(NodeId::new(name, layer))
    }

    pub fn contains(&self, node: &NodeId) -> bool {
        self.adjacency
            .get(node.layer)
            .is_some_and(|adj| adj.contains_key(&node.name))
    }

    /// Every `(name, layer)` node, layer index then name order.
    pub fn nodes(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        for (layer, adj) in self.adjacency.iter().enumerate() {
            for name in adj.keys() {
                out.push(NodeId::new(name.clone(), layer));
            }
        }
        out
    }

    pub fn layer_nodes(&self, layer: usize) -> Result<Vec<NodeId>> {
        let adj = self
            .adjacency
            .get(layer)
            .ok_or(Error::InvalidLayerIndex {
                index: layer,
                layers: self.layer_ids.len(),
            })?;
        Ok(adj
            .keys()
            .map(|name| NodeId::new(name.clone(), layer))
            .collect())
    }

    /// One-hop successors: every other-layer copy of the same name (free
    /// identity hops) plus the intralayer out-neighbors.
    pub fn neighbors(&self, node: &NodeId) -> Result<Vec<NodeId>> {
        if !self.contains(node) {
            return Err(Error::UnknownNode(node.to_string()));
        }
        let mut out = Vec::new();
        if let Some(layers) = self.membership.get(&node.name) {
            for layer in layers {
                if *layer != node.layer {
                    out.push(NodeId::new(node.name.clone(), *layer));
                }
            }
        }
        for name in self.adjacency[node.layer][&node.name].keys() {
            out.push(NodeId::new(name.clone(), node.layer));
        }
        Ok(out)
    }

    /// Intralayer out-edges of `(name, layer)` with the weight attribute
    /// resolved (missing attribute counts as 1).
    pub fn layer_out_edges(
        &self,
        layer: usize,
        name: &str,
        weight_attr: &str,
    ) -> Result<Vec<(String, f64)>> {
        let adj = self
            .adjacency
            .get(layer)
            .ok_or(Error::InvalidLayerIndex {
                index: layer,
                layers: self.layer_ids.len(),
            })?;
        let out = adj
            .get(name)
            .ok_or_else(|| Error::UnknownNode(format!("{name}@L{layer}")))?;
        Ok(out
            .iter()
            .map(|(to, attrs)| {
                (
                    to.clone(),
                    attrs.get(weight_attr).copied().unwrap_or(1.0),
                )
            })
            .collect())
    }

    /// Scalar weight of the one-hop connection `u -> v`. Intralayer edges
    /// report their weight attribute (1 when the attribute is absent);
    /// interlayer identity hops report the placeholder 1, which the search
    /// never accumulates.
    pub fn edge_weight(&self, u: &NodeId, v: &NodeId, weight_attr: &str) -> Result<f64> {
        if u.layer == v.layer {
            let attrs = self
                .adjacency
                .get(u.layer)
                .and_then(|adj| adj.get(&u.name))
                .and_then(|out| out.get(&v.name))
                .ok_or_else(|| Error::NotConnected {
                    from: u.to_string(),
                    to: v.to_string(),
                })?;
            return Ok(attrs.get(weight_attr).copied().unwrap_or(1.0));
        }
        if u.name == v.name && self.contains(u) && self.contains(v) {
            return Ok(1.0);
        }
        Err(Error::NotConnected {
            from: u.to_string(),
            to: v.to_string(),
        })
    }

    /// Folds an explicit node sequence into its multidistance. Only
    /// intralayer hops contribute, at the layer index of the hop.
    pub fn path_multidistance(&self, path: &[NodeId], weight_attr: &str) -> Result<MultiDistance> {
        let mut dist = MultiDistance::zero(self.n_layers());
        for pair in path.windows(2) {
            let (u, v) = (&pair[0], &pair[1]);
            let weight = self.edge_weight(u, v, weight_attr)?;
            if u.layer == v.layer {
                dist.add_to_layer(u.layer, weight)?;
            }
        }
        Ok(dist)
    }

    /// Projects the multilayer graph onto a single digraph, aggregating
    /// same-endpoint edges across layers per `strategy`.
    pub fn flatten(
        &self,
        strategy: FlattenStrategy,
        weight_attr: &str,
    ) -> BTreeMap<String, BTreeMap<String, f64>> {
        let mut flat: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();
        let mut edge_counts: BTreeMap<(String, String), usize> = BTreeMap::new();

        for adj in &self.adjacency {
            for (from, out) in adj {
                for (to, attrs) in out {
                    let weight = attrs.get(weight_attr).copied().unwrap_or(1.0);
                    *edge_counts
                        .entry((from.clone(), to.clone()))
                        .or_insert(0) += 1;
                    let slot = flat.entry(from.clone()).or_default().entry(to.clone());
                    match strategy {
                        FlattenStrategy::Min => {
                            let entry = slot.or_insert(weight);
                            if weight < *entry {
                                *entry = weight;
                            }
                        }
                        FlattenStrategy::Max => {
                            let entry = slot.or_insert(weight);
                            if weight > *entry {
                                *entry = weight;
                            }
                        }
                    }
                }
            }
        }

        if strategy == FlattenStrategy::Max {
            let n_layers = self.n_layers();
            for (from, out) in &mut flat {
                out.retain(|to, _| edge_counts[&(from.clone(), to.clone())] == n_layers);
            }
            flat.retain(|_, out| !out.is_empty());
        }

        flat
    }
}
