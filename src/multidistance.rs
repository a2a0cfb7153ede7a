use std::cmp::Ordering;

use crate::error::{Error, Result};

/// Outcome of comparing two multidistances under the domination partial
/// order on `R^k`.
///
/// `Less` means the left vector strictly dominates the right one: every
/// component is less than or equal, and at least one is strictly less.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dominance {
    Less,
    Equal,
    Greater,
    Incomparable,
}

/// Per-layer accumulated distance along a path through a multilayer graph.
///
/// Component `i` holds the total intralayer weight traversed in the layer
/// with index `i`; interlayer identity hops contribute to no component.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiDistance {
    components: Vec<f64>,
}

impl MultiDistance {
    pub fn zero(n_layers: usize) -> Self {
        Self {
            components: vec![0.0; n_layers],
        }
    }

    pub fn from_components(components: Vec<f64>) -> Self {
        Self { components }
    }

    pub fn n_layers(&self) -> usize {
        self.components.len()
    }

    pub fn components(&self) -> &[f64] {
        &self.components
    }

    pub fn is_zero(&self) -> bool {
        self.components.iter().all(|c| *c == 0.0)
    }

    pub fn add_to_layer(&mut self, layer: usize, distance: f64) -> Result<()> {
        if layer >= self.components.len() {
            return Err(Error::InvalidLayerIndex {
                index: layer,
                layers: self.components.len(),
            });
        }
        self.components[layer] += distance;
        Ok(())
    }

    /// Componentwise sum of two multidistances over the same layer set.
    pub fn try_add(&self, other: &Self) -> Result<Self> {
        if self.components.len() != other.components.len() {
            return Err(Error::DimensionMismatch {
                left: self.components.len(),
                right: other.components.len(),
            });
        }
        Ok(Self {
            components: self
                .components
                .iter()
                .zip(&other.components)
                .map(|(a, b)| a + b)
                .collect(),
        })
    }

    /// Tri-valued domination comparison. Vectors of different arity are
    /// never comparable.
    pub fn compare(&self, other: &Self) -> Dominance {
        if self.components.len() != other.components.len() {
            return Dominance::Incomparable;
        }
        let mut any_less = false;
        let mut any_greater = false;
        for (a, b) in self.components.iter().zip(&other.components) {
            if a < b {
                any_less = true;
            } else if a > b {
                any_greater = true;
            }
        }
        match (any_less, any_greater) {
            (false, false) => Dominance::Equal,
            (true, false) => Dominance::Less,
            (false, true) => Dominance::Greater,
            (true, true) => Dominance::Incomparable,
        }
    }

    /// Strict domination: every component `<=` and at least one `<`.
    pub fn dominates(&self, other: &Self) -> bool {
        self.compare(other) == Dominance::Less
    }

    pub fn is_incomparable_with(&self, other: &Self) -> bool {
        self.compare(other) == Dominance::Incomparable
    }

    /// Scalar projection of the vector. With no weights every layer counts
    /// as 1; otherwise `layer_weights` must supply one non-negative factor
    /// per layer.
    pub fn weighted_sum(&self, layer_weights: Option<&[f64]>) -> Result<f64> {
        match layer_weights {
            None => Ok(self.components.iter().sum()),
            Some(weights) => {
                if weights.len() != self.components.len() {
                    return Err(Error::DimensionMismatch {
                        left: weights.len(),
                        right: self.components.len(),
                    });
                }
                for (layer, w) in weights.iter().enumerate() {
                    if !w.is_finite() || *w < 0.0 {
                        return Err(Error::InvalidWeight {
                            subject: format!("layer {layer}"),
                            weight: *w,
                        });
                    }
                }
                Ok(self
                    .components
                    .iter()
                    .zip(weights)
                    .map(|(c, w)| c * w)
                    .sum())
            }
        }
    }
}

/// Total order extending the domination partial order, used for heap keys
/// and for keeping antichains in canonical form.
pub fn lexicographic_order(a: &MultiDistance, b: &MultiDistance) -> Ordering {
    for (x, y) in a.components.iter().zip(&b.components) {
        match x.total_cmp(y) {
            Ordering::Equal => {}
            unequal => return unequal,
        }
    }
    a.components.len().cmp(&b.components.len())
}

fn canonicalize(mut front: Vec<MultiDistance>) -> Vec<MultiDistance> {
    front.sort_by(lexicographic_order);
    front
}

fn dominated_by_front(front: &[MultiDistance], candidate: &MultiDistance) -> bool {
    front
        .iter()
        .any(|kept| kept.dominates(candidate) || kept == candidate)
}

/// Maximal antichain of `dists` under domination. Duplicates collapse to a
/// single element and the result is in canonical order, so equal sets
/// compare equal as vectors regardless of input order.
pub fn multimin(dists: &[MultiDistance]) -> Vec<MultiDistance> {
    let mut front: Vec<MultiDistance> = Vec::new();
    for candidate in dists {
        if dominated_by_front(&front, candidate) {
            continue;
        }
        front.retain(|kept| !candidate.dominates(kept));
        front.push(candidate.clone());
    }
    canonicalize(front)
}

/// `multimin` of the union of two antichains, walking both once instead of
/// re-reducing from scratch. Inputs must already be internally
/// incomparable; this precondition is not checked.
pub fn multimerge(a: &[MultiDistance], b: &[MultiDistance]) -> Vec<MultiDistance> {
    let mut keep_b = vec![true; b.len()];
    let mut merged = Vec::with_capacity(a.len() + b.len());

    for ca in a {
        let mut keep_a = true;
        for (cb, keep) in b.iter().zip(keep_b.iter_mut()) {
            match ca.compare(cb) {
                Dominance::Less => *keep = false,
                Dominance::Greater | Dominance::Equal => {
                    keep_a = false;
                    break;
                }
                Dominance::Incomparable => {}
            }
        }
        if keep_a {
            merged.push(ca.clone());
        }
    }
    for (cb, keep) in b.iter().zip(keep_b) {
        if keep {
            merged.push(cb.clone());
        }
    }
    canonicalize(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn md(components: &[f64]) -> MultiDistance {
        MultiDistance::from_components(components.to_vec())
    }

    #[test]
    fn compare_covers_all_four_outcomes() {
        assert_eq!(md(&[1.0, 0.0]).compare(&md(&[2.0, 0.0])), Dominance::Less);
        assert_eq!(
            md(&[2.0, 1.0]).compare(&md(&[2.0, 1.0])),
            Dominance::Equal
        );
        assert_eq!(
            md(&[3.0, 1.0]).compare(&md(&[2.0, 1.0])),
            Dominance::Greater
        );
        assert_eq!(
            md(&[1.0, 2.0]).compare(&md(&[2.0, 1.0])),
            Dominance::Incomparable
        );
    }

    #[test]
    fn vectors_of_different_arity_are_incomparable() {
        assert_eq!(md(&[1.0]).compare(&md(&[1.0, 0.0])), Dominance::Incomparable);
    }

    #[test]
    fn dominates_requires_a_strict_component() {
        assert!(md(&[1.0, 1.0]).dominates(&md(&[1.0, 2.0])));
        assert!(!md(&[1.0, 1.0]).dominates(&md(&[1.0, 1.0])));
    }

    #[test]
    fn add_to_layer_rejects_out_of_range_index() {
        let mut d = MultiDistance::zero(2);
        d.add_to_layer(1, 3.0).expect("index in range");
        assert_eq!(d.components(), &[0.0, 3.0]);
        assert_eq!(
            d.add_to_layer(2, 1.0),
            Err(Error::InvalidLayerIndex { index: 2, layers: 2 })
        );
    }

    #[test]
    fn try_add_rejects_mismatched_arity() {
        let sum = md(&[1.0, 2.0]).try_add(&md(&[0.5, 0.5])).expect("same arity");
        assert_eq!(sum.components(), &[1.5, 2.5]);
        assert_eq!(
            md(&[1.0]).try_add(&md(&[1.0, 0.0])),
            Err(Error::DimensionMismatch { left: 1, right: 2 })
        );
    }

    #[test]
    fn weighted_sum_defaults_to_uniform_weights() {
        let d = md(&[1.0, 2.0, 4.0]);
        assert_eq!(d.weighted_sum(None).expect("uniform"), 7.0);
        assert_eq!(
            d.weighted_sum(Some(&[1.0, 0.0, 0.5])).expect("weighted"),
            3.0
        );
    }

    #[test]
    fn weighted_sum_rejects_negative_layer_weights() {
        let d = md(&[1.0, 2.0]);
        assert!(matches!(
            d.weighted_sum(Some(&[1.0, -1.0])),
            Err(Error::InvalidWeight { .. })
        ));
        assert_eq!(
            d.weighted_sum(Some(&[1.0])),
            Err(Error::DimensionMismatch { left: 1, right: 2 })
        );
    }

    #[test]
    fn multimin_keeps_only_the_maximal_antichain() {
        let front = multimin(&[
            md(&[3.0, 0.0]),
            md(&[1.0, 0.0]),
            md(&[0.0, 1.0]),
            md(&[2.0, 2.0]),
        ]);
        assert_eq!(front, vec![md(&[0.0, 1.0]), md(&[1.0, 0.0])]);
    }

    #[test]
    fn multimin_collapses_duplicates_and_is_idempotent() {
        let input = [md(&[1.0, 1.0]), md(&[1.0, 1.0]), md(&[0.0, 2.0])];
        let once = multimin(&input);
        assert_eq!(once.len(), 2);
        assert_eq!(multimin(&once), once);
    }

    #[test]
    fn multimin_output_is_order_independent() {
        let forward = multimin(&[md(&[1.0, 2.0]), md(&[2.0, 1.0]), md(&[3.0, 3.0])]);
        let backward = multimin(&[md(&[3.0, 3.0]), md(&[2.0, 1.0]), md(&[1.0, 2.0])]);
        assert_eq!(forward, backward);
    }

    #[test]
    fn multimerge_is_commutative_and_collapses_equal_vectors() {
        let a = [md(&[1.0, 0.0]), md(&[0.0, 2.0])];
        let b = [md(&[0.0, 2.0]), md(&[2.0, 0.0])];
        let ab = multimerge(&a, &b);
        let ba = multimerge(&b, &a);
        assert_eq!(ab, ba);
        assert_eq!(ab, vec![md(&[0.0, 2.0]), md(&[1.0, 0.0])]);
    }

    #[test]
    fn multimerge_of_an_antichain_with_itself_is_identity() {
        let a = multimin(&[md(&[1.0, 0.0]), md(&[0.0, 1.0])]);
        assert_eq!(multimerge(&a, &a), a);
    }

    #[test]
    fn multimerge_matches_multimin_of_the_union() {
        let a = multimin(&[md(&[1.0, 3.0]), md(&[2.0, 1.0])]);
        let b = multimin(&[md(&[1.0, 2.0]), md(&[4.0, 0.0])]);
        let mut union: Vec<MultiDistance> = a.clone();
        union.extend(b.clone());
        assert_eq!(multimerge(&a, &b), multimin(&union));
    }
}
