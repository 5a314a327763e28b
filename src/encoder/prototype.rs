//! Prototype link prediction.
//!
//! The graph is extended with one unconnected candidate ("prototype") entity
//! per registry type. In training mode one entity is omitted per sample and
//! its slot is reused as the first candidate, which always carries the
//! omitted entity's true type; the remaining candidates follow at `n..` in
//! registry order, skipping the true type. The link target therefore always
//! marks candidate 0 as the positive class.
//!
//! Candidate rows set the flag column `T` in addition to their type. No
//! candidate has edges: which candidate links into the graph is what the
//! model predicts.

use super::{check_capacity, write_adjacency, write_features, Encoded, Encoding};
use crate::error::Result;
use crate::graph::CircuitGraph;
use crate::registry::TypeRegistry;

/// Candidate `(slot, type_index)` pairs for a graph of `n` entities.
///
/// With `omitted = Some((entity, true_type))` the first pair is
/// `(entity, true_type)` and `type_count - 1` further slots follow from `n`.
/// With `None` all `type_count` types get fresh slots from `n` in order.
pub fn candidate_slots(n: usize, type_count: usize, omitted: Option<(usize, usize)>) -> Vec<(usize, usize)> {
    match omitted {
        Some((entity, true_type)) => {
            let others = (0..type_count).filter(|&t| t != true_type);
            std::iter::once((entity, true_type))
                .chain(others.enumerate().map(|(k, t)| (n + k, t)))
                .collect()
        }
        None => (0..type_count).map(|t| (n + t, t)).collect(),
    }
}

/// Training encoding: one sample per omitted entity.
pub fn encode_prototype(graph: &CircuitGraph, registry: &TypeRegistry, max_entities: usize) -> Result<Encoded> {
    super::encode(graph, registry, Encoding::Prototype, max_entities)
}

/// Inference encoding: a single sample with the whole graph kept and every
/// type offered as a candidate. The target is all zero.
pub fn encode_prototype_candidates(
    graph: &CircuitGraph,
    registry: &TypeRegistry,
    max_entities: usize,
) -> Result<Encoded> {
    let mut out = Encoded::zeros(Encoding::Prototype, 1, max_entities, registry);
    check_capacity(graph, registry, &out, 0, 1)?;
    write_adjacency(graph, &mut out.a, 0, None);
    write_features(graph, registry, &mut out.x, 0);
    write_candidates(&mut out, registry, 0, &candidate_slots(graph.len(), registry.len(), None));
    Ok(out)
}

pub(super) fn encode_prototype_into(
    graph: &CircuitGraph,
    registry: &TypeRegistry,
    out: &mut Encoded,
    offset: usize,
) -> Result<()> {
    check_capacity(graph, registry, out, offset, graph.len())?;
    let type_count = registry.len();

    for omitted in 0..graph.len() {
        let sample = offset + omitted;
        let true_type = graph.entity(omitted).type_index;

        write_adjacency(graph, &mut out.a, sample, Some(omitted));
        write_features(graph, registry, &mut out.x, sample);

        let slots = candidate_slots(graph.len(), type_count, Some((omitted, true_type)));
        write_candidates(out, registry, sample, &slots);
        out.y.set(&[sample, 0], 1.0);
    }
    Ok(())
}

/// Type the candidate rows and set their flag column.
fn write_candidates(out: &mut Encoded, registry: &TypeRegistry, sample: usize, slots: &[(usize, usize)]) {
    let flag = registry.len();
    for &(slot, candidate_type) in slots {
        let row = out.x.row_mut(sample, slot);
        registry.write_one_hot(row, candidate_type);
        row[flag] = 1.0;
    }
}
