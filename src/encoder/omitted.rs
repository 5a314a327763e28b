//! Single-entity omission.
//!
//! Sample `i` hides entity `i` completely: its feature row is the unknown
//! one-hot and its adjacency row and column are zero. The label is the
//! one-hot type of the hidden entity.

use super::{check_capacity, write_adjacency, write_features, Encoded, Encoding};
use crate::error::Result;
use crate::graph::CircuitGraph;
use crate::registry::{TypeRegistry, UNKNOWN};

/// Encode `graph` with each entity omitted in turn.
pub fn encode_omitted(graph: &CircuitGraph, registry: &TypeRegistry, max_entities: usize) -> Result<Encoded> {
    super::encode(graph, registry, Encoding::Omitted, max_entities)
}

pub(super) fn encode_omitted_into(
    graph: &CircuitGraph,
    registry: &TypeRegistry,
    out: &mut Encoded,
    offset: usize,
) -> Result<()> {
    check_capacity(graph, registry, out, offset, graph.len())?;

    for omitted in 0..graph.len() {
        let sample = offset + omitted;
        write_adjacency(graph, &mut out.a, sample, Some(omitted));
        write_features(graph, registry, &mut out.x, sample);
        registry.write_one_hot(out.x.row_mut(sample, omitted), UNKNOWN);

        out.y.set(&[sample, graph.entity(omitted).type_index], 1.0);
    }
    Ok(())
}
