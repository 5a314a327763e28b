//! Masked reconstruction.
//!
//! One sample per entity. Sample `i` hides entity `i`'s type by overwriting
//! its feature row with the unknown one-hot; its edges stay in place. The
//! label is the full, unmasked feature matrix.

use super::{check_capacity, write_adjacency, write_features, Encoded, Encoding};
use crate::error::Result;
use crate::graph::CircuitGraph;
use crate::registry::{TypeRegistry, UNKNOWN};

/// Encode `graph` with each entity masked in turn.
pub fn encode_masked(graph: &CircuitGraph, registry: &TypeRegistry, max_entities: usize) -> Result<Encoded> {
    super::encode(graph, registry, Encoding::Masked, max_entities)
}

pub(super) fn encode_masked_into(
    graph: &CircuitGraph,
    registry: &TypeRegistry,
    out: &mut Encoded,
    offset: usize,
) -> Result<()> {
    check_capacity(graph, registry, out, offset, graph.len())?;

    for masked in 0..graph.len() {
        let sample = offset + masked;
        write_adjacency(graph, &mut out.a, sample, None);
        write_features(graph, registry, &mut out.x, sample);
        write_features(graph, registry, &mut out.y, sample);
        registry.write_one_hot(out.x.row_mut(sample, masked), UNKNOWN);
    }
    Ok(())
}
