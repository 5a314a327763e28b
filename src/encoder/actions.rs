//! Omission with candidate actions.
//!
//! Like omission, but every sample also carries one candidate ("action")
//! entity per registry type, appended after the real entities at
//! `n + type_index`. Each candidate is wired to the neighbors the omitted
//! entity had, so the model scores "which type belongs in this hole".
//!
//! Features are `T + 1` wide; the last column flags candidate rows. The
//! target has one entry per entity: `1` for the candidate of the true type,
//! `0` for the other candidates and `-1` (ignored) everywhere else.

use super::{check_capacity, write_adjacency, write_features, Encoded, Encoding};
use crate::error::Result;
use crate::graph::CircuitGraph;
use crate::registry::{TypeRegistry, UNKNOWN};

/// Encode `graph` with each entity omitted in turn and candidates appended.
pub fn encode_omitted_with_actions(
    graph: &CircuitGraph,
    registry: &TypeRegistry,
    max_entities: usize,
) -> Result<Encoded> {
    super::encode(graph, registry, Encoding::Actions, max_entities)
}

pub(super) fn encode_omitted_with_actions_into(
    graph: &CircuitGraph,
    registry: &TypeRegistry,
    out: &mut Encoded,
    offset: usize,
) -> Result<()> {
    check_capacity(graph, registry, out, offset, graph.len())?;
    let n = graph.len();
    let type_count = registry.len();
    let flag = type_count;

    for omitted in 0..n {
        let sample = offset + omitted;
        let true_type = graph.entity(omitted).type_index;

        write_adjacency(graph, &mut out.a, sample, Some(omitted));
        write_features(graph, registry, &mut out.x, sample);
        registry.write_one_hot(out.x.row_mut(sample, omitted), UNKNOWN);

        for candidate_type in 0..type_count {
            let candidate = n + candidate_type;
            let row = out.x.row_mut(sample, candidate);
            registry.write_one_hot(row, candidate_type);
            row[flag] = 1.0;
            for &neighbor in graph.neighbors(omitted) {
                out.a.set(&[sample, candidate, neighbor], 1.0);
                out.a.set(&[sample, neighbor, candidate], 1.0);
            }
            let target = if candidate_type == true_type { 1.0 } else { 0.0 };
            out.y.set(&[sample, candidate], target);
        }
    }
    Ok(())
}
