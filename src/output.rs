//! Graph and encoding output formatting (CSV).

use crate::encoder::Encoded;
use crate::error::Result;
use crate::graph::{CircuitGraph, EntityKind};
use crate::registry::TypeRegistry;
use std::io::Write;

/// Write the entity list as CSV.
///
/// Format:
/// ```csv
/// Index,Name,Kind,Type,TypeIndex,Degree
/// 0,V1,voltage_source,voltage_source,3,2
/// 1,in,node,node,6,2
/// ```
pub fn write_entities_csv<W: Write>(graph: &CircuitGraph, registry: &TypeRegistry, writer: &mut W) -> Result<()> {
    writeln!(writer, "Index,Name,Kind,Type,TypeIndex,Degree")?;
    for (i, entity) in graph.entities().iter().enumerate() {
        let kind = match entity.kind {
            EntityKind::Component(k) => k.name(),
            EntityKind::Node => "node",
        };
        let tag = registry.tag(entity.type_index).unwrap_or("?");
        writeln!(
            writer,
            "{},{},{},{},{},{}",
            i,
            entity.name,
            kind,
            tag,
            entity.type_index,
            graph.degree(i)
        )?;
    }
    Ok(())
}

/// Write the adjacency as an edge list, one undirected edge per line with
/// the component first.
///
/// Format:
/// ```csv
/// Component,Node
/// V1,in
/// V1,0
/// ```
pub fn write_adjacency_csv<W: Write>(graph: &CircuitGraph, writer: &mut W) -> Result<()> {
    writeln!(writer, "Component,Node")?;
    for (i, entity) in graph.entities().iter().enumerate() {
        if !entity.is_component() {
            continue;
        }
        for &j in graph.neighbors(i) {
            writeln!(writer, "{},{}", entity.name, graph.entity(j).name)?;
        }
    }
    Ok(())
}

/// Write the shapes of `A`, `X` and `y`.
pub fn write_shapes_csv<W: Write>(encoded: &Encoded, writer: &mut W) -> Result<()> {
    writeln!(writer, "Tensor,Shape")?;
    for (name, tensor) in [("A", &encoded.a), ("X", &encoded.x), ("y", &encoded.y)] {
        let dims: Vec<String> = tensor.shape().iter().map(|d| d.to_string()).collect();
        writeln!(writer, "{},{}", name, dims.join("x"))?;
    }
    Ok(())
}

/// Write tensor shapes followed by one summary line per sample.
///
/// Format:
/// ```csv
/// Tensor,Shape
/// A,5x5x5
/// X,5x5x18
/// y,5x18
/// Sample,Edges,Target
/// 0,6,3
/// ```
///
/// `Edges` counts undirected edges in the sample's adjacency. `Target` is
/// the column of the largest label value (the hidden type for omission,
/// the positive candidate for actions and prototypes); masked samples have
/// a full label matrix and report `-`.
pub fn write_encoding_summary<W: Write>(encoded: &Encoded, writer: &mut W) -> Result<()> {
    write_shapes_csv(encoded, writer)?;

    writeln!(writer, "Sample,Edges,Target")?;
    let label_rank = encoded.y.shape().len();
    for s in 0..encoded.samples() {
        let edges = encoded.a.entry(s).iter().filter(|&&v| v != 0.0).count() / 2;
        if label_rank == 2 {
            let target = argmax(encoded.y.entry(s));
            writeln!(writer, "{},{},{}", s, edges, target)?;
        } else {
            writeln!(writer, "{},{},-", s, edges)?;
        }
    }
    Ok(())
}

fn argmax(values: &[f32]) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |best, (i, &v)| if v > best.1 { (i, v) } else { best })
        .0
}
