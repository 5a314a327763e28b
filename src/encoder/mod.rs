//! Supervised encodings of the canonical graph.
//!
//! Every encoder turns a `CircuitGraph` into `(A, X, y)` tensors padded to a
//! caller-chosen entity bound. Encoders read the graph and write only into
//! pre-allocated, zero-filled output tensors, so many graphs can be packed
//! into one batch by writing each at its own sample offset.
//!
//! | encoding  | A                | X                   | y              |
//! |-----------|------------------|---------------------|----------------|
//! | masked    | `[S, M, M]`      | `[S, M, T]`         | `[S, M, T]`    |
//! | omitted   | `[S, M, M]`      | `[S, M, T]`         | `[S, T]`       |
//! | actions   | `[S, M+T, M+T]`  | `[S, M+T, T+1]`     | `[S, M+T]`     |
//! | prototype | `[S, M+T, M+T]`  | `[S, M+T, T+1]`     | `[S, T]`       |
//!
//! `S` samples, `M` entity bound, `T` registry size.

pub mod actions;
pub mod masked;
pub mod omitted;
pub mod prototype;

use serde::Deserialize;

use crate::error::{NetgraphError, Result};
use crate::graph::CircuitGraph;
use crate::registry::TypeRegistry;
use crate::tensor::Tensor;

pub use actions::encode_omitted_with_actions;
pub use masked::encode_masked;
pub use omitted::encode_omitted;
pub use prototype::encode_prototype;

/// Supervised framing to encode a graph under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    /// Hide one entity's type, keep its edges; reconstruct all types.
    Masked,
    /// Hide one entity's type and edges; classify the hidden entity.
    Omitted,
    /// Omitted, plus one connected candidate entity per type.
    Actions,
    /// Omitted entity replaced by unconnected candidates; link prediction.
    Prototype,
}

impl Encoding {
    pub fn name(self) -> &'static str {
        match self {
            Encoding::Masked => "masked",
            Encoding::Omitted => "omitted",
            Encoding::Actions => "actions",
            Encoding::Prototype => "prototype",
        }
    }

    /// Padded entity dimension for an entity bound of `max_entities`.
    pub fn padded_entities(self, max_entities: usize, type_count: usize) -> usize {
        match self {
            Encoding::Masked | Encoding::Omitted => max_entities,
            Encoding::Actions | Encoding::Prototype => max_entities + type_count,
        }
    }

    pub fn feature_width(self, type_count: usize) -> usize {
        match self {
            Encoding::Masked | Encoding::Omitted => type_count,
            Encoding::Actions | Encoding::Prototype => type_count + 1,
        }
    }

    fn label_shape(self, samples: usize, padded: usize, type_count: usize) -> Vec<usize> {
        match self {
            Encoding::Masked => vec![samples, padded, type_count],
            Encoding::Omitted | Encoding::Prototype => vec![samples, type_count],
            Encoding::Actions => vec![samples, padded],
        }
    }
}

/// Adjacency, feature and label tensors for a batch of samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Encoded {
    pub encoding: Encoding,
    /// Entity bound the tensors were sized for (before candidate expansion).
    pub max_entities: usize,
    pub a: Tensor,
    pub x: Tensor,
    pub y: Tensor,
}

impl Encoded {
    /// Zero-filled tensors for `samples` samples.
    pub fn zeros(encoding: Encoding, samples: usize, max_entities: usize, registry: &TypeRegistry) -> Self {
        let t = registry.len();
        let padded = encoding.padded_entities(max_entities, t);
        let label_shape = encoding.label_shape(samples, padded, t);
        let y = match encoding {
            // rows that are not candidates are ignored by the loss
            Encoding::Actions => Tensor::full(&label_shape, IGNORE),
            _ => Tensor::zeros(&label_shape),
        };
        Self {
            encoding,
            max_entities,
            a: Tensor::zeros(&[samples, padded, padded]),
            x: Tensor::zeros(&[samples, padded, encoding.feature_width(t)]),
            y,
        }
    }

    pub fn samples(&self) -> usize {
        self.a.shape()[0]
    }

    /// Padded entity dimension of `A` and `X`.
    pub fn padded_entities(&self) -> usize {
        self.a.shape()[1]
    }

    /// Subset of samples, in the given order.
    pub fn select(&self, samples: &[usize]) -> Encoded {
        Encoded {
            encoding: self.encoding,
            max_entities: self.max_entities,
            a: self.a.select(samples),
            x: self.x.select(samples),
            y: self.y.select(samples),
        }
    }
}

/// Target value for rows that carry no label.
pub const IGNORE: f32 = -1.0;

/// Encode one graph into freshly allocated tensors.
pub fn encode(
    graph: &CircuitGraph,
    registry: &TypeRegistry,
    encoding: Encoding,
    max_entities: usize,
) -> Result<Encoded> {
    let mut out = Encoded::zeros(encoding, graph.len(), max_entities, registry);
    encode_into(graph, registry, &mut out, 0)?;
    Ok(out)
}

/// Encode one graph into `out`, starting at sample `offset`.
pub fn encode_into(
    graph: &CircuitGraph,
    registry: &TypeRegistry,
    out: &mut Encoded,
    offset: usize,
) -> Result<()> {
    match out.encoding {
        Encoding::Masked => masked::encode_masked_into(graph, registry, out, offset),
        Encoding::Omitted => omitted::encode_omitted_into(graph, registry, out, offset),
        Encoding::Actions => actions::encode_omitted_with_actions_into(graph, registry, out, offset),
        Encoding::Prototype => prototype::encode_prototype_into(graph, registry, out, offset),
    }
}

/// Fail if the output cannot hold `graph` and `samples` samples starting at
/// `offset`, or if the graph was typed with a larger registry.
fn check_capacity(
    graph: &CircuitGraph,
    registry: &TypeRegistry,
    out: &Encoded,
    offset: usize,
    samples: usize,
) -> Result<()> {
    if let Some(entity) = graph.entities().iter().find(|e| e.type_index >= registry.len()) {
        return Err(NetgraphError::UnknownType(format!(
            "{} has type index {} outside a registry of {} types",
            entity.name,
            entity.type_index,
            registry.len()
        )));
    }
    if graph.len() > out.max_entities {
        return Err(NetgraphError::ShapeMismatch {
            required: graph.len(),
            available: out.max_entities,
        });
    }
    if offset + samples > out.samples() {
        return Err(NetgraphError::ShapeMismatch {
            required: offset + samples,
            available: out.samples(),
        });
    }
    Ok(())
}

/// Copy the graph adjacency into sample `sample` of `a`, skipping entity
/// `dropped` if given.
fn write_adjacency(graph: &CircuitGraph, a: &mut Tensor, sample: usize, dropped: Option<usize>) {
    for i in 0..graph.len() {
        if Some(i) == dropped {
            continue;
        }
        for &j in graph.neighbors(i) {
            if Some(j) != dropped {
                a.set(&[sample, i, j], 1.0);
            }
        }
    }
}

/// Write the one-hot type rows of every entity into sample `sample` of `x`.
fn write_features(graph: &CircuitGraph, registry: &TypeRegistry, x: &mut Tensor, sample: usize) {
    for (i, entity) in graph.entities().iter().enumerate() {
        registry.write_one_hot(x.row_mut(sample, i), entity.type_index);
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::graph::{build_graph, CircuitGraph};
    use crate::registry::TypeRegistry;

    /// V1 between `in` and ground, R1 between `in` and `out`.
    /// Entities: V1=0 in=1 0=2 R1=3 out=4.
    pub const SOURCE_RESISTOR: &str = "source driving a resistor\nV1 in 0 DC 5\nR1 in out 1k\n";

    pub fn graph(text: &str) -> CircuitGraph {
        build_graph(text, &TypeRegistry::builtin()).unwrap()
    }

    /// Sum of a row slice.
    pub fn row_sum(row: &[f32]) -> f32 {
        row.iter().sum()
    }
}
