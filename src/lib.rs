//! SPICE netlists as bipartite graphs and supervised training tensors.

pub mod config;
pub mod dataset;
pub mod encoder;
pub mod error;
pub mod graph;
pub mod ir;
pub mod output;
pub mod parser;
pub mod registry;
pub mod sparse;
pub mod stats;
pub mod tensor;
