//! Corpus loading and batching.
//!
//! A corpus is a list of netlist sources. Each source is parsed and turned
//! into a canonical graph independently (in parallel); sources that fail to
//! parse are logged and dropped, never failing the whole load. Encoding
//! then packs every graph into one set of tensors padded to the corpus-wide
//! entity bound, in source order and then entity order.

pub mod normalize;
pub mod split;

use std::path::Path;

use rayon::prelude::*;

use crate::encoder::{encode_into, Encoded, Encoding};
use crate::error::{NetgraphError, Result};
use crate::graph::{build_graph, CircuitGraph};
use crate::registry::TypeRegistry;
use crate::stats::Stats;

pub use normalize::FeatureStats;
pub use split::{resample_balanced, split_indices, split_masks, SplitMasks};

/// A named netlist text.
#[derive(Debug, Clone)]
pub struct Source {
    pub name: String,
    pub text: String,
}

impl Source {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

/// A successfully loaded netlist.
#[derive(Debug, Clone)]
pub struct CorpusEntry {
    pub name: String,
    pub graph: CircuitGraph,
}

/// Canonical graphs of every valid source, in source order.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    entries: Vec<CorpusEntry>,
    skipped: Vec<String>,
}

impl Corpus {
    /// Build graphs for `sources`, skipping the ones that do not parse.
    pub fn load(sources: &[Source], registry: &TypeRegistry) -> Self {
        let _span = tracing::info_span!("corpus_load", sources = sources.len()).entered();

        let results: Vec<(&Source, Result<CircuitGraph>)> = sources
            .par_iter()
            .map(|src| (src, build_graph(&src.text, registry)))
            .collect();

        let mut corpus = Corpus::default();
        for (src, result) in results {
            match result {
                Ok(graph) => corpus.entries.push(CorpusEntry {
                    name: src.name.clone(),
                    graph,
                }),
                Err(e) => {
                    tracing::warn!(source = %src.name, error = %e, "skipping invalid netlist");
                    corpus.skipped.push(src.name.clone());
                }
            }
        }

        tracing::info!(
            loaded = corpus.entries.len(),
            skipped = corpus.skipped.len(),
            max_entities = corpus.max_entities(),
            "corpus loaded"
        );
        corpus
    }

    /// Read netlist files and load them. Unreadable files are skipped like
    /// invalid ones. Bytes that are not UTF-8 are replaced.
    pub fn from_paths<P: AsRef<Path>>(paths: &[P], registry: &TypeRegistry) -> Self {
        let mut sources = Vec::with_capacity(paths.len());
        let mut unreadable = Vec::new();
        for path in paths {
            let path = path.as_ref();
            let name = path.display().to_string();
            match std::fs::read(path) {
                Ok(bytes) => sources.push(Source::new(name, String::from_utf8_lossy(&bytes))),
                Err(e) => {
                    tracing::warn!(source = %name, error = %e, "skipping unreadable netlist");
                    unreadable.push(name);
                }
            }
        }

        let mut corpus = Self::load(&sources, registry);
        corpus.skipped.extend(unreadable);
        corpus
    }

    pub fn entries(&self) -> &[CorpusEntry] {
        &self.entries
    }

    /// Names of the sources that were dropped.
    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Largest entity count of any loaded graph.
    pub fn max_entities(&self) -> usize {
        self.entries.iter().map(|e| e.graph.len()).max().unwrap_or(0)
    }

    pub fn total_entities(&self) -> usize {
        self.entries.iter().map(|e| e.graph.len()).sum()
    }

    /// True type of the entity each sample hides, in sample order. Every
    /// encoding emits one sample per entity, so this lines up with the
    /// first axis of any batch from `encode`.
    pub fn sample_labels(&self) -> Vec<usize> {
        self.entries
            .iter()
            .flat_map(|e| e.graph.type_indices())
            .collect()
    }

    /// `(entry, entity)` that produced each sample, in sample order.
    pub fn sample_origins(&self) -> Vec<(usize, usize)> {
        self.entries
            .iter()
            .enumerate()
            .flat_map(|(file, e)| (0..e.graph.len()).map(move |entity| (file, entity)))
            .collect()
    }

    /// Encode every graph into one padded batch.
    ///
    /// `max_entities` defaults to the corpus maximum. A smaller explicit
    /// bound than some graph needs is a `ShapeMismatch`.
    pub fn encode(
        &self,
        registry: &TypeRegistry,
        encoding: Encoding,
        max_entities: Option<usize>,
        stats: Option<&mut Stats>,
    ) -> Result<Encoded> {
        let bound = max_entities.unwrap_or_else(|| self.max_entities());
        let _span = tracing::info_span!("encode", encoding = encoding.name(), max_entities = bound).entered();
        let start = std::time::Instant::now();

        if let Some(entry) = self.entries.iter().find(|e| e.graph.len() > bound) {
            return Err(NetgraphError::ShapeMismatch {
                required: entry.graph.len(),
                available: bound,
            });
        }

        // one sample per entity in every encoding
        let samples = self.total_entities();
        let mut out = Encoded::zeros(encoding, samples, bound, registry);

        let mut offset = 0;
        for entry in &self.entries {
            encode_into(&entry.graph, registry, &mut out, offset)?;
            offset += entry.graph.len();
        }

        tracing::debug!(samples, "encoded corpus");
        if let Some(s) = stats {
            s.samples += samples;
            s.add_phase("encode", start.elapsed());
        }
        Ok(out)
    }
}
