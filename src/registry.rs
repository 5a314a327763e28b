//! Component type registry.
//!
//! An ordered, append-only enumeration of type tags. The built-in tags come
//! first in a fixed order; subcircuit labels read from a side file are
//! appended after them, one per distinct label. Labels live in their own
//! namespace: a label spelled like a built-in tag (`resistor`, `node`) still
//! gets a fresh index. Once constructed the registry is read-only and shared
//! by reference, so one-hot widths agree across every graph encoded in a
//! session.

use std::collections::HashMap;
use std::path::Path;

use crate::error::{NetgraphError, Result};
use crate::ir::{Element, ElementKind};

/// Built-in tags in canonical order. Indices into this list are stable.
pub const BUILTIN_TAGS: &[&str] = &[
    "unknown",
    "resistor",
    "behavioral_capacitor",
    "voltage_source",
    "mosfet",
    "subcircuit",
    "node",
    "diode",
    "behavioral_inductor",
    "current_source",
    "vccs",
    "vcvs",
    "capacitor",
    "coupled_inductor",
    "jfet",
    "bjt",
    "xspice_element",
    "behavioral_source",
];

pub const UNKNOWN: usize = 0;
pub const SUBCIRCUIT: usize = 5;
pub const NODE: usize = 6;

/// Tag index for a parsed element kind, or `None` for kinds with no tag.
fn builtin_index(kind: ElementKind) -> Option<usize> {
    let idx = match kind {
        ElementKind::Resistor => 1,
        ElementKind::BehavioralCapacitor => 2,
        ElementKind::VoltageSource => 3,
        ElementKind::Mosfet => 4,
        ElementKind::SubCircuit => SUBCIRCUIT,
        ElementKind::Diode => 7,
        ElementKind::BehavioralInductor => 8,
        ElementKind::CurrentSource => 9,
        ElementKind::Vccs => 10,
        ElementKind::Vcvs => 11,
        ElementKind::Capacitor => 12,
        ElementKind::CoupledInductor => 13,
        ElementKind::Jfet => 14,
        ElementKind::Bjt => 15,
        ElementKind::XspiceElement => 16,
        ElementKind::BehavioralSource => 17,
        ElementKind::Cccs
        | ElementKind::Ccvs
        | ElementKind::Mesfet
        | ElementKind::Switch
        | ElementKind::CurrentSwitch
        | ElementKind::TransmissionLine => return None,
    };
    Some(idx)
}

/// What a graph vertex is, as far as typing is concerned.
#[derive(Debug, Clone, Copy)]
pub enum EntityRef<'a> {
    Component(&'a Element),
    Node,
}

/// The component type enumeration plus the subcircuit label mapping.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    tags: Vec<String>,
    tag_index: HashMap<String, usize>,
    label_index: HashMap<String, usize>,
    subcircuit_labels: HashMap<String, String>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TypeRegistry {
    /// Registry with only the built-in tags.
    pub fn builtin() -> Self {
        let tags: Vec<String> = BUILTIN_TAGS.iter().map(|t| t.to_string()).collect();
        let tag_index = tags.iter().enumerate().map(|(i, t)| (t.clone(), i)).collect();
        Self {
            tags,
            tag_index,
            label_index: HashMap::new(),
            subcircuit_labels: HashMap::new(),
        }
    }

    /// Read `subcircuit_name label` pairs from a side file.
    pub fn from_side_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let registry = Self::from_mappings(&text);
        tracing::debug!(
            path = %path.display(),
            labels = registry.subcircuit_labels.len(),
            types = registry.len(),
            "loaded subcircuit types"
        );
        Ok(registry)
    }

    /// Build from side-file text. Lines that do not split into exactly two
    /// whitespace-separated tokens are ignored.
    pub fn from_mappings(text: &str) -> Self {
        let mut registry = Self::builtin();
        for line in text.lines() {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if let [subcircuit, label] = tokens.as_slice() {
                registry.add_mapping(subcircuit, label);
            }
        }
        registry
    }

    fn add_mapping(&mut self, subcircuit: &str, label: &str) {
        self.subcircuit_labels
            .insert(subcircuit.to_string(), label.to_string());
        if self.label_index.contains_key(label) {
            return;
        }
        let index = self.tags.len();
        self.label_index.insert(label.to_string(), index);
        // display name must not shadow a built-in tag
        let tag = if self.tag_index.contains_key(label) {
            format!("subcircuit:{}", label)
        } else {
            label.to_string()
        };
        self.tag_index.entry(tag.clone()).or_insert(index);
        self.tags.push(tag);
    }

    /// Number of tags; the one-hot feature width.
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn tag(&self, index: usize) -> Option<&str> {
        self.tags.get(index).map(String::as_str)
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Index of a tag by display name.
    pub fn index_of(&self, tag: &str) -> Option<usize> {
        self.tag_index.get(tag).copied()
    }

    /// Index of a side-file label.
    pub fn label_index(&self, label: &str) -> Option<usize> {
        self.label_index.get(label).copied()
    }

    pub fn label_for(&self, subcircuit: &str) -> Option<&str> {
        self.subcircuit_labels.get(subcircuit).map(String::as_str)
    }

    /// Type index of an entity.
    ///
    /// Subcircuit instances are typed by their mapped label, falling back to
    /// the generic subcircuit tag. Element kinds without a tag are an
    /// `UnknownType` error.
    pub fn type_index(&self, entity: EntityRef<'_>) -> Result<usize> {
        let element = match entity {
            EntityRef::Node => return Ok(NODE),
            EntityRef::Component(element) => element,
        };

        if element.kind == ElementKind::SubCircuit {
            let label = element
                .subcircuit
                .as_deref()
                .and_then(|name| self.label_for(name));
            return match label {
                Some(label) => self
                    .label_index(label)
                    .ok_or_else(|| NetgraphError::UnknownType(label.to_string())),
                None => Ok(SUBCIRCUIT),
            };
        }

        builtin_index(element.kind).ok_or_else(|| {
            NetgraphError::UnknownType(format!("{} ({})", element.kind.name(), element.name))
        })
    }

    /// Like `type_index`, mapping unregistered kinds to the unknown tag.
    pub fn type_index_or_unknown(&self, entity: EntityRef<'_>) -> usize {
        match self.type_index(entity) {
            Ok(idx) => idx,
            Err(e) => {
                tracing::debug!(%e, "typing entity as unknown");
                UNKNOWN
            }
        }
    }

    /// Overwrite the first `len()` columns of `row` with the one-hot
    /// encoding of `index`. Columns past the registry width are left alone.
    pub fn write_one_hot(&self, row: &mut [f32], index: usize) {
        row[..self.len()].fill(0.0);
        row[index] = 1.0;
    }

    /// Tag name to index mapping, for inspection. Labels spelled like a
    /// built-in tag appear as `subcircuit:<label>`.
    pub fn to_json(&self) -> serde_json::Result<String> {
        let map: serde_json::Map<String, serde_json::Value> = self
            .tags
            .iter()
            .enumerate()
            .map(|(i, tag)| (tag.clone(), serde_json::Value::from(i)))
            .collect();
        serde_json::to_string_pretty(&map)
    }
}
