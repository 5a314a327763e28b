//! Netlist intermediate representation.
//!
//! The parser produces a `Netlist` of elements whose pins reference interned
//! nodes. The graph builder consumes only this shape: ordered elements, each
//! with a kind, an optional subcircuit name and ordered pins.

use std::collections::HashMap;

/// Index of a node in the netlist's interned node table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Canonical name for the reference node. `0`, `gnd` and `GND` all map here.
pub const GROUND: &str = "0";

/// Concrete kind of a parsed circuit element, keyed by the SPICE prefix letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Resistor,
    /// Capacitor given by a value or expression.
    BehavioralCapacitor,
    /// Semiconductor capacitor referencing a model.
    Capacitor,
    BehavioralInductor,
    CoupledInductor,
    VoltageSource,
    CurrentSource,
    Vccs,
    Vcvs,
    /// Current-controlled current source (F).
    Cccs,
    /// Current-controlled voltage source (H).
    Ccvs,
    BehavioralSource,
    Diode,
    Mosfet,
    Jfet,
    Bjt,
    Mesfet,
    Switch,
    CurrentSwitch,
    TransmissionLine,
    SubCircuit,
    XspiceElement,
}

impl ElementKind {
    /// Short human-readable name, used in logs and CLI output.
    pub fn name(self) -> &'static str {
        match self {
            ElementKind::Resistor => "resistor",
            ElementKind::BehavioralCapacitor => "behavioral_capacitor",
            ElementKind::Capacitor => "capacitor",
            ElementKind::BehavioralInductor => "behavioral_inductor",
            ElementKind::CoupledInductor => "coupled_inductor",
            ElementKind::VoltageSource => "voltage_source",
            ElementKind::CurrentSource => "current_source",
            ElementKind::Vccs => "vccs",
            ElementKind::Vcvs => "vcvs",
            ElementKind::Cccs => "cccs",
            ElementKind::Ccvs => "ccvs",
            ElementKind::BehavioralSource => "behavioral_source",
            ElementKind::Diode => "diode",
            ElementKind::Mosfet => "mosfet",
            ElementKind::Jfet => "jfet",
            ElementKind::Bjt => "bjt",
            ElementKind::Mesfet => "mesfet",
            ElementKind::Switch => "switch",
            ElementKind::CurrentSwitch => "current_switch",
            ElementKind::TransmissionLine => "transmission_line",
            ElementKind::SubCircuit => "subcircuit",
            ElementKind::XspiceElement => "xspice_element",
        }
    }
}

/// A named connection terminal of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pin {
    pub name: String,
    pub node: NodeId,
}

/// A circuit element parsed from the netlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub kind: ElementKind,
    /// Declared subcircuit name for `X` instances.
    pub subcircuit: Option<String>,
    pub pins: Vec<Pin>,
}

/// A `.SUBCKT` definition header. Bodies are not expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubcircuitDef {
    pub name: String,
    pub ports: Vec<String>,
}

/// A parsed netlist: top-level elements plus the interned node table.
#[derive(Debug, Clone, Default)]
pub struct Netlist {
    pub title: Option<String>,
    pub elements: Vec<Element>,
    pub subcircuits: Vec<SubcircuitDef>,
    nodes: Vec<String>,
    node_index: HashMap<String, NodeId>,
}

impl Netlist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a node name, returning its stable id.
    pub fn intern_node(&mut self, name: &str) -> NodeId {
        let canonical = if name == GROUND || name.eq_ignore_ascii_case("gnd") {
            GROUND
        } else {
            name
        };
        if let Some(&id) = self.node_index.get(canonical) {
            return id;
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(canonical.to_string());
        self.node_index.insert(canonical.to_string(), id);
        id
    }

    pub fn node_name(&self, id: NodeId) -> &str {
        &self.nodes[id.0]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_reuses_ids() {
        let mut n = Netlist::new();
        let a = n.intern_node("in");
        let b = n.intern_node("out");
        assert_eq!(n.intern_node("in"), a);
        assert_ne!(a, b);
        assert_eq!(n.node_count(), 2);
    }

    #[test]
    fn ground_aliases_share_one_node() {
        let mut n = Netlist::new();
        let g0 = n.intern_node("0");
        assert_eq!(n.intern_node("gnd"), g0);
        assert_eq!(n.intern_node("GND"), g0);
        assert_eq!(n.node_name(g0), "0");
    }

    #[test]
    fn node_names_are_case_sensitive() {
        let mut n = Netlist::new();
        assert_ne!(n.intern_node("Vdd"), n.intern_node("VDD"));
    }
}
