//! Canonical circuit graph.
//!
//! A netlist becomes a bipartite graph whose vertices ("entities") are the
//! circuit elements and the electrical nodes they connect to. Entities are
//! numbered in first-seen order while walking the element list: each
//! element, then any of its pin nodes not seen before. Edges only ever join
//! an element to a node.

use std::collections::HashMap;

use crate::error::Result;
use crate::ir::{ElementKind, Netlist, NodeId};
use crate::parser;
use crate::registry::{EntityRef, TypeRegistry, NODE};
use crate::sparse::{symmetric_adjacency, CsrMatrix};

/// Whether an entity is a circuit element or an electrical node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Component(ElementKind),
    Node,
}

/// A vertex of the canonical graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    /// Element name (`R1`) or node name (`out`).
    pub name: String,
    pub kind: EntityKind,
    /// Index into the type registry the graph was built with.
    pub type_index: usize,
}

impl Entity {
    pub fn is_component(&self) -> bool {
        matches!(self.kind, EntityKind::Component(_))
    }
}

/// Identity of a netlist object, independent of its type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum EntityKey {
    Element(usize),
    Node(NodeId),
}

/// Ordered entities plus a symmetric binary adjacency over them.
#[derive(Debug, Clone, PartialEq)]
pub struct CircuitGraph {
    entities: Vec<Entity>,
    adjacency: CsrMatrix<f32>,
}

impl CircuitGraph {
    /// Build the canonical graph of a parsed netlist.
    pub fn from_netlist(netlist: &Netlist, registry: &TypeRegistry) -> Self {
        let mut entities: Vec<Entity> = Vec::new();
        let mut index: HashMap<EntityKey, usize> = HashMap::new();
        let mut edges: Vec<(usize, usize)> = Vec::new();

        for (elem_idx, element) in netlist.elements.iter().enumerate() {
            let elem_id = *index.entry(EntityKey::Element(elem_idx)).or_insert_with(|| {
                entities.push(Entity {
                    name: element.name.clone(),
                    kind: EntityKind::Component(element.kind),
                    type_index: registry.type_index_or_unknown(EntityRef::Component(element)),
                });
                entities.len() - 1
            });

            for pin in &element.pins {
                let node_id = *index.entry(EntityKey::Node(pin.node)).or_insert_with(|| {
                    entities.push(Entity {
                        name: netlist.node_name(pin.node).to_string(),
                        kind: EntityKind::Node,
                        type_index: NODE,
                    });
                    entities.len() - 1
                });
                edges.push((elem_id, node_id));
            }
        }

        let adjacency = symmetric_adjacency(entities.len(), &edges);
        Self {
            entities,
            adjacency,
        }
    }

    /// Number of entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entity(&self, i: usize) -> &Entity {
        &self.entities[i]
    }

    pub fn adjacency(&self) -> &CsrMatrix<f32> {
        &self.adjacency
    }

    pub fn is_adjacent(&self, i: usize, j: usize) -> bool {
        self.adjacency.get(i, j) != 0.0
    }

    /// Entities adjacent to `i`, ascending.
    pub fn neighbors(&self, i: usize) -> &[usize] {
        self.adjacency.row_indices(i)
    }

    pub fn degree(&self, i: usize) -> usize {
        self.neighbors(i).len()
    }

    /// Type index of every entity, in entity order.
    pub fn type_indices(&self) -> Vec<usize> {
        self.entities.iter().map(|e| e.type_index).collect()
    }

    pub fn component_count(&self) -> usize {
        self.entities.iter().filter(|e| e.is_component()).count()
    }

    pub fn node_count(&self) -> usize {
        self.len() - self.component_count()
    }
}

/// Parse `text` and build its canonical graph.
pub fn build_graph(text: &str, registry: &TypeRegistry) -> Result<CircuitGraph> {
    let netlist = parser::parse(text)?;
    Ok(CircuitGraph::from_netlist(&netlist, registry))
}

/// True if `text` parses as a netlist. Used to filter corpora before encoding.
pub fn is_valid_netlist(text: &str) -> bool {
    parser::is_valid(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NetgraphError;
    use crate::registry::{SUBCIRCUIT, UNKNOWN};

    const DIVIDER: &str = "\
* voltage divider
V1 in 0 DC 5
R1 in out 1k
R2 out 0 1k
.end
";

    fn graph(text: &str) -> CircuitGraph {
        build_graph(text, &TypeRegistry::builtin()).unwrap()
    }

    fn names(g: &CircuitGraph) -> Vec<&str> {
        g.entities().iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn entities_in_first_seen_order() {
        let g = graph(DIVIDER);
        assert_eq!(names(&g), vec!["V1", "in", "0", "R1", "out", "R2"]);
        assert_eq!(g.component_count(), 3);
        assert_eq!(g.node_count(), 3);
    }

    #[test]
    fn edges_join_elements_to_their_nodes() {
        let g = graph(DIVIDER);
        // V1=0 in=1 0=2 R1=3 out=4 R2=5
        assert_eq!(g.neighbors(0), &[1, 2]);
        assert_eq!(g.neighbors(1), &[0, 3]);
        assert_eq!(g.neighbors(4), &[3, 5]);
        assert_eq!(g.degree(2), 2);
    }

    #[test]
    fn adjacency_is_symmetric_without_self_loops() {
        let g = graph(DIVIDER);
        assert!(g.adjacency().is_symmetric());
        for i in 0..g.len() {
            assert!(!g.is_adjacent(i, i));
        }
    }

    #[test]
    fn graph_is_bipartite() {
        let g = graph("mixed devices\nM1 d g s b NMOS\nR1 d vdd 1k\nX1 g s amp\nC1 s 0 1p");
        for i in 0..g.len() {
            for &j in g.neighbors(i) {
                assert_ne!(g.entity(i).is_component(), g.entity(j).is_component());
            }
        }
    }

    #[test]
    fn build_is_deterministic() {
        assert_eq!(graph(DIVIDER), graph(DIVIDER));
    }

    #[test]
    fn shared_node_pins_collapse_to_one_edge() {
        // source and bulk tied to the same node
        let g = graph("tied bulk\nM1 d g s s NMOS");
        assert_eq!(g.len(), 4);
        assert_eq!(g.degree(0), 3);
        assert_eq!(g.adjacency().get(0, 3), 1.0);
    }

    #[test]
    fn pinless_element_keeps_empty_row() {
        let g = graph("transformer\nL1 a 0 1u\nL2 b 0 1u\nK1 L1 L2 0.9");
        let k = g.entities().iter().position(|e| e.name == "K1").unwrap();
        assert_eq!(g.degree(k), 0);
        assert_eq!(g.len(), 6);
    }

    #[test]
    fn entity_types_follow_registry() {
        let reg = TypeRegistry::from_mappings("opamp amp\n");
        let g = build_graph("subcircuit types\nX1 in out opamp\nX2 a b other\nF1 a 0 V1 2", &reg).unwrap();
        assert_eq!(g.entity(0).type_index, reg.index_of("amp").unwrap());
        assert_eq!(g.entity(1).type_index, NODE);
        assert_eq!(g.entity(3).type_index, SUBCIRCUIT);
        let f = g.entities().iter().find(|e| e.name == "F1").unwrap();
        assert_eq!(f.type_index, UNKNOWN);
    }

    #[test]
    fn comment_only_netlist_is_valid_but_empty() {
        let g = graph("* nothing here\n.end");
        assert!(g.is_empty());
        assert!(is_valid_netlist(".end"));
    }

    #[test]
    fn blank_text_is_parse_error() {
        for text in ["", "\n   \n\t"] {
            let err = build_graph(text, &TypeRegistry::builtin()).unwrap_err();
            assert!(matches!(err, NetgraphError::Parse(_)));
            assert!(!is_valid_netlist(text));
        }
    }

    #[test]
    fn title_line_adds_no_entities() {
        let g = graph("Voltage divider test\nV1 in 0 5\nR1 in 0 1k\n.end");
        assert_eq!(names(&g), vec!["V1", "in", "0", "R1"]);
    }

    #[test]
    fn invalid_netlist_is_parse_error() {
        let err = build_graph("bad\nR1 1", &TypeRegistry::builtin()).unwrap_err();
        assert!(matches!(err, NetgraphError::Parse(_)));
        assert!(!is_valid_netlist("bad\nR1 1"));
    }
}
