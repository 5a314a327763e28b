//! End-to-end tests: netlist text through graph construction, encoding and
//! corpus batching.

use approx::assert_abs_diff_eq;
use netgraph::dataset::{resample_balanced, split_indices, split_masks, Corpus, FeatureStats, Source};
use netgraph::encoder::{self, Encoding, IGNORE};
use netgraph::error::NetgraphError;
use netgraph::graph::{build_graph, is_valid_netlist, CircuitGraph};
use netgraph::registry::{TypeRegistry, NODE, SUBCIRCUIT, UNKNOWN};
use std::collections::HashMap;
use std::io::Write;

const SOURCE_RESISTOR: &str = "\
* source driving a resistor
V1 in 0 DC 5
R1 in out 1k
.END
";

const AMPLIFIER: &str = "\
* inverting amplifier
.SUBCKT opamp inp inn out vdd vss
M1 out inp vss vss NMOS
.ENDS
Vdd vdd 0 3.3
Vin in 0 SIN(0 1m 1k)
R1 in inn 10k
R2 inn out 100k
X1 in inn out vdd 0 opamp
C1 out 0 10p
Q1 c b 0 NPN
D1 c vdd DMOD
";

fn graph(text: &str) -> CircuitGraph {
    build_graph(text, &TypeRegistry::builtin()).expect("netlist should parse")
}

// ── Graph construction ──────────────────────────────────────────

#[test]
fn test_build_graph_is_deterministic() {
    assert_eq!(graph(AMPLIFIER), graph(AMPLIFIER));
}

#[test]
fn test_adjacency_symmetric_and_bipartite() {
    let g = graph(AMPLIFIER);
    for i in 0..g.len() {
        assert!(!g.is_adjacent(i, i));
        for j in 0..g.len() {
            assert_eq!(g.is_adjacent(i, j), g.is_adjacent(j, i));
            if g.is_adjacent(i, j) {
                assert_ne!(g.entity(i).is_component(), g.entity(j).is_component());
            }
        }
    }
}

#[test]
fn test_source_resistor_entities_and_degrees() {
    let g = graph(SOURCE_RESISTOR);
    let names: Vec<&str> = g.entities().iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["V1", "in", "0", "R1", "out"]);
    let degrees: Vec<usize> = (0..g.len()).map(|i| g.degree(i)).collect();
    assert_eq!(degrees, vec![2, 2, 1, 2, 1]);
    assert_eq!(g.component_count(), 2);
    assert_eq!(g.node_count(), 3);
}

#[test]
fn test_subcircuit_body_is_not_expanded() {
    let g = graph(AMPLIFIER);
    assert_eq!(g.len(), 15);
    assert!(g.entities().iter().all(|e| e.name != "M1"));
    let x1 = g.entities().iter().find(|e| e.name == "X1").unwrap();
    assert_eq!(x1.type_index, SUBCIRCUIT);
}

#[test]
fn test_invalid_netlist() {
    assert!(!is_valid_netlist("dangling\nR1 only_one_node"));
    assert!(!is_valid_netlist(".SUBCKT open a b\nR1 a b 1k\n"));
    assert!(is_valid_netlist(SOURCE_RESISTOR));
    assert!(matches!(
        build_graph("dangling\nQ1 c", &TypeRegistry::builtin()),
        Err(NetgraphError::Parse(_))
    ));
}

#[test]
fn test_blank_text_is_not_a_netlist() {
    assert!(!is_valid_netlist(""));
    assert!(!is_valid_netlist("\n  \n"));
    assert!(is_valid_netlist("* comment only\n.end\n"));
}

#[test]
fn test_first_line_is_title() {
    let g = graph("Voltage divider test\nV1 in 0 5\nR1 in 0 1k\n.end");
    let names: Vec<&str> = g.entities().iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["V1", "in", "0", "R1"]);
    assert!(is_valid_netlist("RC lowpass filter\nR1 in 0 1k\nC1 in 0 1n\n.end"));
    // a comment or dot command in first position is not a title
    assert_eq!(graph("* divider\nR1 in 0 1k").component_count(), 1);
    assert_eq!(graph(".param r=1k\nR1 in 0 {r}").component_count(), 1);
}

#[test]
fn test_continuation_across_comment_line() {
    let g = graph("amplifier\nM1 d g\n* gate note\n+ s b NMOS\n");
    assert_eq!(g.degree(0), 4);
    assert!(is_valid_netlist("amplifier\nM1 d g\n\n+ s b NMOS\n"));
}

// ── Registry ────────────────────────────────────────────────────

#[test]
fn test_side_file_extends_registry() {
    let mut side = tempfile::NamedTempFile::new().unwrap();
    writeln!(side, "opamp amp").unwrap();
    writeln!(side, "malformed line with extra tokens").unwrap();
    writeln!(side).unwrap();

    let builtin = TypeRegistry::builtin();
    let reg = TypeRegistry::from_side_file(side.path()).unwrap();
    assert_eq!(reg.len(), builtin.len() + 1);
    assert_eq!(reg.index_of("amp"), Some(builtin.len()));

    let g = build_graph(AMPLIFIER, &reg).unwrap();
    let x1 = g.entities().iter().find(|e| e.name == "X1").unwrap();
    assert_eq!(x1.type_index, builtin.len());
}

#[test]
fn test_side_file_labels_never_reuse_builtin_tags() {
    let reg = TypeRegistry::from_mappings("mysub node\nother unknown\n");
    assert_eq!(reg.len(), 20);
    let g = build_graph("labels\nX1 a b mysub\nX2 a b other\n", &reg).unwrap();
    let x1 = g.entities().iter().find(|e| e.name == "X1").unwrap();
    let x2 = g.entities().iter().find(|e| e.name == "X2").unwrap();
    assert!(x1.type_index >= 18 && x2.type_index >= 18);
    assert_ne!(x1.type_index, x2.type_index);
    let a = g.entities().iter().find(|e| e.name == "a").unwrap();
    assert_eq!(a.type_index, NODE);
}

#[test]
fn test_registry_json_dump() {
    let json = TypeRegistry::from_mappings("opamp amp").to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["unknown"], 0);
    assert_eq!(value["node"], NODE);
    assert_eq!(value["amp"], 18);
}

// ── Encodings ───────────────────────────────────────────────────

#[test]
fn test_masked_samples() {
    let reg = TypeRegistry::builtin();
    let g = graph(SOURCE_RESISTOR);
    let enc = encoder::encode_masked(&g, &reg, g.len()).unwrap();
    assert_eq!(enc.samples(), 5);
    let width = reg.len();
    for s in 0..5 {
        assert_eq!(enc.x.get(&[s, s, UNKNOWN]), 1.0);
        let mut x = enc.x.entry(s).to_vec();
        x[s * width..(s + 1) * width].copy_from_slice(enc.y.row(s, s));
        assert_eq!(x.as_slice(), enc.y.entry(s));
    }
}

#[test]
fn test_omitted_resistor_has_zero_degree() {
    let reg = TypeRegistry::builtin();
    let g = graph(SOURCE_RESISTOR);
    let enc = encoder::encode_omitted(&g, &reg, g.len()).unwrap();
    let r1 = 3;
    let degree: f32 = enc.a.row(r1, r1).iter().sum();
    assert_eq!(degree, 0.0);
    assert_eq!(enc.y.get(&[r1, reg.index_of("resistor").unwrap()]), 1.0);
    for s in 0..enc.samples() {
        let col: f32 = (0..g.len()).map(|j| enc.a.get(&[s, j, s])).sum();
        assert_eq!(col, 0.0);
    }
}

#[test]
fn test_actions_flag_and_target() {
    let reg = TypeRegistry::builtin();
    let g = graph(AMPLIFIER);
    let n = g.len();
    let t = reg.len();
    let enc = encoder::encode_omitted_with_actions(&g, &reg, n).unwrap();
    assert_eq!(enc.x.shape(), &[n, n + t, t + 1]);
    for s in 0..n {
        let true_type = g.entity(s).type_index;
        for k in 0..t {
            assert_eq!(enc.x.get(&[s, n + k, t]), 1.0);
            let expected = if k == true_type { 1.0 } else { 0.0 };
            assert_eq!(enc.y.get(&[s, n + k]), expected);
        }
        for i in 0..n {
            assert_eq!(enc.x.get(&[s, i, t]), 0.0);
            assert_eq!(enc.y.get(&[s, i]), IGNORE);
        }
    }
}

#[test]
fn test_prototype_first_slot_is_true_type() {
    let reg = TypeRegistry::builtin();
    let g = graph(AMPLIFIER);
    let n = g.len();
    let t = reg.len();
    let enc = encoder::encode_prototype(&g, &reg, n).unwrap();
    for s in 0..n {
        let true_type = g.entity(s).type_index;
        assert_eq!(enc.x.get(&[s, s, true_type]), 1.0);
        assert_eq!(enc.x.get(&[s, s, t]), 1.0);
        assert_eq!(enc.y.get(&[s, 0]), 1.0);
        let edges: f32 = enc.a.row(s, s).iter().sum();
        assert_eq!(edges, 0.0);
    }
}

#[test]
fn test_bound_too_small() {
    let reg = TypeRegistry::builtin();
    let g = graph(SOURCE_RESISTOR);
    let err = encoder::encode(&g, &reg, Encoding::Masked, 3).unwrap_err();
    assert!(matches!(err, NetgraphError::ShapeMismatch { required: 5, available: 3 }));
}

// ── Corpus ──────────────────────────────────────────────────────

#[test]
fn test_corpus_excludes_invalid_files() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("good.cir");
    let bad = dir.path().join("bad.cir");
    let amp = dir.path().join("amp.cir");
    std::fs::write(&good, SOURCE_RESISTOR).unwrap();
    std::fs::write(&bad, "lonely\nR1 lonely\n").unwrap();
    std::fs::write(&amp, AMPLIFIER).unwrap();

    let reg = TypeRegistry::builtin();
    let corpus = Corpus::from_paths(&[good, bad.clone(), amp], &reg);
    assert_eq!(corpus.len(), 2);
    assert_eq!(corpus.skipped(), &[bad.display().to_string()]);

    let enc = corpus.encode(&reg, Encoding::Omitted, None, None).unwrap();
    assert_eq!(enc.samples(), 5 + 15);
    assert_eq!(enc.a.shape(), &[20, 15, 15]);
    // the second file starts right after the first: Vdd is hidden first
    let vsrc = reg.index_of("voltage_source").unwrap();
    assert_eq!(enc.y.get(&[5, vsrc]), 1.0);
}

#[test]
fn test_corpus_skips_empty_source() {
    let reg = TypeRegistry::builtin();
    let corpus = Corpus::load(&[Source::new("empty", ""), Source::new("a", SOURCE_RESISTOR)], &reg);
    assert_eq!(corpus.len(), 1);
    assert_eq!(corpus.skipped(), &["empty".to_string()]);
    let enc = corpus.encode(&reg, Encoding::Masked, None, None).unwrap();
    assert_eq!(enc.samples(), 5);
}

#[test]
fn test_corpus_resample_and_split() {
    let reg = TypeRegistry::builtin();
    let corpus = Corpus::load(
        &[Source::new("a", SOURCE_RESISTOR), Source::new("b", AMPLIFIER)],
        &reg,
    );
    let enc = corpus.encode(&reg, Encoding::Omitted, None, None).unwrap();
    let labels = corpus.sample_labels();
    assert_eq!(labels.len(), enc.samples());

    let keep = resample_balanced(&labels, 3);
    let balanced = enc.select(&keep);
    let mut counts: HashMap<usize, usize> = HashMap::new();
    for &i in &keep {
        *counts.entry(labels[i]).or_default() += 1;
    }
    let per_class: Vec<usize> = counts.values().copied().collect();
    assert!(per_class.iter().all(|&c| c == per_class[0]));
    // every label that occurred survives
    assert_eq!(counts.len(), labels.iter().collect::<std::collections::HashSet<_>>().len());
    for (row, &i) in keep.iter().enumerate() {
        assert_eq!(balanced.y.entry(row), enc.y.entry(i));
    }

    let (train, val, test) = split_indices(balanced.samples(), 3);
    assert_eq!(train.len() + val.len() + test.len(), balanced.samples());
}

#[test]
fn test_split_masks_hide_half() {
    let g = graph(AMPLIFIER);
    let masks = split_masks(g.len(), 42);
    for mask in [&masks.train, &masks.val, &masks.test] {
        let hidden = mask.iter().filter(|&&keep| !keep).count();
        assert_eq!(hidden, g.len() / 2);
    }
}

#[test]
fn test_normalize_round_trip() {
    let reg = TypeRegistry::builtin();
    let corpus = Corpus::load(&[Source::new("amp", AMPLIFIER)], &reg);
    let enc = corpus.encode(&reg, Encoding::Masked, Some(40), None).unwrap();
    let mut x = enc.x.clone();
    let stats = FeatureStats::fit(&x);
    stats.normalize(&mut x);

    let mut row = x.row(0, 1).to_vec();
    stats.unnormalize_row(&mut row);
    for (a, b) in row.iter().zip(enc.x.row(0, 1)) {
        assert_abs_diff_eq!(*a, *b, epsilon = 1e-5);
    }
    // padding stays zero
    assert!(x.row(0, 39).iter().all(|&v| v == 0.0));
}
