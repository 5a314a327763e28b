//! SPICE netlist parser.
//!
//! Parses the connectivity of a SPICE netlist into the netlist IR. Values are
//! only inspected where they decide the element layout (capacitor models,
//! BJT substrate pins); everything else after the node list is skipped.
//!
//! # Supported syntax
//!
//! ```text
//! Title line (first non-blank line, unless it starts with * or .)
//! * comment line
//! R1 n+ n- 10k ; inline comment
//! + continuation of the previous line
//! Rname/Cname/Lname n+ n- value [mname] [params]
//! Vname/Iname n+ n- [DC val] [AC mag [phase]] [transient spec]
//! Bname n+ n- V=expr | I=expr
//! Dname a k mname         Mname d g s b mname     Jname d g s mname
//! Qname c b e [s] mname   Zname d g s mname
//! Ename/Gname n+ n- nc+ nc- gain | n+ n- VALUE={expr}
//! Fname/Hname n+ n- vname gain
//! Kname Lname Lname k     Sname n+ n- nc+ nc- mname   Wname n+ n- vname mname
//! Tname a+ a- b+ b- [params]
//! Xname nodes... subckt [PARAMS: ...]
//! Aname [in...] out mname (XSPICE code model)
//! .SUBCKT name ports... / .ENDS
//! .TITLE text
//! .END
//! ```
//!
//! Values support engineering suffixes: T, G, MEG, K, M, U, N, P, F
//! (case-insensitive).

use nom::branch::alt;
use nom::bytes::complete::{tag_no_case, take_while1};
use nom::character::complete::space1;
use nom::combinator::{map, opt};
use nom::multi::count;
use nom::number::complete::double;
use nom::sequence::preceded;
use nom::IResult;
use nom::Parser;

use crate::error::{NetgraphError, Result};
use crate::ir::{Element, ElementKind, Netlist, Pin, SubcircuitDef};

const TWO_TERMINAL: &[&str] = &["plus", "minus"];
const CONTROLLED: &[&str] = &["plus", "minus", "control_plus", "control_minus"];
const FET: &[&str] = &["drain", "gate", "source"];
const MOSFET: &[&str] = &["drain", "gate", "source", "bulk"];
const BJT: &[&str] = &["collector", "base", "emitter", "substrate"];
const DIODE: &[&str] = &["anode", "cathode"];
const TLINE: &[&str] = &["port1_plus", "port1_minus", "port2_plus", "port2_minus"];

/// Parse a SPICE netlist string into a `Netlist`.
///
/// The first non-blank line is the deck title unless it is a comment or a
/// dot command. Text with no non-blank line at all is not a netlist.
pub fn parse(input: &str) -> Result<Netlist> {
    let mut netlist = Netlist::new();
    let mut open_subckts: Vec<SubcircuitDef> = Vec::new();
    let mut first_line = true;

    for (line_num, line) in logical_lines(input) {
        if line.is_empty() {
            continue;
        }
        if std::mem::take(&mut first_line) && !line.starts_with(['.', '*']) {
            netlist.title = Some(line);
            continue;
        }
        if line.starts_with('*') {
            continue;
        }

        let keyword = line
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_uppercase();

        if keyword == ".END" {
            break;
        }

        if line.starts_with('.') {
            match keyword.as_str() {
                ".SUBCKT" => {
                    let def = parse_subckt_header(&line).map_err(|e| parse_err(line_num, &line, &e))?;
                    open_subckts.push(def);
                }
                ".ENDS" => {
                    let def = open_subckts.pop().ok_or_else(|| {
                        parse_err(line_num, &line, ".ENDS without matching .SUBCKT")
                    })?;
                    netlist.subcircuits.push(def);
                }
                ".TITLE" => {
                    if open_subckts.is_empty() {
                        netlist.title = Some(line[6..].trim().to_string());
                    }
                }
                // .MODEL, .PARAM, .INCLUDE, analyses: no connectivity
                _ => {}
            }
            continue;
        }

        // Subcircuit bodies are not part of the top-level element list
        if !open_subckts.is_empty() {
            continue;
        }

        let element = parse_element(&line, &mut netlist).map_err(|e| parse_err(line_num, &line, &e))?;
        netlist.elements.push(element);
    }

    if first_line {
        return Err(NetgraphError::Parse("empty netlist".to_string()));
    }

    if let Some(def) = open_subckts.last() {
        return Err(NetgraphError::Parse(format!(
            "unterminated .SUBCKT {}: missing .ENDS",
            def.name
        )));
    }

    name_subcircuit_pins(&mut netlist);
    Ok(netlist)
}

/// Returns true if `input` parses as a netlist.
pub fn is_valid(input: &str) -> bool {
    parse(input).is_ok()
}

fn parse_err(line_num: usize, line: &str, detail: &str) -> NetgraphError {
    NetgraphError::Parse(format!("line {}: {} in: {}", line_num + 1, detail, line))
}

/// Join `+` continuation lines and strip inline comments.
/// Each logical line keeps the (0-based) number of its first physical line.
/// A continuation extends the last statement, skipping blank and comment
/// lines in between.
fn logical_lines(input: &str) -> Vec<(usize, String)> {
    let mut lines: Vec<(usize, String)> = Vec::new();
    for (line_num, raw_line) in input.lines().enumerate() {
        let line = strip_inline_comment(raw_line).trim();
        if let Some(cont) = line.strip_prefix('+') {
            let statement = lines
                .iter_mut()
                .rev()
                .find(|(_, l)| !l.is_empty() && !l.starts_with('*'));
            if let Some((_, prev)) = statement {
                prev.push(' ');
                prev.push_str(cont.trim());
                continue;
            }
        }
        lines.push((line_num, line.to_string()));
    }
    lines
}

fn strip_inline_comment(line: &str) -> &str {
    let mut end = line.len();
    if let Some(pos) = line.find(';') {
        end = end.min(pos);
    }
    // `$` starts a comment only when preceded by whitespace
    if let Some(pos) = line.find(" $").or_else(|| line.find("\t$")) {
        end = end.min(pos);
    }
    &line[..end]
}

// ---------------------------------------------------------------------------
// Engineering suffix value parser
// ---------------------------------------------------------------------------

/// Parse a numeric value with optional engineering suffix.
/// Handles: 10k, 100n, 4.7u, 1MEG, 1e3, -3.3, etc.
fn eng_value(input: &str) -> IResult<&str, f64> {
    let (rest, num) = double(input)?;
    let (rest, suffix) = opt(eng_suffix).parse(rest)?;
    let multiplier = suffix.unwrap_or(1.0);
    Ok((rest, num * multiplier))
}

/// Match an engineering suffix and return its multiplier.
fn eng_suffix(input: &str) -> IResult<&str, f64> {
    // Order matters: MEG must come before M
    alt((
        map(tag_no_case("MEG"), |_: &str| 1e6),
        map(tag_no_case("T"), |_: &str| 1e12),
        map(tag_no_case("G"), |_: &str| 1e9),
        map(tag_no_case("K"), |_: &str| 1e3),
        map(tag_no_case("M"), |_: &str| 1e-3),
        map(tag_no_case("U"), |_: &str| 1e-6),
        map(tag_no_case("N"), |_: &str| 1e-9),
        map(tag_no_case("P"), |_: &str| 1e-12),
        map(tag_no_case("F"), |_: &str| 1e-15),
    ))
    .parse(input)
}

/// Parse a whole token as a value. Trailing unit letters (`10kOhm`, `1uF`)
/// are accepted.
pub fn parse_value(token: &str) -> Option<f64> {
    let first = token.chars().next()?;
    if !(first.is_ascii_digit() || matches!(first, '.' | '+' | '-')) {
        return None;
    }
    match eng_value(token) {
        Ok((rest, val)) if rest.chars().all(|c| c.is_ascii_alphabetic()) => Some(val),
        _ => None,
    }
}

/// A numeric value or a parameter expression.
fn is_value_like(token: &str) -> bool {
    parse_value(token).is_some() || token.starts_with('{') || token.starts_with('\'')
}

/// A `key=value` parameter token.
fn is_param(token: &str) -> bool {
    token.contains('=')
}

// ---------------------------------------------------------------------------
// Token parsers
// ---------------------------------------------------------------------------

/// Parse a node identifier (e.g. "0", "GND", "out", "net#1", "vdd!").
fn node_id(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| !c.is_whitespace() && !matches!(c, '(' | ')' | '=' | ','))(input)
}

/// Parse a component/element name (everything up to the first whitespace).
fn element_name(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| !c.is_whitespace())(input)
}

/// Parse `name node node ...` with exactly `n` nodes. Returns the name, the
/// node tokens and the remaining text.
fn element_with_nodes(line: &str, n: usize) -> std::result::Result<(&str, Vec<&str>, &str), String> {
    let (rest, (name, nodes)) = (element_name, count(preceded(space1, node_id), n))
        .parse(line)
        .map_err(|_| format!("expected {} node(s)", n))?;
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return Err(format!("malformed node token near '{}'", rest.trim()));
    }
    Ok((name, nodes, rest.trim()))
}

fn tokens(rest: &str) -> Vec<&str> {
    rest.split_whitespace().collect()
}

fn pins(netlist: &mut Netlist, names: &[&str], nodes: &[&str]) -> Vec<Pin> {
    nodes
        .iter()
        .zip(names)
        .map(|(node, pin)| Pin {
            name: pin.to_string(),
            node: netlist.intern_node(node),
        })
        .collect()
}

fn element(name: &str, kind: ElementKind, pins: Vec<Pin>) -> Element {
    Element {
        name: name.to_string(),
        kind,
        subcircuit: None,
        pins,
    }
}

// ---------------------------------------------------------------------------
// Element dispatch
// ---------------------------------------------------------------------------

fn parse_element(line: &str, netlist: &mut Netlist) -> std::result::Result<Element, String> {
    // logical lines are never empty here
    let first = line.chars().next().unwrap_or_default();
    match first.to_ascii_uppercase() {
        'R' => parse_passive(line, netlist, ElementKind::Resistor),
        'C' => parse_capacitor(line, netlist),
        'L' => parse_passive(line, netlist, ElementKind::BehavioralInductor),
        'V' => parse_source(line, netlist, ElementKind::VoltageSource),
        'I' => parse_source(line, netlist, ElementKind::CurrentSource),
        'B' => parse_behavioral(line, netlist),
        'D' => parse_with_model(line, netlist, ElementKind::Diode, DIODE),
        'M' => parse_with_model(line, netlist, ElementKind::Mosfet, MOSFET),
        'J' => parse_with_model(line, netlist, ElementKind::Jfet, FET),
        'Z' => parse_with_model(line, netlist, ElementKind::Mesfet, FET),
        'Q' => parse_bjt(line, netlist),
        'E' => parse_voltage_controlled(line, netlist, ElementKind::Vcvs),
        'G' => parse_voltage_controlled(line, netlist, ElementKind::Vccs),
        'F' => parse_current_controlled(line, netlist, ElementKind::Cccs),
        'H' => parse_current_controlled(line, netlist, ElementKind::Ccvs),
        'K' => parse_coupling(line),
        'S' => parse_with_model(line, netlist, ElementKind::Switch, CONTROLLED),
        'W' => parse_current_switch(line, netlist),
        'T' => parse_transmission_line(line, netlist),
        'X' => parse_subckt_instance(line, netlist),
        'A' => parse_xspice(line, netlist),
        _ => Err(format!("unknown element '{}'", first)),
    }
}

// ---------------------------------------------------------------------------
// R, L, C parsing
// ---------------------------------------------------------------------------

/// Parse `Rname n+ n- value [params]`. A value (or model) is required.
fn parse_passive(line: &str, netlist: &mut Netlist, kind: ElementKind) -> std::result::Result<Element, String> {
    let (name, nodes, rest) = element_with_nodes(line, 2)?;
    if rest.is_empty() {
        return Err(format!("missing value for {}", kind.name()));
    }
    let pins = pins(netlist, TWO_TERMINAL, &nodes);
    Ok(element(name, kind, pins))
}

/// Parse `Cname n+ n- [value] [mname] [params]`.
///
/// A capacitor that references a model is a discrete semiconductor
/// capacitor; anything defined by a value or expression is behavioral.
fn parse_capacitor(line: &str, netlist: &mut Netlist) -> std::result::Result<Element, String> {
    let (name, nodes, rest) = element_with_nodes(line, 2)?;
    let toks = tokens(rest);
    if toks.is_empty() {
        return Err("missing value for capacitor".to_string());
    }
    let bare: Vec<&str> = toks.iter().copied().filter(|t| !is_param(t)).collect();
    let has_model = match bare.as_slice() {
        [] => false,
        [first, ..] if !is_value_like(first) => true,
        [_, second, ..] => !is_value_like(second),
        [_] => false,
    };
    let kind = if has_model {
        ElementKind::Capacitor
    } else {
        ElementKind::BehavioralCapacitor
    };
    let pins = pins(netlist, TWO_TERMINAL, &nodes);
    Ok(element(name, kind, pins))
}

// ---------------------------------------------------------------------------
// Source parsing
// ---------------------------------------------------------------------------

/// Parse `Vname n+ n- [spec]`. The DC/AC/transient spec is optional.
fn parse_source(line: &str, netlist: &mut Netlist, kind: ElementKind) -> std::result::Result<Element, String> {
    let (name, nodes, _) = element_with_nodes(line, 2)?;
    let pins = pins(netlist, TWO_TERMINAL, &nodes);
    Ok(element(name, kind, pins))
}

/// Parse `Bname n+ n- V=expr` or `I=expr`.
fn parse_behavioral(line: &str, netlist: &mut Netlist) -> std::result::Result<Element, String> {
    let (name, nodes, rest) = element_with_nodes(line, 2)?;
    let upper = rest.to_uppercase();
    if !(upper.starts_with('V') || upper.starts_with('I')) || !rest.contains('=') {
        return Err("behavioral source needs V=expr or I=expr".to_string());
    }
    let pins = pins(netlist, TWO_TERMINAL, &nodes);
    Ok(element(name, ElementKind::BehavioralSource, pins))
}

/// Parse `Ename n+ n- nc+ nc- gain` or the expression forms
/// `Ename n+ n- VALUE={...}`, `TABLE`, `POLY(n)`, `LAPLACE`.
/// Expression forms only expose the output pins.
fn parse_voltage_controlled(
    line: &str,
    netlist: &mut Netlist,
    kind: ElementKind,
) -> std::result::Result<Element, String> {
    let (name, out_nodes, rest) = element_with_nodes(line, 2)?;
    let first = rest.split_whitespace().next().unwrap_or_default();
    if first.is_empty() {
        return Err(format!("missing control specification for {}", kind.name()));
    }
    let upper = first.to_uppercase();
    let expression_form = ["VALUE", "TABLE", "POLY", "LAPLACE", "VOL", "CUR"]
        .iter()
        .any(|kw| upper.starts_with(kw))
        || is_param(first)
        || first.starts_with('{');
    if expression_form {
        let pins = pins(netlist, TWO_TERMINAL, &out_nodes);
        return Ok(element(name, kind, pins));
    }

    let (_, nodes, rest) = element_with_nodes(line, 4)?;
    if rest.is_empty() {
        return Err(format!("missing gain for {}", kind.name()));
    }
    let pins = pins(netlist, CONTROLLED, &nodes);
    Ok(element(name, kind, pins))
}

/// Parse `Fname n+ n- vname gain`.
fn parse_current_controlled(
    line: &str,
    netlist: &mut Netlist,
    kind: ElementKind,
) -> std::result::Result<Element, String> {
    let (name, nodes, rest) = element_with_nodes(line, 2)?;
    if tokens(rest).len() < 2 {
        return Err(format!("{} needs a controlling source and a gain", kind.name()));
    }
    let pins = pins(netlist, TWO_TERMINAL, &nodes);
    Ok(element(name, kind, pins))
}

// ---------------------------------------------------------------------------
// Semiconductor parsing
// ---------------------------------------------------------------------------

/// Parse an element with a fixed node count followed by a required model name.
fn parse_with_model(
    line: &str,
    netlist: &mut Netlist,
    kind: ElementKind,
    pin_names: &[&str],
) -> std::result::Result<Element, String> {
    let (name, nodes, rest) = element_with_nodes(line, pin_names.len())?;
    match tokens(rest).first() {
        Some(model) if !is_param(model) => {}
        _ => return Err(format!("missing model name for {}", kind.name())),
    }
    let pins = pins(netlist, pin_names, &nodes);
    Ok(element(name, kind, pins))
}

/// Parse `Qname c b e [s] mname [area]`.
///
/// The substrate node is present when a fifth bare token exists and is not
/// a numeric area.
fn parse_bjt(line: &str, netlist: &mut Netlist) -> std::result::Result<Element, String> {
    let (name, _, rest) = element_with_nodes(line, 3)?;
    let bare: Vec<&str> = tokens(rest).into_iter().filter(|t| !is_param(t)).collect();
    let node_count = match bare.as_slice() {
        [] => return Err("missing model name for bjt".to_string()),
        [_substrate, model, ..] if !is_value_like(model) && !model.eq_ignore_ascii_case("off") => 4,
        _ => 3,
    };
    let (_, nodes, _) = element_with_nodes(line, node_count)?;
    let pins = pins(netlist, &BJT[..node_count], &nodes);
    Ok(element(name, ElementKind::Bjt, pins))
}

/// Parse `Kname Lname Lname k`. Couplings reference inductors, not nodes.
fn parse_coupling(line: &str) -> std::result::Result<Element, String> {
    let toks = tokens(line);
    if toks.len() < 4 {
        return Err("coupling needs two inductors and a coefficient".to_string());
    }
    Ok(element(toks[0], ElementKind::CoupledInductor, Vec::new()))
}

/// Parse `Wname n+ n- vname mname`.
fn parse_current_switch(line: &str, netlist: &mut Netlist) -> std::result::Result<Element, String> {
    let (name, nodes, rest) = element_with_nodes(line, 2)?;
    if tokens(rest).len() < 2 {
        return Err("current switch needs a controlling source and a model".to_string());
    }
    let pins = pins(netlist, TWO_TERMINAL, &nodes);
    Ok(element(name, ElementKind::CurrentSwitch, pins))
}

/// Parse `Tname a+ a- b+ b- [params]`.
fn parse_transmission_line(line: &str, netlist: &mut Netlist) -> std::result::Result<Element, String> {
    let (name, nodes, _) = element_with_nodes(line, 4)?;
    let pins = pins(netlist, TLINE, &nodes);
    Ok(element(name, ElementKind::TransmissionLine, pins))
}

// ---------------------------------------------------------------------------
// Subcircuits and code models
// ---------------------------------------------------------------------------

/// Parse `.SUBCKT name ports... [PARAMS: ...]`.
fn parse_subckt_header(line: &str) -> std::result::Result<SubcircuitDef, String> {
    let toks = tokens(line);
    let name = toks.get(1).ok_or("expected subcircuit name after .SUBCKT")?;
    let ports = toks[2..]
        .iter()
        .take_while(|t| !t.to_uppercase().starts_with("PARAMS:") && !is_param(t))
        .map(|t| t.to_string())
        .collect();
    Ok(SubcircuitDef {
        name: name.to_string(),
        ports,
    })
}

/// Parse `Xname nodes... subckt [PARAMS: ...] [key=val ...]`.
/// The last bare token is the subcircuit name; the others are connections.
fn parse_subckt_instance(line: &str, netlist: &mut Netlist) -> std::result::Result<Element, String> {
    let toks = tokens(line);
    let (name, args) = toks.split_first().ok_or("missing instance name")?;
    let bare: Vec<&str> = args
        .iter()
        .copied()
        .take_while(|t| !t.to_uppercase().starts_with("PARAMS:") && !is_param(t))
        .collect();
    let (subckt, nodes) = bare.split_last().ok_or("missing subcircuit name")?;

    let pins = nodes
        .iter()
        .enumerate()
        .map(|(i, node)| Pin {
            name: (i + 1).to_string(),
            node: netlist.intern_node(node),
        })
        .collect();

    Ok(Element {
        name: name.to_string(),
        kind: ElementKind::SubCircuit,
        subcircuit: Some(subckt.to_string()),
        pins,
    })
}

/// Parse `Aname conn... mname`. Bracketed vectors are flattened and port
/// type modifiers (`%v`, `%id`, `~`) are dropped.
fn parse_xspice(line: &str, netlist: &mut Netlist) -> std::result::Result<Element, String> {
    let flattened = line.replace(['[', ']'], " ");
    let toks = tokens(&flattened);
    let (name, args) = toks.split_first().ok_or("missing instance name")?;
    let conns: Vec<&str> = args
        .iter()
        .copied()
        .filter(|t| !t.starts_with('%'))
        .map(|t| t.trim_start_matches('~'))
        .filter(|t| !t.is_empty() && !t.eq_ignore_ascii_case("null"))
        .collect();
    let (_model, nodes) = conns.split_last().ok_or("missing model name for code model")?;
    if nodes.is_empty() {
        return Err("code model needs at least one connection".to_string());
    }

    let pins = nodes
        .iter()
        .enumerate()
        .map(|(i, node)| Pin {
            name: format!("conn{}", i + 1),
            node: netlist.intern_node(node),
        })
        .collect();
    Ok(element(name, ElementKind::XspiceElement, pins))
}

/// Rename positional instance pins after the ports of their definition.
fn name_subcircuit_pins(netlist: &mut Netlist) {
    let subcircuits = &netlist.subcircuits;
    for elem in netlist.elements.iter_mut() {
        let Some(subckt) = &elem.subcircuit else {
            continue;
        };
        let def = subcircuits
            .iter()
            .find(|d| d.name.eq_ignore_ascii_case(subckt) && d.ports.len() == elem.pins.len());
        if let Some(def) = def {
            for (pin, port) in elem.pins.iter_mut().zip(&def.ports) {
                pin.name = port.clone();
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
