use clap::{Parser, Subcommand};
use netgraph::config::Config;
use netgraph::dataset::{resample_balanced, split_indices, Corpus, FeatureStats};
use netgraph::encoder::prototype::encode_prototype_candidates;
use netgraph::encoder::{self, Encoding};
use netgraph::graph::{build_graph, CircuitGraph};
use netgraph::output;
use netgraph::registry::TypeRegistry;
use netgraph::stats::Stats;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// SPICE netlist to graph-tensor encoder
#[derive(Parser)]
#[command(name = "netgraph", version)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print corpus stats to stderr
    #[arg(long, global = true)]
    stats: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the entity list and edge list of a netlist
    Graph {
        netlist: PathBuf,
        /// Subcircuit type side file
        #[arg(long)]
        types: Option<PathBuf>,
    },
    /// Encode one netlist and summarise the tensors
    Encode {
        netlist: PathBuf,
        #[arg(long, value_enum)]
        encoding: Option<Encoding>,
        #[arg(long)]
        max_entities: Option<usize>,
        /// Prototype inference: keep the graph whole and offer every type
        #[arg(long)]
        candidates: bool,
        #[arg(long)]
        types: Option<PathBuf>,
    },
    /// Dump the type enumeration as JSON
    Types {
        #[arg(long)]
        types: Option<PathBuf>,
    },
    /// Load many netlists, skip invalid ones and encode the rest as one batch
    Corpus {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long, value_enum)]
        encoding: Option<Encoding>,
        #[arg(long)]
        max_entities: Option<usize>,
        #[arg(long)]
        seed: Option<u64>,
        /// Downsample so every hidden type occurs equally often
        #[arg(long)]
        resample: bool,
        /// Standardize feature columns
        #[arg(long)]
        normalize: bool,
        #[arg(long)]
        types: Option<PathBuf>,
    },
}

fn fail(context: &str, e: impl std::fmt::Display) -> ! {
    eprintln!("{}: {}", context, e);
    std::process::exit(1);
}

fn load_registry(config: &Config, types: Option<PathBuf>) -> TypeRegistry {
    let result = match types {
        Some(path) => TypeRegistry::from_side_file(path),
        None => config.registry(),
    };
    result.unwrap_or_else(|e| fail("Type registry error", e))
}

fn load_graph(path: &Path, registry: &TypeRegistry) -> CircuitGraph {
    let input = std::fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading {}: {}", path.display(), e);
        std::process::exit(1);
    });
    build_graph(&input, registry).unwrap_or_else(|e| fail("Netlist error", e))
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut stats = if cli.stats { Some(Stats::new()) } else { None };

    let config = match &cli.config {
        Some(path) => Config::from_file(path).unwrap_or_else(|e| fail("Config error", e)),
        None => Config::default(),
    };
    let mut stdout = io::stdout();

    match cli.command {
        Command::Graph { netlist, types } => {
            let registry = load_registry(&config, types);
            let graph = load_graph(&netlist, &registry);
            record_graph(stats.as_mut(), &graph);
            let mut report = || -> netgraph::error::Result<()> {
                output::write_entities_csv(&graph, &registry, &mut stdout)?;
                writeln!(stdout)?;
                output::write_adjacency_csv(&graph, &mut stdout)
            };
            report().unwrap_or_else(|e| fail("Output error", e));
        }
        Command::Encode {
            netlist,
            encoding,
            max_entities,
            candidates,
            types,
        } => {
            let registry = load_registry(&config, types);
            let graph = load_graph(&netlist, &registry);
            record_graph(stats.as_mut(), &graph);
            let max_entities = max_entities.or(config.max_entities).unwrap_or(graph.len());

            let start = Instant::now();
            let encoded = if candidates {
                encode_prototype_candidates(&graph, &registry, max_entities)
            } else {
                let encoding = encoding.unwrap_or_else(|| config.encoding());
                encoder::encode(&graph, &registry, encoding, max_entities)
            }
            .unwrap_or_else(|e| fail("Encoding error", e));
            if let Some(s) = stats.as_mut() {
                s.samples += encoded.samples();
                s.add_phase("encode", start.elapsed());
            }

            output::write_encoding_summary(&encoded, &mut stdout).unwrap_or_else(|e| fail("Output error", e));
        }
        Command::Types { types } => {
            let registry = load_registry(&config, types);
            let json = registry.to_json().unwrap_or_else(|e| fail("Output error", e));
            writeln!(stdout, "{}", json).unwrap_or_else(|e| fail("Output error", e));
        }
        Command::Corpus {
            files,
            encoding,
            max_entities,
            seed,
            resample,
            normalize,
            types,
        } => {
            let registry = load_registry(&config, types);
            let encoding = encoding.unwrap_or_else(|| config.encoding());
            let seed = seed.unwrap_or_else(|| config.seed());

            let start = Instant::now();
            let corpus = Corpus::from_paths(&files, &registry);
            if let Some(s) = stats.as_mut() {
                s.add_phase("load", start.elapsed());
                s.files_loaded = corpus.len();
                s.files_skipped = corpus.skipped().len();
                for entry in corpus.entries() {
                    record_graph(Some(&mut *s), &entry.graph);
                }
            }

            let mut encoded = corpus
                .encode(&registry, encoding, max_entities.or(config.max_entities), stats.as_mut())
                .unwrap_or_else(|e| fail("Encoding error", e));

            if resample || config.resample {
                let keep = resample_balanced(&corpus.sample_labels(), seed);
                encoded = encoded.select(&keep);
            }
            if normalize || config.normalize {
                let feature_stats = FeatureStats::fit(&encoded.x);
                feature_stats.normalize(&mut encoded.x);
            }
            let (train, val, test) = split_indices(encoded.samples(), seed);

            let report = || -> netgraph::error::Result<()> {
                let mut out = stdout.lock();
                for name in corpus.skipped() {
                    writeln!(out, "skipped,{}", name)?;
                }
                output::write_shapes_csv(&encoded, &mut out)?;
                writeln!(out, "Split,Samples")?;
                writeln!(out, "train,{}", train.len())?;
                writeln!(out, "val,{}", val.len())?;
                writeln!(out, "test,{}", test.len())?;
                Ok(())
            };
            report().unwrap_or_else(|e| fail("Output error", e));
        }
    }

    if let Some(ref stats) = stats {
        stats.display();
    }
}

fn record_graph(stats: Option<&mut Stats>, graph: &CircuitGraph) {
    if let Some(s) = stats {
        s.entities += graph.len();
        s.components += graph.component_count();
        s.nodes += graph.node_count();
    }
}
