use std::io::Read;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use ghs::{Graph, NodeId, RunReport, Simulation, SimulationConfig};

#[derive(Parser)]
#[command(name = "ghs", about = "Distributed minimum spanning tree (GHS) simulator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the protocol on a graph read from a file (or stdin).
    Run {
        /// Graph file in `n m` + `a b w` triples format. Reads stdin if omitted.
        input: Option<PathBuf>,
        #[command(flatten)]
        opts: RunOpts,
    },

    /// Run the protocol on a seeded random connected graph.
    Random {
        /// Number of vertices.
        #[arg(short, long, default_value = "16")]
        nodes: usize,
        /// Edges added on top of the random spanning tree.
        #[arg(short, long, default_value = "16")]
        extra: usize,
        #[arg(short, long, default_value = "42")]
        seed: u64,
        #[command(flatten)]
        opts: RunOpts,
    },

    /// Print a seeded random connected graph in the input format.
    Generate {
        #[arg(short, long, default_value = "16")]
        nodes: usize,
        #[arg(short, long, default_value = "16")]
        extra: usize,
        #[arg(short, long, default_value = "42")]
        seed: u64,
    },
}

#[derive(Args)]
struct RunOpts {
    /// Vertex woken by the driver.
    #[arg(long, default_value = "1")]
    start: u64,
    /// Give up after this many sweeps.
    #[arg(long)]
    max_sweeps: Option<u64>,
    /// Print every recorded node step.
    #[arg(long)]
    trace: bool,
    /// Emit the run report as JSON.
    #[arg(long)]
    json: bool,
    /// Check the result against a sequential Kruskal run.
    #[arg(long)]
    verify: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Run { input, opts } => {
            let text = match input {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path.display()))?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buf)
                        .context("reading stdin")?;
                    buf
                }
            };
            let graph = Graph::parse(&text)?;
            run(&graph, &opts)
        }

        Command::Random {
            nodes,
            extra,
            seed,
            opts,
        } => {
            let graph = ghs::random_connected(nodes, extra, seed)?;
            run(&graph, &opts)
        }

        Command::Generate { nodes, extra, seed } => {
            let graph = ghs::random_connected(nodes, extra, seed)?;
            print!("{}", graph.to_text());
            Ok(())
        }
    }
}

fn run(graph: &Graph, opts: &RunOpts) -> anyhow::Result<()> {
    let mut config = SimulationConfig::default()
        .with_start(NodeId::new(opts.start))
        .with_trace(opts.trace);
    if let Some(limit) = opts.max_sweeps {
        config = config.with_max_sweeps(limit);
    }

    let mut sim = Simulation::from_graph(graph, config)?;
    let result = sim.run();

    if opts.trace {
        for entry in sim.trace() {
            println!("{}", entry);
        }
    }
    let report = result?;

    if opts.verify {
        verify(graph, &report)?;
    }

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn verify(graph: &Graph, report: &RunReport) -> anyhow::Result<()> {
    let Some(expected) = graph.kruskal() else {
        bail!("graph is disconnected but the run reported success");
    };
    if expected.weights() != report.tree.weights() {
        bail!(
            "tree mismatch: protocol found total {}, Kruskal found total {}",
            report.tree.total_weight(),
            expected.total_weight()
        );
    }
    eprintln!("verified against Kruskal: {} edges", expected.len());
    Ok(())
}

fn print_report(report: &RunReport) {
    println!("Minimum spanning tree ({} edges):", report.tree.len());
    for edge in report.tree.edges() {
        println!("  {} {} {}", edge.a.raw(), edge.b.raw(), edge.weight);
    }
    println!("Total weight: {}", report.tree.total_weight());
    let halted: Vec<String> = report.halted.iter().map(NodeId::to_string).collect();
    println!("Halted: {}", halted.join(", "));
    println!(
        "Sweeps: {}, messages: {} sent / {} consumed, deferrals: {}",
        report.stats.sweeps, report.stats.sent, report.stats.consumed, report.stats.deferred
    );
}
