use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use multilayer_backbone::{
    build_graph, pareto_backbone_edges, pareto_distance_closure, structural_backbone_costa,
    structural_backbone_simas, weighted_backbone_edges, Closure, ClosureOptions, EdgeInput,
    EdgeSet, LayerInput, LayeredGraph, SearchOptions, DEFAULT_WEIGHT_ATTR,
};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "backbone_bench")]
#[command(about = "Benchmark pareto closure and backbone extraction strategies")]
struct Args {
    #[arg(long, default_value_t = 3)]
    layers: usize,
    #[arg(long, default_value_t = 30)]
    nodes: usize,
    #[arg(long, default_value_t = 0.05)]
    density: f64,
    #[arg(long, default_value_t = 3)]
    seeds: usize,
    #[arg(long, default_value_t = 1)]
    start_seed: u64,
    #[arg(long, default_value_t = 1)]
    iterations: usize,
    #[arg(long)]
    depth_cut: Option<usize>,
    #[arg(long, default_value_t = false)]
    parallel: bool,
    #[arg(long)]
    topology: Option<PathBuf>,
    #[arg(long)]
    output_json: Option<PathBuf>,
}

#[derive(Debug, Clone)]
struct LcgRng {
    state: u64,
}

impl LcgRng {
    fn new(seed: u64) -> Self {
        Self { state: seed.max(1) }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1);
        self.state
    }

    fn next_f64(&mut self) -> f64 {
        let raw = self.next_u64() >> 11;
        (raw as f64) / ((1_u64 << 53) as f64)
    }

    fn range_f64(&mut self, low: f64, high: f64) -> f64 {
        low + (high - low) * self.next_f64()
    }
}

fn generate_layers(
    seed: u64,
    n_layers: usize,
    nodes: usize,
    density: f64,
) -> BTreeMap<String, LayerInput> {
    let mut rng = LcgRng::new(seed);
    let names: Vec<String> = (0..nodes.max(2)).map(|i| format!("n{i}")).collect();
    let p = density.clamp(0.0, 1.0);

    let mut layers = BTreeMap::new();
    for layer in 0..n_layers.max(1) {
        let mut present: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        let mut edges = Vec::new();

        // Ring for connectivity, then random extra edges.
        for i in 0..names.len() {
            let from = names[i].clone();
            let to = names[(i + 1) % names.len()].clone();
            present.entry(from.clone()).or_default().insert(to.clone());
            edges.push(EdgeInput::weighted(from, to, rng.range_f64(1.0, 20.0)));
        }
        for from in &names {
            for to in &names {
                if from == to {
                    continue;
                }
                if present
                    .get(from)
                    .is_some_and(|out| out.contains(to))
                {
                    continue;
                }
                if rng.next_f64() < p {
                    present
                        .entry(from.clone())
                        .or_default()
                        .insert(to.clone());
                    edges.push(EdgeInput::weighted(
                        from.clone(),
                        to.clone(),
                        rng.range_f64(1.0, 20.0),
                    ));
                }
            }
        }

        layers.insert(
            format!("L{layer}"),
            LayerInput {
                nodes: names.clone(),
                edges,
            },
        );
    }
    layers
}

fn load_topology(path: &Path) -> anyhow::Result<BTreeMap<String, LayerInput>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read topology file {}", path.display()))?;
    let by_yaml = matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml") | Some("yml")
    );
    if by_yaml {
        serde_yaml::from_str(&raw).context("failed to parse topology yaml")
    } else {
        serde_json::from_str(&raw).context("failed to parse topology json")
    }
}

fn edge_count(graph: &LayeredGraph) -> usize {
    let mut count = 0;
    for node in graph.nodes() {
        count += graph
            .layer_out_edges(node.layer, &node.name, DEFAULT_WEIGHT_ATTR)
            .map(|out| out.len())
            .unwrap_or(0);
    }
    count
}

fn bench<T>(iterations: usize, mut run: impl FnMut() -> anyhow::Result<T>) -> anyhow::Result<(T, f64)> {
    let mut elapsed_ms = 0.0;
    let mut last = None;
    for _ in 0..iterations.max(1) {
        let start = Instant::now();
        last = Some(run()?);
        elapsed_ms += start.elapsed().as_secs_f64() * 1000.0;
    }
    Ok((
        last.expect("at least one iteration ran"),
        elapsed_ms / iterations.max(1) as f64,
    ))
}

fn backbone_row(name: &str, removed: &EdgeSet, runtime_ms: f64) -> Value {
    json!({
        "algorithm": name,
        "runtime_ms": runtime_ms,
        "removed": removed.len(),
    })
}

fn run_seed(graph: &LayeredGraph, options: &ClosureOptions, iterations: usize) -> anyhow::Result<(Vec<Value>, bool)> {
    let (closure, closure_ms): (Closure, f64) = bench(iterations, || {
        pareto_distance_closure(graph, None, options).context("closure failed")
    })?;

    let (from_closure, pareto_ms) = bench(iterations, || {
        pareto_backbone_edges(graph, Some(&closure), options).context("pareto backbone failed")
    })?;
    let (weighted, weighted_ms) = bench(iterations, || {
        weighted_backbone_edges(graph, Some(&closure), None, options)
            .context("weighted backbone failed")
    })?;
    let (simas, simas_ms) = bench(iterations, || {
        structural_backbone_simas(graph, &options.search.weight_attr)
            .context("simas backbone failed")
    })?;
    let (costa, costa_ms) = bench(iterations, || {
        structural_backbone_costa(graph, &options.search.weight_attr)
            .context("costa backbone failed")
    })?;

    let pairs: usize = closure.values().map(BTreeMap::len).sum();
    let variants_agree = simas == from_closure && costa == from_closure;

    let rows = vec![
        json!({
            "algorithm": "closure",
            "runtime_ms": closure_ms,
            "pairs": pairs,
        }),
        backbone_row("pareto_backbone", &from_closure, closure_ms + pareto_ms),
        backbone_row("weighted_backbone", &weighted, closure_ms + weighted_ms),
        backbone_row("structural_simas", &simas, simas_ms),
        backbone_row("structural_costa", &costa, costa_ms),
    ];
    Ok((rows, variants_agree))
}

fn aggregate(seed_rows: &[Value]) -> Value {
    let mut buckets: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for row in seed_rows {
        if let Some(algos) = row.get("algorithms").and_then(Value::as_array) {
            for algo in algos {
                let (Some(name), Some(runtime_ms)) = (
                    algo.get("algorithm").and_then(Value::as_str),
                    algo.get("runtime_ms").and_then(Value::as_f64),
                ) else {
                    continue;
                };
                buckets.entry(name.to_string()).or_default().push(runtime_ms);
            }
        }
    }

    let rows: Vec<Value> = buckets
        .into_iter()
        .map(|(name, runtimes)| {
            let mean = if runtimes.is_empty() {
                f64::NAN
            } else {
                runtimes.iter().sum::<f64>() / runtimes.len() as f64
            };
            json!({ "algorithm": name, "runtime_ms": mean })
        })
        .collect();
    Value::Array(rows)
}

fn print_summary(aggregated: &Value) {
    println!("algorithm\truntime_ms");
    if let Some(rows) = aggregated.as_array() {
        for row in rows {
            let name = row.get("algorithm").and_then(Value::as_str).unwrap_or("?");
            let runtime_ms = row
                .get("runtime_ms")
                .and_then(Value::as_f64)
                .unwrap_or(f64::NAN);
            println!("{name}\t{runtime_ms:.4}");
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let options = ClosureOptions {
        search: SearchOptions {
            depth_cut: args.depth_cut,
            ..SearchOptions::default()
        },
        parallel: args.parallel,
    };

    let mut seed_rows = Vec::new();
    for idx in 0..args.seeds.max(1) {
        let seed = args.start_seed + idx as u64;
        let layers = if let Some(path) = args.topology.as_ref() {
            load_topology(path)?
        } else {
            generate_layers(seed, args.layers, args.nodes, args.density)
        };
        let graph = build_graph(&layers).context("building layered graph failed")?;

        let (algorithms, variants_agree) = run_seed(&graph, &options, args.iterations)?;
        if !variants_agree {
            eprintln!("warning: structural backbones disagree with the closure backbone (seed {seed})");
        }

        seed_rows.push(json!({
            "seed": seed,
            "layers": graph.n_layers(),
            "nodes": graph.nodes().len(),
            "edges": edge_count(&graph),
            "variants_agree": variants_agree,
            "algorithms": algorithms,
        }));
    }

    let aggregated = aggregate(&seed_rows);
    print_summary(&aggregated);

    let payload = json!({
        "config": {
            "layers": args.layers,
            "nodes": args.nodes,
            "density": args.density,
            "seeds": args.seeds,
            "start_seed": args.start_seed,
            "iterations": args.iterations,
            "depth_cut": args.depth_cut,
            "parallel": args.parallel,
            "topology": args.topology,
        },
        "runs": seed_rows,
        "aggregate": aggregated,
    });

    if let Some(path) = args.output_json {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_vec_pretty(&payload)?)?;
    } else {
        println!("{}", serde_json::to_string_pretty(&payload)?);
    }

    Ok(())
}
