//! Integer-only CNN inference benchmark (host harness).
//!
//! Reproduces the embedded measurement protocol on the host CPU: one
//! warm-up inference to exclude cold-cache effects, then a fixed-count
//! timed loop over the pipeline, then totals, per-inference averages and
//! a per-op breakdown. Results go to stdout and to a JSON report file.
//!
//! Usage:
//!   mnist-bench [--loops N] [--json PATH]

mod model;

use std::path::PathBuf;
use std::process;
use std::sync::OnceLock;
use std::time::Instant;

use zynq_ml::bench::{argmax, format_results, BenchmarkResult};

const DEFAULT_LOOP_COUNT: usize = 100;

/// Ticks per second of the Instant-based tick source (1 tick = 1 ns).
const TICK_RESOLUTION: u64 = 1_000_000_000;

static EPOCH: OnceLock<Instant> = OnceLock::new();

fn get_tick() -> u64 {
    EPOCH.get().expect("epoch not set").elapsed().as_nanos() as u64
}

struct Options {
    loop_count: usize,
    json_path: PathBuf,
}

fn parse_args() -> Options {
    let mut opts = Options {
        loop_count: DEFAULT_LOOP_COUNT,
        json_path: PathBuf::from("benchmarks.json"),
    };

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--loops" | "-n" => {
                i += 1;
                opts.loop_count = args
                    .get(i)
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(|| {
                        eprintln!("--loops requires a number of runs");
                        process::exit(1);
                    });
            }
            "--json" | "-o" => {
                i += 1;
                opts.json_path = PathBuf::from(args.get(i).unwrap_or_else(|| {
                    eprintln!("--json requires a file path");
                    process::exit(1);
                }));
            }
            "--help" | "-h" => {
                eprintln!("Usage: mnist-bench [OPTIONS]");
                eprintln!();
                eprintln!("Options:");
                eprintln!("  -n, --loops <N>    Timed inference count (default: {DEFAULT_LOOP_COUNT})");
                eprintln!("  -o, --json <PATH>  JSON report path (default: benchmarks.json)");
                eprintln!();
                eprintln!("Environment:");
                eprintln!("  RUST_LOG=info    Show harness progress");
                process::exit(0);
            }
            other => {
                eprintln!("unexpected argument: {other}");
                eprintln!("       mnist-bench --help for usage");
                process::exit(1);
            }
        }
        i += 1;
    }

    opts
}

fn main() {
    env_logger::init();
    let opts = parse_args();
    EPOCH.set(Instant::now()).expect("epoch already set");

    println!("Integer CNN Inference Benchmark");
    println!("===============================");
    println!();

    log::debug!("topology:");
    for (i, l) in model::LAYERS.iter().enumerate() {
        log::debug!("  [{i}] {:?} in {}x{}x{} -> {} ch", l.op, l.h, l.w, l.cin, l.cout);
    }

    // Warm-up: the first run pays cold-cache misses and is excluded.
    log::info!("warm-up inference");
    let warmup = model::run_inference_once();

    log::info!("timed loop: {} inferences", opts.loop_count);
    let img = model::img_in();
    let mut op_ticks = [0u64; model::NUM_OPS];
    let mut logits = warmup;

    let start = get_tick();
    for _ in 0..opts.loop_count {
        logits = model::forward_timed(img, &mut op_ticks, get_tick);
    }
    let total_ticks = get_tick() - start;

    let predicted = argmax(&logits);
    let total_us = (total_ticks * 1_000_000) / TICK_RESOLUTION;
    let per_run_us = if opts.loop_count > 0 {
        total_us / opts.loop_count as u64
    } else {
        0
    };

    println!("================================================");
    println!("   [ Benchmark Result: int8 CNN, shift-7 ]");
    println!("================================================");
    println!(" 1. Total ({} runs)", opts.loop_count);
    println!("   - Time Cost   : {total_us} us");
    println!("------------------------------------------------");
    println!(" 2. Average (Per 1 Inference)");
    println!("   - Time Cost   : {per_run_us} us");
    println!("------------------------------------------------");
    println!(" 3. Per-op breakdown");
    for (idx, name) in model::OP_NAMES.iter().enumerate() {
        let op_us = (op_ticks[idx] * 1_000_000) / TICK_RESOLUTION;
        let pct = if total_us > 0 { (op_us * 100) / total_us } else { 0 };
        println!("   [{idx}] {name}: {op_us} us ({pct}%)");
    }
    println!("------------------------------------------------");
    println!(" Predicted digit : {predicted}");
    println!(" Logits          : {logits:?}");
    println!("================================================");

    let result = BenchmarkResult {
        loop_count: opts.loop_count,
        tick_resolution: TICK_RESOLUTION,
        total_ticks,
        op_names: &model::OP_NAMES,
        op_ticks: &op_ticks,
        logits: &logits,
        predicted,
    };
    let json = format_results(&result);
    std::fs::write(&opts.json_path, json.as_bytes()).unwrap_or_else(|e| {
        eprintln!("error writing {}: {e}", opts.json_path.display());
        process::exit(1);
    });
    log::info!("wrote {}", opts.json_path.display());

    println!(" Benchmark Done.");
}
