//! demodulated-bench: Benchmark harness for phase engine profiling
//!
//! Runs the module outside any audio host so native profilers (samply,
//! Instruments, perf, Tracy with `--features profile`) can see the tick.
//!
//! Usage:
//!   demodulated-bench run patches/free_running.json --frames 1000000
//!   demodulated-bench list
//!   samply record ./target/profiling/demodulated-bench run patches/offset_mod.json

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use demodulated_core::{DeModulated, Module};
use std::hint::black_box;
use std::path::{Path, PathBuf};
use std::time::Instant;

use demodulated_cli::patch::{build_module, get_patches_dir, list_patch_files, load_patch};

const DEFAULT_SAMPLE_RATE: f32 = 48000.0;
const DEFAULT_FRAMES: u64 = 48000 * 10; // 10 seconds at 48kHz

/// Benchmark harness for DeModulated DSP profiling
#[derive(Parser)]
#[command(name = "demodulated-bench")]
#[command(about = "Profile and benchmark the DeModulated phase engine")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a benchmark with a patch file
    Run {
        /// Path to the patch JSON file
        patch: PathBuf,

        /// Number of audio frames to process
        #[arg(short, long, default_value_t = DEFAULT_FRAMES)]
        frames: u64,

        /// Sample rate in Hz
        #[arg(short, long, default_value_t = DEFAULT_SAMPLE_RATE)]
        sample_rate: f32,

        /// Warmup frames before measurement
        #[arg(short, long, default_value_t = 48000)]
        warmup: u64,

        /// Print per-update timing stats
        #[arg(long)]
        stats: bool,
    },

    /// List available benchmark patches
    List,

    /// Run a quick smoke test with all patches
    Smoke {
        /// Frames per patch for smoke test
        #[arg(short, long, default_value_t = 4800)]
        frames: u64,
    },
}

fn main() -> Result<()> {
    #[cfg(feature = "profile")]
    {
        use tracing_subscriber::prelude::*;
        tracing_subscriber::registry()
            .with(tracing_tracy::TracyLayer::default())
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
    #[cfg(not(feature = "profile"))]
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            patch,
            frames,
            sample_rate,
            warmup,
            stats,
        } => run_benchmark(&patch, frames, sample_rate, warmup, stats),
        Commands::List => {
            list_patches();
            Ok(())
        }
        Commands::Smoke { frames } => {
            smoke_test(frames);
            Ok(())
        }
    }
}

/// Process a single frame and read the combined output
#[inline(always)]
fn process_frame(module: &mut DeModulated, sample_rate: f32) {
    module.update(sample_rate);
    black_box(module.outputs.poly_phase.get_voltage(0));
}

fn run_benchmark(
    patch_path: &Path,
    frames: u64,
    sample_rate: f32,
    warmup: u64,
    print_stats: bool,
) -> Result<()> {
    let patch = load_patch(patch_path)?;
    let mut module = build_module(&patch)?;

    println!("Loaded patch: {}", patch_path.display());
    println!("  params: {:?}", module.params);
    println!(
        "  offset step: {:.4} rad ({:.2} deg)",
        module.params.offset,
        module.params.offset_degrees()
    );
    println!(
        "  inputs: phase={}ch offset={}ch",
        module.inputs.phase.channels(),
        module.inputs.offset.channels()
    );
    if !patch.disconnected.is_empty() {
        println!("  disconnected: {}", patch.disconnected.join(", "));
    }

    println!(
        "\nRunning benchmark: {} frames ({:.2}s at {}Hz)",
        frames,
        frames as f64 / sample_rate as f64,
        sample_rate
    );
    println!("  Warmup: {} frames", warmup);

    print!("Warming up...");
    for _ in 0..warmup {
        process_frame(&mut module, sample_rate);
    }
    println!(" done");

    module.set_timing_enabled(print_stats);
    module.reset_timing_metrics();

    print!("Benchmarking...");
    let start = Instant::now();

    for _ in 0..frames {
        process_frame(&mut module, sample_rate);
    }

    let elapsed = start.elapsed();
    println!(" done\n");

    let total_ns = elapsed.as_nanos() as f64;
    let ns_per_frame = total_ns / frames.max(1) as f64;
    let frames_per_sec = 1_000_000_000.0 / ns_per_frame;
    let realtime_budget_ns = 1_000_000_000.0 / sample_rate as f64;
    let budget_usage = (ns_per_frame / realtime_budget_ns) * 100.0;

    println!("Results:");
    println!("  Total time:     {:?}", elapsed);
    println!("  Frames:         {}", frames);
    println!("  ns/frame:       {:.2}", ns_per_frame);
    println!("  frames/sec:     {:.0}", frames_per_sec);
    println!(
        "  Real-time budget: {:.2} ns/frame @ {}Hz",
        realtime_budget_ns, sample_rate
    );
    println!("  Budget usage:   {:.2}%", budget_usage);

    if budget_usage > 100.0 {
        println!("\n  {}", "WARNING: Exceeds real-time budget!".red());
    } else {
        println!(
            "\n  {} ({:.1}x headroom)",
            "Within real-time budget".green(),
            100.0 / budget_usage
        );
    }

    if let Some(metrics) = module.get_timing_metrics() {
        println!("\nPer-update timing ({}):", module.get_module_type());
        println!(
            "  {:>10} {:>10} {:>10} {:>10} {:>12}",
            "Count", "Avg(ns)", "Min(ns)", "Max(ns)", "Total(ns)"
        );
        println!(
            "  {:-<10} {:-<10} {:-<10} {:-<10} {:-<12}",
            "", "", "", "", ""
        );
        println!(
            "  {:>10} {:>10} {:>10} {:>10} {:>12}",
            metrics.count,
            metrics.avg_ns(),
            metrics.min_ns(),
            metrics.max_ns,
            metrics.total_ns
        );
        println!("\n  {}", serde_json::to_string(&metrics)?.dimmed());
    }

    Ok(())
}

fn list_patches() {
    let patches_dir = get_patches_dir();
    println!("Patches directory: {:?}", patches_dir);

    if !patches_dir.exists() {
        println!("  (directory does not exist - create patches here)");
        return;
    }

    let files = list_patch_files(&patches_dir);
    if files.is_empty() {
        println!("  (no .json patches found)");
        return;
    }

    println!("\nAvailable patches:");
    for path in files {
        let name = path.file_name().unwrap_or_default().to_string_lossy();
        match load_patch(&path) {
            Ok(patch) => println!(
                "  {} (phase {}ch, offset {}ch)",
                name,
                patch.inputs.phase.channels(),
                patch.inputs.offset.channels()
            ),
            Err(_) => println!("  {} (invalid JSON)", name),
        }
    }
}

fn smoke_test(frames: u64) {
    let patches_dir = get_patches_dir();
    println!("Running smoke test with {} frames per patch\n", frames);

    if !patches_dir.exists() {
        println!("No patches directory found at {:?}", patches_dir);
        return;
    }

    for path in list_patch_files(&patches_dir) {
        let name = path.file_name().unwrap_or_default().to_string_lossy();
        print!("Testing {}... ", name);

        match load_patch(&path).and_then(|p| build_module(&p)) {
            Ok(mut module) => {
                let start = Instant::now();
                for _ in 0..frames {
                    process_frame(&mut module, DEFAULT_SAMPLE_RATE);
                }
                let ns_per_frame = start.elapsed().as_nanos() as f64 / frames.max(1) as f64;
                println!("{} ({:.2} ns/frame)", "OK".green(), ns_per_frame);
            }
            Err(e) => {
                println!("{}: {:#}", "FAILED".red(), e);
            }
        }
    }
}
