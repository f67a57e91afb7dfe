//! demodulated: offline host for the DeModulated phase engine
//!
//! Runs a patch file through the module frame by frame, the way a real-time
//! host would, and writes the result somewhere useful:
//!
//! - `render`: write an output port to a 32-bit float WAV file
//! - `schema`: print the module schema as JSON
//! - `params`: show parameter ranges and defaults
//! - `validate`: check patch files without rendering

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use colored::Colorize;
use demodulated_core::dsp::utils::OUTPUT_SCALE;
use demodulated_core::module::POLY_PHASE_OUTPUT;
use demodulated_core::params::param_infos;
use demodulated_core::{DeModulated, Module};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use demodulated_cli::patch::{build_module, get_patches_dir, list_patch_files, load_patch};

const DEFAULT_SAMPLE_RATE: u32 = 48000;

#[derive(Parser)]
#[command(name = "demodulated")]
#[command(about = "Render and inspect the DeModulated sixteen-voice phase engine")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render an output port of a patch to a WAV file
    Render {
        /// Path to the patch JSON file
        patch: PathBuf,

        /// Output WAV path
        #[arg(short, long, default_value = "demodulated.wav")]
        out: PathBuf,

        /// Output port to record (polyPhase or phase0..phase15)
        #[arg(short, long, default_value = POLY_PHASE_OUTPUT)]
        port: String,

        /// Length in seconds
        #[arg(long, default_value_t = 1.0)]
        seconds: f32,

        /// Sample rate in Hz
        #[arg(short, long, default_value_t = DEFAULT_SAMPLE_RATE)]
        sample_rate: u32,
    },

    /// Print the module schema as JSON
    Schema,

    /// List parameters with their ranges and defaults
    Params,

    /// Check that patch files load and build
    Validate {
        /// Patch JSON file or directory of patches (default: bundled patches)
        path: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            patch,
            out,
            port,
            seconds,
            sample_rate,
        } => render(&patch, &out, &port, seconds, sample_rate),
        Commands::Schema => {
            let schema = serde_json::to_string_pretty(&DeModulated::get_schema())?;
            println!("{schema}");
            Ok(())
        }
        Commands::Params => {
            print_params();
            Ok(())
        }
        Commands::Validate { path } => validate(&path.unwrap_or_else(get_patches_dir)),
    }
}

fn render(patch_path: &Path, out: &Path, port: &str, seconds: f32, sample_rate: u32) -> Result<()> {
    if sample_rate == 0 {
        bail!("sample rate must be positive");
    }
    let patch = load_patch(patch_path)?;
    let mut module = build_module(&patch)?;
    if !module.get_output(port)?.is_connected() {
        bail!("port {port} is disconnected in {}", patch_path.display());
    }

    let frames = (seconds.max(0.0) * sample_rate as f32).round() as u64;
    let sample_rate_f = sample_rate as f32;

    // The first frame fixes how many channels the port reports.
    module.update(sample_rate_f);
    let channels = module.get_output(port)?.channels();

    let spec = hound::WavSpec {
        channels: channels as u16,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(out, spec)
        .with_context(|| format!("Failed to create {}", out.display()))?;

    tracing::info!(frames, channels, port, out = %out.display(), "rendering");

    for frame in 0..frames {
        if frame > 0 {
            module.update(sample_rate_f);
        }
        let output = module.get_output(port)?;
        for channel in 0..channels {
            writer.write_sample(output.get_voltage(channel) / OUTPUT_SCALE)?;
        }
    }
    writer.finalize().context("Failed to finalize WAV file")?;

    println!(
        "Rendered {} frames ({:.2}s at {}Hz, {} ch) to {}",
        frames,
        seconds,
        sample_rate,
        channels,
        out.display()
    );
    Ok(())
}

fn validate(path: &Path) -> Result<()> {
    let files = if path.is_dir() {
        list_patch_files(path)
    } else {
        vec![path.to_path_buf()]
    };
    if files.is_empty() {
        bail!("no .json patches found in {}", path.display());
    }

    let mut failures = 0;
    for file in &files {
        match load_patch(file).and_then(|p| build_module(&p)) {
            Ok(_) => println!("{} {}", "OK".green(), file.display()),
            Err(e) => {
                failures += 1;
                println!("{} {}: {:#}", "FAILED".red(), file.display(), e);
            }
        }
    }
    if failures > 0 {
        bail!("{failures} of {} patches failed to build", files.len());
    }
    Ok(())
}

fn print_params() {
    println!(
        "  {:16} {:22} {:>10} {:>10} {:>10} {:8}",
        "Key", "Name", "Min", "Max", "Default", "Unit"
    );
    println!(
        "  {:-<16} {:-<22} {:-<10} {:-<10} {:-<10} {:-<8}",
        "", "", "", "", "", ""
    );
    for info in param_infos() {
        let default = match info.labels {
            Some(labels) => labels[(info.default >= 0.5) as usize].to_string(),
            None => format!("{:.4}", info.display_value(info.default)),
        };
        println!(
            "  {:16} {:22} {:>10.4} {:>10.4} {:>10} {:8}",
            info.key.cyan(),
            info.name,
            info.display_value(info.min),
            info.display_value(info.max),
            default.yellow(),
            info.unit.trim()
        );
    }
}
