//! scopetrace CLI - traces a ray ensemble through a telescope description
//! and reports where rays are lost.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use scopetrace::analysis::{focal_ratio, map_detector, StageSummary};
use scopetrace::config::InstrumentConfig;
use scopetrace::ensemble::Pattern;
use scopetrace::geometry::Surface;
use scopetrace::pipeline::{Pipeline, PropagationReport, StageSamples};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "scopetrace")]
#[command(about = "Sequential ray tracer for reflecting telescopes and spectrographs", long_about = None)]
struct Cli {
    /// TOML instrument description (overrides --preset)
    config: Option<PathBuf>,

    /// Built-in instrument to trace when no file is given
    #[arg(long, value_enum, default_value_t = Preset::Cassegrain)]
    preset: Preset,

    /// Number of rays to generate
    #[arg(short = 'n', long)]
    rays: Option<usize>,

    /// Random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Starting position layout
    #[arg(long, value_enum)]
    pattern: Option<PatternArg>,

    /// Wavelength in Angstroms
    #[arg(short, long)]
    wavelength: Option<f64>,

    /// Field angle in arcseconds
    #[arg(long)]
    off_axis: Option<f64>,

    /// Trace rays on all cores
    #[arg(long)]
    parallel: bool,

    /// Print the resolved description as TOML and exit
    #[arg(long)]
    dump_config: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
enum Preset {
    Cassegrain,
    Newtonian,
}

#[derive(Clone, Copy, ValueEnum)]
enum PatternArg {
    Disk,
    Grid,
    Ring,
    Single,
    Square,
}

impl From<PatternArg> for Pattern {
    fn from(arg: PatternArg) -> Self {
        match arg {
            PatternArg::Disk => Pattern::Disk,
            PatternArg::Grid => Pattern::Grid,
            PatternArg::Ring => Pattern::Ring,
            PatternArg::Single => Pattern::Single,
            PatternArg::Square => Pattern::Square,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => InstrumentConfig::from_path(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => match cli.preset {
            Preset::Cassegrain => InstrumentConfig::cassegrain_rowland(),
            Preset::Newtonian => InstrumentConfig::newtonian(),
        },
    };
    apply_overrides(&cli, &mut config);

    if cli.dump_config {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    let pipeline = config.build_pipeline()?;
    let ensemble = config.build_ensemble()?;
    let mut rays = ensemble.rays;
    info!(
        name = %config.name,
        rays = rays.len(),
        overshoot = ensemble.overshoot,
        "tracing"
    );

    let mut samples = StageSamples::new();
    let report = if cli.parallel {
        pipeline.propagate_par(&mut rays, &mut samples)
    } else {
        pipeline.propagate(&mut rays, &mut samples)
    };

    print_report(&pipeline, &report, &samples);

    if config.source.pattern == Pattern::Ring {
        for (i, ray) in rays.iter().enumerate().filter(|(_, r)| r.is_alive()) {
            println!("ring ray {i:2}: f/{:.3}", focal_ratio(&ray.direction));
        }
    }

    if let Some(Surface::CylindricalDetector(detector)) =
        pipeline.elements().last().map(|e| e.surface())
    {
        let points = map_detector(detector, &rays);
        if !points.is_empty() {
            #[allow(clippy::cast_precision_loss)]
            let n = points.len() as f64;
            let along = points.iter().map(|p| p.along).sum::<f64>() / n;
            let across = points.iter().map(|p| p.across).sum::<f64>() / n;
            println!("detector mean position: along {along:.6} m, across {across:.6} m");
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

fn apply_overrides(cli: &Cli, config: &mut InstrumentConfig) {
    let source = &mut config.source;
    if let Some(count) = cli.rays {
        source.count = count;
    }
    if let Some(seed) = cli.seed {
        source.seed = seed;
    }
    if let Some(pattern) = cli.pattern {
        source.pattern = pattern.into();
    }
    if let Some(wavelength) = cli.wavelength {
        source.wavelength = wavelength;
    }
    if let Some(off_axis) = cli.off_axis {
        source.off_axis_arcsec = off_axis;
    }
}

fn print_report(pipeline: &Pipeline, report: &PropagationReport, samples: &StageSamples) {
    println!("{:>3}  {:<24} {:>10}  losses", "#", "element", "alive");
    for (stage, element) in pipeline.elements().iter().enumerate() {
        let losses = report
            .losses_at(stage)
            .iter()
            .map(|(label, n)| format!("{label}: {n}"))
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "{stage:>3}  {:<24} {:>10}  {losses}",
            element.name(),
            report.survivors()[stage]
        );
    }

    for summary in StageSummary::all(samples) {
        if let Some(c) = summary.centroid {
            println!(
                "stage {}: centroid ({:.6}, {:.6}, {:.6}), rms radius {:.3e}",
                summary.stage, c.x, c.y, c.z, summary.rms_radius
            );
        }
    }

    println!(
        "{} of {} rays survived ({:.2}%)",
        report.alive(),
        report.total(),
        100.0 * report.fraction_surviving()
    );
}
