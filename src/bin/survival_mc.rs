use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::Serialize;

use droplet_mc::{run_study, RunConfig, StudyOutput};

#[derive(Debug, Parser)]
#[command(name = "survival_mc")]
#[command(about = "Monte Carlo droplet nucleation survival envelopes")]
struct Cli {
    /// TOML configuration file; flags below override individual fields.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    experiments: Option<usize>,

    #[arg(long)]
    droplets: Option<usize>,

    #[arg(long)]
    attempts: Option<usize>,

    /// Time horizon in hours.
    #[arg(long)]
    duration: Option<f64>,

    /// Nucleation rate constant J, events per cm^3 per second.
    #[arg(long)]
    rate_constant: Option<f64>,

    /// Droplet diameter in cm.
    #[arg(long)]
    diameter: Option<f64>,

    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

#[derive(Debug, Serialize)]
struct EnvelopeRow {
    time_hours: f64,
    theory: f64,
    sigma3_low: f64,
    sigma2_low: f64,
    sigma1_low: f64,
    median: f64,
    sigma1_high: f64,
    sigma2_high: f64,
    sigma3_high: f64,
}

#[derive(Debug, Serialize)]
struct StudyReport<'a> {
    config: &'a RunConfig,
    droplet_volume_cm3: f64,
    cutoff: f64,
    output: &'a StudyOutput,
}

fn apply_overrides(config: &mut RunConfig, cli: &Cli) {
    if let Some(experiments) = cli.experiments {
        config.experiments = experiments;
    }
    if let Some(droplets) = cli.droplets {
        config.droplets = droplets;
    }
    if let Some(attempts) = cli.attempts {
        config.attempts = attempts;
    }
    if let Some(duration) = cli.duration {
        config.duration_hours = duration;
    }
    if let Some(rate_constant) = cli.rate_constant {
        config.rate_constant = rate_constant;
    }
    if let Some(diameter) = cli.diameter {
        config.diameter_cm = diameter;
    }
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
}

fn envelope_rows(output: &StudyOutput) -> Vec<EnvelopeRow> {
    (0..output.time_hours.len())
        .map(|t| EnvelopeRow {
            time_hours: output.time_hours[t],
            theory: output.theory[t],
            sigma3_low: output.envelope.bands[0][t],
            sigma2_low: output.envelope.bands[1][t],
            sigma1_low: output.envelope.bands[2][t],
            median: output.envelope.bands[3][t],
            sigma1_high: output.envelope.bands[4][t],
            sigma2_high: output.envelope.bands[5][t],
            sigma3_high: output.envelope.bands[6][t],
        })
        .collect()
}

fn write_csv<W: Write>(writer: W, output: &StudyOutput) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in envelope_rows(output) {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => RunConfig::from_toml_file(path)
            .with_context(|| format!("failed to load config: {}", path.display()))?,
        None => RunConfig::default(),
    };
    apply_overrides(&mut config, &cli);
    config.validate().context("invalid configuration")?;

    let output = run_study(&config)?;

    let stdout = io::stdout();
    match cli.format {
        OutputFormat::Csv => write_csv(stdout.lock(), &output)?,
        OutputFormat::Json => {
            let report = StudyReport {
                config: &config,
                droplet_volume_cm3: config.kinetics().droplet_volume_cm3(),
                cutoff: config.experiment_params().cutoff,
                output: &output,
            };
            serde_json::to_writer_pretty(stdout.lock(), &report)?;
            println!();
        }
    }

    eprintln!(
        "{} runs of {} droplets over {} steps (cutoff {:.6})",
        config.experiments,
        config.droplets,
        config.attempts,
        config.experiment_params().cutoff,
    );
    Ok(())
}
