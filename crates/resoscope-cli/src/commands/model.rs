//! Spring-mass model table.

use std::path::Path;

use clap::Args;

use super::common::{bandpass_rules, load_config, model_parts};

#[derive(Args)]
pub struct ModelArgs {
    /// Added mass in grams (snapped to the selector step)
    #[arg(short, long, conflicts_with = "all")]
    mass: Option<f64>,

    /// Show every selectable mass
    #[arg(long)]
    all: bool,
}

pub fn run(args: ModelArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let (mut selector, params) = model_parts(&config.model);
    let rules = bandpass_rules(&config);

    let masses: Vec<u32> = if args.all {
        selector.choices().collect()
    } else {
        vec![args.mass.map_or(selector.grams(), |g| selector.set(g))]
    };

    println!(
        "Spring constant {} N/m, spring mass {} kg (m0)",
        params.spring_constant, params.added_mass_kg
    );
    println!();
    println!(
        "{:>8}  {:>10}  {:>12}  {:>14}",
        "Mass (g)", "Bare (Hz)", "Loaded (Hz)", "Band (Hz)"
    );
    for grams in masses {
        let model = params.frequencies(f64::from(grams));
        let band = rules.target(model.f_loaded);
        println!(
            "{:>8}  {:>10.3}  {:>12.3}  {:>6.1} - {:<5.1}",
            grams, model.f_bare, model.f_loaded, band.low_hz, band.high_hz
        );
    }

    Ok(())
}
