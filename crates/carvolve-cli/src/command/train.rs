use std::path::PathBuf;

use anyhow::Context as _;
use carvolve_track::CarTrack;
use carvolve_training::{Advance, EvolutionaryController};
use chrono::Utc;

use crate::{
    command::ConfigArgs,
    schema::summary::TrainingSummary,
    util::{Output, StderrProgress},
};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct TrainArg {
    #[clap(flatten)]
    pub(crate) config: ConfigArgs,
    /// Number of generations to evaluate
    #[arg(long, default_value_t = 100)]
    generations: usize,
    /// Seed of the training RNG (random when omitted)
    #[arg(long)]
    seed: Option<u64>,
    /// Summary output file path (stdout when omitted)
    #[arg(long)]
    summary: Option<PathBuf>,
    /// Hide the per-genome progress line
    #[arg(long)]
    quiet: bool,
}

pub(crate) fn run(arg: &TrainArg) -> anyhow::Result<()> {
    let TrainArg {
        config,
        generations,
        seed,
        summary,
        quiet,
    } = arg;
    let mut config = config.load()?;
    config.training.train = true;
    config.validate()?;

    let seed = seed.unwrap_or_else(rand::random);
    let training = &config.training;
    log::info!(
        "training {} genomes of topology {} for {generations} generations (seed {seed})",
        training.population_size,
        training.topology,
    );

    let mut track = CarTrack::new(config.track, true).context("Failed to build the track")?;
    let mut controller =
        EvolutionaryController::new(training.clone(), StderrProgress::new(*quiet), seed)
            .context("Failed to start training")?;

    let mut last_generation = None;
    for _ in 0..*generations {
        let advance = controller
            .run_generation(&mut track)
            .with_context(|| format!("Generation #{} failed", controller.generation()))?;
        if let Advance::NewGeneration { stats, .. } = advance {
            last_generation = stats;
        }
    }

    eprintln!("Training completed.");
    eprintln!("  Generations: {generations}");
    eprintln!("  Best fitness: {:.3}", controller.best_fitness());
    eprintln!("  Network: {}", training.network_path.display());

    let training_summary = TrainingSummary {
        finished_at: Utc::now(),
        seed,
        generations: *generations,
        population_size: training.population_size,
        topology: training.topology.clone(),
        best_fitness: controller.best_fitness(),
        network_path: training.network_path.clone(),
        last_generation,
    };
    Output::save_json(&training_summary, summary.clone())?;

    Ok(())
}
