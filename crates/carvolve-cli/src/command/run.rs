use anyhow::Context as _;
use carvolve_track::CarTrack;
use carvolve_training::{EvolutionaryController, NullDisplay};

use crate::command::ConfigArgs;

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct RunArg {
    #[clap(flatten)]
    config: ConfigArgs,
    /// Number of episodes to drive
    #[arg(long, default_value_t = 5)]
    episodes: usize,
    /// Longest episode in simulated seconds
    #[arg(long, default_value_t = 60.0)]
    time_limit: f32,
    /// Seed of the RNG used when no saved network exists
    #[arg(long)]
    seed: Option<u64>,
}

pub(crate) fn run(arg: &RunArg) -> anyhow::Result<()> {
    let RunArg {
        config,
        episodes,
        time_limit,
        seed,
    } = arg;
    let mut config = config.load()?;
    config.training.train = false;
    config.track.termination.time_limit = Some(*time_limit);
    config.validate()?;

    let network_path = &config.training.network_path;
    if !network_path.exists() {
        log::warn!(
            "{} does not exist, driving a random network",
            network_path.display()
        );
    }

    let mut track = CarTrack::new(config.track, false).context("Failed to build the track")?;
    let mut controller = EvolutionaryController::new(
        config.training.clone(),
        NullDisplay,
        seed.unwrap_or_else(rand::random),
    )
    .context("Failed to load the network")?;
    eprintln!(
        "Driving network from {} (saved fitness {:.3})",
        network_path.display(),
        controller.best_fitness()
    );

    for episode in 1..=*episodes {
        controller
            .run_episode(&mut track)
            .with_context(|| format!("Episode {episode} failed"))?;
        let reason = track
            .end_reason()
            .map_or_else(|| "running".to_owned(), |reason| reason.to_string());
        eprintln!(
            "  Episode {episode:>3}: fitness {:>9.3}, distance {:>8.2}, {:>6.2}s, {reason}",
            track.fitness(),
            track.distance(),
            track.elapsed(),
        );
    }

    Ok(())
}
