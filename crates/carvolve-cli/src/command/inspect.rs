use std::path::PathBuf;

use anyhow::{Context as _, bail};
use carvolve_network::{
    NeuralNetwork, Topology,
    codec::{self, LoadOutcome},
};

use crate::{command::ConfigArgs, schema::network_report::NetworkReport, util::Output};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct InspectArg {
    /// Network file to read
    network: PathBuf,
    /// Layer sizes of the stored network, e.g. `3,7,2` (taken from the config otherwise)
    #[arg(long, value_delimiter = ',')]
    topology: Option<Vec<usize>>,
    #[clap(flatten)]
    config: ConfigArgs,
    /// Report output file path (stdout when omitted)
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &InspectArg) -> anyhow::Result<()> {
    let InspectArg {
        network: path,
        topology,
        config,
        output,
    } = arg;
    let topology = match topology {
        Some(layers) => Topology::new(layers.clone()).context("Invalid --topology")?,
        None => config.load()?.training.topology,
    };

    let mut network = NeuralNetwork::random(topology, &mut rand::rng());
    let outcome = codec::load(path, &mut network)
        .with_context(|| format!("Failed to read network file: {}", path.display()))?;
    let LoadOutcome::Loaded { fitness } = outcome else {
        bail!("{} holds no network", path.display());
    };

    let report = NetworkReport::new(path.clone(), &network, fitness);
    eprintln!("Network: {}", path.display());
    eprintln!("  Topology: {}", report.topology);
    eprintln!("  Fitness: {:.3}", report.fitness);
    eprintln!("  Weights: {}", report.weight_count);
    for (i, t) in report.transitions.iter().enumerate() {
        eprintln!(
            "  Layer {i} -> {}: {}x{} min {:.3} max {:.3} mean {:.3} mean|w| {:.3}",
            i + 1,
            t.to_neurons,
            t.from_neurons,
            t.min,
            t.max,
            t.mean,
            t.mean_abs
        );
    }
    Output::save_json(&report, output.clone())?;

    Ok(())
}
