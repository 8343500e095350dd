use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::schema::run_config::RunConfig;

use self::{init_config::InitConfigArg, inspect::InspectArg, run::RunArg, train::TrainArg};

mod init_config;
mod inspect;
mod run;
mod train;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Evolve car controllers on the ring track
    Train(#[clap(flatten)] TrainArg),
    /// Drive the saved best network without training
    Run(#[clap(flatten)] RunArg),
    /// Write the default configuration as JSON
    InitConfig(#[clap(flatten)] InitConfigArg),
    /// Show the contents of a saved network file
    Inspect(#[clap(flatten)] InspectArg),
}

/// Options selecting and overriding the run configuration.
#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct ConfigArgs {
    /// JSON config file; missing fields use their defaults
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override the number of genomes per generation
    #[arg(long)]
    population_size: Option<usize>,
    /// Override the file the best network is saved to and loaded from
    #[arg(long)]
    network_path: Option<PathBuf>,
}

impl ConfigArgs {
    /// Loads the config file and applies command-line overrides, without validating.
    pub(crate) fn load(&self) -> anyhow::Result<RunConfig> {
        let mut config = RunConfig::load(self.config.as_deref())?;
        if let Some(population_size) = self.population_size {
            config.training.population_size = population_size;
        }
        if let Some(path) = &self.network_path {
            config.training.network_path.clone_from(path);
        }
        Ok(config)
    }
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Train(arg) => train::run(&arg)?,
        Mode::Run(arg) => run::run(&arg)?,
        Mode::InitConfig(arg) => init_config::run(&arg)?,
        Mode::Inspect(arg) => inspect::run(&arg)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_train_overrides() {
        let args = CommandArgs::try_parse_from([
            "carvolve",
            "train",
            "--generations",
            "3",
            "--population-size",
            "8",
            "--network-path",
            "out.dat",
            "--seed",
            "42",
        ])
        .unwrap();
        let Mode::Train(arg) = args.mode else {
            panic!("expected the train subcommand");
        };
        let config = arg.config.load().unwrap();
        assert_eq!(config.training.population_size, 8);
        assert_eq!(config.training.network_path, PathBuf::from("out.dat"));
    }

    #[test]
    fn test_parse_inspect_topology() {
        let args =
            CommandArgs::try_parse_from(["carvolve", "inspect", "net.dat", "--topology", "3,5,2"])
                .unwrap();
        assert!(matches!(args.mode, Mode::Inspect(_)));
    }

    #[test]
    fn test_subcommand_is_required() {
        assert!(CommandArgs::try_parse_from(["carvolve"]).is_err());
    }
}
