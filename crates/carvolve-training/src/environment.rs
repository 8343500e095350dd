//! Seams between the training engine and the world it trains in.

use carvolve_network::NeuralNetwork;

/// Outcome of applying one action to an [`Environment`].
#[derive(Debug, Clone, Copy, PartialEq, derive_more::IsVariant)]
pub enum Step {
    Running,
    /// The agent is done (crashed, timed out, or hit the fitness cap).
    Terminated { fitness: f32 },
}

/// A simulation driven by a genome one tick at a time.
///
/// Observation and action lengths must match the genome's input and output layer
/// sizes. An environment must eventually return [`Step::Terminated`]; the episode
/// driver has no tick limit of its own.
pub trait Environment {
    /// Restores the initial simulation state for a newly assigned genome.
    fn reset(&mut self);

    /// Returns the current observation vector.
    fn observe(&self) -> Vec<f32>;

    /// Applies an action vector and advances the simulation by one tick.
    fn apply(&mut self, action: &[f32]) -> Step;
}

/// Runs `genome` in `env` from a fresh reset until it terminates.
///
/// Evaluation errors never escape: a genome that cannot be evaluated ends its
/// episode immediately with fitness zero.
pub fn run_episode<E>(env: &mut E, genome: &NeuralNetwork) -> f32
where
    E: Environment + ?Sized,
{
    env.reset();
    loop {
        let observation = env.observe();
        let action = match genome.evaluate(&observation) {
            Ok(action) => action,
            Err(e) => {
                log::warn!("genome evaluation failed, terminating with fitness 0: {e}");
                return 0.0;
            }
        };
        if let Step::Terminated { fitness } = env.apply(&action) {
            return fitness;
        }
    }
}

/// Position of the training run, reported after every termination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub generation: usize,
    /// 1-based position of the genome that just finished
    pub genome: usize,
    pub population_size: usize,
}

/// Passive sink for training counters.
pub trait ProgressDisplay {
    fn show(&mut self, progress: &Progress);
}

impl<F> ProgressDisplay for F
where
    F: FnMut(&Progress),
{
    fn show(&mut self, progress: &Progress) {
        self(progress);
    }
}

/// Discards every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDisplay;

impl ProgressDisplay for NullDisplay {
    fn show(&mut self, _progress: &Progress) {}
}

#[cfg(test)]
mod tests {
    use carvolve_network::Topology;

    use super::*;

    /// Terminates after a fixed number of ticks with the sum of the first output.
    struct CountdownEnv {
        inputs: usize,
        ticks_left: usize,
        resets: usize,
        total: f32,
    }

    impl Environment for CountdownEnv {
        fn reset(&mut self) {
            self.ticks_left = 3;
            self.resets += 1;
            self.total = 0.0;
        }

        fn observe(&self) -> Vec<f32> {
            vec![1.0; self.inputs]
        }

        fn apply(&mut self, action: &[f32]) -> Step {
            self.total += action[0];
            self.ticks_left -= 1;
            if self.ticks_left == 0 {
                Step::Terminated {
                    fitness: self.total,
                }
            } else {
                Step::Running
            }
        }
    }

    #[test]
    fn test_run_episode_resets_and_accumulates() {
        let topology = Topology::new(vec![2, 1]).unwrap();
        let genome = NeuralNetwork::from_weights(topology, vec![0.0, 0.0]).unwrap();
        let mut env = CountdownEnv {
            inputs: 2,
            ticks_left: 0,
            resets: 0,
            total: 0.0,
        };
        let fitness = run_episode(&mut env, &genome);
        assert_eq!(env.resets, 1);
        assert!((fitness - 3.0 * 0.5f32.tanh()).abs() < 1e-6);
    }

    #[test]
    fn test_run_episode_survives_shape_mismatch() {
        let genome = NeuralNetwork::random(Topology::reference(), &mut rand::rng());
        let mut env = CountdownEnv {
            inputs: 5,
            ticks_left: 0,
            resets: 0,
            total: 0.0,
        };
        let fitness = run_episode(&mut env, &genome);
        assert!(fitness.abs() < f32::EPSILON);
    }

    #[test]
    fn test_closure_display() {
        let mut seen = Vec::new();
        let mut display = |p: &Progress| seen.push(p.genome);
        for genome in 1..=3 {
            display.show(&Progress {
                generation: 1,
                genome,
                population_size: 3,
            });
        }
        assert_eq!(seen, vec![1, 2, 3]);
    }
}
