use serde::{Deserialize, Serialize};

use crate::geometry::Ring;

/// Weights of the three terms of the car's fitness.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitnessWeights {
    /// Weight of the mean sensor reading (rewards staying mid-track)
    pub sensors: f32,
    /// Weight of the total distance driven
    pub distance: f32,
    /// Weight of the average speed
    pub avg_speed: f32,
}

impl Default for FitnessWeights {
    fn default() -> Self {
        Self {
            sensors: 0.2,
            distance: 1.5,
            avg_speed: 0.1,
        }
    }
}

/// When an episode ends besides wall contact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminationRules {
    /// Seconds after which a car still below `stall_fitness` is stopped
    pub stall_time: f32,
    pub stall_fitness: f32,
    /// Fitness that ends an episode, checked only while training
    pub fitness_cap: f32,
    /// Hard limit on episode length in seconds
    pub time_limit: Option<f32>,
}

impl Default for TerminationRules {
    fn default() -> Self {
        Self {
            stall_time: 20.0,
            stall_fitness: 50.0,
            fitness_cap: 4000.0,
            time_limit: None,
        }
    }
}

/// Track geometry, car kinematics, and scoring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackConfig {
    pub ring: Ring,
    /// Collision radius of the car
    pub car_radius: f32,
    /// Simulated seconds per tick
    pub time_step: f32,
    /// Distance per tick at full acceleration, before blending
    pub max_speed: f32,
    /// Heading change per tick at full rotation, in degrees, before blending
    pub max_turn_degrees: f32,
    /// Fraction of the commanded motion applied per tick
    pub control_blend: f32,
    pub fitness: FitnessWeights,
    pub termination: TerminationRules,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            ring: Ring {
                inner_radius: 40.0,
                outer_radius: 60.0,
            },
            car_radius: 1.0,
            time_step: 0.02,
            max_speed: 11.5,
            max_turn_degrees: 90.0,
            control_blend: 0.05,
            fitness: FitnessWeights::default(),
            termination: TerminationRules::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum TrackError {
    #[display("ring radii must satisfy 0 <= inner ({inner}) < outer ({outer})")]
    Radii { inner: f32, outer: f32 },
    #[display("car of radius {car_radius} does not fit between the walls")]
    CarTooLarge { car_radius: f32 },
    #[display("time step {time_step} must be positive")]
    TimeStep { time_step: f32 },
    #[display("time limit {limit} must be positive")]
    TimeLimit { limit: f32 },
}

impl TrackConfig {
    pub fn validate(&self) -> Result<(), TrackError> {
        let Ring {
            inner_radius: inner,
            outer_radius: outer,
        } = self.ring;
        let ordered = inner >= 0.0 && inner < outer && outer.is_finite();
        if !ordered {
            return Err(TrackError::Radii { inner, outer });
        }
        let fits = self.car_radius >= 0.0 && 2.0 * self.car_radius < outer - inner;
        if !fits {
            return Err(TrackError::CarTooLarge {
                car_radius: self.car_radius,
            });
        }
        if !is_positive(self.time_step) {
            return Err(TrackError::TimeStep {
                time_step: self.time_step,
            });
        }
        if let Some(limit) = self.termination.time_limit
            && !is_positive(limit)
        {
            return Err(TrackError::TimeLimit { limit });
        }
        Ok(())
    }
}

fn is_positive(value: f32) -> bool {
    value > 0.0 && value.is_finite()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert_eq!(TrackConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: TrackConfig =
            serde_json::from_str(r#"{ "car_radius": 2.0, "termination": { "time_limit": 60.0 } }"#)
                .unwrap();
        assert!((config.car_radius - 2.0).abs() < f32::EPSILON);
        assert_eq!(config.termination.time_limit, Some(60.0));
        assert!((config.termination.stall_time - 20.0).abs() < f32::EPSILON);
        assert_eq!(config.fitness, FitnessWeights::default());
    }

    #[test]
    fn test_rejects_bad_geometry() {
        let mut config = TrackConfig::default();
        config.ring.inner_radius = 70.0;
        assert!(matches!(config.validate(), Err(TrackError::Radii { .. })));

        let config = TrackConfig {
            car_radius: 10.0,
            ..TrackConfig::default()
        };
        assert!(matches!(config.validate(), Err(TrackError::CarTooLarge { .. })));

        let config = TrackConfig {
            time_step: 0.0,
            ..TrackConfig::default()
        };
        assert!(matches!(config.validate(), Err(TrackError::TimeStep { .. })));

        let mut config = TrackConfig::default();
        config.termination.time_limit = Some(-1.0);
        assert!(matches!(config.validate(), Err(TrackError::TimeLimit { .. })));
    }
}
