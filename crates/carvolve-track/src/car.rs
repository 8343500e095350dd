use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

use carvolve_training::{Environment, Step};

use crate::{
    config::{TrackConfig, TrackError},
    geometry::Vec2,
};

/// Number of distance sensors, and so the observation length.
pub const SENSOR_COUNT: usize = 3;
/// Number of controls read from an action: acceleration and rotation.
pub const CONTROL_COUNT: usize = 2;

/// Sensor directions relative to the heading: right, forward, left.
const SENSOR_ANGLES: [f32; SENSOR_COUNT] = [-FRAC_PI_4, 0.0, FRAC_PI_4];

/// Why an episode ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum EndReason {
    #[display("hit a wall")]
    Collision,
    #[display("stalled")]
    Stalled,
    #[display("reached the fitness cap")]
    FitnessCap,
    #[display("ran out of time")]
    TimeLimit,
}

/// A point car driving counter-clockwise around a ring track.
///
/// The car observes three wall distances and is steered by two outputs in
/// `[-1, 1]`: acceleration along the heading (negative drives backwards) and
/// rotation (positive turns right). Every tick it accumulates driven distance, and
/// its fitness combines the mean sensor reading, the total distance, and the
/// average speed.
#[derive(Debug, Clone)]
pub struct CarTrack {
    config: TrackConfig,
    training: bool,
    position: Vec2,
    /// Radians counter-clockwise from +x
    heading: f32,
    elapsed: f32,
    distance: f32,
    sensors: [f32; SENSOR_COUNT],
    fitness: f32,
    end_reason: Option<EndReason>,
}

impl CarTrack {
    /// Creates a track with the car at its start pose.
    ///
    /// `training` enables the fitness cap; evaluation-only runs keep driving until
    /// the car crashes, stalls, or hits the time limit.
    pub fn new(config: TrackConfig, training: bool) -> Result<Self, TrackError> {
        config.validate()?;
        let mut track = Self {
            config,
            training,
            position: Vec2::ZERO,
            heading: 0.0,
            elapsed: 0.0,
            distance: 0.0,
            sensors: [0.0; SENSOR_COUNT],
            fitness: 0.0,
            end_reason: None,
        };
        track.reset();
        Ok(track)
    }

    #[must_use]
    pub fn config(&self) -> &TrackConfig {
        &self.config
    }

    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    #[must_use]
    pub fn heading(&self) -> f32 {
        self.heading
    }

    /// Simulated seconds since the last reset.
    #[must_use]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Total distance driven since the last reset, in either direction.
    #[must_use]
    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// Wall distances seen from the current pose: right, forward, left.
    #[must_use]
    pub fn sensors(&self) -> [f32; SENSOR_COUNT] {
        self.sensors
    }

    #[must_use]
    pub fn fitness(&self) -> f32 {
        self.fitness
    }

    /// Why the last episode ended, if it has.
    #[must_use]
    pub fn end_reason(&self) -> Option<EndReason> {
        self.end_reason
    }

    fn read_sensors(&self) -> [f32; SENSOR_COUNT] {
        SENSOR_ANGLES.map(|offset| {
            let dir = Vec2::from_angle(self.heading + offset);
            self.config
                .ring
                .ray_distance(self.position, dir)
                .unwrap_or(0.0)
        })
    }

    #[expect(clippy::cast_precision_loss)]
    fn compute_fitness(&self) -> f32 {
        let weights = &self.config.fitness;
        let mean_sensor = self.sensors.iter().sum::<f32>() / SENSOR_COUNT as f32;
        let avg_speed = if self.elapsed > 0.0 {
            self.distance / self.elapsed
        } else {
            0.0
        };
        mean_sensor * weights.sensors
            + self.distance * weights.distance
            + avg_speed * weights.avg_speed
    }

    fn check_end(&self) -> Option<EndReason> {
        let rules = &self.config.termination;
        if self
            .config
            .ring
            .touches_wall(self.position, self.config.car_radius)
        {
            return Some(EndReason::Collision);
        }
        if self.elapsed > rules.stall_time && self.fitness < rules.stall_fitness {
            return Some(EndReason::Stalled);
        }
        if self.training && self.fitness >= rules.fitness_cap {
            return Some(EndReason::FitnessCap);
        }
        if rules.time_limit.is_some_and(|limit| self.elapsed >= limit) {
            return Some(EndReason::TimeLimit);
        }
        None
    }
}

impl Environment for CarTrack {
    fn reset(&mut self) {
        self.position = Vec2::new(self.config.ring.mid_radius(), 0.0);
        self.heading = FRAC_PI_2;
        self.elapsed = 0.0;
        self.distance = 0.0;
        self.fitness = 0.0;
        self.end_reason = None;
        self.sensors = self.read_sensors();
    }

    fn observe(&self) -> Vec<f32> {
        self.sensors.to_vec()
    }

    fn apply(&mut self, action: &[f32]) -> Step {
        let [acceleration, rotation, ..] = *action else {
            log::warn!(
                "expected {CONTROL_COUNT} controls, got {}; ending episode",
                action.len()
            );
            self.end_reason = Some(EndReason::Collision);
            return Step::Terminated { fitness: 0.0 };
        };
        let acceleration = acceleration.clamp(-1.0, 1.0);
        let rotation = rotation.clamp(-1.0, 1.0);

        let blend = self.config.control_blend;
        let step = Vec2::from_angle(self.heading) * (acceleration * self.config.max_speed * blend);
        self.position += step;
        self.heading -= (rotation * self.config.max_turn_degrees * blend).to_radians();
        self.elapsed += self.config.time_step;
        self.distance += step.length();

        self.sensors = self.read_sensors();
        self.fitness = self.compute_fitness();

        match self.check_end() {
            Some(reason) => {
                log::trace!(
                    "car {reason} after {:.2}s: distance {:.2}, fitness {:.2}",
                    self.elapsed,
                    self.distance,
                    self.fitness
                );
                self.end_reason = Some(reason);
                Step::Terminated {
                    fitness: self.fitness,
                }
            }
            None => Step::Running,
        }
    }
}
