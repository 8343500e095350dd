//! Headless ring-track car simulation for training network controllers.
//!
//! [`CarTrack`] implements [`carvolve_training::Environment`]: a point car starts
//! mid-way between the two walls of an annular track, heading counter-clockwise,
//! and is driven one fixed time step per tick.
//!
//! - **Observation** - three ray distances to the nearest wall (45° right, forward,
//!   45° left)
//! - **Action** - acceleration and rotation, each in `[-1, 1]`
//! - **Fitness** - `mean(sensors)·0.2 + distance·1.5 + avg_speed·0.1` with the
//!   default [`FitnessWeights`]
//!
//! An episode ends when the car touches a wall, when it is still below the stall
//! fitness after the stall time, when it reaches the fitness cap (training only),
//! or when the optional time limit runs out.

pub use self::{
    car::{CONTROL_COUNT, CarTrack, EndReason, SENSOR_COUNT},
    config::{FitnessWeights, TerminationRules, TrackConfig, TrackError},
    geometry::{Ring, Vec2},
};

mod car;
mod config;
mod geometry;
