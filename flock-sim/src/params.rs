use std::f64::consts::{FRAC_PI_2, FRAC_PI_3, PI};

use crate::error::FlockError;

/// Upper bound on the number of agents a flock may hold.
pub const AGENT_CAPACITY: usize = 1000;
pub const DEFAULT_AGENT_COUNT: usize = 30;

pub const MAX_SPEED_LIMIT: f64 = 1.0;
pub const MAX_FORCE: f64 = 10.0;
pub const MAX_DISTANCE: f64 = 10.0;

const DEFAULT_MIN_SPEED: f64 = 0.005;
const DEFAULT_MAX_SPEED: f64 = 0.03;
const DEFAULT_COHESION_FORCE: f64 = 0.008;
const DEFAULT_SEPARATION_FORCE: f64 = 0.4;
const DEFAULT_ALIGNMENT_FORCE: f64 = 0.06;
const DEFAULT_BOUNDARY_FORCE: f64 = 0.001;
const DEFAULT_COHESION_DISTANCE: f64 = 0.5;
const DEFAULT_SEPARATION_DISTANCE: f64 = 0.05;
const DEFAULT_ALIGNMENT_DISTANCE: f64 = 0.1;

/// Per-step tuning for a flock. Angles are half-angles of the view cone in
/// radians, measured from the agent's heading.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Params {
    pub num_agents: usize,
    pub min_speed: f64,
    pub max_speed: f64,
    pub cohesion_force: f64,
    pub separation_force: f64,
    pub alignment_force: f64,
    pub boundary_force: f64,
    pub cohesion_distance: f64,
    pub separation_distance: f64,
    pub alignment_distance: f64,
    pub cohesion_angle: f64,
    pub separation_angle: f64,
    pub alignment_angle: f64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            num_agents: DEFAULT_AGENT_COUNT,
            min_speed: DEFAULT_MIN_SPEED,
            max_speed: DEFAULT_MAX_SPEED,
            cohesion_force: DEFAULT_COHESION_FORCE,
            separation_force: DEFAULT_SEPARATION_FORCE,
            alignment_force: DEFAULT_ALIGNMENT_FORCE,
            boundary_force: DEFAULT_BOUNDARY_FORCE,
            cohesion_distance: DEFAULT_COHESION_DISTANCE,
            separation_distance: DEFAULT_SEPARATION_DISTANCE,
            alignment_distance: DEFAULT_ALIGNMENT_DISTANCE,
            cohesion_angle: FRAC_PI_2,
            separation_angle: FRAC_PI_2,
            alignment_angle: FRAC_PI_3,
        }
    }
}

impl Params {
    /// Replaces non-finite values with their defaults and clamps everything
    /// into a usable range. `max_speed` never ends up below `min_speed`.
    pub fn sanitize(&mut self) {
        let before = *self;

        self.min_speed = clamp_finite(self.min_speed, 0.0, MAX_SPEED_LIMIT, DEFAULT_MIN_SPEED);
        self.max_speed = clamp_finite(
            self.max_speed,
            self.min_speed,
            MAX_SPEED_LIMIT,
            DEFAULT_MAX_SPEED.max(self.min_speed),
        );
        self.cohesion_force =
            clamp_finite(self.cohesion_force, 0.0, MAX_FORCE, DEFAULT_COHESION_FORCE);
        self.separation_force =
            clamp_finite(self.separation_force, 0.0, MAX_FORCE, DEFAULT_SEPARATION_FORCE);
        self.alignment_force =
            clamp_finite(self.alignment_force, 0.0, MAX_FORCE, DEFAULT_ALIGNMENT_FORCE);
        self.boundary_force =
            clamp_finite(self.boundary_force, 0.0, MAX_FORCE, DEFAULT_BOUNDARY_FORCE);
        self.cohesion_distance = clamp_finite(
            self.cohesion_distance,
            0.0,
            MAX_DISTANCE,
            DEFAULT_COHESION_DISTANCE,
        );
        self.separation_distance = clamp_finite(
            self.separation_distance,
            0.0,
            MAX_DISTANCE,
            DEFAULT_SEPARATION_DISTANCE,
        );
        self.alignment_distance = clamp_finite(
            self.alignment_distance,
            0.0,
            MAX_DISTANCE,
            DEFAULT_ALIGNMENT_DISTANCE,
        );
        self.cohesion_angle = clamp_finite(self.cohesion_angle, 0.0, PI, FRAC_PI_2);
        self.separation_angle = clamp_finite(self.separation_angle, 0.0, PI, FRAC_PI_2);
        self.alignment_angle = clamp_finite(self.alignment_angle, 0.0, PI, FRAC_PI_3);

        if *self != before {
            log::debug!("sanitized flock params: {:?} -> {:?}", before, self);
        }
    }
}

/// Checks an agent count against the flock capacity.
pub fn validate_agent_count(count: usize) -> Result<usize, FlockError> {
    if count == 0 {
        return Err(FlockError::EmptyFlock);
    }
    if count > AGENT_CAPACITY {
        return Err(FlockError::CapacityExceeded {
            requested: count,
            capacity: AGENT_CAPACITY,
        });
    }
    Ok(count)
}

fn clamp_finite(value: f64, min: f64, max: f64, fallback: f64) -> f64 {
    if !value.is_finite() {
        return fallback;
    }
    value.clamp(min, max)
}
