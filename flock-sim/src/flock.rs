use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::FlockError;
use crate::math;
use crate::params::{validate_agent_count, Params};

/// Radius of the sphere around the origin that the boundary force pulls
/// agents back into.
pub const BOUNDARY_RADIUS: f64 = 1.0;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Agent {
    pub position: [f64; 3],
    pub velocity: [f64; 3],
}

impl Agent {
    pub fn speed(&self) -> f64 {
        let [vx, vy, vz] = self.velocity;
        math::length_3d(vx, vy, vz)
    }

    pub fn distance_from_origin(&self) -> f64 {
        let [x, y, z] = self.position;
        math::length_3d(x, y, z)
    }
}

/// Counters gathered over one pass of [`Flock::step`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepStats {
    pub cohesion_neighbors: usize,
    pub separation_neighbors: usize,
    pub alignment_neighbors: usize,
    pub outside_boundary: usize,
    pub speed_clamped: usize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Steering {
    cohesion: (f64, f64, f64),
    separation: (f64, f64, f64),
    alignment: (f64, f64, f64),
    cohesion_count: usize,
    separation_count: usize,
    alignment_count: usize,
}

/// A fixed-size population of agents, stored as parallel arrays in agent
/// order. `distance` and `angle` are scratch rows rebuilt for every agent
/// during a step.
#[derive(Clone, Debug)]
pub struct Flock {
    pos_x: Vec<f64>,
    pos_y: Vec<f64>,
    pos_z: Vec<f64>,
    vel_x: Vec<f64>,
    vel_y: Vec<f64>,
    vel_z: Vec<f64>,
    distance: Vec<f64>,
    angle: Vec<f64>,
}

impl Flock {
    /// Scatters `count` agents uniformly over the cube `[-1, 1]^3` with each
    /// velocity component uniform in `[-min_speed, min_speed]`.
    pub fn initialize(count: usize, seed: u64, min_speed: f64) -> Result<Self, FlockError> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        Self::populate(count, min_speed, &mut rng)
    }

    pub fn populate<R: Rng>(count: usize, min_speed: f64, rng: &mut R) -> Result<Self, FlockError> {
        let count = validate_agent_count(count)?;
        let mut flock = Self::zeroed(count);

        for i in 0..count {
            flock.pos_x[i] = unit_span(rng);
            flock.pos_y[i] = unit_span(rng);
            flock.pos_z[i] = unit_span(rng);
        }

        for i in 0..count {
            flock.vel_x[i] = unit_span(rng) * min_speed;
            flock.vel_y[i] = unit_span(rng) * min_speed;
            flock.vel_z[i] = unit_span(rng) * min_speed;
        }

        Ok(flock)
    }

    pub fn from_agents(agents: &[Agent]) -> Result<Self, FlockError> {
        let count = validate_agent_count(agents.len())?;
        let mut flock = Self::zeroed(count);

        for (i, agent) in agents.iter().enumerate() {
            [flock.pos_x[i], flock.pos_y[i], flock.pos_z[i]] = agent.position;
            [flock.vel_x[i], flock.vel_y[i], flock.vel_z[i]] = agent.velocity;
        }

        Ok(flock)
    }

    fn zeroed(count: usize) -> Self {
        Self {
            pos_x: vec![0.0; count],
            pos_y: vec![0.0; count],
            pos_z: vec![0.0; count],
            vel_x: vec![0.0; count],
            vel_y: vec![0.0; count],
            vel_z: vec![0.0; count],
            distance: vec![f64::INFINITY; count],
            angle: vec![f64::INFINITY; count],
        }
    }

    pub fn len(&self) -> usize {
        self.pos_x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pos_x.is_empty()
    }

    pub fn agent(&self, i: usize) -> Option<Agent> {
        if i >= self.len() {
            return None;
        }

        Some(Agent {
            position: [self.pos_x[i], self.pos_y[i], self.pos_z[i]],
            velocity: [self.vel_x[i], self.vel_y[i], self.vel_z[i]],
        })
    }

    pub fn agents(&self) -> impl Iterator<Item = Agent> + '_ {
        (0..self.len()).filter_map(move |i| self.agent(i))
    }

    /// Advances every agent by one unit time step.
    ///
    /// Agents are updated in place in index order, so agent `i` already sees
    /// the new position and velocity of every agent before it.
    pub fn step(&mut self, params: &Params) -> StepStats {
        let mut stats = StepStats::default();

        for i in 0..self.len() {
            self.measure_neighbors(i);
            let steering = self.steer(i, params);
            stats.cohesion_neighbors += steering.cohesion_count;
            stats.separation_neighbors += steering.separation_count;
            stats.alignment_neighbors += steering.alignment_count;

            let px = self.pos_x[i];
            let py = self.pos_y[i];
            let pz = self.pos_z[i];

            let mut vx = self.vel_x[i];
            let mut vy = self.vel_y[i];
            let mut vz = self.vel_z[i];

            vx += params.cohesion_force * steering.cohesion.0;
            vy += params.cohesion_force * steering.cohesion.1;
            vz += params.cohesion_force * steering.cohesion.2;
            vx += params.separation_force * steering.separation.0;
            vy += params.separation_force * steering.separation.1;
            vz += params.separation_force * steering.separation.2;
            vx += params.alignment_force * steering.alignment.0;
            vy += params.alignment_force * steering.alignment.1;
            vz += params.alignment_force * steering.alignment.2;

            let dist_center = math::length_3d(px, py, pz);
            if dist_center > BOUNDARY_RADIUS {
                let excess = dist_center - BOUNDARY_RADIUS;
                vx -= params.boundary_force * px * excess / dist_center;
                vy -= params.boundary_force * py * excess / dist_center;
                vz -= params.boundary_force * pz * excess / dist_center;
                stats.outside_boundary += 1;
            }

            // Exactly zero velocity has no direction to rescale and stays put.
            let speed = math::length_3d(vx, vy, vz);
            if speed > 0.0 && speed < params.min_speed {
                (vx, vy, vz) = math::rescale_to_magnitude(vx, vy, vz, params.min_speed);
                stats.speed_clamped += 1;
            } else if speed > params.max_speed {
                (vx, vy, vz) = math::rescale_to_magnitude(vx, vy, vz, params.max_speed);
                stats.speed_clamped += 1;
            }

            self.vel_x[i] = vx;
            self.vel_y[i] = vy;
            self.vel_z[i] = vz;
            self.pos_x[i] = px + vx;
            self.pos_y[i] = py + vy;
            self.pos_z[i] = pz + vz;
        }

        log::trace!("flock step over {} agents: {stats:?}", self.len());
        stats
    }

    fn measure_neighbors(&mut self, i: usize) {
        let px = self.pos_x[i];
        let py = self.pos_y[i];
        let pz = self.pos_z[i];
        let heading = (self.vel_x[i], self.vel_y[i], self.vel_z[i]);
        let heading_len = math::length_3d(heading.0, heading.1, heading.2);

        for j in 0..self.len() {
            if j == i {
                self.distance[j] = f64::INFINITY;
                self.angle[j] = f64::INFINITY;
                continue;
            }

            let dx = self.pos_x[j] - px;
            let dy = self.pos_y[j] - py;
            let dz = self.pos_z[j] - pz;
            let dist = math::distance_3d(dx, dy, dz);

            self.distance[j] = dist;
            self.angle[j] = math::heading_angle(heading, heading_len, dx, dy, dz, dist);
        }
    }

    fn steer(&self, i: usize, params: &Params) -> Steering {
        let px = self.pos_x[i];
        let py = self.pos_y[i];
        let pz = self.pos_z[i];
        let mut steering = Steering::default();

        for j in 0..self.len() {
            let dist = self.distance[j];
            let angle = self.angle[j];

            if dist < params.cohesion_distance && angle < params.cohesion_angle {
                steering.cohesion.0 += self.pos_x[j];
                steering.cohesion.1 += self.pos_y[j];
                steering.cohesion.2 += self.pos_z[j];
                steering.cohesion_count += 1;
            }

            if dist < params.separation_distance && angle < params.separation_angle {
                steering.separation.0 += px - self.pos_x[j];
                steering.separation.1 += py - self.pos_y[j];
                steering.separation.2 += pz - self.pos_z[j];
                steering.separation_count += 1;
            }

            if dist < params.alignment_distance && angle < params.alignment_angle {
                steering.alignment.0 += self.pos_x[j];
                steering.alignment.1 += self.pos_y[j];
                steering.alignment.2 += self.pos_z[j];
                steering.alignment_count += 1;
            }
        }

        steering.cohesion =
            offset_from_centroid(steering.cohesion, steering.cohesion_count, px, py, pz);
        steering.alignment =
            offset_from_centroid(steering.alignment, steering.alignment_count, px, py, pz);
        steering
    }
}

fn offset_from_centroid(
    sum: (f64, f64, f64),
    count: usize,
    px: f64,
    py: f64,
    pz: f64,
) -> (f64, f64, f64) {
    if count == 0 {
        return (0.0, 0.0, 0.0);
    }

    let n = count as f64;
    (sum.0 / n - px, sum.1 / n - py, sum.2 / n - pz)
}

fn unit_span<R: Rng>(rng: &mut R) -> f64 {
    rng.random::<f64>() * 2.0 - 1.0
}

#[cfg(test)]
mod tests {
    use super::{Agent, Flock, Steering};
    use crate::error::FlockError;
    use crate::params::{Params, AGENT_CAPACITY};

    const EPS: f64 = 1e-12;

    fn cohesion_only() -> Params {
        Params {
            cohesion_distance: 0.5,
            cohesion_force: 0.008,
            separation_force: 0.0,
            alignment_force: 0.0,
            boundary_force: 0.0,
            ..Params::default()
        }
    }

    fn approaching_pair() -> Flock {
        Flock::from_agents(&[
            Agent {
                position: [0.0, 0.0, 0.0],
                velocity: [0.01, 0.0, 0.0],
            },
            Agent {
                position: [0.03, 0.0, 0.0],
                velocity: [-0.01, 0.0, 0.0],
            },
        ])
        .expect("pair fits")
    }

    #[test]
    fn initialize_scatters_inside_the_unit_cube() {
        let params = Params::default();
        let flock = Flock::initialize(300, 11, params.min_speed).expect("valid count");

        assert_eq!(flock.len(), 300);
        for agent in flock.agents() {
            for k in 0..3 {
                assert!((-1.0..=1.0).contains(&agent.position[k]));
                assert!(agent.velocity[k].abs() <= params.min_speed);
            }
        }
    }

    #[test]
    fn initialize_rejects_bad_counts() {
        assert_eq!(Flock::initialize(0, 1, 0.005).err(), Some(FlockError::EmptyFlock));
        assert_eq!(
            Flock::initialize(AGENT_CAPACITY + 1, 1, 0.005).err(),
            Some(FlockError::CapacityExceeded {
                requested: AGENT_CAPACITY + 1,
                capacity: AGENT_CAPACITY,
            })
        );
    }

    #[test]
    fn speed_stays_within_limits() {
        let params = Params::default();
        let mut flock = Flock::initialize(200, 42, params.min_speed).expect("valid count");

        for _ in 0..200 {
            flock.step(&params);
            for agent in flock.agents() {
                let speed = agent.speed();
                assert!(speed >= params.min_speed - EPS, "speed {speed} below floor");
                assert!(speed <= params.max_speed + EPS, "speed {speed} above ceiling");
            }
        }
    }

    #[test]
    fn lone_agent_never_steers_toward_itself() {
        let params = Params::default();
        let mut flock = Flock::initialize(1, 3, params.min_speed).expect("valid count");

        for _ in 0..100 {
            flock.measure_neighbors(0);
            assert_eq!(flock.steer(0, &params), Steering::default());

            let stats = flock.step(&params);
            assert_eq!(stats.cohesion_neighbors, 0);
            assert_eq!(stats.separation_neighbors, 0);
            assert_eq!(stats.alignment_neighbors, 0);
        }
    }

    #[test]
    fn lone_agent_outside_sphere_heads_back_in() {
        let params = Params {
            cohesion_force: 0.0,
            separation_force: 0.0,
            alignment_force: 0.0,
            boundary_force: 0.01,
            ..Params::default()
        };
        let mut flock = Flock::from_agents(&[Agent {
            position: [2.0, 0.0, 0.0],
            velocity: [0.0, 0.0, 0.0],
        }])
        .expect("single agent");

        flock.step(&params);
        let first = flock.agent(0).expect("agent 0");
        // 0.01 * 2 * (2 - 1) / 2, pointing back at the origin.
        assert!((first.velocity[0] + 0.01).abs() < EPS);
        assert_eq!(first.velocity[1], 0.0);
        assert_eq!(first.velocity[2], 0.0);
        assert!((first.position[0] - 1.99).abs() < EPS);

        let mut previous = first.distance_from_origin();
        let mut steps = 1;
        while previous > 1.0 {
            flock.step(&params);
            let current = flock.agent(0).expect("agent 0").distance_from_origin();
            assert!(current < previous, "moved outward: {previous} -> {current}");
            previous = current;
            steps += 1;
            assert!(steps < 1_000, "never reached the unit sphere");
        }

        for _ in 0..2_000 {
            flock.step(&params);
            assert!(flock.agent(0).expect("agent 0").distance_from_origin() < 2.0);
        }
    }

    #[test]
    fn approaching_pair_pulls_toward_midpoint() {
        let mut flock = approaching_pair();
        let stats = flock.step(&cohesion_only());

        let first = flock.agent(0).expect("agent 0");
        let second = flock.agent(1).expect("agent 1");
        assert_eq!(stats.cohesion_neighbors, 2);
        assert!(first.velocity[0] > 0.01);
        assert!(second.velocity[0] < -0.01);
        assert_eq!(first.velocity[1], 0.0);
        assert_eq!(second.velocity[2], 0.0);
    }

    #[test]
    fn later_agents_see_earlier_updates_in_the_same_step() {
        let mut flock = approaching_pair();
        let params = cohesion_only();
        flock.step(&params);

        let moved_first = flock.agent(0).expect("agent 0").position[0];
        let expected = -0.01 + params.cohesion_force * (moved_first - 0.03);
        let from_snapshot = -0.01 + params.cohesion_force * (0.0 - 0.03);
        let second = flock.agent(1).expect("agent 1").velocity[0];

        assert!((second - expected).abs() < EPS);
        assert!((second - from_snapshot).abs() > 1e-6);
    }

    #[test]
    fn agent_behind_is_outside_the_view_cone() {
        let mut flock = Flock::from_agents(&[
            Agent {
                position: [0.0, 0.0, 0.0],
                velocity: [0.01, 0.0, 0.0],
            },
            Agent {
                position: [-0.03, 0.0, 0.0],
                velocity: [0.01, 0.0, 0.0],
            },
        ])
        .expect("pair fits");

        flock.measure_neighbors(0);
        let steering = flock.steer(0, &Params::default());

        assert_eq!(steering.cohesion_count, 0);
        assert_eq!(steering.separation_count, 0);
        assert_eq!(steering.alignment_count, 0);
    }

    fn cone_trio() -> Flock {
        let off_axis = 1.2_f64;
        Flock::from_agents(&[
            Agent {
                position: [0.0, 0.0, 0.0],
                velocity: [0.01, 0.0, 0.0],
            },
            Agent {
                position: [0.07 * off_axis.cos(), 0.07 * off_axis.sin(), 0.0],
                velocity: [0.0, 0.0, 0.0],
            },
            Agent {
                position: [0.06, 0.0, 0.0],
                velocity: [0.0, 0.0, 0.0],
            },
        ])
        .expect("trio fits")
    }

    #[test]
    fn alignment_cone_is_narrower_than_cohesion_cone() {
        let mut flock = cone_trio();

        flock.measure_neighbors(0);
        let steering = flock.steer(0, &Params::default());

        assert_eq!(steering.cohesion_count, 2);
        assert_eq!(steering.alignment_count, 1);
        assert_eq!(steering.separation_count, 0);
        assert!((steering.alignment.0 - 0.06).abs() < EPS);
        assert!(steering.alignment.1.abs() < EPS);
        assert!(steering.alignment.2.abs() < EPS);
    }

    #[test]
    fn alignment_force_reaches_velocity() {
        let params = Params {
            cohesion_force: 0.0,
            separation_force: 0.0,
            alignment_force: 0.06,
            boundary_force: 0.0,
            ..Params::default()
        };
        let mut flock = cone_trio();

        let stats = flock.step(&params);
        let first = flock.agent(0).expect("agent 0");

        assert!(stats.alignment_neighbors >= 1);
        assert!((first.velocity[0] - (0.01 + 0.06 * 0.06)).abs() < EPS);
        assert!(first.velocity[1].abs() < EPS);
    }

    #[test]
    fn separation_force_reaches_velocity() {
        let params = Params {
            cohesion_force: 0.0,
            separation_force: 0.4,
            alignment_force: 0.0,
            boundary_force: 0.0,
            ..Params::default()
        };
        let mut flock = approaching_pair();

        flock.step(&params);
        let first = flock.agent(0).expect("agent 0");

        // 0.01 + 0.4 * -0.03 reverses the heading; the floor then sets its length.
        assert!((first.velocity[0] + params.min_speed).abs() < EPS);
        assert_eq!(first.velocity[1], 0.0);
    }

    #[test]
    fn separation_is_summed_not_averaged() {
        let mut flock = Flock::from_agents(&[
            Agent {
                position: [0.0, 0.0, 0.0],
                velocity: [0.01, 0.0, 0.0],
            },
            Agent {
                position: [0.01, 0.01, 0.0],
                velocity: [0.0, 0.0, 0.0],
            },
            Agent {
                position: [0.01, -0.01, 0.0],
                velocity: [0.0, 0.0, 0.0],
            },
        ])
        .expect("trio fits");

        flock.measure_neighbors(0);
        let steering = flock.steer(0, &Params::default());

        assert_eq!(steering.separation_count, 2);
        assert!((steering.separation.0 + 0.02).abs() < EPS);
        assert!(steering.separation.1.abs() < EPS);
    }

    #[test]
    fn degenerate_geometry_stays_finite() {
        let mut flock = Flock::from_agents(&[
            Agent {
                position: [0.2, 0.2, 0.2],
                velocity: [0.0, 0.0, 0.0],
            },
            Agent {
                position: [0.2, 0.2, 0.2],
                velocity: [0.01, 0.0, 0.0],
            },
        ])
        .expect("pair fits");

        for _ in 0..10 {
            flock.step(&Params::default());
        }

        for agent in flock.agents() {
            assert!(agent.position.iter().all(|c| c.is_finite()));
            assert!(agent.velocity.iter().all(|c| c.is_finite()));
        }
    }

    #[test]
    fn zero_velocity_is_not_rescaled() {
        let params = Params {
            cohesion_force: 0.0,
            separation_force: 0.0,
            alignment_force: 0.0,
            ..Params::default()
        };
        let mut flock = Flock::from_agents(&[Agent {
            position: [0.5, 0.0, 0.0],
            velocity: [0.0, 0.0, 0.0],
        }])
        .expect("single agent");

        let stats = flock.step(&params);
        let agent = flock.agent(0).expect("agent 0");

        assert_eq!(stats.speed_clamped, 0);
        assert_eq!(agent.velocity, [0.0, 0.0, 0.0]);
        assert_eq!(agent.position, [0.5, 0.0, 0.0]);
    }

    #[test]
    fn same_seed_gives_bit_identical_runs() {
        let params = Params::default();
        let mut a = Flock::initialize(64, 99, params.min_speed).expect("valid count");
        let mut b = Flock::initialize(64, 99, params.min_speed).expect("valid count");

        for _ in 0..150 {
            a.step(&params);
            b.step(&params);
        }

        for (left, right) in a.agents().zip(b.agents()) {
            for k in 0..3 {
                assert_eq!(left.position[k].to_bits(), right.position[k].to_bits());
                assert_eq!(left.velocity[k].to_bits(), right.velocity[k].to_bits());
            }
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let a = Flock::initialize(8, 1, 0.005).expect("valid count");
        let b = Flock::initialize(8, 2, 0.005).expect("valid count");

        assert!(a.agents().zip(b.agents()).any(|(l, r)| l != r));
    }
}
