//! Repulsive-velocity collision avoidance with boundary repulsion
//!
//! `avoidance_velocity` is a pure function over the tick snapshot: it never
//! mutates agent state, so regions can evaluate it concurrently against the
//! shared snapshot.

use crate::types::{AgentSnapshot, Velocity, DEGENERATE_DISTANCE, DEGENERATE_FALLBACK};

/// Weight of the instantaneous separation direction in the blend
const INSTANT_DIRECTION_WEIGHT: f32 = 0.7;

/// Weight of the predicted-future separation direction in the blend
const FUTURE_DIRECTION_WEIGHT: f32 = 0.3;

/// Extra repulsion applied to closing agents
const CLOSING_BOOST: f32 = 1.5;

/// Steepness of the exponential repulsion profile. The magnitude is mild
/// near the activation radius and overwhelming (clamped by the final speed
/// limit) in the inner tenth of the band, which is what actually holds the
/// separation floor against a full-speed closer.
const REPULSION_STEEPNESS: f32 = 20.0;

/// Configuration for collision avoidance
#[derive(Debug, Clone)]
pub struct AvoidanceConfig {
    /// Minimum separation distance between agents (meters)
    pub min_distance: f32,
    /// Repulsion gain (0.0-1.0)
    pub avoid_gain: f32,
    /// Maximum velocity magnitude (m/s)
    pub max_speed: f32,
    /// Look-ahead horizon for the future-position projection (seconds)
    pub prediction_horizon: f32,
    /// Width of the boundary repulsion band (meters)
    pub boundary_margin: f32,
    /// Gain of the boundary repulsion term (0.0-1.0)
    pub boundary_gain: f32,
    /// Side length of the world volume (meters)
    pub world_size: f32,
}

impl Default for AvoidanceConfig {
    fn default() -> Self {
        Self {
            min_distance: 1.5,
            avoid_gain: 0.5,
            max_speed: 5.0,
            prediction_horizon: 0.5,
            boundary_margin: 2.0,
            boundary_gain: 1.0,
            world_size: 40.0,
        }
    }
}

/// Collision avoidance evaluator
#[derive(Debug, Clone)]
pub struct CollisionAvoidance {
    config: AvoidanceConfig,
}

impl CollisionAvoidance {
    /// Create an evaluator with the given configuration
    pub fn new(config: AvoidanceConfig) -> Self {
        Self { config }
    }

    /// Compute the repulsive velocity for one agent against its neighbors
    ///
    /// Sums per-neighbor repulsion for every neighbor closer than the
    /// minimum distance, adds the world-boundary term, and clamps only the
    /// final combined magnitude so the direction is never reversed.
    pub fn avoidance_velocity(
        &self,
        agent: &AgentSnapshot,
        neighbors: &[AgentSnapshot],
    ) -> Velocity {
        let mut total = Velocity::ZERO;

        for neighbor in neighbors {
            if let Some(contribution) = self.neighbor_repulsion(agent, neighbor) {
                total = total.add(&contribution);
            }
        }

        total = total.add(&self.boundary_repulsion(agent));
        total.clamped(self.config.max_speed)
    }

    /// Repulsion contribution from a single neighbor, if within range
    fn neighbor_repulsion(
        &self,
        agent: &AgentSnapshot,
        neighbor: &AgentSnapshot,
    ) -> Option<Velocity> {
        let mut sep = agent.position.delta_from(&neighbor.position);
        let mut distance = magnitude(&sep);
        if distance >= self.config.min_distance {
            return None;
        }

        // Exactly overlapping agents get a fixed small push so the
        // normalization below never divides by zero.
        if distance < DEGENERATE_DISTANCE {
            sep = DEGENERATE_FALLBACK;
            distance = magnitude(&sep);
        }
        let dir_now = [sep[0] / distance, sep[1] / distance, sep[2] / distance];

        // Project the separation forward along the relative velocity to see
        // where the neighbor will be relative to us shortly.
        let horizon = self.config.prediction_horizon;
        let rel_vel = [
            agent.velocity.vx - neighbor.velocity.vx,
            agent.velocity.vy - neighbor.velocity.vy,
            agent.velocity.vz - neighbor.velocity.vz,
        ];
        let future_sep = [
            sep[0] + rel_vel[0] * horizon,
            sep[1] + rel_vel[1] * horizon,
            sep[2] + rel_vel[2] * horizon,
        ];
        let future_distance = magnitude(&future_sep);
        let dir_future = if future_distance < DEGENERATE_DISTANCE {
            dir_now
        } else {
            [
                future_sep[0] / future_distance,
                future_sep[1] / future_distance,
                future_sep[2] / future_distance,
            ]
        };

        let blend = [
            INSTANT_DIRECTION_WEIGHT * dir_now[0] + FUTURE_DIRECTION_WEIGHT * dir_future[0],
            INSTANT_DIRECTION_WEIGHT * dir_now[1] + FUTURE_DIRECTION_WEIGHT * dir_future[1],
            INSTANT_DIRECTION_WEIGHT * dir_now[2] + FUTURE_DIRECTION_WEIGHT * dir_future[2],
        ];
        let blend_mag = magnitude(&blend);
        let direction = if blend_mag < DEGENERATE_DISTANCE {
            dir_now
        } else {
            [
                blend[0] / blend_mag,
                blend[1] / blend_mag,
                blend[2] / blend_mag,
            ]
        };

        // Repulsion grows exponentially as the gap shrinks; closing pairs
        // are pushed harder than separating ones.
        let penetration = 1.0 - distance / self.config.min_distance;
        let mut strength = self.config.avoid_gain
            * self.config.max_speed
            * (libm::expf(REPULSION_STEEPNESS * penetration) - 1.0);
        if future_distance < distance {
            strength *= CLOSING_BOOST;
        }

        Some(Velocity::new(
            direction[0] * strength,
            direction[1] * strength,
            direction[2] * strength,
        ))
    }

    /// Per-axis repulsion away from the world edges
    ///
    /// Proportional to penetration depth into the margin band. Applies to
    /// both x faces, both y faces, and the upper z face; the z floor stays
    /// free so grounded and landing agents can reach z = 0.
    fn boundary_repulsion(&self, agent: &AgentSnapshot) -> Velocity {
        let margin = self.config.boundary_margin;
        if margin <= 0.0 {
            return Velocity::ZERO;
        }
        let gain = self.config.boundary_gain * self.config.max_speed / margin;
        let world = self.config.world_size;
        let p = &agent.position;
        let mut v = Velocity::ZERO;

        if p.x < margin {
            v.vx += (margin - p.x) * gain;
        } else if p.x > world - margin {
            v.vx -= (p.x - (world - margin)) * gain;
        }
        if p.y < margin {
            v.vy += (margin - p.y) * gain;
        } else if p.y > world - margin {
            v.vy -= (p.y - (world - margin)) * gain;
        }
        if p.z > world - margin {
            v.vz -= (p.z - (world - margin)) * gain;
        }
        v
    }
}

fn magnitude(v: &[f32; 3]) -> f32 {
    libm::sqrtf(v[0] * v[0] + v[1] * v[1] + v[2] * v[2])
}
