//! Per-agent kinematic integrator
//!
//! An agent is either `approaching` its target or `converged` on it.
//! Converged agents hold position exactly with zero velocity until a new
//! target is set. Approaching agents follow a speed profile that cruises
//! far from the target and decelerates smoothly inside the deceleration
//! band, with the avoidance velocity blended in before the limits apply.

use serde::{Deserialize, Serialize};

use crate::system::FormationConfig;
use crate::types::{AgentId, AgentSnapshot, Position, Velocity, GROUND_EPSILON};

/// A single swarm member
///
/// Created once at swarm initialization, mutated every tick by the
/// integrator, never destroyed mid-run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    /// Stable identifier
    pub id: AgentId,
    /// Current position
    pub position: Position,
    /// Current velocity
    pub velocity: Velocity,
    /// Target position
    pub target: Position,
}

impl Agent {
    /// Create an agent at rest with its target at its own position
    pub fn new(id: AgentId, position: Position) -> Self {
        Self {
            id,
            position,
            velocity: Velocity::ZERO,
            target: position,
        }
    }

    /// Whether the agent is on the ground, derived from altitude
    pub fn grounded(&self) -> bool {
        self.position.z < GROUND_EPSILON
    }

    /// Distance to the current target
    pub fn distance_to_target(&self) -> f32 {
        self.position.distance_to(&self.target)
    }

    /// Whether the agent has arrived at its target
    pub fn is_converged(&self, threshold: f32) -> bool {
        self.distance_to_target() <= threshold
    }

    /// Set a new target, re-arming the integrator if it was converged
    pub fn set_target(&mut self, target: Position) {
        self.target = target;
    }

    /// Immutable view used by the per-tick snapshot
    pub fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            id: self.id,
            position: self.position,
            velocity: self.velocity,
        }
    }

    /// Advance one tick toward `target` with the given avoidance velocity
    pub fn advance(
        &mut self,
        target: Position,
        avoidance: Velocity,
        config: &FormationConfig,
        dt: f32,
    ) {
        self.target = target;
        let (position, velocity) =
            integrate(&self.snapshot(), &self.target, avoidance, config, dt);
        self.position = position;
        self.velocity = velocity;
    }

    /// Apply an integration result computed from a snapshot
    pub fn apply(&mut self, position: Position, velocity: Velocity) {
        self.position = position;
        self.velocity = velocity;
    }
}

/// Integrate one tick of agent motion from a snapshot
///
/// Pure with respect to shared state, so regions can run it concurrently.
/// Both kinematic bounds hold by construction: the desired velocity is
/// clamped to `max_speed` before the acceleration limit, and the
/// acceleration limit interpolates between two in-bounds velocities
/// against the logical `dt`.
pub fn integrate(
    agent: &AgentSnapshot,
    target: &Position,
    avoidance: Velocity,
    config: &FormationConfig,
    dt: f32,
) -> (Position, Velocity) {
    let delta = target.delta_from(&agent.position);
    let distance = libm::sqrtf(delta[0] * delta[0] + delta[1] * delta[1] + delta[2] * delta[2]);
    let in_threshold = distance <= config.convergence_threshold;

    // Converged: snap exactly onto the target and stop. Terminal until a
    // new target is installed. The snap implies a velocity change, so it
    // waits until that change fits inside the acceleration budget; a fast
    // crosser brakes first and snaps on a later tick.
    if in_threshold && agent.velocity.magnitude() <= config.max_acceleration * dt {
        return (*target, Velocity::ZERO);
    }

    let desired = if in_threshold {
        Velocity::ZERO
    } else {
        let speed = approach_speed(distance, config);
        let toward = Velocity::new(
            delta[0] / distance * speed,
            delta[1] / distance * speed,
            delta[2] / distance * speed,
        );
        toward.add(&avoidance).clamped(config.max_speed)
    };
    let mut velocity = limit_acceleration(&agent.velocity, &desired, config.max_acceleration, dt);

    // Optional exponential smoothing; a convex mix of old and new velocity,
    // so neither the speed bound nor the acceleration bound can be violated.
    if config.velocity_smoothing > 0.0 {
        let alpha = config.velocity_smoothing;
        velocity = agent
            .velocity
            .scaled(alpha)
            .add(&velocity.scaled(1.0 - alpha));
    }

    (agent.position.integrate(&velocity, dt), velocity)
}

/// Speed profile: cruise outside the deceleration band, smoothstep-shaped
/// deceleration inside it, floored at the minimum speed
fn approach_speed(distance: f32, config: &FormationConfig) -> f32 {
    if distance > config.deceleration_distance {
        return config.max_speed;
    }
    let t = (distance / config.deceleration_distance).clamp(0.0, 1.0);
    let smooth = t * t * (3.0 - 2.0 * t);
    (config.max_speed * smooth).max(config.min_speed)
}

/// Limit the velocity change rate to `max_acceleration` over the logical dt
fn limit_acceleration(
    current: &Velocity,
    desired: &Velocity,
    max_acceleration: f32,
    dt: f32,
) -> Velocity {
    let dvx = desired.vx - current.vx;
    let dvy = desired.vy - current.vy;
    let dvz = desired.vz - current.vz;
    let dv = libm::sqrtf(dvx * dvx + dvy * dvy + dvz * dvz);
    let max_dv = max_acceleration * dt;

    if dv <= max_dv || dv < 1e-6 {
        *desired
    } else {
        let scale = max_dv / dv;
        Velocity::new(
            current.vx + dvx * scale,
            current.vy + dvy * scale,
            current.vz + dvz * scale,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> FormationConfig {
        FormationConfig::test_config(8)
    }

    #[test]
    fn test_converged_agent_snaps_and_stops() {
        let config = config();
        let mut agent = Agent::new(AgentId::new(0), Position::new(10.0, 10.0, 5.0));
        agent.velocity = Velocity::new(0.05, 0.0, 0.0);
        let target = Position::new(10.1, 10.0, 5.0);

        agent.advance(target, Velocity::ZERO, &config, 0.05);

        assert_eq!(agent.position, target);
        assert_eq!(agent.velocity, Velocity::ZERO);
        assert!(agent.is_converged(config.convergence_threshold));
    }

    #[test]
    fn test_fast_crosser_brakes_before_snapping() {
        let config = config();
        let mut agent = Agent::new(AgentId::new(0), Position::new(10.0, 10.0, 5.0));
        agent.velocity = Velocity::new(3.0, 0.0, 0.0);
        let target = Position::new(10.1, 10.0, 5.0);

        // Crossing the threshold at 3 m/s cannot stop within one
        // acceleration budget; the first tick brakes instead of snapping
        agent.advance(target, Velocity::ZERO, &config, 0.05);
        assert!((agent.velocity.magnitude() - 2.5).abs() < 1e-3);

        // It settles onto the target within a few more ticks
        for _ in 0..40 {
            agent.advance(target, Velocity::ZERO, &config, 0.05);
        }
        assert_eq!(agent.position, target);
        assert_eq!(agent.velocity, Velocity::ZERO);
    }

    #[test]
    fn test_approach_moves_toward_target() {
        let config = config();
        let mut agent = Agent::new(AgentId::new(0), Position::new(0.0, 0.0, 0.0));
        let target = Position::new(10.0, 0.0, 0.0);

        for _ in 0..10 {
            agent.advance(target, Velocity::ZERO, &config, 0.05);
        }
        assert!(agent.position.x > 0.0);
        assert!(agent.velocity.vx > 0.0);
        assert!(agent.velocity.vy.abs() < 1e-5);
    }

    #[test]
    fn test_speed_never_exceeds_max() {
        let config = config();
        let mut agent = Agent::new(AgentId::new(0), Position::new(0.0, 0.0, 0.0));
        let target = Position::new(30.0, 30.0, 10.0);
        // A large lateral avoidance push must not break the speed bound
        let avoidance = Velocity::new(0.0, 4.0, 0.0);

        for _ in 0..200 {
            agent.advance(target, avoidance, &config, 0.05);
            assert!(agent.velocity.magnitude() <= config.max_speed + 1e-4);
        }
    }

    #[test]
    fn test_acceleration_bounded_by_logical_dt() {
        let config = config();
        let dt = 0.05;
        let mut agent = Agent::new(AgentId::new(0), Position::new(0.0, 0.0, 0.0));
        let target = Position::new(30.0, 0.0, 0.0);
        let mut previous = agent.velocity;

        for _ in 0..100 {
            agent.advance(target, Velocity::ZERO, &config, dt);
            let dv = Velocity::new(
                agent.velocity.vx - previous.vx,
                agent.velocity.vy - previous.vy,
                agent.velocity.vz - previous.vz,
            );
            assert!(dv.magnitude() / dt <= config.max_acceleration + 1e-3);
            previous = agent.velocity;
        }
    }

    #[test]
    fn test_deceleration_inside_band() {
        let config = config();
        let far = approach_speed(10.0, &config);
        let mid = approach_speed(1.0, &config);
        let near = approach_speed(0.2, &config);
        assert_eq!(far, config.max_speed);
        assert!(mid < far);
        assert!(near < mid);
        assert!(near >= config.min_speed);
    }

    #[test]
    fn test_grounded_derived_from_altitude() {
        let mut agent = Agent::new(AgentId::new(0), Position::new(0.0, 0.0, 0.0));
        assert!(agent.grounded());
        agent.position.z = 5.0;
        assert!(!agent.grounded());
    }

    #[test]
    fn test_new_target_rearms_converged_agent() {
        let config = config();
        let start = Position::new(5.0, 5.0, 0.0);
        let mut agent = Agent::new(AgentId::new(0), start);
        agent.advance(start, Velocity::ZERO, &config, 0.05);
        assert!(agent.is_converged(config.convergence_threshold));

        let new_target = Position::new(15.0, 5.0, 3.0);
        agent.advance(new_target, Velocity::ZERO, &config, 0.05);
        assert!(!agent.is_converged(config.convergence_threshold));
        assert!(agent.velocity.magnitude() > 0.0);
    }
}
