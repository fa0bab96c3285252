//! Formation engine: the per-tick coordination loop
//!
//! Owns the swarm state and drives it with a logical (not wall-clock) time
//! step. Each tick snapshots the swarm, rebuilds the spatial grid,
//! partitions regions, fans region work out onto the worker pool, and
//! applies all results after the fan-in barrier. No region observes
//! another's output mid-tick, and no per-agent locking exists anywhere.

use std::time::Instant;

use rayon::prelude::*;

use crate::control::agent::{integrate, Agent};
use crate::control::avoidance::{AvoidanceConfig, CollisionAvoidance};
use crate::control::state_machine::{FormationPhase, FormationStateMachine};
use crate::control::TargetAssigner;
use crate::formations::{self, ground, PointCloud};
use crate::positioning::{PositioningSystem, ReferenceStation};
use crate::rng::SimRng;
use crate::spatial::{Region, RegionPartitioner, SpatialGrid};
use crate::system::FormationConfig;
use crate::types::{AgentId, AgentSnapshot, Position, Result, SwarmError, Velocity};

/// Target altitudes assigned to the aerial stations at takeoff (meters);
/// the center station flies highest
const STATION_TAKEOFF_ALTITUDES: [f32; 5] = [8.0, 8.0, 8.0, 15.0, 8.0];

/// Proportional gain of station movement toward its target (per second)
const STATION_APPROACH_RATE: f32 = 1.2;

/// Mutable simulation state owned by the tick loop
///
/// Passed by reference into each subsystem per tick; no subsystem retains
/// a handle across ticks.
#[derive(Debug)]
pub struct SwarmState {
    /// Agent arena, indexed by stable id order
    pub agents: Vec<Agent>,
    /// Active target cloud, always `num_agents` long
    pub target_cloud: PointCloud,
    /// Bijection from agent index to target cloud index
    pub assignment: Vec<usize>,
    /// Parked ground grid: launch layout and padding fallback
    pub ground_cloud: PointCloud,
    /// Accumulated simulated time (seconds)
    pub sim_time: f64,
}

/// Per-run counters and per-tick flags
#[derive(Debug, Clone, Default)]
pub struct TickStats {
    /// Ticks completed
    pub ticks: u64,
    /// Ticks whose computation outlasted the logical dt
    pub overruns: u64,
    /// Agents excluded from the last tick's region processing
    pub out_of_bounds: Vec<AgentId>,
}

/// Result of one region's parallel work, applied after the barrier
struct RegionUpdate {
    /// (agent index, new target cloud index)
    assignments: Vec<(usize, usize)>,
    /// (agent index, new position, new velocity)
    motions: Vec<(usize, Position, Velocity)>,
}

/// The formation control engine
pub struct FormationEngine {
    config: FormationConfig,
    state: SwarmState,
    state_machine: FormationStateMachine,
    positioning: PositioningSystem,
    grid: SpatialGrid,
    partitioner: RegionPartitioner,
    avoidance: CollisionAvoidance,
    assigner: TargetAssigner,
    pool: rayon::ThreadPool,
    rng: SimRng,
    stats: TickStats,
}

impl FormationEngine {
    /// Build an engine from a validated configuration
    ///
    /// Configuration problems are fatal here, before any tick runs.
    pub fn new(config: FormationConfig) -> Result<Self> {
        config.validate()?;

        let world = config.world_size;
        let ground_cloud = ground::parked_grid(
            config.num_agents,
            world * 0.2,
            world * 0.2,
            config.ground_spacing,
        );

        let agents: Vec<Agent> = ground_cloud
            .points()
            .iter()
            .enumerate()
            .map(|(i, &p)| Agent::new(AgentId::new(i as u32), p))
            .collect();

        let mut rng = SimRng::new(config.rng_seed);
        let ground_station =
            ReferenceStation::ground(Position::new(world * 0.8, world * 0.8, 0.0));
        let aerial = vec![
            ReferenceStation::aerial(0, Position::new(world * 0.2, world * 0.2, 0.0), &mut rng),
            ReferenceStation::aerial(1, Position::new(world * 0.8, world * 0.2, 0.0), &mut rng),
            ReferenceStation::aerial(2, Position::new(world * 0.2, world * 0.8, 0.0), &mut rng),
            ReferenceStation::aerial(3, Position::new(world * 0.5, world * 0.5, 0.0), &mut rng),
            ReferenceStation::aerial(4, Position::new(world * 0.8, world * 0.8, 0.0), &mut rng),
        ];
        let positioning = PositioningSystem::new(
            ground_station,
            aerial,
            config.sync_interval,
            SimRng::new(config.rng_seed.wrapping_add(1)),
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .build()
            .map_err(|_| SwarmError::ConfigError)?;

        let avoidance = CollisionAvoidance::new(AvoidanceConfig {
            min_distance: config.min_distance,
            avoid_gain: config.avoid_gain,
            max_speed: config.max_speed,
            prediction_horizon: config.prediction_horizon,
            boundary_margin: config.boundary_margin,
            boundary_gain: config.boundary_gain,
            world_size: config.world_size,
        });

        let state = SwarmState {
            assignment: (0..config.num_agents).collect(),
            target_cloud: ground_cloud.clone(),
            ground_cloud,
            agents,
            sim_time: 0.0,
        };

        Ok(Self {
            grid: SpatialGrid::new(config.cell_size),
            partitioner: RegionPartitioner::new(
                config.region_size,
                config.world_size,
                config.max_agents_per_region,
            ),
            avoidance,
            assigner: TargetAssigner::new(),
            pool,
            rng,
            stats: TickStats::default(),
            state_machine: FormationStateMachine::new(),
            positioning,
            config,
            state,
        })
    }

    /// Advance the whole system by one logical time step
    pub fn tick(&mut self, dt: f32) -> Result<()> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(SwarmError::InvalidParameter);
        }
        let started = Instant::now();
        self.state.sim_time += dt as f64;

        self.update_stations(dt);
        self.positioning.update(self.state.sim_time);

        // Snapshot once; every region reads this view and nothing else.
        let snapshot: Vec<AgentSnapshot> =
            self.state.agents.iter().map(Agent::snapshot).collect();
        self.grid.rebuild(&snapshot);

        let partition = self.partitioner.partition(&snapshot);
        if !partition.out_of_bounds.is_empty()
            && partition.out_of_bounds != self.stats.out_of_bounds
        {
            log::warn!(
                "{} agents out of world bounds this tick: {:?}",
                partition.out_of_bounds.len(),
                partition.out_of_bounds
            );
        }
        self.stats.out_of_bounds = partition.out_of_bounds.clone();

        // Fan out per-region work; the collect is the fan-in barrier.
        let engine = &*self;
        let updates: Vec<RegionUpdate> = self.pool.install(|| {
            partition
                .regions
                .par_iter()
                .map(|region| engine.process_region(region, &snapshot, dt))
                .collect()
        });

        // Apply all region results serially after the barrier.
        for update in updates {
            for (index, cloud_index) in update.assignments {
                self.state.assignment[index] = cloud_index;
            }
            for (index, position, velocity) in update.motions {
                let target = self.state.target_cloud.point(self.state.assignment[index]);
                self.state.agents[index].set_target(target);
                self.state.agents[index].apply(position, velocity);
            }
        }

        // Out-of-bounds agents fly solo toward their target so they can
        // re-enter the partition on a later tick.
        for id in self.stats.out_of_bounds.clone() {
            let index = id.as_u32() as usize;
            let target = self.state.target_cloud.point(self.state.assignment[index]);
            let agent = &mut self.state.agents[index];
            agent.advance(target, Velocity::ZERO, &self.config, dt);
        }

        self.advance_phase(dt);

        let elapsed = started.elapsed().as_secs_f32();
        if elapsed > dt {
            self.stats.overruns += 1;
            log::warn!(
                "tick {} overran its budget: {:.3} ms of work for dt = {:.3} ms",
                self.stats.ticks,
                elapsed * 1e3,
                dt * 1e3
            );
        }
        self.stats.ticks += 1;
        Ok(())
    }

    /// One region's work against the shared snapshot: refine the local
    /// assignment, then integrate every member
    fn process_region(
        &self,
        region: &Region,
        snapshot: &[AgentSnapshot],
        dt: f32,
    ) -> RegionUpdate {
        let threshold = self.config.convergence_threshold;

        // Only approaching agents take part in the local re-assignment;
        // converged agents hold their pairing until a new cloud arrives.
        let movable: Vec<usize> = region
            .agents
            .iter()
            .copied()
            .filter(|&index| {
                let target = self.state.target_cloud.point(self.state.assignment[index]);
                snapshot[index].position.distance_to(&target) > threshold
            })
            .collect();

        let mut assignments = Vec::new();
        if movable.len() > 1 {
            let held: Vec<usize> = movable
                .iter()
                .map(|&index| self.state.assignment[index])
                .collect();
            let permutation = self.assigner.solve(movable.len(), |i, j| {
                snapshot[movable[i]]
                    .position
                    .distance_to(&self.state.target_cloud.point(held[j]))
            });
            for (i, &j) in permutation.iter().enumerate() {
                assignments.push((movable[i], held[j]));
            }
        }

        // Integrate with the refined targets. Neighbor queries go to the
        // global snapshot grid, so boundary agents see across regions.
        let mut motions = Vec::with_capacity(region.agents.len());
        for &index in &region.agents {
            let agent = &snapshot[index];
            let cloud_index = assignments
                .iter()
                .find(|(i, _)| *i == index)
                .map(|(_, j)| *j)
                .unwrap_or(self.state.assignment[index]);
            let target = self.state.target_cloud.point(cloud_index);

            let neighbor_indices = self.grid.query_neighbors(
                index,
                &agent.position,
                self.config.neighbor_radius_cells,
            );
            let neighbors: Vec<AgentSnapshot> = neighbor_indices
                .iter()
                .map(|&i| snapshot[i])
                .collect();
            let avoid = self.avoidance.avoidance_velocity(agent, &neighbors);

            let (position, velocity) = integrate(agent, &target, avoid, &self.config, dt);
            motions.push((index, position, velocity));
        }

        RegionUpdate {
            assignments,
            motions,
        }
    }

    /// Move aerial stations during their takeoff and landing phases
    fn update_stations(&mut self, dt: f32) {
        match self.state_machine.current() {
            FormationPhase::StationsTakeoff => {
                if !self.state_machine.takeoff_targets_set() {
                    for (station, &altitude) in self
                        .positioning
                        .aerial_stations_mut()
                        .iter_mut()
                        .zip(STATION_TAKEOFF_ALTITUDES.iter())
                    {
                        let p = station.position();
                        station.set_target(Position::new(p.x, p.y, altitude));
                    }
                    self.state_machine.mark_takeoff_targets_set();
                }
                self.step_stations(dt);
            }
            FormationPhase::StationsLanding => {
                if !self.state_machine.landing_targets_set() {
                    for station in self.positioning.aerial_stations_mut() {
                        let p = station.position();
                        station.set_target(Position::new(p.x, p.y, 0.0));
                    }
                    self.state_machine.mark_landing_targets_set();
                }
                self.step_stations(dt);
            }
            _ => {}
        }
    }

    fn step_stations(&mut self, dt: f32) {
        let gain = (STATION_APPROACH_RATE * dt).min(1.0);
        for station in self.positioning.aerial_stations_mut() {
            station.step_toward_target(gain);
        }
    }

    /// Feed swarm convergence back into the state machine and install the
    /// next phase's targets on a transition
    fn advance_phase(&mut self, dt: f32) {
        let mut max_distance = self
            .state
            .agents
            .iter()
            .map(Agent::distance_to_target)
            .fold(0.0f32, f32::max);

        if self.state_machine.current().is_station_phase() {
            // Station phases also wait for the stations themselves
            let station_max = self
                .positioning
                .aerial_stations()
                .iter()
                .map(ReferenceStation::distance_to_target)
                .fold(0.0f32, f32::max);
            max_distance = max_distance.max(station_max);
        }

        if let Some(phase) =
            self.state_machine
                .advance(dt, max_distance, self.config.convergence_threshold)
        {
            self.install_phase_targets(phase);
        }
    }

    /// Install the target cloud for a phase, falling back to the ground
    /// formation when the generator fails
    fn install_phase_targets(&mut self, phase: FormationPhase) {
        let (center_x, center_y) = self.config.center();
        let cloud = if phase.uses_ground_cloud() {
            self.state.ground_cloud.clone()
        } else {
            match formations::generate(
                phase,
                self.config.num_agents,
                center_x,
                center_y,
                self.config.formation_spacing,
            ) {
                Ok(cloud) => cloud.normalized_to(
                    self.config.num_agents,
                    self.state.ground_cloud.points(),
                ),
                Err(error) => {
                    log::warn!(
                        "geometry generation for phase {phase} failed ({error}); \
                         falling back to the ground formation"
                    );
                    self.state.ground_cloud.clone()
                }
            }
        };
        self.install_cloud(cloud);
    }

    /// Install a target cloud with a full minimum-cost assignment
    ///
    /// The global solve runs only here, once per cloud change; the per-tick
    /// refinement stays region-local. Optimal matching at install is what
    /// keeps transit paths from crossing right after a phase switch.
    fn install_cloud(&mut self, cloud: PointCloud) {
        let positions: Vec<Position> = self
            .state
            .agents
            .iter()
            .map(|agent| agent.position)
            .collect();
        self.state.assignment = self
            .assigner
            .assign(&positions, cloud.points())
            .unwrap_or_else(|_| (0..self.config.num_agents).collect());
        for (index, agent) in self.state.agents.iter_mut().enumerate() {
            agent.set_target(cloud.point(self.state.assignment[index]));
        }
        self.state.target_cloud = cloud;
    }

    // ── Public interface ────────────────────────────────────────────────

    /// Current position of every agent, in id order
    pub fn get_agent_positions(&self) -> Vec<(AgentId, Position)> {
        self.state
            .agents
            .iter()
            .map(|agent| (agent.id, agent.position))
            .collect()
    }

    /// The active target cloud, in cloud order
    pub fn get_target_positions(&self) -> Vec<Position> {
        self.state.target_cloud.points().to_vec()
    }

    /// Install an explicit target cloud
    ///
    /// The cloud must match the swarm size exactly; the padding policy
    /// applies only to generator output, not to caller-provided targets.
    pub fn set_formation_targets(&mut self, points: &[Position]) -> Result<()> {
        if points.len() != self.config.num_agents {
            return Err(SwarmError::ConfigError);
        }
        self.install_cloud(PointCloud::new(points.to_vec()));
        Ok(())
    }

    /// Whether every agent has converged on its target
    pub fn is_formation_complete(&self) -> bool {
        self.state
            .agents
            .iter()
            .all(|agent| agent.is_converged(self.config.convergence_threshold))
    }

    /// Force a transition to the given phase and install its targets
    pub fn request_phase(&mut self, phase: FormationPhase) {
        self.state_machine.request(phase);
        self.install_phase_targets(phase);
    }

    /// The active formation phase
    pub fn current_phase(&self) -> FormationPhase {
        self.state_machine.current()
    }

    /// Run counters and last-tick flags
    pub fn stats(&self) -> &TickStats {
        &self.stats
    }

    /// The engine configuration
    pub fn config(&self) -> &FormationConfig {
        &self.config
    }

    /// The agent arena, in id order
    pub fn agents(&self) -> &[Agent] {
        &self.state.agents
    }

    /// Mutable access to one agent, for consumers layering extra dynamics
    pub fn agent_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.state.agents.get_mut(id.as_u32() as usize)
    }

    /// The positioning subsystem (stations, sync state)
    pub fn positioning(&self) -> &PositioningSystem {
        &self.positioning
    }

    /// TDOA measurements for an arbitrary position
    pub fn tdoa_positioning(&mut self, position: &Position) -> Vec<f64> {
        self.positioning.tdoa_positioning(position, &mut self.rng)
    }

    /// Elapsed simulated time (seconds)
    pub fn sim_time(&self) -> f64 {
        self.state.sim_time
    }
}
