//! Formation phase sequencing
//!
//! Phases advance in a fixed order, each gated on a minimum duration and on
//! swarm-wide convergence: the *maximum* per-agent distance to target must
//! drop below the convergence threshold, not just an average.

use core::fmt;

use serde::{Deserialize, Serialize};

/// One phase of the formation show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormationPhase {
    /// Initial state display, agents parked on the ground grid
    Prepare,
    /// Aerial reference stations climb to operating altitude
    StationsTakeoff,
    /// Ground formation hold
    Ground,
    /// Cube lattice formation
    Cube,
    /// Golden-spiral sphere formation
    Sphere,
    /// Layered pyramid formation
    Pyramid,
    /// Double-helix formation
    Helix,
    /// Agents descend back to the ground grid
    Landing,
    /// Aerial reference stations descend
    StationsLanding,
    /// Final state confirmation; terminal
    Exit,
}

impl FormationPhase {
    /// The fixed phase order
    pub const SEQUENCE: [FormationPhase; 10] = [
        FormationPhase::Prepare,
        FormationPhase::StationsTakeoff,
        FormationPhase::Ground,
        FormationPhase::Cube,
        FormationPhase::Sphere,
        FormationPhase::Pyramid,
        FormationPhase::Helix,
        FormationPhase::Landing,
        FormationPhase::StationsLanding,
        FormationPhase::Exit,
    ];

    /// Minimum time to spend in this phase (seconds)
    pub fn min_duration(&self) -> f32 {
        match self {
            FormationPhase::Prepare => 3.0,
            FormationPhase::StationsTakeoff => 8.0,
            FormationPhase::Ground => 6.0,
            FormationPhase::Cube => 14.0,
            FormationPhase::Sphere => 15.0,
            FormationPhase::Pyramid => 22.0,
            FormationPhase::Helix => 16.0,
            FormationPhase::Landing => 20.0,
            FormationPhase::StationsLanding => 12.0,
            FormationPhase::Exit => 3.0,
        }
    }

    /// The phase that follows this one, if any
    pub fn next(&self) -> Option<FormationPhase> {
        let index = Self::SEQUENCE.iter().position(|p| p == self)?;
        Self::SEQUENCE.get(index + 1).copied()
    }

    /// Whether this phase moves the aerial reference stations
    pub fn is_station_phase(&self) -> bool {
        matches!(
            self,
            FormationPhase::StationsTakeoff | FormationPhase::StationsLanding
        )
    }

    /// Whether agent targets in this phase are the parked ground grid
    pub fn uses_ground_cloud(&self) -> bool {
        matches!(
            self,
            FormationPhase::Prepare
                | FormationPhase::StationsTakeoff
                | FormationPhase::Ground
                | FormationPhase::Landing
                | FormationPhase::StationsLanding
                | FormationPhase::Exit
        )
    }
}

impl fmt::Display for FormationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FormationPhase::Prepare => "prepare",
            FormationPhase::StationsTakeoff => "stations-takeoff",
            FormationPhase::Ground => "ground",
            FormationPhase::Cube => "cube",
            FormationPhase::Sphere => "sphere",
            FormationPhase::Pyramid => "pyramid",
            FormationPhase::Helix => "helix",
            FormationPhase::Landing => "landing",
            FormationPhase::StationsLanding => "stations-landing",
            FormationPhase::Exit => "exit",
        };
        write!(f, "{name}")
    }
}

/// Sequences formation phases with convergence gating
#[derive(Debug, Clone)]
pub struct FormationStateMachine {
    current: FormationPhase,
    elapsed: f32,
    /// Station takeoff targets already assigned this phase
    takeoff_targets_set: bool,
    /// Station landing targets already assigned this phase
    landing_targets_set: bool,
}

impl FormationStateMachine {
    /// Create a state machine at the start of the sequence
    pub fn new() -> Self {
        Self {
            current: FormationPhase::SEQUENCE[0],
            elapsed: 0.0,
            takeoff_targets_set: false,
            landing_targets_set: false,
        }
    }

    /// The active phase
    pub fn current(&self) -> FormationPhase {
        self.current
    }

    /// Time spent in the active phase (seconds)
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Advance simulated time and transition when the gate opens
    ///
    /// The gate requires both the minimum phase duration and swarm-wide
    /// convergence (`max_distance_to_target < convergence_threshold`).
    /// Returns the new phase on a transition. The terminal phase never
    /// auto-advances.
    pub fn advance(
        &mut self,
        dt: f32,
        max_distance_to_target: f32,
        convergence_threshold: f32,
    ) -> Option<FormationPhase> {
        self.elapsed += dt;

        if self.elapsed < self.current.min_duration() {
            return None;
        }
        if max_distance_to_target >= convergence_threshold {
            return None;
        }
        let next = self.current.next()?;
        let previous = self.current;
        self.enter(next);
        log::info!("completed phase {previous}, transitioning to {next}");
        Some(next)
    }

    /// Force a transition to the given phase
    pub fn request(&mut self, phase: FormationPhase) {
        log::info!("phase {phase} requested (was {})", self.current);
        self.enter(phase);
    }

    fn enter(&mut self, phase: FormationPhase) {
        self.current = phase;
        self.elapsed = 0.0;
        // Phase-scoped transients never survive a transition
        self.takeoff_targets_set = false;
        self.landing_targets_set = false;
    }

    /// Whether station takeoff targets were already computed this phase
    pub fn takeoff_targets_set(&self) -> bool {
        self.takeoff_targets_set
    }

    /// Record that station takeoff targets were computed
    pub fn mark_takeoff_targets_set(&mut self) {
        self.takeoff_targets_set = true;
    }

    /// Whether station landing targets were already computed this phase
    pub fn landing_targets_set(&self) -> bool {
        self.landing_targets_set
    }

    /// Record that station landing targets were computed
    pub fn mark_landing_targets_set(&mut self) {
        self.landing_targets_set = true;
    }
}

impl Default for FormationStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
