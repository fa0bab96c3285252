//! Per-agent control: kinematics, collision avoidance, target assignment,
//! and the formation phase state machine

pub mod agent;
pub mod assignment;
pub mod avoidance;
pub mod state_machine;

pub use agent::Agent;
pub use assignment::TargetAssigner;
pub use avoidance::{AvoidanceConfig, CollisionAvoidance};
pub use state_machine::{FormationPhase, FormationStateMachine};
