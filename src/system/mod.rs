//! System-level configuration for the formation engine

pub mod config;

pub use config::FormationConfig;
