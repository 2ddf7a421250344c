//! Rock-paper-scissors swarm: three cyclic kinds of agents chase their prey,
//! flee their predators and flock with their own kind on a bounded plane,
//! converting on contact until one kind remains or time runs out.

pub mod agent;
pub mod collision;
pub mod config;
pub mod error;
pub mod forces;
pub mod plugin;
pub mod simulation;
pub mod spatial;

pub use agent::{Agent, Kind};
pub use config::SimConfig;
pub use error::SimError;
pub use simulation::{initialize, snapshot, step, AgentView, SimulationState, TickOutcome};
