use crate::agent::{Agent, Kind};
use crate::collision::CollisionResolver;
use crate::config::SimConfig;
use crate::error::SimError;
use crate::forces::{integrate, ForceModel};
use crate::spatial::SpatialIndex;
use bevy::math::DVec2;
use bevy::prelude::Resource;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::{debug, error, info};

/// Result of advancing one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Running,
    /// Every agent shares one kind. `kind` is `None` only for an empty population.
    DominanceWin { kind: Option<Kind>, count: usize },
    /// The tick budget ran out; reports the plurality kind.
    TimeLimitDraw { kind: Kind, count: usize },
}

impl TickOutcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TickOutcome::Running)
    }
}

/// Read-only view of one agent for rendering collaborators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentView {
    pub id: usize,
    pub kind: Kind,
    pub x: f64,
    pub y: f64,
}

/// Independent random streams used within one tick.
#[derive(Debug, Clone, Copy)]
enum Phase {
    Targeting = 1,
    Movement = 2,
    Contact = 3,
}

fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Each agent gets its own stream per tick and phase, so draws do not depend on
/// the order agents are visited in.
fn agent_rng(seed: u64, tick: u64, id: usize, phase: Phase) -> ChaCha8Rng {
    let key = splitmix64(splitmix64(splitmix64(seed ^ phase as u64) ^ tick) ^ id as u64);
    ChaCha8Rng::seed_from_u64(key)
}

/// The whole population plus the run's cross-tick state.
#[derive(Resource, Debug, Clone)]
pub struct SimulationState {
    config: SimConfig,
    seed: u64,
    agents: Vec<Agent>,
    tick: u64,
    outcome: TickOutcome,
}

impl SimulationState {
    /// Place `counts[k]` agents of each kind (Scissors, Rock, Paper, in that
    /// block order) at independent uniform positions inside the inset arena.
    pub fn initialize(counts: [usize; 3], config: SimConfig, seed: u64) -> Result<Self, SimError> {
        config.validate()?;

        let total: usize = counts.iter().sum();
        let r = config.agent_radius;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut agents = Vec::with_capacity(total);

        for (kind, &count) in Kind::ALL.iter().zip(counts.iter()) {
            for _ in 0..count {
                let x = rng.gen_range(r..config.width - r);
                let y = rng.gen_range(r..config.height - r);
                agents.push(Agent::new(agents.len(), *kind, DVec2::new(x, y)));
            }
        }

        info!(
            scissors = counts[0],
            rock = counts[1],
            paper = counts[2],
            seed,
            "initialized population"
        );

        Ok(Self {
            config,
            seed,
            agents,
            tick: 0,
            outcome: TickOutcome::Running,
        })
    }

    /// Build a state from explicit placements. Ids follow the given order.
    pub fn from_placements(
        placements: &[(Kind, DVec2)],
        config: SimConfig,
        seed: u64,
    ) -> Result<Self, SimError> {
        config.validate()?;

        let r = config.agent_radius;
        let mut agents = Vec::with_capacity(placements.len());
        for (id, &(kind, position)) in placements.iter().enumerate() {
            let inside = position.is_finite()
                && (r..=config.width - r).contains(&position.x)
                && (r..=config.height - r).contains(&position.y);
            if !inside {
                return Err(SimError::InvalidConfiguration(format!(
                    "agent {id} placed outside the arena at ({}, {})",
                    position.x, position.y
                )));
            }
            agents.push(Agent::new(id, kind, position));
        }

        Ok(Self {
            config,
            seed,
            agents,
            tick: 0,
            outcome: TickOutcome::Running,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn outcome(&self) -> TickOutcome {
        self.outcome
    }

    /// Agents per kind, indexed by `Kind::index`.
    pub fn counts(&self) -> [usize; 3] {
        let mut counts = [0; 3];
        for agent in &self.agents {
            counts[agent.kind.index()] += 1;
        }
        counts
    }

    /// Ordered `(id, kind, x, y)` view for display.
    pub fn snapshot(&self) -> Vec<AgentView> {
        self.agents
            .iter()
            .map(|agent| AgentView {
                id: agent.id,
                kind: agent.kind,
                x: agent.position.x,
                y: agent.position.y,
            })
            .collect()
    }

    /// Advance one tick. A terminal state is returned unchanged.
    ///
    /// Forces read the snapshot taken at the start of the tick. Contacts are
    /// tested on the complete set of moved positions, and the fresh buffer
    /// replaces the population only once the whole tick has succeeded.
    pub fn step(&mut self) -> Result<TickOutcome, SimError> {
        if self.outcome.is_terminal() {
            return Ok(self.outcome);
        }
        if self.agents.is_empty() {
            self.outcome = TickOutcome::DominanceWin {
                kind: None,
                count: 0,
            };
            info!("population is empty");
            return Ok(self.outcome);
        }

        let seed = self.seed;
        let tick = self.tick;
        let config = &self.config;
        let current = &self.agents;

        let index = SpatialIndex::build(current);
        let forces = ForceModel::new(config, current, &index);

        let targets: Vec<Option<usize>> = current
            .par_iter()
            .map(|agent| {
                let mut rng = agent_rng(seed, tick, agent.id, Phase::Targeting);
                forces.choose_target(agent, &mut rng)
            })
            .collect();

        let motion: Vec<(DVec2, DVec2)> = current
            .par_iter()
            .zip(targets.par_iter())
            .map(|(agent, &target)| {
                let mut rng = agent_rng(seed, tick, agent.id, Phase::Movement);
                let velocity = forces.velocity(agent, target, &mut rng);
                integrate(agent.position, velocity, config)
            })
            .collect();

        let moved: Vec<DVec2> = motion.iter().map(|&(position, _)| position).collect();
        let resolver = CollisionResolver::new(config, current, &moved, &index);
        let conversions: Vec<Option<Kind>> = current
            .par_iter()
            .map(|agent| {
                let mut rng = agent_rng(seed, tick, agent.id, Phase::Contact);
                resolver.resolve(agent, &mut rng)
            })
            .collect();

        let mut next = Vec::with_capacity(current.len());
        for ((agent, (position, velocity)), conversion) in
            current.iter().zip(motion).zip(conversions.iter())
        {
            if !position.is_finite() || !velocity.is_finite() {
                error!(tick, agent = agent.id, "non-finite motion state");
                return Err(SimError::FatalInvariantViolation {
                    tick,
                    agent: agent.id,
                    detail: format!("position {position:?}, velocity {velocity:?}"),
                });
            }
            next.push(Agent {
                id: agent.id,
                kind: conversion.unwrap_or(agent.kind),
                position,
                velocity,
            });
        }

        let converted = conversions.iter().filter(|c| c.is_some()).count();
        if converted > 0 {
            debug!(tick, converted, "contact conversions");
        }

        self.agents = next;
        self.tick += 1;
        self.outcome = self.evaluate();

        match self.outcome {
            TickOutcome::DominanceWin { kind: Some(kind), count } => {
                info!(tick = self.tick, %kind, count, "{kind} wins");
            }
            TickOutcome::TimeLimitDraw { kind, count } => {
                info!(tick = self.tick, %kind, count, "time limit reached, {kind} leads with {count}");
            }
            _ => {}
        }

        Ok(self.outcome)
    }

    fn evaluate(&self) -> TickOutcome {
        let total = self.agents.len();
        if total == 0 {
            return TickOutcome::DominanceWin {
                kind: None,
                count: 0,
            };
        }

        let counts = self.counts();
        if let Some(&kind) = Kind::ALL.iter().find(|k| counts[k.index()] == total) {
            return TickOutcome::DominanceWin {
                kind: Some(kind),
                count: total,
            };
        }

        if self.tick >= self.config.max_ticks {
            // strict comparison keeps the earliest kind on ties
            let leader = Kind::ALL
                .iter()
                .copied()
                .fold(Kind::Scissors, |best, kind| {
                    if counts[kind.index()] > counts[best.index()] {
                        kind
                    } else {
                        best
                    }
                });
            return TickOutcome::TimeLimitDraw {
                kind: leader,
                count: counts[leader.index()],
            };
        }

        TickOutcome::Running
    }
}

/// Populate a default-configured arena of the given size.
pub fn initialize(
    scissors: usize,
    rock: usize,
    paper: usize,
    width: f64,
    height: f64,
    seed: u64,
) -> Result<SimulationState, SimError> {
    let config = SimConfig {
        width,
        height,
        ..SimConfig::default()
    };
    SimulationState::initialize([scissors, rock, paper], config, seed)
}

pub fn step(state: &mut SimulationState) -> Result<TickOutcome, SimError> {
    state.step()
}

pub fn snapshot(state: &SimulationState) -> Vec<AgentView> {
    state.snapshot()
}
