use crate::config::SimConfig;
use crate::error::SimError;
use crate::simulation::{SimulationState, TickOutcome};
use bevy::prelude::*;

/// Resource to control whether the simulation advances
#[derive(Resource, Default, PartialEq, Eq, Clone, Copy, Debug)]
pub enum RunState {
    #[default]
    Running,
    Paused,
    /// Reached a terminal outcome or halted on an error
    Finished,
}

/// Human-readable status line for whoever displays the run
#[derive(Resource, Clone, Debug, PartialEq, Eq)]
pub struct StatusMessage(pub String);

impl Default for StatusMessage {
    fn default() -> Self {
        StatusMessage("Running...".to_string())
    }
}

/// How often the simulation is advanced
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stepping {
    /// One tick per `FixedUpdate`, at the configured frame cap
    FixedRate,
    /// One tick per app update, as fast as the loop spins
    EveryFrame,
}

/// Owns a `SimulationState` resource and advances it between frames.
#[derive(Clone)]
pub struct SimulationPlugin {
    state: SimulationState,
    stepping: Stepping,
    exit_on_finish: bool,
}

impl SimulationPlugin {
    /// Builds the initial population up front so configuration errors surface
    /// before the app starts.
    pub fn new(counts: [usize; 3], config: SimConfig, seed: u64) -> Result<Self, SimError> {
        Ok(Self::from_state(SimulationState::initialize(counts, config, seed)?))
    }

    pub fn from_state(state: SimulationState) -> Self {
        Self {
            state,
            stepping: Stepping::FixedRate,
            exit_on_finish: false,
        }
    }

    pub fn with_stepping(mut self, stepping: Stepping) -> Self {
        self.stepping = stepping;
        self
    }

    /// Send `AppExit` once the run finishes.
    pub fn exit_on_finish(mut self) -> Self {
        self.exit_on_finish = true;
        self
    }
}

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(self.state.config().clone())
            .insert_resource(self.state.clone())
            .init_resource::<RunState>()
            .init_resource::<StatusMessage>();

        let running = |state: Res<RunState>| *state == RunState::Running;
        match self.stepping {
            Stepping::FixedRate => {
                app.insert_resource(Time::<Fixed>::from_hz(self.state.config().frame_cap))
                    .add_systems(FixedUpdate, advance_simulation.run_if(running));
            }
            Stepping::EveryFrame => {
                app.add_systems(Update, advance_simulation.run_if(running));
            }
        }

        if self.exit_on_finish {
            app.add_systems(Last, exit_when_finished);
        }
    }
}

/// Status text for a terminal outcome.
pub fn status_line(outcome: TickOutcome) -> String {
    match outcome {
        TickOutcome::Running => "Running...".to_string(),
        TickOutcome::DominanceWin { kind: Some(kind), .. } => format!("Game Over! {kind} wins!"),
        TickOutcome::DominanceWin { kind: None, .. } => "Game Over! No units left!".to_string(),
        TickOutcome::TimeLimitDraw { kind, count } => {
            format!("Time Limit! {kind} leads with {count} units")
        }
    }
}

/// System to advance the simulation by one tick
pub fn advance_simulation(
    mut simulation: ResMut<SimulationState>,
    mut run_state: ResMut<RunState>,
    mut status: ResMut<StatusMessage>,
) {
    match simulation.step() {
        Ok(TickOutcome::Running) => {}
        Ok(outcome) => {
            *run_state = RunState::Finished;
            status.0 = status_line(outcome);
        }
        Err(err) => {
            error!("simulation halted: {err}");
            *run_state = RunState::Finished;
            status.0 = format!("Halted: {err}");
        }
    }
}

fn exit_when_finished(run_state: Res<RunState>, mut exit: EventWriter<AppExit>) {
    if *run_state == RunState::Finished {
        exit.send(AppExit::Success);
    }
}
