use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};
use rps_swarm::agent::Kind;
use rps_swarm::config::SimConfig;
use rps_swarm::plugin::{RunState, StatusMessage};
use rps_swarm::simulation::SimulationState;

const BACKGROUND: Color = Color::srgb(30.0 / 255.0, 30.0 / 255.0, 30.0 / 255.0);

/// Draws the population and the HUD. Only ever reads simulation state.
pub struct ViewerPlugin;

impl Plugin for ViewerPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(ClearColor(BACKGROUND))
            .add_systems(Startup, (setup_camera, spawn_agent_sprites))
            .add_systems(
                Update,
                (handle_keyboard, sync_agent_sprites, hud_system),
            );
    }
}

/// Links a circle mesh to the agent it displays
#[derive(Component)]
pub struct AgentSprite {
    pub id: usize,
}

/// One shared material per kind
#[derive(Resource)]
pub struct KindMaterials {
    materials: [Handle<ColorMaterial>; 3],
}

impl KindMaterials {
    fn get(&self, kind: Kind) -> Handle<ColorMaterial> {
        self.materials[kind.index()].clone()
    }
}

fn kind_color(kind: Kind) -> Color {
    match kind {
        Kind::Scissors => Color::srgb(1.0, 0.0, 0.0),
        Kind::Rock => Color::srgb(100.0 / 255.0, 100.0 / 255.0, 100.0 / 255.0),
        Kind::Paper => Color::srgb(0.0, 0.0, 1.0),
    }
}

/// Arena coordinates have the origin top-left with y down; the camera is
/// centered with y up.
fn arena_to_world(x: f64, y: f64, config: &SimConfig) -> Vec3 {
    Vec3::new(
        (x - config.width / 2.0) as f32,
        (config.height / 2.0 - y) as f32,
        0.0,
    )
}

fn setup_camera(mut commands: Commands) {
    commands.spawn((Camera2d, Transform::from_xyz(0.0, 0.0, 0.0)));
}

fn spawn_agent_sprites(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
    simulation: Res<SimulationState>,
    config: Res<SimConfig>,
) {
    let mesh = meshes.add(Circle::new(config.agent_radius as f32));
    let kind_materials = KindMaterials {
        materials: Kind::ALL.map(|kind| materials.add(ColorMaterial::from_color(kind_color(kind)))),
    };

    for view in simulation.snapshot() {
        commands.spawn((
            AgentSprite { id: view.id },
            Mesh2d(mesh.clone()),
            MeshMaterial2d(kind_materials.get(view.kind)),
            Transform::from_translation(arena_to_world(view.x, view.y, &config)),
        ));
    }

    commands.insert_resource(kind_materials);
}

fn sync_agent_sprites(
    simulation: Res<SimulationState>,
    config: Res<SimConfig>,
    kind_materials: Option<Res<KindMaterials>>,
    mut sprites: Query<(&AgentSprite, &mut Transform, &mut MeshMaterial2d<ColorMaterial>)>,
) {
    let Some(kind_materials) = kind_materials else {
        return;
    };
    if !simulation.is_changed() {
        return;
    }

    let snapshot = simulation.snapshot();
    for (sprite, mut transform, mut material) in sprites.iter_mut() {
        let Some(view) = snapshot.get(sprite.id) else {
            continue;
        };
        transform.translation = arena_to_world(view.x, view.y, &config);
        let wanted = kind_materials.get(view.kind);
        if material.0 != wanted {
            material.0 = wanted;
        }
    }
}

/// Space pauses or resumes, Escape or Q quits
fn handle_keyboard(
    keys: Res<ButtonInput<KeyCode>>,
    mut run_state: ResMut<RunState>,
    mut exit: EventWriter<AppExit>,
) {
    if keys.just_pressed(KeyCode::Escape) || keys.just_pressed(KeyCode::KeyQ) {
        exit.send(AppExit::Success);
    }

    if keys.just_pressed(KeyCode::Space) {
        *run_state = match *run_state {
            RunState::Running => RunState::Paused,
            RunState::Paused => RunState::Running,
            RunState::Finished => RunState::Finished,
        };
    }
}

fn hud_system(
    mut contexts: EguiContexts,
    simulation: Res<SimulationState>,
    mut run_state: ResMut<RunState>,
    status: Res<StatusMessage>,
) {
    let counts = simulation.counts();
    let config = simulation.config();

    egui::Window::new("Simulation")
        .default_pos(egui::pos2(10.0, 10.0))
        .show(contexts.ctx_mut(), |ui| {
            ui.horizontal(|ui| {
                let button_text = match *run_state {
                    RunState::Running => "⏸ Pause",
                    _ => "▶ Resume",
                };
                let enabled = *run_state != RunState::Finished;
                if ui.add_enabled(enabled, egui::Button::new(button_text)).clicked() {
                    *run_state = if *run_state == RunState::Running {
                        RunState::Paused
                    } else {
                        RunState::Running
                    };
                }
            });

            ui.separator();
            ui.label(format!(
                "Scissors: {} | Rock: {} | Paper: {}",
                counts[Kind::Scissors.index()],
                counts[Kind::Rock.index()],
                counts[Kind::Paper.index()]
            ));
            ui.label(format!("Time: {}/{}", simulation.tick(), config.max_ticks));
            ui.colored_label(egui::Color32::YELLOW, &status.0);

            ui.separator();
            ui.label("Space - Pause/Resume");
            ui.label("Esc / Q - Quit");
        });
}
