use engine::{GameState, PaintRegistry, PaintSession, Rotation, Viewport};
use tracing::{debug, info};

use super::systems;

/// Fixed-tick loop parameters.
#[derive(Debug, Clone, Copy)]
pub struct LoopConfig {
    pub map_size: i32,
    pub ticks: u32,
    pub viewport: Viewport,
    pub rotation: Rotation,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            map_size: 60,
            ticks: 40,
            viewport: Viewport {
                x: 0,
                y: 0,
                width: 640,
                height: 480,
            },
            rotation: Rotation::R0,
        }
    }
}

/// What one simulation run produced, for logging and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopSummary {
    pub ticks_run: u32,
    pub frames_painted: u32,
    pub last_frame_draw_calls: usize,
    pub entity_checksum: String,
}

/// Run the synchronous tick/paint pipeline: one entity tick and one full
/// paint traversal per iteration, all on the calling thread.
pub fn run_simulation(
    state: &mut GameState,
    registry: &PaintRegistry,
    config: &LoopConfig,
) -> LoopSummary {
    let mut frames_painted = 0;
    let mut last_frame_draw_calls = 0;

    for tick in 0..config.ticks {
        systems::tick_entities(state, tick);

        let mut session = PaintSession::new(config.viewport, config.rotation);
        session.generate(&state.map, &state.entities, registry);
        let commands = session.draw_commands();
        frames_painted += 1;
        last_frame_draw_calls = commands.len();

        if tick % 16 == 0 {
            debug!(tick, draw_calls = commands.len(), "frame painted");
        }
    }

    let summary = LoopSummary {
        ticks_run: config.ticks,
        frames_painted,
        last_frame_draw_calls,
        entity_checksum: state.entities.checksum(),
    };
    info!(
        ticks = summary.ticks_run,
        draw_calls = summary.last_frame_draw_calls,
        "simulation finished"
    );
    summary
}
