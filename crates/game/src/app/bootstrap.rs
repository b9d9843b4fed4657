use engine::world::PathElement;
use engine::{
    EntityKind, GameState, MapError, PaintRegistry, QuadrantMask, RideId, TileCoords,
    TileElementPayload, WorldCoords, COORDS_XY_STEP,
};
use tracing::info;

use super::loop_runner::LoopConfig;
use super::track_paint::{
    self, TRACK_25_DEG_DOWN, TRACK_25_DEG_UP, TRACK_FLAT, TRACK_QUARTER_TURN_1_TILE,
};

/// Everything the simulation loop needs, wired together.
pub struct AppWiring {
    pub state: GameState,
    pub registry: PaintRegistry,
    pub config: LoopConfig,
}

/// Build the game state, seed the demo park, and register every paint
/// callback the park's content needs.
pub fn build_app(config: LoopConfig) -> Result<AppWiring, MapError> {
    let mut state = GameState::new(config.map_size)?;
    seed_demo_park(&mut state)?;

    let mut registry = PaintRegistry::with_core_callbacks();
    track_paint::register_track_callbacks(&mut registry);

    info!(
        map_size = config.map_size,
        entities = engine::MAX_ENTITIES - state.entities.free_count(),
        "demo park seeded"
    );
    Ok(AppWiring {
        state,
        registry,
        config,
    })
}

fn track_payload(track_type: u8, direction: u8) -> TileElementPayload {
    TileElementPayload::Track(engine::world::TrackElement {
        ride: RideId(0),
        ride_type: 0,
        track_type,
        sequence: 0,
        direction,
        colour_scheme: 0,
        station: None,
        chain_lift: false,
    })
}

/// A small deterministic park: a footpath row, one closed track circuit
/// with a hill, and a handful of entities.
fn seed_demo_park(state: &mut GameState) -> Result<(), MapError> {
    // Footpath along y = 10.
    for x in 8..16 {
        let index = state.map.insert(
            TileCoords::new(x, 10),
            14,
            QuadrantMask::all(),
            TileElementPayload::Path(PathElement {
                edges: 0b0101,
                ..PathElement::default()
            }),
        )?;
        state
            .map
            .element_mut(index)
            .expect("fresh insert")
            .clearance_height = 18;
    }

    // A rectangular circuit: two straights joined by four small turns,
    // with one up-down hill on the far straight.
    let circuit: &[(i32, i32, u8, u8)] = &[
        (8, 12, TRACK_QUARTER_TURN_1_TILE, 0),
        (9, 12, TRACK_FLAT, 0),
        (10, 12, TRACK_25_DEG_UP, 0),
        (11, 12, TRACK_25_DEG_DOWN, 0),
        (12, 12, TRACK_FLAT, 0),
        (13, 12, TRACK_QUARTER_TURN_1_TILE, 1),
        (13, 14, TRACK_QUARTER_TURN_1_TILE, 2),
        (12, 14, TRACK_FLAT, 0),
        (11, 14, TRACK_FLAT, 0),
        (10, 14, TRACK_FLAT, 0),
        (9, 14, TRACK_FLAT, 0),
        (8, 14, TRACK_QUARTER_TURN_1_TILE, 3),
    ];
    for (x, y, track_type, direction) in circuit {
        let index = state.map.insert(
            TileCoords::new(*x, *y),
            16,
            QuadrantMask::all(),
            track_payload(*track_type, *direction),
        )?;
        state
            .map
            .element_mut(index)
            .expect("fresh insert")
            .clearance_height = 22;
    }

    // Entities: one guest on the path, two ducks heading for the far
    // shore, and a piece of litter for the sweeper tests.
    let guest = state
        .entities
        .create(EntityKind::Guest)
        .expect("fresh pool");
    state.entities.set_position(
        guest,
        Some(WorldCoords::new(
            9 * COORDS_XY_STEP + 16,
            10 * COORDS_XY_STEP + 16,
        )),
        112,
    );

    for offset in 0..2 {
        let duck = state.entities.create(EntityKind::Duck).expect("fresh pool");
        if let Some(entity) = state.entities.try_get_mut(duck) {
            if let Some(data) = entity.data.as_duck_mut() {
                data.target_x = 20 * COORDS_XY_STEP;
                data.target_y = (18 + offset) * COORDS_XY_STEP;
            }
        }
        state.entities.set_position(
            duck,
            Some(WorldCoords::new(
                4 * COORDS_XY_STEP,
                (18 + offset) * COORDS_XY_STEP,
            )),
            112,
        );
    }

    let litter = state
        .entities
        .create(EntityKind::Litter)
        .expect("fresh pool");
    state.entities.set_position(
        litter,
        Some(WorldCoords::new(
            11 * COORDS_XY_STEP + 4,
            10 * COORDS_XY_STEP + 9,
        )),
        112,
    );

    Ok(())
}
