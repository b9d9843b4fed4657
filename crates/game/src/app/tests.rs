use engine::world::DEFAULT_SURFACE_HEIGHT;
use engine::{
    rotate_segments, Entity, EntityKind, GameState, PaintSession, QuadrantMask, Rotation,
    Segment, Segments, TileCoords, TileElementPayload, Viewport, WorldCoords, COORDS_XY_STEP,
};

use super::bootstrap::{build_app, AppWiring};
use super::loop_runner::{run_simulation, LoopConfig};
use super::save::{load_world, save_world, SaveError, SAVE_VERSION};
use super::systems::{self, LITTER_LIFETIME_TICKS};
use super::track_paint::{SPR_TRACK_BASE, TRACK_FLAT};

fn short_config() -> LoopConfig {
    LoopConfig {
        ticks: 8,
        ..LoopConfig::default()
    }
}

fn seeded_app() -> AppWiring {
    build_app(short_config()).expect("demo park builds")
}

fn wide_viewport() -> Viewport {
    Viewport {
        x: -65536,
        y: -65536,
        width: 131072,
        height: 131072,
    }
}

fn paint_one_tile(app: &AppWiring, coords: TileCoords, rotation: Rotation) -> PaintSession {
    let mut session = PaintSession::new(wide_viewport(), rotation);
    session.paint_tile_at(&app.state.map, &app.state.entities, &app.registry, coords);
    session
}

fn assert_every_run_terminates(state: &GameState) {
    for y in 0..state.map.map_size() {
        for x in 0..state.map.map_size() {
            let coords = TileCoords::new(x, y);
            let run: Vec<_> = state.map.tile_elements(coords).collect();
            assert!(!run.is_empty(), "empty run at ({x},{y})");
            let terminators = run
                .iter()
                .filter(|(_, element)| element.is_last_for_tile())
                .count();
            assert_eq!(terminators, 1, "bad termination at ({x},{y})");
            assert!(run.last().expect("non-empty").1.is_last_for_tile());
        }
    }
}

#[test]
fn seeded_park_keeps_every_tile_run_terminated() {
    let app = seeded_app();
    assert_every_run_terminates(&app.state);
}

#[test]
fn seeded_park_has_the_circuit_and_the_path_row() {
    let app = seeded_app();
    assert!(app
        .state
        .map
        .find_path_at_height(TileCoords::new(9, 10), 14)
        .is_some());
    assert!(app
        .state
        .map
        .find_track(TileCoords::new(9, 12), engine::RideId(0), TRACK_FLAT, None)
        .is_some());
    assert_eq!(app.state.entities.count(EntityKind::Guest), 1);
    assert_eq!(app.state.entities.count(EntityKind::Duck), 2);
    assert_eq!(app.state.entities.count(EntityKind::Litter), 1);
}

#[test]
fn construction_is_refused_through_the_track_band() {
    let app = seeded_app();
    let coords = TileCoords::new(9, 12);
    // The flat track occupies z-steps 16..22.
    assert!(!app.state.map.can_construct_at(coords, 14, 18, QuadrantMask::all()));
    assert!(app.state.map.can_construct_at(coords, 24, 30, QuadrantMask::all()));
}

#[test]
fn insert_then_remove_restores_a_seeded_tile() {
    let mut app = seeded_app();
    let coords = TileCoords::new(9, 12);
    let before: Vec<_> = app
        .state
        .map
        .tile_elements(coords)
        .map(|(_, element)| *element)
        .collect();

    let index = app
        .state
        .map
        .insert(
            coords,
            30,
            QuadrantMask::all(),
            TileElementPayload::Path(engine::world::PathElement::default()),
        )
        .expect("insert");
    app.state.map.remove(index).expect("remove");

    let after: Vec<_> = app
        .state
        .map
        .tile_elements(coords)
        .map(|(_, element)| *element)
        .collect();
    assert_eq!(before, after);
}

#[test]
fn reorganise_leaves_the_saved_layout_untouched() {
    let mut app = seeded_app();
    let before = app.state.map.saved_elements();
    app.state.map.reorganise_tile_elements().expect("reorganise");
    let once = app.state.map.saved_elements();
    app.state.map.reorganise_tile_elements().expect("reorganise");
    let twice = app.state.map.saved_elements();
    assert_eq!(before, once);
    assert_eq!(once, twice);
}

#[test]
fn save_load_round_trip_preserves_world_and_checksum() {
    let mut app = seeded_app();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("park.save.json");

    let checksum_before = app.state.entities.checksum();
    let elements_before = app.state.map.saved_elements();
    save_world(&mut app.state, &path).expect("save");

    let loaded = load_world(&path).expect("load");
    assert_eq!(loaded.map.saved_elements(), elements_before);
    assert_eq!(loaded.entities.checksum(), checksum_before);
    assert_eq!(loaded.map.map_size(), app.state.map.map_size());
    assert_every_run_terminates(&loaded);
}

#[test]
fn ghost_elements_never_reach_the_save_file() {
    let mut app = seeded_app();
    let coords = TileCoords::new(20, 20);
    let ghost = app
        .state
        .map
        .insert(
            coords,
            20,
            QuadrantMask::all(),
            TileElementPayload::Path(engine::world::PathElement::default()),
        )
        .expect("insert");
    app.state
        .map
        .element_mut(ghost)
        .expect("element")
        .set_ghost(true);

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("park.save.json");
    save_world(&mut app.state, &path).expect("save");

    let loaded = load_world(&path).expect("load");
    for y in 0..loaded.map.map_size() {
        for x in 0..loaded.map.map_size() {
            for (_, element) in loaded.map.tile_elements(TileCoords::new(x, y)) {
                assert!(!element.is_ghost());
            }
        }
    }
}

#[test]
fn malformed_save_reports_a_parse_error_with_the_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("broken.save.json");
    std::fs::write(&path, "{ \"save_version\": 1, \"map_size\": ").expect("write");

    let error = load_world(&path).expect_err("parse must fail");
    match error {
        SaveError::Parse { path: reported, .. } => {
            assert!(reported.contains("broken.save.json"));
        }
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn future_save_versions_are_rejected() {
    let mut app = seeded_app();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("park.save.json");
    save_world(&mut app.state, &path).expect("save");

    let text = std::fs::read_to_string(&path).expect("read");
    let bumped = text.replace(
        &format!("\"save_version\":{SAVE_VERSION}"),
        "\"save_version\":999",
    );
    assert_ne!(text, bumped, "version field must be present");
    std::fs::write(&path, bumped).expect("write");

    assert!(matches!(
        load_world(&path),
        Err(SaveError::UnsupportedVersion(999))
    ));
}

#[test]
fn tampered_entities_fail_the_checksum() {
    let mut app = seeded_app();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("park.save.json");
    save_world(&mut app.state, &path).expect("save");

    let text = std::fs::read_to_string(&path).expect("read");
    // Move the guest without refreshing the stored checksum.
    let tampered = text.replace("\"x\":304", "\"x\":305");
    assert_ne!(text, tampered, "expected guest position in the document");
    std::fs::write(&path, tampered).expect("write");

    assert!(matches!(load_world(&path), Err(SaveError::ChecksumMismatch)));
}

#[test]
fn simulation_is_deterministic_across_runs() {
    let mut first = seeded_app();
    let summary_a = run_simulation(&mut first.state, &first.registry, &first.config);
    let mut second = seeded_app();
    let summary_b = run_simulation(&mut second.state, &second.registry, &second.config);
    assert_eq!(summary_a, summary_b);
}

#[test]
fn ducks_paddle_toward_their_target_and_rebucket() {
    let mut app = seeded_app();
    let duck_id = app
        .state
        .entities
        .entities_of_kind(EntityKind::Duck)
        .map(Entity::id)
        .next()
        .expect("seeded duck");
    let start = app
        .state
        .entities
        .try_get(duck_id)
        .expect("duck")
        .position()
        .expect("positioned");

    for tick in 0..64 {
        systems::tick_entities(&mut app.state, tick);
    }

    let now = app
        .state
        .entities
        .try_get(duck_id)
        .expect("duck")
        .position()
        .expect("positioned");
    assert!(now.x > start.x, "duck never moved: {start:?} -> {now:?}");

    let bucket: Vec<_> = app
        .state
        .entities
        .entities_on_tile(now.to_tile())
        .map(Entity::id)
        .collect();
    assert!(bucket.contains(&duck_id));
}

#[test]
fn litter_decays_after_its_lifetime() {
    let mut app = seeded_app();
    assert_eq!(app.state.entities.count(EntityKind::Litter), 1);
    systems::tick_entities(&mut app.state, LITTER_LIFETIME_TICKS - 1);
    assert_eq!(app.state.entities.count(EntityKind::Litter), 1);
    systems::tick_entities(&mut app.state, LITTER_LIFETIME_TICKS);
    assert_eq!(app.state.entities.count(EntityKind::Litter), 0);
}

#[test]
fn balloons_pop_above_the_ceiling() {
    let mut app = seeded_app();
    let balloon = app
        .state
        .entities
        .create(EntityKind::Balloon)
        .expect("create");
    app.state.entities.set_position(
        balloon,
        Some(WorldCoords::new(6 * COORDS_XY_STEP, 6 * COORDS_XY_STEP)),
        systems::BALLOON_POP_HEIGHT - 2,
    );

    systems::tick_entities(&mut app.state, 0);
    assert!(app.state.entities.try_get(balloon).is_some());
    systems::tick_entities(&mut app.state, 1);
    systems::tick_entities(&mut app.state, 2);
    assert!(app.state.entities.try_get(balloon).is_none());
}

#[test]
fn floating_entity_sweep_spares_the_grounded() {
    let mut app = seeded_app();
    let stray = app.state.entities.create(EntityKind::Balloon).expect("create");
    app.state
        .entities
        .set_position(stray, Some(WorldCoords::new(-400, -400)), 0);

    let removed = app.state.entities.remove_floating();
    assert_eq!(removed, 1);
    assert!(app.state.entities.try_get(stray).is_none());
    assert_eq!(app.state.entities.count(EntityKind::Guest), 1);
    assert_eq!(app.state.entities.count(EntityKind::Duck), 2);
}

#[test]
fn painted_frame_contains_terrain_track_and_entities() {
    let app = seeded_app();
    let mut session = PaintSession::new(app.config.viewport, Rotation::R0);
    session.generate(&app.state.map, &app.state.entities, &app.registry);

    assert!(!session.arena_exhausted());
    let images: Vec<u32> = session
        .entries()
        .iter()
        .map(|entry| entry.image_id)
        .collect();
    assert!(images.contains(&engine::paint::SPR_TERRAIN_BASE));
    assert!(images.contains(&SPR_TRACK_BASE));
    let duck_image = engine::paint::SPR_ENTITY_BASE + EntityKind::Duck.list_index() as u32;
    assert!(images.contains(&duck_image));

    // Determinism of the painted frame as well.
    let commands_a = session.draw_commands();
    let mut session_b = PaintSession::new(wide_viewport(), Rotation::R0);
    session_b.generate(&app.state.map, &app.state.entities, &app.registry);
    assert_eq!(commands_a, session_b.draw_commands());
}

#[test]
fn terrain_is_drawn_before_the_track_above_it() {
    let app = seeded_app();
    for rotation in Rotation::ALL {
        let session = paint_one_tile(&app, TileCoords::new(9, 12), rotation);
        let commands = session.draw_commands();
        let terrain_at = commands
            .iter()
            .position(|command| command.image_id == engine::paint::SPR_TERRAIN_BASE)
            .expect("terrain painted");
        let track_at = commands
            .iter()
            .position(|command| {
                command.image_id >= SPR_TRACK_BASE && command.image_id < SPR_TRACK_BASE + 16
            })
            .expect("track painted");
        assert!(
            terrain_at < track_at,
            "track drawn before terrain under rotation {rotation:?}"
        );
    }
}

fn recorded_track_segments(session: &PaintSession) -> (Segments, Option<u16>) {
    let surface_height = u16::from(DEFAULT_SURFACE_HEIGHT) * 8;
    let mut recorded = Segments::empty();
    let mut height = None;
    for segment in Segment::ALL {
        let state = session.support_segments()[segment.index()];
        if state.height != u16::MAX && state.height != surface_height {
            recorded |= segment.bit();
            height = Some(state.height);
        }
    }
    (recorded, height)
}

#[test]
fn flat_track_segment_calls_are_rotation_invariant() {
    let app = seeded_app();
    let coords = TileCoords::new(9, 12);
    let mut canonical_forms = Vec::new();
    for rotation in Rotation::ALL {
        let session = paint_one_tile(&app, coords, rotation);
        let (recorded, height) = recorded_track_segments(&session);
        canonical_forms.push((rotate_segments(recorded, rotation.inverse()), height));
    }
    for form in &canonical_forms {
        assert_eq!(*form, canonical_forms[0]);
        assert_eq!(form.0, Segments::ALL);
    }
}

#[test]
fn quarter_turn_segment_calls_are_rotation_invariant() {
    let app = seeded_app();
    let coords = TileCoords::new(8, 12);
    let mut canonical_forms = Vec::new();
    let mut raw_forms = Vec::new();
    for rotation in Rotation::ALL {
        let session = paint_one_tile(&app, coords, rotation);
        let (recorded, height) = recorded_track_segments(&session);
        raw_forms.push(recorded);
        canonical_forms.push((rotate_segments(recorded, rotation.inverse()), height));
    }
    assert_ne!(raw_forms[0], raw_forms[1]);
    for form in &canonical_forms {
        assert_eq!(*form, canonical_forms[0]);
    }
}

#[test]
fn adjacent_flat_tracks_agree_on_their_shared_tunnel_edge() {
    let app = seeded_app();
    // Two straight pieces side by side on the far straight of the circuit.
    let left = paint_one_tile(&app, TileCoords::new(11, 14), Rotation::R0);
    let right = paint_one_tile(&app, TileCoords::new(12, 14), Rotation::R0);

    assert_eq!(left.tunnels_left(), right.tunnels_left());
    assert_eq!(left.tunnels_right(), right.tunnels_right());
    assert_eq!(left.tunnels_left().len(), 1);
}

#[test]
fn tunnel_patterns_track_the_camera_rotation_consistently() {
    let app = seeded_app();
    let coords = TileCoords::new(9, 14);
    // Rotating the camera by two quarter turns swaps nothing for a
    // straight piece: direction parity is what picks the side.
    let r0 = paint_one_tile(&app, coords, Rotation::R0);
    let r2 = paint_one_tile(&app, coords, Rotation::R2);
    assert_eq!(r0.tunnels_left().len() + r0.tunnels_right().len(), 1);
    assert_eq!(
        r0.tunnels_left().len() + r0.tunnels_right().len(),
        r2.tunnels_left().len() + r2.tunnels_right().len()
    );
}
