use crate::entity::{EntityKind, EntityPool};
use crate::world::{
    direction_with_rotation, Map, Rotation, TileCoords, TileElement, TileElementPayload,
    TileElementType, WorldCoords, COORDS_XY_STEP, COORDS_Z_STEP,
};

use super::registry::{PaintParams, PaintRegistry};
use super::session::{InteractionItem, PaintSession};

/// Base image of the entity placeholder sprite family, one per kind.
pub const SPR_ENTITY_BASE: u32 = 22500;

fn interaction_item_for(element_type: TileElementType) -> InteractionItem {
    match element_type {
        TileElementType::Surface => InteractionItem::Terrain,
        TileElementType::Path => InteractionItem::Footpath,
        TileElementType::Track => InteractionItem::Ride,
        TileElementType::SmallScenery => InteractionItem::Scenery,
        TileElementType::LargeScenery => InteractionItem::LargeScenery,
        TileElementType::Wall => InteractionItem::Wall,
        TileElementType::Entrance => InteractionItem::ParkEntrance,
        TileElementType::Banner => InteractionItem::Banner,
    }
}

/// (variant, direction, sequence) dispatch key of an element.
fn element_dispatch_key(element: &TileElement) -> (u8, u8, u8) {
    match &element.payload {
        TileElementPayload::Surface(_) | TileElementPayload::Path(_) => (0, 0, 0),
        TileElementPayload::Track(track) => (track.track_type, track.direction, track.sequence),
        TileElementPayload::SmallScenery(scenery) => {
            (scenery.object_type as u8, scenery.direction, 0)
        }
        TileElementPayload::LargeScenery(scenery) => {
            (scenery.object_type as u8, scenery.direction, scenery.sequence)
        }
        TileElementPayload::Wall(wall) => (wall.object_type as u8, wall.direction, 0),
        TileElementPayload::Entrance(entrance) => {
            (entrance.kind as u8, entrance.direction, entrance.sequence)
        }
        TileElementPayload::Banner(banner) => (0, banner.position, 0),
    }
}

impl PaintSession {
    /// Paint every visible tile of the viewport: one diagonal tile walk
    /// per 32-pixel screen strip, far tiles first within each strip so
    /// near tiles occlude them once arranged.
    pub fn generate(&mut self, map: &Map, entities: &EntityPool, registry: &PaintRegistry) {
        let view = self.viewport();
        let mut strip_x = view.x & !0x1F;
        let right_border = view.x + view.width;
        while strip_x < right_border {
            self.generate_strip(map, entities, registry, strip_x);
            strip_x += 32;
        }
    }

    /// The rotation-dependent diagonal walk for one screen strip.
    fn generate_strip(
        &mut self,
        map: &Map,
        entities: &EntityPool,
        registry: &PaintRegistry,
        strip_x: i32,
    ) {
        let view = self.viewport();
        let base_x = strip_x;
        let base_y = (view.y - 16) & !0x1F;
        let half_x = base_x >> 1;
        let columns = (view.height + 2128) >> 5;

        match self.rotation() {
            Rotation::R0 => {
                let mut x = (base_y - half_x) & !0x1F;
                let mut y = (base_y + half_x) & !0x1F;
                for _ in 0..columns {
                    self.paint_tile(map, registry, x, y);
                    self.paint_entities(entities, x, y);
                    self.paint_entities(entities, x - 32, y + 32);
                    self.paint_tile(map, registry, x, y + 32);
                    self.paint_entities(entities, x, y + 32);
                    x += 32;
                    self.paint_entities(entities, x, y);
                    y += 32;
                }
            }
            Rotation::R1 => {
                let mut x = (-base_y - half_x) & !0x1F;
                let mut y = (base_y - half_x - 16) & !0x1F;
                for _ in 0..columns {
                    self.paint_tile(map, registry, x, y);
                    self.paint_entities(entities, x, y);
                    self.paint_entities(entities, x - 32, y - 32);
                    self.paint_tile(map, registry, x - 32, y);
                    self.paint_entities(entities, x - 32, y);
                    y += 32;
                    self.paint_entities(entities, x, y);
                    x -= 32;
                }
            }
            Rotation::R2 => {
                let mut x = (-base_y + half_x) & !0x1F;
                let mut y = (-base_y - half_x) & !0x1F;
                for _ in 0..columns {
                    self.paint_tile(map, registry, x, y);
                    self.paint_entities(entities, x, y);
                    self.paint_entities(entities, x + 32, y - 32);
                    self.paint_tile(map, registry, x, y - 32);
                    self.paint_entities(entities, x, y - 32);
                    x -= 32;
                    self.paint_entities(entities, x, y);
                    y -= 32;
                }
            }
            Rotation::R3 => {
                let mut x = (base_y + half_x) & !0x1F;
                let mut y = (-base_y + half_x - 16) & !0x1F;
                for _ in 0..columns {
                    self.paint_tile(map, registry, x, y);
                    self.paint_entities(entities, x, y);
                    self.paint_entities(entities, x + 32, y + 32);
                    self.paint_tile(map, registry, x + 32, y);
                    self.paint_entities(entities, x + 32, y);
                    y -= 32;
                    self.paint_entities(entities, x, y);
                    x += 32;
                }
            }
        }
    }

    /// Paint one tile's element run and the entities standing on it. The
    /// public entry point of the validation harness: paints exactly one
    /// tile with fresh per-tile bookkeeping.
    pub fn paint_tile_at(
        &mut self,
        map: &Map,
        entities: &EntityPool,
        registry: &PaintRegistry,
        coords: TileCoords,
    ) {
        let world_x = coords.x * COORDS_XY_STEP;
        let world_y = coords.y * COORDS_XY_STEP;
        self.paint_tile(map, registry, world_x, world_y);
        self.paint_entities(entities, world_x, world_y);
    }

    fn paint_tile(&mut self, map: &Map, registry: &PaintRegistry, world_x: i32, world_y: i32) {
        let coords = WorldCoords::new(world_x, world_y).to_tile();
        if !coords.is_valid() {
            return;
        }
        self.start_tile(coords);

        // Elements are copied out so callbacks can mutate the session
        // freely; a run is small and the records are plain values.
        let elements: Vec<TileElement> = map
            .tile_elements(coords)
            .map(|(_, element)| *element)
            .collect();
        for element in &elements {
            let element_type = element.element_type();
            self.set_interaction_item(interaction_item_for(element_type));
            let (variant, direction, sequence) = element_dispatch_key(element);
            let params = PaintParams {
                direction: direction_with_rotation(direction, self.rotation()),
                sequence,
                height: i32::from(element.base_height) * COORDS_Z_STEP,
                element,
            };
            if let Some(callback) = registry.lookup(element_type, variant) {
                callback(self, &params);
            }
        }
    }

    fn paint_entities(&mut self, entities: &EntityPool, world_x: i32, world_y: i32) {
        let coords = WorldCoords::new(world_x, world_y).to_tile();
        if !coords.is_valid() {
            return;
        }

        let on_tile: Vec<(EntityKind, WorldCoords, i32)> = entities
            .entities_on_tile(coords)
            .filter_map(|entity| {
                entity
                    .position()
                    .map(|position| (entity.kind(), position, entity.z()))
            })
            .collect();
        for (kind, position, z) in on_tile {
            self.set_interaction_item(InteractionItem::Sprite);
            self.anchor_sprite(position);
            let image = SPR_ENTITY_BASE + kind.list_index() as u32;
            self.add_image_as_parent(image, (0, 0, z), (1, 1, 11), (0, 0, z));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::session::Viewport;
    use crate::paint::supports::{rotate_segments, Segments};
    use crate::paint::tile_paint::SPR_TERRAIN_BASE;
    use crate::world::{QuadrantMask, RideId, TileElementPayload, TrackElement};

    fn wide_viewport() -> Viewport {
        Viewport {
            x: -65536,
            y: -65536,
            width: 131072,
            height: 131072,
        }
    }

    fn flat_track_payload(direction: u8) -> TileElementPayload {
        TileElementPayload::Track(TrackElement {
            ride: RideId(0),
            ride_type: 0,
            track_type: 0,
            sequence: 0,
            direction,
            colour_scheme: 0,
            station: None,
            chain_lift: false,
        })
    }

    /// Test double of a flat track piece: claims every support segment at
    /// clearance height and records its tunnels, exactly what the
    /// cross-rotation validation needs.
    fn paint_flat_track(session: &mut PaintSession, params: &PaintParams) {
        session.add_image_as_parent(
            30000,
            (0, 6, params.height),
            (32, 20, 3),
            (0, 6, params.height),
        );
        let rotation = Rotation::from_index(params.direction);
        session.set_segment_support_height(
            rotate_segments(Segments::ALL, rotation),
            (params.height + 2) as u16,
            0x20,
        );
        session.push_tunnel_rotated(params.direction, params.height, 0);
    }

    #[test]
    fn generate_paints_surfaces_near_the_view_centre() {
        let map = Map::new(40).expect("map");
        let entities = EntityPool::new();
        let registry = PaintRegistry::with_core_callbacks();

        let mut session = PaintSession::new(
            Viewport {
                x: 0,
                y: 0,
                width: 640,
                height: 480,
            },
            Rotation::R0,
        );
        session.generate(&map, &entities, &registry);

        assert!(!session.entries().is_empty());
        assert!(session
            .entries()
            .iter()
            .any(|entry| entry.image_id == SPR_TERRAIN_BASE));
    }

    #[test]
    fn generate_walks_tiles_far_to_near_within_a_column() {
        let map = Map::new(40).expect("map");
        let entities = EntityPool::new();
        let registry = PaintRegistry::with_core_callbacks();

        let mut session = PaintSession::new(
            Viewport {
                x: 0,
                y: 0,
                width: 32,
                height: 64,
            },
            Rotation::R0,
        );
        session.generate(&map, &entities, &registry);

        // One strip wide. Under rotation 0 the diagonal advances +x/+y;
        // map depth of the painted terrain must never decrease along it.
        let depths: Vec<i32> = session
            .entries()
            .iter()
            .filter(|entry| entry.image_id == SPR_TERRAIN_BASE)
            .map(|entry| entry.map_position.x + entry.map_position.y)
            .collect();
        assert!(depths.len() > 1);
        for pair in depths.windows(2) {
            assert!(pair[1] >= pair[0] - 1, "depth went backwards: {depths:?}");
        }
    }

    #[test]
    fn entities_on_visited_tiles_are_painted() {
        let map = Map::new(40).expect("map");
        let mut entities = EntityPool::new();
        let registry = PaintRegistry::with_core_callbacks();
        let duck = entities.create(EntityKind::Duck).expect("create");
        assert!(entities.set_position(
            duck,
            Some(WorldCoords::new(5 * 32 + 16, 5 * 32 + 16)),
            120
        ));

        let mut session = PaintSession::new(
            Viewport {
                x: -512,
                y: -512,
                width: 1024,
                height: 1024,
            },
            Rotation::R0,
        );
        session.generate(&map, &entities, &registry);
        let duck_image = SPR_ENTITY_BASE + EntityKind::Duck.list_index() as u32;
        assert!(session
            .entries()
            .iter()
            .any(|entry| entry.image_id == duck_image));
    }

    /// Test double of a one-quarter turn: claims only the segments along
    /// the curve, so the recorded set genuinely differs per rotation.
    fn paint_quarter_turn(session: &mut PaintSession, params: &PaintParams) {
        session.add_image_as_parent(
            30010,
            (0, 0, params.height),
            (28, 28, 3),
            (2, 2, params.height),
        );
        let rotation = Rotation::from_index(params.direction);
        session.set_segment_support_height(
            rotate_segments(Segments::B4 | Segments::C4 | Segments::CC, rotation),
            (params.height + 2) as u16,
            0x20,
        );
    }

    fn recorded_track_segments(session: &PaintSession) -> (Segments, Option<u16>) {
        let mut recorded = Segments::empty();
        let mut height = None;
        for segment in crate::paint::supports::Segment::ALL {
            let state = session.support_segments()[segment.index()];
            if state.height != u16::MAX && state.height != 112 {
                recorded |= segment.bit();
                height = Some(state.height);
            }
        }
        (recorded, height)
    }

    #[test]
    fn flat_track_reports_all_nine_segments_in_every_rotation() {
        let mut map = Map::new(40).expect("map");
        let coords = TileCoords::new(12, 12);
        map.insert(coords, 20, QuadrantMask::all(), flat_track_payload(0))
            .expect("insert");

        let entities = EntityPool::new();
        let mut registry = PaintRegistry::with_core_callbacks();
        registry.register(TileElementType::Track, 0, paint_flat_track);

        for rotation in Rotation::ALL {
            let mut session = PaintSession::new(wide_viewport(), rotation);
            session.paint_tile_at(&map, &entities, &registry, coords);
            let (recorded, height) = recorded_track_segments(&session);
            let canonical = rotate_segments(recorded, rotation.inverse());
            assert_eq!(canonical, Segments::ALL, "rotation {rotation:?}");
            assert_eq!(height, Some(162), "rotation {rotation:?}");
        }
    }

    #[test]
    fn segment_support_calls_canonicalise_across_rotations() {
        let mut map = Map::new(40).expect("map");
        let coords = TileCoords::new(12, 12);
        map.insert(coords, 20, QuadrantMask::all(), flat_track_payload(0))
            .expect("insert");

        let entities = EntityPool::new();
        let mut registry = PaintRegistry::with_core_callbacks();
        registry.register(TileElementType::Track, 0, paint_quarter_turn);

        let mut canonical_forms = Vec::new();
        let mut raw_forms = Vec::new();
        for rotation in Rotation::ALL {
            let mut session = PaintSession::new(wide_viewport(), rotation);
            session.paint_tile_at(&map, &entities, &registry, coords);
            let (recorded, height) = recorded_track_segments(&session);
            raw_forms.push(recorded);
            canonical_forms.push((rotate_segments(recorded, rotation.inverse()), height));
        }

        // The raw recordings differ between rotations; the canonical forms
        // must not.
        assert_ne!(raw_forms[0], raw_forms[1]);
        for form in &canonical_forms {
            assert_eq!(*form, canonical_forms[0]);
            assert_eq!(form.0, Segments::B4 | Segments::C4 | Segments::CC);
            assert_eq!(form.1, Some(162));
        }
    }

    #[test]
    fn tunnel_pattern_matches_between_adjacent_tiles() {
        let mut map = Map::new(40).expect("map");
        // Two adjacent flat track tiles along the x axis; each records a
        // tunnel on its left side, at the same height.
        let left = TileCoords::new(10, 10);
        let right = TileCoords::new(11, 10);
        map.insert(left, 20, QuadrantMask::all(), flat_track_payload(0))
            .expect("insert");
        map.insert(right, 20, QuadrantMask::all(), flat_track_payload(0))
            .expect("insert");

        let entities = EntityPool::new();
        let mut registry = PaintRegistry::with_core_callbacks();
        registry.register(TileElementType::Track, 0, paint_flat_track);

        let mut patterns = Vec::new();
        for coords in [left, right] {
            let mut session = PaintSession::new(wide_viewport(), Rotation::R0);
            session.paint_tile_at(&map, &entities, &registry, coords);
            patterns.push((
                session.tunnels_left().to_vec(),
                session.tunnels_right().to_vec(),
            ));
        }
        assert_eq!(patterns[0], patterns[1]);
        assert_eq!(patterns[0].0.len(), 1);
        assert_eq!(patterns[0].0[0].height, 160);
    }
}
