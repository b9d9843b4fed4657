use crate::world::LAND_HEIGHT_STEP;

use super::registry::PaintParams;
use super::session::PaintSession;
use super::supports::Segments;

/// Base image of the terrain sprite family; one image per slope encoding.
pub const SPR_TERRAIN_BASE: u32 = 2915;

/// Base image of the water overlay family.
pub const SPR_WATER_OVERLAY: u32 = 5053;

/// Base image of the footpath sprite family; one image per edge set.
pub const SPR_FOOTPATH_BASE: u32 = 1309;

const SUPPORT_BLOCKED: u16 = u16::MAX;

/// Built-in surface painter: terrain sprite, optional water overlay, and
/// the support baseline every later element on the tile builds from.
pub fn paint_surface(session: &mut PaintSession, params: &PaintParams) {
    let surface = match params.element.as_surface() {
        Some(surface) => *surface,
        None => return,
    };

    let image = SPR_TERRAIN_BASE + u32::from(surface.slope.bits());
    session.add_image_as_parent(image, (0, 0, params.height), (32, 32, -1), (0, 0, params.height));

    let water_height = i32::from(surface.water_height) * LAND_HEIGHT_STEP;
    if water_height > params.height {
        session.add_image_as_parent(
            SPR_WATER_OVERLAY,
            (0, 0, water_height),
            (32, 32, -1),
            (0, 0, water_height),
        );
    }

    session.set_general_support_height(params.height as u16, surface.slope.bits());
    session.set_segment_support_height(Segments::ALL, params.height as u16, 0x20);
}

/// Built-in path painter. Paths cap the tile: nothing may stand a support
/// on top of one.
pub fn paint_path(session: &mut PaintSession, params: &PaintParams) {
    let path = match params.element.as_path() {
        Some(path) => *path,
        None => return,
    };

    let image = SPR_FOOTPATH_BASE
        + u32::from(path.surface_type) * 16
        + u32::from(rotate_path_edges(path.edges, params.direction));
    session.add_image_as_parent(image, (0, 0, params.height), (32, 32, 0), (0, 0, params.height));

    if path.queue {
        // Queue rail overlay rides along as a child sprite.
        session.add_image_as_child(image + 1, 0, -2);
    }

    session.set_segment_support_height(Segments::ALL, SUPPORT_BLOCKED, 0);
}

/// Rotate a path's 4-bit edge set into view space.
fn rotate_path_edges(edges: u8, rotation: u8) -> u8 {
    let edges = edges & 0x0F;
    ((edges << (rotation & 3)) | (edges >> (4 - (rotation & 3)))) & 0x0F
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityPool;
    use crate::paint::registry::PaintRegistry;
    use crate::paint::session::Viewport;
    use crate::paint::supports::Segment;
    use crate::world::{
        Map, PathElement, QuadrantMask, Rotation, Slope, TileCoords, TileElementPayload,
    };

    fn paint_one_tile(map: &Map, coords: TileCoords, rotation: Rotation) -> PaintSession {
        let entities = EntityPool::new();
        let registry = PaintRegistry::with_core_callbacks();
        let mut session = PaintSession::new(
            Viewport {
                x: -65536,
                y: -65536,
                width: 131072,
                height: 131072,
            },
            rotation,
        );
        session.paint_tile_at(map, &entities, &registry, coords);
        session
    }

    #[test]
    fn surface_emits_terrain_and_claims_all_segments() {
        let map = Map::new(30).expect("map");
        let session = paint_one_tile(&map, TileCoords::new(5, 5), Rotation::R0);

        assert_eq!(session.entries().len(), 1);
        assert_eq!(session.entries()[0].image_id, SPR_TERRAIN_BASE);
        assert!(session
            .support_segments()
            .iter()
            .all(|segment| segment.height == 112));
        assert_eq!(session.support().height, 112);
    }

    #[test]
    fn sloped_surface_selects_the_slope_sprite() {
        let mut map = Map::new(30).expect("map");
        let (index, _) = map.find_surface(TileCoords::new(5, 5)).expect("surface");
        map.element_mut(index)
            .expect("element")
            .as_surface_mut()
            .expect("surface payload")
            .slope = Slope::NE_SIDE_UP;

        let session = paint_one_tile(&map, TileCoords::new(5, 5), Rotation::R0);
        assert_eq!(
            session.entries()[0].image_id,
            SPR_TERRAIN_BASE + u32::from(Slope::NE_SIDE_UP.bits())
        );
    }

    #[test]
    fn flooded_surface_adds_a_water_overlay() {
        let mut map = Map::new(30).expect("map");
        let (index, _) = map.find_surface(TileCoords::new(5, 5)).expect("surface");
        map.element_mut(index)
            .expect("element")
            .as_surface_mut()
            .expect("surface payload")
            .water_height = 9;

        let session = paint_one_tile(&map, TileCoords::new(5, 5), Rotation::R0);
        let images: Vec<u32> = session
            .entries()
            .iter()
            .map(|entry| entry.image_id)
            .collect();
        assert!(images.contains(&SPR_WATER_OVERLAY));
    }

    #[test]
    fn path_blocks_the_support_segments_above_it() {
        let mut map = Map::new(30).expect("map");
        map.insert(
            TileCoords::new(5, 5),
            14,
            QuadrantMask::all(),
            TileElementPayload::Path(PathElement::default()),
        )
        .expect("insert");

        let session = paint_one_tile(&map, TileCoords::new(5, 5), Rotation::R0);
        assert_eq!(
            session.support_segments()[Segment::C4.index()].height,
            SUPPORT_BLOCKED
        );
    }

    #[test]
    fn path_edges_rotate_with_the_view() {
        assert_eq!(rotate_path_edges(0b0001, 0), 0b0001);
        assert_eq!(rotate_path_edges(0b0001, 1), 0b0010);
        assert_eq!(rotate_path_edges(0b1000, 1), 0b0001);
        assert_eq!(rotate_path_edges(0b1010, 2), 0b1010);
        assert_eq!(rotate_path_edges(0b0110, 3), 0b0011);
    }
}
