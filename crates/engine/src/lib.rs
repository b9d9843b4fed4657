pub mod entity;
pub mod paint;
pub mod world;

pub use entity::{
    Entity, EntityData, EntityError, EntityId, EntityKind, EntityPool, EntitySnapshot,
    MAX_ENTITIES,
};
pub use paint::{
    metal_a_supports_paint_setup, rotate_segments, wooden_a_supports_paint_setup, DrawCommand,
    PaintFn, PaintParams, PaintRegistry, PaintSession, Segment, Segments, TunnelEntry, Viewport,
};
pub use world::{
    ElementIndex, Map, MapError, QuadrantMask, RideId, Rotation, Slope, TileCoords, TileElement,
    TileElementPayload, TileElementType, WorldCoords, COORDS_XY_STEP, COORDS_Z_STEP,
    LAND_HEIGHT_STEP, MAXIMUM_MAP_SIZE_TECHNICAL, MAX_TILE_ELEMENTS,
};

/// The process-wide simulation state: the tile world and the entity pool,
/// owned together and passed explicitly through the call graph. All
/// mutation is single-threaded; nothing here is safe to share across
/// threads mid-mutation.
#[derive(Debug)]
pub struct GameState {
    pub map: Map,
    pub entities: EntityPool,
}

impl GameState {
    pub fn new(map_size: i32) -> Result<Self, MapError> {
        Ok(Self {
            map: Map::new(map_size)?,
            entities: EntityPool::new(),
        })
    }

    /// Re-initialise to a fresh flat world with an empty entity pool.
    pub fn reset(&mut self, map_size: i32) -> Result<(), MapError> {
        self.map = Map::new(map_size)?;
        self.entities.reset();
        Ok(())
    }
}
