mod coords;
mod map;
mod queries;
mod tile_element;

pub use coords::{
    direction_with_rotation, rotate_coords, world_to_screen, Rotation, TileCoords, WorldCoords,
    COORDS_XY_STEP, COORDS_Z_STEP, DEFAULT_LAND_HEIGHT, LAND_HEIGHT_STEP,
    MAXIMUM_MAP_SIZE_TECHNICAL,
};
pub use map::{ElementIndex, Map, MapError, MAX_TILE_ELEMENTS};
pub use tile_element::{
    BannerElement, BannerId, EntranceElement, EntranceKind, LargeSceneryElement, Ownership,
    PathElement, QuadrantMask, RideId, Slope, SmallSceneryElement, SurfaceElement, TerrainEdge,
    TerrainSurface, TileElement, TileElementFlags, TileElementPayload, TileElementType,
    TrackElement, WallElement, DEFAULT_SURFACE_HEIGHT,
};
