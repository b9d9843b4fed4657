use serde::{Deserialize, Serialize};

/// Side length, in tiles, of the technical map grid. The playable map is a
/// sub-rectangle of this; coordinates outside it fail closed everywhere.
pub const MAXIMUM_MAP_SIZE_TECHNICAL: i32 = 256;

/// World units per tile edge.
pub const COORDS_XY_STEP: i32 = 32;

/// World units per discrete base/clearance height step.
pub const COORDS_Z_STEP: i32 = 8;

/// World units of one land slope level (two z-steps).
pub const LAND_HEIGHT_STEP: i32 = 16;

/// Height in world units reported for off-map or surface-less lookups.
pub const DEFAULT_LAND_HEIGHT: i32 = 16;

/// Tile-grid coordinate, one unit per tile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoords {
    pub x: i32,
    pub y: i32,
}

impl TileCoords {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn is_valid(self) -> bool {
        self.x >= 0
            && self.y >= 0
            && self.x < MAXIMUM_MAP_SIZE_TECHNICAL
            && self.y < MAXIMUM_MAP_SIZE_TECHNICAL
    }

    /// Raster index into per-tile arrays (y-major, x-minor).
    pub fn to_tile_index(self) -> Option<usize> {
        if !self.is_valid() {
            return None;
        }
        Some((self.y * MAXIMUM_MAP_SIZE_TECHNICAL + self.x) as usize)
    }

    pub fn to_world(self) -> WorldCoords {
        WorldCoords {
            x: self.x * COORDS_XY_STEP,
            y: self.y * COORDS_XY_STEP,
        }
    }
}

/// World-unit coordinate (32 units per tile edge).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorldCoords {
    pub x: i32,
    pub y: i32,
}

impl WorldCoords {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn to_tile(self) -> TileCoords {
        TileCoords {
            x: self.x.div_euclid(COORDS_XY_STEP),
            y: self.y.div_euclid(COORDS_XY_STEP),
        }
    }

    /// Offset within the containing tile, each axis in `0..COORDS_XY_STEP`.
    pub fn sub_tile(self) -> (i32, i32) {
        (
            self.x.rem_euclid(COORDS_XY_STEP),
            self.y.rem_euclid(COORDS_XY_STEP),
        )
    }

    pub fn rotated(self, rotation: Rotation) -> WorldCoords {
        let (x, y) = rotate_coords(self.x, self.y, rotation);
        WorldCoords { x, y }
    }
}

/// One of the four orthogonal camera rotations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    R0,
    R1,
    R2,
    R3,
}

impl Rotation {
    pub const ALL: [Rotation; 4] = [Rotation::R0, Rotation::R1, Rotation::R2, Rotation::R3];

    pub fn index(self) -> u8 {
        match self {
            Rotation::R0 => 0,
            Rotation::R1 => 1,
            Rotation::R2 => 2,
            Rotation::R3 => 3,
        }
    }

    pub fn from_index(index: u8) -> Self {
        match index & 3 {
            0 => Rotation::R0,
            1 => Rotation::R1,
            2 => Rotation::R2,
            _ => Rotation::R3,
        }
    }

    pub fn inverse(self) -> Self {
        Rotation::from_index((4 - self.index()) & 3)
    }
}

/// Rotate an element's stored direction into view space.
pub fn direction_with_rotation(direction: u8, rotation: Rotation) -> u8 {
    (direction + rotation.index()) & 3
}

/// Rotate map-relative coordinates by a camera rotation.
pub fn rotate_coords(x: i32, y: i32, rotation: Rotation) -> (i32, i32) {
    match rotation {
        Rotation::R0 => (x, y),
        Rotation::R1 => (y, -x),
        Rotation::R2 => (-x, -y),
        Rotation::R3 => (-y, x),
    }
}

/// Project a world position to isometric screen coordinates for a rotation.
pub fn world_to_screen(x: i32, y: i32, z: i32, rotation: Rotation) -> (i32, i32) {
    match rotation {
        Rotation::R0 => (y - x, (y + x) / 2 - z),
        Rotation::R1 => (-x - y, (y - x) / 2 - z),
        Rotation::R2 => (x - y, (-y - x) / 2 - z),
        Rotation::R3 => (x + y, (x - y) / 2 - z),
    }
}
