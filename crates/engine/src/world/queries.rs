use tracing::debug;

use super::coords::{
    TileCoords, WorldCoords, COORDS_XY_STEP, COORDS_Z_STEP, DEFAULT_LAND_HEIGHT,
    LAND_HEIGHT_STEP, MAXIMUM_MAP_SIZE_TECHNICAL,
};
use super::map::{ElementIndex, Map};
use super::tile_element::{
    QuadrantMask, Slope, SurfaceElement, TileElement, TileElementType,
};

/// Highest sub-tile offset on either axis; the far corner of a tile.
const TILE_MAX_SUB: i32 = COORDS_XY_STEP - 1;

impl Map {
    /// All non-ghost elements of one type on a tile.
    pub fn elements_of_type(
        &self,
        coords: TileCoords,
        element_type: TileElementType,
    ) -> impl Iterator<Item = (ElementIndex, &TileElement)> {
        self.tile_elements(coords)
            .filter(move |(_, element)| {
                element.element_type() == element_type && !element.is_ghost()
            })
    }

    /// Ghost-aware variant used by preview rendering.
    pub fn elements_of_type_with_ghosts(
        &self,
        coords: TileCoords,
        element_type: TileElementType,
    ) -> impl Iterator<Item = (ElementIndex, &TileElement)> {
        self.tile_elements(coords)
            .filter(move |(_, element)| element.element_type() == element_type)
    }

    /// First surface element of a tile's run.
    pub fn find_surface(&self, coords: TileCoords) -> Option<(ElementIndex, &TileElement)> {
        self.tile_elements(coords)
            .find(|(_, element)| element.element_type() == TileElementType::Surface)
    }

    pub fn surface_at(&self, coords: TileCoords) -> Option<&SurfaceElement> {
        self.find_surface(coords)
            .and_then(|(_, element)| element.as_surface())
    }

    pub fn find_path_at_height(
        &self,
        coords: TileCoords,
        base_height: u8,
    ) -> Option<(ElementIndex, &TileElement)> {
        self.elements_of_type(coords, TileElementType::Path)
            .find(|(_, element)| element.base_height == base_height)
    }

    /// Track element matching a ride and track type, optionally pinned to a
    /// sequence index.
    pub fn find_track(
        &self,
        coords: TileCoords,
        ride: super::tile_element::RideId,
        track_type: u8,
        sequence: Option<u8>,
    ) -> Option<(ElementIndex, &TileElement)> {
        self.elements_of_type(coords, TileElementType::Track)
            .find(|(_, element)| {
                let track = match element.as_track() {
                    Some(track) => track,
                    None => return false,
                };
                track.ride == ride
                    && track.track_type == track_type
                    && sequence.map(|wanted| track.sequence == wanted).unwrap_or(true)
            })
    }

    pub fn find_entrance(
        &self,
        coords: TileCoords,
        kind: super::tile_element::EntranceKind,
    ) -> Option<(ElementIndex, &TileElement)> {
        self.elements_of_type(coords, TileElementType::Entrance)
            .find(|(_, element)| {
                element
                    .as_entrance()
                    .map(|entrance| entrance.kind == kind)
                    .unwrap_or(false)
            })
    }

    /// Wall standing on a given edge of the tile.
    pub fn find_wall(
        &self,
        coords: TileCoords,
        direction: u8,
    ) -> Option<(ElementIndex, &TileElement)> {
        self.elements_of_type(coords, TileElementType::Wall)
            .find(|(_, element)| {
                element
                    .as_wall()
                    .map(|wall| wall.direction == direction & 3)
                    .unwrap_or(false)
            })
    }

    pub fn find_banner(
        &self,
        coords: TileCoords,
        base_height: u8,
        position: u8,
    ) -> Option<(ElementIndex, &TileElement)> {
        self.elements_of_type(coords, TileElementType::Banner)
            .find(|(_, element)| {
                element.base_height == base_height
                    && element
                        .as_banner()
                        .map(|banner| banner.position == position)
                        .unwrap_or(false)
            })
    }

    /// Interpolated land height, in world units, at an arbitrary world
    /// point. Pure; every placement and collision check builds on it.
    ///
    /// The surface slope mask drives a piecewise-linear profile across the
    /// tile: each raised corner lifts its quadrant toward a peak one land
    /// step up (two steps with the double-height flag).
    pub fn element_height(&self, world: WorldCoords) -> i32 {
        let bound = MAXIMUM_MAP_SIZE_TECHNICAL * COORDS_XY_STEP;
        if world.x < 0 || world.y < 0 || world.x >= bound || world.y >= bound {
            return DEFAULT_LAND_HEIGHT;
        }

        let (slope, base) = match self.find_surface(world.to_tile()) {
            Some((_, element)) => match element.as_surface() {
                Some(surface) => (
                    surface.slope,
                    i32::from(element.base_height) * COORDS_Z_STEP,
                ),
                None => return DEFAULT_LAND_HEIGHT,
            },
            None => return DEFAULT_LAND_HEIGHT,
        };

        let (xl, yl) = world.sub_tile();
        interpolate_surface_height(base, slope, xl, yl)
    }

    /// Water surface height in world units at a point; zero when dry.
    pub fn element_water_height(&self, world: WorldCoords) -> i32 {
        let surface = match self.surface_at(world.to_tile()) {
            Some(surface) => surface,
            None => return 0,
        };
        i32::from(surface.water_height) * LAND_HEIGHT_STEP
    }

    /// Clearance query for placement logic: is the vertical band
    /// `z_low..z_high` (in z-steps) free on the given quadrants?
    ///
    /// Walls are thin edge occupants and never block; ghosts never block.
    pub fn can_construct_at(
        &self,
        coords: TileCoords,
        z_low: u8,
        z_high: u8,
        quadrants: QuadrantMask,
    ) -> bool {
        if !coords.is_valid() {
            debug!(x = coords.x, y = coords.y, "clearance check outside technical bound");
            return false;
        }
        for (_, element) in self.tile_elements(coords) {
            if element.element_type() == TileElementType::Surface
                || element.element_type() == TileElementType::Wall
                || element.is_ghost()
            {
                continue;
            }
            let z_overlaps =
                z_low < element.clearance_height && z_high > element.base_height;
            let quadrants_overlap =
                !(element.occupied_quadrants & quadrants).is_empty();
            if z_overlaps && quadrants_overlap {
                return false;
            }
        }
        true
    }
}

/// Case analysis over the 16 legal slope encodings plus the double-height
/// diagonal flag. Sub-tile coordinates are `0..=31` on each axis.
fn interpolate_surface_height(base: i32, slope: Slope, xl: i32, yl: i32) -> i32 {
    let mut height = base;
    let corners = slope.corners();
    let double_height = slope.contains(Slope::DOUBLE_HEIGHT);

    // One corner up: the raised quadrant climbs toward its corner.
    if corners == Slope::N_CORNER_UP
        || corners == Slope::E_CORNER_UP
        || corners == Slope::S_CORNER_UP
        || corners == Slope::W_CORNER_UP
    {
        let quad = if corners == Slope::N_CORNER_UP {
            xl + yl - TILE_MAX_SUB
        } else if corners == Slope::E_CORNER_UP {
            xl - yl
        } else if corners == Slope::S_CORNER_UP {
            TILE_MAX_SUB - yl - xl
        } else {
            yl - xl
        };
        if quad > 0 {
            height += quad / 2;
        }
    }

    // One side up: a straight ramp across the whole tile.
    if corners == Slope::NE_SIDE_UP {
        height += xl / 2 + 1;
    } else if corners == Slope::SE_SIDE_UP {
        height += (TILE_MAX_SUB - yl) / 2;
    } else if corners == Slope::NW_SIDE_UP {
        height += yl / 2 + 1;
    } else if corners == Slope::SW_SIDE_UP {
        height += (TILE_MAX_SUB - xl) / 2;
    }

    // One corner down; the double-height flag stretches the slope across
    // two land steps along the diagonal.
    if corners == Slope::W_CORNER_DOWN
        || corners == Slope::S_CORNER_DOWN
        || corners == Slope::E_CORNER_DOWN
        || corners == Slope::N_CORNER_DOWN
    {
        let (quad_extra, quad) = if corners == Slope::W_CORNER_DOWN {
            (xl + TILE_MAX_SUB - yl, xl - yl)
        } else if corners == Slope::S_CORNER_DOWN {
            (xl + yl, xl + yl - TILE_MAX_SUB - 1)
        } else if corners == Slope::E_CORNER_DOWN {
            (TILE_MAX_SUB - xl + yl, yl - xl)
        } else {
            (
                (TILE_MAX_SUB - xl) + (TILE_MAX_SUB - yl),
                TILE_MAX_SUB - yl - xl - 1,
            )
        };

        if double_height {
            height += quad_extra / 2 + 1;
            return height;
        }
        // The tile sits at the next land level and descends into the
        // lowered corner.
        height += LAND_HEIGHT_STEP;
        if quad < 0 {
            height += quad / 2;
        }
    }

    // Valleys.
    if corners == Slope::W_E_VALLEY {
        if xl + yl <= TILE_MAX_SUB + 1 {
            return height;
        }
        let quad = TILE_MAX_SUB - xl - yl;
        if quad > 0 {
            height += quad / 2;
        }
    } else if corners == Slope::N_S_VALLEY {
        let quad = xl - yl;
        if quad > 0 {
            height += quad / 2;
        }
    }

    height
}
