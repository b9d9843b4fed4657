use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Base height, in z-steps, of the surface synthesized for a fresh map.
pub const DEFAULT_SURFACE_HEIGHT: u8 = 14;

/// Base height written into storage slots that no longer hold an element.
pub const DEAD_ELEMENT_HEIGHT: u8 = u8::MAX;

bitflags! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct TileElementFlags: u8 {
        /// Preview-only element, excluded from normal game logic.
        const GHOST = 0b0001;
        /// Final element of its tile's contiguous storage run.
        const LAST_FOR_TILE = 0b0010;
    }
}

bitflags! {
    /// Which sub-tile quadrants an element occupies, for collision checks.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct QuadrantMask: u8 {
        const SW = 0b0001;
        const SE = 0b0010;
        const NE = 0b0100;
        const NW = 0b1000;
    }
}

impl Default for QuadrantMask {
    fn default() -> Self {
        QuadrantMask::all()
    }
}

bitflags! {
    /// Surface corner-slope encoding. Four corner bits plus the flag that
    /// doubles a one-corner-down slope to span two height levels.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Slope: u8 {
        const N_CORNER_UP = 0b0000_0001;
        const E_CORNER_UP = 0b0000_0010;
        const S_CORNER_UP = 0b0000_0100;
        const W_CORNER_UP = 0b0000_1000;
        const DOUBLE_HEIGHT = 0b0001_0000;

        const NE_SIDE_UP = Self::N_CORNER_UP.bits() | Self::E_CORNER_UP.bits();
        const SE_SIDE_UP = Self::S_CORNER_UP.bits() | Self::E_CORNER_UP.bits();
        const SW_SIDE_UP = Self::S_CORNER_UP.bits() | Self::W_CORNER_UP.bits();
        const NW_SIDE_UP = Self::N_CORNER_UP.bits() | Self::W_CORNER_UP.bits();

        const N_CORNER_DOWN = Self::E_CORNER_UP.bits() | Self::S_CORNER_UP.bits() | Self::W_CORNER_UP.bits();
        const E_CORNER_DOWN = Self::N_CORNER_UP.bits() | Self::S_CORNER_UP.bits() | Self::W_CORNER_UP.bits();
        const S_CORNER_DOWN = Self::N_CORNER_UP.bits() | Self::E_CORNER_UP.bits() | Self::W_CORNER_UP.bits();
        const W_CORNER_DOWN = Self::N_CORNER_UP.bits() | Self::E_CORNER_UP.bits() | Self::S_CORNER_UP.bits();

        const W_E_VALLEY = Self::W_CORNER_UP.bits() | Self::E_CORNER_UP.bits();
        const N_S_VALLEY = Self::N_CORNER_UP.bits() | Self::S_CORNER_UP.bits();

        const ALL_CORNERS_UP = 0b0000_1111;
    }
}

impl Slope {
    /// The corner bits without the double-height flag.
    pub fn corners(self) -> Slope {
        self & Slope::ALL_CORNERS_UP
    }

    pub fn is_flat(self) -> bool {
        self.corners().is_empty()
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Ownership: u8 {
        const OWNED = 0b0001;
        const AVAILABLE = 0b0010;
        const CONSTRUCTION_RIGHTS_OWNED = 0b0100;
        const CONSTRUCTION_RIGHTS_AVAILABLE = 0b1000;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RideId(pub u16);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BannerId(pub u16);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerrainSurface {
    #[default]
    Grass,
    Sand,
    Dirt,
    Rock,
    Martian,
    GrassClumps,
    Ice,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerrainEdge {
    #[default]
    Rock,
    WoodRed,
    WoodBlack,
    Ice,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceElement {
    pub slope: Slope,
    pub terrain: TerrainSurface,
    pub edge: TerrainEdge,
    pub grass_length: u8,
    pub ownership: Ownership,
    /// Water surface level in z-steps; zero means no water.
    pub water_height: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathElement {
    pub surface_type: u8,
    /// Connected edge bits 0..=3, corner bits follow the same winding.
    pub edges: u8,
    pub corners: u8,
    pub sloped: bool,
    pub slope_direction: u8,
    pub queue: bool,
    pub queue_ride: Option<RideId>,
    pub addition: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackElement {
    pub ride: RideId,
    pub ride_type: u8,
    pub track_type: u8,
    pub sequence: u8,
    pub direction: u8,
    pub colour_scheme: u8,
    pub station: Option<u8>,
    pub chain_lift: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmallSceneryElement {
    pub object_type: u16,
    pub direction: u8,
    pub quadrant: u8,
    pub age: u8,
    pub primary_colour: u8,
    pub secondary_colour: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LargeSceneryElement {
    pub object_type: u16,
    pub direction: u8,
    pub sequence: u8,
    pub primary_colour: u8,
    pub secondary_colour: u8,
    pub banner: Option<BannerId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WallElement {
    pub object_type: u16,
    /// Edge of the tile the wall stands on.
    pub direction: u8,
    pub slope: u8,
    pub primary_colour: u8,
    pub secondary_colour: u8,
    pub banner: Option<BannerId>,
    pub animation_frame: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntranceKind {
    RideEntrance,
    RideExit,
    ParkEntrance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntranceElement {
    pub kind: EntranceKind,
    pub direction: u8,
    pub ride: Option<RideId>,
    pub station: u8,
    pub sequence: u8,
    pub path_type: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BannerElement {
    pub banner: BannerId,
    /// Corner post the banner stands on.
    pub position: u8,
    pub allowed_edges: u8,
}

/// Type tag of a tile element, derivable from its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileElementType {
    Surface,
    Path,
    Track,
    SmallScenery,
    LargeScenery,
    Wall,
    Entrance,
    Banner,
}

/// Per-type payload of a tile element. Every element is exactly one of
/// these; accessors on [`TileElement`] perform the checked downcasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileElementPayload {
    Surface(SurfaceElement),
    Path(PathElement),
    Track(TrackElement),
    SmallScenery(SmallSceneryElement),
    LargeScenery(LargeSceneryElement),
    Wall(WallElement),
    Entrance(EntranceElement),
    Banner(BannerElement),
}

impl TileElementPayload {
    pub fn element_type(&self) -> TileElementType {
        match self {
            TileElementPayload::Surface(_) => TileElementType::Surface,
            TileElementPayload::Path(_) => TileElementType::Path,
            TileElementPayload::Track(_) => TileElementType::Track,
            TileElementPayload::SmallScenery(_) => TileElementType::SmallScenery,
            TileElementPayload::LargeScenery(_) => TileElementType::LargeScenery,
            TileElementPayload::Wall(_) => TileElementType::Wall,
            TileElementPayload::Entrance(_) => TileElementType::Entrance,
            TileElementPayload::Banner(_) => TileElementType::Banner,
        }
    }
}

/// One layer of one map tile. Elements live by value inside the map's flat
/// storage array; a tile's content is a contiguous run of these terminated
/// by the LAST_FOR_TILE flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileElement {
    pub base_height: u8,
    pub clearance_height: u8,
    pub flags: TileElementFlags,
    pub occupied_quadrants: QuadrantMask,
    pub payload: TileElementPayload,
}

impl TileElement {
    pub fn new(base_height: u8, payload: TileElementPayload) -> Self {
        Self {
            base_height,
            clearance_height: base_height,
            flags: TileElementFlags::empty(),
            occupied_quadrants: QuadrantMask::all(),
            payload,
        }
    }

    /// The flat grass surface every fresh tile starts with.
    pub fn default_surface() -> Self {
        TileElement {
            base_height: DEFAULT_SURFACE_HEIGHT,
            clearance_height: DEFAULT_SURFACE_HEIGHT,
            flags: TileElementFlags::LAST_FOR_TILE,
            occupied_quadrants: QuadrantMask::all(),
            payload: TileElementPayload::Surface(SurfaceElement::default()),
        }
    }

    pub fn element_type(&self) -> TileElementType {
        self.payload.element_type()
    }

    pub fn is_ghost(&self) -> bool {
        self.flags.contains(TileElementFlags::GHOST)
    }

    pub fn is_last_for_tile(&self) -> bool {
        self.flags.contains(TileElementFlags::LAST_FOR_TILE)
    }

    pub fn set_last_for_tile(&mut self, last: bool) {
        self.flags.set(TileElementFlags::LAST_FOR_TILE, last);
    }

    pub fn set_ghost(&mut self, ghost: bool) {
        self.flags.set(TileElementFlags::GHOST, ghost);
    }

    pub fn as_surface(&self) -> Option<&SurfaceElement> {
        match &self.payload {
            TileElementPayload::Surface(surface) => Some(surface),
            _ => None,
        }
    }

    pub fn as_surface_mut(&mut self) -> Option<&mut SurfaceElement> {
        match &mut self.payload {
            TileElementPayload::Surface(surface) => Some(surface),
            _ => None,
        }
    }

    pub fn as_path(&self) -> Option<&PathElement> {
        match &self.payload {
            TileElementPayload::Path(path) => Some(path),
            _ => None,
        }
    }

    pub fn as_path_mut(&mut self) -> Option<&mut PathElement> {
        match &mut self.payload {
            TileElementPayload::Path(path) => Some(path),
            _ => None,
        }
    }

    pub fn as_track(&self) -> Option<&TrackElement> {
        match &self.payload {
            TileElementPayload::Track(track) => Some(track),
            _ => None,
        }
    }

    pub fn as_track_mut(&mut self) -> Option<&mut TrackElement> {
        match &mut self.payload {
            TileElementPayload::Track(track) => Some(track),
            _ => None,
        }
    }

    pub fn as_small_scenery(&self) -> Option<&SmallSceneryElement> {
        match &self.payload {
            TileElementPayload::SmallScenery(scenery) => Some(scenery),
            _ => None,
        }
    }

    pub fn as_large_scenery(&self) -> Option<&LargeSceneryElement> {
        match &self.payload {
            TileElementPayload::LargeScenery(scenery) => Some(scenery),
            _ => None,
        }
    }

    pub fn as_wall(&self) -> Option<&WallElement> {
        match &self.payload {
            TileElementPayload::Wall(wall) => Some(wall),
            _ => None,
        }
    }

    pub fn as_entrance(&self) -> Option<&EntranceElement> {
        match &self.payload {
            TileElementPayload::Entrance(entrance) => Some(entrance),
            _ => None,
        }
    }

    pub fn as_banner(&self) -> Option<&BannerElement> {
        match &self.payload {
            TileElementPayload::Banner(banner) => Some(banner),
            _ => None,
        }
    }
}
