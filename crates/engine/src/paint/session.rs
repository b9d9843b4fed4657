use tracing::warn;

use crate::world::{rotate_coords, world_to_screen, Rotation, TileCoords, WorldCoords};

/// Hard cap on draw primitives per painted frame.
pub const MAX_PAINT_ENTRIES: usize = 4000;

/// Number of depth buckets primitives are hashed into before arranging.
pub const MAX_PAINT_QUADRANTS: usize = 512;

/// Tunnel-mouth bookkeeping entries per tile side.
pub const MAX_TUNNELS_PER_SIDE: usize = 65;

/// Nominal half-extent of a sprite, used for screen culling in place of
/// real sprite metrics (rasterization is the backend's concern).
const SPRITE_NOMINAL_HALF_EXTENT: i32 = 128;

/// Screen-space window the traversal paints into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// What a primitive belongs to, for hit-testing and view filters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InteractionItem {
    #[default]
    None,
    Terrain,
    Sprite,
    Ride,
    Water,
    Scenery,
    Footpath,
    ParkEntrance,
    Wall,
    LargeScenery,
    Banner,
}

/// Map-space occlusion volume of a primitive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoundBox {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub x_end: i32,
    pub y_end: i32,
    pub z_end: i32,
}

/// One emitted draw primitive.
#[derive(Debug, Clone, Copy)]
pub struct PaintEntry {
    pub image_id: u32,
    pub screen_x: i32,
    pub screen_y: i32,
    pub bounds: BoundBox,
    pub map_position: TileCoords,
    pub item: InteractionItem,
    pub(crate) quadrant_index: u32,
    pub(crate) next_quadrant: Option<u32>,
    pub(crate) attached_head: Option<u32>,
    pub(crate) attached_tail: Option<u32>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct AttachedImage {
    pub image_id: u32,
    pub dx: i32,
    pub dy: i32,
    pub next: Option<u32>,
}

/// Flat draw call produced by [`PaintSession::arrange`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawCommand {
    pub image_id: u32,
    pub x: i32,
    pub y: i32,
}

/// Where a track element passes under the surface on one tile side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TunnelEntry {
    pub height: i32,
    pub tunnel_type: u8,
}

/// General support state set by the surface painter and consumed by the
/// support-setup calls of later elements on the same tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupportHeight {
    pub height: u16,
    pub slope: u8,
}

pub(crate) const SUPPORT_SLOPE_UNSET: u8 = 0x20;

/// Per-segment support state: the highest already-occupied height of one of
/// the 9 sub-tile segments. `u16::MAX` means no element claimed it yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentSupportHeight {
    pub height: u16,
    pub slope: u8,
}

impl SegmentSupportHeight {
    fn unset() -> Self {
        Self {
            height: u16::MAX,
            slope: 0,
        }
    }
}

/// Per-frame paint state: the primitive arena, depth quadrants, and the
/// per-tile support/tunnel bookkeeping paint callbacks read and write.
#[derive(Debug)]
pub struct PaintSession {
    viewport: Viewport,
    rotation: Rotation,
    entries: Vec<PaintEntry>,
    attached: Vec<AttachedImage>,
    quadrant_heads: Vec<Option<u32>>,
    quadrant_back_index: u32,
    quadrant_front_index: u32,
    last_parent: Option<u32>,
    arena_exhausted: bool,

    map_position: TileCoords,
    sprite_position: WorldCoords,
    interaction_item: InteractionItem,
    support: SupportHeight,
    support_segments: [SegmentSupportHeight; 9],
    tunnels_left: Vec<TunnelEntry>,
    tunnels_right: Vec<TunnelEntry>,
}

impl PaintSession {
    pub fn new(viewport: Viewport, rotation: Rotation) -> Self {
        Self {
            viewport,
            rotation,
            entries: Vec::new(),
            attached: Vec::new(),
            quadrant_heads: vec![None; MAX_PAINT_QUADRANTS],
            quadrant_back_index: u32::MAX,
            quadrant_front_index: 0,
            last_parent: None,
            arena_exhausted: false,
            map_position: TileCoords::default(),
            sprite_position: WorldCoords::default(),
            interaction_item: InteractionItem::None,
            support: SupportHeight {
                height: 0,
                slope: SUPPORT_SLOPE_UNSET,
            },
            support_segments: [SegmentSupportHeight::unset(); 9],
            tunnels_left: Vec::new(),
            tunnels_right: Vec::new(),
        }
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn entries(&self) -> &[PaintEntry] {
        &self.entries
    }

    pub fn map_position(&self) -> TileCoords {
        self.map_position
    }

    /// Whether the primitive arena filled up this frame.
    pub fn arena_exhausted(&self) -> bool {
        self.arena_exhausted
    }

    pub fn support(&self) -> SupportHeight {
        self.support
    }

    pub fn set_support(&mut self, support: SupportHeight) {
        self.support = support;
    }

    pub fn support_segments(&self) -> &[SegmentSupportHeight; 9] {
        &self.support_segments
    }

    pub(crate) fn support_segments_mut(&mut self) -> &mut [SegmentSupportHeight; 9] {
        &mut self.support_segments
    }

    pub fn tunnels_left(&self) -> &[TunnelEntry] {
        &self.tunnels_left
    }

    pub fn tunnels_right(&self) -> &[TunnelEntry] {
        &self.tunnels_right
    }

    pub fn set_interaction_item(&mut self, item: InteractionItem) {
        self.interaction_item = item;
    }

    /// Begin painting a tile: anchor primitive emission to its world origin
    /// and reset the per-tile support and tunnel bookkeeping.
    pub fn start_tile(&mut self, coords: TileCoords) {
        self.map_position = coords;
        self.sprite_position = coords.to_world();
        self.interaction_item = InteractionItem::None;
        self.support = SupportHeight {
            height: 0,
            slope: SUPPORT_SLOPE_UNSET,
        };
        self.support_segments = [SegmentSupportHeight::unset(); 9];
        self.tunnels_left.clear();
        self.tunnels_right.clear();
        self.last_parent = None;
    }

    /// Anchor primitive emission to a free-standing entity position
    /// instead of the current tile origin.
    pub(crate) fn anchor_sprite(&mut self, world: WorldCoords) {
        self.sprite_position = world;
    }

    /// Emit a primitive with its own occlusion bound box.
    ///
    /// `offset` and the bound box are view-relative; both are rotated back
    /// into map space so occlusion sorting works in one coordinate frame.
    /// Returns `None` when the arena is full or the sprite is off-screen;
    /// emitting nothing is always legitimate.
    pub fn add_image_as_parent(
        &mut self,
        image_id: u32,
        offset: (i32, i32, i32),
        bound_box_size: (i32, i32, i32),
        bound_box_offset: (i32, i32, i32),
    ) -> Option<u32> {
        if self.entries.len() >= MAX_PAINT_ENTRIES {
            if !self.arena_exhausted {
                warn!("paint entry arena exhausted");
                self.arena_exhausted = true;
            }
            return None;
        }

        let inverse = self.rotation.inverse();
        let (ox, oy) = rotate_coords(offset.0, offset.1, inverse);
        let world_x = ox + self.sprite_position.x;
        let world_y = oy + self.sprite_position.y;

        let (screen_x, screen_y) = world_to_screen(world_x, world_y, offset.2, self.rotation);
        let view = self.viewport;
        if screen_x + SPRITE_NOMINAL_HALF_EXTENT <= view.x
            || screen_y + SPRITE_NOMINAL_HALF_EXTENT <= view.y
            || screen_x - SPRITE_NOMINAL_HALF_EXTENT >= view.x + view.width
            || screen_y - SPRITE_NOMINAL_HALF_EXTENT >= view.y + view.height
        {
            return None;
        }

        let (mut size_x, mut size_y) = (bound_box_size.0, bound_box_size.1);
        match self.rotation {
            Rotation::R0 => {
                size_x -= 1;
                size_y -= 1;
            }
            Rotation::R1 => size_x -= 1,
            Rotation::R2 => {}
            Rotation::R3 => size_y -= 1,
        }
        let (size_x, size_y) = rotate_coords(size_x, size_y, inverse);
        let (box_x, box_y) = rotate_coords(bound_box_offset.0, bound_box_offset.1, inverse);

        let bounds = BoundBox {
            x: box_x + self.sprite_position.x,
            y: box_y + self.sprite_position.y,
            z: bound_box_offset.2,
            x_end: size_x + box_x + self.sprite_position.x,
            y_end: size_y + box_y + self.sprite_position.y,
            z_end: bound_box_offset.2 + bound_box_size.2,
        };

        let index = self.entries.len() as u32;
        let quadrant_index = self.quadrant_for(bounds.x, bounds.y);
        self.entries.push(PaintEntry {
            image_id,
            screen_x,
            screen_y,
            bounds,
            map_position: self.map_position,
            item: self.interaction_item,
            quadrant_index,
            next_quadrant: self.quadrant_heads[quadrant_index as usize],
            attached_head: None,
            attached_tail: None,
        });
        self.quadrant_heads[quadrant_index as usize] = Some(index);
        self.quadrant_back_index = self.quadrant_back_index.min(quadrant_index);
        self.quadrant_front_index = self.quadrant_front_index.max(quadrant_index);
        self.last_parent = Some(index);
        Some(index)
    }

    /// Attach a sprite to the most recent parent primitive; it is drawn
    /// immediately after the parent at a screen offset and shares its
    /// occlusion volume.
    pub fn add_image_as_child(&mut self, image_id: u32, dx: i32, dy: i32) -> bool {
        let Some(parent) = self.last_parent else {
            return false;
        };
        if self.attached.len() >= MAX_PAINT_ENTRIES {
            return false;
        }
        let attached_index = self.attached.len() as u32;
        self.attached.push(AttachedImage {
            image_id,
            dx,
            dy,
            next: None,
        });
        let entry = &mut self.entries[parent as usize];
        match entry.attached_tail {
            Some(tail) => {
                self.attached[tail as usize].next = Some(attached_index);
            }
            None => entry.attached_head = Some(attached_index),
        }
        self.entries[parent as usize].attached_tail = Some(attached_index);
        true
    }

    /// Record a tunnel mouth on the left-facing tile side.
    pub fn push_tunnel_left(&mut self, height: i32, tunnel_type: u8) {
        if self.tunnels_left.len() >= MAX_TUNNELS_PER_SIDE {
            warn!("left tunnel list full, dropping entry");
            return;
        }
        self.tunnels_left.push(TunnelEntry {
            height,
            tunnel_type,
        });
    }

    /// Record a tunnel mouth on the right-facing tile side.
    pub fn push_tunnel_right(&mut self, height: i32, tunnel_type: u8) {
        if self.tunnels_right.len() >= MAX_TUNNELS_PER_SIDE {
            warn!("right tunnel list full, dropping entry");
            return;
        }
        self.tunnels_right.push(TunnelEntry {
            height,
            tunnel_type,
        });
    }

    /// Record a tunnel mouth on the side a track direction exits through.
    pub fn push_tunnel_rotated(&mut self, direction: u8, height: i32, tunnel_type: u8) {
        if direction & 1 == 0 {
            self.push_tunnel_left(height, tunnel_type);
        } else {
            self.push_tunnel_right(height, tunnel_type);
        }
    }

    fn quadrant_for(&self, bound_x: i32, bound_y: i32) -> u32 {
        let (x, y) = rotate_coords(bound_x, bound_y, self.rotation);
        let hash = match self.rotation {
            Rotation::R0 => x + y,
            Rotation::R1 | Rotation::R3 => x + 0x2000 + y,
            Rotation::R2 => x + 0x4000 + y,
        };
        (hash / 32).clamp(0, MAX_PAINT_QUADRANTS as i32 - 1) as u32
    }

    pub(crate) fn quadrant_heads(&self) -> &[Option<u32>] {
        &self.quadrant_heads
    }

    pub(crate) fn quadrant_back_index(&self) -> u32 {
        self.quadrant_back_index
    }

    pub(crate) fn quadrant_front_index(&self) -> u32 {
        self.quadrant_front_index
    }

    pub(crate) fn attached_images(&self) -> &[AttachedImage] {
        &self.attached
    }
}
