mod arrange;
mod registry;
mod session;
mod supports;
mod tile_paint;
mod traversal;

pub use registry::{PaintFn, PaintParams, PaintRegistry};
pub use session::{
    BoundBox, DrawCommand, InteractionItem, PaintEntry, PaintSession, SegmentSupportHeight,
    SupportHeight, TunnelEntry, Viewport, MAX_PAINT_ENTRIES, MAX_PAINT_QUADRANTS,
    MAX_TUNNELS_PER_SIDE,
};
pub use supports::{
    metal_a_supports_paint_setup, rotate_segments, wooden_a_supports_paint_setup, Segment,
    Segments, SPR_METAL_SUPPORT_BASE, SPR_WOODEN_SUPPORT_BASE,
};
pub use tile_paint::{SPR_FOOTPATH_BASE, SPR_TERRAIN_BASE, SPR_WATER_OVERLAY};
pub use traversal::SPR_ENTITY_BASE;
