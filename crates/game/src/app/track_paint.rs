use engine::{
    rotate_segments, wooden_a_supports_paint_setup, PaintParams, PaintRegistry, PaintSession,
    Rotation, Segments, TileElementType,
};

/// Track type ids for the shapes the demo park builds.
pub const TRACK_FLAT: u8 = 0;
pub const TRACK_25_DEG_UP: u8 = 1;
pub const TRACK_25_DEG_DOWN: u8 = 2;
pub const TRACK_QUARTER_TURN_1_TILE: u8 = 3;

/// Base image of the demo track sprite family.
pub const SPR_TRACK_BASE: u32 = 28000;

const TUNNEL_FLAT: u8 = 0;
const TUNNEL_SLOPED_START: u8 = 1;
const TUNNEL_SLOPED_END: u8 = 2;

const SUPPORT_CLEARANCE: i32 = 2;

/// Register the paint callbacks for every track shape the game lays down.
pub fn register_track_callbacks(registry: &mut PaintRegistry) {
    registry.register(TileElementType::Track, TRACK_FLAT, paint_track_flat);
    registry.register(TileElementType::Track, TRACK_25_DEG_UP, paint_track_25_deg_up);
    registry.register(TileElementType::Track, TRACK_25_DEG_DOWN, paint_track_25_deg_down);
    registry.register(
        TileElementType::Track,
        TRACK_QUARTER_TURN_1_TILE,
        paint_track_quarter_turn_1_tile,
    );
}

/// Flat straight piece: one sprite per axis, supports under both rails,
/// full segment coverage, tunnel mouths level with the track.
fn paint_track_flat(session: &mut PaintSession, params: &PaintParams) {
    let image = SPR_TRACK_BASE + u32::from(params.direction & 1);
    session.add_image_as_parent(
        image,
        (0, 6, params.height),
        (32, 20, 3),
        (0, 6, params.height),
    );

    wooden_a_supports_paint_setup(session, params.direction & 1, params.height);
    session.set_segment_support_height(
        Segments::ALL,
        (params.height + SUPPORT_CLEARANCE) as u16,
        0x20,
    );
    session.push_tunnel_rotated(params.direction, params.height, TUNNEL_FLAT);
}

fn paint_track_25_deg_up(session: &mut PaintSession, params: &PaintParams) {
    let image = SPR_TRACK_BASE + 2 + u32::from(params.direction);
    session.add_image_as_parent(
        image,
        (0, 6, params.height),
        (32, 20, 11),
        (0, 6, params.height),
    );

    wooden_a_supports_paint_setup(session, params.direction & 1, params.height);
    session.set_segment_support_height(
        Segments::ALL,
        (params.height + 8 + SUPPORT_CLEARANCE) as u16,
        0x20,
    );
    match params.direction & 3 {
        0 => session.push_tunnel_left(params.height - 8, TUNNEL_SLOPED_START),
        1 => session.push_tunnel_right(params.height + 8, TUNNEL_SLOPED_END),
        2 => session.push_tunnel_left(params.height + 8, TUNNEL_SLOPED_END),
        _ => session.push_tunnel_right(params.height - 8, TUNNEL_SLOPED_START),
    }
}

fn paint_track_25_deg_down(session: &mut PaintSession, params: &PaintParams) {
    // A downhill piece is the uphill piece seen from the opposite end.
    let flipped = PaintParams {
        direction: (params.direction + 2) & 3,
        ..*params
    };
    paint_track_25_deg_up(session, &flipped);
}

/// Small curve: claims only the segments along the diagonal of travel, so
/// supports can still rise through the outside corner.
fn paint_track_quarter_turn_1_tile(session: &mut PaintSession, params: &PaintParams) {
    let image = SPR_TRACK_BASE + 6 + u32::from(params.direction);
    session.add_image_as_parent(
        image,
        (0, 0, params.height),
        (28, 28, 3),
        (2, 2, params.height),
    );

    wooden_a_supports_paint_setup(session, params.direction & 1, params.height);
    let rotation = Rotation::from_index(params.direction);
    session.set_segment_support_height(
        rotate_segments(Segments::B4 | Segments::C4 | Segments::CC, rotation),
        (params.height + SUPPORT_CLEARANCE) as u16,
        0x20,
    );
    if params.direction & 3 == 0 {
        session.push_tunnel_left(params.height, TUNNEL_FLAT);
    }
    if params.direction & 3 == 3 {
        session.push_tunnel_right(params.height, TUNNEL_FLAT);
    }
}
