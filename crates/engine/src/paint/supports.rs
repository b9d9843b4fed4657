use bitflags::bitflags;

use crate::world::{Rotation, LAND_HEIGHT_STEP};

use super::session::{PaintSession, SegmentSupportHeight, SUPPORT_SLOPE_UNSET};

/// Base image of the wooden support leg family.
pub const SPR_WOODEN_SUPPORT_BASE: u32 = 3392;

/// Base image of the metal support leg families.
pub const SPR_METAL_SUPPORT_BASE: u32 = 3243;

bitflags! {
    /// The 9 sub-tile support segments, named after their historical
    /// offsets. The low byte is the outer ring in rotation order; the
    /// centre segment sits alone in bit 8 and is rotation-invariant.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct Segments: u16 {
        const B4 = 1 << 0;
        const B8 = 1 << 1;
        const BC = 1 << 2;
        const C0 = 1 << 3;
        const C8 = 1 << 4;
        const CC = 1 << 5;
        const D0 = 1 << 6;
        const D4 = 1 << 7;
        const C4 = 1 << 8;

        const ALL = 0x1FF;
    }
}

/// One named segment, indexable into the session's support array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    B4,
    B8,
    BC,
    C0,
    C4,
    C8,
    CC,
    D0,
    D4,
}

impl Segment {
    pub const ALL: [Segment; 9] = [
        Segment::B4,
        Segment::B8,
        Segment::BC,
        Segment::C0,
        Segment::C4,
        Segment::C8,
        Segment::CC,
        Segment::D0,
        Segment::D4,
    ];

    /// Index into the session's 9-entry segment array.
    pub fn index(self) -> usize {
        match self {
            Segment::B4 => 0,
            Segment::B8 => 1,
            Segment::BC => 2,
            Segment::C0 => 3,
            Segment::C4 => 4,
            Segment::C8 => 5,
            Segment::CC => 6,
            Segment::D0 => 7,
            Segment::D4 => 8,
        }
    }

    pub fn bit(self) -> Segments {
        match self {
            Segment::B4 => Segments::B4,
            Segment::B8 => Segments::B8,
            Segment::BC => Segments::BC,
            Segment::C0 => Segments::C0,
            Segment::C4 => Segments::C4,
            Segment::C8 => Segments::C8,
            Segment::CC => Segments::CC,
            Segment::D0 => Segments::D0,
            Segment::D4 => Segments::D4,
        }
    }
}

/// Sub-tile anchor of each segment's support leg.
const SEGMENT_SUPPORT_OFFSETS: [(i32, i32); 9] = [
    (4, 4),
    (28, 4),
    (4, 28),
    (28, 28),
    (16, 16),
    (16, 4),
    (4, 16),
    (28, 16),
    (16, 28),
];

/// Rotate a segment set into another camera rotation. The outer ring
/// rotates two ring positions per quarter turn; the centre is fixed.
/// Applying this with the inverse rotation canonicalises recorded
/// segment calls for cross-rotation comparison.
pub fn rotate_segments(segments: Segments, rotation: Rotation) -> Segments {
    let ring = (segments.bits() & 0xFF) as u8;
    let rotated = ring.rotate_left(2 * u32::from(rotation.index()));
    Segments::from_bits_truncate((segments.bits() & 0x100) | u16::from(rotated))
}

impl PaintSession {
    /// Record the highest occupied height for a set of segments. A height
    /// of `u16::MAX` marks the segments as unsupportable.
    pub fn set_segment_support_height(&mut self, segments: Segments, height: u16, slope: u8) {
        let array = self.support_segments_mut();
        for segment in Segment::ALL {
            if segments.contains(segment.bit()) {
                array[segment.index()] = SegmentSupportHeight { height, slope };
            }
        }
    }

    /// Record the general support height the surface painter establishes.
    pub fn set_general_support_height(&mut self, height: u16, slope: u8) {
        self.set_support(super::session::SupportHeight { height, slope });
    }
}

/// Draw wooden support legs from the tile's general support height up to
/// `height` (world units). Returns whether anything was drawn; painting
/// nothing is the normal outcome on flat ground level with the track.
pub fn wooden_a_supports_paint_setup(
    session: &mut PaintSession,
    support_type: u8,
    height: i32,
) -> bool {
    let support = session.support();
    if support.slope == SUPPORT_SLOPE_UNSET {
        // No surface painted yet on this tile; nowhere to stand.
        return false;
    }
    let base = i32::from(support.height);
    if height <= base {
        return false;
    }

    let mut painted = false;
    let mut z = base;
    while z + LAND_HEIGHT_STEP <= height {
        let image = SPR_WOODEN_SUPPORT_BASE + u32::from(support_type);
        session.add_image_as_parent(
            image,
            (0, 0, z),
            (32, 32, LAND_HEIGHT_STEP - 1),
            (0, 0, z),
        );
        painted = true;
        z += LAND_HEIGHT_STEP;
    }
    painted
}

/// Draw a metal support leg on one segment, from the segment's recorded
/// height up to `height`, and claim the segment up to the new top.
pub fn metal_a_supports_paint_setup(
    session: &mut PaintSession,
    metal_type: u8,
    segment: Segment,
    height: i32,
) -> bool {
    let state = session.support_segments()[segment.index()];
    if state.height == u16::MAX {
        return false;
    }
    let base = i32::from(state.height);
    if height <= base {
        return false;
    }

    let (sx, sy) = SEGMENT_SUPPORT_OFFSETS[segment.index()];
    let mut z = base;
    let mut painted = false;
    while z + LAND_HEIGHT_STEP <= height {
        let image = SPR_METAL_SUPPORT_BASE + u32::from(metal_type);
        session.add_image_as_parent(image, (sx, sy, z), (1, 1, LAND_HEIGHT_STEP - 1), (sx, sy, z));
        painted = true;
        z += LAND_HEIGHT_STEP;
    }

    session.support_segments_mut()[segment.index()] = SegmentSupportHeight {
        height: height as u16,
        slope: 0,
    };
    painted
}
