use crate::world::Rotation;

use super::session::{BoundBox, DrawCommand, PaintSession};

const FLAG_NEXT: u8 = 1;
const FLAG_BIGGER: u8 = 2;
const FLAG_IDENTICAL: u8 = 4;

/// View-direction-specific test deciding whether `current` must be drawn
/// before `initial` for correct occlusion.
fn check_bounding_box(rotation: Rotation, initial: &BoundBox, current: &BoundBox) -> bool {
    match rotation {
        Rotation::R0 => {
            initial.z_end >= current.z
                && initial.y_end >= current.y
                && initial.x_end >= current.x
                && !(initial.z < current.z_end
                    && initial.y < current.y_end
                    && initial.x < current.x_end)
        }
        Rotation::R1 => {
            initial.z_end >= current.z
                && initial.y_end >= current.y
                && initial.x_end < current.x
                && !(initial.z < current.z_end
                    && initial.y < current.y_end
                    && initial.x >= current.x_end)
        }
        Rotation::R2 => {
            initial.z_end >= current.z
                && initial.y_end < current.y
                && initial.x_end < current.x
                && !(initial.z < current.z_end
                    && initial.y >= current.y_end
                    && initial.x >= current.x_end)
        }
        Rotation::R3 => {
            initial.z_end >= current.z
                && initial.y_end < current.y
                && initial.x_end >= current.x
                && !(initial.z < current.z_end
                    && initial.y >= current.y_end
                    && initial.x < current.x_end)
        }
    }
}

struct ArrangeState<'a> {
    next: Vec<Option<usize>>,
    flags: Vec<u8>,
    quadrant: &'a [u32],
    bounds: &'a [BoundBox],
    rotation: Rotation,
}

impl ArrangeState<'_> {
    /// One pass over the working window `[quadrant_index, quadrant_index+1]`
    /// of the chain: pull every primitive that occludes a later-drawn one in
    /// front of the group. Returns the node to resume the next pass from.
    fn arrange_quadrant(&mut self, start_node: usize, quadrant_index: u32, flag: u8) -> usize {
        // Skip to the first node at or beyond this quadrant.
        let mut ps = start_node;
        let mut ps_next;
        loop {
            ps_next = match self.next[ps] {
                Some(node) => node,
                None => return ps,
            };
            if quadrant_index > self.quadrant[ps_next] {
                ps = ps_next;
            } else {
                break;
            }
        }
        let ps_cache = ps;

        // Mark the working window: this quadrant and the one after it.
        let mut cursor = ps;
        loop {
            cursor = match self.next[cursor] {
                Some(node) => node,
                None => break,
            };
            let quadrant = self.quadrant[cursor];
            if quadrant > quadrant_index + 1 {
                self.flags[cursor] = FLAG_BIGGER;
                break;
            }
            if quadrant == quadrant_index + 1 {
                self.flags[cursor] = FLAG_NEXT | FLAG_IDENTICAL;
            } else if quadrant == quadrant_index {
                self.flags[cursor] = flag | FLAG_IDENTICAL;
            }
        }

        let mut ps = ps_cache;
        loop {
            // Find the next unprocessed node of the window.
            let mut ps_next;
            loop {
                ps_next = match self.next[ps] {
                    Some(node) => node,
                    None => return ps_cache,
                };
                if self.flags[ps_next] & FLAG_BIGGER != 0 {
                    return ps_cache;
                }
                if self.flags[ps_next] & FLAG_IDENTICAL != 0 {
                    break;
                }
                ps = ps_next;
            }

            self.flags[ps_next] &= !FLAG_IDENTICAL;
            let ps_temp = ps;
            let initial_bounds = self.bounds[ps_next];

            loop {
                ps = ps_next;
                ps_next = match self.next[ps_next] {
                    Some(node) => node,
                    None => break,
                };
                if self.flags[ps_next] & FLAG_BIGGER != 0 {
                    break;
                }
                if self.flags[ps_next] & FLAG_NEXT == 0 {
                    continue;
                }

                if check_bounding_box(self.rotation, &initial_bounds, &self.bounds[ps_next]) {
                    // Unlink and reinsert in front of the group.
                    self.next[ps] = self.next[ps_next];
                    let after_group = self.next[ps_temp];
                    self.next[ps_temp] = Some(ps_next);
                    self.next[ps_next] = after_group;
                    ps_next = ps;
                }
            }

            ps = ps_temp;
        }
    }
}

impl PaintSession {
    /// Produce the painter order of the emitted primitives: quadrants back
    /// to front, reordered within each window by the bound-box occlusion
    /// test for the current rotation. Returns arena indices in draw order.
    pub fn arrange(&self) -> Vec<u32> {
        let count = self.entries().len();
        if count == 0 || self.quadrant_back_index() == u32::MAX {
            return Vec::new();
        }

        let sentinel = count;
        let quadrants: Vec<u32> = self
            .entries()
            .iter()
            .map(|entry| entry.quadrant_index)
            .collect();
        let bounds: Vec<BoundBox> = self.entries().iter().map(|entry| entry.bounds).collect();
        let mut state = ArrangeState {
            next: vec![None; count + 1],
            flags: vec![0; count],
            quadrant: &quadrants,
            bounds: &bounds,
            rotation: self.rotation(),
        };

        // Concatenate the quadrant lists back to front into one chain.
        let back = self.quadrant_back_index();
        let front = self.quadrant_front_index();
        let mut cursor = sentinel;
        for quadrant in back..=front {
            let mut node = self.quadrant_heads()[quadrant as usize];
            while let Some(index) = node {
                state.next[cursor] = Some(index as usize);
                cursor = index as usize;
                node = self.entries()[index as usize].next_quadrant;
            }
        }
        state.next[cursor] = None;

        let mut resume = state.arrange_quadrant(sentinel, back, FLAG_NEXT);
        let mut quadrant = back;
        loop {
            quadrant += 1;
            if quadrant >= front {
                break;
            }
            resume = state.arrange_quadrant(resume, quadrant, 0);
        }

        let mut order = Vec::with_capacity(count);
        let mut node = state.next[sentinel];
        while let Some(index) = node {
            order.push(index as u32);
            node = state.next[index];
        }
        order
    }

    /// Flatten the arranged primitives, parents followed by their attached
    /// images, into backend-ready draw calls.
    pub fn draw_commands(&self) -> Vec<DrawCommand> {
        let mut commands = Vec::new();
        for index in self.arrange() {
            let entry = &self.entries()[index as usize];
            commands.push(DrawCommand {
                image_id: entry.image_id,
                x: entry.screen_x,
                y: entry.screen_y,
            });
            let mut attached = entry.attached_head;
            while let Some(attached_index) = attached {
                let image = &self.attached_images()[attached_index as usize];
                commands.push(DrawCommand {
                    image_id: image.image_id,
                    x: entry.screen_x + image.dx,
                    y: entry.screen_y + image.dy,
                });
                attached = image.next;
            }
        }
        commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::session::Viewport;
    use crate::world::TileCoords;

    fn wide_open_session(rotation: Rotation) -> PaintSession {
        PaintSession::new(
            Viewport {
                x: -65536,
                y: -65536,
                width: 131072,
                height: 131072,
            },
            rotation,
        )
    }

    #[test]
    fn empty_session_arranges_to_nothing() {
        let session = wide_open_session(Rotation::R0);
        assert!(session.arrange().is_empty());
        assert!(session.draw_commands().is_empty());
    }

    #[test]
    fn arrange_returns_every_entry_exactly_once() {
        let mut session = wide_open_session(Rotation::R0);
        for tile in 0..6 {
            session.start_tile(TileCoords::new(tile, tile));
            session
                .add_image_as_parent(tile as u32, (0, 0, 112), (32, 32, 2), (0, 0, 112))
                .expect("entry");
        }
        let mut order = session.arrange();
        assert_eq!(order.len(), session.entries().len());
        order.sort_unstable();
        order.dedup();
        assert_eq!(order.len(), session.entries().len());
    }

    #[test]
    fn farther_quadrants_are_drawn_first() {
        let mut session = wide_open_session(Rotation::R0);
        // Three tiles along the view diagonal, emitted nearest-first.
        for tile in [12, 8, 4] {
            session.start_tile(TileCoords::new(tile, tile));
            session
                .add_image_as_parent(tile as u32, (0, 0, 112), (32, 32, 2), (0, 0, 112))
                .expect("entry");
        }
        let order = session.arrange();
        let images: Vec<u32> = order
            .iter()
            .map(|index| session.entries()[*index as usize].image_id)
            .collect();
        assert_eq!(images, vec![4, 8, 12]);
    }

    #[test]
    fn lower_primitive_on_a_tile_is_drawn_before_the_one_above_it() {
        for rotation in Rotation::ALL {
            let mut session = wide_open_session(rotation);
            session.start_tile(TileCoords::new(5, 5));
            // Surface first, then a track piece two land steps above it;
            // emission order alone would draw them backwards.
            session
                .add_image_as_parent(1, (0, 0, 112), (32, 32, 2), (0, 0, 112))
                .expect("surface entry");
            session
                .add_image_as_parent(2, (0, 0, 144), (32, 32, 2), (0, 0, 144))
                .expect("track entry");

            let order = session.arrange();
            let images: Vec<u32> = order
                .iter()
                .map(|index| session.entries()[*index as usize].image_id)
                .collect();
            assert_eq!(images, vec![1, 2], "rotation {rotation:?}");
        }
    }

    #[test]
    fn draw_commands_interleave_attached_images() {
        let mut session = wide_open_session(Rotation::R0);
        session.start_tile(TileCoords::new(3, 3));
        session
            .add_image_as_parent(10, (0, 0, 112), (32, 32, 2), (0, 0, 112))
            .expect("entry");
        assert!(session.add_image_as_child(11, 2, -4));

        let commands = session.draw_commands();
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0].image_id, 10);
        assert_eq!(commands[1].image_id, 11);
        assert_eq!(commands[1].x, commands[0].x + 2);
        assert_eq!(commands[1].y, commands[0].y - 4);
    }
}
