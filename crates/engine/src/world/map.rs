use thiserror::Error;
use tracing::{debug, info, warn};

use super::coords::{TileCoords, MAXIMUM_MAP_SIZE_TECHNICAL};
use super::tile_element::{
    QuadrantMask, TileElement, TileElementFlags, TileElementPayload, DEAD_ELEMENT_HEIGHT,
};

/// Hard cap on the element storage array.
pub const MAX_TILE_ELEMENTS: usize =
    3 * (MAXIMUM_MAP_SIZE_TECHNICAL as usize) * (MAXIMUM_MAP_SIZE_TECHNICAL as usize);

const TECHNICAL_TILE_COUNT: usize =
    (MAXIMUM_MAP_SIZE_TECHNICAL as usize) * (MAXIMUM_MAP_SIZE_TECHNICAL as usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MapError {
    #[error("coordinate outside the technical map bound")]
    InvalidCoordinate,
    #[error("tile element storage limit reached")]
    ElementLimitReached,
    #[error("map size {0} outside supported range")]
    InvalidMapSize(i32),
    #[error("element index does not refer to a live element")]
    StaleElementIndex,
    #[error("flat element layout is corrupt")]
    CorruptLayout,
}

/// Index of an element within the map's flat storage array.
///
/// Valid only until the next structural mutation (insert, remove,
/// reorganise); the map hands out fresh indices from queries afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementIndex(pub(crate) u32);

impl ElementIndex {
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

/// The tile world: a flat, densely packed array of per-tile element runs in
/// raster order, plus the per-tile index that makes run lookup O(1).
#[derive(Debug, Clone)]
pub struct Map {
    map_size: i32,
    elements: Vec<TileElement>,
    next_free_element: usize,
    tile_index: Vec<u32>,
}

fn cleared_element() -> TileElement {
    let mut element = TileElement::default_surface();
    element.base_height = DEAD_ELEMENT_HEIGHT;
    element.clearance_height = DEAD_ELEMENT_HEIGHT;
    element.flags = TileElementFlags::empty();
    element
}

impl Map {
    /// Build a flat all-surface world. Every technical tile gets exactly one
    /// default surface element so no lookup can ever come back empty.
    pub fn new(map_size: i32) -> Result<Self, MapError> {
        if map_size < 1 || map_size > MAXIMUM_MAP_SIZE_TECHNICAL {
            return Err(MapError::InvalidMapSize(map_size));
        }

        let mut elements = vec![TileElement::default_surface(); TECHNICAL_TILE_COUNT];
        elements.resize(TECHNICAL_TILE_COUNT + TECHNICAL_TILE_COUNT / 2, cleared_element());

        let mut map = Self {
            map_size,
            elements,
            next_free_element: TECHNICAL_TILE_COUNT,
            tile_index: vec![0; TECHNICAL_TILE_COUNT],
        };
        map.rebuild_tile_index()?;
        Ok(map)
    }

    /// Reconstruct a map from the persisted flat layout: runs in raster
    /// order, each terminated by the last-for-tile flag, one run per tile.
    pub fn from_saved_elements(
        map_size: i32,
        saved: Vec<TileElement>,
    ) -> Result<Self, MapError> {
        if map_size < 1 || map_size > MAXIMUM_MAP_SIZE_TECHNICAL {
            return Err(MapError::InvalidMapSize(map_size));
        }

        let mut runs = 0usize;
        for element in &saved {
            if element.base_height == DEAD_ELEMENT_HEIGHT {
                return Err(MapError::CorruptLayout);
            }
            if element.is_last_for_tile() {
                runs += 1;
            }
        }
        if runs != TECHNICAL_TILE_COUNT {
            return Err(MapError::CorruptLayout);
        }
        if !saved
            .last()
            .map(TileElement::is_last_for_tile)
            .unwrap_or(false)
        {
            return Err(MapError::CorruptLayout);
        }

        let next_free_element = saved.len();
        let mut elements = saved;
        let capacity = (elements.len() + elements.len() / 2).min(MAX_TILE_ELEMENTS);
        elements.resize(capacity.max(next_free_element), cleared_element());

        let mut map = Self {
            map_size,
            elements,
            next_free_element,
            tile_index: vec![0; TECHNICAL_TILE_COUNT],
        };
        map.rebuild_tile_index()?;
        Ok(map)
    }

    pub fn map_size(&self) -> i32 {
        self.map_size
    }

    /// Number of storage slots currently allocated.
    pub fn element_capacity(&self) -> usize {
        self.elements.len()
    }

    /// Watermark past the last storage slot in use.
    pub fn next_free_element(&self) -> usize {
        self.next_free_element
    }

    /// O(1) lookup of the first element of a tile's run.
    pub fn first_element_index(&self, coords: TileCoords) -> Option<ElementIndex> {
        let tile = match coords.to_tile_index() {
            Some(tile) => tile,
            None => {
                debug!(x = coords.x, y = coords.y, "tile lookup outside technical bound");
                return None;
            }
        };
        Some(ElementIndex(self.tile_index[tile]))
    }

    pub fn first_element_at(&self, coords: TileCoords) -> Option<&TileElement> {
        self.first_element_index(coords)
            .map(|index| &self.elements[index.as_usize()])
    }

    pub fn element(&self, index: ElementIndex) -> Option<&TileElement> {
        let element = self.elements.get(index.as_usize())?;
        if element.base_height == DEAD_ELEMENT_HEIGHT {
            return None;
        }
        Some(element)
    }

    pub fn element_mut(&mut self, index: ElementIndex) -> Option<&mut TileElement> {
        let element = self.elements.get_mut(index.as_usize())?;
        if element.base_height == DEAD_ELEMENT_HEIGHT {
            return None;
        }
        Some(element)
    }

    /// Walk a tile's element run in storage order.
    pub fn tile_elements(
        &self,
        coords: TileCoords,
    ) -> impl Iterator<Item = (ElementIndex, &TileElement)> {
        let start = self.first_element_index(coords).map(ElementIndex::as_usize);
        TileRunIter {
            elements: &self.elements,
            next: start,
        }
    }

    fn run_len(&self, run_start: usize) -> usize {
        let mut len = 0;
        let mut index = run_start;
        loop {
            len += 1;
            if self.elements[index].is_last_for_tile() {
                return len;
            }
            index += 1;
        }
    }

    /// Insert a new element into a tile's run at the height-ordered position
    /// (after any existing element of equal or lower base height).
    ///
    /// The whole run is rewritten at the free tail of the storage array and
    /// the tile index is repointed there; the vacated slots become slack
    /// that the next reorganise pass reclaims.
    pub fn insert(
        &mut self,
        coords: TileCoords,
        base_height: u8,
        quadrants: QuadrantMask,
        payload: TileElementPayload,
    ) -> Result<ElementIndex, MapError> {
        let tile = coords.to_tile_index().ok_or(MapError::InvalidCoordinate)?;

        let run_len = self.run_len(self.tile_index[tile] as usize);
        self.check_capacity_and_reorganise(run_len + 1)?;

        let mut src = self.tile_index[tile] as usize;
        let mut dst = self.next_free_element;
        let new_run_start = dst;

        // Copy over every element that sorts below the insertion height.
        let mut inserted_is_last = false;
        let mut lower_done = false;
        while !lower_done {
            let current = self.elements[src];
            if base_height >= current.base_height {
                self.elements[dst] = current;
                self.elements[src] = cleared_element();
                src += 1;
                dst += 1;
                if current.is_last_for_tile() {
                    // Nothing sorts above the new element.
                    self.elements[dst - 1].set_last_for_tile(false);
                    inserted_is_last = true;
                    lower_done = true;
                }
            } else {
                lower_done = true;
            }
        }

        let inserted_at = dst;
        let mut element = TileElement::new(base_height, payload);
        element.occupied_quadrants = quadrants;
        element.set_last_for_tile(inserted_is_last);
        self.elements[dst] = element;
        dst += 1;

        // Copy the rest of the run above the insertion height.
        if !inserted_is_last {
            loop {
                let current = self.elements[src];
                self.elements[dst] = current;
                self.elements[src] = cleared_element();
                src += 1;
                dst += 1;
                if current.is_last_for_tile() {
                    break;
                }
            }
        }

        self.tile_index[tile] = new_run_start as u32;
        self.next_free_element = dst;
        Ok(ElementIndex(inserted_at as u32))
    }

    /// Remove an element, closing the gap within its tile's run.
    ///
    /// Removing the sole element of a run synthesizes a default surface in
    /// its place instead, so every valid tile keeps at least one element.
    pub fn remove(&mut self, index: ElementIndex) -> Result<(), MapError> {
        let slot = index.as_usize();
        if slot >= self.next_free_element {
            return Err(MapError::StaleElementIndex);
        }
        if self.elements[slot].base_height == DEAD_ELEMENT_HEIGHT {
            warn!(slot, "attempted removal of an element that is already gone");
            debug_assert!(false, "double remove of tile element");
            return Err(MapError::StaleElementIndex);
        }

        let is_run_start = slot == 0
            || self.elements[slot - 1].is_last_for_tile()
            || self.elements[slot - 1].base_height == DEAD_ELEMENT_HEIGHT;

        if self.elements[slot].is_last_for_tile() {
            if is_run_start {
                // Sole element of the tile; a run may never become empty.
                debug!(slot, "removal of a tile's only element synthesizes a surface");
                self.elements[slot] = TileElement::default_surface();
                return Ok(());
            }
            self.elements[slot - 1].set_last_for_tile(true);
            self.elements[slot] = cleared_element();
            if slot + 1 == self.next_free_element {
                self.next_free_element -= 1;
            }
            return Ok(());
        }

        // Shift the rest of the run down one slot.
        let mut current = slot;
        loop {
            let next = self.elements[current + 1];
            self.elements[current] = next;
            current += 1;
            if next.is_last_for_tile() {
                break;
            }
        }
        self.elements[current] = cleared_element();
        if current + 1 == self.next_free_element {
            self.next_free_element -= 1;
        }
        Ok(())
    }

    /// Ensure there is room for `needed` more elements at the free tail,
    /// compacting fragmented slack first and growing the backing array only
    /// when compaction was not enough.
    pub fn check_capacity_and_reorganise(&mut self, needed: usize) -> Result<(), MapError> {
        if self.next_free_element + needed <= self.elements.len() {
            return Ok(());
        }

        self.reorganise_tile_elements()?;
        if self.next_free_element + needed <= self.elements.len() {
            return Ok(());
        }

        let required = self.next_free_element + needed;
        if required > MAX_TILE_ELEMENTS {
            return Err(MapError::ElementLimitReached);
        }
        let target = (self.elements.len() * 2).max(required).min(MAX_TILE_ELEMENTS);
        info!(
            from = self.elements.len(),
            to = target,
            "growing tile element storage"
        );
        self.elements.resize(target, cleared_element());
        Ok(())
    }

    /// Defragment the storage array: rewrite every tile's run contiguously
    /// in raster order and rebuild the tile index. O(map area).
    pub fn reorganise_tile_elements(&mut self) -> Result<(), MapError> {
        let mut compacted = Vec::with_capacity(self.elements.len());
        for y in 0..MAXIMUM_MAP_SIZE_TECHNICAL {
            for x in 0..MAXIMUM_MAP_SIZE_TECHNICAL {
                let tile = (y * MAXIMUM_MAP_SIZE_TECHNICAL + x) as usize;
                let mut index = self.tile_index[tile] as usize;
                loop {
                    let element = self.elements[index];
                    compacted.push(element);
                    if element.is_last_for_tile() {
                        break;
                    }
                    index += 1;
                }
            }
        }

        let live = compacted.len();
        debug_assert!(live <= self.elements.len());
        info!(live, slack = self.elements.len() - live, "reorganised tile elements");
        compacted.resize(self.elements.len(), cleared_element());
        self.elements = compacted;
        self.next_free_element = live;
        self.rebuild_tile_index()
    }

    /// Rebuild the per-tile index with one linear scan over a compact
    /// layout (fresh init, post-reorganise, or a loaded save).
    pub fn rebuild_tile_index(&mut self) -> Result<(), MapError> {
        let mut index = 0usize;
        for tile in 0..TECHNICAL_TILE_COUNT {
            if index >= self.next_free_element {
                return Err(MapError::CorruptLayout);
            }
            self.tile_index[tile] = index as u32;
            while !self.elements[index].is_last_for_tile() {
                index += 1;
                if index >= self.next_free_element {
                    return Err(MapError::CorruptLayout);
                }
            }
            index += 1;
        }
        Ok(())
    }

    /// The persisted flat layout: every tile's run in raster order, no
    /// dead slots. A reader reconstructs the tile index with one scan.
    pub fn saved_elements(&self) -> Vec<TileElement> {
        let mut saved = Vec::with_capacity(self.next_free_element);
        for y in 0..MAXIMUM_MAP_SIZE_TECHNICAL {
            for x in 0..MAXIMUM_MAP_SIZE_TECHNICAL {
                for (_, element) in self.tile_elements(TileCoords::new(x, y)) {
                    saved.push(*element);
                }
            }
        }
        saved
    }

    /// Delete every ghost element. Run before persisting; previews are
    /// never real game state.
    pub fn strip_ghost_elements(&mut self) {
        for y in 0..MAXIMUM_MAP_SIZE_TECHNICAL {
            for x in 0..MAXIMUM_MAP_SIZE_TECHNICAL {
                let coords = TileCoords::new(x, y);
                loop {
                    let ghost = self
                        .tile_elements(coords)
                        .find(|(_, element)| element.is_ghost())
                        .map(|(index, _)| index);
                    match ghost {
                        Some(index) => {
                            if self.remove(index).is_err() {
                                break;
                            }
                        }
                        None => break,
                    }
                }
            }
        }
    }

    /// Clear the ghost flag from every element without removing any. Repair
    /// pass for imported worlds that were saved mid-preview.
    pub fn clear_ghost_flags(&mut self) {
        for element in &mut self.elements[..self.next_free_element] {
            if element.base_height != DEAD_ELEMENT_HEIGHT {
                element.set_ghost(false);
            }
        }
    }
}

struct TileRunIter<'a> {
    elements: &'a [TileElement],
    next: Option<usize>,
}

impl<'a> Iterator for TileRunIter<'a> {
    type Item = (ElementIndex, &'a TileElement);

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.next?;
        let element = &self.elements[index];
        self.next = if element.is_last_for_tile() {
            None
        } else {
            Some(index + 1)
        };
        Some((ElementIndex(index as u32), element))
    }
}
