use std::collections::{HashMap, HashSet};

use crate::world::{TileElement, TileElementType};

use super::session::PaintSession;

/// Arguments handed to a paint callback for one element.
#[derive(Debug, Clone, Copy)]
pub struct PaintParams<'a> {
    /// Element direction rotated into view space.
    pub direction: u8,
    /// Sequence index within a multi-tile piece.
    pub sequence: u8,
    /// Element base height in world units.
    pub height: i32,
    pub element: &'a TileElement,
}

/// One callback per (element type, variant); the boundary the per-ride and
/// per-scenery sprite tables plug into.
pub type PaintFn = fn(&mut PaintSession, &PaintParams);

/// Dispatch table for element paint callbacks, built once at startup.
#[derive(Default)]
pub struct PaintRegistry {
    callbacks: HashMap<(TileElementType, u8), PaintFn>,
    ignored: HashSet<(TileElementType, u8, u8, u8)>,
}

impl PaintRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-populated with the built-in surface and path
    /// painters.
    pub fn with_core_callbacks() -> Self {
        let mut registry = Self::new();
        registry.register(TileElementType::Surface, 0, super::tile_paint::paint_surface);
        registry.register(TileElementType::Path, 0, super::tile_paint::paint_path);
        registry
    }

    pub fn register(&mut self, element_type: TileElementType, variant: u8, callback: PaintFn) {
        self.callbacks.insert((element_type, variant), callback);
    }

    pub fn lookup(&self, element_type: TileElementType, variant: u8) -> Option<PaintFn> {
        self.callbacks.get(&(element_type, variant)).copied()
    }

    /// Mark a geometrically impossible (variant, direction, sequence)
    /// combination so validation skips it instead of failing.
    pub fn mark_ignored(
        &mut self,
        element_type: TileElementType,
        variant: u8,
        direction: u8,
        sequence: u8,
    ) {
        self.ignored
            .insert((element_type, variant, direction, sequence));
    }

    pub fn is_ignored(
        &self,
        element_type: TileElementType,
        variant: u8,
        direction: u8,
        sequence: u8,
    ) -> bool {
        self.ignored
            .contains(&(element_type, variant, direction, sequence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_op(_session: &mut PaintSession, _params: &PaintParams) {}

    #[test]
    fn lookup_misses_return_none() {
        let registry = PaintRegistry::new();
        assert!(registry.lookup(TileElementType::Track, 7).is_none());
    }

    #[test]
    fn registered_callback_is_found_by_type_and_variant() {
        let mut registry = PaintRegistry::new();
        registry.register(TileElementType::Track, 7, no_op);
        assert!(registry.lookup(TileElementType::Track, 7).is_some());
        assert!(registry.lookup(TileElementType::Track, 8).is_none());
        assert!(registry.lookup(TileElementType::Wall, 7).is_none());
    }

    #[test]
    fn core_registry_paints_surfaces_and_paths() {
        let registry = PaintRegistry::with_core_callbacks();
        assert!(registry.lookup(TileElementType::Surface, 0).is_some());
        assert!(registry.lookup(TileElementType::Path, 0).is_some());
    }

    #[test]
    fn ignored_combinations_are_tracked() {
        let mut registry = PaintRegistry::new();
        registry.mark_ignored(TileElementType::Track, 7, 1, 3);
        assert!(registry.is_ignored(TileElementType::Track, 7, 1, 3));
        assert!(!registry.is_ignored(TileElementType::Track, 7, 0, 3));
    }
}
