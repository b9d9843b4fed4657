use std::fs;
use std::path::Path;

use engine::{EntityError, EntityPool, EntitySnapshot, GameState, Map, MapError, TileElement};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

pub const SAVE_VERSION: u32 = 1;

/// The persisted world document: the flat tile element array in raster
/// order plus the live entity snapshots. The tile index and spatial
/// buckets are rebuilt on load, never stored.
#[derive(Debug, Serialize, Deserialize)]
pub struct SaveDocument {
    pub save_version: u32,
    pub map_size: i32,
    pub elements: Vec<TileElement>,
    pub entities: Vec<EntitySnapshot>,
    pub entity_checksum: String,
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("failed to read or write save file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse save file at {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_path_to_error::Error<serde_json::Error>,
    },
    #[error("failed to serialize save document: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("save version {0} is not supported")]
    UnsupportedVersion(u32),
    #[error("save file map data is invalid: {0}")]
    Map(#[from] MapError),
    #[error("save file entity data is invalid: {0}")]
    Entity(#[from] EntityError),
    #[error("entity checksum mismatch after load")]
    ChecksumMismatch,
}

/// Persist the world to a JSON document. Ghost elements are previews, not
/// game state, and are stripped before writing.
pub fn save_world(state: &mut GameState, path: &Path) -> Result<(), SaveError> {
    state.map.strip_ghost_elements();

    let document = SaveDocument {
        save_version: SAVE_VERSION,
        map_size: state.map.map_size(),
        elements: state.map.saved_elements(),
        entities: state.entities.snapshot(),
        entity_checksum: state.entities.checksum(),
    };
    let json = serde_json::to_string(&document)?;
    fs::write(path, json)?;
    info!(
        path = %path.display(),
        elements = document.elements.len(),
        entities = document.entities.len(),
        "world saved"
    );
    Ok(())
}

/// Load a world document, rebuilding the tile index and spatial buckets
/// and verifying the entity checksum.
pub fn load_world(path: &Path) -> Result<GameState, SaveError> {
    let text = fs::read_to_string(path)?;
    let mut deserializer = serde_json::Deserializer::from_str(&text);
    let document: SaveDocument =
        serde_path_to_error::deserialize(&mut deserializer).map_err(|source| SaveError::Parse {
            path: path.display().to_string(),
            source,
        })?;

    if document.save_version != SAVE_VERSION {
        return Err(SaveError::UnsupportedVersion(document.save_version));
    }

    let map = Map::from_saved_elements(document.map_size, document.elements)?;
    let entities = EntityPool::restore(&document.entities)?;
    if entities.checksum() != document.entity_checksum {
        return Err(SaveError::ChecksumMismatch);
    }

    info!(path = %path.display(), "world loaded");
    Ok(GameState { map, entities })
}
