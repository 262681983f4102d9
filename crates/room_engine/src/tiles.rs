use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{Cell, Vec2};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileId {
    #[default]
    Air,
    DungeonWall,
    Barrier,
    Portal,
    DungeonFloor,
    Spikes,
    Torch,
    Shallows,
    PlainsGrass,
    PlainsWall,
    PlainsDoor,
    DungeonDoor,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tile {
    pub id: TileId,
    pub variant: u8,
}

impl Tile {
    pub const AIR: Self = Self::new(TileId::Air);

    pub const fn new(id: TileId) -> Self {
        Self { id, variant: 0 }
    }

    pub const fn with_variant(id: TileId, variant: u8) -> Self {
        Self { id, variant }
    }
}

impl From<TileId> for Tile {
    fn from(id: TileId) -> Self {
        Self::new(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileInstance {
    pub tile: Tile,
    pub cell: Cell,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileProperties {
    pub has_collider: bool,
    pub trigger: bool,
    pub collider_size: Vec2,
    pub collider_offset: Vec2,
    /// Pathfinding cost for walkable trigger tiles; `None` uses the baseline cost.
    pub path_cost: Option<u32>,
}

const TORCH_COLLIDER_SIZE: f32 = 0.6;

fn unit_size() -> Vec2 {
    Vec2 { x: 1.0, y: 1.0 }
}

impl Default for TileProperties {
    fn default() -> Self {
        Self {
            has_collider: false,
            trigger: false,
            collider_size: unit_size(),
            collider_offset: Vec2::ZERO,
            path_cost: None,
        }
    }
}

impl TileProperties {
    fn solid() -> Self {
        Self {
            has_collider: true,
            ..Self::default()
        }
    }

    fn trigger() -> Self {
        Self {
            has_collider: true,
            trigger: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct TileTableEntry {
    id: TileId,
    #[serde(default)]
    has_collider: bool,
    #[serde(default)]
    trigger: bool,
    #[serde(default = "unit_size")]
    collider_size: Vec2,
    #[serde(default)]
    collider_offset: Vec2,
    #[serde(default)]
    path_cost: Option<u32>,
}

impl TileTableEntry {
    fn into_pair(self) -> (TileId, TileProperties) {
        (
            self.id,
            TileProperties {
                has_collider: self.has_collider,
                trigger: self.trigger,
                collider_size: self.collider_size,
                collider_offset: self.collider_offset,
                path_cost: self.path_cost,
            },
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct TileTableFile {
    tiles: Vec<TileTableEntry>,
}

#[derive(Debug, Error)]
pub enum TileTableError {
    #[error("failed to read tile table {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse tile table at {path}: {message}")]
    Parse { path: String, message: String },
    #[error("tile {id:?} is defined more than once")]
    DuplicateTile { id: TileId },
    #[error("tile {id:?} has a non-positive collider size")]
    InvalidColliderSize { id: TileId },
    #[error("tile {id:?} has a zero path cost")]
    ZeroPathCost { id: TileId },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TileTable {
    properties_by_id: HashMap<TileId, TileProperties>,
}

impl TileTable {
    pub fn from_entries(
        entries: impl IntoIterator<Item = (TileId, TileProperties)>,
    ) -> Result<Self, TileTableError> {
        let mut properties_by_id = HashMap::new();
        for (id, properties) in entries {
            if properties.has_collider
                && (properties.collider_size.x <= 0.0 || properties.collider_size.y <= 0.0)
            {
                return Err(TileTableError::InvalidColliderSize { id });
            }
            if properties.path_cost == Some(0) {
                return Err(TileTableError::ZeroPathCost { id });
            }
            if properties_by_id.insert(id, properties).is_some() {
                return Err(TileTableError::DuplicateTile { id });
            }
        }
        Ok(Self { properties_by_id })
    }

    pub fn standard() -> Self {
        let mut properties_by_id = HashMap::new();
        for id in [TileId::DungeonWall, TileId::PlainsWall, TileId::Barrier] {
            properties_by_id.insert(id, TileProperties::solid());
        }
        properties_by_id.insert(
            TileId::Torch,
            TileProperties {
                collider_size: Vec2::new(TORCH_COLLIDER_SIZE, TORCH_COLLIDER_SIZE),
                ..TileProperties::solid()
            },
        );
        for id in [TileId::Portal, TileId::PlainsDoor, TileId::DungeonDoor] {
            properties_by_id.insert(id, TileProperties::trigger());
        }
        properties_by_id.insert(
            TileId::Spikes,
            TileProperties {
                path_cost: Some(8),
                ..TileProperties::trigger()
            },
        );
        properties_by_id.insert(
            TileId::Shallows,
            TileProperties {
                path_cost: Some(3),
                ..TileProperties::trigger()
            },
        );
        Self { properties_by_id }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, TileTableError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        let file = serde_path_to_error::deserialize::<_, TileTableFile>(&mut deserializer)
            .map_err(|error| {
                let path = error.path().to_string();
                TileTableError::Parse {
                    path,
                    message: error.into_inner().to_string(),
                }
            })?;
        Self::from_entries(file.tiles.into_iter().map(TileTableEntry::into_pair))
    }

    pub fn load(path: &Path) -> Result<Self, TileTableError> {
        let raw = fs::read_to_string(path).map_err(|source| TileTableError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn properties(&self, tile: Tile) -> TileProperties {
        self.properties_by_id
            .get(&tile.id)
            .copied()
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.properties_by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties_by_id.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RoomTilesError {
    #[error("tile count mismatch: expected {expected}, got {actual}")]
    TileCountMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoomTiles {
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
}

impl RoomTiles {
    pub fn new(width: u32, height: u32, tiles: Vec<Tile>) -> Result<Self, RoomTilesError> {
        let expected = width as usize * height as usize;
        let actual = tiles.len();
        if expected != actual {
            return Err(RoomTilesError::TileCountMismatch { expected, actual });
        }
        Ok(Self {
            width,
            height,
            tiles,
        })
    }

    pub fn filled(width: u32, height: u32, tile: Tile) -> Self {
        Self {
            width,
            height,
            tiles: vec![tile; width as usize * height as usize],
        }
    }

    pub fn with_border(mut self, wall: Tile) -> Self {
        for y in 0..self.height as i32 {
            for x in 0..self.width as i32 {
                let on_edge = x == 0
                    || y == 0
                    || x == self.width as i32 - 1
                    || y == self.height as i32 - 1;
                if on_edge {
                    self.set_tile(Cell::new(x, y), wall);
                }
            }
        }
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        self.index_of(cell).is_some()
    }

    pub fn index_of(&self, cell: Cell) -> Option<usize> {
        if cell.x < 0 || cell.y < 0 {
            return None;
        }
        let (x, y) = (cell.x as u32, cell.y as u32);
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    pub fn tile_at(&self, cell: Cell) -> Option<Tile> {
        self.index_of(cell)
            .and_then(|index| self.tiles.get(index).copied())
    }

    pub fn set_tile(&mut self, cell: Cell, tile: Tile) -> bool {
        let Some(slot) = self.index_of(cell).and_then(|index| self.tiles.get_mut(index)) else {
            return false;
        };
        *slot = tile;
        true
    }

    pub fn instances(&self) -> impl Iterator<Item = TileInstance> + '_ {
        let width = self.width as usize;
        self.tiles.iter().enumerate().map(move |(index, tile)| TileInstance {
            tile: *tile,
            cell: Cell::new((index % width) as i32, (index / width) as i32),
        })
    }
}
