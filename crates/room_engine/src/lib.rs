pub mod actor;
pub mod colliders;
pub mod collision;
pub mod config;
pub mod effects;
pub mod geometry;
pub mod passability;
pub mod pathfinding;
pub mod room;
pub mod tiles;

pub use actor::{
    Actor, ActorFlags, ActorId, ActorKind, ActorStore, DamageOutcome, Health, Knockback, Move,
    OnTouch,
};
pub use colliders::{ColliderPool, ColliderScene, ProbeHit, ScenePhysics, TileCollider};
pub use collision::{
    register_standard_responses, DispatchTables, DispatchTablesBuilder, Layer, LayerError,
    StandardLayers, TouchContext, TouchHandlers, TouchTarget, LAYER_COUNT,
};
pub use config::{ConfigError, SimConfig};
pub use effects::{EffectAction, EffectFiring, EffectKind, EffectSettings, StatusEffectScheduler};
pub use geometry::{Cell, Direction, Vec2};
pub use passability::{build_passability_grid, PassabilityCell, PassabilityGrid, DEFAULT_PATH_COST};
pub use pathfinding::{
    find_route, PathInbox, PathOutcome, PathRequestError, PathTask, Pathfinder, PathfinderPool,
    RouteOutcome,
};
pub use room::{Room, RoomId, RoomLock, RoomTickStats, RoomType, SharedTables, WorldRequest};
pub use tiles::{
    RoomTiles, RoomTilesError, Tile, TileId, TileInstance, TileProperties, TileTable,
    TileTableError,
};
