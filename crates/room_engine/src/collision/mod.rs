mod context;
mod ledger;
mod matrix;
mod responses;
mod rules;

pub use context::TouchContext;
pub use ledger::{CollisionLedger, TouchTarget, TrackOutcome, TrackedCollision, UntrackOutcome};
pub use matrix::{
    ActorTouchFn, BoundaryTouchFn, DefaultTouchFn, DispatchTables, DispatchTablesBuilder, Layer,
    LayerError, LayerMatrix, TileTouchFn, TouchHandlers, LAYER_COUNT,
};
pub use responses::{register_standard_responses, StandardLayers};
pub use rules::CollisionRules;
