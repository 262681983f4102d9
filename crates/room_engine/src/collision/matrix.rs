use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use super::context::TouchContext;
use super::ledger::TouchTarget;
use crate::actor::ActorId;
use crate::geometry::Direction;
use crate::tiles::TileInstance;

pub const LAYER_COUNT: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Layer(u8);

impl Layer {
    pub fn new(index: u8) -> Result<Self, LayerError> {
        if usize::from(index) >= LAYER_COUNT {
            return Err(LayerError::OutOfRange { index });
        }
        Ok(Self(index))
    }

    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LayerError {
    #[error("layer {index} is out of range (max {max})", max = LAYER_COUNT - 1)]
    OutOfRange { index: u8 },
}

pub type ActorTouchFn = Arc<dyn Fn(&mut TouchContext<'_>, ActorId, ActorId) + Send + Sync>;
pub type TileTouchFn = Arc<dyn Fn(&mut TouchContext<'_>, ActorId, TileInstance) + Send + Sync>;
pub type BoundaryTouchFn = Arc<dyn Fn(&mut TouchContext<'_>, ActorId, Direction) + Send + Sync>;
pub type DefaultTouchFn = Arc<dyn Fn(&mut TouchContext<'_>, ActorId) + Send + Sync>;

#[derive(Clone, Default)]
pub struct TouchHandlers {
    on_actor: Option<ActorTouchFn>,
    on_tile: Option<TileTouchFn>,
    on_boundary: Option<BoundaryTouchFn>,
    on_default: Option<DefaultTouchFn>,
}

impl TouchHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_actor(
        mut self,
        handler: impl Fn(&mut TouchContext<'_>, ActorId, ActorId) + Send + Sync + 'static,
    ) -> Self {
        self.on_actor = Some(Arc::new(handler));
        self
    }

    pub fn on_tile(
        mut self,
        handler: impl Fn(&mut TouchContext<'_>, ActorId, TileInstance) + Send + Sync + 'static,
    ) -> Self {
        self.on_tile = Some(Arc::new(handler));
        self
    }

    pub fn on_boundary(
        mut self,
        handler: impl Fn(&mut TouchContext<'_>, ActorId, Direction) + Send + Sync + 'static,
    ) -> Self {
        self.on_boundary = Some(Arc::new(handler));
        self
    }

    pub fn on_default(
        mut self,
        handler: impl Fn(&mut TouchContext<'_>, ActorId) + Send + Sync + 'static,
    ) -> Self {
        self.on_default = Some(Arc::new(handler));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.on_actor.is_none()
            && self.on_tile.is_none()
            && self.on_boundary.is_none()
            && self.on_default.is_none()
    }

    fn invoke(&self, ctx: &mut TouchContext<'_>, actor: ActorId, target: TouchTarget) -> bool {
        match target {
            TouchTarget::Actor(other) => {
                if let Some(handler) = &self.on_actor {
                    handler(ctx, actor, other);
                    return true;
                }
            }
            TouchTarget::Tile(tile) => {
                if let Some(handler) = &self.on_tile {
                    handler(ctx, actor, tile);
                    return true;
                }
            }
            TouchTarget::Boundary(direction) => {
                if let Some(handler) = &self.on_boundary {
                    handler(ctx, actor, direction);
                    return true;
                }
            }
        }
        let Some(handler) = &self.on_default else {
            return false;
        };
        handler(ctx, actor);
        true
    }
}

impl fmt::Debug for TouchHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TouchHandlers")
            .field("on_actor", &self.on_actor.is_some())
            .field("on_tile", &self.on_tile.is_some())
            .field("on_boundary", &self.on_boundary.is_some())
            .field("on_default", &self.on_default.is_some())
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct LayerMatrix {
    slots: Vec<Option<TouchHandlers>>,
}

impl Default for LayerMatrix {
    fn default() -> Self {
        Self {
            slots: vec![None; LAYER_COUNT * (LAYER_COUNT + 1) / 2],
        }
    }
}

impl LayerMatrix {
    fn slot_index(a: Layer, b: Layer) -> usize {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        // Row `high` starts after the `high * (high + 1) / 2` slots of the rows before it.
        high.index() * (high.index() + 1) / 2 + low.index()
    }

    fn set(&mut self, a: Layer, b: Layer, handlers: TouchHandlers) {
        let index = Self::slot_index(a, b);
        self.slots[index] = Some(handlers);
    }

    pub fn get(&self, a: Layer, b: Layer) -> Option<&TouchHandlers> {
        self.slots.get(Self::slot_index(a, b)).and_then(Option::as_ref)
    }

    pub fn registered_pairs(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}

#[derive(Debug, Clone, Default)]
pub struct DispatchTables {
    touch: LayerMatrix,
    exit: LayerMatrix,
}

impl DispatchTables {
    pub fn builder() -> DispatchTablesBuilder {
        DispatchTablesBuilder::default()
    }

    pub fn touch_handlers(&self, a: Layer, b: Layer) -> Option<&TouchHandlers> {
        self.touch.get(a, b)
    }

    pub fn exit_handlers(&self, a: Layer, b: Layer) -> Option<&TouchHandlers> {
        self.exit.get(a, b)
    }

    pub fn dispatch(
        &self,
        ctx: &mut TouchContext<'_>,
        actor: ActorId,
        layer: Layer,
        target: TouchTarget,
        target_layer: Layer,
    ) -> bool {
        self.touch
            .get(layer, target_layer)
            .is_some_and(|handlers| handlers.invoke(ctx, actor, target))
    }

    pub fn dispatch_exit(
        &self,
        ctx: &mut TouchContext<'_>,
        actor: ActorId,
        layer: Layer,
        target: TouchTarget,
        target_layer: Layer,
    ) -> bool {
        self.exit
            .get(layer, target_layer)
            .is_some_and(|handlers| handlers.invoke(ctx, actor, target))
    }

    pub fn registered_pairs(&self) -> usize {
        self.touch.registered_pairs() + self.exit.registered_pairs()
    }
}

#[derive(Debug, Default)]
pub struct DispatchTablesBuilder {
    tables: DispatchTables,
}

impl DispatchTablesBuilder {
    /// Registering the same pair twice replaces the earlier handlers.
    pub fn register(&mut self, a: Layer, b: Layer, handlers: TouchHandlers) -> &mut Self {
        self.tables.touch.set(a, b, handlers);
        self
    }

    pub fn register_exit(&mut self, a: Layer, b: Layer, handlers: TouchHandlers) -> &mut Self {
        self.tables.exit.set(a, b, handlers);
        self
    }

    pub fn build(self) -> DispatchTables {
        self.tables
    }
}
