mod astar;
mod nodes;
mod worker;

pub use astar::{find_route, RouteOutcome};
pub use nodes::NodePool;
pub use worker::{
    request_path, PathInbox, PathOutcome, PathRequestError, PathTask, Pathfinder, PathfinderPool,
};
