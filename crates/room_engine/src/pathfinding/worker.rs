use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use thiserror::Error;
use tracing::{debug, warn};

use super::astar::{assert_route_request, find_route};
use super::nodes::NodePool;
use crate::actor::ActorId;
use crate::geometry::Cell;
use crate::passability::PassabilityGrid;

static SCRATCH_LOCK_POISON_WARNED: AtomicBool = AtomicBool::new(false);
static POOL_LOCK_POISON_WARNED: AtomicBool = AtomicBool::new(false);

fn warn_lock_poison_once(flag: &AtomicBool, lock: &'static str) {
    if flag
        .compare_exchange(false, true, Ordering::Relaxed, Ordering::Relaxed)
        .is_ok()
    {
        warn!(lock, "pathfinding lock poisoned; recovered inner value");
    }
}

fn lock_or_recover<'a, T>(
    mutex: &'a Mutex<T>,
    flag: &AtomicBool,
    lock: &'static str,
) -> MutexGuard<'a, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn_lock_poison_once(flag, lock);
            poisoned.into_inner()
        }
    }
}

#[derive(Debug, Error)]
pub enum PathRequestError {
    #[error("failed to spawn pathfinder thread {name}")]
    Spawn {
        name: String,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug)]
pub struct PathTask {
    handle: JoinHandle<()>,
}

impl PathTask {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn join(self) -> thread::Result<()> {
        self.handle.join()
    }
}

/// At most one query may run per pathfinder; overlapping requests panic.
#[derive(Debug, Clone)]
pub struct Pathfinder {
    label: Arc<str>,
    id: usize,
    grid: Arc<PassabilityGrid>,
    scratch: Arc<Mutex<NodePool>>,
    in_flight: Arc<AtomicBool>,
    max_expansions: usize,
}

impl Pathfinder {
    pub fn new(
        label: impl Into<Arc<str>>,
        id: usize,
        grid: Arc<PassabilityGrid>,
        max_expansions: usize,
    ) -> Self {
        let scratch = NodePool::new(grid.width(), grid.height());
        Self {
            label: label.into(),
            id,
            grid,
            scratch: Arc::new(Mutex::new(scratch)),
            in_flight: Arc::new(AtomicBool::new(false)),
            max_expansions,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn thread_name(&self) -> String {
        format!("pathfinder-{}-{}", self.label, self.id)
    }

    pub fn grid(&self) -> &Arc<PassabilityGrid> {
        &self.grid
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn find_path_blocking(&self, start: Cell, target: Cell) -> Option<Vec<Cell>> {
        let mut nodes = lock_or_recover(&self.scratch, &SCRATCH_LOCK_POISON_WARNED, "scratch");
        find_route(&self.grid, &mut nodes, start, target, self.max_expansions).into_route()
    }

    pub fn find_path<F>(
        &self,
        start: Cell,
        target: Cell,
        on_complete: F,
    ) -> Result<PathTask, PathRequestError>
    where
        F: FnOnce(Option<Vec<Cell>>) + Send + 'static,
    {
        assert_route_request(&self.grid, start, target);
        let already_running = self.in_flight.swap(true, Ordering::AcqRel);
        assert!(
            !already_running,
            "pathfinder {} already has a query in flight",
            self.id
        );

        let name = self.thread_name();
        let worker = self.clone();
        let spawned = thread::Builder::new().name(name.clone()).spawn(move || {
            let route = worker.find_path_blocking(start, target);
            debug!(
                start = ?start,
                target = ?target,
                steps = route.as_ref().map_or(0, Vec::len),
                "path_computed"
            );
            worker.in_flight.store(false, Ordering::Release);
            on_complete(route);
        });
        match spawned {
            Ok(handle) => Ok(PathTask { handle }),
            Err(source) => {
                self.in_flight.store(false, Ordering::Release);
                Err(PathRequestError::Spawn { name, source })
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct PathfinderPool {
    label: Arc<str>,
    grid: Arc<PassabilityGrid>,
    idle: Arc<Mutex<Vec<Pathfinder>>>,
    next_id: Arc<Mutex<usize>>,
    max_idle: usize,
    max_expansions: usize,
}

impl PathfinderPool {
    pub fn new(
        label: impl Into<Arc<str>>,
        grid: Arc<PassabilityGrid>,
        max_idle: usize,
        max_expansions: usize,
    ) -> Self {
        Self {
            label: label.into(),
            grid,
            idle: Arc::new(Mutex::new(Vec::with_capacity(max_idle))),
            next_id: Arc::new(Mutex::new(0)),
            max_idle,
            max_expansions,
        }
    }

    pub fn grid(&self) -> &Arc<PassabilityGrid> {
        &self.grid
    }

    pub fn checkout(&self) -> Pathfinder {
        let reused = lock_or_recover(&self.idle, &POOL_LOCK_POISON_WARNED, "idle").pop();
        if let Some(pathfinder) = reused {
            return pathfinder;
        }
        let mut next_id = lock_or_recover(&self.next_id, &POOL_LOCK_POISON_WARNED, "next_id");
        let id = *next_id;
        *next_id = next_id.saturating_add(1);
        Pathfinder::new(
            Arc::clone(&self.label),
            id,
            Arc::clone(&self.grid),
            self.max_expansions,
        )
    }

    /// Returns a pathfinder. Busy ones and ones past the idle limit are dropped.
    pub fn give_back(&self, pathfinder: Pathfinder) {
        if pathfinder.is_busy() || !Arc::ptr_eq(&pathfinder.grid, &self.grid) {
            return;
        }
        let mut idle = lock_or_recover(&self.idle, &POOL_LOCK_POISON_WARNED, "idle");
        if idle.len() < self.max_idle {
            idle.push(pathfinder);
        }
    }

    pub fn idle(&self) -> usize {
        lock_or_recover(&self.idle, &POOL_LOCK_POISON_WARNED, "idle").len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathOutcome {
    pub actor: ActorId,
    pub target: Cell,
    pub route: Option<Vec<Cell>>,
}

#[derive(Debug)]
pub struct PathInbox {
    sender: Sender<PathOutcome>,
    receiver: Receiver<PathOutcome>,
}

impl Default for PathInbox {
    fn default() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self { sender, receiver }
    }
}

impl PathInbox {
    pub fn sender(&self) -> Sender<PathOutcome> {
        self.sender.clone()
    }

    pub fn drain(&self) -> Vec<PathOutcome> {
        self.receiver.try_iter().collect()
    }
}

pub fn request_path(
    pool: &PathfinderPool,
    inbox: &PathInbox,
    actor: ActorId,
    start: Cell,
    target: Cell,
) -> Result<PathTask, PathRequestError> {
    let pathfinder = pool.checkout();
    let returned = pathfinder.clone();
    let pool_handle = pool.clone();
    let sender = inbox.sender();
    pathfinder.find_path(start, target, move |route| {
        pool_handle.give_back(returned);
        // The room may already be gone; its inbox going with it is fine.
        let _ = sender.send(PathOutcome {
            actor,
            target,
            route,
        });
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn find_path_runs_on_named_worker_and_reports_route() {
        let grid = Arc::new(PassabilityGrid::open(5, 5));
        let pathfinder = Pathfinder::new("room3", 7, grid, 1_000);
        let (sender, receiver) = mpsc::channel();

        let task = pathfinder
            .find_path(Cell::new(0, 0), Cell::new(4, 4), move |route| {
                let name = thread::current().name().map(str::to_owned);
                sender.send((name, route)).expect("send");
            })
            .expect("spawn");

        let (name, route) = receiver
            .recv_timeout(Duration::from_secs(5))
            .expect("path result");
        task.join().expect("worker joined");
        assert_eq!(name.as_deref(), Some("pathfinder-room3-7"));
        assert_eq!(route.map(|r| r.len()), Some(4));
        assert!(!pathfinder.is_busy());
    }

    #[test]
    fn unreachable_target_reports_none() {
        let grid = Arc::new(PassabilityGrid::from_ascii(&["..#", ".#.", "#.."]));
        let pathfinder = Pathfinder::new("test", 0, grid, 1_000);
        let (sender, receiver) = mpsc::channel();
        pathfinder
            .find_path(Cell::new(0, 2), Cell::new(2, 0), move |route| {
                sender.send(route).expect("send");
            })
            .expect("spawn")
            .join()
            .expect("worker joined");
        assert_eq!(receiver.recv_timeout(Duration::from_secs(5)).expect("result"), None);
    }

    #[test]
    #[should_panic(expected = "already has a query in flight")]
    fn overlapping_request_is_a_contract_violation() {
        let grid = Arc::new(PassabilityGrid::open(3, 3));
        let pathfinder = Pathfinder::new("test", 1, grid, 1_000);
        pathfinder.in_flight.store(true, Ordering::Release);
        let _ = pathfinder.find_path(Cell::new(0, 0), Cell::new(2, 2), |_| {});
    }

    #[test]
    fn pool_recycles_pathfinders_through_inbox_requests() {
        let grid = Arc::new(PassabilityGrid::open(6, 6));
        let pool = PathfinderPool::new("test", Arc::clone(&grid), 2, 1_000);
        let inbox = PathInbox::default();

        request_path(&pool, &inbox, ActorId(3), Cell::new(0, 0), Cell::new(5, 5))
            .expect("spawn")
            .join()
            .expect("worker joined");

        let outcomes = inbox.drain();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].actor, ActorId(3));
        assert_eq!(outcomes[0].route.as_ref().map(Vec::len), Some(5));
        assert_eq!(pool.idle(), 1);

        let reused = pool.checkout();
        assert_eq!(reused.id(), 0);
        assert_eq!(pool.idle(), 0);
    }

    #[test]
    fn pool_creates_distinct_pathfinders_when_empty() {
        let pool = PathfinderPool::new("r1.2", Arc::new(PassabilityGrid::open(2, 2)), 1, 10);
        let a = pool.checkout();
        let b = pool.checkout();
        assert_ne!(a.id(), b.id());
        assert_eq!(a.thread_name(), "pathfinder-r1.2-0");
        assert_eq!(b.thread_name(), "pathfinder-r1.2-1");
        pool.give_back(a);
        pool.give_back(b);
        assert_eq!(pool.idle(), 1);
    }
}
