use tracing::warn;

use super::nodes::NodePool;
use crate::geometry::{Cell, Direction};
use crate::passability::PassabilityGrid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Cells to walk, excluding the start and ending at the target.
    Found(Vec<Cell>),
    Unreachable,
    ExpansionLimit,
}

impl RouteOutcome {
    pub fn into_route(self) -> Option<Vec<Cell>> {
        match self {
            Self::Found(route) => Some(route),
            Self::Unreachable | Self::ExpansionLimit => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct OpenEntry {
    index: usize,
    f_cost: u32,
    insertion_order: u64,
}

fn open_entry_order_key(entry: OpenEntry) -> (u32, u64) {
    (entry.f_cost, entry.insertion_order)
}

fn pick_best_open_entry(open: &[OpenEntry]) -> usize {
    let mut best_index = 0usize;
    for index in 1..open.len() {
        if open_entry_order_key(open[index]) < open_entry_order_key(open[best_index]) {
            best_index = index;
        }
    }
    best_index
}

pub fn assert_route_request(grid: &PassabilityGrid, start: Cell, target: Cell) {
    assert!(start != target, "route start and target are both {start:?}");
    assert!(
        grid.cell(start).passable,
        "route start {start:?} is impassable"
    );
    assert!(
        grid.cell(target).passable,
        "route target {target:?} is impassable"
    );
}

/// Diagonal steps need both orthogonal neighbors walkable and free of hazards.
fn corner_is_clear(grid: &PassabilityGrid, from: Cell, direction: Direction) -> bool {
    let (dx, dy) = direction.offset();
    [Cell::new(from.x + dx, from.y), Cell::new(from.x, from.y + dy)]
        .into_iter()
        .all(|corner| grid.is_passable(corner) && !grid.cell(corner).trigger)
}

pub fn find_route(
    grid: &PassabilityGrid,
    nodes: &mut NodePool,
    start: Cell,
    target: Cell,
    max_expansions: usize,
) -> RouteOutcome {
    assert_route_request(grid, start, target);
    if nodes.width() != grid.width() || nodes.height() != grid.height() {
        *nodes = NodePool::new(grid.width(), grid.height());
    }
    let (Some(start_index), Some(target_index)) = (nodes.index_of(start), nodes.index_of(target))
    else {
        return RouteOutcome::Unreachable;
    };

    nodes.begin_query();
    let mut open = Vec::new();
    let mut next_insertion = 0u64;
    let start_h = start.manhattan_distance(target);
    nodes.open(start_index, 0, start_h, None);
    open.push(OpenEntry {
        index: start_index,
        f_cost: start_h,
        insertion_order: next_insertion,
    });
    next_insertion = next_insertion.saturating_add(1);

    let mut expansions = 0usize;
    while !open.is_empty() {
        let best = pick_best_open_entry(&open);
        let current = open.swap_remove(best);
        if nodes.is_closed(current.index) {
            continue;
        }
        if current.index == target_index {
            return RouteOutcome::Found(nodes.trace_route(start_index, target_index));
        }
        nodes.close(current.index);
        expansions = expansions.saturating_add(1);
        if expansions > max_expansions {
            warn!(
                start = ?start,
                target = ?target,
                max_expansions,
                "path_expansion_limit"
            );
            return RouteOutcome::ExpansionLimit;
        }

        let current_cell = nodes.cell_at(current.index);
        let current_g = nodes.node(current.index).g;
        let successors = Direction::ORTHOGONAL
            .into_iter()
            .chain(Direction::DIAGONAL.into_iter().filter(|direction| {
                corner_is_clear(grid, current_cell, *direction)
            }));
        for direction in successors {
            let neighbor = current_cell.offset(direction);
            if !grid.is_passable(neighbor) {
                continue;
            }
            let Some(neighbor_index) = nodes.index_of(neighbor) else {
                continue;
            };
            if nodes.is_closed(neighbor_index) {
                continue;
            }
            let tentative_g = current_g.saturating_add(grid.cell(neighbor).cost);
            if nodes.is_open(neighbor_index) && tentative_g >= nodes.node(neighbor_index).g {
                continue;
            }
            let h_cost = neighbor.manhattan_distance(target);
            nodes.open(neighbor_index, tentative_g, h_cost, Some(current.index));
            open.push(OpenEntry {
                index: neighbor_index,
                f_cost: nodes.node(neighbor_index).f(),
                insertion_order: next_insertion,
            });
            next_insertion = next_insertion.saturating_add(1);
        }
    }

    RouteOutcome::Unreachable
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passability::PassabilityCell;

    fn route(grid: &PassabilityGrid, start: Cell, target: Cell) -> Option<Vec<Cell>> {
        let mut nodes = NodePool::new(grid.width(), grid.height());
        find_route(grid, &mut nodes, start, target, 10_000).into_route()
    }

    fn assert_corner_safe(grid: &PassabilityGrid, start: Cell, path: &[Cell]) {
        let mut previous = start;
        for &cell in path {
            assert!(previous.is_adjacent_to(cell), "{previous:?} -> {cell:?}");
            assert!(grid.is_passable(cell));
            if previous.x != cell.x && previous.y != cell.y {
                assert!(grid.is_passable(Cell::new(cell.x, previous.y)));
                assert!(grid.is_passable(Cell::new(previous.x, cell.y)));
            }
            previous = cell;
        }
    }

    #[test]
    fn open_grid_route_uses_diagonals() {
        let grid = PassabilityGrid::open(5, 5);
        let path = route(&grid, Cell::new(0, 0), Cell::new(4, 4)).expect("route");
        assert_eq!(path.len(), 4);
        assert_eq!(path.last(), Some(&Cell::new(4, 4)));
        assert!(!path.contains(&Cell::new(0, 0)));
        assert_corner_safe(&grid, Cell::new(0, 0), &path);
    }

    #[test]
    fn diagonal_blocked_by_both_corners_has_no_route() {
        let mut grid = PassabilityGrid::open(5, 5);
        grid.set(Cell::new(1, 0), PassabilityCell::BLOCKED);
        grid.set(Cell::new(0, 1), PassabilityCell::BLOCKED);
        assert_eq!(route(&grid, Cell::new(0, 0), Cell::new(1, 1)), None);
    }

    #[test]
    fn single_blocked_corner_routes_around() {
        let mut grid = PassabilityGrid::open(5, 5);
        grid.set(Cell::new(1, 0), PassabilityCell::BLOCKED);
        let path = route(&grid, Cell::new(0, 0), Cell::new(1, 1)).expect("route");
        assert_eq!(path, vec![Cell::new(0, 1), Cell::new(1, 1)]);
    }

    #[test]
    fn trigger_corner_prevents_diagonal() {
        let grid = PassabilityGrid::from_ascii(&["...", "...", ".~."]);
        let path = route(&grid, Cell::new(0, 0), Cell::new(1, 1)).expect("route");
        assert_eq!(path, vec![Cell::new(0, 1), Cell::new(1, 1)]);
    }

    #[test]
    fn enclosed_target_is_unreachable() {
        let grid = PassabilityGrid::from_ascii(&[
            ".....", //
            ".###.", //
            ".#.#.", //
            ".###.", //
            ".....",
        ]);
        let mut nodes = NodePool::new(5, 5);
        assert_eq!(
            find_route(&grid, &mut nodes, Cell::new(0, 0), Cell::new(2, 2), 10_000),
            RouteOutcome::Unreachable
        );
    }

    #[test]
    fn expansion_ceiling_yields_no_route() {
        let grid = PassabilityGrid::open(20, 20);
        let mut nodes = NodePool::new(20, 20);
        assert_eq!(
            find_route(&grid, &mut nodes, Cell::new(0, 0), Cell::new(19, 0), 3),
            RouteOutcome::ExpansionLimit
        );
    }

    #[test]
    fn costly_cells_are_avoided_when_cheaper_detour_exists() {
        let grid = PassabilityGrid::from_ascii(&[
            "...", //
            "#~#", //
            "...",
        ]);
        // Only way up passes the shallows; the route still reaches the target.
        let path = route(&grid, Cell::new(1, 0), Cell::new(1, 2)).expect("route");
        assert_eq!(path, vec![Cell::new(1, 1), Cell::new(1, 2)]);

        let mut open = PassabilityGrid::from_ascii(&["...", "...", "..."]);
        open.set(
            Cell::new(1, 1),
            PassabilityCell {
                passable: true,
                cost: 9,
                trigger: true,
            },
        );
        let path = route(&open, Cell::new(1, 0), Cell::new(1, 2)).expect("route");
        assert!(!path.contains(&Cell::new(1, 1)));
        assert_eq!(path.last(), Some(&Cell::new(1, 2)));
    }

    #[test]
    fn ties_break_by_insertion_order() {
        let grid = PassabilityGrid::open(3, 3);
        let first = route(&grid, Cell::new(1, 0), Cell::new(1, 2)).expect("route");
        let second = route(&grid, Cell::new(1, 0), Cell::new(1, 2)).expect("route");
        assert_eq!(first, second);
        assert_eq!(first, vec![Cell::new(1, 1), Cell::new(1, 2)]);
    }

    #[test]
    fn node_pool_is_reused_between_queries() {
        let grid = PassabilityGrid::open(4, 4);
        let mut nodes = NodePool::new(4, 4);
        let a = find_route(&grid, &mut nodes, Cell::new(0, 0), Cell::new(3, 3), 100);
        let b = find_route(&grid, &mut nodes, Cell::new(3, 3), Cell::new(0, 0), 100);
        assert_eq!(nodes.generation(), 2);
        assert_eq!(a.into_route().map(|r| r.len()), Some(3));
        assert_eq!(b.into_route().map(|r| r.len()), Some(3));
    }

    #[test]
    #[should_panic(expected = "route start and target are both")]
    fn identical_start_and_target_is_a_contract_violation() {
        let grid = PassabilityGrid::open(2, 2);
        let mut nodes = NodePool::new(2, 2);
        let _ = find_route(&grid, &mut nodes, Cell::new(1, 1), Cell::new(1, 1), 10);
    }

    #[test]
    #[should_panic(expected = "is impassable")]
    fn impassable_target_is_a_contract_violation() {
        let grid = PassabilityGrid::from_ascii(&[".#"]);
        let mut nodes = NodePool::new(2, 1);
        let _ = find_route(&grid, &mut nodes, Cell::new(0, 0), Cell::new(1, 0), 10);
    }
}
