use crate::colliders::ScenePhysics;
use crate::geometry::{Cell, Vec2};

pub const DEFAULT_PATH_COST: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassabilityCell {
    pub passable: bool,
    pub cost: u32,
    pub trigger: bool,
}

impl PassabilityCell {
    pub const OPEN: Self = Self {
        passable: true,
        cost: DEFAULT_PATH_COST,
        trigger: false,
    };
    pub const BLOCKED: Self = Self {
        passable: false,
        cost: DEFAULT_PATH_COST,
        trigger: false,
    };
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassabilityGrid {
    width: u32,
    height: u32,
    cells: Vec<PassabilityCell>,
}

impl PassabilityGrid {
    pub fn open(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![PassabilityCell::OPEN; width as usize * height as usize],
        }
    }

    /// Grid from rows of `#` (blocked), `~` (trigger, cost 3) and anything else (open).
    /// Row 0 is the top line, so the last line is `y = 0`.
    pub fn from_ascii(rows: &[&str]) -> Self {
        let height = rows.len() as u32;
        let width = rows.first().map_or(0, |row| row.chars().count()) as u32;
        let mut grid = Self::open(width, height);
        for (row_index, row) in rows.iter().enumerate() {
            let y = height as i32 - 1 - row_index as i32;
            for (x, symbol) in row.chars().enumerate() {
                let cell = match symbol {
                    '#' => PassabilityCell::BLOCKED,
                    '~' => PassabilityCell {
                        passable: true,
                        cost: 3,
                        trigger: true,
                    },
                    _ => PassabilityCell::OPEN,
                };
                grid.set(Cell::new(x as i32, y), cell);
            }
        }
        grid
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.y >= 0 && (cell.x as u32) < self.width && (cell.y as u32) < self.height
    }

    fn index_of(&self, cell: Cell) -> Option<usize> {
        if !self.in_bounds(cell) {
            return None;
        }
        Some(cell.y as usize * self.width as usize + cell.x as usize)
    }

    /// Out-of-bounds cells are a caller bug.
    pub fn cell(&self, cell: Cell) -> PassabilityCell {
        let index = self.index_of(cell);
        assert!(
            index.is_some(),
            "cell {cell:?} outside {}x{} passability grid",
            self.width,
            self.height
        );
        index.map_or(PassabilityCell::BLOCKED, |index| self.cells[index])
    }

    pub fn is_passable(&self, cell: Cell) -> bool {
        self.index_of(cell)
            .is_some_and(|index| self.cells[index].passable)
    }

    pub fn set(&mut self, cell: Cell, value: PassabilityCell) -> bool {
        let Some(index) = self.index_of(cell) else {
            return false;
        };
        self.cells[index] = value;
        true
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn blocked_count(&self) -> usize {
        self.cells.iter().filter(|cell| !cell.passable).count()
    }
}

pub fn build_passability_grid(
    width: u32,
    height: u32,
    origin: Vec2,
    scene: &impl ScenePhysics,
) -> PassabilityGrid {
    let mut grid = PassabilityGrid::open(width, height);
    for y in 0..height as i32 {
        for x in 0..width as i32 {
            let cell = Cell::new(x, y);
            let value = match scene.probe(origin + cell.center()) {
                None => PassabilityCell::OPEN,
                Some(hit) if !hit.trigger => PassabilityCell::BLOCKED,
                Some(hit) => PassabilityCell {
                    passable: true,
                    cost: hit.path_cost.unwrap_or(DEFAULT_PATH_COST),
                    trigger: true,
                },
            };
            grid.set(cell, value);
        }
    }
    grid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colliders::{ColliderPool, ColliderScene, ProbeHit};
    use crate::tiles::{Tile, TileId, TileInstance, TileTable};

    struct FixedScene(Vec<(Cell, ProbeHit)>);

    impl ScenePhysics for FixedScene {
        fn probe(&self, origin: Vec2) -> Option<ProbeHit> {
            let cell = Cell::containing(origin);
            self.0
                .iter()
                .find(|(hit_cell, _)| *hit_cell == cell)
                .map(|(_, hit)| *hit)
        }
    }

    #[test]
    fn probe_results_classify_cells() {
        let scene = FixedScene(vec![
            (
                Cell::new(0, 0),
                ProbeHit {
                    trigger: false,
                    instance: None,
                    path_cost: None,
                },
            ),
            (
                Cell::new(1, 0),
                ProbeHit {
                    trigger: true,
                    instance: None,
                    path_cost: Some(5),
                },
            ),
            (
                Cell::new(2, 0),
                ProbeHit {
                    trigger: true,
                    instance: None,
                    path_cost: None,
                },
            ),
        ]);
        let grid = build_passability_grid(4, 1, Vec2::ZERO, &scene);

        assert_eq!(grid.cell(Cell::new(0, 0)), PassabilityCell::BLOCKED);
        assert_eq!(
            grid.cell(Cell::new(1, 0)),
            PassabilityCell {
                passable: true,
                cost: 5,
                trigger: true
            }
        );
        assert_eq!(grid.cell(Cell::new(2, 0)).cost, DEFAULT_PATH_COST);
        assert!(grid.cell(Cell::new(2, 0)).trigger);
        assert_eq!(grid.cell(Cell::new(3, 0)), PassabilityCell::OPEN);
    }

    #[test]
    fn builds_from_placed_tile_colliders_with_origin() {
        let table = TileTable::standard();
        let mut pool = ColliderPool::default();
        let origin = Vec2::new(20.0, -10.0);
        let placed = [
            TileInstance {
                tile: Tile::from(TileId::DungeonWall),
                cell: Cell::new(0, 1),
            },
            TileInstance {
                tile: Tile::from(TileId::Shallows),
                cell: Cell::new(1, 1),
            },
        ]
        .into_iter()
        .map(|instance| pool.get(instance, table.properties(instance.tile), origin))
        .collect::<Vec<_>>();

        let grid = build_passability_grid(2, 2, origin, &ColliderScene::new(&placed));

        assert!(!grid.is_passable(Cell::new(0, 1)));
        let shallows = grid.cell(Cell::new(1, 1));
        assert!(shallows.passable && shallows.trigger);
        assert_eq!(shallows.cost, 3);
        assert_eq!(grid.blocked_count(), 1);
    }

    #[test]
    fn ascii_rows_are_read_top_down() {
        let grid = PassabilityGrid::from_ascii(&["#..", "..~"]);
        assert_eq!((grid.width(), grid.height()), (3, 2));
        assert!(!grid.is_passable(Cell::new(0, 1)));
        assert!(grid.cell(Cell::new(2, 0)).trigger);
        assert!(!grid.is_passable(Cell::new(-1, 0)));
    }

    #[test]
    #[should_panic(expected = "outside 3x2 passability grid")]
    fn out_of_bounds_query_is_a_contract_violation() {
        let grid = PassabilityGrid::open(3, 2);
        let _ = grid.cell(Cell::new(3, 0));
    }
}
