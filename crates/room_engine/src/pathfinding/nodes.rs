use crate::geometry::Cell;

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct PathNode {
    pub g: u32,
    pub h: u32,
    pub parent: Option<usize>,
    open_stamp: u32,
    closed_stamp: u32,
}

impl PathNode {
    pub fn f(&self) -> u32 {
        self.g.saturating_add(self.h)
    }
}

/// Nodes belong to the current query only when their stamp matches the pool
/// generation, so starting a query never touches the whole array.
#[derive(Debug, Clone)]
pub struct NodePool {
    width: u32,
    height: u32,
    nodes: Vec<PathNode>,
    generation: u32,
}

impl NodePool {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            nodes: vec![PathNode::default(); width as usize * height as usize],
            generation: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub(crate) fn begin_query(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        if self.generation == 0 {
            self.nodes.fill(PathNode::default());
            self.generation = 1;
        }
    }

    pub(crate) fn index_of(&self, cell: Cell) -> Option<usize> {
        if cell.x < 0 || cell.y < 0 || cell.x as u32 >= self.width || cell.y as u32 >= self.height {
            return None;
        }
        Some(cell.y as usize * self.width as usize + cell.x as usize)
    }

    pub(crate) fn cell_at(&self, index: usize) -> Cell {
        let width = self.width.max(1) as usize;
        Cell::new((index % width) as i32, (index / width) as i32)
    }

    pub(crate) fn node(&self, index: usize) -> &PathNode {
        &self.nodes[index]
    }

    pub(crate) fn is_open(&self, index: usize) -> bool {
        self.nodes[index].open_stamp == self.generation
    }

    pub(crate) fn is_closed(&self, index: usize) -> bool {
        self.nodes[index].closed_stamp == self.generation
    }

    pub(crate) fn open(&mut self, index: usize, g: u32, h: u32, parent: Option<usize>) {
        let generation = self.generation;
        let node = &mut self.nodes[index];
        node.g = g;
        node.h = h;
        node.parent = parent;
        node.open_stamp = generation;
    }

    pub(crate) fn close(&mut self, index: usize) {
        self.nodes[index].closed_stamp = self.generation;
    }

    pub(crate) fn trace_route(&self, start: usize, target: usize) -> Vec<Cell> {
        let mut route = Vec::new();
        let mut cursor = target;
        while cursor != start {
            route.push(self.cell_at(cursor));
            let Some(parent) = self.nodes[cursor].parent else {
                break;
            };
            cursor = parent;
        }
        route.reverse();
        route
    }
}
