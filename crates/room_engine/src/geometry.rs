use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length_squared(self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    pub fn normalized(self) -> Self {
        let length = self.length();
        if length <= f32::EPSILON {
            return Self::ZERO;
        }
        Self {
            x: self.x / length,
            y: self.y / length,
        }
    }
}

impl Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self {
            x: self.x * rhs,
            y: self.y * rhs,
        }
    }
}

impl Neg for Vec2 {
    type Output = Self;

    fn neg(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
        }
    }
}

/// Integer cell coordinate inside a room. `(0, 0)` is the bottom-left cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, direction: Direction) -> Self {
        let (dx, dy) = direction.offset();
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    pub fn manhattan_distance(self, other: Self) -> u32 {
        self.x.abs_diff(other.x).saturating_add(self.y.abs_diff(other.y))
    }

    pub fn center(self) -> Vec2 {
        Vec2 {
            x: self.x as f32 + 0.5,
            y: self.y as f32 + 0.5,
        }
    }

    pub fn containing(point: Vec2) -> Self {
        Self {
            x: point.x.floor() as i32,
            y: point.y.floor() as i32,
        }
    }

    pub fn is_adjacent_to(self, other: Self) -> bool {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        dx <= 1 && dy <= 1 && (dx, dy) != (0, 0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Back,
    Front,
    Left,
    Right,
    FrontLeft,
    FrontRight,
    BackLeft,
    BackRight,
}

impl Direction {
    pub const ORTHOGONAL: [Self; 4] = [Self::Back, Self::Front, Self::Left, Self::Right];
    pub const DIAGONAL: [Self; 4] = [
        Self::FrontLeft,
        Self::FrontRight,
        Self::BackLeft,
        Self::BackRight,
    ];

    pub fn offset(self) -> (i32, i32) {
        match self {
            Self::Back => (0, -1),
            Self::Front => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
            Self::FrontLeft => (-1, 1),
            Self::FrontRight => (1, 1),
            Self::BackLeft => (-1, -1),
            Self::BackRight => (1, -1),
        }
    }

    pub fn to_vec2(self) -> Vec2 {
        let (dx, dy) = self.offset();
        Vec2 {
            x: dx as f32,
            y: dy as f32,
        }
    }

    pub fn is_diagonal(self) -> bool {
        matches!(
            self,
            Self::FrontLeft | Self::FrontRight | Self::BackLeft | Self::BackRight
        )
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Back => Self::Front,
            Self::Front => Self::Back,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::FrontLeft => Self::BackRight,
            Self::FrontRight => Self::BackLeft,
            Self::BackLeft => Self::FrontRight,
            Self::BackRight => Self::FrontLeft,
        }
    }

    pub fn from_vec2(value: Vec2) -> Option<Self> {
        if value.length_squared() <= f32::EPSILON {
            return None;
        }
        let sign = |component: f32| -> i32 {
            if component > 0.38 {
                1
            } else if component < -0.38 {
                -1
            } else {
                0
            }
        };
        let unit = value.normalized();
        let (dx, dy) = (sign(unit.x), sign(unit.y));
        [
            Self::Back,
            Self::Front,
            Self::Left,
            Self::Right,
            Self::FrontLeft,
            Self::FrontRight,
            Self::BackLeft,
            Self::BackRight,
        ]
        .into_iter()
        .find(|direction| direction.offset() == (dx, dy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_offsets_cancel() {
        for direction in Direction::ORTHOGONAL.into_iter().chain(Direction::DIAGONAL) {
            let (ax, ay) = direction.offset();
            let (bx, by) = direction.opposite().offset();
            assert_eq!((ax + bx, ay + by), (0, 0), "{direction:?}");
        }
    }

    #[test]
    fn from_vec2_snaps_to_eight_way_facing() {
        assert_eq!(Direction::from_vec2(Vec2::new(0.0, 3.0)), Some(Direction::Front));
        assert_eq!(Direction::from_vec2(Vec2::new(-2.0, -2.0)), Some(Direction::BackLeft));
        assert_eq!(Direction::from_vec2(Vec2::new(1.0, 0.1)), Some(Direction::Right));
        assert_eq!(Direction::from_vec2(Vec2::ZERO), None);
    }

    #[test]
    fn cell_adjacency_excludes_self_and_far_cells() {
        let origin = Cell::new(2, 2);
        assert!(origin.is_adjacent_to(Cell::new(3, 3)));
        assert!(origin.is_adjacent_to(Cell::new(2, 1)));
        assert!(!origin.is_adjacent_to(origin));
        assert!(!origin.is_adjacent_to(Cell::new(4, 2)));
    }

    #[test]
    fn containing_floors_negative_coordinates() {
        assert_eq!(Cell::containing(Vec2::new(-0.25, 1.75)), Cell::new(-1, 1));
        assert_eq!(Cell::new(3, 4).center(), Vec2::new(3.5, 4.5));
    }
}
