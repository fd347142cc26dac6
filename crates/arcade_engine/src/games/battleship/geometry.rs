//! Grid geometry and the canonical fleet.

use serde::{Deserialize, Serialize};

/// Side length of the square board.
pub const BOARD_SIZE: usize = 10;

const COLUMN_LABELS: [char; BOARD_SIZE] = ['A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J'];

/// A cell on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    /// Row, 0-9 from the top.
    pub row: usize,
    /// Column, 0-9 from the left.
    pub col: usize,
}

impl Coord {
    /// Builds an in-bounds coordinate from signed payload values.
    pub fn checked(row: i64, col: i64) -> Option<Self> {
        let row = usize::try_from(row).ok().filter(|r| *r < BOARD_SIZE)?;
        let col = usize::try_from(col).ok().filter(|c| *c < BOARD_SIZE)?;
        Some(Self { row, col })
    }

    /// Human-readable label such as `B4`.
    pub fn label(self) -> String {
        format!("{}{}", COLUMN_LABELS[self.col], self.row + 1)
    }
}

impl std::fmt::Display for Coord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Ship orientation, anchored at the top-left cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Extends to the right.
    Horizontal,
    /// Extends downwards.
    Vertical,
}

impl Orientation {
    /// Maps the payload's `horizontal` flag.
    pub fn from_horizontal(horizontal: bool) -> Self {
        if horizontal {
            Orientation::Horizontal
        } else {
            Orientation::Vertical
        }
    }

    /// Returns the other orientation.
    pub fn flipped(self) -> Self {
        match self {
            Orientation::Horizontal => Orientation::Vertical,
            Orientation::Vertical => Orientation::Horizontal,
        }
    }
}

/// The classic ten-ship fleet: one 4, two 3s, three 2s, four 1s.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ShipType {
    #[allow(missing_docs)]
    Battleship,
    #[allow(missing_docs)]
    Cruiser1,
    #[allow(missing_docs)]
    Cruiser2,
    #[allow(missing_docs)]
    Destroyer1,
    #[allow(missing_docs)]
    Destroyer2,
    #[allow(missing_docs)]
    Destroyer3,
    #[allow(missing_docs)]
    Submarine1,
    #[allow(missing_docs)]
    Submarine2,
    #[allow(missing_docs)]
    Submarine3,
    #[allow(missing_docs)]
    Submarine4,
}

impl ShipType {
    /// The whole fleet, largest ships first.
    pub const FLEET: [ShipType; 10] = [
        ShipType::Battleship,
        ShipType::Cruiser1,
        ShipType::Cruiser2,
        ShipType::Destroyer1,
        ShipType::Destroyer2,
        ShipType::Destroyer3,
        ShipType::Submarine1,
        ShipType::Submarine2,
        ShipType::Submarine3,
        ShipType::Submarine4,
    ];

    /// Number of cells the ship occupies.
    pub fn length(self) -> usize {
        match self {
            ShipType::Battleship => 4,
            ShipType::Cruiser1 | ShipType::Cruiser2 => 3,
            ShipType::Destroyer1 | ShipType::Destroyer2 | ShipType::Destroyer3 => 2,
            ShipType::Submarine1
            | ShipType::Submarine2
            | ShipType::Submarine3
            | ShipType::Submarine4 => 1,
        }
    }

    /// Class name used in move descriptions.
    pub fn class_name(self) -> &'static str {
        match self.length() {
            4 => "Battleship",
            3 => "Cruiser",
            2 => "Destroyer",
            _ => "Submarine",
        }
    }
}

/// Cells covered by a ship anchored at `anchor`, or `None` if any would
/// fall off the board.
pub fn ship_cells(anchor: Coord, length: usize, orientation: Orientation) -> Option<Vec<Coord>> {
    (0..length)
        .map(|i| {
            let (row, col) = match orientation {
                Orientation::Horizontal => (anchor.row, anchor.col + i),
                Orientation::Vertical => (anchor.row + i, anchor.col),
            };
            (row < BOARD_SIZE && col < BOARD_SIZE).then_some(Coord { row, col })
        })
        .collect()
}

/// The in-bounds 8-neighborhood of a cell.
pub fn neighbors(cell: Coord) -> impl Iterator<Item = Coord> {
    (-1i64..=1)
        .flat_map(|dr| (-1i64..=1).map(move |dc| (dr, dc)))
        .filter(|&(dr, dc)| (dr, dc) != (0, 0))
        .filter_map(move |(dr, dc)| Coord::checked(cell.row as i64 + dr, cell.col as i64 + dc))
}

/// The in-bounds orthogonal neighbors of a cell.
pub(crate) fn orthogonal(cell: Coord) -> impl Iterator<Item = Coord> {
    [(-1i64, 0i64), (1, 0), (0, -1), (0, 1)]
        .into_iter()
        .filter_map(move |(dr, dc)| Coord::checked(cell.row as i64 + dr, cell.col as i64 + dc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fleet_covers_twenty_cells() {
        assert_eq!(ShipType::FLEET.iter().map(|s| s.length()).sum::<usize>(), 20);
        let mut lengths: Vec<usize> = ShipType::FLEET.iter().map(|s| s.length()).collect();
        lengths.dedup();
        assert_eq!(lengths, vec![4, 3, 2, 1]);
    }

    #[test]
    fn ship_cells_respects_bounds() {
        let anchor = Coord { row: 0, col: 7 };
        assert_eq!(
            ship_cells(anchor, 3, Orientation::Horizontal),
            Some(vec![
                Coord { row: 0, col: 7 },
                Coord { row: 0, col: 8 },
                Coord { row: 0, col: 9 }
            ])
        );
        assert_eq!(ship_cells(anchor, 4, Orientation::Horizontal), None);
        assert_eq!(ship_cells(Coord { row: 7, col: 0 }, 4, Orientation::Vertical), None);
    }

    #[test]
    fn corner_has_three_neighbors() {
        assert_eq!(neighbors(Coord { row: 0, col: 0 }).count(), 3);
        assert_eq!(neighbors(Coord { row: 5, col: 5 }).count(), 8);
        assert_eq!(neighbors(Coord { row: 9, col: 4 }).count(), 5);
        assert_eq!(orthogonal(Coord { row: 9, col: 9 }).count(), 2);
    }

    #[test]
    fn labels() {
        assert_eq!(Coord { row: 3, col: 1 }.label(), "B4");
        assert_eq!(Coord { row: 9, col: 9 }.label(), "J10");
        assert_eq!(Coord::checked(-1, 0), None);
        assert_eq!(Coord::checked(0, 10), None);
    }

    #[test]
    fn ship_type_tokens() {
        assert_eq!("destroyer2".parse::<ShipType>().unwrap(), ShipType::Destroyer2);
        assert_eq!(ShipType::Submarine4.to_string(), "submarine4");
        assert_eq!(ShipType::Cruiser2.class_name(), "Cruiser");
    }
}
