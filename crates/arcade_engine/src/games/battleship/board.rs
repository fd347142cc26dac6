//! Per-side boards and the battleship state blob.

use std::collections::BTreeMap;

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use super::geometry::{BOARD_SIZE, Coord, Orientation, ShipType, neighbors, ship_cells};
use crate::game::Side;

/// Attempts per ship for the `random_place` action.
pub const RANDOM_PLACE_ATTEMPTS: usize = 200;

/// A 10x10 grid of optional cells.
pub type Grid<T> = [[Option<T>; BOARD_SIZE]; BOARD_SIZE];

/// Result of a shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shot {
    /// A ship was there.
    Hit,
    /// Open water, fired at or ruled out around a sunk ship.
    Miss,
}

/// Game phase, shared by both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Phase {
    /// Both sides arrange their fleets.
    #[default]
    Placement,
    /// Both sides are ready and take shots.
    Battle,
}

/// Why a ship could not go where it was asked to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum PlacementError {
    /// Part of the ship falls outside the grid.
    #[display("Ship does not fit on the board")]
    OffBoard,
    /// A cell already holds another ship.
    #[display("Position is occupied")]
    Occupied,
    /// A cell touches another ship, diagonals included.
    #[display("Ships cannot touch each other")]
    Adjacent,
    /// The ship has not been placed.
    #[display("Ship is not placed")]
    NotPlaced,
}

/// One side's fleet and the shots it has fired.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideBoard {
    /// Own ships, by cell.
    pub board: Grid<ShipType>,
    /// Shots this side fired at the opponent's board.
    pub shots: Grid<Shot>,
    /// Own ships, by type.
    pub ships: BTreeMap<ShipType, Vec<Coord>>,
    /// Set once the fleet is confirmed.
    pub ready: bool,
}

impl SideBoard {
    /// Ship occupying a cell.
    pub fn ship_at(&self, cell: Coord) -> Option<ShipType> {
        self.board[cell.row][cell.col]
    }

    /// Shot this side fired at a cell.
    pub fn shot_at(&self, cell: Coord) -> Option<Shot> {
        self.shots[cell.row][cell.col]
    }

    /// True once every ship of the fleet has a placement.
    pub fn fleet_complete(&self) -> bool {
        ShipType::FLEET.iter().all(|ship| self.ships.contains_key(ship))
    }

    /// First fleet ship still missing, largest first.
    pub fn next_unplaced(&self) -> Option<ShipType> {
        ShipType::FLEET
            .into_iter()
            .find(|ship| !self.ships.contains_key(ship))
    }

    /// Checks that `ship` may occupy `cells`, ignoring its own current cells.
    pub fn check_cells(&self, ship: ShipType, cells: &[Coord]) -> Result<(), PlacementError> {
        let foreign = |cell: Coord| self.ship_at(cell).is_some_and(|other| other != ship);
        if cells.iter().any(|cell| foreign(*cell)) {
            return Err(PlacementError::Occupied);
        }
        if cells.iter().flat_map(|cell| neighbors(*cell)).any(foreign) {
            return Err(PlacementError::Adjacent);
        }
        Ok(())
    }

    /// Places or moves a ship. On error the board is unchanged.
    pub fn place(
        &mut self,
        ship: ShipType,
        anchor: Coord,
        orientation: Orientation,
    ) -> Result<(), PlacementError> {
        let cells = ship_cells(anchor, ship.length(), orientation).ok_or(PlacementError::OffBoard)?;
        self.check_cells(ship, &cells)?;
        self.lift(ship);
        for cell in &cells {
            self.board[cell.row][cell.col] = Some(ship);
        }
        self.ships.insert(ship, cells);
        Ok(())
    }

    /// Turns a placed ship about its top-left cell. On error the board is
    /// unchanged.
    pub fn rotate(&mut self, ship: ShipType) -> Result<(), PlacementError> {
        let cells = self.ships.get(&ship).ok_or(PlacementError::NotPlaced)?;
        if ship.length() == 1 {
            return Ok(());
        }
        let anchor = Coord {
            row: cells.iter().map(|c| c.row).min().unwrap_or_default(),
            col: cells.iter().map(|c| c.col).min().unwrap_or_default(),
        };
        let horizontal = cells.iter().all(|c| c.row == anchor.row);
        self.place(ship, anchor, Orientation::from_horizontal(horizontal).flipped())
    }

    /// Takes a placed ship off the board.
    pub fn remove(&mut self, ship: ShipType) -> Result<(), PlacementError> {
        self.lift(ship).map(|_| ()).ok_or(PlacementError::NotPlaced)
    }

    /// Removes every ship.
    pub fn clear(&mut self) {
        self.board = Default::default();
        self.ships.clear();
    }

    fn lift(&mut self, ship: ShipType) -> Option<Vec<Coord>> {
        let cells = self.ships.remove(&ship)?;
        for cell in &cells {
            self.board[cell.row][cell.col] = None;
        }
        Some(cells)
    }

    /// Tries `attempts` random spots for `ship` and returns the first legal one.
    pub fn random_spot(
        &self,
        ship: ShipType,
        rng: &mut dyn RngCore,
        attempts: usize,
    ) -> Option<(Coord, Orientation)> {
        let span = BOARD_SIZE - ship.length() + 1;
        (0..attempts).find_map(|_| {
            let orientation = Orientation::from_horizontal(rng.random_bool(0.5));
            let anchor = match orientation {
                Orientation::Horizontal => Coord {
                    row: rng.random_range(0..BOARD_SIZE),
                    col: rng.random_range(0..span),
                },
                Orientation::Vertical => Coord {
                    row: rng.random_range(0..span),
                    col: rng.random_range(0..BOARD_SIZE),
                },
            };
            let cells = ship_cells(anchor, ship.length(), orientation)?;
            self.check_cells(ship, &cells).ok()?;
            Some((anchor, orientation))
        })
    }

    /// Lays out the whole fleet from scratch, `None` if some ship found no
    /// spot within `attempts` tries.
    pub fn random_fleet(
        rng: &mut dyn RngCore,
        attempts: usize,
    ) -> Option<(Grid<ShipType>, BTreeMap<ShipType, Vec<Coord>>)> {
        let mut scratch = SideBoard::default();
        for ship in ShipType::FLEET {
            let (anchor, orientation) = scratch.random_spot(ship, rng, attempts)?;
            scratch.place(ship, anchor, orientation).ok()?;
        }
        Some((scratch.board, scratch.ships))
    }

    /// True when every cell of `ship` on this board is a hit in `shots`.
    pub fn is_sunk(&self, ship: ShipType, shots: &Grid<Shot>) -> bool {
        self.ships.get(&ship).is_some_and(|cells| {
            cells
                .iter()
                .all(|cell| shots[cell.row][cell.col] == Some(Shot::Hit))
        })
    }

    /// True when every ship on this board is sunk by `shots`.
    pub fn all_sunk(&self, shots: &Grid<Shot>) -> bool {
        self.ships.keys().all(|ship| self.is_sunk(*ship, shots))
    }

    /// Cells that have not been fired at yet.
    pub fn unshot_cells(&self) -> Vec<Coord> {
        (0..BOARD_SIZE)
            .flat_map(|row| (0..BOARD_SIZE).map(move |col| Coord { row, col }))
            .filter(|cell| self.shot_at(*cell).is_none())
            .collect()
    }
}

/// Battleship state blob.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleshipState {
    /// Player1's side.
    pub player1: SideBoard,
    /// Player2's (or the bot's) side.
    pub player2: SideBoard,
    /// Shared phase.
    pub phase: Phase,
    /// In a bot game, set while the battle turn belongs to the bot.
    #[serde(default)]
    pub bot_to_fire: bool,
}

impl BattleshipState {
    /// One side's board.
    pub fn side(&self, side: Side) -> &SideBoard {
        match side {
            Side::Player1 => &self.player1,
            Side::Player2 => &self.player2,
        }
    }

    /// One side's board, mutably.
    pub fn side_mut(&mut self, side: Side) -> &mut SideBoard {
        match side {
            Side::Player1 => &mut self.player1,
            Side::Player2 => &mut self.player2,
        }
    }

    /// Both sides have confirmed their fleets.
    pub fn both_ready(&self) -> bool {
        self.player1.ready && self.player2.ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn at(row: usize, col: usize) -> Coord {
        Coord { row, col }
    }

    #[test]
    fn place_rejects_overlap_and_contact() {
        let mut side = SideBoard::default();
        side.place(ShipType::Battleship, at(0, 0), Orientation::Horizontal).unwrap();

        assert_eq!(
            side.place(ShipType::Cruiser1, at(0, 2), Orientation::Vertical),
            Err(PlacementError::Occupied)
        );
        // Diagonal contact with the battleship's last cell.
        assert_eq!(
            side.place(ShipType::Submarine1, at(1, 4), Orientation::Vertical),
            Err(PlacementError::Adjacent)
        );
        assert_eq!(
            side.place(ShipType::Cruiser1, at(9, 9), Orientation::Horizontal),
            Err(PlacementError::OffBoard)
        );
        side.place(ShipType::Submarine1, at(2, 0), Orientation::Vertical).unwrap();
        assert_eq!(side.ships.len(), 2);
    }

    #[test]
    fn moving_a_ship_ignores_its_own_cells() {
        let mut side = SideBoard::default();
        side.place(ShipType::Cruiser1, at(4, 4), Orientation::Horizontal).unwrap();
        side.place(ShipType::Cruiser1, at(4, 5), Orientation::Horizontal).unwrap();
        assert_eq!(side.ships[&ShipType::Cruiser1], vec![at(4, 5), at(4, 6), at(4, 7)]);
        assert_eq!(side.ship_at(at(4, 4)), None);
    }

    #[test]
    fn rotate_about_top_left_and_roll_back() {
        let mut side = SideBoard::default();
        side.place(ShipType::Destroyer1, at(0, 0), Orientation::Horizontal).unwrap();
        side.rotate(ShipType::Destroyer1).unwrap();
        assert_eq!(side.ships[&ShipType::Destroyer1], vec![at(0, 0), at(1, 0)]);

        side.place(ShipType::Cruiser1, at(8, 5), Orientation::Horizontal).unwrap();
        let before = side.clone();
        assert_eq!(side.rotate(ShipType::Cruiser1), Err(PlacementError::OffBoard));
        assert_eq!(side, before);

        side.place(ShipType::Submarine1, at(5, 9), Orientation::Horizontal).unwrap();
        assert_eq!(side.rotate(ShipType::Submarine1), Ok(()));
        assert_eq!(side.rotate(ShipType::Battleship), Err(PlacementError::NotPlaced));
    }

    #[test]
    fn random_fleet_is_legal() {
        let mut rng = StdRng::seed_from_u64(11);
        let (board, ships) = SideBoard::random_fleet(&mut rng, RANDOM_PLACE_ATTEMPTS).unwrap();
        let side = SideBoard {
            board,
            ships,
            ..SideBoard::default()
        };
        assert!(side.fleet_complete());
        for (ship, cells) in &side.ships {
            assert_eq!(cells.len(), ship.length());
            side.check_cells(*ship, cells).unwrap();
        }
    }

    #[test]
    fn sinking_is_tracked_per_ship() {
        let mut side = SideBoard::default();
        side.place(ShipType::Destroyer1, at(3, 3), Orientation::Vertical).unwrap();
        let mut shots: Grid<Shot> = Default::default();
        shots[3][3] = Some(Shot::Hit);
        assert!(!side.is_sunk(ShipType::Destroyer1, &shots));
        shots[4][3] = Some(Shot::Hit);
        assert!(side.is_sunk(ShipType::Destroyer1, &shots));
        assert!(side.all_sunk(&shots));
    }

    #[test]
    fn state_serializes_as_json() {
        let mut state = BattleshipState::default();
        state
            .player1
            .place(ShipType::Submarine2, at(0, 0), Orientation::Horizontal)
            .unwrap();
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["phase"], "placement");
        assert_eq!(json["player1"]["board"][0][0], "submarine2");
        assert_eq!(json["player1"]["ships"]["submarine2"][0]["row"], 0);
        let back: BattleshipState = serde_json::from_value(json).unwrap();
        assert_eq!(back, state);
    }
}
