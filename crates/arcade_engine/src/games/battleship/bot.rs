//! Battleship bot.

use rand::RngCore;
use rand::seq::{IndexedRandom, SliceRandom};
use tracing::{debug, instrument};

use super::board::{Phase, Shot, SideBoard};
use super::geometry::{BOARD_SIZE, Coord, Orientation, orthogonal};
use crate::bots::{Bot, BotContext, Difficulty};
use crate::error::EngineError;
use crate::game::{Game, GameType, Side};
use crate::moves::MoveData;

/// Random attempts per ship before the bot starts its layout over.
pub const PLACEMENT_ATTEMPTS: usize = 100;

/// Places one ship per call, confirms the fleet, then fires. Targeting
/// follows up on unfinished hits unless a random shot is rolled.
#[derive(Debug, Clone, Copy)]
pub struct BattleshipBot {
    difficulty: Difficulty,
}

impl BattleshipBot {
    /// Creates a bot at the given difficulty.
    pub fn new(difficulty: Difficulty) -> Self {
        Self { difficulty }
    }

    /// Next placement-phase payload for the bot's side, `None` once ready.
    pub fn placement_move(&self, own: &SideBoard, rng: &mut dyn RngCore) -> Option<MoveData> {
        if own.ready {
            return None;
        }
        let Some(ship) = own.next_unplaced() else {
            return Some(MoveData::action("ready"));
        };
        match own.random_spot(ship, rng, PLACEMENT_ATTEMPTS) {
            Some((anchor, orientation)) => Some(MoveData::place_ship(
                ship.to_string(),
                anchor.row as i64,
                anchor.col as i64,
                orientation == Orientation::Horizontal,
            )),
            None => {
                debug!(%ship, "No spot found, starting the layout over");
                Some(MoveData::action("clear_board"))
            }
        }
    }

    /// Picks a target on the bot's own shot grid, `None` when every cell
    /// has been fired at.
    pub fn choose_target(&self, own: &SideBoard, rng: &mut dyn RngCore) -> Option<Coord> {
        if self.difficulty.roll(rng, 0.8, 0.5, 0.2) {
            self.random_target(own, rng)
        } else {
            follow_up(own, rng).or_else(|| self.random_target(own, rng))
        }
    }

    fn random_target(&self, own: &SideBoard, rng: &mut dyn RngCore) -> Option<Coord> {
        let open = own.unshot_cells();
        if self.difficulty == Difficulty::Hard {
            let parity: Vec<Coord> = open
                .iter()
                .copied()
                .filter(|cell| (cell.row + cell.col) % 2 == 0)
                .collect();
            if let Some(cell) = parity.choose(rng) {
                return Some(*cell);
            }
        }
        open.choose(rng).copied()
    }
}

/// An unshot orthogonal neighbor of some hit. Cells around sunk ships are
/// already marked, so only unfinished ships yield candidates.
fn follow_up(own: &SideBoard, rng: &mut dyn RngCore) -> Option<Coord> {
    let hits = (0..BOARD_SIZE)
        .flat_map(|row| (0..BOARD_SIZE).map(move |col| Coord { row, col }))
        .filter(|cell| own.shot_at(*cell) == Some(Shot::Hit));
    for hit in hits {
        let mut around: Vec<Coord> = orthogonal(hit)
            .filter(|cell| own.shot_at(*cell).is_none())
            .collect();
        around.shuffle(rng);
        if let Some(cell) = around.first() {
            return Some(*cell);
        }
    }
    None
}

impl Bot for BattleshipBot {
    #[instrument(
        skip(self, game, _context, rng),
        fields(game_id = *game.id(), difficulty = %self.difficulty)
    )]
    fn choose(
        &self,
        game: &Game,
        _context: &BotContext,
        rng: &mut dyn RngCore,
    ) -> Result<MoveData, EngineError> {
        let state = game.state().battleship()?;
        let own = state.side(Side::Player2);
        let choice = match state.phase {
            Phase::Placement => self.placement_move(own, rng),
            Phase::Battle => self
                .choose_target(own, rng)
                .map(|target| MoveData::shoot(target.row as i64, target.col as i64)),
        };
        choice.ok_or(EngineError::NoLegalMove(GameType::Battleship))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::battleship::ShipType;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn placement_walks_the_fleet_then_readies() {
        let bot = BattleshipBot::new(Difficulty::Easy);
        let mut rng = StdRng::seed_from_u64(5);
        let mut side = SideBoard::default();
        for _ in 0..200 {
            let Some(data) = bot.placement_move(&side, &mut rng) else {
                break;
            };
            match data.action.as_deref() {
                Some("place_ship") => {
                    let ship: ShipType = data.ship_type.as_deref().unwrap().parse().unwrap();
                    let anchor = Coord::checked(data.row.unwrap(), data.col.unwrap()).unwrap();
                    let orientation = Orientation::from_horizontal(data.horizontal.unwrap());
                    side.place(ship, anchor, orientation).unwrap();
                }
                Some("clear_board") => side.clear(),
                Some("ready") => side.ready = true,
                other => panic!("unexpected action {other:?}"),
            }
        }
        assert!(side.ready);
        assert!(side.fleet_complete());
    }

    #[test]
    fn follows_up_on_a_hit() {
        let mut side = SideBoard::default();
        side.shots[5][5] = Some(Shot::Hit);
        side.shots[4][5] = Some(Shot::Miss);
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..20 {
            let target = follow_up(&side, &mut rng).unwrap();
            assert!([(6, 5), (5, 4), (5, 6)].contains(&(target.row, target.col)));
        }
    }

    #[test]
    fn hard_random_shots_use_parity() {
        let bot = BattleshipBot::new(Difficulty::Hard);
        let side = SideBoard::default();
        let mut rng = StdRng::seed_from_u64(8);
        for _ in 0..50 {
            let cell = bot.random_target(&side, &mut rng).unwrap();
            assert_eq!((cell.row + cell.col) % 2, 0);
        }
    }

    #[test]
    fn never_targets_a_shot_cell() {
        let bot = BattleshipBot::new(Difficulty::Medium);
        let mut side = SideBoard::default();
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..BOARD_SIZE * BOARD_SIZE {
            let cell = bot.choose_target(&side, &mut rng).unwrap();
            assert!(side.shot_at(cell).is_none());
            side.shots[cell.row][cell.col] = Some(Shot::Miss);
        }
        assert_eq!(bot.choose_target(&side, &mut rng), None);
    }
}
