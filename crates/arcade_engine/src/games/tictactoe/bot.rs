//! Tic-tac-toe bot.

use rand::RngCore;
use rand::seq::{IndexedRandom, SliceRandom};
use tracing::{debug, instrument};

use super::board::{Board, Mark, WINNING_LINES};
use crate::bots::{Bot, BotContext, Difficulty};
use crate::error::EngineError;
use crate::game::{Game, GameType};
use crate::moves::MoveData;

const CORNERS: [usize; 4] = [0, 2, 6, 8];
const CENTER: usize = 4;

/// Plays O: win, block, center, corner, in that order, with a chance of a
/// random move that shrinks with difficulty.
#[derive(Debug, Clone, Copy)]
pub struct TicTacToeBot {
    difficulty: Difficulty,
}

impl TicTacToeBot {
    /// Creates a bot at the given difficulty.
    pub fn new(difficulty: Difficulty) -> Self {
        Self { difficulty }
    }

    /// Picks a square on `board`, `None` when it is full.
    pub fn choose_position(&self, board: &Board, rng: &mut dyn RngCore) -> Option<usize> {
        if self.difficulty.roll(rng, 0.7, 0.4, 0.1) {
            random_move(board, rng)
        } else {
            smart_move(board, rng)
        }
    }
}

impl Bot for TicTacToeBot {
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
        let board = game.state().tic_tac_toe()?.board;
        let position = self
            .choose_position(&board, rng)
            .ok_or(EngineError::NoLegalMove(GameType::TicTacToe))?;
        debug!(position, "Bot chose square");
        Ok(MoveData::position(position as i64))
    }
}

fn smart_move(board: &Board, rng: &mut dyn RngCore) -> Option<usize> {
    completing_square(board, Mark::O)
        .or_else(|| completing_square(board, Mark::X))
        .or_else(|| board.is_empty(CENTER).then_some(CENTER))
        .or_else(|| corner_move(board, rng))
        .or_else(|| random_move(board, rng))
}

/// An empty square that would give `mark` three in a row.
fn completing_square(board: &Board, mark: Mark) -> Option<usize> {
    WINNING_LINES.iter().find_map(|line| {
        let owned = line.iter().filter(|&&pos| board.get(pos) == Some(Some(mark))).count();
        let empty: Vec<usize> = line.iter().copied().filter(|&pos| board.is_empty(pos)).collect();
        (owned == 2 && empty.len() == 1).then(|| empty[0])
    })
}

fn corner_move(board: &Board, rng: &mut dyn RngCore) -> Option<usize> {
    let mut corners = CORNERS;
    corners.shuffle(rng);
    corners.into_iter().find(|&pos| board.is_empty(pos))
}

fn random_move(board: &Board, rng: &mut dyn RngCore) -> Option<usize> {
    board.empty_positions().choose(rng).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn board_from(marks: &str) -> Board {
        let mut board = Board::new();
        for (pos, ch) in marks.chars().enumerate() {
            match ch {
                'X' => board.set(pos, Mark::X),
                'O' => board.set(pos, Mark::O),
                _ => {}
            }
        }
        board
    }

    #[test]
    fn takes_the_win_before_blocking() {
        // O can win at 5; X threatens at 2.
        let board = board_from("XX.OO....");
        assert_eq!(smart_move(&board, &mut StdRng::seed_from_u64(1)), Some(5));
    }

    #[test]
    fn blocks_the_opponent() {
        let board = board_from("XX..O....");
        assert_eq!(smart_move(&board, &mut StdRng::seed_from_u64(1)), Some(2));
    }

    #[test]
    fn prefers_center_then_corner() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(smart_move(&Board::new(), &mut rng), Some(CENTER));
        let corner = smart_move(&board_from("....X...."), &mut rng).unwrap();
        assert!(CORNERS.contains(&corner));
    }

    #[test]
    fn always_picks_an_empty_square() {
        let board = board_from("XOXOX.O..");
        let mut rng = StdRng::seed_from_u64(3);
        for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            for _ in 0..50 {
                let pos = TicTacToeBot::new(difficulty).choose_position(&board, &mut rng).unwrap();
                assert!(board.is_empty(pos));
            }
        }
    }

    #[test]
    fn full_board_has_no_move() {
        let board = board_from("XOXXOOOXX");
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(TicTacToeBot::new(Difficulty::Hard).choose_position(&board, &mut rng), None);
    }
}
