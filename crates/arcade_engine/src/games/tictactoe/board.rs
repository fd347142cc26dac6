//! Board primitives for tic-tac-toe.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::game::Side;

/// A player's mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
pub enum Mark {
    /// Player1's mark, moves first.
    X,
    /// Player2's (or the bot's) mark.
    O,
}

impl Mark {
    /// The mark a slot plays with.
    pub fn for_side(side: Side) -> Self {
        match side {
            Side::Player1 => Mark::X,
            Side::Player2 => Mark::O,
        }
    }

    /// Returns the opposing mark.
    pub fn opponent(self) -> Self {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

/// A square on the board; `None` is empty.
pub type Square = Option<Mark>;

/// The eight winning triples: rows, columns, diagonals.
pub const WINNING_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// 3x3 board in row-major order (0-8).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    squares: [Square; 9],
}

impl Board {
    /// Creates an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the square at `pos`, `None` when out of range.
    pub fn get(&self, pos: usize) -> Option<Square> {
        self.squares.get(pos).copied()
    }

    /// Places a mark. Out-of-range positions are ignored.
    pub fn set(&mut self, pos: usize, mark: Mark) {
        if let Some(square) = self.squares.get_mut(pos) {
            *square = Some(mark);
        }
    }

    /// Checks if a square is empty.
    pub fn is_empty(&self, pos: usize) -> bool {
        matches!(self.get(pos), Some(None))
    }

    /// Returns all squares.
    pub fn squares(&self) -> &[Square; 9] {
        &self.squares
    }

    /// Indices of the empty squares.
    pub fn empty_positions(&self) -> Vec<usize> {
        (0..9).filter(|&pos| self.is_empty(pos)).collect()
    }

    /// Number of squares holding `mark`.
    pub fn count(&self, mark: Mark) -> usize {
        self.squares.iter().filter(|s| **s == Some(mark)).count()
    }

    /// Checks if every square is taken.
    pub fn is_full(&self) -> bool {
        self.squares.iter().all(Option::is_some)
    }

    /// Returns the mark owning a complete line, if any.
    #[instrument(skip(self))]
    pub fn winner(&self) -> Option<Mark> {
        WINNING_LINES.iter().find_map(|&[a, b, c]| {
            let mark = self.squares[a]?;
            (self.squares[b] == Some(mark) && self.squares[c] == Some(mark)).then_some(mark)
        })
    }

    /// Checks whether `mark` owns a complete line.
    pub fn has_line(&self, mark: Mark) -> bool {
        WINNING_LINES
            .iter()
            .any(|line| line.iter().all(|&pos| self.squares[pos] == Some(mark)))
    }

    /// Full board without a winning line.
    pub fn is_draw(&self) -> bool {
        self.is_full() && self.winner().is_none()
    }

    /// Formats the board as text, empty squares showing their 1-based number.
    pub fn display(&self) -> String {
        let mut result = String::new();
        for row in 0..3 {
            for col in 0..3 {
                let pos = row * 3 + col;
                match self.squares[pos] {
                    Some(mark) => result.push_str(&mark.to_string()),
                    None => result.push_str(&(pos + 1).to_string()),
                }
                if col < 2 {
                    result.push('|');
                }
            }
            if row < 2 {
                result.push_str("\n-+-+-\n");
            }
        }
        result
    }
}

/// Tic-tac-toe state blob.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicTacToeState {
    /// The board.
    pub board: Board,
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn test_no_winner_empty_board() {
        assert_eq!(Board::new().winner(), None);
    }

    #[test]
    fn test_winner_top_row() {
        let board = board_from("XXX......");
        assert_eq!(board.winner(), Some(Mark::X));
    }

    #[test]
    fn test_winner_column() {
        let board = board_from(".O..O..O.");
        assert_eq!(board.winner(), Some(Mark::O));
    }

    #[test]
    fn test_winner_anti_diagonal() {
        let board = board_from("..X.X.X..");
        assert!(board.has_line(Mark::X));
        assert!(!board.has_line(Mark::O));
    }

    #[test]
    fn test_no_winner_incomplete() {
        assert_eq!(board_from("XX.......").winner(), None);
    }

    #[test]
    fn test_draw_detection() {
        // X O X / O X X / O X O
        let board = board_from("XOXOXXOXO");
        assert!(board.is_full());
        assert!(board.is_draw());
    }

    #[test]
    fn test_not_draw_if_winner() {
        let board = board_from("XXXOOXOXO");
        assert!(board.is_full());
        assert!(!board.is_draw());
    }

    #[test]
    fn test_out_of_range_is_not_empty() {
        let board = Board::new();
        assert!(!board.is_empty(9));
        assert_eq!(board.get(9), None);
    }

    #[test]
    fn test_display() {
        let board = board_from("X...O....");
        assert_eq!(board.display(), "X|2|3\n-+-+-\n4|O|6\n-+-+-\n7|8|9");
    }

    #[test]
    fn test_serializes_as_flat_array() {
        let json = serde_json::to_string(&board_from("X...O....")).unwrap();
        assert_eq!(json, r#"["X",null,null,null,"O",null,null,null,null]"#);
    }
}
