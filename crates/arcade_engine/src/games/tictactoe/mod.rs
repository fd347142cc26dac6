//! Tic-tac-toe: player1 is X, player2 (or the bot) is O.

mod board;
mod bot;
mod service;

pub use board::{Board, Mark, Square, TicTacToeState, WINNING_LINES};
pub use bot::TicTacToeBot;
pub use service::TicTacToeService;
