//! Rules, services and bots for each game type.

pub mod battleship;
pub mod rpsls;
pub mod tictactoe;
