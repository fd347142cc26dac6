//! Rock-Paper-Scissors-Lizard-Spock: one simultaneous round.

mod bot;
mod choice;
mod service;

pub use bot::RpslsBot;
pub use choice::{Choice, Resolution, RpslsState};
pub use service::RpslsService;
