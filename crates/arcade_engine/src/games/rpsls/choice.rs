//! Choices and the beats-table.

use serde::{Deserialize, Serialize};

use crate::game::Side;

/// One of the five hand signs.
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
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Choice {
    /// Crushes scissors and lizard.
    Rock,
    /// Covers rock, disproves Spock.
    Paper,
    /// Cuts paper, decapitates lizard.
    Scissors,
    /// Eats paper, poisons Spock.
    Lizard,
    /// Smashes scissors, vaporizes rock.
    Spock,
}

impl Choice {
    /// All five choices.
    pub const ALL: [Choice; 5] = [
        Choice::Rock,
        Choice::Paper,
        Choice::Scissors,
        Choice::Lizard,
        Choice::Spock,
    ];

    /// The two choices this one defeats.
    pub fn defeats(self) -> [Choice; 2] {
        match self {
            Choice::Rock => [Choice::Scissors, Choice::Lizard],
            Choice::Paper => [Choice::Rock, Choice::Spock],
            Choice::Scissors => [Choice::Paper, Choice::Lizard],
            Choice::Lizard => [Choice::Paper, Choice::Spock],
            Choice::Spock => [Choice::Rock, Choice::Scissors],
        }
    }

    /// The two choices that defeat this one.
    pub fn counters(self) -> [Choice; 2] {
        match self {
            Choice::Rock => [Choice::Paper, Choice::Spock],
            Choice::Paper => [Choice::Scissors, Choice::Lizard],
            Choice::Scissors => [Choice::Rock, Choice::Spock],
            Choice::Lizard => [Choice::Rock, Choice::Scissors],
            Choice::Spock => [Choice::Paper, Choice::Lizard],
        }
    }

    /// Checks the beats relation.
    pub fn beats(self, other: Choice) -> bool {
        self.defeats().contains(&other)
    }

    /// Capitalized name for move descriptions.
    pub fn label(self) -> &'static str {
        match self {
            Choice::Rock => "Rock",
            Choice::Paper => "Paper",
            Choice::Scissors => "Scissors",
            Choice::Lizard => "Lizard",
            Choice::Spock => "Spock",
        }
    }
}

/// Outcome of comparing player1's choice with player2's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// One side's choice beats the other.
    Winner(Side),
    /// Same choice.
    Tie,
}

impl Resolution {
    /// Compares two choices.
    pub fn of(player1: Choice, player2: Choice) -> Self {
        if player1 == player2 {
            Resolution::Tie
        } else if player1.beats(player2) {
            Resolution::Winner(Side::Player1)
        } else {
            Resolution::Winner(Side::Player2)
        }
    }
}

/// RPSLS state blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpslsState {
    /// Player1's hidden choice.
    pub player1_choice: Option<Choice>,
    /// Player2's (or the bot's) hidden choice.
    pub player2_choice: Option<Choice>,
    /// Round counter, starts at 1.
    pub round: u32,
}

impl Default for RpslsState {
    fn default() -> Self {
        Self {
            player1_choice: None,
            player2_choice: None,
            round: 1,
        }
    }
}

impl RpslsState {
    /// The choice slot belonging to a side.
    pub fn choice_of(&self, side: Side) -> Option<Choice> {
        match side {
            Side::Player1 => self.player1_choice,
            Side::Player2 => self.player2_choice,
        }
    }

    pub(crate) fn set_choice(&mut self, side: Side, choice: Choice) {
        match side {
            Side::Player1 => self.player1_choice = Some(choice),
            Side::Player2 => self.player2_choice = Some(choice),
        }
    }

    /// Both choices, once the round is complete.
    pub fn both(&self) -> Option<(Choice, Choice)> {
        Some((self.player1_choice?, self.player2_choice?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_choice_beats_exactly_two() {
        for choice in Choice::ALL {
            let wins = Choice::ALL.iter().filter(|other| choice.beats(**other)).count();
            assert_eq!(wins, 2, "{choice}");
            assert!(!choice.beats(choice));
        }
    }

    #[test]
    fn distinct_pairs_have_exactly_one_winner() {
        for a in Choice::ALL {
            for b in Choice::ALL {
                if a != b {
                    assert!(a.beats(b) ^ b.beats(a), "{a} vs {b}");
                }
            }
        }
    }

    #[test]
    fn counters_beat_the_choice() {
        for choice in Choice::ALL {
            for counter in choice.counters() {
                assert!(counter.beats(choice));
            }
        }
        assert_eq!(Choice::Rock.counters(), [Choice::Paper, Choice::Spock]);
    }

    #[test]
    fn resolution() {
        assert_eq!(
            Resolution::of(Choice::Rock, Choice::Scissors),
            Resolution::Winner(Side::Player1)
        );
        assert_eq!(
            Resolution::of(Choice::Rock, Choice::Spock),
            Resolution::Winner(Side::Player2)
        );
        assert_eq!(Resolution::of(Choice::Lizard, Choice::Lizard), Resolution::Tie);
    }

    #[test]
    fn tokens_parse_lowercase() {
        assert_eq!("spock".parse::<Choice>().unwrap(), Choice::Spock);
        assert!("Spock ".parse::<Choice>().is_err());
        assert_eq!(Choice::Lizard.to_string(), "lizard");
    }
}
