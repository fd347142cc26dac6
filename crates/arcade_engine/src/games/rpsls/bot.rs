//! RPSLS bot.

use std::collections::HashMap;

use rand::RngCore;
use rand::seq::IndexedRandom;
use tracing::{debug, instrument};

use super::choice::Choice;
use crate::bots::{Bot, BotContext, Difficulty};
use crate::error::EngineError;
use crate::game::{Game, GameType, Side};
use crate::moves::MoveData;

/// Counters the opponent's favourite recent choice, or picks at random.
#[derive(Debug, Clone, Copy)]
pub struct RpslsBot {
    difficulty: Difficulty,
}

impl RpslsBot {
    /// Creates a bot at the given difficulty.
    pub fn new(difficulty: Difficulty) -> Self {
        Self { difficulty }
    }

    /// Picks a choice given the opponent's recent choices, newest first.
    pub fn choose_choice(&self, history: &[Choice], rng: &mut dyn RngCore) -> Choice {
        if history.is_empty() || self.difficulty.roll(rng, 0.8, 0.5, 0.2) {
            return random_choice(rng);
        }
        match most_common(history) {
            Some(favourite) => {
                debug!(%favourite, "Countering opponent's favourite");
                *favourite.counters().choose(rng).unwrap_or(&Choice::Rock)
            }
            None => random_choice(rng),
        }
    }
}

impl Bot for RpslsBot {
    #[instrument(
        skip(self, game, context, rng),
        fields(game_id = *game.id(), difficulty = %self.difficulty)
    )]
    fn choose(
        &self,
        game: &Game,
        context: &BotContext,
        rng: &mut dyn RngCore,
    ) -> Result<MoveData, EngineError> {
        if game.state().rpsls()?.choice_of(Side::Player2).is_some() {
            return Err(EngineError::NoLegalMove(GameType::Rpsls));
        }
        let history: Vec<Choice> = context
            .recent_opponent_moves
            .iter()
            .filter_map(|data| data.choice.as_deref()?.parse().ok())
            .collect();
        let choice = self.choose_choice(&history, rng);
        Ok(MoveData::choice(choice.to_string()))
    }
}

fn random_choice(rng: &mut dyn RngCore) -> Choice {
    *Choice::ALL.choose(rng).unwrap_or(&Choice::Rock)
}

/// Most frequent choice; ties go to the one seen most recently.
fn most_common(history: &[Choice]) -> Option<Choice> {
    let mut tally: HashMap<Choice, (usize, usize)> = HashMap::new();
    for (age, choice) in history.iter().enumerate() {
        let entry = tally.entry(*choice).or_insert((0, age));
        entry.0 += 1;
    }
    tally
        .into_iter()
        .max_by(|(_, (count_a, age_a)), (_, (count_b, age_b))| {
            count_a.cmp(count_b).then(age_b.cmp(age_a))
        })
        .map(|(choice, _)| choice)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn most_common_breaks_ties_by_recency() {
        let history = [Choice::Spock, Choice::Rock, Choice::Rock, Choice::Spock];
        assert_eq!(most_common(&history), Some(Choice::Spock));
        assert_eq!(
            most_common(&[Choice::Lizard, Choice::Paper, Choice::Paper]),
            Some(Choice::Paper)
        );
        assert_eq!(most_common(&[]), None);
    }

    #[test]
    fn hard_bot_mostly_counters_a_predictable_opponent() {
        let bot = RpslsBot::new(Difficulty::Hard);
        let history = [Choice::Rock; 10];
        let mut rng = StdRng::seed_from_u64(42);
        let countered = (0..200)
            .filter(|_| bot.choose_choice(&history, &mut rng).beats(Choice::Rock))
            .count();
        // 80% counter-play plus the random share that happens to win.
        assert!(countered > 150, "countered {countered} of 200");
    }

    #[test]
    fn no_history_means_random() {
        let bot = RpslsBot::new(Difficulty::Hard);
        let mut rng = StdRng::seed_from_u64(9);
        let picks: std::collections::HashSet<Choice> =
            (0..100).map(|_| bot.choose_choice(&[], &mut rng)).collect();
        assert!(picks.len() > 1);
    }
}
