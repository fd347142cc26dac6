//! Battleship move validation and application.
//!
//! Every action is planned against the current game first (phase, ready
//! flag, turn, payload shape), then executed on a clone of the state blob.
//! The clone replaces the stored state only when execution succeeds, so a
//! rejected placement or rotation never leaves a half-edited board behind.

use tracing::{debug, info, instrument};

use super::board::{BattleshipState, Phase, RANDOM_PLACE_ATTEMPTS, Shot, SideBoard};
use super::geometry::{Coord, Orientation, ShipType, neighbors};
use crate::error::{EngineError, MoveError};
use crate::game::{Actor, Game, Side};
use crate::moves::{MoveData, MoveOutcome};
use crate::services::{self, GameService};
use crate::state::GameState;

/// Battleship rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct BattleshipService;

/// Action tags accepted in the `action` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
enum Action {
    PlaceShip,
    RotateShip,
    RemoveShip,
    ClearBoard,
    RandomPlace,
    Ready,
    Shoot,
}

/// A validated request.
#[derive(Debug, Clone, Copy)]
enum Command {
    Place {
        ship: ShipType,
        anchor: Coord,
        orientation: Orientation,
    },
    Rotate(ShipType),
    Remove(ShipType),
    Clear,
    RandomPlace,
    Ready,
    Shoot(Coord),
}

/// What executing a command did to the state.
#[derive(Debug, Clone, Copy)]
enum Effect {
    /// Layout edit with no log entry.
    Edited,
    Placed {
        ship: ShipType,
        anchor: Coord,
        orientation: Orientation,
    },
    Ready {
        battle_begins: bool,
    },
    Fired {
        target: Coord,
        hit: bool,
        sunk: Option<ShipType>,
        fleet_destroyed: bool,
    },
}

impl BattleshipService {
    fn plan(
        &self,
        game: &Game,
        actor: &Actor,
        move_data: &MoveData,
    ) -> Result<(Side, Command), MoveError> {
        services::ensure_playing(game)?;
        let side = services::side_of(game, actor)?;

        let action = move_data
            .action
            .as_deref()
            .ok_or_else(|| MoveError::rejected("Missing action"))?;
        let action: Action = action
            .parse()
            .map_err(|_| EngineError::UnknownAction(action.to_string()))?;

        let state = game.state().battleship()?;
        let command = match action {
            Action::Shoot => return self.plan_shot(game, actor, state, side, move_data),
            _ if state.side(side).ready => return Err(MoveError::rejected("You are already ready")),
            Action::PlaceShip => Command::Place {
                ship: ship_of(move_data)?,
                anchor: coord_of(move_data)
                    .ok_or_else(|| MoveError::rejected("Ship does not fit on the board"))?,
                orientation: Orientation::from_horizontal(move_data.horizontal.unwrap_or(false)),
            },
            Action::RotateShip => Command::Rotate(ship_of(move_data)?),
            Action::RemoveShip => Command::Remove(ship_of(move_data)?),
            Action::ClearBoard => Command::Clear,
            Action::RandomPlace => Command::RandomPlace,
            Action::Ready if !state.side(side).fleet_complete() => {
                return Err(MoveError::rejected("Place all ships first"));
            }
            Action::Ready => Command::Ready,
        };
        Ok((side, command))
    }

    fn plan_shot(
        &self,
        game: &Game,
        actor: &Actor,
        state: &BattleshipState,
        side: Side,
        move_data: &MoveData,
    ) -> Result<(Side, Command), MoveError> {
        if state.phase != Phase::Battle {
            return Err(MoveError::rejected("The battle has not started"));
        }
        ensure_battle_turn(game, state, actor)?;
        let target =
            coord_of(move_data).ok_or_else(|| MoveError::rejected("Shot is outside the board"))?;
        if state.side(side).shot_at(target).is_some() {
            return Err(MoveError::rejected("You already fired at that cell"));
        }
        Ok((side, Command::Shoot(target)))
    }

    /// Runs a planned command against a scratch copy of the state.
    fn execute(
        state: &mut BattleshipState,
        side: Side,
        command: Command,
    ) -> Result<Effect, MoveError> {
        let own = state.side_mut(side);
        let effect = match command {
            Command::Place {
                ship,
                anchor,
                orientation,
            } => {
                own.place(ship, anchor, orientation)
                    .map_err(|err| MoveError::rejected(err.to_string()))?;
                Effect::Placed {
                    ship,
                    anchor,
                    orientation,
                }
            }
            Command::Rotate(ship) => {
                own.rotate(ship)
                    .map_err(|err| MoveError::rejected(err.to_string()))?;
                Effect::Edited
            }
            Command::Remove(ship) => {
                own.remove(ship)
                    .map_err(|err| MoveError::rejected(err.to_string()))?;
                Effect::Edited
            }
            Command::Clear => {
                own.clear();
                Effect::Edited
            }
            Command::RandomPlace => {
                let (board, ships) =
                    SideBoard::random_fleet(&mut rand::rng(), RANDOM_PLACE_ATTEMPTS).ok_or_else(
                        || MoveError::rejected("Could not place the fleet, try again"),
                    )?;
                own.board = board;
                own.ships = ships;
                Effect::Edited
            }
            Command::Ready => {
                own.ready = true;
                let battle_begins = state.both_ready();
                if battle_begins {
                    state.phase = Phase::Battle;
                }
                Effect::Ready { battle_begins }
            }
            Command::Shoot(target) => fire(state, side, target),
        };
        Ok(effect)
    }

    fn apply(
        &self,
        game: &mut Game,
        actor: &Actor,
        move_data: &MoveData,
    ) -> Result<MoveOutcome, MoveError> {
        let (side, command) = self.plan(game, actor, move_data)?;

        let mut state = game.state().battleship()?.clone();
        let effect = Self::execute(&mut state, side, command)?;
        if matches!(effect, Effect::Fired { hit: false, .. }) && game.vs_bot() {
            state.bot_to_fire = !*actor.is_bot();
        }
        game.replace_state(GameState::Battleship(state));

        let name = actor.name();
        let outcome = match effect {
            Effect::Edited => MoveOutcome::Accepted {
                record: None,
                turn_passed: false,
            },
            Effect::Placed {
                ship,
                anchor,
                orientation,
            } => {
                let record = game.record_move(
                    actor,
                    MoveData::place_ship(
                        ship.to_string(),
                        anchor.row as i64,
                        anchor.col as i64,
                        orientation == Orientation::Horizontal,
                    ),
                    format!("{name} placed {}", ship.class_name()),
                );
                MoveOutcome::Accepted {
                    record: Some(record),
                    turn_passed: false,
                }
            }
            Effect::Ready { battle_begins } => {
                let record = game.record_move(
                    actor,
                    MoveData::action(Action::Ready.to_string()),
                    format!("{name} is ready for battle"),
                );
                if battle_begins {
                    info!(game_id = *game.id(), "Both fleets ready, battle begins");
                    game.reset_turn();
                }
                MoveOutcome::Accepted {
                    record: Some(record),
                    turn_passed: battle_begins,
                }
            }
            Effect::Fired {
                target,
                hit,
                sunk,
                fleet_destroyed,
            } => {
                let verb = if hit { "hit" } else { "missed" };
                let mut record = game.record_move(
                    actor,
                    MoveData::shoot(target.row as i64, target.col as i64),
                    format!("{name} {verb} {target}"),
                );
                if let Some(ship) = sunk {
                    record.upgrade_description(format!("{name} sank the {}!", ship.class_name()));
                }

                if fleet_destroyed {
                    info!(game_id = *game.id(), "Last ship sunk");
                    game.finish(services::winner_for(actor));
                } else if !hit && !*actor.is_bot() {
                    game.switch_turn();
                }
                MoveOutcome::Accepted {
                    record: Some(record),
                    turn_passed: !hit,
                }
            }
        };
        Ok(outcome)
    }
}

/// Marks a shot on `side`'s grid and evaluates its consequences.
fn fire(state: &mut BattleshipState, side: Side, target: Coord) -> Effect {
    let hit_ship = state.side(side.opponent()).ship_at(target);
    state.side_mut(side).shots[target.row][target.col] =
        Some(if hit_ship.is_some() { Shot::Hit } else { Shot::Miss });

    let Some(ship) = hit_ship else {
        return Effect::Fired {
            target,
            hit: false,
            sunk: None,
            fleet_destroyed: false,
        };
    };

    let enemy = state.side(side.opponent()).clone();
    let shooter = state.side_mut(side);
    let sunk = enemy.is_sunk(ship, &shooter.shots).then_some(ship);
    if let Some(ship) = sunk {
        debug!(%ship, "Ship sunk");
        let cells = enemy.ships.get(&ship).cloned().unwrap_or_default();
        for cell in cells.into_iter().flat_map(neighbors) {
            shooter.shots[cell.row][cell.col].get_or_insert(Shot::Miss);
        }
    }
    Effect::Fired {
        target,
        hit: true,
        sunk,
        fleet_destroyed: enemy.all_sunk(&shooter.shots),
    }
}

/// Whose shot it is. A bot game has no second player id, so the turn lives
/// in the state blob instead of `current_turn`.
fn ensure_battle_turn(
    game: &Game,
    state: &BattleshipState,
    actor: &Actor,
) -> Result<(), MoveError> {
    if !game.vs_bot() {
        return services::ensure_turn(game, actor);
    }
    if *actor.is_bot() == state.bot_to_fire {
        Ok(())
    } else {
        Err(MoveError::rejected("Not your turn"))
    }
}

fn coord_of(move_data: &MoveData) -> Option<Coord> {
    Coord::checked(move_data.row?, move_data.col?)
}

fn ship_of(move_data: &MoveData) -> Result<ShipType, MoveError> {
    move_data
        .ship_type
        .as_deref()
        .and_then(|token| token.parse().ok())
        .ok_or_else(|| MoveError::rejected("Unknown ship type"))
}

impl GameService for BattleshipService {
    #[instrument(skip(self, game), fields(game_id = *game.id()))]
    fn initialize_game(&self, game: &mut Game) {
        game.replace_state(GameState::Battleship(BattleshipState::default()));
    }

    fn valid_move(
        &self,
        game: &Game,
        actor: &Actor,
        move_data: &MoveData,
    ) -> Result<bool, EngineError> {
        let checked = self.plan(game, actor, move_data).and_then(|(side, command)| {
            let mut scratch = game.state().battleship()?.clone();
            Self::execute(&mut scratch, side, command)
        });
        services::as_predicate(checked)
    }

    fn apply_move(
        &self,
        game: &mut Game,
        actor: &Actor,
        move_data: &MoveData,
    ) -> Result<MoveOutcome, EngineError> {
        services::settle(self.apply(game, actor, move_data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bots::Difficulty;
    use crate::game::GameType;

    /// A legal ten-ship layout: ships on even rows, spaced by a column.
    const LAYOUT: [(&str, i64, i64); 10] = [
        ("battleship", 0, 0),
        ("cruiser1", 0, 5),
        ("cruiser2", 2, 0),
        ("destroyer1", 2, 4),
        ("destroyer2", 2, 7),
        ("destroyer3", 4, 0),
        ("submarine1", 4, 3),
        ("submarine2", 4, 5),
        ("submarine3", 4, 7),
        ("submarine4", 4, 9),
    ];

    fn alice() -> Actor {
        Actor::human(1, "alice")
    }

    fn bob() -> Actor {
        Actor::human(2, "bob")
    }

    fn started() -> Game {
        let mut game = Game::new(3, GameType::Battleship, 1, None);
        BattleshipService.initialize_game(&mut game);
        game.join(2);
        game
    }

    fn place_fleet(game: &mut Game, actor: &Actor) {
        for (ship, row, col) in LAYOUT {
            let outcome = BattleshipService
                .apply_move(game, actor, &MoveData::place_ship(ship, row, col, true))
                .unwrap();
            assert!(outcome.is_accepted(), "{ship}: {:?}", outcome.error());
        }
    }

    fn in_battle() -> Game {
        let mut game = started();
        for actor in [alice(), bob()] {
            place_fleet(&mut game, &actor);
            BattleshipService
                .apply_move(&mut game, &actor, &MoveData::action("ready"))
                .unwrap();
        }
        game
    }

    fn shoot(game: &mut Game, actor: &Actor, row: i64, col: i64) -> MoveOutcome {
        BattleshipService
            .apply_move(game, actor, &MoveData::shoot(row, col))
            .unwrap()
    }

    #[test]
    fn test_place_ship_logs_class_name() {
        let mut game = started();
        let outcome = BattleshipService
            .apply_move(&mut game, &alice(), &MoveData::place_ship("cruiser2", 5, 5, false))
            .unwrap();
        let record = outcome.record().unwrap();
        assert_eq!(record.description(), "alice placed Cruiser");
        assert_eq!(*record.move_number(), 1);
        let side = &game.state().battleship().unwrap().player1;
        assert_eq!(side.ships[&ShipType::Cruiser2].len(), 3);
    }

    #[test]
    fn test_touching_ship_rejected_without_change() {
        let mut game = started();
        BattleshipService
            .apply_move(&mut game, &alice(), &MoveData::place_ship("battleship", 0, 0, true))
            .unwrap();
        let before = game.clone();
        let outcome = BattleshipService
            .apply_move(&mut game, &alice(), &MoveData::place_ship("submarine1", 1, 4, true))
            .unwrap();
        assert_eq!(outcome.error(), Some("Ships cannot touch each other"));
        assert_eq!(game, before);
    }

    #[test]
    fn test_failed_rotation_rolls_back() {
        let mut game = started();
        BattleshipService
            .apply_move(&mut game, &alice(), &MoveData::place_ship("cruiser1", 9, 0, true))
            .unwrap();
        let before = game.clone();
        let outcome = BattleshipService
            .apply_move(&mut game, &alice(), &MoveData::ship_action("rotate_ship", "cruiser1"))
            .unwrap();
        assert_eq!(outcome.error(), Some("Ship does not fit on the board"));
        assert_eq!(game, before);
    }

    #[test]
    fn test_layout_edits_have_no_record() {
        let mut game = started();
        for data in [
            MoveData::action("random_place"),
            MoveData::ship_action("rotate_ship", "submarine1"),
            MoveData::ship_action("remove_ship", "battleship"),
            MoveData::action("clear_board"),
        ] {
            let outcome = BattleshipService.apply_move(&mut game, &alice(), &data).unwrap();
            assert!(outcome.is_accepted(), "{data:?}: {:?}", outcome.error());
            assert!(outcome.record().is_none());
        }
        assert_eq!(*game.last_move_number(), 0);
        assert!(game.state().battleship().unwrap().player1.ships.is_empty());
    }

    #[test]
    fn test_ready_requires_full_fleet() {
        let mut game = started();
        let outcome = BattleshipService
            .apply_move(&mut game, &alice(), &MoveData::action("ready"))
            .unwrap();
        assert_eq!(outcome.error(), Some("Place all ships first"));

        place_fleet(&mut game, &alice());
        let outcome = BattleshipService
            .apply_move(&mut game, &alice(), &MoveData::action("ready"))
            .unwrap();
        assert_eq!(outcome.record().unwrap().description(), "alice is ready for battle");

        let outcome = BattleshipService
            .apply_move(&mut game, &alice(), &MoveData::action("clear_board"))
            .unwrap();
        assert_eq!(outcome.error(), Some("You are already ready"));
    }

    #[test]
    fn test_both_ready_starts_battle_with_player1() {
        let mut game = started();
        game.switch_turn();
        place_fleet(&mut game, &alice());
        place_fleet(&mut game, &bob());
        BattleshipService
            .apply_move(&mut game, &bob(), &MoveData::action("ready"))
            .unwrap();
        assert_eq!(game.state().battleship().unwrap().phase, Phase::Placement);
        BattleshipService
            .apply_move(&mut game, &alice(), &MoveData::action("ready"))
            .unwrap();
        assert_eq!(game.state().battleship().unwrap().phase, Phase::Battle);
        assert_eq!(*game.current_turn(), Some(1));
    }

    #[test]
    fn test_shooting_before_battle_rejected() {
        let mut game = started();
        assert_eq!(
            shoot(&mut game, &alice(), 0, 0).error(),
            Some("The battle has not started")
        );
    }

    #[test]
    fn test_hit_keeps_turn_miss_passes_it() {
        let mut game = in_battle();
        let outcome = shoot(&mut game, &alice(), 0, 0);
        assert_eq!(outcome.record().unwrap().description(), "alice hit A1");
        assert_eq!(*game.current_turn(), Some(1));

        let outcome = shoot(&mut game, &alice(), 9, 9);
        assert_eq!(outcome.record().unwrap().description(), "alice missed J10");
        assert_eq!(*game.current_turn(), Some(2));

        assert_eq!(shoot(&mut game, &alice(), 8, 8).error(), Some("Not your turn"));
    }

    #[test]
    fn test_double_shot_rejected() {
        let mut game = in_battle();
        shoot(&mut game, &alice(), 0, 0);
        let before = game.clone();
        assert_eq!(
            shoot(&mut game, &alice(), 0, 0).error(),
            Some("You already fired at that cell")
        );
        assert_eq!(shoot(&mut game, &alice(), 10, 0).error(), Some("Shot is outside the board"));
        assert_eq!(game, before);
    }

    #[test]
    fn test_sinking_marks_surroundings() {
        let mut game = in_battle();
        // submarine1 sits alone at (4, 3).
        let outcome = shoot(&mut game, &alice(), 4, 3);
        assert_eq!(outcome.record().unwrap().description(), "alice sank the Submarine!");
        let shots = &game.state().battleship().unwrap().player1.shots;
        for (row, col) in [(3, 2), (3, 3), (3, 4), (4, 2), (4, 4), (5, 2), (5, 3), (5, 4)] {
            assert_eq!(shots[row][col], Some(Shot::Miss), "({row}, {col})");
        }
        assert_eq!(shots[4][3], Some(Shot::Hit));
        assert_eq!(*game.current_turn(), Some(1));
    }

    #[test]
    fn test_last_ship_finishes_game() {
        let mut game = in_battle();
        for (ship, row, col) in LAYOUT {
            let length = ship.parse::<ShipType>().unwrap().length() as i64;
            for offset in 0..length {
                shoot(&mut game, &alice(), row, col + offset);
            }
        }
        assert!(game.is_finished());
        assert_eq!(*game.winner(), Some(1));
        assert_eq!(shoot(&mut game, &alice(), 9, 9).error(), Some("The game is not in progress"));
    }

    #[test]
    fn test_unknown_action_is_fatal() {
        let mut game = started();
        let err = BattleshipService
            .apply_move(&mut game, &alice(), &MoveData::action("surrender"))
            .unwrap_err();
        assert_eq!(err, EngineError::UnknownAction("surrender".into()));
        let surrender = MoveData::action("surrender");
        assert!(BattleshipService.valid_move(&game, &alice(), &surrender).is_err());
    }

    #[test]
    fn test_bot_places_on_its_own_side() {
        let mut game = Game::new(4, GameType::Battleship, 1, Some(Difficulty::Easy));
        BattleshipService.initialize_game(&mut game);
        game.start();
        BattleshipService
            .apply_move(&mut game, &Actor::bot(1), &MoveData::action("random_place"))
            .unwrap();
        let state = game.state().battleship().unwrap();
        assert!(state.player2.fleet_complete());
        assert!(state.player1.ships.is_empty());
    }

    #[test]
    fn test_bot_battle_turn_is_kept_in_state() {
        let mut game = Game::new(5, GameType::Battleship, 1, Some(Difficulty::Easy));
        BattleshipService.initialize_game(&mut game);
        game.start();
        let bot = Actor::bot(1);
        for actor in [alice(), bot.clone()] {
            place_fleet(&mut game, &actor);
            BattleshipService
                .apply_move(&mut game, &actor, &MoveData::action("ready"))
                .unwrap();
        }
        assert_eq!(shoot(&mut game, &bot, 0, 0).error(), Some("Not your turn"));

        assert!(shoot(&mut game, &alice(), 0, 0).is_accepted());
        assert!(!game.state().battleship().unwrap().bot_to_fire);
        assert!(shoot(&mut game, &alice(), 9, 9).is_accepted());
        assert!(game.state().battleship().unwrap().bot_to_fire);
        assert_eq!(shoot(&mut game, &alice(), 8, 8).error(), Some("Not your turn"));

        // a hit keeps the bot shooting, a miss hands the turn back
        assert!(shoot(&mut game, &bot, 0, 0).is_accepted());
        assert!(game.state().battleship().unwrap().bot_to_fire);
        assert!(shoot(&mut game, &bot, 9, 9).is_accepted());
        assert!(!game.state().battleship().unwrap().bot_to_fire);
        assert!(shoot(&mut game, &alice(), 8, 8).is_accepted());
        assert_eq!(*game.current_turn(), Some(1));
    }

    #[test]
    fn test_valid_move_matches_apply() {
        let game = started();
        assert!(BattleshipService
            .valid_move(&game, &alice(), &MoveData::place_ship("battleship", 0, 0, true))
            .unwrap());
        assert!(!BattleshipService
            .valid_move(&game, &alice(), &MoveData::place_ship("battleship", 0, 8, true))
            .unwrap());
        assert!(!BattleshipService
            .valid_move(&game, &alice(), &MoveData::place_ship("carrier", 0, 0, true))
            .unwrap());
    }
}
