//! Property tests for engine invariants.

use proptest::prelude::*;

use arcade_engine::{
    Actor, BOARD_SIZE, Choice, Game, GameStatus, GameType, MoveData, Resolution, ShipType, Side,
    apply_move, initialize_game, neighbors,
};

fn two_player(game_type: GameType) -> Game {
    let mut game = Game::new(1, game_type, 1, None);
    initialize_game(&mut game);
    game.join(2);
    game
}

fn actor_for(game: &Game) -> Actor {
    match game.current_turn() {
        Some(2) => Actor::human(2, "bob"),
        _ => Actor::human(1, "alice"),
    }
}

fn status_rank(status: GameStatus) -> u8 {
    match status {
        GameStatus::Waiting => 0,
        GameStatus::Playing => 1,
        GameStatus::Finished => 2,
    }
}

fn choice() -> impl Strategy<Value = Choice> {
    proptest::sample::select(Choice::ALL.to_vec())
}

proptest! {
    #[test]
    fn tictactoe_turns_alternate_and_numbers_increase(
        positions in proptest::collection::vec(-2i64..11, 1..40)
    ) {
        let mut game = two_player(GameType::TicTacToe);
        let mut expected_number = 1;
        for position in positions {
            let before = game.clone();
            let actor = actor_for(&game);
            let outcome = apply_move(&mut game, &actor, &MoveData::position(position)).unwrap();
            prop_assert!(status_rank(*game.status()) >= status_rank(*before.status()));
            match outcome.record() {
                Some(record) => {
                    prop_assert_eq!(*record.move_number(), expected_number);
                    expected_number += 1;
                    if game.is_playing() {
                        prop_assert_ne!(*game.current_turn(), *before.current_turn());
                    }
                }
                None => prop_assert_eq!(&game, &before),
            }
        }
        if let Some(winner) = *game.winner() {
            prop_assert!(winner == 1 || winner == 2);
        }
    }

    #[test]
    fn rpsls_resolution_is_a_tournament(a in choice(), b in choice()) {
        let resolution = Resolution::of(a, b);
        if a == b {
            prop_assert_eq!(resolution, Resolution::Tie);
        } else {
            prop_assert!(a.beats(b) != b.beats(a));
            prop_assert_eq!(
                Resolution::of(b, a) == Resolution::Winner(Side::Player1),
                resolution == Resolution::Winner(Side::Player2)
            );
        }
    }

    #[test]
    fn battleship_placements_never_touch(
        placements in proptest::collection::vec(
            (
                proptest::sample::select(ShipType::FLEET.to_vec()),
                0i64..BOARD_SIZE as i64,
                0i64..BOARD_SIZE as i64,
                any::<bool>(),
            ),
            1..40,
        )
    ) {
        let mut game = two_player(GameType::Battleship);
        let alice = Actor::human(1, "alice");
        for (ship, row, col, horizontal) in placements {
            let data = MoveData::place_ship(ship.to_string(), row, col, horizontal);
            apply_move(&mut game, &alice, &data).unwrap();
        }

        let side = &game.state().battleship().unwrap().player1;
        for (ship, cells) in &side.ships {
            prop_assert_eq!(cells.len(), ship.length());
            for cell in cells {
                prop_assert_eq!(side.ship_at(*cell), Some(*ship));
                for near in neighbors(*cell) {
                    let occupant = side.ship_at(near);
                    prop_assert!(occupant.is_none() || occupant == Some(*ship));
                }
            }
        }
        let stamped = side.board.iter().flatten().filter(|cell| cell.is_some()).count();
        prop_assert_eq!(stamped, side.ships.values().map(Vec::len).sum::<usize>());
    }

    #[test]
    fn battleship_double_shot_is_rejected(row in 0i64..10, col in 0i64..10) {
        let mut game = two_player(GameType::Battleship);
        for actor in [Actor::human(1, "alice"), Actor::human(2, "bob")] {
            apply_move(&mut game, &actor, &MoveData::action("random_place")).unwrap();
            let ready = apply_move(&mut game, &actor, &MoveData::action("ready")).unwrap();
            prop_assume!(ready.is_accepted());
        }
        let alice = Actor::human(1, "alice");
        apply_move(&mut game, &alice, &MoveData::shoot(row, col)).unwrap();
        // A miss hands the turn to bob; he fires until he misses too.
        let bob = Actor::human(2, "bob");
        let mut cells = (0..10i64).flat_map(|r| (0..10i64).map(move |c| (r, c)));
        while *game.current_turn() == Some(2) {
            let (r, c) = cells.next().unwrap();
            apply_move(&mut game, &bob, &MoveData::shoot(r, c)).unwrap();
        }
        prop_assert!(game.is_playing());
        let before = game.clone();
        let outcome = apply_move(&mut game, &alice, &MoveData::shoot(row, col)).unwrap();
        prop_assert_eq!(outcome.error(), Some("You already fired at that cell"));
        prop_assert_eq!(&game, &before);
    }
}
