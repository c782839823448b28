use chrono::Utc;
use impostor::commands::CommandIntent;
use impostor::engine::{transition, Action, Effect};
use impostor::gate::{self, ChatOutcome};
use impostor::types::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn player(id: PlayerId, name: &str) -> Player {
    Player {
        id,
        name: name.to_string(),
        auth: None,
        is_admin: false,
        joined_at: Utc::now(),
    }
}

/// End-to-end flow of one complete round, chat lines included, under a
/// fixed seed: join, queue up, clues through the gate, ballot, reveal.
#[test]
fn full_game_flow() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut state = GameState::new(GameSettings::default());

    // 1. Five players join the room.
    for id in 1..=5u32 {
        let t = transition(state, Action::PlayerJoin(player(id, &format!("P{id}"))), &mut rng);
        state = t.state;
    }
    assert_eq!(state.players.len(), 5);
    assert_eq!(state.phase, GamePhase::Waiting);

    // 2. Everyone types the join command; the fifth enqueue requests an
    // auto-start.
    let mut last_effects = Vec::new();
    for id in 1..=5u32 {
        let speaker = state.players[&id].clone();
        let outcome = gate::classify(&state, &speaker, "!jugar", None);
        assert_eq!(outcome, ChatOutcome::Command(CommandIntent::JoinQueue));
        let t = transition(state, Action::JoinQueue(id), &mut rng);
        state = t.state;
        last_effects = t.effects;
    }
    assert!(last_effects.contains(&Effect::AutoStartGame));

    // 3. The round starts: one impostor, five seats, five private reveals.
    let t = transition(
        state,
        Action::StartGame {
            footballers: vec!["Lionel Messi".to_string()],
        },
        &mut rng,
    );
    state = t.state;
    assert_eq!(state.phase, GamePhase::Assign);
    {
        let round = state.current_round.as_ref().unwrap();
        assert_eq!(round.clue_order.len(), 5);
        assert_eq!(round.normal_player_ids.len(), 4);
        assert!(!round.normal_player_ids.contains(&round.impostor_id));
        assert_eq!(round.footballer, "Lionel Messi");
    }
    let privates = t
        .effects
        .iter()
        .filter(|e| matches!(e, Effect::AnnouncePrivate { .. }))
        .count();
    let publics = t
        .effects
        .iter()
        .filter(|e| matches!(e, Effect::AnnouncePublic { .. }))
        .count();
    assert_eq!(privates, 5);
    assert_eq!(publics, 1);

    // 4. Seating delay elapses; clue turns begin.
    state = transition(state, Action::BeginClues, &mut rng).state;
    assert_eq!(state.phase, GamePhase::Clues);

    // A latecomer is a ghost: silenced mid-round, but may queue up.
    state = transition(state, Action::PlayerJoin(player(6, "Tarde")), &mut rng).state;
    let ghost = state.players[&6].clone();
    assert_eq!(
        gate::classify(&state, &ghost, "hola!", None),
        ChatOutcome::Suppressed
    );
    assert_eq!(
        gate::classify(&state, &ghost, "!jugar", None),
        ChatOutcome::Command(CommandIntent::JoinQueue)
    );
    state = transition(state, Action::JoinQueue(6), &mut rng).state;

    // 5. Each turn-holder speaks through the gate. Leaking the secret is
    // rejected without touching the round; a harmless clue goes through.
    for turn in 0..5usize {
        let giver = state
            .current_round
            .as_ref()
            .unwrap()
            .current_clue_giver()
            .unwrap();
        let speaker = state.players[&giver].clone();

        assert_eq!(
            gate::classify(&state, &speaker, "Messi es el mejor", None),
            ChatOutcome::SpoilerRejected
        );
        let outcome = gate::classify(&state, &speaker, "Barcelona sin dudas", None);
        assert_eq!(outcome, ChatOutcome::Clue("Barcelona".to_string()));

        let t = transition(
            state,
            Action::SubmitClue {
                player_id: giver,
                clue: "Barcelona".to_string(),
            },
            &mut rng,
        );
        state = t.state;
        assert_eq!(
            state.current_round.as_ref().unwrap().current_clue_index,
            (turn + 1).min(5)
        );
    }
    assert_eq!(state.phase, GamePhase::Discussion);

    // 6. Discussion closes; the ballot lists all five seats.
    let t = transition(state, Action::EndDiscussion, &mut rng);
    state = t.state;
    assert_eq!(state.phase, GamePhase::Voting);
    let ballot = t
        .effects
        .iter()
        .find_map(|e| match e {
            Effect::AnnouncePublic { message, .. } => Some(message.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(ballot.lines().count(), 6);

    // 7. Everyone votes the impostor's ballot number; the fifth vote
    // resolves the tally without waiting for the timer.
    let order = state.current_round.as_ref().unwrap().clue_order.clone();
    let impostor = state.current_round.as_ref().unwrap().impostor_id;
    let ballot_no = order.iter().position(|id| *id == impostor).unwrap() + 1;
    for voter in order {
        let speaker = state.players[&voter].clone();
        let outcome = gate::classify(&state, &speaker, &ballot_no.to_string(), None);
        assert_eq!(outcome, ChatOutcome::Vote(impostor));
        state = transition(
            state,
            Action::SubmitVote {
                voter,
                target: impostor,
            },
            &mut rng,
        )
        .state;
        if state.phase != GamePhase::Voting {
            break;
        }
    }
    assert_eq!(state.phase, GamePhase::Reveal);
    let result = state
        .current_round
        .as_ref()
        .unwrap()
        .result
        .clone()
        .unwrap();
    assert!(!result.impostor_won);
    assert_eq!(
        result.voted_out_name.as_deref(),
        Some(state.player_name(impostor))
    );
    assert_eq!(state.round_history.len(), 1);

    // 8. Reveal plays out; the queued ghost immediately asks for the next
    // round.
    let t = transition(state, Action::EndReveal, &mut rng);
    state = t.state;
    assert_eq!(state.phase, GamePhase::Results);
    assert!(state.current_round.is_none());
    assert!(t.effects.contains(&Effect::AutoStartGame));
    assert_eq!(state.queue, vec![6]);

    // 9. Results settle back into the lobby.
    state = transition(state, Action::ResetGame, &mut rng).state;
    assert_eq!(state.phase, GamePhase::Waiting);
    assert!(state.current_round.is_none());
}

/// The progressive-elimination rule at the integration level: a wrong
/// plurality call shrinks the table and restarts the clue turns.
#[test]
fn wrong_call_continues_the_round_with_four_seats() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut state = GameState::new(GameSettings::default());
    for id in 1..=5u32 {
        state = transition(state, Action::PlayerJoin(player(id, &format!("P{id}"))), &mut rng).state;
        state = transition(state, Action::JoinQueue(id), &mut rng).state;
    }
    state = transition(
        state,
        Action::StartGame {
            footballers: vec!["Lionel Messi".to_string()],
        },
        &mut rng,
    )
    .state;
    state = transition(state, Action::BeginClues, &mut rng).state;
    for _ in 0..5 {
        let giver = state
            .current_round
            .as_ref()
            .unwrap()
            .current_clue_giver()
            .unwrap();
        state = transition(
            state,
            Action::SubmitClue {
                player_id: giver,
                clue: "pista".to_string(),
            },
            &mut rng,
        )
        .state;
    }
    state = transition(state, Action::EndDiscussion, &mut rng).state;

    let innocent = state.current_round.as_ref().unwrap().normal_player_ids[0];
    let voters = state.current_round.as_ref().unwrap().clue_order.clone();
    state = transition(
        state,
        Action::SubmitVote {
            voter: voters[0],
            target: innocent,
        },
        &mut rng,
    )
    .state;
    state = transition(
        state,
        Action::SubmitVote {
            voter: voters[1],
            target: innocent,
        },
        &mut rng,
    )
    .state;
    let t = transition(state, Action::EndVoting, &mut rng);
    state = t.state;

    assert_eq!(state.phase, GamePhase::Clues);
    let round = state.current_round.as_ref().unwrap();
    assert_eq!(round.clue_order.len(), 4);
    assert!(!round.is_seated(innocent));
    assert!(round.clues.is_empty());
    assert!(round.votes.is_empty());
    assert_eq!(round.current_clue_index, 0);
    assert!(t.effects.contains(&Effect::ClearTimer));
    assert!(state.round_history.is_empty());
}
