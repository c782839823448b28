//! Round assembly and the clue-giving flow.

use super::{private, public, Effect, Transition, CLUE_TIMEOUT_SENTINEL};
use crate::types::*;
use chrono::Utc;
use indexmap::IndexMap;
use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;

/// Seat the first five queued players and deal out roles. No-op when fewer
/// than five are queued or a round is already running.
pub(super) fn start_game<R: Rng>(
    mut state: GameState,
    footballers: &[String],
    rng: &mut R,
) -> Transition {
    let seats = state.settings.min_players;
    if state.queue.len() < seats || state.current_round.is_some() {
        return Transition::unchanged(state);
    }
    let Some(footballer) = footballers.choose(rng).cloned() else {
        return Transition::unchanged(state);
    };

    let round_players: Vec<PlayerId> = state.queue.drain(..seats).collect();
    let impostor_id = *round_players.choose(rng).expect("five seated players");
    let mut clue_order = round_players.clone();
    clue_order.shuffle(rng);

    let round = Round {
        id: ulid::Ulid::new().to_string(),
        footballer: footballer.clone(),
        impostor_id,
        normal_player_ids: round_players
            .iter()
            .copied()
            .filter(|id| *id != impostor_id)
            .collect(),
        clue_order,
        current_clue_index: 0,
        clues: IndexMap::new(),
        votes: IndexMap::new(),
        started_at: Utc::now(),
        result: None,
    };

    let mut effects = vec![public("🔴 PARTIDA INICIADA", AnnounceStyle::Danger)];
    for id in &round_players {
        let message = if *id == impostor_id {
            "🕵️ ERES IMPOSTOR".to_string()
        } else {
            format!("⚽ FUTBOLISTA: {footballer}")
        };
        effects.push(private(*id, message));
    }

    state.phase = GamePhase::Assign;
    state.current_round = Some(round);
    Transition { state, effects }
}

/// ASSIGN -> CLUES, once the sequencer has finished seating everyone.
pub(super) fn begin_clues(mut state: GameState) -> Transition {
    if state.phase != GamePhase::Assign {
        return Transition::unchanged(state);
    }
    let Some(first) = state
        .current_round
        .as_ref()
        .and_then(|r| r.clue_order.first().copied())
    else {
        return Transition::unchanged(state);
    };

    state.phase = GamePhase::Clues;
    let name = state.player_name(first).to_string();
    let clue_seconds = state.settings.clue_seconds;
    Transition {
        state,
        effects: vec![
            public(format!("📝 PISTAS | Turno: {name}"), AnnounceStyle::Highlight),
            Effect::SetPhaseTimer {
                seconds: clue_seconds,
            },
        ],
    }
}

/// Record the turn-holder's clue and move the pointer forward exactly one
/// position. Timeouts reuse this path with the `"..."` sentinel.
pub(super) fn submit_clue(mut state: GameState, player_id: PlayerId, clue: String) -> Transition {
    if state.phase != GamePhase::Clues || state.current_round.is_none() {
        return Transition::unchanged(state);
    }

    let (next_index, order_len) = {
        let round = state.current_round.as_mut().expect("checked above");
        round.clues.insert(player_id, clue.clone());
        round.current_clue_index += 1;
        (round.current_clue_index, round.clue_order.len())
    };

    let speaker = state.player_name(player_id).to_string();
    let echo = public(format!("💬 {speaker}: {clue}"), AnnounceStyle::Plain);

    if next_index >= order_len {
        let mut t = to_discussion(state);
        t.effects.insert(0, echo);
        return t;
    }

    let next = state.current_round.as_ref().expect("checked above").clue_order[next_index];
    let name = state.player_name(next).to_string();
    let clue_seconds = state.settings.clue_seconds;
    Transition {
        state,
        effects: vec![
            echo,
            public(format!("📝 Turno: {name}"), AnnounceStyle::Plain),
            Effect::SetPhaseTimer {
                seconds: clue_seconds,
            },
        ],
    }
}

/// Phase timer expired during CLUES: the current turn-holder stays silent.
pub(super) fn clue_timeout(state: GameState) -> Transition {
    let Some(giver) = state
        .current_round
        .as_ref()
        .and_then(|r| r.current_clue_giver())
    else {
        return Transition::unchanged(state);
    };
    submit_clue(state, giver, CLUE_TIMEOUT_SENTINEL.to_string())
}

/// All clues are in (or the roster shrank past the pointer): open the
/// debate.
pub(super) fn to_discussion(mut state: GameState) -> Transition {
    state.phase = GamePhase::Discussion;
    let discussion_seconds = state.settings.discussion_seconds;
    Transition {
        state,
        effects: vec![
            public(
                "🗣️ DEBATE | Discutan quién es el impostor",
                AnnounceStyle::Highlight,
            ),
            Effect::SetPhaseTimer {
                seconds: discussion_seconds,
            },
        ],
    }
}
