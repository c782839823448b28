//! Voting, tally resolution and the reveal tail of a round.

use super::{public, Effect, Transition};
use crate::types::*;
use indexmap::IndexMap;

/// DISCUSSION -> VOTING: publish the ballot and arm the voting timer.
pub(super) fn end_discussion(mut state: GameState) -> Transition {
    if state.phase != GamePhase::Discussion || state.current_round.is_none() {
        return Transition::unchanged(state);
    }

    let ballot = {
        let round = state.current_round.as_ref().expect("checked above");
        let mut lines = vec!["🗳️ VOTACIÓN - Escribe el número del sospechoso".to_string()];
        for (i, id) in round.clue_order.iter().enumerate() {
            lines.push(format!("{}. {}", i + 1, state.player_name(*id)));
        }
        lines.join("\n")
    };

    state.phase = GamePhase::Voting;
    let voting_seconds = state.settings.voting_seconds;
    Transition {
        state,
        effects: vec![
            public(ballot, AnnounceStyle::Highlight),
            Effect::SetPhaseTimer {
                seconds: voting_seconds,
            },
        ],
    }
}

/// Record (or overwrite) a vote. Once every player still in `clue_order`
/// has voted the tally resolves without waiting for the timer.
pub(super) fn submit_vote(mut state: GameState, voter: PlayerId, target: PlayerId) -> Transition {
    if state.phase != GamePhase::Voting || state.current_round.is_none() {
        return Transition::unchanged(state);
    }

    let all_in = {
        let round = state.current_round.as_mut().expect("checked above");
        round.votes.insert(voter, target);
        round.votes.len() >= round.clue_order.len()
    };

    if all_in {
        return end_voting(state);
    }
    Transition::unchanged(state)
}

/// Plurality tally. Ties go to the first target that reached the maximum,
/// in tally-insertion order (which follows first-vote order).
pub(super) fn end_voting(mut state: GameState) -> Transition {
    if state.phase != GamePhase::Voting || state.current_round.is_none() {
        return Transition::unchanged(state);
    }

    let (voted_out, impostor_id, innocents) = {
        let round = state.current_round.as_ref().expect("checked above");
        let mut counts: IndexMap<PlayerId, u32> = IndexMap::new();
        for target in round.votes.values() {
            *counts.entry(*target).or_insert(0) += 1;
        }
        let mut voted_out = None;
        let mut best = 0u32;
        for (target, n) in &counts {
            if *n > best {
                best = *n;
                voted_out = Some(*target);
            }
        }
        (voted_out, round.impostor_id, round.normal_player_ids.len())
    };
    let impostor_name = state.player_name(impostor_id).to_string();

    let Some(out) = voted_out else {
        // Nobody voted at all; the table failed to point anywhere.
        return finish_round(state, true, None, impostor_name);
    };
    let out_name = state.player_name(out).to_string();

    if out == impostor_id {
        return finish_round(state, false, Some(out_name), impostor_name);
    }
    if innocents <= 2 {
        // The wrong call leaves a single innocent at the table.
        return finish_round(state, true, Some(out_name), impostor_name);
    }
    continue_round(state, out, out_name)
}

/// Progressive elimination: the wrongly accused leaves the table and a new
/// clue sub-round starts with the shrunk roster.
fn continue_round(mut state: GameState, out: PlayerId, out_name: String) -> Transition {
    let first = {
        let round = state.current_round.as_mut().expect("caller checked");
        round.clue_order.retain(|id| *id != out);
        round.normal_player_ids.retain(|id| *id != out);
        round.clues.clear();
        round.votes.clear();
        round.current_clue_index = 0;
        round.clue_order[0]
    };

    state.phase = GamePhase::Clues;
    let first_name = state.player_name(first).to_string();
    let clue_seconds = state.settings.clue_seconds;
    Transition {
        state,
        effects: vec![
            Effect::ClearTimer,
            public(
                format!("❌ {out_name} era inocente. La ronda continúa"),
                AnnounceStyle::Warning,
            ),
            public(format!("📝 Turno: {first_name}"), AnnounceStyle::Plain),
            Effect::SetPhaseTimer {
                seconds: clue_seconds,
            },
        ],
    }
}

/// Seal the round result, record history and move to REVEAL. Shared by the
/// tally path and the mid-round departure paths.
pub(super) fn finish_round(
    mut state: GameState,
    impostor_won: bool,
    voted_out_name: Option<String>,
    impostor_name: String,
) -> Transition {
    let Some(round) = state.current_round.as_mut() else {
        return Transition::unchanged(state);
    };

    let result = RoundResult {
        impostor_won,
        impostor_name,
        footballer: round.footballer.clone(),
        voted_out_name,
    };
    round.result = Some(result.clone());
    state.round_history.push(result.clone());
    state.phase = GamePhase::Reveal;
    Transition {
        state,
        effects: vec![Effect::ClearTimer, Effect::LogRound { result }],
    }
}

/// REVEAL -> RESULTS: the full reveal goes public and the next round is
/// requested for whoever is queued.
pub(super) fn end_reveal(mut state: GameState) -> Transition {
    if state.phase != GamePhase::Reveal {
        return Transition::unchanged(state);
    }
    let Some(result) = state.current_round.take().and_then(|r| r.result) else {
        return Transition::unchanged(state);
    };

    state.phase = GamePhase::Results;
    let winner = if result.impostor_won {
        "Gana Impostor"
    } else {
        "Ganan Jugadores"
    };
    let message = format!(
        "🏆 FIN: {winner} (Era {}) | ⚽ {}",
        result.impostor_name, result.footballer
    );
    Transition {
        state,
        effects: vec![
            public(message, AnnounceStyle::Highlight),
            Effect::AutoStartGame,
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::super::testutil::*;
    use super::super::{transition, Action, Effect};
    use crate::types::*;

    fn seat(state: &GameState, i: usize) -> PlayerId {
        state.current_round.as_ref().unwrap().clue_order[i]
    }

    fn innocents(state: &GameState) -> Vec<PlayerId> {
        state
            .current_round
            .as_ref()
            .unwrap()
            .normal_player_ids
            .clone()
    }

    #[test]
    fn discussion_timeout_publishes_full_ballot() {
        let mut state = round_in_clues();
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
                &mut rng(),
            )
            .state;
        }
        let t = transition(state, Action::EndDiscussion, &mut rng());
        assert_eq!(t.state.phase, GamePhase::Voting);
        let ballot = t
            .effects
            .iter()
            .find_map(|e| match e {
                Effect::AnnouncePublic { message, .. } => Some(message.clone()),
                _ => None,
            })
            .unwrap();
        // Header plus one line per seated player.
        assert_eq!(ballot.lines().count(), 6);
        assert!(ballot.lines().nth(1).unwrap().starts_with("1. "));
    }

    #[test]
    fn end_discussion_outside_discussion_is_ignored() {
        let state = round_in_clues();
        let t = transition(state, Action::EndDiscussion, &mut rng());
        assert_eq!(t.state.phase, GamePhase::Clues);
        assert!(t.effects.is_empty());
    }

    #[test]
    fn revote_overwrites_in_place() {
        let mut state = round_in_voting();
        let (a, b) = (seat(&state, 0), seat(&state, 1));
        let (x, y) = (seat(&state, 2), seat(&state, 3));
        state = transition(state, Action::SubmitVote { voter: a, target: x }, &mut rng()).state;
        state = transition(state, Action::SubmitVote { voter: b, target: y }, &mut rng()).state;
        state = transition(state, Action::SubmitVote { voter: a, target: y }, &mut rng()).state;

        let round = state.current_round.as_ref().unwrap();
        assert_eq!(round.votes.len(), 2);
        // First voter kept their original slot despite re-voting.
        assert_eq!(round.votes.get_index(0), Some((&a, &y)));
    }

    #[test]
    fn vote_outside_voting_phase_is_ignored() {
        let state = round_in_clues();
        let t = transition(
            state,
            Action::SubmitVote {
                voter: 1,
                target: 2,
            },
            &mut rng(),
        );
        assert!(t.state.current_round.as_ref().unwrap().votes.is_empty());
    }

    #[test]
    fn plurality_eliminates_the_most_voted() {
        let mut state = round_in_voting();
        let inns = innocents(&state);
        let (x, y) = (inns[0], inns[1]);
        let voters: Vec<PlayerId> = (0..3).map(|i| seat(&state, i)).collect();
        state = transition(state, Action::SubmitVote { voter: voters[0], target: x }, &mut rng()).state;
        state = transition(state, Action::SubmitVote { voter: voters[1], target: x }, &mut rng()).state;
        state = transition(state, Action::SubmitVote { voter: voters[2], target: y }, &mut rng()).state;

        let t = transition(state, Action::EndVoting, &mut rng());
        // x was innocent and three innocents remain: the round continues.
        assert_eq!(t.state.phase, GamePhase::Clues);
        let round = t.state.current_round.as_ref().unwrap();
        assert_eq!(round.clue_order.len(), 4);
        assert!(!round.is_seated(x));
        assert!(round.clues.is_empty());
        assert!(round.votes.is_empty());
        assert_eq!(round.current_clue_index, 0);
        assert!(t.effects.contains(&Effect::ClearTimer));
    }

    #[test]
    fn tie_breaks_to_first_tally_entry() {
        let mut state = round_in_voting();
        let inns = innocents(&state);
        let (x, y) = (inns[0], inns[1]);
        let (a, b) = (seat(&state, 0), seat(&state, 1));
        state = transition(state, Action::SubmitVote { voter: a, target: x }, &mut rng()).state;
        state = transition(state, Action::SubmitVote { voter: b, target: y }, &mut rng()).state;

        let t = transition(state, Action::EndVoting, &mut rng());
        let round = t.state.current_round.as_ref().unwrap();
        // 1-1 tie: x entered the tally first, x goes.
        assert!(!round.is_seated(x));
        assert!(round.is_seated(y));
    }

    #[test]
    fn full_participation_resolves_without_the_timer() {
        let mut state = round_in_voting();
        let impostor = state.current_round.as_ref().unwrap().impostor_id;
        for i in 0..5 {
            let voter = seat(&state, i);
            state = transition(
                state,
                Action::SubmitVote {
                    voter,
                    target: impostor,
                },
                &mut rng(),
            )
            .state;
        }
        assert_eq!(state.phase, GamePhase::Reveal);
        let result = state
            .current_round
            .as_ref()
            .unwrap()
            .result
            .as_ref()
            .unwrap();
        assert!(!result.impostor_won);
        assert_eq!(state.round_history.len(), 1);
    }

    #[test]
    fn voting_out_the_impostor_logs_the_result() {
        let mut state = round_in_voting();
        let impostor = state.current_round.as_ref().unwrap().impostor_id;
        let (a, b) = (seat(&state, 0), seat(&state, 1));
        state = transition(state, Action::SubmitVote { voter: a, target: impostor }, &mut rng()).state;
        state = transition(state, Action::SubmitVote { voter: b, target: impostor }, &mut rng()).state;

        let t = transition(state, Action::EndVoting, &mut rng());
        assert_eq!(t.state.phase, GamePhase::Reveal);
        assert!(t
            .effects
            .iter()
            .any(|e| matches!(e, Effect::LogRound { result } if !result.impostor_won)));
    }

    #[test]
    fn eliminating_down_to_one_innocent_hands_the_win_to_the_impostor() {
        let mut state = round_in_voting();
        // Shrink the table to impostor + two innocents.
        let impostor = state.current_round.as_ref().unwrap().impostor_id;
        let inns = innocents(&state);
        {
            let round = state.current_round.as_mut().unwrap();
            round.clue_order = vec![impostor, inns[0], inns[1]];
            round.normal_player_ids = vec![inns[0], inns[1]];
        }
        let t = transition(
            state,
            Action::SubmitVote {
                voter: impostor,
                target: inns[0],
            },
            &mut rng(),
        );
        let t = transition(t.state, Action::EndVoting, &mut rng());
        assert_eq!(t.state.phase, GamePhase::Reveal);
        let result = t
            .state
            .current_round
            .as_ref()
            .unwrap()
            .result
            .as_ref()
            .unwrap();
        assert!(result.impostor_won);
        assert_eq!(result.voted_out_name.as_deref(), Some(t.state.player_name(inns[0])));
    }

    #[test]
    fn zero_votes_resolves_as_impostor_win() {
        let state = round_in_voting();
        let t = transition(state, Action::EndVoting, &mut rng());
        assert_eq!(t.state.phase, GamePhase::Reveal);
        let result = t
            .state
            .current_round
            .as_ref()
            .unwrap()
            .result
            .as_ref()
            .unwrap();
        assert!(result.impostor_won);
        assert!(result.voted_out_name.is_none());
    }

    #[test]
    fn end_reveal_clears_the_round_and_requests_restart() {
        let mut state = round_in_voting();
        let impostor = state.current_round.as_ref().unwrap().impostor_id;
        for i in 0..5 {
            let voter = seat(&state, i);
            state = transition(state, Action::SubmitVote { voter, target: impostor }, &mut rng()).state;
        }
        assert_eq!(state.phase, GamePhase::Reveal);
        let footballer = state
            .current_round
            .as_ref()
            .unwrap()
            .footballer
            .clone();

        let t = transition(state, Action::EndReveal, &mut rng());
        assert_eq!(t.state.phase, GamePhase::Results);
        assert!(t.state.current_round.is_none());
        assert!(t.effects.contains(&Effect::AutoStartGame));
        assert!(t.effects.iter().any(|e| matches!(
            e,
            Effect::AnnouncePublic { message, .. } if message.contains(&footballer)
        )));
    }
}
