//! Pure game state machine.
//!
//! `transition` is the only way game state changes: it consumes the current
//! state plus one action and returns the next state together with the side
//! effects the orchestrator must perform. It never fails; actions that make
//! no sense in the current phase return the input state untouched.

mod round;
mod vote;

use crate::types::*;
use rand::Rng;

/// Clue recorded when the turn-holder runs out of time.
pub const CLUE_TIMEOUT_SENTINEL: &str = "...";

/// Everything that can happen to the game. Timer expirations arrive as
/// ordinary actions, indistinguishable from player input.
#[derive(Debug, Clone)]
pub enum Action {
    PlayerJoin(Player),
    PlayerLeave(PlayerId),
    JoinQueue(PlayerId),
    LeaveQueue(PlayerId),
    StartGame { footballers: Vec<String> },
    /// ASSIGN -> CLUES follow-up, issued by the sequencer after the seating
    /// delay.
    BeginClues,
    SubmitClue { player_id: PlayerId, clue: String },
    ClueTimeout,
    EndDiscussion,
    SubmitVote { voter: PlayerId, target: PlayerId },
    EndVoting,
    EndReveal,
    ForceReveal,
    SkipPhase,
    ResetRound,
    ResetGame,
    GrantAdmin(PlayerId),
}

/// Opaque commands for the sequencer/adapter. The engine never interprets
/// these itself.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    AnnouncePublic {
        message: String,
        style: AnnounceStyle,
    },
    AnnouncePrivate {
        player_id: PlayerId,
        message: String,
    },
    SetPhaseTimer {
        seconds: u64,
    },
    ClearTimer,
    AutoStartGame,
    LogRound {
        result: RoundResult,
    },
}

#[derive(Debug)]
pub struct Transition {
    pub state: GameState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn unchanged(state: GameState) -> Self {
        Self {
            state,
            effects: Vec::new(),
        }
    }
}

pub(crate) fn public(message: impl Into<String>, style: AnnounceStyle) -> Effect {
    Effect::AnnouncePublic {
        message: message.into(),
        style,
    }
}

pub(crate) fn private(player_id: PlayerId, message: impl Into<String>) -> Effect {
    Effect::AnnouncePrivate {
        player_id,
        message: message.into(),
    }
}

/// Apply one action to the game. Pure: no I/O, no timers armed directly,
/// randomness injected so tests can seed it.
pub fn transition<R: Rng>(state: GameState, action: Action, rng: &mut R) -> Transition {
    match action {
        Action::PlayerJoin(player) => player_join(state, player),
        Action::PlayerLeave(id) => player_leave(state, id),
        Action::JoinQueue(id) => join_queue(state, id),
        Action::LeaveQueue(id) => leave_queue(state, id),
        Action::StartGame { footballers } => round::start_game(state, &footballers, rng),
        Action::BeginClues => round::begin_clues(state),
        Action::SubmitClue { player_id, clue } => round::submit_clue(state, player_id, clue),
        Action::ClueTimeout => round::clue_timeout(state),
        Action::EndDiscussion => vote::end_discussion(state),
        Action::SubmitVote { voter, target } => vote::submit_vote(state, voter, target),
        Action::EndVoting => vote::end_voting(state),
        Action::EndReveal => vote::end_reveal(state),
        Action::ForceReveal | Action::ResetRound | Action::ResetGame => reset(state),
        Action::SkipPhase => Transition::unchanged(state),
        Action::GrantAdmin(id) => grant_admin(state, id),
    }
}

fn player_join(mut state: GameState, player: Player) -> Transition {
    let id = player.id;
    state.players.insert(id, player);
    Transition {
        state,
        effects: vec![private(
            id,
            "🔴 EL IMPOSTOR | Escribe \"!jugar\" para unirte",
        )],
    }
}

fn player_leave(mut state: GameState, id: PlayerId) -> Transition {
    let leaver = state.players.remove(&id);
    state.queue.retain(|q| *q != id);

    let Some(round) = state.current_round.as_ref() else {
        return Transition::unchanged(state);
    };
    if !round.is_seated(id) {
        return Transition::unchanged(state);
    }

    // Seated player gone. Below three people in the room the round cannot
    // meaningfully continue.
    if state.players.len() < 3 {
        state.phase = GamePhase::Waiting;
        state.current_round = None;
        return Transition {
            state,
            effects: vec![
                Effect::ClearTimer,
                public("⚠️ Ronda cancelada", AnnounceStyle::Warning),
            ],
        };
    }

    if state.phase == GamePhase::Reveal || state.phase == GamePhase::Results {
        // Result already decided; nothing left to adjust.
        return Transition::unchanged(state);
    }

    let leaver_name = leaver.map(|p| p.name).unwrap_or_else(|| "?".to_string());
    let (impostor_id, innocents) = {
        let r = state.current_round.as_ref().expect("checked above");
        (r.impostor_id, r.normal_player_ids.len())
    };

    if id == impostor_id {
        // Nobody left to find.
        let mut t = vote::finish_round(state, false, None, leaver_name);
        t.effects.insert(
            0,
            public("🚪 El impostor abandonó la sala", AnnounceStyle::Highlight),
        );
        return t;
    }

    if innocents <= 2 {
        // Removing this innocent leaves at most one; same threshold as an
        // elimination.
        let impostor_name = state.player_name(impostor_id).to_string();
        return vote::finish_round(state, true, None, impostor_name);
    }

    excise_seated(state, id)
}

enum Excised {
    Nothing,
    Discussion,
    PassTurn(PlayerId),
    ResolveVotes,
}

/// Remove a seated player from the running round without ending it,
/// keeping the clue pointer and vote tally coherent.
fn excise_seated(mut state: GameState, id: PlayerId) -> Transition {
    let phase = state.phase;
    let clue_seconds = state.settings.clue_seconds;

    let pos = match state
        .current_round
        .as_ref()
        .and_then(|r| r.clue_order.iter().position(|p| *p == id))
    {
        Some(pos) => pos,
        None => return Transition::unchanged(state),
    };

    let after = {
        let round = state
            .current_round
            .as_mut()
            .expect("seated player implies round");
        round.clue_order.remove(pos);
        round.normal_player_ids.retain(|p| *p != id);
        round.votes.shift_remove(&id);
        round.votes.retain(|_, target| *target != id);

        let was_current = phase == GamePhase::Clues && pos == round.current_clue_index;
        if pos < round.current_clue_index {
            round.current_clue_index -= 1;
        }

        match phase {
            GamePhase::Clues if round.current_clue_index >= round.clue_order.len() => {
                Excised::Discussion
            }
            GamePhase::Clues if was_current => {
                Excised::PassTurn(round.clue_order[round.current_clue_index])
            }
            GamePhase::Voting if round.votes.len() >= round.clue_order.len() => {
                Excised::ResolveVotes
            }
            _ => Excised::Nothing,
        }
    };

    match after {
        Excised::Discussion => round::to_discussion(state),
        Excised::PassTurn(next) => {
            let name = state.player_name(next).to_string();
            Transition {
                state,
                effects: vec![
                    public(format!("📝 Turno: {name}"), AnnounceStyle::Plain),
                    Effect::SetPhaseTimer {
                        seconds: clue_seconds,
                    },
                ],
            }
        }
        Excised::ResolveVotes => vote::end_voting(state),
        Excised::Nothing => Transition::unchanged(state),
    }
}

fn join_queue(mut state: GameState, id: PlayerId) -> Transition {
    if state.queue.contains(&id) {
        return Transition::unchanged(state);
    }
    state.queue.push(id);
    let len = state.queue.len();

    let mut effects = Vec::new();
    if state.phase == GamePhase::Waiting {
        let name = state.player_name(id).to_string();
        effects.push(public(
            format!("✅ {name} listo ({len}/{})", state.settings.min_players),
            AnnounceStyle::Success,
        ));
        if len >= state.settings.min_players {
            effects.push(Effect::AutoStartGame);
        }
    } else {
        effects.push(private(id, format!("✅ En cola (posición {len})")));
    }
    Transition { state, effects }
}

fn leave_queue(mut state: GameState, id: PlayerId) -> Transition {
    state.queue.retain(|q| *q != id);
    Transition::unchanged(state)
}

fn grant_admin(mut state: GameState, id: PlayerId) -> Transition {
    if let Some(player) = state.players.get_mut(&id) {
        player.is_admin = true;
    }
    Transition::unchanged(state)
}

/// `ResetGame`, `ResetRound` and `ForceReveal` all converge here: back to
/// WAITING, round dropped, auto-start requested when a full table is already
/// queued.
fn reset(mut state: GameState) -> Transition {
    state.phase = GamePhase::Waiting;
    state.current_round = None;
    let mut effects = vec![Effect::ClearTimer];
    if state.queue.len() >= state.settings.min_players {
        effects.push(Effect::AutoStartGame);
    }
    Transition { state, effects }
}
