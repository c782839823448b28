//! Chat-intent gate.
//!
//! Every chat line is classified here, before any transition is attempted.
//! The policy is ordered and first-match-wins: ghosts, clue turns, ballots,
//! commands, free chat. Admins are exempt from the suppression rules but
//! their commands still go through the same grammar.

use crate::commands::{self, Command, CommandIntent};
use crate::types::*;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

#[derive(Debug, Clone, PartialEq)]
pub enum ChatOutcome {
    /// A validated command intent for the orchestrator.
    Command(CommandIntent),
    /// The turn-holder's clue word, already spoiler-checked.
    Clue(String),
    /// A ballot vote resolved to the target's id.
    Vote(PlayerId),
    /// Ordinary chat, broadcast unmodified.
    FreeChat,
    /// Clue leaked the secret; warn privately, change nothing.
    SpoilerRejected,
    /// Drop silently.
    Suppressed,
}

pub fn classify(
    state: &GameState,
    player: &Player,
    message: &str,
    admin_key: Option<&str>,
) -> ChatOutcome {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        return ChatOutcome::Suppressed;
    }

    let command = commands::parse(trimmed, admin_key);
    let round = state.current_round.as_ref();
    let seated = round.is_some_and(|r| r.is_seated(player.id));
    let mid_round = round.is_some()
        && matches!(
            state.phase,
            GamePhase::Clues | GamePhase::Discussion | GamePhase::Voting | GamePhase::Reveal
        );

    // Ghosts don't talk: outside WAITING/RESULTS the only thing a
    // non-seated player can do is get in line.
    if mid_round && !seated && !player.is_admin {
        return match command {
            Some(Command::Join) => ChatOutcome::Command(CommandIntent::JoinQueue),
            _ => ChatOutcome::Suppressed,
        };
    }

    if state.phase == GamePhase::Clues {
        if let Some(round) = round {
            if round.current_clue_giver() == Some(player.id) {
                let word = trimmed.split_whitespace().next().unwrap_or_default();
                if contains_spoiler(word, &round.footballer) {
                    return ChatOutcome::SpoilerRejected;
                }
                return ChatOutcome::Clue(word.to_string());
            }
            if !player.is_admin {
                return ChatOutcome::Suppressed;
            }
        }
    }

    if state.phase == GamePhase::Voting && seated {
        if let Some(round) = round {
            if let Ok(n) = trimmed.parse::<usize>() {
                if (1..=round.clue_order.len()).contains(&n) {
                    return ChatOutcome::Vote(round.clue_order[n - 1]);
                }
            }
        }
        // While a ballot is open, seated players only vote; admin overrides
        // are the one exception.
        if player.is_admin {
            if let Some(cmd) = command {
                return validated(cmd, player, state);
            }
        }
        return ChatOutcome::Suppressed;
    }

    match command {
        Some(cmd) => validated(cmd, player, state),
        None => ChatOutcome::FreeChat,
    }
}

fn validated(cmd: Command, player: &Player, state: &GameState) -> ChatOutcome {
    match commands::validate(cmd, player, state) {
        Some(intent) => ChatOutcome::Command(intent),
        None => ChatOutcome::Suppressed,
    }
}

/// Case-fold and strip diacritics, NFD style.
fn fold(s: &str) -> String {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// A clue spoils the secret when it contains any word of the footballer's
/// name longer than two characters, after folding.
pub fn contains_spoiler(clue: &str, footballer: &str) -> bool {
    let clue = fold(clue);
    fold(footballer)
        .split_whitespace()
        .any(|word| word.chars().count() > 2 && clue.contains(word))
}
