use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Player ids are assigned by the hosting room and stable per connection.
pub type PlayerId = u32;
pub type RoundId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GamePhase {
    #[default]
    Waiting,
    Assign,
    Clues,
    Discussion,
    Voting,
    Reveal,
    Results,
}

/// Rendering hint attached to announcements; the adapter maps these to
/// whatever the hosting room supports (colors, bold, etc.).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnounceStyle {
    Plain,
    Success,
    Warning,
    Danger,
    Highlight,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSettings {
    pub min_players: usize,
    pub clue_seconds: u64,
    pub discussion_seconds: u64,
    pub voting_seconds: u64,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            min_players: 5,
            clue_seconds: 20,
            discussion_seconds: 30,
            voting_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub auth: Option<String>,
    pub is_admin: bool,
    pub joined_at: DateTime<Utc>,
}

/// Outcome of a finished round, kept in `round_history` and handed to the
/// persistence collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundResult {
    pub impostor_won: bool,
    pub impostor_name: String,
    pub footballer: String,
    pub voted_out_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Round {
    pub id: RoundId,
    /// The secret word the impostor does not know.
    pub footballer: String,
    pub impostor_id: PlayerId,
    pub normal_player_ids: Vec<PlayerId>,
    /// Randomized turn sequence, impostor included. Doubles as the ballot
    /// ordering. Shrinks only when a seated player is eliminated or leaves.
    pub clue_order: Vec<PlayerId>,
    pub current_clue_index: usize,
    /// Insertion order is submission order.
    pub clues: IndexMap<PlayerId, String>,
    /// Voter -> target. Re-voting overwrites in place, so the insertion
    /// order of targets in the tally follows first votes.
    pub votes: IndexMap<PlayerId, PlayerId>,
    pub started_at: DateTime<Utc>,
    pub result: Option<RoundResult>,
}

impl Round {
    /// Turn-holder whose clue is currently expected, if the index is still
    /// inside `clue_order`.
    pub fn current_clue_giver(&self) -> Option<PlayerId> {
        self.clue_order.get(self.current_clue_index).copied()
    }

    pub fn is_seated(&self, id: PlayerId) -> bool {
        self.clue_order.contains(&id)
    }
}

/// The single live game state. Only ever replaced wholesale by the output of
/// `engine::transition`, never partially mutated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameState {
    pub phase: GamePhase,
    pub players: HashMap<PlayerId, Player>,
    /// FIFO; order determines round seating.
    pub queue: Vec<PlayerId>,
    pub current_round: Option<Round>,
    /// Append-only, observability only.
    pub round_history: Vec<RoundResult>,
    pub settings: GameSettings,
}

impl GameState {
    pub fn new(settings: GameSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn player_name(&self, id: PlayerId) -> &str {
        self.players
            .get(&id)
            .map(|p| p.name.as_str())
            .unwrap_or("?")
    }

    pub fn is_seated(&self, id: PlayerId) -> bool {
        self.current_round.as_ref().is_some_and(|r| r.is_seated(id))
    }
}
