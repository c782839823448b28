//! Persistence collaborator.
//!
//! Completed rounds and player joins are handed over fire-and-forget; a
//! failing store must never stall or corrupt the game, so the sequencer
//! spawns these calls and only logs errors.

use crate::types::RoundResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Serialize)]
pub struct RoundLogEntry {
    pub impostor_name: String,
    pub footballer: String,
    pub impostor_won: bool,
    pub voted_out_name: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl From<RoundResult> for RoundLogEntry {
    fn from(result: RoundResult) -> Self {
        Self {
            impostor_name: result.impostor_name,
            footballer: result.footballer,
            impostor_won: result.impostor_won,
            voted_out_name: result.voted_out_name,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerLogEntry {
    pub name: String,
    pub auth: Option<String>,
    pub room: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait GameStore: Send + Sync {
    async fn log_round(&self, entry: RoundLogEntry) -> Result<(), StoreError>;
    async fn log_player_join(&self, entry: PlayerLogEntry) -> Result<(), StoreError>;
}

/// In-memory store, also handy for asserting on logged rounds in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rounds: Mutex<Vec<RoundLogEntry>>,
    players: Mutex<Vec<PlayerLogEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn rounds(&self) -> Vec<RoundLogEntry> {
        self.rounds.lock().await.clone()
    }

    pub async fn player_joins(&self) -> Vec<PlayerLogEntry> {
        self.players.lock().await.clone()
    }
}

#[async_trait]
impl GameStore for MemoryStore {
    async fn log_round(&self, entry: RoundLogEntry) -> Result<(), StoreError> {
        self.rounds.lock().await.push(entry);
        Ok(())
    }

    async fn log_player_join(&self, entry: PlayerLogEntry) -> Result<(), StoreError> {
        self.players.lock().await.push(entry);
        Ok(())
    }
}
