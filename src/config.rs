//! Environment-derived configuration.
//!
//! Everything has a default so the room runs out of the box; `.env` is
//! loaded by `main` before this is read.

use crate::types::GameSettings;

#[derive(Debug, Clone)]
pub struct Config {
    pub room_name: String,
    pub max_players: u32,
    pub port: u16,
    /// Chat keyword that elevates the speaker to admin. Disabled when unset.
    pub admin_key: Option<String>,
    pub clue_seconds: u64,
    pub discussion_seconds: u64,
    pub voting_seconds: u64,
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        let room_id = std::env::var("ROOM_ID").unwrap_or_else(|_| "1".to_string());
        let room_name = std::env::var("ROOM_NAME")
            .unwrap_or_else(|_| format!("🔴 EL IMPOSTOR #{room_id:0>2}"));

        Self {
            room_name,
            max_players: env_u64("MAX_PLAYERS", 15) as u32,
            port: env_u64("PORT", 3000) as u16,
            admin_key: std::env::var("ADMIN_KEY").ok().filter(|k| !k.trim().is_empty()),
            clue_seconds: env_u64("CLUE_TIME", 20),
            discussion_seconds: env_u64("DISCUSSION_TIME", 30),
            voting_seconds: env_u64("VOTING_TIME", 20),
        }
    }

    pub fn settings(&self) -> GameSettings {
        GameSettings {
            clue_seconds: self.clue_seconds,
            discussion_seconds: self.discussion_seconds,
            voting_seconds: self.voting_seconds,
            ..GameSettings::default()
        }
    }
}
