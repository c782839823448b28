//! Seam to the hosting game room.
//!
//! The core never talks to the room platform directly; everything outward
//! goes through this trait. A tracing-only implementation is provided for
//! local runs and tests.

use crate::types::{AnnounceStyle, PlayerId};
use async_trait::async_trait;

/// Kinematic state for a player's disc, used to seat players around the
/// table during ASSIGN.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiscProperties {
    pub x: f64,
    pub y: f64,
    pub xspeed: f64,
    pub yspeed: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("room not connected")]
    Disconnected,
    #[error("room call failed: {0}")]
    Room(String),
}

pub type AdapterResult<T> = Result<T, AdapterError>;

/// Outbound calls the sequencer issues against the hosting room.
#[async_trait]
pub trait RoomAdapter: Send + Sync {
    /// `target` of `None` broadcasts to the whole room.
    async fn send_announcement(
        &self,
        message: &str,
        target: Option<PlayerId>,
        style: AnnounceStyle,
    ) -> AdapterResult<()>;

    async fn kick_player(&self, id: PlayerId, reason: &str) -> AdapterResult<()>;

    async fn set_player_admin(&self, id: PlayerId, admin: bool) -> AdapterResult<()>;

    async fn set_player_team(&self, id: PlayerId, team: u32) -> AdapterResult<()>;

    async fn set_player_disc_properties(
        &self,
        id: PlayerId,
        props: DiscProperties,
    ) -> AdapterResult<()>;

    async fn start_game(&self) -> AdapterResult<()>;

    async fn stop_game(&self) -> AdapterResult<()>;

    async fn player_list(&self) -> AdapterResult<Vec<PlayerId>>;
}

/// Adapter that only logs, for running the core without a real room.
#[derive(Debug, Default)]
pub struct TracingAdapter;

#[async_trait]
impl RoomAdapter for TracingAdapter {
    async fn send_announcement(
        &self,
        message: &str,
        target: Option<PlayerId>,
        style: AnnounceStyle,
    ) -> AdapterResult<()> {
        match target {
            Some(id) => tracing::info!(player = id, ?style, "{message}"),
            None => tracing::info!(?style, "{message}"),
        }
        Ok(())
    }

    async fn kick_player(&self, id: PlayerId, reason: &str) -> AdapterResult<()> {
        tracing::info!(player = id, reason, "kick");
        Ok(())
    }

    async fn set_player_admin(&self, id: PlayerId, admin: bool) -> AdapterResult<()> {
        tracing::info!(player = id, admin, "set admin");
        Ok(())
    }

    async fn set_player_team(&self, id: PlayerId, team: u32) -> AdapterResult<()> {
        tracing::debug!(player = id, team, "set team");
        Ok(())
    }

    async fn set_player_disc_properties(
        &self,
        id: PlayerId,
        props: DiscProperties,
    ) -> AdapterResult<()> {
        tracing::debug!(player = id, x = props.x, y = props.y, "place disc");
        Ok(())
    }

    async fn start_game(&self) -> AdapterResult<()> {
        tracing::debug!("room game start");
        Ok(())
    }

    async fn stop_game(&self) -> AdapterResult<()> {
        tracing::debug!("room game stop");
        Ok(())
    }

    async fn player_list(&self) -> AdapterResult<Vec<PlayerId>> {
        Ok(Vec::new())
    }
}
