//! Sequencer/orchestrator.
//!
//! Owns the single `GameState` and is the only caller of
//! `engine::transition`. All external events — room callbacks and timer
//! expirations — arrive over one mpsc channel and are processed strictly
//! one at a time, so no two transitions ever race.
//!
//! Timer discipline: every armed timer captures the current epoch; the
//! epoch bumps (and all handles abort) whenever the phase changes, so a
//! stale timer can never fire a stale action into a newer phase.

use crate::adapter::{AdapterResult, DiscProperties, RoomAdapter};
use crate::commands::{CommandIntent, HELP_TEXT};
use crate::engine::{self, Action, Effect};
use crate::gate::{self, ChatOutcome};
use crate::store::{GameStore, PlayerLogEntry, RoundLogEntry};
use crate::types::*;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;

/// Delay between seating players and the first clue turn, giving the room
/// time to settle team/disc state.
const ASSIGN_DELAY: Duration = Duration::from_secs(3);
const REVEAL_DELAY: Duration = Duration::from_secs(3);
const RESULTS_DELAY: Duration = Duration::from_secs(8);
const AUTO_START_DELAY: Duration = Duration::from_secs(2);

/// Table seats around the center spot, in clue order.
const SEAT_POSITIONS: [(f64, f64); 5] = [
    (0.0, -130.0),
    (124.0, -40.0),
    (76.0, 105.0),
    (-76.0, 105.0),
    (-124.0, -40.0),
];

/// Player descriptor as delivered by the hosting room.
#[derive(Debug, Clone)]
pub struct RoomPlayer {
    pub id: PlayerId,
    pub name: String,
    pub auth: Option<String>,
    pub admin: bool,
}

#[derive(Debug)]
pub enum RoomEvent {
    PlayerJoined(RoomPlayer),
    PlayerLeft(PlayerId),
    Chat { player_id: PlayerId, message: String },
    Timer { epoch: u64, kind: TimerKind },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// The per-phase deadline (clue turn, discussion, voting).
    Phase,
    AssignDelay,
    RevealDelay,
    ResultsDelay,
    AutoStart,
}

/// Pull-based snapshot served by the status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub phase: GamePhase,
    pub player_count: usize,
    pub queue_count: usize,
    pub rounds_played: usize,
}

/// Cloneable inbound side of the controller; the room adapter calls these.
#[derive(Clone)]
pub struct RoomHandle {
    tx: mpsc::UnboundedSender<RoomEvent>,
}

impl RoomHandle {
    pub fn player_joined(&self, player: RoomPlayer) {
        let _ = self.tx.send(RoomEvent::PlayerJoined(player));
    }

    pub fn player_left(&self, id: PlayerId) {
        let _ = self.tx.send(RoomEvent::PlayerLeft(id));
    }

    pub fn chat(&self, player_id: PlayerId, message: impl Into<String>) {
        let _ = self.tx.send(RoomEvent::Chat {
            player_id,
            message: message.into(),
        });
    }
}

pub struct GameController {
    adapter: Arc<dyn RoomAdapter>,
    store: Arc<dyn GameStore>,
    state: GameState,
    rng: StdRng,
    footballers: Vec<String>,
    admin_key: Option<String>,
    room_name: String,
    tx: mpsc::UnboundedSender<RoomEvent>,
    rx: mpsc::UnboundedReceiver<RoomEvent>,
    epoch: u64,
    phase_timer: Option<JoinHandle<()>>,
    followup_timer: Option<JoinHandle<()>>,
    autostart_timer: Option<JoinHandle<()>>,
    status: Arc<RwLock<StatusSnapshot>>,
}

impl GameController {
    pub fn new(
        adapter: Arc<dyn RoomAdapter>,
        store: Arc<dyn GameStore>,
        footballers: Vec<String>,
        settings: GameSettings,
        admin_key: Option<String>,
        room_name: String,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let status = Arc::new(RwLock::new(StatusSnapshot {
            phase: GamePhase::Waiting,
            player_count: 0,
            queue_count: 0,
            rounds_played: 0,
        }));
        Self {
            adapter,
            store,
            state: GameState::new(settings),
            rng: StdRng::from_os_rng(),
            footballers,
            admin_key,
            room_name,
            tx,
            rx,
            epoch: 0,
            phase_timer: None,
            followup_timer: None,
            autostart_timer: None,
            status,
        }
    }

    pub fn handle(&self) -> RoomHandle {
        RoomHandle {
            tx: self.tx.clone(),
        }
    }

    pub fn status(&self) -> Arc<RwLock<StatusSnapshot>> {
        self.status.clone()
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Process events until every sender is gone.
    pub async fn run(mut self) {
        while let Some(event) = self.rx.recv().await {
            self.handle_event(event).await;
        }
    }

    async fn handle_event(&mut self, event: RoomEvent) {
        match event {
            RoomEvent::PlayerJoined(player) => self.on_player_join(player).await,
            RoomEvent::PlayerLeft(id) => self.apply(Action::PlayerLeave(id)).await,
            RoomEvent::Chat { player_id, message } => self.on_chat(player_id, &message).await,
            RoomEvent::Timer { epoch, kind } => self.on_timer(epoch, kind).await,
        }
    }

    async fn on_player_join(&mut self, joined: RoomPlayer) {
        // Display names are unique, case-insensitively, before the player
        // ever reaches the model.
        let taken = self
            .state
            .players
            .values()
            .any(|p| p.name.to_lowercase() == joined.name.to_lowercase());
        if taken {
            self.announce(
                &format!("❌ El nombre \"{}\" ya está en uso", joined.name),
                Some(joined.id),
                AnnounceStyle::Danger,
            )
            .await;
            if let Err(e) = self.adapter.kick_player(joined.id, "Nombre duplicado").await {
                tracing::warn!(error = %e, "kick failed");
            }
            return;
        }

        let entry = PlayerLogEntry {
            name: joined.name.clone(),
            auth: joined.auth.clone(),
            room: self.room_name.clone(),
            timestamp: Utc::now(),
        };
        let store = self.store.clone();
        tokio::spawn(async move {
            if let Err(e) = store.log_player_join(entry).await {
                tracing::warn!(error = %e, "player join not persisted");
            }
        });

        let player = Player {
            id: joined.id,
            name: joined.name,
            auth: joined.auth,
            is_admin: joined.admin,
            joined_at: Utc::now(),
        };
        self.apply(Action::PlayerJoin(player)).await;
    }

    async fn on_chat(&mut self, player_id: PlayerId, message: &str) {
        let Some(player) = self.state.players.get(&player_id).cloned() else {
            return;
        };
        match gate::classify(&self.state, &player, message, self.admin_key.as_deref()) {
            ChatOutcome::Command(intent) => self.run_intent(intent, &player).await,
            ChatOutcome::Clue(word) => {
                self.apply(Action::SubmitClue {
                    player_id,
                    clue: word,
                })
                .await
            }
            ChatOutcome::Vote(target) => {
                self.apply(Action::SubmitVote {
                    voter: player_id,
                    target,
                })
                .await
            }
            ChatOutcome::FreeChat => {
                let line = format!("{}: {}", player.name, message.trim());
                self.announce(&line, None, AnnounceStyle::Plain).await;
            }
            ChatOutcome::SpoilerRejected => {
                self.announce(
                    "❌ ¡No puedes decir el nombre!",
                    Some(player_id),
                    AnnounceStyle::Danger,
                )
                .await;
            }
            ChatOutcome::Suppressed => {}
        }
    }

    async fn run_intent(&mut self, intent: CommandIntent, player: &Player) {
        match intent {
            CommandIntent::ShowHelp => {
                self.announce(HELP_TEXT, Some(player.id), AnnounceStyle::Highlight)
                    .await
            }
            CommandIntent::JoinQueue => self.apply(Action::JoinQueue(player.id)).await,
            CommandIntent::LeaveQueue => self.apply(Action::LeaveQueue(player.id)).await,
            CommandIntent::StartGame => {
                let footballers = self.footballers.clone();
                self.apply(Action::StartGame { footballers }).await
            }
            CommandIntent::SkipPhase => self.apply(Action::SkipPhase).await,
            CommandIntent::ForceReveal => self.apply(Action::ForceReveal).await,
            CommandIntent::ResetGame => self.apply(Action::ResetGame).await,
            CommandIntent::GrantAdmin => {
                if let Err(e) = self.adapter.set_player_admin(player.id, true).await {
                    tracing::warn!(error = %e, "admin grant failed");
                }
                self.announce(
                    "👑 Acceso Maestro Confirmado",
                    Some(player.id),
                    AnnounceStyle::Highlight,
                )
                .await;
                self.apply(Action::GrantAdmin(player.id)).await;
            }
        }
    }

    async fn on_timer(&mut self, epoch: u64, kind: TimerKind) {
        if epoch != self.epoch {
            tracing::debug!(stale = epoch, current = self.epoch, ?kind, "stale timer discarded");
            return;
        }
        let action = match kind {
            TimerKind::Phase => match self.state.phase {
                GamePhase::Clues => Some(Action::ClueTimeout),
                GamePhase::Discussion => Some(Action::EndDiscussion),
                GamePhase::Voting => Some(Action::EndVoting),
                _ => None,
            },
            TimerKind::AssignDelay => Some(Action::BeginClues),
            TimerKind::RevealDelay => Some(Action::EndReveal),
            TimerKind::ResultsDelay => Some(Action::ResetGame),
            TimerKind::AutoStart => Some(Action::StartGame {
                footballers: self.footballers.clone(),
            }),
        };
        if let Some(action) = action {
            self.apply(action).await;
        }
    }

    /// Apply one transition: replace the state, run the effects in order,
    /// then arm whatever the new phase needs.
    async fn apply(&mut self, action: Action) {
        let old_phase = self.state.phase;
        let current = std::mem::take(&mut self.state);
        let result = engine::transition(current, action, &mut self.rng);
        self.state = result.state;

        let phase_changed = self.state.phase != old_phase;
        if phase_changed {
            tracing::info!(from = ?old_phase, to = ?self.state.phase, "phase change");
            self.invalidate_timers();
        }

        for effect in result.effects {
            self.run_effect(effect).await;
        }

        if phase_changed {
            self.arm_phase_followups().await;
        }
        self.publish_status().await;
    }

    /// New phase: all outstanding timers are stale as a unit.
    fn invalidate_timers(&mut self) {
        self.epoch += 1;
        for slot in [
            &mut self.phase_timer,
            &mut self.followup_timer,
            &mut self.autostart_timer,
        ] {
            if let Some(handle) = slot.take() {
                handle.abort();
            }
        }
    }

    async fn run_effect(&mut self, effect: Effect) {
        match effect {
            Effect::AnnouncePublic { message, style } => {
                self.announce(&message, None, style).await
            }
            Effect::AnnouncePrivate { player_id, message } => {
                self.announce(&message, Some(player_id), AnnounceStyle::Highlight)
                    .await
            }
            Effect::SetPhaseTimer { seconds } => {
                let handle = self.arm(Duration::from_secs(seconds), TimerKind::Phase);
                if let Some(old) = self.phase_timer.replace(handle) {
                    old.abort();
                }
            }
            Effect::ClearTimer => {
                for slot in [&mut self.phase_timer, &mut self.followup_timer] {
                    if let Some(handle) = slot.take() {
                        handle.abort();
                    }
                }
            }
            Effect::AutoStartGame => {
                let handle = self.arm(AUTO_START_DELAY, TimerKind::AutoStart);
                if let Some(old) = self.autostart_timer.replace(handle) {
                    old.abort();
                }
            }
            Effect::LogRound { result } => {
                let store = self.store.clone();
                let entry = RoundLogEntry::from(result);
                tokio::spawn(async move {
                    if let Err(e) = store.log_round(entry).await {
                        tracing::warn!(error = %e, "round not persisted");
                    }
                });
            }
        }
    }

    async fn arm_phase_followups(&mut self) {
        match self.state.phase {
            GamePhase::Assign => {
                self.spawn_field_setup();
                let handle = self.arm(ASSIGN_DELAY, TimerKind::AssignDelay);
                self.followup_timer = Some(handle);
            }
            GamePhase::Reveal => {
                let handle = self.arm(REVEAL_DELAY, TimerKind::RevealDelay);
                self.followup_timer = Some(handle);
            }
            GamePhase::Results => {
                let handle = self.arm(RESULTS_DELAY, TimerKind::ResultsDelay);
                self.followup_timer = Some(handle);
            }
            _ => {}
        }
    }

    fn arm(&self, duration: Duration, kind: TimerKind) -> JoinHandle<()> {
        let tx = self.tx.clone();
        let epoch = self.epoch;
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            let _ = tx.send(RoomEvent::Timer { epoch, kind });
        })
    }

    /// Seat the round players on the field. Runs detached: cosmetic seating
    /// failures must not stall the chat/timer clock.
    fn spawn_field_setup(&self) {
        let Some(round) = self.state.current_round.as_ref() else {
            return;
        };
        // Seat by clue order; it is already a random permutation, so seat
        // position reveals nothing about roles.
        let seats = round.clue_order.clone();
        let adapter = self.adapter.clone();
        tokio::spawn(async move {
            if let Err(e) = setup_field(adapter.as_ref(), &seats).await {
                tracing::warn!(error = %e, "field setup failed; round continues on the chat clock");
            }
        });
    }

    async fn announce(&self, message: &str, target: Option<PlayerId>, style: AnnounceStyle) {
        if let Err(e) = self.adapter.send_announcement(message, target, style).await {
            tracing::warn!(error = %e, "announcement dropped");
        }
    }

    async fn publish_status(&self) {
        let mut status = self.status.write().await;
        *status = StatusSnapshot {
            phase: self.state.phase,
            player_count: self.state.players.len(),
            queue_count: self.state.queue.len(),
            rounds_played: self.state.round_history.len(),
        };
    }
}

/// The room platform applies team and disc changes eventually, not
/// immediately; each step waits before the next so they land in order.
async fn setup_field(adapter: &dyn RoomAdapter, seats: &[PlayerId]) -> AdapterResult<()> {
    adapter.stop_game().await?;
    tokio::time::sleep(Duration::from_millis(100)).await;

    for id in adapter.player_list().await? {
        if id != 0 {
            adapter.set_player_team(id, 0).await?;
        }
    }
    tokio::time::sleep(Duration::from_millis(100)).await;

    for id in seats {
        adapter.set_player_team(*id, 1).await?;
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    tokio::time::sleep(Duration::from_millis(200)).await;

    adapter.start_game().await?;
    tokio::time::sleep(Duration::from_millis(500)).await;

    for (i, id) in seats.iter().enumerate() {
        if let Some((x, y)) = SEAT_POSITIONS.get(i) {
            adapter
                .set_player_disc_properties(
                    *id,
                    DiscProperties {
                        x: *x,
                        y: *y,
                        xspeed: 0.0,
                        yspeed: 0.0,
                    },
                )
                .await?;
        }
    }
    Ok(())
}
