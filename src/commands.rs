//! Chat command grammar.
//!
//! Parsing and validation are separate steps: `parse` only recognizes
//! tokens, `validate` checks them against the speaker's role and the
//! current phase and yields at most one intent for the orchestrator.

use crate::types::{GamePhase, GameState, Player};

pub const HELP_TEXT: &str =
    "📖 Comandos: !jugar (unirse a la cola) | !salir (dejar la cola) | !ayuda";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Help,
    Join,
    Leave,
    Start,
    Skip,
    Reveal,
    Reset,
    /// The configured elevation keyword, spoken as the whole message.
    AdminKey,
}

/// What a validated command asks the orchestrator to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandIntent {
    ShowHelp,
    JoinQueue,
    LeaveQueue,
    StartGame,
    SkipPhase,
    ForceReveal,
    ResetGame,
    GrantAdmin,
}

pub fn parse(message: &str, admin_key: Option<&str>) -> Option<Command> {
    let lowered = message.trim().to_lowercase();
    let token = lowered.split_whitespace().next()?;
    match token {
        "!jugar" | "!join" => Some(Command::Join),
        "!salir" | "!leave" => Some(Command::Leave),
        "!ayuda" | "!help" => Some(Command::Help),
        "!start" => Some(Command::Start),
        "!skip" => Some(Command::Skip),
        "!reveal" => Some(Command::Reveal),
        "!reset" => Some(Command::Reset),
        _ => match admin_key {
            Some(key) if lowered == key.to_lowercase() => Some(Command::AdminKey),
            _ => None,
        },
    }
}

pub fn validate(command: Command, player: &Player, state: &GameState) -> Option<CommandIntent> {
    match command {
        Command::Help => Some(CommandIntent::ShowHelp),
        Command::Join => Some(CommandIntent::JoinQueue),
        Command::Leave => Some(CommandIntent::LeaveQueue),
        Command::Start => {
            (player.is_admin && state.phase == GamePhase::Waiting).then_some(CommandIntent::StartGame)
        }
        Command::Skip => player.is_admin.then_some(CommandIntent::SkipPhase),
        Command::Reveal => player.is_admin.then_some(CommandIntent::ForceReveal),
        Command::Reset => player.is_admin.then_some(CommandIntent::ResetGame),
        Command::AdminKey => Some(CommandIntent::GrantAdmin),
    }
}
