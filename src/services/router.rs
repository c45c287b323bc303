//! Picks the top-level action for an inbound message.

use crate::{
    dto::payload::{PayloadError, decode_command_payload},
    state::conversation::TopLevelStep,
};

/// Texts that always open the welcome menu.
pub const START_PHRASES: [&str; 3] = ["начать", "start", "/start"];

/// Top-level action resolved for one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Greet the sender and show the main menu.
    ShowWelcomeMenu,
    /// List the sender's latest results.
    ShowResults,
    /// Start or continue recording a result.
    RecordResults,
    /// Not implemented yet; answers with a placeholder.
    FindGame,
    /// Not implemented yet; answers with a placeholder.
    CreateGame,
    /// Nothing matched.
    Unknown,
}

impl Action {
    /// Map a command or step label to its action; anything unrecognised is [`Action::Unknown`].
    pub fn from_label(label: &str) -> Self {
        match label {
            "results" => Action::ShowResults,
            "recordResults" => Action::RecordResults,
            "find_game" => Action::FindGame,
            "create_game" => Action::CreateGame,
            _ => Action::Unknown,
        }
    }

    /// Command name embedded in button payloads, for routable actions.
    pub fn command(self) -> Option<&'static str> {
        match self {
            Action::ShowResults => Some("results"),
            Action::RecordResults => Some("recordResults"),
            Action::FindGame => Some("find_game"),
            Action::CreateGame => Some("create_game"),
            Action::ShowWelcomeMenu | Action::Unknown => None,
        }
    }
}

/// Routing decision for a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    /// Action to run.
    pub action: Action,
    /// `true` when the action came from a button payload rather than the conversation's step.
    pub from_payload: bool,
}

/// Resolve the action for `text`/`payload` given the conversation's current step.
///
/// Start phrases win over everything. A malformed payload is an error and the message must be
/// dropped without a reply.
pub fn resolve(step: TopLevelStep, text: &str, payload: Option<&str>) -> Result<Route, PayloadError> {
    if START_PHRASES.contains(&text) {
        return Ok(Route {
            action: Action::ShowWelcomeMenu,
            from_payload: false,
        });
    }

    let route = match decode_command_payload(payload)? {
        Some(command) => Route {
            action: Action::from_label(&command),
            from_payload: true,
        },
        None => Route {
            action: Action::from_label(step.label()),
            from_payload: false,
        },
    };
    Ok(route)
}
