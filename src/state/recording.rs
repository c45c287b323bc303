//! The guided result-recording dialogue: steps, draft data and input parsing.

use std::num::ParseIntError;

use thiserror::Error;

/// Steps of the guided result-recording dialogue.
///
/// Steps move forward one at a time; [`RecordingFlow::restart`] is the only way back to the
/// start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum RecordingStep {
    /// Flow not started yet; the next turn prompts for the event type.
    #[default]
    PromptEventType,
    /// Waiting for the event type answer.
    AwaitEventType,
    /// Waiting for the opponent's username.
    AwaitOpponent,
    /// Waiting for the acting user's score.
    AwaitFirstScore,
    /// Waiting for the opponent's score; the result is persisted on this turn.
    AwaitSecondScore,
    /// Result stored.
    Completed,
}

impl RecordingStep {
    /// Numeric counter value (0..=5).
    pub fn index(self) -> u8 {
        match self {
            RecordingStep::PromptEventType => 0,
            RecordingStep::AwaitEventType => 1,
            RecordingStep::AwaitOpponent => 2,
            RecordingStep::AwaitFirstScore => 3,
            RecordingStep::AwaitSecondScore => 4,
            RecordingStep::Completed => 5,
        }
    }

    fn successor(self) -> Option<RecordingStep> {
        match self {
            RecordingStep::PromptEventType => Some(RecordingStep::AwaitEventType),
            RecordingStep::AwaitEventType => Some(RecordingStep::AwaitOpponent),
            RecordingStep::AwaitOpponent => Some(RecordingStep::AwaitFirstScore),
            RecordingStep::AwaitFirstScore => Some(RecordingStep::AwaitSecondScore),
            RecordingStep::AwaitSecondScore => Some(RecordingStep::Completed),
            RecordingStep::Completed => None,
        }
    }
}

/// Error returned when advancing past the terminal step.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: recording flow cannot advance from {from:?}")]
pub struct InvalidTransition {
    /// Step the flow was in.
    pub from: RecordingStep,
}

/// Kind of event the recorded game was played at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    /// Played at a tournament.
    Tournament,
    /// Arranged between the players.
    ByArrangement,
}

const TOURNAMENT_MARKERS: [&str; 2] = ["турнир", "tournament"];
const ARRANGEMENT_MARKERS: [&str; 2] = ["договор", "arrangement"];

impl EventType {
    /// Code stored in `results.game_type`.
    pub fn code(self) -> i32 {
        match self {
            EventType::Tournament => 0,
            EventType::ByArrangement => 1,
        }
    }

    /// Classify free text by case-insensitive substring; tournament wins when both match.
    pub fn classify(text: &str) -> Option<Self> {
        let lowered = text.to_lowercase();
        if TOURNAMENT_MARKERS
            .iter()
            .any(|marker| lowered.contains(marker))
        {
            Some(EventType::Tournament)
        } else if ARRANGEMENT_MARKERS
            .iter()
            .any(|marker| lowered.contains(marker))
        {
            Some(EventType::ByArrangement)
        } else {
            None
        }
    }
}

/// Data captured across the recording turns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingDraft {
    /// Selected event type.
    pub event_type: Option<EventType>,
    /// Canonical username as stored in the users table.
    pub opponent: Option<String>,
    /// Acting user's score, unparsed until the final turn.
    pub first_score_raw: Option<String>,
    /// Opponent's score, unparsed until the final turn.
    pub second_score_raw: Option<String>,
}

/// Recording progress of one conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingFlow {
    step: RecordingStep,
    /// Answers collected so far.
    pub draft: RecordingDraft,
}

impl RecordingFlow {
    /// Current step.
    pub fn step(&self) -> RecordingStep {
        self.step
    }

    /// Move to the next step, returning it.
    pub fn advance(&mut self) -> Result<RecordingStep, InvalidTransition> {
        let next = self
            .step
            .successor()
            .ok_or(InvalidTransition { from: self.step })?;
        self.step = next;
        Ok(next)
    }

    /// Drop any progress and draft data, returning to step 0.
    pub fn restart(&mut self) {
        *self = Self::default();
    }
}

/// Find the stored username matching `text` case-insensitively.
pub fn match_opponent<'a>(text: &str, usernames: &'a [String]) -> Option<&'a str> {
    let wanted = text.to_lowercase();
    usernames
        .iter()
        .find(|name| name.to_lowercase() == wanted)
        .map(String::as_str)
}

/// Which side of the result a score belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreSide {
    /// The recording user's score.
    Own,
    /// The opponent's score.
    Opponent,
}

/// Score text that is not an integer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {side:?} score `{raw}`")]
pub struct ScoreError {
    /// Which score was rejected.
    pub side: ScoreSide,
    /// Text as entered.
    pub raw: String,
    /// Parser failure.
    #[source]
    pub source: ParseIntError,
}

/// Parse raw score text exactly as entered (no trimming).
pub fn parse_score(raw: &str, side: ScoreSide) -> Result<i32, ScoreError> {
    raw.parse::<i32>().map_err(|source| ScoreError {
        side,
        raw: raw.to_owned(),
        source,
    })
}
