//! Per-conversation state and the registry holding it.

use std::sync::Arc;

use dashmap::{DashMap, mapref::entry::Entry};
use tokio::sync::Mutex;

use crate::state::recording::RecordingFlow;

/// Top-level step a conversation is in; free-text turns without a payload are routed by it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TopLevelStep {
    /// Fresh conversation or back at the menu.
    #[default]
    Start,
    /// Free text feeds the recording dialogue.
    RecordResults,
}

impl TopLevelStep {
    /// Label matched against command names by the router.
    pub fn label(self) -> &'static str {
        match self {
            TopLevelStep::Start => "start",
            TopLevelStep::RecordResults => "recordResults",
        }
    }
}

/// Mutable per-conversation state, kept in memory for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationState {
    /// Conversation id.
    pub peer_id: i64,
    /// Users-table id of the sender, `None` until resolved.
    pub user_id: Option<i32>,
    /// Username of the resolved sender, empty until resolved.
    pub user_name: String,
    /// Where free-text messages are routed.
    pub step: TopLevelStep,
    /// Progress of the recording dialogue.
    pub recording: RecordingFlow,
}

impl ConversationState {
    /// Initial state: start step, recording counter at 0, sender unresolved.
    pub fn new(peer_id: i64) -> Self {
        Self {
            peer_id,
            user_id: None,
            user_name: String::new(),
            step: TopLevelStep::Start,
            recording: RecordingFlow::default(),
        }
    }
}

/// Shared handle to one conversation; holding its lock serializes that conversation's turns.
pub type ConversationHandle = Arc<Mutex<ConversationState>>;

/// Registry of every conversation seen since startup.
#[derive(Default)]
pub struct ConversationStore {
    conversations: DashMap<i64, ConversationHandle>,
}

impl ConversationStore {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the conversation for `peer_id`, creating it with [`ConversationState::new`] if absent.
    ///
    /// The boolean is `true` when the state was created by this call.
    pub fn get_or_create(&self, peer_id: i64) -> (ConversationHandle, bool) {
        match self.conversations.entry(peer_id) {
            Entry::Occupied(entry) => (entry.get().clone(), false),
            Entry::Vacant(entry) => {
                let handle = Arc::new(Mutex::new(ConversationState::new(peer_id)));
                entry.insert(handle.clone());
                (handle, true)
            }
        }
    }

    /// Number of conversations held; it only grows.
    pub fn count(&self) -> usize {
        self.conversations.len()
    }
}

#[cfg(test)]
impl ConversationStore {
    pub(crate) fn get(&self, peer_id: i64) -> Option<ConversationHandle> {
        self.conversations
            .get(&peer_id)
            .map(|entry| entry.value().clone())
    }
}
