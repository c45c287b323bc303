//! Process-wide state shared by every message handler.

pub mod conversation;
pub mod recording;

use std::sync::Arc;

use crate::dao::gateway::PersistenceGateway;

use self::conversation::ConversationStore;

/// Shared handle to [`AppState`].
pub type SharedState = Arc<AppState>;

/// Central application state: the persistence gateway and every live conversation.
pub struct AppState {
    gateway: PersistenceGateway,
    conversations: ConversationStore,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(gateway: PersistenceGateway) -> SharedState {
        Arc::new(Self {
            gateway,
            conversations: ConversationStore::new(),
        })
    }

    /// Typed access to users and results.
    pub fn gateway(&self) -> &PersistenceGateway {
        &self.gateway
    }

    /// In-memory registry of conversation states keyed by peer id.
    pub fn conversations(&self) -> &ConversationStore {
        &self.conversations
    }
}
