//! Bots Long Poll event loop.

use std::{sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::{
    dto::message::IncomingMessage, services::message_service, state::SharedState,
    transport::Messenger,
};

use super::{
    client::VkClient,
    error::VkResult,
    models::{LongPollServer, MessageNewObject, PollResponse, Update},
};

/// Pause after a failed poll before trying again.
const RETRY_DELAY: Duration = Duration::from_secs(3);

/// Long-poll session bound to one community.
pub struct LongPoll {
    client: VkClient,
    group_id: i64,
    wait: Duration,
    server: LongPollServer,
    ts: String,
}

/// What to do after inspecting a poll response.
#[derive(Debug, PartialEq, Eq)]
enum PollOutcome {
    /// New events and the cursor to continue from.
    Events {
        ts: String,
        messages: Vec<IncomingMessage>,
    },
    /// History was lost; continue from the given cursor.
    ResetCursor(String),
    /// Key expired or server info lost; request a new server.
    RefreshServer,
}

impl LongPoll {
    /// Obtain the initial long-poll server for `group_id`.
    pub async fn connect(client: VkClient, group_id: i64, wait: Duration) -> VkResult<Self> {
        let server = client.long_poll_server(group_id).await?;
        info!(group_id, "long-poll server obtained");
        Ok(Self {
            client,
            group_id,
            wait,
            ts: server.ts.clone(),
            server,
        })
    }

    /// Poll forever, handling every inbound message on its own task.
    pub async fn run(mut self, state: SharedState, messenger: Arc<dyn Messenger>) {
        info!(group_id = self.group_id, "long-poll loop started");
        loop {
            let messages = match self.next_batch().await {
                Ok(messages) => messages,
                Err(err) => {
                    warn!(group_id = self.group_id, error = %err, "long poll failed; retrying");
                    sleep(RETRY_DELAY).await;
                    continue;
                }
            };

            for message in messages {
                let state = state.clone();
                let messenger = messenger.clone();
                tokio::spawn(async move {
                    message_service::handle_message(&state, messenger.as_ref(), message).await;
                });
            }
        }
    }

    /// Fetch the next batch of messages, recovering the session when the server asks for it.
    async fn next_batch(&mut self) -> VkResult<Vec<IncomingMessage>> {
        let response = self.client.poll(&self.server, &self.ts, self.wait).await?;
        match classify(response, &self.ts) {
            PollOutcome::Events { ts, messages } => {
                self.ts = ts;
                Ok(messages)
            }
            PollOutcome::ResetCursor(ts) => {
                debug!(ts = %ts, "long-poll history lost; moving cursor");
                self.ts = ts;
                Ok(Vec::new())
            }
            PollOutcome::RefreshServer => {
                info!(group_id = self.group_id, "refreshing long-poll server");
                self.server = self.client.long_poll_server(self.group_id).await?;
                self.ts = self.server.ts.clone();
                Ok(Vec::new())
            }
        }
    }
}

/// Interpret an `a_check` response; `current_ts` is kept when the server omits a new one.
fn classify(response: PollResponse, current_ts: &str) -> PollOutcome {
    let ts = response.ts.unwrap_or_else(|| current_ts.to_owned());
    match response.failed {
        Some(1) => PollOutcome::ResetCursor(ts),
        Some(_) => PollOutcome::RefreshServer,
        None => PollOutcome::Events {
            ts,
            messages: response
                .updates
                .into_iter()
                .filter_map(into_message)
                .collect(),
        },
    }
}

fn into_message(update: Update) -> Option<IncomingMessage> {
    if update.kind != "message_new" {
        return None;
    }
    match serde_json::from_value::<MessageNewObject>(update.object) {
        Ok(object) => Some(object.message.into()),
        Err(err) => {
            warn!(error = %err, "skipping malformed message_new event");
            None
        }
    }
}
