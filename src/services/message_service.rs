//! Entry point for every inbound message.

use tracing::{info, warn};

use crate::{
    dao::{gateway::PersistenceGateway, storage::Lookup},
    dto::message::{IncomingMessage, Reply},
    error::ServiceError,
    services::{
        menu, recording_service, results_service,
        router::{self, Action},
    },
    state::{
        SharedState,
        conversation::{ConversationState, TopLevelStep},
    },
    transport::Messenger,
};

const FIND_GAME_PLACEHOLDER: &str = "🔍 Поиск игр пока в разработке.";
const CREATE_GAME_PLACEHOLDER: &str = "🎮 Создание игры...";
const UNKNOWN_COMMAND: &str = "Неизвестная команда.";

/// Handle one inbound message and deliver its replies.
///
/// The conversation's lock is held for the whole turn, replies included, so turns and replies
/// of one conversation never interleave. Messages with a malformed payload get no reply.
pub async fn handle_message(state: &SharedState, messenger: &dyn Messenger, message: IncomingMessage) {
    let IncomingMessage {
        peer_id,
        from_id,
        text,
        payload,
    } = message;
    info!(peer_id, from_id, text = %text, "received message");

    let display_name = match messenger.display_name(from_id).await {
        Ok(name) => name,
        Err(err) => {
            warn!(peer_id, from_id, error = %err, "could not resolve sender name");
            String::new()
        }
    };

    let (handle, created) = state.conversations().get_or_create(peer_id);
    if created {
        info!(
            peer_id,
            conversations = state.conversations().count(),
            "created conversation state"
        );
    }
    let mut conversation = handle.lock().await;

    resolve_sender(state.gateway(), &mut conversation, from_id, &display_name).await;

    let replies = match respond(state.gateway(), &mut conversation, &text, payload.as_deref()).await
    {
        Ok(replies) => replies,
        Err(err) => {
            warn!(peer_id, error = %err, "dropping message");
            return;
        }
    };

    for reply in replies {
        if let Err(err) = messenger.send(peer_id, reply).await {
            warn!(peer_id, error = %err, "failed to send reply");
        }
    }
}

/// Link the sender to a users-table row; failures only leave the conversation unresolved.
async fn resolve_sender(
    gateway: &PersistenceGateway,
    conversation: &mut ConversationState,
    from_id: i64,
    display_name: &str,
) {
    let peer_id = conversation.peer_id;
    match gateway.find_user_by_external(from_id, display_name).await {
        Lookup::Found(user) => {
            conversation.user_id = Some(user.id);
            conversation.user_name = user.username;
        }
        Lookup::NotFound => {
            info!(peer_id, from_id, display_name, "sender has no users row");
        }
        Lookup::Failed(err) => {
            warn!(peer_id, from_id, error = %err, "sender lookup failed");
        }
    }
}

async fn respond(
    gateway: &PersistenceGateway,
    conversation: &mut ConversationState,
    text: &str,
    payload: Option<&str>,
) -> Result<Vec<Reply>, ServiceError> {
    let route = router::resolve(conversation.step, text, payload)?;
    info!(peer_id = conversation.peer_id, action = ?route.action, "routed message");

    let replies = match route.action {
        Action::ShowWelcomeMenu => vec![menu::welcome(&conversation.user_name)?],
        Action::ShowResults => vec![
            results_service::show_results(gateway, conversation.peer_id, conversation.user_id)
                .await,
        ],
        Action::RecordResults => {
            conversation.step = TopLevelStep::RecordResults;
            recording_service::handle_turn(gateway, conversation, text, route.from_payload).await?
        }
        Action::FindGame => vec![Reply::text(FIND_GAME_PLACEHOLDER)],
        Action::CreateGame => vec![Reply::text(CREATE_GAME_PLACEHOLDER)],
        Action::Unknown => vec![Reply::text(UNKNOWN_COMMAND)],
    };
    Ok(replies)
}
