//! Turn handling for the guided "record a result" dialogue.

use time::{OffsetDateTime, PrimitiveDateTime};
use tracing::{info, warn};

use crate::{
    dao::{gateway::PersistenceGateway, models::NewGameResult, storage::Lookup},
    dto::{
        keyboard::{Button, ButtonColor, Keyboard},
        message::Reply,
    },
    error::ServiceError,
    state::{
        conversation::ConversationState,
        recording::{EventType, RecordingStep, ScoreSide, match_opponent, parse_score},
    },
};

const EVENT_TYPE_PROMPT: &str = "Введите тип мероприятия";
const EVENT_TYPE_RETRY: &str = "Выбери одну из кнопок 👇";
const EVENT_TYPE_SAVED: &str = "Тип события сохранён ✅";
const OPPONENT_PROMPT: &str = "Выбери пользователя:";
const OPPONENT_RETRY: &str = "Выбери пользователя с помощью кнопок 👇";
const OPPONENT_SCORE_PROMPT: &str = "Введи набранные OP оппонентом";
const ALREADY_SAVED: &str = "Результат уже сохранён ✅ Напиши «начать», чтобы открыть меню.";

/// Reply used whenever the username list cannot be loaded.
pub const USERS_LIST_FAILED: &str = "Ошибка получения списка пользователей, попробуй позже.";

const UNRESOLVED_USER: &str = "Не удалось определить тебя в БД, результат не сохранён.";
const OPPONENT_LOOKUP_FAILED: &str = "Ошибка поиска оппонента в БД, результат не сохранён.";
const OPPONENT_NOT_FOUND: &str = "Оппонент не найден в БД, результат не сохранён.";
const OWN_SCORE_INVALID: &str = "Неверный формат результата, используй только числа.";
const OPPONENT_SCORE_INVALID: &str =
    "Неверный формат результата оппонента, используй только числа.";
const INSERT_FAILED: &str = "Ошибка сохранения результата в БД.";

const OPPONENTS_PER_ROW: usize = 3;

/// Handle one recording turn for `conversation`.
///
/// `fresh_dispatch` is set when the turn came from a "record results" button rather than free
/// text. It discards whatever the previous flow collected and starts over at step 0.
pub async fn handle_turn(
    gateway: &PersistenceGateway,
    conversation: &mut ConversationState,
    text: &str,
    fresh_dispatch: bool,
) -> Result<Vec<Reply>, ServiceError> {
    let peer_id = conversation.peer_id;
    let step = conversation.recording.step();

    if fresh_dispatch && step != RecordingStep::PromptEventType {
        conversation.recording.restart();
        info!(peer_id, from_step = step.index(), "starting a new recording flow");
    }

    match conversation.recording.step() {
        RecordingStep::PromptEventType => {
            conversation.recording.advance()?;
            info!(peer_id, "recording: asked for event type");
            Ok(vec![Reply::with_keyboard(
                EVENT_TYPE_PROMPT,
                event_type_keyboard(),
            )])
        }
        RecordingStep::AwaitEventType => choose_event_type(gateway, conversation, text).await,
        RecordingStep::AwaitOpponent => choose_opponent(gateway, conversation, text).await,
        RecordingStep::AwaitFirstScore => {
            conversation.recording.draft.first_score_raw = Some(text.to_owned());
            conversation.recording.advance()?;
            info!(peer_id, "recording: own score captured");
            Ok(vec![
                Reply::text(format!("Твой результат: {text} ✅")),
                Reply::text(OPPONENT_SCORE_PROMPT),
            ])
        }
        RecordingStep::AwaitSecondScore => {
            conversation.recording.draft.second_score_raw = Some(text.to_owned());
            finish(gateway, conversation).await
        }
        RecordingStep::Completed => Ok(vec![Reply::text(ALREADY_SAVED)]),
    }
}

async fn choose_event_type(
    gateway: &PersistenceGateway,
    conversation: &mut ConversationState,
    text: &str,
) -> Result<Vec<Reply>, ServiceError> {
    let Some(event_type) = EventType::classify(text) else {
        return Ok(vec![Reply::with_keyboard(
            EVENT_TYPE_RETRY,
            event_type_keyboard(),
        )]);
    };

    conversation.recording.draft.event_type = Some(event_type);
    conversation.recording.advance()?;
    info!(
        peer_id = conversation.peer_id,
        event_type = ?event_type,
        "recording: event type saved"
    );

    let mut replies = vec![Reply::text(EVENT_TYPE_SAVED)];
    replies.push(opponent_prompt(gateway, conversation.peer_id).await);
    Ok(replies)
}

async fn choose_opponent(
    gateway: &PersistenceGateway,
    conversation: &mut ConversationState,
    text: &str,
) -> Result<Vec<Reply>, ServiceError> {
    let peer_id = conversation.peer_id;
    let usernames = match gateway.list_usernames().await {
        Ok(usernames) => usernames,
        Err(err) => {
            warn!(peer_id, error = %err, "recording: failed to list usernames");
            return Ok(vec![Reply::text(USERS_LIST_FAILED)]);
        }
    };

    let Some(opponent) = match_opponent(text, &usernames) else {
        return Ok(vec![Reply::with_keyboard(
            OPPONENT_RETRY,
            Keyboard::grid(usernames.iter().cloned(), OPPONENTS_PER_ROW),
        )]);
    };

    let opponent = opponent.to_owned();
    conversation.recording.draft.opponent = Some(opponent.clone());
    conversation.recording.advance()?;
    info!(peer_id, opponent = %opponent, "recording: opponent selected");

    Ok(vec![Reply::text(format!(
        "Ты выбрал: {opponent} ✅\nТеперь введи набранные OP:"
    ))])
}

/// Validate the collected draft and persist it; only full success completes the flow.
async fn finish(
    gateway: &PersistenceGateway,
    conversation: &mut ConversationState,
) -> Result<Vec<Reply>, ServiceError> {
    let peer_id = conversation.peer_id;

    let Some(user_id) = conversation.user_id else {
        warn!(peer_id, "recording: sender is not linked to a user row");
        return Ok(vec![Reply::text(UNRESOLVED_USER)]);
    };

    let draft = &conversation.recording.draft;
    let opponent_name = draft.opponent.clone().unwrap_or_default();
    let opponent = match gateway.find_user_by_username(&opponent_name).await {
        Lookup::Found(user) => user,
        Lookup::NotFound => {
            warn!(peer_id, opponent = %opponent_name, "recording: opponent vanished");
            return Ok(vec![Reply::text(OPPONENT_NOT_FOUND)]);
        }
        Lookup::Failed(err) => {
            warn!(peer_id, error = %err, "recording: opponent lookup failed");
            return Ok(vec![Reply::text(OPPONENT_LOOKUP_FAILED)]);
        }
    };

    let own_raw = draft.first_score_raw.as_deref().unwrap_or_default();
    let own_score = match parse_score(own_raw, ScoreSide::Own) {
        Ok(score) => score,
        Err(err) => {
            info!(peer_id, error = %err, "recording: rejected score");
            return Ok(vec![Reply::text(OWN_SCORE_INVALID)]);
        }
    };
    let opponent_raw = draft.second_score_raw.as_deref().unwrap_or_default();
    let opponent_score = match parse_score(opponent_raw, ScoreSide::Opponent) {
        Ok(score) => score,
        Err(err) => {
            info!(peer_id, error = %err, "recording: rejected score");
            return Ok(vec![Reply::text(OPPONENT_SCORE_INVALID)]);
        }
    };

    let now = OffsetDateTime::now_utc();
    let result = NewGameResult {
        game_type: draft.event_type.map(EventType::code).unwrap_or_default(),
        datetime: PrimitiveDateTime::new(now.date(), now.time()),
        first_user_id: user_id,
        second_user_id: opponent.id,
        first_user_op: own_score,
        second_user_op: opponent_score,
        first_user_tp: 0,
        second_user_tp: 0,
        first_user_roster: String::new(),
        second_user_roster: String::new(),
    };

    if let Err(err) = gateway.insert_result(result).await {
        warn!(peer_id, error = %err, "recording: failed to store result");
        return Ok(vec![Reply::text(INSERT_FAILED)]);
    }

    conversation.recording.advance()?;
    info!(
        peer_id,
        user_id,
        opponent_id = opponent.id,
        own_score,
        opponent_score,
        "recording: result stored"
    );

    Ok(vec![Reply::text(format!(
        "Результат сохранён ✅\nТвой результат: {own_score}\nРезультат оппонента ({}): {opponent_score}",
        opponent.username
    ))])
}

async fn opponent_prompt(gateway: &PersistenceGateway, peer_id: i64) -> Reply {
    match gateway.list_usernames().await {
        Ok(usernames) => {
            Reply::with_keyboard(OPPONENT_PROMPT, Keyboard::grid(usernames, OPPONENTS_PER_ROW))
        }
        Err(err) => {
            warn!(peer_id, error = %err, "recording: failed to list usernames");
            Reply::text(USERS_LIST_FAILED)
        }
    }
}

fn event_type_keyboard() -> Keyboard {
    Keyboard::new()
        .row()
        .button(Button::text("По договорённости", ButtonColor::Primary))
        .button(Button::text("Турнир", ButtonColor::Secondary))
}
