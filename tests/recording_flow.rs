use std::{sync::Arc, time::Duration};

use futures::future::BoxFuture;
use tokio::sync::Mutex;

use gamebot::{
    dao::{gateway::PersistenceGateway, result_store::memory::MemoryResultStore},
    dto::{
        message::{IncomingMessage, Reply},
        payload::{decode_command_payload, encode_command_payload},
    },
    services::message_service::handle_message,
    state::{AppState, SharedState},
    transport::{Messenger, TransportError},
};

const PEER: i64 = 2_000_000_001;
const SENDER: i64 = 4242;

/// Collects replies instead of sending them; every sender is called "player_vk".
#[derive(Clone, Default)]
struct Outbox {
    sent: Arc<Mutex<Vec<Reply>>>,
}

impl Outbox {
    async fn take(&self) -> Vec<Reply> {
        std::mem::take(&mut *self.sent.lock().await)
    }
}

impl Messenger for Outbox {
    fn send(&self, _peer_id: i64, reply: Reply) -> BoxFuture<'static, Result<(), TransportError>> {
        let sent = self.sent.clone();
        Box::pin(async move {
            sent.lock().await.push(reply);
            Ok(())
        })
    }

    fn display_name(&self, _user_id: i64) -> BoxFuture<'static, Result<String, TransportError>> {
        Box::pin(async { Ok("player_vk".to_owned()) })
    }
}

struct Bot {
    store: MemoryResultStore,
    state: SharedState,
    outbox: Outbox,
}

impl Bot {
    async fn new() -> Self {
        let store = MemoryResultStore::new();
        store
            .insert_user("player", Some(SENDER), Some("player_vk"))
            .await;
        let gateway = PersistenceGateway::new(Arc::new(store.clone()), Duration::from_secs(2));
        Self {
            store,
            state: AppState::new(gateway),
            outbox: Outbox::default(),
        }
    }

    async fn say(&self, text: &str) -> Vec<String> {
        self.deliver(text, None).await
    }

    async fn press(&self, label: &str, command: &str) -> Vec<String> {
        let payload = encode_command_payload(command).unwrap();
        self.deliver(label, Some(payload)).await
    }

    async fn deliver(&self, text: &str, payload: Option<String>) -> Vec<String> {
        let message = IncomingMessage {
            peer_id: PEER,
            from_id: SENDER,
            text: text.to_owned(),
            payload,
        };
        handle_message(&self.state, &self.outbox, message).await;
        self.outbox
            .take()
            .await
            .into_iter()
            .map(|reply| reply.text)
            .collect()
    }

    async fn recording_step(&self) -> u8 {
        let (handle, _) = self.state.conversations().get_or_create(PEER);
        let step = handle.lock().await.recording.step().index();
        step
    }
}

#[tokio::test]
async fn records_a_game_end_to_end() {
    let bot = Bot::new().await;

    let menu = bot.say("начать").await;
    assert_eq!(menu, vec!["👋 Привет! player Что хочешь сделать?"]);
    assert_eq!(bot.recording_step().await, 0);

    let prompt = bot.press("✍️ Занести результаты", "recordResults").await;
    assert_eq!(prompt, vec!["Введите тип мероприятия"]);
    assert_eq!(bot.recording_step().await, 1);

    let saved = bot.say("Турнир").await;
    assert_eq!(saved, vec!["Тип события сохранён ✅", "Выбери пользователя:"]);
    assert_eq!(bot.recording_step().await, 2);

    let retry = bot.say("Unknown").await;
    assert_eq!(retry, vec!["Выбери пользователя с помощью кнопок 👇"]);
    assert_eq!(bot.recording_step().await, 2);

    let chosen = bot.say("danya").await;
    assert_eq!(chosen, vec!["Ты выбрал: danya ✅\nТеперь введи набранные OP:"]);

    bot.say("10").await;
    assert_eq!(bot.recording_step().await, 4);

    let done = bot.say("7").await;
    assert_eq!(
        done,
        vec!["Результат сохранён ✅\nТвой результат: 10\nРезультат оппонента (danya): 7"]
    );
    assert_eq!(bot.recording_step().await, 5);

    let rows = bot.store.results().await;
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!((row.first_user_op, row.second_user_op), (10, 7));
    assert_eq!((row.first_user_tp, row.second_user_tp), (0, 0));
    assert_eq!(row.game_type, 0);
    assert!(row.first_user_roster.is_empty());
    assert!(row.second_user_roster.is_empty());

    let listing = bot.press("🏆 Мои результаты", "results").await;
    assert_eq!(listing.len(), 1);
    assert!(listing[0].starts_with("📊 Твои последние результаты:\n"));
    assert!(listing[0].contains("— ты: 10, оппонент (danya): 7"));
}

#[tokio::test]
async fn start_phrase_never_moves_the_recording_counter() {
    let bot = Bot::new().await;
    bot.press("✍️ Занести результаты", "recordResults").await;
    bot.say("По договорённости").await;

    for phrase in ["начать", "start", "/start"] {
        let replies = bot.say(phrase).await;
        assert_eq!(replies.len(), 1);
        assert!(replies[0].starts_with("👋 Привет!"));
        assert_eq!(bot.recording_step().await, 2);
    }

    bot.say("mishka").await;
    assert_eq!(bot.recording_step().await, 3);
}

#[tokio::test]
async fn counter_moves_at_most_one_step_per_message() {
    let bot = Bot::new().await;
    let script: [(&str, Option<&str>); 15] = [
        ("", Some("recordResults")),
        ("дружеская", None),
        ("турнир", None),
        ("nobody", None),
        ("sergey", None),
        ("ten", None),
        ("3", None),
        ("3", None),
        ("ещё", None),
        // Pressing the button again is the way out of a flow that cannot complete.
        ("", Some("recordResults")),
        ("турнир", None),
        ("sergey", None),
        ("3", None),
        ("2", None),
        ("ещё", None),
    ];

    let mut previous = 0;
    for (text, command) in script {
        let payload = command.map(|command| encode_command_payload(command).unwrap());
        bot.deliver(text, payload).await;
        let step = bot.recording_step().await;
        if command.is_some() {
            assert_eq!(step, 1, "button press starts a new flow");
        } else {
            assert!(step == previous || step == previous + 1, "{previous} -> {step}");
        }
        previous = step;
    }

    assert_eq!(previous, 5);
    let rows = bot.store.results().await;
    assert_eq!(rows.len(), 1);
    assert_eq!((rows[0].first_user_op, rows[0].second_user_op), (3, 2));
}

#[tokio::test]
async fn unparsable_first_score_is_not_a_dead_end() {
    let bot = Bot::new().await;
    bot.press("✍️ Занести результаты", "recordResults").await;
    bot.say("Турнир").await;
    bot.say("danya").await;
    bot.say("ten").await;

    let rejected = bot.say("7").await;
    assert_eq!(
        rejected,
        vec!["Неверный формат результата, используй только числа."]
    );
    bot.say("начать").await;
    assert_eq!(bot.recording_step().await, 4);

    let restarted = bot.press("✍️ Занести результаты", "recordResults").await;
    assert_eq!(restarted, vec!["Введите тип мероприятия"]);
    bot.say("Турнир").await;
    bot.say("danya").await;
    bot.say("10").await;
    let done = bot.say("7").await;

    assert_eq!(
        done,
        vec!["Результат сохранён ✅\nТвой результат: 10\nРезультат оппонента (danya): 7"]
    );
    assert_eq!(bot.recording_step().await, 5);
    assert_eq!(bot.store.results().await.len(), 1);
}

#[tokio::test]
async fn menu_payloads_decode_back_to_commands() {
    let bot = Bot::new().await;
    let message = IncomingMessage {
        peer_id: PEER,
        from_id: SENDER,
        text: "start".to_owned(),
        payload: None,
    };
    handle_message(&bot.state, &bot.outbox, message).await;

    let replies = bot.outbox.take().await;
    let keyboard = replies[0].keyboard.as_ref().unwrap();
    let commands: Vec<String> = keyboard
        .buttons
        .iter()
        .flatten()
        .filter_map(|button| decode_command_payload(button.action.payload.as_deref()).unwrap())
        .collect();
    assert_eq!(
        commands,
        vec!["results", "recordResults", "find_game", "create_game"]
    );
}
