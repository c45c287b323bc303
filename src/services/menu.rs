use crate::dto::{
    keyboard::{Button, ButtonColor, Keyboard},
    message::Reply,
    payload::PayloadError,
};

use super::router::Action;

const ENTRIES: [(&str, Action, ButtonColor); 4] = [
    ("🏆 Мои результаты", Action::ShowResults, ButtonColor::Primary),
    ("✍️ Занести результаты", Action::RecordResults, ButtonColor::Positive),
    ("🔍 Найти игру", Action::FindGame, ButtonColor::Secondary),
    ("🎮 Создать игру", Action::CreateGame, ButtonColor::Positive),
];

/// Greeting with the inline main menu, one command button per row.
pub fn welcome(user_name: &str) -> Result<Reply, PayloadError> {
    let mut keyboard = Keyboard::inline();
    for (label, action, color) in ENTRIES {
        let Some(command) = action.command() else {
            continue;
        };
        keyboard = keyboard.row().button(Button::command(label, command, color)?);
    }
    Ok(Reply::with_keyboard(
        format!("👋 Привет! {user_name} Что хочешь сделать?"),
        keyboard,
    ))
}
