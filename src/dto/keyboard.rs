//! Reply keyboards in the shape the VK messages API expects.

use serde::Serialize;

use crate::dto::payload::{PayloadError, encode_command_payload};

/// Visual style of a keyboard button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonColor {
    /// Blue.
    Primary,
    /// White.
    Secondary,
    /// Green.
    Positive,
    /// Red.
    Negative,
}

/// Action attached to a button; only text buttons are used by the bot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ButtonAction {
    /// Action type; always `text` here.
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Caption, also sent as the message text on press.
    pub label: String,
    /// Already-encoded payload echoed back by the platform when the button is pressed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
}

/// A single keyboard button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Button {
    /// What pressing the button sends.
    pub action: ButtonAction,
    /// Button style.
    pub color: ButtonColor,
}

impl Button {
    /// Plain text button: pressing it sends `label` as the message text.
    pub fn text(label: impl Into<String>, color: ButtonColor) -> Self {
        Self {
            action: ButtonAction {
                kind: "text",
                label: label.into(),
                payload: None,
            },
            color,
        }
    }

    /// Text button that also carries a routed command.
    pub fn command(
        label: impl Into<String>,
        command: &str,
        color: ButtonColor,
    ) -> Result<Self, PayloadError> {
        let mut button = Self::text(label, color);
        button.action.payload = Some(encode_command_payload(command)?);
        Ok(button)
    }
}

#[cfg(test)]
impl Button {
    pub(crate) fn label(&self) -> &str {
        &self.action.label
    }
}

/// Rows of buttons attached to an outgoing message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Keyboard {
    /// Hide the keyboard after the first press.
    pub one_time: bool,
    /// Attach to the message instead of the input field.
    pub inline: bool,
    /// Button rows, top to bottom.
    pub buttons: Vec<Vec<Button>>,
}

impl Keyboard {
    /// Keyboard shown under the input field.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keyboard attached to the message bubble itself.
    pub fn inline() -> Self {
        Self {
            inline: true,
            ..Self::default()
        }
    }

    /// Start a new row.
    pub fn row(mut self) -> Self {
        self.buttons.push(Vec::new());
        self
    }

    /// Append a button to the last row, opening one if none exists yet.
    pub fn button(mut self, button: Button) -> Self {
        match self.buttons.last_mut() {
            Some(row) => row.push(button),
            None => self.buttons.push(vec![button]),
        }
        self
    }

    /// Lay `labels` out as secondary text buttons, `per_row` to a row.
    pub fn grid<I, S>(labels: I, per_row: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let per_row = per_row.max(1);
        labels
            .into_iter()
            .enumerate()
            .fold(Self::new(), |keyboard, (index, label)| {
                let keyboard = if index % per_row == 0 {
                    keyboard.row()
                } else {
                    keyboard
                };
                keyboard.button(Button::text(label, ButtonColor::Secondary))
            })
    }

    /// Serialize to the JSON string expected by `messages.send`.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
impl Keyboard {
    /// Labels of every button, row by row.
    pub(crate) fn labels(&self) -> Vec<Vec<&str>> {
        self.buttons
            .iter()
            .map(|row| row.iter().map(Button::label).collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_batches_three_per_row() {
        let keyboard = Keyboard::grid(["a", "b", "c", "d", "e"], 3);
        assert_eq!(keyboard.labels(), vec![vec!["a", "b", "c"], vec!["d", "e"]]);
    }

    #[test]
    fn serializes_in_platform_shape() {
        let keyboard = Keyboard::inline()
            .row()
            .button(Button::command("Go", "results", ButtonColor::Primary).unwrap());
        let json: serde_json::Value = serde_json::from_str(&keyboard.to_json().unwrap()).unwrap();

        assert_eq!(json["inline"], true);
        assert_eq!(json["one_time"], false);
        let button = &json["buttons"][0][0];
        assert_eq!(button["color"], "primary");
        assert_eq!(button["action"]["type"], "text");
        assert_eq!(button["action"]["label"], "Go");
        assert_eq!(
            button["action"]["payload"],
            r#""{\"command\":\"results\"}""#
        );
    }

    #[test]
    fn plain_buttons_omit_payload() {
        let keyboard = Keyboard::new().button(Button::text("Турнир", ButtonColor::Secondary));
        let json: serde_json::Value = serde_json::from_str(&keyboard.to_json().unwrap()).unwrap();
        assert!(json["buttons"][0][0]["action"].get("payload").is_none());
    }
}
