use time::PrimitiveDateTime;

/// Row of the `users` table.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "postgres-store", derive(sqlx::FromRow))]
pub struct UserEntity {
    /// Primary key.
    pub id: i32,
    /// Unique display name shown in keyboards and listings.
    pub username: String,
    /// Numeric VK id, once known.
    pub vk_id: Option<i64>,
    /// VK screen name (or "First Last"), once known.
    pub vk_username: Option<String>,
}

/// Row of the `results` table.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "postgres-store", derive(sqlx::FromRow))]
pub struct GameResultEntity {
    /// Primary key.
    pub id: i32,
    /// Event type code (0 = tournament, 1 = by arrangement).
    pub game_type: i32,
    /// When the game was recorded (UTC, no offset stored).
    pub datetime: PrimitiveDateTime,
    /// User who recorded the result.
    pub first_user_id: i32,
    /// Opponent selected during recording.
    pub second_user_id: i32,
    /// Score (OP) of the first player.
    pub first_user_op: i32,
    /// Score (OP) of the second player.
    pub second_user_op: i32,
    /// Tonnage points of the first player.
    pub first_user_tp: i32,
    /// Tonnage points of the second player.
    pub second_user_tp: i32,
    /// Free-text roster of the first player.
    pub first_user_roster: String,
    /// Free-text roster of the second player.
    pub second_user_roster: String,
}

/// Full ten-field insertion form used by the recording flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGameResult {
    /// Event type code.
    pub game_type: i32,
    /// Recording time.
    pub datetime: PrimitiveDateTime,
    /// Recording user.
    pub first_user_id: i32,
    /// Opponent.
    pub second_user_id: i32,
    /// First player's OP.
    pub first_user_op: i32,
    /// Second player's OP.
    pub second_user_op: i32,
    /// First player's TP.
    pub first_user_tp: i32,
    /// Second player's TP.
    pub second_user_tp: i32,
    /// First player's roster text.
    pub first_user_roster: String,
    /// Second player's roster text.
    pub second_user_roster: String,
}

/// Seven-field insertion form for callers that do not collect rosters or event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewMinimalResult {
    /// Recording time.
    pub datetime: PrimitiveDateTime,
    /// Recording user.
    pub first_user_id: i32,
    /// First player's TP.
    pub first_user_tp: i32,
    /// First player's OP.
    pub first_user_op: i32,
    /// Opponent.
    pub second_user_id: i32,
    /// Second player's TP.
    pub second_user_tp: i32,
    /// Second player's OP.
    pub second_user_op: i32,
}

impl From<NewMinimalResult> for NewGameResult {
    fn from(value: NewMinimalResult) -> Self {
        Self {
            game_type: 0,
            datetime: value.datetime,
            first_user_id: value.first_user_id,
            second_user_id: value.second_user_id,
            first_user_op: value.first_user_op,
            second_user_op: value.second_user_op,
            first_user_tp: value.first_user_tp,
            second_user_tp: value.second_user_tp,
            first_user_roster: String::new(),
            second_user_roster: String::new(),
        }
    }
}

impl GameResultEntity {
    /// Build the stored row for `result` under the assigned primary key.
    pub fn from_new(id: i32, result: NewGameResult) -> Self {
        Self {
            id,
            game_type: result.game_type,
            datetime: result.datetime,
            first_user_id: result.first_user_id,
            second_user_id: result.second_user_id,
            first_user_op: result.first_user_op,
            second_user_op: result.second_user_op,
            first_user_tp: result.first_user_tp,
            second_user_tp: result.second_user_tp,
            first_user_roster: result.first_user_roster,
            second_user_roster: result.second_user_roster,
        }
    }
}

/// Usernames inserted once when the schema is first prepared.
pub const SEED_USERNAMES: [&str; 5] = ["rezonov", "mishka", "andrew", "sergey", "danya"];
