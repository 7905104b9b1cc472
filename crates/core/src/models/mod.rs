//! Shared domain models.

use std::{fmt, str::FromStr};

use chrono::{NaiveDate, NaiveDateTime, Utc};
use serde::{de::IgnoredAny, Deserialize, Deserializer, Serialize, Serializer};

/// Wire format used by the backend for `created_at` / `updated_at` (naive UTC).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const DISPLAY_LINK_LIMIT: usize = 30;
const DISPLAY_LINK_KEEP: usize = 27;

/// Completion status of a tracked game.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum GameStatus {
    /// Currently being played.
    Playing,
    /// On the backlog.
    #[default]
    Planned,
    /// Finished.
    Completed,
    /// Abandoned.
    Dropped,
    /// Any other value received from the backend, kept verbatim.
    Unknown(String),
}

impl GameStatus {
    /// The four statuses a user can pick, in the order the UI lists them.
    pub const KNOWN: [GameStatus; 4] = [
        GameStatus::Playing,
        GameStatus::Planned,
        GameStatus::Completed,
        GameStatus::Dropped,
    ];

    /// Wire representation.
    pub fn as_str(&self) -> &str {
        match self {
            GameStatus::Playing => "playing",
            GameStatus::Planned => "planned",
            GameStatus::Completed => "completed",
            GameStatus::Dropped => "dropped",
            GameStatus::Unknown(raw) => raw.as_str(),
        }
    }

    /// Whether the status is one of the four known values.
    pub fn is_known(&self) -> bool {
        !matches!(self, GameStatus::Unknown(_))
    }

    /// Next known status in [`GameStatus::KNOWN`] order, wrapping around.
    /// Unknown values step to `planned`.
    pub fn cycle(&self, delta: isize) -> GameStatus {
        let len = Self::KNOWN.len() as isize;
        let Some(idx) = Self::KNOWN.iter().position(|status| status == self) else {
            return GameStatus::Planned;
        };
        let next = (idx as isize + delta).rem_euclid(len) as usize;
        Self::KNOWN[next].clone()
    }
}

impl From<&str> for GameStatus {
    fn from(value: &str) -> Self {
        match value.trim() {
            "playing" => GameStatus::Playing,
            "planned" => GameStatus::Planned,
            "completed" => GameStatus::Completed,
            "dropped" => GameStatus::Dropped,
            other => GameStatus::Unknown(other.to_string()),
        }
    }
}

impl FromStr for GameStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(GameStatus::from(s))
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for GameStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for GameStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(match raw.as_deref().map(str::trim) {
            None | Some("") => GameStatus::Planned,
            Some(value) => GameStatus::from(value),
        })
    }
}

/// One tracked title as returned by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Game {
    /// Backend-assigned identifier; `None` for unsaved records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Game title.
    #[serde(default, deserialize_with = "nullable_string")]
    pub title: String,
    /// Legacy alternate title, consulted only when `title` is empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Edition or version label.
    #[serde(default, deserialize_with = "nullable_string")]
    pub version: String,
    /// User rating, `0.0` meaning unrated.
    #[serde(default, deserialize_with = "lenient_rating")]
    pub rating: f64,
    /// Completion status.
    #[serde(default)]
    pub status: GameStatus,
    /// Free-form review text.
    #[serde(default, deserialize_with = "nullable_string")]
    pub review: String,
    /// Link to the game's page.
    #[serde(default, deserialize_with = "nullable_string")]
    pub game_link: String,
    /// Screenshot as a data URL; empty or `None` when there is no image.
    #[serde(default)]
    pub screenshot_data: Option<String>,
    /// Creation timestamp in [`TIMESTAMP_FORMAT`].
    #[serde(default)]
    pub created_at: Option<String>,
    /// Last update timestamp in [`TIMESTAMP_FORMAT`].
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Game {
    /// Title used for display and matching: `title`, then `name`, then empty.
    pub fn display_title(&self) -> &str {
        if !self.title.is_empty() {
            return &self.title;
        }
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => "",
        }
    }

    /// Rating normalised for sorting and display.
    pub fn rating_value(&self) -> f64 {
        if self.rating.is_finite() {
            self.rating
        } else {
            0.0
        }
    }

    /// Whether the game carries a rating.
    pub fn is_rated(&self) -> bool {
        self.rating_value() != 0.0
    }

    /// Whether a screenshot is attached.
    pub fn has_screenshot(&self) -> bool {
        self.screenshot_data
            .as_deref()
            .map(|value| !value.is_empty())
            .unwrap_or(false)
    }

    /// Parsed creation time.
    pub fn created(&self) -> Option<NaiveDateTime> {
        self.created_at.as_deref().and_then(parse_timestamp)
    }

    /// Parsed update time.
    pub fn updated(&self) -> Option<NaiveDateTime> {
        self.updated_at.as_deref().and_then(parse_timestamp)
    }

    /// Most recent touch: `updated_at` if present, otherwise `created_at`.
    ///
    /// Presence is judged on the raw field, so an unparseable `updated_at`
    /// does not fall through to `created_at`.
    pub fn last_touched(&self) -> Option<NaiveDateTime> {
        match non_empty(self.updated_at.as_deref()) {
            Some(raw) => parse_timestamp(raw),
            None => self.created(),
        }
    }

    /// Link shortened for card display.
    pub fn display_link(&self) -> String {
        display_link(&self.game_link)
    }

    /// Copy of the editable fields as a submission payload.
    pub fn to_payload(&self) -> GamePayload {
        GamePayload {
            title: self.title.clone(),
            version: self.version.clone(),
            status: self.status.clone(),
            rating: self.rating_value(),
            review: self.review.clone(),
            game_link: self.game_link.clone(),
        }
    }
}

/// Editable fields sent to the backend on create and update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GamePayload {
    /// Trimmed, non-empty title.
    pub title: String,
    /// Version label.
    #[serde(default)]
    pub version: String,
    /// Completion status.
    #[serde(default)]
    pub status: GameStatus,
    /// Rating, `0.0` when unrated.
    #[serde(default)]
    pub rating: f64,
    /// Review text.
    #[serde(default)]
    pub review: String,
    /// Link to the game's page.
    #[serde(default)]
    pub game_link: String,
}

/// Aggregate counters reported by the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    /// Number of tracked games.
    #[serde(default, alias = "total")]
    pub total_games: u64,
    /// Completed games.
    #[serde(default)]
    pub completed: u64,
    /// Games in progress.
    #[serde(default)]
    pub playing: u64,
    /// Planned games.
    #[serde(default)]
    pub planned: u64,
    /// Dropped games.
    #[serde(default)]
    pub dropped: u64,
}

impl Statistics {
    /// Count shown next to a status filter.
    pub fn count_for(&self, status: &GameStatus) -> u64 {
        match status {
            GameStatus::Playing => self.playing,
            GameStatus::Planned => self.planned,
            GameStatus::Completed => self.completed,
            GameStatus::Dropped => self.dropped,
            GameStatus::Unknown(_) => 0,
        }
    }

    /// Tally a collection; used by backends, never by the list pipeline.
    pub fn tally<'a>(games: impl IntoIterator<Item = &'a Game>) -> Self {
        let mut stats = Statistics::default();
        for game in games {
            stats.total_games += 1;
            match game.status {
                GameStatus::Playing => stats.playing += 1,
                GameStatus::Planned => stats.planned += 1,
                GameStatus::Completed => stats.completed += 1,
                GameStatus::Dropped => stats.dropped += 1,
                GameStatus::Unknown(_) => {}
            }
        }
        stats
    }
}

/// Parse a backend timestamp. Accepts the space-separated wire format, ISO
/// `T`-separated values with an optional trailing `Z`, and bare dates.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let normalized = trimmed.strip_suffix('Z').unwrap_or(trimmed).replacen('T', " ", 1);
    if let Ok(value) = NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(value);
    }
    if let Ok(value) = NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%d %H:%M") {
        return Some(value);
    }
    NaiveDate::parse_from_str(&normalized, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Current time in the backend wire format.
pub fn now_timestamp() -> String {
    Utc::now().naive_utc().format(TIMESTAMP_FORMAT).to_string()
}

/// Strip the scheme from a link and shorten it for display.
pub fn display_link(link: &str) -> String {
    if link.is_empty() {
        return String::new();
    }
    let text = link.replace("https://", "").replace("http://", "");
    if text.chars().count() > DISPLAY_LINK_LIMIT {
        let head: String = text.chars().take(DISPLAY_LINK_KEEP).collect();
        format!("{head}...")
    } else {
        text
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|raw| !raw.trim().is_empty())
}

fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawRating {
    Number(f64),
    Text(String),
    Other(IgnoredAny),
}

fn lenient_rating<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<RawRating> = Option::deserialize(deserializer)?;
    let value = match raw {
        Some(RawRating::Number(value)) => value,
        Some(RawRating::Text(text)) => text.trim().parse::<f64>().unwrap_or(0.0),
        Some(RawRating::Other(_)) | None => 0.0,
    };
    Ok(if value.is_finite() { value } else { 0.0 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rating_coerces_to_zero() {
        let game: Game = serde_json::from_value(json!({
            "id": 1, "title": "A", "rating": "not a number"
        }))
        .unwrap();
        assert_eq!(game.rating, 0.0);

        let game: Game = serde_json::from_value(json!({"title": "A", "rating": null})).unwrap();
        assert_eq!(game.rating, 0.0);

        let game: Game = serde_json::from_value(json!({"title": "A", "rating": "7.5"})).unwrap();
        assert_eq!(game.rating, 7.5);

        let game: Game = serde_json::from_value(json!({"title": "A", "rating": true})).unwrap();
        assert!(!game.is_rated());
    }

    #[test]
    fn unknown_status_is_preserved() {
        let game: Game =
            serde_json::from_value(json!({"title": "A", "status": "archived"})).unwrap();
        assert_eq!(game.status, GameStatus::Unknown("archived".to_string()));
        assert!(!game.status.is_known());
        assert_eq!(serde_json::to_value(&game.status).unwrap(), json!("archived"));

        let game: Game = serde_json::from_value(json!({"title": "A", "status": null})).unwrap();
        assert_eq!(game.status, GameStatus::Planned);
    }

    #[test]
    fn null_text_fields_become_empty() {
        let game: Game = serde_json::from_value(json!({
            "id": 4, "title": null, "name": "Legacy", "version": null, "review": null
        }))
        .unwrap();
        assert_eq!(game.title, "");
        assert_eq!(game.display_title(), "Legacy");
        assert_eq!(game.version, "");
    }

    #[test]
    fn parses_wire_and_iso_timestamps() {
        let wire = parse_timestamp("2024-03-05 10:20:30").unwrap();
        assert_eq!(wire.format(TIMESTAMP_FORMAT).to_string(), "2024-03-05 10:20:30");
        assert_eq!(parse_timestamp("2024-03-05T10:20:30Z"), Some(wire));
        assert!(parse_timestamp("1970-01-01").is_some());
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("  ").is_none());
    }

    #[test]
    fn last_touched_prefers_update_time() {
        let game = Game {
            created_at: Some("2024-01-01 00:00:00".to_string()),
            updated_at: Some("2024-02-01 00:00:00".to_string()),
            ..Game::default()
        };
        assert_eq!(game.last_touched(), parse_timestamp("2024-02-01 00:00:00"));

        let game = Game {
            created_at: Some("2024-01-01 00:00:00".to_string()),
            ..Game::default()
        };
        assert_eq!(game.last_touched(), parse_timestamp("2024-01-01 00:00:00"));
    }

    #[test]
    fn display_link_strips_scheme_and_truncates() {
        assert_eq!(display_link("https://example.com"), "example.com");
        let long = "https://store.example.com/app/123456/some-long-game-name";
        let shown = display_link(long);
        assert!(shown.ends_with("..."));
        assert_eq!(shown.chars().count(), 30);
        assert_eq!(display_link(""), "");
    }

    #[test]
    fn statistics_accept_total_alias() {
        let stats: Statistics = serde_json::from_value(json!({"total": 3, "playing": 1})).unwrap();
        assert_eq!(stats.total_games, 3);
        assert_eq!(stats.count_for(&GameStatus::Playing), 1);
        assert_eq!(stats.completed, 0);
    }

    #[test]
    fn status_cycles_through_known_values() {
        assert_eq!(GameStatus::Dropped.cycle(1), GameStatus::Playing);
        assert_eq!(GameStatus::Playing.cycle(-1), GameStatus::Dropped);
        assert_eq!(GameStatus::Unknown("x".into()).cycle(1), GameStatus::Planned);
    }
}
