//! Create/edit form scratch state and the submission guard.

use std::path::Path;

use thiserror::Error;

use crate::{
    backend::{Backend, BackendError},
    models::{Game, GamePayload, GameStatus},
    screenshot::{DataUrl, ScreenshotChange, ScreenshotError},
};

/// Reasons a submission never reaches the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FormError {
    /// The trimmed title is empty.
    #[error("title is required")]
    TitleRequired,
    /// A previous submission has not resolved yet.
    #[error("a submission is already in progress")]
    AlreadySubmitting,
    /// No form is open.
    #[error("no form is open")]
    NotOpen,
}

/// Whether the form is waiting on the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmitPhase {
    /// Inputs enabled.
    #[default]
    Idle,
    /// Inputs locked until the backend answers.
    Submitting,
}

/// A validated request ready to be sent.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// Create a new game.
    Add {
        /// Fields to store.
        payload: GamePayload,
        /// Screenshot wire value for a create call.
        screenshot: Option<String>,
    },
    /// Update an existing game.
    Update {
        /// Game being edited.
        id: i64,
        /// Fields to store.
        payload: GamePayload,
        /// Screenshot wire value for an update call.
        screenshot: Option<String>,
    },
}

impl Submission {
    /// Title carried by the submission, used in confirmation messages.
    pub fn title(&self) -> &str {
        match self {
            Submission::Add { payload, .. } | Submission::Update { payload, .. } => &payload.title,
        }
    }

    /// Whether the submission edits an existing game.
    pub fn is_update(&self) -> bool {
        matches!(self, Submission::Update { .. })
    }

    /// Send the request.
    pub async fn send(&self, backend: &dyn Backend) -> Result<bool, BackendError> {
        match self {
            Submission::Add {
                payload,
                screenshot,
            } => backend.add_game(payload, screenshot.clone()).await,
            Submission::Update {
                id,
                payload,
                screenshot,
            } => backend.update_game(*id, payload, screenshot.clone()).await,
        }
    }
}

/// Editable copy of a game plus the screenshot scratch value.
#[derive(Debug, Clone, PartialEq)]
pub struct GameForm {
    editing_id: Option<i64>,
    /// Title input.
    pub title: String,
    /// Version input.
    pub version: String,
    /// Rating input as typed.
    pub rating: String,
    /// Selected status.
    pub status: GameStatus,
    /// Review input.
    pub review: String,
    /// Link input.
    pub game_link: String,
    screenshot: ScreenshotChange,
    stored_screenshot: Option<String>,
    phase: SubmitPhase,
}

impl Default for GameForm {
    fn default() -> Self {
        Self::new()
    }
}

impl GameForm {
    /// Blank form for a new game.
    pub fn new() -> Self {
        Self {
            editing_id: None,
            title: String::new(),
            version: String::new(),
            rating: "0".to_string(),
            status: GameStatus::Planned,
            review: String::new(),
            game_link: String::new(),
            screenshot: ScreenshotChange::Unchanged,
            stored_screenshot: None,
            phase: SubmitPhase::Idle,
        }
    }

    /// Form pre-filled from `game`.
    pub fn edit(game: &Game) -> Self {
        let rating = if game.rating_value() == 0.0 {
            "0".to_string()
        } else {
            game.rating_value().to_string()
        };
        Self {
            editing_id: game.id,
            title: game.title.clone(),
            version: game.version.clone(),
            rating,
            status: if game.status.is_known() {
                game.status.clone()
            } else {
                GameStatus::Planned
            },
            review: game.review.clone(),
            game_link: game.game_link.clone(),
            screenshot: ScreenshotChange::Unchanged,
            stored_screenshot: game.screenshot_data.clone().filter(|data| !data.is_empty()),
            phase: SubmitPhase::Idle,
        }
    }

    /// Id of the game being edited, `None` when creating.
    pub fn editing_id(&self) -> Option<i64> {
        self.editing_id
    }

    /// Whether the form edits an existing game.
    pub fn is_editing(&self) -> bool {
        self.editing_id.is_some()
    }

    /// Pending screenshot change.
    pub fn screenshot(&self) -> &ScreenshotChange {
        &self.screenshot
    }

    /// Image the form currently shows: the new one, nothing after removal,
    /// or the stored one when untouched.
    pub fn preview(&self) -> Option<&str> {
        match &self.screenshot {
            ScreenshotChange::Replace(data) => Some(data.as_str()),
            ScreenshotChange::Remove => None,
            ScreenshotChange::Unchanged => self.stored_screenshot.as_deref(),
        }
    }

    /// Attach an already encoded image.
    pub fn attach_screenshot(&mut self, data_url: String) {
        self.screenshot = ScreenshotChange::Replace(data_url);
    }

    /// Read an image file and attach it.
    pub fn attach_screenshot_file(
        &mut self,
        path: impl AsRef<Path>,
    ) -> Result<(), ScreenshotError> {
        let image = DataUrl::from_file(path)?;
        self.attach_screenshot(image.encode());
        Ok(())
    }

    /// Mark the stored image for removal.
    pub fn remove_screenshot(&mut self) {
        self.screenshot = ScreenshotChange::Remove;
    }

    /// Whether inputs are locked.
    pub fn is_submitting(&self) -> bool {
        self.phase == SubmitPhase::Submitting
    }

    /// Current submission phase.
    pub fn phase(&self) -> SubmitPhase {
        self.phase
    }

    /// Trimmed payload; fails when the title is empty.
    pub fn payload(&self) -> Result<GamePayload, FormError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(FormError::TitleRequired);
        }
        Ok(GamePayload {
            title: title.to_string(),
            version: self.version.trim().to_string(),
            status: self.status.clone(),
            rating: parse_rating(&self.rating),
            review: self.review.trim().to_string(),
            game_link: self.game_link.trim().to_string(),
        })
    }

    /// Validate and lock the form. A second call before
    /// [`GameForm::finish_submit`] is refused.
    pub fn begin_submit(&mut self) -> Result<Submission, FormError> {
        if self.is_submitting() {
            return Err(FormError::AlreadySubmitting);
        }
        let payload = self.payload()?;
        self.phase = SubmitPhase::Submitting;
        Ok(match self.editing_id {
            Some(id) => Submission::Update {
                id,
                payload,
                screenshot: self.screenshot.for_update(),
            },
            None => Submission::Add {
                payload,
                screenshot: self.screenshot.for_create(),
            },
        })
    }

    /// Unlock the form; entered data stays intact.
    pub fn finish_submit(&mut self) {
        self.phase = SubmitPhase::Idle;
    }
}

/// Rating text to number; anything unparseable is `0`.
pub fn parse_rating(input: &str) -> f64 {
    match input.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored_game() -> Game {
        Game {
            id: Some(7),
            title: "Outer Wilds".to_string(),
            version: "1.1".to_string(),
            rating: 9.0,
            status: GameStatus::Completed,
            screenshot_data: Some("data:image/png;base64,AA==".to_string()),
            ..Game::default()
        }
    }

    #[test]
    fn empty_title_is_rejected_without_locking() {
        let mut form = GameForm::new();
        form.title = "   ".to_string();
        assert_eq!(form.begin_submit(), Err(FormError::TitleRequired));
        assert!(!form.is_submitting());
    }

    #[test]
    fn payload_is_trimmed_and_rating_coerced() {
        let mut form = GameForm::new();
        form.title = "  Tunic ".to_string();
        form.version = " 1.0 ".to_string();
        form.rating = "nine".to_string();
        form.game_link = " https://tunicgame.com ".to_string();
        let payload = form.payload().unwrap();
        assert_eq!(payload.title, "Tunic");
        assert_eq!(payload.version, "1.0");
        assert_eq!(payload.rating, 0.0);
        assert_eq!(payload.game_link, "https://tunicgame.com");
        assert_eq!(payload.status, GameStatus::Planned);

        form.rating = " 7.5 ".to_string();
        assert_eq!(form.payload().unwrap().rating, 7.5);
    }

    #[test]
    fn second_submit_is_refused_until_finished() {
        let mut form = GameForm::new();
        form.title = "Tunic".to_string();
        assert!(form.begin_submit().is_ok());
        assert_eq!(form.begin_submit(), Err(FormError::AlreadySubmitting));
        form.finish_submit();
        assert!(form.begin_submit().is_ok());
    }

    #[test]
    fn untouched_screenshot_on_update_means_no_change() {
        let mut form = GameForm::edit(&stored_game());
        assert_eq!(form.preview(), Some("data:image/png;base64,AA=="));
        match form.begin_submit().unwrap() {
            Submission::Update { id, screenshot, .. } => {
                assert_eq!(id, 7);
                assert_eq!(screenshot, None);
            }
            other => panic!("unexpected submission {other:?}"),
        }
    }

    #[test]
    fn removed_screenshot_on_update_sends_empty_string() {
        let mut form = GameForm::edit(&stored_game());
        form.remove_screenshot();
        assert_eq!(form.preview(), None);
        match form.begin_submit().unwrap() {
            Submission::Update { screenshot, .. } => assert_eq!(screenshot, Some(String::new())),
            other => panic!("unexpected submission {other:?}"),
        }
    }

    #[test]
    fn new_screenshot_is_sent_verbatim() {
        let data = "data:image/webp;base64,UklGRg==".to_string();

        let mut form = GameForm::edit(&stored_game());
        form.attach_screenshot(data.clone());
        match form.begin_submit().unwrap() {
            Submission::Update { screenshot, .. } => assert_eq!(screenshot, Some(data.clone())),
            other => panic!("unexpected submission {other:?}"),
        }

        let mut form = GameForm::new();
        form.title = "Fez".to_string();
        form.attach_screenshot(data.clone());
        assert_eq!(
            form.begin_submit().unwrap(),
            Submission::Add {
                payload: GamePayload {
                    title: "Fez".to_string(),
                    ..GamePayload::default()
                },
                screenshot: Some(data),
            }
        );
    }

    #[test]
    fn create_without_image_sends_null() {
        let mut form = GameForm::new();
        form.title = "Fez".to_string();
        form.remove_screenshot();
        match form.begin_submit().unwrap() {
            Submission::Add { screenshot, .. } => assert_eq!(screenshot, None),
            other => panic!("unexpected submission {other:?}"),
        }
    }

    #[test]
    fn edit_copies_fields() {
        let form = GameForm::edit(&stored_game());
        assert!(form.is_editing());
        assert_eq!(form.title, "Outer Wilds");
        assert_eq!(form.rating, "9");
        assert_eq!(form.status, GameStatus::Completed);
    }
}
