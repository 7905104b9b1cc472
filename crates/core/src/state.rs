//! Application state shared by front ends: the loaded library, the list
//! selections, the open form and the pending delete.

use thiserror::Error;
use tracing::{error, info, warn};

use crate::{
    backend::{Backend, BackendError},
    form::{FormError, GameForm, Submission},
    models::{Game, Statistics},
    pipeline::{ListQuery, SortMode, StatusFilter},
    similarity::find_similar,
};

/// Why a submission did not complete.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// Refused before reaching the backend.
    #[error(transparent)]
    Form(#[from] FormError),
    /// The backend call failed.
    #[error(transparent)]
    Backend(#[from] BackendError),
    /// The backend answered without error but reported no change.
    #[error("the backend rejected the change")]
    Rejected,
}

/// Which kind of change a completed submission made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitKind {
    /// A game was created.
    Added,
    /// A game was edited.
    Updated,
}

/// Result of a completed submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    /// Kind of change.
    pub kind: SubmitKind,
    /// Trimmed title that was saved.
    pub title: String,
}

/// Games and statistics fetched together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    /// Full library in backend order.
    pub games: Vec<Game>,
    /// Per-status counts.
    pub stats: Statistics,
}

/// Fetch games then statistics. Either failure fails the whole fetch.
pub async fn fetch_snapshot(backend: &dyn Backend) -> Result<Snapshot, BackendError> {
    let games = backend.load_games().await?;
    let stats = backend.get_statistics().await?;
    Ok(Snapshot { games, stats })
}

/// Everything a front end renders from.
#[derive(Debug, Default)]
pub struct AppState {
    games: Vec<Game>,
    stats: Statistics,
    query: ListQuery,
    form: Option<GameForm>,
    pending_delete: Option<i64>,
    version: Option<String>,
}

impl AppState {
    /// Empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Full library as last loaded.
    pub fn games(&self) -> &[Game] {
        &self.games
    }

    /// Statistics as last loaded.
    pub fn statistics(&self) -> &Statistics {
        &self.stats
    }

    /// Current list selections.
    pub fn query(&self) -> &ListQuery {
        &self.query
    }

    /// Backend version, once known.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Record the backend version.
    pub fn set_version(&mut self, version: impl Into<String>) {
        self.version = Some(version.into());
    }

    /// Look a game up by id.
    pub fn game(&self, id: i64) -> Option<&Game> {
        self.games.iter().find(|game| game.id == Some(id))
    }

    /// Replace the library with a fresh snapshot.
    pub fn apply_snapshot(&mut self, snapshot: Snapshot) {
        self.games = snapshot.games;
        self.stats = snapshot.stats;
    }

    /// Reload games and statistics. On failure the previous data stays.
    pub async fn reload(&mut self, backend: &dyn Backend) -> Result<(), BackendError> {
        match fetch_snapshot(backend).await {
            Ok(snapshot) => {
                info!(count = snapshot.games.len(), "Loaded games");
                self.apply_snapshot(snapshot);
                Ok(())
            }
            Err(err) => {
                error!("Failed to load games: {err}");
                Err(err)
            }
        }
    }

    /// The filtered and sorted list.
    pub fn visible(&self) -> Vec<Game> {
        self.query.apply(&self.games)
    }

    /// Select the status filter.
    pub fn set_filter(&mut self, filter: StatusFilter) {
        self.query.filter = filter;
    }

    /// Set the search text; stored trimmed and lowercased.
    pub fn set_search(&mut self, text: &str) {
        self.query.search = text.trim().to_lowercase();
    }

    /// Select the sort mode.
    pub fn set_sort(&mut self, mode: SortMode) {
        self.query.sort = mode;
    }

    /// Games whose titles resemble `query`, leaving out the game being edited.
    pub fn similar_titles(&self, query: &str) -> Vec<&Game> {
        let exclude = self.form.as_ref().and_then(GameForm::editing_id);
        find_similar(query, &self.games, exclude)
    }

    /// Open the form, blank or pre-filled from the game with `id`.
    pub fn open_form(&mut self, id: Option<i64>) -> &mut GameForm {
        let form = match id.and_then(|id| self.game(id)) {
            Some(game) => GameForm::edit(game),
            None => GameForm::new(),
        };
        self.form.insert(form)
    }

    /// The open form.
    pub fn form(&self) -> Option<&GameForm> {
        self.form.as_ref()
    }

    /// The open form, mutably.
    pub fn form_mut(&mut self) -> Option<&mut GameForm> {
        self.form.as_mut()
    }

    /// Discard the form and its scratch state.
    pub fn close_form(&mut self) -> Option<GameForm> {
        self.form.take()
    }

    /// Validate and lock the open form.
    pub fn begin_submit(&mut self) -> Result<Submission, SubmitError> {
        let form = self.form.as_mut().ok_or(FormError::NotOpen)?;
        Ok(form.begin_submit()?)
    }

    /// Settle a submission started with [`AppState::begin_submit`]. Success
    /// closes the form; anything else unlocks it with inputs intact.
    pub fn complete_submit(
        &mut self,
        submission: &Submission,
        result: Result<bool, BackendError>,
    ) -> Result<SubmitOutcome, SubmitError> {
        let failure = match result {
            Ok(true) => {
                self.form = None;
                let kind = if submission.is_update() {
                    SubmitKind::Updated
                } else {
                    SubmitKind::Added
                };
                info!(title = submission.title(), ?kind, "Saved game");
                return Ok(SubmitOutcome {
                    kind,
                    title: submission.title().to_string(),
                });
            }
            Ok(false) => {
                warn!(title = submission.title(), "Backend rejected the change");
                SubmitError::Rejected
            }
            Err(err) => {
                error!(title = submission.title(), "Failed to save game: {err}");
                SubmitError::Backend(err)
            }
        };
        if let Some(form) = self.form.as_mut() {
            form.finish_submit();
        }
        Err(failure)
    }

    /// Submit the open form, then reload the list on success.
    pub async fn submit(&mut self, backend: &dyn Backend) -> Result<SubmitOutcome, SubmitError> {
        let submission = self.begin_submit()?;
        let result = submission.send(backend).await;
        let saved = matches!(result, Ok(true));
        if saved {
            if let Err(err) = self.reload(backend).await {
                warn!("Reload after save failed: {err}");
            }
        }
        self.complete_submit(&submission, result)
    }

    /// Ask for confirmation before deleting the game with `id`.
    pub fn request_delete(&mut self, id: i64) {
        self.pending_delete = Some(id);
    }

    /// Id awaiting delete confirmation.
    pub fn pending_delete(&self) -> Option<i64> {
        self.pending_delete
    }

    /// Drop the pending delete.
    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Delete the pending game and reload. Returns the deleted title, or
    /// `None` when nothing was pending. The request stays pending on error.
    pub async fn confirm_delete(
        &mut self,
        backend: &dyn Backend,
    ) -> Result<Option<String>, BackendError> {
        let Some(id) = self.pending_delete else {
            return Ok(None);
        };
        let title = self
            .game(id)
            .map(|game| game.display_title().to_string())
            .unwrap_or_default();
        if let Err(err) = backend.delete_game(id).await {
            error!(id, "Failed to delete game: {err}");
            return Err(err);
        }
        self.pending_delete = None;
        if let Err(err) = self.reload(backend).await {
            warn!("Reload after delete failed: {err}");
        }
        Ok(Some(title))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::{
        backend::MemoryBackend,
        models::{GamePayload, GameStatus},
    };

    fn seeded() -> MemoryBackend {
        let game = |title: &str, status: GameStatus| Game {
            title: title.to_string(),
            status,
            ..Game::default()
        };
        MemoryBackend::with_games(vec![
            game("Halo 3", GameStatus::Completed),
            game("Halo Infinite", GameStatus::Playing),
            game("Doom", GameStatus::Planned),
        ])
    }

    /// Counts writes and can be told to fail reads.
    #[derive(Default)]
    struct FlakyBackend {
        inner: MemoryBackend,
        writes: AtomicUsize,
        fail_reads: AtomicBool,
    }

    #[async_trait]
    impl Backend for FlakyBackend {
        async fn load_games(&self) -> Result<Vec<Game>, BackendError> {
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(BackendError::Unavailable("offline".into()));
            }
            self.inner.load_games().await
        }

        async fn add_game(
            &self,
            payload: &GamePayload,
            screenshot: Option<String>,
        ) -> Result<bool, BackendError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.add_game(payload, screenshot).await
        }

        async fn update_game(
            &self,
            id: i64,
            payload: &GamePayload,
            screenshot: Option<String>,
        ) -> Result<bool, BackendError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.update_game(id, payload, screenshot).await
        }

        async fn delete_game(&self, id: i64) -> Result<bool, BackendError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.delete_game(id).await
        }

        async fn get_statistics(&self) -> Result<Statistics, BackendError> {
            self.inner.get_statistics().await
        }

        async fn get_version(&self) -> Result<String, BackendError> {
            self.inner.get_version().await
        }
    }

    #[tokio::test]
    async fn reload_fills_games_and_stats() -> Result<(), BackendError> {
        let backend = seeded();
        let mut state = AppState::new();
        state.reload(&backend).await?;
        assert_eq!(state.games().len(), 3);
        assert_eq!(state.statistics().total_games, 3);
        assert_eq!(state.statistics().playing, 1);
        Ok(())
    }

    #[tokio::test]
    async fn failed_reload_keeps_previous_list() -> Result<(), BackendError> {
        let backend = FlakyBackend {
            inner: seeded(),
            ..FlakyBackend::default()
        };
        let mut state = AppState::new();
        state.reload(&backend).await?;

        backend.fail_reads.store(true, Ordering::SeqCst);
        assert!(state.reload(&backend).await.is_err());
        assert_eq!(state.games().len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn visible_list_follows_selections() -> Result<(), BackendError> {
        let mut state = AppState::new();
        state.reload(&seeded()).await?;

        state.set_search("  HALO ");
        assert_eq!(state.query().search, "halo");
        state.set_sort(SortMode::TitleAsc);
        let titles: Vec<_> = state.visible().into_iter().map(|game| game.title).collect();
        assert_eq!(titles, vec!["Halo 3", "Halo Infinite"]);

        state.set_filter(StatusFilter::Only(GameStatus::Playing));
        assert_eq!(state.visible().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn similar_titles_skip_the_game_being_edited() -> Result<(), BackendError> {
        let mut state = AppState::new();
        state.reload(&seeded()).await?;
        assert_eq!(state.similar_titles("halo").len(), 2);

        let halo_id = state
            .games()
            .iter()
            .find(|game| game.title == "Halo 3")
            .and_then(|game| game.id);
        state.open_form(halo_id);
        let similar = state.similar_titles("halo");
        assert_eq!(similar.len(), 1);
        assert_eq!(similar[0].title, "Halo Infinite");
        Ok(())
    }

    #[tokio::test]
    async fn submit_adds_reloads_and_closes() -> Result<(), SubmitError> {
        let backend = seeded();
        let mut state = AppState::new();
        state.reload(&backend).await?;

        state.open_form(None).title = "  Quake ".to_string();
        let outcome = state.submit(&backend).await?;
        assert_eq!(outcome.kind, SubmitKind::Added);
        assert_eq!(outcome.title, "Quake");
        assert!(state.form().is_none());
        assert_eq!(state.games().len(), 4);
        Ok(())
    }

    #[tokio::test]
    async fn double_submit_reaches_backend_once() {
        let backend = FlakyBackend::default();
        let mut state = AppState::new();
        state.open_form(None).title = "Quake".to_string();

        let first = state.begin_submit().expect("first submit accepted");
        assert!(matches!(
            state.submit(&backend).await,
            Err(SubmitError::Form(FormError::AlreadySubmitting))
        ));

        let result = first.send(&backend).await;
        assert!(state.complete_submit(&first, result).is_ok());
        assert_eq!(backend.writes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_submit_keeps_form_and_unlocks() {
        let backend = MemoryBackend::new();
        let mut state = AppState::new();
        let form = state.open_form(None);
        form.title = "Ghost".to_string();

        let mut stray = GameForm::new();
        stray.title = "Ghost".to_string();
        let submission = Submission::Update {
            id: 99,
            payload: stray.payload().expect("title present"),
            screenshot: None,
        };
        state.begin_submit().expect("form accepted");
        let result = submission.send(&backend).await;
        assert!(matches!(
            state.complete_submit(&submission, result),
            Err(SubmitError::Backend(BackendError::NotFound(99)))
        ));

        let form = state.form().expect("form stays open");
        assert!(!form.is_submitting());
        assert_eq!(form.title, "Ghost");
    }

    #[tokio::test]
    async fn submit_without_form_is_refused() {
        let mut state = AppState::new();
        assert!(matches!(
            state.submit(&MemoryBackend::new()).await,
            Err(SubmitError::Form(FormError::NotOpen))
        ));
    }

    #[tokio::test]
    async fn delete_needs_confirmation() -> Result<(), BackendError> {
        let backend = seeded();
        let mut state = AppState::new();
        state.reload(&backend).await?;
        let doom = state
            .games()
            .iter()
            .find(|game| game.title == "Doom")
            .and_then(|game| game.id)
            .expect("seeded");

        assert_eq!(state.confirm_delete(&backend).await?, None);

        state.request_delete(doom);
        state.cancel_delete();
        assert_eq!(state.confirm_delete(&backend).await?, None);
        assert_eq!(state.games().len(), 3);

        state.request_delete(doom);
        assert_eq!(state.confirm_delete(&backend).await?, Some("Doom".to_string()));
        assert_eq!(state.pending_delete(), None);
        assert_eq!(state.games().len(), 2);
        assert_eq!(state.statistics().planned, 0);
        Ok(())
    }
}
