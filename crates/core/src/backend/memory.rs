use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::info;

use super::{order_for_listing, Backend, BackendError, VERSION};
use crate::{
    models::{now_timestamp, Game, GamePayload, GameStatus, Statistics},
    screenshot::ScreenshotChange,
};

/// Thread-safe in-memory backend.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Default)]
struct Inner {
    games: Vec<Game>,
    next_id: i64,
}

impl MemoryBackend {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `games`. Records without an id get one.
    pub fn with_games(games: Vec<Game>) -> Self {
        let mut inner = Inner::default();
        inner.next_id = games.iter().filter_map(|game| game.id).max().unwrap_or(0);
        for mut game in games {
            if game.id.is_none() {
                inner.next_id += 1;
                game.id = Some(inner.next_id);
            }
            inner.games.push(game);
        }
        Self {
            inner: Arc::new(RwLock::new(inner)),
        }
    }

    /// A small sample library used by `--demo` runs.
    pub fn demo() -> Self {
        let sample = |title: &str, version: &str, status: GameStatus, rating: f64, created: &str| {
            Game {
                id: None,
                title: title.to_string(),
                version: version.to_string(),
                status,
                rating,
                created_at: Some(created.to_string()),
                ..Game::default()
            }
        };

        let mut hollow = sample(
            "Hollow Knight",
            "1.5",
            GameStatus::Completed,
            9.5,
            "2024-01-12 18:30:00",
        );
        hollow.review = "Tight combat, huge map.".to_string();
        hollow.game_link = "https://hollowknight.com".to_string();

        let mut disco = sample(
            "Disco Elysium",
            "Final Cut",
            GameStatus::Planned,
            0.0,
            "2024-04-20 12:00:00",
        );
        disco.game_link = "https://discoelysium.com".to_string();

        let mut stranding = sample(
            "Death Stranding",
            "Director's Cut",
            GameStatus::Dropped,
            6.0,
            "2023-08-14 09:45:00",
        );
        stranding.review = "Too much walking.".to_string();

        Self::with_games(vec![
            hollow,
            sample("Halo 3", "", GameStatus::Completed, 8.0, "2023-11-02 20:00:00"),
            sample(
                "Halo Infinite",
                "Season 5",
                GameStatus::Playing,
                0.0,
                "2024-03-08 21:15:00",
            ),
            disco,
            stranding,
        ])
    }

    fn stamp_now(game: &mut Game) {
        let now = now_timestamp();
        if game.created_at.is_none() {
            game.created_at = Some(now.clone());
        }
        game.updated_at = Some(now);
    }
}

fn apply_payload(game: &mut Game, payload: &GamePayload) {
    game.title = payload.title.clone();
    game.version = payload.version.clone();
    game.status = payload.status.clone();
    game.rating = payload.rating;
    game.review = payload.review.clone();
    game.game_link = payload.game_link.clone();
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn load_games(&self) -> Result<Vec<Game>, BackendError> {
        let mut games = self.inner.read().games.clone();
        order_for_listing(&mut games);
        Ok(games)
    }

    async fn add_game(
        &self,
        payload: &GamePayload,
        screenshot: Option<String>,
    ) -> Result<bool, BackendError> {
        let mut inner = self.inner.write();
        inner.next_id += 1;
        let mut game = Game {
            id: Some(inner.next_id),
            screenshot_data: ScreenshotChange::from_wire(screenshot.as_deref()).for_create(),
            ..Game::default()
        };
        apply_payload(&mut game, payload);
        Self::stamp_now(&mut game);
        info!(id = inner.next_id, title = %payload.title, "Added game");
        inner.games.push(game);
        Ok(true)
    }

    async fn update_game(
        &self,
        id: i64,
        payload: &GamePayload,
        screenshot: Option<String>,
    ) -> Result<bool, BackendError> {
        let mut inner = self.inner.write();
        let game = inner
            .games
            .iter_mut()
            .find(|game| game.id == Some(id))
            .ok_or(BackendError::NotFound(id))?;
        apply_payload(game, payload);
        match ScreenshotChange::from_wire(screenshot.as_deref()) {
            ScreenshotChange::Unchanged => {}
            ScreenshotChange::Remove => game.screenshot_data = None,
            ScreenshotChange::Replace(data) => game.screenshot_data = Some(data),
        }
        Self::stamp_now(game);
        info!(id, "Updated game");
        Ok(true)
    }

    async fn delete_game(&self, id: i64) -> Result<bool, BackendError> {
        let mut inner = self.inner.write();
        inner.games.retain(|game| game.id != Some(id));
        info!(id, "Deleted game");
        Ok(true)
    }

    async fn get_statistics(&self) -> Result<Statistics, BackendError> {
        Ok(Statistics::tally(self.inner.read().games.iter()))
    }

    async fn get_version(&self) -> Result<String, BackendError> {
        Ok(VERSION.to_string())
    }
}
