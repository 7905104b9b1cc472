//! Backend collaborator: the persistence service behind the game list.

/// Records and screenshots kept under a local data directory.
pub mod local;
/// In-process store for tests and demo runs.
pub mod memory;

use std::cmp::Reverse;

use async_trait::async_trait;
use thiserror::Error;

use crate::{
    models::{Game, GamePayload, GameStatus, Statistics},
    screenshot::ScreenshotError,
};

pub use local::LocalBackend;
pub use memory::MemoryBackend;

/// Failure reported by a backend call.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Filesystem access failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Stored data could not be (de)serialised.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// No game with this id exists.
    #[error("game {0} not found")]
    NotFound(i64),
    /// The screenshot payload could not be handled.
    #[error(transparent)]
    Screenshot(#[from] ScreenshotError),
    /// The backend refused the call.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Operations the front end invokes on the persistence service.
///
/// Screenshot arguments follow the tri-state wire convention: `None` keeps
/// the stored image, `Some("")` removes it, any other value replaces it.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Every stored game.
    async fn load_games(&self) -> Result<Vec<Game>, BackendError>;
    /// Create a game; the backend assigns id and timestamps.
    async fn add_game(
        &self,
        payload: &GamePayload,
        screenshot: Option<String>,
    ) -> Result<bool, BackendError>;
    /// Overwrite the editable fields of game `id`.
    async fn update_game(
        &self,
        id: i64,
        payload: &GamePayload,
        screenshot: Option<String>,
    ) -> Result<bool, BackendError>;
    /// Delete game `id` together with its screenshot.
    async fn delete_game(&self, id: i64) -> Result<bool, BackendError>;
    /// Aggregate counters.
    async fn get_statistics(&self) -> Result<Statistics, BackendError>;
    /// Backend version string.
    async fn get_version(&self) -> Result<String, BackendError>;
}

/// Version reported by the bundled backends.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Order used by `load_games`: by status group, then newest first.
pub(crate) fn order_for_listing(games: &mut [Game]) {
    games.sort_by_key(|game| (status_rank(&game.status), Reverse(game.created())));
}

fn status_rank(status: &GameStatus) -> u8 {
    match status {
        GameStatus::Playing => 1,
        GameStatus::Completed => 2,
        GameStatus::Planned => 3,
        GameStatus::Dropped => 4,
        GameStatus::Unknown(_) => 5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_groups_by_status_then_newest() {
        let make = |id: i64, status: GameStatus, created: &str| Game {
            id: Some(id),
            title: format!("Game {id}"),
            status,
            created_at: Some(created.to_string()),
            ..Game::default()
        };
        let mut games = vec![
            make(1, GameStatus::Dropped, "2024-01-01 00:00:00"),
            make(2, GameStatus::Planned, "2024-01-01 00:00:00"),
            make(3, GameStatus::Playing, "2023-01-01 00:00:00"),
            make(4, GameStatus::Planned, "2024-06-01 00:00:00"),
            make(5, GameStatus::Completed, "2024-01-01 00:00:00"),
        ];
        order_for_listing(&mut games);
        let ids: Vec<_> = games.iter().filter_map(|game| game.id).collect();
        assert_eq!(ids, vec![3, 5, 4, 2, 1]);
    }
}
