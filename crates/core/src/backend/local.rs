use std::{
    fs,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{order_for_listing, Backend, BackendError, VERSION};
use crate::{
    models::{now_timestamp, Game, GamePayload, Statistics},
    screenshot::{mime_for_extension, DataUrl, ScreenshotChange},
};

const STORE_FILE: &str = "games.json";
const SCREENSHOT_DIR: &str = "screenshots";
const MAX_FILENAME_CHARS: usize = 100;

/// Backend persisting records as JSON and screenshots as image files.
pub struct LocalBackend {
    root: PathBuf,
    lock: Mutex<()>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Store {
    #[serde(default)]
    next_id: i64,
    #[serde(default)]
    games: Vec<Record>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Record {
    #[serde(flatten)]
    game: Game,
    #[serde(default)]
    screenshot_path: String,
}

impl LocalBackend {
    /// Backend rooted at `root`; directories are created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            lock: Mutex::new(()),
        }
    }

    /// Data directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn store_path(&self) -> PathBuf {
        self.root.join(STORE_FILE)
    }

    fn screenshot_dir(&self) -> PathBuf {
        self.root.join(SCREENSHOT_DIR)
    }

    fn read_store(&self) -> Result<Store, BackendError> {
        let path = self.store_path();
        if !path.exists() {
            return Ok(Store::default());
        }
        let content = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write to a sibling temp file, then rename over the store.
    fn write_store(&self, store: &Store) -> Result<(), BackendError> {
        fs::create_dir_all(&self.root)?;
        let serialised = serde_json::to_vec_pretty(store)?;
        let path = self.store_path();
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serialised)?;
        if let Err(err) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(err.into());
        }
        Ok(())
    }

    fn save_screenshot(&self, data: &str, id: i64, title: &str) -> Result<String, BackendError> {
        let image = DataUrl::parse(data)?;
        let dir = self.screenshot_dir();
        fs::create_dir_all(&dir)?;
        let path = dir.join(format!(
            "{id}_{}.{}",
            normalize_filename(title),
            image.extension()
        ));
        fs::write(&path, &image.bytes)?;
        Ok(path.to_string_lossy().into_owned())
    }

    fn load_screenshot(path: &str) -> String {
        if path.is_empty() {
            return String::new();
        }
        let path = Path::new(path);
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!("Screenshot {} unreadable: {err}", path.display());
                return String::new();
            }
        };
        let ext = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");
        DataUrl {
            mime: mime_for_extension(ext).to_string(),
            bytes,
        }
        .encode()
    }
}

fn delete_screenshot(path: &str) {
    if path.is_empty() {
        return;
    }
    let path = Path::new(path);
    if path.exists() {
        if let Err(err) = fs::remove_file(path) {
            warn!("Failed to delete screenshot {}: {err}", path.display());
        }
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
impl Backend for LocalBackend {
    async fn load_games(&self) -> Result<Vec<Game>, BackendError> {
        let _guard = self.lock.lock();
        let store = self.read_store()?;
        let mut games: Vec<Game> = store
            .games
            .into_iter()
            .map(|record| {
                let mut game = record.game;
                game.screenshot_data = Some(Self::load_screenshot(&record.screenshot_path));
                game
            })
            .collect();
        order_for_listing(&mut games);
        Ok(games)
    }

    async fn add_game(
        &self,
        payload: &GamePayload,
        screenshot: Option<String>,
    ) -> Result<bool, BackendError> {
        let _guard = self.lock.lock();
        let mut store = self.read_store()?;
        store.next_id += 1;
        let id = store.next_id;

        let now = now_timestamp();
        let mut game = Game {
            id: Some(id),
            created_at: Some(now.clone()),
            updated_at: Some(now),
            ..Game::default()
        };
        apply_payload(&mut game, payload);

        let change = ScreenshotChange::from_wire(screenshot.as_deref());
        let screenshot_path = match change.for_create() {
            Some(data) => self.save_screenshot(&data, id, &payload.title)?,
            None => String::new(),
        };
        store.games.push(Record {
            game,
            screenshot_path: screenshot_path.clone(),
        });
        if let Err(err) = self.write_store(&store) {
            delete_screenshot(&screenshot_path);
            return Err(err);
        }
        info!(id, title = %payload.title, "Added game");
        Ok(true)
    }

    async fn update_game(
        &self,
        id: i64,
        payload: &GamePayload,
        screenshot: Option<String>,
    ) -> Result<bool, BackendError> {
        let _guard = self.lock.lock();
        let mut store = self.read_store()?;
        let record = store
            .games
            .iter_mut()
            .find(|record| record.game.id == Some(id))
            .ok_or(BackendError::NotFound(id))?;

        // The new image is written before the old one goes, so a bad payload
        // leaves the stored screenshot in place.
        let previous = record.screenshot_path.clone();
        let written = match ScreenshotChange::from_wire(screenshot.as_deref()) {
            ScreenshotChange::Unchanged => None,
            ScreenshotChange::Remove => Some(String::new()),
            ScreenshotChange::Replace(data) => {
                Some(self.save_screenshot(&data, id, &payload.title)?)
            }
        };
        if let Some(path) = &written {
            record.screenshot_path = path.clone();
        }

        apply_payload(&mut record.game, payload);
        record.game.updated_at = Some(now_timestamp());
        if let Err(err) = self.write_store(&store) {
            if let Some(path) = written.filter(|path| *path != previous) {
                delete_screenshot(&path);
            }
            return Err(err);
        }
        if written.is_some_and(|path| path != previous) {
            delete_screenshot(&previous);
        }
        info!(id, "Updated game");
        Ok(true)
    }

    async fn delete_game(&self, id: i64) -> Result<bool, BackendError> {
        let _guard = self.lock.lock();
        if !self.store_path().exists() {
            return Ok(true);
        }
        let mut store = self.read_store()?;
        if let Some(record) = store.games.iter().find(|record| record.game.id == Some(id)) {
            delete_screenshot(&record.screenshot_path);
        }
        store.games.retain(|record| record.game.id != Some(id));
        self.write_store(&store)?;
        info!(id, "Deleted game");
        Ok(true)
    }

    async fn get_statistics(&self) -> Result<Statistics, BackendError> {
        let _guard = self.lock.lock();
        let store = self.read_store()?;
        Ok(Statistics::tally(store.games.iter().map(|record| &record.game)))
    }

    async fn get_version(&self) -> Result<String, BackendError> {
        Ok(VERSION.to_string())
    }
}

/// Make a title safe for use in a file name.
pub fn normalize_filename(name: &str) -> String {
    static UNSAFE_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"[^\w\s-]").expect("invalid filename regex"));
    static UNDERSCORES_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"_+").expect("invalid underscore regex"));

    if name.is_empty() {
        return "unknown".to_string();
    }
    let cleaned = UNSAFE_RE.replace_all(name, "_");
    let spaced = cleaned.replace(char::is_whitespace, "_");
    let collapsed = UNDERSCORES_RE.replace_all(&spaced, "_");
    let capped: String = collapsed.chars().take(MAX_FILENAME_CHARS).collect();
    let trimmed = capped.trim_matches('_');
    if trimmed.is_empty() {
        "unknown".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GameStatus;
    use anyhow::Result;
    use tempfile::tempdir;

    const PNG: &str = "data:image/png;base64,iVBORw==";
    const JPEG: &str = "data:image/jpeg;base64,/9j/";

    fn payload(title: &str) -> GamePayload {
        GamePayload {
            title: title.to_string(),
            version: "1.0".to_string(),
            status: GameStatus::Playing,
            rating: 8.5,
            ..GamePayload::default()
        }
    }

    #[tokio::test]
    async fn persists_games_and_screenshots() -> Result<()> {
        let dir = tempdir()?;
        let backend = LocalBackend::new(dir.path());
        backend.add_game(&payload("Hades"), Some(PNG.to_string())).await?;

        let reopened = LocalBackend::new(dir.path());
        let games = reopened.load_games().await?;
        assert_eq!(games.len(), 1);
        let hades = &games[0];
        assert_eq!(hades.id, Some(1));
        assert_eq!(hades.rating, 8.5);
        assert_eq!(hades.screenshot_data.as_deref(), Some(PNG));
        assert!(dir.path().join("screenshots/1_Hades.png").exists());
        Ok(())
    }

    #[tokio::test]
    async fn update_honours_screenshot_tri_state() -> Result<()> {
        let dir = tempdir()?;
        let backend = LocalBackend::new(dir.path());
        backend.add_game(&payload("Hades"), Some(PNG.to_string())).await?;

        backend.update_game(1, &payload("Hades"), None).await?;
        assert_eq!(backend.load_games().await?[0].screenshot_data.as_deref(), Some(PNG));

        backend.update_game(1, &payload("Hades II"), Some(JPEG.to_string())).await?;
        assert!(!dir.path().join("screenshots/1_Hades.png").exists());
        assert!(dir.path().join("screenshots/1_Hades_II.jpg").exists());
        let games = backend.load_games().await?;
        assert_eq!(games[0].title, "Hades II");
        assert_eq!(games[0].screenshot_data.as_deref(), Some(JPEG));

        backend.update_game(1, &payload("Hades II"), Some(String::new())).await?;
        assert!(!dir.path().join("screenshots/1_Hades_II.jpg").exists());
        assert!(!backend.load_games().await?[0].has_screenshot());
        Ok(())
    }

    #[tokio::test]
    async fn rejected_replacement_keeps_existing_screenshot() -> Result<()> {
        let dir = tempdir()?;
        let backend = LocalBackend::new(dir.path());
        backend.add_game(&payload("Hades"), Some(PNG.to_string())).await?;

        let broken = "data:image/png;base64,@@@not-base64".to_string();
        assert!(backend.update_game(1, &payload("Hades"), Some(broken)).await.is_err());

        assert!(dir.path().join("screenshots/1_Hades.png").exists());
        let games = backend.load_games().await?;
        assert_eq!(games[0].screenshot_data.as_deref(), Some(PNG));
        Ok(())
    }

    #[tokio::test]
    async fn replacement_with_same_name_keeps_new_image() -> Result<()> {
        let dir = tempdir()?;
        let backend = LocalBackend::new(dir.path());
        backend.add_game(&payload("Hades"), Some(PNG.to_string())).await?;

        let other_png = "data:image/png;base64,AAAA";
        backend
            .update_game(1, &payload("Hades"), Some(other_png.to_string()))
            .await?;
        assert!(dir.path().join("screenshots/1_Hades.png").exists());
        let games = backend.load_games().await?;
        assert_eq!(games[0].screenshot_data.as_deref(), Some(other_png));
        assert!(!dir.path().join("games.json.tmp").exists());
        Ok(())
    }

    #[tokio::test]
    async fn delete_removes_record_and_file() -> Result<()> {
        let dir = tempdir()?;
        let backend = LocalBackend::new(dir.path());
        backend.add_game(&payload("Celeste"), Some(PNG.to_string())).await?;
        backend.add_game(&payload("Inside"), None).await?;

        backend.delete_game(1).await?;
        let games = backend.load_games().await?;
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].title, "Inside");
        assert!(!dir.path().join("screenshots/1_Celeste.png").exists());

        let stats = backend.get_statistics().await?;
        assert_eq!(stats.total_games, 1);
        assert_eq!(stats.playing, 1);
        Ok(())
    }

    #[tokio::test]
    async fn missing_store_reads_as_empty() -> Result<()> {
        let dir = tempdir()?;
        let backend = LocalBackend::new(dir.path().join("nested"));
        assert!(backend.load_games().await?.is_empty());
        assert_eq!(backend.get_statistics().await?, Statistics::default());
        assert!(backend.delete_game(7).await?);
        Ok(())
    }

    #[test]
    fn normalizes_file_names() {
        assert_eq!(normalize_filename("Half-Life 2: Episode One"), "Half-Life_2_Episode_One");
        assert_eq!(normalize_filename("Ведьмак 3"), "Ведьмак_3");
        assert_eq!(normalize_filename("???"), "unknown");
        assert_eq!(normalize_filename(""), "unknown");
        assert_eq!(normalize_filename(&"a".repeat(150)).chars().count(), 100);
    }
}
