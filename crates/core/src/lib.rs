#![warn(clippy::all, missing_docs)]

//! Core logic for the gamelist tracker.
//!
//! This crate hosts the game models, the similar-title matcher, the list
//! filter/sort pipeline, the create/edit form state machine and the
//! backends, shared by the terminal UI and any future frontends.

pub mod backend;
pub mod collation;
pub mod config;
pub mod form;
pub mod format;
pub mod i18n;
pub mod models;
pub mod pipeline;
pub mod preferences;
pub mod screenshot;
pub mod similarity;
pub mod state;

pub use backend::{Backend, BackendError, LocalBackend, MemoryBackend};
pub use config::AppConfig;
pub use form::{FormError, GameForm, Submission};
pub use i18n::Locale;
pub use models::{Game, GamePayload, GameStatus, Statistics};
pub use pipeline::{ListQuery, SortMode, StatusFilter};
pub use preferences::{Preferences, ThemeChoice};
pub use screenshot::{DataUrl, ScreenshotChange};
pub use state::{AppState, Snapshot, SubmitError, SubmitKind, SubmitOutcome};
