use std::{
    future::Future,
    io,
    path::PathBuf,
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use arboard::Clipboard;
use crossterm::{
    event::{
        self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEvent,
        KeyEventKind, KeyModifiers,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use gamelist_core::{
    backend::{Backend, BackendError},
    config::AppConfig,
    form::{FormError, GameForm, Submission},
    format::{format_date_time, format_rating},
    i18n::Locale,
    models::{Game, GameStatus},
    pipeline::{SortMode, StatusFilter},
    preferences::{Preferences, ThemeChoice},
    screenshot::DataUrl,
    state::{fetch_snapshot, AppState, Snapshot, SubmitError, SubmitKind},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::{spawn, sync::mpsc};
use tracing::{debug, error, info, warn};

use crate::{input::LineEditor, theme::Theme};

const TICK_RATE: Duration = Duration::from_millis(100);
const MAX_TOASTS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Browse,
    Search,
    Form,
    ConfirmDelete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormField {
    Title,
    Version,
    Status,
    Rating,
    Link,
    Review,
    Screenshot,
}

impl FormField {
    const ORDER: [FormField; 7] = [
        FormField::Title,
        FormField::Version,
        FormField::Status,
        FormField::Rating,
        FormField::Link,
        FormField::Review,
        FormField::Screenshot,
    ];

    fn step(self, delta: isize) -> FormField {
        let len = Self::ORDER.len() as isize;
        let idx = Self::ORDER.iter().position(|field| *field == self).unwrap_or(0) as isize;
        Self::ORDER[(idx + delta).rem_euclid(len) as usize]
    }

    fn label_key(self) -> &'static str {
        match self {
            FormField::Title => "game_title_label",
            FormField::Version => "version_label",
            FormField::Status => "status_label",
            FormField::Rating => "rating_label",
            FormField::Link => "game_link_label",
            FormField::Review => "review_label",
            FormField::Screenshot => "screenshot_label",
        }
    }

    fn placeholder_key(self) -> Option<&'static str> {
        match self {
            FormField::Title => Some("game_title_placeholder"),
            FormField::Version => Some("version_placeholder"),
            FormField::Link => Some("game_link_placeholder"),
            FormField::Review => Some("review_placeholder"),
            FormField::Screenshot => Some("screenshot_path_placeholder"),
            FormField::Status | FormField::Rating => None,
        }
    }
}

enum AppEvent {
    Input(Event),
    Tick,
    Loaded(Result<Snapshot, BackendError>),
    Version(Result<String, BackendError>),
    Saved {
        submission: Submission,
        result: Result<bool, BackendError>,
        snapshot: Option<Result<Snapshot, BackendError>>,
    },
    Deleted {
        id: i64,
        title: String,
        result: Result<bool, BackendError>,
        snapshot: Option<Result<Snapshot, BackendError>>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ToastKind {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone)]
struct Toast {
    message: String,
    kind: ToastKind,
    expires_at: Instant,
}

/// Editor state for the open form that [`GameForm`] does not track.
#[derive(Debug, Clone)]
struct FormView {
    field: FormField,
    editor: LineEditor,
    screenshot_path: String,
    title_edited_at: Option<Instant>,
    similar: Vec<Game>,
    popup_dismissed: bool,
}

impl FormView {
    fn new(form: &GameForm) -> Self {
        Self {
            field: FormField::Title,
            editor: LineEditor::at_end(&form.title),
            screenshot_path: String::new(),
            // editing an existing title shows its lookalikes straight away
            title_edited_at: Some(Instant::now()),
            similar: Vec::new(),
            popup_dismissed: false,
        }
    }

    fn popup_visible(&self) -> bool {
        self.field == FormField::Title && !self.popup_dismissed && !self.similar.is_empty()
    }
}

/// Terminal front end for the game list.
pub struct GameListApp {
    backend: Arc<dyn Backend>,
    model: AppState,
    ui: UiState,
    form_view: Option<FormView>,
    config: AppConfig,
    prefs: Preferences,
    locale: Locale,
    theme: Theme,
    toasts: Vec<Toast>,
    deleting: bool,
    event_tx: Option<mpsc::Sender<AppEvent>>,
    clipboard: Option<Clipboard>,
}

impl GameListApp {
    pub fn new(backend: Arc<dyn Backend>, config: AppConfig, prefs: Preferences) -> Self {
        let locale = prefs.locale();
        let theme = Theme::for_choice(prefs.theme);
        Self {
            backend,
            model: AppState::new(),
            ui: UiState::default(),
            form_view: None,
            config,
            prefs,
            locale,
            theme,
            toasts: Vec::new(),
            deleting: false,
            event_tx: None,
            clipboard: None,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)
            .context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx.clone());
        self.event_tx = Some(event_tx);

        self.request_version();
        self.request_reload();

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            let maybe_event = event_rx.recv().await;
            if !self.process_app_event(maybe_event) || self.ui.should_quit {
                break;
            }
        }

        restore_terminal(&mut terminal)?;
        self.event_tx = None;
        Ok(())
    }

    fn t<'a>(&self, key: &'a str) -> &'a str {
        self.locale.t(key)
    }

    fn spawn_task<F>(&self, task: F) -> bool
    where
        F: Future<Output = AppEvent> + Send + 'static,
    {
        let Some(sender) = self.event_tx.clone() else {
            error!("event_channel_missing");
            return false;
        };
        spawn(async move {
            let event = task.await;
            let _ = sender.send(event).await;
        });
        true
    }

    fn request_reload(&mut self) {
        let backend = Arc::clone(&self.backend);
        self.ui.loading = self.spawn_task(async move {
            AppEvent::Loaded(fetch_snapshot(backend.as_ref()).await)
        });
    }

    fn request_version(&mut self) {
        let backend = Arc::clone(&self.backend);
        self.spawn_task(async move { AppEvent::Version(backend.get_version().await) });
    }

    fn process_app_event(&mut self, maybe_event: Option<AppEvent>) -> bool {
        match maybe_event {
            Some(AppEvent::Input(event)) => {
                self.handle_input(event);
                true
            }
            Some(AppEvent::Tick) => {
                self.handle_tick();
                true
            }
            Some(AppEvent::Loaded(result)) => {
                self.ui.loading = false;
                self.apply_loaded(result);
                true
            }
            Some(AppEvent::Version(result)) => {
                match result {
                    Ok(version) => self.model.set_version(version),
                    Err(err) => warn!("Failed to read backend version: {err}"),
                }
                true
            }
            Some(AppEvent::Saved {
                submission,
                result,
                snapshot,
            }) => {
                self.handle_saved(submission, result, snapshot);
                true
            }
            Some(AppEvent::Deleted {
                id,
                title,
                result,
                snapshot,
            }) => {
                self.handle_deleted(id, title, result, snapshot);
                true
            }
            None => false,
        }
    }

    fn apply_loaded(&mut self, result: Result<Snapshot, BackendError>) {
        match result {
            Ok(snapshot) => {
                info!(total = snapshot.games.len(), "Games reloaded");
                self.model.apply_snapshot(snapshot);
                self.refresh_visible();
            }
            Err(err) => {
                error!(?err, "Failed to load games");
                self.push_toast(format!("{}: {err}", self.t("load_error")), ToastKind::Error);
            }
        }
    }

    fn handle_saved(
        &mut self,
        submission: Submission,
        result: Result<bool, BackendError>,
        snapshot: Option<Result<Snapshot, BackendError>>,
    ) {
        if let Some(snapshot) = snapshot {
            self.apply_loaded(snapshot);
        }
        match self.model.complete_submit(&submission, result) {
            Ok(outcome) => {
                let key = match outcome.kind {
                    SubmitKind::Added => "game_added",
                    SubmitKind::Updated => "game_updated",
                };
                let message = self.locale.t_with(key, &[("title", outcome.title.as_str())]);
                self.push_toast(message, ToastKind::Success);
                self.form_view = None;
                self.ui.mode = Mode::Browse;
            }
            Err(err) => {
                self.push_toast(format!("{}: {err}", self.t("save_error")), ToastKind::Error);
            }
        }
    }

    fn handle_deleted(
        &mut self,
        id: i64,
        title: String,
        result: Result<bool, BackendError>,
        snapshot: Option<Result<Snapshot, BackendError>>,
    ) {
        self.deleting = false;
        match result {
            Ok(true) => {
                info!(id, "Game deleted");
                if let Some(snapshot) = snapshot {
                    self.apply_loaded(snapshot);
                }
                self.model.cancel_delete();
                self.ui.mode = Mode::Browse;
                let title = if title.is_empty() {
                    self.t("no_title").to_string()
                } else {
                    title
                };
                let message = self.locale.t_with("game_deleted", &[("title", title.as_str())]);
                self.push_toast(message, ToastKind::Success);
            }
            Ok(false) => {
                warn!(id, "Backend refused the delete");
                self.push_toast(self.t("delete_error").to_string(), ToastKind::Error);
            }
            Err(err) => {
                error!(id, ?err, "Delete failed");
                self.push_toast(format!("{}: {err}", self.t("delete_error")), ToastKind::Error);
            }
        }
    }

    fn handle_tick(&mut self) {
        let now = Instant::now();
        self.toasts.retain(|toast| toast.expires_at > now);
        self.refresh_similar();
    }

    /// Run the similar-title lookup once the debounce since the last title
    /// edit has elapsed.
    fn refresh_similar(&mut self) {
        let debounce = Duration::from_millis(self.config.debounce_ms);
        let Some(view) = self.form_view.as_mut() else {
            return;
        };
        let Some(edited_at) = view.title_edited_at else {
            return;
        };
        if edited_at.elapsed() < debounce {
            return;
        }
        view.title_edited_at = None;
        let title = self
            .model
            .form()
            .map(|form| form.title.clone())
            .unwrap_or_default();
        view.similar = self
            .model
            .similar_titles(&title)
            .into_iter()
            .cloned()
            .collect();
        debug!(query = %title, matches = view.similar.len(), "Similar titles refreshed");
    }

    fn push_toast(&mut self, message: String, kind: ToastKind) {
        let lifetime = Duration::from_millis(self.config.toast_ms);
        self.toasts.push(Toast {
            message,
            kind,
            expires_at: Instant::now() + lifetime,
        });
        if self.toasts.len() > MAX_TOASTS {
            let excess = self.toasts.len() - MAX_TOASTS;
            self.toasts.drain(..excess);
        }
    }

    fn refresh_visible(&mut self) {
        let selected = self.ui.current_game().and_then(|game| game.id);
        self.ui.visible = self.model.visible();
        match selected {
            Some(id) if self.ui.select_game(id) => {}
            _ => self.ui.clamp_cursor(),
        }
        self.ui.ensure_cursor_visible();
    }

    fn handle_input(&mut self, event: Event) {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => self.handle_key(key),
            Event::Paste(text) => self.handle_paste(&text),
            _ => {}
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.ui.should_quit = true;
            return;
        }
        match self.ui.mode {
            Mode::Browse => self.handle_browse_key(key),
            Mode::Search => self.handle_search_key(key),
            Mode::Form => self.handle_form_key(key),
            Mode::ConfirmDelete => self.handle_confirm_key(key),
        }
    }

    fn handle_browse_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.ui.should_quit = true,
            KeyCode::Char('j') | KeyCode::Down => self.ui.move_cursor(1),
            KeyCode::Char('k') | KeyCode::Up => self.ui.move_cursor(-1),
            KeyCode::Char('g') | KeyCode::Home => self.ui.move_to(0),
            KeyCode::Char('G') | KeyCode::End => self.ui.move_to_end(),
            KeyCode::PageDown => self.ui.page(1),
            KeyCode::PageUp => self.ui.page(-1),
            KeyCode::Tab => self.cycle_filter(1),
            KeyCode::BackTab => self.cycle_filter(-1),
            KeyCode::Char('/') => {
                self.ui.search_editor.move_end(&self.ui.search);
                self.ui.mode = Mode::Search;
            }
            KeyCode::Char('s') => {
                let next = self.model.query().sort.next();
                self.model.set_sort(next);
                self.refresh_visible();
            }
            KeyCode::Char('a') => self.open_form(None),
            KeyCode::Char('e') | KeyCode::Enter => {
                if let Some(id) = self.ui.current_game().and_then(|game| game.id) {
                    self.open_form(Some(id));
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(id) = self.ui.current_game().and_then(|game| game.id) {
                    self.model.request_delete(id);
                    self.ui.mode = Mode::ConfirmDelete;
                }
            }
            KeyCode::Char('c') => {
                if let Some(title) = self
                    .ui
                    .current_game()
                    .map(|game| game.display_title().to_string())
                {
                    self.copy_to_clipboard(&title);
                }
            }
            KeyCode::Char('y') => {
                if let Some(link) = self
                    .ui
                    .current_game()
                    .map(|game| game.game_link.clone())
                    .filter(|link| !link.is_empty())
                {
                    self.copy_to_clipboard(&link);
                }
            }
            KeyCode::Char('t') => self.toggle_theme(),
            KeyCode::Char('l') => self.toggle_language(),
            KeyCode::Char('r') => self.request_reload(),
            _ => {}
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        let ui = &mut self.ui;
        match key.code {
            KeyCode::Enter => {
                ui.mode = Mode::Browse;
                return;
            }
            KeyCode::Esc => {
                ui.search.clear();
                ui.search_editor.move_home();
                ui.mode = Mode::Browse;
            }
            KeyCode::Left => ui.search_editor.move_cursor(&ui.search, -1),
            KeyCode::Right => ui.search_editor.move_cursor(&ui.search, 1),
            KeyCode::Home => ui.search_editor.move_home(),
            KeyCode::End => ui.search_editor.move_end(&ui.search),
            KeyCode::Backspace => ui.search_editor.backspace(&mut ui.search),
            KeyCode::Delete => ui.search_editor.delete(&mut ui.search),
            KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                ui.search_editor.insert(&mut ui.search, ch)
            }
            _ => return,
        }
        let search = self.ui.search.clone();
        self.model.set_search(&search);
        self.refresh_visible();
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => self.confirm_delete(),
            KeyCode::Char('n') | KeyCode::Esc => {
                if !self.deleting {
                    self.model.cancel_delete();
                    self.ui.mode = Mode::Browse;
                }
            }
            _ => {}
        }
    }

    fn confirm_delete(&mut self) {
        if self.deleting {
            return;
        }
        let Some(id) = self.model.pending_delete() else {
            self.ui.mode = Mode::Browse;
            return;
        };
        let title = self
            .model
            .game(id)
            .map(|game| game.display_title().to_string())
            .unwrap_or_default();
        let backend = Arc::clone(&self.backend);
        info!(id, title = %title, "Deleting game");
        self.deleting = self.spawn_task(async move {
            let result = backend.delete_game(id).await;
            let snapshot = match result {
                Ok(true) => Some(fetch_snapshot(backend.as_ref()).await),
                _ => None,
            };
            AppEvent::Deleted {
                id,
                title,
                result,
                snapshot,
            }
        });
    }

    fn open_form(&mut self, id: Option<i64>) {
        let form = self.model.open_form(id);
        self.form_view = Some(FormView::new(form));
        self.ui.mode = Mode::Form;
    }

    fn close_form(&mut self) {
        self.model.close_form();
        self.form_view = None;
        self.ui.mode = Mode::Browse;
    }

    fn focus_field(&mut self, delta: isize) {
        let (Some(form), Some(view)) = (self.model.form(), self.form_view.as_mut()) else {
            return;
        };
        view.field = view.field.step(delta);
        let text = match view.field {
            FormField::Title => form.title.as_str(),
            FormField::Version => form.version.as_str(),
            FormField::Rating => form.rating.as_str(),
            FormField::Link => form.game_link.as_str(),
            FormField::Review => form.review.as_str(),
            FormField::Screenshot => view.screenshot_path.as_str(),
            FormField::Status => "",
        };
        view.editor = LineEditor::at_end(text);
        if view.field == FormField::Title {
            view.popup_dismissed = false;
            view.title_edited_at = Some(Instant::now());
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        let Some(form) = self.model.form() else {
            self.ui.mode = Mode::Browse;
            return;
        };
        if form.is_submitting() {
            return;
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let field = match self.form_view.as_ref() {
            Some(view) => view.field,
            None => return,
        };
        match key.code {
            KeyCode::Char('s') if ctrl => self.submit_form(),
            KeyCode::Char('x') if ctrl => {
                if let Some(form) = self.model.form_mut() {
                    form.remove_screenshot();
                }
            }
            KeyCode::Esc => {
                let popup = self.form_view.as_ref().is_some_and(FormView::popup_visible);
                match self.form_view.as_mut() {
                    Some(view) if popup => view.popup_dismissed = true,
                    _ => self.close_form(),
                }
            }
            KeyCode::Tab | KeyCode::Down => self.focus_field(1),
            KeyCode::BackTab | KeyCode::Up => self.focus_field(-1),
            KeyCode::Enter if field == FormField::Screenshot => self.load_screenshot(),
            KeyCode::Enter => self.focus_field(1),
            KeyCode::Left | KeyCode::Right if field == FormField::Status => {
                let delta = if key.code == KeyCode::Left { -1 } else { 1 };
                if let Some(form) = self.model.form_mut() {
                    form.status = form.status.cycle(delta);
                }
            }
            KeyCode::Char(_) if ctrl => {}
            _ => self.edit_field(key),
        }
    }

    fn edit_field(&mut self, key: KeyEvent) {
        let (Some(form), Some(view)) = (self.model.form_mut(), self.form_view.as_mut()) else {
            return;
        };
        let FormView {
            field,
            editor,
            screenshot_path,
            title_edited_at,
            popup_dismissed,
            ..
        } = view;
        let text = match field {
            FormField::Title => &mut form.title,
            FormField::Version => &mut form.version,
            FormField::Rating => &mut form.rating,
            FormField::Link => &mut form.game_link,
            FormField::Review => &mut form.review,
            FormField::Screenshot => screenshot_path,
            FormField::Status => return,
        };
        let before = text.clone();
        match key.code {
            KeyCode::Left => editor.move_cursor(text, -1),
            KeyCode::Right => editor.move_cursor(text, 1),
            KeyCode::Home => editor.move_home(),
            KeyCode::End => editor.move_end(text),
            KeyCode::Backspace => editor.backspace(text),
            KeyCode::Delete => editor.delete(text),
            KeyCode::Char(ch) => {
                if *field != FormField::Rating || ch.is_ascii_digit() || ch == '.' {
                    editor.insert(text, ch);
                }
            }
            _ => {}
        }
        if *field == FormField::Title && *text != before {
            *title_edited_at = Some(Instant::now());
            *popup_dismissed = false;
        }
    }

    fn handle_paste(&mut self, pasted: &str) {
        if self.ui.mode == Mode::Search {
            self.ui.search_editor.insert_str(&mut self.ui.search, pasted);
            let search = self.ui.search.clone();
            self.model.set_search(&search);
            self.refresh_visible();
            return;
        }
        let (Some(form), Some(view)) = (self.model.form_mut(), self.form_view.as_mut()) else {
            return;
        };
        if form.is_submitting() {
            return;
        }
        let text = match view.field {
            FormField::Title => {
                view.title_edited_at = Some(Instant::now());
                &mut form.title
            }
            FormField::Version => &mut form.version,
            FormField::Link => &mut form.game_link,
            FormField::Review => &mut form.review,
            FormField::Screenshot => &mut view.screenshot_path,
            FormField::Rating | FormField::Status => return,
        };
        view.editor.insert_str(text, pasted);
    }

    fn load_screenshot(&mut self) {
        let (Some(form), Some(view)) = (self.model.form_mut(), self.form_view.as_mut()) else {
            return;
        };
        let raw = view.screenshot_path.trim();
        if raw.is_empty() {
            return;
        }
        let path = expand_home(raw);
        match form.attach_screenshot_file(&path) {
            Ok(()) => {
                info!(path = %path.display(), "Screenshot attached");
                view.screenshot_path.clear();
                view.editor = LineEditor::default();
            }
            Err(err) => {
                warn!(path = %path.display(), ?err, "Screenshot rejected");
                let message = format!("{}: {err}", self.t("screenshot_error"));
                self.push_toast(message, ToastKind::Error);
            }
        }
    }

    fn submit_form(&mut self) {
        match self.model.begin_submit() {
            Ok(submission) => {
                let backend = Arc::clone(&self.backend);
                let pending = submission.clone();
                let spawned = self.spawn_task(async move {
                    let result = submission.send(backend.as_ref()).await;
                    let snapshot = match result {
                        Ok(true) => Some(fetch_snapshot(backend.as_ref()).await),
                        _ => None,
                    };
                    AppEvent::Saved {
                        submission,
                        result,
                        snapshot,
                    }
                });
                if !spawned {
                    let closed = BackendError::Unavailable("event channel closed".to_string());
                    self.handle_saved(pending, Err(closed), None);
                }
            }
            Err(SubmitError::Form(FormError::TitleRequired)) => {
                self.push_toast(self.t("title_required").to_string(), ToastKind::Error);
                if let Some(view) = self.form_view.as_mut() {
                    view.field = FormField::Title;
                }
                let title = self.model.form().map(|form| form.title.clone()).unwrap_or_default();
                if let Some(view) = self.form_view.as_mut() {
                    view.editor = LineEditor::at_end(&title);
                }
            }
            Err(SubmitError::Form(FormError::AlreadySubmitting)) => {
                debug!("Submit ignored while a save is in flight");
            }
            Err(err) => {
                self.push_toast(format!("{}: {err}", self.t("save_error")), ToastKind::Error);
            }
        }
    }

    fn cycle_filter(&mut self, delta: isize) {
        let choices = StatusFilter::choices();
        let current = choices
            .iter()
            .position(|choice| *choice == self.model.query().filter)
            .unwrap_or(0) as isize;
        let next = (current + delta).rem_euclid(choices.len() as isize) as usize;
        self.model.set_filter(choices[next].clone());
        self.refresh_visible();
    }

    fn toggle_theme(&mut self) {
        self.prefs.theme = self.prefs.theme.toggled();
        self.theme = Theme::for_choice(self.prefs.theme);
        self.save_preferences();
    }

    fn toggle_language(&mut self) {
        self.locale = self.locale.next();
        self.prefs.set_locale(self.locale);
        self.save_preferences();
    }

    fn save_preferences(&mut self) {
        if let Err(err) = self.prefs.persist(&self.config.preferences_path) {
            warn!(?err, "Failed to persist preferences");
        }
    }

    fn copy_to_clipboard(&mut self, text: &str) {
        let result = match self.clipboard_mut() {
            Some(clipboard) => clipboard.set_text(text.to_string()),
            None => return,
        };
        match result {
            Ok(()) => {
                self.push_toast(self.t("copied_to_clipboard").to_string(), ToastKind::Info);
            }
            Err(err) => {
                warn!("Clipboard copy failed: {err}");
                self.push_toast(format!("{}: {err}", self.t("clipboard_error")), ToastKind::Error);
            }
        }
    }

    fn clipboard_mut(&mut self) -> Option<&mut Clipboard> {
        if self.clipboard.is_none() {
            match Clipboard::new() {
                Ok(clipboard) => self.clipboard = Some(clipboard),
                Err(err) => {
                    warn!("Clipboard unavailable: {err}");
                    self.push_toast(
                        format!("{}: {err}", self.t("clipboard_error")),
                        ToastKind::Error,
                    );
                    return None;
                }
            }
        }
        self.clipboard.as_mut()
    }

    fn draw(&mut self, frame: &mut Frame) {
        let size = frame.size();
        frame.render_widget(
            Block::default().style(
                Style::default()
                    .bg(self.theme.primary_bg)
                    .fg(self.theme.primary_fg),
            ),
            size,
        );

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(6),
                Constraint::Length(1),
            ])
            .split(size);

        self.render_header(frame, chunks[0]);
        self.render_toolbar(frame, chunks[1]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(chunks[2]);
        self.render_game_list(frame, body[0]);
        self.render_game_details(frame, body[1]);
        self.render_help(frame, chunks[3]);

        match self.ui.mode {
            Mode::Form => self.render_form(frame),
            Mode::ConfirmDelete => self.render_confirm(frame),
            Mode::Browse | Mode::Search => {}
        }
        self.render_toasts(frame);
    }

    fn filter_label(&self, filter: &StatusFilter) -> (&'static str, u64) {
        let stats = self.model.statistics();
        match filter {
            StatusFilter::All => (self.locale.t("all_games_label"), stats.total_games),
            StatusFilter::Only(status) => {
                let key = match status {
                    GameStatus::Playing => "playing_games_label",
                    GameStatus::Planned => "planned_games_label",
                    GameStatus::Completed => "completed_games_label",
                    GameStatus::Dropped => "dropped_games_label",
                    GameStatus::Unknown(_) => "status_unknown_display",
                };
                (self.locale.t(key), stats.count_for(status))
            }
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let mut title = self.t("app_title").to_string();
        if let Some(version) = self.model.version() {
            title.push_str(&format!(" v{version}"));
        }

        let active = &self.model.query().filter;
        let mut spans = Vec::new();
        for choice in StatusFilter::choices() {
            let (label, count) = self.filter_label(&choice);
            let text = format!(" {label} {count} ");
            let style = if &choice == active {
                Style::default()
                    .fg(self.theme.on_accent)
                    .bg(self.theme.accent)
                    .add_modifier(Modifier::BOLD)
            } else {
                let color = match &choice {
                    StatusFilter::All => self.theme.primary_fg,
                    StatusFilter::Only(status) => self.theme.status_color(status),
                };
                Style::default().fg(color)
            };
            spans.push(Span::styled(text, style));
            spans.push(Span::raw(" "));
        }
        if self.ui.loading {
            spans.push(Span::styled(
                self.t("loading").to_string(),
                Style::default().fg(self.theme.muted),
            ));
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(Style::default().fg(self.theme.accent));
        frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
    }

    fn render_toolbar(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(area);

        let searching = self.ui.mode == Mode::Search;
        let search_line = if self.ui.search.is_empty() && !searching {
            Line::from(Span::styled(
                self.t("search_placeholder").to_string(),
                Style::default().fg(self.theme.muted),
            ))
        } else {
            Line::from(self.ui.search.clone())
        };
        let border = if searching {
            self.theme.accent
        } else {
            self.theme.muted
        };
        let search_block = Block::default()
            .borders(Borders::ALL)
            .title(format!("{} (/)", self.t("search_label")))
            .border_style(Style::default().fg(border));
        frame.render_widget(Paragraph::new(search_line).block(search_block), chunks[0]);
        if searching {
            let x = chunks[0].x + 1 + self.ui.search_editor.cursor() as u16;
            let max_x = chunks[0].x + chunks[0].width.saturating_sub(2);
            frame.set_cursor(x.min(max_x), chunks[0].y + 1);
        }

        let sort_block = Block::default()
            .borders(Borders::ALL)
            .title(format!("{} (s)", self.t("sort_label")))
            .border_style(Style::default().fg(self.theme.muted));
        let sort =
            Paragraph::new(sort_label(self.locale, self.model.query().sort)).block(sort_block);
        frame.render_widget(sort, chunks[1]);
    }

    fn render_game_list(&mut self, frame: &mut Frame, area: Rect) {
        self.ui.list_height = area.height.saturating_sub(2) as usize;
        self.ui.clamp_cursor();
        self.ui.ensure_cursor_visible();

        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!("{} ({})", self.t("app_title"), self.ui.visible.len()));
        if self.ui.visible.is_empty() {
            let paragraph = Paragraph::new(Span::styled(
                self.t("empty_list").to_string(),
                Style::default().fg(self.theme.muted),
            ))
            .alignment(Alignment::Center)
            .block(block);
            frame.render_widget(paragraph, area);
            return;
        }

        let games = self.ui.visible_games();
        let mut list_state = ListState::default();
        let selected = self
            .ui
            .cursor
            .saturating_sub(self.ui.offset)
            .min(games.len().saturating_sub(1));
        list_state.select(Some(selected));

        let items: Vec<ListItem> = games
            .iter()
            .enumerate()
            .map(|(idx, game)| {
                let is_selected = self.ui.cursor == self.ui.offset + idx;
                let marker = if is_selected {
                    Span::styled(
                        "▶ ",
                        Style::default()
                            .fg(self.theme.accent)
                            .add_modifier(Modifier::BOLD),
                    )
                } else {
                    Span::raw("  ")
                };
                let mut line = vec![
                    marker,
                    Span::styled(
                        self.title_or_placeholder(game),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                ];
                if !game.version.is_empty() {
                    line.push(Span::styled(
                        format!(" · {}", game.version),
                        Style::default().fg(self.theme.muted),
                    ));
                }
                line.push(Span::raw("  "));
                line.push(self.status_badge(&game.status));
                if game.is_rated() {
                    line.push(Span::styled(
                        format!("  ★ {}", format_rating(game.rating_value())),
                        Style::default().fg(self.theme.warning),
                    ));
                }
                ListItem::new(Line::from(line))
            })
            .collect();

        let list = List::new(items).block(block).highlight_style(
            Style::default()
                .bg(self.theme.selection_bg)
                .fg(self.theme.selection_fg),
        );
        frame.render_stateful_widget(list, area, &mut list_state);
    }

    fn render_game_details(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL);
        let Some(game) = self.ui.current_game() else {
            frame.render_widget(Paragraph::new("").block(block), area);
            return;
        };
        let block = block.title(format!("{} (e)", self.t("edit_tooltip")));

        let label = |key: &str| {
            Span::styled(
                format!("{}: ", self.t(key)),
                Style::default().fg(self.theme.muted),
            )
        };
        let mut lines = vec![
            Line::from(vec![
                Span::styled(
                    self.title_or_placeholder(game),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw("  "),
                self.status_badge(&game.status),
            ]),
            Line::from(""),
        ];
        if !game.version.is_empty() {
            lines.push(Line::from(vec![label("version_label"), Span::raw(game.version.clone())]));
        }
        lines.push(Line::from(vec![
            label("rating_label"),
            Span::raw(format_rating(game.rating_value())),
        ]));
        if !game.game_link.is_empty() {
            lines.push(Line::from(vec![
                label("game_link_label"),
                Span::styled(game.display_link(), Style::default().fg(self.theme.info)),
            ]));
        }
        lines.push(Line::from(vec![
            label("screenshot_label"),
            Span::raw(self.screenshot_summary(game.screenshot_data.as_deref())),
        ]));
        lines.push(Line::from(vec![
            label("created_label"),
            Span::raw(format_date_time(game.created_at.as_deref(), false)),
        ]));
        if game.updated_at.as_deref().is_some_and(|raw| !raw.is_empty()) {
            lines.push(Line::from(vec![
                label("updated_label"),
                Span::raw(format_date_time(game.updated_at.as_deref(), false)),
            ]));
        }
        if !game.review.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from(label("review_label")));
            lines.extend(game.review.lines().map(|line| Line::from(line.to_string())));
        }

        let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
    }

    fn render_help(&self, frame: &mut Frame, area: Rect) {
        let key = match self.ui.mode {
            Mode::Browse | Mode::Search => "help_browse",
            Mode::Form => "help_form",
            Mode::ConfirmDelete => "help_confirm",
        };
        let mut spans = vec![Span::styled(
            self.t(key).to_string(),
            Style::default().fg(self.theme.muted),
        )];
        let theme_hint = if self.prefs.theme.resolve() == ThemeChoice::Light {
            "theme_toggle_tooltip_dark"
        } else {
            "theme_toggle_tooltip_light"
        };
        spans.push(Span::styled(
            format!("  [{} · {}]", self.locale.native_name(), self.t(theme_hint)),
            Style::default().fg(self.theme.muted),
        ));
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_form(&self, frame: &mut Frame) {
        let (Some(form), Some(view)) = (self.model.form(), self.form_view.as_ref()) else {
            return;
        };
        let area = centered_rect(72, 19, frame.size());
        frame.render_widget(Clear, area);

        let title = if form.is_editing() {
            self.t("edit_game_modal_title")
        } else {
            self.t("add_game_modal_title")
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(title.to_string())
            .border_style(Style::default().fg(self.theme.accent))
            .style(Style::default().bg(self.theme.primary_bg).fg(self.theme.primary_fg));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let label_width = 20_usize;
        let mut lines = Vec::new();
        let mut cursor = None;
        for (row, field) in FormField::ORDER.into_iter().enumerate() {
            let focused = view.field == field;
            let mut label = self.t(field.label_key()).to_string();
            if field == FormField::Title {
                label.push_str(self.t("required_field"));
            }
            let label_style = if focused {
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.theme.muted)
            };
            let value = match field {
                FormField::Title => form.title.clone(),
                FormField::Version => form.version.clone(),
                FormField::Rating => form.rating.clone(),
                FormField::Link => form.game_link.clone(),
                FormField::Review => form.review.clone(),
                FormField::Screenshot => view.screenshot_path.clone(),
                FormField::Status => format!("◀ {} ▶", self.locale.status_option(&form.status)),
            };
            let value_span = match field.placeholder_key() {
                Some(key) if value.is_empty() && !focused => {
                    Span::styled(self.t(key).to_string(), Style::default().fg(self.theme.muted))
                }
                _ => Span::raw(value),
            };
            lines.push(Line::from(vec![
                Span::styled(format!("{label:<label_width$}"), label_style),
                value_span,
            ]));
            if focused && field != FormField::Status {
                cursor = Some((
                    inner.x + label_width as u16 + view.editor.cursor() as u16,
                    inner.y + row as u16,
                ));
            }
        }

        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled(" ".repeat(label_width), Style::default()),
            Span::styled(
                self.screenshot_summary(form.preview()),
                Style::default().fg(self.theme.info),
            ),
        ]));
        if form.preview().is_some() {
            lines.push(Line::from(vec![
                Span::styled(" ".repeat(label_width), Style::default()),
                Span::styled(
                    format!("Ctrl+X {}", self.t("remove_screenshot_button")),
                    Style::default().fg(self.theme.muted),
                ),
            ]));
        }
        lines.push(Line::from(""));
        let submit_label = if form.is_submitting() {
            self.t("saving")
        } else if form.is_editing() {
            self.t("update_button")
        } else {
            self.t("save_button")
        };
        lines.push(Line::from(vec![
            Span::styled(
                format!(" Ctrl+S {submit_label} "),
                Style::default()
                    .fg(self.theme.on_accent)
                    .bg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(
                format!(" Esc {} ", self.t("cancel_button")),
                Style::default().fg(self.theme.muted),
            ),
        ]));

        frame.render_widget(Paragraph::new(lines), inner);

        if form.is_submitting() {
            return;
        }
        if view.popup_visible() {
            self.render_similar_popup(frame, inner, label_width as u16, &view.similar);
        }
        if let Some((x, y)) = cursor {
            let max_x = inner.x + inner.width.saturating_sub(1);
            frame.set_cursor(x.min(max_x), y);
        }
    }

    fn render_similar_popup(
        &self,
        frame: &mut Frame,
        form_area: Rect,
        indent: u16,
        games: &[Game],
    ) {
        let height = (games.len() as u16 + 2).min(form_area.height.saturating_sub(1));
        let width = form_area.width.saturating_sub(indent).max(20);
        let area = Rect::new(
            form_area.x + indent.min(form_area.width.saturating_sub(width)),
            form_area.y + 1,
            width.min(form_area.width),
            height,
        );
        frame.render_widget(Clear, area);

        let items: Vec<ListItem> = games
            .iter()
            .map(|game| {
                ListItem::new(Line::from(vec![
                    Span::raw(self.title_or_placeholder(game)),
                    Span::raw("  "),
                    self.status_badge(&game.status),
                ]))
            })
            .collect();
        let list = List::new(items).block(
            Block::default()
                .borders(Borders::ALL)
                .title(self.t("similar_games_title").to_string())
                .border_style(Style::default().fg(self.theme.warning))
                .style(Style::default().bg(self.theme.primary_bg)),
        );
        frame.render_widget(list, area);
    }

    fn render_confirm(&self, frame: &mut Frame) {
        let area = centered_rect(48, 7, frame.size());
        frame.render_widget(Clear, area);
        let title = self
            .model
            .pending_delete()
            .and_then(|id| self.model.game(id))
            .map(|game| self.title_or_placeholder(game))
            .unwrap_or_default();
        let status = if self.deleting {
            Line::from(Span::styled(
                self.t("loading").to_string(),
                Style::default().fg(self.theme.muted),
            ))
        } else {
            Line::from(vec![
                Span::styled(
                    format!(" y {} ", self.t("delete_button")),
                    Style::default()
                        .fg(self.theme.contrast(self.theme.danger))
                        .bg(self.theme.danger)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw("  "),
                Span::styled(
                    format!(" n {} ", self.t("cancel_button")),
                    Style::default().fg(self.theme.muted),
                ),
            ])
        };
        let paragraph = Paragraph::new(vec![
            Line::from(self.t("confirm_delete_text").to_string()),
            Line::from(Span::styled(title, Style::default().add_modifier(Modifier::BOLD))),
            Line::from(""),
            status,
        ])
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(self.t("confirm_delete_title").to_string())
                .border_style(Style::default().fg(self.theme.danger))
                .style(Style::default().bg(self.theme.primary_bg)),
        );
        frame.render_widget(paragraph, area);
    }

    fn render_toasts(&self, frame: &mut Frame) {
        let size = frame.size();
        let width = 44_u16.min(size.width);
        let mut y = size.y + 1;
        for toast in &self.toasts {
            if y + 3 > size.y + size.height {
                break;
            }
            let color = match toast.kind {
                ToastKind::Success => self.theme.success,
                ToastKind::Error => self.theme.danger,
                ToastKind::Info => self.theme.info,
            };
            let area = Rect::new(size.x + size.width - width, y, width, 3);
            frame.render_widget(Clear, area);
            let paragraph = Paragraph::new(toast.message.clone())
                .wrap(Wrap { trim: true })
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(color))
                        .style(Style::default().bg(self.theme.primary_bg)),
                );
            frame.render_widget(paragraph, area);
            y += 3;
        }
    }

    fn status_badge(&self, status: &GameStatus) -> Span<'static> {
        let color = self.theme.status_color(status);
        Span::styled(
            format!(" {} ", self.locale.status_badge(status)),
            Style::default()
                .fg(self.theme.contrast(color))
                .bg(color)
                .add_modifier(Modifier::BOLD),
        )
    }

    fn title_or_placeholder(&self, game: &Game) -> String {
        match game.display_title() {
            "" => self.t("no_title").to_string(),
            title => title.to_string(),
        }
    }

    fn screenshot_summary(&self, data: Option<&str>) -> String {
        let parsed = data
            .filter(|value| !value.is_empty())
            .and_then(|value| DataUrl::parse(value).ok());
        match parsed {
            Some(image) => {
                let size = format!("{:.1}", image.len() as f64 / 1024.0);
                self.locale.t_with(
                    "screenshot_attached",
                    &[("mime", image.mime.as_str()), ("size", size.as_str())],
                )
            }
            None => self.t("no_image").to_string(),
        }
    }
}

fn sort_label(locale: Locale, mode: SortMode) -> &'static str {
    let key = match mode {
        SortMode::RatingDesc => "sort_by_rating",
        SortMode::TitleAsc => "sort_by_title",
        SortMode::AddedDesc => "sort_by_date_added",
        SortMode::AddedAsc => "sort_by_date_updated",
    };
    locale.t(key)
}

fn expand_home(raw: &str) -> PathBuf {
    match raw.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(raw)),
        None => PathBuf::from(raw),
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), DisableBracketedPaste, LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

struct UiState {
    visible: Vec<Game>,
    cursor: usize,
    offset: usize,
    list_height: usize,
    search: String,
    search_editor: LineEditor,
    mode: Mode,
    loading: bool,
    should_quit: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            visible: Vec::new(),
            cursor: 0,
            offset: 0,
            list_height: 1,
            search: String::new(),
            search_editor: LineEditor::default(),
            mode: Mode::Browse,
            loading: false,
            should_quit: false,
        }
    }
}

impl UiState {
    fn move_cursor(&mut self, delta: isize) {
        if self.visible.is_empty() {
            return;
        }
        let len = self.visible.len() as isize;
        let idx = (self.cursor as isize + delta).clamp(0, len - 1);
        self.cursor = idx as usize;
        self.ensure_cursor_visible();
    }

    fn move_to(&mut self, index: usize) {
        if self.visible.is_empty() {
            return;
        }
        self.cursor = index.min(self.visible.len() - 1);
        self.ensure_cursor_visible();
    }

    fn move_to_end(&mut self) {
        if self.visible.is_empty() {
            return;
        }
        self.cursor = self.visible.len() - 1;
        self.ensure_cursor_visible();
    }

    fn page(&mut self, direction: isize) {
        let step = self.list_height.max(1) as isize;
        self.move_cursor(direction * step);
    }

    fn visible_games(&self) -> &[Game] {
        let end = (self.offset + self.list_height).min(self.visible.len());
        &self.visible[self.offset.min(end)..end]
    }

    fn current_game(&self) -> Option<&Game> {
        self.visible.get(self.cursor)
    }

    fn select_game(&mut self, id: i64) -> bool {
        match self.visible.iter().position(|game| game.id == Some(id)) {
            Some(idx) => {
                self.cursor = idx;
                true
            }
            None => false,
        }
    }

    fn clamp_cursor(&mut self) {
        if self.visible.is_empty() {
            self.cursor = 0;
            self.offset = 0;
        } else if self.cursor >= self.visible.len() {
            self.cursor = self.visible.len() - 1;
        }
    }

    fn ensure_cursor_visible(&mut self) {
        if self.visible.is_empty() || self.list_height == 0 {
            self.offset = 0;
            return;
        }
        let height = self.list_height;
        let max_offset = self.visible.len().saturating_sub(height);

        if self.cursor < self.offset {
            self.offset = self.cursor;
        } else if self.cursor >= self.offset + height {
            self.offset = self.cursor + 1 - height;
        }

        if self.offset > max_offset {
            self.offset = max_offset;
        }
    }
}
