//! Russian and English UI strings.

use std::{collections::HashMap, fmt, str::FromStr};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::models::GameStatus;

/// Supported interface languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// Russian, the default.
    #[default]
    Ru,
    /// English.
    En,
}

impl Locale {
    /// All locales in selector order.
    pub const ALL: [Locale; 2] = [Locale::Ru, Locale::En];

    /// Two-letter code.
    pub fn code(self) -> &'static str {
        match self {
            Locale::Ru => "ru",
            Locale::En => "en",
        }
    }

    /// Name of the language in itself.
    pub fn native_name(self) -> &'static str {
        match self {
            Locale::Ru => "Русский",
            Locale::En => "English",
        }
    }

    /// Locale for a code; anything unsupported falls back to Russian.
    pub fn from_code(code: &str) -> Locale {
        match code.trim().to_ascii_lowercase().as_str() {
            "en" => Locale::En,
            _ => Locale::Ru,
        }
    }

    /// The other locale.
    pub fn next(self) -> Locale {
        match self {
            Locale::Ru => Locale::En,
            Locale::En => Locale::Ru,
        }
    }

    fn table(self) -> &'static HashMap<&'static str, &'static str> {
        match self {
            Locale::Ru => &RU,
            Locale::En => &EN,
        }
    }

    /// Translation for `key`, or the key itself when missing.
    pub fn t<'a>(self, key: &'a str) -> &'a str {
        self.table().get(key).copied().unwrap_or(key)
    }

    /// Translation with every `{name}` placeholder substituted.
    pub fn t_with(self, key: &str, params: &[(&str, &str)]) -> String {
        params
            .iter()
            .fold(self.t(key).to_string(), |text, (name, value)| {
                text.replace(&format!("{{{name}}}"), value)
            })
    }

    /// Upper-case badge text for a status.
    pub fn status_badge(self, status: &GameStatus) -> &'static str {
        let key = match status {
            GameStatus::Playing => "status_playing_display",
            GameStatus::Planned => "status_planned_display",
            GameStatus::Completed => "status_completed_display",
            GameStatus::Dropped => "status_dropped_display",
            GameStatus::Unknown(_) => "status_unknown_display",
        };
        self.t(key)
    }

    /// Label for a status in the form selector.
    pub fn status_option(self, status: &GameStatus) -> String {
        match status {
            GameStatus::Playing => self.t("status_playing").to_string(),
            GameStatus::Planned => self.t("status_planned").to_string(),
            GameStatus::Completed => self.t("status_completed").to_string(),
            GameStatus::Dropped => self.t("status_dropped").to_string(),
            GameStatus::Unknown(raw) => raw.clone(),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Locale::from_code(s))
    }
}

static RU: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("app_title", "Games List Manager"),
        (
            "app_description",
            "Удобный инструмент для локального управления статусами прохождения игр",
        ),
        ("add_game_button", "Добавить игру"),
        ("cancel_button", "Отмена"),
        ("save_button", "Добавить"),
        ("update_button", "Обновить"),
        ("edit_button", "Редактировать"),
        ("delete_button", "Удалить"),
        ("all_games_label", "Всего"),
        ("playing_games_label", "Играю"),
        ("planned_games_label", "В планах"),
        ("completed_games_label", "Пройдено"),
        ("dropped_games_label", "Дропнул"),
        ("sort_by_rating", "По оценке"),
        ("sort_by_title", "По названию"),
        ("sort_by_date_added", "По дате добавления"),
        ("sort_by_date_updated", "По дате обновления"),
        ("sort_label", "Сортировка"),
        ("search_label", "Поиск"),
        ("search_placeholder", "Поиск по названию..."),
        ("add_game_modal_title", "Добавить игру"),
        ("edit_game_modal_title", "Редактировать игру"),
        ("game_title_label", "Название"),
        ("game_title_placeholder", "Введите название игры"),
        ("version_label", "Версия"),
        ("version_placeholder", "например, GOTY или 1.2.3"),
        ("rating_label", "Оценка"),
        ("status_label", "Статус"),
        ("game_link_label", "Ссылка на игру"),
        ("game_link_placeholder", "https://..."),
        ("review_label", "Отзыв"),
        ("review_placeholder", "Коротко о впечатлениях"),
        ("screenshot_label", "Изображение"),
        ("screenshot_path_placeholder", "Путь к файлу, Enter для загрузки"),
        ("screenshot_attached", "Изображение {mime}, {size} КБ"),
        ("screenshot_error", "Не удалось загрузить изображение"),
        ("status_playing", "Играю"),
        ("status_planned", "В планах"),
        ("status_completed", "Прошёл"),
        ("status_dropped", "Дропнул"),
        ("remove_screenshot_button", "Удалить изображение"),
        ("similar_games_title", "Похожие игры"),
        ("confirm_delete_title", "Подтвердите удаление"),
        ("confirm_delete_text", "Удалить карточку игры?"),
        ("copy_title_tooltip", "Копировать название"),
        ("copy_link_tooltip", "Копировать ссылку"),
        ("edit_tooltip", "Редактировать"),
        ("delete_tooltip", "Удалить"),
        ("close_tooltip", "Закрыть"),
        ("empty_list", "Список пуст"),
        ("game_added", "Игра {title} добавлена"),
        ("game_updated", "Игра {title} обновлена"),
        ("game_deleted", "Игра {title} удалена"),
        ("copied_to_clipboard", "Скопировано в буфер"),
        ("clipboard_error", "Буфер обмена недоступен"),
        ("loading", "Загрузка..."),
        ("saving", "Сохранение..."),
        ("created_label", "Создано"),
        ("updated_label", "Обновлено"),
        ("language_label", "Язык"),
        ("russian_language", "Русский"),
        ("english_language", "English"),
        ("theme_toggle_tooltip_light", "Переключить на светлую тему"),
        ("theme_toggle_tooltip_dark", "Переключить на тёмную тему"),
        ("title_required", "Название обязательно"),
        ("save_error", "Ошибка сохранения"),
        ("delete_error", "Ошибка удаления"),
        ("load_error", "Не удалось загрузить список игр"),
        ("no_image", "Нет изображения"),
        ("copy_title", "Копировать название"),
        ("required_field", "*"),
        ("status_playing_display", "ИГРАЮ"),
        ("status_planned_display", "В ПЛАНАХ"),
        ("status_completed_display", "ПРОШЁЛ"),
        ("status_dropped_display", "ДРОПНУЛ"),
        ("status_unknown_display", "НЕИЗВЕСТНО"),
        ("no_title", "Без названия"),
        (
            "help_browse",
            "↑/↓ выбор · Tab фильтр · / поиск · s сортировка · a добавить · e правка · d удалить · c/y копировать · t тема · l язык · q выход",
        ),
        (
            "help_form",
            "Tab поле · ←/→ статус · Ctrl+S сохранить · Ctrl+X убрать изображение · Esc отмена",
        ),
        ("help_confirm", "y удалить · n отмена"),
    ])
});

static EN: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("app_title", "Games List Manager"),
        (
            "app_description",
            "A convenient tool for local management of game completion statuses",
        ),
        ("add_game_button", "Add Game"),
        ("cancel_button", "Cancel"),
        ("save_button", "Add"),
        ("update_button", "Update"),
        ("edit_button", "Edit"),
        ("delete_button", "Delete"),
        ("all_games_label", "All"),
        ("playing_games_label", "Playing"),
        ("planned_games_label", "Planned"),
        ("completed_games_label", "Completed"),
        ("dropped_games_label", "Dropped"),
        ("sort_by_rating", "By rating"),
        ("sort_by_title", "By title"),
        ("sort_by_date_added", "By date added"),
        ("sort_by_date_updated", "By date updated"),
        ("sort_label", "Sort"),
        ("search_label", "Search"),
        ("search_placeholder", "Search by title..."),
        ("add_game_modal_title", "Add Game"),
        ("edit_game_modal_title", "Edit Game"),
        ("game_title_label", "Title"),
        ("game_title_placeholder", "Enter game title"),
        ("version_label", "Version"),
        ("version_placeholder", "e.g., GOTY or 1.2.3"),
        ("rating_label", "Rating"),
        ("status_label", "Status"),
        ("game_link_label", "Game link"),
        ("game_link_placeholder", "https://..."),
        ("review_label", "Review"),
        ("review_placeholder", "Briefly about impressions"),
        ("screenshot_label", "Image"),
        ("screenshot_path_placeholder", "File path, Enter to load"),
        ("screenshot_attached", "{mime} image, {size} KB"),
        ("screenshot_error", "Could not load the image"),
        ("status_playing", "Playing"),
        ("status_planned", "Planned"),
        ("status_completed", "Completed"),
        ("status_dropped", "Dropped"),
        ("remove_screenshot_button", "Remove image"),
        ("similar_games_title", "Similar games"),
        ("confirm_delete_title", "Confirm deletion"),
        ("confirm_delete_text", "Delete game card?"),
        ("copy_title_tooltip", "Copy title"),
        ("copy_link_tooltip", "Copy link"),
        ("edit_tooltip", "Edit"),
        ("delete_tooltip", "Delete"),
        ("close_tooltip", "Close"),
        ("empty_list", "List is empty"),
        ("game_added", "Added game: {title}"),
        ("game_updated", "Updated: {title}"),
        ("game_deleted", "Deleted: {title}"),
        ("copied_to_clipboard", "Copied to clipboard"),
        ("clipboard_error", "Clipboard unavailable"),
        ("loading", "Loading..."),
        ("saving", "Saving..."),
        ("created_label", "Created"),
        ("updated_label", "Updated"),
        ("language_label", "Language"),
        ("russian_language", "Russian"),
        ("english_language", "English"),
        ("theme_toggle_tooltip_light", "Switch to light theme"),
        ("theme_toggle_tooltip_dark", "Switch to dark theme"),
        ("title_required", "Title is required"),
        ("save_error", "Save error"),
        ("delete_error", "Delete error"),
        ("load_error", "Failed to load games list"),
        ("no_image", "No image"),
        ("copy_title", "Copy title"),
        ("required_field", "*"),
        ("status_playing_display", "PLAYING"),
        ("status_planned_display", "PLANNED"),
        ("status_completed_display", "COMPLETED"),
        ("status_dropped_display", "DROPPED"),
        ("status_unknown_display", "UNKNOWN"),
        ("no_title", "No title"),
        (
            "help_browse",
            "↑/↓ select · Tab filter · / search · s sort · a add · e edit · d delete · c/y copy · t theme · l language · q quit",
        ),
        (
            "help_form",
            "Tab field · ←/→ status · Ctrl+S save · Ctrl+X remove image · Esc cancel",
        ),
        ("help_confirm", "y delete · n cancel"),
    ])
});
