//! Filter and sort stages producing the displayed list.

use std::{cmp::Ordering, fmt, str::FromStr};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::{
    collation::TitleCollator,
    models::{Game, GameStatus},
};

/// Status selection applied by the filter stage.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StatusFilter {
    /// Keep every game.
    #[default]
    All,
    /// Keep games with exactly this status.
    Only(GameStatus),
}

impl StatusFilter {
    /// Filters in the order the statistics bar shows them.
    pub fn choices() -> Vec<StatusFilter> {
        let mut choices = vec![StatusFilter::All];
        choices.extend(GameStatus::KNOWN.iter().cloned().map(StatusFilter::Only));
        choices
    }

    /// Whether `game` passes the status predicate.
    pub fn admits(&self, game: &Game) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(status) => &game.status == status,
        }
    }
}

/// Ordering applied by the sort stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortMode {
    /// Rated games by descending rating, then unrated games.
    #[serde(rename = "rating-desc")]
    RatingDesc,
    /// Case-insensitive title order.
    #[serde(rename = "title-asc")]
    TitleAsc,
    /// Newest creation time first.
    #[serde(rename = "added-desc")]
    AddedDesc,
    /// Most recently touched first (update time, else creation time).
    ///
    /// The name is historical: the order is descending.
    #[default]
    #[serde(rename = "added-asc")]
    AddedAsc,
}

impl SortMode {
    /// All modes in menu order.
    pub const ALL: [SortMode; 4] = [
        SortMode::RatingDesc,
        SortMode::TitleAsc,
        SortMode::AddedDesc,
        SortMode::AddedAsc,
    ];

    /// Wire name of the mode.
    pub fn as_str(self) -> &'static str {
        match self {
            SortMode::RatingDesc => "rating-desc",
            SortMode::TitleAsc => "title-asc",
            SortMode::AddedDesc => "added-desc",
            SortMode::AddedAsc => "added-asc",
        }
    }

    /// Next mode in menu order, wrapping around.
    pub fn next(self) -> SortMode {
        let idx = Self::ALL.iter().position(|mode| *mode == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s.trim())
            .ok_or_else(|| format!("unknown sort mode '{s}'"))
    }
}

/// Current filter, search and sort selections.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuery {
    /// Status filter.
    pub filter: StatusFilter,
    /// Search text; matched case-insensitively against titles.
    pub search: String,
    /// Sort mode.
    pub sort: SortMode,
}

impl ListQuery {
    /// Run filter then sort over `games`, leaving the input untouched.
    pub fn apply(&self, games: &[Game]) -> Vec<Game> {
        sort_games(&filter_games(games, &self.filter, &self.search), self.sort)
    }
}

/// Keep games matching both the status filter and the title search.
pub fn filter_games(games: &[Game], filter: &StatusFilter, search: &str) -> Vec<Game> {
    let needle = search.to_lowercase();
    games
        .iter()
        .filter(|game| filter.admits(game))
        .filter(|game| needle.is_empty() || game.title.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

/// Return a sorted copy of `games`. The sort is stable, so equal keys keep
/// their incoming order and re-sorting is a no-op.
pub fn sort_games(games: &[Game], mode: SortMode) -> Vec<Game> {
    let mut sorted = games.to_vec();
    match mode {
        SortMode::RatingDesc => sorted.sort_by(compare_rating_desc),
        SortMode::TitleAsc => {
            let mut collator = TitleCollator::new();
            let mut keyed: Vec<(String, Game)> = sorted
                .into_iter()
                .map(|game| (game.title.to_lowercase(), game))
                .collect();
            keyed.sort_by(|a, b| collator.compare_folded(&a.0, &b.0));
            return keyed.into_iter().map(|(_, game)| game).collect();
        }
        SortMode::AddedDesc => {
            sorted.sort_by(|a, b| or_epoch(b.created()).cmp(&or_epoch(a.created())))
        }
        SortMode::AddedAsc => {
            sorted.sort_by(|a, b| or_epoch(b.last_touched()).cmp(&or_epoch(a.last_touched())))
        }
    }
    sorted
}

fn compare_rating_desc(a: &Game, b: &Game) -> Ordering {
    match (a.is_rated(), b.is_rated()) {
        (false, false) => Ordering::Equal,
        (false, true) => Ordering::Greater,
        (true, false) => Ordering::Less,
        (true, true) => b
            .rating_value()
            .partial_cmp(&a.rating_value())
            .unwrap_or(Ordering::Equal),
    }
}

fn or_epoch(value: Option<NaiveDateTime>) -> NaiveDateTime {
    value.unwrap_or(NaiveDateTime::UNIX_EPOCH)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(id: i64, title: &str, status: GameStatus, rating: f64) -> Game {
        Game {
            id: Some(id),
            title: title.to_string(),
            status,
            rating,
            ..Game::default()
        }
    }

    fn ids(games: &[Game]) -> Vec<i64> {
        games.iter().filter_map(|game| game.id).collect()
    }

    fn mixed() -> Vec<Game> {
        vec![
            game(1, "Hollow Knight", GameStatus::Completed, 9.0),
            game(2, "celeste", GameStatus::Completed, 0.0),
            game(3, "Doom", GameStatus::Playing, 7.5),
            game(4, "Braid", GameStatus::Completed, 8.0),
            game(5, "Anno", GameStatus::Dropped, 0.0),
        ]
    }

    #[test]
    fn completed_filter_with_title_sort() {
        let query = ListQuery {
            filter: StatusFilter::Only(GameStatus::Completed),
            search: String::new(),
            sort: SortMode::TitleAsc,
        };
        let result = query.apply(&mixed());
        assert_eq!(ids(&result), vec![4, 2, 1]);
    }

    #[test]
    fn title_sort_uses_collation_order() {
        let games = vec![
            game(1, "Zelda", GameStatus::Planned, 0.0),
            game(2, "Élan", GameStatus::Planned, 0.0),
            game(3, "Жук", GameStatus::Planned, 0.0),
            game(4, "ёжик", GameStatus::Planned, 0.0),
        ];
        let sorted = sort_games(&games, SortMode::TitleAsc);
        assert_eq!(ids(&sorted), vec![2, 1, 4, 3]);
    }

    #[test]
    fn search_is_case_insensitive() {
        let result = filter_games(&mixed(), &StatusFilter::All, "HOLLOW");
        assert_eq!(ids(&result), vec![1]);
        let result = filter_games(&mixed(), &StatusFilter::Only(GameStatus::Playing), "o");
        assert_eq!(ids(&result), vec![3]);
    }

    #[test]
    fn unrated_games_sort_last() {
        let mut games = mixed();
        games.push(game(6, "Negative", GameStatus::Planned, -1.0));
        let sorted = sort_games(&games, SortMode::RatingDesc);
        assert_eq!(ids(&sorted), vec![1, 4, 3, 6, 2, 5]);
    }

    #[test]
    fn added_desc_puts_missing_timestamps_last() {
        let mut a = game(1, "A", GameStatus::Planned, 0.0);
        a.created_at = Some("2024-01-01 10:00:00".into());
        let mut b = game(2, "B", GameStatus::Planned, 0.0);
        b.created_at = Some("2024-05-01 10:00:00".into());
        let c = game(3, "C", GameStatus::Planned, 0.0);
        let mut d = game(4, "D", GameStatus::Planned, 0.0);
        d.created_at = Some("garbage".into());

        let sorted = sort_games(&[c, a, d, b], SortMode::AddedDesc);
        assert_eq!(ids(&sorted), vec![2, 1, 3, 4]);
    }

    #[test]
    fn added_asc_orders_by_most_recent_touch() {
        let mut old_but_edited = game(1, "A", GameStatus::Planned, 0.0);
        old_but_edited.created_at = Some("2020-01-01 00:00:00".into());
        old_but_edited.updated_at = Some("2024-06-01 00:00:00".into());
        let mut recent = game(2, "B", GameStatus::Planned, 0.0);
        recent.created_at = Some("2024-03-01 00:00:00".into());
        let untouched = game(3, "C", GameStatus::Planned, 0.0);

        let sorted = sort_games(&[untouched, recent, old_but_edited], SortMode::default());
        assert_eq!(ids(&sorted), vec![1, 2, 3]);
    }

    #[test]
    fn sorting_keeps_membership_and_is_idempotent() {
        let games = mixed();
        for mode in SortMode::ALL {
            let once = sort_games(&games, mode);
            let twice = sort_games(&once, mode);
            assert_eq!(ids(&once), ids(&twice), "mode {mode}");

            let mut before = ids(&games);
            let mut after = ids(&once);
            before.sort();
            after.sort();
            assert_eq!(before, after, "mode {mode}");
        }
        // input untouched
        assert_eq!(ids(&games), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn sort_mode_names_round_trip() {
        for mode in SortMode::ALL {
            assert_eq!(mode.as_str().parse::<SortMode>(), Ok(mode));
        }
        assert!("newest".parse::<SortMode>().is_err());
        assert_eq!(SortMode::AddedAsc.next(), SortMode::RatingDesc);
    }
}
