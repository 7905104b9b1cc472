//! Duplicate-title detection.
//!
//! While a title is being typed the front end asks which existing games look
//! like the same title, so the user notices before adding a duplicate.

use std::{cmp::Ordering, time::Duration};

use crate::{collation::TitleCollator, models::Game};

/// Default delay between the last keystroke and running the matcher.
pub const DEBOUNCE: Duration = Duration::from_millis(300);

/// Queries shorter than this (in characters, after trimming) never match.
const MIN_QUERY_CHARS: usize = 2;
/// Substring rules only apply to queries longer than this.
const SUBSTRING_RULE_MIN_CHARS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Relevance {
    Exact,
    Prefix,
    Other,
}

struct Candidate<'a> {
    game: &'a Game,
    title: String,
    relevance: Relevance,
}

/// Return the games whose titles look like `query`, most relevant first.
///
/// A game whose id equals `exclude_id` is never returned, which lets the
/// edit form skip the record being edited.
pub fn find_similar<'a>(query: &str, games: &'a [Game], exclude_id: Option<i64>) -> Vec<&'a Game> {
    let needle = query.trim().to_lowercase();
    let needle_len = needle.chars().count();
    if needle_len < MIN_QUERY_CHARS {
        return Vec::new();
    }

    let tokens: Vec<&str> = needle
        .split_whitespace()
        .filter(|token| token.chars().count() > 1)
        .collect();
    let substring_rules = needle_len > SUBSTRING_RULE_MIN_CHARS;

    let mut candidates: Vec<Candidate<'a>> = games
        .iter()
        .filter(|game| exclude_id.is_none() || game.id != exclude_id)
        .filter_map(|game| {
            let title = game.display_title().to_lowercase();
            let relevance = if title == needle {
                Relevance::Exact
            } else if title.starts_with(&needle) {
                Relevance::Prefix
            } else if matches_words(&title, &tokens)
                || (substring_rules && matches_substring(&title, &needle, &tokens))
            {
                Relevance::Other
            } else {
                return None;
            };
            Some(Candidate {
                game,
                title,
                relevance,
            })
        })
        .collect();

    let mut collator = TitleCollator::new();
    candidates.sort_by(|a, b| match a.relevance.cmp(&b.relevance) {
        Ordering::Equal => collator.compare_folded(&a.title, &b.title),
        other => other,
    });

    candidates.into_iter().map(|candidate| candidate.game).collect()
}

/// Every query token equals a whole word of the title.
fn matches_words(title: &str, tokens: &[&str]) -> bool {
    if tokens.is_empty() {
        return false;
    }
    let words: Vec<&str> = title.split_whitespace().collect();
    tokens.iter().all(|token| words.contains(token))
}

/// The title contains the whole query, or contains every query token.
fn matches_substring(title: &str, needle: &str, tokens: &[&str]) -> bool {
    if title.contains(needle) {
        return true;
    }
    !tokens.is_empty() && tokens.iter().all(|token| title.contains(token))
}
