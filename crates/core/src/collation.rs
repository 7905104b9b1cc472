//! Locale-aware title ordering.
//!
//! Titles are compared with the Unicode Collation Algorithm over the CLDR
//! root table, so accented Latin letters sort next to their base letter and
//! Cyrillic `ё` sorts with `е` instead of after `я`.

use std::cmp::Ordering;

use feruca::{Collator, Locale, Tailoring};

/// Compares titles case-insensitively in collation order.
pub struct TitleCollator {
    collator: Collator,
}

impl Default for TitleCollator {
    fn default() -> Self {
        Self::new()
    }
}

impl TitleCollator {
    /// Root collation with punctuation and spaces kept significant.
    pub fn new() -> Self {
        Self {
            collator: Collator::new(Tailoring::Cldr(Locale::Root), false, true),
        }
    }

    /// Compare two titles that are already lower-cased.
    pub fn compare_folded(&mut self, a: &str, b: &str) -> Ordering {
        self.collator.collate(a, b)
    }

    /// Compare two titles ignoring case.
    pub fn compare(&mut self, a: &str, b: &str) -> Ordering {
        self.compare_folded(&a.to_lowercase(), &b.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accented_and_cyrillic_letters_sort_with_their_base() {
        let mut collator = TitleCollator::new();
        let mut titles = vec!["Zelda", "Élan", "Жук", "Ёжик", "apple"];
        titles.sort_by(|a, b| collator.compare(a, b));
        assert_eq!(titles, vec!["apple", "Élan", "Zelda", "Ёжик", "Жук"]);
    }

    #[test]
    fn case_is_ignored() {
        let mut collator = TitleCollator::new();
        assert_eq!(collator.compare("HALO", "halo"), Ordering::Equal);
        assert_eq!(collator.compare("halo 3", "Halo Wars"), Ordering::Less);
    }
}
