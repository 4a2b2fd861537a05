//! Filename conventions
//!
//! Books: `Author1, Author2 - Title`. Underscores count as spaces, `;` `&`
//! and `,` all separate authors, and parenthesized runs are dropped.
//!
//! Mangas: `Authors - Series - Label`, exactly three segments. The label may
//! carry a `Vol.N` and a `Chapter N` token which together form the series
//! index; whatever remains of the label is the title.

use regex::Regex;
use shelfwatch_core::{MediaKind, ParsedNameGuess};
use std::sync::LazyLock;

const SEGMENT_SEPARATOR: &str = " - ";

static AUTHOR_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*[;&,]\s*").expect("author separator pattern is valid"));

static PARENTHESIZED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\(.*?\)").expect("parenthesized pattern is valid"));

static CHAPTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Chapter\s*(\d+)").expect("chapter pattern is valid"));

static VOLUME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bVol\.?\s*(\d+)").expect("volume pattern is valid"));

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Parses `base_name` with the convention of `kind`
pub fn parse_name(kind: MediaKind, base_name: &str) -> Option<ParsedNameGuess> {
    match kind {
        MediaKind::Book => parse_book_name(base_name),
        MediaKind::Manga => parse_manga_name(base_name),
    }
}

/// Parses a book file name (extension already stripped).
///
/// Returns `None` unless the cleaned name splits into a non-empty author
/// part and a non-empty title on the first `" - "`.
pub fn parse_book_name(base_name: &str) -> Option<ParsedNameGuess> {
    let name = base_name.replace('_', " ");
    let name = AUTHOR_SEPARATORS.replace_all(&name, ", ");
    let name = PARENTHESIZED.replace_all(&name, "");

    let (authors, title) = name.split_once(SEGMENT_SEPARATOR)?;
    let authors = split_authors(authors);
    let title = title.trim();

    if authors.is_empty() || title.is_empty() {
        return None;
    }

    Some(ParsedNameGuess {
        authors,
        title: title.to_string(),
        series: None,
        series_index: None,
    })
}

/// Parses a manga file name (extension already stripped).
///
/// Anything other than exactly three `" - "` segments, or an empty series
/// segment, is a mismatch.
pub fn parse_manga_name(base_name: &str) -> Option<ParsedNameGuess> {
    let segments: Vec<&str> = base_name.split(SEGMENT_SEPARATOR).collect();
    let [authors, series, label] = segments.as_slice() else {
        return None;
    };

    let series = series.trim();
    if series.is_empty() {
        return None;
    }

    let volume = VOLUME.captures(label).map(|c| c[1].to_string());
    let chapter = CHAPTER.captures(label).map(|c| strip_leading_zeros(&c[1]));

    let series_index = match (volume, chapter) {
        (Some(volume), Some(chapter)) => Some(format!("{volume}.{chapter}")),
        (Some(volume), None) => Some(volume),
        (None, Some(chapter)) => Some(chapter),
        (None, None) => None,
    };

    Some(ParsedNameGuess {
        authors: split_authors(authors),
        title: manga_title(label),
        series: Some(series.to_string()),
        series_index,
    })
}

fn split_authors(authors: &str) -> Vec<String> {
    authors
        .split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .collect()
}

/// `"003"` becomes `"3"`, `"000"` becomes `"0"`
fn strip_leading_zeros(digits: &str) -> String {
    let stripped = digits.trim_start_matches('0');
    if stripped.is_empty() {
        "0".to_string()
    } else {
        stripped.to_string()
    }
}

/// Label without its volume and chapter tokens, or the whole label when
/// nothing else is left
fn manga_title(label: &str) -> String {
    let without_volume = VOLUME.replace_all(label, " ");
    let without_chapter = CHAPTER.replace_all(&without_volume, " ");
    let collapsed = WHITESPACE.replace_all(&without_chapter, " ");
    let title = collapsed.trim_matches(|c: char| c.is_whitespace() || matches!(c, '-' | ':' | ',' | '.'));

    if title.is_empty() {
        label.trim().to_string()
    } else {
        title.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_single_author() {
        let guess = parse_book_name("Jane Doe - My Book").expect("match");
        assert_eq!(guess.authors, vec!["Jane Doe"]);
        assert_eq!(guess.title, "My Book");
        assert_eq!(guess.series, None);
    }

    #[test]
    fn test_book_mixed_separators_and_parentheses() {
        let guess = parse_book_name("A & B - Title (2020)").expect("match");
        assert_eq!(guess.authors, vec!["A", "B"]);
        assert_eq!(guess.title, "Title");

        let guess = parse_book_name("A;B , C - Title").expect("match");
        assert_eq!(guess.authors, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_book_underscores_are_spaces() {
        let guess = parse_book_name("Jane_Doe_-_My_Book").expect("match");
        assert_eq!(guess.authors, vec!["Jane Doe"]);
        assert_eq!(guess.title, "My Book");
    }

    #[test]
    fn test_book_splits_on_first_separator_only() {
        let guess = parse_book_name("Jane Doe - Part One - Dawn").expect("match");
        assert_eq!(guess.title, "Part One - Dawn");
    }

    #[test]
    fn test_book_mismatches() {
        assert_eq!(parse_book_name("JustATitle"), None);
        assert_eq!(parse_book_name(" - Title"), None);
        assert_eq!(parse_book_name("Author - "), None);
        assert_eq!(parse_book_name("Author - (2020)"), None);
    }

    #[test]
    fn test_manga_full_label() {
        let guess = parse_manga_name("AuthorX - SeriesY - Vol.1 Chapter 003 Arrival").expect("match");
        assert_eq!(guess.authors, vec!["AuthorX"]);
        assert_eq!(guess.series.as_deref(), Some("SeriesY"));
        assert_eq!(guess.series_index.as_deref(), Some("1.3"));
        assert_eq!(guess.title, "Arrival");
    }

    #[test]
    fn test_manga_index_variants() {
        let guess = parse_manga_name("A - S - Vol. 2 Chapter 005 Name").expect("match");
        assert_eq!(guess.series_index.as_deref(), Some("2.5"));

        let guess = parse_manga_name("A - S - vol 7").expect("match");
        assert_eq!(guess.series_index.as_deref(), Some("7"));
        assert_eq!(guess.title, "vol 7");

        let guess = parse_manga_name("A - S - Chapter 000: Prologue").expect("match");
        assert_eq!(guess.series_index.as_deref(), Some("0"));
        assert_eq!(guess.title, "Prologue");

        let guess = parse_manga_name("A - S - Oneshot").expect("match");
        assert_eq!(guess.series_index, None);
        assert_eq!(guess.title, "Oneshot");
    }

    #[test]
    fn test_manga_segment_count() {
        assert_eq!(parse_manga_name("A - S"), None);
        assert_eq!(parse_manga_name("A - S - T - U"), None);
        assert_eq!(parse_manga_name("A -  - T"), None);
    }

    #[test]
    fn test_volume_needs_word_boundary() {
        let guess = parse_manga_name("A - S - Devol 3").expect("match");
        assert_eq!(guess.series_index, None);
    }

    #[test]
    fn test_parse_name_dispatches_on_kind() {
        assert!(parse_name(MediaKind::Book, "A - T").is_some());
        assert!(parse_name(MediaKind::Manga, "A - T").is_none());
    }
}
