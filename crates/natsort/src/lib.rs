//! Natural ordering for human-facing strings.
//!
//! Strings are split into runs of ASCII digits and runs of everything else.
//! Digit runs compare by numeric value (of arbitrary length, so "Vol 00012"
//! never overflows), text runs compare case-insensitively. Two strings whose
//! runs are all equal fall back to a plain byte comparison so that the
//! ordering stays total and deterministic.

use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Chunk<'a> {
    Number(&'a str),
    Text(&'a str),
}

struct Chunks<'a> {
    rest: &'a str,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Chunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.rest.chars().next()?;
        let numeric = first.is_ascii_digit();
        let end = self
            .rest
            .char_indices()
            .find(|(_, c)| c.is_ascii_digit() != numeric)
            .map(|(i, _)| i)
            .unwrap_or(self.rest.len());
        let (chunk, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(if numeric { Chunk::Number(chunk) } else { Chunk::Text(chunk) })
    }
}

fn chunks(s: &str) -> Chunks<'_> {
    Chunks { rest: s }
}

fn compare_numbers(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn compare_text(a: &str, b: &str) -> Ordering {
    let a = a.chars().flat_map(char::to_lowercase);
    let b = b.chars().flat_map(char::to_lowercase);
    a.cmp(b)
}

fn compare_chunks(a: Chunk<'_>, b: Chunk<'_>) -> Ordering {
    match (a, b) {
        (Chunk::Number(a), Chunk::Number(b)) => compare_numbers(a, b),
        (Chunk::Text(a), Chunk::Text(b)) => compare_text(a, b),
        (Chunk::Number(_), Chunk::Text(_)) => Ordering::Less,
        (Chunk::Text(_), Chunk::Number(_)) => Ordering::Greater,
    }
}

/// Compare two strings in natural order.
///
/// "Vol 2" sorts before "Vol 10", "chapter 3" sorts next to "Chapter 3".
pub fn compare(a: &str, b: &str) -> Ordering {
    let mut left = chunks(a);
    let mut right = chunks(b);
    loop {
        match (left.next(), right.next()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => match compare_chunks(x, y) {
                Ordering::Equal => continue,
                other => return other,
            },
        }
    }
}

/// Wrapper giving a string natural `Ord`, for use as a sort or map key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SortKey<S: AsRef<str>>(pub S);

impl<S: AsRef<str>> SortKey<S> {
    pub fn new(value: S) -> Self {
        Self(value)
    }
}

impl<S: AsRef<str> + Eq> PartialOrd for SortKey<S> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<S: AsRef<str> + Eq> Ord for SortKey<S> {
    fn cmp(&self, other: &Self) -> Ordering {
        compare(self.0.as_ref(), other.0.as_ref())
    }
}

/// Stable natural sort of `items` by the string returned from `key`.
pub fn sort<T, F>(items: &mut [T], key: F)
where
    F: Fn(&T) -> &str,
{
    items.sort_by(|a, b| compare(key(a), key(b)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Vol 2", "Vol 10", Ordering::Less)]
    #[case("Vol 10", "Vol 2", Ordering::Greater)]
    #[case("vol 1", "Vol 1", Ordering::Greater)]
    #[case("Vol 1", "vol 2", Ordering::Less)]
    #[case("Vol 007", "Vol 7", Ordering::Less)]
    #[case("file9.pdf", "file10.pdf", Ordering::Less)]
    #[case("1abc", "abc", Ordering::Less)]
    #[case("", "a", Ordering::Less)]
    #[case("same", "same", Ordering::Equal)]
    fn test_compare(#[case] a: &str, #[case] b: &str, #[case] expected: Ordering) {
        assert_eq!(compare(a, b), expected);
    }

    #[test]
    fn test_volume_titles_sort_numerically() {
        let mut titles = vec!["Vol 2", "Vol 10", "Vol 1"];
        sort(&mut titles, |s| s);
        assert_eq!(titles, vec!["Vol 1", "Vol 2", "Vol 10"]);
    }

    #[test]
    fn test_huge_numbers_do_not_overflow() {
        let big = "Part 123456789012345678901234567890";
        let bigger = "Part 1234567890123456789012345678901";
        assert_eq!(compare(big, bigger), Ordering::Less);
    }

    #[test]
    fn test_ordering_is_antisymmetric() {
        let samples = ["a1", "A1", "a01", "a10", "b", "B2", "", "10", "x y 3", "x y 03"];
        for a in samples {
            for b in samples {
                assert_eq!(compare(a, b), compare(b, a).reverse(), "{a:?} vs {b:?}");
            }
        }
    }

    #[test]
    fn test_sort_key_in_btreeset() {
        let set: std::collections::BTreeSet<_> =
            ["Book 12", "Book 3", "book 1"].into_iter().map(SortKey).collect();
        let ordered: Vec<_> = set.into_iter().map(|k| k.0).collect();
        assert_eq!(ordered, vec!["book 1", "Book 3", "Book 12"]);
    }
}
