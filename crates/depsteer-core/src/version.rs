//! Version ordering and interval matching.
//!
//! Published versions follow Maven ordering: `.` and `-` separate items,
//! numbers compare numerically, and the well-known qualifiers rank as
//! `alpha < beta < milestone < rc < snapshot < release < sp`. Anything else
//! is a free-form word that sorts below release.

use std::cmp::Ordering;
use std::fmt;

/// A version string broken into comparable items.
#[derive(Debug, Clone)]
pub struct Version {
    text: String,
    items: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Item {
    Int(u64),
    Tag(Tag),
    Word(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Tag {
    Alpha,
    Beta,
    Milestone,
    Rc,
    Snapshot,
    Release,
    ServicePack,
}

impl Item {
    fn read(token: &str) -> Item {
        if token.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(n) = token.parse() {
                return Item::Int(n);
            }
        }
        let tag = match token.to_ascii_lowercase().as_str() {
            "a" | "alpha" => Tag::Alpha,
            "b" | "beta" => Tag::Beta,
            "m" | "milestone" => Tag::Milestone,
            "cr" | "rc" => Tag::Rc,
            "snapshot" => Tag::Snapshot,
            "ga" | "final" | "release" => Tag::Release,
            "sp" => Tag::ServicePack,
            _ => return Item::Word(token.to_ascii_lowercase()),
        };
        Item::Tag(tag)
    }

    /// Ordering against a missing item, i.e. `1.0` vs `1.0.x`.
    fn against_padding(&self) -> Ordering {
        match self {
            Item::Int(0) => Ordering::Equal,
            Item::Int(_) => Ordering::Greater,
            Item::Tag(tag) => tag.cmp(&Tag::Release),
            Item::Word(_) => Ordering::Less,
        }
    }

    /// Words sit between pre-release tags and the release tag.
    fn weight(&self) -> u8 {
        match self {
            Item::Tag(tag) if *tag < Tag::Release => 0,
            Item::Word(_) => 1,
            Item::Tag(_) => 2,
            Item::Int(_) => 3,
        }
    }

    fn compare(&self, other: &Item) -> Ordering {
        match (self, other) {
            (Item::Int(a), Item::Int(b)) => a.cmp(b),
            (Item::Tag(a), Item::Tag(b)) => a.cmp(b),
            (Item::Word(a), Item::Word(b)) => a.cmp(b),
            _ => self.weight().cmp(&other.weight()),
        }
    }
}

impl Version {
    pub fn parse(text: &str) -> Self {
        let items = text
            .split(['.', '-'])
            .flat_map(digit_runs)
            .map(Item::read)
            .collect();
        Version {
            text: text.to_string(),
            items,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_snapshot(&self) -> bool {
        self.text.ends_with("-SNAPSHOT")
    }
}

/// Splits `rc1` into `rc` and `1`.
fn digit_runs(token: &str) -> Vec<&str> {
    let mut runs = Vec::new();
    let mut start = 0;
    let bytes = token.as_bytes();
    for i in 1..bytes.len() {
        if bytes[i].is_ascii_digit() != bytes[i - 1].is_ascii_digit() {
            runs.push(&token[start..i]);
            start = i;
        }
    }
    if start < token.len() {
        runs.push(&token[start..]);
    }
    runs
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let mut left = self.items.iter();
        let mut right = other.items.iter();
        loop {
            let step = match (left.next(), right.next()) {
                (None, None) => return Ordering::Equal,
                (Some(a), None) => a.against_padding(),
                (None, Some(b)) => b.against_padding().reverse(),
                (Some(a), Some(b)) => a.compare(b),
            };
            if step.is_ne() {
                return step;
            }
        }
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other).is_eq()
    }
}

impl Eq for Version {}

/// Total order over version strings.
///
/// Strings that compare equal as versions (`1.0`, `1.0.0`) fall back to a
/// text comparison so two distinct strings never tie.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    Version::parse(a)
        .cmp(&Version::parse(b))
        .then_with(|| a.cmp(b))
}

pub fn max_version<'a, I>(versions: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    versions.into_iter().max_by(|a, b| compare_versions(a, b))
}

pub fn min_version<'a, I>(versions: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    versions.into_iter().min_by(|a, b| compare_versions(a, b))
}

/// One side of an [`Interval`].
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub at: Version,
    pub closed: bool,
}

/// A bracketed version interval: `[1.0,2.0)`, `(,2.0]`, `[1.0,]`, the
/// single-point `[1.5]`, and the reversed exclusive form `]1.0,2.0[`.
#[derive(Debug, Clone)]
pub struct Interval {
    pub low: Option<Endpoint>,
    pub high: Option<Endpoint>,
}

impl Interval {
    /// `None` unless `text` is bracketed on both ends.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let mut chars = text.chars();
        let open = chars.next()?;
        let close = chars.next_back()?;
        if !matches!(open, '[' | '(' | ']') || !matches!(close, ']' | ')' | '[') {
            return None;
        }
        let body = text[open.len_utf8()..text.len() - close.len_utf8()].trim();
        let endpoint = |raw: &str, closed: bool| {
            let raw = raw.trim();
            (!raw.is_empty()).then(|| Endpoint {
                at: Version::parse(raw),
                closed,
            })
        };

        match body.split_once(',') {
            Some((low, high)) => Some(Interval {
                low: endpoint(low, open == '['),
                high: endpoint(high, close == ']'),
            }),
            None if open == '[' && close == ']' && !body.is_empty() => Some(Interval {
                low: endpoint(body, true),
                high: endpoint(body, true),
            }),
            None => None,
        }
    }

    pub fn contains(&self, version: &Version) -> bool {
        let above_low = self.low.as_ref().map_or(true, |low| match version.cmp(&low.at) {
            Ordering::Greater => true,
            Ordering::Equal => low.closed,
            Ordering::Less => false,
        });
        let below_high = self.high.as_ref().map_or(true, |high| match version.cmp(&high.at) {
            Ordering::Less => true,
            Ordering::Equal => high.closed,
            Ordering::Greater => false,
        });
        above_low && below_high
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(text: &str) -> Version {
        Version::parse(text)
    }

    #[test]
    fn numbers_compare_as_numbers() {
        assert!(v("1.9.0") < v("1.10.0"));
        assert!(v("2") > v("1.99"));
        assert_eq!(max_version(["1.9.0", "1.10.0", "1.2.0"]), Some("1.10.0"));
    }

    #[test]
    fn pre_releases_rank_below_the_release() {
        let ladder = ["1.0-alpha", "1.0-beta-2", "1.0-M1", "1.0-RC1", "1.0-SNAPSHOT", "1.0", "1.0-sp"];
        for pair in ladder.windows(2) {
            assert!(v(pair[0]) < v(pair[1]), "{} < {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn qualifier_digits_split_off() {
        assert!(v("1.0-RC1") < v("1.0-RC2"));
        assert!(v("1.0-M9") < v("1.0-RC1"));
        assert_eq!(v("1.0-rc1"), v("1.0-rc-1"));
    }

    #[test]
    fn snapshot_is_flagged() {
        assert!(v("2.0-SNAPSHOT").is_snapshot());
        assert!(!v("2.0").is_snapshot());
    }

    #[test]
    fn padding_zeros_tie_until_the_text_breaks_it() {
        assert_eq!(v("1.0"), v("1.0.0"));
        assert_eq!(compare_versions("1.0", "1.0.0"), Ordering::Less);
        assert_eq!(compare_versions("3.1", "3.1"), Ordering::Equal);
    }

    #[test]
    fn free_form_suffix_sorts_below_plain_release() {
        assert!(v("31.1-jre") < v("31.1"));
        assert!(v("31.1-android") < v("31.1-jre"));
        assert!(v("31.1-jre") > v("31.1-rc1"));
    }

    #[test]
    fn min_and_max_of_a_set() {
        assert_eq!(min_version(["2.0.0", "1.5.0", "1.10.0"]), Some("1.5.0"));
        assert_eq!(max_version(std::iter::empty()), None);
    }

    #[test]
    fn closed_and_half_open_intervals() {
        let closed = Interval::parse("[1.0,2.0]").unwrap();
        assert!(closed.contains(&v("1.0")) && closed.contains(&v("2.0")));
        assert!(!closed.contains(&v("2.0.1")));

        let half = Interval::parse("[1.0,2.0)").unwrap();
        assert!(half.contains(&v("1.9.9")));
        assert!(!half.contains(&v("2.0")));
    }

    #[test]
    fn reversed_brackets_exclude_both_ends() {
        let interval = Interval::parse("]1.0,2.0[").unwrap();
        assert!(!interval.contains(&v("1.0")));
        assert!(interval.contains(&v("1.5")));
        assert!(!interval.contains(&v("2.0")));
    }

    #[test]
    fn unbounded_sides() {
        let ceiling = Interval::parse("(,2.0]").unwrap();
        assert!(ceiling.contains(&v("0.1")));
        assert!(!ceiling.contains(&v("2.1")));

        let floor = Interval::parse("[1.5,)").unwrap();
        assert!(floor.contains(&v("99")));
        assert!(!floor.contains(&v("1.4")));
    }

    #[test]
    fn single_point() {
        let point = Interval::parse("[1.5]").unwrap();
        assert!(point.contains(&v("1.5.0")));
        assert!(!point.contains(&v("1.4")));
    }

    #[test]
    fn plain_text_is_not_an_interval() {
        for text in ["1.0", "[1.0", "[", "(1.0)", "[]"] {
            assert!(Interval::parse(text).is_none(), "{text}");
        }
    }
}
