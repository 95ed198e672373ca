//! Tag sets and candidate scoring.

use std::collections::BTreeSet;
use std::fmt;

const MAX_COUNT: i32 = 99;

/// Smallest score a candidate needs to be selected at all.
///
/// The formula never goes below zero, so in practice every candidate is
/// admissible and "not found" only means there were no candidates.
pub(crate) const MIN_SCORE: i32 = 0;

/// Unordered set of qualifier strings attached to a factory or a query.
///
/// Two tag sets are equal when they hold the same tags, whatever order they
/// were given in.
///
/// # Examples
///
/// ```rust
/// use materialize::TagSet;
///
/// let a = TagSet::new(["foo", "bar"]);
/// let b = TagSet::new(["bar", "foo", "foo"]);
/// assert_eq!(a, b);
/// assert_eq!(a.len(), 2);
/// assert_eq!(a.to_string(), "[bar, foo]");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TagSet(BTreeSet<String>);

impl TagSet {
    /// Builds a tag set, dropping duplicates.
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(tags.into_iter().map(Into::into).collect())
    }

    /// The empty tag set.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds the query-side tag set from a slice of borrowed tags.
    pub fn from_query(tags: &[&str]) -> Self {
        Self::new(tags.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.contains(tag)
    }

    /// Iterates the tags in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Scores this (candidate) tag set against a query.
    ///
    /// `(1 + |self ∩ query|) * 100 - |self \ query|`, with both counts capped
    /// at 99. Overlap is worth far more than an extraneous tag costs, and a
    /// candidate is never rejected for lacking a tag the query asks for.
    ///
    /// ```rust
    /// use materialize::TagSet;
    ///
    /// let foo_bar = TagSet::new(["foo", "bar"]);
    /// assert_eq!(TagSet::empty().score(&TagSet::empty()), 100);
    /// assert_eq!(foo_bar.score(&TagSet::new(["foo"])), 199);
    /// ```
    pub fn score(&self, query: &TagSet) -> i32 {
        let overlap = self.0.intersection(&query.0).count();
        let extraneous = self.0.difference(&query.0).count();
        let positive = (1 + capped(overlap)).min(MAX_COUNT);
        let negative = capped(extraneous);
        positive * 100 - negative
    }
}

fn capped(count: usize) -> i32 {
    i32::try_from(count).unwrap_or(i32::MAX).min(MAX_COUNT)
}

impl fmt::Display for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, tag) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(tag)?;
        }
        f.write_str("]")
    }
}

impl<S: Into<String>> FromIterator<S> for TagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl From<&[&str]> for TagSet {
    fn from(tags: &[&str]) -> Self {
        Self::from_query(tags)
    }
}
