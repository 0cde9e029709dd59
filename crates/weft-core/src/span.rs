//! Source spans and span-carrying values.
//!
//! A [`Span`] is a half-open byte range into the original source text.
//! [`Spanned<T>`] attaches a span to any value so that later passes can
//! report diagnostics at the exact source location.

use std::{fmt, ops::Range};

/// A half-open byte range `start..end` in the source text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Span {
    start: usize,
    end: usize,
}

impl Span {
    /// Create a span from a byte range.
    pub fn new(range: Range<usize>) -> Self {
        Self {
            start: range.start,
            end: range.end,
        }
    }

    /// Byte offset of the first character.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Byte offset one past the last character.
    pub fn end(&self) -> usize {
        self.end
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The smallest span covering both `self` and `other`.
    pub fn union(&self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// The byte range covered by this span.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// A value paired with the span it was parsed from.
///
/// Equality compares the inner values only, so two identical names parsed
/// from different places compare equal.
#[derive(Debug, Clone)]
pub struct Spanned<T> {
    value: T,
    span: Span,
}

impl<T> Spanned<T> {
    pub fn new(value: T, span: Span) -> Self {
        Self { value, span }
    }

    pub fn inner(&self) -> &T {
        &self.value
    }

    pub fn into_inner(self) -> T {
        self.value
    }

    pub fn span(&self) -> Span {
        self.span
    }

    /// Transform the inner value while keeping the span.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Spanned<U> {
        Spanned {
            value: f(self.value),
            span: self.span,
        }
    }
}

impl<T> std::ops::Deref for Spanned<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

impl<T: PartialEq> PartialEq for Spanned<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T: Eq> Eq for Spanned<T> {}

impl<T: fmt::Display> fmt::Display for Spanned<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_union_covers_both() {
        let a = Span::new(4..9);
        let b = Span::new(12..20);
        assert_eq!(a.union(b), Span::new(4..20));
        assert_eq!(b.union(a), Span::new(4..20));
    }

    #[test]
    fn test_spanned_eq_ignores_span() {
        let a = Spanned::new("count", Span::new(0..5));
        let b = Spanned::new("count", Span::new(30..35));
        assert_eq!(a, b);
        assert_eq!(*a, "count");
    }

    #[test]
    fn test_spanned_map_keeps_span() {
        let s = Spanned::new("n", Span::new(3..4)).map(str::to_uppercase);
        assert_eq!(s.inner(), "N");
        assert_eq!(s.span(), Span::new(3..4));
    }

    proptest! {
        #[test]
        fn union_is_commutative_and_covering(a in 0usize..500, la in 0usize..50, b in 0usize..500, lb in 0usize..50) {
            let x = Span::new(a..a + la);
            let y = Span::new(b..b + lb);
            let u = x.union(y);
            prop_assert_eq!(u, y.union(x));
            prop_assert!(u.start() <= x.start() && u.end() >= x.end());
            prop_assert!(u.start() <= y.start() && u.end() >= y.end());
        }
    }
}
