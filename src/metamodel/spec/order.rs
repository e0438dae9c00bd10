//! Member ordering by dotted sequence strings.
//!
//! Sequences such as `1`, `1.2` and `1.10` are compared segment by segment. Segments that
//! are both numeric compare numerically (`1.2 < 1.10`), a numeric segment sorts before a
//! non-numeric one, and anything else compares lexicographically. When one sequence is a
//! prefix of the other, the shorter one sorts first. Members without a sequence sort before
//! every ordered member and keep their declaration order among themselves.

use std::cmp::Ordering;

/// Compares two dotted sequence strings
#[must_use]
pub fn compare_sequences(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => {
                let ordering = compare_segments(l.trim(), r.trim());
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
        }
    }
}

fn compare_segments(l: &str, r: &str) -> Ordering {
    match (l.parse::<u64>(), r.parse::<u64>()) {
        (Ok(l), Ok(r)) => l.cmp(&r),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => l.cmp(r),
    }
}

/// Compares two optional sequences with unordered entries first, falling back to the
/// declaration rank
#[must_use]
pub fn compare_members(
    a: (Option<&str>, usize),
    b: (Option<&str>, usize),
) -> Ordering {
    let by_sequence = match (a.0, b.0) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(l), Some(r)) => compare_sequences(l, r),
    };
    by_sequence.then(a.1.cmp(&b.1))
}

/// Returns true if every segment of `sequence` is non-empty
#[must_use]
pub fn is_valid_sequence(sequence: &str) -> bool {
    !sequence.is_empty() && sequence.split('.').all(|segment| !segment.trim().is_empty())
}
